//! Result plotter — reads a benchmark result log, computes trimmed
//! per-series statistics, and renders one timing chart per test case.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;

use normbench::plot::{render_all, ChartFormat, ChartOptions, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use normbench::results::read_results_path;
use normbench::stats::{group_by_series, summarize};

fn main() {
    let exit_code = run_cli(std::env::args_os());
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

#[allow(clippy::too_many_lines)]
fn run_cli<I>(os_args: I) -> i32
where
    I: IntoIterator<Item = OsString>,
{
    init_tracing();
    let raw: Vec<String> = os_args
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    // Skip program name (raw[0]).
    let tail = if raw.len() > 1 { &raw[1..] } else { &[] };
    if tail.is_empty() {
        print_help();
        return 2;
    }
    if tail.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return 0;
    }

    let mut positional: Vec<String> = Vec::new();
    let mut out_dir = ".".to_owned();
    let mut format = ChartFormat::Png;
    let mut width = DEFAULT_WIDTH;
    let mut height = DEFAULT_HEIGHT;

    let mut i = 0;
    while i < tail.len() {
        match tail[i].as_str() {
            "--out-dir" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --out-dir requires a directory argument");
                    return 2;
                }
                out_dir.clone_from(&tail[i]);
            }
            "--format" => {
                i += 1;
                let Some(raw_format) = tail.get(i) else {
                    eprintln!("error: --format requires an argument");
                    return 2;
                };
                match ChartFormat::parse(raw_format) {
                    Ok(parsed) => format = parsed,
                    Err(e) => {
                        eprintln!("error: {e}");
                        return 2;
                    }
                }
            }
            "--width" => {
                i += 1;
                let Some(raw_width) = tail.get(i) else {
                    eprintln!("error: --width requires an integer argument");
                    return 2;
                };
                let Ok(n) = raw_width.parse::<u32>() else {
                    eprintln!("error: invalid integer for --width: `{raw_width}`");
                    return 2;
                };
                width = n;
            }
            "--height" => {
                i += 1;
                let Some(raw_height) = tail.get(i) else {
                    eprintln!("error: --height requires an integer argument");
                    return 2;
                };
                let Ok(n) = raw_height.parse::<u32>() else {
                    eprintln!("error: invalid integer for --height: `{raw_height}`");
                    return 2;
                };
                height = n;
            }
            other => {
                if other.starts_with('-') {
                    eprintln!("error: unknown option `{other}`");
                    return 2;
                }
                positional.push(other.to_owned());
            }
        }
        i += 1;
    }

    let [results_file] = positional.as_slice() else {
        eprintln!("error: expected one positional argument <RESULTS_FILE>");
        return 2;
    };

    let records = match read_results_path(Path::new(results_file)) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("error: cannot read `{results_file}`: {e}");
            return 1;
        }
    };
    let grouped = match group_by_series(&records) {
        Ok(grouped) => grouped,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    let summary = match summarize(&grouped) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let mut options = ChartOptions::new(&out_dir);
    options.format = format;
    options.width = width;
    options.height = height;

    match render_all(&summary, &options) {
        Ok(paths) => {
            for path in &paths {
                println!("wrote {}", path.display());
            }
            0
        }
        Err(e) => {
            eprintln!("error: chart rendering failed: {e}");
            1
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn print_help() {
    let text = "\
plot_results — Render per-test-case timing charts from a result log

USAGE:
    plot_results <RESULTS_FILE> [OPTIONS]

ARGS:
    <RESULTS_FILE>    Result log produced by bench_runner

OPTIONS:
    --out-dir <DIR>     Directory charts are written into (default: .)
    --format <FMT>      Chart format: png or svg (default: png)
    --width <PIXELS>    Chart width (default: 1280)
    --height <PIXELS>   Chart height (default: 960)
    -h, --help          Show this help message

EXAMPLES:
    plot_results results.csv
    plot_results results.csv --out-dir charts --format svg
";
    let _ = io::stdout().write_all(text.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(args: &[&str]) -> i32 {
        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        run_cli(os_args)
    }

    #[test]
    fn test_help_flag_exits_zero() {
        assert_eq!(run_with(&["plot_results", "--help"]), 0);
    }

    #[test]
    fn test_no_args_shows_help_and_fails() {
        assert_eq!(run_with(&["plot_results"]), 2);
    }

    #[test]
    fn test_unknown_format_exits_two() {
        assert_eq!(
            run_with(&["plot_results", "results.csv", "--format", "pdf"]),
            2
        );
    }

    #[test]
    fn test_missing_results_file_exits_one() {
        assert_eq!(run_with(&["plot_results", "no-such-results.csv"]), 1);
    }

    #[test]
    fn test_too_few_rounds_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("results.csv");
        std::fs::write(
            &log,
            "test,dataset,param,condition,round,time\n\
             reify_n_concepts,1000,1,control,0,0.5\n\
             reify_n_concepts,1000,1,control,1,0.6\n",
        )
        .unwrap();
        let log_str = log.to_string_lossy().into_owned();
        assert_eq!(run_with(&["plot_results", &log_str]), 1);
    }

    #[test]
    fn test_empty_log_creates_out_dir_and_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("results.csv");
        std::fs::write(&log, "test,dataset,param,condition,round,time\n").unwrap();
        let log_str = log.to_string_lossy().into_owned();
        let charts = dir.path().join("charts");
        let charts_str = charts.to_string_lossy().into_owned();

        let code = run_with(&["plot_results", &log_str, "--out-dir", &charts_str]);
        assert_eq!(code, 0);
        assert!(charts.is_dir());
        assert_eq!(std::fs::read_dir(&charts).unwrap().count(), 0);
    }
}
