//! Benchmark session runner — expands a test matrix over datasets stored
//! in a delimited-text catalog, times each cell on process CPU time, and
//! appends results as delimited text to stdout or a log file.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use normbench::cases::TestCase;
use normbench::driver::{run_session, write_session_meta, SessionMeta};
use normbench::matrix::{expand_matrix, Condition, MatrixConfig};
use normbench::BenchError;

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
    let mut catalog_root = "benchmarks".to_owned();
    let mut sleep_secs: u64 = 1;
    let mut disable_teardown = false;
    let mut conditions: Option<Vec<Condition>> = None;
    let mut test_cases: Option<Vec<TestCase>> = None;
    let mut params: Option<Vec<u32>> = None;
    let mut output: Option<String> = None;

    let mut i = 0;
    while i < tail.len() {
        match tail[i].as_str() {
            "--catalog-root" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --catalog-root requires a directory argument");
                    return 2;
                }
                catalog_root.clone_from(&tail[i]);
            }
            "--sleep" => {
                i += 1;
                let Some(raw_secs) = tail.get(i) else {
                    eprintln!("error: --sleep requires an integer argument");
                    return 2;
                };
                let Ok(n) = raw_secs.parse::<u64>() else {
                    eprintln!("error: invalid integer for --sleep: `{raw_secs}`");
                    return 2;
                };
                sleep_secs = n;
            }
            "--disable-teardown" => disable_teardown = true,
            "--conditions" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --conditions requires a comma-separated list");
                    return 2;
                }
                let mut parsed = Vec::new();
                for part in tail[i].split(',').filter(|p| !p.is_empty()) {
                    match Condition::parse(part) {
                        Ok(condition) => parsed.push(condition),
                        Err(e) => {
                            eprintln!("error: {e}");
                            return 2;
                        }
                    }
                }
                conditions = Some(parsed);
            }
            "--testcases" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --testcases requires a comma-separated list");
                    return 2;
                }
                let mut parsed = Vec::new();
                for part in tail[i].split(',').filter(|p| !p.is_empty()) {
                    match TestCase::parse(part) {
                        Ok(case) => parsed.push(case),
                        Err(e) => {
                            eprintln!("error: {e}");
                            return 2;
                        }
                    }
                }
                test_cases = Some(parsed);
            }
            "--params" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --params requires a comma-separated list");
                    return 2;
                }
                let mut parsed = Vec::new();
                for part in tail[i].split(',').filter(|p| !p.is_empty()) {
                    let Ok(n) = part.parse::<u32>() else {
                        eprintln!("error: invalid integer for --params: `{part}`");
                        return 2;
                    };
                    parsed.push(n);
                }
                params = Some(parsed);
            }
            "--output" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --output requires a file argument");
                    return 2;
                }
                output = Some(tail[i].clone());
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

    let [datasets_raw, rounds_raw] = positional.as_slice() else {
        eprintln!("error: expected two positional arguments <DATASETS> <ROUNDS>");
        return 2;
    };
    let datasets: Vec<String> = datasets_raw
        .split(',')
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect();
    let Ok(rounds) = rounds_raw.parse::<u32>() else {
        eprintln!("error: invalid integer for <ROUNDS>: `{rounds_raw}`");
        return 2;
    };

    let mut config = MatrixConfig::new(&catalog_root, datasets);
    config.rounds = rounds;
    config.settle = Duration::from_secs(sleep_secs);
    config.disable_teardown = disable_teardown;
    config.params = params;
    if let Some(conditions) = conditions {
        config.conditions = conditions;
    }
    if let Some(test_cases) = test_cases {
        config.test_cases = test_cases;
    }

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        return 2;
    }
    let total_cells = expand_matrix(&config).len();

    let outcome = match &output {
        Some(path) => {
            let file = match File::create(path) {
                Ok(file) => file,
                Err(e) => {
                    eprintln!("error: cannot create `{path}`: {e}");
                    return 1;
                }
            };
            let meta = SessionMeta::from_config(&config, total_cells);
            let meta_path = format!("{path}.meta.json");
            if let Err(e) = write_session_meta(&meta, Path::new(&meta_path)) {
                eprintln!("error: cannot write `{meta_path}`: {e}");
                return 1;
            }
            run_session(&config, BufWriter::new(file))
        }
        None => {
            let stdout = io::stdout();
            run_session(&config, stdout.lock())
        }
    };

    match outcome {
        Ok(report) => {
            eprintln!("completed {} of {} cells", report.completed, report.total_cells);
            0
        }
        Err(e @ BenchError::Config(_)) => {
            eprintln!("error: {e}");
            2
        }
        Err(e) => {
            eprintln!("error: benchmark session failed: {e}");
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
bench_runner — Time schema-normalization test cases over a dataset matrix

USAGE:
    bench_runner <DATASETS> <ROUNDS> [OPTIONS]

ARGS:
    <DATASETS>    Comma-separated dataset table names in the catalog root
    <ROUNDS>      Rounds per (test case, param, condition) series

OPTIONS:
    --catalog-root <DIR>    Catalog root directory (default: benchmarks)
    --sleep <SECS>          Settle time between cells (default: 1)
    --conditions <LIST>     Conditions to run: control, optimized (default: both)
    --testcases <LIST>      Test cases to run (default: all)
    --params <LIST>         Override the per-case parameter lists
    --output <FILE>         Append results to a file instead of stdout;
                            also writes <FILE>.meta.json
    --disable-teardown      Keep transformation output for inspection;
                            requires a single-cell matrix
    -h, --help              Show this help message

EXAMPLES:
    bench_runner 1000 5
    bench_runner 100,1000,10000 7 --catalog-root benchmarks --output results.csv
    bench_runner 1000 1 --testcases reify_n_concepts --params 2 \\
        --conditions optimized --sleep 0 --disable-teardown
";
    let _ = io::stdout().write_all(text.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use normbench::results::read_results;

    fn run_with(args: &[&str]) -> i32 {
        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        run_cli(os_args)
    }

    fn seed_catalog() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = csv::Writer::from_path(dir.path().join("100.csv")).unwrap();
        writer
            .write_record(["data:key", "data:term:0", "subc0:key", "subc0:int:0"])
            .unwrap();
        for row in [
            ["0", "alpha", "0", "5"],
            ["1", "beta", "1", "6"],
            ["2", "alpha", "0", "5"],
        ] {
            writer.write_record(row).unwrap();
        }
        writer.flush().unwrap();
        dir
    }

    #[test]
    fn test_help_flag_exits_zero() {
        assert_eq!(run_with(&["bench_runner", "--help"]), 0);
        assert_eq!(run_with(&["bench_runner", "-h"]), 0);
    }

    #[test]
    fn test_no_args_shows_help_and_fails() {
        assert_eq!(run_with(&["bench_runner"]), 2);
    }

    #[test]
    fn test_bad_rounds_exits_two() {
        assert_eq!(run_with(&["bench_runner", "1000", "several"]), 2);
    }

    #[test]
    fn test_unknown_condition_exits_two() {
        assert_eq!(
            run_with(&["bench_runner", "1000", "1", "--conditions", "warmup"]),
            2
        );
    }

    #[test]
    fn test_unknown_testcase_exits_two() {
        assert_eq!(
            run_with(&["bench_runner", "1000", "1", "--testcases", "reify_everything"]),
            2
        );
    }

    #[test]
    fn test_wide_matrix_with_teardown_disabled_exits_two() {
        assert_eq!(
            run_with(&["bench_runner", "1000", "2", "--disable-teardown"]),
            2
        );
    }

    #[test]
    fn test_session_writes_results_and_meta() {
        let dir = seed_catalog();
        let root = dir.path().to_string_lossy().into_owned();
        let out = dir.path().join("results.csv");
        let out_str = out.to_string_lossy().into_owned();

        let code = run_with(&[
            "bench_runner",
            "100",
            "3",
            "--catalog-root",
            &root,
            "--testcases",
            "create_n_domains_from_n_columns",
            "--params",
            "1",
            "--sleep",
            "0",
            "--output",
            &out_str,
        ]);
        assert_eq!(code, 0);

        let records = read_results(File::open(&out).unwrap()).unwrap();
        assert_eq!(records.len(), 6);

        let meta_text =
            std::fs::read_to_string(dir.path().join("results.csv.meta.json")).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&meta_text).unwrap();
        assert_eq!(meta["total_cells"], 6);
        assert_eq!(meta["rounds"], 3);
    }

    #[test]
    fn test_missing_dataset_exits_one() {
        let dir = seed_catalog();
        let root = dir.path().to_string_lossy().into_owned();
        let out = dir.path().join("results.csv");
        let out_str = out.to_string_lossy().into_owned();

        let code = run_with(&[
            "bench_runner",
            "9999",
            "1",
            "--catalog-root",
            &root,
            "--testcases",
            "create_n_domains_from_n_columns",
            "--params",
            "1",
            "--sleep",
            "0",
            "--output",
            &out_str,
        ]);
        assert_eq!(code, 1);
    }
}
