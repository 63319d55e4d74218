//! Dataset generator — produces synthetic delimited datasets with
//! embedded subconcepts, term columns, and term-list columns, sized for
//! normalization benchmarks.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use normbench::dataset::{write_dataset, DatasetSpec};
use normbench::naming::ColumnKind;
use normbench::terms::load_term_source;
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
    let mut name = "data".to_owned();
    let mut kinds: Option<Vec<ColumnKind>> = None;
    let mut terms_path: Option<String> = None;
    let mut terms_sample_size: Option<usize> = None;
    let mut num_term_columns: usize = 1;
    let mut num_term_list_columns: usize = 0;
    let mut max_term_list_choices: usize = 2;
    let mut num_subconcepts: usize = 1;
    let mut num_subconcept_rows: Option<usize> = None;
    let mut output: Option<String> = None;
    let mut seed: Option<u64> = None;

    let mut i = 0;
    while i < tail.len() {
        match tail[i].as_str() {
            "--name" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --name requires a label argument");
                    return 2;
                }
                name.clone_from(&tail[i]);
            }
            "--ctypes" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --ctypes requires a comma-separated list");
                    return 2;
                }
                let mut parsed = Vec::new();
                for part in tail[i].split(',').filter(|p| !p.is_empty()) {
                    let Some(kind) = ColumnKind::parse(part) else {
                        eprintln!("error: unknown column kind `{part}` (expected int, float, or text)");
                        return 2;
                    };
                    parsed.push(kind);
                }
                kinds = Some(parsed);
            }
            "--terms" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --terms requires a file argument");
                    return 2;
                }
                terms_path = Some(tail[i].clone());
            }
            "--terms-sample-size" => {
                i += 1;
                let Some(n) = parse_count(tail.get(i), "--terms-sample-size") else {
                    return 2;
                };
                terms_sample_size = Some(n);
            }
            "--num-term-columns" => {
                i += 1;
                let Some(n) = parse_count(tail.get(i), "--num-term-columns") else {
                    return 2;
                };
                num_term_columns = n;
            }
            "--num-term-list-columns" => {
                i += 1;
                let Some(n) = parse_count(tail.get(i), "--num-term-list-columns") else {
                    return 2;
                };
                num_term_list_columns = n;
            }
            "--max-term-list-choices" => {
                i += 1;
                let Some(n) = parse_count(tail.get(i), "--max-term-list-choices") else {
                    return 2;
                };
                max_term_list_choices = n;
            }
            "--num-sub-concepts" => {
                i += 1;
                let Some(n) = parse_count(tail.get(i), "--num-sub-concepts") else {
                    return 2;
                };
                num_subconcepts = n;
            }
            "--num-sub-concept-rows" => {
                i += 1;
                let Some(n) = parse_count(tail.get(i), "--num-sub-concept-rows") else {
                    return 2;
                };
                num_subconcept_rows = Some(n);
            }
            "--output" => {
                i += 1;
                if i >= tail.len() {
                    eprintln!("error: --output requires a file argument");
                    return 2;
                }
                output = Some(tail[i].clone());
            }
            "--seed" => {
                i += 1;
                let Some(raw_seed) = tail.get(i) else {
                    eprintln!("error: --seed requires an integer argument");
                    return 2;
                };
                let Ok(n) = raw_seed.parse::<u64>() else {
                    eprintln!("error: invalid integer for --seed: `{raw_seed}`");
                    return 2;
                };
                seed = Some(n);
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

    let [num_rows_raw] = positional.as_slice() else {
        eprintln!("error: expected exactly one positional argument <NUM_ROWS>");
        return 2;
    };
    let Ok(num_rows) = num_rows_raw.parse::<usize>() else {
        eprintln!("error: invalid integer for <NUM_ROWS>: `{num_rows_raw}`");
        return 2;
    };

    let needs_terms = num_term_columns > 0 || num_term_list_columns > 0;
    let term_source = if needs_terms {
        let Some(path) = &terms_path else {
            eprintln!("error: --terms is required when term or term-list columns are requested");
            return 2;
        };
        match load_term_source(Path::new(path)) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("error: failed to load terms from `{path}`: {e}");
                return 1;
            }
        }
    } else {
        Vec::new()
    };

    let mut spec = DatasetSpec::new(num_rows, term_source);
    spec.label = name;
    if let Some(kinds) = kinds {
        spec.kinds = kinds;
    }
    spec.terms_sample_size = terms_sample_size;
    spec.num_term_columns = num_term_columns;
    spec.num_term_list_columns = num_term_list_columns;
    spec.max_term_list_choices = max_term_list_choices;
    spec.num_subconcepts = num_subconcepts;
    spec.num_subconcept_rows = num_subconcept_rows;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let result = match &output {
        Some(path) => File::create(path)
            .map_err(BenchError::from)
            .and_then(|file| write_dataset(&spec, &mut rng, BufWriter::new(file))),
        None => {
            let stdout = io::stdout();
            write_dataset(&spec, &mut rng, stdout.lock())
        }
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: dataset generation failed: {e}");
            1
        }
    }
}

fn parse_count(raw: Option<&String>, flag: &str) -> Option<usize> {
    let Some(raw) = raw else {
        eprintln!("error: {flag} requires an integer argument");
        return None;
    };
    let Ok(n) = raw.parse::<usize>() else {
        eprintln!("error: invalid integer for {flag}: `{raw}`");
        return None;
    };
    Some(n)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn print_help() {
    let text = "\
datagen — Generate synthetic delimited datasets for normalization benchmarks

USAGE:
    datagen <NUM_ROWS> [OPTIONS]

OPTIONS:
    --name <LABEL>               Entity label for the top-level concept (default: data)
    --ctypes <LIST>              Comma-separated column kinds: int, float, text
                                 (default: text,int,float)
    --terms <FILE>               Term source file, one term per line
    --terms-sample-size <N>      Terms drawn per pool (default: rows/10, min 10)
    --num-term-columns <N>       Plain term columns per entity (default: 1)
    --num-term-list-columns <N>  Term-list columns per entity (default: 0)
    --max-term-list-choices <N>  Most list elements per value (default: 2)
    --num-sub-concepts <N>       Embedded subconcepts (default: 1)
    --num-sub-concept-rows <N>   Rows per subconcept pool (default: rows/2, min 10)
    --output <FILE>              Write to a file instead of stdout
    --seed <N>                   Seed the generator for reproducible output
    -h, --help                   Show this help message

EXAMPLES:
    datagen 1000 --terms terms.txt --output benchmarks/1000.csv
    datagen 250 --terms terms.txt --num-term-list-columns 1 --seed 42
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

    fn terms_file(dir: &Path) -> String {
        let path = dir.join("terms.txt");
        let lines: Vec<String> = (0..30).map(|i| format!("term{i:02}")).collect();
        std::fs::write(&path, lines.join("\n")).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_help_flag_exits_zero() {
        assert_eq!(run_with(&["datagen", "--help"]), 0);
        assert_eq!(run_with(&["datagen", "-h"]), 0);
    }

    #[test]
    fn test_no_args_shows_help_and_fails() {
        assert_eq!(run_with(&["datagen"]), 2);
    }

    #[test]
    fn test_unknown_option_exits_two() {
        assert_eq!(run_with(&["datagen", "100", "--frobnicate"]), 2);
    }

    #[test]
    fn test_bad_row_count_exits_two() {
        assert_eq!(run_with(&["datagen", "lots"]), 2);
    }

    #[test]
    fn test_terms_required_for_term_columns() {
        assert_eq!(run_with(&["datagen", "100"]), 2);
    }

    #[test]
    fn test_bad_column_kind_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        let terms = terms_file(dir.path());
        assert_eq!(
            run_with(&["datagen", "100", "--terms", &terms, "--ctypes", "text,bool"]),
            2
        );
    }

    #[test]
    fn test_generates_dataset_file() {
        let dir = tempfile::tempdir().unwrap();
        let terms = terms_file(dir.path());
        let out = dir.path().join("100.csv");
        let out_str = out.to_string_lossy().into_owned();

        let code = run_with(&[
            "datagen", "100", "--terms", &terms, "--output", &out_str, "--seed", "7",
        ]);
        assert_eq!(code, 0);

        let text = std::fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("data:key,"));
        assert!(header.contains("subc0:key"));
        assert_eq!(lines.count(), 100);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let terms = terms_file(dir.path());
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        let a_str = a.to_string_lossy().into_owned();
        let b_str = b.to_string_lossy().into_owned();

        let args = |out: &str| {
            vec![
                "datagen".to_owned(),
                "50".to_owned(),
                "--terms".to_owned(),
                terms.clone(),
                "--num-term-list-columns".to_owned(),
                "1".to_owned(),
                "--seed".to_owned(),
                "99".to_owned(),
                "--output".to_owned(),
                out.to_owned(),
            ]
        };
        let run = |argv: Vec<String>| run_cli(argv.into_iter().map(OsString::from));
        assert_eq!(run(args(&a_str)), 0);
        assert_eq!(run(args(&b_str)), 0);

        assert_eq!(
            std::fs::read_to_string(&a).unwrap(),
            std::fs::read_to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_plain_columns_need_no_terms() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plain.csv");
        let out_str = out.to_string_lossy().into_owned();
        let code = run_with(&[
            "datagen",
            "10",
            "--num-term-columns",
            "0",
            "--num-sub-concepts",
            "0",
            "--output",
            &out_str,
        ]);
        assert_eq!(code, 0);
        assert!(out.exists());
    }
}
