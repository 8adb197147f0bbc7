//! Integration tests for the `example run` command.
use float_cmp::approx_eq;
use incentives::cli::RunOpts;
use incentives::cli::example::{example_names, handle_example_run_command};
use incentives::settings::Settings;
use itertools::Itertools;
use std::fs::{read_dir, read_to_string};
use std::path::Path;
use tempfile::tempdir;

const FLOAT_CMP_TOLERANCE: f64 = 1e-10;

fn run_example(name: &str, output_dir: &Path) {
    let opts = RunOpts {
        output_dir: Some(output_dir.to_path_buf()),
        ..RunOpts::default()
    };
    handle_example_run_command(name, &opts, Some(Settings::default())).unwrap();
}

/// Get the names of CSV files in the given folder
fn get_csv_file_names(dir_path: &Path) -> Vec<String> {
    read_dir(dir_path)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.ends_with(".csv"))
        .sorted()
        .collect()
}

/// Compare a field as a float if possible, falling back on string comparison
fn fields_match(f1: &str, f2: &str) -> bool {
    match (f1.parse::<f64>(), f2.parse::<f64>()) {
        (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => {
            approx_eq!(f64, x, y, epsilon = FLOAT_CMP_TOLERANCE)
        }
        _ => f1 == f2,
    }
}

fn compare_output_dirs(output_dir1: &Path, output_dir2: &Path) {
    let file_names = get_csv_file_names(output_dir1);
    assert_eq!(file_names, get_csv_file_names(output_dir2));

    let mut errors = Vec::new();
    for file_name in file_names {
        let contents1 = read_to_string(output_dir1.join(&file_name)).unwrap();
        let contents2 = read_to_string(output_dir2.join(&file_name)).unwrap();
        let lines1 = contents1.lines().collect_vec();
        let lines2 = contents2.lines().collect_vec();
        if lines1.len() != lines2.len() {
            errors.push(format!("{file_name}: Different number of lines"));
            continue;
        }

        for (num, (line1, line2)) in lines1.into_iter().zip(lines2).enumerate() {
            let fields1 = line1.split(',').collect_vec();
            let fields2 = line2.split(',').collect_vec();
            if fields1.len() != fields2.len()
                || !fields1.into_iter().zip(fields2).all(|(f1, f2)| fields_match(f1, f2))
            {
                errors.push(format!(
                    "{file_name}: line {num}:\n    + \"{line1}\"\n    - \"{line2}\""
                ));
            }
        }
    }

    assert!(
        errors.is_empty(),
        "The following errors occurred:\n  * {}",
        errors.join("\n  * ")
    );
}

/// Every example runs, and running it twice gives the same results
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("INCENTIVES_LOG_LEVEL", "off") };

    for name in example_names() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        run_example(name, first.path());
        run_example(name, second.path());
        compare_output_dirs(first.path(), second.path());
    }
}
