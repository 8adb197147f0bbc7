//! Integration tests for the `run` command.
use incentives::cli::{RunOpts, handle_run_command};
use incentives::settings::Settings;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Get the path to one of the bundled example projects.
fn get_project_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn run_opts(output_dir: &Path) -> RunOpts {
    RunOpts {
        output_dir: Some(output_dir.to_path_buf()),
        ..RunOpts::default()
    }
}

/// An integration test for the `run` command.
///
/// Runs share a single test as the logger can only be initialised once.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("INCENTIVES_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let dir = tempdir().unwrap();
    let output_dir = dir.path().join("results");
    let opts = RunOpts {
        debug_output: true,
        ..run_opts(&output_dir)
    };
    handle_run_command(&get_project_dir("simple"), &opts, Some(Settings::default())).unwrap();
    for file_name in [
        "incentives.csv",
        "incentive_breakdown.csv",
        "debug_context.csv",
        "metadata.toml",
    ] {
        assert!(output_dir.join(file_name).is_file(), "{file_name} missing");
    }
    assert!(!output_dir.join("jurisdictions.csv").exists());

    // Running again into the same folder needs permission to overwrite
    assert!(
        handle_run_command(
            &get_project_dir("simple"),
            &run_opts(&output_dir),
            Some(Settings::default())
        )
        .is_err()
    );
    let opts = RunOpts {
        overwrite: true,
        ..run_opts(&output_dir)
    };
    handle_run_command(&get_project_dir("simple"), &opts, Some(Settings::default())).unwrap();
    assert!(!output_dir.join("debug_context.csv").exists());

    // Jurisdiction scenarios are written when the project has them
    let jurisdictions_dir = tempdir().unwrap();
    handle_run_command(
        &get_project_dir("jurisdictions"),
        &run_opts(jurisdictions_dir.path()),
        Some(Settings::default()),
    )
    .unwrap();

    let mut reader =
        csv::Reader::from_path(jurisdictions_dir.path().join("jurisdictions.csv")).unwrap();
    assert_eq!(reader.records().count(), 8);
}
