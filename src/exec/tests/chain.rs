//! Tests for two-stage piped execution.

use rstest::rstest;

use crate::exec::{CommandSpec, Runner};
use crate::report::Reporter;

fn runner() -> Runner {
    Runner::new(Reporter::new())
}

#[rstest]
fn chain_matches_a_direct_shell_pipe() {
    let result = runner()
        .chain(
            &CommandSpec::live("echo hello"),
            &CommandSpec::live("cat"),
            false,
        )
        .expect("pipeline should start");

    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.exit_code, 0);
}

#[rstest]
fn chain_transforms_data_between_the_stages() {
    let result = runner()
        .chain(
            &CommandSpec::live("printf 'a\\nb\\nc\\n'"),
            &CommandSpec::live("wc -l"),
            false,
        )
        .expect("pipeline should start");

    assert_eq!(result.stdout.trim(), "3");
}

#[rstest]
fn chain_survives_output_larger_than_the_pipe_buffer() {
    // Well past the usual 64 KiB pipe capacity; deadlocks here would hang
    // the test rather than fail it quickly, which is the failure mode the
    // drain-then-wait ordering prevents.
    let result = runner()
        .chain(
            &CommandSpec::live("i=0; while [ $i -lt 20000 ]; do echo 0123456789abcdef; i=$((i+1)); done"),
            &CommandSpec::live("wc -l"),
            false,
        )
        .expect("pipeline should start");

    assert_eq!(result.stdout.trim(), "20000");
    assert_eq!(result.exit_code, 0);
}

#[rstest]
fn chain_reports_a_failing_first_stage() {
    let result = runner()
        .chain(
            &CommandSpec::live("echo partial; exit 3"),
            &CommandSpec::live("cat"),
            false,
        )
        .expect("pipeline should start");

    assert_eq!(result.exit_code, 3);
    assert_eq!(result.stdout, "partial\n");
}

#[rstest]
fn chain_reports_a_failing_second_stage() {
    let result = runner()
        .chain(
            &CommandSpec::live("echo hello"),
            &CommandSpec::live("cat; exit 5"),
            false,
        )
        .expect("pipeline should start");

    assert_eq!(result.exit_code, 5);
}

#[rstest]
fn chain_discards_the_first_stage_stderr() {
    let result = runner()
        .chain(
            &CommandSpec::live("echo noise 1>&2; echo data"),
            &CommandSpec::live("cat"),
            false,
        )
        .expect("pipeline should start");

    assert_eq!(result.stdout, "data\n");
    assert!(result.stderr.is_empty());
}

#[rstest]
fn dry_chain_never_spawns_either_stage() {
    let result = runner()
        .chain(
            &CommandSpec::dry("exit 1"),
            &CommandSpec::live("exit 2"),
            true,
        )
        .expect("dry pipeline cannot fail");

    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.is_empty());
    assert!(result.stderr.is_empty());
}
