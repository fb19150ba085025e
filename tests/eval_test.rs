//! Integration tests for the sandboxed evaluator
//! Run with: cargo test --test eval_test
//!
//! These spawn the real worker process (the bot binary in eval-worker
//! mode), so they exercise the spawn / pipe / kill lifecycle end to end.

use std::time::Duration;

use parley_bot::infrastructure::sandbox::Evaluator;

fn evaluator(timeout_ms: u64) -> Evaluator {
    Evaluator::with_program(
        env!("CARGO_BIN_EXE_parley-bot"),
        Duration::from_millis(timeout_ms),
    )
}

#[test]
fn successful_evaluation_is_prefixed() {
    let mut evaluator = evaluator(5000);
    assert_eq!(evaluator.evaluate("2 + 2"), "= 4");
    assert_eq!(evaluator.evaluate("1/4"), "= 0.25");
}

#[test]
fn division_by_zero_is_categorized() {
    let mut evaluator = evaluator(5000);
    assert_eq!(evaluator.evaluate("1/0"), "Division by zero.");
}

#[test]
fn worker_survives_evaluation_errors() {
    let mut evaluator = evaluator(5000);
    assert_eq!(evaluator.evaluate("nonsense("), "Syntax error.");
    assert_eq!(evaluator.evaluate("no_such_fn(1)"), "Unknown or forbidden function.");
    // Same worker keeps serving afterwards.
    assert_eq!(evaluator.evaluate("3 * 7"), "= 21");
}

#[test]
fn session_state_persists_between_calls() {
    let mut evaluator = evaluator(5000);
    assert_eq!(evaluator.evaluate("ans"), "Key not found.");
    assert_eq!(evaluator.evaluate("2 + 3"), "= 5");
    assert_eq!(evaluator.evaluate("ans * 2"), "= 10");
}

#[test]
fn timeout_kills_the_worker_and_respawns_it() {
    let mut evaluator = evaluator(400);
    // A naive sum over a huge range legitimately outruns the budget.
    assert_eq!(
        evaluator.evaluate("sum(0, 4000000000000)"),
        "Operation timed out."
    );
    // The next call transparently gets a fresh worker; the old session's
    // state is gone with it.
    assert_eq!(evaluator.evaluate("2 + 2"), "= 4");
    assert_eq!(evaluator.evaluate("ans"), "= 4");
}

#[test]
fn oversized_results_are_suppressed() {
    let mut evaluator = evaluator(5000);
    assert_eq!(evaluator.evaluate("seq(1, 400)"), "Too long result.");
}

#[test]
fn resource_exhaustion_is_out_of_memory() {
    let mut evaluator = evaluator(5000);
    assert_eq!(evaluator.evaluate("seq(1, 10000000)"), "Out of memory.");
}

#[test]
fn newlines_cannot_smuggle_extra_messages() {
    let mut evaluator = evaluator(5000);
    // The injected newline is stripped, leaving one (invalid) expression.
    assert_eq!(evaluator.evaluate("1+\n1+1"), "= 3");
    assert_eq!(evaluator.evaluate("2*2"), "= 4");
}
