use crate::{TickOutcome, advance};

/// WHAT: A step below the threshold advances progress
/// WHY: Ordinary ticks must move the bar
#[test]
fn given_step_below_threshold_when_advancing_then_advanced() {
    // Given/When: 10% plus 5 against a threshold of 50
    let outcome = advance(10, 5, 50);

    // Then: Progress moves to 15
    assert_eq!(outcome, TickOutcome::Advanced(15));
}

/// WHAT: Crossing the threshold fails and holds the previous value
/// WHY: A failed upload shows where it stopped
#[test]
fn given_step_crossing_threshold_when_advancing_then_failed_at_previous() {
    // Given/When: 40% plus 12 against a threshold of 45
    let outcome = advance(40, 12, 45);

    // Then: Failed, still showing 40
    assert_eq!(outcome, TickOutcome::Failed(40));
}

/// WHAT: Landing exactly on the threshold counts as crossing it
/// WHY: The threshold is inclusive
#[test]
fn given_step_landing_on_threshold_when_advancing_then_failed() {
    // Given/When: 30% plus 5 against a threshold of 35
    let outcome = advance(30, 5, 35);

    // Then: Failed
    assert_eq!(outcome, TickOutcome::Failed(30));
}

/// WHAT: Reaching 100 completes, capped at 100
/// WHY: Progress never overshoots
#[test]
fn given_step_past_hundred_when_threshold_out_of_reach_then_completed() {
    // Given/When: 95% plus 12 with a threshold above 100
    let outcome = advance(95, 12, 150);

    // Then: Completed
    assert_eq!(outcome, TickOutcome::Completed);
}

/// WHAT: The threshold wins when one step reaches both it and 100
/// WHY: A drawn failure must always fire before success
#[test]
fn given_step_reaching_threshold_and_hundred_when_advancing_then_failed() {
    // Given/When: 92% plus 12 against a threshold of 98
    let outcome = advance(92, 12, 98);

    // Then: Failed
    assert_eq!(outcome, TickOutcome::Failed(92));
}
