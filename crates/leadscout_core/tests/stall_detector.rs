use leadscout_core::{StallDetector, StepCheck, Termination, ExhaustReason};

#[test]
fn first_observation_is_never_stale() {
    let mut detector = StallDetector::new();
    let signal = detector.observe(&["a", "b", "c"]);
    assert!(!signal.is_stale);
    assert_eq!(signal.consecutive_stale_count, 0);
    assert!(!signal.exhausted);
}

#[test]
fn repeated_leading_ids_exhaust_after_three_stale_steps() {
    let mut detector = StallDetector::new();
    detector.observe(&["a", "b", "c"]);

    let counts: Vec<(u32, bool)> = (0..3)
        .map(|_| {
            let signal = detector.observe(&["a", "b", "c"]);
            (signal.consecutive_stale_count, signal.exhausted)
        })
        .collect();

    assert_eq!(counts, vec![(1, false), (2, false), (3, true)]);
}

#[test]
fn change_resets_the_counter() {
    let mut detector = StallDetector::new();
    detector.observe(&["a", "b", "c"]);
    detector.observe(&["a", "b", "c"]);
    detector.observe(&["a", "b", "c"]);
    assert_eq!(detector.stale_count(), 2);

    let signal = detector.observe(&["d", "e", "f"]);
    assert!(!signal.is_stale);
    assert_eq!(signal.consecutive_stale_count, 0);
}

#[test]
fn comparison_is_order_sensitive_and_limited_to_three() {
    let mut detector = StallDetector::new();
    detector.observe(&["a", "b", "c", "x"]);
    assert!(detector.observe(&["a", "b", "c", "y"]).is_stale);
    assert!(!detector.observe(&["b", "a", "c"]).is_stale);
}

#[test]
fn empty_pages_count_as_stale_after_the_first() {
    let mut detector = StallDetector::new();
    let empty: [&str; 0] = [];
    assert!(!detector.observe(&empty).is_stale);
    assert!(detector.observe(&empty).is_stale);
}

#[test]
fn step_check_respects_priority_order() {
    let all = StepCheck {
        paused: true,
        collected: 10,
        target: 5,
        timed_out: true,
        scroll_step: 20,
        max_steps: 20,
        stalled: true,
    };
    assert_eq!(all.evaluate(), Some(Termination::Paused));

    let not_paused = StepCheck { paused: false, ..all };
    assert_eq!(not_paused.evaluate(), Some(Termination::Satisfied));

    let under_target = StepCheck { collected: 1, ..not_paused };
    assert_eq!(under_target.evaluate(), Some(Termination::TimedOut));

    let in_time = StepCheck { timed_out: false, ..under_target };
    assert_eq!(
        in_time.evaluate(),
        Some(Termination::Exhausted(ExhaustReason::StepLimit))
    );

    let steps_left = StepCheck { scroll_step: 3, ..in_time };
    assert_eq!(
        steps_left.evaluate(),
        Some(Termination::Exhausted(ExhaustReason::Stall))
    );

    let running = StepCheck { stalled: false, ..steps_left };
    assert_eq!(running.evaluate(), None);
}
