use std::time::Duration;

use leadscout_core::{BackoffPolicy, RateState};

fn policy() -> BackoffPolicy {
    BackoffPolicy {
        base_delay: Duration::from_secs(4),
        max_delay: Duration::from_secs(30),
        cooldown_after: 3,
        cooldown: Duration::from_secs(60),
        max_attempts: 3,
    }
}

#[test]
fn delay_doubles_up_to_the_cap() {
    let policy = policy();
    let mut state = RateState::new(&policy);

    let mut waits = Vec::new();
    let mut delays = Vec::new();
    for _ in 0..5 {
        let prev = state.current_delay();
        let step = state.on_rate_limited(&policy);
        waits.push(step.wait.as_secs());
        assert_eq!(state.current_delay(), (prev * 2).min(policy.max_delay));
        delays.push(state.current_delay().as_secs());
    }

    assert_eq!(waits, vec![4, 8, 16, 30, 30]);
    assert_eq!(delays, vec![8, 16, 30, 30, 30]);
}

#[test]
fn third_consecutive_hit_triggers_one_cooldown() {
    let policy = policy();
    let mut state = RateState::new(&policy);

    let cooldowns: Vec<Option<Duration>> = (0..6)
        .map(|_| state.on_rate_limited(&policy).cooldown)
        .collect();

    assert_eq!(
        cooldowns,
        vec![
            None,
            None,
            Some(Duration::from_secs(60)),
            None,
            None,
            Some(Duration::from_secs(60)),
        ]
    );
}

#[test]
fn fourth_hit_starts_a_new_count() {
    let policy = policy();
    let mut state = RateState::new(&policy);
    for _ in 0..3 {
        state.on_rate_limited(&policy);
    }
    assert_eq!(state.consecutive_rate_limit_hits(), 0);

    state.on_rate_limited(&policy);
    assert_eq!(state.consecutive_rate_limit_hits(), 1);
}

#[test]
fn success_resets_hits_and_delay() {
    let policy = policy();
    let mut state = RateState::new(&policy);
    state.on_rate_limited(&policy);
    state.on_rate_limited(&policy);

    state.on_success(&policy);
    assert_eq!(state.consecutive_rate_limit_hits(), 0);
    assert_eq!(state.current_delay(), policy.base_delay);
}

#[test]
fn other_error_resets_delay_only() {
    let policy = policy();
    let mut state = RateState::new(&policy);
    state.on_rate_limited(&policy);

    state.on_other_error(&policy);
    assert_eq!(state.current_delay(), policy.base_delay);
    assert_eq!(state.consecutive_rate_limit_hits(), 1);
}
