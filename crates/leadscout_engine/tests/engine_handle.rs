mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use leadscout_engine::{
    DiscoverySettings, EngineEvent, EngineHandle, EngineParts, EngineSettings, HarvestEvent,
    SelectorExtractor, SelectorPolicy,
};

use common::{feed, init_logging, FakeFactory, ScriptedBrowser, ScriptedGenerator};

fn handle() -> EngineHandle {
    init_logging();
    let primary = Arc::new(ScriptedBrowser::single(vec![feed(&["a", "b", "c"])]));
    let settings = EngineSettings {
        discovery: DiscoverySettings {
            step_delay: Duration::from_millis(1),
            ..DiscoverySettings::default()
        },
        ..EngineSettings::default()
    };
    let parts = EngineParts {
        sessions: Arc::new(FakeFactory::new(primary, Vec::new())),
        extractor: Arc::new(SelectorExtractor::new(SelectorPolicy::default()).unwrap()),
        generator: Arc::new(ScriptedGenerator::default()),
    };
    EngineHandle::new(settings, parts).expect("engine starts")
}

/// Collect events until `done` matches one, or fail after a few seconds.
fn wait_for(handle: &EngineHandle, done: impl Fn(&EngineEvent) -> bool) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = handle.recv_timeout(Duration::from_millis(100)) {
            let finished = done(&event);
            events.push(event);
            if finished {
                return events;
            }
        }
    }
    panic!("engine did not finish in time; saw {} events", events.len());
}

#[test]
fn harvest_then_enrich_through_the_handle() {
    let handle = handle();

    handle.harvest(vec!["designer".to_string()]);
    let events = wait_for(&handle, |event| matches!(event, EngineEvent::HarvestFinished(_)));

    assert!(events.iter().any(|event| matches!(
        event,
        EngineEvent::Harvest(HarvestEvent::SessionStarted { .. })
    )));
    let summary = match events.last() {
        Some(EngineEvent::HarvestFinished(summary)) => summary.clone(),
        other => panic!("unexpected final event {other:?}"),
    };
    assert_eq!(summary.entries.len(), 3);
    assert_eq!(handle.results().merged.len(), 3);

    handle.enrich(summary.entries);
    let events = wait_for(&handle, |event| {
        matches!(event, EngineEvent::EnrichmentFinished { .. })
    });
    let enriched = events
        .iter()
        .filter(|event| matches!(event, EngineEvent::Enriched(_)))
        .count();
    assert_eq!(enriched, 3);
    assert!(matches!(
        events.last(),
        Some(EngineEvent::EnrichmentFinished {
            succeeded: 3,
            failed: 0
        })
    ));
}

#[test]
fn pause_without_a_running_harvest_is_harmless() {
    let handle = handle();
    handle.pause();
    assert!(handle.results().merged.is_empty());
    assert!(handle.try_recv().is_none());
}
