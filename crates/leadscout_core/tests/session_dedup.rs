use std::collections::BTreeSet;
use std::sync::Once;

use leadscout_core::{
    Accumulator, DiscoverySession, Entry, EntryId, HarvestMode, Record, Termination,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scout_logging::initialize_for_tests);
}

fn record(item_id: &str, emails: &[&str]) -> Record {
    Record {
        item_id: item_id.to_string(),
        author: format!("author of {item_id}"),
        profile_url: format!("https://feed.example/in/{item_id}"),
        emails: emails.iter().map(|e| e.to_string()).collect(),
        websites: BTreeSet::new(),
        text: format!("text of {item_id}"),
        raw_markup: None,
        keyword: "kw".to_string(),
    }
}

fn step(ids: &[&str]) -> Vec<(String, String)> {
    ids.iter().map(|id| (id.to_string(), id.to_string())).collect()
}

#[test]
fn overlapping_steps_collect_each_item_once() {
    init_logging();
    let mut session = DiscoverySession::new("kw", HarvestMode::Posts, 100);

    for ids in [&["a", "b", "c"][..], &["b", "c", "d", "e"][..], &["a", "e", "f"][..]] {
        session.begin_step();
        session.ingest(step(ids), |id| record(&id, &[]));
    }

    assert_eq!(session.collected().len(), 6);
    assert_eq!(session.seen_count(), 6);
    assert_eq!(session.records_scanned(), 6);
}

#[test]
fn ingest_uses_item_ids_for_identity() {
    let mut session = DiscoverySession::new("kw", HarvestMode::Posts, 100);
    let items = vec![
        ("a".to_string(), "a"),
        ("b".to_string(), "b"),
        ("a".to_string(), "a"),
    ];
    let scanned = session.ingest(items, |id| record(id, &[]));

    assert_eq!(scanned, 2);
    let ids: Vec<EntryId> = session.collected().iter().map(Entry::id).collect();
    assert_eq!(
        ids,
        vec![EntryId::Item("a".into()), EntryId::Item("b".into())]
    );
}

#[test]
fn ingest_stops_at_target_and_leaves_rest_unseen() {
    let mut session = DiscoverySession::new("kw", HarvestMode::Posts, 2);
    let items: Vec<(String, &str)> = ["a", "b", "c"].iter().map(|id| (id.to_string(), *id)).collect();
    session.ingest(items, |id| record(id, &[]));

    assert_eq!(session.collected().len(), 2);
    assert_eq!(session.seen_count(), 2);
    assert_eq!(session.check(false, false, 10), Some(Termination::Satisfied));
}

#[test]
fn leads_mode_keeps_first_record_per_email() {
    let mut session = DiscoverySession::new("kw", HarvestMode::Leads, 10)
        .with_known_emails(vec!["old@example.com".to_string()]);
    let items = vec![
        ("a".to_string(), record("a", &["x@example.com", "old@example.com"])),
        ("b".to_string(), record("b", &["x@example.com", "y@example.com"])),
        ("c".to_string(), record("c", &[])),
    ];
    session.ingest(items, |record| record);

    let leads: Vec<(String, String)> = session
        .collected()
        .iter()
        .map(|entry| match entry {
            Entry::Lead(lead) => (lead.email.clone(), lead.record.item_id.clone()),
            Entry::Post(_) => panic!("unexpected post in leads mode"),
        })
        .collect();
    assert_eq!(
        leads,
        vec![
            ("x@example.com".to_string(), "a".to_string()),
            ("y@example.com".to_string(), "b".to_string()),
        ]
    );
    assert_eq!(session.records_scanned(), 3);
}

#[test]
fn accumulator_dedups_posts_by_profile_and_text() {
    let mut acc = Accumulator::new();
    let first = record("a", &[]);
    let mut same_post_other_id = record("z", &[]);
    same_post_other_id.profile_url = first.profile_url.clone();
    same_post_other_id.text = first.text.clone();

    let added = acc.merge(vec![
        Entry::Post(first.clone()),
        Entry::Post(same_post_other_id),
        Entry::Post(record("b", &[])),
    ]);

    assert_eq!(added, 2);
    assert_eq!(acc.entries()[0], Entry::Post(first));
}
