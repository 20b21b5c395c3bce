//! End-to-end behaviour of snapshot, delta and push over the built-in kinds.

use chrono::Duration;
use dayline_core::payload::{HabitCompletionPayload, HabitPayload};
use dayline_core::{Cursor, OwnerId, SystemClock};
use dayline_store::{tables, Store, StoreResult};
use dayline_sync_engine::kinds::tags;
use dayline_sync_engine::{
    Catalog, DeletePolicy, EngineError, EngineOptions, IdentityAddressed, NaturalKeyUpsert,
    SyncEngine,
};
use dayline_testkit::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

/// One create per kind, parents first. Returns (tag, bucket, payload, server id).
fn create_one_of_each(harness: &TestHarness) -> Vec<(&'static str, &'static str, Value, String)> {
    let mut created = Vec::new();
    let mut create = |tag: &'static str, bucket: &'static str, data: Value| {
        let id = harness.create(&format!("local-{tag}"), tag, data.clone());
        created.push((tag, bucket, data, id.clone()));
        id
    };

    let habit = create(tags::HABIT, "habits", payloads::habit("Read"));
    create(
        tags::HABIT_COMPLETION,
        "habitCompletions",
        payloads::habit_completion(&habit, &day(1), true),
    );
    let medication = create(tags::MEDICATION, "medications", payloads::medication("Vitamin D"));
    create(
        tags::MEDICATION_LOG,
        "medicationLogs",
        payloads::medication_log(&medication, &day(1), 1, true),
    );
    create(tags::TODO, "todos", payloads::todo("Call mum", &day(1)));
    create(tags::NOTE, "dailyNotes", payloads::note("Quiet day", &day(1)));
    create(tags::MOOD, "moodRatings", payloads::mood(4, &day(1)));
    create(tags::EVENT, "events", payloads::event("Trip", &day(2)));
    create(tags::WORKOUT, "workoutTemplates", payloads::workout("Legs"));
    create(
        tags::WORKOUT_LOG,
        "workoutLogs",
        payloads::workout_log("Legs", &day(1), 72.5),
    );
    create(
        tags::MARKDOWN_NOTE,
        "markdownNotes",
        payloads::markdown_note("Hello", "# Hi"),
    );
    create(
        tags::USER_SETTINGS,
        "userSettings",
        payloads::user_settings(&[("habits", true), ("mood", false)]),
    );
    created
}

#[test]
fn round_trip_every_kind() {
    let harness = TestHarness::new();
    let created = create_one_of_each(&harness);
    assert_eq!(created.len(), harness.engine.catalog().len());

    let snapshot = harness.snapshot();
    for (tag, bucket, data, id) in &created {
        let records = snapshot.data.get(bucket).unwrap();
        assert_eq!(records.len(), 1, "{tag}");
        let record = find_record(records, id).unwrap();
        assert!(record_matches(record, data), "{tag}: {record} vs {data}");
        assert_eq!(record["user_id"], json!(harness.owner.to_string()));
        assert_eq!(record["is_deleted"], json!(false));
    }
}

#[test]
fn snapshot_lists_every_bucket_even_when_empty() {
    let harness = TestHarness::new();
    let snapshot = harness.snapshot();
    assert_eq!(snapshot.data.len(), harness.engine.catalog().len());
    assert_eq!(snapshot.data.record_count(), 0);
    assert!(snapshot.failed_kinds.is_empty());
}

#[test]
fn idempotent_replay() {
    let harness = TestHarness::new();
    let item = PushItem::new("local-1", tags::TODO, payloads::todo("Water plants", &day(3)));

    let first = harness.push_one(item.clone());
    let server_id = first.server_id.clone().unwrap();
    let second = harness.push_one(item.with_server_id(server_id.clone()));

    assert!(second.success);
    assert_eq!(second.server_id.as_deref(), Some(server_id.as_str()));
    assert_eq!(second.local_id, "local-1");
    assert_eq!(harness.row_count(tags::TODO), 1);
}

#[test]
fn delta_from_epoch_equals_snapshot() {
    let harness = TestHarness::new();
    create_one_of_each(&harness);

    let snapshot = harness.snapshot();
    let delta = harness.delta(Cursor::EPOCH);
    assert_eq!(delta.data, snapshot.data);
    assert!(delta.last_sync_timestamp > snapshot.last_sync_timestamp);
}

#[test]
fn delta_omits_unchanged_buckets() {
    let harness = TestHarness::new();
    create_one_of_each(&harness);
    let cursor = harness.snapshot().last_sync_timestamp;

    harness.tick(Duration::seconds(5));
    harness.push_one(PushItem::new("m2", tags::MOOD, payloads::mood(2, &day(2))));

    let delta = harness.delta(cursor);
    assert_eq!(delta.data.buckets().collect::<Vec<_>>(), vec!["moodRatings"]);
    assert_eq!(delta.data.get("moodRatings").unwrap().len(), 1);

    let quiet = harness.delta(delta.last_sync_timestamp);
    assert!(quiet.data.is_empty());
}

#[test]
fn cursor_never_misses_a_committed_write() {
    let harness = TestHarness::new();
    let mut cursor = harness.snapshot().last_sync_timestamp;
    let mut seen = 0;

    for i in 0..20 {
        harness.push_one(PushItem::new(
            format!("t{i}"),
            tags::TODO,
            payloads::todo(&format!("task {i}"), &day(1)),
        ));
        let delta = harness.delta(cursor);
        seen += delta.data.get("todos").map_or(0, <[Value]>::len);
        assert!(delta.last_sync_timestamp > cursor);
        cursor = delta.last_sync_timestamp;
    }
    assert_eq!(seen, 20);
}

#[test]
fn soft_delete_visibility() {
    let harness = TestHarness::new();
    let id = harness.create("h1", tags::HABIT, payloads::habit("Floss"));
    let before_delete = harness.snapshot().last_sync_timestamp;

    let result = harness.push_one(PushItem::deletion("h1", tags::HABIT, Some(id.clone())));
    assert!(result.success);
    assert_eq!(result.server_id.as_deref(), Some(id.as_str()));

    assert!(harness.current(tags::HABIT).is_empty());

    let snapshot = harness.snapshot();
    let record = find_record(snapshot.data.get("habits").unwrap(), &id).unwrap();
    assert_eq!(record["is_deleted"], json!(true));

    let delta = harness.delta(before_delete);
    let record = find_record(delta.data.get("habits").unwrap(), &id).unwrap();
    assert_eq!(record["is_deleted"], json!(true));

    // Replaying the delete is harmless.
    let replay = harness.push_one(PushItem::deletion("h1", tags::HABIT, Some(id)));
    assert!(replay.success);
    assert_eq!(harness.row_count(tags::HABIT), 1);
}

#[test]
fn update_keeps_tombstone_until_recreated() {
    let harness = TestHarness::new();
    let id = harness.create("n1", tags::MARKDOWN_NOTE, payloads::markdown_note("Draft", ""));
    harness.push_one(PushItem::deletion("n1", tags::MARKDOWN_NOTE, Some(id.clone())));

    let edited = payloads::markdown_note("Draft", "late edit");
    let result = harness.push_one(PushItem::new("n1", tags::MARKDOWN_NOTE, edited).with_server_id(id));
    assert!(result.success);
    assert!(harness.current(tags::MARKDOWN_NOTE).is_empty());
}

#[test]
fn partial_batch_success() {
    let harness = TestHarness::new();
    let results = harness.push_request(vec![
        PushItem::new("a", tags::TODO, payloads::todo("first", &day(1))),
        PushItem::new("b", "sleep", json!({"hours": 8})),
        PushItem::new("c", tags::TODO, payloads::todo("third", &day(1))),
    ]);

    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].local_id, "b");
    assert_eq!(results[1].error.as_deref(), Some("Unknown item type: sleep"));
    assert!(results[1].server_id.is_none());
    assert!(results[2].success);
    assert_eq!(harness.row_count(tags::TODO), 2);
}

#[test]
fn item_errors_are_reported_inline() {
    let harness = TestHarness::new();
    let results = harness.push(vec![
        PushItem::new("bad-shape", tags::MOOD, json!({"rating": "great"})),
        PushItem::new("bad-value", tags::MOOD, payloads::mood(9, &day(1))),
        PushItem::new("bad-id", tags::TODO, payloads::todo("x", &day(1))).with_server_id("nope"),
        PushItem::new("missing", tags::TODO, payloads::todo("x", &day(1)))
            .with_server_id(dayline_core::ServerId::new().to_string()),
        PushItem::new(
            "orphan",
            tags::HABIT_COMPLETION,
            payloads::habit_completion(&dayline_core::ServerId::new().to_string(), &day(1), true),
        ),
    ]);

    assert_eq!(results.len(), 5);
    for result in &results {
        assert!(!result.success, "{} should fail", result.local_id);
        assert!(result.error.is_some());
    }
    assert!(results[0].error.as_deref().unwrap().starts_with("invalid mood data"));
    assert!(results[2].error.as_deref().unwrap().contains("invalid server id"));
    assert_eq!(harness.snapshot().data.record_count(), 0);
}

#[test]
fn natural_key_uniqueness_across_batches() {
    let harness = TestHarness::new();
    let first = harness.push(vec![
        PushItem::new("m1", tags::MOOD, payloads::mood(2, &day(5))),
        PushItem::new("m2", tags::MOOD, payloads::mood(3, &day(5))),
    ]);
    let second = harness.push_one(PushItem::new("m3", tags::MOOD, payloads::mood(5, &day(5))));

    assert_eq!(first[0].server_id, first[1].server_id);
    assert_eq!(first[0].server_id, second.server_id);

    let moods = harness.current(tags::MOOD);
    assert_eq!(moods.len(), 1);
    assert_eq!(moods[0]["rating"], json!(5));
}

#[test]
fn natural_key_ignores_supplied_server_id() {
    let harness = TestHarness::new();
    let id = harness.create("n1", tags::NOTE, payloads::note("morning", &day(7)));
    let stray = dayline_core::ServerId::new().to_string();

    let result = harness.push_one(
        PushItem::new("n2", tags::NOTE, payloads::note("evening", &day(7))).with_server_id(stray),
    );
    assert!(result.success);
    assert_eq!(result.server_id.as_deref(), Some(id.as_str()));
    assert_eq!(harness.row_count(tags::NOTE), 1);
}

#[test]
fn medication_logs_are_keyed_by_dose() {
    let harness = TestHarness::new();
    let med = harness.create("med", tags::MEDICATION, payloads::medication("Iron"));

    harness.push(vec![
        PushItem::new("d1", tags::MEDICATION_LOG, payloads::medication_log(&med, &day(1), 1, true)),
        PushItem::new("d2", tags::MEDICATION_LOG, payloads::medication_log(&med, &day(1), 2, false)),
        PushItem::new("d2b", tags::MEDICATION_LOG, payloads::medication_log(&med, &day(1), 2, true)),
    ]);

    let logs = harness.current(tags::MEDICATION_LOG);
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|log| log["taken"] == json!(true)));
}

#[test]
fn never_synced_deletion_is_a_no_op() {
    let harness = TestHarness::new();
    let before = harness.store().counts(None).unwrap();

    for tag in harness.engine.catalog().tags() {
        let result = harness.push_one(PushItem::deletion("offline", tag, None));
        assert!(result.success, "{tag}");
        assert!(result.server_id.is_none(), "{tag}");
    }

    assert_eq!(harness.store().counts(None).unwrap(), before);
}

#[test]
fn natural_key_deletion_is_acknowledged_without_removing() {
    let harness = TestHarness::new();
    let id = harness.create("m", tags::MOOD, payloads::mood(3, &day(1)));

    let result = harness.push_one(PushItem::deletion("m", tags::MOOD, Some(id.clone())));
    assert!(result.success);
    assert_eq!(result.server_id.as_deref(), Some(id.as_str()));
    assert_eq!(harness.current(tags::MOOD).len(), 1);
}

#[test]
fn settings_create_path_reuses_the_owner_row() {
    let harness = TestHarness::new();
    let first = harness.create("s1", tags::USER_SETTINGS, payloads::user_settings(&[("habits", true)]));
    harness.push_one(PushItem::deletion("s1", tags::USER_SETTINGS, Some(first.clone())));

    // A second device that never saw the first row creates settings again.
    let second = harness.create("s2", tags::USER_SETTINGS, payloads::user_settings(&[("mood", true)]));
    assert_eq!(first, second);

    let settings = harness.current(tags::USER_SETTINGS);
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0]["section_configs"][0]["id"], json!("mood"));
}

#[test]
fn owners_never_see_each_other() {
    let harness = TestHarness::new();
    let id = harness.create("h", tags::HABIT, payloads::habit("Private"));
    let stranger = OwnerId::new();

    let snapshot = harness.engine.snapshot(stranger).unwrap();
    assert_eq!(snapshot.data.record_count(), 0);

    let results = harness.engine.push_items(
        stranger,
        &[
            PushItem::new("x", tags::HABIT, payloads::habit("Hijack")).with_server_id(id.clone()),
            PushItem::deletion("y", tags::HABIT, Some(id.clone())),
        ],
    );
    assert!(results.iter().all(|r| !r.success));

    let mine = harness.current(tags::HABIT);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["name"], json!("Private"));
}

#[test]
fn batch_level_validation() {
    let harness = TestHarness::with_options(EngineOptions::new().with_max_push_batch(2));

    let err = harness
        .engine
        .push(harness.owner, &PushRequest::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::Protocol(_)));
    assert!(err.to_string().contains("No items to sync"));

    let items: Vec<PushItem> = (0..3)
        .map(|i| PushItem::new(i.to_string(), tags::TODO, payloads::todo("x", &day(1))))
        .collect();
    let err = harness.engine.push(harness.owner, &PushRequest::new(items)).unwrap_err();
    assert!(!err.is_item_error());
    assert_eq!(harness.row_count(tags::TODO), 0);
}

#[test]
fn current_rejects_unknown_tags() {
    let harness = TestHarness::new();
    let err = harness.engine.current(harness.owner, "sleep").unwrap_err();
    assert!(matches!(err, EngineError::UnknownKind(_)));
}

#[test]
fn file_backed_harness_persists() {
    let harness = TestHarness::file();
    harness.create("t", tags::TODO, payloads::todo("persist", &day(1)));
    assert_eq!(harness.snapshot().data.get("todos").unwrap().len(), 1);
}

/// Pushes a habit and a todo, then makes every stored habit unreadable.
fn corrupt_habits(harness: &TestHarness) {
    harness.create("h1", tags::HABIT, payloads::habit("Read"));
    harness.create("t1", tags::TODO, payloads::todo("Call", &day(1)));
    harness
        .store()
        .write(|tx| -> StoreResult<()> {
            tx.execute("UPDATE habits SET body = 'x'", [])?;
            Ok(())
        })
        .unwrap();
}

#[test]
fn unreadable_bucket_fails_the_whole_read_by_default() {
    let harness = TestHarness::new();
    corrupt_habits(&harness);

    assert!(matches!(
        harness.engine.snapshot(harness.owner),
        Err(EngineError::Store(_))
    ));
    assert!(harness.engine.delta(harness.owner, Cursor::EPOCH).is_err());
}

#[test]
fn tolerant_reads_report_unreadable_buckets() {
    let harness =
        TestHarness::with_options(EngineOptions::default().with_tolerate_bucket_failures(true));
    corrupt_habits(&harness);

    let snapshot = harness.snapshot();
    assert_eq!(snapshot.failed_kinds, vec!["habits".to_string()]);
    assert!(!snapshot.data.contains("habits"));
    assert_eq!(snapshot.data.get("todos").unwrap().len(), 1);
    assert_eq!(snapshot.data.len(), harness.engine.catalog().len() - 1);

    let delta = harness.delta(Cursor::EPOCH);
    assert_eq!(delta.failed_kinds, vec!["habits".to_string()]);
    assert_eq!(delta.data.get("todos").unwrap().len(), 1);
}

#[test]
fn children_need_a_live_parent() {
    let harness = TestHarness::new();
    let habit = harness.create("h1", tags::HABIT, payloads::habit("Walk"));
    assert!(harness
        .push_one(PushItem::deletion("h1", tags::HABIT, Some(habit.clone())))
        .success);

    let result = harness.push_one(PushItem::new(
        "c1",
        tags::HABIT_COMPLETION,
        payloads::habit_completion(&habit, &day(2), true),
    ));
    assert!(!result.success);
    assert!(result.error.unwrap().contains("not found"));
    assert!(harness.current(tags::HABIT_COMPLETION).is_empty());
}

#[test]
fn hard_delete_is_idempotent_and_cascades() {
    let mut catalog = Catalog::new();
    catalog
        .register(
            IdentityAddressed::<HabitPayload>::new(tags::HABIT, "habits", tables::HABITS)
                .with_delete_policy(DeletePolicy::Hard),
        )
        .unwrap();
    catalog
        .register(NaturalKeyUpsert::<HabitCompletionPayload>::new(
            tags::HABIT_COMPLETION,
            "habitCompletions",
            tables::HABIT_COMPLETIONS,
        ))
        .unwrap();
    let store = Store::open_in_memory(Arc::new(SystemClock::new())).unwrap();
    let engine = SyncEngine::with_catalog(Arc::new(store), catalog, EngineOptions::default());
    let owner = OwnerId::new();

    let habit = engine.push_items(owner, &[PushItem::new("h1", tags::HABIT, payloads::habit("Run"))])[0]
        .server_id
        .clone()
        .unwrap();
    let completion = engine.push_items(
        owner,
        &[PushItem::new(
            "c1",
            tags::HABIT_COMPLETION,
            payloads::habit_completion(&habit, &day(1), true),
        )],
    );
    assert!(completion[0].success);

    let delete = PushItem::deletion("h1", tags::HABIT, Some(habit.clone()));
    for _ in 0..2 {
        let result = engine.push_items(owner, &[delete.clone()]).remove(0);
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.server_id.as_deref(), Some(habit.as_str()));
    }

    let snapshot = engine.snapshot(owner).unwrap();
    assert_eq!(snapshot.data.record_count(), 0);
    assert_eq!(snapshot.data.len(), 2);
}
