//! End-to-end session flow: driver, orchestrator, saver and the key-value
//! repository over an in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use breath_application::notification::{Navigator, Notification, NotificationLevel, UserNotifier};
use breath_application::session::{
    Collaborators, DriverOutcome, SAVE_FAILED_MESSAGE, SessionDriver, SessionOrchestrator,
    SessionSaver, UserAction,
};
use breath_core::cue::SilentCues;
use breath_core::preferences::UserPreferences;
use breath_core::session::{SaveStatus, SessionRecord, SessionRepository};
use breath_core::storage::{KeyValueStore, StorageKeys};
use breath_infrastructure::{KvSessionRepository, MemoryStore};
use chrono::Utc;

#[derive(Default)]
struct Notes(Mutex<Vec<Notification>>);

impl UserNotifier for Notes {
    fn show(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
struct BackCounter(AtomicUsize);

impl Navigator for BackCounter {
    fn go_back(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    repository: Arc<KvSessionRepository>,
    notes: Arc<Notes>,
    back: Arc<BackCounter>,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let repository = Arc::new(KvSessionRepository::new(store.clone()));
        Self {
            store,
            repository,
            notes: Arc::new(Notes::default()),
            back: Arc::new(BackCounter::default()),
        }
    }

    fn keys(&self) -> StorageKeys {
        StorageKeys::default()
    }

    fn orchestrator(&self, preferences: UserPreferences) -> SessionOrchestrator {
        let saver = SessionSaver::new(self.repository.clone());
        let collaborators = Collaborators::new(
            Arc::new(SilentCues),
            self.notes.clone(),
            self.back.clone(),
        );
        SessionOrchestrator::new(preferences, saver, collaborators)
    }
}

fn quick_prefs(rounds: u32) -> UserPreferences {
    UserPreferences {
        breaths_per_round: 2,
        number_of_rounds: rounds,
        recovery_duration: 10,
        breathing_speed: 1.0,
    }
}

#[tokio::test(start_paused = true)]
async fn driven_session_is_saved_and_mirrored() {
    let fixture = Fixture::new();
    let mut orchestrator = fixture.orchestrator(quick_prefs(2));
    let (tx, mut driver) = SessionDriver::channel(4);

    // Round 1 holds from 2s to 47.5s; recovery ends at 57.5s.
    // Round 2 holds from 59.5s to 120s.
    let sender = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(47_500)).await;
        let _ = sender.send(UserAction::DoneHolding).await;
        tokio::time::sleep(Duration::from_millis(72_500)).await;
        let _ = sender.send(UserAction::DoneHolding).await;
    });

    let outcome = driver.run(&mut orchestrator).await;
    assert_eq!(outcome, DriverOutcome::Completed);
    assert_eq!(orchestrator.save_status(), SaveStatus::Saved);
    assert!(orchestrator.finish().await);
    assert_eq!(fixture.back.0.load(Ordering::SeqCst), 1);

    let sessions = fixture.repository.get_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].hold_times, vec![45, 60]);
    assert_eq!(sessions[0].completed_rounds, 2);
    assert_eq!(sessions[0].settings, quick_prefs(2));

    let keys = fixture.keys();
    let primary = fixture.store.get(&keys.sessions).await.unwrap();
    let backup = fixture.store.get(&keys.sessions_backup).await.unwrap();
    assert!(primary.is_some());
    assert_eq!(primary, backup);
}

#[tokio::test]
async fn failed_save_is_retried_without_duplicates() {
    let fixture = Fixture::new();
    let keys = fixture.keys();
    fixture.store.fail_writes(&keys.sessions, true).await;

    let mut orchestrator = fixture.orchestrator(quick_prefs(1));
    orchestrator.increment_breath();
    orchestrator.increment_breath();
    orchestrator.complete_hold(33);
    orchestrator.complete_recovery().await;

    assert_eq!(orchestrator.save_status(), SaveStatus::Error);
    {
        let notes = fixture.notes.0.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, SAVE_FAILED_MESSAGE);
        assert!(notes[0].retry);
    }
    assert!(fixture.repository.get_sessions().await.is_empty());

    fixture.store.fail_writes(&keys.sessions, false).await;
    assert!(orchestrator.retry_save().await);
    assert!(orchestrator.retry_save().await);

    let sessions = fixture.repository.get_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(Some(sessions[0].id.as_str()), orchestrator.session_id());
}

#[tokio::test]
async fn overlapping_saves_store_one_entry() {
    let fixture = Fixture::new();
    let saver = SessionSaver::new(fixture.repository.clone());
    let record = SessionRecord::new(
        "overlap",
        Utc::now(),
        vec![80, 95],
        UserPreferences::default(),
    );

    let (a, b, c) = tokio::join!(saver.save(&record), saver.save(&record), saver.save(&record));
    assert!(a && b && c);

    let sessions = fixture.repository.get_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, "overlap");
}

#[tokio::test]
async fn save_keeps_stored_entries_hidden_from_the_view() {
    let fixture = Fixture::new();
    let keys = fixture.keys();
    let legacy = r#"[
        {"id":"empty","date":"2025-01-01T00:00:00.000Z","completedRounds":3,"holdTimes":[],
         "settings":{"breathsPerRound":30,"numberOfRounds":3,"recoveryDuration":15,"breathingSpeed":2.0}},
        {"id":"old","date":"2025-01-02T00:00:00.000Z","completedRounds":5,"holdTimes":[70],
         "settings":{"breathsPerRound":30,"numberOfRounds":3,"recoveryDuration":15,"breathingSpeed":2.0}}
    ]"#;
    fixture.store.set(&keys.sessions, legacy).await.unwrap();

    let view = fixture.repository.get_sessions().await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].completed_rounds, 1);

    let saver = SessionSaver::new(fixture.repository.clone());
    let record = SessionRecord::new("new", Utc::now(), vec![40], UserPreferences::default());
    assert!(saver.save(&record).await);

    let raw = fixture.store.get(&keys.sessions).await.unwrap().unwrap();
    let stored: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    let ids: Vec<&str> = stored.iter().filter_map(|v| v["id"].as_str()).collect();
    assert_eq!(ids, vec!["new", "empty", "old"]);
}
