//! Sequencer tests: ordering, timing and failure containment

mod common;

use chime_core::{ClipOutcome, SlotLabel};
use chime_playback::{FiringSource, ReminderEvent};
use chrono::Weekday;
use common::{fast_policy, Call, CallKind, Engine, Script, ScriptedBackend};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn engine(default: Script) -> Engine {
    Engine::new(ScriptedBackend::new(default), fast_policy())
}

/// Start/Ended calls in log order
fn start_end_calls(engine: &Engine) -> Vec<Call> {
    engine
        .backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c.kind, CallKind::Start | CallKind::Ended))
        .collect()
}

// ============================================================================
// ORDERING AND TIMING
// ============================================================================

#[tokio::test(start_paused = true)]
async fn monday_morning_takes_1800ms_in_order() {
    let engine = engine(Script::complete_ms(50));

    let started = Instant::now();
    let report = engine
        .sequencer
        .play_reminder(Weekday::Mon, SlotLabel::Morning)
        .await;
    let elapsed = started.elapsed();

    assert_eq!(elapsed, Duration::from_millis(6 * 50 + 5 * 300));
    assert_eq!(
        engine.backend.started_names(),
        vec![
            "beep",
            "beep",
            "beep",
            "medicine-time",
            "day:monday",
            "time:morning"
        ]
    );
    assert_eq!(report.completed(), 6);
    assert_eq!(report.failed(), 0);
}

#[tokio::test(start_paused = true)]
async fn clips_never_overlap() {
    let engine = engine(Script::complete_ms(120));

    engine
        .sequencer
        .play_reminder(Weekday::Fri, SlotLabel::Evening)
        .await;

    let calls = start_end_calls(&engine);
    assert_eq!(calls.len(), 12);
    for (i, pair) in calls.chunks(2).enumerate() {
        assert_eq!(pair[0].kind, CallKind::Start, "clip {i}");
        assert_eq!(pair[1].kind, CallKind::Ended, "clip {i}");
        assert_eq!(pair[0].sound, pair[1].sound);
    }
    for window in calls.windows(2).skip(1).step_by(2) {
        // Ended of clip N, Start of clip N+1
        assert!(window[1].at - window[0].at >= Duration::from_millis(300));
    }
}

#[tokio::test(start_paused = true)]
async fn test_sequence_matches_reminder() {
    let engine = engine(Script::complete_ms(10));

    let report = engine
        .sequencer
        .play_test_sequence(Weekday::Sun, SlotLabel::Noon)
        .await;

    assert_eq!(report.source, FiringSource::Manual);
    assert_eq!(
        engine.backend.started_names(),
        vec!["beep", "beep", "beep", "medicine-time", "day:sunday", "time:noon"]
    );
}

// ============================================================================
// FAILURE CONTAINMENT
// ============================================================================

#[tokio::test(start_paused = true)]
async fn failed_clips_do_not_abort_sequence() {
    let engine = engine(Script::complete_ms(50));
    engine.backend.script("medicine-time", Script::DenyStart);
    engine.backend.script("day:tuesday", Script::NeverEnds);

    let report = engine
        .sequencer
        .play_reminder(Weekday::Tue, SlotLabel::Noon)
        .await;

    let outcomes: Vec<ClipOutcome> = report.attempts.iter().map(|a| a.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            ClipOutcome::Completed,
            ClipOutcome::Completed,
            ClipOutcome::Completed,
            ClipOutcome::Failed,
            ClipOutcome::TimedOut,
            ClipOutcome::Completed,
        ]
    );
    assert_eq!(report.failed(), 2);
    assert_eq!(
        engine.backend.started_names().last().map(String::as_str),
        Some("time:noon")
    );
}

// ============================================================================
// EVENTS AND LOCKING
// ============================================================================

#[tokio::test(start_paused = true)]
async fn publishes_lifecycle_events() {
    let engine = engine(Script::complete_ms(50));
    let mut rx = engine.events.subscribe();

    engine
        .sequencer
        .play_reminder(Weekday::Wed, SlotLabel::Morning)
        .await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(events.len(), 8);
    assert_eq!(
        events[0],
        ReminderEvent::SequenceStarted {
            source: FiringSource::Scheduled,
            day: Weekday::Wed,
            slot: SlotLabel::Morning,
        }
    );
    assert!(events[1..7]
        .iter()
        .all(|e| matches!(e, ReminderEvent::ClipSettled { .. })));
    assert_eq!(
        events[7],
        ReminderEvent::SequenceFinished {
            source: FiringSource::Scheduled,
            completed: 6,
            failed: 0,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_firings_are_serialized() {
    let engine = engine(Script::complete_ms(50));

    let first = tokio::spawn({
        let sequencer = Arc::clone(&engine.sequencer);
        async move { sequencer.play_reminder(Weekday::Mon, SlotLabel::Morning).await }
    });
    tokio::task::yield_now().await;
    assert!(engine.sequencer.is_playing());

    let second = tokio::spawn({
        let sequencer = Arc::clone(&engine.sequencer);
        async move { sequencer.play_test_sequence(Weekday::Mon, SlotLabel::Noon).await }
    });

    first.await.unwrap();
    second.await.unwrap();

    let names = engine.backend.started_names();
    assert_eq!(names.len(), 12);
    assert_eq!(names[5], "time:morning");
    assert_eq!(names[11], "time:noon");

    let calls = start_end_calls(&engine);
    for pair in calls.chunks(2) {
        assert_eq!(pair[0].kind, CallKind::Start);
        assert_eq!(pair[1].kind, CallKind::Ended);
    }
    assert!(!engine.sequencer.is_playing());
}
