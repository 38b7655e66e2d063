//! Registry tests: registration rules and load state tracking

mod common;

use chime_core::{ChimeError, ReadyState, SoundName, SourceRef};
use chime_playback::Registry;
use common::{register_all, Script, ScriptedBackend};
use std::sync::Arc;
use std::time::Duration;

fn registry() -> (Arc<ScriptedBackend>, Registry) {
    let backend = ScriptedBackend::new(Script::complete_ms(50));
    let registry = Registry::new(backend.clone());
    (backend, registry)
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[test]
fn register_same_source_is_idempotent() {
    let (_backend, registry) = registry();
    let source = SourceRef::file("sounds/beep.mp3");

    let first = registry.register(SoundName::beep(), source.clone()).unwrap();
    let second = registry.register(SoundName::beep(), source).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
}

#[test]
fn register_different_source_is_configuration_error() {
    let (_backend, registry) = registry();
    registry
        .register(SoundName::beep(), SourceRef::file("sounds/beep.mp3"))
        .unwrap();

    let err = registry
        .register(SoundName::beep(), SourceRef::tone(880.0, 200))
        .unwrap_err();
    assert!(matches!(err, ChimeError::Configuration(_)), "got {err:?}");

    // Original registration untouched
    let resource = registry.resolve(&SoundName::beep()).unwrap();
    assert_eq!(resource.source(), &SourceRef::file("sounds/beep.mp3"));
}

#[test]
fn resolve_unknown_is_not_found() {
    let (_backend, registry) = registry();
    let err = registry.resolve(&SoundName::new("day:funday")).unwrap_err();
    assert!(matches!(err, ChimeError::ResourceNotFound(ref n) if n.as_str() == "day:funday"));
}

#[test]
fn missing_sounds_lists_unregistered_references() {
    let (_backend, registry) = registry();
    assert_eq!(registry.missing_sounds().len(), 12);

    register_all(&registry);
    assert!(registry.missing_sounds().is_empty());
    assert_eq!(registry.names().len(), 12);
}

// ============================================================================
// LOADING
// ============================================================================

#[tokio::test(start_paused = true)]
async fn ensure_loaded_moves_to_ready() {
    let (backend, registry) = registry();
    let resource = registry
        .register(SoundName::beep(), SourceRef::file("sounds/beep.mp3"))
        .unwrap();
    assert_eq!(resource.ready_state(), ReadyState::NotLoaded);

    assert!(registry.ensure_loaded(&SoundName::beep()).unwrap());
    assert_eq!(resource.ready_state(), ReadyState::Loading);

    let settled = resource.wait_settled(Duration::from_secs(1)).await;
    assert_eq!(settled, ReadyState::Ready);
    assert_eq!(backend.clip("beep").load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn ensure_loaded_is_noop_while_loading_or_ready() {
    let (backend, registry) = registry();
    backend.set_load_delay(Duration::from_millis(200));
    let resource = registry
        .register(SoundName::beep(), SourceRef::file("sounds/beep.mp3"))
        .unwrap();

    assert!(registry.ensure_loaded(&SoundName::beep()).unwrap());
    assert!(!registry.ensure_loaded(&SoundName::beep()).unwrap());

    assert_eq!(
        resource.wait_settled(Duration::from_secs(1)).await,
        ReadyState::Ready
    );
    assert!(!registry.ensure_loaded(&SoundName::beep()).unwrap());
    assert_eq!(backend.clip("beep").load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn errored_resource_reloads_on_request() {
    let (backend, registry) = registry();
    backend.fail_loads("beep", true);
    let resource = registry
        .register(SoundName::beep(), SourceRef::file("sounds/beep.mp3"))
        .unwrap();

    registry.ensure_loaded(&SoundName::beep()).unwrap();
    assert_eq!(
        resource.wait_settled(Duration::from_secs(1)).await,
        ReadyState::Errored
    );

    backend.fail_loads("beep", false);
    assert!(registry.ensure_loaded(&SoundName::beep()).unwrap());
    assert_eq!(
        resource.wait_settled(Duration::from_secs(1)).await,
        ReadyState::Ready
    );
    assert_eq!(backend.clip("beep").load_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn preload_all_requests_each_sound_once() {
    let (backend, registry) = registry();
    register_all(&registry);

    assert_eq!(registry.preload_all(), 12);
    assert_eq!(registry.preload_all(), 0);

    for resource in registry.resources() {
        resource.wait_settled(Duration::from_secs(1)).await;
    }
    assert_eq!(backend.clip("medicine-time").load_count(), 1);
    assert!(registry
        .resources()
        .iter()
        .all(|r| r.ready_state() == ReadyState::Ready));
}

#[test]
fn ensure_loaded_unknown_is_not_found() {
    let (_backend, registry) = registry();
    assert!(matches!(
        registry.ensure_loaded(&SoundName::beep()),
        Err(ChimeError::ResourceNotFound(_))
    ));
}
