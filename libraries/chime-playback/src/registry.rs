//! AudioResource registry
//!
//! Maps logical sound names to platform clip handles and tracks their load
//! state. One resource per name for the whole session; resources are never
//! removed.

use crate::sequence::SequenceDefinition;
use chime_core::{AudioBackend, ChimeError, ClipHandle, ReadyState, Result, SoundName, SourceRef};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;

/// A registered, playable sound
pub struct AudioResource {
    name: SoundName,
    source: SourceRef,
    handle: Arc<dyn ClipHandle>,
    state: watch::Sender<ReadyState>,
}

impl AudioResource {
    fn new(name: SoundName, source: SourceRef, handle: Arc<dyn ClipHandle>) -> Self {
        let (state, _) = watch::channel(ReadyState::NotLoaded);
        Self {
            name,
            source,
            handle,
            state,
        }
    }

    /// Logical name
    pub fn name(&self) -> &SoundName {
        &self.name
    }

    /// Media reference this resource was registered with
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Platform handle
    pub fn handle(&self) -> &Arc<dyn ClipHandle> {
        &self.handle
    }

    /// Current load state
    pub fn ready_state(&self) -> ReadyState {
        *self.state.borrow()
    }

    /// Wait until the resource is not `Loading`, up to `timeout`
    ///
    /// Returns the state observed when the wait ended.
    pub async fn wait_settled(&self, timeout: Duration) -> ReadyState {
        let mut rx = self.state.subscribe();
        let _ = tokio::time::timeout(timeout, rx.wait_for(|s| *s != ReadyState::Loading)).await;
        self.ready_state()
    }

    /// Apply a state edge if the state machine allows it
    fn advance(&self, next: ReadyState) -> bool {
        self.state.send_if_modified(|current| {
            if current.can_advance_to(next) {
                *current = next;
                true
            } else {
                false
            }
        })
    }
}

impl std::fmt::Debug for AudioResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioResource")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("ready_state", &self.ready_state())
            .finish_non_exhaustive()
    }
}

/// Name -> resource table backed by a platform `AudioBackend`
pub struct Registry {
    backend: Arc<dyn AudioBackend>,
    resources: RwLock<HashMap<SoundName, Arc<AudioResource>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            resources: RwLock::new(HashMap::new()),
        }
    }

    /// Backend the handles are created from
    pub fn backend(&self) -> &Arc<dyn AudioBackend> {
        &self.backend
    }

    /// Register a sound
    ///
    /// Idempotent for the same `(name, source)` pair.
    ///
    /// # Errors
    /// `Configuration` if `name` is already registered with a different
    /// source, or whatever the backend reports when opening the handle.
    pub fn register(&self, name: SoundName, source: SourceRef) -> Result<Arc<AudioResource>> {
        let mut resources = self
            .resources
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = resources.get(&name) {
            if existing.source == source {
                return Ok(Arc::clone(existing));
            }
            return Err(ChimeError::configuration(format!(
                "sound '{}' already registered with source '{}', refusing '{}'",
                name, existing.source, source
            )));
        }

        let handle = self.backend.open(&name, &source)?;
        let resource = Arc::new(AudioResource::new(name.clone(), source, handle));
        tracing::debug!(sound = %name, source = %resource.source, "Registered sound");
        resources.insert(name, Arc::clone(&resource));
        Ok(resource)
    }

    /// Look up a registered sound
    ///
    /// # Errors
    /// `ResourceNotFound` if `name` was never registered.
    pub fn resolve(&self, name: &SoundName) -> Result<Arc<AudioResource>> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ChimeError::ResourceNotFound(name.clone()))
    }

    /// Trigger a load if the resource is `NotLoaded` or `Errored`
    ///
    /// Returns immediately; completion is observed through the resource's
    /// ready state. Returns `true` if a load request was issued. Must be
    /// called from within a Tokio runtime.
    ///
    /// # Errors
    /// `ResourceNotFound` if `name` was never registered.
    pub fn ensure_loaded(&self, name: &SoundName) -> Result<bool> {
        let resource = self.resolve(name)?;

        // Only NotLoaded/Errored may move to Loading, so at most one load
        // is in flight per resource.
        if !resource.advance(ReadyState::Loading) {
            return Ok(false);
        }

        tokio::spawn(async move {
            match resource.handle.load().await {
                Ok(()) => {
                    resource.advance(ReadyState::Ready);
                    tracing::debug!(sound = %resource.name, "Sound loaded");
                }
                Err(e) => {
                    resource.advance(ReadyState::Errored);
                    tracing::warn!(sound = %resource.name, error = %e, "Failed to load sound");
                }
            }
        });

        Ok(true)
    }

    /// Issue `ensure_loaded` for every registered sound
    ///
    /// Returns how many load requests were issued.
    pub fn preload_all(&self) -> usize {
        self.names()
            .iter()
            .filter(|name| matches!(self.ensure_loaded(name), Ok(true)))
            .count()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<SoundName> {
        let mut names: Vec<SoundName> = self
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Registered resources, sorted by name
    pub fn resources(&self) -> Vec<Arc<AudioResource>> {
        self.names()
            .iter()
            .filter_map(|name| self.resolve(name).ok())
            .collect()
    }

    /// Sounds some reminder sequence references that are not registered
    pub fn missing_sounds(&self) -> Vec<SoundName> {
        let resources = self
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        SequenceDefinition::all_referenced()
            .into_iter()
            .filter(|name| !resources.contains_key(name))
            .collect()
    }

    /// Number of registered sounds
    pub fn len(&self) -> usize {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
