//! CPAL output engine
//!
//! A dedicated audio thread owns the CPAL `Stream`; the rest of the crate
//! talks to it over a channel, which keeps `Stream`'s platform-specific
//! Send/Sync rules out of the async code. The stream runs for the engine's
//! whole life and outputs silence when no clip is playing.
//!
//! There is a single voice. Each clip has an owner id; only the current
//! owner's pause/rewind/volume calls reach the voice, so a stale handle
//! cannot stop someone else's clip.

use crate::error::{AudioError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// No clip owns the voice; owner ids start at 1
pub(crate) const NO_OWNER: u64 = 0;

/// Commands sent to the audio thread
enum AudioCommand {
    /// Resume the stream (after a platform suspend)
    Resume { reply: Sender<Result<()>> },
    /// Shutdown the audio thread
    Shutdown,
}

/// Voice state shared between the engine and the audio callback
struct VoiceState {
    /// Interleaved stereo samples of the current clip, also the voice lock
    buffer: Mutex<Arc<Vec<f32>>>,
    /// Read position in samples (not frames)
    position: AtomicUsize,
    playing: AtomicBool,
    /// Set by the callback when the buffer runs out
    finished: AtomicBool,
    owner: AtomicU64,
    volume: Mutex<f32>,
}

impl VoiceState {
    fn new() -> Self {
        Self {
            buffer: Mutex::new(Arc::new(Vec::new())),
            position: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            owner: AtomicU64::new(NO_OWNER),
            volume: Mutex::new(1.0),
        }
    }

    fn is_owner(&self, owner: u64) -> bool {
        self.owner.load(Ordering::Acquire) == owner
    }

    /// Lock the voice; holders see and write a consistent buffer, position
    /// and owner
    fn lock_voice(&self) -> MutexGuard<'_, Arc<Vec<f32>>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand the voice to `owner` and start playing `samples` from `from`
    fn load(&self, owner: u64, samples: Arc<Vec<f32>>, from: usize, volume: f32) {
        let mut buffer = self.lock_voice();
        *buffer = samples;
        *self.volume.lock().unwrap_or_else(PoisonError::into_inner) = volume;
        self.position.store(from, Ordering::Release);
        self.finished.store(false, Ordering::Release);
        self.owner.store(owner, Ordering::Release);
        self.playing.store(true, Ordering::Release);
    }
}

/// Single-voice output on the default device
pub struct AudioEngine {
    command_tx: Sender<AudioCommand>,
    sample_rate: u32,
    channels: u16,
    state: Arc<VoiceState>,
    _audio_thread: Option<JoinHandle<()>>,
}

impl AudioEngine {
    /// Open the default output device and start the stream
    ///
    /// # Errors
    /// Returns an error if no output device exists or the stream cannot be
    /// built or started
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;

        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate();
        let channels = config.channels();

        Self::with_device_and_config(device, config.config(), sample_rate, channels)
    }

    fn with_device_and_config(
        device: Device,
        config: StreamConfig,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self> {
        let state = Arc::new(VoiceState::new());
        let (command_tx, command_rx) = bounded::<AudioCommand>(32);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        let state_for_thread = Arc::clone(&state);
        let audio_thread = thread::Builder::new()
            .name("chime-audio".into())
            .spawn(move || {
                Self::audio_thread_run(&device, &config, state_for_thread, &command_rx, &ready_tx);
            })?;

        ready_rx.recv().map_err(|_| AudioError::EngineStopped)??;

        tracing::info!(sample_rate, channels, "Audio output started");
        Ok(Self {
            command_tx,
            sample_rate,
            channels,
            state,
            _audio_thread: Some(audio_thread),
        })
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Output channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Load `samples` into the voice for `owner` and play from sample
    /// `from`
    pub fn play(&self, owner: u64, samples: Arc<Vec<f32>>, from: usize, volume: f32) {
        self.state.load(owner, samples, from, volume);
    }

    /// Stop the voice if `owner` holds it; returns the position it stopped at
    pub fn pause(&self, owner: u64) -> Option<usize> {
        let _voice = self.state.lock_voice();
        if !self.state.is_owner(owner) {
            return None;
        }
        self.state.playing.store(false, Ordering::Release);
        Some(self.state.position.load(Ordering::Acquire))
    }

    /// Move the read position of `owner`'s voice back to zero
    pub fn rewind(&self, owner: u64) {
        let _voice = self.state.lock_voice();
        if self.state.is_owner(owner) {
            self.state.position.store(0, Ordering::Release);
            self.state.finished.store(false, Ordering::Release);
        }
    }

    /// Set the voice volume if `owner` holds it
    pub fn set_volume(&self, owner: u64, volume: f32) {
        if self.state.is_owner(owner) {
            *self
                .state
                .volume
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = volume.clamp(0.0, 1.0);
        }
    }

    /// Read position of `owner`'s voice, in samples
    pub fn position(&self, owner: u64) -> Option<usize> {
        self.state
            .is_owner(owner)
            .then(|| self.state.position.load(Ordering::Acquire))
    }

    /// Whether `owner`'s clip is audible right now
    pub fn is_playing(&self, owner: u64) -> bool {
        self.state.is_owner(owner) && self.state.playing.load(Ordering::Acquire)
    }

    /// Whether `owner`'s clip ran to the end of its buffer
    pub fn is_finished(&self, owner: u64) -> bool {
        self.state.is_owner(owner) && self.state.finished.load(Ordering::Acquire)
    }

    /// Resume the output stream
    ///
    /// # Errors
    /// Returns an error if the stream cannot be (re)started
    pub fn resume(&self) -> Result<()> {
        let (reply, rx) = bounded(1);
        self.command_tx
            .send(AudioCommand::Resume { reply })
            .map_err(|_| AudioError::EngineStopped)?;
        rx.recv().map_err(|_| AudioError::EngineStopped)?
    }

    /// Audio thread main loop, owns the CPAL stream
    fn audio_thread_run(
        device: &Device,
        config: &StreamConfig,
        state: Arc<VoiceState>,
        command_rx: &Receiver<AudioCommand>,
        ready_tx: &Sender<Result<()>>,
    ) {
        let channels = usize::from(config.channels);
        let state_for_callback = Arc::clone(&state);
        let built = device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    Self::audio_callback(data, channels, &state_for_callback);
                },
                |err| tracing::warn!(error = %err, "Audio stream error"),
                None,
            )
            .map_err(AudioError::from)
            .and_then(|stream| stream.play().map(|()| stream).map_err(AudioError::from));

        let stream: Stream = match built {
            Ok(stream) => {
                let _ = ready_tx.send(Ok(()));
                stream
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        while let Ok(cmd) = command_rx.recv() {
            match cmd {
                AudioCommand::Resume { reply } => {
                    let _ = reply.send(stream.play().map_err(AudioError::from));
                }
                AudioCommand::Shutdown => break,
            }
        }

        state.playing.store(false, Ordering::Release);
        drop(stream);
        tracing::debug!("Audio thread stopped");
    }

    /// Audio callback (runs in the real-time audio thread)
    fn audio_callback(output: &mut [f32], channels: usize, state: &VoiceState) {
        // Held until the final stores so a concurrent `play` cannot be
        // overwritten with this clip's position
        let buffer = state.lock_voice();
        if !state.playing.load(Ordering::Acquire) {
            output.fill(0.0);
            return;
        }

        let volume = *state.volume.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pos = state.position.load(Ordering::Acquire);
        for frame in output.chunks_mut(channels.max(1)) {
            if pos + 1 >= buffer.len() {
                frame.fill(0.0);
                continue;
            }

            let (left, right) = (buffer[pos] * volume, buffer[pos + 1] * volume);
            match frame {
                [mono] => *mono = (left + right) * 0.5,
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
            pos += 2;
        }

        if pos + 1 >= buffer.len() {
            state.position.store(buffer.len(), Ordering::Release);
            state.playing.store(false, Ordering::Release);
            state.finished.store(true, Ordering::Release);
        } else {
            state.position.store(pos, Ordering::Release);
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        let _ = self.command_tx.send(AudioCommand::Shutdown);
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}
