//! Desktop audio backend for Chime using CPAL
//!
//! This crate provides `CpalBackend`, the `AudioBackend` implementation the
//! reminder uses on desktop machines.
//!
//! # Features
//!
//! - Cross-platform output using CPAL, opened lazily on first playback
//! - Whole-clip decoding with Symphonia (mp3, wav, flac, ogg, ...)
//! - Automatic sample rate conversion with rubato
//! - Synthesized sine tones for sounds without a file
//!
//! # Example
//!
//! ```no_run
//! use chime_audio_desktop::CpalBackend;
//! use chime_core::{AudioBackend, SoundName, SourceRef};
//!
//! # async fn demo() -> chime_core::Result<()> {
//! let backend = CpalBackend::new();
//! let beep = backend.open(&SoundName::beep(), &SourceRef::tone(880.0, 200))?;
//!
//! beep.load().await?;
//! beep.start().await?;
//! beep.ended().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod clip;
pub mod decode;
mod engine;
mod error;
pub mod resample;
pub mod tone;

pub use backend::CpalBackend;
pub use clip::DesktopClip;
pub use decode::{decode_file, DecodedClip};
pub use engine::AudioEngine;
pub use error::{AudioError, Result};
