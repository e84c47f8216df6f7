//! Request handling for a loaded text-to-speech model.
//!
//! This module turns JSON events from a serverless runtime into synthesis
//! calls and back into JSON responses. The model itself is a collaborator
//! behind [`SynthesisEngine`](crate::SynthesisEngine); everything here is
//! dispatch, validation, and response assembly.
//!
//! # Request Shapes
//!
//! Events arrive wrapped in an `input` envelope:
//!
//! ```text
//! {"input": {"text": "Hello world", "voice": "narrator", "exaggeration": 0.6, "cfg_weight": 0.5}}
//! {"input": {"segments": [{"id": "N1", "text": "...", "voice": "alice"}, ...]}}
//! ```
//!
//! | Field | Default | Notes |
//! |---|---|---|
//! | `text` | required | trimmed, truncated to 4000 characters |
//! | `voice` | `narrator` | `default` and `narrator` select the built-in voice |
//! | `exaggeration` | 0.6 | number or numeric string |
//! | `cfg_weight` | 0.5 | number or numeric string |
//! | `id` | `unknown` | batch only, echoed back verbatim |
//!
//! # Voices Directory Layout
//!
//! ```text
//! /voices/
//! ├── alice.wav     # checked first
//! ├── alice.mp3
//! └── bob.flac
//! ```
//!
//! A voice with no matching file falls back to the built-in voice. The result
//! reports this through `voice_source: "fallback"` instead of failing.
//!
//! # Concurrency
//!
//! Requests are handled one at a time and batch segments strictly in order.
//! [`Worker::handle`] takes `&mut self`; a host sharing one worker across
//! threads must put it behind a mutex.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tts_worker::handler::{ModelState, Worker, WorkerConfigBuilder};
//! use tts_worker::{BoxError, GenerationParams, SynthesisEngine};
//!
//! struct Silence;
//!
//! impl SynthesisEngine for Silence {
//!     fn sample_rate(&self) -> u32 {
//!         24000
//!     }
//!
//!     fn synthesize(&mut self, text: &str, _: &GenerationParams) -> Result<Vec<f32>, BoxError> {
//!         Ok(vec![0.0; text.len() * 240])
//!     }
//! }
//!
//! let config = WorkerConfigBuilder::default()
//!     .voices_dir("/srv/voices")
//!     .build()?;
//! let mut worker = Worker::new(ModelState::load(|| Ok(Silence)), config);
//!
//! let response = worker.handle(&serde_json::json!({"input": {"text": "Hello world"}}));
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dispatch;
pub mod model;
pub mod segment;
pub mod voices;
pub mod wire;
pub mod worker;

pub use config::{WorkerConfig, WorkerConfigBuilder};
pub use dispatch::Dispatcher;
pub use model::{ModelState, WorkerError};
pub use segment::{GenerationResult, Segment};
pub use voices::{VoiceResolution, VoiceResolver, VoiceSource};
pub use wire::{BatchResponse, ErrorResponse, Response, SegmentOutcome};
pub use worker::Worker;
