//! # tts-worker
//!
//! A request-handling worker that sits in front of a pretrained text-to-speech
//! model and answers JSON requests with base64-encoded WAV audio.
//!
//! ## Features
//!
//! - **Single and batch requests**: one `text`, or a list of `segments` each
//!   correlated by `id`
//! - **Per-segment isolation**: one failing segment never aborts its siblings
//! - **Reference voices**: named clips looked up in a read-only voices directory,
//!   falling back to the model's built-in voice
//!
//! ## Quick Start
//!
//! ```ignore
//! use tts_worker::{handler::{ModelState, Worker, WorkerConfig}, serve};
//!
//! serve::init_logging();
//! let model = ModelState::load(|| MyEngine::from_pretrained("cuda"));
//! let mut worker = Worker::new(model, WorkerConfig::default());
//!
//! let stdin = std::io::stdin();
//! serve::serve(&mut worker, stdin.lock(), std::io::stdout())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod handler;
pub mod serve;

use std::io::Cursor;
use std::path::PathBuf;

/// Boxed error returned by model collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Sample rate of the audio, fixed by the loaded model
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Encode the audio as a 16-bit mono PCM WAV byte stream.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buffer = Vec::with_capacity(44 + self.samples.len() * 2);
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), spec)?;
            for &sample in &self.samples {
                writer.write_sample(to_pcm16(sample))?;
            }
            writer.finalize()?;
        }
        Ok(buffer)
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Generation controls passed to [`SynthesisEngine::synthesize`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Emotion exaggeration. Model default 0.6.
    pub exaggeration: f32,
    /// Classifier-free guidance weight. Model default 0.5.
    pub cfg_weight: f32,
    /// Reference clip to clone. `None` = the model's built-in voice.
    pub audio_prompt_path: Option<PathBuf>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            exaggeration: 0.6,
            cfg_weight: 0.5,
            audio_prompt_path: None,
        }
    }
}

/// Common interface for a loaded text-to-speech model.
///
/// Loading is the caller's business (see [`handler::ModelState::load`]); an
/// engine value is always ready to synthesize. `synthesize` takes `&mut self`
/// because models are stateful and not safe to invoke concurrently.
pub trait SynthesisEngine {
    /// Output sample rate of the loaded model.
    fn sample_rate(&self) -> u32;

    /// Synthesize speech from the given text, returning raw mono samples.
    fn synthesize(&mut self, text: &str, params: &GenerationParams) -> Result<Vec<f32>, BoxError>;
}
