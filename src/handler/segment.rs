use std::path::Path;
use std::time::Instant;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

use crate::{GenerationParams, SynthesisEngine, SynthesisResult};

use super::model::WorkerError;
use super::voices::{VoiceResolver, VoiceSource};

/// One unit of text to synthesize, already trimmed and length-bounded.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub voice: &'a str,
    pub exaggeration: f32,
    pub cfg_weight: f32,
}

/// Encoded audio and timing for one synthesized segment.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub audio_base64: String,
    pub format: &'static str,
    pub sample_rate: u32,
    pub duration_s: f64,
    /// Wall time from voice lookup through synthesis; excludes encoding.
    pub gen_time_s: f64,
    /// The voice as requested, not the clip it resolved to.
    pub voice: String,
    pub voice_source: VoiceSource,
    /// Characters actually synthesized, after truncation.
    pub text_length: usize,
}

/// Synthesize one segment and package the encoded result.
///
/// Failures are returned, not logged or swallowed; the dispatcher decides
/// whether they end the request or only this segment.
pub fn process<E>(
    engine: &mut E,
    voices: &VoiceResolver,
    segment: &Segment<'_>,
) -> Result<GenerationResult, WorkerError>
where
    E: SynthesisEngine + ?Sized,
{
    let start = Instant::now();

    let resolution = voices.resolve(segment.voice);
    let params = GenerationParams {
        exaggeration: segment.exaggeration,
        cfg_weight: segment.cfg_weight,
        audio_prompt_path: resolution.path().map(Path::to_path_buf),
    };

    let samples = engine
        .synthesize(segment.text, &params)
        .map_err(WorkerError::Synthesis)?;
    let gen_time = start.elapsed().as_secs_f64();

    let audio = SynthesisResult {
        samples,
        sample_rate: engine.sample_rate(),
    };
    let wav_bytes = audio.to_wav_bytes()?;

    Ok(GenerationResult {
        audio_base64: BASE64.encode(&wav_bytes),
        format: "wav",
        sample_rate: audio.sample_rate,
        duration_s: round2(audio.duration_secs()),
        gen_time_s: round2(gen_time),
        voice: segment.voice.to_string(),
        voice_source: resolution.source(),
        text_length: segment.text.chars().count(),
    })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
