use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;

use crate::SynthesisEngine;

use super::config::WorkerConfig;
use super::model::{panic_message, WorkerError};
use super::segment::{self, round2, GenerationResult, Segment};
use super::voices::VoiceResolver;
use super::wire::{
    BatchRequest, BatchResponse, ErrorRecord, ErrorResponse, Response, SegmentOutcome,
    SegmentSuccess, UnitRequest,
};

/// Routes one request body to single or batch mode against a loaded engine.
pub struct Dispatcher<'a, E: ?Sized> {
    engine: &'a mut E,
    voices: &'a VoiceResolver,
    config: &'a WorkerConfig,
}

impl<'a, E> Dispatcher<'a, E>
where
    E: SynthesisEngine + ?Sized,
{
    pub fn new(engine: &'a mut E, voices: &'a VoiceResolver, config: &'a WorkerConfig) -> Self {
        Self {
            engine,
            voices,
            config,
        }
    }

    /// Handle a request body. Always produces a response; failures become
    /// [`Response::Error`].
    pub fn dispatch(&mut self, input: &Value) -> Response {
        match self.try_dispatch(input) {
            Ok(response) => response,
            Err(err) => {
                log::error!("Handler error: {err}");
                Response::Error(ErrorResponse::from(&err))
            }
        }
    }

    fn try_dispatch(&mut self, input: &Value) -> Result<Response, WorkerError> {
        let fields = input.as_object().ok_or_else(|| {
            serde_json::Error::custom(format!("request input must be a JSON object, found {input}"))
        })?;

        if fields.contains_key("segments") {
            let batch = BatchRequest::deserialize(input)?;
            return Ok(Response::Batch(self.run_batch(&batch.segments)));
        }

        let unit = UnitRequest::deserialize(input)?;
        self.run_single(&unit)
    }

    fn run_batch(&mut self, units: &[UnitRequest]) -> BatchResponse {
        let start = Instant::now();
        let results: Vec<SegmentOutcome> = units.iter().map(|unit| self.run_unit(unit)).collect();

        BatchResponse {
            total_segments: results.len(),
            results,
            total_time_s: round2(start.elapsed().as_secs_f64()),
        }
    }

    /// One batch entry. Nothing that happens here escapes the entry.
    fn run_unit(&mut self, unit: &UnitRequest) -> SegmentOutcome {
        let id = unit.id.clone().unwrap_or_else(|| Value::from("unknown"));

        let Some(text) = self.bounded_text(&unit.text) else {
            return SegmentOutcome::Failure(ErrorRecord {
                id,
                error: "empty text".to_string(),
            });
        };

        // A panicking engine fails this entry only.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process(unit, text)))
            .unwrap_or_else(|payload| Err(WorkerError::Panic(panic_message(&*payload))));

        match outcome {
            Ok(result) => {
                log::info!(
                    "  {id}: {:.1}s audio in {:.1}s",
                    result.duration_s,
                    result.gen_time_s
                );
                SegmentOutcome::Success(SegmentSuccess { id, result })
            }
            Err(err) => {
                log::error!("  {id}: ERROR - {err}");
                SegmentOutcome::Failure(ErrorRecord {
                    id,
                    error: err.to_string(),
                })
            }
        }
    }

    fn run_single(&mut self, unit: &UnitRequest) -> Result<Response, WorkerError> {
        let Some(text) = self.bounded_text(&unit.text) else {
            return Ok(Response::Error(ErrorResponse::message("No text provided")));
        };

        let result = self.process(unit, text)?;
        log::info!(
            "{:.1}s audio in {:.1}s",
            result.duration_s,
            result.gen_time_s
        );
        Ok(Response::Single(result))
    }

    fn process(&mut self, unit: &UnitRequest, text: &str) -> Result<GenerationResult, WorkerError> {
        let config = self.config;
        let segment = Segment {
            text,
            voice: unit.voice.as_deref().unwrap_or(&config.default_voice),
            exaggeration: unit.exaggeration.unwrap_or(config.default_exaggeration),
            cfg_weight: unit.cfg_weight.unwrap_or(config.default_cfg_weight),
        };
        segment::process(&mut *self.engine, self.voices, &segment)
    }

    /// Trim `raw` and cap it at `max_text_length` characters. `None` if blank.
    fn bounded_text<'t>(&self, raw: &'t str) -> Option<&'t str> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        match text.char_indices().nth(self.config.max_text_length) {
            Some((cut, _)) => {
                log::debug!(
                    "Truncating text to {} characters",
                    self.config.max_text_length
                );
                Some(&text[..cut])
            }
            None => Some(text),
        }
    }
}
