use std::panic::{self, AssertUnwindSafe};

use serde_json::{Map, Value};

use crate::SynthesisEngine;

use super::config::WorkerConfig;
use super::dispatch::Dispatcher;
use super::model::{panic_message, ModelState, WorkerError};
use super::voices::VoiceResolver;
use super::wire::{ErrorResponse, Response};

/// Long-lived request handler built once at process start.
///
/// Owns the model load outcome and everything the dispatcher borrows per
/// request. Requests are handled one at a time through `&mut self`.
pub struct Worker<E> {
    model: ModelState<E>,
    voices: VoiceResolver,
    config: WorkerConfig,
}

impl<E: SynthesisEngine> Worker<E> {
    pub fn new(model: ModelState<E>, config: WorkerConfig) -> Self {
        let voices = VoiceResolver::new(&config);
        log::info!("Reference voices from {}", voices.voices_dir().display());
        Self {
            model,
            voices,
            config,
        }
    }

    /// Handle one runtime event of the form `{"input": {...}}`.
    pub fn handle(&mut self, event: &Value) -> Response {
        if let Some(response) = self.load_failure() {
            return response;
        }

        let input = match event {
            Value::Object(fields) => fields
                .get("input")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            other => {
                log::error!("Handler error: event is not a JSON object");
                return Response::Error(ErrorResponse::message(format!(
                    "event must be a JSON object, found {other}"
                )));
            }
        };

        self.dispatch(&input)
    }

    /// Handle an unwrapped request body.
    ///
    /// Batch segments contain their own panics. Any other panic, including
    /// one in single mode, is caught here and reported like any other
    /// failure; the model stays loaded for the next request.
    pub fn dispatch(&mut self, input: &Value) -> Response {
        let engine = match &mut self.model {
            ModelState::Loaded(engine) => engine,
            ModelState::Failed(diag) => return load_error(diag),
        };

        let mut dispatcher = Dispatcher::new(engine, &self.voices, &self.config);
        match panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(input))) {
            Ok(response) => response,
            Err(payload) => {
                let err = WorkerError::Panic(panic_message(&*payload));
                log::error!("Handler panicked: {err}");
                Response::Error(ErrorResponse::from(&err))
            }
        }
    }

    fn load_failure(&self) -> Option<Response> {
        match &self.model {
            ModelState::Loaded(_) => None,
            ModelState::Failed(diag) => Some(load_error(diag)),
        }
    }

    pub fn model(&self) -> &ModelState<E> {
        &self.model
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

fn load_error(diag: &str) -> Response {
    let err = WorkerError::ModelLoad(diag.to_string());
    Response::Error(ErrorResponse::message(err.to_string()))
}
