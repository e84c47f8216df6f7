use std::any::Any;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::{BoxError, SynthesisEngine};

#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    #[error("Model failed to load: {0}")]
    ModelLoad(String),
    #[error("{0}")]
    Synthesis(#[source] BoxError),
    #[error("WAV encoding failed: {0}")]
    Encode(#[from] hound::Error),
    #[error("{0}")]
    Request(#[from] serde_json::Error),
    #[error("{0}")]
    Panic(String),
}

/// Outcome of loading the model once at process start.
///
/// A failed load is terminal for the process: every request is answered with
/// the same diagnostic until the runtime restarts the worker.
pub enum ModelState<E> {
    Loaded(E),
    Failed(String),
}

impl<E: SynthesisEngine> ModelState<E> {
    /// Run `loader` once, capturing an error or panic as [`ModelState::Failed`].
    pub fn load<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<E, BoxError>,
    {
        log::info!("Loading text-to-speech model...");
        let start = Instant::now();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(loader)) {
            Ok(Ok(engine)) => Ok(engine),
            Ok(Err(e)) => Err(diagnostic(&*e)),
            Err(payload) => Err(format!("panic: {}", panic_message(&*payload))),
        };

        match outcome {
            Ok(engine) => {
                log::info!("Model loaded, sample_rate={}", engine.sample_rate());
                log::info!("Model ready in {:.1}s", start.elapsed().as_secs_f64());
                Self::Loaded(engine)
            }
            Err(diag) => {
                log::error!("FATAL: {diag}");
                Self::Failed(diag)
            }
        }
    }
}

impl<E> ModelState<E> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Render an error for the `traceback` field: its `Debug` form, then one
/// `Caused by:` line per source.
pub fn diagnostic(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = format!("{err:?}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, "\nCaused by: {cause}");
        source = cause.source();
    }
    out
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenerationParams;

    struct Fixed;

    impl SynthesisEngine for Fixed {
        fn sample_rate(&self) -> u32 {
            16000
        }

        fn synthesize(&mut self, _: &str, _: &GenerationParams) -> Result<Vec<f32>, BoxError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn load_success_is_loaded() {
        let state = ModelState::load(|| Ok(Fixed));
        assert!(state.is_loaded());
    }

    #[test]
    fn load_error_is_captured() {
        let state = ModelState::<Fixed>::load(|| Err("CUDA out of memory".into()));
        match state {
            ModelState::Failed(diag) => assert!(diag.contains("CUDA out of memory")),
            ModelState::Loaded(_) => panic!("expected a failed load"),
        }
    }

    #[test]
    fn load_panic_is_captured() {
        let state = ModelState::<Fixed>::load(|| panic!("weights missing"));
        match state {
            ModelState::Failed(diag) => assert_eq!(diag, "panic: weights missing"),
            ModelState::Loaded(_) => panic!("expected a failed load"),
        }
    }

    #[test]
    fn diagnostic_walks_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "device lost");
        let err = WorkerError::Synthesis(Box::new(io));
        let diag = diagnostic(&err);
        assert!(diag.starts_with("Synthesis("));
        assert!(diag.ends_with("Caused by: device lost"));
        assert_eq!(err.to_string(), "device lost");
    }
}
