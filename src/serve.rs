//! Line-delimited JSON bridge to a hosting runtime.
//!
//! Each input line is one event (`{"input": {...}}`); each output line is the
//! matching response. Lines are handled strictly in order, so a host can pipe
//! a queue of invocations through one worker process.

use std::io::{self, BufRead, Write};

use serde_json::Value;

use crate::handler::{ErrorResponse, Response, Worker};
use crate::SynthesisEngine;

/// Install an `env_logger` that defaults to `info` unless `RUST_LOG` says otherwise.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Answer every event read from `input`, writing one response line per event.
///
/// Returns when `input` is exhausted. Only I/O errors end the loop early; an
/// unparseable line gets an error response like any other bad request.
pub fn serve<E, R, W>(worker: &mut Worker<E>, input: R, mut output: W) -> io::Result<()>
where
    E: SynthesisEngine,
    R: BufRead,
    W: Write,
{
    let mut handled = 0usize;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(event) => worker.handle(&event),
            Err(e) => {
                log::error!("Rejecting unparseable event: {e}");
                Response::Error(ErrorResponse::message(format!("invalid JSON event: {e}")))
            }
        };

        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
        handled += 1;
    }

    log::info!("Input closed after {handled} events");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ModelState, WorkerConfig};
    use crate::{BoxError, GenerationParams};

    struct Tone;

    impl SynthesisEngine for Tone {
        fn sample_rate(&self) -> u32 {
            8000
        }

        fn synthesize(&mut self, _: &str, _: &GenerationParams) -> Result<Vec<f32>, BoxError> {
            Ok(vec![0.5; 800])
        }
    }

    #[test]
    fn one_response_line_per_event() {
        init_logging();
        let mut worker = Worker::new(ModelState::load(|| Ok(Tone)), WorkerConfig::default());
        let input = "{\"input\": {\"text\": \"Hi\"}}\n\nnot json\n{\"input\": {}}\n";
        let mut output = Vec::new();

        serve(&mut worker, input.as_bytes(), &mut output).unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["duration_s"], 0.1);
        assert_eq!(lines[0]["sample_rate"], 8000);
        assert!(lines[1]["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid JSON event"));
        assert_eq!(lines[2]["error"], "No text provided");
    }
}
