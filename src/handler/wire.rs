use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{diagnostic, WorkerError};
use super::segment::GenerationResult;

/// One text unit as it arrives on the wire.
///
/// Single requests use the same shape and ignore `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitRequest {
    /// `None` only when the field is absent; an explicit `null` is kept.
    #[serde(default, deserialize_with = "present_value")]
    pub id: Option<Value>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub exaggeration: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub cfg_weight: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub segments: Vec<UnitRequest>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Accepts a JSON number or a numeric string. `null` and other types are
/// rejected so a bad parameter fails the request instead of silently
/// taking the default.
fn lenient_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .map(|v| Some(v as f32))
            .ok_or_else(|| de::Error::custom(format!("number {n} is out of range"))),
        Value::String(s) => s
            .trim()
            .parse::<f32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("could not convert string to float: {s:?}"))),
        other => Err(de::Error::custom(format!(
            "expected a number or numeric string, found {other}"
        ))),
    }
}

/// Any response the worker can produce.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Single(GenerationResult),
    Batch(BatchResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// One entry per input segment, in input order.
    pub results: Vec<SegmentOutcome>,
    pub total_segments: usize,
    pub total_time_s: f64,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SegmentOutcome {
    Success(SegmentSuccess),
    Failure(ErrorRecord),
}

impl SegmentOutcome {
    pub fn id(&self) -> &Value {
        match self {
            Self::Success(s) => &s.id,
            Self::Failure(f) => &f.id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SegmentSuccess {
    pub id: Value,
    #[serde(flatten)]
    pub result: GenerationResult,
}

/// Stands in for a result when a segment failed. Carries no partial audio.
#[derive(Debug, Serialize)]
pub struct ErrorRecord {
    pub id: Value,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl ErrorResponse {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            traceback: None,
        }
    }
}

impl From<&WorkerError> for ErrorResponse {
    fn from(err: &WorkerError) -> Self {
        Self {
            error: err.to_string(),
            traceback: Some(diagnostic(err)),
        }
    }
}
