//! Plant-analysis response normalization.
//!
//! The analysis backend has answered in several shapes over time: a flat
//! object, the object wrapped in `result` or `analysis`, a model-output
//! envelope whose text holds the JSON, a `text` field holding JSON, or just
//! a string with JSON somewhere inside it. [`normalize`] reduces all of
//! them to one [`PlantAnalysisResult`].
//!
//! Normalization never fails. Anything unrecognisable becomes an empty
//! result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use cropcare_core::DetectionKind;

/// Maximum number of wrapper layers unwrapped before giving up.
const MAX_DEPTH: usize = 8;

/// Shown when an analysis carries no usable advice.
pub const NO_RECOMMENDATIONS: &str = "No recommendations available.";

/// A normalized plant analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantAnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    /// Either a fraction (`0.0..=1.0`) or a percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organic_treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemical_treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
    /// Keys this type does not model, kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One issue found in the photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DetectionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// An issue as listed on the result screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub label: String,
    pub confidence: Option<f64>,
}

impl PlantAnalysisResult {
    /// Whether the analysis carried nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Issues worth listing: detections with a non-blank label, or else the
    /// disease name.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        let from_detections: Vec<Issue> = self
            .detections
            .iter()
            .flatten()
            .filter(|d| !d.label.trim().is_empty())
            .map(|d| Issue {
                label: d.label.clone(),
                confidence: d.confidence,
            })
            .collect();
        if !from_detections.is_empty() {
            return from_detections;
        }

        self.disease_name
            .as_ref()
            .filter(|name| !name.trim().is_empty())
            .map(|name| Issue {
                label: name.clone(),
                confidence: self.confidence,
            })
            .into_iter()
            .collect()
    }

    /// Top-level confidence as a percentage string, if present.
    #[must_use]
    pub fn confidence_text(&self) -> Option<String> {
        self.confidence.and_then(format_confidence)
    }

    /// Steps to show on the recommendations screen.
    ///
    /// Uses the non-blank `next_steps`; failing that, symptoms, organic
    /// treatment and prevention in that order; failing that, a single
    /// [`NO_RECOMMENDATIONS`] line.
    #[must_use]
    pub fn recommendation_steps(&self) -> Vec<String> {
        let steps = clean_lines(self.next_steps.iter().flatten());
        if !steps.is_empty() {
            return steps;
        }

        let fallback = clean_lines(
            [&self.symptoms, &self.organic_treatment, &self.prevention]
                .into_iter()
                .flatten(),
        );
        if !fallback.is_empty() {
            return fallback;
        }

        vec![NO_RECOMMENDATIONS.to_string()]
    }
}

/// Trim lines and drop the blank ones.
fn clean_lines<'a>(lines: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Format a confidence value as a percentage with one decimal.
///
/// Values up to `1.0` are read as fractions. Non-finite values yield `None`.
#[must_use]
pub fn format_confidence(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let percent = if value <= 1.0 { value * 100.0 } else { value };
    Some(format!("{percent:.1}%"))
}

// =============================================================================
// Normalization
// =============================================================================

/// The shape a raw payload was recognised as.
#[derive(Debug)]
enum AnalysisPayload {
    /// Null, false, or an empty string.
    Empty,
    /// A string that may hold a JSON object.
    Text(String),
    /// An object under `result` or `analysis`.
    Wrapped(Map<String, Value>),
    /// The text of `output[0].content[0]`.
    Envelope(String),
    /// An object with a `text` string; falls back to the object itself.
    TextField {
        text: String,
        object: Map<String, Value>,
    },
    /// Fields at the top level.
    Flat(Map<String, Value>),
    /// Anything else (numbers, arrays, `true`).
    Unsupported,
}

impl AnalysisPayload {
    fn classify(raw: Value) -> Self {
        match raw {
            Value::Null | Value::Bool(false) => Self::Empty,
            Value::String(s) if s.is_empty() => Self::Empty,
            Value::String(s) => Self::Text(s),
            Value::Object(mut object) => {
                for key in ["result", "analysis"] {
                    if matches!(object.get(key), Some(Value::Object(_)))
                        && let Some(Value::Object(inner)) = object.remove(key)
                    {
                        return Self::Wrapped(inner);
                    }
                }
                if let Some(text) = envelope_text(&object) {
                    return Self::Envelope(text.to_string());
                }
                if let Some(text) = object.get("text").and_then(Value::as_str) {
                    let text = text.to_string();
                    return Self::TextField { text, object };
                }
                Self::Flat(object)
            }
            _ => Self::Unsupported,
        }
    }
}

/// `output[0].content[0].text`, if it is a string.
fn envelope_text(object: &Map<String, Value>) -> Option<&str> {
    object
        .get("output")?
        .as_array()?
        .first()?
        .get("content")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()
}

/// Normalize a raw plant-analysis payload.
#[must_use]
pub fn normalize(raw: Value) -> PlantAnalysisResult {
    normalize_at(raw, 0)
}

fn normalize_at(raw: Value, depth: usize) -> PlantAnalysisResult {
    if depth >= MAX_DEPTH {
        warn!(depth, "Plant analysis nested too deeply, using current layer");
        return match raw {
            Value::Object(object) => from_flat(object),
            _ => PlantAnalysisResult::default(),
        };
    }

    match AnalysisPayload::classify(raw) {
        AnalysisPayload::Empty | AnalysisPayload::Unsupported => PlantAnalysisResult::default(),
        AnalysisPayload::Text(text) | AnalysisPayload::Envelope(text) => {
            extract_json_object(&text).map_or_else(PlantAnalysisResult::default, |object| {
                normalize_at(Value::Object(object), depth + 1)
            })
        }
        AnalysisPayload::Wrapped(inner) => normalize_at(Value::Object(inner), depth + 1),
        AnalysisPayload::TextField { text, object } => match extract_json_object(&text) {
            Some(parsed) => normalize_at(Value::Object(parsed), depth + 1),
            None => from_flat(object),
        },
        AnalysisPayload::Flat(object) => from_flat(object),
    }
}

/// Find a JSON object in `text`: the whole text, or else the span from the
/// first `{` to the last `}`.
///
/// Text that starts like JSON but fails to parse is not searched further.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(object)) => return Some(object),
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    let open = trimmed.find('{')?;
    let close = trimmed.rfind('}')?;
    if close <= open {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed.get(open..=close)?) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Build a result from top-level fields.
///
/// Fields of the wrong type stay in `extra` untouched.
fn from_flat(mut object: Map<String, Value>) -> PlantAnalysisResult {
    let mut result = PlantAnalysisResult {
        crop_type: take_string(&mut object, "crop_type"),
        disease_name: take_string(&mut object, "disease_name"),
        confidence: take_number(&mut object, "confidence"),
        symptoms: take_string(&mut object, "symptoms"),
        organic_treatment: take_string(&mut object, "organic_treatment"),
        chemical_treatment: take_string(&mut object, "chemical_treatment"),
        prevention: take_string(&mut object, "prevention"),
        next_steps: take_array(&mut object, "next_steps")
            .map(|items| items.into_iter().filter_map(into_string).collect()),
        detections: take_array(&mut object, "detections")
            .map(|items| items.into_iter().filter_map(into_detection).collect()),
        extra: Map::new(),
    };
    result.extra = object;

    if result.detections.is_none()
        && let Some(name) = result.disease_name.as_ref().filter(|n| !n.trim().is_empty())
    {
        result.detections = Some(vec![Detection {
            label: name.clone(),
            kind: Some(DetectionKind::Disease),
            confidence: result.confidence,
        }]);
        // A mistyped `detections` value is replaced, not kept next to it
        result.extra.remove("detections");
    }

    result
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(_)) => object.remove(key).and_then(into_string),
        _ => None,
    }
}

fn take_number(object: &mut Map<String, Value>, key: &str) -> Option<f64> {
    let value = object.get(key)?.as_f64().filter(|f| f.is_finite())?;
    object.remove(key);
    Some(value)
}

fn take_array(object: &mut Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    match object.get(key) {
        Some(Value::Array(_)) => match object.remove(key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn into_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn into_detection(value: Value) -> Option<Detection> {
    let Value::Object(object) = value else {
        return None;
    };
    Some(Detection {
        label: object
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        kind: object
            .get("kind")
            .and_then(Value::as_str)
            .and_then(|k| serde_json::from_value(Value::String(k.to_string())).ok()),
        confidence: object
            .get("confidence")
            .and_then(Value::as_f64)
            .filter(|f| f.is_finite()),
    })
}
