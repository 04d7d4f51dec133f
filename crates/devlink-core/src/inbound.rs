//! Inbound payload classification and routing.
//!
//! A device sends two kinds of text frame on the same channel: JSON objects
//! carrying a `type` discriminator, and free text. [`classify`] sorts a
//! payload into exactly one of those paths and validates structured fields
//! one by one, so a single bad field never hides the good ones.

use crate::{FilesystemStatus, LedState, RenderSink, SystemInfo};
use serde_json::{Map, Value};

const LED_ON_MARKER: &str = "LED turned ON";
const LED_OFF_MARKER: &str = "LED turned OFF";

/// Result of classifying one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The payload parsed as JSON.
    Structured(Structured),
    /// The payload is not JSON.
    Text(TextSignal),
}

/// A parsed JSON payload after schema checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured {
    /// A recognised message. `skipped` lists optional fields that were
    /// present with the wrong type and were left out of `update`.
    Valid {
        update: DeviceUpdate,
        skipped: Vec<SkippedField>,
    },
    /// A recognised `type` whose required fields are missing or wrong.
    Malformed { kind: String, reason: String },
    /// Not an object, no `type`, or a `type` this client does not handle.
    UnknownType(Option<String>),
}

/// A typed update extracted from a structured payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceUpdate {
    SystemInfo(SystemInfo),
    ClientCount(u64),
    FilesystemStatus(FilesystemStatus),
}

/// Meaning extracted from a free-text payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSignal {
    Led(LedState),
    Other,
}

/// A field that was present but had the wrong JSON type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedField {
    pub field: &'static str,
    /// JSON type that was found instead.
    pub found: &'static str,
}

/// Classify a raw payload without side effects.
pub fn classify(payload: &str) -> Inbound {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => Inbound::Structured(classify_value(&value)),
        Err(_) => Inbound::Text(classify_text(payload)),
    }
}

/// Classify a payload and push whatever it carries to the sink.
///
/// Never fails; unknown and malformed payloads are dropped after a debug
/// trace. Returns the classification for callers that want it.
pub fn route<S: RenderSink + ?Sized>(payload: &str, sink: &mut S) -> Inbound {
    let inbound = classify(payload);
    match &inbound {
        Inbound::Structured(Structured::Valid { update, skipped }) => {
            for s in skipped {
                tracing::debug!(field = s.field, found = s.found, "skipping invalid field");
            }
            match update {
                DeviceUpdate::SystemInfo(info) => info.apply(sink),
                DeviceUpdate::ClientCount(count) => sink.client_count_changed(*count),
                DeviceUpdate::FilesystemStatus(status) => sink.filesystem_status_changed(status),
            }
        }
        Inbound::Structured(Structured::Malformed { kind, reason }) => {
            tracing::debug!(%kind, %reason, "malformed message");
        }
        Inbound::Structured(Structured::UnknownType(kind)) => {
            tracing::debug!(kind = kind.as_deref().unwrap_or("<none>"), "unknown message type");
        }
        Inbound::Text(TextSignal::Led(state)) => sink.led_changed(*state),
        Inbound::Text(TextSignal::Other) => {}
    }
    inbound
}

fn classify_text(text: &str) -> TextSignal {
    if text.contains(LED_ON_MARKER) {
        TextSignal::Led(LedState::On)
    } else if text.contains(LED_OFF_MARKER) {
        TextSignal::Led(LedState::Off)
    } else {
        TextSignal::Other
    }
}

fn classify_value(value: &Value) -> Structured {
    let Some(obj) = value.as_object() else {
        return Structured::UnknownType(None);
    };
    let Some(kind) = obj.get("type").and_then(Value::as_str) else {
        return Structured::UnknownType(None);
    };

    match kind {
        "status" | "system_info" => {
            let mut skipped = Vec::new();
            let info = SystemInfo {
                led_status: field(obj, "ledStatus", Value::as_bool, &mut skipped),
                free_heap: field(obj, "freeHeap", non_negative, &mut skipped),
                uptime: field(obj, "uptime", Value::as_u64, &mut skipped),
                counter: field(obj, "counter", Value::as_u64, &mut skipped),
            };
            Structured::Valid {
                update: DeviceUpdate::SystemInfo(info),
                skipped,
            }
        }
        "client_count" => match obj.get("count").and_then(Value::as_u64) {
            Some(count) => Structured::Valid {
                update: DeviceUpdate::ClientCount(count),
                skipped: Vec::new(),
            },
            None => malformed(kind, "count must be a non-negative integer"),
        },
        "filesystem_status" => {
            let using = obj.get("usingFilesystem").and_then(Value::as_bool);
            let status = obj.get("status").and_then(Value::as_str);
            match (using, status) {
                (Some(using_filesystem), Some(status)) => Structured::Valid {
                    update: DeviceUpdate::FilesystemStatus(FilesystemStatus {
                        using_filesystem,
                        status: status.to_string(),
                    }),
                    skipped: Vec::new(),
                },
                _ => malformed(kind, "usingFilesystem and status are required"),
            }
        }
        other => Structured::UnknownType(Some(other.to_string())),
    }
}

/// Read an optional field, recording it as skipped if present but invalid.
fn field<T>(
    obj: &Map<String, Value>,
    name: &'static str,
    read: impl Fn(&Value) -> Option<T>,
    skipped: &mut Vec<SkippedField>,
) -> Option<T> {
    let value = obj.get(name)?;
    let parsed = read(value);
    if parsed.is_none() {
        skipped.push(SkippedField {
            field: name,
            found: json_type(value),
        });
    }
    parsed
}

fn non_negative(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| *n >= 0.0)
}

fn malformed(kind: &str, reason: &str) -> Structured {
    Structured::Malformed {
        kind: kind.to_string(),
        reason: reason.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
