//! Forgiving deserializers for fields typed by hand in the editor.
//!
//! The authoring surface stores whatever is in a number input at the moment
//! it changes, so a script can legitimately contain `""`, `null`, a numeric
//! string, or nothing at all where a number is expected. None of these are
//! errors: anything that is not a finite number decodes as `0`.
//!
//! The same goes for the rest of a saved script. Identifiers minted by the
//! editor (`"sprite-1"`, a millisecond timestamp) are accepted as opaque
//! keys, and a half-built block decodes to [`Action::Unknown`] rather than
//! rejecting the sprite it belongs to.
//!
//! Use with `#[serde(default, deserialize_with = "lenient::number")]`.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use crate::actions::{Action, ScriptBlock};
use crate::sprite::MessageKind;

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Coerce a loosely-typed value into a finite `f64`, defaulting to `0.0`.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match LooseValue::deserialize(deserializer)? {
        LooseValue::Number(value) => value,
        LooseValue::Text(raw) => parse_number(&raw),
        LooseValue::Other(_) => 0.0,
    };
    Ok(finite_or_zero(value))
}

/// Coerce a loosely-typed value into a repetition count.
///
/// Negative and non-finite values count as zero repetitions. Fractional
/// values round up, matching a `j < times` loop counter.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer).map(repetitions)
}

/// Coerce a loosely-typed value into a string; non-strings become empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Text(raw) => raw,
        LooseValue::Number(value) => value.to_string(),
        LooseValue::Other(_) => String::new(),
    })
}

/// Decode an opaque identifier.
///
/// A UUID string is taken as is. Any other string or number maps to a UUID
/// derived from its text, so the same editor key always yields the same
/// id. Anything else gets a fresh id.
pub fn id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<Uuid> + Default,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Text(raw) => opaque_id(&raw),
        LooseValue::Number(value) => opaque_id(&value.to_string()),
        LooseValue::Other(_) => T::default(),
    })
}

/// Map an external key to an identifier; see [`id`].
pub fn opaque_id<T: From<Uuid>>(key: &str) -> T {
    Uuid::parse_str(key.trim())
        .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
        .into()
}

/// Decode a list of script blocks; `null` or a non-list is an empty script.
///
/// Each element goes through [`ScriptBlock::from_value`], so no single
/// block can fail the list.
pub fn blocks<'de, D>(deserializer: D) -> Result<Vec<ScriptBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().map(ScriptBlock::from_value).collect(),
        _ => Vec::new(),
    })
}

/// Decode a bubble style; anything but `"say"` or `"think"` is no bubble.
pub fn message_kind<'de, D>(deserializer: D) -> Result<MessageKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Text(raw) => match raw.as_str() {
            "say" => MessageKind::Say,
            "think" => MessageKind::Think,
            _ => MessageKind::None,
        },
        LooseValue::Number(_) | LooseValue::Other(_) => MessageKind::None,
    })
}

/// Decode one action, falling back to [`Action::Unknown`].
pub(crate) fn action(value: &Value) -> Action {
    Action::deserialize(value).unwrap_or(Action::Unknown)
}

/// Convert a raw repetition value into a loop count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn repetitions(times: f64) -> u32 {
    if !times.is_finite() || times <= 0.0 {
        return 0;
    }
    // `as` saturates at u32::MAX.
    times.ceil() as u32
}

fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

const fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
