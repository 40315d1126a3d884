//! Data models shared by the monitor, the status store and the launcher

pub mod config;
pub mod snapshot;
pub mod status;

use serde::{Deserialize, Deserializer};

/// Accept an identifier sent either as a JSON string or a JSON number
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number identifier, got {}",
            other
        ))),
    }
}
