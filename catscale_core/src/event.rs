//! Event wire types and the serialized record format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CoreError;

/// Notification emitted by the cascade and consumed by the aggregator.
/// Ordering is significant: a `StablePhase` or `EndOfEvent` only makes sense
/// after the `StartOfEvent` that opened the episode.
#[derive(Debug, Clone, PartialEq)]
pub enum EventNotification {
    StartOfEvent {
        timestamp: DateTime<Utc>,
    },
    StablePhase {
        timestamp: DateTime<Utc>,
        /// Accumulated stable time in seconds
        length: f64,
        /// Mean conditioned weight over the phase, in grams
        value: f64,
    },
    EndOfEvent {
        timestamp: DateTime<Utc>,
    },
}

/// One reported stable interval within a scale event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StablePhase {
    #[serde(with = "iso8601_millis")]
    pub timestamp: DateTime<Utc>,
    /// Seconds, reported with one decimal place
    #[serde(serialize_with = "one_decimal")]
    pub length: f64,
    /// Grams, reported with one decimal place
    #[serde(serialize_with = "one_decimal")]
    pub value: f64,
}

/// One complete start-to-end episode on the scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleEvent {
    #[serde(with = "iso8601_millis")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso8601_millis")]
    pub end_time: DateTime<Utc>,
    pub stable_phases: Vec<StablePhase>,
}

impl ScaleEvent {
    /// Serialize to the wire format, refusing to exceed `limit` bytes.
    /// An oversized record is an error, never a truncated payload.
    pub fn to_json(&self, limit: usize) -> Result<Vec<u8>, CoreError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| CoreError::Serialization(e.to_string()))?;
        if bytes.len() > limit {
            return Err(CoreError::SerializationOverflow {
                limit,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }
}

/// ISO-8601 UTC with millisecond precision and a literal `Z` suffix,
/// e.g. `2023-05-27T06:47:33.123Z`. The backend parses exactly this shape.
mod iso8601_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(Error::custom)
    }
}

fn one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 10.0).round() / 10.0)
}
