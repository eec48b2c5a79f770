use std::time::Duration;

use humantime::{format_duration, parse_duration};
use serde::{Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};

/// Durations written as humantime text (`"250ms"`, `"4s"`) or as a bare
/// number of milliseconds. Always written back as text.
pub(crate) struct HumantimeDuration;

#[derive(Deserialize)]
#[serde(untagged)]
enum Written {
    Millis(u64),
    Text(String),
}

impl<'de> DeserializeAs<'de, Duration> for HumantimeDuration {
    fn deserialize_as<D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Written::deserialize(deserializer)? {
            Written::Millis(millis) => Ok(Duration::from_millis(millis)),
            Written::Text(text) => parse_duration(text.trim()).map_err(serde::de::Error::custom),
        }
    }
}

impl SerializeAs<Duration> for HumantimeDuration {
    fn serialize_as<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&format_duration(*value))
    }
}

#[cfg(test)]
mod tests {
    use super::HumantimeDuration;
    use serde::{Deserialize, Serialize};
    use serde_with::serde_as;
    use std::time::Duration;

    #[serde_as]
    #[derive(Deserialize, Serialize)]
    struct Sample {
        #[serde_as(as = "HumantimeDuration")]
        delay: Duration,
    }

    #[test]
    fn humantime_duration_parses_strings() {
        let sample: Sample = match serde_json::from_str(r#"{"delay":"250ms"}"#) {
            Ok(value) => value,
            Err(err) => panic!("failed to parse sample json: {err}"),
        };
        assert_eq!(sample.delay, Duration::from_millis(250));
    }

    #[test]
    fn humantime_duration_formats_compactly() {
        let sample = Sample {
            delay: Duration::from_millis(4_000),
        };
        let json = match serde_json::to_string(&sample) {
            Ok(value) => value,
            Err(err) => panic!("failed to serialize sample: {err}"),
        };
        assert_eq!(json, r#"{"delay":"4s"}"#);
    }

    #[test]
    fn bare_numbers_are_milliseconds() {
        let sample: Sample = match serde_json::from_str(r#"{"delay":1500}"#) {
            Ok(value) => value,
            Err(err) => panic!("failed to parse numeric delay: {err}"),
        };
        assert_eq!(sample.delay, Duration::from_millis(1_500));
    }

    #[test]
    fn humantime_duration_rejects_garbage() {
        assert!(serde_json::from_str::<Sample>(r#"{"delay":"soon"}"#).is_err());
    }
}
