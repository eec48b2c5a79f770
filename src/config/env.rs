use std::time::Duration;

use humantime::parse_duration;

use crate::error::ConfigError;

/// Explicit `TOAST_*` overrides, applied after the file and `TOASTLINE__*` sources.
pub(super) struct EnvOverrides {
    lookup: fn(&str) -> Result<String, std::env::VarError>,
}

impl EnvOverrides {
    pub(super) fn process() -> Self {
        Self {
            lookup: |key| std::env::var(key),
        }
    }

    #[cfg(test)]
    pub(super) const fn with_lookup(lookup: fn(&str) -> Result<String, std::env::VarError>) -> Self {
        Self { lookup }
    }

    /// Non-blank value of `key`, trimmed.
    pub(super) fn string(&self, key: &'static str) -> Result<Option<String>, ConfigError> {
        match (self.lookup)(key) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(ConfigError::Other(format!("{key}: {err}"))),
        }
    }

    pub(super) fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(key)?
            .map(|value| {
                value.parse::<T>().map_err(|err| ConfigError::InvalidField {
                    field: key,
                    message: err.to_string(),
                })
            })
            .transpose()
    }

    pub(super) fn duration(&self, key: &'static str) -> Result<Option<Duration>, ConfigError> {
        self.string(key)?
            .map(|value| {
                parse_duration(&value).map_err(|err| ConfigError::InvalidField {
                    field: key,
                    message: err.to_string(),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::EnvOverrides;
    use crate::error::ConfigError;
    use std::env::VarError;
    use std::time::Duration;

    fn fake(key: &str) -> Result<String, VarError> {
        match key {
            "TOAST_MAX" => Ok(" 3 ".into()),
            "TOAST_SOUNDS" => Ok("maybe".into()),
            "TOAST_DURATION" => Ok("1s 500ms".into()),
            "TOAST_THEME" => Ok("   ".into()),
            _ => Err(VarError::NotPresent),
        }
    }

    #[test]
    fn parses_trimmed_values() {
        let env = EnvOverrides::with_lookup(fake);
        assert_eq!(env.parse::<usize>("TOAST_MAX").unwrap(), Some(3));
        assert_eq!(
            env.duration("TOAST_DURATION").unwrap(),
            Some(Duration::from_millis(1_500))
        );
    }

    #[test]
    fn blank_and_missing_are_none() {
        let env = EnvOverrides::with_lookup(fake);
        assert_eq!(env.string("TOAST_THEME").unwrap(), None);
        assert_eq!(env.string("TOAST_POSITION").unwrap(), None);
    }

    #[test]
    fn invalid_value_names_the_key() {
        let env = EnvOverrides::with_lookup(fake);
        let err = env.parse::<bool>("TOAST_SOUNDS").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { field: "TOAST_SOUNDS", .. }));
    }
}
