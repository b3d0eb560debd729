use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WATCH_BASE: &str = "https://www.youtube.com/watch?v=";
pub const DEFAULT_IMAGE_URL: &str = "https://i.ytimg.com/img/no_thumbnail.jpg";
pub const DEFAULT_SIGNATURE: &str = "Dev: @SunsetOfMe";
pub const DEFAULT_USER_AGENT: &str = concat!("nowcard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CardConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub lookup: LookupSection,
    #[serde(default)]
    pub assets: AssetSection,
    #[serde(default)]
    pub style: StyleSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupSection {
    /// Search endpoint queried for track metadata. Without it every lookup
    /// falls back to placeholder metadata.
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_watch_base")]
    pub watch_base: String,
    #[serde(default = "default_image_url")]
    pub default_image_url: String,
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub request_timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for LookupSection {
    fn default() -> Self {
        Self {
            api_base: None,
            watch_base: default_watch_base(),
            default_image_url: default_image_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssetSection {
    pub title_font: Option<PathBuf>,
    pub body_font: Option<PathBuf>,
    pub icon: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleSection {
    #[serde(default = "default_signature")]
    pub signature: String,
    #[serde(default)]
    pub accent_glow: Option<[u8; 4]>,
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            signature: default_signature(),
            accent_glow: None,
        }
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            lookup: LookupSection::default(),
            assets: AssetSection::default(),
            style: StyleSection::default(),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_watch_base() -> String {
    DEFAULT_WATCH_BASE.to_string()
}

fn default_image_url() -> String {
    DEFAULT_IMAGE_URL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_signature() -> String {
    DEFAULT_SIGNATURE.to_string()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl CardConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: CardConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        validate_http_url("lookup.default_image_url", &self.lookup.default_image_url)?;
        validate_http_url("lookup.watch_base", &self.lookup.watch_base)?;
        if let Some(api_base) = &self.lookup.api_base {
            validate_http_url("lookup.api_base", api_base)?;
        }

        if self.lookup.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "lookup.request_timeout must be greater than zero".into(),
            ));
        }

        if self.lookup.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "lookup.user_agent may not be empty".into(),
            ));
        }

        for (field, path) in [
            ("assets.title_font", &self.assets.title_font),
            ("assets.body_font", &self.assets.body_font),
            ("assets.icon", &self.assets.icon),
        ] {
            if let Some(path) = path {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid(format!("{field} may not be empty")));
                }
            }
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} may not be empty")));
    }
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "{field} '{value}' must be an http(s) URL"
        ))),
    }
}
