use config::{Config, ConfigError, Environment, Map};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TARGET_ELEMENT_ID: &str = "add";
pub const DEFAULT_SMTP_PORT: u16 = 587;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// An address that passed the `local@domain.tld` shape check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into();
        if email.is_ascii() && EMAIL_SHAPE.is_match(&email) {
            Ok(Self(email))
        } else {
            Err(format!("{email} is not a valid email address"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Validated runtime settings. Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub region: String,
    pub target_url: Url,
    pub target_element_id: String,
    pub recipient: EmailAddress,
    pub sender: EmailAddress,
    pub smtp: SmtpSettings,
}

/// Settings as they arrive from the environment, before validation.
/// Keys are the lower-cased environment variable names.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawSettings {
    pub aws_region: Option<String>,
    pub aws_default_region: Option<String>,
    pub target_url: Option<String>,
    pub to_email: Option<String>,
    pub from_email: Option<String>,
    pub target_element_id: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

impl Settings {
    /// Loads and validates settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default())
    }

    /// Same as [`Settings::from_env`] but reads from an explicit map instead of
    /// the process environment.
    pub fn from_map(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default().source(Some(vars)))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let raw: RawSettings = Config::builder()
            .add_source(environment.ignore_empty(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .inspect_err(|e| tracing::error!(error = %e, "Failed to read configuration"))?;

        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        Self::validate(raw)
            .inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let region = non_empty(raw.aws_region)
            .or_else(|| non_empty(raw.aws_default_region))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let target_url = non_empty(raw.target_url)
            .ok_or_else(|| ConfigError::Message("TARGET_URL is required".into()))?;
        let target_url = Url::parse(&target_url).map_err(|e| {
            ConfigError::Message(format!("TARGET_URL is not a valid URL ({target_url}): {e}"))
        })?;

        let recipient = required_email(raw.to_email, "TO_EMAIL")?;
        let sender = required_email(raw.from_email, "FROM_EMAIL")?;

        let target_element_id = non_empty(raw.target_element_id)
            .unwrap_or_else(|| DEFAULT_TARGET_ELEMENT_ID.to_string());

        let port = match non_empty(raw.smtp_port) {
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| ConfigError::Message(format!("SMTP_PORT must be a port number, got {port}")))?,
            None => DEFAULT_SMTP_PORT,
        };
        let host = non_empty(raw.smtp_host)
            .unwrap_or_else(|| format!("email-smtp.{region}.amazonaws.com"));

        Ok(Settings {
            region,
            target_url,
            target_element_id,
            recipient,
            sender,
            smtp: SmtpSettings {
                host,
                port,
                username: non_empty(raw.smtp_username),
                password: non_empty(raw.smtp_password),
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_email(value: Option<String>, name: &str) -> Result<EmailAddress, ConfigError> {
    let value = non_empty(value).ok_or_else(|| ConfigError::Message(format!("{name} is required")))?;
    EmailAddress::parse(value).map_err(|e| ConfigError::Message(format!("{name}: {e}")))
}
