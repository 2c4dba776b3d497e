// src/config/mail.rs
use lettre::message::Mailbox;
use std::fmt;

use crate::error::{Error, Result};

pub const ENV_EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
pub const ENV_EMAIL_PASSWORD: &str = "EMAIL_PASSWORD";
pub const ENV_SMTP_SERVER: &str = "EMAIL_SMTP_SERVER";
pub const ENV_SMTP_PORT: &str = "EMAIL_SMTP_PORT";
pub const ENV_TO_EMAIL: &str = "TO_EMAIL";

/// SMTP relay settings. The sender address doubles as the login name.
#[derive(Clone)]
pub struct MailConfig {
    pub from: Mailbox,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub to: Mailbox,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("from", &self.from.to_string())
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("to", &self.to.to_string())
            .finish()
    }
}

impl MailConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; every key is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank counts as missing; the password is kept verbatim, everything else trimmed.
        let require_raw = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{key} missing")))
        };
        let require = |key: &str| require_raw(key).map(|v| v.trim().to_string());

        let from_addr = require(ENV_EMAIL_ADDRESS)?;
        let password = require_raw(ENV_EMAIL_PASSWORD)?;
        let host = require(ENV_SMTP_SERVER)?;
        let port_raw = require(ENV_SMTP_PORT)?;
        let to_addr = require(ENV_TO_EMAIL)?;

        let port = port_raw
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("{ENV_SMTP_PORT} is not a port: {port_raw:?}")))?;
        let from = from_addr
            .parse::<Mailbox>()
            .map_err(|e| Error::Config(format!("invalid {ENV_EMAIL_ADDRESS}: {e}")))?;
        let to = to_addr
            .parse::<Mailbox>()
            .map_err(|e| Error::Config(format!("invalid {ENV_TO_EMAIL}: {e}")))?;

        Ok(Self {
            from,
            password,
            host,
            port,
            to,
        })
    }

    /// Login name for the relay.
    pub fn username(&self) -> String {
        self.from.email.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars() -> HashMap<&'static str, String> {
        HashMap::from([
            (ENV_EMAIL_ADDRESS, "digest@example.org".to_string()),
            (ENV_EMAIL_PASSWORD, "hunter2".to_string()),
            (ENV_SMTP_SERVER, "smtp.example.org".to_string()),
            (ENV_SMTP_PORT, "587".to_string()),
            (ENV_TO_EMAIL, "Reader <reader@example.org>".to_string()),
        ])
    }

    fn load(v: &HashMap<&'static str, String>) -> Result<MailConfig> {
        MailConfig::from_lookup(|k| v.get(k).cloned())
    }

    #[test]
    fn complete_env_loads() {
        let cfg = load(&vars()).unwrap();
        assert_eq!(cfg.port, 587);
        assert_eq!(cfg.host, "smtp.example.org");
        assert_eq!(cfg.username(), "digest@example.org");
        assert_eq!(cfg.to.email.to_string(), "reader@example.org");
    }

    #[test]
    fn each_missing_key_is_a_config_error() {
        for key in [
            ENV_EMAIL_ADDRESS,
            ENV_EMAIL_PASSWORD,
            ENV_SMTP_SERVER,
            ENV_SMTP_PORT,
            ENV_TO_EMAIL,
        ] {
            let mut v = vars();
            v.remove(key);
            let err = load(&v).unwrap_err();
            assert!(matches!(err, Error::Config(ref m) if m.contains(key)), "{key}: {err}");
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut v = vars();
        v.insert(ENV_EMAIL_PASSWORD, "   ".into());
        assert!(matches!(load(&v), Err(Error::Config(_))));
    }

    #[test]
    fn password_is_not_trimmed() {
        let mut v = vars();
        v.insert(ENV_EMAIL_PASSWORD, " pass phrase ".into());
        v.insert(ENV_SMTP_SERVER, " smtp.example.org ".into());
        let cfg = load(&v).unwrap();
        assert_eq!(cfg.password, " pass phrase ");
        assert_eq!(cfg.host, "smtp.example.org");
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let mut v = vars();
        v.insert(ENV_SMTP_PORT, "smtp".into());
        assert!(matches!(load(&v), Err(Error::Config(_))));
    }

    #[test]
    fn bad_address_is_rejected() {
        let mut v = vars();
        v.insert(ENV_TO_EMAIL, "not an address".into());
        assert!(matches!(load(&v), Err(Error::Config(_))));
    }

    #[test]
    fn debug_hides_password() {
        let cfg = load(&vars()).unwrap();
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }
}
