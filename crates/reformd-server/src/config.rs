//! Environment-driven server configuration.
//!
//! Every key has a default except the Resend credentials, which may be
//! absent: the server still starts and signups still persist, and the
//! missing credential is reported when the first email is attempted.
//! Secrets are read from the environment first, then from
//! `/run/secrets/<KEY>`.

use std::fmt::Display;
use std::fs::read_to_string;
use std::str::FromStr;

use reformd_db::{DbConfig, DbCredentials};
use reformd_mail::ResendConfig;
use reformd_waitlist::WaitlistConfig;
use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub db: DbConfig,
    pub waitlist: WaitlistConfig,
    pub resend: ResendConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| read_secret(key))
                .filter(|v| !v.trim().is_empty())
        })
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_defaults = DbConfig::default();
        let waitlist_defaults = WaitlistConfig::default();

        let db = DbConfig {
            url: lookup("SURREAL_URL").unwrap_or(db_defaults.url),
            namespace: lookup("SURREAL_NAMESPACE").unwrap_or(db_defaults.namespace),
            database: lookup("SURREAL_DATABASE").unwrap_or(db_defaults.database),
            credentials: db_credentials(&lookup),
        };

        let waitlist = WaitlistConfig {
            site_url: lookup("SITE_URL"),
            rate_limit_window_secs: parse_or(
                &lookup,
                "RATE_LIMIT_WINDOW_SECS",
                waitlist_defaults.rate_limit_window_secs,
            ),
            rate_limit_max: parse_or(&lookup, "RATE_LIMIT_MAX", waitlist_defaults.rate_limit_max),
            ..waitlist_defaults
        };

        let resend = ResendConfig {
            api_key: lookup("RESEND_API_KEY"),
            from: lookup("RESEND_FROM"),
            timeout_secs: waitlist.collaborator_timeout_secs,
            ..Default::default()
        };

        Self {
            port: parse_or(&lookup, "PORT", 3000),
            db,
            waitlist,
            resend,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}; using default: {default}");
        default
    })
}

/// Root credentials when both halves are set. A lone username or
/// password is ignored with a warning.
fn db_credentials(lookup: &impl Fn(&str) -> Option<String>) -> Option<DbCredentials> {
    match (lookup("SURREAL_USERNAME"), lookup("SURREAL_PASSWORD")) {
        (Some(username), Some(password)) => Some(DbCredentials { username, password }),
        (None, None) => {
            info!("SURREAL_USERNAME/SURREAL_PASSWORD not set, connecting unauthenticated");
            None
        }
        _ => {
            warn!("Only one of SURREAL_USERNAME/SURREAL_PASSWORD is set; connecting unauthenticated");
            None
        }
    }
}

fn read_secret(key: &str) -> Option<String> {
    read_to_string(format!("/run/secrets/{key}"))
        .map(|s| s.trim().to_string())
        .ok()
}
