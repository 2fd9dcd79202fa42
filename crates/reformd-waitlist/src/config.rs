//! Waitlist configuration.

use std::time::Duration;

/// Configuration for the waitlist service.
#[derive(Debug, Clone)]
pub struct WaitlistConfig {
    /// Rate-limit window length in seconds (default: 60).
    pub rate_limit_window_secs: u64,
    /// Submissions allowed per client per window (default: 8).
    pub rate_limit_max: u32,
    /// Verification token lifetime in seconds (default: 86_400 = 24 hours).
    pub verification_token_lifetime_secs: u64,
    /// Public base URL for links and redirects, e.g.
    /// `https://www.getreformd.com`. `None` falls back to the origin the
    /// request arrived on.
    pub site_url: Option<String>,
    /// Path of the verification endpoint.
    pub verify_path: String,
    /// Page the verification endpoint redirects to.
    pub redirect_path: String,
    pub email_subject: String,
    /// Upper bound on any single store or notifier call, in seconds.
    pub collaborator_timeout_secs: u64,
}

impl WaitlistConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_secs)
    }

    /// The configured site URL without trailing slashes, if any.
    pub fn site_base(&self) -> Option<&str> {
        self.site_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            rate_limit_window_secs: 60,
            rate_limit_max: 8,
            verification_token_lifetime_secs: 86_400,
            site_url: None,
            verify_path: "/waitlist/verify".into(),
            redirect_path: "/".into(),
            email_subject: "Confirm your Re:Formd waitlist spot".into(),
            collaborator_timeout_secs: 5,
        }
    }
}
