//! Normalization and validation of submitted form data.

use std::sync::LazyLock;

use regex::Regex;
use reformd_core::models::signup::{Attribution, SignupProfile};

use crate::error::WaitlistError;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // local@domain.tld with a TLD of at least two characters
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("email pattern compiles")
});

/// Trim and lowercase an email, rejecting empty or malformed input.
pub fn normalize_email(raw: &str) -> Result<String, WaitlistError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(WaitlistError::MissingEmail);
    }
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(WaitlistError::InvalidEmail);
    }
    Ok(email)
}

/// Trim an optional field; blank becomes `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// True when the honeypot field carries anything but whitespace.
pub fn honeypot_tripped(website: Option<&str>) -> bool {
    website.is_some_and(|v| !v.trim().is_empty())
}

pub fn clean_profile(profile: SignupProfile) -> SignupProfile {
    SignupProfile {
        full_name: clean(profile.full_name),
        age_bracket: clean(profile.age_bracket),
        gender: clean(profile.gender),
        goal: clean(profile.goal),
        biggest_issue: clean(profile.biggest_issue),
        timeframe: clean(profile.timeframe),
        notes: clean(profile.notes),
    }
}

pub fn clean_attribution(attribution: Attribution) -> Attribution {
    Attribution {
        source: clean(attribution.source),
        landing_url: clean(attribution.landing_url),
        referrer: clean(attribution.referrer),
        utm_source: clean(attribution.utm_source),
        utm_medium: clean(attribution.utm_medium),
        utm_campaign: clean(attribution.utm_campaign),
        utm_content: clean(attribution.utm_content),
        utm_term: clean(attribution.utm_term),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  User@Example.COM ").unwrap(),
            "user@example.com"
        );
    }

    #[test]
    fn blank_email_is_missing() {
        assert!(matches!(
            normalize_email("   "),
            Err(WaitlistError::MissingEmail)
        ));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in [
            "plainaddress",
            "no-at.example.com",
            "two@@example.com",
            "user@nodot",
            "user@example.c",
            "us er@example.com",
            "@example.com",
        ] {
            assert!(
                matches!(normalize_email(bad), Err(WaitlistError::InvalidEmail)),
                "{bad} should be invalid"
            );
        }
    }

    #[test]
    fn plausible_emails_are_accepted() {
        for good in ["a@b.co", "first.last+tag@sub.example.org"] {
            assert!(normalize_email(good).is_ok(), "{good} should be valid");
        }
    }

    #[test]
    fn clean_drops_blank_values() {
        assert_eq!(clean(Some("  ".into())), None);
        assert_eq!(clean(Some(" sleep ".into())), Some("sleep".into()));
        assert_eq!(clean(None), None);
    }

    #[test]
    fn honeypot_ignores_whitespace() {
        assert!(!honeypot_tripped(None));
        assert!(!honeypot_tripped(Some(" ")));
        assert!(honeypot_tripped(Some("http://spam.example")));
    }
}
