//! Waitlist service — signup intake and email verification
//! orchestration.

use std::net::IpAddr;

use chrono::Utc;
use reformd_core::error::{ReformdError, ReformdResult};
use reformd_core::models::signup::{
    Attribution, PendingVerification, Signup, SignupProfile, UpsertSignup,
};
use reformd_core::notifier::{Delivery, Notifier, OutgoingEmail};
use reformd_core::repository::SignupRepository;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::WaitlistConfig;
use crate::email;
use crate::error::WaitlistError;
use crate::input;
use crate::rate_limit::RateLimiter;
use crate::token;

/// What the transport layer knows about the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Rate-limit key. `None` disables limiting for this request.
    pub client_ip: Option<IpAddr>,
    pub host: Option<String>,
    pub origin: Option<String>,
    pub referer: Option<String>,
    /// `scheme://host` the request arrived on, used when no site URL
    /// is configured.
    pub request_base: Option<String>,
}

/// Input for the signup flow.
#[derive(Debug, Clone, Default)]
pub struct SubmitInput {
    pub email: String,
    pub profile: SignupProfile,
    pub attribution: Attribution,
    /// Honeypot; genuine submissions leave it empty.
    pub website: Option<String>,
    pub context: RequestContext,
}

/// Result of a signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitOutput {
    /// A record for this email existed before the submission.
    pub already: bool,
    pub email_sent: bool,
    /// The email had already been verified before the submission.
    pub verified: bool,
}

impl SubmitOutput {
    const ABSORBED: Self = Self {
        already: false,
        email_sent: false,
        verified: false,
    };
}

/// Where a verification link visit ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Success,
    Already,
    Missing,
    Invalid,
    Expired,
    Error,
}

impl VerifyOutcome {
    /// Query flag rendered by the landing page banner.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Already => "already",
            Self::Missing => "missing",
            Self::Invalid => "invalid",
            Self::Expired => "expired",
            Self::Error => "error",
        }
    }
}

/// Waitlist service.
///
/// Generic over the store and the notifier so it has no dependency on
/// SurrealDB or on any mail provider. Owns the rate limiter; its
/// counters live as long as the service does.
pub struct WaitlistService<R: SignupRepository, N: Notifier> {
    repo: R,
    notifier: N,
    limiter: RateLimiter,
    config: WaitlistConfig,
}

impl<R: SignupRepository, N: Notifier> WaitlistService<R, N> {
    pub fn new(repo: R, notifier: N, config: WaitlistConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_window(), config.rate_limit_max);
        Self {
            repo,
            notifier,
            limiter,
            config,
        }
    }

    /// Count one submission attempt against the client's window.
    ///
    /// [`submit`](Self::submit) calls this itself. Transports call it
    /// directly only for requests that never reach `submit`, such as an
    /// unparseable body, so those still count.
    pub fn throttle(&self, client_ip: Option<IpAddr>) -> ReformdResult<()> {
        if self.limiter.check(client_ip) {
            return Ok(());
        }
        warn!(client_ip = ?client_ip, "Waitlist rate limit exceeded");
        Err(WaitlistError::RateLimited.into())
    }

    /// Record a waitlist signup and send a confirmation link unless the
    /// email is already verified.
    pub async fn submit(&self, submission: SubmitInput) -> ReformdResult<SubmitOutput> {
        let SubmitInput {
            email,
            profile,
            attribution,
            website,
            context,
        } = submission;

        // 1. Throttle per client address.
        self.throttle(context.client_ip)?;

        // 2. Normalize and validate.
        let email = input::normalize_email(&email)?;

        // 3. Bots get a success-shaped answer and nothing else.
        if input::honeypot_tripped(website.as_deref()) {
            info!(client_ip = ?context.client_ip, "Honeypot tripped, absorbing submission");
            return Ok(SubmitOutput::ABSORBED);
        }

        // 4. Existing record?
        let existing = match self
            .bounded("signup lookup", self.repo.get_by_email(&email))
            .await
        {
            Ok(signup) => Some(signup),
            Err(ReformdError::NotFound { .. }) => None,
            Err(e) => {
                error!(email = %email, error = %e, "Signup lookup failed");
                return Err(e);
            }
        };
        let already = existing.is_some();
        let already_verified = existing.as_ref().is_some_and(Signup::is_verified);

        // 5. Fresh token unless verified; replaces any outstanding one.
        let issued = (!already_verified).then(|| {
            token::issue(Utc::now(), self.config.verification_token_lifetime_secs)
        });

        let mut attribution = input::clean_attribution(attribution);
        attribution.source = attribution
            .source
            .or_else(|| input::clean(context.host.clone()))
            .or_else(|| input::clean(context.origin.clone()));
        attribution.referrer = attribution
            .referrer
            .or_else(|| input::clean(context.referer.clone()));

        // 6. Persist; a failure here stops before any email goes out.
        self.bounded(
            "signup upsert",
            self.repo.upsert(UpsertSignup {
                email: email.clone(),
                profile: input::clean_profile(profile),
                attribution,
                pending: issued.as_ref().map(|t| PendingVerification {
                    token_digest: t.digest.clone(),
                    expires_at: t.expires_at,
                }),
            }),
        )
        .await
        .inspect_err(|e| error!(email = %email, error = %e, "Signup upsert failed"))?;

        info!(
            email = %email,
            already,
            already_verified,
            token_issued = issued.is_some(),
            "Waitlist signup recorded"
        );

        // 7. Notify.
        let email_sent = match issued {
            Some(issued) => {
                self.send_verification(&email, &issued.token, context.request_base.as_deref())
                    .await?
            }
            None => false,
        };

        Ok(SubmitOutput {
            already,
            email_sent,
            verified: already_verified,
        })
    }

    /// Resolve a verification link visit.
    ///
    /// Never mutates a record except through the compare-and-set
    /// promotion, so every failure leaves the record as it was.
    pub async fn verify(&self, raw_token: Option<&str>) -> VerifyOutcome {
        let raw_token = raw_token.map(str::trim).unwrap_or_default();
        if raw_token.is_empty() {
            return VerifyOutcome::Missing;
        }

        let digest = token::hash_verification_token(raw_token);

        let signup = match self
            .bounded("token lookup", self.repo.get_by_token_digest(&digest))
            .await
        {
            Ok(signup) => signup,
            Err(ReformdError::NotFound { .. }) => {
                info!("Verification token did not match any signup");
                return VerifyOutcome::Invalid;
            }
            Err(e) => {
                error!(error = %e, "Verification lookup failed");
                return VerifyOutcome::Error;
            }
        };

        if signup.is_verified() {
            info!(email = %signup.email, "Signup already verified");
            return VerifyOutcome::Already;
        }

        let Some(pending) = signup
            .pending
            .as_ref()
            .filter(|p| p.token_digest == digest)
        else {
            return VerifyOutcome::Invalid;
        };

        let now = Utc::now();
        if pending.is_expired_at(now) {
            info!(
                email = %signup.email,
                expired_at = %pending.expires_at,
                "Verification token expired"
            );
            return VerifyOutcome::Expired;
        }

        match self
            .bounded("verification update", self.repo.mark_verified(&digest, now))
            .await
        {
            Ok(verified) => {
                info!(email = %verified.email, "Signup verified");
                VerifyOutcome::Success
            }
            // Lost a race: another click verified it, or a resubmission
            // replaced the token, between the lookup and the update.
            Err(ReformdError::NotFound { .. }) => self.resolve_lost_race(&digest).await,
            Err(e) => {
                error!(email = %signup.email, error = %e, "Verification update failed");
                VerifyOutcome::Error
            }
        }
    }

    /// Absolute (or, lacking any base, relative) redirect target for a
    /// verification outcome.
    pub fn redirect_url(&self, outcome: VerifyOutcome, request_base: Option<&str>) -> String {
        let base = self.config.site_base().or(request_base).unwrap_or_default();
        email::verification_redirect(base, &self.config.redirect_path, outcome.as_str())
    }

    async fn resolve_lost_race(&self, digest: &str) -> VerifyOutcome {
        match self
            .bounded("token lookup", self.repo.get_by_token_digest(digest))
            .await
        {
            Ok(signup) if signup.is_verified() => {
                info!(email = %signup.email, "Concurrent verification already applied");
                VerifyOutcome::Already
            }
            Ok(signup) => {
                warn!(email = %signup.email, "Verification update conflicted");
                VerifyOutcome::Error
            }
            Err(e) => {
                warn!(error = %e, "Verification update conflicted");
                VerifyOutcome::Error
            }
        }
    }

    /// Returns whether the provider accepted the message. Only a missing
    /// delivery configuration is an error.
    async fn send_verification(
        &self,
        to: &str,
        raw_token: &str,
        request_base: Option<&str>,
    ) -> ReformdResult<bool> {
        let Some(base) = self.config.site_base().or(request_base) else {
            return Err(ReformdError::Internal(
                "cannot build verification link: no site URL configured or inferable".into(),
            ));
        };

        let link = email::verification_link(base, &self.config.verify_path, raw_token);
        let message = OutgoingEmail {
            to: to.to_string(),
            subject: self.config.email_subject.clone(),
            html: email::render_verification_email(
                &link,
                self.config.verification_token_lifetime_secs / 3600,
            ),
        };

        let delivery = match tokio::time::timeout(
            self.config.collaborator_timeout(),
            self.notifier.send(message),
        )
        .await
        {
            Ok(Ok(delivery)) => delivery,
            Ok(Err(e)) => {
                error!(email = %to, error = %e, "Email delivery misconfigured");
                return Err(e);
            }
            Err(_) => Delivery::Failed {
                reason: "delivery timed out".into(),
            },
        };

        match &delivery {
            Delivery::Sent { id } => info!(email = %to, message_id = %id, "Verification email sent"),
            Delivery::Failed { reason } => {
                warn!(email = %to, reason = %reason, "Verification email not sent")
            }
        }

        Ok(delivery.is_sent())
    }

    async fn bounded<T>(
        &self,
        what: &'static str,
        call: impl Future<Output = ReformdResult<T>>,
    ) -> ReformdResult<T> {
        match tokio::time::timeout(self.config.collaborator_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(WaitlistError::Timeout(what).into()),
        }
    }
}
