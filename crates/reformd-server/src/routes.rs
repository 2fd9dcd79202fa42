//! Waitlist HTTP handlers.

use std::net::IpAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::{HOST, ORIGIN, REFERER};
use axum::response::{IntoResponse, Redirect};
use reformd_core::error::ReformdError;
use reformd_core::models::signup::{Attribution, SignupProfile};
use reformd_core::notifier::Notifier;
use reformd_core::repository::SignupRepository;
use reformd_waitlist::{RequestContext, SubmitInput, SubmitOutput, WaitlistService};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::error::ApiError;

pub type SharedService<R, N> = Arc<WaitlistService<R, N>>;

/// JSON body of `POST /waitlist`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WaitlistRequest {
    pub email: Option<String>,

    pub full_name: Option<String>,
    pub age_bracket: Option<String>,
    pub gender: Option<String>,
    pub goal: Option<String>,
    pub biggest_issue: Option<String>,
    pub timeframe: Option<String>,
    pub notes: Option<String>,

    /// Honeypot.
    pub website: Option<String>,

    pub source: Option<String>,
    pub landing_url: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
}

impl WaitlistRequest {
    fn into_input(self, context: RequestContext) -> SubmitInput {
        SubmitInput {
            email: self.email.unwrap_or_default(),
            profile: SignupProfile {
                full_name: self.full_name,
                age_bracket: self.age_bracket,
                gender: self.gender,
                goal: self.goal,
                biggest_issue: self.biggest_issue,
                timeframe: self.timeframe,
                notes: self.notes,
            },
            attribution: Attribution {
                source: self.source,
                landing_url: self.landing_url,
                referrer: self.referrer,
                utm_source: self.utm_source,
                utm_medium: self.utm_medium,
                utm_campaign: self.utm_campaign,
                utm_content: self.utm_content,
                utm_term: self.utm_term,
            },
            website: self.website,
            context,
        }
    }
}

#[derive(Debug, Serialize)]
struct WaitlistResponse {
    ok: bool,
    #[serde(flatten)]
    output: SubmitOutput,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    token: Option<String>,
}

fn header_str(headers: &HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First `X-Forwarded-For` hop, else `X-Real-IP`. Unparseable values
/// yield no key.
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    header_str(headers, "x-forwarded-for")
        .and_then(|xff| xff.split(',').next().map(|s| s.trim().to_string()))
        .or_else(|| header_str(headers, "x-real-ip"))
        .and_then(|ip| ip.parse().ok())
}

/// `scheme://host` the request was addressed to.
pub fn request_base(headers: &HeaderMap) -> Option<String> {
    let host = header_str(headers, "x-forwarded-host").or_else(|| header_str(headers, HOST))?;
    let scheme = header_str(headers, "x-forwarded-proto")
        .and_then(|p| p.split(',').next().map(|s| s.trim().to_string()))
        .unwrap_or_else(|| "https".into());
    Some(format!("{scheme}://{host}"))
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    RequestContext {
        client_ip: client_ip(headers),
        host: header_str(headers, HOST),
        origin: header_str(headers, ORIGIN),
        referer: header_str(headers, REFERER),
        request_base: request_base(headers),
    }
}

/// `GET /waitlist`
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "route": "waitlist" }))
}

/// `POST /waitlist`
pub async fn submit<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    payload: Result<Json<WaitlistRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    R: SignupRepository + 'static,
    N: Notifier + 'static,
{
    let context = request_context(&headers);
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            service.throttle(context.client_ip)?;
            return Err(ReformdError::Validation {
                message: format!("Invalid request body: {}", rejection.body_text()),
            }
            .into());
        }
    };

    let output = service.submit(body.into_input(context)).await?;

    Ok(Json(WaitlistResponse { ok: true, output }))
}

/// `GET /waitlist/verify?token=...`
pub async fn verify<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Query(params): Query<VerifyParams>,
) -> Redirect
where
    R: SignupRepository + 'static,
    N: Notifier + 'static,
{
    let outcome = service.verify(params.token.as_deref()).await;
    info!(outcome = outcome.as_str(), "Verification link visited");

    let target = service.redirect_url(outcome, request_base(&headers).as_deref());
    Redirect::temporary(&target)
}
