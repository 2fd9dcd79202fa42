//! Re:Formd Server — HTTP surface for the waitlist.
//!
//! | Route | |
//! |---|---|
//! | `GET /waitlist` | health probe |
//! | `POST /waitlist` | signup; JSON in, JSON out |
//! | `GET /waitlist/verify?token=` | confirmation link; always redirects |

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use reformd_core::notifier::Notifier;
use reformd_core::repository::SignupRepository;
use reformd_db::{DbManager, SurrealSignupRepository, run_migrations};
use reformd_mail::ResendNotifier;
use reformd_waitlist::WaitlistService;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub mod config;
pub mod error;
pub mod routes;

use config::Config;
use routes::{health, submit, verify};

/// Build the waitlist router around a shared service.
pub fn router<R, N>(service: Arc<WaitlistService<R, N>>) -> Router
where
    R: SignupRepository + 'static,
    N: Notifier + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/waitlist", get(health).post(submit::<R, N>))
        .route("/waitlist/verify", get(verify::<R, N>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Connect to the store, apply migrations, and serve until a shutdown
/// signal arrives.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let db = DbManager::connect(&config.db).await?;
    run_migrations(db.client()).await?;

    if !config.resend.is_configured() {
        warn!("RESEND_API_KEY or RESEND_FROM missing; verification emails will fail");
    }
    if config.waitlist.site_base().is_none() {
        warn!("SITE_URL not set; links will use the request's host");
    }

    let notifier = ResendNotifier::new(config.resend.clone())?;
    let repo = SurrealSignupRepository::new(db.client().clone());
    let service = Arc::new(WaitlistService::new(repo, notifier, config.waitlist.clone()));

    let app = router(service);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Waitlist server listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Waitlist server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
