//! Online voting platform backend.
//!
//! Voters register with a face image and confirm their email with a
//! one-time code; admins define parties and elections; verified voters
//! cast exactly one vote per election after an identity check.
//!
//! # Integrity
//!
//! The one correctness-critical path is vote casting. The store keeps a
//! per-voter set of elections already cast in, and the cast operation runs
//! as a single Redis script: claim the election in that set, bump the
//! party tally, write the ballot record. The script either applies fully
//! or not at all, so no interleaving of concurrent requests can count a
//! voter twice or leave a tally without its ballot.
//!
//! # Externals
//!
//! - Redis as the document store (hashes + sets, see `database`)
//! - a face-matching HTTP service for registration encodings and cast-time
//!   verification (see `face`), fail-closed
//! - SMTP for OTP delivery (see `mailer`)

use std::time::Duration;

use axum::http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod elections;
pub mod error;
pub mod face;
pub mod mailer;
pub mod models;
pub mod routes;
pub mod state;
pub mod token;
pub mod utils;
pub mod votes;

use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let app = routes::router(state.clone()).layer(cors);

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
