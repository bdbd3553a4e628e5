//! # Feedback server
//!
//! Small HTTP service that collects user feedback, stores it in a flat
//! JSON file, and emails an alert for each submission when SMTP is
//! configured. A single admin account can log in for a bearer token and
//! list everything submitted so far.
//!
//! ## Known limitations (deliberate, at this scale)
//!
//! - The store rewrites the whole file on every append with no locking,
//!   so two simultaneous submissions can race and one entry may be lost.
//! - Admin sessions live in memory only and reset on restart. There is
//!   no expiry, so long-running processes with many logins and no
//!   logouts grow the session map without bound.
//! - One shared admin credential pair, no user table, no hashing.
use std::time::Duration;

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod notify;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

use routes::{
    admin_feedbacks_handler, admin_login_handler, admin_logout_handler, root_handler,
    submit_feedback_handler,
};
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/submit-feedback", post(submit_feedback_handler))
        .route("/admin/login", post(admin_login_handler))
        .route("/admin/logout", post(admin_logout_handler))
        .route("/admin/feedbacks", get(admin_feedbacks_handler))
        .layer(cors)
        .with_state(state.clone());

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
