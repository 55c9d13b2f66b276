//! HTTP surface: the signed-in note API behind the auth gate.

mod error;
mod gate;
mod routes;

pub use error::{ApiError, FETCH_FAILED, SAVE_FAILED};
pub use gate::{auth_gate, AuthGate, RouteAccess, SIGN_IN_PATH, SIGN_UP_PATH};

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::repository::NoteRepository;
use routes::{
    add_note_handler, delete_note_handler, grouped_notes_handler, home_handler,
    list_notes_handler, not_found_handler, shots_handler, sign_in_handler, sign_up_handler,
    update_note_handler, upsert_notes_handler,
};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<NoteRepository>,
    pub gate: Arc<AuthGate>,
}

impl AppState {
    pub fn new(repository: Arc<NoteRepository>, gate: AuthGate) -> Self {
        Self {
            repository,
            gate: Arc::new(gate),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route(SIGN_IN_PATH, get(sign_in_handler))
        .route(SIGN_UP_PATH, get(sign_up_handler))
        .route("/api/public/shots", get(shots_handler))
        .route("/api/notes", get(list_notes_handler).post(upsert_notes_handler))
        .route("/api/notes/groups", get(grouped_notes_handler))
        .route("/api/notes/items", post(add_note_handler))
        .route(
            "/api/notes/items/{id}",
            patch(update_note_handler).delete(delete_note_handler),
        )
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    info!("Opening note stores...");
    let repository = Arc::new(NoteRepository::open(&config)?);
    let state = AppState::new(repository, AuthGate::new(config.auth_header.clone()));

    let app = router(state);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
