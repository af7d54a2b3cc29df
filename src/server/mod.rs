mod form;
pub mod handlers;
pub mod types;

pub use form::{ALLOWED_IMAGE_TYPES, AskForm, UploadedImage};

use crate::{Result, config::Config, tutor::Tutor};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

/// Builds the HTTP routes around an existing tutor.
pub fn router(
    tutor: Arc<Tutor>,
    static_dir: impl Into<PathBuf>,
    max_upload_bytes: usize,
) -> Router {
    let static_dir = static_dir.into();
    let app_state = handlers::AppState {
        tutor,
        static_dir: static_dir.clone(),
    };

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/ask", post(handlers::ask))
        .route("/ask-science", post(handlers::ask))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run(config: Config) -> Result<()> {
    let tutor = Tutor::new(&config.llm)?;

    let app = router(
        Arc::new(tutor),
        &config.server.static_dir,
        config.server.max_upload_bytes,
    );

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
