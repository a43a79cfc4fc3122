use axum::{
    routing::{get, post},
    Router,
};
use examprep_backend::{
    config::{get_config, init_config},
    models::bank,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    // Parse the embedded content tables up front so a bad data file fails
    // the boot instead of the first request.
    bank::init_banks()?;
    info!(
        bank_size = bank::question_bank().len(),
        fallback_subjects = bank::fallback_templates().len(),
        "question banks loaded"
    );

    let app_state = AppState::new();
    let providers = app_state.generation_service.provider_count();
    if providers == 0 || config.force_offline {
        info!("no generation providers active; serving from the local bank only");
    } else {
        info!(providers, "generation providers configured");
    }

    let quiz_api = Router::new()
        .route("/api/quiz/generate", post(routes::quiz::generate_quiz))
        .route("/api/quiz/offline", post(routes::quiz::offline_selection))
        .layer(axum::middleware::from_fn_with_state(
            examprep_backend::middleware::rate_limit::new_rps_state(config.quiz_rps),
            examprep_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .merge(quiz_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
