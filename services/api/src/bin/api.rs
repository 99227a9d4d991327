//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, OpenAiModerationAdapter, OpenAiTutorAdapter},
    config::Config,
    error::ApiError,
    web::{create_router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_core::{TutorPipeline, TutorPorts};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key.clone())
        .with_api_base(config.openai_base_url.clone());
    let openai_client = Client::with_config(openai_config);

    let tutor_adapter = Arc::new(OpenAiTutorAdapter::new(
        openai_client,
        config.tutor_model.clone(),
    ));
    let moderation_adapter = Arc::new(
        OpenAiModerationAdapter::new(
            config.openai_base_url.clone(),
            api_key,
            config.moderation_model.clone(),
            config.moderation_timeout,
        )
        .map_err(|e| ApiError::Internal(format!("Failed to build moderation client: {}", e)))?,
    );

    // --- 4. Build the Tutor Pipeline & Shared AppState ---
    let ports = TutorPorts {
        lock_store: db_adapter.clone(),
        abuse_log: db_adapter.clone(),
        lessons: db_adapter.clone(),
        moderation: moderation_adapter,
        generator: tutor_adapter,
        session_log: db_adapter.clone(),
    };
    let pipeline = TutorPipeline::standard(ports, config.tutor_settings())?;
    info!(
        rules = pipeline.classifier().rules().len(),
        "Intent classifier ready"
    );

    let app_state = Arc::new(AppState {
        auth: db_adapter,
        pipeline: Arc::new(pipeline),
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = create_router(app_state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
