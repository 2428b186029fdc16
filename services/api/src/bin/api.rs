//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        db::DbAdapter,
        insights_llm::OpenAiInsightsAdapter,
        mentor::{DesignatedMentorAdapter, RoundRobinMentorAdapter},
    },
    config::{Config, MentorPolicy},
    error::ApiError,
    web::{build_router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use dropout_tracker_core::ports::{
    DatabaseService, MentorAssignmentService, PortError, RiskInsightService,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = DbAdapter::new(db_pool);
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");
    let db: Arc<dyn DatabaseService> = Arc::new(db_adapter);

    // --- 3. Initialize Service Adapters ---
    let mentors: Arc<dyn MentorAssignmentService> = match config.mentor_policy {
        MentorPolicy::Designated => {
            match db.get_mentor_by_name(&config.default_mentor_name).await {
                Ok(mentor) => info!("Assigning every request to {} <{}>", mentor.name, mentor.email),
                Err(PortError::NotFound(_)) => warn!(
                    "Mentor {} does not exist yet; counselling requests will fail until it is added",
                    config.default_mentor_name
                ),
                Err(e) => return Err(e.into()),
            }
            Arc::new(DesignatedMentorAdapter::new(
                db.clone(),
                config.default_mentor_name.clone(),
            ))
        }
        MentorPolicy::RoundRobin => {
            info!("Assigning mentors round-robin");
            Arc::new(RoundRobinMentorAdapter::new(db.clone()))
        }
    };

    let insights: Option<Arc<dyn RiskInsightService>> = match &config.openai_api_key {
        Some(key) => {
            let client = Client::with_config(OpenAIConfig::new().with_api_key(key));
            let adapter: Arc<dyn RiskInsightService> = Arc::new(OpenAiInsightsAdapter::new(
                client,
                config.insights_model.clone(),
            ));
            info!("Risk insights enabled with model {}", config.insights_model);
            Some(adapter)
        }
        None => {
            warn!("OPENAI_API_KEY not set; risk insights are disabled");
            None
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db,
        mentors,
        insights,
    });

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid CORS_ORIGIN '{}': {}",
            config.cors_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(build_router(app_state, config.upload_limit_bytes).layer(cors))
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
