//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, price::HttpPriceAdapter},
    config::Config,
    error::ApiError,
    web::{
        approve_work_log_handler,
        auth::{login_handler, logout_handler, signup_handler},
        create_child_handler, create_project_handler, create_template_handler,
        create_work_log_handler, list_member_work_logs_handler, list_members_handler,
        list_projects_handler, list_templates_handler, log_extra_handler, materialize_handler,
        middleware::require_auth,
        rest::ApiDoc,
        savings_handler, set_status_handler, state::AppState, update_template_handler,
        weekly_summary_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
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
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Price Adapter ---
    let price_adapter = Arc::new(HttpPriceAdapter::new(
        reqwest::Client::new(),
        config.price_api_url.clone(),
        config.price_currency.clone(),
        config.price_cache_ttl,
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter.clone(),
        templates: db_adapter.clone(),
        instances: db_adapter,
        price: price_adapter,
        config: config.clone(),
    });

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|_| ApiError::Internal(format!("Invalid CORS_ORIGIN: '{}'", config.cors_origin)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/members", get(list_members_handler).post(create_child_handler))
        .route("/members/{id}/worklog", get(list_member_work_logs_handler))
        .route("/members/{id}/savings", get(savings_handler))
        .route(
            "/chores/templates",
            get(list_templates_handler).post(create_template_handler),
        )
        .route("/chores/templates/{id}", patch(update_template_handler))
        .route("/chores/materialize", post(materialize_handler))
        .route("/chores/instances/{id}/status", post(set_status_handler))
        .route("/chores/instances/extra", post(log_extra_handler))
        .route("/chores/summary", get(weekly_summary_handler))
        .route(
            "/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route("/projects/{id}/worklog", post(create_work_log_handler))
        .route("/worklog/{id}/approve", post(approve_work_log_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

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
