//! HTTP surface

use std::net::SocketAddr;
use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::providers::copy::CopyGenerator;
use crate::providers::image::ImageGenerator;
use crate::providers::{Provider, http_client};
use crate::quota::QuotaGate;
use crate::rate_limit::RateLimiter;

mod campaigns;
mod images;
mod middleware;
mod prelude;
mod schemas;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    config: Arc<AppConfig>,
    db: DatabaseConnection,
    quota: Arc<QuotaGate>,
    limiter: Arc<RateLimiter>,
    copy: CopyGenerator,
    images: ImageGenerator,
}

impl AppState {
    pub(crate) fn new(config: AppConfig, db: DatabaseConnection) -> Result<Self, anyhow::Error> {
        let providers = &config.providers;
        let client = http_client(providers.timeout)?;
        let copy = CopyGenerator::new(
            client.clone(),
            &providers.anthropic_base_url,
            &providers.text_model,
        )?;
        let images = ImageGenerator::new(client, &providers.openai_base_url, &providers.image_model)?;
        let quota = QuotaGate::new(
            db.clone(),
            &config.free_tier,
            providers.anthropic_api_key.is_some(),
        );
        let limiter = RateLimiter::new(&config.rate_limit);

        Ok(Self {
            config: Arc::new(config),
            db,
            quota: Arc::new(quota),
            limiter: Arc::new(limiter),
            copy,
            images,
        })
    }

    /// The process-level key for `provider`, if one is configured.
    fn shared_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Anthropic => self.config.providers.anthropic_api_key.as_deref(),
            Provider::OpenAi => self.config.providers.openai_api_key.as_deref(),
        }
    }

    /// The key a paid route should use: the caller's header, or the shared key
    /// when the deployment allows falling back to it.
    fn api_key(&self, headers: &HeaderMap, provider: Provider) -> Result<String, ApiError> {
        let supplied = headers
            .get(provider.key_header())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(key) = supplied {
            return Ok(key.to_string());
        }
        self.shared_key(provider)
            .filter(|_| self.config.use_server_keys)
            .map(str::to_owned)
            .ok_or(ApiError::MissingCredential(provider))
    }
}

fn create_router(state: AppState) -> Router {
    let generation = Router::new()
        .route(
            "/campaigns/generate-copy",
            post(campaigns::generate_copy_handler),
        )
        .route(
            "/campaigns/generate-full",
            post(campaigns::generate_full_handler),
        )
        .route(
            "/campaigns/generate-free",
            post(campaigns::generate_free_handler),
        )
        .route("/images/generate", post(images::generate_image_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ));

    let api = Router::new()
        .route("/campaigns", get(campaigns::list_handler))
        .route(
            "/campaigns/free-tier-status",
            get(campaigns::free_tier_status_handler),
        )
        .route("/campaigns/{id}", get(campaigns::get_handler))
        .merge(generation);

    Router::new()
        .route("/", get(campaigns::root_handler))
        .route("/health", get(campaigns::health_handler))
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::expose_internal_detail,
        ))
        .layer(middleware::cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Builds the application state and serves it until interrupted.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), anyhow::Error> {
    let app = create_router(AppState::new(config, db)?);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
