use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use datasource_mongodb::MongoAccessor;
use pipeline::{PipelineValidator, Translator};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::errors::ConfigError;
use crate::handlers::{ServerState, health, trade_query};

/// Build the http routes around an already assembled state.
pub fn build_router(state: Arc<ServerState>, cors_origin: &str) -> Result<Router, ConfigError> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .map_err(|_| ConfigError::InvalidCorsOrigin(cors_origin.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET]);

    Ok(Router::new()
        .route("/api/trade/query", get(trade_query))
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub struct TradeServer {
    listener: TcpListener,
    router: Router,
}

impl TradeServer {
    /// Connect every dependency and bind the listener.
    ///
    /// The store is pinged once here, the server doesn't start without it.
    pub async fn connect(config: ServerConfig) -> Result<Self, ConfigError> {
        let uri = config.mongo_uri()?;
        let backend = config.llm.build_backend()?;
        debug!(backend = backend.name(), "configured completion backend");

        let accessor = MongoAccessor::connect(uri).await?;
        accessor.ping().await?;
        let executor = accessor
            .into_executor(config.collection.clone())
            .with_timeout(config.store_timeout);

        let validator = PipelineValidator::new(config.validator.clone());
        info!(
            denied_operators = ?validator.denied_operators(),
            denied_stages = ?validator.denied_stages(),
            "pipeline validator configured"
        );

        let state = Arc::new(ServerState {
            translator: Translator::new(backend),
            validator,
            executor: Arc::new(executor),
        });
        let router = build_router(state, &config.cors_origin)?;
        let listener = TcpListener::bind(config.bind).await?;

        Ok(TradeServer { listener, router })
    }

    /// Serve with an already bound listener.
    pub fn with_listener(listener: TcpListener, router: Router) -> Self {
        TradeServer { listener, router }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until ctrl-c.
    pub async fn serve(self) -> Result<(), ConfigError> {
        info!(addr = %self.local_addr()?, "listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async {
                if signal::ctrl_c().await.is_ok() {
                    info!("shutdown triggered");
                }
            })
            .await?;
        Ok(())
    }
}
