use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use chrono::Utc;
use pipeline::{PipelineExecutor, PipelineValidator, Translator};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::envelope::Envelope;
use crate::errors::{ServerError, ServerResult};

pub const SERVICE_NAME: &str = "Trade Data Query API";

/// State that's passed to all handlers.
#[derive(Debug)]
pub struct ServerState {
    /// Turns questions into pipelines.
    pub translator: Translator,
    /// Gate between the model and the store.
    pub validator: PipelineValidator,
    /// Runs validated pipelines.
    pub executor: Arc<dyn PipelineExecutor>,
}

#[derive(Debug, Deserialize)]
pub struct TradeQueryParams {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        service: SERVICE_NAME,
    })
}

/// Answer a natural language question about the trade collection.
pub async fn trade_query(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<TradeQueryParams>, QueryRejection>,
) -> ServerResult<Json<Envelope>> {
    let query = match params {
        Ok(Query(TradeQueryParams { query: Some(q) })) if !q.trim().is_empty() => q,
        Ok(_) => return Err(ServerError::MissingQuery),
        Err(rejection) => {
            debug!(%rejection, "unable to read query string");
            return Err(ServerError::MissingQuery);
        }
    };

    if !state.executor.is_connected() {
        error!("store is not connected");
        return Err(ServerError::StoreUnavailable);
    }

    info!(%query, backend = state.translator.backend_name(), "translating query");
    let pipeline = state.translator.translate(&query).await?;
    let pipeline = state.validator.validate(pipeline)?;

    info!(%query, %pipeline, "executing pipeline");
    let results = state
        .executor
        .execute(&pipeline)
        .await
        .inspect_err(|e| error!(%query, %pipeline, error = %e, "pipeline execution failed"))?;
    info!(%query, results = results.len(), "query complete");

    Ok(Json(Envelope::new(query, pipeline, results)))
}
