//! JSON API.
//!
//! Endpoints:
//!
//! - `GET  /api/status`: Which provider keys are configured
//! - `POST /api/ask`: Run the full pipeline, get the result
//! - `POST /api/ask/stream`: Run the full pipeline, get SSE stage events
//! - `POST /api/direct`: Ask one provider directly

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, Sse},
};
use multiflow_config::KeyStatus;
use multiflow_core::{Error, PipelineResult, ProviderError, StageEvent, StageId};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn};

use crate::SharedState;

// ── Request / response types ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Deserialize)]
pub struct DirectRequest {
    #[serde(alias = "model")]
    pub provider: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct DirectResponse {
    pub provider: String,
    pub response: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub has: KeyStatus,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn require_question(question: &str) -> Result<(), ApiError> {
    if question.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "question must not be empty"));
    }
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `GET /api/status`
pub async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ok: true,
        has: state.config.key_status(),
    })
}

/// `POST /api/ask`: runs every stage before answering.
pub async fn ask_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<PipelineResult>, ApiError> {
    require_question(&payload.question)?;
    info!(question_len = payload.question.len(), "api/ask request");

    let availability = state.config.availability();
    state
        .orchestrator
        .run(&payload.question, availability, &multiflow_core::NoopSink)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Pipeline run failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

/// Sent once, before any stage reports.
#[derive(Serialize)]
struct WaitingEvent {
    stages: [StageId; 6],
    text: String,
}

/// One item of the ask stream.
enum StreamItem {
    Waiting(WaitingEvent),
    Stage(StageEvent),
    Done(Box<PipelineResult>),
    Failed(String),
}

/// `POST /api/ask/stream`: a `waiting` event covering every slot, one
/// `stage` event per update, then `done` with the full result.
pub async fn ask_stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AskRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    require_question(&payload.question)?;
    info!(question_len = payload.question.len(), "api/ask/stream SSE request");

    let (tx, rx) = mpsc::unbounded_channel();
    let availability = state.config.availability();
    let _ = tx.send(StreamItem::Waiting(WaitingEvent {
        stages: StageId::ORDER,
        text: state.config.messages.waiting.clone(),
    }));

    tokio::spawn(async move {
        let stage_tx = tx.clone();
        let sink = move |event: &StageEvent| {
            let _ = stage_tx.send(StreamItem::Stage(event.clone()));
        };
        let item = match state
            .orchestrator
            .run(&payload.question, availability, &sink)
            .await
        {
            Ok(result) => StreamItem::Done(Box::new(result)),
            Err(e) => {
                error!(error = %e, "Streaming pipeline run failed");
                StreamItem::Failed(e.to_string())
            }
        };
        let _ = tx.send(item);
    });

    let stream = UnboundedReceiverStream::new(rx).map(|item| {
        let (event_type, data) = match item {
            StreamItem::Waiting(waiting) => (
                "waiting",
                serde_json::to_string(&waiting).unwrap_or_default(),
            ),
            StreamItem::Stage(event) => (
                event.event_type(),
                serde_json::to_string(&event).unwrap_or_default(),
            ),
            StreamItem::Done(result) => ("done", serde_json::to_string(&result).unwrap_or_default()),
            StreamItem::Failed(message) => (
                "error",
                serde_json::to_string(&ErrorResponse { error: message }).unwrap_or_default(),
            ),
        };
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Ok(Sse::new(stream))
}

/// `POST /api/direct`
pub async fn direct_handler(
    State(state): State<SharedState>,
    Json(payload): Json<DirectRequest>,
) -> Result<Json<DirectResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }
    info!(provider = %payload.provider, "api/direct request");

    match state.direct.route(&payload.provider, &payload.message).await {
        Ok(response) => Ok(Json(DirectResponse {
            provider: payload.provider,
            response,
        })),
        Err(e) => {
            let status = match &e {
                Error::UnsupportedProvider(_)
                | Error::Provider(ProviderError::NotConfigured { .. }) => StatusCode::BAD_REQUEST,
                Error::Provider(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            warn!(provider = %payload.provider, error = %e, "Direct query failed");
            Err(api_error(status, state.config.messages.format_error(&e)))
        }
    }
}
