//! REST API front end.
//!
//! - `GET  /sos/info`         node summary
//! - `POST /sos/data`         store the request body, returns its GUID
//! - `GET  /sos/data/{guid}`  fetch stored content

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;

use crate::frontend::{FrontEnd, FrontEndContext, FrontEndError};
use crate::guid::Guid;
use crate::http::server::bind_and_serve;
use crate::node::{AgentError, Node, NodeInfo};

#[derive(Debug, Clone, Copy, Default)]
pub struct RestApi;

#[derive(Clone)]
struct RestState {
    node: Arc<Node>,
}

#[derive(Debug, Serialize)]
struct Stored {
    guid: Guid,
    size: usize,
}

impl FrontEnd for RestApi {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn start(&self, ctx: FrontEndContext, port: u16) -> BoxFuture<'static, Result<(), FrontEndError>> {
        Box::pin(async move {
            let host = ctx.node.settings().node.bind_host.clone();
            let router = router(ctx.node.clone());
            bind_and_serve("rest", &host, port, router, &ctx.shutdown).await?;
            Ok(())
        })
    }
}

pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/sos/info", get(info))
        .route("/sos/data", post(add_data))
        .route("/sos/data/{guid}", get(get_data))
        .with_state(RestState { node })
}

async fn info(State(state): State<RestState>) -> Json<NodeInfo> {
    Json(state.node.info())
}

async fn add_data(State(state): State<RestState>, body: Bytes) -> Response {
    let Some(agent) = state.node.agent() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "node has no agent").into_response();
    };

    match agent.add_data(&body) {
        Ok(guid) => (
            StatusCode::CREATED,
            Json(Stored {
                guid,
                size: body.len(),
            }),
        )
            .into_response(),
        Err(e) => agent_error(e),
    }
}

async fn get_data(State(state): State<RestState>, Path(guid): Path<String>) -> Response {
    let guid = match Guid::parse(&guid) {
        Ok(guid) => guid,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let Some(agent) = state.node.agent() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "node has no agent").into_response();
    };

    match agent.get_data(&guid) {
        Ok(data) => (StatusCode::OK, data).into_response(),
        Err(e) => agent_error(e),
    }
}

fn agent_error(e: AgentError) -> Response {
    let status = match &e {
        AgentError::NotFound(_) => StatusCode::NOT_FOUND,
        AgentError::Released => StatusCode::SERVICE_UNAVAILABLE,
        AgentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::warn!(error = %e, "REST request failed");
    }
    (status, e.to_string()).into_response()
}
