//! Web UI front end.
//!
//! Serves a summary page for the node. When started with a filesystem
//! bridge it also shows the bridge root and lists its files under `/fs`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::future::BoxFuture;
use std::fmt::Write;
use std::sync::Arc;

use crate::filesystem::FileSystem;
use crate::frontend::{FrontEnd, FrontEndContext, FrontEndError};
use crate::http::server::bind_and_serve;
use crate::node::Node;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebApp;

#[derive(Clone)]
struct WebState {
    node: Arc<Node>,
    filesystem: Option<Arc<FileSystem>>,
}

impl FrontEnd for WebApp {
    fn name(&self) -> &'static str {
        "webapp"
    }

    fn start(&self, ctx: FrontEndContext, port: u16) -> BoxFuture<'static, Result<(), FrontEndError>> {
        Box::pin(async move {
            let host = ctx.node.settings().node.bind_host.clone();
            let router = router(ctx.node.clone(), ctx.filesystem.clone());
            bind_and_serve("webapp", &host, port, router, &ctx.shutdown).await?;
            Ok(())
        })
    }
}

pub fn router(node: Arc<Node>, filesystem: Option<Arc<FileSystem>>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/fs", get(list_files))
        .with_state(WebState { node, filesystem })
}

async fn index(State(state): State<WebState>) -> Html<String> {
    let info = state.node.info();
    let mut page = String::new();

    let _ = write!(
        page,
        "<!doctype html><html><head><title>{name}</title></head><body>\
         <h1>{name}</h1><ul>\
         <li>Store: {store}</li><li>Agent: {agent}</li><li>Algorithm: {algorithm}</li>",
        name = escape(&info.name),
        store = info.store,
        agent = if info.agent { "available" } else { "none" },
        algorithm = info.algorithm,
    );

    match &state.filesystem {
        Some(fs) => {
            let _ = write!(page, "<li>Root: <code>{}</code></li></ul><h2>Files</h2><ul>", fs.root());
            for entry in fs.list("/") {
                let _ = write!(
                    page,
                    "<li>{} ({} bytes) <code>{}</code></li>",
                    escape(&entry.path),
                    entry.size,
                    entry.guid
                );
            }
            page.push_str("</ul>");
        }
        None => page.push_str("</ul><p>No filesystem bridge mounted.</p>"),
    }

    page.push_str("</body></html>");
    Html(page)
}

async fn list_files(State(state): State<WebState>) -> Response {
    match &state.filesystem {
        Some(fs) => Json(fs.list("/")).into_response(),
        None => (StatusCode::NOT_FOUND, "no filesystem bridge mounted").into_response(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
