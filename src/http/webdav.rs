//! WebDAV-style filesystem bridge front end.
//!
//! Supports the subset of WebDAV needed to browse and edit the bridge:
//! `OPTIONS`, `GET`/`HEAD`, `PUT`, `DELETE` and `PROPFIND`. Directories
//! are implicit: a path is a collection when some file lives below it.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use futures_util::future::BoxFuture;
use std::fmt::Write;
use std::sync::Arc;

use crate::filesystem::{normalize, FileEntry, FileSystem, FsError};
use crate::frontend::{FrontEnd, FrontEndContext, FrontEndError};
use crate::http::server::bind_and_serve;
use crate::node::AgentError;

const ALLOW: &str = "OPTIONS, GET, HEAD, PUT, DELETE, PROPFIND";

#[derive(Debug, Clone, Copy, Default)]
pub struct WebDav;

impl FrontEnd for WebDav {
    fn name(&self) -> &'static str {
        "webdav"
    }

    fn start(&self, ctx: FrontEndContext, port: u16) -> BoxFuture<'static, Result<(), FrontEndError>> {
        Box::pin(async move {
            let filesystem = ctx
                .filesystem
                .clone()
                .ok_or(FrontEndError::MissingFilesystem("webdav"))?;
            let host = ctx.node.settings().node.bind_host.clone();

            tracing::info!(root = %filesystem.root(), port, "Mounting filesystem bridge");
            bind_and_serve("webdav", &host, port, router(filesystem), &ctx.shutdown).await?;
            Ok(())
        })
    }
}

pub fn router(filesystem: Arc<FileSystem>) -> Router {
    Router::new().fallback(dispatch).with_state(filesystem)
}

async fn dispatch(State(fs): State<Arc<FileSystem>>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri.path();

    match method.as_str() {
        "OPTIONS" => (StatusCode::OK, [("DAV", "1"), ("Allow", ALLOW)]).into_response(),
        "GET" | "HEAD" => match fs.read(path) {
            Ok(data) => (StatusCode::OK, data).into_response(),
            Err(e) => fs_error(e),
        },
        "PUT" => match fs.write(path, &body) {
            Ok(true) => StatusCode::CREATED.into_response(),
            Ok(false) => StatusCode::NO_CONTENT.into_response(),
            Err(e) => fs_error(e),
        },
        "DELETE" => match fs.remove(path) {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(e) => fs_error(e),
        },
        "PROPFIND" => propfind(&fs, path),
        _ => (StatusCode::METHOD_NOT_ALLOWED, [("Allow", ALLOW)]).into_response(),
    }
}

fn propfind(fs: &FileSystem, path: &str) -> Response {
    let path = normalize(path);
    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<D:multistatus xmlns:D=\"DAV:\">\n",
    );

    if let Some(file) = fs.stat(&path) {
        push_file(&mut body, &file);
    } else if fs.is_directory(&path) {
        push_collection(&mut body, &path);
        for file in fs.list(&path) {
            push_file(&mut body, &file);
        }
    } else {
        return fs_error(FsError::NotFound(path));
    }

    body.push_str("</D:multistatus>\n");
    (
        StatusCode::MULTI_STATUS,
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        body,
    )
        .into_response()
}

fn push_collection(body: &mut String, path: &str) {
    let _ = write!(
        body,
        "<D:response><D:href>{}</D:href><D:propstat><D:prop>\
         <D:resourcetype><D:collection/></D:resourcetype>\
         </D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response>\n",
        xml_escape(path)
    );
}

fn push_file(body: &mut String, file: &FileEntry) {
    let _ = write!(
        body,
        "<D:response><D:href>{}</D:href><D:propstat><D:prop>\
         <D:resourcetype/><D:getcontentlength>{}</D:getcontentlength>\
         <D:getetag>\"{}\"</D:getetag>\
         </D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response>\n",
        xml_escape(&file.path),
        file.size,
        file.guid
    );
}

fn fs_error(e: FsError) -> Response {
    let status = match &e {
        FsError::NotFound(_) => StatusCode::NOT_FOUND,
        FsError::IsRoot => StatusCode::METHOD_NOT_ALLOWED,
        FsError::Agent(AgentError::Released) => StatusCode::SERVICE_UNAVAILABLE,
        FsError::Agent(AgentError::NotFound(_)) => StatusCode::GONE,
        FsError::Agent(AgentError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::warn!(error = %e, "WebDAV request failed");
    }
    (status, e.to_string()).into_response()
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guid::{Guid, HashAlgorithm};
    use crate::node::Agent;
    use crate::storage::MemoryStorage;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn filesystem() -> Arc<FileSystem> {
        let agent = Arc::new(Agent::new(Arc::new(MemoryStorage::new()), HashAlgorithm::Sha256));
        Arc::new(FileSystem::new(Guid::random(HashAlgorithm::Sha256), agent))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: &'static str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let app = router(filesystem());

        assert_eq!(call(&app, "PUT", "/dir/file.txt", "one").await.0, StatusCode::CREATED);
        assert_eq!(call(&app, "PUT", "/dir/file.txt", "two").await.0, StatusCode::NO_CONTENT);
        assert_eq!(
            call(&app, "GET", "/dir/file.txt", "").await,
            (StatusCode::OK, "two".to_string())
        );
        assert_eq!(call(&app, "DELETE", "/dir/file.txt", "").await.0, StatusCode::NO_CONTENT);
        assert_eq!(call(&app, "GET", "/dir/file.txt", "").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_options_advertises_dav() {
        let app = router(filesystem());
        let response = app
            .oneshot(Request::builder().method("OPTIONS").uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["DAV"], "1");
    }

    #[tokio::test]
    async fn test_propfind_lists_collection() {
        let fs = filesystem();
        fs.write("/docs/a.txt", b"aaa").unwrap();
        let app = router(fs);

        let (status, xml) = call(&app, "PROPFIND", "/docs", "").await;
        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert!(xml.contains("<D:href>/docs</D:href>"));
        assert!(xml.contains("<D:collection/>"));
        assert!(xml.contains("<D:href>/docs/a.txt</D:href>"));
        assert!(xml.contains("<D:getcontentlength>3</D:getcontentlength>"));

        assert_eq!(call(&app, "PROPFIND", "/missing", "").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_root_and_unknown_methods() {
        let app = router(filesystem());
        assert_eq!(call(&app, "PUT", "/", "x").await.0, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(call(&app, "MKCOL", "/new", "").await.0, StatusCode::METHOD_NOT_ALLOWED);
    }
}
