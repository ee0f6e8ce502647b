//! Static preview of the generated data tree, for working on the site without
//! a full frontend build.

use axum::{routing::get, Router};
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn router(data_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route(
            "/",
            get(|| async { "HyperBEAM documentation data - browse /data/index.json" }),
        )
        .nest_service("/data", ServeDir::new(data_dir.as_ref()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[tokio::test]
    async fn serves_generated_json() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("index.json"), r#"{"subsystems":[]}"#).unwrap();

        let response = router(tmp.path())
            .oneshot(Request::builder().uri("/data/index.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let response = router(tmp.path())
            .oneshot(Request::builder().uri("/data/core/index.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
