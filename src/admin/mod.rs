//! Read-only admin API.
//!
//! `GET /admin/status` and `GET /admin/backends`, behind a bearer token.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use crate::load_balancer::BackendPool;
use self::auth::admin_auth_middleware;
use self::handlers::{get_backends, get_status};

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub pool: Arc<BackendPool>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(pool: Arc<BackendPool>, api_key: &str) -> Router {
    let state = AdminState {
        pool,
        api_key: Arc::from(api_key),
    };

    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::backend::tests::OkForwarder;
    use crate::load_balancer::Backend;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use url::Url;

    fn router() -> (Router, Arc<BackendPool>) {
        let pool = Arc::new(
            BackendPool::builder()
                .add(Backend::new(Url::parse("http://a:1").unwrap(), Arc::new(OkForwarder)))
                .add(Backend::new(Url::parse("http://b:2").unwrap(), Arc::new(OkForwarder)))
                .build()
                .unwrap(),
        );
        (setup_admin_router(pool.clone(), "secret"), pool)
    }

    fn get(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_missing_or_wrong_token() {
        let (app, _) = router();
        let res = app.clone().oneshot(get("/admin/status", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app.oneshot(get("/admin/status", Some("wrong"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status_reports_live_counts() {
        let (app, pool) = router();
        pool.set_status(&Url::parse("http://b:2").unwrap(), false);

        let res = app.oneshot(get("/admin/status", Some("secret"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json(res).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["live_backends"], 1);
        assert_eq!(body["total_backends"], 2);
    }

    #[tokio::test]
    async fn test_backends_lists_liveness_in_order() {
        let (app, pool) = router();
        pool.set_status(&Url::parse("http://a:1").unwrap(), false);

        let res = app.oneshot(get("/admin/backends", Some("secret"))).await.unwrap();
        let body = json(res).await;
        assert_eq!(
            body,
            serde_json::json!([
                { "url": "http://a:1/", "alive": false },
                { "url": "http://b:2/", "alive": true },
            ])
        );
    }
}
