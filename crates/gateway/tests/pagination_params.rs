//! Wire-level tests for the pagination extractors: parameter spellings,
//! clamping, and the envelope math they feed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use ssv_domain::{Page, PageParams};
use ssv_gateway::api::pagination::{AdminPageQuery, CloudPageQuery};

fn cloud_app() -> Router {
    async fn echo(CloudPageQuery(params): CloudPageQuery) -> axum::Json<Page<i64>> {
        axum::Json(Page::new(vec![], 5, params))
    }
    Router::new().route("/things", get(echo))
}

fn admin_app() -> Router {
    async fn echo(AdminPageQuery(params): AdminPageQuery) -> axum::Json<Page<i64>> {
        axum::Json(Page::new(vec![], 5, params))
    }
    Router::new().route("/things", get(echo))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn cloudapi_accepts_camel_case_only() {
    let (status, body) = get_json(cloud_app(), "/things?page=2&pageSize=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 2);
    assert_eq!(body["pageCount"], 3);

    let (status, body) = get_json(cloud_app(), "/things?page_size=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn admin_tree_accepts_legacy_spelling() {
    let (status, body) = get_json(admin_app(), "/things?page_size=2&page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resultTotal"], 5);
    assert_eq!(body["pageCount"], 3);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 2);
}

#[tokio::test]
async fn bad_values_fall_back_to_defaults() {
    for uri in [
        "/things?page=abc&pageSize=xyz",
        "/things?page=-1&pageSize=-5",
        "/things",
    ] {
        let (status, body) = get_json(cloud_app(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["page"], 1, "{uri}");
        assert_eq!(body["pageSize"], PageParams::default().page_size, "{uri}");
    }
}

#[tokio::test]
async fn page_size_is_clamped_to_100() {
    let (_, body) = get_json(cloud_app(), "/things?pageSize=5000").await;
    assert_eq!(body["pageSize"], 100);
}
