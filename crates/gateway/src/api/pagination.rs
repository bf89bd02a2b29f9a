//! Pagination query extractors.
//!
//! Cloud Director spells the parameter `pageSize`; the legacy admin VDC tree
//! still receives `page_size` from older tooling. The cloudapi extractor
//! rejects the legacy spelling outright so clients migrate.

use std::collections::HashMap;

use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;

use ssv_domain::PageParams;

use crate::api::error::ApiError;

fn parse_param(raw: Option<&String>) -> Option<i64> {
    // Non-numeric values fall back to the defaults rather than erroring.
    raw.and_then(|v| v.parse::<i64>().ok())
}

/// Strict extractor for `/cloudapi` endpoints: `page` + `pageSize` only.
#[derive(Debug, Clone, Copy)]
pub struct CloudPageQuery(pub PageParams);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CloudPageQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params): Query<HashMap<String, String>> =
            Query::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::bad_request("malformed query string"))?;
        if params.contains_key("page_size") {
            return Err(ApiError::bad_request(
                "unknown parameter page_size; use pageSize",
            ));
        }
        let page = parse_param(params.get("page"));
        let page_size = parse_param(params.get("pageSize"));
        Ok(CloudPageQuery(PageParams::normalize(page, page_size)))
    }
}

/// Lenient extractor for the legacy admin VDC tree: accepts both spellings,
/// `pageSize` winning when both are present.
#[derive(Debug, Clone, Copy)]
pub struct AdminPageQuery(pub PageParams);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminPageQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params): Query<HashMap<String, String>> =
            Query::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::bad_request("malformed query string"))?;
        let page = parse_param(params.get("page"));
        let page_size =
            parse_param(params.get("pageSize")).or_else(|| parse_param(params.get("page_size")));
        Ok(AdminPageQuery(PageParams::normalize(page, page_size)))
    }
}
