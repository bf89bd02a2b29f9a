pub mod admin_vdcs;
pub mod auth;
pub mod catalogs;
pub mod error;
pub mod health;
pub mod orgs;
pub mod pagination;
pub mod roles;
pub mod sessions;
pub mod users;
pub mod vapps;
pub mod vdcs;
pub mod vms;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (health probes, login) and **protected**
/// (everything else, gated behind the bearer-session middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        // Login (Basic auth)
        .route("/cloudapi/1.0.0/sessions", post(sessions::login));

    let protected = Router::new()
        // Sessions
        .route(
            "/cloudapi/1.0.0/sessions/:session_id",
            get(sessions::get_session).delete(sessions::logout),
        )
        // Users
        .route(
            "/cloudapi/1.0.0/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/cloudapi/1.0.0/users/:user_id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Roles (read-only)
        .route("/cloudapi/1.0.0/roles", get(roles::list_roles))
        .route("/cloudapi/1.0.0/roles/:role_id", get(roles::get_role))
        // Orgs
        .route(
            "/cloudapi/1.0.0/orgs",
            get(orgs::list_orgs).post(orgs::create_org),
        )
        .route(
            "/cloudapi/1.0.0/orgs/:org_id",
            get(orgs::get_org)
                .put(orgs::update_org)
                .delete(orgs::delete_org),
        )
        // VDCs (authenticated read-only view)
        .route("/cloudapi/1.0.0/vdcs", get(vdcs::list_vdcs))
        .route("/cloudapi/1.0.0/vdcs/:vdc_id", get(vdcs::get_vdc))
        // vApps
        .route(
            "/cloudapi/1.0.0/vdcs/:vdc_id/actions/instantiateTemplate",
            post(vapps::instantiate_template),
        )
        .route("/cloudapi/1.0.0/vdcs/:vdc_id/vapps", get(vapps::list_vapps))
        .route(
            "/cloudapi/1.0.0/vapps/:vapp_id",
            get(vapps::get_vapp).delete(vapps::delete_vapp),
        )
        // VMs
        .route("/cloudapi/1.0.0/vms/:vm_id", get(vms::get_vm))
        .route(
            "/cloudapi/1.0.0/vms/:vm_id/actions/:action",
            post(vms::power_action),
        )
        // Catalogs + read-through catalog items
        .route(
            "/cloudapi/1.0.0/catalogs",
            get(catalogs::list_catalogs).post(catalogs::create_catalog),
        )
        .route(
            "/cloudapi/1.0.0/catalogs/:catalog_id",
            get(catalogs::get_catalog).delete(catalogs::delete_catalog),
        )
        .route(
            "/cloudapi/1.0.0/catalogs/:catalog_id/catalogItems",
            get(catalogs::list_catalog_items),
        )
        .route(
            "/cloudapi/1.0.0/catalogs/:catalog_id/catalogItems/:item_id",
            get(catalogs::get_catalog_item),
        )
        // Admin VDC management (legacy /api tree, kept by design)
        .route(
            "/api/admin/org/:org_id/vdcs",
            get(admin_vdcs::list_vdcs).post(admin_vdcs::create_vdc),
        )
        .route(
            "/api/admin/org/:org_id/vdcs/:vdc_id",
            get(admin_vdcs::get_vdc)
                .put(admin_vdcs::update_vdc)
                .delete(admin_vdcs::delete_vdc),
        )
        // Apply session auth middleware to all protected routes.
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_session,
        ));

    public
        .merge(protected)
        .fallback(error::not_found_handler)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Recover handler panics into the standard envelope with no internals.
fn handle_panic(_: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    tracing::error!("handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "code": 500,
            "error": "INTERNAL_SERVER_ERROR",
            "message": "internal error",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tower::ServiceExt;

    async fn status_and_json(
        app: Router,
        uri: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unknown_routes_return_the_envelope() {
        let app = Router::new().fallback(error::not_found_handler);
        let (status, body) = status_and_json(app, "/no/such/route").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn panics_become_opaque_500s() {
        async fn boom() -> &'static str {
            panic!("secret internal detail");
        }
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));
        let (status, body) = status_and_json(app, "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 500);
        assert!(!body.to_string().contains("secret"));
    }
}
