use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::{require_admin, require_auth};
use crate::state::AppState;

/// Router の構築
///
/// 公開ルートは認証ゲートを通さない。
/// /auth/profile は要認証、/auth/admin/* と /admin/* は要管理者。
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/reset-password", post(handlers::reset_password))
        .route("/contact", post(handlers::submit_contact))
        .route(
            "/investment-inquiry",
            post(handlers::submit_investment_inquiry),
        );

    let admin = Router::new()
        .route(
            "/auth/admin/users",
            post(handlers::create_user).get(handlers::list_users),
        )
        .route("/auth/admin/users/{id}", delete(handlers::delete_user))
        .route("/admin/contacts", get(handlers::list_contacts))
        .route_layer(from_fn(require_admin));

    let protected = Router::new()
        .route("/auth/profile", post(handlers::update_profile))
        .merge(admin)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
