use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::rest;
use super::routes;
use super::state::DashboardState;
use super::websocket;

/// JSON API, nested under `/api`.
fn api_router() -> Router<Arc<DashboardState>> {
    Router::new()
        .route("/auth/login", post(rest::login))
        .route("/auth/logout", post(rest::logout))
        .route("/auth/me", get(rest::me))
        .route("/dashboard/stats", get(rest::dashboard_stats))
        .route("/bots", get(rest::list_bots).post(rest::create_bot))
        .route(
            "/bots/:id",
            get(rest::get_bot).put(rest::update_bot).delete(rest::delete_bot),
        )
        .route("/bots/:id/status", patch(rest::set_bot_status))
        .route(
            "/bots/:id/documents",
            get(rest::list_documents).post(rest::upload_documents),
        )
        .route(
            "/bots/:id/documents/:doc_id",
            delete(rest::delete_document),
        )
        .route("/bots/:id/urls", get(rest::list_urls).post(rest::add_url))
        .route("/bots/:id/urls/:url_id", delete(rest::delete_url))
        .route(
            "/bots/:id/knowledge-base/settings",
            get(rest::knowledge_settings).put(rest::update_knowledge_settings),
        )
        .route("/bots/:id/knowledge-base/reindex", post(rest::reindex))
        .route(
            "/bot-users",
            get(rest::list_bot_users).post(rest::create_bot_user),
        )
        .route(
            "/bot-users/:id",
            get(rest::get_bot_user)
                .put(rest::update_bot_user)
                .delete(rest::delete_bot_user),
        )
        .route("/bot-users/:id/assign-bot", post(rest::assign_bot))
        .route("/bot-users/:id/unassign-bot", post(rest::unassign_bot))
        .route("/admin/users", get(rest::list_admins).post(rest::create_admin))
        .route(
            "/admin/users/:id",
            put(rest::update_admin).delete(rest::delete_admin),
        )
        .fallback(rest::not_found)
}

/// Full application: HTML pages, `/api`, and the `/ws/events` socket.
pub fn build_router(state: Arc<DashboardState>) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(routes::index))
        .route("/bots", get(routes::bots_page).post(routes::create_bot))
        .route("/bots/:id/toggle", post(routes::toggle_bot))
        .route("/bots/:id/delete", post(routes::delete_bot))
        .route(
            "/bots/:id/config",
            get(routes::bot_config).post(routes::save_bot_config),
        )
        .route("/bots/:id/preview", post(routes::preview_action))
        // Knowledge base forms
        .route("/bots/:id/documents", post(routes::upload_documents))
        .route("/bots/:id/urls", post(routes::add_url))
        .route("/bots/:id/knowledge/delete", post(routes::request_delete))
        .route("/bots/:id/knowledge/delete/confirm", post(routes::confirm_delete))
        .route("/bots/:id/knowledge/delete/cancel", post(routes::cancel_delete))
        .route(
            "/bots/:id/knowledge/settings",
            post(routes::update_knowledge_settings),
        )
        .route("/bots/:id/knowledge/reindex", post(routes::reindex))
        .route("/users", get(routes::users_page).post(routes::create_user))
        .route(
            "/users/:id/edit",
            get(routes::edit_user_page).post(routes::update_user),
        )
        .route("/users/:id/delete", post(routes::delete_user))
        // JSON API
        .nest("/api", api_router())
        // WebSocket for live notices and ingestion updates
        .route("/ws/events", get(websocket::ws_handler))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until the process exits.
pub async fn start_dashboard(state: Arc<DashboardState>) -> anyhow::Result<()> {
    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "console listening");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
