mod assignments;
mod groups;
mod items;
mod roles;
mod tokens;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Navigation item routes
        .route(
            "/navigation",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/navigation/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        // Navigation group routes
        .route(
            "/navigation/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/navigation/groups/{id}",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        // Role navigation routes: PUT replaces, POST on a single item adds
        .route(
            "/navigation/roles/{role_id}",
            get(assignments::list_role_navigation).put(assignments::assign_navigation_to_role),
        )
        .route(
            "/navigation/roles/{role_id}/items/{item_id}",
            post(assignments::upsert_assignment).delete(assignments::remove_assignment),
        )
        // Role routes
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route("/roles/{id}", get(roles::get_role).delete(roles::delete_role))
        .route(
            "/roles/{id}/tokens",
            get(roles::list_role_tokens).post(roles::create_role_token),
        )
        // Token routes
        .route("/tokens", get(tokens::list_tokens))
        .route(
            "/tokens/{id}",
            get(tokens::get_token).delete(tokens::delete_token),
        )
}
