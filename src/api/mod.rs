mod attributes;
pub mod auth;
pub mod error;
mod recipes;
mod users;
pub mod validation;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::{Ingredient, Tag};
use crate::AppState;

use attributes::{delete_attribute, get_attribute, list_attributes, update_attribute};

pub fn create_router(state: Arc<AppState>) -> Router {
    // User routes (public)
    let public_user_routes = Router::new()
        .route("/create/", post(users::create_user))
        .route("/token/", post(users::create_token));

    // Protected user routes
    let private_user_routes = Router::new()
        .route("/me/", get(users::me).patch(users::update_me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Protected recipe routes
    let recipe_routes = Router::new()
        // Recipes
        .route(
            "/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/:id/",
            get(recipes::get_recipe)
                .put(recipes::replace_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        // Tags
        .route("/tags/", get(list_attributes::<Tag>))
        .route(
            "/tags/:id/",
            get(get_attribute::<Tag>)
                .patch(update_attribute::<Tag>)
                .delete(delete_attribute::<Tag>),
        )
        // Ingredients
        .route("/ingredients/", get(list_attributes::<Ingredient>))
        .route(
            "/ingredients/:id/",
            get(get_attribute::<Ingredient>)
                .patch(update_attribute::<Ingredient>)
                .delete(delete_attribute::<Ingredient>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/user", public_user_routes.merge(private_user_routes))
        .nest("/api/recipe", recipe_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
