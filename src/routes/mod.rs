use axum::Router;

use crate::state::AppState;

pub mod activity;
pub mod aspirations;
pub mod auth;
pub mod categories;
pub mod chat;
pub mod dashboard;
pub mod discounts;
pub mod doc;
pub mod events;
pub mod forum;
pub mod health;
pub mod media;
pub mod news;
pub mod notifications;
pub mod params;
pub mod polls;
pub mod products;
pub mod social_media;
pub mod transactions;
pub mod users;
pub mod vouchers;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/product-categories", categories::router())
        .nest("/transactions", transactions::router())
        .nest("/vouchers", vouchers::router())
        .nest("/discounts", discounts::router())
        .nest("/news", news::router())
        .nest("/forum", forum::router())
        .nest("/polls", polls::router())
        .nest("/events", events::router())
        .nest("/aspirations", aspirations::router())
        .nest("/media", media::router())
        .nest("/social-media", social_media::router())
        .nest("/notifications", notifications::router())
        .nest("/chat", chat::router())
        .nest("/activity-log", activity::router())
        .nest("/dashboard", dashboard::router())
}
