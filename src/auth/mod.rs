use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod errors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;

pub use errors::AuthError;
pub use jwt::{Claims, JwtKeys, SessionToken};
pub use services::{AuthService, SignUpParams};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
