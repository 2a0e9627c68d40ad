pub mod auth;

pub use auth::{auth_middleware, is_admin, is_staff, AppState, AuthUser};
