pub mod auth;

pub use auth::{auth_middleware, auth_user_from_headers, AuthUser};
