mod helpers;
mod middleware;
pub mod session;
mod token;

pub use helpers::{TokenValidationError, extract_token_from_header, validate_request_token};
pub use middleware::{AuthError, RequireUser};
pub use token::{generate_token, hash_token, parse_token};
