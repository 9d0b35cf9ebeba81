mod applies;
pub mod dto;
mod projects;
pub mod response;
mod router;
mod session;
mod spaces;
pub mod validation;

pub use router::{AppState, create_router};
