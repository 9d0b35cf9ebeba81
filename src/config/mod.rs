mod server;

pub use server::{MAX_TOKEN_TTL_SECS, ServerConfig, token_ttl_from_secs};
