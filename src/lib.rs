//! # Shipway
//!
//! Deployment request tracking: spaces own projects, members submit applies
//! against projects, and applies move through audit and deploy states.
//! Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! shipway = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shipway::config::ServerConfig;
//! use shipway::server::{AppState, create_router};
//! use shipway::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     config,
//!     mailer: None,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): builds the `shipway` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod deploy;
pub mod error;
pub mod mail;
pub mod server;
pub mod space;
pub mod store;
pub mod types;
