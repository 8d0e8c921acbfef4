//! HTTP surface: one turn-dispatch endpoint plus artifact downloads and
//! the template catalog.

pub mod handlers;
pub mod server;

pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
