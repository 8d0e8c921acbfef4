//! Document synthesis: validated rubric content is compiled into paginated
//! PDF artifacts, and tool-call outcomes are fulfilled against the store.

pub mod compiler;
pub mod dispatcher;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod pdf;

pub use compiler::{compile, CompiledDocument};
pub use dispatcher::Dispatcher;
pub use error::EngineError;
