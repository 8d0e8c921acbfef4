//! Persistence layer: SQLite-backed repos for projects, templates, and
//! the credit ledger, plus the filesystem artifact store.

pub mod artifacts;
pub mod credits;
pub mod database;
pub mod error;
pub mod projects;
pub mod row_helpers;
pub mod schema;
pub mod templates;

pub use artifacts::ArtifactStore;
pub use credits::CreditRepo;
pub use database::Database;
pub use error::StoreError;
pub use projects::{ProjectRepo, ProjectRow};
pub use templates::TemplateRepo;
