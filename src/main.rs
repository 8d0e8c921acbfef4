use std::path::PathBuf;

use scribe_store::{ArtifactStore, Database, TemplateRepo};
use scribe_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() {
    let _telemetry = init_telemetry(TelemetryConfig::default());

    tracing::info!("Starting Scribe server");

    let scribe_dir = dirs_home().join(".scribe");
    let db_dir = scribe_dir.join("database");
    std::fs::create_dir_all(&db_dir).expect("Failed to create database directory");
    let db_path = db_dir.join("scribe.db");

    let db = Database::open(&db_path).expect("Failed to open database");
    tracing::info!(path = %db_path.display(), "Database opened");

    let template_id = TemplateRepo::new(db.clone())
        .seed_default()
        .expect("Failed to seed default template");
    tracing::info!(template_id = %template_id, "Default template ready");

    let artifacts = ArtifactStore::open(&scribe_dir.join("artifacts"))
        .expect("Failed to open artifact store");

    let config = scribe_server::ServerConfig::default();
    let port = config.port;
    let _handle = scribe_server::start(config, db, artifacts)
        .await
        .expect("Failed to start server");

    tracing::info!(port = port, "Scribe server ready");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
