use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use scribe_engine::Dispatcher;
use scribe_store::{ArtifactStore, CreditRepo, Database, TemplateRepo};

use crate::handlers;

/// Server configuration.
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 9092 }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub artifacts: ArtifactStore,
    pub templates: Arc<TemplateRepo>,
    pub credits: Arc<CreditRepo>,
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database, artifacts: ArtifactStore) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(db.clone(), artifacts.clone())),
            artifacts,
            templates: Arc::new(TemplateRepo::new(db.clone())),
            credits: Arc::new(CreditRepo::new(db.clone())),
            db,
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/turn", post(handlers::post_turn))
        .route("/artifacts/{name}", get(handlers::get_artifact))
        .route("/templates", get(handlers::list_templates))
        .route("/credits/{user_id}", get(handlers::get_balance))
        .route("/credits/{user_id}/grant", post(handlers::grant_credits))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Create and start the server. Returns a handle to shut it down.
pub async fn start(
    config: ServerConfig,
    db: Database,
    artifacts: ArtifactStore,
) -> Result<ServerHandle, std::io::Error> {
    let state = AppState::new(db, artifacts);
    let router = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "Scribe server started");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server_handle,
    })
}

/// Handle returned by `start()` — keeps the accept loop alive.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::rubric::testutil::sample_value;

    fn setup() -> (Database, ArtifactStore) {
        let db = Database::in_memory().unwrap();
        TemplateRepo::new(db.clone()).seed_default().unwrap();
        let dir =
            std::env::temp_dir().join(format!("scribe-server-test-{}", uuid::Uuid::now_v7()));
        let artifacts = ArtifactStore::open(&dir).unwrap();
        (db, artifacts)
    }

    async fn spawn_server() -> (ServerHandle, Database, ArtifactStore) {
        let (db, artifacts) = setup();
        let config = ServerConfig { port: 0 };
        let handle = start(config, db.clone(), artifacts.clone()).await.unwrap();
        (handle, db, artifacts)
    }

    #[test]
    fn build_router_creates_routes() {
        let (db, artifacts) = setup();
        let _router = build_router(AppState::new(db, artifacts));
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let (handle, _db, _artifacts) = spawn_server().await;
        assert!(handle.port > 0);

        let url = format!("http://127.0.0.1:{}/health", handle.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn templates_endpoint_lists_catalog() {
        let (handle, _db, _artifacts) = spawn_server().await;
        let url = format!("http://127.0.0.1:{}/templates", handle.port);
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(body[0]["name"], "Classic Professional");
    }

    #[tokio::test]
    async fn missing_artifact_is_404() {
        let (handle, _db, _artifacts) = spawn_server().await;
        let url = format!("http://127.0.0.1:{}/artifacts/nope.pdf", handle.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn turn_flow_generates_and_downloads() {
        let (handle, _db, _artifacts) = spawn_server().await;
        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{}", handle.port);

        // Grant credits first.
        let resp = client
            .post(format!("{base}/credits/user_test/grant"))
            .json(&serde_json::json!({ "amount": 2 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let turn = serde_json::json!({
            "userId": "user_test",
            "responseText": "Here is your project.",
            "toolOutcomes": [{
                "toolName": "generateProject",
                "success": true,
                "args": {
                    "title": "Bilharzia Prevention",
                    "content": sample_value(),
                },
            }],
        });
        let reply: serde_json::Value = client
            .post(format!("{base}/turn"))
            .json(&turn)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(reply["messageType"], "normal-with-project");
        let name = reply["project"]["name"].as_str().unwrap();

        let download = client
            .get(format!("{base}/artifacts/{name}"))
            .send()
            .await
            .unwrap();
        assert_eq!(download.status(), 200);
        assert_eq!(download.headers()["content-type"], "application/pdf");
        let disposition = download.headers()["content-disposition"].to_str().unwrap().to_string();
        assert!(disposition.contains(name));
        let bytes = download.bytes().await.unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));

        // One credit left.
        let balance: serde_json::Value = client
            .get(format!("{base}/credits/user_test"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(balance["balance"], 1);
    }

    #[tokio::test]
    async fn turn_without_credit_returns_fallback() {
        let (handle, _db, _artifacts) = spawn_server().await;
        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{}", handle.port);

        let turn = serde_json::json!({
            "userId": "user_broke",
            "responseText": "",
            "toolOutcomes": [{
                "toolName": "generateProject",
                "success": true,
                "args": { "title": "T", "content": sample_value() },
            }],
        });
        let reply: serde_json::Value = client
            .post(format!("{base}/turn"))
            .json(&turn)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(reply["messageType"], "normal");
        assert_eq!(
            reply["text"],
            "Sorry, I couldn't process that request. Please try again."
        );
        assert!(reply.get("project").is_none());
    }
}
