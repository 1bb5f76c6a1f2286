use axum::{http::StatusCode, routing::get, Router};
use log::{error, info};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::error::SitlyError;

pub struct WebServer {
    host: String,
    port: u16,
}

impl WebServer {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    pub async fn start(&self, state: AppState) -> Result<(), SitlyError> {
        let app = create_router(state);

        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| SitlyError::Error(format!("Invalid address: {}", e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SitlyError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        println!("Sitly ratings server listening on http://{}", addr);
        info!("Server ready to handle requests on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| SitlyError::Error(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        println!("Server stopped");

        Ok(())
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // App info
        .route("/api/app-info", get(api::app::get_app_info))
        // Ratings feed
        .route("/api/ratings", get(api::ratings::get_ratings))
        .with_state(state)
}

async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Sitly ratings server is running")
}

/// Waits for a shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingsConfig;
    use crate::database::{Database, DB_FILENAME};
    use axum::{
        body::{self, Body},
        http::Request,
    };
    use rusqlite::params;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    /// Ten five-star ratings from one babysitter, delivered at 100..=1000, ids 1..=10
    fn seeded_state(dir: &TempDir) -> AppState {
        let db = Database::open(&dir.path().join(DB_FILENAME), 2).unwrap();
        {
            let conn = db.conn().unwrap();
            conn.execute_batch(
                r#"
                INSERT INTO users (user_id, first_name, role) VALUES (1, 'Bea', 'babysitter'), (2, 'Rae', 'parent');
                INSERT INTO profiles (user_id, has_references, has_first_aid) VALUES (1, 1, 1);
                "#,
            )
            .unwrap();
            for t in 1..=10 {
                add_rating(&db, t, t * 100);
            }
        }
        AppState::new(
            db,
            RatingsConfig {
                default_page_size: 4,
                max_page_size: 10,
            },
        )
    }

    fn add_rating(db: &Database, rating_id: i64, delivered: i64) {
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO messages (message_id, sender_id, receiver_id, created_at) VALUES (?1, 1, 2, ?2)",
            params![rating_id, delivered],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ratings (rating_id, message_id, rating, delivered) VALUES (?1, ?1, 5, ?2)",
            params![rating_id, delivered],
        )
        .unwrap();
    }

    async fn fetch(state: &AppState, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = create_router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn row_ids(json: &Value) -> Vec<i64> {
        json["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["rating_id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (status, _) = fetch(&seeded_state(&dir), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_app_info_reports_schema_version() {
        let dir = TempDir::new().unwrap();
        let (status, body) = fetch(&seeded_state(&dir), "/api/app-info").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["schema_version"], "1");
        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    }

    #[tokio::test]
    async fn test_app_info_without_schema_version_reports_unknown() {
        let dir = TempDir::new().unwrap();
        let state = seeded_state(&dir);
        state.db.conn().unwrap().execute_batch("DELETE FROM meta").unwrap();

        let (status, body) = fetch(&state, "/api/app-info").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["schema_version"], "unknown");
    }

    #[tokio::test]
    async fn test_first_page_uses_default_size() {
        let dir = TempDir::new().unwrap();
        let (status, body) = fetch(&seeded_state(&dir), "/api/ratings").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(row_ids(&json), vec![10, 9, 8, 7]);
        assert_eq!(json["count"], 10);
        assert_eq!(json["page"], 1);
        assert_eq!(json["limit"], 4);
        assert_eq!(json["rows"][0]["sender"]["role"], "babysitter");
    }

    #[tokio::test]
    async fn test_second_page_with_seen_ids_ignores_late_rating() {
        let dir = TempDir::new().unwrap();
        let state = seeded_state(&dir);

        let (_, body) = fetch(&state, "/api/ratings?page=1&limit=4").await;
        let seen = row_ids(&serde_json::from_slice(&body).unwrap());

        add_rating(&state.db, 11, 1100);

        let seen_param = seen.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        let (status, body) = fetch(&state, &format!("/api/ratings?page=2&limit=4&seen={seen_param}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(row_ids(&serde_json::from_slice(&body).unwrap()), vec![6, 5, 4, 3]);
    }

    #[tokio::test]
    async fn test_filters_are_applied() {
        let dir = TempDir::new().unwrap();
        let state = seeded_state(&dir);

        let (_, body) = fetch(&state, "/api/ratings?role=parent").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["count"], 0);

        let (_, body) = fetch(&state, "/api/ratings?has_first_aid=true&limit=2").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(row_ids(&json), vec![10, 9]);
    }

    #[tokio::test]
    async fn test_invalid_requests_are_bad_requests() {
        let dir = TempDir::new().unwrap();
        let state = seeded_state(&dir);

        for uri in [
            "/api/ratings?page=0",
            "/api/ratings?limit=0",
            "/api/ratings?limit=11",
            "/api/ratings?role=nanny",
            "/api/ratings?page=2&seen=1,abc",
            "/api/ratings?page=-1",
        ] {
            let (status, _) = fetch(&state, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_datastore_failure_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let state = seeded_state(&dir);
        state.db.conn().unwrap().execute_batch("DROP TABLE ratings").unwrap();

        let (status, _) = fetch(&state, "/api/ratings?page=2").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
