//! HTTP surface: `POST /api/scan` and `GET /health`.

use std::net::SocketAddr;
use std::sync::Arc;

use a11y_protocol::{ScanReport, ScanRequest};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::ScanError;
use crate::orchestrator::ScanOrchestrator;

impl IntoResponse for ScanError {
	fn into_response(self) -> Response {
		let status = if self.is_client_error() {
			StatusCode::BAD_REQUEST
		} else {
			StatusCode::INTERNAL_SERVER_ERROR
		};
		(status, Json(self.to_payload())).into_response()
	}
}

pub fn router(orchestrator: Arc<ScanOrchestrator>) -> Router {
	let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

	Router::new()
		.route("/health", get(health))
		.route("/api/scan", post(scan))
		.layer(TraceLayer::new_for_http())
		.layer(cors)
		.with_state(orchestrator)
}

async fn health() -> &'static str {
	"ok"
}

/// Accepts any body; a missing or non-JSON body is treated as a request without a URL.
async fn scan(State(orchestrator): State<Arc<ScanOrchestrator>>, body: Bytes) -> Result<Json<ScanReport>, ScanError> {
	let request = serde_json::from_slice::<ScanRequest>(&body).unwrap_or_else(|err| {
		debug!(target: "a11y.server", error = %err, "unreadable scan request body");
		ScanRequest::default()
	});
	orchestrator.scan(&request).await.map(Json)
}

/// Serves until ctrl-c.
pub async fn serve(addr: SocketAddr, orchestrator: Arc<ScanOrchestrator>) -> anyhow::Result<()> {
	let listener = tokio::net::TcpListener::bind(addr).await?;
	info!(target: "a11y.server", addr = %listener.local_addr()?, "listening");

	axum::serve(listener, router(orchestrator))
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
			info!(target: "a11y.server", "shutting down");
		})
		.await?;
	Ok(())
}
