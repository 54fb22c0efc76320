use axum::{
    Json,
    extract::Extension,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::protocol::{
    AckResponse, LocalChunksResponse, ReleaseTransferRequest, STATUS_BUSY, STATUS_FOUND,
    STATUS_NOT_FOUND, ServeChunkRequest, ServeOutcome,
};
use super::server::ChunkServer;

pub async fn handle_serve_chunk(
    Extension(server): Extension<Arc<ChunkServer>>,
    Json(req): Json<ServeChunkRequest>,
) -> Response {
    let ServeChunkRequest { token, transfer } = req;
    let outcome = tokio::task::spawn_blocking(move || server.serve_chunk(&token, transfer)).await;

    match outcome {
        Ok(ServeOutcome::Busy) => STATUS_BUSY.into_response(),
        Ok(ServeOutcome::NotFound) => STATUS_NOT_FOUND.into_response(),
        Ok(ServeOutcome::Found(bytes)) => (
            STATUS_FOUND,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("serve_chunk task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn handle_release_transfer(
    Extension(server): Extension<Arc<ChunkServer>>,
    Json(req): Json<ReleaseTransferRequest>,
) -> (StatusCode, Json<AckResponse>) {
    let success = server.release_transfer(req.transfer);
    (StatusCode::OK, Json(AckResponse { success }))
}

pub async fn handle_local_chunks(
    Extension(server): Extension<Arc<ChunkServer>>,
) -> (StatusCode, Json<LocalChunksResponse>) {
    match server.list_local_chunks() {
        Ok(chunks) => (
            StatusCode::OK,
            Json(LocalChunksResponse {
                chunks: chunks.into_iter().collect(),
            }),
        ),
        Err(e) => {
            tracing::error!("Failed to list local chunks: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LocalChunksResponse { chunks: Vec::new() }),
            )
        }
    }
}

pub async fn handle_started(Extension(server): Extension<Arc<ChunkServer>>) -> Json<bool> {
    Json(server.started())
}

pub async fn handle_stop(
    Extension(server): Extension<Arc<ChunkServer>>,
) -> (StatusCode, Json<AckResponse>) {
    server.stop();
    (StatusCode::OK, Json(AckResponse { success: true }))
}
