use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use super::memory::LocalMetadata;
use super::protocol::*;
use super::service::MetadataService;
use crate::error::DfsError;

/// Routes of a hosted `LocalMetadata`.
pub fn metadata_router(metadata: Arc<LocalMetadata>) -> Router {
    Router::new()
        .route(ENDPOINT_META_PUBLISH, post(handle_publish))
        .route(ENDPOINT_META_RECORD, post(handle_get_record))
        .route(ENDPOINT_META_RESOLVE, post(handle_resolve))
        .route(ENDPOINT_META_ADD_HOLDER, post(handle_add_holder))
        .route(ENDPOINT_META_FILES, get(handle_list_files))
        .route(ENDPOINT_META_CHUNKS, get(handle_list_chunks))
        .route(ENDPOINT_META_NODES, get(handle_list_nodes))
        .route(ENDPOINT_META_STARTED, get(handle_started))
        .layer(Extension(metadata))
}

fn ack(result: Result<(), DfsError>) -> (StatusCode, Json<MetaAckResponse>) {
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(MetaAckResponse {
                success: true,
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!("Metadata request rejected: {}", e);
            let status = match &e {
                DfsError::FileNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (
                status,
                Json(MetaAckResponse {
                    success: false,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_publish(
    Extension(metadata): Extension<Arc<LocalMetadata>>,
    Json(req): Json<PublishRequest>,
) -> (StatusCode, Json<MetaAckResponse>) {
    ack(metadata
        .publish(&req.dfs_path, &req.node, req.total_size, req.chunk_count)
        .await)
}

pub async fn handle_get_record(
    Extension(metadata): Extension<Arc<LocalMetadata>>,
    Json(req): Json<RecordRequest>,
) -> (StatusCode, Json<RecordResponse>) {
    match metadata.get_file_record(&req.dfs_path).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(RecordResponse {
                record: Some(record),
            }),
        ),
        Ok(None) => (StatusCode::NOT_FOUND, Json(RecordResponse { record: None })),
        Err(e) => {
            tracing::error!("Failed to look up {}: {}", req.dfs_path, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RecordResponse { record: None }),
            )
        }
    }
}

pub async fn handle_resolve(
    Extension(metadata): Extension<Arc<LocalMetadata>>,
    Json(req): Json<ResolveRequest>,
) -> (StatusCode, Json<ResolveResponse>) {
    match metadata.resolve_holders(&req.token).await {
        Ok(holders) => (StatusCode::OK, Json(ResolveResponse { holders })),
        Err(e) => {
            tracing::error!("Failed to resolve {}: {}", req.token, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ResolveResponse { holders: vec![] }),
            )
        }
    }
}

pub async fn handle_add_holder(
    Extension(metadata): Extension<Arc<LocalMetadata>>,
    Json(req): Json<AddHolderRequest>,
) -> (StatusCode, Json<MetaAckResponse>) {
    ack(metadata
        .add_holder(&req.dfs_path, req.index, &req.node)
        .await)
}

pub async fn handle_list_files(
    Extension(metadata): Extension<Arc<LocalMetadata>>,
) -> (StatusCode, Json<FilesResponse>) {
    let files = metadata.list_files().await.unwrap_or_default();
    (StatusCode::OK, Json(FilesResponse { files }))
}

pub async fn handle_list_chunks(
    Extension(metadata): Extension<Arc<LocalMetadata>>,
) -> (StatusCode, Json<ChunksResponse>) {
    let chunks = metadata.list_all_chunks().await.unwrap_or_default();
    (StatusCode::OK, Json(ChunksResponse { chunks }))
}

pub async fn handle_list_nodes(
    Extension(metadata): Extension<Arc<LocalMetadata>>,
) -> (StatusCode, Json<NodesResponse>) {
    let nodes = metadata.list_nodes().await.unwrap_or_default();
    (StatusCode::OK, Json(NodesResponse { nodes }))
}

pub async fn handle_started() -> Json<bool> {
    Json(true)
}
