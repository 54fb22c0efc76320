use axum::{
    Json, Router,
    extract::Extension,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;

use super::config::DEFAULT_METADATA_PORT;
use super::manager::DataManager;
use super::protocol::*;
use crate::chunk::handlers::{
    handle_local_chunks, handle_release_transfer, handle_serve_chunk, handle_started, handle_stop,
};
use crate::chunk::protocol::{
    AckResponse, ENDPOINT_LOCAL_CHUNKS, ENDPOINT_RELEASE_TRANSFER, ENDPOINT_SERVE_CHUNK,
    ENDPOINT_STARTED, ENDPOINT_STOP,
};
use crate::error::DfsError;
use crate::metadata::protocol::{ChunksResponse, FilesResponse, NodesResponse};

/// Routes served on a node's chunk port: the peer-facing chunk protocol plus the
/// control API used by the shell.
pub fn chunk_service_router(manager: Arc<DataManager>) -> Router {
    Router::new()
        .route(ENDPOINT_SERVE_CHUNK, post(handle_serve_chunk))
        .route(ENDPOINT_RELEASE_TRANSFER, post(handle_release_transfer))
        .route(ENDPOINT_LOCAL_CHUNKS, get(handle_local_chunks))
        .route(ENDPOINT_STARTED, get(handle_started))
        .route(ENDPOINT_STOP, post(handle_stop))
        .route(ENDPOINT_CONTROL_PUT, post(handle_put))
        .route(ENDPOINT_CONTROL_GET, post(handle_get))
        .route(ENDPOINT_CONTROL_CAT, post(handle_cat))
        .route(ENDPOINT_CONTROL_FILES, get(handle_list_files))
        .route(ENDPOINT_CONTROL_CHUNKS, get(handle_list_chunks))
        .route(ENDPOINT_CONTROL_NODES, get(handle_list_nodes))
        .route(ENDPOINT_CONTROL_REMOTE_METADATA, post(handle_remote_metadata))
        .route(ENDPOINT_CONTROL_LOCAL_METADATA, post(handle_local_metadata))
        .layer(Extension(manager.chunk_server()))
        .layer(Extension(manager))
}

pub async fn handle_put(
    Extension(manager): Extension<Arc<DataManager>>,
    Json(req): Json<PutRequest>,
) -> (StatusCode, Json<PutResponse>) {
    match manager
        .put(Path::new(&req.source), req.dfs_path.as_deref())
        .await
    {
        Ok(report) => (
            StatusCode::OK,
            Json(PutResponse {
                success: true,
                report: Some(report),
                error: None,
            }),
        ),
        Err(e) => {
            let status = match &e {
                DfsError::SourceNotFound(_) => StatusCode::NOT_FOUND,
                DfsError::ConnectionFailure(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(PutResponse {
                    success: false,
                    report: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_get(
    Extension(manager): Extension<Arc<DataManager>>,
    Json(req): Json<GetRequest>,
) -> (StatusCode, Json<AckResponse>) {
    let output = req.output.as_deref().map(Path::new);
    let success = manager.get(&req.dfs_path, output, req.append).await;
    (StatusCode::OK, Json(AckResponse { success }))
}

pub async fn handle_cat(
    Extension(manager): Extension<Arc<DataManager>>,
    Json(req): Json<CatRequest>,
) -> Response {
    match manager.read_file(&req.dfs_path).await {
        Some(contents) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            contents,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn handle_list_files(
    Extension(manager): Extension<Arc<DataManager>>,
) -> (StatusCode, Json<FilesResponse>) {
    match manager.list_files().await {
        Ok(files) => (StatusCode::OK, Json(FilesResponse { files })),
        Err(e) => {
            tracing::error!("Failed to list files: {}", e);
            (StatusCode::BAD_GATEWAY, Json(FilesResponse { files: vec![] }))
        }
    }
}

pub async fn handle_list_chunks(
    Extension(manager): Extension<Arc<DataManager>>,
) -> (StatusCode, Json<ChunksResponse>) {
    match manager.list_all_chunks().await {
        Ok(chunks) => (StatusCode::OK, Json(ChunksResponse { chunks })),
        Err(e) => {
            tracing::error!("Failed to list chunks: {}", e);
            (StatusCode::BAD_GATEWAY, Json(ChunksResponse { chunks: vec![] }))
        }
    }
}

pub async fn handle_list_nodes(
    Extension(manager): Extension<Arc<DataManager>>,
) -> (StatusCode, Json<NodesResponse>) {
    match manager.list_nodes().await {
        Ok(nodes) => (StatusCode::OK, Json(NodesResponse { nodes })),
        Err(e) => {
            tracing::error!("Failed to list nodes: {}", e);
            (StatusCode::BAD_GATEWAY, Json(NodesResponse { nodes: vec![] }))
        }
    }
}

pub async fn handle_remote_metadata(
    Extension(manager): Extension<Arc<DataManager>>,
    Json(req): Json<RemoteMetadataRequest>,
) -> (StatusCode, Json<AckResponse>) {
    let port = req.port.unwrap_or(DEFAULT_METADATA_PORT);
    let success = manager.use_remote_metadata(&req.host, port).await;
    (StatusCode::OK, Json(AckResponse { success }))
}

pub async fn handle_local_metadata(
    Extension(manager): Extension<Arc<DataManager>>,
) -> (StatusCode, Json<AckResponse>) {
    let success = manager.use_local_metadata().await;
    (StatusCode::OK, Json(AckResponse { success }))
}
