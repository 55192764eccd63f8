//! HTTP handlers for the signoff API

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use signoff_types::Annotation;

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

const OWNER_KEY_HEADER: &str = "x-owner-key";

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

async fn fetch_document(state: &AppState, id: &str) -> Result<DbDocument, ApiError> {
    let document: Option<DbDocument> = sqlx::query_as(
        r#"
        SELECT id, name, document_hash, pdf_data, page_count, owner_key,
               annotations_json, is_finalized, finalized_artifact_id, created_at, updated_at
        FROM documents
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    document.ok_or_else(|| ApiError::DocumentNotFound(id.to_string()))
}

fn require_owner(headers: &HeaderMap, document: &DbDocument) -> Result<(), ApiError> {
    let supplied = headers
        .get(OWNER_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::InvalidOwnerKey)?;
    if supplied != document.owner_key {
        return Err(ApiError::InvalidOwnerKey);
    }
    Ok(())
}

/// Register a new document
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    if req.owner_key.is_empty() {
        return Err(ApiError::InvalidRequest("Owner key is required".into()));
    }

    let pdf_data = BASE64
        .decode(&req.pdf_base64)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid PDF base64: {}", e)))?;

    let page_count = flatten_core::get_page_count(&pdf_data)
        .map_err(|e| ApiError::InvalidRequest(format!("Unreadable PDF: {}", e)))?;

    let document_hash = hex::encode(Sha256::digest(&pdf_data));
    let document_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO documents (id, name, document_hash, pdf_data, page_count, owner_key,
                               annotations_json, is_finalized, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, '[]', 0, ?, ?)
        "#,
    )
    .bind(&document_id)
    .bind(&req.name)
    .bind(&document_hash)
    .bind(&pdf_data)
    .bind(page_count as i64)
    .bind(&req.owner_key)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(&state.db)
    .await?;

    tracing::info!("Created document: {} ({} pages)", document_id, page_count);

    Ok(Json(DocumentResponse {
        id: document_id,
        name: req.name,
        document_hash,
        page_count,
        is_finalized: false,
        finalized_artifact_id: None,
        created_at: now,
        updated_at: now,
    }))
}

/// Get document metadata
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = fetch_document(&state, &id).await?;
    Ok(Json(DocumentResponse::from_db(document)))
}

/// Get the annotation collection for a document
pub async fn get_annotations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Annotation>>, ApiError> {
    let document = fetch_document(&state, &id).await?;
    require_owner(&headers, &document)?;

    let annotations: Vec<Annotation> = serde_json::from_str(&document.annotations_json)
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(Json(annotations))
}

/// Replace the annotation collection for a document. This overwrites the
/// stored set wholesale; it is not a merge.
pub async fn replace_annotations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(annotations): Json<Vec<Annotation>>,
) -> Result<Json<Vec<Annotation>>, ApiError> {
    let document = fetch_document(&state, &id).await?;
    require_owner(&headers, &document)?;

    if document.is_finalized {
        return Err(ApiError::DocumentFinalized);
    }

    for annotation in &annotations {
        if annotation.document_id != document.id {
            return Err(ApiError::InvalidRequest(format!(
                "Annotation {} belongs to another document",
                annotation.id
            )));
        }
        annotation
            .validate(document.page_count as u32)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    }

    let annotations_json =
        serde_json::to_string(&annotations).map_err(|e| ApiError::Internal(e.into()))?;

    sqlx::query(
        r#"
        UPDATE documents
        SET annotations_json = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&annotations_json)
    .bind(Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    tracing::info!(
        "Replaced annotations for document {}: {} annotations",
        id,
        annotations.len()
    );

    Ok(Json(annotations))
}

/// Flatten the document's annotation set into a new artifact.
///
/// Each call produces a fresh artifact row; there is no server-side guard
/// against repeat finalization. Clients gate this behind their own
/// in-flight flag, so two independent clients can still race and produce
/// duplicate artifacts. Earlier artifacts are never touched.
pub async fn finalize_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FinalizeResponse>, ApiError> {
    let document = fetch_document(&state, &id).await?;
    require_owner(&headers, &document)?;

    let annotations: Vec<Annotation> = serde_json::from_str(&document.annotations_json)
        .map_err(|e| ApiError::Internal(e.into()))?;

    let flattened = flatten_core::flatten_document(&document.pdf_data, &annotations)?;

    let artifact_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO artifacts (id, document_id, pdf_data, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&artifact_id)
    .bind(&id)
    .bind(&flattened)
    .bind(now.to_rfc3339())
    .execute(&state.db)
    .await?;

    // Flattened content supersedes the live annotations, so the working
    // set is cleared with the same update that locks the document
    sqlx::query(
        r#"
        UPDATE documents
        SET is_finalized = 1, finalized_artifact_id = ?, annotations_json = '[]', updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&artifact_id)
    .bind(now.to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    tracing::info!(
        "Finalized document {}: artifact {}, {} annotations baked",
        id,
        artifact_id,
        annotations.len()
    );

    Ok(Json(FinalizeResponse {
        document_id: id,
        artifact_id,
        annotation_count: annotations.len(),
    }))
}

/// Get the original document PDF. Byte delivery carries the same owner-key
/// requirement as the annotation endpoints.
pub async fn get_document_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, [(String, String); 2], Vec<u8>), ApiError> {
    let document = fetch_document(&state, &id).await?;
    require_owner(&headers, &document)?;

    Ok((
        StatusCode::OK,
        [
            ("Content-Type".to_string(), "application/pdf".to_string()),
            (
                "Content-Disposition".to_string(),
                format!("inline; filename=\"{}\"", document.name),
            ),
        ],
        document.pdf_data,
    ))
}

/// Get a finalized artifact PDF. The owner key is checked against the
/// document the artifact was finalized from.
pub async fn get_artifact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, [(String, String); 2], Vec<u8>), ApiError> {
    let artifact: Option<DbArtifact> = sqlx::query_as(
        r#"
        SELECT id, document_id, pdf_data, created_at
        FROM artifacts
        WHERE id = ?
        "#,
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?;

    let artifact = artifact.ok_or_else(|| ApiError::ArtifactNotFound(id.clone()))?;
    let document = fetch_document(&state, &artifact.document_id).await?;
    require_owner(&headers, &document)?;

    Ok((
        StatusCode::OK,
        [
            ("Content-Type".to_string(), "application/pdf".to_string()),
            (
                "Content-Disposition".to_string(),
                format!("inline; filename=\"finalized_{}.pdf\"", artifact.document_id),
            ),
        ],
        artifact.pdf_data,
    ))
}
