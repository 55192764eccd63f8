//! Data models for the signoff API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Document stored in database
#[derive(Debug, Clone, FromRow)]
pub struct DbDocument {
    pub id: String,
    pub name: String,
    pub document_hash: String,
    pub pdf_data: Vec<u8>,
    pub page_count: i64,
    pub owner_key: String,
    pub annotations_json: String,
    pub is_finalized: bool,
    pub finalized_artifact_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Finalized artifact stored in database. Each finalize call produces a new
/// row; earlier artifacts are never overwritten.
#[derive(Debug, Clone, FromRow)]
pub struct DbArtifact {
    pub id: String,
    pub document_id: String,
    pub pdf_data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Request to register a new document
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub pdf_base64: String,
    pub owner_key: String,
}

/// Document metadata for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: String,
    pub name: String,
    pub document_hash: String,
    pub page_count: u32,
    pub is_finalized: bool,
    pub finalized_artifact_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn from_db(doc: DbDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            document_hash: doc.document_hash,
            page_count: doc.page_count as u32,
            is_finalized: doc.is_finalized,
            finalized_artifact_id: doc.finalized_artifact_id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Response from a finalize operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub document_id: String,
    pub artifact_id: String,
    pub annotation_count: usize,
}
