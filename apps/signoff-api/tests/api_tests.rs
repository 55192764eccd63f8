//! Handler-level tests driving the router against an in-memory database

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

use signoff_api::router;
use signoff_api::state::AppState;

const OWNER_KEY: &str = "owner-secret";

async fn test_app() -> Router {
    // One connection keeps every query on the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let state = AppState::with_pool(pool).await.unwrap();
    router(Arc::new(state))
}

fn minimal_pdf() -> Vec<u8> {
    use lopdf::{dictionary, Document, Object};

    let mut doc = Document::with_version("1.7");
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
    });
    if let Ok(page) = doc.get_object_mut(page_id) {
        if let Ok(dict) = page.as_dict_mut() {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn post_json(uri: &str, owner_key: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = owner_key {
        builder = builder.header("x-owner-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_bytes(uri: &str, owner_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = owner_key {
        builder = builder.header("x-owner-key", key);
    }
    builder.body(Body::empty()).unwrap()
}

async fn create_document(app: &Router) -> String {
    let body = json!({
        "name": "contract.pdf",
        "pdf_base64": BASE64.encode(minimal_pdf()),
        "owner_key": OWNER_KEY,
    });
    let (status, bytes) = send(app, post_json("/api/documents", None, body)).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    value["id"].as_str().unwrap().to_string()
}

fn text_annotation_set(document_id: &str) -> Value {
    json!([{
        "id": "ann-1",
        "document_id": document_id,
        "page": 1,
        "x": 100.0,
        "y": 50.0,
        "width": 150.0,
        "height": 50.0,
        "render_size": { "width": 600.0, "height": 776.0 },
        "type": "text_field",
        "text": "Jane Doe",
        "font_size": 16.0,
    }])
}

async fn finalize(app: &Router, document_id: &str) -> Value {
    let uri = format!("/api/documents/{}/finalize", document_id);
    let (status, bytes) = send(app, post_json(&uri, Some(OWNER_KEY), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_finalizing_twice_yields_two_independent_artifacts() {
    let app = test_app().await;
    let doc = create_document(&app).await;

    let uri = format!("/api/documents/{}/annotations", doc);
    let (status, _) = send(
        &app,
        post_json(&uri, Some(OWNER_KEY), text_annotation_set(&doc)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let first = finalize(&app, &doc).await;
    let first_id = first["artifact_id"].as_str().unwrap().to_string();
    assert_eq!(first["annotation_count"], 1);

    let first_uri = format!("/api/artifacts/{}", first_id);
    let (status, first_bytes) = send(&app, get_bytes(&first_uri, Some(OWNER_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first_bytes.starts_with(b"%PDF-"));

    // Finalize again: a new artifact id is minted and the first artifact
    // is still served byte for byte
    let second = finalize(&app, &doc).await;
    let second_id = second["artifact_id"].as_str().unwrap().to_string();
    assert_ne!(second_id, first_id);

    let (status, refetched) = send(&app, get_bytes(&first_uri, Some(OWNER_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refetched, first_bytes);

    // The second run flattened the already-cleared set, so its output is
    // the untouched upload rather than the baked first artifact
    let second_uri = format!("/api/artifacts/{}", second_id);
    let (status, second_bytes) = send(&app, get_bytes(&second_uri, Some(OWNER_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["annotation_count"], 0);
    assert_ne!(second_bytes, first_bytes);
}

#[tokio::test]
async fn test_annotation_replace_is_refused_after_finalize() {
    let app = test_app().await;
    let doc = create_document(&app).await;
    finalize(&app, &doc).await;

    let uri = format!("/api/documents/{}/annotations", doc);
    let (status, _) = send(
        &app,
        post_json(&uri, Some(OWNER_KEY), text_annotation_set(&doc)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_out_of_range_page_is_rejected_on_replace() {
    let app = test_app().await;
    let doc = create_document(&app).await;

    let mut set = text_annotation_set(&doc);
    set[0]["page"] = json!(5);
    let uri = format!("/api/documents/{}/annotations", doc);
    let (status, _) = send(&app, post_json(&uri, Some(OWNER_KEY), set)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_document_file_requires_the_owner_key() {
    let app = test_app().await;
    let doc = create_document(&app).await;
    let uri = format!("/api/documents/{}/file", doc);

    let (status, _) = send(&app, get_bytes(&uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_bytes(&uri, Some("wrong-key"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, bytes) = send(&app, get_bytes(&uri, Some(OWNER_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_artifact_delivery_requires_the_owner_key() {
    let app = test_app().await;
    let doc = create_document(&app).await;
    let finalized = finalize(&app, &doc).await;
    let uri = format!("/api/artifacts/{}", finalized["artifact_id"].as_str().unwrap());

    let (status, _) = send(&app, get_bytes(&uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, bytes) = send(&app, get_bytes(&uri, Some(OWNER_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_unknown_artifact_is_a_404() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        get_bytes("/api/artifacts/no-such-artifact", Some(OWNER_KEY)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
