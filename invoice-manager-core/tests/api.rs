//! End-to-end tests of the HTTP API over the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use invoice_manager_core::app::{cors_layer, create_router, AppState};
use invoice_manager_core::config::DEFAULT_CORS_ORIGIN;
use invoice_manager_core::store::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let cors = cors_layer(DEFAULT_CORS_ORIGIN).expect("default origin is valid");
    create_router(AppState::new(store), cors)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn client_body(username: &str) -> Value {
    json!({
        "username": username,
        "clientName": "Acme Traders",
        "billingAddress": "12 Market Road",
        "shippingAddress": "Dock 4",
        "gstin": "29ABCDE1234F1Z5",
        "contactDetails": {"email": "Accounts@Acme.Example"}
    })
}

async fn create_client(app: &Router, username: &str) -> String {
    let (status, body) = send(app, "POST", "/api/clients", Some(client_body(username))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["client"]["_id"].as_str().expect("client id").to_string()
}

fn invoice_body(number: &str, client_id: &str) -> Value {
    json!({
        "invoiceNumber": number,
        "client": client_id,
        "dueDate": "2024-03-01",
        "taxRate": 18,
        "items": [
            {"description": "Design work", "quantity": 2, "rate": 100},
            {"description": "Printing", "quantity": "1", "rate": "50"}
        ]
    })
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/health/db", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_client_crud() {
    let app = app();
    let id = create_client(&app, "acme").await;

    let (status, body) = send(&app, "GET", &format!("/api/clients/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contactDetails"]["email"], "accounts@acme.example");
    assert_eq!(body["pos"], json!([]));

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/clients/{id}"),
        Some(json!({"clientName": "  Acme Ltd  "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Client updated successfully");
    assert_eq!(body["client"]["clientName"], "Acme Ltd");
    assert_eq!(body["client"]["gstin"], "29ABCDE1234F1Z5");

    let (status, body) = send(&app, "GET", "/api/clients", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) = send(&app, "DELETE", &format!("/api/clients/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client"]["_id"], id.as_str());

    let (status, _) = send(&app, "GET", &format!("/api/clients/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_legacy_client_routes() {
    let app = app();

    let (status, body) = send(&app, "POST", "/create-client", Some(client_body("legacy"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["client"]["_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/edit-client/{id}"),
        Some(json!({"contactPerson": "R. Iyer"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client"]["contactPerson"], "R. Iyer");
}

#[tokio::test]
async fn test_create_client_without_username_is_rejected() {
    let app = app();
    let mut body = client_body("ignored");
    body.as_object_mut().unwrap().remove("username");

    let (status, body) = send(&app, "POST", "/api/clients", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("username"));

    let (_, list) = send(&app, "GET", "/api/clients", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_duplicate_username_is_a_client_error() {
    let app = app();
    create_client(&app, "acme").await;

    let (status, body) = send(&app, "POST", "/api/clients", Some(client_body("acme"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "username already exists");
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/invoices")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = app();
    let missing = uuid::Uuid::new_v4();

    for (method, uri) in [
        ("GET", format!("/api/clients/{missing}")),
        ("DELETE", format!("/api/clients/{missing}")),
        ("GET", format!("/api/invoices/{missing}")),
        ("DELETE", format!("/api/invoices/{missing}")),
        ("GET", "/api/invoices/not-a-uuid".to_string()),
        ("GET", "/api/clients/12345".to_string()),
    ] {
        let (status, _) = send(&app, method, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    }

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/invoices/{missing}"),
        Some(json!({"status": "paid"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invoice_totals_are_computed_server_side() {
    let app = app();
    let client_id = create_client(&app, "acme").await;

    let mut body = invoice_body("INV-001", &client_id);
    body["subtotal"] = json!(1);
    body["total"] = json!(1);

    let (status, invoice) = send(&app, "POST", "/api/invoices", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{invoice}");
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["items"][0]["amount"].as_f64(), Some(200.0));
    assert_eq!(invoice["subtotal"].as_f64(), Some(250.0));
    assert_eq!(invoice["taxAmount"].as_f64(), Some(45.0));
    assert_eq!(invoice["total"].as_f64(), Some(295.0));
    assert_eq!(invoice["client"], client_id.as_str());
}

#[tokio::test]
async fn test_invoice_validation_errors() {
    let app = app();
    let client_id = create_client(&app, "acme").await;

    let mut bad_tax = invoice_body("INV-002", &client_id);
    bad_tax["taxRate"] = json!(120);
    let (status, body) = send(&app, "POST", "/api/invoices", Some(bad_tax)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "`taxRate` must be between 0 and 100");

    let mut bad_po = invoice_body("INV-003", &client_id);
    bad_po["pos"] = json!([{"poNumber": "", "poDate": ""}]);
    let (status, _) = send(&app, "POST", "/api/invoices", Some(bad_po)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, "GET", "/api/invoices", None).await;
    assert_eq!(list, json!([]));

    let body = invoice_body("INV-004", &client_id);
    let (status, _) = send(&app, "POST", "/api/invoices", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = invoice_body("INV-004", &client_id);
    let (status, body) = send(&app, "POST", "/api/invoices", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invoiceNumber already exists");
}

#[tokio::test]
async fn test_invoice_pos_merge_into_client() {
    let app = app();
    let client_id = create_client(&app, "acme").await;

    let mut first = invoice_body("INV-010", &client_id);
    first["pos"] = json!([{"poNumber": "A", "poDate": "2024-01-05"}]);
    let (status, _) = send(&app, "POST", "/api/invoices", Some(first)).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut second = invoice_body("INV-011", &client_id);
    second["pos"] = json!([
        {"poNumber": "A", "poDate": "2024-02-01"},
        {"poNumber": "B", "poDate": "2024-02-02"}
    ]);
    let (status, _) = send(&app, "POST", "/api/invoices", Some(second)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, client) = send(&app, "GET", &format!("/api/clients/{client_id}"), None).await;
    let numbers: Vec<&str> = client["pos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|po| po["poNumber"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["A", "B"]);
    assert!(client["pos"][0]["poDate"].as_str().unwrap().starts_with("2024-01-05"));
}

#[tokio::test]
async fn test_invoice_update_round_trips_expanded_client() {
    let app = app();
    let client_id = create_client(&app, "acme").await;
    let body = invoice_body("INV-020", &client_id);
    let (_, created) = send(&app, "POST", "/api/invoices", Some(body)).await;
    let invoice_id = created["_id"].as_str().unwrap().to_string();

    let url = format!("/api/invoices/{invoice_id}");
    let (status, mut detail) = send(&app, "GET", &url, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["client"]["clientName"], "Acme Traders");
    assert_eq!(detail["client"]["billingAddress"], "12 Market Road");

    detail["status"] = json!("sent");
    detail["taxRate"] = json!(0);
    detail["pos"] = json!([{"poNumber": "PO-9", "poDate": "2024-02-10T00:00:00Z"}]);

    let (status, updated) = send(&app, "PUT", &url, Some(detail)).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["status"], "sent");
    assert_eq!(updated["client"], client_id.as_str());
    assert_eq!(updated["taxAmount"].as_f64(), Some(0.0));
    assert_eq!(updated["total"].as_f64(), Some(250.0));

    let (_, client) = send(&app, "GET", &format!("/api/clients/{client_id}"), None).await;
    assert_eq!(client["pos"][0]["poNumber"], "PO-9");
}

#[tokio::test]
async fn test_po_merge_to_missing_client_is_server_error_but_invoice_persists() {
    let app = app();
    let orphan = uuid::Uuid::new_v4().to_string();

    let mut body = invoice_body("INV-030", &orphan);
    body["pos"] = json!([{"poNumber": "A", "poDate": "2024-01-01"}]);
    let (status, body) = send(&app, "POST", "/api/invoices", Some(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Client not found");

    let (_, list) = send(&app, "GET", "/api/invoices", None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["client"], Value::Null);
}

#[tokio::test]
async fn test_deleting_client_keeps_invoices() {
    let app = app();
    let client_id = create_client(&app, "acme").await;
    let body = invoice_body("INV-040", &client_id);
    let (_, created) = send(&app, "POST", "/api/invoices", Some(body)).await;
    let invoice_id = created["_id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/api/clients/{client_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, invoice) = send(&app, "GET", &format!("/api/invoices/{invoice_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invoice["client"], Value::Null);
}

#[tokio::test]
async fn test_invoices_listed_newest_first_with_client_summary() {
    let app = app();
    let client_id = create_client(&app, "acme").await;

    let mut ids = Vec::new();
    for number in ["INV-100", "INV-101", "INV-102"] {
        let body = invoice_body(number, &client_id);
        let (_, created) = send(&app, "POST", "/api/invoices", Some(body)).await;
        ids.push(created["_id"].as_str().unwrap().to_string());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    // Updating the oldest invoice must not move it up the list.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/invoices/{}", ids[0]),
        Some(json!({"status": "paid"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, list) = send(&app, "GET", "/api/invoices", None).await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["invoiceNumber"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["INV-102", "INV-101", "INV-100"]);

    let summary = list[0]["client"].as_object().unwrap();
    assert_eq!(summary["clientName"], "Acme Traders");
    assert_eq!(summary["gstin"], "29ABCDE1234F1Z5");
    assert!(!summary.contains_key("billingAddress"));
}

#[tokio::test]
async fn test_delete_invoice_confirms() {
    let app = app();
    let client_id = create_client(&app, "acme").await;
    let mut body = invoice_body("INV-050", &client_id);
    body["pos"] = json!([{"poNumber": "Z", "poDate": "2024-01-01"}]);
    let (_, created) = send(&app, "POST", "/api/invoices", Some(body)).await;
    let invoice_id = created["_id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "DELETE", &format!("/api/invoices/{invoice_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invoice deleted successfully");

    // Client POs recorded from the invoice are kept.
    let (_, client) = send(&app, "GET", &format!("/api/clients/{client_id}"), None).await;
    assert_eq!(client["pos"][0]["poNumber"], "Z");
}
