//! End-to-end tests of the HTTP surface, backed by the in-memory store.

use api_lib::adapters::Argon2Hasher;
use api_lib::web::{router, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use reading_tracker_core::InMemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::from_store(
        Arc::new(InMemoryStore::new()),
        Arc::new(Argon2Hasher::new()),
        chrono::Duration::hours(1),
    );
    router(Arc::new(state))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signup(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/api/auth/signup",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct horse battery",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_book(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/api/books",
        Some(token),
        Some(json!({ "name": name, "author": "Frank Herbert", "pages": 412 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn start_reading(app: &Router, token: &str, document_id: &str, reading_type: &str) -> StatusCode {
    send(
        app,
        Method::POST,
        "/v1/api/readings",
        Some(token),
        Some(json!({ "document_id": document_id, "reading_type": reading_type })),
    )
    .await
    .0
}

async fn reading_ids(app: &Router, token: &str) -> Vec<String> {
    let (status, body) = send(app, Method::GET, "/v1/api/readings?limit=100", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn signup_login_and_logout() {
    let app = app();
    let token = signup(&app, "ana").await;

    let (status, body) = send(&app, Method::GET, "/v1/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["username"], json!("ana"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/api/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "correct horse battery" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["token"].as_str().unwrap().to_string();
    assert!(body["data"]["user"]["last_login"].is_string());

    let (status, _) = send(&app, Method::POST, "/v1/api/auth/logout", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::GET, "/v1/api/users/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!(401));
}

#[tokio::test]
async fn signup_rejects_bad_input_and_duplicates() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/api/auth/signup",
        None,
        Some(json!({ "username": "al", "email": "al@example.com", "password": "long enough" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("username"));

    signup(&app, "ana").await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/api/auth/signup",
        None,
        Some(json!({ "username": "ana", "email": "other@example.com", "password": "long enough" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/api/auth/login",
        None,
        Some(json!({ "username": "ana", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_token_but_catalog_reads_do_not() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/v1/api/readings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/api/books",
        None,
        Some(json!({ "name": "Dune", "author": "Frank Herbert" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = signup(&app, "ana").await;
    let book = create_book(&app, &token, "Dune").await;
    let (status, body) = send(&app, Method::GET, &format!("/v1/api/books/{}", book), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Book Successfully Retrieved"));
    let (status, body) = send(&app, Method::GET, "/v1/api/books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(1));
}

#[tokio::test]
async fn reading_with_records_scenario() {
    let app = app();
    let token = signup(&app, "ana").await;
    let book = create_book(&app, &token, "Dune").await;

    assert_eq!(start_reading(&app, &token, &book, "book").await, StatusCode::CREATED);
    assert_eq!(start_reading(&app, &token, &book, "book").await, StatusCode::CONFLICT);
    let reading = reading_ids(&app, &token).await.remove(0);
    let records_uri = format!("/v1/api/readings/{}/records", reading);

    let mut record_ids = Vec::new();
    for progress in ["ch.3", "ch.5"] {
        let (status, body) = send(
            &app,
            Method::POST,
            &records_uri,
            Some(&token),
            Some(json!({ "progress": progress })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        record_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (_, body) = send(&app, Method::GET, &records_uri, Some(&token), None).await;
    let progress: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["progress"].as_str().unwrap())
        .collect();
    assert_eq!(progress, vec!["ch.3", "ch.5"]);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{}/{}", records_uri, record_ids[0]),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, &records_uri, Some(&token), None).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["progress"], json!("ch.5"));

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("{}/{}", records_uri, record_ids[0]),
        Some(&token),
        Some(json!({ "progress": "ch.4" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn readings_of_other_users_are_forbidden() {
    let app = app();
    let owner = signup(&app, "owner").await;
    let other = signup(&app, "other").await;
    let book = create_book(&app, &owner, "Dune").await;
    start_reading(&app, &owner, &book, "book").await;
    let reading = reading_ids(&app, &owner).await.remove(0);
    let uri = format!("/v1/api/readings/{}", reading);

    let (status, _) = send(&app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&other),
        Some(json!({ "document_id": book, "reading_type": "book", "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(body["data"]["status"], json!("ongoing"));
}

#[tokio::test]
async fn unknown_reading_type_is_a_bad_request() {
    let app = app();
    let token = signup(&app, "ana").await;
    let book = create_book(&app, &token, "Dune").await;

    assert_eq!(start_reading(&app, &token, &book, "article").await, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        Method::GET,
        "/v1/api/readings/by-type?type=article",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/api/readings/by-status?status=paused",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], json!([]));
}

#[tokio::test]
async fn readings_are_paginated_without_gaps() {
    let app = app();
    let token = signup(&app, "ana").await;
    for i in 0..15 {
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/api/custom-documents",
            Some(&token),
            Some(json!({ "title": format!("Essay {}", i) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let doc = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(
            start_reading(&app, &token, &doc, "custom_document").await,
            StatusCode::CREATED
        );
    }

    let mut seen = Vec::new();
    for (page, expected) in [(1, 10), (2, 5)] {
        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/v1/api/readings?page={}&limit=10", page),
            Some(&token),
            None,
        )
        .await;
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), expected);
        assert_eq!(body["data"]["total"], json!(15));
        seen.extend(items.iter().map(|r| r["id"].as_str().unwrap().to_string()));
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 15);
}

#[tokio::test]
async fn reading_list_membership() {
    let app = app();
    let token = signup(&app, "ana").await;
    let book = create_book(&app, &token, "Dune").await;
    start_reading(&app, &token, &book, "book").await;
    let reading = reading_ids(&app, &token).await.remove(0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/api/reading-lists",
        Some(&token),
        Some(json!({ "name": "Favourites" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let list = body["data"]["id"].as_str().unwrap().to_string();
    let add_uri = format!("/v1/api/reading-lists/{}/add-readings", list);
    let remove_uri = format!("/v1/api/reading-lists/{}/remove-readings", list);
    let ids = json!({ "reading_ids": [reading] });

    let (_, body) = send(&app, Method::PUT, &add_uri, Some(&token), Some(ids.clone())).await;
    assert_eq!(body["data"]["changed"], json!(1));
    let (status, body) = send(&app, Method::PUT, &add_uri, Some(&token), Some(ids.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], json!(0));
    assert_eq!(body["message"], json!("No Changes Made To Reading List"));

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/v1/api/reading-lists/{}", list),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["reading_ids"], json!([reading]));

    let (_, body) = send(&app, Method::PUT, &remove_uri, Some(&token), Some(ids.clone())).await;
    assert_eq!(body["data"]["changed"], json!(1));
    let (status, body) = send(&app, Method::PUT, &remove_uri, Some(&token), Some(ids)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], json!(0));

    let other = signup(&app, "other").await;
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/v1/api/reading-lists/{}", list),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn custom_document_patch_keeps_other_fields() {
    let app = app();
    let token = signup(&app, "ana").await;
    let (_, body) = send(
        &app,
        Method::POST,
        "/v1/api/custom-documents",
        Some(&token),
        Some(json!({ "title": "Draft", "author": "Ana", "tags": ["essay"] })),
    )
    .await;
    let uri = format!("/v1/api/custom-documents/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "title": "Final" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(body["data"]["title"], json!("Final"));
    assert_eq!(body["data"]["author"], json!("Ana"));
    assert_eq!(body["data"]["tags"], json!(["essay"]));
}

#[tokio::test]
async fn catalog_lookups_by_name_author_and_isbn() {
    let app = app();
    let token = signup(&app, "ana").await;
    for (name, isbn) in [("Dune", "9780441013593"), ("Dune Messiah", "9780593098233")] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/api/books",
            Some(&token),
            Some(json!({ "name": name, "author": "Frank Herbert", "isbn": isbn, "genres": ["Sci-Fi"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    create_book(&app, &token, "Solaris").await;

    let (status, body) = send(&app, Method::GET, "/v1/api/books/by-name/dun", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(2));
    assert_eq!(body["data"]["items"][0]["name"], json!("Dune"));

    let (_, body) = send(&app, Method::GET, "/v1/api/books/by-genre/sci-fi?limit=1", None, None).await;
    assert_eq!(body["data"]["total"], json!(2));
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/v1/api/books/by-isbn/9780593098233", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], json!("Dune Messiah"));

    let (status, body) = send(&app, Method::GET, "/v1/api/books/by-isbn/0000000000", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(&app, Method::GET, "/v1/api/mangas/by-demography/seinen", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(0));
}

#[tokio::test]
async fn malformed_input_answers_with_the_error_envelope() {
    let app = app();
    let token = signup(&app, "ana").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/api/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!(400));

    let (status, body) = send(&app, Method::GET, "/v1/api/readings?page=abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!(400));

    let (status, body) = send(&app, Method::GET, "/v1/api/readings/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}
