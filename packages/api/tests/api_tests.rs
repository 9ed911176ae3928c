// ABOUTME: Integration tests driving the full router with oneshot requests
// ABOUTME: Covers status codes, envelopes, actor enforcement, and error bodies

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use compass_storage::DbState;

async fn test_app() -> Router {
    let db = DbState::connect_memory().await.unwrap();
    compass_api::create_app(db)
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-compass-actor", "alice")
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn solution_payload(name: &str) -> Value {
    json!({
        "name": name,
        "description": "A solution",
        "category": "Infrastructure",
        "radar_status": "ADOPT",
        "department": "Platform",
        "team": "Runtime",
        "tags": ["containers"]
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let response = app
        .oneshot(request("GET", "/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_create_solution_and_fetch() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/solutions/",
            Some(solution_payload("Docker Engine")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["slug"], "docker-engine");
    assert_eq!(created["radar_status"], "ADOPT");
    assert_eq!(created["created_by"], "alice");

    let response = app
        .oneshot(request("GET", "/api/solutions/docker-engine", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["name"], "Docker Engine");
}

#[tokio::test]
async fn test_mutation_without_actor_is_unauthorized() {
    let app = test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/solutions/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(solution_payload("Docker").to_string()))
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["detail"].is_string());

    // Nothing was persisted
    let response = app
        .oneshot(request("GET", "/api/solutions/", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["total"], 0);
}

#[tokio::test]
async fn test_validation_error_is_bad_request() {
    let app = test_app().await;

    let mut payload = solution_payload("Docker");
    payload["name"] = json!("   ");
    let response = app
        .oneshot(request("POST", "/api/solutions/", Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_unknown_enum_value_is_rejected() {
    let app = test_app().await;

    let mut payload = solution_payload("Docker");
    payload["radar_status"] = json!("adopt");
    let response = app
        .clone()
        .oneshot(request("POST", "/api/solutions/", Some(payload)))
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    let response = app
        .oneshot(request("GET", "/api/solutions/", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["total"], 0);
}

#[tokio::test]
async fn test_missing_solution_is_not_found() {
    let app = test_app().await;

    let response = app
        .oneshot(request("GET", "/api/solutions/ghost", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Solution not found");
}

#[tokio::test]
async fn test_list_envelope_and_filters() {
    let app = test_app().await;

    for name in ["Docker", "Podman", "Jenkins"] {
        let mut payload = solution_payload(name);
        if name == "Jenkins" {
            payload["department"] = json!("Delivery");
        }
        app.clone()
            .oneshot(request("POST", "/api/solutions/", Some(payload)))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(request("GET", "/api/solutions/?skip=0&limit=2&sort=name", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["skip"], 0);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["name"], "Docker");

    let response = app
        .clone()
        .oneshot(request("GET", "/api/solutions/?department=Delivery", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Jenkins");

    // Bad filter values are a validation error
    let response = app
        .oneshot(request("GET", "/api/solutions/?radar_status=adopt", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_departments_endpoint() {
    let app = test_app().await;

    let mut payload = solution_payload("Docker");
    payload["department"] = json!("Platform");
    app.clone()
        .oneshot(request("POST", "/api/solutions/", Some(payload)))
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/api/solutions/departments", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(["Platform"]));
}

#[tokio::test]
async fn test_solution_tag_add_and_remove() {
    let app = test_app().await;

    app.clone()
        .oneshot(request("POST", "/api/solutions/", Some(solution_payload("Docker"))))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("PUT", "/api/solutions/docker/tags/oci", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tags"], json!(["containers", "oci"]));

    let response = app
        .clone()
        .oneshot(request("GET", "/api/solutions/docker/tags", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!(["containers", "oci"]));

    let response = app
        .clone()
        .oneshot(request("DELETE", "/api/solutions/docker/tags/oci", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tags"], json!(["containers"]));

    // Removing a tag that is not on the solution is a 404
    let response = app
        .oneshot(request("DELETE", "/api/solutions/docker/tags/oci", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_update_with_explicit_null() {
    let app = test_app().await;

    let mut payload = solution_payload("Terraform");
    payload["version"] = json!("1.7");
    app.clone()
        .oneshot(request("POST", "/api/solutions/", Some(payload)))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/solutions/terraform",
            Some(json!({ "version": null })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["version"], Value::Null);
    assert_eq!(body["name"], "Terraform");
}

#[tokio::test]
async fn test_category_conflict_is_409() {
    let app = test_app().await;

    let payload = json!({ "name": "Languages", "radar_quadrant": 0 });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/categories/", Some(payload.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request("POST", "/api/categories/", Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("Languages"));
}

#[tokio::test]
async fn test_tag_rename_cascades_through_api() {
    let app = test_app().await;

    app.clone()
        .oneshot(request("POST", "/api/solutions/", Some(solution_payload("Docker"))))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/tags/containers",
            Some(json!({ "name": "oci" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "oci");

    let response = app
        .oneshot(request("GET", "/api/solutions/docker", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["tags"], json!(["oci"]));
}

#[tokio::test]
async fn test_tag_in_use_delete_is_409() {
    let app = test_app().await;

    app.clone()
        .oneshot(request("POST", "/api/solutions/", Some(solution_payload("Docker"))))
        .await
        .unwrap();

    let response = app
        .oneshot(request("DELETE", "/api/tags/containers", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_rating_flow() {
    let app = test_app().await;

    app.clone()
        .oneshot(request("POST", "/api/solutions/", Some(solution_payload("Redis"))))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/ratings/solution/redis",
            Some(json!({ "score": 5, "comment": "Fast" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["score"], 5);
    assert_eq!(body["username"], "alice");

    let response = app
        .clone()
        .oneshot(request("GET", "/api/ratings/solution/redis/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["score"], 5);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/ratings/solution/redis/summary", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["average"], 5.0);
    assert_eq!(body["distribution"]["5"], 1);

    // Deleting the caller's rating empties the summary
    let response = app
        .clone()
        .oneshot(request("DELETE", "/api/ratings/solution/redis/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app
        .clone()
        .oneshot(request("GET", "/api/ratings/solution/redis/summary", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["count"], 0);

    // Out-of-range score is rejected
    let response = app
        .oneshot(request(
            "PUT",
            "/api/ratings/solution/redis",
            Some(json!({ "score": 6 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_flow_hides_password() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/users/",
            Some(json!({
                "username": "bob",
                "email": "bob@example.com",
                "full_name": "Bob Doe",
                "password": "secret123"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.contains("password"));
    assert!(!text.contains("argon2"));

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/users/bob/password",
            Some(json!({
                "current_password": "secret123",
                "new_password": "evenmoresecret"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Wrong current password is a conflict
    let response = app
        .oneshot(request(
            "PUT",
            "/api/users/bob/password",
            Some(json!({
                "current_password": "secret123",
                "new_password": "again"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_radar_endpoint() {
    let app = test_app().await;

    app.clone()
        .oneshot(request("POST", "/api/solutions/", Some(solution_payload("Docker"))))
        .await
        .unwrap();
    app.clone()
        .oneshot(request(
            "PUT",
            "/api/categories/Infrastructure",
            Some(json!({ "radar_quadrant": 1 })),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/api/radar", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["label"], "Docker");
    assert_eq!(entries[0]["quadrant"], 1);
    assert_eq!(entries[0]["ring"], 1);
}

#[tokio::test]
async fn test_delete_solution_returns_no_content() {
    let app = test_app().await;

    app.clone()
        .oneshot(request("POST", "/api/solutions/", Some(solution_payload("Docker"))))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("DELETE", "/api/solutions/docker", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("DELETE", "/api/solutions/docker", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
