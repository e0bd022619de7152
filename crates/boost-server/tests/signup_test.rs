mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};
use uuid::Uuid;

fn signup(user_id: Uuid, name: &str) -> Value {
    json!({
        "userId": user_id,
        "businessName": name,
        "address": "Hauptstraße 1, 10115 Berlin",
        "googleReviewUrl": "https://g.page/r/test/review",
        "email": format!("{}@example.de", user_id.simple())
    })
}

#[tokio::test]
async fn test_slug_from_name_and_collision_suffix() {
    let app = TestApp::spawn().await;

    let first_user = Uuid::new_v4();
    let (status, first) = app
        .request(
            "POST",
            "/api/signup/create-business",
            None,
            Some(signup(first_user, "Café Rot")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["slug"], "caf-rot");

    let (status, second) = app
        .request(
            "POST",
            "/api/signup/create-business",
            None,
            Some(signup(Uuid::new_v4(), "Café Rot")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let slug = second["slug"].as_str().unwrap();
    let suffix = slug.strip_prefix("caf-rot-").unwrap();
    assert!(!suffix.is_empty());
    assert!(suffix
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_ne!(first["businessId"], second["businessId"]);

    let business_id = Uuid::parse_str(first["businessId"].as_str().unwrap()).unwrap();
    let (linked, is_super_admin): (Option<Uuid>, bool) =
        sqlx::query_as("SELECT business_id, is_super_admin FROM admins WHERE id = $1")
            .bind(first_user)
            .fetch_one(&app.db)
            .await
            .unwrap();
    assert_eq!(linked, Some(business_id));
    assert!(!is_super_admin);
}

#[tokio::test]
async fn test_missing_fields() {
    let app = TestApp::spawn().await;

    let mut body = signup(Uuid::new_v4(), "Schuhhaus Fuß");
    body["googleReviewUrl"] = Value::Null;

    let (status, body) = app
        .request("POST", "/api/signup/create-business", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Fehlende Pflichtfelder");
}

#[tokio::test]
async fn test_name_without_slug_characters() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .request(
            "POST",
            "/api/signup/create-business",
            None,
            Some(signup(Uuid::new_v4(), "☕☕☕")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_admin_link_leaves_no_business() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let name = format!("Teehaus {}", user_id.simple());

    let (status, _) = app
        .request(
            "POST",
            "/api/signup/create-business",
            None,
            Some(signup(user_id, &name)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let second_name = format!("Zweitladen {}", user_id.simple());
    let (status, _) = app
        .request(
            "POST",
            "/api/signup/create-business",
            None,
            Some(signup(user_id, &second_name)),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses WHERE name = $1")
        .bind(&second_name)
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}

#[tokio::test]
async fn test_invalid_user_id_gets_json_error() {
    let app = TestApp::spawn().await;

    let mut body = signup(Uuid::new_v4(), "Kaffeerösterei Bohne");
    body["userId"] = json!("nicht-gueltig");

    let (status, body) = app
        .request("POST", "/api/signup/create-business", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}
