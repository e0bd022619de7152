mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_public_business_lookup() {
    let app = TestApp::spawn().await;
    let (business_id, slug) = app.insert_business("Bäckerei Sommer").await;

    let (status, body) = app
        .request("GET", &format!("/api/businesses/{slug}"), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], business_id.to_string());
    assert_eq!(body["name"], "Bäckerei Sommer");
    assert!(body["googleReviewUrl"].as_str().unwrap().starts_with("https://g.page/"));
    assert!(body.get("stripe_customer_id").is_none());

    let (status, _) = app
        .request("GET", "/api/businesses/gibt-es-nicht", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_high_rating_redirects_to_google() {
    let app = TestApp::spawn().await;
    let (business_id, _) = app.insert_business("Weinbar Rebe").await;

    for rating in [4, 5] {
        let (status, body) = app
            .request(
                "POST",
                "/api/reviews",
                None,
                Some(json!({ "businessId": business_id, "rating": rating })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["review"]["redirected_to_google"], true);
        assert_eq!(
            body["redirectUrl"].as_str().unwrap(),
            format!("https://g.page/r/{}/review", business_id.simple())
        );
    }
}

#[tokio::test]
async fn test_low_rating_is_kept_private() {
    let app = TestApp::spawn().await;
    let (business_id, _) = app.insert_business("Autohaus Berg").await;

    for rating in [1, 2, 3] {
        let (status, body) = app
            .request(
                "POST",
                "/api/reviews",
                None,
                Some(json!({
                    "businessId": business_id,
                    "rating": rating,
                    "message": "Lange Wartezeit"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["review"]["redirected_to_google"], false);
        assert_eq!(body["review"]["message"], "Lange Wartezeit");
        assert!(body.get("redirectUrl").is_none());
    }
}

#[tokio::test]
async fn test_client_privacy_flag_is_ignored() {
    let app = TestApp::spawn().await;
    let (business_id, _) = app.insert_business("Kiosk Eck").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/reviews",
            None,
            Some(json!({ "businessId": business_id, "rating": 5, "isPrivate": true })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review"]["redirected_to_google"], true);
}

#[tokio::test]
async fn test_invalid_review_requests() {
    let app = TestApp::spawn().await;
    let (business_id, _) = app.insert_business("Optik Klar").await;

    for rating in [0, 6, -1] {
        let (status, _) = app
            .request(
                "POST",
                "/api/reviews",
                None,
                Some(json!({ "businessId": business_id, "rating": rating })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {rating}");
    }

    let (status, body) = app
        .request("POST", "/api/reviews", None, Some(json!({ "rating": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Fehlende Pflichtfelder");

    let (status, _) = app
        .request(
            "POST",
            "/api/reviews",
            None,
            Some(json!({ "businessId": Uuid::new_v4(), "rating": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE business_id = $1")
        .bind(business_id)
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_message_can_be_added_once() {
    let app = TestApp::spawn().await;
    let (business_id, _) = app.insert_business("Zahnarzt Weiß").await;

    let (_, created) = app
        .request(
            "POST",
            "/api/reviews",
            None,
            Some(json!({ "businessId": business_id, "rating": 2 })),
        )
        .await;
    let review_id = created["review"]["id"].as_str().unwrap().to_string();
    assert!(created["review"]["message"].is_null());

    let (status, body) = app
        .request(
            "PATCH",
            "/api/reviews",
            None,
            Some(json!({ "reviewId": review_id, "message": "Termin wurde verschoben" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review"]["message"], "Termin wurde verschoben");
    assert_eq!(body["review"]["rating"], 2);

    let (status, _) = app
        .request(
            "PATCH",
            "/api/reviews",
            None,
            Some(json!({ "reviewId": review_id, "message": "Nachtrag" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let stored: Option<String> = sqlx::query_scalar("SELECT message FROM reviews WHERE id = $1")
        .bind(Uuid::parse_str(&review_id).unwrap())
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(stored.as_deref(), Some("Termin wurde verschoben"));
}

#[tokio::test]
async fn test_message_patch_errors() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .request(
            "PATCH",
            "/api/reviews",
            None,
            Some(json!({ "reviewId": Uuid::new_v4(), "message": "Hallo" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            "PATCH",
            "/api/reviews",
            None,
            Some(json!({ "reviewId": Uuid::new_v4(), "message": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_gets_json_error() {
    let app = TestApp::spawn().await;
    let (business_id, _) = app.insert_business("Friseur Locke").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/reviews",
            None,
            Some(json!({ "businessId": business_id, "rating": 4.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["error"], "Ungültiger Request-Body");

    let (status, body) = app
        .request(
            "PATCH",
            "/api/reviews",
            None,
            Some(json!({ "reviewId": "keine-uuid", "message": "Hallo" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}
