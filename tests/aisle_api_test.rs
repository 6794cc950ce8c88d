mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn aisle_with_medicines_cannot_be_deleted() {
    let app = TestApp::new().await;
    let aisle_id = app.create_aisle("Dermatologie").await;
    let medicine_id = app.create_medicine(aisle_id, "Biafine").await;

    let blocked = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/aisles/{}", aisle_id), None)
        .await;
    assert_eq!(blocked.status, StatusCode::CONFLICT);
    assert_eq!(blocked.body["code"], "aisle_contains_medicines");

    let listed = app
        .request_authenticated(Method::GET, "/api/v1/aisles", None)
        .await;
    assert_eq!(listed.body["data"][0]["medicineCount"], 1);

    let removed = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/medicines/{}", medicine_id),
            None,
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);

    let deleted = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/aisles/{}", aisle_id), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK, "{}", deleted.body);

    let history = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/history?aisleId={}", aisle_id),
            None,
        )
        .await;
    assert_eq!(history.body["data"][0]["action"], "Suppression rayon");
}

#[tokio::test]
async fn aisle_names_are_unique_per_user() {
    let app = TestApp::new().await;
    app.create_aisle("Ophtalmologie").await;

    let duplicate = app
        .request_authenticated(
            Method::POST,
            "/api/v1/aisles",
            Some(json!({
                "name": "  ophtalmologie ",
                "colorHex": "#2196F3",
                "icon": "pills",
            })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["code"], "duplicate_aisle_name");

    let other_user = app.token_for("user-2");
    let allowed = app
        .request(
            Method::POST,
            "/api/v1/aisles",
            Some(json!({
                "name": "Ophtalmologie",
                "colorHex": "#2196F3",
                "icon": "pills",
            })),
            Some(&other_user),
        )
        .await;
    assert_eq!(allowed.status, StatusCode::CREATED, "{}", allowed.body);
}

#[tokio::test]
async fn aisle_colour_and_icon_are_checked() {
    let app = TestApp::new().await;

    let bad_colour = app
        .request_authenticated(
            Method::POST,
            "/api/v1/aisles",
            Some(json!({ "name": "Urgences", "colorHex": "red", "icon": "pills" })),
        )
        .await;
    assert_eq!(bad_colour.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_colour.body["code"], "invalid_color_format");

    let bad_icon = app
        .request_authenticated(
            Method::POST,
            "/api/v1/aisles",
            Some(json!({ "name": "Urgences", "colorHex": "#FF0000", "icon": "rocket" })),
        )
        .await;
    assert_eq!(bad_icon.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_icon.body["code"], "invalid_icon");
}

#[tokio::test]
async fn created_aisle_reads_back_unchanged() {
    let app = TestApp::new().await;

    let created = app
        .request_authenticated(
            Method::POST,
            "/api/v1/aisles",
            Some(json!({
                "name": "Pédiatrie",
                "description": "Sirops et suppositoires enfants",
                "colorHex": "#FF9800",
                "icon": "heart.fill",
            })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let aisle_id = common::data_id(&created.body);

    let fetched = app
        .request_authenticated(Method::GET, &format!("/api/v1/aisles/{}", aisle_id), None)
        .await;
    assert_eq!(fetched.status, StatusCode::OK, "{}", fetched.body);

    let saved = created.body["data"].as_object().expect("created aisle");
    for (field, value) in saved {
        assert_eq!(&fetched.body["data"][field], value, "field {} differs", field);
    }
    assert_eq!(saved["description"], "Sirops et suppositoires enfants");
    assert_eq!(saved["colorHex"], "#FF9800");
    assert_eq!(fetched.body["data"]["medicineCount"], 0);
}
