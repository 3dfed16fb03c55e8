mod common;

use axum::http::StatusCode;
use common::{Account, TestApp};
use serde_json::{json, Value};

fn review_body(session_id: &Value, rating: i64) -> Value {
    json!({
        "sessionId": session_id,
        "rating": rating,
        "qualityRating": 5,
        "professionalismRating": 4,
        "comment": "Fotos lindas!"
    })
}

async fn booked(app: &TestApp, photographer: &Account, client: &Account) -> Value {
    let (status, session) = app
        .post(
            "/api/sessions",
            Some(&client.token),
            json!({ "title": "Ensaio de casal", "photographerId": photographer.id, "date": "2026-09-12T16:00" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{session}");
    session
}

async fn set_status(app: &TestApp, photographer: &Account, session: &Value, status: &str) {
    let (code, body) = app
        .patch(
            &format!("/api/sessions/{}", session["id"]),
            Some(&photographer.token),
            json!({ "status": status }),
        )
        .await;
    assert_eq!(code, StatusCode::OK, "{body}");
    assert_eq!(body["status"], status);
}

#[tokio::test]
async fn only_completed_sessions_can_be_reviewed_once() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let client = app.client("cliente@example.com").await;
    let session = booked(&app, &photographer, &client).await;

    let (status, body) = app
        .post("/api/reviews", Some(&client.token), review_body(&session["id"], 5))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    set_status(&app, &photographer, &session, "confirmed").await;
    set_status(&app, &photographer, &session, "completed").await;

    let (status, review) = app
        .post("/api/reviews", Some(&client.token), review_body(&session["id"], 5))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{review}");
    assert_eq!(review["photographerId"], photographer.id);
    assert_eq!(review["clientId"], client.id);

    let (status, _) = app
        .post("/api/reviews", Some(&client.token), review_body(&session["id"], 4))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Reviewed sessions stay put.
    let (status, _) = app
        .delete(&format!("/api/sessions/{}", session["id"]), Some(&photographer.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reviewers_must_be_the_sessions_client() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let client = app.client("cliente@example.com").await;
    let stranger = app.client("estranho@example.com").await;
    let session = booked(&app, &photographer, &client).await;
    set_status(&app, &photographer, &session, "confirmed").await;
    set_status(&app, &photographer, &session, "completed").await;

    let (status, body) = app
        .post("/api/reviews", Some(&stranger.token), review_body(&session["id"], 5))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    let (status, _) = app
        .post("/api/reviews", Some(&photographer.token), review_body(&session["id"], 5))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post("/api/reviews", Some(&client.token), review_body(&json!(4040), 5))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/api/reviews", Some(&client.token), review_body(&session["id"], 6))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn photographer_reviews_carry_a_summary() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let first = app.client("primeira@example.com").await;
    let second = app.client("segunda@example.com").await;

    for (client, rating) in [(&first, 5), (&second, 3)] {
        let session = booked(&app, &photographer, client).await;
        set_status(&app, &photographer, &session, "confirmed").await;
        set_status(&app, &photographer, &session, "completed").await;
        let (status, _) = app
            .post("/api/reviews", Some(&client.token), review_body(&session["id"], rating))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .get(&format!("/api/photographers/{}/reviews", photographer.id), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["summary"]["count"], 2);
    assert_eq!(body["summary"]["average"], 4.0);
    assert_eq!(body["summary"]["quality"], 5.0);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);

    let (status, _) = app.get(&format!("/api/photographers/{}/reviews", first.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
