mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn booking_a_service_priced_in_reais_stores_cents() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let client = app.client("cliente@example.com").await;

    let (status, service) = app
        .post(
            "/api/services",
            Some(&photographer.token),
            json!({
                "name": "Ensaio externo",
                "price": { "amount": 150.00, "unit": "major" },
                "duration": 90,
                "maxPhotos": 40
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{service}");
    assert_eq!(service["price"], 15000);

    let (status, session) = app
        .post(
            "/api/sessions",
            Some(&client.token),
            json!({
                "photographerId": photographer.id.to_string(),
                "serviceId": service["id"],
                "date": "2026-11-03T14:00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{session}");
    assert_eq!(session["totalPrice"], 15000);
    assert_eq!(session["status"], "pending");
    assert_eq!(session["paymentStatus"], "pending");
    assert_eq!(session["clientId"], client.id);
    assert_eq!(session["title"], "Ensaio externo");
    assert_eq!(session["duration"], 90);
    assert_eq!(session["photosIncluded"], 40);
}

#[tokio::test]
async fn legacy_bare_prices_still_use_the_heuristic() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let client = app.client("cliente@example.com").await;

    let (status, session) = app
        .post(
            "/api/sessions",
            Some(&photographer.token),
            json!({
                "title": "Casamento",
                "clientId": client.id,
                "date": "2026-11-03",
                "totalPrice": 150.5,
                "amountPaid": 5000
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{session}");
    assert_eq!(session["totalPrice"], 15050);
    assert_eq!(session["amountPaid"], 5000);
    assert_eq!(session["status"], "confirmed");
}

#[tokio::test]
async fn client_patches_cannot_rename_a_session() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let client = app.client("cliente@example.com").await;

    let (_, session) = app
        .post(
            "/api/sessions",
            Some(&client.token),
            json!({
                "title": "Ensaio de gestante",
                "photographerId": photographer.id,
                "date": "2026-11-03T14:00:00Z"
            }),
        )
        .await;
    let uri = format!("/api/sessions/{}", session["id"]);

    let (status, updated) = app
        .patch(
            &uri,
            Some(&client.token),
            json!({ "title": "Outro nome", "status": "completed", "paymentStatus": "paid", "amountPaid": 20000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["title"], "Ensaio de gestante");
    assert_eq!(updated["status"], "pending");
    assert_eq!(updated["paymentStatus"], "paid");
    assert_eq!(updated["amountPaid"], 20000);

    let (_, stored) = app.get(&uri, Some(&photographer.token)).await;
    assert_eq!(stored["title"], "Ensaio de gestante");
}

#[tokio::test]
async fn photographer_drives_the_status_machine() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let client = app.client("cliente@example.com").await;

    let (_, session) = app
        .post(
            "/api/sessions",
            Some(&client.token),
            json!({ "title": "Retrato", "photographerId": photographer.id, "date": "2026-11-03" }),
        )
        .await;
    let uri = format!("/api/sessions/{}", session["id"]);

    let (status, body) = app
        .patch(&uri, Some(&photographer.token), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = app
        .patch(&uri, Some(&photographer.token), json!({ "status": "confirmed", "title": "Retrato corporativo" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["title"], "Retrato corporativo");

    let (status, body) = app
        .patch(&uri, Some(&photographer.token), json!({ "status": "canceled" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "canceled");

    let (status, _) = app
        .patch(&uri, Some(&photographer.token), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn permissions_and_missing_sessions() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let other_photographer = app.photographer("outra@example.com").await;
    let client = app.client("cliente@example.com").await;
    let outsider = app.client("intruso@example.com").await;

    let (status, body) = app
        .post(
            "/api/sessions",
            Some(&photographer.token),
            json!({
                "title": "Casamento",
                "photographerId": other_photographer.id,
                "clientId": client.id,
                "date": "2026-11-03"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    let (_, session) = app
        .post(
            "/api/sessions",
            Some(&client.token),
            json!({ "title": "Retrato", "photographerId": photographer.id, "date": "2026-11-03" }),
        )
        .await;
    let uri = format!("/api/sessions/{}", session["id"]);

    let (status, _) = app
        .patch(&uri, Some(&outsider.token), json!({ "amountPaid": 100 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&uri, Some(&outsider.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch("/api/sessions/9999", Some(&client.token), json!({ "amountPaid": 100 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = app.delete(&uri, Some(&client.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, Some(&photographer.token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, Some(&photographer.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_is_scoped_to_the_requester() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let client = app.client("cliente@example.com").await;
    let other_client = app.client("outro@example.com").await;

    for date in ["2026-11-03", "2026-12-10"] {
        let (status, _) = app
            .post(
                "/api/sessions",
                Some(&client.token),
                json!({ "title": "Retrato", "photographerId": photographer.id, "date": date }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, mine) = app.get("/api/sessions", Some(&client.token)).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
    // Newest first.
    assert!(mine[0]["date"].as_str().unwrap().starts_with("2026-12-10"));

    let (_, theirs) = app.get("/api/sessions", Some(&other_client.token)).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let (_, december) = app
        .get("/api/sessions?from=2026-12-01&status=pending", Some(&photographer.token))
        .await;
    assert_eq!(december.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn requests_are_validated_at_the_boundary() {
    let app = TestApp::new();
    let photographer = app.photographer("foto@example.com").await;
    let client = app.client("cliente@example.com").await;

    let (status, body) = app.get("/api/sessions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_failed");

    let (status, _) = app.get("/api/sessions", Some("token-nobody@example.com")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(
            "/api/sessions",
            Some(&client.token),
            json!({ "photographerId": photographer.id, "date": "2026-11-03" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("title"));

    let (status, body) = app
        .post(
            "/api/sessions",
            Some(&client.token),
            json!({ "title": "Retrato", "photographerId": photographer.id, "date": "amanhã" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = app
        .post(
            "/api/sessions",
            Some(&client.token),
            json!({ "title": "Retrato", "photographerId": photographer.id, "date": "2026-11-03", "status": "done" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
