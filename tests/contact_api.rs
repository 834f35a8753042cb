#[path = "common.rs"]
mod common;

use common::{RecordingMailer, TestServer};
use serde_json::{json, Value};

async fn post_contact(server: &TestServer, body: Value) -> (u16, Value) {
    let res = server
        .client
        .post(server.url("/api/contact"))
        .json(&body)
        .send()
        .await
        .unwrap();
    (res.status().as_u16(), res.json().await.unwrap())
}

#[tokio::test]
async fn valid_submission_is_relayed() {
    let server = TestServer::start().await;

    let (status, body) = post_contact(
        &server,
        json!({ "name": "Ada", "email": "ada@example.com", "message": "When does the course start?" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email sent successfully");

    let sent = server.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Contact Form Submission from Ada");
    assert_eq!(sent[0].reply_to, "ada@example.com");
    assert!(sent[0].body.contains("Message: When does the course start?"));
}

#[tokio::test]
async fn any_empty_field_is_rejected_without_sending() {
    let server = TestServer::start().await;

    for body in [
        json!({ "name": "", "email": "ada@example.com", "message": "hi" }),
        json!({ "name": "Ada", "email": "   ", "message": "hi" }),
        json!({ "name": "Ada", "email": "ada@example.com" }),
    ] {
        let (status, resp) = post_contact(&server, body).await;
        assert_eq!(status, 400);
        assert_eq!(resp["error"], "All fields are required");
    }

    assert!(server.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_address_is_rejected() {
    let server = TestServer::start().await;

    let (status, body) = post_contact(
        &server,
        json!({ "name": "Ada", "email": "ada.example.com", "message": "hi" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid email format");
    assert!(server.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn relay_failure_is_a_server_error() {
    let server = TestServer::start_with_mailer(RecordingMailer {
        fail: true,
        ..RecordingMailer::default()
    })
    .await;

    let (status, body) = post_contact(
        &server,
        json!({ "name": "Ada", "email": "ada@example.com", "message": "hi" }),
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to send email");
}
