use bson::{doc, oid::ObjectId};
use crewhub_db::models::Notification;
use serde_json::Value;

use crate::fixtures::TestApp;
use crate::fixtures::seed;

async fn notification_count(app: &TestApp) -> u64 {
    app.db
        .collection::<Notification>(Notification::COLLECTION)
        .count_documents(doc! {})
        .await
        .unwrap()
}

async fn send_to_user(app: &TestApp, user_id: ObjectId, title: &str) -> String {
    let resp = app
        .client
        .post(app.url("/api/notifications/send"))
        .json(&serde_json::json!({
            "user_id": user_id.to_hex(),
            "title": title,
            "body": "Test body",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["created"], true);
    json["notification"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn send_to_role_writes_one_shared_document() {
    let app = TestApp::spawn().await;
    let admin_a = seed::seed_admin(&app.db, "a@role.test").await;
    let admin_b = seed::seed_admin(&app.db, "b@role.test").await;
    seed::seed_user(&app.db, "Dev", "One", "dev@role.test", "Developer").await;

    let resp = app
        .client
        .post(app.url("/api/notifications/send"))
        .json(&serde_json::json!({
            "role": "Admin",
            "title": "Maintenance window",
            "body": "Servers restart at 22:00 UTC.",
            "kind": "warning",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["created"], true);

    let receivers = json["notification"]["receivers"].as_array().unwrap();
    assert_eq!(receivers.len(), 2);
    for admin in [&admin_a, &admin_b] {
        let hex = admin.id.unwrap().to_hex();
        assert!(receivers.iter().any(|r| r == hex.as_str()));
    }

    assert_eq!(notification_count(&app).await, 1);
}

#[tokio::test]
async fn send_to_unknown_role_is_a_silent_noop() {
    let app = TestApp::spawn().await;
    seed::seed_user(&app.db, "Dev", "One", "dev@noop.test", "Developer").await;

    let resp = app
        .client
        .post(app.url("/api/notifications/send"))
        .json(&serde_json::json!({
            "role": "Ghost",
            "title": "Nobody home",
            "body": "This should go nowhere.",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["created"], false);
    assert!(json["notification"].is_null());
    assert_eq!(notification_count(&app).await, 0);
}

#[tokio::test]
async fn send_without_a_target_is_rejected() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/notifications/send"))
        .json(&serde_json::json!({
            "title": "No target",
            "body": "Missing role, user_id and email.",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn send_by_email_matches_case_insensitively() {
    let app = TestApp::spawn().await;
    let user = seed::seed_user(&app.db, "Mira", "Stone", "Mira.Stone@example.com", "Manager").await;

    let resp = app
        .client
        .post(app.url("/api/notifications/send"))
        .json(&serde_json::json!({
            "email": "mira.stone@example.com",
            "title": "Direct note",
            "body": "Sent by lowercase email.",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["created"], true);
    let receivers = json["notification"]["receivers"].as_array().unwrap();
    assert_eq!(receivers.len(), 1);
    assert_eq!(receivers[0], user.id.unwrap().to_hex());
}

#[tokio::test]
async fn project_team_endpoint_reaches_manager_and_developers() {
    let app = TestApp::spawn().await;
    let manager = seed::seed_user(&app.db, "Mara", "Lead", "mara@team.test", "Manager").await;
    let dev_a = seed::seed_user(&app.db, "Devon", "One", "d1@team.test", "Developer").await;
    let dev_b = seed::seed_user(&app.db, "Devi", "Two", "d2@team.test", "Developer").await;
    let project = seed::seed_project(
        &app.db,
        manager.id,
        vec![dev_a.id.unwrap(), dev_b.id.unwrap()],
        None,
    )
    .await;

    let resp = app
        .client
        .post(app.url(&format!(
            "/api/notifications/project/{}",
            project.id.unwrap().to_hex()
        )))
        .json(&serde_json::json!({
            "title": "Standup moved",
            "body": "Standup is at 10:30 today.",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["created"], true);
    assert_eq!(
        json["notification"]["receivers"].as_array().unwrap().len(),
        3
    );
    assert_eq!(notification_count(&app).await, 1);
}

#[tokio::test]
async fn inbox_lists_newest_first_with_read_state() {
    let app = TestApp::spawn().await;
    let user = seed::seed_user(&app.db, "Ines", "Reader", "ines@inbox.test", "Manager").await;
    let user_id = user.id.unwrap();

    send_to_user(&app, user_id, "First").await;
    send_to_user(&app, user_id, "Second").await;

    let resp = app
        .client
        .get(app.url(&format!("/api/notifications/user/{}", user_id.to_hex())))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 2);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Second");
    assert_eq!(items[1]["title"], "First");
    assert_eq!(items[0]["is_read"], false);
    assert_eq!(items[1]["is_read"], false);
}

#[tokio::test]
async fn inbox_tolerates_zero_paging_params() {
    let app = TestApp::spawn().await;
    let user = seed::seed_user(&app.db, "Page", "Zero", "page@zero.test", "Developer").await;
    let user_id = user.id.unwrap();
    send_to_user(&app, user_id, "Only one").await;

    let resp = app
        .client
        .get(app.url(&format!(
            "/api/notifications/user/{}?page=0&per_page=0",
            user_id.to_hex()
        )))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["page"], 1);
    assert_eq!(json["per_page"], 1);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mark_as_read_is_idempotent() {
    let app = TestApp::spawn().await;
    let user = seed::seed_user(&app.db, "Rene", "Reader", "rene@read.test", "Developer").await;
    let user_id = user.id.unwrap();
    let notification_id = send_to_user(&app, user_id, "Read me").await;

    let url = app.url(&format!("/api/notifications/{notification_id}/read"));
    let body = serde_json::json!({ "user_id": user_id.to_hex() });

    let resp = app.client.patch(&url).json(&body).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["updated"], true);

    // Repeat call changes nothing.
    let resp = app.client.patch(&url).json(&body).send().await.unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["updated"], false);

    let stored = app
        .db
        .collection::<Notification>(Notification::COLLECTION)
        .find_one(doc! { "_id": ObjectId::parse_str(&notification_id).unwrap() })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.is_read_by, vec![user_id]);
}

#[tokio::test]
async fn only_receivers_can_mark_as_read() {
    let app = TestApp::spawn().await;
    let user = seed::seed_user(&app.db, "Owen", "Owner", "owen@acl.test", "Developer").await;
    let outsider = seed::seed_user(&app.db, "Olga", "Other", "olga@acl.test", "Developer").await;
    let notification_id = send_to_user(&app, user.id.unwrap(), "Private").await;

    let resp = app
        .client
        .patch(app.url(&format!("/api/notifications/{notification_id}/read")))
        .json(&serde_json::json!({ "user_id": outsider.id.unwrap().to_hex() }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["updated"], false);

    let stored = app
        .db
        .collection::<Notification>(Notification::COLLECTION)
        .find_one(doc! { "_id": ObjectId::parse_str(&notification_id).unwrap() })
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_read_by.is_empty());
}

#[tokio::test]
async fn mark_all_as_read_clears_the_inbox() {
    let app = TestApp::spawn().await;
    let user = seed::seed_user(&app.db, "Mass", "Reader", "mass@read.test", "Manager").await;
    let user_id = user.id.unwrap();

    for title in ["One", "Two", "Three"] {
        send_to_user(&app, user_id, title).await;
    }

    let resp = app
        .client
        .patch(app.url("/api/notifications/read-all"))
        .json(&serde_json::json!({ "user_id": user_id.to_hex() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["updated"], 3);

    // Already read: nothing left to modify.
    let resp = app
        .client
        .patch(app.url("/api/notifications/read-all"))
        .json(&serde_json::json!({ "user_id": user_id.to_hex() }))
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["updated"], 0);

    let resp = app
        .client
        .get(app.url(&format!("/api/notifications/user/{}", user_id.to_hex())))
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    for item in json["items"].as_array().unwrap() {
        assert_eq!(item["is_read"], true);
    }
}
