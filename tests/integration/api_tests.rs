//! API integration tests
//!
//! Run against a live server with at least one active barber:
//! `cargo test -- --ignored`. Tokens are minted with `JWT_SECRET`.

use barbershop_server::models::{Role, UserClaims};
use chrono::{Datelike, Duration, Local, Weekday};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn token(role: Role, sub: Uuid) -> String {
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = chrono::Utc::now().timestamp();
    UserClaims {
        sub,
        role,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

/// A weekday at least two weeks out, so the slot is bookable
fn booking_date() -> String {
    let mut date = Local::now().date_naive() + Duration::days(14);
    while date.weekday() != Weekday::Tue {
        date += Duration::days(1);
    }
    date.to_string()
}

async fn first_barber(client: &Client) -> String {
    let body: Value = client
        .get(format!("{}/barbers", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body[0]["id"].as_str().expect("No active barber seeded").to_string()
}

async fn availability(client: &Client, barber_id: &str, date: &str) -> Vec<Value> {
    let body: Value = client
        .get(format!("{}/availability", BASE_URL))
        .query(&[("barber_id", barber_id), ("date", date)])
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body.as_array().expect("Expected a slot list").clone()
}

async fn free_slot(client: &Client, barber_id: &str, date: &str) -> String {
    availability(client, barber_id, date)
        .await
        .iter()
        .rev()
        .find(|s| s["is_available"] == true)
        .and_then(|s| s["time"].as_str())
        .expect("No free slot left")
        .to_string()
}

fn is_free(slots: &[Value], time: &str) -> bool {
    slots.iter().any(|s| s["time"] == time && s["is_available"] == true)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_availability_requires_barber_and_date() {
    let client = Client::new();

    let response = client
        .get(format!("{}/availability", BASE_URL))
        .query(&[("date", "2030-01-07")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
#[ignore]
async fn test_book_then_cancel_round_trip() {
    let client = Client::new();
    let barber_id = first_barber(&client).await;
    let date = booking_date();
    let time = free_slot(&client, &barber_id, &date).await;
    let client_id = Uuid::new_v4();
    let token = token(Role::Client, client_id);

    let response = client
        .post(format!("{}/appointments", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "barber_id": barber_id, "date": date, "time": time }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let booked: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(booked["client_id"], client_id.to_string());
    assert_eq!(booked["status"], "scheduled");

    assert!(!is_free(&availability(&client, &barber_id, &date).await, &time));

    let response = client
        .post(format!("{}/appointments/{}/cancel", BASE_URL, booked["id"].as_str().unwrap()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    assert!(is_free(&availability(&client, &barber_id, &date).await, &time));
}

#[tokio::test]
#[ignore]
async fn test_concurrent_bookings_single_winner() {
    let client = Client::new();
    let barber_id = first_barber(&client).await;
    let date = booking_date();
    let time = free_slot(&client, &barber_id, &date).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let client = client.clone();
        let token = token(Role::Client, Uuid::new_v4());
        let body = json!({ "barber_id": barber_id, "date": date, "time": time });
        handles.push(tokio::spawn(async move {
            client
                .post(format!("{}/appointments", BASE_URL))
                .bearer_auth(token)
                .json(&body)
                .send()
                .await
                .expect("Failed to send request")
        }));
    }

    let mut created = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        match response.status() {
            StatusCode::CREATED => created.push(response.json::<Value>().await.unwrap()),
            StatusCode::CONFLICT => {
                let body: Value = response.json().await.unwrap();
                assert!(body["message"].as_str().unwrap().contains("já está ocupado"));
                conflicts += 1;
            }
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(created.len(), 1);
    assert_eq!(conflicts, 9);

    // clean up as admin
    let admin = token(Role::Admin, Uuid::new_v4());
    let response = client
        .post(format!("{}/appointments/{}/cancel", BASE_URL, created[0]["id"].as_str().unwrap()))
        .bearer_auth(admin)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_client_cannot_book_for_someone_else() {
    let client = Client::new();
    let barber_id = first_barber(&client).await;
    let date = booking_date();

    let response = client
        .post(format!("{}/appointments", BASE_URL))
        .bearer_auth(token(Role::Client, Uuid::new_v4()))
        .json(&json!({
            "client_id": Uuid::new_v4(),
            "barber_id": barber_id,
            "date": date,
            "time": "10:00"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .post(format!("{}/appointments", BASE_URL))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/working-hours", BASE_URL))
        .bearer_auth(token(Role::Client, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_schedule_preview_reports_source() {
    let client = Client::new();
    let barber_id = first_barber(&client).await;

    let response = client
        .get(format!("{}/barbers/{}/schedule", BASE_URL, barber_id))
        .query(&[("date", booking_date())])
        .bearer_auth(token(Role::Admin, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(["barber_rules", "business_default", "fallback_template"]
        .contains(&body["source"].as_str().unwrap()));
    assert!(body["slots"].is_array());
}
