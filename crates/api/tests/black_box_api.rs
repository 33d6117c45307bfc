use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use festflow_api::Config;
use festflow_api::app::{router, services::AppServices};
use festflow_auth::{JwtClaims, Passwords, Role, SessionClaims};
use festflow_core::{ClubId, SystemClock, UserId};
use festflow_infra::{LogNotifier, Stores};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let services = AppServices::new(
            &Config::in_memory(SECRET),
            Stores::in_memory(),
            Passwords::low_cost(),
            Arc::new(LogNotifier),
            Arc::new(SystemClock),
        );
        let app = router(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(role: Role, club_id: Option<ClubId>, must_change_password: bool) -> String {
    let now = Utc::now();
    let session = SessionClaims {
        user_id: UserId::new(),
        role,
        club_id,
        must_change_password,
    };
    let claims = JwtClaims::new(&session, now, ChronoDuration::minutes(10));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn set_cookie(res: &reqwest::Response) -> String {
    res.headers()
        .get(header::SET_COOKIE)
        .expect("missing set-cookie")
        .to_str()
        .unwrap()
        .to_string()
}

async fn sign_up_and_login(client: &reqwest::Client, srv: &TestServer, email: &str) -> (String, String) {
    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "name": "Asha", "email": email, "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: Value = res.json().await.unwrap();

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": email, "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();

    (
        user["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/auth/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_token_is_rejected_and_cookie_cleared() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/auth/me"))
        .header(header::COOKIE, "token=garbage")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&res).contains("Max-Age=0"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn register_login_and_cookie_session() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "name": "Asha", "email": "Asha@Example.com", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: Value = res.json().await.unwrap();
    assert_eq!(user["role"], "USER");
    assert_eq!(user["email"], "asha@example.com");
    assert!(user.get("passwordHash").is_none());

    // Same email, different case.
    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "name": "Other", "email": "ASHA@example.com", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "asha@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "asha@example.com", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = set_cookie(&res);
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    let session_cookie = cookie.split(';').next().unwrap().to_string();

    let res = client
        .get(srv.url("/auth/me"))
        .header(header::COOKIE, session_cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["userId"], user["id"]);
    assert_eq!(me["role"], "USER");

    let res = client.post(srv.url("/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(set_cookie(&res).contains("Max-Age=0"));
}

#[tokio::test]
async fn temporary_password_gates_everything_but_the_change_flow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(Role::COORDINATOR, Some(ClubId::new()), true);

    let res = client
        .get(srv.url("/events/mine"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "password_change_required");

    let res = client
        .get(srv.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn superadmin_routes_are_forbidden_to_attendees() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(Role::USER, None, false);

    let res = client
        .get(srv.url("/superadmin/clubs"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn club_to_check_in_end_to_end() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(Role::SUPER_ADMIN, None, false);

    // Club + coordinator.
    let res = client
        .post(srv.url("/superadmin/clubs"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Robotics", "description": "Bots" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let club: Value = res.json().await.unwrap();
    let club_id = club["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url("/superadmin/coordinators"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Ravi", "email": "ravi@example.com", "clubId": club_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["coordinator"]["role"], "COORDINATOR");
    assert_eq!(created["coordinator"]["mustChangePassword"], true);
    let temporary = created["temporaryPassword"].as_str().unwrap().to_string();

    // First login must replace the temporary password.
    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "ravi@example.com", "password": temporary }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["claims"]["mustChangePassword"], true);
    let temp_token = body["token"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url("/auth/change-password"))
        .bearer_auth(&temp_token)
        .json(&json!({
            "currentPassword": temporary,
            "newPassword": "robotics-2025",
            "confirmPassword": "robotics-2025",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["claims"]["mustChangePassword"], false);
    let coordinator = body["token"].as_str().unwrap().to_string();

    // Event.
    let res = client
        .post(srv.url("/events"))
        .bearer_auth(&coordinator)
        .json(&json!({
            "title": "Robo Wars",
            "description": "Arena battle",
            "date": "2099-03-20",
            "festType": "Nimbus",
            "registrationDeadline": "2099-03-10T18:00:00Z",
            "maxSeats": 1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let event: Value = res.json().await.unwrap();
    assert_eq!(event["clubId"], club_id.as_str());
    let event_id = event["id"].as_str().unwrap().to_string();

    // Registration.
    let client_a = reqwest::Client::new();
    let (attendee_id, attendee) = sign_up_and_login(&client_a, &srv, "asha@example.com").await;
    let (_, late) = sign_up_and_login(&client_a, &srv, "bo@example.com").await;

    let register = |token: String| {
        let client = client.clone();
        let url = srv.url(&format!("/events/{event_id}/register"));
        async move { client.post(url).bearer_auth(token).send().await.unwrap() }
    };

    let res = register(attendee.clone()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = register(attendee.clone()).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "already_registered");

    let res = register(late).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "seats_exhausted");

    let res = register(coordinator.clone()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Check-in.
    let check_in = |user_id: String| {
        let client = client.clone();
        let url = srv.url(&format!("/events/{event_id}/check-in"));
        let token = coordinator.clone();
        async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&json!({ "userId": user_id }))
                .send()
                .await
                .unwrap()
        }
    };

    let res = check_in(UserId::new().to_string()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_registered");

    let res = check_in(attendee_id.clone()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = check_in(attendee_id.clone()).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "already_checked_in");

    let res = client
        .get(srv.url(&format!("/events/{event_id}/registrations")))
        .bearer_auth(&coordinator)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], attendee_id.as_str());
    assert_eq!(items[0]["checkedIn"], true);

    let res = client
        .get(srv.url(&format!("/events/{event_id}/registrations")))
        .bearer_auth(&attendee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Public listing, no token.
    let res = client.get(srv.url("/events")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["clubName"], "Robotics");
    assert!(items[0].get("registrations").is_none());
    assert!(items[0].get("checkedInUsers").is_none());

    let res = client
        .get(srv.url("/events"))
        .query(&[("festType", "Hill'ffair")])
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let res = client
        .get(srv.url("/events"))
        .query(&[("clubName", "robo"), ("view", "upcoming")])
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url("/events"))
        .query(&[("festType", "Diwali")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url(&format!("/events/{event_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], "Robo Wars");
    assert!(body.get("registrations").is_none());
}

#[tokio::test]
async fn coordinator_cannot_touch_another_clubs_event() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(Role::SUPER_ADMIN, None, false);

    let mut club_ids = Vec::new();
    for name in ["Drama", "Music"] {
        let res = client
            .post(srv.url("/superadmin/clubs"))
            .bearer_auth(&admin)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let club: Value = res.json().await.unwrap();
        club_ids.push(club["id"].as_str().unwrap().parse::<ClubId>().unwrap());
    }

    // Admin creates the event for an explicit club.
    let res = client
        .post(srv.url("/events"))
        .bearer_auth(&admin)
        .json(&json!({
            "title": "Street Play",
            "date": "2099-04-01",
            "festType": "Hill'ffair",
            "registrationDeadline": "2099-03-25T12:00",
            "clubId": club_ids[0].to_string(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let event: Value = res.json().await.unwrap();
    let event_id = event["id"].as_str().unwrap().to_string();

    let outsider = mint_jwt(Role::COORDINATOR, Some(club_ids[1]), false);
    let res = client
        .put(srv.url(&format!("/events/{event_id}")))
        .bearer_auth(&outsider)
        .json(&json!({
            "title": "Hijacked",
            "date": "2099-04-01",
            "festType": "Hill'ffair",
            "registrationDeadline": "2099-03-25T12:00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(srv.url(&format!("/events/{event_id}")))
        .bearer_auth(&admin)
        .json(&json!({
            "title": "Street Play",
            "description": "Reviewed",
            "date": "2099-04-01",
            "festType": "Hill'ffair",
            "registrationDeadline": "2099-03-25T12:00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["description"], "Reviewed");

    let res = client
        .get(srv.url("/events/mine"))
        .bearer_auth(&outsider)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let owner = mint_jwt(Role::COORDINATOR, Some(club_ids[0]), false);
    let res = client
        .put(srv.url(&format!("/events/{event_id}")))
        .bearer_auth(&owner)
        .json(&json!({
            "title": "Street Play (Finals)",
            "date": "2099-04-02",
            "festType": "Hill'ffair",
            "registrationDeadline": "2099-03-25T12:00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], "Street Play (Finals)");
    assert_eq!(body["clubId"], club_ids[0].to_string());

    let res = client
        .put(srv.url("/events/not-an-id"))
        .bearer_auth(&owner)
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(Role::SUPER_ADMIN, None, false);

    let base = json!({
        "title": "Robo Wars",
        "date": "2099-03-20",
        "festType": "Nimbus",
        "registrationDeadline": "2099-03-10T18:00:00Z",
    });
    let mut bad_club = base.clone();
    bad_club["clubId"] = json!("nope");
    let mut negative_seats = base.clone();
    negative_seats["maxSeats"] = json!(-1);
    let mut fractional_seats = base.clone();
    fractional_seats["maxSeats"] = json!(2.5);

    for body in [bad_club, negative_seats, fractional_seats] {
        let res = client
            .post(srv.url("/events"))
            .bearer_auth(&admin)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["error"], "validation_error");
        assert!(err["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    let res = client
        .post(srv.url("/auth/login"))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");

    let res = client
        .post(srv.url("/auth/register"))
        .body("name=a")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");
}
