//! Stand-in for the Netpulse endpoints used by the Gym Group app.
//!
//! Knows one member account and a handful of gyms. Sessions are random
//! `JSESSIONID` cookies handed out at login; busyness lookups without a live
//! session, or without the mobile-app API header, get a 403 just like the
//! real service. The `/admin` routes let tests expire sessions and count
//! logins.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MEMBER_USERNAME: &str = "member@example.com";
pub const MEMBER_PASSWORD: &str = "hunter2";
pub const MEMBER_UUID: &str = "8a1c2f4e-0000-4000-8000-000000000001";
pub const HOME_GYM_UUID: &str = "gym-london-waterloo";

const SESSION_COOKIE: &str = "JSESSIONID";

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct BusynessQuery {
    #[serde(rename = "gymLocationId")]
    pub gym_location_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    pub logins: u32,
    pub busyness_requests: u32,
}

#[derive(Default)]
pub struct MockState {
    sessions: HashSet<String>,
    /// Gym id to current capacity; `None` answers with an empty object.
    gyms: HashMap<String, Option<i64>>,
    stats: Stats,
}

pub type Db = Arc<RwLock<MockState>>;

pub fn app() -> Router {
    let mut state = MockState::default();
    state.gyms.insert(HOME_GYM_UUID.to_string(), Some(42));
    state.gyms.insert("gym-leeds-central".to_string(), Some(7));
    state.gyms.insert("gym-opening-soon".to_string(), None);
    let db: Db = Arc::new(RwLock::new(state));

    Router::new()
        .route("/np/exerciser/login", post(login))
        .route(
            "/np/thegymgroup/v1.0/exerciser/{user_id}/gym-busyness",
            get(gym_busyness),
        )
        .route("/admin/expire-sessions", post(expire_sessions))
        .route("/admin/stats", get(stats))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(State(db): State<Db>, Form(form): Form<LoginForm>) -> Response {
    if form.username != MEMBER_USERNAME || form.password != MEMBER_PASSWORD {
        tracing::info!("rejected login for {}", form.username);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"errorCode": "AUTHENTICATION_FAILED"})),
        )
            .into_response();
    }

    let session_id = Uuid::new_v4().simple().to_string();
    let mut state = db.write().await;
    state.sessions.insert(session_id.clone());
    state.stats.logins += 1;

    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/np; HttpOnly");
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "uuid": MEMBER_UUID,
            "homeClubUuid": HOME_GYM_UUID,
            "firstName": "Sam",
            "homeClubName": "London Waterloo",
        })),
    )
        .into_response()
}

async fn gym_busyness(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(query): Query<BusynessQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let mut state = db.write().await;
    state.stats.busyness_requests += 1;

    if headers.get("x-np-api-version").is_none() {
        return Err(StatusCode::FORBIDDEN);
    }
    let session = session_cookie(&headers).ok_or(StatusCode::FORBIDDEN)?;
    if !state.sessions.contains(&session) {
        return Err(StatusCode::FORBIDDEN);
    }
    if user_id != MEMBER_UUID {
        return Err(StatusCode::FORBIDDEN);
    }

    match state.gyms.get(&query.gym_location_id) {
        Some(Some(capacity)) => Ok(Json(json!({
            "currentCapacity": capacity,
            "gymLocationId": query.gym_location_id,
        }))),
        Some(None) => Ok(Json(json!({}))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn expire_sessions(State(db): State<Db>) -> StatusCode {
    db.write().await.sessions.clear();
    StatusCode::NO_CONTENT
}

async fn stats(State(db): State<Db>) -> Json<Stats> {
    Json(db.read().await.stats.clone())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}
