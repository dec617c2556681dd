use anyhow::Result;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::media_store::MediaStore;
use crate::user::{AuthTokenValue, PasswordHasher, UserRole, UserStoreError};
use axum_extra::extract::cookie::{Cookie, SameSite};

use axum::{
    body::Body,
    extract::State,
    http::{response, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::emotion_routes::make_emotion_routes;
use super::metrics::metrics_handler;
use super::playlist_routes::make_playlist_routes;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::song_routes::make_song_routes;
use super::state::*;
use super::{log_requests, ServerConfig};

#[derive(Serialize)]
struct ServerIdentity {
    pub name: &'static str,
    pub version: &'static str,
    pub git_hash: String,
    pub uptime_secs: u64,
}

#[derive(Deserialize, Debug)]
struct RegisterBody {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
    username: String,
    roles: Vec<String>,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerIdentity {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        git_hash: state.hash.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn register(
    State(user_store): State<GuardedUserStore>,
    Json(body): Json<RegisterBody>,
) -> Response {
    let username = body.username.trim();
    let email = body.email.trim();
    if username.is_empty() || email.is_empty() || body.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing username, email or password").into_response();
    }

    let hasher = PasswordHasher;
    let salt = hasher.generate_b64_salt();
    let password_hash = match hasher.hash(&body.password, &salt) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Could not hash password: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match user_store.create_user(username, email, &password_hash, &salt, UserRole::User) {
        Ok(user) => {
            info!("Registered user {}", user.username);
            StatusCode::CREATED.into_response()
        }
        Err(err @ UserStoreError::UsernameTaken(_))
        | Err(err @ UserStoreError::EmailTaken(_)) => {
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        Err(UserStoreError::Storage(err)) => {
            error!("Could not create user: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn login(State(user_store): State<GuardedUserStore>, Json(body): Json<LoginBody>) -> Response {
    debug!("login() called for {}", body.username);
    let user = match user_store.get_user_by_username(body.username.trim()) {
        Ok(Some(user)) => user,
        Ok(None) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(err) => {
            error!("Could not look up user: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match PasswordHasher.verify(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(err) => {
            error!("Could not verify password: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let token = AuthTokenValue::generate();
    if let Err(err) = user_store.add_auth_token(&token, user.id) {
        error!("Could not store auth token: {}", err);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let response_body = LoginSuccessResponse {
        token: token.0.clone(),
        username: user.username,
        roles: vec![user.role.as_str().to_string()],
    };
    let response_body = match serde_json::to_string(&response_body) {
        Ok(body) => body,
        Err(err) => {
            error!("Could not serialize login response: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cookie_value = HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly",
        COOKIE_SESSION_TOKEN_KEY, token.0
    ))
    .expect("token is alphanumeric");
    response::Builder::new()
        .status(StatusCode::OK)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .header(axum::http::header::SET_COOKIE, cookie_value)
        .body(Body::from(response_body))
        .unwrap()
}

async fn logout(State(user_store): State<GuardedUserStore>, session: Session) -> Response {
    match user_store.delete_auth_token(&AuthTokenValue(session.token)) {
        Ok(_) => {
            let cookie_value = Cookie::build(Cookie::new(COOKIE_SESSION_TOKEN_KEY, ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            response::Builder::new()
                .status(StatusCode::OK)
                .header(axum::http::header::SET_COOKIE, cookie_value.to_string())
                .body(Body::empty())
                .unwrap()
        }
        Err(err) => {
            error!("Could not delete auth token: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        media_store: MediaStore,
        emotion_log_store: GuardedEmotionLogStore,
        user_store: GuardedUserStore,
        detector: GuardedDetector,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            media_store,
            emotion_log_store,
            user_store,
            detector,
            hash: option_env!("GIT_HASH").unwrap_or("unknown").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    media_store: MediaStore,
    emotion_log_store: GuardedEmotionLogStore,
    user_store: GuardedUserStore,
    detector: GuardedDetector,
) -> Router {
    let state = ServerState::new(
        config,
        catalog_store,
        media_store,
        emotion_log_store,
        user_store,
        detector,
    );

    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .with_state(state.clone())
        .nest("/auth", auth_routes)
        .nest("/emotion", make_emotion_routes(state.clone()))
        .nest("/songs", make_song_routes(state.clone()))
        .nest("/playlists", make_playlist_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

#[allow(clippy::too_many_arguments)]
pub async fn run_server(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    media_store: MediaStore,
    emotion_log_store: GuardedEmotionLogStore,
    user_store: GuardedUserStore,
    detector: GuardedDetector,
) -> Result<()> {
    let port = config.port;
    let app = make_app(
        config,
        catalog_store,
        media_store,
        emotion_log_store,
        user_store,
        detector,
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
