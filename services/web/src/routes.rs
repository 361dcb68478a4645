//! Catalog service routes

use auth::models::{LoginCredentials, NewUser};
use auth::validation::{validate_password, validate_username};
use axum::{
    Extension, Form, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::{WebError, WebResult},
    middleware::{require_admin, session_middleware},
    models::{AlbumTitleForm, CredentialsForm, CurrentUser, SearchQuery},
    state::AppState,
};

const MISSING_CREDENTIALS: &str = "Missing username or Password";
const INVALID_CREDENTIALS: &str = "Invalid Username or Password";

/// Create the router for the catalog service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(home))
        .route("/api/searchTracks", get(search_tracks))
        .route(
            "/album/:album_id",
            get(album_detail)
                .merge(post(update_album_title).route_layer(middleware::from_fn(require_admin))),
        )
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let database = common::database::health_check(&state.db_pool).await?;

    Ok(Json(json!({
        "status": "ok",
        "service": "catalog",
        "database": database,
    })))
}

/// Landing page data: the first tracks and the logged-in user
pub async fn home(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> WebResult<impl IntoResponse> {
    let tracks = state
        .catalog
        .initial_tracks(state.config.result_limit)
        .await
        .map_err(|e| {
            error!("Failed to list tracks: {}", e);
            WebError::InternalServerError
        })?;

    Ok(Json(json!({
        "tracks": tracks,
        "user": user.map(|Extension(user)| user),
    })))
}

/// Search tracks by name
pub async fn search_tracks(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> WebResult<impl IntoResponse> {
    let limit = state.config.result_limit;
    let tracks = match query.search_term.as_deref() {
        Some(term) if !term.is_empty() => state.catalog.search_tracks(term, limit).await,
        _ => state.catalog.initial_tracks(limit).await,
    }
    .map_err(|e| {
        error!("Failed to search tracks: {}", e);
        WebError::InternalServerError
    })?;

    Ok(Json(tracks))
}

/// Album page data
pub async fn album_detail(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
    user: Option<Extension<CurrentUser>>,
) -> WebResult<impl IntoResponse> {
    let album = state
        .catalog
        .album_by_id(album_id)
        .await
        .map_err(|e| {
            error!("Failed to get album {}: {}", album_id, e);
            WebError::InternalServerError
        })?
        .ok_or(WebError::NotFound("Album not found".to_string()))?;

    let tracks = state.catalog.album_tracks(album_id).await.map_err(|e| {
        error!("Failed to get tracks of album {}: {}", album_id, e);
        WebError::InternalServerError
    })?;

    let can_edit = user.is_some_and(|Extension(user)| user.is_admin());

    Ok(Json(json!({
        "album": album,
        "tracks": tracks,
        "canEdit": can_edit,
    })))
}

/// Rename an album. Only reachable through [`require_admin`].
pub async fn update_album_title(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
    Form(form): Form<AlbumTitleForm>,
) -> WebResult<Redirect> {
    let title = form
        .album_title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or(WebError::BadRequest("Missing album title".to_string()))?;

    let updated = state
        .catalog
        .update_album_title(album_id, title)
        .await
        .map_err(|e| {
            error!("Failed to update album {}: {}", album_id, e);
            WebError::InternalServerError
        })?;

    if !updated {
        return Err(WebError::NotFound("Album not found".to_string()));
    }

    Ok(Redirect::to(&format!("/album/{}", album_id)))
}

/// Log in with a username and password
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> WebResult<(CookieJar, Redirect)> {
    let (username, password) = form
        .filled()
        .ok_or(WebError::Form(MISSING_CREDENTIALS.to_string()))?;

    let credentials = LoginCredentials {
        username: username.to_string(),
        password: password.to_string(),
    };
    let valid = state
        .users
        .verify_credentials(&credentials)
        .await
        .map_err(|e| {
            error!("Failed to verify credentials for {}: {}", username, e);
            WebError::InternalServerError
        })?;

    if !valid {
        info!("Rejected login for {}", username);
        return Err(WebError::Form(INVALID_CREDENTIALS.to_string()));
    }

    let jar = start_session(&state, jar, username).await?;
    Ok((jar, Redirect::to("/")))
}

/// Create an account and log it in
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> WebResult<(CookieJar, Redirect)> {
    let (username, password) = form
        .filled()
        .ok_or(WebError::Form(MISSING_CREDENTIALS.to_string()))?;

    validate_username(username).map_err(WebError::Form)?;
    validate_password(password).map_err(WebError::Form)?;

    let new_user = NewUser {
        username: username.to_string(),
        password: password.to_string(),
    };
    let created = state.users.create(&new_user).await.map_err(|e| {
        error!("Failed to create user {}: {}", username, e);
        WebError::InternalServerError
    })?;

    if created.is_none() {
        return Err(WebError::Form("Username is already taken".to_string()));
    }

    info!("Registered user {}", username);
    let jar = start_session(&state, jar, username).await?;
    Ok((jar, Redirect::to("/")))
}

/// End the current session, if any
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let name = state.config.session_cookie.clone();

    if let Some(cookie) = jar.get(&name) {
        state.sessions.revoke_session(cookie.value()).await;
    }

    let jar = jar.remove(Cookie::build((name, "")).path("/"));
    (jar, Redirect::to("/login"))
}

async fn start_session(state: &AppState, jar: CookieJar, username: &str) -> WebResult<CookieJar> {
    let max_age = state.config.session_max_age;
    let id = state
        .sessions
        .create_session(username, max_age)
        .await
        .map_err(|e| {
            error!("Failed to create session for {}: {}", username, e);
            WebError::InternalServerError
        })?;

    let cookie = Cookie::build((state.config.session_cookie.clone(), String::from(id)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age));

    Ok(jar.add(cookie))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::repositories::fixtures::seed_catalog;
    use auth::models::ADMIN_ROLE;
    use auth::repositories::UserRepository;
    use auth::{SessionConfig, SessionRegistry};
    use common::database::{DatabaseConfig, init_pool};
    use reqwest::{StatusCode, header};
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    struct TestApp {
        base: String,
        client: reqwest::Client,
        state: AppState,
    }

    impl TestApp {
        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn login(&self, username: &str, password: &str) -> String {
            let response = self
                .client
                .post(self.url("/login"))
                .form(&[("username", username), ("password", password)])
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            session_cookie(&response).expect("session cookie")
        }

        async fn get_json(&self, path: &str, sid: Option<&str>) -> (StatusCode, Value) {
            let mut request = self.client.get(self.url(path));
            if let Some(sid) = sid {
                request = request.header(header::COOKIE, format!("sid={}", sid));
            }
            let response = request.send().await.unwrap();
            let status = response.status();
            (status, response.json().await.unwrap())
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            bind_address: "127.0.0.1:0".to_string(),
            session_cookie: "sid".to_string(),
            session_max_age: 2_592_000,
            session_cleanup_interval: 3600,
            session_sweep_delay: 5,
            session_sweep_schedule: None,
            result_limit: 50,
            admin_username: None,
        }
    }

    fn session_cookie(response: &reqwest::Response) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| {
                let pair = value.split(';').next()?;
                pair.strip_prefix("sid=").map(str::to_string)
            })
    }

    async fn spawn_app() -> TestApp {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        seed_catalog(&pool).await;

        let users = UserRepository::new(pool.clone());
        users.migrate().await.unwrap();
        for (username, password) in [("alice", "alicepass1"), ("bob", "bobpass12")] {
            users
                .create(&NewUser {
                    username: username.to_string(),
                    password: password.to_string(),
                })
                .await
                .unwrap();
        }
        users.grant_role("alice", ADMIN_ROLE).await.unwrap();

        let sessions = SessionRegistry::new(Arc::new(users.clone()), SessionConfig::default());
        let state = AppState::new(pool, users, sessions, test_config());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        TestApp {
            base: format!("http://{}", addr),
            client,
            state,
        }
    }

    fn track_ids(tracks: &Value) -> Vec<i64> {
        tracks
            .as_array()
            .unwrap()
            .iter()
            .map(|track| track["trackId"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = spawn_app().await;

        let (status, body) = app.get_json("/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_home_lists_tracks_anonymously() {
        let app = spawn_app().await;

        let (status, body) = app.get_json("/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(track_ids(&body["tracks"]), vec![1, 2, 3, 6, 7]);
        assert!(body["user"].is_null());
        assert_eq!(body["tracks"][0]["artistName"], "AC/DC");
    }

    #[tokio::test]
    async fn test_search_tracks() {
        let app = spawn_app().await;

        let (status, body) = app.get_json("/api/searchTracks?searchTerm=YOU", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(track_ids(&body), vec![1, 6]);

        let (_, body) = app.get_json("/api/searchTracks?searchTerm=", None).await;
        assert_eq!(track_ids(&body).len(), 5);

        let (_, body) = app.get_json("/api/searchTracks", None).await;
        assert_eq!(track_ids(&body).len(), 5);
    }

    #[tokio::test]
    async fn test_album_detail() {
        let app = spawn_app().await;

        let (status, body) = app.get_json("/album/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["album"]["albumTitle"], "For Those About To Rock We Salute You");
        assert_eq!(track_ids(&body["tracks"]), vec![1, 6, 7]);
        assert_eq!(body["canEdit"], false);

        let (status, body) = app.get_json("/album/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Album not found");
    }

    #[tokio::test]
    async fn test_login_rejects_missing_and_wrong_credentials() {
        let app = spawn_app().await;

        let response = app
            .client
            .post(app.url("/login"))
            .form(&[("username", "alice")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["errorMessage"], MISSING_CREDENTIALS);

        let response = app
            .client
            .post(app.url("/login"))
            .form(&[("username", "alice"), ("password", "wrong-password")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(session_cookie(&response).is_none());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["errorMessage"], INVALID_CREDENTIALS);

        assert!(app.state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let app = spawn_app().await;

        let response = app
            .client
            .post(app.url("/login"))
            .form(&[("username", "alice"), ("password", "alicepass1")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Max-Age=2592000"));

        let sid = session_cookie(&response).unwrap();
        assert_eq!(sid.len(), 64);

        let (_, body) = app.get_json("/", Some(&sid)).await;
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["roles"], json!([ADMIN_ROLE]));
    }

    #[tokio::test]
    async fn test_register_logs_in_new_user() {
        let app = spawn_app().await;

        let response = app
            .client
            .post(app.url("/register"))
            .form(&[("username", "carol"), ("password", "carolpass1")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let sid = session_cookie(&response).unwrap();

        let (_, body) = app.get_json("/", Some(&sid)).await;
        assert_eq!(body["user"]["username"], "carol");
        assert_eq!(body["user"]["roles"], json!([]));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_and_invalid_accounts() {
        let app = spawn_app().await;

        for form in [
            [("username", "alice"), ("password", "anotherpass")],
            [("username", "carol"), ("password", "short")],
            [("username", "no spaces"), ("password", "carolpass1")],
        ] {
            let response = app
                .client
                .post(app.url("/register"))
                .form(&form)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = response.json().await.unwrap();
            assert!(body["errorMessage"].is_string());
        }

        assert!(app.state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_album_title_edit_requires_admin() {
        let app = spawn_app().await;
        let form = [("albumTitle", "Restless and Wild")];

        let response = app
            .client
            .post(app.url("/album/2"))
            .form(&form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bob = app.login("bob", "bobpass12").await;
        let response = app
            .client
            .post(app.url("/album/2"))
            .header(header::COOKIE, format!("sid={}", bob))
            .form(&form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let (_, body) = app.get_json("/album/2", Some(&bob)).await;
        assert_eq!(body["album"]["albumTitle"], "Balls to the Wall");
        assert_eq!(body["canEdit"], false);
    }

    #[tokio::test]
    async fn test_admin_edits_album_title() {
        let app = spawn_app().await;
        let alice = app.login("alice", "alicepass1").await;

        let response = app
            .client
            .post(app.url("/album/2"))
            .header(header::COOKIE, format!("sid={}", alice))
            .form(&[("albumTitle", "  ")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .client
            .post(app.url("/album/2"))
            .header(header::COOKIE, format!("sid={}", alice))
            .form(&[("albumTitle", "Restless and Wild")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/album/2");

        let (_, body) = app.get_json("/album/2", Some(&alice)).await;
        assert_eq!(body["album"]["albumTitle"], "Restless and Wild");
        assert_eq!(body["canEdit"], true);
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_anonymous() {
        let app = spawn_app().await;
        let alice = app.login("alice", "alicepass1").await;

        let mut tampered = alice.clone();
        tampered.replace_range(0..1, if alice.starts_with('0') { "1" } else { "0" });

        for sid in [tampered.as_str(), "not-a-session", ""] {
            let (status, body) = app.get_json("/", Some(sid)).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body["user"].is_null());
        }
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous() {
        let app = spawn_app().await;
        let id = app.state.sessions.create_session("alice", 0).await.unwrap();

        let (status, body) = app.get_json("/", Some(id.as_str())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["user"].is_null());

        let response = app
            .client
            .post(app.url("/album/2"))
            .header(header::COOKIE, format!("sid={}", id))
            .form(&[("albumTitle", "Expired edit")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let app = spawn_app().await;
        let alice = app.login("alice", "alicepass1").await;

        let response = app
            .client
            .post(app.url("/logout"))
            .header(header::COOKIE, format!("sid={}", alice))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(response.headers().contains_key(header::SET_COOKIE));

        assert!(app.state.sessions.get_active_session(&alice).await.is_none());
        let (_, body) = app.get_json("/", Some(&alice)).await;
        assert!(body["user"].is_null());

        let response = app.client.post(app.url("/logout")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
