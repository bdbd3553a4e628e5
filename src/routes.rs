use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::{
    error::AppError::{self, InvalidCredentials, Unauthorized, Validation},
    state,
    store::FeedbackEntry,
};

#[derive(Deserialize)]
pub struct SubmitFeedbackRequest {
    name: Option<String>,
    email: Option<String>,
    feedback: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

pub async fn root_handler() -> &'static str {
    "Feedback email server running"
}

/// Persist first, then mail. A store failure is logged and swallowed so
/// the submitter still gets their acknowledgement; a mail failure is the
/// one thing this branch was asked to do, so it surfaces as a 500.
pub async fn submit_feedback_handler(
    State(state): State<Arc<state::State>>,
    Json(payload): Json<SubmitFeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let name = payload
        .name
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Validation("name and feedback required".to_string()))?;
    let feedback = payload
        .feedback
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Validation("name and feedback required".to_string()))?;
    let email = payload.email.filter(|s| !s.is_empty());

    let entry = FeedbackEntry::new(name, email, feedback);

    if let Err(e) = state.store.append(entry.clone()).await {
        error!("Failed to save feedback {}: {e}", entry.id);
    }

    if !state.notifier.configured() {
        warn!("SMTP not configured, skipping email send");
        return Ok(Json(json!({
            "success": true,
            "message": "Feedback received (email not sent - SMTP not configured)",
        })));
    }

    match state.notifier.send(&entry).await {
        Ok(info) => Ok(Json(json!({
            "success": true,
            "message": "Feedback received and emailed",
            "info": info,
        }))),
        Err(e) => {
            error!("Error sending email: {e}");
            Err(AppError::Mail(e.to_string()))
        }
    }
}

pub async fn admin_login_handler(
    State(state): State<Arc<state::State>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let username = payload
        .username
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Validation("username and password required".to_string()))?;
    let password = payload
        .password
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Validation("username and password required".to_string()))?;

    let token = state
        .sessions
        .login(&username, &password)
        .ok_or(InvalidCredentials)?;

    Ok(Json(json!({ "success": true, "token": token })))
}

pub async fn admin_logout_handler(
    State(state): State<Arc<state::State>>,
    headers: HeaderMap,
) -> Json<Value> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.logout(token);
    }

    Json(json!({ "success": true }))
}

pub async fn admin_feedbacks_handler(
    State(state): State<Arc<state::State>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let authorized = bearer_token(&headers)
        .map(|token| state.sessions.authorize(token))
        .unwrap_or(false);

    if !authorized {
        return Err(Unauthorized);
    }

    let mut entries = state.store.read().await?;
    entries.reverse();

    Ok(Json(json!({ "success": true, "feedbacks": entries })))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = auth.split(' ');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(_scheme), Some(token), None) => Some(token),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config, notify::Notifier, session::SessionRegistry, store::FeedbackStore,
    };
    use axum::{http::StatusCode, response::IntoResponse};
    use tempfile::{TempDir, tempdir};

    fn test_state(dir: &TempDir) -> Arc<state::State> {
        let config = Config {
            port: 0,
            smtp_host: None,
            smtp_port: 587,
            smtp_user: None,
            smtp_pass: None,
            alert_to: "alerts@example.com".to_string(),
            admin_user: "admin".to_string(),
            admin_pass: "admin123".to_string(),
            feedback_file: dir
                .path()
                .join("feedbacks.json")
                .to_string_lossy()
                .into_owned(),
        };

        let store = FeedbackStore::new(&config.feedback_file);
        let notifier = Notifier::from_config(&config).unwrap();
        let sessions = SessionRegistry::new(config.admin_user.clone(), config.admin_pass.clone());

        Arc::new(state::State {
            config,
            store,
            notifier,
            sessions,
        })
    }

    fn submit(name: Option<&str>, email: Option<&str>, feedback: Option<&str>) -> SubmitFeedbackRequest {
        SubmitFeedbackRequest {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            feedback: feedback.map(str::to_string),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn submission_without_email_is_stored_with_empty_email() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = submit_feedback_handler(
            State(state.clone()),
            Json(submit(Some("A"), None, Some("hi"))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);

        let entries = state.store.read().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "A");
        assert_eq!(entries[0].email, "");
        assert!(!entries[0].id.is_empty());
    }

    #[tokio::test]
    async fn submission_without_feedback_is_rejected_and_not_stored() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = submit_feedback_handler(
            State(state.clone()),
            Json(submit(Some("A"), None, None)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);

        assert!(state.store.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_strings_count_as_missing() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = submit_feedback_handler(
            State(state.clone()),
            Json(submit(Some(""), None, Some("hi"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unconfigured_smtp_still_accepts_feedback() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = submit_feedback_handler(
            State(state),
            Json(submit(Some("A"), Some("a@example.com"), Some("hi"))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(
            body["message"],
            "Feedback received (email not sent - SMTP not configured)"
        );
    }

    #[tokio::test]
    async fn login_issues_token_usable_on_feedbacks() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = admin_login_handler(
            State(state.clone()),
            Json(LoginRequest {
                username: Some("admin".to_string()),
                password: Some("admin123".to_string()),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let token = body["token"].as_str().unwrap().to_string();

        let response = admin_feedbacks_handler(State(state), bearer(&token))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_rejected() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = admin_login_handler(
            State(state),
            Json(LoginRequest {
                username: Some("admin".to_string()),
                password: Some("wrong".to_string()),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn login_with_missing_fields_is_a_bad_request() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = admin_login_handler(
            State(state),
            Json(LoginRequest {
                username: Some("admin".to_string()),
                password: None,
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn feedbacks_are_listed_most_recent_first() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        for name in ["first", "second"] {
            let response = submit_feedback_handler(
                State(state.clone()),
                Json(submit(Some(name), None, Some("hi"))),
            )
            .await
            .into_response();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let token = state.sessions.login("admin", "admin123").unwrap();
        let response = admin_feedbacks_handler(State(state), bearer(&token))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let feedbacks = body["feedbacks"].as_array().unwrap();
        assert_eq!(feedbacks.len(), 2);
        assert_eq!(feedbacks[0]["name"], "second");
        assert_eq!(feedbacks[1]["name"], "first");
    }

    #[tokio::test]
    async fn feedbacks_without_token_is_unauthorized() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = admin_feedbacks_handler(State(state), HeaderMap::new())
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let token = state.sessions.login("admin", "admin123").unwrap();

        let response = admin_logout_handler(State(state.clone()), bearer(&token))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = admin_feedbacks_handler(State(state), bearer(&token))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_without_token_still_succeeds() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let response = admin_logout_handler(State(state), HeaderMap::new())
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logging_out_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir);

        let token = state.sessions.login("admin", "admin123").unwrap();

        for _ in 0..2 {
            let response = admin_logout_handler(State(state.clone()), bearer(&token))
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn bearer_token_requires_exactly_two_parts() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, "abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc extra".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
