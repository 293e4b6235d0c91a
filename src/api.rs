//! Account-linking HTTP endpoint.
//!
//! The web application calls `PATCH /bot/verify` with the code a user read
//! in their chat; the holder identity gets linked and notified. The web
//! app's own session auth fronts this service — here requests carry a
//! bearer service token and the session user's id in the body.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use stride_channels::telegram::TgClient;
use stride_core::error::StrideError;
use stride_store::Store;
use tracing::{error, info, warn};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    store: Store,
    client: TgClient,
    api_key: Option<String>,
}

impl ApiState {
    pub fn new(store: Store, client: TgClient, api_key: Option<String>) -> Self {
        Self {
            store,
            client,
            api_key,
        }
    }
}

/// Linking request: the code the user read in chat, and the account of the
/// authenticated web session.
#[derive(Debug, Deserialize)]
struct VerifyRequest {
    verification_code: String,
    user_id: i64,
}

/// Constant-time string comparison to prevent timing attacks on token
/// validation.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth. Returns `None` if authorized, `Some(response)`
/// if rejected.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Option<(StatusCode, Json<Value>)> {
    let key = match api_key {
        Some(k) => k,
        None => return None, // No auth configured — allow all.
    };

    let header = match headers.get("authorization") {
        Some(h) => h,
        None => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "missing Authorization header"})),
            ));
        }
    };

    let value = match header.to_str() {
        Ok(v) => v,
        Err(_) => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid Authorization header"})),
            ));
        }
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => None, // Authorized.
        _ => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token"})),
        )),
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// `PATCH /bot/verify` — consume a verification code and link the chat.
async fn verify(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> (StatusCode, Json<Value>) {
    if let Some(rejected) = check_auth(&headers, &state.api_key) {
        return rejected;
    }

    match state.store.get_user(req.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "unknown user"})),
            );
        }
        Err(e) => {
            error!("user lookup failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            );
        }
    }

    match state
        .store
        .link_account(&req.verification_code, req.user_id)
        .await
    {
        Ok(tg_user) => {
            info!("chat {} linked to account {}", tg_user.chat_id, req.user_id);
            // Best-effort notification; the link itself already happened.
            if let Err(e) = state
                .client
                .send_message(tg_user.chat_id, "Account confirmed successfully.")
                .await
            {
                warn!("link notification to chat {} failed: {e}", tg_user.chat_id);
            }
            (
                StatusCode::OK,
                Json(json!({
                    "tg_id": tg_user.chat_id,
                    "user_id": tg_user.user_id,
                })),
            )
        }
        Err(StrideError::CodeNotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "incorrect verification code"})),
        ),
        Err(e) => {
            error!("link_account failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
        }
    }
}

fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bot/verify", patch(verify))
        .with_state(state)
}

/// Serve the API until the process exits. Spawned as a background task; a
/// bind failure disables the endpoint but never takes the bot down.
pub async fn serve(state: ApiState, bind: String) {
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(&bind).await {
        Ok(l) => l,
        Err(e) => {
            error!("API failed to bind {bind}: {e}");
            return;
        }
    };

    info!("API listening on {bind}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secrex"));
        assert!(!constant_time_eq("secret", "secretlonger"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_check_auth_no_key_allows_all() {
        let headers = HeaderMap::new();
        assert!(check_auth(&headers, &None).is_none());
    }

    #[test]
    fn test_check_auth_missing_header() {
        let headers = HeaderMap::new();
        let rejected = check_auth(&headers, &Some("key".to_string()));
        assert_eq!(rejected.unwrap().0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_check_auth_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer key"));
        assert!(check_auth(&headers, &Some("key".to_string())).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer wrong"));
        assert!(check_auth(&headers, &Some("key".to_string())).is_some());
    }
}
