//! Guest view tracking.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::error;

use h3_models::{GuestSessionId, ViewDecision, SESSION_COOKIE_MAX_AGE_SECS};

use crate::error::{ApiError, ApiResult};
use crate::middleware::SESSION_HEADER;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session-id";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestTrackingResponse {
    /// False when the store was unreachable and the answer is permissive
    pub success: bool,
    #[serde(flatten)]
    pub decision: ViewDecision,
}

/// POST /api/guest-tracking
///
/// Counts one content view for the caller's guest session. The session is
/// taken from the `x-session-id` header, then the `session-id` cookie; a new
/// one is issued when neither is present.
pub async fn track_guest_view(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(CookieJar, Json<GuestTrackingResponse>)> {
    if !body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice::<serde_json::Value>(&body)
            .map_err(|e| ApiError::validation(format!("Invalid JSON body: {}", e)))?;
    }

    let had_cookie = jar
        .get(SESSION_COOKIE)
        .is_some_and(|c| !c.value().is_empty());
    let session_id = session_from_request(&headers, &jar)?;
    let label = session_id
        .as_ref()
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| "-".to_string());

    let outcome = state.tracker.track_view(session_id).await.map_err(|e| {
        error!(
            session_id = %label,
            endpoint = "guest-tracking",
            error = %e,
            "Failed to track guest view"
        );
        ApiError::from(e)
    })?;

    let jar = if had_cookie {
        jar
    } else {
        jar.add(
            Cookie::build((SESSION_COOKIE, outcome.session_id.as_str().to_string()))
                .max_age(time::Duration::seconds(SESSION_COOKIE_MAX_AGE_SECS))
                .http_only(true)
                .path("/")
                .same_site(SameSite::Lax)
                .secure(state.config.is_production()),
        )
    };

    Ok((
        jar,
        Json(GuestTrackingResponse {
            success: !outcome.degraded,
            decision: outcome.decision,
        }),
    ))
}

/// Empty values count as absent, so an empty header falls back to the cookie.
fn session_from_request(
    headers: &HeaderMap,
    jar: &CookieJar,
) -> ApiResult<Option<GuestSessionId>> {
    let header = headers
        .get(SESSION_HEADER)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ApiError::validation("Invalid session id"))
        })
        .transpose()?
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let raw = header.or_else(|| {
        jar.get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    });

    raw.map(|s| GuestSessionId::parse(s).map_err(|e| ApiError::validation(e.to_string())))
        .transpose()
}
