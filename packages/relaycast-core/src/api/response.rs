//! JSON response helpers shared by HTTP handlers.
//!
//! Every API body carries a `success` flag. Playback outcomes add `code`,
//! `message` and the serialized outcome under `data`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::outcome::{FailureKind, PlaybackOutcome};

/// Merges `success: true` into an object body.
pub fn api_success(body: Value) -> Json<Value> {
    match body {
        Value::Object(mut map) => {
            map.insert("success".to_string(), Value::Bool(true));
            Json(Value::Object(map))
        }
        other => Json(json!({ "success": true, "data": other })),
    }
}

/// HTTP status for a handled request.
pub fn outcome_status(outcome: &PlaybackOutcome) -> StatusCode {
    match outcome {
        PlaybackOutcome::Usage { .. } => StatusCode::BAD_REQUEST,
        PlaybackOutcome::Failed { kind, .. } => match kind {
            FailureKind::NotAGroupContext => StatusCode::BAD_REQUEST,
            FailureKind::AssistantNotPresent => StatusCode::CONFLICT,
            FailureKind::ResolutionNotFound => StatusCode::NOT_FOUND,
            FailureKind::ResolutionFailed | FailureKind::CallJoinFailed => StatusCode::BAD_GATEWAY,
            FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::OK,
    }
}

/// Renders an outcome as a JSON response.
pub fn outcome_response(outcome: PlaybackOutcome) -> Response {
    let status = outcome_status(&outcome);
    let body = json!({
        "success": outcome.is_success(),
        "code": outcome.code(),
        "message": outcome.message(),
        "data": outcome,
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_merges_into_objects() {
        let Json(body) = api_success(json!({ "ok": true }));
        assert_eq!(body["success"], true);
        assert_eq!(body["ok"], true);

        let Json(body) = api_success(json!([1, 2]));
        assert_eq!(body["data"], json!([1, 2]));
    }

    #[test]
    fn failure_statuses() {
        assert_eq!(
            outcome_status(&PlaybackOutcome::failed_bare(FailureKind::AssistantNotPresent)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            outcome_status(&PlaybackOutcome::failed(FailureKind::ResolutionNotFound, "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            outcome_status(&PlaybackOutcome::NothingToSkip),
            StatusCode::OK
        );
        assert_eq!(
            outcome_status(&PlaybackOutcome::Usage { text: "u".into() }),
            StatusCode::BAD_REQUEST
        );
    }
}
