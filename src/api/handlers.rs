use crate::api::responses::{
    BoardErrorCode, BoardErrorResponse, BoardSuccessResponse, HealthErrorCode,
    HealthErrorResponse, HealthStatus, HealthSuccessResponse,
};
use crate::state::{AppState, RefreshOutcome};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum BoardResponse {
    Success(Box<BoardSuccessResponse>),
    Error {
        status: StatusCode,
        body: BoardErrorResponse,
    },
}

impl IntoResponse for BoardResponse {
    fn into_response(self) -> Response {
        match self {
            BoardResponse::Success(body) => (StatusCode::OK, Json(*body)).into_response(),
            BoardResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_board(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_board_response(state)
}

pub enum HealthResponse {
    Success {
        status: StatusCode,
        body: HealthSuccessResponse,
    },
    Error {
        status: StatusCode,
        body: HealthErrorResponse,
    },
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        match self {
            HealthResponse::Success { status, body } => (status, Json(body)).into_response(),
            HealthResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_health_response(state, OffsetDateTime::now_utc())
}

fn build_board_response(state: Arc<RwLock<AppState>>) -> BoardResponse {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return board_internal_error("state lock poisoned while reading board");
        }
    };
    let board = guard.board().cloned();
    drop(guard);

    let Some(board) = board else {
        return no_board_response(OffsetDateTime::now_utc());
    };

    match format_timestamp(board.rendered_at) {
        Ok(timestamp) => BoardResponse::Success(Box::new(BoardSuccessResponse { board, timestamp })),
        Err(_err) => board_internal_error("timestamp formatting failure"),
    }
}

fn no_board_response(now: OffsetDateTime) -> BoardResponse {
    match format_timestamp(now) {
        Ok(formatted) => BoardResponse::Error {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: BoardErrorResponse {
                error_code: BoardErrorCode::NoData,
                error_message: "Board has not been rendered yet".to_string(),
                timestamp: formatted,
            },
        },
        Err(_err) => board_internal_error("timestamp formatting failure"),
    }
}

fn board_internal_error(message: &str) -> BoardResponse {
    error!(
        message = message,
        "Internal error while handling /api/board"
    );
    BoardResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: BoardErrorResponse {
            error_code: BoardErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp(),
        },
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, TimestampError> {
    timestamp.format(&Rfc3339).map_err(TimestampError::Format)
}

fn fallback_timestamp() -> String {
    format_timestamp(OffsetDateTime::now_utc()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    })
}

fn build_health_response(state: Arc<RwLock<AppState>>, now: OffsetDateTime) -> HealthResponse {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return health_internal_error("state lock poisoned while reading refresh status");
        }
    };
    let record_count = guard.records().len();
    let report = guard.last_refresh().cloned();
    drop(guard);

    let (status, last_error) = match report.as_ref().map(|report| &report.outcome) {
        None => (HealthStatus::Ko, None),
        Some(RefreshOutcome::Ok { .. }) => (HealthStatus::Ok, None),
        Some(RefreshOutcome::Failed { reason }) => (HealthStatus::Degraded, Some(reason.clone())),
    };

    let timestamps = format_timestamp(now).and_then(|timestamp| {
        let last_refresh = report
            .as_ref()
            .map(|report| format_timestamp(report.finished_at))
            .transpose()?;
        Ok((timestamp, last_refresh))
    });
    let (timestamp, last_refresh) = match timestamps {
        Ok(formatted) => formatted,
        Err(_) => {
            return health_internal_error("timestamp formatting failure");
        }
    };

    let status_code = match status {
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };

    HealthResponse::Success {
        status: status_code,
        body: HealthSuccessResponse {
            status,
            record_count,
            last_refresh,
            last_error,
            timestamp,
        },
    }
}

fn health_internal_error(message: &str) -> HealthResponse {
    error!(
        message = message,
        "Internal error while handling /api/health"
    );
    HealthResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: HealthErrorResponse {
            error_code: HealthErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Reservation, Screen, evaluate};
    use crate::state::RefreshReport;
    use time::macros::datetime;

    fn poisoned_state() -> Arc<RwLock<AppState>> {
        let state = Arc::new(RwLock::new(AppState::default()));
        let state_for_thread = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = state_for_thread.write().expect("lock for poison");
            panic!("poison lock");
        })
        .join();
        state
    }

    #[test]
    fn board_handler_returns_published_board() {
        let mut app_state = AppState::default();
        let rendered_at = datetime!(1970-01-01 00:00:01 UTC);
        app_state.set_board(evaluate(&[], Screen::Upcoming, rendered_at));
        let state = Arc::new(RwLock::new(app_state));

        let response = build_board_response(state);

        match response {
            BoardResponse::Success(body) => {
                assert_eq!(body.board.screen, Screen::Upcoming);
                assert_eq!(body.board.empty_message, Some("No upcoming reservations"));
                assert_eq!(body.timestamp, "1970-01-01T00:00:01Z");
            }
            BoardResponse::Error { status, .. } => {
                panic!("expected success response, got error: {status}");
            }
        }
    }

    #[test]
    fn board_handler_returns_no_data_before_first_render() {
        let state = Arc::new(RwLock::new(AppState::default()));

        let response = build_board_response(state);

        match response {
            BoardResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body.error_code, BoardErrorCode::NoData);
            }
            BoardResponse::Success(_) => {
                panic!("expected no data error response");
            }
        }
    }

    #[test]
    fn board_handler_returns_internal_error_when_lock_poisoned() {
        let response = build_board_response(poisoned_state());

        match response {
            BoardResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body.error_code, BoardErrorCode::InternalError);
                assert_eq!(body.error_message, "Internal server error");
            }
            BoardResponse::Success(_) => {
                panic!("expected internal error response");
            }
        }
    }

    #[test]
    fn health_handler_returns_ko_before_first_refresh() {
        let state = Arc::new(RwLock::new(AppState::default()));

        let response = build_health_response(state, datetime!(1970-01-01 00:00:06 UTC));

        match response {
            HealthResponse::Success { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body.status, HealthStatus::Ko);
                assert_eq!(body.last_refresh, None);
                assert_eq!(body.timestamp, "1970-01-01T00:00:06Z");
            }
            HealthResponse::Error { status, .. } => {
                panic!("expected success response, got error: {status}");
            }
        }
    }

    #[test]
    fn health_handler_returns_ok_after_successful_refresh() {
        let mut app_state = AppState::default();
        app_state.set_records(vec![Reservation::default(), Reservation::default()]);
        app_state.set_last_refresh(RefreshReport {
            finished_at: datetime!(1970-01-01 00:00:02 UTC),
            outcome: RefreshOutcome::Ok { record_count: 2 },
        });
        let state = Arc::new(RwLock::new(app_state));

        let response = build_health_response(state, datetime!(1970-01-01 00:00:03 UTC));

        match response {
            HealthResponse::Success { status, body } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body.status, HealthStatus::Ok);
                assert_eq!(body.record_count, 2);
                assert_eq!(body.last_refresh.as_deref(), Some("1970-01-01T00:00:02Z"));
                assert_eq!(body.last_error, None);
            }
            HealthResponse::Error { status, .. } => {
                panic!("expected success response, got error: {status}");
            }
        }
    }

    #[test]
    fn health_handler_returns_degraded_after_failed_refresh() {
        let mut app_state = AppState::default();
        app_state.set_last_refresh(RefreshReport {
            finished_at: datetime!(1970-01-01 00:00:04 UTC),
            outcome: RefreshOutcome::Failed {
                reason: "unexpected http status 500".to_string(),
            },
        });
        let state = Arc::new(RwLock::new(app_state));

        let response = build_health_response(state, datetime!(1970-01-01 00:00:05 UTC));

        match response {
            HealthResponse::Success { status, body } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body.status, HealthStatus::Degraded);
                assert_eq!(body.record_count, 0);
                assert_eq!(
                    body.last_error.as_deref(),
                    Some("unexpected http status 500")
                );
            }
            HealthResponse::Error { status, .. } => {
                panic!("expected success response, got error: {status}");
            }
        }
    }

    #[test]
    fn health_handler_returns_internal_error_when_lock_poisoned() {
        let response = build_health_response(poisoned_state(), datetime!(1970-01-01 00:00:05 UTC));

        match response {
            HealthResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body.error_code, HealthErrorCode::InternalError);
                assert_eq!(body.error_message, "Internal server error");
            }
            HealthResponse::Success { .. } => {
                panic!("expected internal error response");
            }
        }
    }
}
