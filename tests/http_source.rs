use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use charge_board::board::Screen;
use charge_board::clock::ManualClock;
use charge_board::error::AppError;
use charge_board::feed::{FeedSource, FetchError, ReservationSource};
use charge_board::schedule::run_refresh_cycle;
use charge_board::state::{AppState, RefreshOutcome};
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use time::macros::datetime;

async fn serve(router: Router) -> Result<SocketAddr, std::io::Error> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

fn feed_router() -> Router {
    Router::new()
        .route(
            "/feed",
            get(|| async {
                axum::Json(json!([
                    {
                        "licensePlate": "HTTP-1",
                        "startTime": "2026-03-02T11:30:00Z",
                        "endTime": "2026-03-02T12:30:00Z",
                        "remark": "charging",
                        "soc": 81
                    }
                ]))
            }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/object", get(|| async { axum::Json(json!({"items": []})) }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                axum::Json(json!([]))
            }),
        )
}

fn source_for(addr: SocketAddr, path: &str) -> FeedSource {
    FeedSource::from_setting(Some(&format!("http://{addr}{path}")), Path::new("data"))
}

fn shared_state() -> Arc<RwLock<AppState>> {
    Arc::new(RwLock::new(AppState::new(Screen::Ongoing)))
}

#[tokio::test]
async fn fetches_and_installs_remote_feed() -> Result<(), Box<dyn std::error::Error>> {
    let addr = serve(feed_router()).await?;
    let source = source_for(addr, "/feed");
    assert!(matches!(source, FeedSource::Http(_)));
    let state = shared_state();
    let clock = ManualClock::new(datetime!(2026-03-02 12:00 UTC));

    let outcome = run_refresh_cycle(&source, &state, &clock, Duration::from_secs(5)).await?;

    assert_eq!(outcome, RefreshOutcome::Ok { record_count: 1 });
    let guard = state.read().map_err(|_| AppError::StateLock)?;
    let board = guard.board().ok_or("board not published")?;
    assert_eq!(board.rows[0].license_plate, "HTTP-1");
    assert_eq!(board.rows[0].soc, "81%");
    Ok(())
}

#[tokio::test]
async fn server_error_is_a_status_failure() -> Result<(), Box<dyn std::error::Error>> {
    let addr = serve(feed_router()).await?;
    let source = source_for(addr, "/broken");

    let result = source.fetch().await;

    assert!(matches!(result, Err(FetchError::Status(500))));
    Ok(())
}

#[tokio::test]
async fn server_error_leaves_board_empty() -> Result<(), Box<dyn std::error::Error>> {
    let addr = serve(feed_router()).await?;
    let state = shared_state();
    let clock = ManualClock::new(datetime!(2026-03-02 12:00 UTC));

    run_refresh_cycle(&source_for(addr, "/feed"), &state, &clock, Duration::from_secs(5)).await?;
    let outcome =
        run_refresh_cycle(&source_for(addr, "/broken"), &state, &clock, Duration::from_secs(5))
            .await?;

    assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
    let guard = state.read().map_err(|_| AppError::StateLock)?;
    assert!(guard.records().is_empty());
    let board = guard.board().ok_or("board not published")?;
    assert!(board.rows.is_empty());
    assert_eq!(board.empty_message, Some("No vehicles charging right now"));
    Ok(())
}

#[tokio::test]
async fn object_payload_is_treated_as_failure() -> Result<(), Box<dyn std::error::Error>> {
    let addr = serve(feed_router()).await?;
    let state = shared_state();
    let clock = ManualClock::new(datetime!(2026-03-02 12:00 UTC));

    let outcome =
        run_refresh_cycle(&source_for(addr, "/object"), &state, &clock, Duration::from_secs(5))
            .await?;

    match outcome {
        RefreshOutcome::Failed { reason } => assert!(reason.contains("not an array")),
        RefreshOutcome::Ok { .. } => panic!("expected malformed payload failure"),
    }
    Ok(())
}

#[tokio::test]
async fn slow_server_hits_retrieval_timeout() -> Result<(), Box<dyn std::error::Error>> {
    let addr = serve(feed_router()).await?;
    let state = shared_state();
    let clock = ManualClock::new(datetime!(2026-03-02 12:00 UTC));

    let outcome =
        run_refresh_cycle(&source_for(addr, "/slow"), &state, &clock, Duration::from_millis(200))
            .await?;

    match outcome {
        RefreshOutcome::Failed { reason } => assert!(reason.contains("timed out")),
        RefreshOutcome::Ok { .. } => panic!("expected timeout failure"),
    }
    Ok(())
}
