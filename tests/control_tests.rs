mod common;

use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use memedex::api::router::create_router;
use memedex::models::Side;

#[tokio::test]
async fn test_pause_and_resume() {
    let state = common::build_test_state();
    let pause_flag = state.pause_flag.clone();
    let app = create_router(state);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/pause")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "paused");
    assert!(pause_flag.load(Ordering::Relaxed));

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/resume")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "running");
    assert!(!pause_flag.load(Ordering::Relaxed));
}

#[tokio::test]
async fn test_status_reports_simulation() {
    let app = create_router(common::build_test_state());

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["paused"], false);
    assert_eq!(json["balance"], 1000.0);
    assert_eq!(json["open_positions"], 0);
    assert_eq!(json["coins"], 3);
    assert_eq!(json["liquidation_policy"], "wipe_account");
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_reset_restores_account_and_persists() {
    let state = common::build_test_state();
    let game = state.game.clone();
    let snapshot_path = state.config.snapshot_path.clone();
    let app = create_router(state);

    game.open_position(Side::Long, 100.0).await.unwrap();
    assert_eq!(game.positions().await.len(), 1);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "reset");
    assert_eq!(json["balance"], 1000.0);

    assert!(game.positions().await.is_empty());
    assert!(game.history(None).await.is_empty());

    // the wiped state hit disk
    assert!(std::fs::metadata(&snapshot_path).is_ok());
    std::fs::remove_file(&snapshot_path).ok();
}
