use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use rollup_core::clock::FixedClock;
use rollup_core::config::EngineConfig;
use rollup_core::status::StatusAliases;
use rollup_core::store::{schema, SqliteStore};
use rollup_core::MetricsEngine;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DATA: &str = r#"
INSERT INTO countries VALUES ('ke', 'Kenya'), ('ug', 'Uganda');
INSERT INTO outputs VALUES ('out-1', 'Output One');
INSERT INTO statuses VALUES ('done', 'Completed'), ('todo', 'Pending');
INSERT INTO products (id, name, delivery_date, output_id, country_id) VALUES
    ('p1', 'Alpha', '2024-03-01', 'out-1', 'ke'),
    ('p2', 'Bravo', '2024-03-20', 'out-1', 'ug'),
    ('p3', 'Charlie', NULL, NULL, 'ug');
INSERT INTO indicators VALUES ('ind-1', 'I1', 'Reach', 'out-1'), ('ind-2', 'I2', 'Quality', NULL);
INSERT INTO product_indicators VALUES ('p1', 'ind-1'), ('p2', 'ind-1'), ('p3', 'ind-2');
INSERT INTO tasks (id, name, planned_end, checkin_start, checkin_midpoint, checkin_review, status_id, product_id) VALUES
    ('a1', 'Survey', '2024-03-01', '2024-03-04', NULL, NULL, 'done', 'p1'),
    ('a2', 'Design', '2024-03-01', NULL, NULL, NULL, 'done', 'p1'),
    ('b1', 'Build', '2024-03-01', '2024-03-01', '2024-03-05', '2024-03-08', 'todo', 'p2'),
    ('b2', 'Review', '2024-03-10', NULL, NULL, NULL, 'done', 'p2');
"#;

/// A seeded store plus an engine pinned to Monday 2024-03-04.
fn setup() -> (TempDir, MetricsEngine) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dashboard.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    schema::create(&conn).unwrap();
    conn.execute_batch(DATA).unwrap();
    drop(conn);

    let store = SqliteStore::open(&path, std::time::Duration::from_millis(500)).unwrap();
    let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    let engine = MetricsEngine::new(
        Arc::new(store),
        Arc::new(clock),
        StatusAliases::default(),
        &EngineConfig::default(),
    );
    (dir, engine)
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn ids(rows: &serde_json::Value) -> Vec<String> {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Health / routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn unknown_route_returns_404_json() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("/api/nope"));
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analytics_returns_every_rollup() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/analytics").await;
    assert_eq!(status, StatusCode::OK);

    for key in [
        "by_indicator",
        "by_country",
        "by_product",
        "by_organization",
        "by_output",
        "by_phase",
        "degraded",
    ] {
        assert!(json[key].is_array(), "{key} missing");
    }
    assert_eq!(ids(&json["by_indicator"]), vec!["ind-1", "ind-2"]);
    let ind = &json["by_indicator"][0];
    assert_eq!(ind["total_tasks"], 4);
    assert_eq!(ind["completion_percentage"], 75.0);
    assert_eq!(ind["adoption_percentage"], 66.67);
    assert_eq!(ind["products_count"], 2);

    assert_eq!(json["summary"]["total_products"], 3);
    assert_eq!(json["summary"]["overdue_count"], 1);
    // No task has an organization or phase.
    assert_eq!(json["by_organization"], serde_json::json!([]));
    assert_eq!(json["degraded"], serde_json::json!([]));
}

#[tokio::test]
async fn indicator_filter_narrows_rows() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/analytics?indicator=ind-2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json["by_indicator"]), vec!["ind-2"]);
    assert_eq!(ids(&json["by_product"]), vec!["p3"]);
    assert_eq!(ids(&json["by_country"]), vec!["ug"]);
    assert_eq!(json["by_indicator"][0]["completion_percentage"], 0.0);
}

#[tokio::test]
async fn blank_filter_is_unrestricted() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine.clone());
    let (_, unfiltered) = get(app, "/api/analytics").await;
    let app = rollup_server::build_router(engine);
    let (status, blank) = get(app, "/api/analytics?indicator=&output=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blank, unfiltered);
}

#[tokio::test]
async fn unknown_indicator_returns_400() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/analytics?indicator=unknown-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("unknown-id"));
}

#[tokio::test]
async fn missing_store_serves_empty_report() {
    let (dir, engine) = setup();
    std::fs::remove_file(dir.path().join("dashboard.db")).unwrap();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["by_indicator"], serde_json::json!([]));
    assert_eq!(json["summary"]["total_tasks"], 0);
    assert_eq!(json["summary"]["completion_percentage"], 0.0);
}

// ---------------------------------------------------------------------------
// Indicator / product metrics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn indicator_metrics_totals() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/analytics/indicators").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_indicators"], 2);
    assert_eq!(json["total_products"], 3);
    assert_eq!(json["average_adoption"], 50.0);
}

#[tokio::test]
async fn product_metrics_delivery_counts() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/analytics/products?output=out-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json["products"]), vec!["p1", "p2"]);
    assert_eq!(json["products"][0]["delivery_status"], "on_time");
    assert_eq!(json["delivery"]["on_time"], 2);
    assert_eq!(json["delivery"]["pending"], 0);
}

// ---------------------------------------------------------------------------
// Check-ins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn check_ins_are_bucketed() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, json) = get(app, "/api/check-ins").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["counts"]["overdue"], 1);
    assert_eq!(json["counts"]["today"], 1);
    assert_eq!(json["counts"]["tomorrow"], 1);
    assert_eq!(json["counts"]["this_week"], 1);
    assert_eq!(json["counts"]["later"], 0);
    assert_eq!(json["today"][0]["task_id"], "a1");
    assert_eq!(json["tomorrow"][0]["kind"], "midpoint");
    assert_eq!(json["this_week"][0]["due_date"], "2024-03-08");
}

#[tokio::test]
async fn check_ins_reject_malformed_ids() {
    let (_dir, engine) = setup();
    let app = rollup_server::build_router(engine);
    let (status, _) = get(app, "/api/check-ins?productId=%27%3B%20DROP").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
