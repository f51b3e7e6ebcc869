mod common;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use common::TestApp;
use gridpulse_api::{
    entities::{alert, AlertKind, Severity},
    identity::device_identity,
    services::{simulator::floor_hour, DetectorService},
};

#[tokio::test]
async fn threshold_breach_raises_alert_with_configured_severity() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_profile("P001", 40.0, 4.0, 1000.0).await;
    app.seed_reading("P001", floor_hour(now), 1120.0, 120.0).await;
    app.seed_threshold("P001", Some(10.0), Some(100.0), Severity::High)
        .await;

    let detector = DetectorService::new(app.state.db.clone());
    let alerts = detector.detect_all().await.expect("detect");

    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.alert_type, AlertKind::Threshold);
    assert_eq!(alert.severity, Severity::High);
    assert_eq!(alert.point_id.as_deref(), Some("P001"));
    assert_eq!(alert.device_id, Some(device_identity("P001")));
    assert_eq!(alert.value, Some(120.0));
    assert_eq!(alert.threshold, Some(100.0));
    assert!(alert.resolved_at.is_none());
    assert!(alert.message.contains("exceeds upper bound"));
}

#[tokio::test]
async fn threshold_pass_checks_only_the_latest_reading() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_profile("P001", 40.0, 4.0, 1000.0).await;
    // The stale sample breaches, the fresh one does not.
    app.seed_reading("P001", floor_hour(now) - Duration::hours(1), 1000.0, 500.0)
        .await;
    app.seed_reading("P001", floor_hour(now), 1050.0, 50.0).await;
    app.seed_threshold("P001", Some(10.0), Some(100.0), Severity::High)
        .await;

    let detector = DetectorService::new(app.state.db.clone());
    let alerts = detector.detect_all().await.expect("detect");
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn threshold_breach_alerts_again_on_every_cycle() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_reading("P001", floor_hour(now), 1120.0, 120.0).await;
    app.seed_threshold("P001", None, Some(100.0), Severity::Critical)
        .await;

    let detector = DetectorService::new(app.state.db.clone());
    let first = detector.detect_all().await.expect("first cycle");
    let second = detector.detect_all().await.expect("second cycle");
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);

    let stored = alert::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count alerts");
    assert_eq!(stored, 2, "threshold alerts are not deduplicated");
}

#[tokio::test]
async fn trend_spike_and_drop_raise_warnings() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_profile("P010", 10.0, 1.0, 100.0).await;
    app.seed_profile("P011", 10.0, 1.0, 100.0).await;

    let yesterday = now - Duration::hours(24) - Duration::minutes(30);
    // P010 jumps to 160% of yesterday, P011 collapses to 20%.
    app.seed_reading("P010", yesterday, 100.0, 10.0).await;
    app.seed_reading("P010", now - Duration::minutes(10), 116.0, 16.0)
        .await;
    app.seed_reading("P011", yesterday, 100.0, 10.0).await;
    app.seed_reading("P011", now - Duration::minutes(10), 102.0, 2.0)
        .await;

    let detector = DetectorService::new(app.state.db.clone());
    let alerts = detector.detect_all().await.expect("detect");
    assert_eq!(alerts.len(), 2);

    let spike = alerts
        .iter()
        .find(|a| a.point_id.as_deref() == Some("P010"))
        .expect("spike alert");
    assert_eq!(spike.alert_type, AlertKind::TrendSpike);
    assert_eq!(spike.severity, Severity::Warning);
    assert_eq!(spike.value, Some(16.0));
    assert_eq!(spike.threshold, Some(15.0));

    let drop = alerts
        .iter()
        .find(|a| a.point_id.as_deref() == Some("P011"))
        .expect("drop alert");
    assert_eq!(drop.alert_type, AlertKind::TrendDrop);
    assert_eq!(drop.severity, Severity::Warning);
    assert_eq!(drop.value, Some(2.0));
    assert_eq!(drop.threshold, Some(3.0));
}

#[tokio::test]
async fn trend_pass_skips_points_without_a_usable_baseline() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_profile("P020", 10.0, 1.0, 100.0).await;
    app.seed_profile("P021", 10.0, 1.0, 100.0).await;

    // P020 has no reading from yesterday at all.
    app.seed_reading("P020", now - Duration::minutes(10), 200.0, 50.0)
        .await;
    // P021 reported zero consumption yesterday, so no ratio exists.
    app.seed_reading(
        "P021",
        now - Duration::hours(24) - Duration::minutes(30),
        100.0,
        0.0,
    )
    .await;
    app.seed_reading("P021", now - Duration::minutes(10), 150.0, 50.0)
        .await;

    let detector = DetectorService::new(app.state.db.clone());
    let alerts = detector.detect_all().await.expect("detect");
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn silent_point_gets_one_offline_alert_until_resolved() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_profile("P030", 10.0, 1.0, 500.0).await;
    app.seed_reading("P030", now - Duration::hours(3), 500.0, 20.0)
        .await;

    let detector = DetectorService::new(app.state.db.clone());

    let first = detector.detect_all().await.expect("first cycle");
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].alert_type, AlertKind::Offline);
    assert_eq!(first[0].severity, Severity::High);
    assert_eq!(first[0].device_id, Some(device_identity("P030")));
    assert!(first[0].message.contains("no data"));

    // While the alert stays open the point is not reported again.
    let second = detector.detect_all().await.expect("second cycle");
    assert!(second.is_empty());
    let stored = alert::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count alerts");
    assert_eq!(stored, 1);

    // Once resolved, a still-silent point is reported anew.
    let mut open: alert::ActiveModel = first[0].clone().into();
    open.resolved_at = Set(Some(Utc::now()));
    open.update(&*app.state.db).await.expect("resolve alert");

    let third = detector.detect_all().await.expect("third cycle");
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].alert_type, AlertKind::Offline);
}

#[tokio::test]
async fn recently_seen_point_is_not_offline() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_reading("P040", now - Duration::minutes(90), 100.0, 5.0)
        .await;

    let detector = DetectorService::new(app.state.db.clone());
    let alerts = detector.detect_all().await.expect("detect");
    assert!(alerts.is_empty(), "90 minutes of silence is within grace");
}

#[tokio::test]
async fn passes_run_threshold_then_trend_then_offline() {
    let app = TestApp::new().await;
    let now = Utc::now();

    // P001 breaches its threshold and spikes day over day.
    app.seed_profile("P001", 10.0, 1.0, 1000.0).await;
    app.seed_reading(
        "P001",
        now - Duration::hours(24) - Duration::minutes(30),
        900.0,
        10.0,
    )
    .await;
    app.seed_reading("P001", now - Duration::minutes(10), 1120.0, 120.0)
        .await;
    app.seed_threshold("P001", None, Some(100.0), Severity::High)
        .await;

    // P002 went silent three hours ago.
    app.seed_reading("P002", now - Duration::hours(3), 400.0, 15.0)
        .await;

    let detector = DetectorService::new(app.state.db.clone());
    let alerts = detector.detect_all().await.expect("detect");

    let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.alert_type).collect();
    assert_eq!(
        kinds,
        vec![AlertKind::Threshold, AlertKind::TrendSpike, AlertKind::Offline]
    );
    // The same point may alert in more than one pass per cycle.
    assert_eq!(alerts[0].point_id.as_deref(), Some("P001"));
    assert_eq!(alerts[1].point_id.as_deref(), Some("P001"));
    assert_eq!(alerts[2].point_id.as_deref(), Some("P002"));
}
