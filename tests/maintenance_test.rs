mod common;

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use common::TestApp;
use gridpulse_api::{
    entities::{alert, device_profile, meter_reading, AlertKind, Severity},
    services::{
        simulator::{floor_hour, SimulatorService},
        MaintenanceService,
    },
};

fn maintenance_for(app: &TestApp) -> MaintenanceService {
    let simulator = SimulatorService::new(app.state.db.clone(), 0.0);
    MaintenanceService::new(app.state.db.clone(), simulator)
}

#[tokio::test]
async fn backfill_fills_only_the_missing_hours() {
    let app = TestApp::new().await;
    app.seed_profile("P001", 30.0, 3.0, 100.0).await;

    // One day of history, complete except for the three hours before now.
    let current_hour = floor_hour(Utc::now());
    let mut t = current_hour - Duration::hours(23);
    while t <= current_hour - Duration::hours(4) {
        app.seed_reading("P001", t, 100.0, 5.0).await;
        t = t + Duration::hours(1);
    }

    let maintenance = maintenance_for(&app);
    let filled = maintenance.backfill_missing_data(1).await.expect("backfill");
    assert_eq!(filled, 3);

    let total = meter_reading::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count readings");
    assert_eq!(total, 23);

    for offset in 1..=3 {
        let hour = current_hour - Duration::hours(offset);
        let found = meter_reading::Entity::find()
            .filter(meter_reading::Column::Time.eq(hour))
            .one(&*app.state.db)
            .await
            .expect("query hour");
        assert!(found.is_some(), "hour {hour} should have been backfilled");
    }

    // The current hour belongs to the live cycle, not the backfill.
    let current = meter_reading::Entity::find()
        .filter(meter_reading::Column::Time.eq(current_hour))
        .one(&*app.state.db)
        .await
        .expect("query current hour");
    assert!(current.is_none());
}

#[tokio::test]
async fn backfill_on_an_empty_store_covers_the_whole_window() {
    let app = TestApp::new().await;
    app.seed_profile("P001", 30.0, 3.0, 0.0).await;

    let maintenance = maintenance_for(&app);
    let filled = maintenance.backfill_missing_data(1).await.expect("backfill");
    assert_eq!(filled, 23, "one day minus the current hour");

    let readings = meter_reading::Entity::find()
        .order_by_asc(meter_reading::Column::Time)
        .all(&*app.state.db)
        .await
        .expect("list readings");
    assert_eq!(readings.len(), 23);

    let current_hour = floor_hour(Utc::now());
    assert_eq!(readings[0].time, current_hour - Duration::hours(23));
    assert_eq!(readings[22].time, current_hour - Duration::hours(1));

    // Hours were generated oldest first, each compounding on the last.
    for pair in readings.windows(2) {
        assert_eq!(pair[1].time, pair[0].time + Duration::hours(1));
        assert!(pair[1].value >= pair[0].value);
        assert!(
            (pair[1].value - (pair[0].value + pair[1].incr)).abs() < 0.006,
            "value at {} should extend the running total",
            pair[1].time
        );
    }

    let profile = device_profile::Entity::find_by_id("P001")
        .one(&*app.state.db)
        .await
        .expect("query profile")
        .expect("P001 profile");
    assert_eq!(profile.last_value, readings[22].value);
}

#[tokio::test]
async fn backfill_with_full_history_does_nothing() {
    let app = TestApp::new().await;
    app.seed_profile("P001", 30.0, 3.0, 100.0).await;

    let current_hour = floor_hour(Utc::now());
    let mut t = current_hour - Duration::hours(23);
    while t < current_hour {
        app.seed_reading("P001", t, 100.0, 5.0).await;
        t = t + Duration::hours(1);
    }

    let maintenance = maintenance_for(&app);
    let filled = maintenance.backfill_missing_data(1).await.expect("backfill");
    assert_eq!(filled, 0);
}

#[tokio::test]
async fn cleanup_removes_only_alerts_past_retention() {
    let app = TestApp::new().await;
    let now = Utc::now();

    app.seed_alert(
        "P001",
        AlertKind::Threshold,
        Severity::High,
        now - Duration::days(31),
        None,
    )
    .await;
    let keeper = app
        .seed_alert(
            "P002",
            AlertKind::Offline,
            Severity::High,
            now - Duration::days(30) + Duration::minutes(2),
            Some(now - Duration::days(29)),
        )
        .await;
    app.seed_alert(
        "P003",
        AlertKind::TrendSpike,
        Severity::Warning,
        now - Duration::hours(1),
        None,
    )
    .await;
    // Readings are never subject to alert retention.
    app.seed_reading("P001", now - Duration::days(40), 10.0, 1.0)
        .await;

    let maintenance = maintenance_for(&app);
    let removed = maintenance.cleanup_expired_alerts(30).await.expect("cleanup");
    assert_eq!(removed, 1);

    let remaining = alert::Entity::find()
        .all(&*app.state.db)
        .await
        .expect("list alerts");
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().any(|a| a.id == keeper.id));
    assert!(remaining
        .iter()
        .all(|a| a.point_id.as_deref() != Some("P001")));

    let readings = meter_reading::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count readings");
    assert_eq!(readings, 1);
}

#[tokio::test]
async fn cleanup_with_nothing_expired_reports_zero() {
    let app = TestApp::new().await;
    app.seed_alert(
        "P001",
        AlertKind::Threshold,
        Severity::High,
        Utc::now() - Duration::hours(5),
        None,
    )
    .await;

    let maintenance = maintenance_for(&app);
    let removed = maintenance.cleanup_expired_alerts(30).await.expect("cleanup");
    assert_eq!(removed, 0);
}
