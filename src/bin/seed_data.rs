//! Seed data script - provisions demo metering points
//!
//! Run with: cargo run --bin seed-data -- --points 8
//!
//! For each point this creates a device registry row, a consumption
//! profile with plausible statistics, and (for a subset) a threshold
//! config. Re-running skips points that already exist.

use anyhow::Result;
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::info;

use gridpulse_api::config::{load_config, DEFAULT_DATABASE_URL};
use gridpulse_api::db;
use gridpulse_api::entities::{device, device_profile, threshold_config, Severity};
use gridpulse_api::identity::device_identity;

#[derive(Parser)]
#[command(name = "seed-data", about = "Provision demo metering points", version)]
struct Cli {
    #[arg(long, default_value_t = 5, help = "Number of demo points to create")]
    points: u16,

    #[arg(
        long,
        help = "Database to seed; defaults to the configured database_url"
    )]
    database_url: Option<String>,

    #[arg(long, help = "Apply migrations before seeding")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let database_url = match cli.database_url {
        Some(url) => url,
        None => load_config()
            .map(|cfg| cfg.database_url)
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
    };

    info!("Connecting to database: {}", database_url);
    let pool = db::establish_connection(&database_url).await?;
    if cli.migrate {
        db::run_migrations(&pool).await?;
    }

    let mut created = 0;
    let mut skipped = 0;
    let mut rng = StdRng::from_entropy();

    for n in 1..=cli.points {
        let point_id = format!("P{n:03}");
        if seed_point(&pool, &mut rng, &point_id, n).await? {
            created += 1;
        } else {
            skipped += 1;
        }
    }

    info!(created, skipped, "Seeding complete");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/v1/devices");
    info!("  curl http://localhost:8080/api/v1/readings/realtime");
    info!("  curl http://localhost:8080/api/v1/alerts/thresholds");
    info!("Or explore interactively at: http://localhost:8080/docs");

    Ok(())
}

/// Creates the registry row, profile and (for odd-numbered points) a
/// threshold config. Returns false when the point already exists.
async fn seed_point(pool: &db::DbPool, rng: &mut StdRng, point_id: &str, n: u16) -> Result<bool> {
    let existing = device_profile::Entity::find_by_id(point_id.to_string())
        .one(pool)
        .await?;
    if existing.is_some() {
        info!(point_id, "Point already seeded, skipping");
        return Ok(false);
    }

    let device_id = device_identity(point_id);
    // Plausible hourly consumption for a small commercial meter.
    let mean: f64 = rng.gen_range(5.0..60.0);
    let std = mean * rng.gen_range(0.1..0.3);

    let registry = device::ActiveModel {
        device_id: Set(device_id),
        device_no: Set(Some(point_id.to_string())),
        device_name: Set(Some(format!("Demo meter {n}"))),
        status: Set(1),
        remark: Set(Some("seed-data".to_string())),
    };
    device::Entity::insert(registry)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(device::Column::DeviceId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(pool)
        .await?;

    let profile = device_profile::ActiveModel {
        point_id: Set(point_id.to_string()),
        mean_value: Set(mean),
        std_value: Set(std),
        min_value: Set(Some(0.0)),
        max_value: Set(Some(mean * 4.0)),
        last_value: Set(rng.gen_range(1000.0..50000.0)),
    };
    profile.insert(pool).await?;

    if n % 2 == 1 {
        let has_threshold = threshold_config::Entity::find()
            .filter(threshold_config::Column::PointId.eq(point_id))
            .one(pool)
            .await?
            .is_some();
        if !has_threshold {
            let threshold = threshold_config::ActiveModel {
                point_id: Set(Some(point_id.to_string())),
                device_id: Set(Some(device_id)),
                metric: Set("incr".to_string()),
                min_value: Set(Some(0.0)),
                max_value: Set(Some((mean * 3.0 * 100.0).round() / 100.0)),
                severity: Set(Severity::Warning),
                ..Default::default()
            };
            threshold.insert(pool).await?;
        }
    }

    info!(
        point_id,
        device_id,
        mean = format!("{mean:.2}"),
        "Seeded point"
    );
    Ok(true)
}
