//! # Seed Data Generator
//!
//! Populates the database with demo assets and revenue schedules for
//! development.
//!
//! ## Usage
//! ```bash
//! # 40 assets, 15 schedules, 6 posted months (defaults)
//! cargo run -p atlvs-db --bin seed
//!
//! # Custom amounts
//! cargo run -p atlvs-db --bin seed -- --assets 200 --schedules 50 --months 12
//!
//! # Specify database path
//! cargo run -p atlvs-db --bin seed -- --db ./data/atlvs-finance.db
//! ```
//!
//! ## Generated Data
//! - Assets across every category and depreciation method, acquired over
//!   the three years before the anchor date
//! - Straight-line and milestone schedules for a handful of clients
//! - Depreciation runs for the trailing months and a catch-up
//!   recognition on each straight-line schedule

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atlvs_core::recognition::plan_auto_recognition;
use atlvs_core::{
    AccountingPeriod, AssetCategory, DepreciationMethod, Money, NewDeferredRevenueSchedule,
    NewFixedAsset, NewMilestone, RecognitionMethod, RecognitionRequest,
};
use atlvs_db::{Database, DbConfig, FinanceStore, ScheduleFilter};

/// Asset names per category with a base cost in dollars and a useful life.
const ASSETS: &[(AssetCategory, &str, i64, i64)] = &[
    (AssetCategory::Equipment, "LED Wall Panel Set", 85_000, 5),
    (AssetCategory::Equipment, "Line Array Speaker Rig", 120_000, 7),
    (AssetCategory::Equipment, "Moving Head Light Pack", 42_000, 5),
    (AssetCategory::Vehicles, "Box Truck 26ft", 95_000, 8),
    (AssetCategory::Vehicles, "Sprinter Van", 58_000, 6),
    (AssetCategory::Computers, "Media Server", 18_000, 3),
    (AssetCategory::Computers, "Production Laptop", 3_200, 3),
    (AssetCategory::Furniture, "Green Room Furniture", 12_500, 7),
    (AssetCategory::Buildings, "Warehouse Mezzanine", 310_000, 30),
    (AssetCategory::LeaseholdImprovements, "Office Build-out", 145_000, 10),
    (AssetCategory::Intangible, "Show Control License", 24_000, 4),
    (AssetCategory::Land, "Yard Parcel", 400_000, 40),
];

const METHODS: &[DepreciationMethod] = &[
    DepreciationMethod::StraightLine,
    DepreciationMethod::DecliningBalance,
    DepreciationMethod::SumOfYears,
    DepreciationMethod::StraightLine,
];

const CLIENTS: &[&str] = &["client-aurora", "client-basalt", "client-cinder", "client-drift"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut asset_count: usize = 40;
    let mut schedule_count: usize = 15;
    let mut months: u32 = 6;
    let mut db_path = String::from("./atlvs_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--assets" | "-a" => {
                if i + 1 < args.len() {
                    asset_count = args[i + 1].parse().unwrap_or(asset_count);
                    i += 1;
                }
            }
            "--schedules" | "-s" => {
                if i + 1 < args.len() {
                    schedule_count = args[i + 1].parse().unwrap_or(schedule_count);
                    i += 1;
                }
            }
            "--months" | "-m" => {
                if i + 1 < args.len() {
                    months = args[i + 1].parse().unwrap_or(months);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ATLVS Finance Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -a, --assets <N>      Fixed assets to create (default: 40)");
                println!("  -s, --schedules <N>   Revenue schedules to create (default: 15)");
                println!("  -m, --months <N>      Trailing months of depreciation runs (default: 6)");
                println!("  -d, --db <PATH>       Database file path (default: ./atlvs_dev.db)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, assets = asset_count, schedules = schedule_count, months, "Seeding");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    if db.assets().count(None).await? > 0 {
        warn!("Database already has assets; delete the file to regenerate");
        return Ok(());
    }

    let anchor = Utc::now();

    // ---- assets -----------------------------------------------------------
    let mut created = 0;
    for seed in 0..asset_count {
        let input = generate_asset(seed, anchor);
        match db.create_asset(&input).await {
            Ok(_) => created += 1,
            Err(e) => warn!(name = %input.name, error = %e, "Failed to insert asset"),
        }
    }
    info!(created, "Assets created");

    // ---- depreciation runs ------------------------------------------------
    let current = AccountingPeriod::of(anchor);
    for back in (1..=months as i32).rev() {
        let period = current.offset(-back);
        match db.record_depreciation(period).await {
            Ok(run) => info!(period = %period, total = %run.total_depreciation, "Run recorded"),
            Err(e) => warn!(period = %period, error = %e, "Run skipped"),
        }
    }

    // ---- schedules --------------------------------------------------------
    for seed in 0..schedule_count {
        let input = generate_schedule(seed, anchor);
        if let Err(e) = db.create_schedule(&input).await {
            warn!(client_id = %input.client_id, error = %e, "Failed to insert schedule");
        }
    }

    // ---- catch-up recognitions --------------------------------------------
    let schedules = db.list_schedules(&ScheduleFilter::default()).await?;
    let totals = db.recognized_totals().await?;
    let with_totals: Vec<_> = schedules
        .into_iter()
        .map(|s| {
            let recognized = totals.get(&s.id).copied().unwrap_or_default();
            (s, recognized)
        })
        .collect();

    let mut recognized = Money::zero();
    for planned in plan_auto_recognition(&with_totals, anchor) {
        let request = RecognitionRequest {
            amount: planned.amount,
            recognition_date: Some(planned.recognition_date),
            milestone_id: None,
            notes: Some(planned.notes.clone()),
        };
        match db
            .recognize(&planned.schedule_id, &request, planned.recognition_date)
            .await
        {
            Ok(event) => recognized += event.amount,
            Err(e) => warn!(schedule_id = %planned.schedule_id, error = %e, "Recognition skipped"),
        }
    }

    info!(recognized = %recognized, "Seed complete");
    Ok(())
}

/// One asset with deterministic, varied terms.
fn generate_asset(seed: usize, anchor: DateTime<Utc>) -> NewFixedAsset {
    let (category, name, base_cost, life) = ASSETS[seed % ASSETS.len()];
    let method = METHODS[seed % METHODS.len()];

    // up to three years back, spread across the month
    let acquired = anchor - Duration::days(((seed * 37) % 1095) as i64 + 1);
    let cost_cents = base_cost * 100 + ((seed * 1_313) % 50_000) as i64;
    let salvage_cents = if category == AssetCategory::Land {
        0
    } else {
        cost_cents / 10
    };

    NewFixedAsset {
        name: format!("{} #{:03}", name, seed + 1),
        category,
        description: None,
        acquisition_date: acquired,
        acquisition_cost: Money::from_cents(cost_cents),
        salvage_value: Money::from_cents(salvage_cents),
        useful_life_years: Decimal::from(life),
        depreciation_method: method,
        depreciation_rate: None,
        location: Some(if seed % 2 == 0 { "Warehouse A" } else { "Warehouse B" }.to_string()),
        serial_number: Some(format!("SN-{:06}", seed * 7 + 1000)),
        notes: None,
    }
}

/// One schedule; every third is milestone-based.
fn generate_schedule(seed: usize, anchor: DateTime<Utc>) -> NewDeferredRevenueSchedule {
    let start = anchor - Duration::days(((seed * 23) % 300) as i64);
    let end = start + Duration::days(180 + ((seed * 41) % 360) as i64);
    let total_cents = 1_200_000 + ((seed * 250_000) % 9_000_000) as i64;

    let milestone_based = seed % 3 == 2;
    let milestones = if milestone_based {
        vec![
            NewMilestone {
                name: "Contract signed".to_string(),
                percentage: Decimal::from(25),
                target_date: Some(start),
            },
            NewMilestone {
                name: "Production complete".to_string(),
                percentage: Decimal::from(50),
                target_date: Some(start + Duration::days(90)),
            },
            NewMilestone {
                name: "Final delivery".to_string(),
                percentage: Decimal::from(25),
                target_date: Some(end),
            },
        ]
    } else {
        Vec::new()
    };

    NewDeferredRevenueSchedule {
        client_id: CLIENTS[seed % CLIENTS.len()].to_string(),
        project_id: Some(format!("project-{:03}", seed / 2 + 1)),
        contract_id: Some(format!("contract-{:04}", seed + 1)),
        invoice_id: None,
        total_amount: Money::from_cents(total_cents),
        currency: None,
        recognition_method: if milestone_based {
            RecognitionMethod::Milestone
        } else {
            RecognitionMethod::StraightLine
        },
        start_date: start,
        end_date: end,
        description: Some(format!("Season retainer {}", seed + 1)),
        milestones,
    }
}
