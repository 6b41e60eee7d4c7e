//! Database seeder for Bursary development and testing.
//!
//! Seeds the default wallets, expense categories and the monthly accounting
//! periods of the current year. Rows that already exist are skipped, so the
//! seeder can be re-run safely. With `--sync-sequences` it also raises the
//! reference-code counters above any codes already stored.
//!
//! Usage: cargo run --bin seeder [-- --sync-sequences]

use anyhow::Context;
use chrono::{Datelike, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use bursary_core::ledger::{LedgerError, LedgerSettings, NewWallet, WalletKind};
use bursary_core::period::monthly_periods;
use bursary_core::sequence::SequencePrefix;
use bursary_db::LedgerEngine;
use bursary_db::entities::expense_categories;
use bursary_shared::types::UserId;
use bursary_shared::{AppConfig, LoggingConfig};

/// Wallets every installation starts with.
const DEFAULT_WALLETS: [(&str, WalletKind); 3] = [
    ("Main Cash", WalletKind::Cash),
    ("Operating Bank", WalletKind::Bank),
    ("Endowment Investments", WalletKind::Investment),
];

const DEFAULT_CURRENCY: &str = "INR";

const DEFAULT_CATEGORIES: [&str; 8] = [
    "Utilities",
    "Maintenance",
    "Laboratory Supplies",
    "Library",
    "Office Supplies",
    "Transport",
    "Events",
    "Examinations",
];

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let db = bursary_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let engine = LedgerEngine::new(db.clone(), LedgerSettings::from(&config.ledger));

    // Seeded rows are attributed to the nil user.
    let system = UserId::from_uuid(Uuid::nil());

    seed_wallets(&engine, system).await?;
    seed_categories(&db).await?;
    seed_periods(&engine, system).await?;

    if std::env::args().any(|arg| arg == "--sync-sequences") {
        sync_sequences(&engine).await?;
    }

    bursary_db::close(db).await?;
    info!("seeding complete");
    Ok(())
}

async fn seed_wallets(engine: &LedgerEngine, system: UserId) -> anyhow::Result<()> {
    for (name, kind) in DEFAULT_WALLETS {
        if engine.wallets().find_by_name(name).await?.is_some() {
            info!(wallet = name, "wallet already exists, skipping");
            continue;
        }

        let created = engine
            .create_wallet(
                &NewWallet {
                    name: name.to_string(),
                    kind,
                    currency: DEFAULT_CURRENCY.to_string(),
                },
                system,
            )
            .await?;
        for warning in &created.warnings {
            warn!(wallet = name, ?warning, "wallet created without audit record");
        }
    }
    Ok(())
}

async fn seed_categories(db: &DatabaseConnection) -> anyhow::Result<()> {
    for name in DEFAULT_CATEGORIES {
        let existing = expense_categories::Entity::find()
            .filter(expense_categories::Column::Name.eq(name))
            .one(db)
            .await?;
        if existing.is_some() {
            info!(category = name, "expense category already exists, skipping");
            continue;
        }

        expense_categories::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .with_context(|| format!("failed to insert expense category {name}"))?;
        info!(category = name, "expense category created");
    }
    Ok(())
}

async fn seed_periods(engine: &LedgerEngine, system: UserId) -> anyhow::Result<()> {
    let year = Utc::now().year();
    for spec in monthly_periods(year) {
        match engine.create_period(&spec, system).await {
            Ok(_) => {}
            Err(LedgerError::PeriodOverlap(existing)) => {
                info!(period = %spec.name, %existing, "period already covered, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn sync_sequences(engine: &LedgerEngine) -> anyhow::Result<()> {
    let year = Utc::now().year();
    let sequences = engine.sequences();
    for prefix in SequencePrefix::ALL {
        let greatest = sequences.greatest_existing_code(prefix, year).await?;
        let value = sequences
            .seed_from_code(prefix, year, greatest.as_deref())
            .await?;
        info!(%prefix, year, value, "sequence counter in sync");
    }
    Ok(())
}
