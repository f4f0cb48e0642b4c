use crate::db::{self, Database};
use crate::Result;
use anyhow::Context as _;
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SeedConfig {
    users: Vec<SeedUser>,
}

#[derive(Debug, Deserialize)]
struct SeedUser {
    name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    vehicles: Vec<SeedVehicle>,
}

#[derive(Debug, Deserialize)]
struct SeedVehicle {
    license_plate: String,
    make: String,
    model: String,
    year: i32,
    /// When present, the vehicle is seeded with an active subscription on
    /// this plan.
    #[serde(default)]
    plan: Option<String>,
}

/// Seeds demo subscribers for development. Users already present (matched
/// by email) are skipped, so seeding is idempotent across restarts.
pub async fn seed(db: &Database, seed_path: &Path) -> Result<()> {
    let seed_config = std::fs::read_to_string(seed_path)
        .with_context(|| format!("failed to read seed file {seed_path:?}"))?;
    let seed_config: SeedConfig =
        serde_json::from_str(&seed_config).context("failed to parse seed file")?;

    for seed_user in seed_config.users {
        if db.get_user_by_email(&seed_user.email).await?.is_some() {
            continue;
        }

        let user = db
            .create_user(&db::CreateUserParams {
                name: seed_user.name,
                email: seed_user.email,
                phone: seed_user.phone,
            })
            .await?;

        for seed_vehicle in seed_user.vehicles {
            let vehicle = db
                .create_vehicle(&db::CreateVehicleParams {
                    user_id: user.id,
                    license_plate: seed_vehicle.license_plate,
                    make: seed_vehicle.make,
                    model: seed_vehicle.model,
                    year: seed_vehicle.year,
                })
                .await?;

            if let Some(plan) = seed_vehicle.plan {
                db.create_subscription(&db::CreateSubscriptionParams {
                    user_id: user.id,
                    vehicle_id: vehicle.id,
                    plan,
                    start_date: Utc::now().date_naive().to_string(),
                    status: "active".to_string(),
                })
                .await?;
            }
        }

        tracing::info!(user_id = %user.id, "seeded demo user");
    }

    Ok(())
}
