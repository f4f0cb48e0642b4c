use super::*;

pub const MIN_VEHICLE_YEAR: i32 = 1900;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateVehicleParams {
    pub user_id: UserId,
    pub license_plate: String,
    pub make: String,
    pub model: String,
    pub year: i32,
}

/// Partial update for a vehicle; only present fields change.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateVehicleParams {
    pub license_plate: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

impl Database {
    /// Returns all vehicles owned by the user, oldest first.
    pub async fn get_vehicles(&self, user_id: UserId) -> Result<Vec<vehicle::Model>> {
        self.transaction(|tx| async move {
            Ok(vehicle::Entity::find()
                .filter(vehicle::Column::UserId.eq(user_id))
                .order_by_asc(vehicle::Column::Id)
                .all(&*tx)
                .await?)
        })
        .await
    }

    /// Registers a vehicle for the user. Also the first step of the
    /// reactivation flow: callers re-activate a canceled account by
    /// registering a vehicle and then setting the account status back to
    /// `active`.
    pub async fn create_vehicle(&self, params: &CreateVehicleParams) -> Result<vehicle::Model> {
        let license_plate = params.license_plate.trim();
        if license_plate.is_empty() {
            return Err(Error::Validation("license plate must not be empty".into()));
        }
        validate_vehicle_year(params.year)?;

        self.transaction(|tx| async move {
            user::Entity::find_by_id(params.user_id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no user with id {}", params.user_id)))?;

            if let Some(existing) = vehicle::Entity::find()
                .filter(vehicle::Column::LicensePlate.eq(license_plate))
                .one(&*tx)
                .await?
            {
                return Err(Error::Conflict(format!(
                    "license plate {license_plate:?} is already registered to vehicle {}",
                    existing.id
                )));
            }

            let now = Utc::now().naive_utc();
            Ok(vehicle::Entity::insert(vehicle::ActiveModel {
                user_id: ActiveValue::set(params.user_id),
                license_plate: ActiveValue::set(license_plate.to_string()),
                make: ActiveValue::set(params.make.clone()),
                model: ActiveValue::set(params.model.clone()),
                year: ActiveValue::set(params.year),
                created_at: ActiveValue::set(now),
                updated_at: ActiveValue::set(now),
                ..Default::default()
            })
            .exec_with_returning(&*tx)
            .await?)
        })
        .await
    }

    /// Applies the provided fields to the vehicle and stamps `updated_at`.
    pub async fn update_vehicle(
        &self,
        id: VehicleId,
        params: &UpdateVehicleParams,
    ) -> Result<vehicle::Model> {
        if let Some(license_plate) = &params.license_plate {
            if license_plate.trim().is_empty() {
                return Err(Error::Validation("license plate must not be empty".into()));
            }
        }
        if let Some(year) = params.year {
            validate_vehicle_year(year)?;
        }

        self.transaction(|tx| async move {
            let vehicle = vehicle::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no vehicle with id {id}")))?;

            if let Some(license_plate) = &params.license_plate {
                let license_plate = license_plate.trim();
                if let Some(existing) = vehicle::Entity::find()
                    .filter(vehicle::Column::LicensePlate.eq(license_plate))
                    .filter(vehicle::Column::Id.ne(vehicle.id))
                    .one(&*tx)
                    .await?
                {
                    return Err(Error::Conflict(format!(
                        "license plate {license_plate:?} is already registered to vehicle {}",
                        existing.id
                    )));
                }
            }

            let mut vehicle = vehicle.into_active_model();
            if let Some(license_plate) = &params.license_plate {
                vehicle.license_plate = ActiveValue::set(license_plate.trim().to_string());
            }
            if let Some(make) = &params.make {
                vehicle.make = ActiveValue::set(make.clone());
            }
            if let Some(model) = &params.model {
                vehicle.model = ActiveValue::set(model.clone());
            }
            if let Some(year) = params.year {
                vehicle.year = ActiveValue::set(year);
            }
            vehicle.updated_at = ActiveValue::set(Utc::now().naive_utc());

            Ok(vehicle.update(&*tx).await?)
        })
        .await
    }

    /// Removes a vehicle. A vehicle still referenced by any subscription,
    /// whatever that subscription's status, cannot be deleted.
    pub async fn delete_vehicle(&self, id: VehicleId) -> Result<()> {
        self.transaction(|tx| async move {
            vehicle::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no vehicle with id {id}")))?;

            let referencing = subscription::Entity::find()
                .filter(subscription::Column::VehicleId.eq(id))
                .count(&*tx)
                .await?;
            if referencing > 0 {
                return Err(Error::Conflict(format!(
                    "vehicle {id} is still referenced by {referencing} subscription(s)"
                )));
            }

            vehicle::Entity::delete_by_id(id).exec(&*tx).await?;
            Ok(())
        })
        .await
    }
}

fn validate_vehicle_year(year: i32) -> Result<()> {
    let max_year = Utc::now().year() + 1;
    if !(MIN_VEHICLE_YEAR..=max_year).contains(&year) {
        return Err(Error::Validation(format!(
            "vehicle year {year} must be between {MIN_VEHICLE_YEAR} and {max_year}"
        )));
    }
    Ok(())
}
