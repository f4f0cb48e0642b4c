use super::*;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSubscriptionParams {
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
    pub plan: String,
    pub start_date: String,
    pub status: String,
}

/// A subscription joined at read time with the vehicle it currently
/// covers.
#[derive(Debug, Serialize)]
pub struct SubscriptionWithVehicle {
    #[serde(flatten)]
    pub subscription: subscription::Model,
    pub vehicle: Option<vehicle::Model>,
}

impl Database {
    /// Creates a subscription binding one of the user's vehicles to a
    /// plan. The vehicle must belong to the user and must not already
    /// carry an active subscription.
    pub async fn create_subscription(
        &self,
        params: &CreateSubscriptionParams,
    ) -> Result<SubscriptionWithVehicle> {
        let plan = params.plan.trim();
        if plan.is_empty() {
            return Err(Error::Validation("plan must not be empty".into()));
        }
        let start_date = parse_date("start date", &params.start_date)?;
        let status = parse_subscription_status(&params.status)?;

        self.transaction(|tx| async move {
            let vehicle = vehicle::Entity::find_by_id(params.vehicle_id)
                .one(&*tx)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!("no vehicle with id {}", params.vehicle_id))
                })?;
            if vehicle.user_id != params.user_id {
                return Err(Error::Validation(format!(
                    "vehicle {} does not belong to user {}",
                    vehicle.id, params.user_id
                )));
            }

            if self
                .vehicle_has_active_subscription_in_tx(vehicle.id, None, &tx)
                .await?
            {
                return Err(Error::Conflict(format!(
                    "vehicle {} already has an active subscription",
                    vehicle.id
                )));
            }

            let now = Utc::now().naive_utc();
            let subscription = subscription::Entity::insert(subscription::ActiveModel {
                user_id: ActiveValue::set(params.user_id),
                vehicle_id: ActiveValue::set(vehicle.id),
                plan: ActiveValue::set(plan.to_string()),
                status: ActiveValue::set(status),
                start_date: ActiveValue::set(start_date),
                end_date: ActiveValue::set(None),
                created_at: ActiveValue::set(now),
                updated_at: ActiveValue::set(now),
                ..Default::default()
            })
            .exec_with_returning(&*tx)
            .await?;

            Ok(SubscriptionWithVehicle {
                subscription,
                vehicle: Some(vehicle),
            })
        })
        .await
    }

    /// Moves a subscription onto another of its owner's vehicles. The
    /// subscription keeps its identity, plan, and purchase history; only
    /// the vehicle reference changes. The write is conditional on the
    /// vehicle reference that was read, so of two racing transfers onto
    /// one vehicle exactly one lands and the other fails `Conflict`.
    pub async fn transfer_subscription(
        &self,
        id: SubscriptionId,
        new_vehicle_id: VehicleId,
    ) -> Result<SubscriptionWithVehicle> {
        self.transaction(|tx| async move {
            let subscription = subscription::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no subscription with id {id}")))?;
            let vehicle = vehicle::Entity::find_by_id(new_vehicle_id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no vehicle with id {new_vehicle_id}")))?;
            if vehicle.user_id != subscription.user_id {
                return Err(Error::Validation(format!(
                    "vehicle {} does not belong to user {}",
                    vehicle.id, subscription.user_id
                )));
            }

            if self
                .vehicle_has_active_subscription_in_tx(vehicle.id, Some(subscription.id), &tx)
                .await?
            {
                return Err(Error::Conflict(format!(
                    "vehicle {} already has an active subscription",
                    vehicle.id
                )));
            }

            let updated = subscription::Entity::update_many()
                .filter(
                    subscription::Column::Id
                        .eq(subscription.id)
                        .and(subscription::Column::VehicleId.eq(subscription.vehicle_id)),
                )
                .col_expr(subscription::Column::VehicleId, Expr::value(vehicle.id))
                .col_expr(
                    subscription::Column::UpdatedAt,
                    Expr::value(Utc::now().naive_utc()),
                )
                .exec(&*tx)
                .await?;
            if updated.rows_affected != 1 {
                return Err(Error::Conflict(format!(
                    "subscription {} was transferred concurrently",
                    subscription.id
                )));
            }

            let subscription = subscription::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no subscription with id {id}")))?;

            Ok(SubscriptionWithVehicle {
                subscription,
                vehicle: Some(vehicle),
            })
        })
        .await
    }

    /// Sets the subscription's status. An end date may accompany the new
    /// status; it is stored exactly as supplied and never inferred, so a
    /// cancellation without one leaves the subscription open-ended.
    pub async fn update_subscription_status(
        &self,
        id: SubscriptionId,
        status: &str,
        end_date: Option<&str>,
    ) -> Result<subscription::Model> {
        let status = parse_subscription_status(status)?;
        let end_date = end_date
            .map(|end_date| parse_date("end date", end_date))
            .transpose()?;

        self.transaction(|tx| async move {
            let subscription = subscription::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no subscription with id {id}")))?;

            if status == SubscriptionStatus::Active
                && self
                    .vehicle_has_active_subscription_in_tx(
                        subscription.vehicle_id,
                        Some(subscription.id),
                        &tx,
                    )
                    .await?
            {
                return Err(Error::Conflict(format!(
                    "vehicle {} already has an active subscription",
                    subscription.vehicle_id
                )));
            }

            let mut subscription = subscription.into_active_model();
            subscription.status = ActiveValue::set(status);
            if let Some(end_date) = end_date {
                subscription.end_date = ActiveValue::set(Some(end_date));
            }
            subscription.updated_at = ActiveValue::set(Utc::now().naive_utc());

            Ok(subscription.update(&*tx).await?)
        })
        .await
    }

    /// Renames the subscription's plan. Nothing else changes; vehicle
    /// moves go through [`Self::transfer_subscription`].
    pub async fn update_subscription_plan(
        &self,
        id: SubscriptionId,
        plan: &str,
    ) -> Result<subscription::Model> {
        let plan = plan.trim();
        if plan.is_empty() {
            return Err(Error::Validation("plan must not be empty".into()));
        }

        self.transaction(|tx| async move {
            let subscription = subscription::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no subscription with id {id}")))?;

            let mut subscription = subscription.into_active_model();
            subscription.plan = ActiveValue::set(plan.to_string());
            subscription.updated_at = ActiveValue::set(Utc::now().naive_utc());

            Ok(subscription.update(&*tx).await?)
        })
        .await
    }

    /// Hard-removes a subscription record, for cleaning up records created
    /// in error. Cancellation is a status change, not this. Purchase
    /// history referencing the subscription is left untouched.
    pub async fn delete_subscription(&self, id: SubscriptionId) -> Result<SubscriptionId> {
        self.transaction(|tx| async move {
            let subscription = subscription::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no subscription with id {id}")))?;

            subscription::Entity::delete_by_id(subscription.id)
                .exec(&*tx)
                .await?;

            Ok(subscription.id)
        })
        .await
    }

    /// Returns the user's subscriptions, most recently created first, each
    /// joined with the vehicle it currently covers.
    pub async fn list_subscriptions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SubscriptionWithVehicle>> {
        self.transaction(|tx| async move {
            Ok(subscription::Entity::find()
                .filter(subscription::Column::UserId.eq(user_id))
                .order_by_desc(subscription::Column::CreatedAt)
                .order_by_desc(subscription::Column::Id)
                .find_also_related(vehicle::Entity)
                .all(&*tx)
                .await?
                .into_iter()
                .map(|(subscription, vehicle)| SubscriptionWithVehicle {
                    subscription,
                    vehicle,
                })
                .collect())
        })
        .await
    }

    async fn vehicle_has_active_subscription_in_tx(
        &self,
        vehicle_id: VehicleId,
        except: Option<SubscriptionId>,
        tx: &DatabaseTransaction,
    ) -> Result<bool> {
        let mut find = subscription::Entity::find()
            .filter(subscription::Column::VehicleId.eq(vehicle_id))
            .filter(subscription::Column::Status.eq(SubscriptionStatus::Active));
        if let Some(except) = except {
            find = find.filter(subscription::Column::Id.ne(except));
        }

        Ok(find.count(tx).await? > 0)
    }
}

fn parse_subscription_status(status: &str) -> Result<SubscriptionStatus> {
    status
        .parse()
        .map_err(|_| Error::Validation(format!("unrecognized subscription status {status:?}")))
}
