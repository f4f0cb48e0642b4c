use super::*;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordPurchaseParams {
    pub user_id: UserId,
    pub purchase_date: String,
    pub amount: Decimal,
    pub description: String,
    pub plan: Option<String>,
    pub subscription_id: Option<SubscriptionId>,
    pub vehicle_id: Option<VehicleId>,
}

/// A purchase decorated for display with the subscription and vehicle it
/// referenced, as those records exist *now*. The stored fact never
/// changes, but the joined plan/status/plate can drift from what was true
/// at purchase time after a transfer or plan change.
#[derive(Debug, Serialize)]
pub struct PurchaseHistoryEntry {
    #[serde(flatten)]
    pub purchase: purchase_history::Model,
    pub subscription: Option<PurchaseSubscription>,
    pub vehicle: Option<PurchaseVehicle>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PurchaseSubscription {
    pub id: SubscriptionId,
    pub plan: String,
    pub status: SubscriptionStatus,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PurchaseVehicle {
    pub id: VehicleId,
    pub make: String,
    pub model: String,
    pub license_plate: String,
}

impl Database {
    /// Appends a purchase to the user's ledger. The optional subscription
    /// and vehicle references are captured as given and never re-resolved;
    /// rows written here are never updated or deleted.
    pub async fn record_purchase(
        &self,
        params: &RecordPurchaseParams,
    ) -> Result<purchase_history::Model> {
        if params.description.trim().is_empty() {
            return Err(Error::Validation("description must not be empty".into()));
        }
        if params.amount < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "amount {} must not be negative",
                params.amount
            )));
        }
        let purchase_date = parse_date("purchase date", &params.purchase_date)?;

        self.transaction(|tx| async move {
            user::Entity::find_by_id(params.user_id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no user with id {}", params.user_id)))?;

            Ok(
                purchase_history::Entity::insert(purchase_history::ActiveModel {
                    user_id: ActiveValue::set(params.user_id),
                    subscription_id: ActiveValue::set(params.subscription_id),
                    vehicle_id: ActiveValue::set(params.vehicle_id),
                    purchase_date: ActiveValue::set(purchase_date),
                    amount: ActiveValue::set(params.amount),
                    description: ActiveValue::set(params.description.trim().to_string()),
                    plan: ActiveValue::set(params.plan.clone()),
                    created_at: ActiveValue::set(Utc::now().naive_utc()),
                    ..Default::default()
                })
                .exec_with_returning(&*tx)
                .await?,
            )
        })
        .await
    }

    /// Returns the user's purchases, newest first, each enriched with the
    /// current state of the subscription (id/plan/status) and vehicle
    /// (id/make/model/plate) it referenced. Dangling references are simply
    /// omitted from the enrichment.
    pub async fn list_purchase_history(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PurchaseHistoryEntry>> {
        self.transaction(|tx| async move {
            let purchases = purchase_history::Entity::find()
                .filter(purchase_history::Column::UserId.eq(user_id))
                .order_by_desc(purchase_history::Column::PurchaseDate)
                .order_by_desc(purchase_history::Column::Id)
                .all(&*tx)
                .await?;

            let subscription_ids = purchases
                .iter()
                .filter_map(|purchase| purchase.subscription_id)
                .collect::<Vec<_>>();
            let mut subscriptions = HashMap::new();
            if !subscription_ids.is_empty() {
                for subscription in subscription::Entity::find()
                    .filter(subscription::Column::Id.is_in(subscription_ids))
                    .all(&*tx)
                    .await?
                {
                    subscriptions.insert(subscription.id, subscription);
                }
            }

            let vehicle_ids = purchases
                .iter()
                .filter_map(|purchase| purchase.vehicle_id)
                .collect::<Vec<_>>();
            let mut vehicles = HashMap::new();
            if !vehicle_ids.is_empty() {
                for vehicle in vehicle::Entity::find()
                    .filter(vehicle::Column::Id.is_in(vehicle_ids))
                    .all(&*tx)
                    .await?
                {
                    vehicles.insert(vehicle.id, vehicle);
                }
            }

            Ok(purchases
                .into_iter()
                .map(|purchase| {
                    let subscription = purchase
                        .subscription_id
                        .and_then(|id| subscriptions.get(&id))
                        .map(|subscription| PurchaseSubscription {
                            id: subscription.id,
                            plan: subscription.plan.clone(),
                            status: subscription.status,
                        });
                    let vehicle = purchase
                        .vehicle_id
                        .and_then(|id| vehicles.get(&id))
                        .map(|vehicle| PurchaseVehicle {
                            id: vehicle.id,
                            make: vehicle.make.clone(),
                            model: vehicle.model.clone(),
                            license_plate: vehicle.license_plate.clone(),
                        });
                    PurchaseHistoryEntry {
                        purchase,
                        subscription,
                        vehicle,
                    }
                })
                .collect())
        })
        .await
    }
}
