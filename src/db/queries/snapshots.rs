use super::*;

/// Everything the portal's detail view shows about one subscriber: the
/// account, its vehicles, its subscriptions joined with their vehicles,
/// and the purchase ledger.
#[derive(Debug, Serialize)]
pub struct UserSnapshot {
    pub user: user::Model,
    pub vehicles: Vec<vehicle::Model>,
    pub subscriptions: Vec<SubscriptionWithVehicle>,
    pub purchase_history: Vec<PurchaseHistoryEntry>,
}

impl Database {
    /// Assembles a user's relationship snapshot from four independent
    /// reads. Only a missing user is fatal; a user with no vehicles,
    /// subscriptions, or purchases yields empty slices. Callers refreshing
    /// after a mutation should instead re-read just the affected slice via
    /// the individual list operations.
    pub async fn get_user_snapshot(&self, user_id: UserId) -> Result<UserSnapshot> {
        let user = self.get_user(user_id).await?;
        let vehicles = self.get_vehicles(user_id).await?;
        let subscriptions = self.list_subscriptions_for_user(user_id).await?;
        let purchase_history = self.list_purchase_history(user_id).await?;

        Ok(UserSnapshot {
            user,
            vehicles,
            subscriptions,
            purchase_history,
        })
    }
}
