use crate::db::{PurchaseHistoryId, SubscriptionId, UserId, VehicleId};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One purchase on a subscriber's ledger. Append-only: rows are written
/// once and never mutated or deleted. `subscription_id` and `vehicle_id`
/// are point-in-time references captured when the purchase happened; they
/// are deliberately unconstrained so that later hard-deletes cannot
/// rewrite history.
#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "purchase_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: PurchaseHistoryId,
    pub user_id: UserId,
    pub subscription_id: Option<SubscriptionId>,
    pub vehicle_id: Option<VehicleId>,
    pub purchase_date: Date,
    pub amount: Decimal,
    pub description: String,
    pub plan: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::subscription::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription::Column::Id"
    )]
    Subscription,
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
