use crate::db::{SubscriptionId, UserId, VehicleId};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A subscription binding one of a subscriber's vehicles to a billing
/// plan. At most one subscription with status `active` may reference a
/// vehicle at any time, and `user_id` always equals the referenced
/// vehicle's owner.
#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub start_date: Date,
    /// Absent for open-ended coverage.
    pub end_date: Option<Date>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
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

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The lifecycle status of a subscription. There are no clock-driven
/// transitions here; `overdue` is fed in by the billing side as a plain
/// status value.
#[derive(
    Eq,
    PartialEq,
    Copy,
    Clone,
    Debug,
    EnumIter,
    DeriveActiveEnum,
    Default,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "canceled")]
    Canceled,
    #[sea_orm(string_value = "overdue")]
    Overdue,
}
