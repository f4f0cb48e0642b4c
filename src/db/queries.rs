use super::*;

pub mod purchases;
pub mod snapshots;
pub mod subscriptions;
pub mod users;
pub mod vehicles;
