use crate::{
    db::{
        subscription, user, vehicle, CreateSubscriptionParams, CreateVehicleParams,
        PurchaseHistoryEntry, RecordPurchaseParams, SubscriptionId, SubscriptionWithVehicle,
        UpdateUserParams, UpdateVehicleParams, UserId, UserSnapshot, VehicleId,
    },
    AppState, Result,
};
use axum::{
    extract::{Path, Query},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(get_users))
        .route("/users/:id", get(get_user).put(update_user))
        .route("/users/:id/vehicles", get(get_vehicles))
        .route("/users/:id/subscriptions", get(get_subscriptions))
        .route("/users/:id/purchase-history", get(get_purchase_history))
        .route("/users/:id/snapshot", get(get_user_snapshot))
        .route("/vehicles", post(create_vehicle))
        .route("/vehicles/:id", put(update_vehicle).delete(delete_vehicle))
        .route("/subscriptions", post(create_subscription))
        .route("/subscriptions/:id", delete(delete_subscription))
        .route("/subscriptions/:id/transfer", post(transfer_subscription))
        .route("/subscriptions/:id/status", put(update_subscription_status))
        .route("/subscriptions/:id/plan", put(update_subscription_plan))
        .route("/purchase-history", post(record_purchase))
        .layer(ServiceBuilder::new().layer(Extension(state)))
}

#[derive(Debug, Deserialize)]
struct GetUsersParams {
    search: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUsersResponse {
    data: Vec<user::Model>,
}

async fn get_users(
    Query(params): Query<GetUsersParams>,
    Extension(app): Extension<Arc<AppState>>,
) -> Result<Json<GetUsersResponse>> {
    let data = app.db.get_users(params.search.as_deref()).await?;
    Ok(Json(GetUsersResponse { data }))
}

async fn get_user(
    Path(id): Path<UserId>,
    Extension(app): Extension<Arc<AppState>>,
) -> Result<Json<user::Model>> {
    Ok(Json(app.db.get_user(id).await?))
}

async fn update_user(
    Path(id): Path<UserId>,
    Extension(app): Extension<Arc<AppState>>,
    Json(params): Json<UpdateUserParams>,
) -> Result<Json<user::Model>> {
    Ok(Json(app.db.update_user(id, &params).await?))
}

async fn get_vehicles(
    Path(id): Path<UserId>,
    Extension(app): Extension<Arc<AppState>>,
) -> Result<Json<Vec<vehicle::Model>>> {
    Ok(Json(app.db.get_vehicles(id).await?))
}

async fn get_subscriptions(
    Path(id): Path<UserId>,
    Extension(app): Extension<Arc<AppState>>,
) -> Result<Json<Vec<SubscriptionWithVehicle>>> {
    Ok(Json(app.db.list_subscriptions_for_user(id).await?))
}

async fn get_purchase_history(
    Path(id): Path<UserId>,
    Extension(app): Extension<Arc<AppState>>,
) -> Result<Json<Vec<PurchaseHistoryEntry>>> {
    Ok(Json(app.db.list_purchase_history(id).await?))
}

async fn get_user_snapshot(
    Path(id): Path<UserId>,
    Extension(app): Extension<Arc<AppState>>,
) -> Result<Json<UserSnapshot>> {
    Ok(Json(app.db.get_user_snapshot(id).await?))
}

async fn create_vehicle(
    Extension(app): Extension<Arc<AppState>>,
    Json(params): Json<CreateVehicleParams>,
) -> Result<Json<vehicle::Model>> {
    Ok(Json(app.db.create_vehicle(&params).await?))
}

async fn update_vehicle(
    Path(id): Path<VehicleId>,
    Extension(app): Extension<Arc<AppState>>,
    Json(params): Json<UpdateVehicleParams>,
) -> Result<Json<vehicle::Model>> {
    Ok(Json(app.db.update_vehicle(id, &params).await?))
}

async fn delete_vehicle(
    Path(id): Path<VehicleId>,
    Extension(app): Extension<Arc<AppState>>,
) -> Result<()> {
    app.db.delete_vehicle(id).await
}

async fn create_subscription(
    Extension(app): Extension<Arc<AppState>>,
    Json(params): Json<CreateSubscriptionParams>,
) -> Result<Json<SubscriptionWithVehicle>> {
    Ok(Json(app.db.create_subscription(&params).await?))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransferSubscriptionBody {
    vehicle_id: VehicleId,
}

async fn transfer_subscription(
    Path(id): Path<SubscriptionId>,
    Extension(app): Extension<Arc<AppState>>,
    Json(body): Json<TransferSubscriptionBody>,
) -> Result<Json<SubscriptionWithVehicle>> {
    Ok(Json(app.db.transfer_subscription(id, body.vehicle_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateSubscriptionStatusBody {
    status: String,
    end_date: Option<String>,
}

async fn update_subscription_status(
    Path(id): Path<SubscriptionId>,
    Extension(app): Extension<Arc<AppState>>,
    Json(body): Json<UpdateSubscriptionStatusBody>,
) -> Result<Json<subscription::Model>> {
    Ok(Json(
        app.db
            .update_subscription_status(id, &body.status, body.end_date.as_deref())
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateSubscriptionPlanBody {
    plan: String,
}

async fn update_subscription_plan(
    Path(id): Path<SubscriptionId>,
    Extension(app): Extension<Arc<AppState>>,
    Json(body): Json<UpdateSubscriptionPlanBody>,
) -> Result<Json<subscription::Model>> {
    Ok(Json(app.db.update_subscription_plan(id, &body.plan).await?))
}

#[derive(Debug, Serialize)]
struct DeleteSubscriptionResponse {
    id: SubscriptionId,
}

async fn delete_subscription(
    Path(id): Path<SubscriptionId>,
    Extension(app): Extension<Arc<AppState>>,
) -> Result<Json<DeleteSubscriptionResponse>> {
    let id = app.db.delete_subscription(id).await?;
    Ok(Json(DeleteSubscriptionResponse { id }))
}

async fn record_purchase(
    Extension(app): Extension<Arc<AppState>>,
    Json(params): Json<RecordPurchaseParams>,
) -> Result<Json<crate::db::purchase_history::Model>> {
    Ok(Json(app.db.record_purchase(&params).await?))
}
