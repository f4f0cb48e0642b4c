use super::*;
use crate::test_both_dbs;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

test_both_dbs!(
    test_snapshot_for_missing_user,
    test_snapshot_for_missing_user_postgres,
    test_snapshot_for_missing_user_sqlite
);

async fn test_snapshot_for_missing_user(db: &Arc<Database>) {
    let result = db.get_user_snapshot(UserId(4242)).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

test_both_dbs!(
    test_snapshot_with_no_relationships,
    test_snapshot_with_no_relationships_postgres,
    test_snapshot_with_no_relationships_sqlite
);

async fn test_snapshot_with_no_relationships(db: &Arc<Database>) {
    let user = new_test_user(db, "Yara Haddad", "yara@example.com").await;

    // A user with nothing attached is a valid snapshot, not an error.
    let snapshot = db.get_user_snapshot(user.id).await.unwrap();
    assert_eq!(snapshot.user.id, user.id);
    assert_eq!(snapshot.vehicles, vec![]);
    assert!(snapshot.subscriptions.is_empty());
    assert!(snapshot.purchase_history.is_empty());
}

test_both_dbs!(
    test_snapshot_assembles_all_slices,
    test_snapshot_assembles_all_slices_postgres,
    test_snapshot_assembles_all_slices_sqlite
);

async fn test_snapshot_assembles_all_slices(db: &Arc<Database>) {
    let user = new_test_user(db, "Zeno Laurito", "zeno@example.com").await;
    let other = new_test_user(db, "Aya Kimura", "aya@example.com").await;

    let vehicle_1 = new_test_vehicle(db, user.id, "ZENO-1").await;
    let vehicle_2 = new_test_vehicle(db, user.id, "ZENO-2").await;
    new_test_vehicle(db, other.id, "AYA-1").await;

    let subscription = new_test_subscription(db, user.id, vehicle_1.id, "Premium", "active").await;
    db.record_purchase(&RecordPurchaseParams {
        user_id: user.id,
        purchase_date: "2024-02-01".to_string(),
        amount: Decimal::new(9900, 2),
        description: "Premium payment".to_string(),
        plan: Some("Premium".to_string()),
        subscription_id: Some(subscription.subscription.id),
        vehicle_id: Some(vehicle_1.id),
    })
    .await
    .unwrap();

    let snapshot = db.get_user_snapshot(user.id).await.unwrap();
    assert_eq!(snapshot.user.name, "Zeno Laurito");
    assert_eq!(
        snapshot
            .vehicles
            .iter()
            .map(|vehicle| vehicle.id)
            .collect::<Vec<_>>(),
        vec![vehicle_1.id, vehicle_2.id]
    );
    assert_eq!(snapshot.subscriptions.len(), 1);
    assert_eq!(
        snapshot.subscriptions[0].vehicle.as_ref().unwrap().id,
        vehicle_1.id
    );
    assert_eq!(snapshot.purchase_history.len(), 1);
    assert_eq!(
        snapshot.purchase_history[0]
            .subscription
            .as_ref()
            .unwrap()
            .id,
        subscription.subscription.id
    );

    // Slices never leak across users.
    let snapshot = db.get_user_snapshot(other.id).await.unwrap();
    assert_eq!(snapshot.vehicles.len(), 1);
    assert!(snapshot.subscriptions.is_empty());
    assert!(snapshot.purchase_history.is_empty());
}
