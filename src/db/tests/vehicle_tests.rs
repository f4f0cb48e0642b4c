use super::*;
use crate::test_both_dbs;
use pretty_assertions::assert_eq;

test_both_dbs!(
    test_create_vehicle_validation,
    test_create_vehicle_validation_postgres,
    test_create_vehicle_validation_sqlite
);

async fn test_create_vehicle_validation(db: &Arc<Database>) {
    let user = new_test_user(db, "Fern Liu", "fern@example.com").await;

    let result = db
        .create_vehicle(&CreateVehicleParams {
            user_id: user.id,
            license_plate: "".to_string(),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2020,
        })
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let result = db
        .create_vehicle(&CreateVehicleParams {
            user_id: user.id,
            license_plate: "FERN-1".to_string(),
            make: "Ford".to_string(),
            model: "Model T".to_string(),
            year: 1899,
        })
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let result = db
        .create_vehicle(&CreateVehicleParams {
            user_id: user.id,
            license_plate: "FERN-1".to_string(),
            make: "DeLorean".to_string(),
            model: "DMC-12".to_string(),
            year: 2100,
        })
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let result = db
        .create_vehicle(&CreateVehicleParams {
            user_id: UserId(4242),
            license_plate: "FERN-1".to_string(),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2020,
        })
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    // The plate is stored trimmed.
    let vehicle = db
        .create_vehicle(&CreateVehicleParams {
            user_id: user.id,
            license_plate: "  FERN-1  ".to_string(),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2020,
        })
        .await
        .unwrap();
    assert_eq!(vehicle.license_plate, "FERN-1");
    assert_eq!(vehicle.user_id, user.id);
}

test_both_dbs!(
    test_license_plate_conflicts,
    test_license_plate_conflicts_postgres,
    test_license_plate_conflicts_sqlite
);

async fn test_license_plate_conflicts(db: &Arc<Database>) {
    let gina = new_test_user(db, "Gina Patel", "gina@example.com").await;
    let hugo = new_test_user(db, "Hugo Mbeki", "hugo@example.com").await;
    new_test_vehicle(db, gina.id, "SHARED-1").await;

    // Plates are unique across the whole system, whoever owns them.
    let result = db
        .create_vehicle(&CreateVehicleParams {
            user_id: hugo.id,
            license_plate: "SHARED-1".to_string(),
            make: "Kia".to_string(),
            model: "Rio".to_string(),
            year: 2019,
        })
        .await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    let result = db
        .create_vehicle(&CreateVehicleParams {
            user_id: gina.id,
            license_plate: "SHARED-1".to_string(),
            make: "Kia".to_string(),
            model: "Rio".to_string(),
            year: 2019,
        })
        .await;
    assert!(matches!(result, Err(Error::Conflict(_))));
}

test_both_dbs!(
    test_update_vehicle,
    test_update_vehicle_postgres,
    test_update_vehicle_sqlite
);

async fn test_update_vehicle(db: &Arc<Database>) {
    let user = new_test_user(db, "Iris Novak", "iris@example.com").await;
    let vehicle = new_test_vehicle(db, user.id, "IRIS-1").await;
    new_test_vehicle(db, user.id, "IRIS-2").await;

    // Round trip: only the provided field changes.
    let updated = db
        .update_vehicle(
            vehicle.id,
            &UpdateVehicleParams {
                make: Some("Toyota".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.make, "Toyota");
    assert_eq!(updated.model, vehicle.model);
    assert_eq!(updated.year, vehicle.year);
    assert_eq!(updated.license_plate, vehicle.license_plate);

    let listed = db.get_vehicles(user.id).await.unwrap();
    assert_eq!(listed[0].make, "Toyota");

    // Changing the plate re-checks uniqueness against other vehicles.
    let result = db
        .update_vehicle(
            vehicle.id,
            &UpdateVehicleParams {
                license_plate: Some("IRIS-2".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    // Re-writing a vehicle's own plate is not a conflict.
    let updated = db
        .update_vehicle(
            vehicle.id,
            &UpdateVehicleParams {
                license_plate: Some("IRIS-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.license_plate, "IRIS-1");

    let result = db
        .update_vehicle(
            vehicle.id,
            &UpdateVehicleParams {
                year: Some(1850),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let result = db
        .update_vehicle(VehicleId(4242), &UpdateVehicleParams::default())
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

test_both_dbs!(
    test_delete_vehicle_referential_guard,
    test_delete_vehicle_referential_guard_postgres,
    test_delete_vehicle_referential_guard_sqlite
);

async fn test_delete_vehicle_referential_guard(db: &Arc<Database>) {
    let user = new_test_user(db, "Jo Okoye", "jo@example.com").await;
    let vehicle = new_test_vehicle(db, user.id, "JO-1").await;
    let subscription = new_test_subscription(db, user.id, vehicle.id, "Basic", "active").await;

    let result = db.delete_vehicle(vehicle.id).await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    // Cancellation is not enough: any referencing subscription, whatever
    // its status, blocks deletion.
    db.update_subscription_status(subscription.subscription.id, "canceled", None)
        .await
        .unwrap();
    let result = db.delete_vehicle(vehicle.id).await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    db.delete_subscription(subscription.subscription.id)
        .await
        .unwrap();
    db.delete_vehicle(vehicle.id).await.unwrap();
    assert_eq!(db.get_vehicles(user.id).await.unwrap(), vec![]);

    let result = db.delete_vehicle(vehicle.id).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}
