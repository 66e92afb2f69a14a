mod common;

use chrono::{Duration, Utc};
use fleetshop_api::{
    dto::maintenance::{CreateVehicleRequest, MaintenanceInput, PartInput},
    entity::{CompletedMaintenances, MaintenanceDocuments, MaintenanceParts},
    error::AppError,
    money::Money,
    response::ErrorCode,
    services::maintenance_service,
};
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
use uuid::Uuid;

use common::{BROKEN_UPLOAD, admin, file, setup, vehicle};

fn part(name: &str, quantity: i32, unit_cost: i64) -> PartInput {
    PartInput {
        name: name.into(),
        quantity,
        unit_cost: Money::from_cents(unit_cost),
    }
}

fn record(vehicle_id: Uuid, parts: Vec<PartInput>) -> MaintenanceInput {
    MaintenanceInput {
        vehicle_id,
        title: "Brake service".into(),
        description: None,
        service_provider: Some("Depot Garage".into()),
        performed_at: Utc::now(),
        labor_cost: Money::from_cents(15000),
        parts,
        retained_document_ids: None,
    }
}

#[tokio::test]
async fn create_records_costs_parts_and_documents() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    let vehicle_id = vehicle(state, "B-1234-XY").await?;

    let detail = maintenance_service::create_maintenance(
        state,
        &admin,
        record(vehicle_id, vec![part("Brake pad", 4, 2500), part("Fluid", 1, 1200)]),
        vec![file("invoice.pdf", b"invoice"), file("photo.jpg", b"photo")],
    )
    .await?
    .data
    .expect("maintenance detail");

    assert_eq!(detail.maintenance.parts_cost, Money::from_cents(11200));
    assert_eq!(detail.maintenance.total_cost, Money::from_cents(26200));
    assert_eq!(detail.parts.len(), 2);
    assert_eq!(detail.documents.len(), 2);
    assert_eq!(app.stored_files(), 2);
    Ok(())
}

#[tokio::test]
async fn unknown_vehicle_uploads_nothing() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;

    let err = maintenance_service::create_maintenance(
        state,
        &admin,
        record(Uuid::new_v4(), vec![]),
        vec![file("invoice.pdf", b"invoice")],
    )
    .await
    .expect_err("vehicle missing");

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(app.stored_files(), 0);
    assert_eq!(CompletedMaintenances::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn all_documents_failing_writes_no_rows() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    let vehicle_id = vehicle(state, "D-778-QA").await?;

    let err = maintenance_service::create_maintenance(
        state,
        &admin,
        record(vehicle_id, vec![part("Filter", 1, 800)]),
        vec![file("scan.pdf", BROKEN_UPLOAD)],
    )
    .await
    .expect_err("upload failed");

    assert_eq!(err.code(), ErrorCode::UploadFailed);
    assert_eq!(CompletedMaintenances::find().count(&state.orm).await?, 0);
    assert_eq!(MaintenanceParts::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn update_replaces_parts_and_drops_unretained_documents() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    let vehicle_id = vehicle(state, "F-9-ZZ").await?;

    let created = maintenance_service::create_maintenance(
        state,
        &admin,
        record(vehicle_id, vec![part("Oil", 5, 900), part("Filter", 1, 800)]),
        vec![file("a.pdf", b"A"), file("b.pdf", b"B"), file("c.pdf", b"C")],
    )
    .await?
    .data
    .expect("maintenance detail");
    let keep: Vec<Uuid> = created
        .documents
        .iter()
        .filter(|doc| doc.original_name != "b.pdf")
        .map(|doc| doc.id)
        .collect();

    let mut input = record(vehicle_id, vec![part("Oil", 4, 900)]);
    input.retained_document_ids = Some(keep.clone());
    let updated = maintenance_service::update_maintenance(
        state,
        &admin,
        created.maintenance.id,
        input,
        vec![file("d.pdf", b"D")],
    )
    .await?
    .data
    .expect("maintenance detail");

    assert_eq!(updated.parts.len(), 1);
    assert_eq!(updated.maintenance.parts_cost, Money::from_cents(3600));
    assert_eq!(updated.maintenance.total_cost, Money::from_cents(18600));
    assert_eq!(updated.documents.len(), 3);
    assert!(keep.iter().all(|id| updated.documents.iter().any(|doc| doc.id == *id)));
    assert!(updated.documents.iter().all(|doc| doc.original_name != "b.pdf"));
    assert_eq!(app.stored_files(), 3);
    assert_eq!(MaintenanceParts::find().count(&state.orm).await?, 1);
    assert_eq!(MaintenanceDocuments::find().count(&state.orm).await?, 3);
    Ok(())
}

#[tokio::test]
async fn history_lists_newest_first() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    let vehicle_id = vehicle(state, "L-55-AB").await?;

    let mut older = record(vehicle_id, vec![]);
    older.title = "Tyre rotation".into();
    older.performed_at = Utc::now() - Duration::days(30);
    maintenance_service::create_maintenance(state, &admin, older, vec![]).await?;
    maintenance_service::create_maintenance(state, &admin, record(vehicle_id, vec![]), vec![])
        .await?;

    let history = maintenance_service::list_maintenances_for_vehicle(state, vehicle_id)
        .await?
        .data
        .expect("history");

    assert_eq!(history.items.len(), 2);
    assert_eq!(history.items[0].title, "Brake service");
    assert_eq!(history.items[1].title, "Tyre rotation");
    Ok(())
}

#[tokio::test]
async fn duplicate_plate_is_a_conflict() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    let request = |plate: &str| CreateVehicleRequest {
        plate_number: plate.into(),
        make: "Isuzu".into(),
        model: "Elf".into(),
        year: 2019,
    };

    let created = maintenance_service::create_vehicle(state, &admin, request("b 77 cd"))
        .await?
        .data
        .expect("vehicle");
    assert_eq!(created.plate_number, "B 77 CD");

    let err = maintenance_service::create_vehicle(state, &admin, request("B 77 CD"))
        .await
        .expect_err("duplicate plate");
    assert_eq!(err.code(), ErrorCode::Conflict);

    let vehicles = maintenance_service::list_vehicles(state)
        .await?
        .data
        .expect("vehicles");
    assert_eq!(vehicles.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_transaction_removes_uploaded_documents() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    let vehicle_id = vehicle(state, "E-404-TX").await?;
    // parts insert fails after the documents have been stored
    state
        .orm
        .execute_unprepared("DROP TABLE maintenance_parts")
        .await?;

    let result = maintenance_service::create_maintenance(
        state,
        &admin,
        record(vehicle_id, vec![part("Brake pad", 2, 2500)]),
        vec![file("invoice.pdf", b"invoice"), file("photo.jpg", b"photo")],
    )
    .await;

    assert!(matches!(result, Err(AppError::OrmError(_))));
    assert_eq!(app.stored_files(), 0);
    assert_eq!(CompletedMaintenances::find().count(&state.orm).await?, 0);
    assert_eq!(MaintenanceDocuments::find().count(&state.orm).await?, 0);
    Ok(())
}
