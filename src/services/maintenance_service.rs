use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    dto::maintenance::{
        CreateVehicleRequest, MaintenanceDetail, MaintenanceInput, MaintenanceList, PartInput,
        VehicleList,
    },
    entity::{
        completed_maintenances::{
            ActiveModel as MaintenanceActive, Column as MaintenanceCol,
            Entity as CompletedMaintenances, Model as MaintenanceModel,
        },
        maintenance_documents::{
            ActiveModel as DocumentActive, Column as DocumentCol, Entity as MaintenanceDocuments,
            Model as DocumentModel,
        },
        maintenance_parts::{ActiveModel as PartActive, Column as PartCol, Entity as MaintenanceParts},
        vehicles::{ActiveModel as VehicleActive, Column as VehicleCol, Entity as Vehicles},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Asset, Maintenance, MaintenancePart, Vehicle},
    money::Money,
    response::ApiResponse,
    services::assets::{
        NewFile, UploadPolicy, UploadSummary, UpsertPhase, commit_or_compensate, remove_files,
        upload_with_policy,
    },
    state::AppState,
};

struct CostBreakdown {
    parts: Vec<(PartInput, Money)>,
    parts_cost: Money,
    total_cost: Money,
}

fn cost_breakdown(input: &MaintenanceInput) -> AppResult<CostBreakdown> {
    let overflow = || AppError::BadRequest("maintenance cost overflows".into());
    let mut parts = Vec::with_capacity(input.parts.len());
    let mut parts_cost = Money::ZERO;
    for part in &input.parts {
        let total = part.unit_cost.checked_mul(part.quantity).ok_or_else(overflow)?;
        parts_cost = parts_cost.checked_add(total).ok_or_else(overflow)?;
        parts.push((part.clone(), total));
    }
    let total_cost = input.labor_cost.checked_add(parts_cost).ok_or_else(overflow)?;
    Ok(CostBreakdown {
        parts,
        parts_cost,
        total_cost,
    })
}

pub async fn create_vehicle(
    state: &AppState,
    user: &AuthUser,
    payload: CreateVehicleRequest,
) -> AppResult<ApiResponse<Vehicle>> {
    ensure_admin(user)?;
    payload.validate()?;
    let plate_number = payload.plate_number.trim().to_ascii_uppercase();

    let exists = Vehicles::find()
        .filter(VehicleCol::PlateNumber.eq(plate_number.as_str()))
        .one(&state.orm)
        .await?
        .is_some();
    if exists {
        return Err(AppError::Conflict("Vehicle already exists".into()));
    }

    let vehicle = VehicleActive {
        id: Set(Uuid::new_v4()),
        plate_number: Set(plate_number),
        make: Set(payload.make),
        model: Set(payload.model),
        year: Set(payload.year),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::from(err).on_unique_violation("Vehicle already exists"))?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "vehicle_create",
        Some("vehicles"),
        Some(serde_json::json!({ "vehicle_id": vehicle.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Vehicle created", Vehicle::from(vehicle)))
}

pub async fn list_vehicles(state: &AppState) -> AppResult<ApiResponse<VehicleList>> {
    let items = Vehicles::find()
        .filter(VehicleCol::IsActive.eq(true))
        .order_by_asc(VehicleCol::PlateNumber)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Vehicle::from)
        .collect();
    Ok(ApiResponse::success("OK", VehicleList { items }))
}

pub async fn list_maintenances_for_vehicle(
    state: &AppState,
    vehicle_id: Uuid,
) -> AppResult<ApiResponse<MaintenanceList>> {
    Vehicles::find_by_id(vehicle_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle".into()))?;

    let items = CompletedMaintenances::find()
        .filter(MaintenanceCol::VehicleId.eq(vehicle_id))
        .order_by_desc(MaintenanceCol::PerformedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Maintenance::from)
        .collect();
    Ok(ApiResponse::success("OK", MaintenanceList { items }))
}

pub async fn get_maintenance(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<MaintenanceDetail>> {
    let record = CompletedMaintenances::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Maintenance".into()))?;
    let detail = load_detail(&state.orm, record).await?;
    Ok(ApiResponse::success("OK", detail))
}

/// Records a completed maintenance with its parts and documents. Documents are
/// stored first and deleted again if the transaction fails.
pub async fn create_maintenance(
    state: &AppState,
    user: &AuthUser,
    payload: MaintenanceInput,
    files: Vec<NewFile>,
) -> AppResult<ApiResponse<MaintenanceDetail>> {
    ensure_admin(user)?;
    tracing::debug!(phase = %UpsertPhase::Validating, vehicle_id = %payload.vehicle_id, "maintenance create");
    payload.validate()?;
    let costs = cost_breakdown(&payload)?;
    ensure_vehicle(state, payload.vehicle_id).await?;

    let storage = state.storage.as_ref();
    let uploaded = upload_with_policy(storage, files, UploadPolicy::default()).await?;

    let record = commit_or_compensate(storage, &uploaded, async {
        let txn = state.orm.begin().await?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        let record = MaintenanceActive {
            id: Set(Uuid::new_v4()),
            vehicle_id: Set(payload.vehicle_id),
            title: Set(payload.title.clone()),
            description: Set(payload.description.clone()),
            service_provider: Set(payload.service_provider.clone()),
            performed_at: Set(payload.performed_at.into()),
            labor_cost: Set(payload.labor_cost.cents()),
            parts_cost: Set(costs.parts_cost.cents()),
            total_cost: Set(costs.total_cost.cents()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        insert_parts(&txn, record.id, &costs).await?;
        insert_documents(&txn, record.id, &uploaded, now).await?;

        txn.commit().await?;
        Ok::<_, AppError>(record)
    })
    .await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "maintenance_create",
        Some("completed_maintenances"),
        Some(serde_json::json!({ "maintenance_id": record.id, "documents": uploaded.stored_count() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_detail(&state.orm, record).await?;
    Ok(ApiResponse::success("Maintenance recorded", detail))
}

/// Updates a maintenance record. Parts are replaced as a whole; documents
/// missing from `retained_document_ids` are dropped and their files deleted
/// after commit.
pub async fn update_maintenance(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: MaintenanceInput,
    files: Vec<NewFile>,
) -> AppResult<ApiResponse<MaintenanceDetail>> {
    ensure_admin(user)?;
    tracing::debug!(phase = %UpsertPhase::Validating, maintenance_id = %id, "maintenance update");
    payload.validate()?;
    let costs = cost_breakdown(&payload)?;

    let existing = CompletedMaintenances::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Maintenance".into()))?;
    if existing.vehicle_id != payload.vehicle_id {
        ensure_vehicle(state, payload.vehicle_id).await?;
    }

    let storage = state.storage.as_ref();
    let uploaded = upload_with_policy(storage, files, UploadPolicy::default()).await?;

    let (record, removed) = commit_or_compensate(storage, &uploaded, async {
        let txn = state.orm.begin().await?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let mut active: MaintenanceActive = existing.into();
        active.vehicle_id = Set(payload.vehicle_id);
        active.title = Set(payload.title.clone());
        active.description = Set(payload.description.clone());
        active.service_provider = Set(payload.service_provider.clone());
        active.performed_at = Set(payload.performed_at.into());
        active.labor_cost = Set(payload.labor_cost.cents());
        active.parts_cost = Set(costs.parts_cost.cents());
        active.total_cost = Set(costs.total_cost.cents());
        active.updated_at = Set(now);
        let record = active.update(&txn).await?;

        MaintenanceParts::delete_many()
            .filter(PartCol::MaintenanceId.eq(record.id))
            .exec(&txn)
            .await?;
        insert_parts(&txn, record.id, &costs).await?;

        let removed = match &payload.retained_document_ids {
            Some(retained) => remove_unretained_documents(&txn, record.id, retained).await?,
            None => Vec::new(),
        };
        insert_documents(&txn, record.id, &uploaded, now).await?;

        txn.commit().await?;
        Ok::<_, AppError>((record, removed))
    })
    .await?;

    let removed_files: Vec<String> = removed.into_iter().map(|doc| doc.file_name).collect();
    if !removed_files.is_empty() {
        tracing::info!(maintenance_id = %record.id, count = removed_files.len(), "removing dropped maintenance documents");
        remove_files(storage, &removed_files).await;
    }

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "maintenance_update",
        Some("completed_maintenances"),
        Some(serde_json::json!({
            "maintenance_id": record.id,
            "documents_added": uploaded.stored_count(),
            "documents_removed": removed_files.len(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_detail(&state.orm, record).await?;
    Ok(ApiResponse::success("Updated", detail))
}

async fn ensure_vehicle(state: &AppState, vehicle_id: Uuid) -> AppResult<()> {
    Vehicles::find_by_id(vehicle_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle".into()))?;
    Ok(())
}

async fn insert_parts(
    txn: &DatabaseTransaction,
    maintenance_id: Uuid,
    costs: &CostBreakdown,
) -> AppResult<()> {
    for (part, total) in &costs.parts {
        PartActive {
            id: Set(Uuid::new_v4()),
            maintenance_id: Set(maintenance_id),
            name: Set(part.name.clone()),
            quantity: Set(part.quantity),
            unit_cost: Set(part.unit_cost.cents()),
            total: Set(total.cents()),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn insert_documents(
    txn: &DatabaseTransaction,
    maintenance_id: Uuid,
    uploaded: &UploadSummary,
    now: DateTimeWithTimeZone,
) -> AppResult<()> {
    for asset in uploaded.stored() {
        DocumentActive {
            id: Set(Uuid::new_v4()),
            maintenance_id: Set(maintenance_id),
            file_name: Set(asset.file_name.clone()),
            url: Set(asset.url.clone()),
            original_name: Set(asset.original_name.clone()),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn remove_unretained_documents(
    txn: &DatabaseTransaction,
    maintenance_id: Uuid,
    retained: &[Uuid],
) -> AppResult<Vec<DocumentModel>> {
    let removed: Vec<DocumentModel> = MaintenanceDocuments::find()
        .filter(DocumentCol::MaintenanceId.eq(maintenance_id))
        .all(txn)
        .await?
        .into_iter()
        .filter(|doc| !retained.contains(&doc.id))
        .collect();

    if !removed.is_empty() {
        MaintenanceDocuments::delete_many()
            .filter(DocumentCol::Id.is_in(removed.iter().map(|doc| doc.id)))
            .exec(txn)
            .await?;
    }
    Ok(removed)
}

async fn load_detail<C: ConnectionTrait>(
    db: &C,
    record: MaintenanceModel,
) -> AppResult<MaintenanceDetail> {
    let parts = MaintenanceParts::find()
        .filter(PartCol::MaintenanceId.eq(record.id))
        .order_by_asc(PartCol::Name)
        .all(db)
        .await?
        .into_iter()
        .map(MaintenancePart::from)
        .collect();
    let documents = MaintenanceDocuments::find()
        .filter(DocumentCol::MaintenanceId.eq(record.id))
        .order_by_asc(DocumentCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Asset::from)
        .collect();

    Ok(MaintenanceDetail {
        maintenance: Maintenance::from(record),
        parts,
        documents,
    })
}
