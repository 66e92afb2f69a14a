use std::collections::HashMap;

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
    dto::products::{ProductDetail, ProductInput, ProductList, VariantInput},
    entity::{
        product_images::{
            ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages,
            Model as ImageModel,
        },
        product_variants::{ActiveModel as VariantActive, Column as VariantCol, Entity as ProductVariants},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    filters::all_of,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Asset, Product, ProductVariant},
    response::ApiResponse,
    routes::params::ProductQuery,
    services::assets::{
        NewFile, UploadPolicy, UploadSummary, UpsertPhase, commit_or_compensate, remove_files,
        upload_with_policy,
    },
    state::AppState,
};

const DUPLICATE_PRODUCT: &str = "Product already exists";
const DUPLICATE_VARIANT: &str = "Product name or variant SKU already exists";

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let filters = query.filters();
    let products = Products::find()
        .filter(all_of(&filters))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut variants: HashMap<Uuid, Vec<ProductVariant>> = HashMap::new();
    for variant in ProductVariants::find()
        .filter(VariantCol::ProductId.is_in(ids.clone()))
        .order_by_asc(VariantCol::Sku)
        .all(&state.orm)
        .await?
    {
        variants
            .entry(variant.product_id)
            .or_default()
            .push(ProductVariant::from(variant));
    }
    let mut images: HashMap<Uuid, Vec<Asset>> = HashMap::new();
    for image in ProductImages::find()
        .filter(ImageCol::ProductId.is_in(ids))
        .order_by_asc(ImageCol::CreatedAt)
        .all(&state.orm)
        .await?
    {
        images
            .entry(image.product_id)
            .or_default()
            .push(Asset::from(image));
    }

    let items = products
        .into_iter()
        .map(|product| ProductDetail {
            variants: variants.remove(&product.id).unwrap_or_default(),
            images: images.remove(&product.id).unwrap_or_default(),
            product: Product::from(product),
        })
        .collect();

    Ok(ApiResponse::success("Products", ProductList { items }))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".into()))?;
    let detail = load_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product", detail))
}

/// Creates a product with its variants and images. Images are stored first;
/// if the database work fails they are deleted again.
pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductInput,
    files: Vec<NewFile>,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;
    tracing::debug!(phase = %UpsertPhase::Validating, name = %payload.name, "product create");
    payload.validate()?;
    ensure_unique_name(state, &payload.name, None).await?;

    let storage = state.storage.as_ref();
    let uploaded = upload_with_policy(storage, files, UploadPolicy::default()).await?;

    let product = commit_or_compensate(storage, &uploaded, async {
        let txn = state.orm.begin().await?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        let product = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(payload.name.trim().to_string()),
            description: Set(payload.description.clone()),
            base_price: Set(payload.base_price.cents()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for variant in &payload.variants {
            insert_variant(&txn, product.id, variant, now).await?;
        }
        insert_images(&txn, product.id, &uploaded, now).await?;

        txn.commit().await?;
        Ok::<_, AppError>(product)
    })
    .await
    .map_err(|err| err.on_unique_violation(DUPLICATE_VARIANT))?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id, "images": uploaded.stored_count() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product created", detail))
}

/// Updates a product, its variants and its image set. Images missing from
/// `retained_image_ids` lose their rows in the transaction and their files
/// after commit.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductInput,
    files: Vec<NewFile>,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;
    tracing::debug!(phase = %UpsertPhase::Validating, product_id = %id, "product update");
    payload.validate()?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".into()))?;
    ensure_unique_name(state, &payload.name, Some(id)).await?;

    let storage = state.storage.as_ref();
    let uploaded = upload_with_policy(storage, files, UploadPolicy::default()).await?;

    let (product, removed) = commit_or_compensate(storage, &uploaded, async {
        let txn = state.orm.begin().await?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let mut active: ActiveModel = existing.into();
        active.name = Set(payload.name.trim().to_string());
        active.description = Set(payload.description.clone());
        active.base_price = Set(payload.base_price.cents());
        active.updated_at = Set(now);
        let product = active.update(&txn).await?;

        for variant in &payload.variants {
            match variant.id {
                Some(variant_id) => update_variant(&txn, product.id, variant_id, variant, now).await?,
                None => insert_variant(&txn, product.id, variant, now).await?,
            }
        }

        let removed = match &payload.retained_image_ids {
            Some(retained) => remove_unretained_images(&txn, product.id, retained).await?,
            None => Vec::new(),
        };
        insert_images(&txn, product.id, &uploaded, now).await?;

        txn.commit().await?;
        Ok::<_, AppError>((product, removed))
    })
    .await
    .map_err(|err| err.on_unique_violation(DUPLICATE_VARIANT))?;

    let removed_files: Vec<String> = removed.into_iter().map(|image| image.file_name).collect();
    if !removed_files.is_empty() {
        tracing::info!(product_id = %product.id, count = removed_files.len(), "removing dropped product images");
        remove_files(storage, &removed_files).await;
    }

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({
            "product_id": product.id,
            "images_added": uploaded.stored_count(),
            "images_removed": removed_files.len(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Updated", detail))
}

pub async fn deactivate_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".into()))?;

    let mut active: ActiveModel = existing.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "product_deactivate",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Deactivated", serde_json::json!({})))
}

async fn ensure_unique_name(state: &AppState, name: &str, exclude: Option<Uuid>) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Name.eq(name.trim()));
    if let Some(id) = exclude {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(DUPLICATE_PRODUCT.into()));
    }
    Ok(())
}

async fn insert_variant(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    input: &VariantInput,
    now: DateTimeWithTimeZone,
) -> AppResult<()> {
    VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        color: Set(input.color.clone()),
        size: Set(input.size.clone()),
        sku: Set(input.sku.clone()),
        price_adjustment: Set(input.price_adjustment.cents()),
        stock_quantity: Set(input.stock_quantity),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn update_variant(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    variant_id: Uuid,
    input: &VariantInput,
    now: DateTimeWithTimeZone,
) -> AppResult<()> {
    let variant = ProductVariants::find_by_id(variant_id)
        .filter(VariantCol::ProductId.eq(product_id))
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Variant {variant_id}")))?;

    // stock of an existing variant only moves through order placement
    let mut active: VariantActive = variant.into();
    active.color = Set(input.color.clone());
    active.size = Set(input.size.clone());
    active.sku = Set(input.sku.clone());
    active.price_adjustment = Set(input.price_adjustment.cents());
    active.updated_at = Set(now);
    active.update(txn).await?;
    Ok(())
}

async fn insert_images(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    uploaded: &UploadSummary,
    now: DateTimeWithTimeZone,
) -> AppResult<()> {
    for asset in uploaded.stored() {
        ImageActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
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

async fn remove_unretained_images(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    retained: &[Uuid],
) -> AppResult<Vec<ImageModel>> {
    let removed: Vec<ImageModel> = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product_id))
        .all(txn)
        .await?
        .into_iter()
        .filter(|image| !retained.contains(&image.id))
        .collect();

    if !removed.is_empty() {
        ProductImages::delete_many()
            .filter(ImageCol::Id.is_in(removed.iter().map(|image| image.id)))
            .exec(txn)
            .await?;
    }
    Ok(removed)
}

async fn load_detail<C: ConnectionTrait>(db: &C, product: ProductModel) -> AppResult<ProductDetail> {
    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.eq(product.id))
        .order_by_asc(VariantCol::Sku)
        .all(db)
        .await?
        .into_iter()
        .map(ProductVariant::from)
        .collect();
    let images = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product.id))
        .order_by_asc(ImageCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Asset::from)
        .collect();

    Ok(ProductDetail {
        product: Product::from(product),
        variants,
        images,
    })
}
