#![allow(dead_code)]

use std::{io, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use fleetshop_api::{
    config::AppConfig,
    entity::{
        self, addresses::ActiveModel as AddressActive, customers::ActiveModel as CustomerActive,
        order_statuses::ActiveModel as StatusActive, product_variants::ActiveModel as VariantActive,
        products::ActiveModel as ProductActive, users::ActiveModel as UserActive,
        vehicles::ActiveModel as VehicleActive,
    },
    middleware::auth::AuthUser,
    services::assets::NewFile,
    state::AppState,
    storage::{AssetStorage, LocalStorage},
};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    Schema, Set,
};
use tempfile::TempDir;
use uuid::Uuid;

pub const BROKEN_UPLOAD: &[u8] = b"broken";

/// Local storage that refuses to write files whose content is [`BROKEN_UPLOAD`].
pub struct FlakyStorage {
    inner: LocalStorage,
}

#[async_trait]
impl AssetStorage for FlakyStorage {
    async fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<()> {
        if bytes == BROKEN_UPLOAD {
            return Err(io::Error::other("disk full"));
        }
        self.inner.write(file_name, bytes).await
    }

    async fn delete(&self, file_name: &str) -> io::Result<()> {
        self.inner.delete(file_name).await
    }

    async fn exists(&self, file_name: &str) -> io::Result<bool> {
        self.inner.exists(file_name).await
    }

    fn public_url(&self, file_name: &str) -> String {
        self.inner.public_url(file_name)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub upload_dir: TempDir,
}

impl TestApp {

    /// Number of files currently in the upload directory.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn file_exists(&self, file_name: &str) -> bool {
        self.state.storage.exists(file_name).await.unwrap_or(false)
    }
}

pub async fn setup() -> anyhow::Result<TestApp> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // a single connection keeps the in-memory database alive and shared
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    create_schema(&orm).await?;
    seed_statuses(&orm).await?;

    let upload_dir = tempfile::tempdir()?;
    let storage = FlakyStorage {
        inner: LocalStorage::new(upload_dir.path(), "/uploads"),
    };
    let config = AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        upload_dir: upload_dir.path().to_path_buf(),
        public_upload_base: "/uploads".into(),
        max_upload_bytes: 1024 * 1024,
    };

    Ok(TestApp {
        state: AppState {
            orm,
            storage: Arc::new(storage),
            config: Arc::new(config),
        },
        upload_dir,
    })
}

async fn create_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let statements = [
        schema.create_table_from_entity(entity::Users),
        schema.create_table_from_entity(entity::Customers),
        schema.create_table_from_entity(entity::Addresses),
        schema.create_table_from_entity(entity::OrderStatuses),
        schema.create_table_from_entity(entity::Products),
        schema.create_table_from_entity(entity::ProductVariants),
        schema.create_table_from_entity(entity::ProductImages),
        schema.create_table_from_entity(entity::Orders),
        schema.create_table_from_entity(entity::OrderItems),
        schema.create_table_from_entity(entity::Vehicles),
        schema.create_table_from_entity(entity::CompletedMaintenances),
        schema.create_table_from_entity(entity::MaintenanceParts),
        schema.create_table_from_entity(entity::MaintenanceDocuments),
        schema.create_table_from_entity(entity::AuditLogs),
    ];
    for statement in statements {
        db.execute(backend.build(&statement)).await?;
    }
    Ok(())
}

async fn seed_statuses(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (sort_order, name) in ["Pending", "Processing", "Shipped", "Delivered", "Cancelled"]
        .into_iter()
        .enumerate()
    {
        StatusActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            sort_order: Set(sort_order as i32 + 1),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

pub async fn create_user(state: &AppState, email: &str, role: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        role: Set(role.to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn customer(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    create_user(state, email, "customer").await
}

pub async fn admin(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, "admin@example.com", "admin").await
}

/// Creates the customer profile and one address for `user`.
pub async fn address_for(state: &AppState, user: &AuthUser) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        display_name: Set("Test Customer".into()),
        phone: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        line1: Set("1 Depot Road".into()),
        line2: Set(None),
        city: Set("Bandung".into()),
        postal_code: Set("40111".into()),
        country: Set("ID".into()),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(address.id)
}

/// Inserts a product with a single variant holding `stock` units and
/// returns the variant id.
pub async fn variant_with_stock(state: &AppState, sku: &str, stock: i32) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Product {sku}")),
        description: Set(None),
        base_price: Set(2500),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    let variant = VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        color: Set("black".into()),
        size: Set("M".into()),
        sku: Set(sku.to_string()),
        price_adjustment: Set(0),
        stock_quantity: Set(stock),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(variant.id)
}

pub async fn stock_of(state: &AppState, variant_id: Uuid) -> anyhow::Result<i32> {
    let variant = entity::ProductVariants::find_by_id(variant_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("variant {variant_id} missing"))?;
    Ok(variant.stock_quantity)
}

pub async fn vehicle(state: &AppState, plate: &str) -> anyhow::Result<Uuid> {
    let vehicle = VehicleActive {
        id: Set(Uuid::new_v4()),
        plate_number: Set(plate.to_string()),
        make: Set("Toyota".into()),
        model: Set("Hiace".into()),
        year: Set(2021),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(vehicle.id)
}

pub fn file(name: &str, bytes: &[u8]) -> NewFile {
    NewFile {
        original_name: name.to_string(),
        bytes: bytes.to_vec(),
    }
}
