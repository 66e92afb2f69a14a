use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "completed_maintenances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub service_provider: Option<String>,
    pub performed_at: DateTimeWithTimeZone,
    pub labor_cost: i64,
    pub parts_cost: i64,
    pub total_cost: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicles::Entity",
        from = "Column::VehicleId",
        to = "super::vehicles::Column::Id"
    )]
    Vehicles,
    #[sea_orm(has_many = "super::maintenance_parts::Entity")]
    MaintenanceParts,
    #[sea_orm(has_many = "super::maintenance_documents::Entity")]
    MaintenanceDocuments,
}

impl Related<super::vehicles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicles.def()
    }
}

impl Related<super::maintenance_parts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceParts.def()
    }
}

impl Related<super::maintenance_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
