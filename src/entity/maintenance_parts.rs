use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_parts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub maintenance_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_cost: i64,
    pub total: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::completed_maintenances::Entity",
        from = "Column::MaintenanceId",
        to = "super::completed_maintenances::Column::Id",
        on_delete = "Cascade"
    )]
    CompletedMaintenances,
}

impl Related<super::completed_maintenances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompletedMaintenances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
