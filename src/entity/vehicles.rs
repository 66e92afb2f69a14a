use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub plate_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::completed_maintenances::Entity")]
    CompletedMaintenances,
}

impl Related<super::completed_maintenances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompletedMaintenances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
