use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "killmail_item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub killmail_id: i64,
    /// Container item this item was stored in, if any
    pub parent_id: Option<i64>,
    pub flag: i64,
    pub item_type_id: i64,
    pub quantity_dropped: i64,
    pub quantity_destroyed: i64,
    pub singleton: i64,
    pub item_value: f64,
    pub total_value: f64,
    pub is_parent: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::killmail::Entity",
        from = "Column::KillmailId",
        to = "super::killmail::Column::Id",
        on_delete = "Cascade"
    )]
    Killmail,
}

impl Related<super::killmail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Killmail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
