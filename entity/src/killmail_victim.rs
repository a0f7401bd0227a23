use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "killmail_victim")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub killmail_id: i64,
    pub alliance_id: Option<i64>,
    pub character_id: Option<i64>,
    pub corporation_id: Option<i64>,
    pub faction_id: Option<i64>,
    pub damage_taken: i64,
    pub ship_type_id: i64,
    pub ship_value: f64,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub pos_z: Option<f64>,
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
