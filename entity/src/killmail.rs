use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "killmail")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub hash: String,
    pub solar_system_id: i64,
    pub moon_id: Option<i64>,
    pub war_id: Option<i64>,
    pub killmail_time: DateTime,
    pub is_npc: bool,
    pub is_awox: bool,
    pub is_solo: bool,
    pub dropped_value: f64,
    pub destroyed_value: f64,
    pub fitted_value: f64,
    pub total_value: f64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::killmail_victim::Entity")]
    KillmailVictim,
    #[sea_orm(has_many = "super::killmail_attacker::Entity")]
    KillmailAttacker,
    #[sea_orm(has_many = "super::killmail_item::Entity")]
    KillmailItem,
}

impl Related<super::killmail_victim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KillmailVictim.def()
    }
}

impl Related<super::killmail_attacker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KillmailAttacker.def()
    }
}

impl Related<super::killmail_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KillmailItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
