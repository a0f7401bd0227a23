use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "eve_alliance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub name: String,
    pub ticker: String,
    pub creator_corporation_id: i64,
    pub executor_corporation_id: Option<i64>,
    pub date_founded: DateTime,
    pub is_closed: bool,
    pub cached_until: i64,
    pub etag: Option<String>,
    pub not_modified_count: i32,
    pub update_priority: i32,
    pub update_error: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
