use chrono::NaiveDate;
use sea_orm::{
    sea_query::OnConflict, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

pub struct MarketRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> MarketRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Most recent `limit` price records at or before `date`, newest first
    pub async fn history_until(
        &self,
        type_id: i64,
        date: NaiveDate,
        limit: u64,
    ) -> Result<Vec<entity::market_history::Model>, DbErr> {
        entity::prelude::MarketHistory::find()
            .filter(entity::market_history::Column::TypeId.eq(type_id))
            .filter(entity::market_history::Column::Date.lte(date))
            .order_by_desc(entity::market_history::Column::Date)
            .limit(limit)
            .all(self.db)
            .await
    }

    /// Insert price records, existing (type, date) pairs are left untouched
    pub async fn insert_history(&self, records: Vec<(i64, NaiveDate, f64)>) -> Result<u64, DbErr> {
        if records.is_empty() {
            return Ok(0);
        }

        let models = records
            .into_iter()
            .map(|(type_id, date, price)| entity::market_history::ActiveModel {
                type_id: ActiveValue::Set(type_id),
                date: ActiveValue::Set(date),
                price: ActiveValue::Set(price),
            });

        let result = entity::prelude::MarketHistory::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    entity::market_history::Column::TypeId,
                    entity::market_history::Column::Date,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db)
            .await;

        match result {
            Ok(inserted) => Ok(inserted),
            Err(DbErr::RecordNotInserted) => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub async fn find_built_price(
        &self,
        type_id: i64,
        date: NaiveDate,
    ) -> Result<Option<entity::market_price_built::Model>, DbErr> {
        entity::prelude::MarketPriceBuilt::find_by_id((type_id, date))
            .one(self.db)
            .await
    }

    /// Store a build cost, replacing an earlier one for the same day
    pub async fn upsert_built_price(
        &self,
        type_id: i64,
        date: NaiveDate,
        price: f64,
    ) -> Result<(), DbErr> {
        let model = entity::market_price_built::ActiveModel {
            type_id: ActiveValue::Set(type_id),
            date: ActiveValue::Set(date),
            price: ActiveValue::Set(price),
        };

        entity::prelude::MarketPriceBuilt::insert(model)
            .on_conflict(
                OnConflict::columns([
                    entity::market_price_built::Column::TypeId,
                    entity::market_price_built::Column::Date,
                ])
                .update_column(entity::market_price_built::Column::Price)
                .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;

        Ok(())
    }
}
