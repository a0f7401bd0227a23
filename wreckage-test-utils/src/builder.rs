//! Declarative test builder.
//!
//! Tables and mock endpoints are queued on the builder and created in one go by
//! [`TestBuilder::build`]. Database fixtures are inserted afterwards through
//! [`crate::fixtures`] helpers against `TestContext::db`.

use ::mockito::{Mock, ServerGuard};
use sea_orm::{sea_query::TableCreateStatement, EntityTrait, Schema};
use serde_json::Value;

use crate::{error::TestError, fixtures::eve::mockito, TestContext};

type MockBuilder = Box<dyn FnOnce(&mut ServerGuard) -> Mock>;

pub struct TestBuilder {
    tables: Vec<TableCreateStatement>,
    mock_builders: Vec<MockBuilder>,
}

impl Default for TestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBuilder {
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            mock_builders: Vec::new(),
        }
    }

    /// Add an entity table to the test database.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use wreckage_test_utils::TestBuilder;
    /// use entity::prelude::*;
    ///
    /// # async fn example() -> Result<(), wreckage_test_utils::TestError> {
    /// let test = TestBuilder::new()
    ///     .with_table(EveAlliance)
    ///     .with_table(EveCorporation)
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_table<E: EntityTrait>(mut self, entity: E) -> Self {
        let schema = Schema::new(sea_orm::DbBackend::Sqlite);
        self.tables.push(schema.create_table_from_entity(entity));
        self
    }

    /// Add every EVE reference data table: characters, corporations, alliances, universe and types
    pub fn with_eve_tables(self) -> Self {
        use entity::prelude::*;

        self.with_table(EveAlliance)
            .with_table(EveCorporation)
            .with_table(EveCharacter)
            .with_table(EveRegion)
            .with_table(EveConstellation)
            .with_table(EveSolarSystem)
            .with_table(EveTypeCategory)
            .with_table(EveTypeGroup)
            .with_table(EveType)
            .with_table(EveTypeFlag)
            .with_table(EveTypeAttribute)
    }

    /// Add price history, built price and blueprint tables
    pub fn with_market_tables(self) -> Self {
        use entity::prelude::*;

        self.with_table(MarketHistory)
            .with_table(MarketPriceBuilt)
            .with_table(EveBlueprintMaterial)
            .with_table(EveBlueprintProduct)
    }

    /// Add the killmail, victim, attacker and item tables
    pub fn with_killmail_tables(self) -> Self {
        use entity::prelude::*;

        self.with_table(Killmail)
            .with_table(KillmailVictim)
            .with_table(KillmailAttacker)
            .with_table(KillmailItem)
    }

    /// Add a 200 JSON endpoint at `path` expected to be called `expected_requests` times
    pub fn with_json_endpoint(self, path: &str, body: Value, expected_requests: usize) -> Self {
        let path = path.to_string();
        self.with_mock_endpoint(move |server| {
            mockito::json_endpoint(server, &path, &body, expected_requests)
        })
    }

    /// Add an endpoint responding with `status` and no meaningful body
    pub fn with_status_endpoint(self, path: &str, status: usize, expected_requests: usize) -> Self {
        let path = path.to_string();
        self.with_mock_endpoint(move |server| {
            mockito::status_endpoint(server, &path, status, expected_requests)
        })
    }

    /// Add a custom mock endpoint.
    ///
    /// The closure returns an unregistered mock, registration happens during `build()`.
    pub fn with_mock_endpoint<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut ServerGuard) -> Mock + 'static,
    {
        self.mock_builders.push(Box::new(setup));
        self
    }

    /// Create the database, tables and mock endpoints
    pub async fn build(self) -> Result<TestContext, TestError> {
        let mut context = TestContext::new().await?;

        context.with_tables(self.tables).await?;

        for builder in self.mock_builders {
            let mock = builder(&mut context.server);
            let mock = mock.create_async().await;
            context.mocks.push(mock);
        }

        Ok(context)
    }
}
