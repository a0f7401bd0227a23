//! Test context returned by [`TestBuilder`](crate::TestBuilder).
//!
//! Holds an in-memory SQLite database and the mock ESI server. The main crate builds its own
//! ESI client from [`TestContext::server_url`] to avoid a dependency cycle between the crates.

use mockito::{Mock, Server, ServerGuard};
use sea_orm::{sea_query::TableCreateStatement, ConnectionTrait, Database, DatabaseConnection};

use crate::error::TestError;

pub struct TestContext {
    /// Database connection to in-memory SQLite database
    pub db: DatabaseConnection,

    /// Mock HTTP server for ESI endpoints
    pub server: ServerGuard,
    /// Collection of mock HTTP endpoints for assertion
    pub(crate) mocks: Vec<Mock>,
}

impl TestContext {
    pub(crate) async fn new() -> Result<Self, TestError> {
        let server = Server::new_async().await;
        let db = Database::connect("sqlite::memory:").await?;

        Ok(TestContext {
            db,
            server,
            mocks: Vec::new(),
        })
    }

    pub(crate) async fn with_tables(
        &self,
        stmts: Vec<TableCreateStatement>,
    ) -> Result<(), TestError> {
        for stmt in stmts {
            self.db.execute(&stmt).await?;
        }

        Ok(())
    }

    /// Base URL of the mock ESI server
    pub fn server_url(&self) -> String {
        self.server.url()
    }

    /// Register an additional mock endpoint after the context was built
    pub async fn add_mock(&mut self, mock: Mock) {
        let mock = mock.create_async().await;
        self.mocks.push(mock);
    }

    /// Build a mock against the server and register it
    pub async fn mock_endpoint<F>(&mut self, setup: F)
    where
        F: FnOnce(&mut ServerGuard) -> Mock,
    {
        let mock = setup(&mut self.server);
        self.add_mock(mock).await;
    }

    /// Assert that every registered mock endpoint received its expected requests
    pub fn assert_mocks(&self) {
        for mock in &self.mocks {
            mock.assert();
        }
    }
}
