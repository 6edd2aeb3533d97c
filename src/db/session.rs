use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Executes opaque CQL statements against the target keyspace
#[async_trait]
pub trait CqlSession: Send + Sync {
    /// Run one statement. `timeout` bounds the request when given.
    async fn execute(&self, statement: &str, timeout: Option<Duration>) -> Result<()>;
}
