use crate::db::SchemaVersionDao;
use crate::error::Result;
use tracing::debug;

/// Ensures the ledger tables exist before anything reads or writes them
pub struct Initialize<'a> {
    dao: &'a dyn SchemaVersionDao,
}

impl<'a> Initialize<'a> {
    pub fn new(dao: &'a dyn SchemaVersionDao) -> Self {
        Self { dao }
    }

    pub async fn run(&self) -> Result<()> {
        debug!(
            "Ensuring ledger table {}.{} exists",
            self.dao.keyspace(),
            self.dao.table_name()
        );
        self.dao.create_tables_if_not_exist().await?;
        Ok(())
    }
}
