// Configuration file name
pub const CONFIG_FILENAME: &str = "cqlmigrate.yaml";

// Ledger table, before any configured prefix
pub const LEDGER_TABLE_NAME: &str = "cassandra_migration_version";

// Version reserved for the schema creation marker
pub const SCHEMA_CREATION_VERSION: &str = "0";
