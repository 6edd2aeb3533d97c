//! Reconciliation of resolved migrations against the ledger
pub mod context;
pub mod dumper;
pub mod record;
pub mod service;

pub use context::MigrationInfoContext;
pub use dumper::dump_to_ascii_table;
pub use record::MigrationRecord;
pub use service::MigrationInfoService;
