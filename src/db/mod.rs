pub mod cassandra;
pub mod connection;
pub mod dao;
pub mod memory;
pub mod session;

pub use cassandra::{CassandraSchemaVersionDao, CassandraSession};
pub use dao::SchemaVersionDao;
pub use memory::{InMemorySchemaVersionDao, RecordingSession};
pub use session::CqlSession;
