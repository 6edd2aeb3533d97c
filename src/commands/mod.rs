pub mod baseline;
pub mod context;
pub mod info;
pub mod initialize;
pub mod migrate;
pub mod validate;

pub use baseline::{Baseline, cmd_baseline};
pub use context::{CommandContext, build_resolver};
pub use info::{Info, cmd_info};
pub use initialize::Initialize;
pub use migrate::{Migrate, cmd_migrate};
pub use validate::{Validate, cmd_validate};
