pub mod baseline_flow;
pub mod migrate_end_to_end;
pub mod validate_and_info;
