// Integration tests for cqlmigrate

pub mod cli;
pub mod helpers;
pub mod integration;
