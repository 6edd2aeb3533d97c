/// End-to-end CLI tests that exercise the built binary with assert_cmd.
///
/// None of these reach a cluster: they cover argument parsing and the
/// configuration errors reported before a connection is attempted.
pub mod error_handling;
pub mod help;
