pub mod delimiter;
pub mod statement_builder;

pub use delimiter::Delimiter;
pub use statement_builder::CqlStatementBuilder;

use crate::db::CqlSession;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

/// A CQL migration script split into individually executable statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlScript {
    statements: Vec<String>,
}

impl CqlScript {
    pub fn parse(source: &str) -> Self {
        Self::parse_with_delimiter(source, None)
    }

    /// Split with a delimiter other than `;` in effect from the first line
    pub fn parse_with_delimiter(source: &str, delimiter: Option<Delimiter>) -> Self {
        Self {
            statements: lines_to_statements(source.lines(), delimiter),
        }
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Run every statement in order; stops at the first failure
    pub async fn execute(&self, session: &dyn CqlSession, timeout: Option<Duration>) -> Result<()> {
        for (index, statement) in self.statements.iter().enumerate() {
            debug!("Executing CQL: {}", statement);
            session
                .execute(statement, timeout)
                .await
                .with_context(|| {
                    format!(
                        "Statement {} of {} failed: {}",
                        index + 1,
                        self.statements.len(),
                        statement
                    )
                })?;
        }
        Ok(())
    }
}

fn lines_to_statements<'a>(
    lines: impl Iterator<Item = &'a str>,
    mut non_standard_delimiter: Option<Delimiter>,
) -> Vec<String> {
    let mut statements = Vec::new();
    let mut builder = CqlStatementBuilder::new();

    for (index, line) in lines.enumerate() {
        if builder.is_empty() {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(delimiter) = builder.extract_new_delimiter_from_line(line) {
                non_standard_delimiter = Some(delimiter);
                continue;
            }

            builder = match &non_standard_delimiter {
                Some(delimiter) => CqlStatementBuilder::with_delimiter(delimiter.clone()),
                None => CqlStatementBuilder::new(),
            };
            builder.set_line_number(index + 1);
        }

        builder.add_line(line);

        if builder.can_discard() {
            builder = CqlStatementBuilder::new();
        } else if builder.is_terminated() {
            let finished = std::mem::take(&mut builder);
            debug!(
                "Found statement at line {}: {}",
                finished.line_number(),
                finished.statement()
            );
            statements.push(finished.into_statement());
            builder = CqlStatementBuilder::new();
        }
    }

    if !builder.is_empty() {
        statements.push(builder.into_statement());
    }

    statements
}
