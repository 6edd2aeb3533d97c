//! Line-by-line accumulator for a single CQL statement
//!
//! The builder tracks whether the text seen so far leaves it inside a quoted
//! literal, a dollar-quoted literal or a block comment, so that delimiters in
//! those contexts never end the statement.

use crate::script::Delimiter;

/// Characters that separate tokens but never open or close a literal
const TOKEN_SEPARATORS: &[char] = &[
    ' ', '@', '<', '>', ';', ':', '=', '|', '(', ')', ',', '+', '{', '}',
];

const DOLLAR_QUOTE: &str = "$$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenType {
    Other,
    Quote,
    AlternateQuote,
    SingleLineComment,
    MultiLineComment,
}

#[derive(Debug, Default)]
pub struct CqlStatementBuilder {
    statement: String,
    line_number: usize,
    empty: bool,
    terminated: bool,
    inside_quote: bool,
    inside_alternate_quote: bool,
    line_ends_with_single_line_comment: bool,
    inside_multi_line_comment: bool,
    non_comment_part_seen: bool,
    delimiter: Delimiter,
}

impl CqlStatementBuilder {
    pub fn new() -> Self {
        Self {
            empty: true,
            ..Default::default()
        }
    }

    pub fn with_delimiter(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            ..Self::new()
        }
    }

    pub fn set_line_number(&mut self, line_number: usize) {
        self.line_number = line_number;
    }

    /// Line of the script on which this statement starts
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn into_statement(self) -> String {
        self.statement
    }

    /// CQL has no delimiter change directive
    pub fn extract_new_delimiter_from_line(&self, _line: &str) -> Option<Delimiter> {
        None
    }

    /// True if nothing but closed comments has been seen so far
    pub fn can_discard(&self) -> bool {
        !self.inside_alternate_quote
            && !self.inside_quote
            && !self.inside_multi_line_comment
            && !self.non_comment_part_seen
    }

    pub fn ends_with_open_literal(&self) -> bool {
        self.inside_quote || self.inside_alternate_quote
    }

    pub fn add_line(&mut self, line: &str) {
        if self.empty {
            self.empty = false;
        } else {
            self.statement.push('\n');
        }

        let simplified = simplify_line(line);
        self.apply_state_changes(&simplified);

        self.statement.push_str(line);
        if self.ends_with_open_literal() || self.inside_multi_line_comment {
            return;
        }

        if !self.line_ends_with_single_line_comment && self.delimiter.terminates(&simplified) {
            self.strip_delimiter();
            self.terminated = true;
        }
    }

    fn strip_delimiter(&mut self) {
        let trimmed_len = self.statement.trim_end().len();
        self.statement.truncate(trimmed_len);
        for _ in 0..self.delimiter.delimiter.chars().count() {
            self.statement.pop();
        }
        let trimmed_len = self.statement.trim_end().len();
        self.statement.truncate(trimmed_len);
    }

    fn apply_state_changes(&mut self, line: &str) {
        let tokens = classify_tokens(line);

        self.line_ends_with_single_line_comment = false;
        for token in tokens {
            if !self.inside_quote
                && !self.inside_alternate_quote
                && token == TokenType::MultiLineComment
            {
                self.inside_multi_line_comment = !self.inside_multi_line_comment;
            }

            if !self.inside_quote
                && !self.inside_alternate_quote
                && !self.inside_multi_line_comment
                && token == TokenType::SingleLineComment
            {
                self.line_ends_with_single_line_comment = true;
                return;
            }

            if !self.inside_multi_line_comment
                && !self.inside_quote
                && token == TokenType::AlternateQuote
            {
                self.inside_alternate_quote = !self.inside_alternate_quote;
            }

            if !self.inside_multi_line_comment
                && !self.inside_alternate_quote
                && token == TokenType::Quote
            {
                self.inside_quote = !self.inside_quote;
            }

            if !self.inside_multi_line_comment
                && !self.inside_quote
                && !self.inside_alternate_quote
                && token == TokenType::Other
            {
                self.non_comment_part_seen = true;
            }
        }
    }
}

/// Token kinds of a simplified line, in order. Whether a kind opens or closes
/// anything depends on the builder state and is decided when applying them.
fn classify_tokens(line: &str) -> Vec<TokenType> {
    let mut types = Vec::new();

    for token in line
        .split(TOKEN_SEPARATORS)
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        if token.len() >= DOLLAR_QUOTE.len() * 2
            && token.starts_with(DOLLAR_QUOTE)
            && token.ends_with(DOLLAR_QUOTE)
        {
            continue;
        }
        if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
            continue;
        }
        if token.len() >= 4 && token.starts_with("/*") && token.ends_with("*/") {
            continue;
        }

        let mut handled = false;
        if is_single_line_comment(token) {
            types.push(TokenType::SingleLineComment);
            handled = true;
        }

        if token.starts_with(DOLLAR_QUOTE) {
            types.push(TokenType::AlternateQuote);
            handled = true;
        } else if token.starts_with("/*") {
            types.push(TokenType::MultiLineComment);
            handled = true;
        } else if token.starts_with('\'') {
            types.push(TokenType::Quote);
            handled = true;
        }

        if !token.starts_with(DOLLAR_QUOTE) && token.ends_with(DOLLAR_QUOTE) {
            types.push(TokenType::AlternateQuote);
            handled = true;
        } else if !token.starts_with("/*") && token.ends_with("*/") {
            types.push(TokenType::MultiLineComment);
            handled = true;
        } else if !token.starts_with('\'') && token.ends_with('\'') {
            types.push(TokenType::Quote);
            handled = true;
        }

        if !handled {
            types.push(TokenType::Other);
        }
    }

    types
}

fn is_single_line_comment(token: &str) -> bool {
    token.starts_with("--") || token.starts_with("//")
}

/// Normalize a line for state tracking: drop escaped quotes, isolate `--`,
/// collapse whitespace and upper-case
fn simplify_line(line: &str) -> String {
    line.replace("''", "")
        .replace("--", " -- ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
