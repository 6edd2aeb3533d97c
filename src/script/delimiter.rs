use std::fmt;

/// Statement delimiter in effect while splitting a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub delimiter: String,
    /// When set, only a line consisting of exactly the delimiter ends a statement
    pub alone_on_line: bool,
}

impl Delimiter {
    pub fn new(delimiter: &str, alone_on_line: bool) -> Self {
        Self {
            delimiter: delimiter.to_string(),
            alone_on_line,
        }
    }

    /// Whether a simplified (trimmed, upper-cased) line ends a statement
    pub fn terminates(&self, simplified_line: &str) -> bool {
        let upper = self.delimiter.to_uppercase();
        if self.alone_on_line {
            simplified_line == upper
        } else {
            simplified_line.ends_with(&upper)
        }
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::new(";", false)
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.delimiter)
    }
}
