use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub hide: bool,
    pub reason: Reason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Reason {
    NonEnglish,
    SymbolTagCount { count: usize },
    NotFiltered,
}

impl ClassificationResult {
    pub fn hidden(reason: Reason) -> Self {
        Self { hide: true, reason }
    }

    pub fn visible() -> Self {
        Self {
            hide: false,
            reason: Reason::NotFiltered,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::NonEnglish => f.write_str("non-english"),
            Reason::SymbolTagCount { count } => write!(f, "symbol-tag-count({count})"),
            Reason::NotFiltered => f.write_str("not-filtered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_render_as_labels() {
        assert_eq!(Reason::NonEnglish.to_string(), "non-english");
        assert_eq!(
            Reason::SymbolTagCount { count: 3 }.to_string(),
            "symbol-tag-count(3)"
        );
        assert_eq!(Reason::NotFiltered.to_string(), "not-filtered");
    }
}
