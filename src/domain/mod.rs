pub mod classification;
pub mod rules;

pub use classification::{ClassificationResult, Reason};
pub use rules::{CashtagRule, Rules, RULES_KEY};
