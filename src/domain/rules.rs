use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RULES_KEY: &str = "rules";

pub const DEFAULT_CASHTAG_THRESHOLD: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredRules")]
pub struct Rules {
    pub cashtag_rule: Option<CashtagRule>,
    pub filter_non_english: bool,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashtagRule {
    pub threshold: i64,
}

impl CashtagRule {
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }

    /// Only `>=` is supported.
    pub fn triggers(&self, count: usize) -> bool {
        i64::try_from(count).unwrap_or(i64::MAX) >= self.threshold
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            cashtag_rule: Some(CashtagRule::new(DEFAULT_CASHTAG_THRESHOLD)),
            filter_non_english: false,
            debug_logging: false,
        }
    }
}

impl Rules {
    /// Absent, `null`, empty and undecodable records give the defaults.
    pub fn from_stored(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        if is_empty_record(value) {
            return Self::default();
        }
        match serde_json::from_value::<Rules>(value.clone()) {
            Ok(rules) => rules,
            Err(err) => {
                tracing::warn!(
                    target: "rules",
                    error = %err,
                    "stored rules are malformed; using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn to_stored(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn is_empty_record(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Wire shape of a stored record. Accepts the older `cashtag: { value }` layout.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRules {
    #[serde(default, alias = "cashtag")]
    cashtag_rule: Option<StoredCashtagRule>,
    #[serde(default)]
    filter_non_english: bool,
    #[serde(default)]
    debug_logging: bool,
}

#[derive(Deserialize)]
struct StoredCashtagRule {
    #[serde(default, alias = "value")]
    threshold: Option<i64>,
}

impl From<StoredRules> for Rules {
    fn from(stored: StoredRules) -> Self {
        Self {
            cashtag_rule: stored
                .cashtag_rule
                .and_then(|rule| rule.threshold)
                .map(CashtagRule::new),
            filter_non_english: stored.filter_non_english,
            debug_logging: stored.debug_logging,
        }
    }
}
