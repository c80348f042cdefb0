use crate::{
    domain::{CashtagRule, Rules, RULES_KEY},
    filter::rules_source::load_rules,
    storage::{StorageError, Store},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub threshold: String,
    pub filter_non_english: bool,
    pub debug_logging: bool,
}

impl SettingsForm {
    pub async fn restore(store: &Store) -> Self {
        let rules = load_rules(store).await;
        Self {
            threshold: rules
                .cashtag_rule
                .map(|rule| rule.threshold.to_string())
                .unwrap_or_default(),
            filter_non_english: rules.filter_non_english,
            debug_logging: rules.debug_logging,
        }
    }

    pub fn to_rules(&self) -> Rules {
        Rules {
            cashtag_rule: parse_leading_int(&self.threshold).map(CashtagRule::new),
            filter_non_english: self.filter_non_english,
            debug_logging: self.debug_logging,
        }
    }

    pub async fn submit(&self, store: &Store) -> Result<Rules, StorageError> {
        let rules = self.to_rules();
        store.set(RULES_KEY, rules.to_stored()).await?;
        tracing::info!(target: "settings", ?rules, "options saved");
        Ok(rules)
    }
}

/// `parseInt`-style prefix parse. Out-of-range values saturate.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = rest
        .find(|ch: char| !ch.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    if digits.is_empty() {
        return None;
    }

    let mut value: i64 = 0;
    for digit in digits.bytes() {
        let digit = i64::from(digit - b'0');
        value = value
            .saturating_mul(10)
            .saturating_add(if negative { -digit } else { digit });
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn threshold_parses_like_parse_int() {
        assert_eq!(parse_leading_int("4"), Some(4));
        assert_eq!(parse_leading_int("  12abc"), Some(12));
        assert_eq!(parse_leading_int("-2"), Some(-2));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("3.9"), Some(3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int("99999999999999999999999"), Some(i64::MAX));
    }

    #[tokio::test]
    async fn restore_reflects_stored_rules() {
        let store = Store::in_memory();
        let form = SettingsForm::restore(&store).await;
        assert_eq!(form.threshold, "3");
        assert!(!form.filter_non_english);

        store
            .set(
                RULES_KEY,
                json!({ "cashtag": { "value": 6 }, "debugLogging": true }),
            )
            .await
            .unwrap();
        let form = SettingsForm::restore(&store).await;
        assert_eq!(
            form,
            SettingsForm {
                threshold: "6".into(),
                filter_non_english: false,
                debug_logging: true,
            }
        );
    }

    #[tokio::test]
    async fn submit_writes_whole_rules_object() {
        let store = Store::in_memory();
        let mut changes = store.subscribe();
        let form = SettingsForm {
            threshold: "5".into(),
            filter_non_english: true,
            debug_logging: false,
        };

        let rules = form.submit(&store).await.unwrap();
        assert_eq!(rules.cashtag_rule, Some(CashtagRule::new(5)));
        assert_eq!(
            store.get(RULES_KEY).await.unwrap(),
            Some(json!({
                "cashtagRule": { "threshold": 5 },
                "filterNonEnglish": true,
                "debugLogging": false
            }))
        );
        assert_eq!(changes.recv().await.unwrap().key, RULES_KEY);

        let form = SettingsForm {
            threshold: "lots".into(),
            ..form
        };
        let rules = form.submit(&store).await.unwrap();
        assert_eq!(rules.cashtag_rule, None);
        assert_eq!(SettingsForm::restore(&store).await.threshold, "");
    }
}
