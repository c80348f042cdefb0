use std::sync::Arc;

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};

use crate::{
    domain::{Rules, RULES_KEY},
    infrastructure::lifetime::UnloadListener,
    storage::Store,
};

#[derive(Debug, Clone)]
pub struct RulesCell {
    current: Arc<Rules>,
}

impl RulesCell {
    pub fn new(rules: Rules) -> Self {
        Self {
            current: Arc::new(rules),
        }
    }

    pub fn current(&self) -> Arc<Rules> {
        self.current.clone()
    }

    pub fn replace(&mut self, rules: Rules) -> Arc<Rules> {
        std::mem::replace(&mut self.current, Arc::new(rules))
    }
}

pub async fn load_rules(store: &Store) -> Rules {
    match store.get(RULES_KEY).await {
        Ok(value) => {
            let rules = Rules::from_stored(value.as_ref());
            tracing::info!(target: "rules", ?rules, "rules loaded");
            rules
        }
        Err(err) => {
            tracing::warn!(target: "rules", error = %err, "failed to read rules; using defaults");
            Rules::default()
        }
    }
}

/// A removed or empty value is delivered as the defaults.
pub fn on_rules_change<F>(store: &Store, mut lifetime: UnloadListener, mut callback: F) -> JoinHandle<()>
where
    F: FnMut(Rules) + Send + 'static,
{
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        loop {
            let change = tokio::select! {
                change = changes.recv() => change,
                _ = lifetime.unloaded() => break,
            };
            match change {
                Ok(change) if change.key == RULES_KEY => {
                    callback(Rules::from_stored(change.new_value.as_ref()));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "rules", skipped, "missed store notifications");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!(target: "rules", "rule change subscription ended");
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{domain::CashtagRule, infrastructure::lifetime::PageLifetime};

    #[test]
    fn replace_swaps_whole_snapshot() {
        let mut cell = RulesCell::new(Rules::default());
        let held = cell.current();
        let strict = Rules {
            cashtag_rule: Some(CashtagRule::new(1)),
            filter_non_english: true,
            debug_logging: true,
        };

        let previous = cell.replace(strict.clone());
        assert_eq!(*previous, Rules::default());
        assert_eq!(*held, Rules::default());
        assert_eq!(*cell.current(), strict);
    }

    #[tokio::test]
    async fn load_uses_defaults_until_something_is_stored() {
        let store = Store::in_memory();
        assert_eq!(load_rules(&store).await, Rules::default());

        store
            .set(RULES_KEY, json!({ "cashtagRule": { "threshold": 7 } }))
            .await
            .unwrap();
        let rules = load_rules(&store).await;
        assert_eq!(rules.cashtag_rule, Some(CashtagRule::new(7)));
        assert!(!rules.filter_non_english);
    }

    #[tokio::test]
    async fn change_callback_sees_rules_key_only() {
        let store = Store::in_memory();
        let (lifetime, listener) = PageLifetime::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = on_rules_change(&store, listener, move |rules| {
            let _ = tx.send(rules);
        });

        store.set("theme", json!("dark")).await.unwrap();
        store
            .set(RULES_KEY, json!({ "filterNonEnglish": true }))
            .await
            .unwrap();
        let rules = rx.recv().await.unwrap();
        assert!(rules.filter_non_english);
        assert_eq!(rules.cashtag_rule, None);

        store.remove(RULES_KEY).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Rules::default());

        lifetime.unload();
        handle.await.unwrap();
    }
}
