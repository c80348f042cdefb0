use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{ClassificationResult, Reason, Rules};

/// Posts whose Latin share of letters is at or below this are treated as non-English.
pub const ENGLISH_LATIN_RATIO: f64 = 0.8;

const MAX_SYMBOL_TAG_LETTERS: usize = 5;

static NOISE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://\S+|[@#][A-Za-z0-9_]+|\$[A-Za-z0-9_]+|[0-9]+")
        .expect("valid noise regex")
});
static LETTER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").expect("valid letter regex"));
static SYMBOL_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[A-Za-z]+").expect("valid symbol tag regex"));

/// The language check runs first and short-circuits.
pub fn classify(text: &str, rules: &Rules) -> ClassificationResult {
    if rules.filter_non_english && !is_english(text) {
        return ClassificationResult::hidden(Reason::NonEnglish);
    }

    if let Some(rule) = rules.cashtag_rule {
        let count = count_symbol_tags(text);
        if rule.triggers(count) {
            return ClassificationResult::hidden(Reason::SymbolTagCount { count });
        }
    }

    ClassificationResult::visible()
}

/// Share of ASCII Latin letters among all letters once links, mentions, tags and
/// digits are removed. `None` when nothing letter-like remains.
pub fn latin_letter_ratio(text: &str) -> Option<f64> {
    let cleaned = NOISE_REGEX.replace_all(text, "");
    let latin = cleaned.chars().filter(char::is_ascii_alphabetic).count();
    let total = LETTER_REGEX.find_iter(&cleaned).count();
    if total == 0 {
        None
    } else {
        Some(latin as f64 / total as f64)
    }
}

/// Text without any letters is never considered English.
pub fn is_english(text: &str) -> bool {
    latin_letter_ratio(text).is_some_and(|ratio| ratio > ENGLISH_LATIN_RATIO)
}

/// Counts `$` tags of one to five ASCII letters that end on an ASCII word boundary.
pub fn count_symbol_tags(text: &str) -> usize {
    SYMBOL_TAG_REGEX
        .find_iter(text)
        .filter(|m| {
            let letters = m.as_str().len() - 1;
            letters <= MAX_SYMBOL_TAG_LETTERS && ends_on_word_boundary(&text[m.end()..])
        })
        .count()
}

fn ends_on_word_boundary(rest: &str) -> bool {
    rest.chars()
        .next()
        .map_or(true, |next| !(next.is_ascii_alphanumeric() || next == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CashtagRule;

    fn cashtag_rules(threshold: i64) -> Rules {
        Rules {
            cashtag_rule: Some(CashtagRule::new(threshold)),
            filter_non_english: false,
            debug_logging: false,
        }
    }

    fn language_rules() -> Rules {
        Rules {
            cashtag_rule: None,
            filter_non_english: true,
            debug_logging: false,
        }
    }

    #[test]
    fn three_cashtags_reach_threshold_three() {
        let text = "Check $AAPL $TSLA $GME up today";
        let result = classify(text, &cashtag_rules(3));
        assert!(result.hide);
        assert_eq!(result.reason.to_string(), "symbol-tag-count(3)");

        let result = classify(text, &cashtag_rules(4));
        assert!(!result.hide);
        assert_eq!(result.reason.to_string(), "not-filtered");
    }

    #[test]
    fn mostly_non_latin_text_is_hidden() {
        let text = format!("Hello {}", "你好".repeat(10));
        assert_eq!(latin_letter_ratio(&text), Some(0.2));
        let result = classify(&text, &language_rules());
        assert!(result.hide);
        assert_eq!(result.reason, Reason::NonEnglish);
    }

    #[test]
    fn letterless_text_is_hidden_as_non_english() {
        for text in ["", "   ", "12345 67", "https://t.co/abc @someone #tag $AAPL", "🚀🚀🚀 !!!"] {
            assert_eq!(latin_letter_ratio(text), None, "{text:?}");
            let result = classify(text, &language_rules());
            assert!(result.hide, "{text:?}");
            assert_eq!(result.reason, Reason::NonEnglish);
        }
    }

    #[test]
    fn language_check_ignores_links_mentions_and_tags() {
        let text = "Great thread https://例え.jp/パス @tanaka #news $AAPL 2024 worth reading";
        assert_eq!(latin_letter_ratio(text), Some(1.0));
        assert!(!classify(text, &language_rules()).hide);

        // only ASCII word characters count as part of a mention
        assert!(!is_english("Great thread @日本語日本語日本語"));
    }

    #[test]
    fn ratio_boundary_is_inclusive() {
        // 4 Latin letters and 1 Greek letter: exactly 0.8
        let text = "abcd λ";
        assert_eq!(latin_letter_ratio(text), Some(0.8));
        assert!(!is_english(text));
        assert!(is_english("abcde λ"));
    }

    #[test]
    fn language_check_runs_before_cashtags() {
        let rules = Rules {
            cashtag_rule: Some(CashtagRule::new(1)),
            filter_non_english: true,
            debug_logging: false,
        };
        let result = classify("$AAPL $TSLA 買い 買い 買い", &rules);
        assert_eq!(result.reason, Reason::NonEnglish);

        let result = classify("buying more $AAPL today", &rules);
        assert_eq!(result.reason, Reason::SymbolTagCount { count: 1 });
    }

    #[test]
    fn absent_rules_skip_their_checks() {
        let rules = Rules {
            cashtag_rule: None,
            filter_non_english: false,
            debug_logging: false,
        };
        assert_eq!(
            classify("$A $B $C $D 你好你好你好", &rules),
            ClassificationResult::visible()
        );
    }

    #[test]
    fn symbol_tags_follow_ascii_word_boundaries() {
        assert_eq!(count_symbol_tags("$AAPL"), 1);
        assert_eq!(count_symbol_tags("$AAPL, $msft."), 2);
        assert_eq!(count_symbol_tags("$ABCDEF"), 0);
        assert_eq!(count_symbol_tags("$AAPL1 $GME_"), 0);
        assert_eq!(count_symbol_tags("$AAPLé"), 1);
        assert_eq!(count_symbol_tags("$$GME"), 1);
        assert_eq!(count_symbol_tags("$AB$CD"), 2);
        assert_eq!(count_symbol_tags("$100 and $ 5"), 0);
    }

    #[test]
    fn symbol_tag_count_ignores_scan_order() {
        let words = ["$AAPL", "to", "$TSLA", "the", "$GME", "moon", "$BTC"];
        let forward = words.join(" ");
        let backward = words.iter().rev().cloned().collect::<Vec<_>>().join(" ");
        assert_eq!(count_symbol_tags(&forward), 4);
        assert_eq!(count_symbol_tags(&forward), count_symbol_tags(&backward));
        assert_eq!(
            classify(&forward, &cashtag_rules(2)),
            classify(&backward, &cashtag_rules(2))
        );
    }

    #[test]
    fn raising_threshold_never_hides_more() {
        let samples = [
            "",
            "$A",
            "$AAPL $TSLA",
            "Check $AAPL $TSLA $GME up today",
            "$A $B $C $D $E $F",
        ];
        for text in samples {
            let mut was_hidden = true;
            for threshold in -1..10 {
                let hidden = classify(text, &cashtag_rules(threshold)).hide;
                assert!(was_hidden || !hidden, "{text:?} at {threshold}");
                was_hidden = hidden;
            }
        }
    }
}
