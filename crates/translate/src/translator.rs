use inference::TextInference;
use serde_json::{Map, Number, Value};

use crate::filter::{Filter, RegexMatch};
use crate::pattern::validate_pattern;
use crate::{TranslateConfig, TranslateError};

/// Fields searched when the AI-assisted search is not bound to one field.
pub const AI_SEARCH_FIELDS: [&str; 2] = ["title", "description"];

/// Extended-JSON type wrappers; they describe values, not query operators.
const EXTJSON_KEYS: [&str; 10] = [
    "$oid",
    "$date",
    "$numberInt",
    "$numberLong",
    "$numberDouble",
    "$numberDecimal",
    "$binary",
    "$timestamp",
    "$regularExpression",
    "$uuid",
];

/// 2^63: integral floats in `[-2^63, 2^63)` convert to `i64` exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn validate_field(field: &str) -> Result<(), TranslateError> {
    if field.is_empty() || field.starts_with('$') || field.contains('\0') {
        return Err(TranslateError::InvalidField(field.to_string()));
    }
    Ok(())
}

/// Parse a query-string value as a finite number. Integral values come back
/// as JSON integers so they compare equal to integer fields.
fn parse_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }
    let float: f64 = trimmed.parse().ok()?;
    if !float.is_finite() {
        return None;
    }
    if float.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&float) {
        return Some(Number::from(float as i64));
    }
    Number::from_f64(float)
}

/// `{field: number}`. Fails with [`TranslateError::InvalidValueFormat`]
/// unless `raw_value` is a finite number.
pub fn build_exact_filter(field: &str, raw_value: &str) -> Result<Filter, TranslateError> {
    validate_field(field)?;
    let value = parse_number(raw_value)
        .ok_or_else(|| TranslateError::InvalidValueFormat(raw_value.to_string()))?;
    Ok(Filter::Exact {
        field: field.to_string(),
        value,
    })
}

/// Case-insensitive regex on `field`, after the complexity guard.
pub fn build_regex_filter(
    field: &str,
    pattern: &str,
    cfg: &TranslateConfig,
) -> Result<Filter, TranslateError> {
    validate_field(field)?;
    validate_pattern(pattern, cfg.max_pattern_len).map_err(TranslateError::InvalidPattern)?;
    Ok(Filter::Regex(RegexMatch::case_insensitive(field, pattern)))
}

/// Ask `inference` for a pattern derived from `query`, validate it, and bind
/// it to `field`, or to every entry of [`AI_SEARCH_FIELDS`] when `field` is
/// `None`.
pub async fn build_ai_assisted_regex_filter(
    inference: &dyn TextInference,
    field: Option<&str>,
    query: &str,
    cfg: &TranslateConfig,
) -> Result<Filter, TranslateError> {
    if let Some(field) = field {
        validate_field(field)?;
    }
    if query.trim().is_empty() {
        return Err(TranslateError::MissingParameter("value"));
    }

    let derived = inference.infer(query).await.map_err(|e| {
        tracing::warn!(provider = inference.name(), error = %e, "inference call failed");
        TranslateError::InferenceUnavailable(e.to_string())
    })?;

    let pattern = derived.trim();
    if pattern.is_empty() {
        return Err(TranslateError::InferenceUnavailable(
            "inference returned an empty pattern".into(),
        ));
    }
    validate_pattern(pattern, cfg.max_pattern_len).map_err(|reason| {
        tracing::warn!(provider = inference.name(), pattern, %reason, "derived pattern rejected");
        TranslateError::InferenceUnavailable(format!("derived pattern unusable: {reason}"))
    })?;
    tracing::debug!(provider = inference.name(), pattern, "derived search pattern");

    Ok(match field {
        Some(field) => Filter::Regex(RegexMatch::case_insensitive(field, pattern)),
        None => Filter::AnyOf(
            AI_SEARCH_FIELDS
                .iter()
                .map(|field| Filter::Regex(RegexMatch::case_insensitive(field, pattern)))
                .collect(),
        ),
    })
}

/// Use a request body as the filter. Only the shape is checked, plus the
/// operator allow-list when one is configured.
pub fn passthrough_filter(body: Value, cfg: &TranslateConfig) -> Result<Filter, TranslateError> {
    let Value::Object(doc) = body else {
        return Err(TranslateError::MalformedFilter(
            "filter must be a JSON object".into(),
        ));
    };
    if let Some(allowed) = cfg.passthrough_operators.as_deref() {
        if let Some(op) = first_disallowed_operator(&doc, allowed) {
            return Err(TranslateError::MalformedFilter(format!(
                "operator `{op}` is not allowed"
            )));
        }
    }
    Ok(Filter::Raw(doc))
}

/// The match-everything filter.
pub fn match_all() -> Filter {
    Filter::All
}

fn first_disallowed_operator<'a>(doc: &'a Map<String, Value>, allowed: &[String]) -> Option<&'a str> {
    for (key, value) in doc {
        if key.starts_with('$')
            && !EXTJSON_KEYS.contains(&key.as_str())
            && !allowed.iter().any(|op| op == key)
        {
            return Some(key.as_str());
        }
        if let Some(op) = disallowed_in_value(value, allowed) {
            return Some(op);
        }
    }
    None
}

fn disallowed_in_value<'a>(value: &'a Value, allowed: &[String]) -> Option<&'a str> {
    match value {
        Value::Object(doc) => first_disallowed_operator(doc, allowed),
        Value::Array(items) => items.iter().find_map(|item| disallowed_in_value(item, allowed)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inference::InferenceError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a canned answer and counts calls.
    struct Canned {
        answer: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    impl Canned {
        fn ok(answer: &'static str) -> Self {
            Self {
                answer: Ok(answer),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                answer: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextInference for Canned {
        async fn infer(&self, _input: &str) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(InferenceError::Http("connection refused".into())),
            }
        }
    }

    #[test]
    fn exact_filter_coerces_integers_and_floats() {
        let filter = build_exact_filter("start_price", "100").unwrap();
        assert_eq!(filter.to_query(), json!({ "start_price": 100 }));

        let filter = build_exact_filter("start_price", " 12.5 ").unwrap();
        assert_eq!(filter.to_query(), json!({ "start_price": 12.5 }));

        let filter = build_exact_filter("start_price", "1e3").unwrap();
        assert_eq!(filter.to_query(), json!({ "start_price": 1000 }));

        let filter = build_exact_filter("delta", "-7").unwrap();
        assert_eq!(filter.to_query(), json!({ "delta": -7 }));
    }

    #[test]
    fn exact_filter_keeps_large_integral_floats_as_integers() {
        let filter = build_exact_filter("start_price", "1e18").unwrap();
        assert_eq!(
            filter.to_query(),
            json!({ "start_price": 1_000_000_000_000_000_000_i64 })
        );

        // Beyond i64 the value stays a float.
        let filter = build_exact_filter("start_price", "1e19").unwrap();
        assert_eq!(filter.to_query(), json!({ "start_price": 1e19 }));
    }

    #[test]
    fn exact_filter_rejects_non_numbers() {
        for raw in ["", "   ", "abc", "12abc", "NaN", "inf", "-Infinity", "0x10", "1,000"] {
            assert_eq!(
                build_exact_filter("start_price", raw),
                Err(TranslateError::InvalidValueFormat(raw.to_string())),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn field_names_are_validated() {
        assert!(matches!(
            build_exact_filter("", "1"),
            Err(TranslateError::InvalidField(_))
        ));
        assert!(matches!(
            build_exact_filter("$where", "1"),
            Err(TranslateError::InvalidField(_))
        ));
        assert!(matches!(
            build_regex_filter("$expr", "a", &TranslateConfig::default()),
            Err(TranslateError::InvalidField(_))
        ));
        assert!(build_exact_filter("seller.rating", "4").is_ok());
    }

    #[test]
    fn regex_filter_is_case_insensitive() {
        let filter = build_regex_filter("title", "red", &TranslateConfig::default()).unwrap();
        assert_eq!(
            filter.to_query(),
            json!({ "title": { "$regex": "red", "$options": "i" } })
        );
    }

    #[test]
    fn regex_filter_rejects_bad_and_dangerous_patterns() {
        let cfg = TranslateConfig::default();
        assert!(matches!(
            build_regex_filter("title", "(unclosed", &cfg),
            Err(TranslateError::InvalidPattern(_))
        ));
        assert!(matches!(
            build_regex_filter("title", "(a+)+$", &cfg),
            Err(TranslateError::InvalidPattern(_))
        ));

        let tight = TranslateConfig {
            max_pattern_len: 4,
            ..TranslateConfig::default()
        };
        assert!(matches!(
            build_regex_filter("title", "abcde", &tight),
            Err(TranslateError::InvalidPattern(_))
        ));
    }

    #[tokio::test]
    async fn ai_filter_on_single_field() {
        let inference = Canned::ok("  red|crimson \n");
        let filter = build_ai_assisted_regex_filter(
            &inference,
            Some("title"),
            "red things",
            &TranslateConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            filter.to_query(),
            json!({ "title": { "$regex": "red|crimson", "$options": "i" } })
        );
        assert_eq!(inference.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ai_filter_without_field_spans_title_and_description() {
        let inference = Canned::ok("hat");
        let filter =
            build_ai_assisted_regex_filter(&inference, None, "hats", &TranslateConfig::default())
                .await
                .unwrap();
        assert_eq!(
            filter.to_query(),
            json!({ "$or": [
                { "title": { "$regex": "hat", "$options": "i" } },
                { "description": { "$regex": "hat", "$options": "i" } }
            ] })
        );
    }

    #[tokio::test]
    async fn ai_filter_maps_every_failure_to_inference_unavailable() {
        let cfg = TranslateConfig::default();

        let failing = Canned::failing();
        let err = build_ai_assisted_regex_filter(&failing, Some("title"), "red", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::InferenceUnavailable(_)));

        let blank = Canned::ok("   ");
        let err = build_ai_assisted_regex_filter(&blank, Some("title"), "red", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::InferenceUnavailable(_)));

        let broken = Canned::ok("([a-z]");
        let err = build_ai_assisted_regex_filter(&broken, Some("title"), "red", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::InferenceUnavailable(_)));

        let explosive = Canned::ok("(a*)*b");
        let err = build_ai_assisted_regex_filter(&explosive, None, "red", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::InferenceUnavailable(_)));
    }

    #[tokio::test]
    async fn ai_filter_checks_input_before_calling_out() {
        let inference = Canned::ok("x");
        let cfg = TranslateConfig::default();

        let err = build_ai_assisted_regex_filter(&inference, Some("title"), "  ", &cfg)
            .await
            .unwrap_err();
        assert_eq!(err, TranslateError::MissingParameter("value"));

        let err = build_ai_assisted_regex_filter(&inference, Some("$where"), "red", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidField(_)));

        assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn passthrough_returns_body_untouched() {
        let body = json!({ "start_price": { "$gte": 10 }, "$or": [{ "a": 1 }, { "b": 2 }] });
        let filter = passthrough_filter(body.clone(), &TranslateConfig::default()).unwrap();
        assert_eq!(filter.to_query(), body);
    }

    #[test]
    fn passthrough_rejects_non_objects() {
        for body in [json!([1, 2]), json!("title"), json!(3), json!(null)] {
            assert!(matches!(
                passthrough_filter(body, &TranslateConfig::default()),
                Err(TranslateError::MalformedFilter(_))
            ));
        }
    }

    #[test]
    fn passthrough_allow_list_walks_nested_operators() {
        let cfg = TranslateConfig::default().with_passthrough_operators(["$gte", "$lte", "$or"]);

        let ok = json!({
            "_id": { "$oid": "65f1c0ffee0000000000beef" },
            "$or": [{ "start_price": { "$gte": 10 } }, { "reserve_price": { "$lte": 5 } }]
        });
        assert!(passthrough_filter(ok, &cfg).is_ok());

        let nested = json!({ "$or": [{ "$where": "sleep(1000)" }] });
        assert_eq!(
            passthrough_filter(nested, &cfg),
            Err(TranslateError::MalformedFilter(
                "operator `$where` is not allowed".into()
            ))
        );
    }

    #[test]
    fn match_all_is_empty_filter() {
        assert_eq!(match_all().to_query(), json!({}));
    }
}
