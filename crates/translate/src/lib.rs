//! # Querygate Translate
//!
//! The query-translation layer: turns the pieces of an inbound search request
//! into a store [`Filter`]. Everything here is pure and synchronous except
//! [`build_ai_assisted_regex_filter`], which makes exactly one call to a
//! [`TextInference`](inference::TextInference) client.
//!
//! | Operation | Filter shape | Failure |
//! |---|---|---|
//! | [`build_exact_filter`] | `{field: number}` | [`TranslateError::InvalidValueFormat`] |
//! | [`build_regex_filter`] | `{field: {$regex, $options: "i"}}` | [`TranslateError::InvalidPattern`] |
//! | [`build_ai_assisted_regex_filter`] | regex on one field, or `$or` over title/description | [`TranslateError::InferenceUnavailable`] |
//! | [`passthrough_filter`] | caller's document as-is | [`TranslateError::MalformedFilter`] |
//!
//! ```
//! use serde_json::json;
//! use translate::{build_exact_filter, build_regex_filter, TranslateConfig};
//!
//! let exact = build_exact_filter("start_price", "100").unwrap();
//! assert_eq!(exact.to_query(), json!({ "start_price": 100 }));
//!
//! let regex = build_regex_filter("title", "red", &TranslateConfig::default()).unwrap();
//! assert_eq!(regex.to_query(), json!({ "title": { "$regex": "red", "$options": "i" } }));
//!
//! assert!(build_exact_filter("start_price", "cheap").is_err());
//! ```
//!
//! ## Trust boundary
//!
//! [`passthrough_filter`] hands a caller-authored query document to the store.
//! That keeps the gateway flexible, but any operator the store understands is
//! reachable, including expensive ones. Set
//! [`TranslateConfig::passthrough_operators`] to restrict it.

mod config;
mod error;
mod filter;
mod pattern;
mod translator;

pub use config::TranslateConfig;
pub use error::TranslateError;
pub use filter::{Filter, RegexMatch};
pub use translator::{
    build_ai_assisted_regex_filter, build_exact_filter, build_regex_filter, match_all,
    passthrough_filter, AI_SEARCH_FIELDS,
};
