use serde_json::{json, Map, Number, Value};

/// A store filter produced by the translator.
///
/// [`Filter::to_query`] renders the MongoDB query document handed to the
/// store.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document: `{}`.
    All,
    /// `{field: number}`.
    Exact { field: String, value: Number },
    /// `{field: {"$regex": pattern, "$options": "i"}}`.
    Regex(RegexMatch),
    /// `{"$or": [...]}`.
    AnyOf(Vec<Filter>),
    /// Caller-supplied query document, passed through untouched.
    Raw(Map<String, Value>),
}

/// A validated pattern bound to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexMatch {
    pub field: String,
    pub pattern: String,
    pub case_insensitive: bool,
}

impl RegexMatch {
    pub(crate) fn case_insensitive(field: &str, pattern: &str) -> Self {
        Self {
            field: field.to_string(),
            pattern: pattern.to_string(),
            case_insensitive: true,
        }
    }
}

impl Filter {
    pub fn to_query(&self) -> Value {
        match self {
            Filter::All => json!({}),
            Filter::Exact { field, value } => single(field, Value::Number(value.clone())),
            Filter::Regex(re) => {
                let mut cond = Map::new();
                cond.insert("$regex".into(), Value::String(re.pattern.clone()));
                if re.case_insensitive {
                    cond.insert("$options".into(), Value::String("i".into()));
                }
                single(&re.field, Value::Object(cond))
            }
            Filter::AnyOf(branches) => {
                json!({ "$or": branches.iter().map(Filter::to_query).collect::<Vec<_>>() })
            }
            Filter::Raw(doc) => Value::Object(doc.clone()),
        }
    }
}

fn single(field: &str, cond: Value) -> Value {
    let mut doc = Map::new();
    doc.insert(field.to_string(), cond);
    Value::Object(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_renders_empty_document() {
        assert_eq!(Filter::All.to_query(), json!({}));
    }

    #[test]
    fn exact_renders_field_equality() {
        let filter = Filter::Exact {
            field: "start_price".into(),
            value: Number::from(100),
        };
        assert_eq!(filter.to_query(), json!({ "start_price": 100 }));
    }

    #[test]
    fn regex_renders_options_only_when_case_insensitive() {
        let ci = Filter::Regex(RegexMatch::case_insensitive("title", "red"));
        assert_eq!(
            ci.to_query(),
            json!({ "title": { "$regex": "red", "$options": "i" } })
        );

        let cs = Filter::Regex(RegexMatch {
            field: "title".into(),
            pattern: "Red".into(),
            case_insensitive: false,
        });
        assert_eq!(cs.to_query(), json!({ "title": { "$regex": "Red" } }));
    }

    #[test]
    fn any_of_renders_disjunction() {
        let filter = Filter::AnyOf(vec![
            Filter::Regex(RegexMatch::case_insensitive("title", "hat")),
            Filter::Regex(RegexMatch::case_insensitive("description", "hat")),
        ]);
        assert_eq!(
            filter.to_query(),
            json!({ "$or": [
                { "title": { "$regex": "hat", "$options": "i" } },
                { "description": { "$regex": "hat", "$options": "i" } }
            ] })
        );
    }
}
