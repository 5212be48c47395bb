use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A registry entry. `name`, `description` and `url` are typed; every other key of the
/// source object is kept in `attributes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ServiceDescriptor {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

const NAME_ALIAS: &str = "func_name";
const DESCRIPTION_ALIAS: &str = "docstring";

impl From<Map<String, Value>> for ServiceDescriptor {
    fn from(map: Map<String, Value>) -> Self {
        let mut attributes: BTreeMap<String, Value> = map.into_iter().collect();
        let name = take_field(&mut attributes, "name", Some(NAME_ALIAS));
        let description = take_field(&mut attributes, "description", Some(DESCRIPTION_ALIAS));
        let url = take_field(&mut attributes, "url", None);
        Self {
            name,
            description,
            url,
            attributes,
        }
    }
}

// The canonical key wins. The alias fills in only when the canonical key is absent, and
// is then consumed; otherwise it stays an ordinary attribute.
fn take_field(
    attributes: &mut BTreeMap<String, Value>,
    key: &str,
    alias: Option<&str>,
) -> String {
    let value = match attributes.remove(key) {
        Some(value) => value,
        None => match alias.and_then(|a| attributes.remove(a)) {
            Some(value) => value,
            None => return String::new(),
        },
    };
    match value {
        Value::String(s) => s,
        _ => String::new(),
    }
}

impl ServiceDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.to_string(), Value::String(value.into()));
        self
    }

    pub fn field(&self, aspect: &str) -> Option<&str> {
        match aspect {
            "name" => Some(self.name.as_str()),
            "description" => Some(self.description.as_str()),
            "url" => Some(self.url.as_str()),
            NAME_ALIAS => self.attribute(aspect).or(Some(self.name.as_str())),
            DESCRIPTION_ALIAS => self.attribute(aspect).or(Some(self.description.as_str())),
            other => self.attribute(other),
        }
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    pub fn identity(&self) -> Option<&str> {
        if self.url.is_empty() {
            None
        } else {
            Some(self.url.as_str())
        }
    }

    pub fn same_service(&self, other: &ServiceDescriptor) -> bool {
        matches!((self.identity(), other.identity()), (Some(a), Some(b)) if a == b)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    aspects: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform<S: AsRef<str>>(text: &str, aspects: &[S]) -> Self {
        aspects
            .iter()
            .fold(Self::new(), |q, aspect| q.with_aspect(aspect.as_ref(), text))
    }

    pub fn with_aspect(mut self, aspect: &str, text: &str) -> Self {
        if let Some(slot) = self.aspects.iter_mut().find(|(name, _)| name == aspect) {
            slot.1 = text.to_string();
        } else {
            self.aspects.push((aspect.to_string(), text.to_string()));
        }
        self
    }

    pub fn aspects(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aspects.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.iter().all(|(_, text)| text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub service: ServiceDescriptor,
    pub score: f64,
    pub matched_aspects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationCase {
    pub query: String,
    pub expected_service: ServiceDescriptor,
}

#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub query: String,
    pub predicted: Option<ServiceDescriptor>,
    pub expected: ServiceDescriptor,
    /// 1-based position of the expected service in the strategy's ranking.
    pub expected_rank: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub strategy: String,
    pub dataset: String,
    pub metrics: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_aliases_map_to_named_fields() {
        let line = r#"{"func_name":"pay","docstring":"process payment","url":"u1","repo":"acme/pay","code_tokens":["a","b"]}"#;
        let svc: ServiceDescriptor = serde_json::from_str(line).unwrap();
        assert_eq!(svc.name, "pay");
        assert_eq!(svc.description, "process payment");
        assert_eq!(svc.field("func_name"), Some("pay"));
        assert_eq!(svc.field("docstring"), Some("process payment"));
        assert!(!svc.attributes.contains_key("func_name"));
        assert_eq!(svc.field("repo"), Some("acme/pay"));
        assert_eq!(svc.field("code_tokens"), None);
        assert_eq!(svc.field("missing"), None);
    }

    #[test]
    fn canonical_keys_win_and_aliases_stay_attributes() {
        let line = r#"{"name":"PayService","func_name":"pay","description":"d","docstring":"doc","url":"u1"}"#;
        let svc: ServiceDescriptor = serde_json::from_str(line).unwrap();
        assert_eq!(svc.name, "PayService");
        assert_eq!(svc.description, "d");
        assert_eq!(svc.field("func_name"), Some("pay"));
        assert_eq!(svc.field("docstring"), Some("doc"));

        let back: ServiceDescriptor =
            serde_json::from_str(&serde_json::to_string(&svc).unwrap()).unwrap();
        assert_eq!(back, svc);
    }

    #[test]
    fn non_string_named_fields_become_empty() {
        let svc: ServiceDescriptor =
            serde_json::from_str(r#"{"name":null,"description":3,"url":"u"}"#).unwrap();
        assert_eq!(svc.name, "");
        assert_eq!(svc.description, "");
        assert_eq!(svc.url, "u");
    }

    #[test]
    fn identity_requires_url() {
        let a = ServiceDescriptor::new("a", "", "");
        let b = ServiceDescriptor::new("b", "", "");
        assert!(!a.same_service(&b));
        let c = ServiceDescriptor::new("c", "", "u1");
        let d = ServiceDescriptor::new("d", "", "u1");
        assert!(c.same_service(&d));
    }

    #[test]
    fn query_keeps_insertion_order_and_replaces_duplicates() {
        let q = Query::new()
            .with_aspect("name", "pay")
            .with_aspect("description", "process payment")
            .with_aspect("name", "charge");
        let aspects: Vec<_> = q.aspects().collect();
        assert_eq!(aspects, vec![("name", "charge"), ("description", "process payment")]);
        assert!(Query::uniform("  ", &["name"]).is_empty());
    }
}
