//! ScopedFilter - Mandatory user/environment predicate
//!
//! Every retrieval query carries `{user_id, env}` so documents from other
//! users or other deployment environments are never returned. Built fresh
//! per request, never cached across users.

use serde_json::{Map, Value};

use crate::domain::value_objects::Environment;

/// The predicate merged into every retrieval query
#[derive(Debug, Clone)]
pub struct ScopedFilter {
    pub user_id: String,
    pub env: Environment,
    extra: Map<String, Value>,
}

impl ScopedFilter {
    pub fn new(user_id: impl Into<String>, env: Environment) -> Self {
        Self {
            user_id: user_id.into(),
            env,
            extra: Map::new(),
        }
    }

    /// Merge caller-supplied search parameters. The scope keys always win:
    /// a caller cannot override `user_id` or `env`.
    pub fn with_params(mut self, params: &Map<String, Value>) -> Self {
        for (key, value) in params {
            if key != "user_id" && key != "env" {
                self.extra.insert(key.clone(), value.clone());
            }
        }
        self
    }

    /// The merged filter as flat key/value entries.
    pub fn entries(&self) -> Map<String, Value> {
        let mut entries = self.extra.clone();
        entries.insert("user_id".to_string(), Value::String(self.user_id.clone()));
        entries.insert("env".to_string(), Value::String(self.env.to_string()));
        entries
    }

    /// The filter in the `$eq` comparison-operator form used by the
    /// Pinecone and MongoDB filter DSLs.
    pub fn eq_operator_entries(&self) -> Map<String, Value> {
        self.entries()
            .into_iter()
            .map(|(key, value)| (key, serde_json::json!({ "$eq": value })))
            .collect()
    }

    /// Whether a document's metadata satisfies this filter. Used by the
    /// in-memory backend; the remote backends apply it server-side.
    pub fn matches(&self, metadata: &Value) -> bool {
        self.entries().iter().all(|(key, expected)| {
            metadata.get(key).map(|actual| actual == expected).unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_keys_always_present() {
        let filter = ScopedFilter::new("user-1", Environment::Development);
        let entries = filter.entries();
        assert_eq!(entries["user_id"], "user-1");
        assert_eq!(entries["env"], "development");
    }

    #[test]
    fn test_caller_params_cannot_override_scope() {
        let mut params = Map::new();
        params.insert("user_id".to_string(), Value::String("intruder".to_string()));
        params.insert("env".to_string(), Value::String("production".to_string()));
        params.insert("cuisine".to_string(), Value::String("thai".to_string()));

        let filter = ScopedFilter::new("user-1", Environment::Staging).with_params(&params);
        let entries = filter.entries();

        assert_eq!(entries["user_id"], "user-1");
        assert_eq!(entries["env"], "staging");
        assert_eq!(entries["cuisine"], "thai");
    }

    #[test]
    fn test_eq_operator_form() {
        let filter = ScopedFilter::new("user-1", Environment::Production);
        let entries = filter.eq_operator_entries();
        assert_eq!(entries["user_id"], serde_json::json!({ "$eq": "user-1" }));
        assert_eq!(entries["env"], serde_json::json!({ "$eq": "production" }));
    }

    #[test]
    fn test_matches_rejects_other_scopes() {
        let filter = ScopedFilter::new("user-1", Environment::Development);

        let mine = serde_json::json!({ "user_id": "user-1", "env": "development" });
        let other_user = serde_json::json!({ "user_id": "user-2", "env": "development" });
        let other_env = serde_json::json!({ "user_id": "user-1", "env": "production" });

        assert!(filter.matches(&mine));
        assert!(!filter.matches(&other_user));
        assert!(!filter.matches(&other_env));
    }
}
