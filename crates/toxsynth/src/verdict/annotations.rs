//! "Not evaluated" annotations keyed by endpoint label.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reviewer annotation suppressing verdict computation for an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotEvaluated {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NotEvaluated {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

/// Annotation store. Applies to every sex of the annotated endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationStore {
    entries: IndexMap<String, NotEvaluated>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an endpoint as not evaluated.
    pub fn mark(&mut self, label: impl Into<String>, annotation: NotEvaluated) {
        self.entries.insert(label.into(), annotation);
    }

    /// Remove an annotation, returning it if present.
    pub fn unmark(&mut self, label: &str) -> Option<NotEvaluated> {
        self.entries.shift_remove(label)
    }

    pub fn get(&self, label: &str) -> Option<&NotEvaluated> {
        self.entries.get(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_unmark() {
        let mut store = AnnotationStore::new();
        store.mark("ALT", NotEvaluated::new("Hemolyzed samples"));

        assert_eq!(
            store.get("ALT").and_then(|a| a.reason.as_deref()),
            Some("Hemolyzed samples")
        );
        assert!(store.get("AST").is_none());
        assert!(store.unmark("ALT").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let store: AnnotationStore =
            serde_json::from_str(r#"{"Liver weight": {"reason": "Outlier animal"}, "BUN": {}}"#)
                .unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("BUN").unwrap().reason.is_none());
    }
}
