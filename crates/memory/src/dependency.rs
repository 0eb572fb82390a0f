//! Dependency inference: which existing facts a new statement builds on.
//!
//! The store only needs "text + currently valid facts → keys". The default
//! policy is a bag-of-words overlap; a stronger similarity measure can be
//! swapped in without touching invalidation logic.

use crate::classify::extract_keywords;
use crate::fact_store::Fact;

/// Decides which of the currently valid facts a new value depends on.
pub trait DependencyPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Return the keys of `valid_facts` that `value` depends on, in the
    /// order the facts were given.
    fn infer(&self, value: &str, valid_facts: &[&Fact]) -> Vec<String>;
}

/// Declares a dependency when the value's keywords intersect the union of
/// a fact's value keywords and key keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordOverlap;

impl DependencyPolicy for KeywordOverlap {
    fn name(&self) -> &str {
        "keyword_overlap"
    }

    fn infer(&self, value: &str, valid_facts: &[&Fact]) -> Vec<String> {
        let value_tokens = extract_keywords(value);
        if value_tokens.is_empty() {
            return Vec::new();
        }

        valid_facts
            .iter()
            .filter(|fact| {
                let mut keywords = extract_keywords(&fact.value);
                keywords.extend(extract_keywords(&fact.key));
                !value_tokens.is_disjoint(&keywords)
            })
            .map(|fact| fact.key.clone())
            .collect()
    }
}
