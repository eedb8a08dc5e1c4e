use serde::{Deserialize, Serialize};

/// Search filter for the listing source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchParams {
    /// Term matched against ad titles
    pub keyword: String,
    /// Site category id
    pub category: String,
}

impl SearchParams {
    pub fn new(keyword: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: category.into(),
        }
    }
}
