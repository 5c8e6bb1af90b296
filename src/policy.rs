use serde::{Deserialize, Serialize};

/// Allow/deny token lists deciding which institutions are kept.
///
/// A name is included when it contains at least one allow token and none of
/// the deny tokens, compared case-insensitively. An empty allow list admits
/// every name not denied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstitutionPolicy {
    pub allow_tokens: Vec<String>,
    pub deny_tokens: Vec<String>,
}

impl Default for InstitutionPolicy {
    fn default() -> Self {
        Self {
            allow_tokens: vec!["BAN".to_string(), "BEN".to_string()],
            deny_tokens: vec![
                "KALBURGI".to_string(),
                "BANTWAL".to_string(),
                "BANGARAPET".to_string(),
                "MANGALORE".to_string(),
                "RANEBENNUR".to_string(),
            ],
        }
    }
}

impl InstitutionPolicy {
    pub fn new(allow_tokens: Vec<String>, deny_tokens: Vec<String>) -> Self {
        Self {
            allow_tokens,
            deny_tokens,
        }
    }

    pub fn allow_all() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn is_included(&self, institution_name: &str) -> bool {
        let name = institution_name.to_uppercase();
        let contains = |token: &String| name.contains(&token.to_uppercase());

        let allowed = self.allow_tokens.is_empty() || self.allow_tokens.iter().any(contains);
        allowed && !self.deny_tokens.iter().any(contains)
    }
}
