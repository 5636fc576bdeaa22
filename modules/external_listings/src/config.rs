use serde::{Deserialize, Serialize};

/// `modules.external_listings` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalListingsConfig {
    /// Page size for catalog listings when the request carries none.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for ExternalListingsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_fifty() {
        let cfg: ExternalListingsConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.default_limit, 50);
    }
}
