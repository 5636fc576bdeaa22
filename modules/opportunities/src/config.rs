use serde::{Deserialize, Serialize};

/// `modules.opportunities` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OpportunitiesConfig {
    /// Location stored when a posting is created without one.
    pub default_location: String,
    /// Upper bound on rows returned by the public listing.
    pub list_limit: u64,
}

impl Default for OpportunitiesConfig {
    fn default() -> Self {
        Self {
            default_location: "Remote".into(),
            list_limit: 500,
        }
    }
}

impl OpportunitiesConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.list_limit == 0 {
            anyhow::bail!("modules.opportunities.list_limit must be positive");
        }
        Ok(())
    }
}
