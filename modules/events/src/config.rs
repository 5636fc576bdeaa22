use serde::{Deserialize, Serialize};

/// `modules.events` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EventsConfig {
    /// Upper bound on rows returned by the public listing.
    pub list_limit: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { list_limit: 500 }
    }
}

impl EventsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.list_limit == 0 {
            anyhow::bail!("modules.events.list_limit must be positive");
        }
        Ok(())
    }
}
