use serde::{Deserialize, Serialize};

/// `modules.identity` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl IdentityConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            anyhow::bail!(
                "modules.identity.bcrypt_cost must be within 4..=31, got {}",
                self.bcrypt_cost
            );
        }
        Ok(())
    }
}
