use serde::{Deserialize, Serialize};

/// `modules.notifications` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Upper bound on rows returned by one inbox listing.
    #[serde(default = "default_list_limit")]
    pub list_limit: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
        }
    }
}

fn default_list_limit() -> u64 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_unknown_keys() {
        let cfg: NotificationsConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.list_limit, 200);
        assert!(serde_json::from_value::<NotificationsConfig>(serde_json::json!({"limit": 1})).is_err());
    }
}
