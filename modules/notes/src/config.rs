use serde::{Deserialize, Serialize};

/// `modules.notes` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotesConfig {
    #[serde(default = "default_list_limit")]
    pub list_limit: u64,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
        }
    }
}

fn default_list_limit() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let cfg: NotesConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.list_limit, 500);
    }
}
