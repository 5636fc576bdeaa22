use serde::{Deserialize, Serialize};

/// `modules.api_ingress` section.
///
/// `bind_addr` is normally filled by the server binary from `server.host`/`server.port`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiIngressConfig {
    pub bind_addr: String,
    pub enable_docs: bool,
    pub cors_enabled: bool,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            enable_docs: true,
            cors_enabled: true,
            request_timeout_secs: 30,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_section_keeps_defaults() {
        let cfg: ApiIngressConfig =
            serde_json::from_value(serde_json::json!({"bind_addr": "0.0.0.0:8080"})).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert!(cfg.enable_docs);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let r = serde_json::from_value::<ApiIngressConfig>(serde_json::json!({"tls": true}));
        assert!(r.is_err());
    }
}
