use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application settings read from `config.yaml`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Policy overlay files, applied in order.
    #[serde(default)]
    pub policy_paths: Vec<PathBuf>,
    /// Handler wiring file. The built-in wiring is used when unset.
    #[serde(default)]
    pub wiring_path: Option<PathBuf>,
    #[serde(default = "default_bootstrap_admin")]
    pub bootstrap_admin: String,
    /// Roles created at start-up if missing.
    #[serde(default = "default_seed_roles")]
    pub seed_roles: Vec<String>,
}

fn default_bootstrap_admin() -> String {
    "admin@gmail.com".to_string()
}

fn default_seed_roles() -> Vec<String> {
    vec!["admin".to_string(), "manager".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy_paths: Vec::new(),
            wiring_path: None,
            bootstrap_admin: default_bootstrap_admin(),
            seed_roles: default_seed_roles(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_yaml::from_str("policy_paths: [policy.yaml]\n").unwrap();
        assert_eq!(config.policy_paths, vec![PathBuf::from("policy.yaml")]);
        assert!(config.wiring_path.is_none());
        assert_eq!(config.bootstrap_admin, "admin@gmail.com");
        assert_eq!(config.seed_roles, vec!["admin", "manager"]);
    }
}
