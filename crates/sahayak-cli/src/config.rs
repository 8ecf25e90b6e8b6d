//! CLI configuration from environment.

use sahayak_core::{VerificationRules, DEFAULT_TOLERANCE_M};
use sahayak_osrm::OsrmConfig;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub osrm_url: String,
    pub osrm_profile: String,
    pub tolerance_m: f64,
    pub request_timeout_s: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = OsrmConfig::default();
        Self {
            api_url: lookup("SAHAYAK_API_URL")
                .unwrap_or_else(|| "http://localhost:8000".to_string()),
            osrm_url: lookup("SAHAYAK_OSRM_URL").unwrap_or(defaults.base_url),
            osrm_profile: lookup("SAHAYAK_OSRM_PROFILE").unwrap_or(defaults.profile),
            tolerance_m: lookup("SAHAYAK_TOLERANCE_M")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TOLERANCE_M),
            request_timeout_s: lookup("SAHAYAK_REQUEST_TIMEOUT_S")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_s),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s.max(1))
    }

    pub fn osrm_config(&self) -> OsrmConfig {
        OsrmConfig {
            base_url: self.osrm_url.clone(),
            profile: self.osrm_profile.clone(),
            request_timeout_s: self.request_timeout_s,
            ..OsrmConfig::default()
        }
    }

    pub fn verification_rules(&self) -> anyhow::Result<VerificationRules> {
        let rules = VerificationRules::with_tolerance(self.tolerance_m);
        rules.validate()?;
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn falls_back_to_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.osrm_url, "https://router.project-osrm.org");
        assert_eq!(config.osrm_profile, "driving");
        assert_eq!(config.tolerance_m, 20.0);
        assert_eq!(config.request_timeout_s, 10);
    }

    #[test]
    fn reads_overrides_and_validates_tolerance() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SAHAYAK_API_URL", "https://portal.example"),
            ("SAHAYAK_TOLERANCE_M", "50"),
            ("SAHAYAK_REQUEST_TIMEOUT_S", "not-a-number"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_url, "https://portal.example");
        assert_eq!(config.verification_rules().unwrap().tolerance_m, 50.0);
        assert_eq!(config.request_timeout_s, 10);

        let bad = Config {
            tolerance_m: -1.0,
            ..config
        };
        assert!(bad.verification_rules().is_err());
    }
}
