use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

const REQUIRED_VARS: [&str; 3] = ["CRM_BASE_URL", "CRM_USERNAME", "CRM_PASSWORD"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Runtime configuration for the proxy server.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub public_dir: PathBuf,
    pub enable_cors: bool,
    pub crm: CrmConfig,
}

/// Upstream CRM endpoint and the static credential injected into every call.
#[derive(Clone)]
pub struct CrmConfig {
    pub base_url: url::Url,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CrmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("public_dir", &self.public_dir)
            .field("enable_cors", &self.enable_cors)
            .field("crm", &self.crm)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&'static str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|var| get(*var).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let base_url = get("CRM_BASE_URL").unwrap_or_default();
        let base_url = url::Url::parse(base_url.trim()).map_err(|e| ConfigError::Invalid {
            var: "CRM_BASE_URL",
            reason: e.to_string(),
        })?;
        let username = get("CRM_USERNAME").unwrap_or_default();
        let password = get("CRM_PASSWORD").unwrap_or_default();

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => 3000,
        };
        let bind_addr: SocketAddr = match get("BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    var: "BIND_ADDR",
                    reason: e.to_string(),
                }
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], port)),
        };

        let public_dir = PathBuf::from(get("PUBLIC_DIR").unwrap_or_else(|| "public".to_string()));

        let enable_cors = get("ENABLE_CORS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        Ok(Self {
            bind_addr,
            public_dir,
            enable_cors,
            crm: CrmConfig {
                base_url,
                username,
                password,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const SECRETS: [(&str, &str); 3] = [
        ("CRM_BASE_URL", "https://crm.example.com"),
        ("CRM_USERNAME", "integration"),
        ("CRM_PASSWORD", "s3cret"),
    ];

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let cfg = AppConfig::from_lookup(lookup(&SECRETS)).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.public_dir, PathBuf::from("public"));
        assert!(cfg.enable_cors);
        assert_eq!(cfg.crm.username, "integration");
        assert_eq!(cfg.crm.base_url.as_str(), "https://crm.example.com/");
    }

    #[test]
    fn each_missing_secret_is_reported() {
        for skip in REQUIRED_VARS {
            let vars: Vec<_> = SECRETS.iter().copied().filter(|(k, _)| *k != skip).collect();
            match AppConfig::from_lookup(lookup(&vars)) {
                Err(ConfigError::Missing(missing)) => assert_eq!(missing, vec![skip]),
                other => panic!("expected missing {skip}, got {other:?}"),
            }
        }
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let vars = [
            ("CRM_BASE_URL", "https://crm.example.com"),
            ("CRM_USERNAME", "   "),
            ("CRM_PASSWORD", "s3cret"),
        ];
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("CRM_USERNAME"));
    }

    #[test]
    fn port_and_bind_addr_overrides() {
        let mut vars = SECRETS.to_vec();
        vars.push(("PORT", "8088"));
        let cfg = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8088);

        vars.push(("BIND_ADDR", "127.0.0.1:9000"));
        let cfg = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut vars = SECRETS.to_vec();
        vars.push(("PORT", "not-a-port"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
    }

    #[test]
    fn cors_can_be_disabled() {
        let mut vars = SECRETS.to_vec();
        vars.push(("ENABLE_CORS", "false"));
        assert!(!AppConfig::from_lookup(lookup(&vars)).unwrap().enable_cors);
    }

    #[test]
    fn debug_output_redacts_password() {
        let cfg = AppConfig::from_lookup(lookup(&SECRETS)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
