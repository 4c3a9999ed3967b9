//! Configuration for forge-relay.
//!
//! The configuration lives in a single TOML file. `${VAR}` placeholders in the
//! file are replaced by environment variables before parsing, and a few
//! `FORGE_RELAY_*` variables override individual settings afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";
pub const CONFIG_DIR: &str = "forge-relay";

pub const CONFIG_ENV: &str = "FORGE_RELAY_CONFIG";
pub const BIND_ENV: &str = "FORGE_RELAY_BIND";
pub const GITLAB_URL_ENV: &str = "FORGE_RELAY_GITLAB_URL";
pub const GITLAB_TOKEN_ENV: &str = "FORGE_RELAY_GITLAB_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub gitlab: Gitlab,
    #[serde(default)]
    pub log: Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors: true,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Gitlab {
    #[serde(default = "default_gitlab_url")]
    pub url: String,
    /// Administrator token. Every call is made with it, impersonating the
    /// requested user through GitLab's `Sudo` header.
    #[serde(default)]
    pub private_token: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for Gitlab {
    fn default() -> Self {
        Self {
            url: default_gitlab_url(),
            private_token: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Gitlab {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for Gitlab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gitlab")
            .field("url", &self.url)
            .field("private_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_gitlab_url() -> String {
    "http://localhost".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_filter() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Location of the global configuration file, if the platform has a
/// configuration directory.
pub fn global_config_path() -> Option<PathBuf> {
    let mut path = dirs_next::config_dir()?;
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    Some(path)
}

impl Config {
    /// Load the configuration from `path`, or from `FORGE_RELAY_CONFIG`, or
    /// from the global configuration file. A missing global file yields the
    /// defaults; an explicitly requested file must exist. Environment
    /// overrides are applied and the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match global_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("no configuration file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        debug!("loading configuration from {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read configuration file {:?}", path))?;
        Self::from_toml_str(&content, |name| std::env::var(name).ok())
            .with_context(|| format!("Invalid configuration file {:?}", path))
    }

    /// Parse a TOML document, substituting `${VAR}` placeholders through
    /// `lookup`. Unknown variables are left untouched.
    pub fn from_toml_str(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, anyhow::Error> {
        let placeholder = regex::Regex::new(r"\$\{([^}]+)\}")?;
        let substituted = placeholder.replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            lookup(name).unwrap_or_else(|| {
                warn!("environment variable {} is not set", name);
                caps[0].to_string()
            })
        });
        Ok(toml::from_str(&substituted)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup(BIND_ENV) {
            self.server.bind = bind;
        }
        if let Some(url) = lookup(GITLAB_URL_ENV) {
            self.gitlab.url = url;
        }
        if let Some(token) = lookup(GITLAB_TOKEN_ENV) {
            self.gitlab.private_token = token;
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let url = url::Url::parse(&self.gitlab.url)
            .map_err(|e| anyhow!("gitlab.url {:?} is not a valid URL: {}", self.gitlab.url, e))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => bail!("gitlab.url: unsupported URL scheme {:?}", scheme),
        }
        if self.gitlab.private_token.trim().is_empty() {
            bail!(
                "gitlab.private_token is empty (set it in the configuration file or {})",
                GITLAB_TOKEN_ENV
            );
        }
        if self.gitlab.timeout_secs == 0 {
            bail!("gitlab.timeout_secs must be at least 1");
        }
        if self.server.bind.trim().is_empty() {
            bail!("server.bind cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parse_full_config() {
        let config = Config::from_toml_str(
            r#"
[server]
bind = "0.0.0.0:9000"
cors = false

[gitlab]
url = "https://gitlab.example.com"
private_token = "secret"
timeout_secs = 5

[log]
filter = "forge_api=debug"
json = true
"#,
            no_env,
        )
        .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert!(!config.server.cors);
        assert_eq!(config.gitlab.url, "https://gitlab.example.com");
        assert_eq!(config.gitlab.timeout(), Duration::from_secs(5));
        assert!(config.log.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = Config::from_toml_str("", no_env).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.server.cors);
        assert_eq!(config.gitlab.timeout_secs, 30);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn placeholders_are_substituted() {
        let config = Config::from_toml_str(
            r#"
[gitlab]
url = "${GL_URL}"
private_token = "${GL_TOKEN}"
"#,
            |name| match name {
                "GL_URL" => Some("https://gitlab.internal".to_string()),
                _ => None,
            },
        )
        .unwrap();

        assert_eq!(config.gitlab.url, "https://gitlab.internal");
        // Unset variables stay as they are.
        assert_eq!(config.gitlab.private_token, "${GL_TOKEN}");
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::from_toml_str(
            r#"
[gitlab]
url = "https://gitlab.example.com"
private_token = "from-file"
"#,
            no_env,
        )
        .unwrap();

        config.apply_overrides(|name| match name {
            GITLAB_TOKEN_ENV => Some("from-env".to_string()),
            BIND_ENV => Some("127.0.0.1:1".to_string()),
            _ => None,
        });

        assert_eq!(config.gitlab.private_token, "from-env");
        assert_eq!(config.gitlab.url, "https://gitlab.example.com");
        assert_eq!(config.server.bind, "127.0.0.1:1");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = Config::default();
        config.gitlab.private_token = "token".to_string();
        assert!(config.validate().is_ok());

        config.gitlab.url = "ftp://gitlab.example.com".to_string();
        assert!(config.validate().is_err());

        config.gitlab.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.gitlab.url = "https://gitlab.example.com".to_string();
        config.gitlab.private_token = "  ".to_string();
        assert!(config.validate().is_err());

        config.gitlab.private_token = "token".to_string();
        config.gitlab.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn token_is_not_printed() {
        let mut gitlab = Gitlab::default();
        gitlab.private_token = "glpat-very-secret".to_string();
        let printed = format!("{:?}", gitlab);
        assert!(!printed.contains("very-secret"));
    }

    #[test]
    fn load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[gitlab]
url = "https://gitlab.example.com"
private_token = "abc"
"#,
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.gitlab.private_token, "abc");
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(&dir.path().join("absent.toml"));
        assert!(result.is_err());
    }
}
