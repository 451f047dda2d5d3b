use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::github::DEFAULT_API_URL;
use crate::types::RepoId;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token_env: Option<String>,
    pub token_command: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_env: Some("GITHUB_TOKEN".to_string()),
            token_command: Some("gh auth token".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Repositories offered on the listing screen, as "owner/name"
    pub repositories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

pub fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("repolens").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Config::default(),
        }
    }

    /// Read `path`, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Config::default();
        };

        match toml::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Config::default()
            }
        }
    }

    /// Configured repositories; entries that fail to decode are skipped.
    pub fn repositories(&self) -> Vec<RepoId> {
        self.general
            .repositories
            .iter()
            .filter_map(|raw| match RepoId::decode(raw) {
                Ok(repo) => Some(repo),
                Err(e) => {
                    warn!(error = %e, "skipping configured repository");
                    None
                }
            })
            .collect()
    }
}

/// Detect the repository from the current git remote origin, when the remote
/// lives on the host the API belongs to.
pub fn detect_repository(config: &Config) -> Option<RepoId> {
    let output = std::process::Command::new("git")
        .args(["remote", "get-url", "origin"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let (host, repo) = extract_remote(&url)?;
    if host != web_host(&config.github.api_url)? {
        return None;
    }
    RepoId::decode(&repo).ok()
}

/// Host serving the web UI for an API base URL: api.github.com -> github.com,
/// ghe.example.com/api/v3 -> ghe.example.com
fn web_host(api_url: &str) -> Option<String> {
    let without_scheme = api_url.split("://").nth(1)?;
    let host = without_scheme.split('/').next()?;
    let host = host.split(':').next()?;
    Some(host.strip_prefix("api.").unwrap_or(host).to_string())
}

/// Split an SSH (git@host:owner/repo.git) or HTTPS (https://host/owner/repo.git)
/// remote into host and "owner/repo"
fn extract_remote(url: &str) -> Option<(String, String)> {
    let (host, path) = if let Some(rest) = url.strip_prefix("git@") {
        rest.split_once(':')?
    } else if url.starts_with("https://") || url.starts_with("http://") || url.starts_with("ssh://")
    {
        let without_scheme = url.split("://").nth(1)?;
        let (authority, path) = without_scheme.split_once('/')?;
        let host = authority.split('@').next_back()?;
        // Strip port if present
        (host.split(':').next()?, path)
    } else {
        return None;
    };

    let repo = path.trim_matches('/');
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if host.is_empty() || repo.is_empty() {
        return None;
    }
    Some((host.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(url: &str) -> Option<(String, String)> {
        extract_remote(url)
    }

    fn pair(host: &str, repo: &str) -> Option<(String, String)> {
        Some((host.to_string(), repo.to_string()))
    }

    #[test]
    fn parse_valid_config() {
        let toml_str = r#"
[general]
repositories = ["facebook/react", "rust-lang%2Frust"]

[github]
api_url = "https://ghe.company.com/api/v3"
token_env = "GHE_TOKEN"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github.api_url, "https://ghe.company.com/api/v3");
        assert_eq!(config.github.token_env.as_deref(), Some("GHE_TOKEN"));
        // Unset fields keep their defaults
        assert_eq!(config.github.token_command.as_deref(), Some("gh auth token"));

        let repos: Vec<_> = config
            .repositories()
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(repos, ["facebook/react", "rust-lang/rust"]);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert!(config.general.repositories.is_empty());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/repolens/config.toml"));
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn invalid_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("repolens-invalid-{}.toml", std::process::id()));
        std::fs::write(&path, "[github\napi_url = ").unwrap();
        let config = Config::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn invalid_repositories_are_skipped() {
        let config = Config {
            general: GeneralConfig {
                repositories: vec!["bad%FF".to_string(), "good/repo".to_string()],
            },
            github: GitHubConfig::default(),
        };
        let repos = config.repositories();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].as_str(), "good/repo");
    }

    #[test]
    fn extract_remote_ssh() {
        assert_eq!(
            remote("git@github.com:owner/repo.git"),
            pair("github.com", "owner/repo")
        );
    }

    #[test]
    fn extract_remote_https() {
        assert_eq!(
            remote("https://github.com/owner/repo.git"),
            pair("github.com", "owner/repo")
        );
        assert_eq!(
            remote("https://github.com/owner/repo"),
            pair("github.com", "owner/repo")
        );
    }

    #[test]
    fn extract_remote_ssh_scheme_with_port() {
        assert_eq!(
            remote("ssh://git@ghe.local:2222/team/project.git"),
            pair("ghe.local", "team/project")
        );
    }

    #[test]
    fn extract_remote_invalid() {
        assert_eq!(remote("not-a-url"), None);
        assert_eq!(remote("https://github.com/"), None);
    }

    #[test]
    fn web_host_strips_api_prefix() {
        assert_eq!(web_host(DEFAULT_API_URL), Some("github.com".to_string()));
        assert_eq!(
            web_host("https://ghe.company.com/api/v3"),
            Some("ghe.company.com".to_string())
        );
        assert_eq!(web_host("localhost"), None);
    }
}
