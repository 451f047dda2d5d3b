use tracing::debug;

use crate::config::GitHubConfig;

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}

/// Resolve a token from the configured env var, then the token command.
/// `None` means the API is used anonymously (public repositories only, with
/// a lower rate limit).
pub fn load_token(config: &GitHubConfig) -> Option<String> {
    if let Some(env_var) = &config.token_env {
        if let Ok(token) = std::env::var(env_var) {
            if !token.is_empty() {
                debug!(%env_var, "using token from environment");
                return Some(token);
            }
        }
    }

    if let Some(cmd) = &config.token_command {
        if let Some(token) = try_cli_token(cmd) {
            debug!(command = %cmd, "using token from command");
            return Some(token);
        }
    }

    debug!("no token found, continuing anonymously");
    None
}
