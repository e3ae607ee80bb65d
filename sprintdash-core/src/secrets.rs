//! Fallback GitHub credential for single-user deployments
//!
//! Requests normally carry their own access token. When they don't, the
//! server and the CLI fall back to a token found here, checked in order:
//! 1. `SPRINTDASH_GITHUB_TOKEN` environment variable
//! 2. `GITHUB_TOKEN` environment variable
//! 3. Secrets file (`~/.config/sprintdash/secrets.toml`, mode 0600 on Unix)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

const TOKEN_ENV_VARS: [&str; 2] = ["SPRINTDASH_GITHUB_TOKEN", "GITHUB_TOKEN"];

/// Secrets file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub section
    pub github: GitHubSecrets,
}

/// GitHub-related secrets
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// Personal access token
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns empty secrets if the file doesn't exist
    pub fn load() -> Result<Self> {
        match Self::default_secrets_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load secrets from a specific file, refusing files others can read
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = std::fs::metadata(path)?.permissions().mode();
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }

        let contents = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        secrets.github.token = secrets
            .github
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(secrets)
    }

    /// Get the default secrets file path
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sprintdash").join("secrets.toml"))
    }

    /// Resolve the fallback token, environment first
    pub fn github_token(&self) -> Option<String> {
        for var in TOKEN_ENV_VARS {
            if let Ok(token) = std::env::var(var) {
                let token = token.trim();
                if !token.is_empty() {
                    debug!(var, "Using GitHub token from environment");
                    return Some(token.to_string());
                }
            }
        }

        let token = self.github.token.clone();
        if token.is_some() {
            debug!("Using GitHub token from secrets file");
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_secrets(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_default_secrets() {
        assert!(Secrets::default().github.token.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_insecure_permissions_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let file = write_secrets("[github]\ntoken = \"ghp_test\"\n");
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        let err = Secrets::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("insecure permissions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_token_is_trimmed() {
        use std::os::unix::fs::PermissionsExt;

        let file = write_secrets("[github]\ntoken = \"  ghp_test \"\n");
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600)).unwrap();

        let secrets = Secrets::load_from_file(file.path()).unwrap();
        assert_eq!(secrets.github.token.as_deref(), Some("ghp_test"));
    }

    #[cfg(unix)]
    #[test]
    fn test_blank_token_is_dropped() {
        use std::os::unix::fs::PermissionsExt;

        let file = write_secrets("[github]\ntoken = \"   \"\n");
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600)).unwrap();

        let secrets = Secrets::load_from_file(file.path()).unwrap();
        assert!(secrets.github.token.is_none());
    }
}
