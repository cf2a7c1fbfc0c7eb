//! Thin client around the Microsoft Power Platform CLI (`pac`).
//!
//! Every platform operation goes through one external `pac` invocation whose
//! stdout/stderr/exit code are captured into a [`CommandResult`]. Invocations
//! are awaited with a bounded timeout so an unresponsive CLI cannot stall a
//! request forever.

pub mod parse;

use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{process::Command, time::timeout};
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

/// Substring of the no-argument `pac` output that identifies the product.
pub const PRODUCT_MARKER: &str = "Microsoft PowerPlatform CLI";

/// Outcome of one external `pac` invocation.
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub output: String,
    pub error: String,
}

/// Service-principal credentials for `pac auth create`.
///
/// Read fresh from the process environment on every request; nothing is
/// cached between requests.
#[derive(Debug)]
pub struct AuthConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub environment_url: String,
}

impl AuthConfig {
    /// # Errors
    /// Returns an error if any variable is missing or empty, or if
    /// `DYNAMICS_URL` does not parse as a URL.
    pub fn from_env() -> Result<Self> {
        let tenant_id = require_env("AZURE_TENANT_ID")?;
        let client_id = require_env("AZURE_CLIENT_ID")?;
        let client_secret = SecretString::from(require_env("AZURE_CLIENT_SECRET")?);
        let environment_url = require_env("DYNAMICS_URL")?;

        Url::parse(&environment_url).context("DYNAMICS_URL is not a valid URL")?;

        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
            environment_url,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    let value = env::var(name).unwrap_or_default();
    if value.trim().is_empty() {
        Err(anyhow!("Missing authentication configuration: {name}"))
    } else {
        Ok(value)
    }
}

#[derive(Debug, Clone)]
pub struct PacClient {
    bin: PathBuf,
    work_dir: PathBuf,
    timeout: Duration,
}

impl PacClient {
    #[must_use]
    pub fn new(bin: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            work_dir: work_dir.into(),
            timeout,
        }
    }

    /// Probe the CLI with no arguments.
    ///
    /// Installed means exit code 0 and the product marker in stdout. Any
    /// execution error counts as not installed.
    pub async fn is_installed(&self) -> bool {
        match self.run(&[]).await {
            Ok(result) => result.success && result.output.contains(PRODUCT_MARKER),
            Err(err) => {
                error!("Error checking pac installation: {err:#}");
                false
            }
        }
    }

    /// `pac auth create` with service-principal credentials.
    ///
    /// # Errors
    /// Returns an error if the process cannot be spawned or times out.
    pub async fn auth_create(&self, auth: &AuthConfig) -> Result<CommandResult> {
        self.run(&[
            "auth",
            "create",
            "--environment",
            &auth.environment_url,
            "--tenant",
            &auth.tenant_id,
            "--applicationId",
            &auth.client_id,
            "--clientSecret",
            auth.client_secret.expose_secret(),
        ])
        .await
    }

    /// `pac copilot extract-template` for the source bot.
    ///
    /// # Errors
    /// Returns an error if the process cannot be spawned or times out.
    pub async fn extract_template(
        &self,
        environment_id: &str,
        bot_id: &str,
        template: &Path,
    ) -> Result<CommandResult> {
        self.run(&[
            "copilot",
            "extract-template",
            "--environment",
            environment_id,
            "--bot",
            bot_id,
            "--templateFileName",
            &template.to_string_lossy(),
        ])
        .await
    }

    /// `pac copilot create` from a previously extracted template.
    ///
    /// # Errors
    /// Returns an error if the process cannot be spawned or times out.
    pub async fn create_copilot(
        &self,
        environment_id: &str,
        display_name: &str,
        schema_name: &str,
        solution: &str,
        template: &Path,
    ) -> Result<CommandResult> {
        self.run(&[
            "copilot",
            "create",
            "--environment",
            environment_id,
            "--displayName",
            display_name,
            "--schemaName",
            schema_name,
            "--solution",
            solution,
            "--templateFileName",
            &template.to_string_lossy(),
        ])
        .await
    }

    /// Template file path for one clone request.
    ///
    /// Namespaced per invocation so concurrent requests with the same schema
    /// name cannot clobber each other's file.
    #[must_use]
    pub fn template_file(&self, schema_name: &str) -> PathBuf {
        let suffix = Uuid::new_v4().simple().to_string();
        self.work_dir
            .join(format!("{schema_name}_{suffix}_template.yaml"))
    }

    async fn run(&self, args: &[&str]) -> Result<CommandResult> {
        // Log the subcommand only; auth arguments carry the client secret.
        let subcommand = args
            .iter()
            .take(2)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        debug!("Executing command: pac {}", subcommand);

        let output = timeout(self.timeout, Command::new(&self.bin).args(args).output())
            .await
            .map_err(|_| {
                anyhow!(
                    "pac {subcommand} timed out after {}s",
                    self.timeout.as_secs()
                )
            })?
            .with_context(|| format!("Failed to execute {}", self.bin.display()))?;

        let result = CommandResult {
            success: output.status.success(),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
            error: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!("pac command output: {}", result.output);
        if !result.error.is_empty() {
            error!("pac command error: {}", result.error);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn fake_pac(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("pac");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn client(dir: &Path, body: &str) -> PacClient {
        let bin = fake_pac(dir, body);
        PacClient::new(bin, dir, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_run_captures_output_error_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let pac = client(dir.path(), "echo out; echo err >&2; exit 3");

        let result = pac.run(&[]).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.output.trim(), "out");
        assert_eq!(result.error.trim(), "err");
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_pac(dir.path(), "sleep 5");
        let pac = PacClient::new(bin, dir.path(), Duration::from_millis(100));

        let err = pac.run(&[]).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_is_installed_requires_marker() {
        let dir = tempfile::tempdir().unwrap();
        let pac = client(dir.path(), "echo 'some other tool'");
        assert!(!pac.is_installed().await);

        let dir = tempfile::tempdir().unwrap();
        let pac = client(dir.path(), "echo 'Microsoft PowerPlatform CLI 1.32'");
        assert!(pac.is_installed().await);
    }

    #[tokio::test]
    async fn test_is_installed_requires_exit_zero() {
        let dir = tempfile::tempdir().unwrap();
        let pac = client(dir.path(), "echo 'Microsoft PowerPlatform CLI'; exit 1");
        assert!(!pac.is_installed().await);
    }

    #[tokio::test]
    async fn test_is_installed_fails_closed_on_spawn_error() {
        let pac = PacClient::new("/nonexistent/pac", "/tmp", Duration::from_secs(1));
        assert!(!pac.is_installed().await);
    }

    #[test]
    fn test_template_file_is_unique_per_call() {
        let pac = PacClient::new("pac", "/tmp", Duration::from_secs(1));

        let first = pac.template_file("my_copilot");
        let second = pac.template_file("my_copilot");

        assert_ne!(first, second);

        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("my_copilot_"));
        assert!(name.ends_with("_template.yaml"));
        assert!(first.starts_with("/tmp"));
    }

    #[test]
    fn test_auth_config_from_env() {
        temp_env::with_vars(
            [
                ("AZURE_TENANT_ID", Some("tenant")),
                ("AZURE_CLIENT_ID", Some("client")),
                ("AZURE_CLIENT_SECRET", Some("secret")),
                ("DYNAMICS_URL", Some("https://org.crm.dynamics.com")),
            ],
            || {
                let auth = AuthConfig::from_env().unwrap();
                assert_eq!(auth.tenant_id, "tenant");
                assert_eq!(auth.client_id, "client");
                assert_eq!(auth.client_secret.expose_secret(), "secret");
                assert_eq!(auth.environment_url, "https://org.crm.dynamics.com");
            },
        );
    }

    #[test]
    fn test_auth_config_missing_var() {
        temp_env::with_vars(
            [
                ("AZURE_TENANT_ID", Some("tenant")),
                ("AZURE_CLIENT_ID", Some("client")),
                ("AZURE_CLIENT_SECRET", None),
                ("DYNAMICS_URL", Some("https://org.crm.dynamics.com")),
            ],
            || {
                let err = AuthConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("AZURE_CLIENT_SECRET"));
            },
        );
    }

    #[test]
    fn test_auth_config_empty_var() {
        temp_env::with_vars(
            [
                ("AZURE_TENANT_ID", Some(" ")),
                ("AZURE_CLIENT_ID", Some("client")),
                ("AZURE_CLIENT_SECRET", Some("secret")),
                ("DYNAMICS_URL", Some("https://org.crm.dynamics.com")),
            ],
            || {
                let err = AuthConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("AZURE_TENANT_ID"));
            },
        );
    }

    #[test]
    fn test_auth_config_invalid_url() {
        temp_env::with_vars(
            [
                ("AZURE_TENANT_ID", Some("tenant")),
                ("AZURE_CLIENT_ID", Some("client")),
                ("AZURE_CLIENT_SECRET", Some("secret")),
                ("DYNAMICS_URL", Some("not a url")),
            ],
            || {
                let err = AuthConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("DYNAMICS_URL"));
            },
        );
    }

    #[test]
    fn test_auth_config_debug_redacts_secret() {
        temp_env::with_vars(
            [
                ("AZURE_TENANT_ID", Some("tenant")),
                ("AZURE_CLIENT_ID", Some("client")),
                ("AZURE_CLIENT_SECRET", Some("hunter2")),
                ("DYNAMICS_URL", Some("https://org.crm.dynamics.com")),
            ],
            || {
                let auth = AuthConfig::from_env().unwrap();
                let debug = format!("{auth:?}");
                assert!(!debug.contains("hunter2"));
            },
        );
    }
}
