use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the profile to use when no flags are given.
pub const PROFILE_ENV: &str = "AWS_DEFAULT_PROFILE";
/// Environment variable overriding the shared credentials file location.
pub const CREDENTIALS_FILE_ENV: &str = "AWS_SHARED_CREDENTIALS_FILE";

#[derive(Clone, PartialEq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Credential-related command-line flags.
#[derive(Default, Clone)]
pub struct CredentialArgs {
    pub profile: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

/// Resolve credentials from flags, then `AWS_DEFAULT_PROFILE`.
///
/// An explicit profile wins over a key pair. A key pair must be complete.
pub fn resolve_credentials(args: &CredentialArgs) -> Result<AwsCredentials> {
    let env_profile = std::env::var(PROFILE_ENV).ok().filter(|p| !p.is_empty());
    resolve_with(args, env_profile.as_deref(), &credentials_file_path())
}

fn resolve_with(
    args: &CredentialArgs,
    env_profile: Option<&str>,
    credentials_file: &Path,
) -> Result<AwsCredentials> {
    let access_key = args.access_key.as_deref().filter(|k| !k.is_empty());
    let secret_key = args.secret_key.as_deref().filter(|k| !k.is_empty());

    if let Some(profile) = args.profile.as_deref().filter(|p| !p.is_empty()) {
        tracing::debug!(profile, "using credentials from profile flag");
        return read_profile(credentials_file, profile);
    }

    match (access_key, secret_key) {
        (Some(access), Some(secret)) => {
            tracing::debug!("using credentials from key flags");
            return Ok(AwsCredentials {
                access_key_id: access.to_string(),
                secret_access_key: secret.to_string(),
                session_token: None,
            });
        }
        (Some(_), None) => anyhow::bail!("must provide secret access key using -s option"),
        (None, Some(_)) => anyhow::bail!("must provide access key using -a option"),
        (None, None) => {}
    }

    if let Some(profile) = env_profile {
        tracing::debug!(profile, "using credentials from {}", PROFILE_ENV);
        return read_profile(credentials_file, profile);
    }

    anyhow::bail!(
        "must provide either -p option or -a and -s options (or set {})",
        PROFILE_ENV
    )
}

/// Read one profile's keys from an INI-style shared credentials file.
pub fn read_profile(path: &Path, profile: &str) -> Result<AwsCredentials> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_profile(&content, profile)
        .with_context(|| format!("reading credentials for profile {} from {}", profile, path.display()))
}

fn parse_profile(content: &str, profile: &str) -> Result<AwsCredentials> {
    let mut in_section = false;
    let mut found = false;
    let mut access_key_id = None;
    let mut secret_access_key = None;
    let mut session_token = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = section.trim() == profile;
            found |= in_section;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_lowercase().as_str() {
            "aws_access_key_id" => access_key_id = Some(value),
            "aws_secret_access_key" => secret_access_key = Some(value),
            "aws_session_token" => session_token = Some(value),
            _ => {}
        }
    }

    if !found {
        anyhow::bail!("invalid profile: [{}]", profile);
    }
    let access_key_id = access_key_id
        .filter(|v| !v.is_empty())
        .context("Missing 'aws_access_key_id' in profile")?;
    let secret_access_key = secret_access_key
        .filter(|v| !v.is_empty())
        .context("Missing 'aws_secret_access_key' in profile")?;

    Ok(AwsCredentials {
        access_key_id,
        secret_access_key,
        session_token: session_token.filter(|v| !v.is_empty()),
    })
}

fn credentials_file_path() -> PathBuf {
    std::env::var(CREDENTIALS_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join(".aws")
                .join("credentials")
        })
}
