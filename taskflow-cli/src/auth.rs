//! Model credentials kept in `auth.json` under the taskflow home.
//!
//! The file holds API secrets, so it is created owner-only (0600) on Unix and
//! pasted values are read without echo when stdin is a terminal.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use crate::state::ensure_taskflow_home;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

/// Which credential a paste command fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    OpenAiApiKey,
    AnthropicToken,
}

impl Credential {
    fn label(self) -> &'static str {
        match self {
            Credential::OpenAiApiKey => "OpenAI API key",
            Credential::AnthropicToken => "Anthropic token",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Credential::OpenAiApiKey => "sk-",
            Credential::AnthropicToken => "sk-ant-",
        }
    }

    /// Reject values that clearly belong to another provider or are truncated.
    pub fn check(self, value: &str) -> Result<()> {
        if !value.starts_with(self.prefix()) {
            bail!(
                "that doesn't look like an {} (expected prefix {})",
                self.label(),
                self.prefix()
            );
        }
        Ok(())
    }

    fn store(self, auth: &mut AuthState, value: String) {
        match self {
            Credential::OpenAiApiKey => auth.openai_api_key = Some(value),
            Credential::AnthropicToken => auth.anthropic_token = Some(value),
        }
    }
}

pub fn auth_path() -> Result<PathBuf> {
    Ok(ensure_taskflow_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    load_auth_from(&auth_path()?)
}

pub fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

/// Write credentials owner-only. An existing file with looser permissions is
/// tightened before the new contents go in.
pub fn save_auth_to(p: &Path, auth: &AuthState) -> Result<()> {
    let s = serde_json::to_string_pretty(auth).context("serialize credentials")?;

    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut f = opts.open(p).with_context(|| format!("open {}", p.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        f.set_permissions(fs::Permissions::from_mode(0o600))
            .with_context(|| format!("chmod {}", p.display()))?;
    }

    f.write_all(s.as_bytes())
        .with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

fn read_secret(prompt: &str) -> Result<String> {
    let value = if io::stdin().is_terminal() {
        rpassword::prompt_password(format!("{prompt}: ")).context("read secret")?
    } else {
        // piped: `pass show openai | taskflow auth paste-openai-api-key`
        let mut s = String::new();
        io::stdin().read_to_string(&mut s).context("read secret from stdin")?;
        s
    };
    Ok(value.trim().to_string())
}

/// Prompt for a credential and merge it into `auth.json`.
pub fn paste(credential: Credential) -> Result<()> {
    let value = read_secret(&format!(
        "Paste {} (starts with {}, input hidden)",
        credential.label(),
        credential.prefix()
    ))?;
    credential.check(&value)?;

    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    credential.store(&mut auth, value);
    save_auth_to(&p, &auth)?;

    println!("Saved {} to {}", credential.label(), p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_no_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let auth = load_auth_from(&dir.path().join("auth.json")).unwrap();
        assert_eq!(auth, AuthState::default());
    }

    #[test]
    fn save_then_load_keeps_both_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("auth.json");

        let mut auth = AuthState::default();
        Credential::OpenAiApiKey.store(&mut auth, "sk-one".to_string());
        save_auth_to(&p, &auth).unwrap();

        let mut auth = load_auth_from(&p).unwrap();
        Credential::AnthropicToken.store(&mut auth, "sk-ant-two".to_string());
        save_auth_to(&p, &auth).unwrap();

        let back = load_auth_from(&p).unwrap();
        assert_eq!(back.openai_api_key.as_deref(), Some("sk-one"));
        assert_eq!(back.anthropic_token.as_deref(), Some("sk-ant-two"));
    }

    #[cfg(unix)]
    #[test]
    fn credentials_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("auth.json");
        fs::write(&p, "{}").unwrap();
        fs::set_permissions(&p, fs::Permissions::from_mode(0o644)).unwrap();

        save_auth_to(&p, &AuthState::default()).unwrap();

        let mode = fs::metadata(&p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn check_rejects_the_wrong_provider() {
        assert!(Credential::OpenAiApiKey.check("sk-proj-abc").is_ok());
        assert!(Credential::AnthropicToken.check("sk-proj-abc").is_err());
        assert!(Credential::OpenAiApiKey.check("hunter2").is_err());
    }
}
