#[cfg(test)]
mod tests;

use anyhow::Result;
use dialoguer::{Input, Password};
use std::fmt;
use thiserror::Error;

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";
pub const PINECONE_REGION_VAR: &str = "PINECONE_REGION";
/// Older name for the region variable, still honoured
pub const PINECONE_ENVIRONMENT_VAR: &str = "PINECONE_ENVIRONMENT";
pub const SYSTEM_PROMPT_VAR: &str = "SHOPPER_SYSTEM_PROMPT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("missing credential: {0}")]
    Missing(&'static str),
}

/// Per-session secrets. Held in memory only and never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    openai_api_key: String,
    pinecone_api_key: String,
    pinecone_region: String,
    system_prompt: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("pinecone_api_key", &"<redacted>")
            .field("pinecone_region", &self.pinecone_region)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

impl Credentials {
    #[inline]
    pub fn new(
        openai_api_key: impl Into<String>,
        pinecone_api_key: impl Into<String>,
        pinecone_region: impl Into<String>,
    ) -> Self {
        Self {
            openai_api_key: openai_api_key.into(),
            pinecone_api_key: pinecone_api_key.into(),
            pinecone_region: pinecone_region.into(),
            system_prompt: None,
        }
    }

    #[inline]
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt.filter(|p| !p.trim().is_empty());
        self
    }

    #[inline]
    pub fn openai_api_key(&self) -> &str {
        &self.openai_api_key
    }

    #[inline]
    pub fn pinecone_api_key(&self) -> &str {
        &self.pinecone_api_key
    }

    #[inline]
    pub fn pinecone_region(&self) -> &str {
        &self.pinecone_region
    }

    /// The user's prompt override, or an empty string
    #[inline]
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or_default()
    }

    /// Read every credential from the process environment
    #[inline]
    pub fn from_env() -> Result<Self, CredentialsError> {
        PartialCredentials::from_env().complete()
    }
}

/// Credentials gathered so far; missing values are filled in later
#[derive(Default, Clone)]
pub struct PartialCredentials {
    pub openai_api_key: Option<String>,
    pub pinecone_api_key: Option<String>,
    pub pinecone_region: Option<String>,
    pub system_prompt: Option<String>,
}

impl fmt::Debug for PartialCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialCredentials")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "pinecone_api_key",
                &self.pinecone_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("pinecone_region", &self.pinecone_region)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

impl PartialCredentials {
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as missing.
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            openai_api_key: get(OPENAI_API_KEY_VAR),
            pinecone_api_key: get(PINECONE_API_KEY_VAR),
            pinecone_region: get(PINECONE_REGION_VAR).or_else(|| get(PINECONE_ENVIRONMENT_VAR)),
            system_prompt: get(SYSTEM_PROMPT_VAR),
        }
    }

    #[inline]
    pub fn complete(self) -> Result<Credentials, CredentialsError> {
        let openai_api_key = self
            .openai_api_key
            .ok_or(CredentialsError::Missing(OPENAI_API_KEY_VAR))?;
        let pinecone_api_key = self
            .pinecone_api_key
            .ok_or(CredentialsError::Missing(PINECONE_API_KEY_VAR))?;
        let pinecone_region = self
            .pinecone_region
            .ok_or(CredentialsError::Missing(PINECONE_REGION_VAR))?;

        Ok(Credentials::new(openai_api_key, pinecone_api_key, pinecone_region)
            .with_system_prompt(self.system_prompt))
    }

    /// Prompt on the terminal for whatever the environment did not supply
    #[inline]
    pub fn complete_interactively(mut self) -> Result<Credentials> {
        if self.openai_api_key.is_none() {
            self.openai_api_key = Some(Password::new().with_prompt("OpenAI API key").interact()?);
        }

        if self.pinecone_api_key.is_none() {
            self.pinecone_api_key =
                Some(Password::new().with_prompt("Pinecone API key").interact()?);
        }

        if self.pinecone_region.is_none() {
            let region: String = Input::new()
                .with_prompt("Pinecone region")
                .default("us-east-1".to_string())
                .interact_text()?;
            self.pinecone_region = Some(region);
        }

        if self.system_prompt.is_none() {
            let prompt: String = Input::new()
                .with_prompt("System prompt (optional)")
                .allow_empty(true)
                .interact_text()?;
            self.system_prompt = Some(prompt);
        }

        Ok(self.complete()?)
    }
}
