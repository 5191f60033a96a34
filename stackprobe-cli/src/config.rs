use anyhow::{Context, Result};
use stackprobe_orchestrations::clients::identity::DEFAULT_IDENTITY_URL;
use stackprobe_orchestrations::clients::{
    CachedCredentials, CredentialProvider, IdentityClient, StaticToken,
};
use stackprobe_orchestrations::names::etcd;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Credentials {
    /// Pre-issued token
    Token(String),
    /// Username + API key exchanged with the identity service
    ApiKey {
        identity_url: String,
        username: String,
        api_key: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub heat_url: String,
    pub key_name: String,
    pub credentials: Credentials,
    pub stack_prefix: String,
    pub etcd_port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let credentials = match var("STACKPROBE_AUTH_TOKEN") {
            Some(token) => Credentials::Token(token),
            None => Credentials::ApiKey {
                identity_url: var("STACKPROBE_IDENTITY_URL")
                    .unwrap_or_else(|| DEFAULT_IDENTITY_URL.to_string()),
                username: var("STACKPROBE_USERNAME")
                    .context("STACKPROBE_USERNAME must be set when STACKPROBE_AUTH_TOKEN is not")?,
                api_key: var("STACKPROBE_API_KEY")
                    .context("STACKPROBE_API_KEY must be set when STACKPROBE_AUTH_TOKEN is not")?,
            },
        };

        Ok(Self {
            heat_url: var("STACKPROBE_HEAT_URL").context("STACKPROBE_HEAT_URL must be set")?,
            key_name: var("STACKPROBE_KEYPAIR").context("STACKPROBE_KEYPAIR must be set")?,
            credentials,
            stack_prefix: var("STACKPROBE_STACK_PREFIX")
                .unwrap_or_else(|| "stackprobe".to_string()),
            etcd_port: var("STACKPROBE_ETCD_PORT")
                .unwrap_or_else(|| etcd::CLIENT_PORT.to_string())
                .parse()
                .context("STACKPROBE_ETCD_PORT must be a valid port number")?,
        })
    }

    /// One provider per process, shared by every client
    pub fn credential_provider(&self) -> Arc<dyn CredentialProvider> {
        match &self.credentials {
            Credentials::Token(token) => Arc::new(StaticToken::new(token.clone())),
            Credentials::ApiKey { identity_url, username, api_key } => {
                let identity =
                    IdentityClient::new(identity_url.clone(), username.clone(), api_key.clone());
                Arc::new(CachedCredentials::new(identity))
            }
        }
    }
}
