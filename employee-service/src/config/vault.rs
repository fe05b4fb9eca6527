//! Optional secret loading from HashiCorp Vault (KV v2).
//!
//! Enabled by `VAULT_ADDR`. Authenticates with `VAULT_TOKEN` when set,
//! otherwise through the Kubernetes auth method with the pod's service
//! account token. Values read here take precedence over the process
//! environment; any failure falls back to the environment alone.

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MOUNT: &str = "kindergarten";
const DEFAULT_SECRET_PATH: &str = "config";
const DEFAULT_KUBERNETES_ROLE: &str = "kindergarten-role";
const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Keys of the Vault secret and the environment variable each one replaces.
const SECRET_KEYS: &[(&str, &str)] = &[
    ("mongodb-uri", "MONGODB_URI"),
    ("database-name", "DATABASE_NAME"),
    ("elastic-apm-server-url", "APM_SERVER_URL"),
    ("elastic-apm-secret-token", "APM_SECRET_TOKEN"),
];

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read service account token: {0}")]
    ServiceAccountToken(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub enum VaultAuth {
    Token(Secret<String>),
    Kubernetes { role: String, jwt_path: String },
}

#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub address: String,
    pub auth: VaultAuth,
    pub mount: String,
    pub path: String,
}

impl VaultSettings {
    /// `None` unless `VAULT_ADDR` is set.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| {
            non_empty(key).unwrap_or_else(|| default.to_string())
        };

        let address = non_empty("VAULT_ADDR")?;
        let auth = match non_empty("VAULT_TOKEN") {
            Some(token) => VaultAuth::Token(Secret::new(token)),
            None => VaultAuth::Kubernetes {
                role: or_default("VAULT_ROLE", DEFAULT_KUBERNETES_ROLE),
                jwt_path: or_default("VAULT_SA_TOKEN_PATH", SERVICE_ACCOUNT_TOKEN_PATH),
            },
        };

        Some(Self {
            address: address.trim_end_matches('/').to_string(),
            auth,
            mount: or_default("VAULT_MOUNT", DEFAULT_MOUNT),
            path: or_default("VAULT_SECRET_PATH", DEFAULT_SECRET_PATH),
        })
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct KvResponse {
    data: KvData,
}

#[derive(Deserialize)]
struct KvData {
    data: HashMap<String, Value>,
}

/// Read the configured secret and return it keyed by environment variable
/// name. Keys that are absent or not strings are skipped.
pub async fn fetch_secrets(settings: &VaultSettings) -> Result<HashMap<String, String>, VaultError> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

    let token = match &settings.auth {
        VaultAuth::Token(token) => token.clone(),
        VaultAuth::Kubernetes { role, jwt_path } => {
            let jwt = tokio::fs::read_to_string(jwt_path).await?;
            let login: LoginResponse = client
                .post(format!("{}/v1/auth/kubernetes/login", settings.address))
                .json(&serde_json::json!({ "role": role, "jwt": jwt.trim() }))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Secret::new(login.auth.client_token)
        }
    };

    let secret: KvResponse = client
        .get(format!(
            "{}/v1/{}/data/{}",
            settings.address, settings.mount, settings.path
        ))
        .header("X-Vault-Token", token.expose_secret())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(map_secret_keys(&secret.data.data))
}

fn map_secret_keys(data: &HashMap<String, Value>) -> HashMap<String, String> {
    SECRET_KEYS
        .iter()
        .filter_map(|(key, var)| {
            data.get(*key)
                .and_then(Value::as_str)
                .map(|value| (var.to_string(), value.to_string()))
        })
        .collect()
}

/// Values to layer over the environment. Empty when Vault is not configured
/// or cannot be read.
///
/// Runs before the tracing subscriber exists, so outcomes go to stderr.
pub async fn load_overrides<F>(lookup: F) -> HashMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(settings) = VaultSettings::from_lookup(lookup) else {
        return HashMap::new();
    };

    match fetch_secrets(&settings).await {
        Ok(secrets) => {
            eprintln!(
                "Loaded {} secret(s) from Vault at {}",
                secrets.len(),
                settings.address
            );
            secrets
        }
        Err(e) => {
            eprintln!(
                "Failed to load secrets from Vault at {}, using environment variables: {}",
                settings.address, e
            );
            HashMap::new()
        }
    }
}
