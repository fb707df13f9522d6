//! Resolver settings

use serde::{Deserialize, Serialize};

use crate::volume::DEFAULT_VOLUME_MOUNT_VARIABLE;

/// Settings shared by the resolver passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverSettings {
    /// Provider key holding the volume mount root
    pub volume_mount_variable: String,

    /// Key vault client settings
    pub keyvault: KeyVaultSettings,

    /// Fail if any placeholder survives every pass
    pub require_fully_resolved: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            volume_mount_variable: DEFAULT_VOLUME_MOUNT_VARIABLE.to_string(),
            keyvault: KeyVaultSettings::default(),
            require_fully_resolved: false,
        }
    }
}

/// Where key vault client credentials come from and how the REST API is called
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyVaultSettings {
    /// Variable naming another variable that holds the client id
    pub client_id_key_variable: String,

    /// Variable naming another variable that holds the client secret
    pub client_secret_key_variable: String,

    /// Variables checked in order for the client id
    pub client_id_variables: Vec<String>,

    /// Variables checked in order for the client secret
    pub client_secret_variables: Vec<String>,

    /// Key vault REST API version
    pub api_version: String,
}

impl Default for KeyVaultSettings {
    fn default() -> Self {
        Self {
            client_id_key_variable: "KEYVAULT_CLIENT_ID_KEY".to_string(),
            client_secret_key_variable: "KEYVAULT_CLIENT_SECRET_KEY".to_string(),
            client_id_variables: vec!["KEYVAULT_CLIENT_ID".to_string(), "AAD_CLIENT_ID".to_string()],
            client_secret_variables: vec![
                "KEYVAULT_CLIENT_SECRET".to_string(),
                "AAD_CLIENT_SECRET".to_string(),
            ],
            api_version: "7.4".to_string(),
        }
    }
}
