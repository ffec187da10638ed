//! Extension pour lire la configuration du client XML/A depuis xmlaconfig
//!
//! Ce module fournit le trait `XmlaConfigExt` qui ajoute à
//! `xmlaconfig::Config` les accesseurs de la section `xmla`, ainsi que
//! [`XmlaClient::from_config`].

use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_yaml::Value;
use xmlaconfig::Config;
use xmlaconfig::encryption;

use crate::client::XmlaClient;
use crate::endpoint::Endpoint;
use crate::soap_client::HttpTransport;
use crate::{DEFAULT_HTTP_TIMEOUT, DEFAULT_MAX_RESPONSE_BYTES};

/// Trait d'extension pour la section `xmla` de la configuration
///
/// # Exemple
///
/// ```rust,ignore
/// use xmlaconfig::get_config;
/// use xmlaclient::XmlaConfigExt;
///
/// let config = get_config();
/// let url = config.get_xmla_url()?;
/// ```
pub trait XmlaConfigExt {
    /// URL du serveur XML/A
    ///
    /// # Errors
    ///
    /// Retourne une erreur si l'URL n'est pas configurée
    fn get_xmla_url(&self) -> Result<String>;

    fn set_xmla_url(&self, url: &str) -> Result<()>;

    fn get_xmla_user(&self) -> Option<String>;

    /// Mot de passe, déchiffré s'il est stocké sous la forme `encrypted:...`
    fn get_xmla_password(&self) -> Result<Option<String>>;

    /// Enregistre le mot de passe, chiffré si `encrypt` est vrai
    fn set_xmla_password(&self, password: &str, encrypt: bool) -> Result<()>;

    /// Source de données imposée (sinon découverte)
    fn get_xmla_data_source(&self) -> Option<String>;

    /// Catalogue par défaut
    fn get_xmla_catalog(&self) -> Option<String>;

    fn get_xmla_timeout(&self) -> Duration;

    fn get_xmla_max_response_bytes(&self) -> u64;
}

impl XmlaConfigExt for Config {
    fn get_xmla_url(&self) -> Result<String> {
        self.get_string(&["xmla", "url"])
            .ok_or_else(|| anyhow!("XML/A url not configured"))
    }

    fn set_xmla_url(&self, url: &str) -> Result<()> {
        self.set_value(&["xmla", "url"], Value::String(url.to_string()))
    }

    fn get_xmla_user(&self) -> Option<String> {
        self.get_string(&["xmla", "user"])
    }

    fn get_xmla_password(&self) -> Result<Option<String>> {
        match self.get_string(&["xmla", "password"]) {
            Some(stored) => encryption::get_password(&stored).map(Some),
            None => Ok(None),
        }
    }

    fn set_xmla_password(&self, password: &str, encrypt: bool) -> Result<()> {
        let stored = if encrypt {
            encryption::encrypt_password(password)?
        } else {
            password.to_string()
        };
        self.set_value(&["xmla", "password"], Value::String(stored))
    }

    fn get_xmla_data_source(&self) -> Option<String> {
        self.get_string(&["xmla", "data_source"])
    }

    fn get_xmla_catalog(&self) -> Option<String> {
        self.get_string(&["xmla", "catalog"])
    }

    fn get_xmla_timeout(&self) -> Duration {
        self.get_u64(&["xmla", "timeout_secs"])
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT)
    }

    fn get_xmla_max_response_bytes(&self) -> u64 {
        self.get_u64(&["xmla", "max_response_bytes"])
            .unwrap_or(DEFAULT_MAX_RESPONSE_BYTES)
    }
}

impl XmlaClient<HttpTransport> {
    /// Client HTTP entièrement paramétré par la configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.get_xmla_url()?;
        let user = config.get_xmla_user();
        let password = config.get_xmla_password()?;
        let endpoint = Endpoint::new(&url, user.as_deref(), password.as_deref())?;

        let log_soap_messages = config.get_log_soap_messages()?;
        let transport = HttpTransport::new()
            .with_timeout(Some(config.get_xmla_timeout()))
            .with_max_response_bytes(config.get_xmla_max_response_bytes())
            .with_soap_logging(log_soap_messages);

        let client =
            XmlaClient::with_transport(endpoint, transport).with_soap_logging(log_soap_messages);
        Ok(match config.get_xmla_data_source() {
            Some(data_source) => client.with_data_source(data_source),
            None => client,
        })
    }
}
