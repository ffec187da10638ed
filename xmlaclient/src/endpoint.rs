//! XML/A endpoint: target URL plus optional credentials.

use base64::Engine;
use url::Url;

use crate::errors::{Result, XmlaError};

/// Target of the SOAP calls.
///
/// Credentials may be embedded in the URL (`http://user:pw@host/xmla`) or
/// given separately; explicit ones win. The stored URL never carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    user: Option<String>,
    password: Option<String>,
}

impl Endpoint {
    pub fn new(url: &str, user: Option<&str>, password: Option<&str>) -> Result<Self> {
        let mut url =
            Url::parse(url).map_err(|e| XmlaError::Endpoint(format!("{}: {}", url, e)))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(XmlaError::Endpoint(format!(
                "{}: expected an http(s) URL with a host",
                url
            )));
        }

        let embedded_user = decode_userinfo(url.username());
        let embedded_password = url.password().and_then(decode_userinfo);
        // cannot fail on http(s) URLs with a host
        let _ = url.set_username("");
        let _ = url.set_password(None);

        // un couple explicite remplace entièrement celui de l'URL
        let explicit_password = password.filter(|p| !p.is_empty()).map(str::to_string);
        let (user, password) = match user.filter(|u| !u.is_empty()) {
            Some(user) => (Some(user.to_string()), explicit_password),
            None => match embedded_user {
                Some(user) => (Some(user), explicit_password.or(embedded_password)),
                None => (None, None),
            },
        };

        Ok(Self {
            url,
            user,
            password,
        })
    }

    /// Parses a URL, lifting any embedded `user:password@` into credentials
    pub fn parse(url: &str) -> Result<Self> {
        Self::new(url, None, None)
    }

    /// URL without credentials
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// URL with the credentials embedded as `user[:password]@`
    pub fn url_with_credentials(&self) -> Url {
        let mut url = self.url.clone();
        if let Some(user) = &self.user {
            let _ = url.set_username(user);
            let _ = url.set_password(self.password.as_deref());
        }
        url
    }

    /// `Authorization` header value for the embedded credentials
    pub fn basic_auth(&self) -> Option<String> {
        let user = self.user.as_deref()?;
        let token = format!("{}:{}", user, self.password.as_deref().unwrap_or(""));
        Some(format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(token)
        ))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.user {
            Some(user) => write!(f, "{} (user {})", self.url, user),
            None => write!(f, "{}", self.url),
        }
    }
}

fn decode_userinfo(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(
        urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string()),
    )
}
