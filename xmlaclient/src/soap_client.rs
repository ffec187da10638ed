use std::time::Duration;

use tracing::{debug, trace};
use ureq::Agent;
use xmlasoap::{SoapEnvelope, XmlaMethod, parse_soap_envelope};

use crate::endpoint::Endpoint;
use crate::errors::TransportError;
use crate::{DEFAULT_HTTP_TIMEOUT, DEFAULT_MAX_RESPONSE_BYTES};

/// Aller-retour SOAP vers un serveur XML/A.
///
/// Une implémentation renvoie l'enveloppe complète de la réponse, Fault
/// compris : la détection des Faults appartient au client.
pub trait Transport {
    fn send(
        &self,
        endpoint: &Endpoint,
        method: XmlaMethod,
        body_xml: &str,
    ) -> Result<SoapEnvelope, TransportError>;
}

/// Transport HTTP basé sur ureq
#[derive(Debug, Clone)]
pub struct HttpTransport {
    timeout: Option<Duration>,
    max_response_bytes: u64,
    log_soap_messages: bool,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_HTTP_TIMEOUT),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            log_soap_messages: false,
        }
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` disables the global timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, limit: u64) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Trace raw response bodies
    pub fn with_soap_logging(mut self, enabled: bool) -> Self {
        self.log_soap_messages = enabled;
        self
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        endpoint: &Endpoint,
        method: XmlaMethod,
        body_xml: &str,
    ) -> Result<SoapEnvelope, TransportError> {
        // XML/A servers answer faults with HTTP 500: the body must still be read.
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(self.timeout)
            .build();

        let agent: Agent = config.into();

        let soap_action = method.soap_action();
        let mut request = agent
            .post(endpoint.url().as_str())
            .header("Content-Type", r#"text/xml; charset="utf-8""#)
            .header("SOAPAction", &soap_action);
        if let Some(authorization) = endpoint.basic_auth() {
            request = request.header("Authorization", &authorization);
        }

        let mut response = request.send(body_xml)?;
        let status = response.status();

        let raw_body = response
            .body_mut()
            .with_config()
            .limit(self.max_response_bytes)
            .read_to_string()?;

        debug!(
            url = %endpoint.url(),
            method = method.as_str(),
            status = status.as_u16(),
            bytes = raw_body.len(),
            "XML/A response received"
        );
        if self.log_soap_messages {
            trace!(body = %raw_body, "XML/A response body");
        }

        match parse_soap_envelope(raw_body.as_bytes()) {
            Ok(envelope) => Ok(envelope),
            Err(err) if status.is_success() => Err(TransportError::Envelope(err)),
            Err(_) => Err(TransportError::Status {
                status: status.as_u16(),
                body: raw_body,
            }),
        }
    }
}
