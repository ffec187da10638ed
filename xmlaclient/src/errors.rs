use std::fmt;

use thiserror::Error;
use xmlasoap::{SoapEnvelope, SoapFault, SoapParseError, parse_soap_fault};

/// XML/A operation during which an error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `Discover` call, with its request type (e.g. "MDSCHEMA_CUBES")
    Discover(String),
    /// Multidimensional `Execute`
    Execute,
    /// Tabular `Execute` used for drillthrough
    ExecuteDrillthrough,
}

impl Operation {
    pub fn discover(request_type: &str) -> Self {
        Operation::Discover(request_type.to_string())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Discover(_) => "Discover",
            Operation::Execute => "Execute",
            Operation::ExecuteDrillthrough => "ExecuteDrillthrough",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Discover(request_type) => write!(f, "Discover({})", request_type),
            other => f.write_str(other.name()),
        }
    }
}

/// Failure of the HTTP round trip itself.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),
    #[error("HTTP status {status} with a non-SOAP body: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed SOAP envelope: {0}")]
    Envelope(#[from] SoapParseError),
    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum XmlaError {
    #[error("{operation} transport failure: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: TransportError,
    },
    #[error("{operation} failed: {fault}")]
    ServerFault {
        operation: Operation,
        fault: SoapFault,
    },
    #[error("{operation} protocol error: {message}")]
    Protocol {
        operation: Operation,
        message: String,
    },
    #[error("{operation} unsupported dialect: {message}")]
    UnsupportedDialect {
        operation: Operation,
        message: String,
    },
    #[error("{operation} cannot build request: {message}")]
    Request {
        operation: Operation,
        message: String,
    },
    #[error("Invalid XML/A endpoint: {0}")]
    Endpoint(String),
}

pub type Result<T> = std::result::Result<T, XmlaError>;

impl XmlaError {
    pub fn protocol(operation: &Operation, message: impl Into<String>) -> Self {
        XmlaError::Protocol {
            operation: operation.clone(),
            message: message.into(),
        }
    }

    pub fn unsupported_dialect(operation: &Operation, message: impl Into<String>) -> Self {
        XmlaError::UnsupportedDialect {
            operation: operation.clone(),
            message: message.into(),
        }
    }

    pub fn transport(operation: &Operation, source: TransportError) -> Self {
        XmlaError::Transport {
            operation: operation.clone(),
            source,
        }
    }

    /// Operation in progress when the error was raised
    pub fn operation(&self) -> Option<&Operation> {
        match self {
            XmlaError::Transport { operation, .. }
            | XmlaError::ServerFault { operation, .. }
            | XmlaError::Protocol { operation, .. }
            | XmlaError::UnsupportedDialect { operation, .. }
            | XmlaError::Request { operation, .. } => Some(operation),
            XmlaError::Endpoint(_) => None,
        }
    }

    /// SOAP fault returned by the server, if this is a server-side error
    pub fn fault(&self) -> Option<&SoapFault> {
        match self {
            XmlaError::ServerFault { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

/// Fails with [`XmlaError::ServerFault`] when the body carries a SOAP Fault.
///
/// Must run before any attempt to locate the response root.
pub fn check_fault(operation: &Operation, envelope: &SoapEnvelope) -> Result<()> {
    match parse_soap_fault(&envelope.body.content) {
        Some(fault) => Err(XmlaError::ServerFault {
            operation: operation.clone(),
            fault,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlasoap::{build_soap_fault, parse_soap_envelope};

    #[test]
    fn fault_is_surfaced_with_code_and_operation() {
        let xml = build_soap_fault("Client.BadQuery", "Syntax error near FROM", None, None).unwrap();
        let envelope = parse_soap_envelope(xml.as_bytes()).unwrap();

        let err = check_fault(&Operation::Execute, &envelope).unwrap_err();
        let fault = err.fault().unwrap();
        assert_eq!(fault.fault_code, "Client.BadQuery");
        assert_eq!(fault.detail, None);
        assert_eq!(err.operation(), Some(&Operation::Execute));
        assert!(err.to_string().starts_with("Execute failed: Soap Fault code=Client.BadQuery"));
    }

    #[test]
    fn operation_display_names_request_type() {
        assert_eq!(Operation::discover("MDSCHEMA_CUBES").to_string(), "Discover(MDSCHEMA_CUBES)");
        assert_eq!(Operation::ExecuteDrillthrough.to_string(), "ExecuteDrillthrough");
        assert_eq!(Operation::discover("X").name(), "Discover");
    }
}
