//! # xmlasoap - couche SOAP pour XML for Analysis
//!
//! Ce crate implémente la partie "fil" du protocole XML/A : construction des
//! requêtes `Discover` / `Execute`, parsing des enveloppes de réponse et
//! extraction des SOAP Faults.
//!
//! ## Fonctionnalités
//!
//! - ✅ Construction d'enveloppes `Discover` (RequestType, Restrictions, Properties)
//! - ✅ Construction d'enveloppes `Execute` (Command/Statement, Properties)
//! - ✅ Parsing d'enveloppes SOAP 1.1
//! - ✅ Détection et décodage des SOAP Faults
//! - ✅ Constantes de namespaces XML/A (rowset, mddataset, xsi)
//!
//! ## Architecture
//!
//! - [`SoapEnvelope`] : Enveloppe SOAP complète
//! - [`XmlaMethod`] : Méthode XML/A invoquée (Discover ou Execute)
//! - [`SoapFault`] : Erreur SOAP renvoyée par le serveur
//! - [`xml`] : helpers de navigation dans l'arbre `xmltree`
//!
//! ## Example
//!
//! ```ignore
//! use xmlasoap::{build_discover_request, parse_soap_envelope, parse_soap_fault};
//!
//! let request = build_discover_request(
//!     "DBSCHEMA_CATALOGS",
//!     Some(&[]),
//!     &[("DataSourceInfo", "Provider=Mondrian;DataSource=FoodMart"), ("Content", "SchemaData")],
//! )
//! .unwrap();
//! assert!(request.contains("<RequestType>DBSCHEMA_CATALOGS</RequestType>"));
//!
//! let envelope = parse_soap_envelope(response_bytes).unwrap();
//! if let Some(fault) = parse_soap_fault(&envelope.body.content) {
//!     eprintln!("server fault {}: {}", fault.fault_code, fault.fault_string);
//! }
//! ```

mod builder;
mod envelope;
mod fault;
mod parser;

pub mod names;
pub mod xml;

pub use builder::{XmlaMethod, build_discover_request, build_execute_request};
pub use envelope::{SoapBody, SoapEnvelope, SoapHeader};
pub use fault::{SoapFault, build_soap_fault, parse_soap_fault};
pub use parser::{SoapParseError, parse_element, parse_soap_envelope};
