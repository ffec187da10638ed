//! # xmlaclient - Client XML for Analysis
//!
//! Client SOAP pour serveurs OLAP parlant XML/A (Microsoft Analysis
//! Services, Mondrian, SAP BW...). Il envoie des requêtes `Discover` et
//! `Execute`, absorbe les différences entre dialectes Microsoft et SAP, et
//! restitue les réponses sous forme d'événements indépendants du serveur.
//!
//! ## Vue d'ensemble
//!
//! - [`XmlaClient`] : façade (session, métadonnées, requêtes MDX, drillthrough)
//! - [`Transport`] / [`HttpTransport`] : aller-retour SOAP (ureq)
//! - [`dialect`] : détection et figement du dialecte serveur
//! - [`discover`], [`execute`], [`drillthrough`] : parcours des réponses
//! - [`Cellset`] : résultat multidimensionnel assemblé en mémoire
//!
//! ## Exemple
//!
//! ```rust,ignore
//! use xmlaclient::{Endpoint, XmlaClient};
//!
//! let client = XmlaClient::new(Endpoint::parse("http://localhost:8080/xmla")?);
//! for cube in client.discover_cubes("FoodMart")? {
//!     println!("{}", cube);
//! }
//! let cellset = client.execute_cellset(
//!     "SELECT [Measures].[Unit Sales] ON COLUMNS FROM [Sales]",
//!     "FoodMart",
//! )?;
//! ```

pub mod cellset;
pub mod client;
pub mod config_ext;
pub mod dialect;
pub mod discover;
pub mod drillthrough;
pub mod endpoint;
pub mod errors;
pub mod execute;
pub mod soap_client;

pub use cellset::{Cell, Cellset, CellsetAxis, CellsetBuilder, Position};
pub use client::XmlaClient;
pub use config_ext::XmlaConfigExt;
pub use dialect::{Dialect, DialectResolver, ResponseKind};
pub use discover::{MetadataKind, MetadataRow, RowHandler, TreeOp};
pub use drillthrough::{DrillRow, DrillthroughReceiver, DrillthroughResult};
pub use endpoint::Endpoint;
pub use errors::{Operation, TransportError, XmlaError};
pub use execute::{CellValue, CellsetHandler, MemberRef};
pub use soap_client::{HttpTransport, Transport};

use std::time::Duration;

/// Default timeout for an XML/A round trip.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound on a response body (64 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;
