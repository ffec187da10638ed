//! Dialectes XML/A (Microsoft / SAP) et localisation de la racine des réponses
//!
//! Les deux familles de serveurs ne qualifient pas leurs éléments de réponse
//! de la même façon. Le dialecte est déterminé une seule fois, soit par la
//! chaîne de source de données, soit par la première réponse Discover, puis
//! ne change plus pendant toute la vie du client.

use std::sync::OnceLock;

use tracing::debug;
use xmlasoap::names::{ElementName, MDD_URI, ROWS_URI, XMLA_URI};
use xmlasoap::xml::find_child;
use xmltree::Element;

use crate::errors::{Operation, Result, XmlaError};

/// Préfixe utilisé par les serveurs Microsoft sur `DiscoverResponse`
pub const MICROSOFT_PREFIX: &str = "m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Unknown,
    Microsoft,
    Sap,
}

impl Dialect {
    /// Dialecte déduit d'une chaîne de source de données.
    ///
    /// `Provider=SAP...` (casse indifférente) désigne SAP, tout le reste Microsoft.
    pub fn from_data_source(data_source: &str) -> Self {
        let head = data_source.trim_start().as_bytes();
        let marker = b"PROVIDER=SAP";
        if head.len() >= marker.len() && head[..marker.len()].eq_ignore_ascii_case(marker) {
            Dialect::Sap
        } else {
            Dialect::Microsoft
        }
    }

    /// Table de noms du dialecte (`None` tant qu'il est inconnu)
    pub fn names(&self) -> Option<&'static DialectNames> {
        match self {
            Dialect::Microsoft => Some(&MICROSOFT_NAMES),
            Dialect::Sap => Some(&SAP_NAMES),
            Dialect::Unknown => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Dialect::Unknown => "unknown",
            Dialect::Microsoft => "Microsoft",
            Dialect::Sap => "SAP",
        })
    }
}

/// Noms qualifiés des éléments de réponse pour un dialecte donné
#[derive(Debug)]
pub struct DialectNames {
    pub discover_response: ElementName,
    pub execute_response: ElementName,
    pub return_element: ElementName,
    /// Second essai si `return_element` est absent
    pub return_fallback: Option<ElementName>,
    pub rowset_root: ElementName,
    pub mddataset_root: ElementName,
}

const MICROSOFT_NAMES: DialectNames = DialectNames {
    discover_response: ElementName::qualified("DiscoverResponse", XMLA_URI),
    execute_response: ElementName::qualified("ExecuteResponse", XMLA_URI),
    return_element: ElementName::qualified("return", XMLA_URI),
    return_fallback: Some(ElementName::unqualified("return")),
    rowset_root: ElementName::qualified("root", ROWS_URI),
    mddataset_root: ElementName::qualified("root", MDD_URI),
};

const SAP_NAMES: DialectNames = DialectNames {
    discover_response: ElementName::qualified("DiscoverResponse", XMLA_URI),
    execute_response: ElementName::qualified("ExecuteResponse", XMLA_URI),
    return_element: ElementName::qualified("return", XMLA_URI),
    return_fallback: None,
    rowset_root: ElementName::qualified("root", ROWS_URI),
    mddataset_root: ElementName::qualified("root", MDD_URI),
};

/// Forme de réponse attendue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// `DiscoverResponse` / rowset
    Discover,
    /// `ExecuteResponse` / mddataset
    Multidimensional,
    /// `ExecuteResponse` / rowset (drillthrough)
    Tabular,
}

impl ResponseKind {
    fn response_name(&self, names: &'static DialectNames) -> &'static ElementName {
        match self {
            ResponseKind::Discover => &names.discover_response,
            _ => &names.execute_response,
        }
    }

    fn root_name(&self, names: &'static DialectNames) -> &'static ElementName {
        match self {
            ResponseKind::Multidimensional => &names.mddataset_root,
            _ => &names.rowset_root,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ResponseKind::Discover => "Discover",
            ResponseKind::Multidimensional => "Execute",
            ResponseKind::Tabular => "Drillthrough",
        }
    }
}

/// Dialecte annoncé par un corps de réponse Discover.
///
/// `None` si le corps ne contient pas de `DiscoverResponse`.
pub fn detect_dialect(body: &Element) -> Option<Dialect> {
    let response = find_child(body, &MICROSOFT_NAMES.discover_response)?;
    if response.prefix.as_deref() == Some(MICROSOFT_PREFIX) {
        Some(Dialect::Microsoft)
    } else {
        Some(Dialect::Sap)
    }
}

/// Dialecte résolu au plus une fois
#[derive(Debug, Default)]
pub struct DialectResolver {
    dialect: OnceLock<Dialect>,
}

impl DialectResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Résolveur déjà figé sur `dialect`
    pub fn fixed(dialect: Dialect) -> Self {
        let resolver = Self::new();
        resolver.fix(dialect);
        resolver
    }

    pub fn current(&self) -> Dialect {
        self.dialect.get().copied().unwrap_or_default()
    }

    /// Fige le dialecte s'il ne l'est pas encore et renvoie la valeur effective
    pub fn fix(&self, dialect: Dialect) -> Dialect {
        if dialect == Dialect::Unknown {
            return self.current();
        }
        *self.dialect.get_or_init(|| {
            debug!(%dialect, "XML/A dialect resolved");
            dialect
        })
    }

    /// Résout le dialecte depuis une réponse Discover si nécessaire
    pub fn resolve(&self, operation: &Operation, body: &Element) -> Result<Dialect> {
        if let Some(dialect) = self.dialect.get() {
            return Ok(*dialect);
        }
        match detect_dialect(body) {
            Some(dialect) => Ok(self.fix(dialect)),
            None => Err(XmlaError::protocol(
                operation,
                "cannot determine the dialect: response has no DiscoverResponse element",
            )),
        }
    }
}

/// Localise l'élément `root` d'une réponse en suivant la table du dialecte.
pub fn locate_root<'a>(
    operation: &Operation,
    body: &'a Element,
    dialect: Dialect,
    kind: ResponseKind,
) -> Result<&'a Element> {
    let names = dialect.names().ok_or_else(|| {
        XmlaError::unsupported_dialect(
            operation,
            format!("{} result received while the dialect is unknown", kind.label()),
        )
    })?;

    let response_name = kind.response_name(names);
    let response = find_child(body, response_name).ok_or_else(|| {
        XmlaError::protocol(
            operation,
            format!("{} result has no {} element", kind.label(), response_name.local),
        )
    })?;

    let ret = find_child(response, &names.return_element)
        .or_else(|| {
            names
                .return_fallback
                .as_ref()
                .and_then(|fallback| find_child(response, fallback))
        })
        .ok_or_else(|| {
            XmlaError::protocol(
                operation,
                format!("{} result has no return element", kind.label()),
            )
        })?;

    find_child(ret, kind.root_name(names)).ok_or_else(|| {
        XmlaError::protocol(
            operation,
            format!("{} result has no root element", kind.label()),
        )
    })
}
