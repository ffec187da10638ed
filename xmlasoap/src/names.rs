//! Namespaces et noms qualifiés utilisés par XML/A

/// Namespace de l'enveloppe SOAP 1.1
pub const SOAP_ENVELOPE_URI: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Style d'encodage SOAP déclaré sur les requêtes
pub const SOAP_ENCODING_URI: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Namespace des méthodes Discover / Execute et de leurs réponses
pub const XMLA_URI: &str = "urn:schemas-microsoft-com:xml-analysis";

/// Namespace du `root` multidimensionnel (OlapInfo, Axes, CellData)
pub const MDD_URI: &str = "urn:schemas-microsoft-com:xml-analysis:mddataset";

/// Namespace du `root` tabulaire (lignes `row`)
pub const ROWS_URI: &str = "urn:schemas-microsoft-com:xml-analysis:rowset";

/// Namespace XML Schema instance (attribut `xsi:type`)
pub const XSI_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Nom local qualifié par un namespace optionnel.
///
/// Un `namespace` à `None` désigne un élément sans namespace du tout,
/// pas un joker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementName {
    pub local: &'static str,
    pub namespace: Option<&'static str>,
}

impl ElementName {
    pub const fn qualified(local: &'static str, namespace: &'static str) -> Self {
        Self {
            local,
            namespace: Some(namespace),
        }
    }

    pub const fn unqualified(local: &'static str) -> Self {
        Self {
            local,
            namespace: None,
        }
    }

    /// Vrai si `element` porte ce nom local dans ce namespace
    pub fn matches(&self, element: &xmltree::Element) -> bool {
        element.name == self.local && element.namespace.as_deref() == self.namespace
    }
}

impl std::fmt::Display for ElementName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(self.local),
        }
    }
}
