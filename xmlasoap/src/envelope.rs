//! Structures de l'enveloppe SOAP

use xmltree::Element;

/// Enveloppe SOAP complète
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    /// En-tête SOAP optionnel (session XML/A, etc.)
    pub header: Option<SoapHeader>,

    /// Corps SOAP contenant la réponse Discover/Execute ou un Fault
    pub body: SoapBody,
}

/// En-tête SOAP
#[derive(Debug, Clone)]
pub struct SoapHeader {
    /// Contenu XML brut de l'en-tête
    pub content: Element,
}

/// Corps SOAP
#[derive(Debug, Clone)]
pub struct SoapBody {
    /// Contenu XML brut du corps
    pub content: Element,
}

impl SoapEnvelope {
    /// Crée une nouvelle enveloppe SOAP
    pub fn new(body: SoapBody) -> Self {
        Self { header: None, body }
    }

    /// Éléments enfants directs du corps, dans l'ordre du document
    pub fn body_elements(&self) -> impl Iterator<Item = &Element> {
        crate::xml::child_elements(&self.body.content)
    }
}
