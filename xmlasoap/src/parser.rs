//! Parser d'enveloppes SOAP de réponse

use super::{SoapBody, SoapEnvelope, SoapHeader};
use crate::xml::child_elements;
use tracing::debug;
use xml::reader::{EventReader, XmlEvent};
use xmltree::{Element, ParseError, XMLNode};

/// Erreur de parsing SOAP
#[derive(Debug, thiserror::Error)]
pub enum SoapParseError {
    #[error("XML parse error: {0}")]
    XmlError(#[from] xmltree::ParseError),

    #[error("Missing SOAP Envelope")]
    MissingEnvelope,

    #[error("Missing SOAP Body")]
    MissingBody,
}

/// Parse un document XML en arbre `xmltree`.
///
/// Contrairement à `Element::parse`, les attributs préfixés gardent leur
/// clé `prefix:local`, ce qui permet de les résoudre contre les namespaces
/// de l'élément (voir [`crate::xml::attribute_ns`]).
pub fn parse_element(xml: &[u8]) -> Result<Element, ParseError> {
    let mut reader = EventReader::new(xml);
    let mut open: Vec<Element> = Vec::new();

    loop {
        match reader.next().map_err(ParseError::MalformedXml)? {
            XmlEvent::StartElement {
                name,
                attributes,
                namespace,
            } => {
                let mut element = Element::new(&name.local_name);
                element.prefix = name.prefix;
                element.namespace = name.namespace;
                element.namespaces = (!namespace.is_essentially_empty()).then_some(namespace);
                for attr in attributes {
                    let key = match attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local_name),
                        None => attr.name.local_name,
                    };
                    element.attributes.insert(key, attr.value);
                }
                open.push(element);
            }
            XmlEvent::EndElement { .. } => {
                let closed = open.pop().ok_or(ParseError::CannotParse)?;
                match open.last_mut() {
                    Some(parent) => parent.children.push(XMLNode::Element(closed)),
                    None => return Ok(closed),
                }
            }
            XmlEvent::Characters(text) => {
                if let Some(current) = open.last_mut() {
                    current.children.push(XMLNode::Text(text));
                }
            }
            XmlEvent::CData(text) => {
                if let Some(current) = open.last_mut() {
                    current.children.push(XMLNode::CData(text));
                }
            }
            XmlEvent::EndDocument => return Err(ParseError::CannotParse),
            _ => {}
        }
    }
}

/// Parse une enveloppe SOAP complète
pub fn parse_soap_envelope(xml: &[u8]) -> Result<SoapEnvelope, SoapParseError> {
    let root = parse_element(xml)?;

    // Vérifier que c'est bien une Envelope
    if root.name != "Envelope" {
        debug!(root = %root.name, "XML document is not a SOAP envelope");
        return Err(SoapParseError::MissingEnvelope);
    }

    // Extraire Header (optionnel)
    let header = child_elements(&root)
        .find(|e| e.name == "Header")
        .map(|e| SoapHeader { content: e.clone() });

    // Extraire Body (obligatoire)
    let body_elem = child_elements(&root)
        .find(|e| e.name == "Body")
        .ok_or(SoapParseError::MissingBody)?;

    let body = SoapBody {
        content: body_elem.clone(),
    };

    Ok(SoapEnvelope { header, body })
}
