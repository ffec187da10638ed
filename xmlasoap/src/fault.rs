//! SOAP Faults renvoyés par les serveurs XML/A

use crate::names::SOAP_ENVELOPE_URI;
use crate::xml::{child_elements, element_text, find_child_local};
use xmltree::{Element, XMLNode};

/// Erreur SOAP (Fault)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// Code d'erreur (ex: "SOAP-ENV:Client", "XMLAnalysisError.0xc10a0009")
    pub fault_code: String,

    /// Description de l'erreur
    pub fault_string: String,

    /// Acteur ayant produit l'erreur, si le serveur le précise
    pub fault_actor: Option<String>,

    /// Attributs des entrées de `detail`, sous la forme "nom = valeur; …".
    /// `None` si le Fault n'a pas de `detail`.
    pub detail: Option<String>,
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Soap Fault code={} fault string={} fault actor={}",
            self.fault_code,
            self.fault_string,
            self.fault_actor.as_deref().unwrap_or("")
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " detail: {}", detail)?;
        }
        Ok(())
    }
}

/// Extrait le SOAP Fault porté par un corps SOAP, s'il y en a un.
///
/// Le Fault est un enfant direct du Body. Chaque entrée de `detail`
/// contribue ses attributs (`ErrorCode`, `Description`, …) triés par nom
/// local : la table d'attributs de `xmltree` ne garde pas l'ordre du
/// document, le tri rend le texte stable d'un appel à l'autre.
pub fn parse_soap_fault(body: &Element) -> Option<SoapFault> {
    let fault = find_child_local(body, "Fault")?;

    let text_of = |name: &str| find_child_local(fault, name).map(|e| element_text(e).trim().to_string());

    let detail = find_child_local(fault, "detail").map(|detail| {
        let mut pairs = Vec::new();
        for entry in child_elements(detail) {
            let mut attributes: Vec<(&str, &str)> = entry
                .attributes
                .iter()
                .filter(|(key, _)| !key.starts_with("xmlns"))
                .map(|(key, value)| (key.rsplit(':').next().unwrap_or(key), value.as_str()))
                .collect();
            attributes.sort();
            pairs.extend(
                attributes
                    .into_iter()
                    .map(|(name, value)| format!("{} = {}", name, value)),
            );
        }
        pairs.join("; ")
    });

    Some(SoapFault {
        fault_code: text_of("faultcode").unwrap_or_default(),
        fault_string: text_of("faultstring").unwrap_or_default(),
        fault_actor: text_of("faultactor"),
        detail,
    })
}

/// Construit un SOAP Fault XML au format des serveurs XML/A
///
/// # Arguments
///
/// * `fault_code` - Code du fault (ex: "SOAP-ENV:Client")
/// * `fault_string` - Message d'erreur
/// * `fault_actor` - Acteur optionnel
/// * `detail_error` - Attributs d'une entrée `<Error …/>` dans `detail`
///   (aucun `detail` si `None`)
///
/// # Returns
///
/// XML SOAP Fault formaté
pub fn build_soap_fault(
    fault_code: &str,
    fault_string: &str,
    fault_actor: Option<&str>,
    detail_error: Option<&[(&str, &str)]>,
) -> Result<String, xmltree::Error> {
    // Construire l'élément Fault
    let mut fault = Element::new("s:Fault");

    let mut push_text = |name: &str, text: &str| {
        let mut elem = Element::new(name);
        elem.children.push(XMLNode::Text(text.to_string()));
        fault.children.push(XMLNode::Element(elem));
    };

    push_text("faultcode", fault_code);
    push_text("faultstring", fault_string);
    if let Some(actor) = fault_actor {
        push_text("faultactor", actor);
    }

    // detail (si erreur XML/A)
    if let Some(attributes) = detail_error {
        let mut error = Element::new("Error");
        for (name, value) in attributes {
            error
                .attributes
                .insert((*name).to_string(), (*value).to_string());
        }

        let mut detail = Element::new("detail");
        detail.children.push(XMLNode::Element(error));
        fault.children.push(XMLNode::Element(detail));
    }

    // Construire le Body
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(fault));

    // Construire l'Envelope
    let mut envelope = Element::new("s:Envelope");
    envelope
        .attributes
        .insert("xmlns:s".to_string(), SOAP_ENVELOPE_URI.to_string());
    envelope.children.push(XMLNode::Element(body));

    // Sérialiser
    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
