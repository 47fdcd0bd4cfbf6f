//! Construction of SOAP request envelopes

use xmltree::{Element, XMLNode};

fn build_soap_envelope_with_body(body_child: Element) -> Result<String, xmltree::Error> {
    // Body
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    // Envelope
    let mut envelope = Element::new("s:Envelope");
    envelope.attributes.insert(
        "xmlns:s".to_string(),
        "http://schemas.xmlsoap.org/soap/envelope/".to_string(),
    );
    envelope.attributes.insert(
        "s:encodingStyle".to_string(),
        "http://schemas.xmlsoap.org/soap/encoding/".to_string(),
    );
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new().write_document_declaration(true);
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8(buf).expect("xmltree emits UTF-8"))
}

/// Build a UPnP SOAP action request.
///
/// # Arguments
///
/// * `service_urn` - service URN (e.g. "urn:schemas-upnp-org:service:AVTransport:1")
/// * `action` - action name (e.g. "AddURIToQueue")
/// * `args` - (name, value) argument pairs; values are XML-escaped by the writer
pub fn build_soap_request(
    service_urn: &str,
    action: &str,
    args: &[(&str, &str)],
) -> Result<String, xmltree::Error> {
    let request_name = format!("u:{}", action);
    let mut request_elem = Element::new(&request_name);
    request_elem
        .attributes
        .insert("xmlns:u".to_string(), service_urn.to_string());

    for (name, value) in args {
        let mut child = Element::new(name);
        child.children.push(XMLNode::Text((*value).to_string()));
        request_elem.children.push(XMLNode::Element(child));
    }

    build_soap_envelope_with_body(request_elem)
}
