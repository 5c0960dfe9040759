//! Fault detection.
//!
//! A fault is a service-reported failure carried inside a normal envelope.
//! It is a first-class outcome the caller branches on, not an error: the
//! call itself succeeded at the transport and parsing level.

use std::collections::BTreeMap;

use super::{envelope_qualified, normalize, ResponseNode};
use crate::xml::Element;

const FAULT_ELEMENT: &str = "Fault";

#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    detail: ResponseNode,
}

impl Fault {
    /// The `faultcode` text, when the service supplied one.
    pub fn code(&self) -> Option<&str> {
        self.detail.first("faultcode").and_then(ResponseNode::text)
    }

    /// The `faultstring` text, when the service supplied one.
    pub fn reason(&self) -> Option<&str> {
        self.detail.first("faultstring").and_then(ResponseNode::text)
    }

    /// The full normalized fault subtree.
    pub fn detail(&self) -> &ResponseNode {
        &self.detail
    }
}

/// Inspect an envelope body for a fault child. Wins over any sibling data.
pub fn detect(body: &Element, namespaces: &BTreeMap<String, String>) -> Option<Fault> {
    body.children
        .iter()
        .find(|child| child.name == FAULT_ELEMENT && envelope_qualified(child, namespaces))
        .map(|element| Fault {
            detail: normalize(element, namespaces),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::locate_body;
    use crate::xml;

    const FAULT_RESPONSE: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
      <soap:Body>
        <EchoResponse><EchoResult>ignored</EchoResult></EchoResponse>
        <soap:Fault>
          <faultcode>soap:Server</faultcode>
          <faultstring>Exception of type X was thrown.</faultstring>
          <detail><errorstring>List does not exist.</errorstring></detail>
        </soap:Fault>
      </soap:Body>
    </soap:Envelope>"#;

    #[test]
    fn fault_wins_over_sibling_data() {
        let document = xml::parse_str(FAULT_RESPONSE).unwrap();
        let body = locate_body(&document.root, &document.namespaces).unwrap();

        let fault = detect(body, &document.namespaces).unwrap();
        assert_eq!(fault.code(), Some("soap:Server"));
        assert_eq!(fault.reason(), Some("Exception of type X was thrown."));
        assert_eq!(
            fault
                .detail()
                .first("detail")
                .and_then(|detail| detail.first("errorstring"))
                .and_then(ResponseNode::text),
            Some("List does not exist.")
        );
    }

    #[test]
    fn no_fault_in_ordinary_response() {
        let document = xml::parse_str(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
                 <soap:Body><EchoResponse/></soap:Body>
               </soap:Envelope>"#,
        )
        .unwrap();
        let body = locate_body(&document.root, &document.namespaces).unwrap();
        assert!(detect(body, &document.namespaces).is_none());
    }

    #[test]
    fn fault_under_foreign_namespace_is_not_a_fault() {
        let document = xml::parse_str(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"
                              xmlns:app="http://example.org/app">
                 <soap:Body><app:Fault>domain data named Fault</app:Fault></soap:Body>
               </soap:Envelope>"#,
        )
        .unwrap();
        let body = locate_body(&document.root, &document.namespaces).unwrap();
        assert!(detect(body, &document.namespaces).is_none());
    }
}
