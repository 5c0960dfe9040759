use std::collections::BTreeMap;
use tracing::debug;

use crate::xml::{self, Element};

use super::{
    error,
    field::{self, Field},
    Operation, ResponseShape, ServiceDescription,
};

const RESPONSE_SUFFIX: &str = "Response";

/// Input and response declarations for one operation, merged by name before
/// field resolution.
#[derive(Default)]
struct Declarations<'a> {
    input: Option<&'a Element>,
    response: Option<&'a Element>,
}

pub fn compile(document: &str, name: String) -> Result<ServiceDescription, error::Error> {
    let document = xml::parse_str(document)?;
    let root = &document.root;

    if root.name != "definitions" {
        return Err(error::Error::MalformedSchema);
    }

    let target_namespace = root
        .attribute("targetNamespace")
        .unwrap_or_default()
        .to_owned();

    let declarations = top_level_declarations(root);
    if declarations.is_empty() {
        return Err(error::Error::NoOperationsFound);
    }

    let mut merged: BTreeMap<String, Declarations<'_>> = BTreeMap::new();
    for declaration in declarations {
        let declared_name = match declaration.attribute("name") {
            Some(declared_name) => declared_name,
            None => continue,
        };

        match strip_response_suffix(declared_name) {
            Some(operation) => merged.entry(operation.to_owned()).or_default().response = Some(declaration),
            None => merged.entry(declared_name.to_owned()).or_default().input = Some(declaration),
        }
    }

    let mut operations = BTreeMap::new();
    for (operation_name, declarations) in merged {
        let fields = declarations
            .input
            .map(compile_fields)
            .unwrap_or_default();

        let response = declarations.response.map(|declaration| ResponseShape {
            name: declaration.attribute("name").unwrap_or_default().to_owned(),
            fields: compile_fields(declaration),
        });

        debug!(
            operation = %operation_name,
            fields = fields.len(),
            has_response = response.is_some(),
            "compiled operation"
        );

        operations.insert(
            operation_name.clone(),
            Operation {
                name: operation_name,
                fields,
                response,
            },
        );
    }

    Ok(ServiceDescription {
        name,
        target_namespace,
        namespaces: document.namespaces,
        operations,
    })
}

/// Top-level element declarations: `definitions/types/schema/element`.
fn top_level_declarations(root: &Element) -> Vec<&Element> {
    let mut declarations = Vec::new();

    for types in root.children_named("types") {
        for schema in types.children_named("schema") {
            declarations.extend(schema.children_named("element"));
        }
    }

    declarations
}

/// A declaration whose name ends in `Response` (matched case-insensitively,
/// per the service's legacy convention) is the response shape for the
/// operation named by stripping that suffix. A declaration named exactly
/// `Response` is treated as an ordinary input.
fn strip_response_suffix(name: &str) -> Option<&str> {
    if name.len() <= RESPONSE_SUFFIX.len() {
        return None;
    }

    let (stem, suffix) = name.split_at(name.len() - RESPONSE_SUFFIX.len());
    if suffix.eq_ignore_ascii_case(RESPONSE_SUFFIX) {
        Some(stem)
    } else {
        None
    }
}

/// Field declarations live under `element/complexType/sequence/element`.
fn compile_fields(declaration: &Element) -> BTreeMap<String, Field> {
    let mut fields = BTreeMap::new();

    for complex in declaration.children_named("complexType") {
        for sequence in complex.children_named("sequence") {
            for child in sequence.children_named("element") {
                let field = field::resolve(child);
                fields.insert(field.name.clone(), field);
            }
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::super::{Error, ServiceDescription};
    use crate::wsdl::field::FieldKind;

    const SAMPLE_WSDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                  xmlns:s="http://www.w3.org/2001/XMLSchema"
                  xmlns:tns="http://schemas.example.com/directory/"
                  targetNamespace="http://schemas.example.com/directory/">
  <wsdl:types>
    <s:schema targetNamespace="http://schemas.example.com/directory/">
      <s:element name="GetListItems">
        <s:complexType>
          <s:sequence>
            <s:element name="listName" type="s:string" minOccurs="0" maxOccurs="1"/>
            <s:element name="rowLimit" type="s:int" minOccurs="0"/>
            <s:element name="query" minOccurs="0" maxOccurs="1">
              <s:complexType/>
            </s:element>
            <s:element name="viewFields" minOccurs="0">
              <s:complexType/>
            </s:element>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="GetListItemsResponse">
        <s:complexType>
          <s:sequence>
            <s:element name="GetListItemsResult" minOccurs="0"/>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="DeleteList">
        <s:complexType>
          <s:sequence>
            <s:element name="listName" type="s:string"/>
          </s:sequence>
        </s:complexType>
      </s:element>
    </s:schema>
  </wsdl:types>
</wsdl:definitions>"#;

    #[test]
    fn compiles_sorted_operation_catalog() {
        let description = ServiceDescription::from_str(SAMPLE_WSDL).unwrap();

        assert_eq!(
            description.target_namespace(),
            "http://schemas.example.com/directory/"
        );
        assert_eq!(
            description.operation_names().collect::<Vec<_>>(),
            vec!["DeleteList", "GetListItems"]
        );
        assert_eq!(
            description.namespaces().get("s").map(String::as_str),
            Some("http://www.w3.org/2001/XMLSchema")
        );
    }

    #[test]
    fn fields_are_sorted_regardless_of_declaration_order() {
        let description = ServiceDescription::from_str(SAMPLE_WSDL).unwrap();
        let operation = description.operation("GetListItems").unwrap();

        assert_eq!(
            operation.field_names().collect::<Vec<_>>(),
            vec!["listName", "query", "rowLimit", "viewFields"]
        );
    }

    #[test]
    fn response_shapes_pair_with_their_operations() {
        let description = ServiceDescription::from_str(SAMPLE_WSDL).unwrap();

        let with_response = description.operation("GetListItems").unwrap();
        let response = with_response.response.as_ref().unwrap();
        assert_eq!(response.name, "GetListItemsResponse");
        assert!(response.fields.contains_key("GetListItemsResult"));

        let without_response = description.operation("DeleteList").unwrap();
        assert!(without_response.response.is_none());
    }

    #[test]
    fn field_kinds_follow_resolution_rules() {
        let description = ServiceDescription::from_str(SAMPLE_WSDL).unwrap();
        let operation = description.operation("GetListItems").unwrap();

        assert_eq!(operation.field("listName").unwrap().kind, FieldKind::String);
        assert_eq!(operation.field("rowLimit").unwrap().kind, FieldKind::Int);
        assert_eq!(operation.field("query").unwrap().kind, FieldKind::Query);
        assert_eq!(
            operation.field("viewFields").unwrap().kind,
            FieldKind::ViewFields
        );
    }

    #[test]
    fn missing_definitions_root_is_malformed() {
        let result = ServiceDescription::from_str("<notdefinitions/>");
        assert!(matches!(result, Err(Error::MalformedSchema)));
    }

    #[test]
    fn schema_without_declarations_has_no_operations() {
        let document = r#"<definitions><types><schema/></types></definitions>"#;
        let result = ServiceDescription::from_str(document);
        assert!(matches!(result, Err(Error::NoOperationsFound)));
    }
}
