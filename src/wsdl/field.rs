//! The field model: what one operation parameter looks like on the wire.
//!
//! The variant set is closed. Scalar kinds come from the schema's explicit
//! type attribute; a handful of well-known untyped field names map to domain
//! variants by convention; everything else is either `Complex` (nested
//! declaration) or `Custom` (opaque passthrough).

use crate::xml::{self, Element};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    Complex,
    Custom,
    Query,
    QueryOptions,
    ViewFields,
}

/// Declared cardinality upper bound. `unbounded` in the schema becomes
/// [`Occurs::Unbounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurs {
    Bounded(u32),
    Unbounded,
}

/// A caller-supplied value for one field: inline text or a structured
/// subtree taken verbatim from the request body document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Node(Element),
}

/// The wire contract for a field. Definition only; bound values live in the
/// per-call binding, never here.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub min_occurs: u32,
    pub max_occurs: Occurs,
}

impl Field {
    /// Whether more than one value may be bound to this field.
    pub fn multiple(&self) -> bool {
        match self.max_occurs {
            Occurs::Unbounded => true,
            Occurs::Bounded(bound) => bound > 1,
        }
    }

    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self.kind {
            FieldKind::String => match value {
                Value::Text(text) if !text.trim().is_empty() => Ok(()),
                Value::Text(_) => Err("empty string value".to_owned()),
                Value::Node(_) => Err("expected a text value".to_owned()),
            },

            FieldKind::Int => match value {
                Value::Text(text) => {
                    let text = text.trim();
                    if text.parse::<i64>().is_ok() {
                        Ok(())
                    } else {
                        Err(format!("'{}' is not an integer", text))
                    }
                }
                Value::Node(_) => Err("expected an integer value".to_owned()),
            },

            // Structural acceptance only; the service validates the content.
            FieldKind::Complex
            | FieldKind::Custom
            | FieldKind::Query
            | FieldKind::QueryOptions
            | FieldKind::ViewFields => Ok(()),
        }
    }
}

/// Derive a [`Field`] from one schema element declaration.
pub fn resolve(declaration: &Element) -> Field {
    let name = declaration.attribute("name").unwrap_or_default().to_owned();
    let explicit_type = declaration.attribute("type");
    let has_children = !declaration.children.is_empty();

    let kind = match explicit_type {
        Some(ty) => match xml::local_name(ty) {
            "string" => FieldKind::String,
            "int" => FieldKind::Int,
            _ => structural_kind(has_children),
        },
        None => match name.as_str() {
            "query" => FieldKind::Query,
            "queryOptions" => FieldKind::QueryOptions,
            "viewFields" => FieldKind::ViewFields,
            _ => structural_kind(has_children),
        },
    };

    Field {
        name,
        kind,
        min_occurs: parse_min_occurs(declaration.attribute("minOccurs")),
        max_occurs: parse_max_occurs(declaration.attribute("maxOccurs")),
    }
}

fn structural_kind(has_children: bool) -> FieldKind {
    if has_children {
        FieldKind::Complex
    } else {
        FieldKind::Custom
    }
}

fn parse_min_occurs(attribute: Option<&str>) -> u32 {
    attribute
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

fn parse_max_occurs(attribute: Option<&str>) -> Occurs {
    match attribute.map(str::trim) {
        None => Occurs::Bounded(1),
        Some("unbounded") => Occurs::Unbounded,
        Some(value) => value.parse().map(Occurs::Bounded).unwrap_or(Occurs::Bounded(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    fn declaration(input: &str) -> Element {
        xml::parse_str(input).unwrap().root
    }

    #[test]
    fn explicit_scalar_types_win() {
        let field = resolve(&declaration(r#"<element name="listName" type="s:string"/>"#));
        assert_eq!(field.kind, FieldKind::String);

        let field = resolve(&declaration(r#"<element name="rowLimit" type="s:int"/>"#));
        assert_eq!(field.kind, FieldKind::Int);
    }

    #[test]
    fn unrecognized_explicit_type_falls_back_to_structure() {
        let field = resolve(&declaration(r#"<element name="when" type="s:dateTime"/>"#));
        assert_eq!(field.kind, FieldKind::Custom);

        let field = resolve(&declaration(
            r#"<element name="when" type="s:dateTime"><complexType/></element>"#,
        ));
        assert_eq!(field.kind, FieldKind::Complex);
    }

    #[test]
    fn untyped_domain_names_resolve_by_convention() {
        for (name, kind) in [
            ("query", FieldKind::Query),
            ("queryOptions", FieldKind::QueryOptions),
            ("viewFields", FieldKind::ViewFields),
        ] {
            let field = resolve(&declaration(&format!(r#"<element name="{}"/>"#, name)));
            assert_eq!(field.kind, kind, "for {}", name);
        }
    }

    #[test]
    fn occurs_attributes_default_and_parse() {
        let field = resolve(&declaration(r#"<element name="a" type="s:string"/>"#));
        assert_eq!(field.min_occurs, 0);
        assert_eq!(field.max_occurs, Occurs::Bounded(1));
        assert!(!field.multiple());

        let field = resolve(&declaration(
            r#"<element name="a" type="s:string" minOccurs="1" maxOccurs="unbounded"/>"#,
        ));
        assert_eq!(field.min_occurs, 1);
        assert_eq!(field.max_occurs, Occurs::Unbounded);
        assert!(field.multiple());
    }

    #[test]
    fn string_and_int_validation() {
        let string_field = resolve(&declaration(r#"<element name="a" type="s:string"/>"#));
        assert!(string_field.validate(&Value::Text("hello".to_owned())).is_ok());
        assert!(string_field.validate(&Value::Text("  ".to_owned())).is_err());

        let int_field = resolve(&declaration(r#"<element name="a" type="s:int"/>"#));
        assert!(int_field.validate(&Value::Text("42".to_owned())).is_ok());
        assert!(int_field.validate(&Value::Text("-7".to_owned())).is_ok());
        assert!(int_field.validate(&Value::Text("4.2".to_owned())).is_err());
        assert!(int_field.validate(&Value::Text("abc".to_owned())).is_err());
    }

    #[test]
    fn structured_kinds_accept_nodes() {
        let field = resolve(&declaration(r#"<element name="query"/>"#));
        let node = Value::Node(Element::new("Query"));
        assert!(field.validate(&node).is_ok());
    }
}
