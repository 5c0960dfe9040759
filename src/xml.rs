//! A small owned XML element tree.
//!
//! Both the schema compiler and the response normalizer need to walk a fully
//! parsed document rather than a stream of events, so everything funnels
//! through [`parse_str`] / [`parse_reader`] and works on [`Element`] values
//! from there. Serialization goes back out through a [`quick_xml::Writer`].

use quick_xml::{
    events::{BytesStart, BytesText, Event},
    Reader, Writer,
};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// One parsed element: raw prefix, local name, attributes in document order,
/// accumulated character data and child elements in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub prefix: Option<String>,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

/// A parsed document: the root element plus every namespace declaration seen
/// anywhere in the document, keyed by prefix (empty string for the default
/// namespace).
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub root: Element,
    pub namespaces: BTreeMap<String, String>,
}

pub fn split_name(prefixed_name: &str) -> (Option<&str>, &str) {
    let mut split = prefixed_name.splitn(2, ':');
    let first = split.next().unwrap_or(prefixed_name);
    let second = split.next();

    if let Some(second) = second {
        (Some(first), second)
    } else {
        (None, first)
    }
}

/// The local part of an element or attribute name.
pub fn local_name(raw: &str) -> &str {
    split_name(raw).1
}

pub fn parse_str(input: &str) -> Result<Document, quick_xml::Error> {
    parse_reader(Reader::from_str(input))
}

pub fn parse_reader<B: BufRead>(mut reader: Reader<B>) -> Result<Document, quick_xml::Error> {
    reader.trim_text(true);

    let mut buffer = Vec::new();
    let mut namespaces = BTreeMap::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event(&mut buffer)? {
            Event::Start(start) => {
                let element = read_element(&reader, &start, &mut namespaces)?;
                stack.push(element);
            }

            Event::Empty(start) => {
                let element = read_element(&reader, &start, &mut namespaces)?;
                attach(&mut stack, &mut root, element);
            }

            Event::End(..) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }

            Event::Text(text) => {
                let unescaped = text.unescaped()?;
                let value = reader.decode(unescaped.as_ref())?;
                append_text(&mut stack, value);
            }

            Event::Eof => break,

            _ => (),
        }

        buffer.clear();
    }

    let root = root.ok_or_else(|| {
        quick_xml::Error::UnexpectedEof("no root element in document".to_owned())
    })?;

    Ok(Document { root, namespaces })
}

fn read_element<B: BufRead>(
    reader: &Reader<B>,
    start: &BytesStart<'_>,
    namespaces: &mut BTreeMap<String, String>,
) -> Result<Element, quick_xml::Error> {
    let (prefix, local) = split_name(reader.decode(start.name())?);
    let mut element = Element {
        prefix: prefix.map(ToOwned::to_owned),
        name: local.to_owned(),
        ..Default::default()
    };

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?.to_owned();
        let unescaped = attribute.unescaped_value()?;
        let value = reader.decode(unescaped.as_ref())?.to_owned();

        match split_name(&key) {
            (Some("xmlns"), declared) => {
                namespaces.insert(declared.to_owned(), value);
            }
            (None, "xmlns") => {
                namespaces.insert(String::new(), value);
            }
            _ => element.attributes.push((key, value)),
        }
    }

    Ok(element)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => (),
    }
}

fn append_text(stack: &mut [Element], value: &str) {
    if value.is_empty() {
        return;
    }

    if let Some(parent) = stack.last_mut() {
        match &mut parent.text {
            Some(existing) => existing.push_str(value),
            None => parent.text = Some(value.to_owned()),
        }
    }
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// Look up an attribute by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_name(key) == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child with the given local name, regardless of prefix.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn write<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        let qualified = self.qualified_name();
        let mut start = BytesStart::owned_name(qualified.as_str());

        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.text.is_none() && self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start.to_borrowed()))?;

        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::from_plain_str(text)))?;
        }

        for child in &self.children {
            child.write(writer)?;
        }

        writer.write_event(Event::End(start.to_end()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_nested_elements_with_attributes() {
        let document = parse_str(
            r#"<outer version="2"><inner name="first">hello</inner><inner name="second"/></outer>"#,
        )
        .unwrap();

        let root = document.root;
        assert_eq!(root.name, "outer");
        assert_eq!(root.attribute("version"), Some("2"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text.as_deref(), Some("hello"));
        assert_eq!(root.children[1].attribute("name"), Some("second"));
        assert_eq!(root.children[1].text, None);
    }

    #[test]
    fn collects_namespace_declarations() {
        let document = parse_str(
            r#"<w:definitions xmlns:w="http://example.org/wsdl" xmlns="http://example.org/default">
                 <w:types xmlns:s="http://example.org/schema"/>
               </w:definitions>"#,
        )
        .unwrap();

        assert_eq!(
            document.namespaces.get("w").map(String::as_str),
            Some("http://example.org/wsdl")
        );
        assert_eq!(
            document.namespaces.get("s").map(String::as_str),
            Some("http://example.org/schema")
        );
        assert_eq!(
            document.namespaces.get("").map(String::as_str),
            Some("http://example.org/default")
        );
        assert_eq!(document.root.prefix.as_deref(), Some("w"));
        assert_eq!(document.root.name, "definitions");
    }

    #[test]
    fn write_round_trips_through_parse() {
        let mut element = Element::new("record");
        element.attributes.push(("id".to_owned(), "7".to_owned()));

        let mut child = Element::new("title");
        child.text = Some("abc".to_owned());
        element.children.push(child);

        let mut writer = Writer::new(Cursor::new(Vec::new()));
        element.write(&mut writer).unwrap();
        let bytes = writer.into_inner().into_inner();

        let reparsed = parse_str(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(reparsed.root, element);
    }

    #[test]
    fn splits_prefixed_names() {
        assert_eq!(split_name("s:element"), (Some("s"), "element"));
        assert_eq!(split_name("element"), (None, "element"));
    }
}
