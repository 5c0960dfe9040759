//! Request serialization.
//!
//! A [`RequestBuilder`] takes one compiled [`Operation`] and the caller's
//! field values, validates and binds them into per-call [`FieldBinding`]s,
//! and emits the namespace-qualified envelope plus the SOAPAction value.
//! Binding state is allocated fresh for every call; the shared operation is
//! never written to.

use quick_xml::{
    events::{BytesStart, BytesText, Event},
    Writer,
};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use tracing::trace;

use crate::error::Error;
use crate::response::ENVELOPE_NAMESPACE;
use crate::wsdl::{
    field::{Field, Value},
    Operation, ServiceDescription,
};

const ENVELOPE_PREFIX: &str = "soapenv";
const TARGET_PREFIX: &str = "ns1";

/// The values bound to one field for the duration of a single call.
#[derive(Debug)]
pub struct FieldBinding<'a> {
    field: &'a Field,
    values: Vec<Value>,
}

impl<'a> FieldBinding<'a> {
    fn new(field: &'a Field) -> Self {
        Self {
            field,
            values: Vec::new(),
        }
    }

    /// Single-occurrence fields keep only the latest value; repeatable
    /// fields accumulate in binding order.
    fn push(&mut self, value: Value) {
        if !self.field.multiple() {
            self.values.clear();
        }
        self.values.push(value);
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

pub struct RequestBuilder<'a> {
    operation: &'a Operation,
    target_namespace: &'a str,
    bindings: BTreeMap<String, FieldBinding<'a>>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(description: &'a ServiceDescription, operation: &'a Operation) -> Self {
        Self {
            operation,
            target_namespace: description.target_namespace(),
            bindings: BTreeMap::new(),
        }
    }

    /// Validate and bind one caller-supplied value.
    pub fn bind(&mut self, field_name: &str, value: Value) -> Result<(), Error> {
        let field = self
            .operation
            .field(field_name)
            .ok_or_else(|| Error::UnknownField {
                operation: self.operation.name.clone(),
                field: field_name.to_owned(),
            })?;

        field
            .validate(&value)
            .map_err(|reason| Error::InvalidFieldValue {
                field: field_name.to_owned(),
                reason,
            })?;

        self.bindings
            .entry(field_name.to_owned())
            .or_insert_with(|| FieldBinding::new(field))
            .push(value);

        Ok(())
    }

    pub fn binding(&self, field_name: &str) -> Option<&FieldBinding<'a>> {
        self.bindings.get(field_name)
    }

    /// Serialize the envelope and compute the action identifier.
    ///
    /// Fields are emitted in the operation's fixed sorted order, not the
    /// order the caller bound them in.
    pub fn build(&self) -> Result<(Vec<u8>, String), Error> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        let mut envelope = BytesStart::owned_name(format!("{}:Envelope", ENVELOPE_PREFIX));
        envelope.push_attribute((format!("xmlns:{}", ENVELOPE_PREFIX).as_str(), ENVELOPE_NAMESPACE));
        envelope.push_attribute((format!("xmlns:{}", TARGET_PREFIX).as_str(), self.target_namespace));

        let body = BytesStart::owned_name(format!("{}:Body", ENVELOPE_PREFIX));
        let container = BytesStart::owned_name(format!("{}:{}", TARGET_PREFIX, self.operation.name));

        writer.write_event(Event::Start(envelope.to_borrowed()))?;
        writer.write_event(Event::Start(body.to_borrowed()))?;
        writer.write_event(Event::Start(container.to_borrowed()))?;

        for (name, binding) in &self.bindings {
            write_binding(&mut writer, name, binding)?;
        }

        writer.write_event(Event::End(container.to_end()))?;
        writer.write_event(Event::End(body.to_end()))?;
        writer.write_event(Event::End(envelope.to_end()))?;

        let action = self.soap_action();
        trace!(operation = %self.operation.name, action = %action, "serialized request");

        Ok((writer.into_inner().into_inner(), action))
    }

    /// Target namespace joined to the operation name, inserting `/` only
    /// when the namespace does not already end with one.
    pub fn soap_action(&self) -> String {
        if self.target_namespace.ends_with('/') {
            format!("{}{}", self.target_namespace, self.operation.name)
        } else {
            format!("{}/{}", self.target_namespace, self.operation.name)
        }
    }
}

fn write_binding<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    binding: &FieldBinding<'_>,
) -> Result<(), Error> {
    for value in binding.values() {
        let start = BytesStart::owned_name(format!("{}:{}", TARGET_PREFIX, name));

        match value {
            Value::Text(text) => {
                writer.write_event(Event::Start(start.to_borrowed()))?;
                writer.write_event(Event::Text(BytesText::from_plain_str(text)))?;
                writer.write_event(Event::End(start.to_end()))?;
            }

            // Structured values re-emit the caller's subtree inside the
            // qualified field element: the field itself carries the target
            // prefix, nested content is written through unqualified.
            Value::Node(node) => {
                writer.write_event(Event::Start(start.to_borrowed()))?;

                if node.children.is_empty() {
                    if let Some(text) = &node.text {
                        writer.write_event(Event::Text(BytesText::from_plain_str(text)))?;
                    }
                } else {
                    for child in &node.children {
                        child.write(writer)?;
                    }
                }

                writer.write_event(Event::End(start.to_end()))?;
            }
        }
    }

    Ok(())
}
