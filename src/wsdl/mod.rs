//! Service description compilation.
//!
//! A WSDL document is compiled once into a [`ServiceDescription`]: the target
//! namespace, the document's prefix map and a catalog of [`Operation`]s keyed
//! and ordered by name. The description is immutable after construction and
//! safe to share across calls.

use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

pub mod error;
pub mod field;
mod parser;

pub use error::Error;
pub use field::{Field, FieldKind, Occurs, Value};

/// One callable operation: its input field shapes and, when the schema
/// declares one, the shape of its response element.
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub fields: BTreeMap<String, Field>,
    pub response: Option<ResponseShape>,
}

#[derive(Debug, Clone)]
pub struct ResponseShape {
    pub name: String,
    pub fields: BTreeMap<String, Field>,
}

impl Operation {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ServiceDescription {
    name: String,
    target_namespace: String,
    namespaces: BTreeMap<String, String>,
    operations: BTreeMap<String, Operation>,
}

impl ServiceDescription {
    /// Compile a service description from an in-memory document.
    pub fn from_str(document: &str) -> Result<Self, Error> {
        parser::compile(document, String::new())
    }

    /// The "name" of the description: the trailing segment of the location
    /// it was loaded from, empty when compiled from memory.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_namespace(&self) -> &str {
        &self.target_namespace
    }

    /// Prefix to URI, every declaration present in the source document.
    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    pub fn operations(&self) -> &BTreeMap<String, Operation> {
        &self.operations
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }
}

/// Load and compile a service description from a file path or http(s) URL.
pub fn parse<S: AsRef<str>>(location: S) -> Result<ServiceDescription, Error> {
    let url = {
        match Url::parse(location.as_ref()) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::from_file_path(
                Path::new(location.as_ref())
                    .canonicalize()
                    .map_err(|err| Error::PathConversionError(Some(err)))?,
            )
            .map_err(|()| Error::PathConversionError(None))?,
            Err(err) => return Err(err.into()),
        }
    };

    let document = match url.scheme() {
        "file" => std::fs::read_to_string(
            url.to_file_path()
                .map_err(|()| Error::PathConversionError(None))?,
        )?,

        "http" | "https" => reqwest::blocking::get(url.clone())?.text()?,

        other => return Err(Error::UnsupportedScheme(other.to_owned())),
    };

    parser::compile(&document, description_name(&url))
}

fn description_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or_default()
        .to_owned()
}
