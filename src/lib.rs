//! Schema-driven client for legacy SOAP/WSDL services.
//!
//! A [`Client`] compiles a service description once into an immutable
//! operation catalog, builds namespace-qualified request envelopes from
//! caller-supplied values, and normalizes whatever XML comes back into a
//! uniform [`ResponseNode`] tree with first-class fault detection.
//!
//! ```no_run
//! use soapdish::{Auth, Client};
//!
//! # fn main() -> Result<(), soapdish::Error> {
//! let client = Client::new(
//!     "https://intranet.example.com/_vti_bin/Lists.asmx?WSDL",
//!     Auth::Basic {
//!         user: "svc".to_owned(),
//!         password: "secret".to_owned(),
//!     },
//! )?;
//!
//! let result = client.call(
//!     "<GetListItems><listName>Contacts</listName><rowLimit>25</rowLimit></GetListItems>",
//! )?;
//!
//! match result.fault() {
//!     Some(fault) => eprintln!("service fault: {:?}", fault.reason()),
//!     None => println!("{:?}", result.data()),
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tracing::debug;
use url::Url;

pub mod error;
pub mod request;
pub mod response;
pub mod transport;
pub mod wsdl;
pub mod xml;

pub use error::Error;
pub use request::RequestBuilder;
pub use response::{
    fault::Fault,
    normalize,
    result::{AdapterConfig, Outcome, ResultAdapter, ResultContainer},
    Children, ResponseNode,
};
pub use transport::{Auth, Diagnostics, HttpTransport, Transport, TransportReply};
pub use wsdl::{Field, FieldKind, Occurs, Operation, ServiceDescription, Value};

use response::result::AdapterRegistry;

pub struct Client {
    description: Arc<ServiceDescription>,
    service_uri: String,
    auth: Auth,
    adapters: AdapterRegistry,
    transport: Box<dyn Transport>,
}

impl Client {
    /// Compile the service description at `location` (file path or http(s)
    /// URL) and target the same location, minus any query string, for calls.
    pub fn new<S: AsRef<str>>(location: S, auth: Auth) -> Result<Self, Error> {
        let description = wsdl::parse(location.as_ref())?;
        Ok(Self::from_description(
            Arc::new(description),
            service_uri(location.as_ref()),
            auth,
        ))
    }

    /// Build a client around an already compiled description.
    pub fn from_description(
        description: Arc<ServiceDescription>,
        service_uri: String,
        auth: Auth,
    ) -> Self {
        Self {
            description,
            service_uri,
            auth,
            adapters: AdapterRegistry::new(),
            transport: Box::new(HttpTransport::new()),
        }
    }

    /// Replace the transport used for exchanges.
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn register_adapter<S: Into<String>>(&mut self, name: S, adapter: Box<dyn ResultAdapter>) {
        self.adapters.register(name, adapter);
    }

    /// Apply adapter selection configuration; unknown identifiers are
    /// rejected here, not during calls.
    pub fn configure_adapters(&mut self, config: AdapterConfig) -> Result<(), Error> {
        self.adapters.configure(config)
    }

    pub fn service_description(&self) -> &ServiceDescription {
        &self.description
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.description.operation_names()
    }

    /// Call an operation described by a request-body document: the root
    /// element names the operation, its children carry the field values.
    pub fn call(&self, body: &str) -> Result<ResultContainer, Error> {
        let document = xml::parse_str(body)?;
        let root = document.root;

        let values: Vec<(String, Value)> = root
            .children
            .iter()
            .map(|child| {
                let value = if child.children.is_empty() {
                    Value::Text(child.text.clone().unwrap_or_default())
                } else {
                    Value::Node(child.clone())
                };
                (child.name.clone(), value)
            })
            .collect();

        self.call_operation(&root.name, values)
    }

    /// Call an operation with explicit field bindings.
    pub fn call_operation(
        &self,
        operation_name: &str,
        values: Vec<(String, Value)>,
    ) -> Result<ResultContainer, Error> {
        let operation = self
            .description
            .operation(operation_name)
            .ok_or_else(|| Error::UnknownOperation {
                description: self.description.name().to_owned(),
                operation: operation_name.to_owned(),
            })?;

        let mut builder = RequestBuilder::new(&self.description, operation);
        for (field, value) in values {
            builder.bind(&field, value)?;
        }

        let (wire, action) = builder.build()?;
        let headers = request_headers(&action, wire.len());

        debug!(operation = operation_name, action = %action, "sending request");
        let reply = self.transport.send(&self.service_uri, &headers, &wire, &self.auth);

        if let Some(error) = reply.error {
            return Err(Error::Transport(error));
        }

        self.interpret(operation, &reply.bytes, reply.diagnostics)
    }

    fn interpret(
        &self,
        operation: &Operation,
        bytes: &[u8],
        diagnostics: Diagnostics,
    ) -> Result<ResultContainer, Error> {
        let text = String::from_utf8_lossy(bytes);
        let document =
            xml::parse_str(&text).map_err(|err| Error::MalformedResponse(err.to_string()))?;

        let body = response::locate_body(&document.root, &document.namespaces)
            .ok_or_else(|| Error::MalformedResponse("no envelope body in response".to_owned()))?;

        if let Some(fault) = response::fault::detect(body, &document.namespaces) {
            debug!(operation = %operation.name, code = ?fault.code(), "service fault");
            return Ok(ResultContainer {
                outcome: Outcome::Fault(fault),
                diagnostics,
            });
        }

        let normalized = response::normalize(body, &document.namespaces);
        let response_name = operation
            .response
            .as_ref()
            .map(|shape| shape.name.as_str());
        let adapter = self.adapters.select(response_name);

        Ok(ResultContainer {
            outcome: Outcome::Data(adapter.adapt(normalized)),
            diagnostics,
        })
    }
}

/// The header set the target service expects on every exchange.
fn request_headers(action: &str, content_length: usize) -> Vec<(String, String)> {
    vec![
        (
            "Content-Type".to_owned(),
            "text/xml;charset=\"utf-8\"".to_owned(),
        ),
        ("Accept".to_owned(), "text/xml".to_owned()),
        ("Cache-Control".to_owned(), "no-cache".to_owned()),
        ("Pragma".to_owned(), "no-cache".to_owned()),
        ("SOAPAction".to_owned(), format!("\"{}\"", action)),
        ("Content-Length".to_owned(), content_length.to_string()),
    ]
}

/// Scheme, host and path of the WSDL location; the query string selecting
/// the WSDL view is not part of the service endpoint.
fn service_uri(location: &str) -> String {
    match Url::parse(location) {
        Ok(url) => format!(
            "{}://{}{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.path()
        ),
        Err(_) => location.to_owned(),
    }
}
