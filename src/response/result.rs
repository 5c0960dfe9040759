//! Result adaptation.
//!
//! After normalization and fault detection, an adapter decides how the body
//! tree is presented to the caller. Adapters are registered by name;
//! selection is explicit override first, then the response shape's own name
//! by convention, then the configured default, then identity.

use std::collections::HashMap;
use tracing::debug;

use super::{fault::Fault, ResponseNode};
use crate::error::Error;
use crate::transport::Diagnostics;

/// The outcome of one call: operation data or a service fault.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Data(ResponseNode),
    Fault(Fault),
}

/// Outcome plus the transport diagnostics gathered for the exchange.
#[derive(Debug, Clone)]
pub struct ResultContainer {
    pub outcome: Outcome,
    pub diagnostics: Diagnostics,
}

impl ResultContainer {
    pub fn is_fault(&self) -> bool {
        matches!(self.outcome, Outcome::Fault(_))
    }

    pub fn fault(&self) -> Option<&Fault> {
        match &self.outcome {
            Outcome::Fault(fault) => Some(fault),
            Outcome::Data(_) => None,
        }
    }

    pub fn data(&self) -> Option<&ResponseNode> {
        match &self.outcome {
            Outcome::Data(data) => Some(data),
            Outcome::Fault(_) => None,
        }
    }
}

/// A normalization/typing strategy for one response shape.
pub trait ResultAdapter: Send + Sync {
    fn adapt(&self, body: ResponseNode) -> ResponseNode;
}

/// The default strategy: the normalized tree, unmodified.
pub struct GenericAdapter;

impl ResultAdapter for GenericAdapter {
    fn adapt(&self, body: ResponseNode) -> ResponseNode {
        body
    }
}

/// Flattens a row-set payload: the first descendant carrying an `ItemCount`
/// attribute and repeated `row` children becomes the result root. Falls back
/// to the generic tree when the shape is absent.
pub struct RowSetAdapter;

impl ResultAdapter for RowSetAdapter {
    fn adapt(&self, body: ResponseNode) -> ResponseNode {
        match find_row_set(&body) {
            Some(rows) => rows.clone(),
            None => body,
        }
    }
}

fn find_row_set(node: &ResponseNode) -> Option<&ResponseNode> {
    if node.attribute("ItemCount").is_some() && node.children().contains("row") {
        return Some(node);
    }

    for (_, entry) in node.children().iter() {
        for child in entry.iter() {
            if let Some(found) = find_row_set(child) {
                return Some(found);
            }
        }
    }

    None
}

pub const GENERIC_ADAPTER: &str = "generic";
pub const ROW_SET_ADAPTER: &str = "rowset";

/// Adapter selection configuration: identifiers must name registered
/// adapters, checked when the configuration is applied.
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    pub default_result_class: Option<String>,
    pub custom_result_classes: HashMap<String, String>,
}

pub struct AdapterRegistry {
    adapters: HashMap<String, Box<dyn ResultAdapter>>,
    default_adapter: Option<String>,
    overrides: HashMap<String, String>,
}

static IDENTITY: GenericAdapter = GenericAdapter;

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            adapters: HashMap::new(),
            default_adapter: None,
            overrides: HashMap::new(),
        };
        registry.register(GENERIC_ADAPTER, Box::new(GenericAdapter));
        registry.register(ROW_SET_ADAPTER, Box::new(RowSetAdapter));
        registry
    }

    pub fn register<S: Into<String>>(&mut self, name: S, adapter: Box<dyn ResultAdapter>) {
        self.adapters.insert(name.into(), adapter);
    }

    /// Apply a configuration. Unknown identifiers are a configuration
    /// error here, never at call time.
    pub fn configure(&mut self, config: AdapterConfig) -> Result<(), Error> {
        if let Some(name) = &config.default_result_class {
            if !self.adapters.contains_key(name) {
                return Err(Error::UnknownAdapter { name: name.clone() });
            }
        }

        for name in config.custom_result_classes.values() {
            if !self.adapters.contains_key(name) {
                return Err(Error::UnknownAdapter { name: name.clone() });
            }
        }

        self.default_adapter = config.default_result_class;
        self.overrides = config.custom_result_classes;
        Ok(())
    }

    /// Select the adapter for a response shape. A convention match on the
    /// response name that is not registered falls through silently.
    pub fn select(&self, response_name: Option<&str>) -> &dyn ResultAdapter {
        if let Some(response_name) = response_name {
            if let Some(name) = self.overrides.get(response_name) {
                if let Some(adapter) = self.adapters.get(name) {
                    debug!(response = response_name, adapter = %name, "adapter override");
                    return adapter.as_ref();
                }
            }

            if let Some(adapter) = self.adapters.get(response_name) {
                debug!(response = response_name, "adapter by convention");
                return adapter.as_ref();
            }
        }

        if let Some(name) = &self.default_adapter {
            if let Some(adapter) = self.adapters.get(name) {
                return adapter.as_ref();
            }
        }

        &IDENTITY
    }
}
