use thiserror::Error;

use crate::wsdl;

/// Everything that can abort a call. A service-reported fault is not in
/// here: faults are ordinary outcomes carried in the result container.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Wsdl(#[from] wsdl::Error),

    #[error("no operation named '{operation}' in service description '{description}'")]
    UnknownOperation {
        description: String,
        operation: String,
    },

    #[error("no field named '{field}' on operation '{operation}'")]
    UnknownField { operation: String, field: String },

    #[error("invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("no adapter registered under '{name}'")]
    UnknownAdapter { name: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("error reading or writing request XML")]
    Xml(#[from] quick_xml::Error),
}
