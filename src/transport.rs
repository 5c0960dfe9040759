//! The transport seam.
//!
//! The core never performs network I/O itself: it hands a URI, headers,
//! body and credentials to a [`Transport`] and gets raw bytes plus
//! diagnostics back. Errors pass through opaque and are never retried.

use tracing::debug;

/// Status information gathered during one exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Authentication scheme plus credentials for the exchange.
#[derive(Debug, Clone, Default)]
pub enum Auth {
    #[default]
    None,
    Basic {
        user: String,
        password: String,
    },
    Ntlm {
        user: String,
        password: String,
    },
}

pub struct TransportReply {
    pub bytes: Vec<u8>,
    pub diagnostics: Diagnostics,
    pub error: Option<String>,
}

pub trait Transport: Send + Sync {
    fn send(
        &self,
        uri: &str,
        headers: &[(String, String)],
        body: &[u8],
        auth: &Auth,
    ) -> TransportReply;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        uri: &str,
        headers: &[(String, String)],
        body: &[u8],
        auth: &Auth,
    ) -> TransportReply {
        let mut request = self.client.post(uri).body(body.to_vec());

        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        request = match auth {
            Auth::None => request,
            // reqwest has no NTLM support; NTLM credentials degrade to
            // basic on the wire.
            Auth::Basic { user, password } | Auth::Ntlm { user, password } => {
                request.basic_auth(user, Some(password))
            }
        };

        match request.send() {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(uri, status, "exchange completed");

                match response.bytes() {
                    Ok(bytes) => TransportReply {
                        bytes: bytes.to_vec(),
                        diagnostics: Diagnostics {
                            status: Some(status),
                            error: None,
                        },
                        error: None,
                    },
                    Err(err) => failed(err.to_string(), Some(status)),
                }
            }

            Err(err) => {
                let status = err.status().map(|status| status.as_u16());
                failed(err.to_string(), status)
            }
        }
    }
}

fn failed(error: String, status: Option<u16>) -> TransportReply {
    TransportReply {
        bytes: Vec::new(),
        diagnostics: Diagnostics {
            status,
            error: Some(error.clone()),
        },
        error: Some(error),
    }
}
