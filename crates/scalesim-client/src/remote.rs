//! HTTP simulator client.
//!
//! Opens a fresh HTTP/1 connection per run and POSTs the request body to
//! the simulator's `/simulate` endpoint.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Uri};
use http_body_util::{BodyExt, Full, Limited};
use tracing::debug;

use scalesim_core::{SimulationRequest, SimulationTick, decode_ticks};

use crate::error::{SimulationError, SimulationResult};
use crate::{BoxFuture, Simulator};

/// Maximum number of response bytes echoed back in a status error.
const ERROR_BODY_LIMIT: usize = 512;

/// Default cap on a simulator response body.
pub const DEFAULT_RESPONSE_LIMIT: usize = 64 * 1024 * 1024;

/// Simulator reached over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpSimulator {
    /// `host:port` to connect to.
    address: String,
    /// Value of the `Host` header.
    host: String,
    /// Origin-form request target, e.g. `/simulate`.
    path: String,
    /// Largest response body accepted, in bytes.
    response_limit: usize,
}

impl HttpSimulator {
    /// Create a client for the simulator at `base_url` (e.g.
    /// `http://127.0.0.1:5000`). Any path on the base is kept as a prefix.
    pub fn new(base_url: &str) -> SimulationResult<Self> {
        let invalid = |reason: String| SimulationError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let uri: Uri = base_url
            .trim()
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;

        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => return Err(invalid(format!("unsupported scheme {other:?}"))),
            None => return Err(invalid("missing scheme".to_string())),
        }

        let authority = uri
            .authority()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        let port = authority.port_u16().unwrap_or(80);
        let prefix = uri.path().trim_end_matches('/');

        Ok(Self {
            address: format!("{}:{port}", authority.host()),
            host: authority.as_str().to_string(),
            path: format!("{prefix}/simulate"),
            response_limit: DEFAULT_RESPONSE_LIMIT,
        })
    }

    pub fn with_response_limit(mut self, bytes: usize) -> Self {
        self.response_limit = bytes;
        self
    }

    /// Full URL of the simulate endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.host, self.path)
    }

    async fn simulate(&self, request: &SimulationRequest) -> SimulationResult<Vec<SimulationTick>> {
        let payload = serde_json::to_vec(request)?;

        let stream = tokio::net::TcpStream::connect(&self.address)
            .await
            .map_err(|source| SimulationError::Connect {
                address: self.address.clone(),
                source,
            })?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(SimulationError::Handshake)?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "simulator connection closed with error");
            }
        });

        let req = http::Request::builder()
            .method(Method::POST)
            .uri(self.path.as_str())
            .header(HOST, self.host.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, "scalesim/0.1")
            .body(Full::new(Bytes::from(payload)))?;

        debug!(endpoint = %self.endpoint(), "posting simulation request");

        let resp = sender
            .send_request(req)
            .await
            .map_err(SimulationError::Request)?;
        let status = resp.status();
        let body = Limited::new(resp.into_body(), self.response_limit)
            .collect()
            .await
            .map_err(SimulationError::Body)?
            .to_bytes();

        if !status.is_success() {
            let shown = &body[..body.len().min(ERROR_BODY_LIMIT)];
            return Err(SimulationError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(shown).into_owned(),
            });
        }

        let ticks = decode_ticks(&body)?;
        debug!(ticks = ticks.len(), bytes = body.len(), "simulation response decoded");
        Ok(ticks)
    }
}

impl Simulator for HttpSimulator {
    fn run<'a>(
        &'a self,
        request: &'a SimulationRequest,
    ) -> BoxFuture<'a, SimulationResult<Vec<SimulationTick>>> {
        Box::pin(self.simulate(request))
    }
}
