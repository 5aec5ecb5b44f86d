//! The narrow interfaces through which the kernel reaches the outside world.
//!
//! The kernel itself never opens a socket, spawns a process or touches the file system. Hosts
//! plug in implementations of these traits (see the `sparql-kernel-http` and
//! `sparql-kernel-graphviz` crates), and tests plug in fakes.

use crate::error::{DiagramError, LogControlError, TransportError};
use crate::render::GraphDescription;
use crate::request::OutboundRequest;
use crate::session::{ImageFormat, LogLevel};
use async_trait::async_trait;
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;

/// What the HTTP collaborator hands back for an executed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// The essence of the `Content-Type` header (e.g., `application/sparql-results+json`).
    pub mime_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends an [OutboundRequest] to a SPARQL endpoint.
///
/// Timeouts are the responsibility of the implementation and are reported as
/// [TransportError::Timeout].
#[async_trait]
pub trait SparqlClient: Debug + Send + Sync {
    async fn execute(&self, request: &OutboundRequest) -> Result<HttpResponse, TransportError>;
}

/// Turns a graph description into an image.
pub trait DiagramRenderer: Debug + Send + Sync {
    fn render(
        &self,
        graph: &GraphDescription,
        format: ImageFormat,
    ) -> Result<Vec<u8>, DiagramError>;
}

/// File access for `%load` and `%outfile`.
pub trait FileStore: Debug + Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Creates or truncates the file at `path`.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// A [FileStore] backed by the local file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileStore;

impl FileStore for LocalFileStore {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }
}

/// Changes the verbosity of the host's log output when `%log` is applied.
pub trait LogControl: Debug + Send + Sync {
    fn set_level(&self, level: LogLevel) -> Result<(), LogControlError>;
}
