#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod cell;
pub mod collaborator;
pub mod directive;
pub mod error;
pub mod format;
pub mod help;
mod kernel;
pub mod outfile;
mod output;
pub mod render;
pub mod request;
pub mod session;

pub use collaborator::{
    DiagramRenderer, FileStore, HttpResponse, LocalFileStore, LogControl, SparqlClient,
};
pub use error::{
    DiagramError, DirectiveError, EndpointError, KernelError, LogControlError, QueryError,
    RenderError, TransportError,
};
pub use kernel::Kernel;
pub use output::{CellEntry, CellOutput};
pub use render::{GraphDescription, Payload, RenderResult};
pub use request::OutboundRequest;
pub use session::{ImageFormat, LogLevel, Session};
