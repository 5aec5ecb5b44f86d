use crate::directive::DirectiveName;
use crate::session::AuthScheme;
use regex::Regex;
use std::io;
use std::path::PathBuf;
use std::sync::LazyLock;

/// An error raised while applying a directive line.
///
/// Directive errors are isolated: a failing line never prevents the remaining lines of a cell
/// from being applied, and never undoes lines that were applied before it.
#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    /// No directive with this name exists.
    #[error("line {line}: unknown directive '%{name}'")]
    UnknownDirective { name: String, line: usize },
    /// The arguments do not match the grammar of the directive. The session is left unchanged.
    #[error("line {line}: invalid argument for {directive} '{argument}': {reason}")]
    InvalidArgument {
        directive: DirectiveName,
        argument: String,
        reason: String,
        line: usize,
    },
    /// A directives file could not be read.
    #[error("cannot read directives file '{}': {source}", .path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Directive files load each other too deeply (or in a cycle).
    #[error("maximum nesting depth of directive files ({0}) exceeded")]
    RecursionLimit(usize),
    /// `%log` was valid but the host could not apply the new level.
    #[error(transparent)]
    LogControl(#[from] LogControlError),
}

/// An error raised while executing the query of a cell.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A query was attempted without an endpoint.
    #[error("no endpoint defined, set one with %endpoint <url>")]
    Configuration,
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error(transparent)]
    Render(#[from] RenderError),
    /// The raw response could not be written to the `%outfile` target.
    #[error("cannot write output file '{}': {source}", .path.display())]
    Outfile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The endpoint could not produce a successful response.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The endpoint answered with a non-2xx status.
    #[error("HTTP error {status}: {detail}")]
    Status { status: u16, detail: String },
    /// No response was obtained at all.
    #[error("SPARQL endpoint request failed: {0}")]
    Transport(#[from] TransportError),
}

impl EndpointError {
    /// Creates an [EndpointError::Status] from a failed response. HTML error pages are reduced to
    /// their text content.
    pub fn from_status(status: u16, mime_type: Option<&str>, body: &[u8]) -> Self {
        static STYLE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"(?s)<style[^>]*>.*?</style>").unwrap());
        static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
        static NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

        let text = String::from_utf8_lossy(body);
        let detail = if mime_type.is_some_and(|m| m.starts_with("text/html")) {
            let text = STYLE.replace_all(&text, "");
            let text = TAG.replace_all(&text, "");
            NEWLINES.replace_all(&text, "\n").trim().to_owned()
        } else {
            text.trim().to_owned()
        };
        Self::Status { status, detail }
    }
}

/// A failure reported by the HTTP collaborator before any response was obtained.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("the {0} authentication scheme is not supported by this client")]
    UnsupportedAuth(AuthScheme),
    #[error("{0}")]
    Failed(String),
}

/// A response could not be rendered in the requested way.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The body could neither be parsed nor shown as text.
    #[error("response body of type {mime_type} is not valid UTF-8 and cannot be shown")]
    NotText { mime_type: String },
}

/// The diagram collaborator failed to produce an image.
#[derive(Debug, thiserror::Error)]
#[error("diagram rendering failed: {0}")]
pub struct DiagramError(pub String);

/// The log control collaborator rejected a new verbosity.
#[derive(Debug, thiserror::Error)]
#[error("cannot change log level: {0}")]
pub struct LogControlError(pub String);

/// Any error that is shown as the output of a cell.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error(transparent)]
    Directive(#[from] DirectiveError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_error_pages_are_cleaned() {
        let body = b"<html><style>body { color: red }</style><body><h1>Bad Request</h1>\n\n\n<p>Parse error</p></body></html>";
        let error = EndpointError::from_status(400, Some("text/html"), body);
        assert_eq!(error.to_string(), "HTTP error 400: Bad Request\nParse error");
    }

    #[test]
    fn plain_error_bodies_are_kept() {
        let error = EndpointError::from_status(500, Some("text/plain"), b" boom \n");
        assert_eq!(error.to_string(), "HTTP error 500: boom");
    }
}
