//! The state that directives accumulate across otherwise independent cells.

mod settings;

pub(crate) use settings::split_word;
pub use settings::{edit_setting, HttpHeaders, SettingEdit, SettingMap};

use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::num::NonZeroUsize;

/// The result serialization that is requested from the endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RequestFormat {
    /// SPARQL query results in JSON.
    Json,
    /// SPARQL query results in XML.
    Xml,
    /// RDF graphs in N3/Turtle.
    N3,
    /// Accept any of the supported formats.
    Any,
    /// Infer the format from the query form.
    #[default]
    Default,
    /// Do not negotiate a format. The user supplies query parameters or headers instead.
    None,
}

impl RequestFormat {
    /// Parses a format name, ignoring the casing.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "JSON" => Self::Json,
            "XML" => Self::Xml,
            "N3" => Self::N3,
            "ANY" => Self::Any,
            "DEFAULT" => Self::Default,
            "NONE" => Self::None,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
            Self::N3 => "N3",
            Self::Any => "ANY",
            Self::Default => "DEFAULT",
            Self::None => "NONE",
        }
    }
}

impl Display for RequestFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The image format that diagrams are rendered to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    /// The name of the format, as used by the `%display` directive and Graphviz.
    pub fn name(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
        }
    }
}

/// How query results are shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayShape {
    /// The response body as returned by the endpoint.
    Raw,
    /// A table of bindings or triples.
    Table {
        /// Adds a column with the type of each value.
        with_types: bool,
    },
    /// A node-link diagram of a graph result.
    Diagram {
        image_format: ImageFormat,
        /// Draws literal values as nodes of their own.
        with_literals: bool,
    },
}

impl Default for DisplayShape {
    fn default() -> Self {
        Self::Table { with_types: false }
    }
}

impl Display for DisplayShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Table { with_types } => {
                f.write_str("table")?;
                if *with_types {
                    f.write_str(" withtypes")?;
                }
                Ok(())
            }
            Self::Diagram {
                image_format,
                with_literals,
            } => {
                write!(f, "diagram {}", image_format.name())?;
                if *with_literals {
                    f.write_str(" withliterals")?;
                }
                Ok(())
            }
        }
    }
}

/// The maximum number of result rows that are shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShowLimit {
    Limited(NonZeroUsize),
    Unbounded,
}

impl ShowLimit {
    pub const DEFAULT: ShowLimit = match NonZeroUsize::new(20) {
        Some(limit) => ShowLimit::Limited(limit),
        None => ShowLimit::Unbounded,
    };

    /// Returns the limit as a number, or [None] if all rows are shown.
    pub fn get(self) -> Option<usize> {
        match self {
            Self::Limited(limit) => Some(limit.get()),
            Self::Unbounded => None,
        }
    }
}

impl Default for ShowLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for ShowLimit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limited(limit) => write!(f, "{limit}"),
            Self::Unbounded => f.write_str("unlimited"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    Basic,
    Digest,
}

impl Display for AuthScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::Digest => "digest",
        })
    }
}

/// HTTP credentials that are attached to every request.
///
/// The password never appears in the [Debug] output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub scheme: AuthScheme,
    pub user: String,
    pub password: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("scheme", &self.scheme)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Verbosity of the kernel's log output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "error" => Self::Error,
            "warning" | "warn" => Self::Warning,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => return None,
        })
    }

    /// The closest [tracing::Level]. `tracing` has no critical level, so it maps to
    /// [tracing::Level::ERROR].
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            Self::Critical | Self::Error => tracing::Level::ERROR,
            Self::Warning => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        })
    }
}

/// The configuration of one kernel instance.
///
/// A session lives as long as its kernel. Only directive handlers write to it; executing a query
/// merely increments the cell counter.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub(crate) endpoint: Option<String>,
    pub(crate) request_format: RequestFormat,
    pub(crate) display: DisplayShape,
    pub(crate) show_limit: ShowLimit,
    pub(crate) language_preference: Vec<String>,
    pub(crate) prefixes: BTreeMap<String, String>,
    pub(crate) default_graph: Option<String>,
    pub(crate) header_lines: Vec<String>,
    pub(crate) http_headers: HttpHeaders,
    pub(crate) query_params: BTreeMap<String, String>,
    pub(crate) auth: Option<Credentials>,
    pub(crate) outfile_template: Option<String>,
    pub(crate) method: HttpMethod,
    pub(crate) log_level: Option<LogLevel>,
    pub(crate) cell_counter: u64,
}

impl Session {
    /// Creates a session with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn request_format(&self) -> RequestFormat {
        self.request_format
    }

    pub fn display(&self) -> DisplayShape {
        self.display
    }

    pub fn show_limit(&self) -> ShowLimit {
        self.show_limit
    }

    /// Preferred label languages. The order is significant: the first match wins.
    pub fn language_preference(&self) -> &[String] {
        &self.language_preference
    }

    /// The prefixes that are declared in front of every query, keyed by prefix name.
    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    pub fn default_graph(&self) -> Option<&str> {
        self.default_graph.as_deref()
    }

    /// Lines that are prepended verbatim to every query.
    pub fn header_lines(&self) -> &[String] {
        &self.header_lines
    }

    pub fn http_headers(&self) -> &HttpHeaders {
        &self.http_headers
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    pub fn auth(&self) -> Option<&Credentials> {
        self.auth.as_ref()
    }

    pub fn outfile_template(&self) -> Option<&str> {
        self.outfile_template.as_deref()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    /// The number of queries that obtained a response so far.
    pub fn cell_counter(&self) -> u64 {
        self.cell_counter
    }
}
