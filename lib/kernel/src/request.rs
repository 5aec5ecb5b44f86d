//! Assembles the request that is sent to the endpoint from the session and a query body.

use crate::error::QueryError;
use crate::format::ResultFormat;
use crate::session::{Credentials, HttpHeaders, HttpMethod, RequestFormat, Session, SettingMap};
use itertools::Itertools;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;
use tracing::debug;

/// The query parameters that carry the negotiated format. Endpoints differ in which one they
/// honour, so all of them are sent.
pub const FORMAT_PARAMETERS: [&str; 3] = ["format", "output", "results"];

/// The operation of a SPARQL query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryForm {
    Select,
    Construct,
    Describe,
    Ask,
}

impl QueryForm {
    /// Finds the first query form keyword of `query`.
    ///
    /// This is not a SPARQL parser. It only skips the tokens that could contain a keyword by
    /// accident (IRIs, strings, comments, variables and prefixed names).
    pub fn detect(query: &str) -> Option<Self> {
        static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r#"(?x)
                \#[^\n]*
                | <[^<>"{}|^`\\\s]*>
                | "(?:[^"\\]|\\.)*"
                | '(?:[^'\\]|\\.)*'
                | [?$]\w+
                | [A-Za-z_][\w-]*(?::[\w.\-]*)?
                "#,
            )
            .unwrap()
        });

        TOKEN.find_iter(query).find_map(|token| {
            let token = token.as_str();
            if token.eq_ignore_ascii_case("select") {
                Some(Self::Select)
            } else if token.eq_ignore_ascii_case("construct") {
                Some(Self::Construct)
            } else if token.eq_ignore_ascii_case("describe") {
                Some(Self::Describe)
            } else if token.eq_ignore_ascii_case("ask") {
                Some(Self::Ask)
            } else {
                None
            }
        })
    }
}

/// The result format that is asked from the endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Negotiation {
    /// A single format, requested with query parameters and an `Accept` header.
    Format(ResultFormat),
    /// Any supported format, requested with an `Accept` header only.
    Any,
    /// Nothing is requested automatically.
    None,
}

impl Negotiation {
    /// Resolves the session's request format for a query body. [RequestFormat::Default] infers
    /// the format from the query form.
    pub fn resolve(requested: RequestFormat, query: &str) -> Self {
        match requested {
            RequestFormat::Json => Self::Format(ResultFormat::Json),
            RequestFormat::Xml => Self::Format(ResultFormat::Xml),
            RequestFormat::N3 => Self::Format(ResultFormat::N3),
            RequestFormat::Any => Self::Any,
            RequestFormat::None => Self::None,
            RequestFormat::Default => match QueryForm::detect(query) {
                Some(QueryForm::Select) => Self::Format(ResultFormat::Json),
                Some(QueryForm::Construct | QueryForm::Describe) => {
                    Self::Format(ResultFormat::N3)
                }
                Some(QueryForm::Ask) | None => Self::Any,
            },
        }
    }

    /// The value of the automatic `Accept` header.
    pub fn accept(self) -> Option<String> {
        match self {
            Self::Format(format) => Some(format.mime_types().join(", ")),
            Self::Any => Some(
                ResultFormat::ALL
                    .into_iter()
                    .map(ResultFormat::primary_mime_type)
                    .join(", "),
            ),
            Self::None => None,
        }
    }
}

impl Display for Negotiation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(format) => format.fmt(f),
            Self::Any => f.write_str("ANY"),
            Self::None => f.write_str("NONE"),
        }
    }
}

/// Everything the HTTP collaborator needs to execute a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundRequest {
    pub endpoint: String,
    pub method: HttpMethod,
    /// The final query text, including session headers, prefixes and the default graph.
    pub query: String,
    pub headers: HttpHeaders,
    pub parameters: BTreeMap<String, String>,
    pub credentials: Option<Credentials>,
    pub negotiation: Negotiation,
}

/// Builds the request for `body` from the current session.
///
/// Fails with [QueryError::Configuration] if no endpoint is set.
pub fn build_request(session: &Session, body: &str) -> Result<OutboundRequest, QueryError> {
    let endpoint = session.endpoint().ok_or(QueryError::Configuration)?;

    let mut lines: Vec<String> = session.header_lines().to_vec();
    lines.extend(
        session
            .prefixes()
            .iter()
            .map(|(name, iri)| format!("PREFIX {name}: <{iri}>")),
    );
    if let Some(graph) = session.default_graph() {
        lines.push(format!("FROM <{graph}>"));
    }
    lines.push(body.to_owned());
    let query = lines.join("\n");

    let negotiation = Negotiation::resolve(session.request_format(), body);
    debug!("Negotiated result format {negotiation} for query:\n{query}");

    let mut parameters = BTreeMap::new();
    if let Negotiation::Format(format) = negotiation {
        for name in FORMAT_PARAMETERS {
            parameters.insert(name.to_owned(), format.parameter_value().to_owned());
        }
    }
    parameters.extend(
        session
            .query_params()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );

    let mut headers = HttpHeaders::new();
    if let Some(accept) = negotiation.accept() {
        headers.set("Accept", &accept);
    }
    for (name, value) in session.http_headers().iter() {
        headers.set(name, value);
    }

    Ok(OutboundRequest {
        endpoint: endpoint.to_owned(),
        method: session.method(),
        query,
        headers,
        parameters,
        credentials: session.auth().cloned(),
        negotiation,
    })
}
