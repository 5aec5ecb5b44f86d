//! Turns the body of a successful response into something that can be shown.

mod diagram;
mod table;

pub use diagram::{
    select_label, DiagramOptions, GraphDescription, GraphEdge, GraphNode, NodeKind,
    LABEL_PREDICATES,
};
pub use table::{ResultTable, TableCell, TableOptions};

use crate::collaborator::DiagramRenderer;
use crate::error::RenderError;
use crate::format::{mime_essence, ResultFormat};
use crate::session::{DisplayShape, ImageFormat, Session};
use oxrdf::Triple;
use oxrdfio::{RdfFormat, RdfParseError, RdfParser};
use sparesults::{
    QueryResultsFormat, QueryResultsParseError, QueryResultsParser,
    ReaderQueryResultsParserOutput,
};
use std::fmt::{Display, Formatter};
use tracing::warn;

/// What a cell shows for a query result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderResult {
    /// The shape that was actually used. May differ from the requested one after a fallback.
    pub shape: DisplayShape,
    pub payload: Payload,
    /// Whether rows were left out because of the show limit.
    pub truncated: bool,
    /// Explains a fallback to the raw shape.
    pub notice: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// The body as returned by the endpoint.
    Raw {
        body: String,
        mime_type: Option<String>,
    },
    Table(ResultTable),
    /// The answer of an `ASK` query.
    Boolean(bool),
    Diagram {
        graph: GraphDescription,
        image_format: ImageFormat,
        image: Vec<u8>,
    },
    /// A diagram was requested for a graph without triples.
    EmptyGraph,
}

/// Renders `body` according to the display settings of `session`.
///
/// Table and diagram shapes fall back to the raw shape when the MIME type is not supported, when
/// the body cannot be parsed or when the diagram collaborator fails. Only a body that is not
/// valid UTF-8 and cannot be shown raw is an error.
pub fn render(
    body: &[u8],
    mime_type: Option<&str>,
    session: &Session,
    diagrams: &dyn DiagramRenderer,
) -> Result<RenderResult, RenderError> {
    let format = mime_type.and_then(ResultFormat::from_mime_type);
    let rendered = match (session.display(), format) {
        (DisplayShape::Raw, _) => return raw(body, mime_type, None),
        (DisplayShape::Table { with_types }, Some(format)) => {
            let options = TableOptions {
                with_types,
                limit: session.show_limit().get(),
                languages: session.language_preference(),
            };
            render_table(body, mime_type, format, &options)
        }
        (
            DisplayShape::Diagram {
                image_format,
                with_literals,
            },
            Some(ResultFormat::N3),
        ) => {
            let options = DiagramOptions {
                with_literals,
                languages: session.language_preference(),
                prefixes: session.prefixes(),
            };
            render_diagram(body, mime_type, image_format, &options, diagrams)
        }
        (requested, _) => {
            warn!(
                "Cannot display a response of type {} as {requested}, showing it raw",
                mime_type.unwrap_or("unknown")
            );
            return raw(body, mime_type, None);
        }
    };

    match rendered {
        Ok(mut result) => {
            result.shape = session.display();
            Ok(result)
        }
        Err(notice) => {
            warn!("{notice}");
            raw(body, mime_type, Some(notice))
        }
    }
}

/// Parses a graph serialization into its triples. Named graphs are merged.
pub fn parse_graph(body: &[u8], mime_type: &str) -> Result<Vec<Triple>, RdfParseError> {
    let format = match mime_essence(mime_type).as_deref() {
        Some("text/rdf+n3" | "text/n3") => RdfFormat::N3,
        Some("application/n-triples") => RdfFormat::NTriples,
        Some("application/rdf+xml" | "text/rdf") => RdfFormat::RdfXml,
        _ => RdfFormat::Turtle,
    };
    RdfParser::from_format(format)
        .for_reader(body)
        .map(|quad| quad.map(Triple::from))
        .collect()
}

fn raw(
    body: &[u8],
    mime_type: Option<&str>,
    notice: Option<String>,
) -> Result<RenderResult, RenderError> {
    let text = String::from_utf8(body.to_vec()).map_err(|_| RenderError::NotText {
        mime_type: mime_type.unwrap_or("unknown").to_owned(),
    })?;
    Ok(RenderResult {
        shape: DisplayShape::Raw,
        payload: Payload::Raw {
            body: text,
            mime_type: mime_type.map(str::to_owned),
        },
        truncated: false,
        notice,
    })
}

fn render_table(
    body: &[u8],
    mime_type: Option<&str>,
    format: ResultFormat,
    options: &TableOptions<'_>,
) -> Result<RenderResult, String> {
    let payload = match format {
        ResultFormat::Json | ResultFormat::Xml => {
            let results_format = if format == ResultFormat::Json {
                QueryResultsFormat::Json
            } else {
                QueryResultsFormat::Xml
            };
            let parse = || -> Result<Payload, QueryResultsParseError> {
                Ok(
                    match QueryResultsParser::from_format(results_format).for_reader(body)? {
                        ReaderQueryResultsParserOutput::Solutions(solutions) => {
                            Payload::Table(ResultTable::from_solutions(solutions, options)?)
                        }
                        ReaderQueryResultsParserOutput::Boolean(value) => Payload::Boolean(value),
                    },
                )
            };
            parse().map_err(|e| unparsable(format, &e))?
        }
        ResultFormat::N3 => {
            let triples = parse_graph(body, mime_type.unwrap_or_default())
                .map_err(|e| unparsable(format, &e))?;
            Payload::Table(ResultTable::from_triples(&triples, options))
        }
    };

    let truncated = matches!(&payload, Payload::Table(table) if table.is_truncated());
    Ok(RenderResult {
        shape: DisplayShape::Raw,
        payload,
        truncated,
        notice: None,
    })
}

fn render_diagram(
    body: &[u8],
    mime_type: Option<&str>,
    image_format: ImageFormat,
    options: &DiagramOptions<'_>,
    diagrams: &dyn DiagramRenderer,
) -> Result<RenderResult, String> {
    let triples = parse_graph(body, mime_type.unwrap_or_default())
        .map_err(|e| unparsable(ResultFormat::N3, &e))?;
    let graph = GraphDescription::from_triples(&triples, options);
    let payload = if graph.is_empty() {
        Payload::EmptyGraph
    } else {
        let image = diagrams
            .render(&graph, image_format)
            .map_err(|e| e.to_string())?;
        Payload::Diagram {
            graph,
            image_format,
            image,
        }
    };
    Ok(RenderResult {
        shape: DisplayShape::Raw,
        payload,
        truncated: false,
        notice: None,
    })
}

fn unparsable(format: ResultFormat, error: &dyn Display) -> String {
    format!("Cannot parse the response as {format}, showing it raw: {error}")
}

impl Display for RenderResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(notice) = &self.notice {
            writeln!(f, "{notice}")?;
        }
        match &self.payload {
            Payload::Raw { body, .. } => f.write_str(body),
            Payload::Table(table) => write!(f, "{table}"),
            Payload::Boolean(value) => write!(f, "Result: {value}"),
            Payload::Diagram {
                image_format: ImageFormat::Svg,
                image,
                ..
            } => f.write_str(&String::from_utf8_lossy(image)),
            Payload::Diagram {
                graph,
                image_format: ImageFormat::Png,
                image,
            } => write!(
                f,
                "[PNG diagram of {} nodes and {} edges, {} bytes]",
                graph.nodes.len(),
                graph.edges.len(),
                image.len()
            ),
            Payload::EmptyGraph => f.write_str("Empty graph: the result contains no triples"),
        }
    }
}
