use mediatype::MediaType;
use std::fmt::{Display, Formatter};

/// A result serialization that the kernel can negotiate and render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultFormat {
    /// SPARQL query results in JSON.
    Json,
    /// SPARQL query results in XML.
    Xml,
    /// RDF graphs. Any of the RDF syntaxes in [ResultFormat::mime_types] is accepted.
    N3,
}

impl ResultFormat {
    pub const ALL: [ResultFormat; 3] = [Self::Json, Self::Xml, Self::N3];

    /// The value of the `format`, `output` and `results` query parameters.
    pub fn parameter_value(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::N3 => "n3",
        }
    }

    /// The MIME types of this format. The first one is the preferred one.
    pub fn mime_types(self) -> &'static [&'static str] {
        match self {
            Self::Json => &[
                "application/sparql-results+json",
                "application/json",
                "text/javascript",
                "application/javascript",
            ],
            Self::Xml => &[
                "application/sparql-results+xml",
                "application/xml",
                "text/xml",
            ],
            Self::N3 => &[
                "text/rdf+n3",
                "text/n3",
                "text/turtle",
                "application/x-turtle",
                "application/turtle",
                "application/n-triples",
                "application/rdf+xml",
                "text/rdf",
            ],
        }
    }

    pub fn primary_mime_type(self) -> &'static str {
        self.mime_types()[0]
    }

    /// Finds the format a MIME type belongs to. Parameters such as `charset` are ignored.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let essence = mime_essence(mime_type)?;
        Self::ALL
            .into_iter()
            .find(|format| format.mime_types().contains(&essence.as_str()))
    }
}

impl Display for ResultFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
            Self::N3 => "N3",
        })
    }
}

/// Reduces a `Content-Type` value to its lower-cased essence, e.g.
/// `Application/JSON; charset=utf-8` to `application/json`.
///
/// Returns [None] if the value is not a media type.
pub fn mime_essence(content_type: &str) -> Option<String> {
    MediaType::parse(content_type.trim())
        .ok()
        .map(|media_type| media_type.essence().to_string().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn essence_strips_parameters() {
        assert_eq!(
            mime_essence("Application/SPARQL-Results+JSON; charset=UTF-8").as_deref(),
            Some("application/sparql-results+json")
        );
        assert_eq!(mime_essence("not a mime type"), None);
    }

    #[test]
    fn families() {
        assert_eq!(
            ResultFormat::from_mime_type("text/turtle;charset=utf-8"),
            Some(ResultFormat::N3)
        );
        assert_eq!(
            ResultFormat::from_mime_type("text/xml"),
            Some(ResultFormat::Xml)
        );
        assert_eq!(
            ResultFormat::from_mime_type("text/javascript"),
            Some(ResultFormat::Json)
        );
        assert_eq!(ResultFormat::from_mime_type("text/html"), None);
    }
}
