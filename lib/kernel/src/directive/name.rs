use std::fmt::{Display, Formatter};

/// Identifies one of the directives a cell can contain.
///
/// This is the static registry of the kernel: every variant knows its name, its argument syntax
/// and a short help text. The variants are ordered by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectiveName {
    Auth,
    Display,
    Endpoint,
    Format,
    Graph,
    Header,
    HttpHeader,
    Lang,
    Load,
    Log,
    LsMagics,
    Method,
    Outfile,
    Prefix,
    QParam,
    Show,
}

impl DirectiveName {
    /// All directives, ordered by name.
    pub const ALL: [DirectiveName; 16] = [
        Self::Auth,
        Self::Display,
        Self::Endpoint,
        Self::Format,
        Self::Graph,
        Self::Header,
        Self::HttpHeader,
        Self::Lang,
        Self::Load,
        Self::Log,
        Self::LsMagics,
        Self::Method,
        Self::Outfile,
        Self::Prefix,
        Self::QParam,
        Self::Show,
    ];

    /// Looks up a directive by its name without the leading `%`, ignoring the casing.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|directive| directive.name().eq_ignore_ascii_case(name))
    }

    /// The name without the leading `%`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Display => "display",
            Self::Endpoint => "endpoint",
            Self::Format => "format",
            Self::Graph => "graph",
            Self::Header => "header",
            Self::HttpHeader => "http_header",
            Self::Lang => "lang",
            Self::Load => "load",
            Self::Log => "log",
            Self::LsMagics => "lsmagics",
            Self::Method => "method",
            Self::Outfile => "outfile",
            Self::Prefix => "prefix",
            Self::QParam => "qparam",
            Self::Show => "show",
        }
    }

    /// The argument grammar.
    pub fn syntax(self) -> &'static str {
        match self {
            Self::Auth => "(basic|digest|none) <username> <passwd>",
            Self::Display => "raw | table [withtypes] | diagram [svg|png] [withliterals]",
            Self::Endpoint => "<url>",
            Self::Format => "JSON | N3 | XML | default | any | none",
            Self::Graph => "<uri>",
            Self::Header => "<string> | OFF",
            Self::HttpHeader => "<name> [<value>]",
            Self::Lang => "<lang> [...] | default | all",
            Self::Load => "<filename>",
            Self::Log => "critical | error | warning | info | debug",
            Self::LsMagics => "",
            Self::Method => "get | post",
            Self::Outfile => "<filename> | off",
            Self::Prefix => "<name> [<uri>]",
            Self::QParam => "<name> [<value>]",
            Self::Show => "<n> | all",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::Auth => {
                "send HTTP authentication (use env:<var> to get values from environment variables)"
            }
            Self::Display => "set display format",
            Self::Endpoint => "set SPARQL endpoint. **REQUIRED**",
            Self::Format => "set requested result format",
            Self::Graph => "set default graph for the queries",
            Self::Header => {
                "add a persistent SPARQL header line before all queries, or delete all defined headers"
            }
            Self::HttpHeader => "add (or delete) an arbitrary HTTP header to all queries",
            Self::Lang => "language(s) preferred for labels",
            Self::Load => "load a file with directive lines and process them",
            Self::Log => "set logging level",
            Self::LsMagics => "list all directives",
            Self::Method => "set HTTP method",
            Self::Outfile => {
                "save raw output to a file (use \"%d\" in name to add cell number, \"off\" to cancel saving)"
            }
            Self::Prefix => "set (or delete) a persistent URI prefix for all queries",
            Self::QParam => "add (or delete) a persistent custom parameter to all queries",
            Self::Show => "maximum number of shown results",
        }
    }

    /// Whether the directive only reads the session and produces a listing.
    pub fn is_listing(self) -> bool {
        matches!(self, Self::LsMagics)
    }
}

impl Display for DirectiveName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_sorted_and_complete() {
        let names: Vec<_> = DirectiveName::ALL.iter().map(|d| d.name()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        for directive in DirectiveName::ALL {
            assert_eq!(DirectiveName::from_name(directive.name()), Some(directive));
        }
    }

    #[test]
    fn lookup_ignores_case_only() {
        assert_eq!(
            DirectiveName::from_name("HTTP_Header"),
            Some(DirectiveName::HttpHeader)
        );
        assert_eq!(DirectiveName::from_name("%endpoint"), None);
        assert_eq!(DirectiveName::from_name("Endpoint"), Some(DirectiveName::Endpoint));
        assert_eq!(DirectiveName::from_name("endpoints"), None);
        assert_eq!(DirectiveName::from_name(""), None);
    }
}
