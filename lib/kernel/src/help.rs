//! Completion and help texts for directives and SPARQL keywords.

use crate::directive::DirectiveName;
use itertools::Itertools;

/// SPARQL keywords offered for completion.
pub const SPARQL_KEYWORDS: [&str; 48] = [
    "SELECT",
    "CONSTRUCT",
    "ASK",
    "DESCRIBE",
    "BASE",
    "PREFIX",
    "FROM",
    "LIMIT",
    "OFFSET",
    "WHERE",
    "FILTER",
    "OPTIONAL",
    "NOT",
    "EXISTS",
    "UNION",
    "MINUS",
    "GROUP BY",
    "VALUES",
    "UNDEF",
    "BIND",
    "AS",
    "DISTINCT",
    "REDUCED",
    "HAVING",
    "FROM NAMED",
    "GRAPH",
    "ORDER BY",
    "ASC",
    "DESC",
    "COUNT",
    "SUM",
    "MIN",
    "MAX",
    "AVG",
    "GROUP_CONCAT",
    "SAMPLE",
    "LOAD",
    "CLEAR",
    "DROP",
    "CREATE",
    "ADD",
    "MOVE",
    "COPY",
    "SILENT",
    "INSERT",
    "DELETE",
    "SERVICE",
    "WITH",
];

/// SPARQL built-in functions offered for completion.
pub const SPARQL_OPERATORS: [&str; 10] = [
    "bound",
    "isIRI",
    "isBlank",
    "isLiteral",
    "str",
    "lang",
    "datatype",
    "sameTerm",
    "langMatches",
    "regex",
];

/// The answer to a completion request. Offsets count characters, not bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub matches: Vec<String>,
    pub cursor_start: usize,
    pub cursor_end: usize,
}

/// Lists all directives: first their names, then one line per directive with its syntax and
/// help text.
pub fn directive_listing() -> String {
    let names = DirectiveName::ALL.iter().join(" ");
    let summaries = DirectiveName::ALL
        .into_iter()
        .map(directive_summary)
        .join("\n");
    format!("Available directives:\n{names}\n\n{summaries}")
}

/// Completes the token under `cursor`.
///
/// A token that starts with `%` at the beginning of a line completes to directive names, any other
/// token to SPARQL keywords and functions. Matching ignores the casing. Returns [None] if nothing
/// matches.
pub fn complete(code: &str, cursor: usize) -> Option<Completion> {
    let token = Token::at(code, cursor);
    let prefix = token.text.to_lowercase();
    let matches: Vec<String> = if token.is_directive {
        DirectiveName::ALL
            .iter()
            .map(ToString::to_string)
            .filter(|name| name.starts_with(&prefix))
            .collect()
    } else {
        SPARQL_KEYWORDS
            .iter()
            .chain(&SPARQL_OPERATORS)
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .map(|name| (*name).to_owned())
            .collect()
    };

    if matches.is_empty() {
        return None;
    }
    Some(Completion {
        matches,
        cursor_start: token.start,
        cursor_end: token.start + token.text.chars().count(),
    })
}

/// Returns the help text for the token under `cursor`.
///
/// A lone `%` at the beginning of a line yields the directive listing.
pub fn inspect(code: &str, cursor: usize) -> Option<String> {
    let token = Token::at(code, cursor);
    if !token.is_directive {
        return sparql_help(&token.text).map(str::to_owned);
    }
    if token.text == "%" {
        return Some(directive_listing());
    }
    let name = token.text.strip_prefix('%').unwrap_or(&token.text);
    DirectiveName::from_name(name).map(|directive| {
        format!(
            "{directive} {}\n\n{}",
            directive.syntax(),
            directive.help()
        )
    })
}

fn directive_summary(directive: DirectiveName) -> String {
    if directive.syntax().is_empty() {
        format!("{directive} : {}", directive.help())
    } else {
        format!("{directive} {} : {}", directive.syntax(), directive.help())
    }
}

fn sparql_help(keyword: &str) -> Option<&'static str> {
    Some(match keyword.to_ascii_uppercase().as_str() {
        "SELECT" => {
            "Returns all, or a subset of, the variables bound in a query pattern match.\n\n\
             SELECT [DISTINCT | REDUCED] ( ?var | $var | * )\n\
             [FROM iri | FROM NAMED iri ]\n\
             WHERE {\n  TriplesBlock? ( ( GraphPatternNotTriples | Filter ) '.'? TriplesBlock? )*\n}\n\
             ORDER BY OrderCondition\n\
             LIMIT integer\n\
             OFFSET integer"
        }
        "CONSTRUCT" => {
            "Returns an RDF graph constructed by substituting variables in a set of triple templates."
        }
        "ASK" => "Returns a boolean indicating whether a query pattern matches or not.",
        "DESCRIBE" => {
            "Returns an RDF graph that describes the resources found.\n\n\
             DESCRIBE ( VarOrIRIref+ | '*' )\n\
             DatasetClause* WhereClause? SolutionModifier"
        }
        _ => return None,
    })
}

/// The word under the cursor, possibly preceded by `%`.
struct Token {
    text: String,
    /// Character offset of the first character.
    start: usize,
    /// Whether the token starts with `%` at the beginning of a line.
    is_directive: bool,
}

impl Token {
    fn at(code: &str, cursor: usize) -> Self {
        let chars: Vec<char> = code.chars().collect();
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let cursor = cursor.min(chars.len());

        let mut end = cursor;
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }
        let mut start = cursor;
        while start > 0 && is_word(chars[start - 1]) {
            start -= 1;
        }
        if start > 0 && chars[start - 1] == '%' {
            start -= 1;
        }

        let is_directive =
            chars.get(start) == Some(&'%') && (start == 0 || chars[start - 1] == '\n');
        Self {
            text: chars[start..end].iter().collect(),
            start,
            is_directive,
        }
    }
}
