//! Splits the text of a cell into directive lines and a query body.

/// A directive line of a cell, e.g. `%prefix foaf http://xmlns.com/foaf/0.1/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveInvocation {
    /// The name without the leading `%`, as written by the user.
    pub name: String,
    /// The raw text after the name, trimmed.
    pub arguments: String,
    /// The 1-based line number within the cell (or directives file).
    pub line: usize,
}

impl DirectiveInvocation {
    /// Parses a line of the form `%<name> <rest-of-line>`. The name ends at the first whitespace.
    ///
    /// The caller guarantees that `text` starts with `%` once leading whitespace is removed.
    pub fn parse(text: &str, line: usize) -> Self {
        let text = text.trim();
        let text = text.strip_prefix('%').unwrap_or(text);
        let (name, arguments) = match text.find(char::is_whitespace) {
            Some(i) => (&text[..i], text[i..].trim()),
            None => (text, ""),
        };
        Self {
            name: name.to_owned(),
            arguments: arguments.to_owned(),
            line,
        }
    }
}

/// The classified content of a cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedCell {
    /// The directive lines in the order they appear.
    pub directives: Vec<DirectiveInvocation>,
    /// The query text. Empty if the cell only holds directives and comments.
    pub query: String,
}

impl ParsedCell {
    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }
}

/// Returns whether `line` is blank or a `#` comment.
pub fn is_comment(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#')
}

/// Classifies the lines of a cell.
///
/// Lines are processed in order. Blank lines and `#` comments are skipped everywhere. Until the
/// first other line that does not start with `%`, every `%` line is a directive. From that line
/// on, all remaining lines are query text, including lines that start with `%`.
pub fn classify(text: &str) -> ParsedCell {
    let mut cell = ParsedCell::default();
    let mut query_lines = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if is_comment(line) {
            continue;
        }

        if query_lines.is_empty() && line.trim_start().starts_with('%') {
            cell.directives
                .push(DirectiveInvocation::parse(line, index + 1));
        } else {
            query_lines.push(line);
        }
    }

    cell.query = query_lines.join("\n");
    cell
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_only() {
        let cell = classify("\n# a comment\n   \n  # another one\n");
        assert!(cell.directives.is_empty());
        assert!(!cell.has_query());
    }

    #[test]
    fn directives_then_query() {
        let cell = classify(
            "%endpoint http://example.com/sparql\n# comment\n%show   5 \nSELECT * WHERE {\n  ?s ?p ?o\n}",
        );
        assert_eq!(
            cell.directives,
            vec![
                DirectiveInvocation {
                    name: "endpoint".to_owned(),
                    arguments: "http://example.com/sparql".to_owned(),
                    line: 1,
                },
                DirectiveInvocation {
                    name: "show".to_owned(),
                    arguments: "5".to_owned(),
                    line: 3,
                },
            ]
        );
        assert_eq!(cell.query, "SELECT * WHERE {\n  ?s ?p ?o\n}");
    }

    #[test]
    fn percent_lines_after_query_start_are_query_text() {
        let cell = classify("SELECT ?x\n%show 3\nWHERE { ?x ?p ?o }");
        assert!(cell.directives.is_empty());
        assert_eq!(cell.query, "SELECT ?x\n%show 3\nWHERE { ?x ?p ?o }");

        let reparsed = classify(&cell.query);
        assert!(reparsed.directives.is_empty());
        assert_eq!(reparsed.query, cell.query);
    }

    #[test]
    fn comments_inside_query_are_skipped() {
        let cell = classify("SELECT *\n# no\n\nWHERE {}");
        assert_eq!(cell.query, "SELECT *\nWHERE {}");
    }

    #[test]
    fn bare_percent_has_empty_name() {
        let invocation = DirectiveInvocation::parse("%", 1);
        assert_eq!(invocation.name, "");
        assert_eq!(invocation.arguments, "");
    }

    #[test]
    fn directive_without_arguments() {
        let invocation = DirectiveInvocation::parse("  %lsmagics", 7);
        assert_eq!(invocation.name, "lsmagics");
        assert_eq!(invocation.arguments, "");
        assert_eq!(invocation.line, 7);
    }
}
