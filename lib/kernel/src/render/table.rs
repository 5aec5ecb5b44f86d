use oxrdf::{Term, Triple};
use prettytable::{Cell, Row, Table};
use sparesults::{QueryResultsParseError, ReaderSolutionsParser};
use std::fmt::{Display, Formatter};
use std::io::Read;

/// A value of a [ResultTable].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableCell {
    pub value: String,
    /// `uri`, `bnode`, `literal@<tag>` or `literal^^<datatype>`. Empty for unbound variables.
    pub kind: String,
}

impl TableCell {
    fn from_term(term: &Term) -> Self {
        match term {
            Term::NamedNode(node) => Self {
                value: node.as_str().to_owned(),
                kind: "uri".to_owned(),
            },
            Term::BlankNode(node) => Self {
                value: node.to_string(),
                kind: "bnode".to_owned(),
            },
            Term::Literal(literal) => Self {
                value: literal.value().to_owned(),
                kind: match literal.language() {
                    Some(language) => format!("literal@{language}"),
                    None => format!("literal^^{}", literal.datatype().as_str()),
                },
            },
        }
    }
}

/// Rows of solutions or triples, already filtered by language and truncated to the show limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultTable {
    /// Column names in the order returned by the endpoint.
    pub columns: Vec<String>,
    pub with_types: bool,
    /// The rows that are shown.
    pub rows: Vec<Vec<TableCell>>,
    /// The number of rows after language filtering, before truncation.
    pub total: usize,
}

impl ResultTable {
    pub fn is_truncated(&self) -> bool {
        self.total > self.rows.len()
    }

    /// Builds the table of a solution sequence.
    pub fn from_solutions<R: Read>(
        solutions: ReaderSolutionsParser<R>,
        options: &TableOptions<'_>,
    ) -> Result<Self, QueryResultsParseError> {
        let columns = solutions
            .variables()
            .iter()
            .map(|variable| variable.as_str().to_owned())
            .collect();
        let mut builder = TableBuilder::new(columns, options);
        for solution in solutions {
            let solution = solution?;
            builder.push(solution.values().iter().map(Option::as_ref));
        }
        Ok(builder.finish())
    }

    /// Builds the table of a graph, one row per triple.
    pub fn from_triples(triples: &[Triple], options: &TableOptions<'_>) -> Self {
        let columns = ["subject", "predicate", "object"]
            .map(str::to_owned)
            .to_vec();
        let mut builder = TableBuilder::new(columns, options);
        for triple in triples {
            let terms = [
                Term::from(triple.subject.clone()),
                Term::from(triple.predicate.clone()),
                triple.object.clone(),
            ];
            builder.push(terms.iter().map(Some));
        }
        builder.finish()
    }
}

/// The session settings that shape a table.
#[derive(Clone, Copy, Debug)]
pub struct TableOptions<'a> {
    pub with_types: bool,
    /// [None] shows all rows.
    pub limit: Option<usize>,
    /// Preferred languages. Empty disables the filter.
    pub languages: &'a [String],
}

struct TableBuilder<'a> {
    table: ResultTable,
    options: &'a TableOptions<'a>,
}

impl<'a> TableBuilder<'a> {
    fn new(columns: Vec<String>, options: &'a TableOptions<'a>) -> Self {
        Self {
            table: ResultTable {
                columns,
                with_types: options.with_types,
                rows: Vec::new(),
                total: 0,
            },
            options,
        }
    }

    fn push<'t>(&mut self, terms: impl Iterator<Item = Option<&'t Term>> + Clone) {
        if !self.accepts_languages(terms.clone()) {
            return;
        }
        self.table.total += 1;
        if self
            .options
            .limit
            .is_some_and(|limit| self.table.rows.len() >= limit)
        {
            return;
        }
        self.table.rows.push(
            terms
                .map(|term| term.map_or_else(TableCell::default, TableCell::from_term))
                .collect(),
        );
    }

    /// A row is kept if none of its literals has a language tag, or if one of the tags is
    /// preferred.
    fn accepts_languages<'t>(&self, terms: impl Iterator<Item = Option<&'t Term>>) -> bool {
        if self.options.languages.is_empty() {
            return true;
        }
        let mut tagged = false;
        for term in terms.flatten() {
            if let Term::Literal(literal) = term {
                if let Some(language) = literal.language() {
                    tagged = true;
                    if self
                        .options
                        .languages
                        .iter()
                        .any(|preferred| preferred.eq_ignore_ascii_case(language))
                    {
                        return true;
                    }
                }
            }
        }
        !tagged
    }

    fn finish(self) -> ResultTable {
        self.table
    }
}

impl Display for ResultTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table.set_titles(Row::new(
            self.columns
                .iter()
                .flat_map(|column| {
                    let mut titles = vec![Cell::new(column)];
                    if self.with_types {
                        titles.push(Cell::new("type"));
                    }
                    titles
                })
                .collect(),
        ));
        for row in &self.rows {
            table.add_row(Row::new(
                row.iter()
                    .flat_map(|cell| {
                        let mut cells = vec![Cell::new(&cell.value)];
                        if self.with_types {
                            cells.push(Cell::new(&cell.kind));
                        }
                        cells
                    })
                    .collect(),
            ));
        }
        write!(f, "{table}")?;
        write!(f, "Total: {}, Shown: {}", self.total, self.rows.len())
    }
}
