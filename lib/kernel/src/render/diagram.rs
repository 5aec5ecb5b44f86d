use oxrdf::{Literal, NamedNode, Term, Triple};
use std::collections::{BTreeMap, HashMap};

/// The predicates whose literal values are used as node labels.
pub const LABEL_PREDICATES: [&str; 10] = [
    "http://www.w3.org/2000/01/rdf-schema#label",
    "http://schema.org/name",
    "https://schema.org/name",
    "http://www.w3.org/2004/02/skos/core#prefLabel",
    "http://purl.org/dc/elements/1.1/title",
    "http://purl.org/dc/terms/title",
    "http://xmlns.com/foaf/0.1/name",
    "http://www.w3.org/2006/vcard/ns#fn",
    "http://www.w3.org/2006/vcard/ns#org",
    "http://www.w3.org/2006/vcard/ns#organization-name",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Iri,
    BlankNode,
    Literal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
    /// An identifier that is unique within the description.
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// The IRI of the node, for renderers that support links.
    pub link: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// A renderer-independent node-link description of an RDF graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphDescription {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Settings that control how a graph is turned into a [GraphDescription].
#[derive(Clone, Copy, Debug)]
pub struct DiagramOptions<'a> {
    /// Draws literal objects as nodes of their own.
    pub with_literals: bool,
    /// Preferred label languages, in order.
    pub languages: &'a [String],
    /// Prefixes used to compact edge labels, keyed by prefix name.
    pub prefixes: &'a BTreeMap<String, String>,
}

impl GraphDescription {
    /// Describes `triples`. Nodes appear in the order they are first encountered.
    pub fn from_triples(triples: &[Triple], options: &DiagramOptions<'_>) -> Self {
        let mut labels: HashMap<Term, Vec<&Literal>> = HashMap::new();
        for triple in triples {
            if let Term::Literal(literal) = &triple.object {
                if is_label_predicate(&triple.predicate) {
                    labels
                        .entry(triple.subject.clone().into())
                        .or_default()
                        .push(literal);
                }
            }
        }

        let mut builder = DescriptionBuilder {
            description: Self::default(),
            ids: HashMap::new(),
            labels: &labels,
            languages: options.languages,
        };
        for triple in triples {
            let subject = builder.node(&triple.subject.clone().into());
            if is_label_predicate(&triple.predicate) {
                continue;
            }
            if matches!(triple.object, Term::Literal(_)) && !options.with_literals {
                continue;
            }
            let object = builder.node(&triple.object);
            builder.description.edges.push(GraphEdge {
                from: subject,
                to: object,
                label: compact_iri(triple.predicate.as_str(), options.prefixes),
            });
        }
        builder.description
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct DescriptionBuilder<'a> {
    description: GraphDescription,
    ids: HashMap<Term, String>,
    labels: &'a HashMap<Term, Vec<&'a Literal>>,
    languages: &'a [String],
}

impl DescriptionBuilder<'_> {
    /// Returns the id of `term`, adding a node on first sight.
    fn node(&mut self, term: &Term) -> String {
        if let Some(id) = self.ids.get(term) {
            return id.clone();
        }
        let id = format!("n{}", self.ids.len());
        let (kind, link) = match term {
            Term::NamedNode(node) => (NodeKind::Iri, Some(node.as_str().to_owned())),
            Term::BlankNode(_) => (NodeKind::BlankNode, None),
            Term::Literal(_) => (NodeKind::Literal, None),
        };
        self.description.nodes.push(GraphNode {
            id: id.clone(),
            label: self.label(term),
            kind,
            link,
        });
        self.ids.insert(term.clone(), id.clone());
        id
    }

    fn label(&self, term: &Term) -> String {
        if let Some(label) = self
            .labels
            .get(term)
            .and_then(|candidates| select_label(candidates, self.languages))
        {
            return label.value().to_owned();
        }
        match term {
            Term::NamedNode(node) => local_name(node.as_str()).replace('_', " "),
            Term::BlankNode(node) => node.as_str().to_owned(),
            Term::Literal(literal) => literal.value().to_owned(),
        }
    }
}

/// Picks the label of a node from its label literals, given in encounter order.
///
/// The first preferred language with any match wins. Without a match (or without preferences)
/// the first literal is used.
pub fn select_label<'a>(candidates: &[&'a Literal], languages: &[String]) -> Option<&'a Literal> {
    languages
        .iter()
        .find_map(|language| {
            candidates.iter().copied().find(|literal| {
                literal
                    .language()
                    .is_some_and(|tag| tag.eq_ignore_ascii_case(language))
            })
        })
        .or_else(|| candidates.first().copied())
}

fn is_label_predicate(predicate: &NamedNode) -> bool {
    LABEL_PREDICATES.contains(&predicate.as_str())
}

/// The text after the last `/` or `#`. IRIs that end with a separator are kept whole.
fn local_name(iri: &str) -> &str {
    match iri.rfind(['/', '#']) {
        Some(i) if i + 1 < iri.len() => &iri[i + 1..],
        _ => iri,
    }
}

/// Writes `iri` as `prefix:local` with the longest matching namespace, else as its local name.
fn compact_iri(iri: &str, prefixes: &BTreeMap<String, String>) -> String {
    prefixes
        .iter()
        .filter(|(_, namespace)| iri.len() > namespace.len() && iri.starts_with(namespace.as_str()))
        .max_by_key(|(_, namespace)| namespace.len())
        .map_or_else(
            || local_name(iri).to_owned(),
            |(name, namespace)| format!("{name}:{}", &iri[namespace.len()..]),
        )
}
