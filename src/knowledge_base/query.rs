//! Hierarchy query construction.
//!
//! Both query shapes select `?item ?itemLabel` reachable from the matched
//! entity through any number of hierarchical relation hops, keeping only
//! labels in the requested language.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wikidata properties treated as hierarchical, with their meaning.
pub const HIERARCHY_RELATIONS: [(&str, &str); 9] = [
    ("wdt:P279", "subclass of"),
    ("wdt:P31", "instance of"),
    ("wdt:P361", "part of"),
    ("wdt:P1269", "facet of"),
    ("wdt:P2283", "uses"),
    ("wdt:P1535", "used by"),
    ("wdt:P452", "industry"),
    ("wdt:P366", "has use"),
    ("wdt:P106", "occupation"),
];

const PREFIXES: &str = "PREFIX wdt: <http://www.wikidata.org/prop/direct/>\n\
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n";

/// Which way to walk the hierarchy from the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards more general concepts.
    Broader,
    /// Towards more specific concepts.
    Narrower,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Broader => "broader",
            Direction::Narrower => "narrower",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escapes a value for use inside a double-quoted SPARQL string literal.
///
/// # Examples
///
/// ```
/// use kgtree::knowledge_base::escape_literal;
///
/// assert_eq!(escape_literal(r#"say "hi""#), r#"say \"hi\""#);
/// assert_eq!(escape_literal("a\\b"), "a\\\\b");
/// ```
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Query matching the entity by an exact label in `language`.
pub fn exact_match_query(entity: &str, direction: Direction, language: &str) -> String {
    let anchor = format!(
        "?entity rdfs:label \"{}\"@{} .",
        escape_literal(entity),
        language
    );
    select_query(&anchor, direction, language)
}

/// Query matching any entity whose label in `language` contains `entity`.
///
/// Recovers entities whose canonical label carries qualifiers, e.g. a
/// parenthetical disambiguation.
pub fn fuzzy_match_query(entity: &str, direction: Direction, language: &str) -> String {
    let anchor = format!(
        "?entity rdfs:label ?label .\n  FILTER(CONTAINS(?label, \"{}\") && LANG(?label) = \"{}\")",
        escape_literal(entity),
        language
    );
    select_query(&anchor, direction, language)
}

fn select_query(anchor: &str, direction: Direction, language: &str) -> String {
    let path = relation_path();
    let traversal = match direction {
        Direction::Broader => format!("?entity ({path})* ?item ."),
        Direction::Narrower => format!("?item ({path})* ?entity ."),
    };

    format!(
        "{prefixes}SELECT DISTINCT ?item ?itemLabel WHERE {{\n  {anchor}\n  {traversal}\n  ?item rdfs:label ?itemLabel .\n  FILTER(LANG(?itemLabel) = \"{language}\")\n}}",
        prefixes = PREFIXES
    )
}

fn relation_path() -> String {
    HIERARCHY_RELATIONS
        .iter()
        .map(|(property, _)| *property)
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_display_and_serde() {
        assert_eq!(Direction::Broader.to_string(), "broader");
        assert_eq!(
            serde_json::to_string(&Direction::Narrower).unwrap(),
            "\"narrower\""
        );
    }

    #[test]
    fn relation_path_lists_every_property() {
        let path = relation_path();
        for (property, _) in HIERARCHY_RELATIONS {
            assert!(path.contains(property), "missing {property}");
        }
        assert_eq!(path.matches(" | ").count(), HIERARCHY_RELATIONS.len() - 1);
    }

    #[test]
    fn exact_broader_query_anchors_on_label() {
        let query = exact_match_query("皮膚科診所", Direction::Broader, "zh");

        assert!(query.contains("?entity rdfs:label \"皮膚科診所\"@zh ."));
        assert!(query.contains("?entity (wdt:P279 | wdt:P31"));
        assert!(query.contains(")* ?item ."));
        assert!(query.contains("FILTER(LANG(?itemLabel) = \"zh\")"));
        assert!(query.starts_with("PREFIX wdt:"));
    }

    #[test]
    fn narrower_query_reverses_traversal() {
        let query = exact_match_query("雷射", Direction::Narrower, "zh");

        assert!(query.contains("?item (wdt:P279"));
        assert!(query.contains(")* ?entity ."));
    }

    #[test]
    fn fuzzy_query_uses_contains_filter() {
        let query = fuzzy_match_query("玻尿酸", Direction::Broader, "zh");

        assert!(query.contains("FILTER(CONTAINS(?label, \"玻尿酸\") && LANG(?label) = \"zh\")"));
        assert!(!query.contains("\"玻尿酸\"@zh"));
    }

    #[test]
    fn entity_names_are_escaped() {
        let query = exact_match_query("a\" } DROP ALL ; {\"", Direction::Broader, "zh");

        assert!(query.contains("\"a\\\" } DROP ALL ; {\\\"\"@zh"));
    }
}
