//! Record types returned by the graph stores
//!
//! Every store query maps its untyped rows into one of these before
//! returning, so nothing above the store layer sees raw Bolt values.

use serde::{Deserialize, Serialize};

/// How a free-text query is compared against `Person.name`.
///
/// Names are the only join key across the two databases and are not unique,
/// so every strategy is deliberately loose about identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Case-insensitive substring (`"anders"` matches `"Anders Svensson"`)
    #[default]
    Substring,
    /// Case-insensitive equality
    Exact,
    /// Every whitespace-separated token of the query appears somewhere in the
    /// name, in any order (`"svensson anders"` matches `"Anders Svensson"`)
    Tokens,
}

impl MatchStrategy {
    /// Apply the strategy locally. Mirrors the Cypher predicate built in
    /// [`super::cypher::name_predicate`].
    pub fn matches(&self, candidate: &str, query: &str) -> bool {
        let candidate = candidate.to_lowercase();
        let query = query.to_lowercase();
        match self {
            MatchStrategy::Substring => candidate.contains(&query),
            MatchStrategy::Exact => candidate == query,
            MatchStrategy::Tokens => query_tokens(&query)
                .iter()
                .all(|token| candidate.contains(token.as_str())),
        }
    }
}

/// Lower-cased, whitespace-split query tokens (used by [`MatchStrategy::Tokens`]).
pub fn query_tokens(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

/// Which of the two configured databases a record or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreRole {
    /// Database 1: people, publications, organizations
    Research,
    /// Database 2: theses and the people attached to them
    Thesis,
}

impl StoreRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreRole::Research => "research intelligence (db1)",
            StoreRole::Thesis => "thesis relationships (db2)",
        }
    }
}

impl std::fmt::Display for StoreRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Source entities
// ---------------------------------------------------------------------------

/// A `Person` node in the research database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub orcid_id: Option<String>,
    pub given_names: Option<String>,
    pub family_name: Option<String>,
    /// Publication count as self-reported on ORCID
    pub orcid_publication_count: Option<i64>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_orcid(mut self, orcid_id: impl Into<String>) -> Self {
        self.orcid_id = Some(orcid_id.into());
        self
    }

    pub fn with_names(mut self, given: impl Into<String>, family: impl Into<String>) -> Self {
        self.given_names = Some(given.into());
        self.family_name = Some(family.into());
        self
    }

    pub fn with_orcid_publication_count(mut self, count: i64) -> Self {
        self.orcid_publication_count = Some(count);
        self
    }
}

/// A `WORKED_AT` relation flattened together with its `Organization`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Affiliation {
    pub organization: String,
    pub role: Option<String>,
    pub department: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}

impl Affiliation {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_years(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start_year = start;
        self.end_year = end;
        self
    }
}

/// A `Publication` node. `keywords` is free text in the research database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    pub keywords: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl Publication {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    /// Topic match across title, keywords and abstract (case-insensitive).
    pub fn mentions(&self, topic: &str) -> bool {
        let topic = topic.to_lowercase();
        contains_ci(Some(&self.title), &topic)
            || contains_ci(self.keywords.as_ref(), &topic)
            || contains_ci(self.abstract_text.as_ref(), &topic)
    }
}

/// A `Thesis` node. Unlike publications, `keywords` is a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thesis {
    pub title: String,
    pub thesis_type: Option<String>,
    pub keywords: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl Thesis {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, thesis_type: impl Into<String>) -> Self {
        self.thesis_type = Some(thesis_type.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    /// Topic match across title, any keyword, or abstract (case-insensitive).
    pub fn mentions(&self, topic: &str) -> bool {
        let topic = topic.to_lowercase();
        contains_ci(Some(&self.title), &topic)
            || self.keywords.iter().any(|k| k.to_lowercase().contains(&topic))
            || contains_ci(self.abstract_text.as_ref(), &topic)
    }
}

fn contains_ci(field: Option<&String>, lowered_needle: &str) -> bool {
    field
        .map(|f| f.to_lowercase().contains(lowered_needle))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// One row of the person-profile query (research database).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearcherProfile {
    pub name: String,
    pub orcid_id: Option<String>,
    pub given_names: Option<String>,
    pub family_name: Option<String>,
    pub orcid_publication_count: Option<i64>,
    /// Number of distinct `AUTHORED` publications in the graph
    pub total_publications: u32,
    /// Only affiliations with a named organization
    pub affiliations: Vec<Affiliation>,
}

/// One row of the thesis-activity query (thesis database).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThesisActivity {
    pub person_name: String,
    /// The relation type name, e.g. `SUPERVISED` or `EXAMINED`
    pub role: String,
    pub thesis_title: Option<String>,
    pub thesis_type: Option<String>,
    pub keywords: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// One row of the topic search over publications (research database).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationExpert {
    pub name: String,
    pub orcid_id: Option<String>,
    pub relevant_publications: u32,
    pub sample_publications: Vec<String>,
    pub organizations: Vec<String>,
    pub departments: Vec<String>,
}

/// One row of the topic search over theses (thesis database).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThesisExpert {
    pub name: String,
    pub roles: Vec<String>,
    pub relevant_theses: u32,
    pub sample_theses: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_is_case_insensitive() {
        assert!(MatchStrategy::Substring.matches("Anders Svensson", "anders"));
        assert!(MatchStrategy::Substring.matches("Anders Svensson", "SVENS"));
        assert!(!MatchStrategy::Substring.matches("Anders Svensson", "Maria"));
    }

    #[test]
    fn exact_match_ignores_case_only() {
        assert!(MatchStrategy::Exact.matches("Anders Svensson", "anders svensson"));
        assert!(!MatchStrategy::Exact.matches("Anders Svensson", "anders"));
    }

    #[test]
    fn token_match_ignores_order() {
        assert!(MatchStrategy::Tokens.matches("Anders Svensson", "svensson anders"));
        assert!(MatchStrategy::Tokens.matches("Anders Svensson", "  anders  "));
        assert!(!MatchStrategy::Tokens.matches("Anders Svensson", "anders karlsson"));
    }

    #[test]
    fn strategy_deserializes_from_snake_case() {
        let s: MatchStrategy = serde_json::from_str("\"tokens\"").unwrap();
        assert_eq!(s, MatchStrategy::Tokens);
    }

    #[test]
    fn publication_mentions_checks_all_three_fields() {
        let by_title = Publication::new("Deep Machine Learning");
        let by_keywords = Publication::new("X").with_keywords("graphs, machine learning");
        let by_abstract = Publication::new("Y").with_abstract("We apply MACHINE LEARNING to ...");
        let none = Publication::new("Z").with_keywords("optics");

        assert!(by_title.mentions("machine learning"));
        assert!(by_keywords.mentions("machine learning"));
        assert!(by_abstract.mentions("machine learning"));
        assert!(!none.mentions("machine learning"));
    }

    #[test]
    fn thesis_mentions_any_keyword() {
        let thesis = Thesis::new("On Batteries").with_keywords(["Electrochemistry", "Lithium"]);
        assert!(thesis.mentions("lithium"));
        assert!(!thesis.mentions("graphene"));
    }

    #[test]
    fn abstract_serializes_under_its_graph_name() {
        let p = Publication::new("T").with_abstract("A");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["abstract"], "A");
    }
}
