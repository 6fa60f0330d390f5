//! Cypher text for the four query shapes and the identification probes
//!
//! All user input is bound as a parameter. The only interpolated pieces are
//! the name predicate (chosen from a closed set) and node labels read back
//! from the database itself, which are backtick-escaped.

use super::types::MatchStrategy;

/// `WHERE` predicate comparing `{var}.name` against `$name` / `$tokens`.
pub fn name_predicate(var: &str, strategy: MatchStrategy) -> String {
    match strategy {
        MatchStrategy::Substring => {
            format!("toLower({var}.name) CONTAINS toLower($name)")
        }
        MatchStrategy::Exact => format!("toLower({var}.name) = toLower($name)"),
        MatchStrategy::Tokens => {
            format!("all(token IN $tokens WHERE toLower({var}.name) CONTAINS token)")
        }
    }
}

/// Person profile from the research database, one row per person.
pub fn researcher_profiles(strategy: MatchStrategy) -> String {
    format!(
        "MATCH (p:Person)
         WHERE {predicate}
         OPTIONAL MATCH (p)-[w:WORKED_AT]->(org:Organization)
         OPTIONAL MATCH (p)-[:AUTHORED]->(pub:Publication)
         RETURN p.name AS name,
                p.orcid_id AS orcid_id,
                p.orcid_given_names AS given_names,
                p.orcid_family_name AS family_name,
                p.orcid_publication_count AS orcid_publication_count,
                collect(DISTINCT {{
                    organization: org.name,
                    role: w.role,
                    department: w.department,
                    start_year: w.start_year,
                    end_year: w.end_year
                }}) AS affiliations,
                count(DISTINCT pub) AS total_publications
         LIMIT $limit",
        predicate = name_predicate("p", strategy),
    )
}

/// Thesis involvement from the thesis database. The relation type name is
/// the role.
pub fn thesis_activities(strategy: MatchStrategy) -> String {
    format!(
        "MATCH (p:Person)-[r]->(t:Thesis)
         WHERE {predicate}
         RETURN p.name AS person_name,
                type(r) AS role,
                t.title AS thesis_title,
                t.type AS thesis_type,
                t.keywords AS keywords,
                t.abstract AS abstract
         LIMIT $limit",
        predicate = name_predicate("p", strategy),
    )
}

/// Topic search over authored publications. Only authors with at least one
/// `WORKED_AT` organization are returned.
pub const PUBLICATION_EXPERTS: &str = "
    MATCH (p:Person)-[:AUTHORED]->(pub:Publication)
    WHERE toLower(pub.keywords) CONTAINS toLower($topic)
       OR toLower(pub.abstract) CONTAINS toLower($topic)
       OR toLower(pub.title) CONTAINS toLower($topic)
    WITH p,
         count(DISTINCT pub) AS relevant_publications,
         collect(pub.title)[..$sample_titles] AS sample_publications
    MATCH (p)-[w:WORKED_AT]->(org:Organization)
    RETURN p.name AS name,
           p.orcid_id AS orcid_id,
           relevant_publications,
           sample_publications,
           collect(DISTINCT org.name)[..$sample_affiliations] AS organizations,
           collect(DISTINCT w.department)[..$sample_affiliations] AS departments
    ORDER BY relevant_publications DESC, name ASC
    LIMIT $limit";

/// Topic search over theses, grouped by person and relation type.
pub const THESIS_EXPERTS: &str = "
    MATCH (p:Person)-[r]->(t:Thesis)
    WHERE toLower(t.title) CONTAINS toLower($topic)
       OR any(keyword IN t.keywords WHERE toLower(keyword) CONTAINS toLower($topic))
       OR toLower(t.abstract) CONTAINS toLower($topic)
    WITH p,
         type(r) AS role,
         count(t) AS relevant_theses,
         collect(t.title)[..$sample_titles] AS sample_theses
    RETURN p.name AS name,
           collect(DISTINCT role) AS roles,
           relevant_theses,
           sample_theses
    ORDER BY relevant_theses DESC, name ASC
    LIMIT $limit";

/// Connectivity probe run once after connecting.
pub const PING: &str = "RETURN 1 AS ok";

pub const LABELS: &str = "CALL db.labels() YIELD label RETURN label";

pub const RELATIONSHIP_TYPES: &str =
    "CALL db.relationshipTypes() YIELD relationshipType RETURN relationshipType";

/// Node count for one label.
pub fn count_label(label: &str) -> String {
    format!("MATCH (n:{}) RETURN count(n) AS count", escape_label(label))
}

/// Property keys of one arbitrary node with the label.
pub fn sample_keys(label: &str) -> String {
    format!("MATCH (n:{}) RETURN keys(n) AS keys LIMIT 1", escape_label(label))
}

/// Backtick-quote a label so it can be spliced into query text.
pub fn escape_label(label: &str) -> String {
    format!("`{}`", label.replace('`', "``"))
}
