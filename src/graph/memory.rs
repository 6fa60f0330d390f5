//! In-memory stores
//!
//! Evaluate the same four query shapes as the Neo4j stores over data held in
//! process. Used by tests and for running the orchestrator without a live
//! database.

use super::traits::{GraphError, GraphResult, QueryPolicy, ResearchStore, ThesisStore};
use super::types::{
    Affiliation, Person, Publication, PublicationExpert, ResearcherProfile, Thesis,
    ThesisActivity, ThesisExpert,
};
use async_trait::async_trait;
use std::cmp::Reverse;

#[derive(Debug, Clone)]
struct PersonEntry {
    person: Person,
    affiliations: Vec<Affiliation>,
    publications: Vec<Publication>,
}

/// Research database held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryResearchStore {
    people: Vec<PersonEntry>,
    policy: QueryPolicy,
    offline: Option<String>,
}

impl MemoryResearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every query fails with [`GraphError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            offline: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: QueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a person. People are kept in insertion order, which stands in for
    /// the database's unspecified row order.
    pub fn with_person(mut self, person: Person) -> Self {
        self.people.push(PersonEntry {
            person,
            affiliations: Vec::new(),
            publications: Vec::new(),
        });
        self
    }

    /// Attach a `WORKED_AT` relation to every person with this exact name.
    pub fn with_affiliation(mut self, name: &str, affiliation: Affiliation) -> Self {
        for entry in self.people.iter_mut().filter(|e| e.person.name == name) {
            entry.affiliations.push(affiliation.clone());
        }
        self
    }

    /// Attach an `AUTHORED` relation to every person with this exact name.
    pub fn with_publication(mut self, name: &str, publication: Publication) -> Self {
        for entry in self.people.iter_mut().filter(|e| e.person.name == name) {
            entry.publications.push(publication.clone());
        }
        self
    }

    fn check_online(&self) -> GraphResult<()> {
        match &self.offline {
            Some(reason) => Err(GraphError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResearchStore for MemoryResearchStore {
    async fn researcher_profiles(&self, name: &str) -> GraphResult<Vec<ResearcherProfile>> {
        self.check_online()?;
        Ok(self
            .people
            .iter()
            .filter(|e| self.policy.matching.matches(&e.person.name, name))
            .take(self.policy.profile_rows)
            .map(|e| ResearcherProfile {
                name: e.person.name.clone(),
                orcid_id: e.person.orcid_id.clone(),
                given_names: e.person.given_names.clone(),
                family_name: e.person.family_name.clone(),
                orcid_publication_count: e.person.orcid_publication_count,
                total_publications: e.publications.len() as u32,
                affiliations: dedup(e.affiliations.clone()),
            })
            .collect())
    }

    async fn publication_experts(
        &self,
        topic: &str,
        limit: usize,
    ) -> GraphResult<Vec<PublicationExpert>> {
        self.check_online()?;
        let mut experts: Vec<PublicationExpert> = self
            .people
            .iter()
            .filter_map(|e| {
                let relevant: Vec<&Publication> =
                    e.publications.iter().filter(|p| p.mentions(topic)).collect();
                if relevant.is_empty() || e.affiliations.is_empty() {
                    return None;
                }
                let organizations = dedup(
                    e.affiliations.iter().map(|a| a.organization.clone()).collect(),
                );
                let departments = dedup(
                    e.affiliations
                        .iter()
                        .filter_map(|a| a.department.clone())
                        .collect(),
                );
                Some(PublicationExpert {
                    name: e.person.name.clone(),
                    orcid_id: e.person.orcid_id.clone(),
                    relevant_publications: relevant.len() as u32,
                    sample_publications: relevant
                        .iter()
                        .take(self.policy.sample_titles)
                        .map(|p| p.title.clone())
                        .collect(),
                    organizations: truncate(organizations, self.policy.sample_affiliations),
                    departments: truncate(departments, self.policy.sample_affiliations),
                })
            })
            .collect();

        experts.sort_by(|a, b| {
            Reverse(a.relevant_publications)
                .cmp(&Reverse(b.relevant_publications))
                .then_with(|| a.name.cmp(&b.name))
        });
        experts.truncate(limit);
        Ok(experts)
    }
}

#[derive(Debug, Clone)]
struct ThesisEntry {
    thesis: Thesis,
    /// (person name, relation type)
    participants: Vec<(String, String)>,
}

/// Thesis database held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryThesisStore {
    theses: Vec<ThesisEntry>,
    policy: QueryPolicy,
    offline: Option<String>,
}

impl MemoryThesisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every query fails with [`GraphError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            offline: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: QueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a thesis together with the people related to it and the relation
    /// type each one holds (`SUPERVISED`, `EXAMINED`, ...).
    pub fn with_thesis<I, N, R>(mut self, thesis: Thesis, participants: I) -> Self
    where
        I: IntoIterator<Item = (N, R)>,
        N: Into<String>,
        R: Into<String>,
    {
        self.theses.push(ThesisEntry {
            thesis,
            participants: participants
                .into_iter()
                .map(|(n, r)| (n.into(), r.into()))
                .collect(),
        });
        self
    }

    fn check_online(&self) -> GraphResult<()> {
        match &self.offline {
            Some(reason) => Err(GraphError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ThesisStore for MemoryThesisStore {
    async fn thesis_activities(&self, name: &str) -> GraphResult<Vec<ThesisActivity>> {
        self.check_online()?;
        Ok(self
            .theses
            .iter()
            .flat_map(|entry| {
                entry
                    .participants
                    .iter()
                    .filter(|(person, _)| self.policy.matching.matches(person, name))
                    .map(move |(person, role)| ThesisActivity {
                        person_name: person.clone(),
                        role: role.clone(),
                        thesis_title: Some(entry.thesis.title.clone()),
                        thesis_type: entry.thesis.thesis_type.clone(),
                        keywords: entry.thesis.keywords.clone(),
                        abstract_text: entry.thesis.abstract_text.clone().unwrap_or_default(),
                    })
            })
            .take(self.policy.thesis_rows)
            .collect())
    }

    async fn thesis_experts(&self, topic: &str, limit: usize) -> GraphResult<Vec<ThesisExpert>> {
        self.check_online()?;

        // One group per (person, relation type), first-seen order.
        let mut groups: Vec<(String, String, Vec<String>)> = Vec::new();
        for entry in self.theses.iter().filter(|e| e.thesis.mentions(topic)) {
            for (person, role) in &entry.participants {
                match groups
                    .iter_mut()
                    .find(|(p, r, _)| p == person && r == role)
                {
                    Some((_, _, titles)) => titles.push(entry.thesis.title.clone()),
                    None => groups.push((
                        person.clone(),
                        role.clone(),
                        vec![entry.thesis.title.clone()],
                    )),
                }
            }
        }

        let mut experts: Vec<ThesisExpert> = groups
            .into_iter()
            .map(|(name, role, titles)| ThesisExpert {
                name,
                roles: vec![role],
                relevant_theses: titles.len() as u32,
                sample_theses: truncate(titles, self.policy.sample_titles),
            })
            .collect();

        experts.sort_by(|a, b| {
            Reverse(a.relevant_theses)
                .cmp(&Reverse(b.relevant_theses))
                .then_with(|| a.name.cmp(&b.name))
        });
        experts.truncate(limit);
        Ok(experts)
    }
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn truncate<T>(mut items: Vec<T>, len: usize) -> Vec<T> {
    items.truncate(len);
    items
}
