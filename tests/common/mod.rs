//! Common fixtures for ResearchBook integration tests
//!
//! A small university dataset split over the two in-memory stores:
//! - Anders Svensson: 4 machine-learning publications, supervised and
//!   examined one machine-learning thesis each
//! - Birgitta Lind: 3 machine-learning publications, no thesis activity
//! - Carl Nyström: thesis database only, supervised 3 machine-learning theses

#![allow(dead_code)]

use researchbook::graph::{Affiliation, Person, Publication, Thesis};
use researchbook::{MemoryResearchStore, MemoryThesisStore, MockLlmClient, ResearchBook};
use std::sync::Arc;

pub const ANDERS: &str = "Anders Svensson";
pub const BIRGITTA: &str = "Birgitta Lind";
pub const CARL: &str = "Carl Nyström";

pub fn research_store() -> MemoryResearchStore {
    let mut store = MemoryResearchStore::new()
        .with_person(
            Person::new(ANDERS)
                .with_orcid("0000-0002-1825-0097")
                .with_names("Anders", "Svensson"),
        )
        .with_person(Person::new(BIRGITTA))
        .with_affiliation(
            ANDERS,
            Affiliation::new("Chalmers University of Technology")
                .with_role("Professor")
                .with_department("Computer Science and Engineering")
                .with_years(Some(2012), None),
        )
        .with_affiliation(
            BIRGITTA,
            Affiliation::new("Uppsala University").with_role("Researcher"),
        );

    for i in 1..=4 {
        store = store.with_publication(
            ANDERS,
            Publication::new(format!("Machine learning for power grids, part {i}"))
                .with_keywords("machine learning, energy"),
        );
    }
    store = store.with_publication(ANDERS, Publication::new("Notes on optics"));

    for i in 1..=3 {
        store = store.with_publication(
            BIRGITTA,
            Publication::new(format!("Protein study {i}"))
                .with_abstract("We apply machine learning to protein folding."),
        );
    }
    store
}

pub fn thesis_store() -> MemoryThesisStore {
    let mut store = MemoryThesisStore::new()
        .with_thesis(
            Thesis::new("Learning grid faults")
                .with_type("PhD")
                .with_keywords(["machine learning", "fault detection"]),
            [(ANDERS, "SUPERVISED")],
        )
        .with_thesis(
            Thesis::new("Neural load forecasting")
                .with_type("Licentiate")
                .with_abstract("A machine learning approach to load forecasting."),
            [(ANDERS, "EXAMINED")],
        );

    for i in 1..=3 {
        store = store.with_thesis(
            Thesis::new(format!("Machine learning thesis {i}")).with_type("Master"),
            [(CARL, "SUPERVISED")],
        );
    }
    store
}

pub fn book_with(llm: Arc<MockLlmClient>) -> ResearchBook {
    ResearchBook::in_memory(research_store(), thesis_store(), llm)
}
