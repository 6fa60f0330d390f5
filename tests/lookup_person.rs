//! Person lookup across both stores
//!
//! Covers the found/not-found paths, LLM failure downgrade, and store
//! failures surfacing as errors that name the failing database.

mod common;

use common::{book_with, research_store, thesis_store, ANDERS};
use researchbook::llm::LlmError;
use researchbook::{
    BookError, MemoryResearchStore, MemoryThesisStore, MockLlmClient, ResearchBook, StoreRole,
};
use std::sync::Arc;

#[tokio::test]
async fn test_person_in_both_databases() {
    let llm = Arc::new(MockLlmClient::replying("Anders is a machine learning professor."));
    let book = book_with(llm.clone());

    let result = book.lookup_person("anders").await.unwrap();

    assert_eq!(result.name, "anders");
    assert!(result.found_in_db1);
    assert!(result.found_in_db2);
    assert_eq!(result.researcher_data.len(), 1);
    assert_eq!(result.researcher_data[0].name, ANDERS);
    assert_eq!(result.researcher_data[0].total_publications, 5);
    assert_eq!(
        result.researcher_data[0].affiliations[0].organization,
        "Chalmers University of Technology"
    );

    let roles: Vec<&str> = result.thesis_data.iter().map(|a| a.role.as_str()).collect();
    assert_eq!(roles, vec!["SUPERVISED", "EXAMINED"]);

    assert_eq!(result.ai_analysis, "Anders is a machine learning professor.");
    assert!(!result.ai_failed());

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].0.contains("RESEARCHER: anders"));
    assert!(prompts[0].0.contains("Learning grid faults"));
    assert_eq!(prompts[0].1, 1000);
}

#[tokio::test]
async fn test_person_not_found_makes_no_llm_call() {
    let llm = Arc::new(MockLlmClient::replying("should not be used"));
    let book = book_with(llm.clone());

    let result = book.lookup_person("Zelda Quist").await.unwrap();

    assert!(!result.found());
    assert!(result.researcher_data.is_empty());
    assert!(result.thesis_data.is_empty());
    assert_eq!(result.ai_analysis, "Person not found in either database");
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_llm_failure_keeps_database_rows() {
    let llm = Arc::new(MockLlmClient::failing_with_status(500));
    let book = book_with(llm.clone());

    let result = book.lookup_person(ANDERS).await.unwrap();

    assert!(result.found_in_db1);
    assert!(result.found_in_db2);
    assert_eq!(result.researcher_data.len(), 1);
    assert_eq!(result.thesis_data.len(), 2);
    assert!(result.ai_analysis.starts_with("AI Error: "));
    assert!(result.ai_analysis.contains("500"));
    assert!(result.ai_failed());
}

#[tokio::test]
async fn test_transport_failure_is_also_downgraded() {
    let llm = Arc::new(
        MockLlmClient::replying("unused").then(Err(LlmError::Transport("timed out".into()))),
    );
    let book = book_with(llm);

    let result = book.lookup_person(ANDERS).await.unwrap();
    assert!(result.ai_analysis.starts_with("AI Error: "));
    assert!(result.ai_analysis.contains("timed out"));
}

#[tokio::test]
async fn test_thesis_only_person_is_found() {
    let llm = Arc::new(MockLlmClient::replying("summary"));
    let book = book_with(llm.clone());

    let result = book.lookup_person("nyström").await.unwrap();
    assert!(!result.found_in_db1);
    assert!(result.found_in_db2);
    assert_eq!(result.thesis_data.len(), 3);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_research_store_down_is_distinguishable() {
    let llm = Arc::new(MockLlmClient::replying("unused"));
    let book = ResearchBook::in_memory(
        MemoryResearchStore::unavailable("connection refused"),
        thesis_store(),
        llm.clone(),
    );

    let err = book.lookup_person(ANDERS).await.unwrap_err();
    match err {
        BookError::Graph { role, .. } => assert_eq!(role, StoreRole::Research),
        other => panic!("expected graph error, got {other:?}"),
    }
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_thesis_store_down_is_distinguishable() {
    let llm = Arc::new(MockLlmClient::replying("unused"));
    let book = ResearchBook::in_memory(
        research_store(),
        MemoryThesisStore::unavailable("auth failed"),
        llm,
    );

    let err = book.lookup_person(ANDERS).await.unwrap_err();
    assert!(matches!(
        err,
        BookError::Graph {
            role: StoreRole::Thesis,
            ..
        }
    ));
    assert!(err.to_string().contains("thesis relationships"));
}

#[tokio::test]
async fn test_lookup_result_serializes_with_abstract_key() {
    let llm = Arc::new(MockLlmClient::replying("summary"));
    let book = book_with(llm);

    let result = book.lookup_person(ANDERS).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["found_in_db1"], true);
    assert!(json["thesis_data"][0].get("abstract").is_some());
    assert!(json.get("generated_at").is_some());
}
