//! Smoke tests against real Neo4j instances and a real chat-completion
//! endpoint. Run with `--features live_backends`; connection settings come
//! from the usual config file and environment variables.

#![cfg(feature = "live_backends")]

use researchbook::graph::identify_stores;
use researchbook::{load_config, ResearchBook};

#[tokio::test]
async fn test_live_identify_reaches_both_stores() {
    let config = load_config(None).expect("config");
    let outcomes = identify_stores(&config.research_db, &config.thesis_db).await;
    for outcome in &outcomes {
        assert!(outcome.error.is_none(), "{}: {:?}", outcome.uri, outcome.error);
        assert!(!outcome.looks_swapped(), "{} looks swapped", outcome.uri);
    }
}

#[tokio::test]
async fn test_live_expert_search_round_trip() {
    let config = load_config(None).expect("config");
    let book = ResearchBook::connect(&config).await.expect("connect");

    let result = book
        .find_expert("machine learning", Some(5))
        .await
        .expect("search");
    assert!(result.db1_matches <= 5);
    assert!(result.db2_matches <= 5);
    assert!(!result.ai_ranking.is_empty());
    book.close();
}
