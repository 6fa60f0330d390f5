//! ResearchBook CLI: researcher lookup and expert finding, plus MCP server.
//!
//! Usage:
//!   researchbook person <NAME> [--json]
//!   researchbook experts <TOPIC> [--limit N] [--json]
//!   researchbook identify
//!   researchbook mcp

use clap::{Parser, Subcommand};
use researchbook::graph::{identify_stores, IdentifyOutcome};
use researchbook::{load_config, Config, ExpertSearch, PersonLookup, ResearchBook};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "researchbook",
    version,
    about = "Researcher intelligence across a research graph and a thesis graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to a YAML config file (default: ./researchbook.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a person in both databases and summarize their profile
    Person {
        /// Full or partial name
        name: String,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find and rank experts on a topic
    Experts {
        /// Topic to search for
        topic: String,
        /// Maximum rows taken from each database
        #[arg(long)]
        limit: Option<usize>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report what each configured database contains
    Identify,
    /// Start the MCP (Model Context Protocol) server on stdio
    Mcp,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // stdout carries results (and the MCP protocol), so logs go to stderr
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn new_runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => Some(rt),
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            None
        }
    }
}

fn print_person(result: &PersonLookup) {
    println!("Person: {}", result.name);
    println!(
        "Found in research database: {}    Found in thesis database: {}",
        yes_no(result.found_in_db1),
        yes_no(result.found_in_db2)
    );

    for profile in &result.researcher_data {
        println!();
        println!("  {} ({} publications)", profile.name, profile.total_publications);
        if let Some(orcid) = &profile.orcid_id {
            println!("    ORCID: {}", orcid);
        }
        for aff in &profile.affiliations {
            let role = aff.role.as_deref().unwrap_or("-");
            match &aff.department {
                Some(dept) => println!("    {} at {} ({})", role, aff.organization, dept),
                None => println!("    {} at {}", role, aff.organization),
            }
        }
    }

    if !result.thesis_data.is_empty() {
        println!();
        println!("Thesis activity:");
        for activity in &result.thesis_data {
            println!(
                "  {} {} [{}]",
                activity.person_name,
                activity.role,
                activity.thesis_title.as_deref().unwrap_or("untitled"),
            );
        }
    }

    println!();
    println!("{}", result.ai_analysis);
}

fn print_experts(result: &ExpertSearch) {
    println!(
        "Topic: {}  ({} experts; {} from research database, {} from thesis database)",
        result.topic, result.experts_found, result.db1_matches, result.db2_matches
    );
    for (rank, expert) in result.expert_list.iter().enumerate() {
        println!(
            "  {:>2}. {:<32} score {:>5.1}  pubs {:>3}  theses {:>3}  {:?}",
            rank + 1,
            expert.name,
            expert.combined_score,
            expert.relevant_publications,
            expert.relevant_theses,
            expert.source,
        );
    }
    println!();
    println!("{}", result.ai_ranking);
}

fn print_identify(outcome: &IdentifyOutcome) {
    println!("{} at {}", outcome.configured_as, outcome.uri);
    match (&outcome.inventory, &outcome.error) {
        (Some(inv), _) => {
            println!("  Detected: {}", inv.kind.describe());
            for count in &inv.counts {
                println!("  {:<24} {:>8}", count.label, count.count);
            }
            if !inv.relationship_types.is_empty() {
                println!("  Relationships: {}", inv.relationship_types.join(", "));
            }
            for sample in &inv.samples {
                println!("  {} properties: {}", sample.label, sample.properties.join(", "));
            }
            if outcome.looks_swapped() {
                println!(
                    "  WARNING: this looks like the other database; check the configured URIs"
                );
            }
        }
        (None, Some(err)) => println!("  Unreachable: {}", err),
        (None, None) => println!("  No information"),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn cmd_person(config: &Config, name: &str, json: bool) -> i32 {
    let Some(rt) = new_runtime() else { return 1 };
    rt.block_on(async {
        let book = match ResearchBook::connect(config).await {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };
        let code = match book.lookup_person(name).await {
            Ok(result) if json => print_json(&result),
            Ok(result) => {
                print_person(&result);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
        book.close();
        code
    })
}

fn cmd_experts(config: &Config, topic: &str, limit: Option<usize>, json: bool) -> i32 {
    let Some(rt) = new_runtime() else { return 1 };
    rt.block_on(async {
        let book = match ResearchBook::connect(config).await {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };
        let code = match book.find_expert(topic, limit).await {
            Ok(result) if json => print_json(&result),
            Ok(result) => {
                print_experts(&result);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
        book.close();
        code
    })
}

fn cmd_identify(config: &Config) -> i32 {
    if let Err(e) = config.validate_stores() {
        eprintln!("Error: {}", e);
        return 1;
    }
    let Some(rt) = new_runtime() else { return 1 };
    let outcomes = rt.block_on(identify_stores(&config.research_db, &config.thesis_db));
    for (i, outcome) in outcomes.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_identify(outcome);
    }
    if outcomes.iter().any(|o| o.error.is_some()) {
        1
    } else {
        0
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Person { name, json } => cmd_person(&config, &name, json),
        Commands::Experts { topic, limit, json } => cmd_experts(&config, &topic, limit, json),
        Commands::Identify => cmd_identify(&config),
        Commands::Mcp => researchbook::mcp::run_mcp_server(config),
    };
    std::process::exit(code);
}
