//! Analysis prompts sent to the LLM
//!
//! Pure functions: the full record data is embedded as pretty-printed JSON
//! so each request is self-contained.

use crate::graph::{ResearcherProfile, ThesisActivity};
use crate::merge::ExpertRecord;

/// Number of experts the ranking prompt asks the model to single out.
pub const RANKED_EXPERTS: usize = 5;

/// Word budget given to the model for a profile summary.
pub const PROFILE_WORD_LIMIT: usize = 500;

/// Profile summary request covering both databases' rows for one name.
pub fn person_analysis_prompt(
    name: &str,
    researcher_data: &[ResearcherProfile],
    thesis_data: &[ThesisActivity],
) -> serde_json::Result<String> {
    let research_json = serde_json::to_string_pretty(researcher_data)?;
    let thesis_json = serde_json::to_string_pretty(thesis_data)?;

    Ok(format!(
        r#"Analyze this researcher profile and provide a comprehensive summary:

RESEARCHER: {name}

DATABASE 1 (Research Profile):
{research_json}

DATABASE 2 (Thesis Activities):
{thesis_json}

Please provide:
1. Research expertise areas (based on thesis topics, roles, publications)
2. Career progression summary (positions, institutions, timeline)
3. Academic involvement (supervision, examination, collaboration patterns)
4. Key strengths and specializations
5. Overall academic profile assessment

Keep response concise but comprehensive (max {PROFILE_WORD_LIMIT} words).
"#
    ))
}

/// Ranking request over the merged expert list for one topic.
pub fn expert_ranking_prompt(topic: &str, experts: &[ExpertRecord]) -> serde_json::Result<String> {
    let experts_json = serde_json::to_string_pretty(experts)?;

    Ok(format!(
        r#"Rank and analyze these experts for the topic: "{topic}"

EXPERTS FOUND:
{experts_json}

Please provide:
1. Top {RANKED_EXPERTS} experts ranked by relevance to "{topic}"
2. For each expert, explain why they're qualified (publications, thesis work, roles)
3. Identify any collaboration patterns or research networks
4. Suggest which expert would be best for: media interviews, research collaboration, student supervision

Format as a clear ranking with explanations.
"#
    ))
}
