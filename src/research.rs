//! Research enrichment.
//!
//! One structured prompt to the generative service, embedding the lead
//! context and both prior scores, requesting eight labeled sections in a
//! fixed order. The response parser is deliberately conservative: generative
//! output does not reliably follow the requested template, so a missing
//! section yields an empty string or list, never an error.

use crate::errors::AppError;
use crate::models::{LeadScore, LeadSubmission, ResearchResult, WebPresenceScore};
use crate::services::OpenAiService;
use regex::Regex;

const RESEARCH_TEMPERATURE: f64 = 0.7;
const RESEARCH_MAX_TOKENS: u32 = 2500;

const SYSTEM_PROMPT: &str = "You are a senior automation consultant preparing internal research \
notes on a new inbound lead. Be specific to the lead's industry and situation. Answer in the \
exact numbered sections requested.";

/// Section labels in the order the prompt requests them (1-indexed).
const SECTION_LABELS: [&str; 8] = [
    "INDUSTRY INSIGHTS",
    "COMPETITIVE ANALYSIS",
    "AUTOMATION OPPORTUNITIES",
    "ROI ANALYSIS",
    "IMPLEMENTATION STRATEGY",
    "KEY CHALLENGES",
    "RECOMMENDED APPROACH",
    "STYLE GUIDE TOPICS",
];

/// Runs the research pass.
///
/// Returns `Ok(None)` when the generative service is unconfigured; service
/// errors are returned to the orchestrator, which records them as non-fatal.
pub async fn research_lead(
    openai: Option<&OpenAiService>,
    submission: &LeadSubmission,
    score: Option<&LeadScore>,
    presence: Option<&WebPresenceScore>,
) -> Result<Option<ResearchResult>, AppError> {
    let Some(service) = openai else {
        tracing::info!("Generative service unconfigured, skipping research enrichment");
        return Ok(None);
    };

    let prompt = build_prompt(submission, score, presence);
    let content = service
        .chat_completion(SYSTEM_PROMPT, &prompt, RESEARCH_TEMPERATURE, RESEARCH_MAX_TOKENS)
        .await?;

    Ok(Some(parse_research(&content)))
}

fn build_prompt(
    submission: &LeadSubmission,
    score: Option<&LeadScore>,
    presence: Option<&WebPresenceScore>,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("Lead profile:\n");
    prompt.push_str(&format!("- Company: {}\n", submission.company));
    prompt.push_str(&format!("- Industry: {}\n", submission.industry.label()));
    prompt.push_str(&format!("- Size: {}\n", submission.business_size.label()));
    prompt.push_str(&format!(
        "- Current process: {}\n",
        submission.current_process
    ));
    prompt.push_str(&format!(
        "- Monthly volume: {}\n",
        submission.monthly_volume.label()
    ));
    prompt.push_str(&format!(
        "- Automation goals: {}\n",
        submission.automation_goals.join(", ")
    ));
    prompt.push_str(&format!(
        "- What they want: {}\n",
        submission.automation_description
    ));
    if !submission.project_ideas.is_empty() {
        prompt.push_str("- Project ideas:\n");
        for idea in &submission.project_ideas {
            prompt.push_str(&format!(
                "  - {} ({}): {}\n",
                idea.title,
                idea.priority.label(),
                idea.description
            ));
        }
    }
    prompt.push_str(&format!(
        "- Tools in use: {}\n",
        submission.current_integrations
    ));
    prompt.push_str(&format!(
        "- Project description: {}\n",
        submission.project_description
    ));
    prompt.push_str(&format!("- Timeline: {}\n", submission.timeline.label()));
    prompt.push_str(&format!("- Budget: {}\n", submission.budget.label()));

    if let Some(score) = score {
        prompt.push_str(&format!(
            "\nLead quality score: {}/{} ({})\n",
            score.total,
            score.max_total,
            score.rating.label()
        ));
    }
    if let Some(presence) = presence {
        prompt.push_str(&format!(
            "Web presence: {}/100, digital maturity {}\n",
            presence.overall,
            presence.maturity.label()
        ));
    }

    prompt.push_str("\nRespond with exactly these numbered sections:\n");
    for (i, label) in SECTION_LABELS.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, label));
    }
    prompt.push_str(
        "\nSections 3, 6 and 8 must be bullet lists. Section 8 lists 5-8 topics a brand voice \
guide and a sales engagement guide for this company should cover.",
    );

    prompt
}

fn parse_research(content: &str) -> ResearchResult {
    ResearchResult {
        industry_insights: extract_section(content, 1, SECTION_LABELS[0]),
        competitive_analysis: extract_section(content, 2, SECTION_LABELS[1]),
        automation_opportunities: split_list(&extract_section(content, 3, SECTION_LABELS[2])),
        roi_analysis: extract_section(content, 4, SECTION_LABELS[3]),
        implementation_strategy: extract_section(content, 5, SECTION_LABELS[4]),
        challenges: split_list(&extract_section(content, 6, SECTION_LABELS[5])),
        recommended_approach: extract_section(content, 7, SECTION_LABELS[6]),
        style_guide_topics: split_list(&extract_section(content, 8, SECTION_LABELS[7])),
    }
}

/// Extracts one numbered section: finds the heading line for `index` (by
/// number and, preferably, label), captures until the next numbered heading.
/// Absent section yields an empty string.
pub fn extract_section(content: &str, index: usize, label: &str) -> String {
    let heading = Regex::new(r"^\s*(?:#{1,6}\s*)?(?:\*\*)?(\d+)[.):]\s*(.*)$").unwrap();
    let label_lower = label.to_lowercase();

    let lines: Vec<&str> = content.lines().collect();
    let mut start = None;

    // Prefer a heading whose text carries the label; fall back to number only.
    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = heading.captures(line) {
            let number: usize = caps[1].parse().unwrap_or(0);
            let rest = caps[2].to_lowercase();
            if number == index && rest.contains(&label_lower) {
                start = Some(i);
                break;
            }
        }
    }
    if start.is_none() {
        for (i, line) in lines.iter().enumerate() {
            if let Some(caps) = heading.captures(line) {
                let number: usize = caps[1].parse().unwrap_or(0);
                if number == index {
                    start = Some(i);
                    break;
                }
            }
        }
    }

    let Some(start) = start else {
        return String::new();
    };

    let mut section = Vec::new();
    for line in &lines[start + 1..] {
        if heading.is_match(line) {
            break;
        }
        section.push(*line);
    }

    section.join("\n").trim().to_string()
}

/// Splits a list-type section on newlines, stripping bullet markers and
/// numbering. Empty lines are dropped.
pub fn split_list(section: &str) -> Vec<String> {
    let marker = Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s*").unwrap();

    section
        .lines()
        .map(|line| marker.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
1. INDUSTRY INSIGHTS
Margins are tightening across the sector.
Operators are consolidating tooling.

2. COMPETITIVE ANALYSIS
Rivals automated intake last year.

3. AUTOMATION OPPORTUNITIES
- Invoice processing
- Lead routing
* Inventory sync

4. ROI ANALYSIS
Payback inside two quarters.
";

    #[test]
    fn extracts_labeled_sections() {
        let insights = extract_section(SAMPLE, 1, "INDUSTRY INSIGHTS");
        assert!(insights.contains("Margins are tightening"));
        assert!(insights.contains("consolidating tooling"));
        assert!(!insights.contains("COMPETITIVE"));
    }

    #[test]
    fn missing_section_is_empty_not_error() {
        assert_eq!(extract_section(SAMPLE, 7, "RECOMMENDED APPROACH"), "");
    }

    #[test]
    fn list_sections_strip_bullet_markers() {
        let items = split_list(&extract_section(SAMPLE, 3, "AUTOMATION OPPORTUNITIES"));
        assert_eq!(
            items,
            vec!["Invoice processing", "Lead routing", "Inventory sync"]
        );
    }

    #[test]
    fn full_parse_tolerates_partial_output() {
        let result = parse_research(SAMPLE);
        assert!(!result.industry_insights.is_empty());
        assert!(result.implementation_strategy.is_empty());
        assert!(result.style_guide_topics.is_empty());
        assert_eq!(result.automation_opportunities.len(), 3);
    }
}
