//! Style-guide generation.
//!
//! Two independent long-form documents per lead: a brand voice/tone guide
//! for the company and a contact/sales engagement guide. Both prompts run
//! concurrently (fixed fan-out of 2). Each document is parsed into named
//! sections for structured CRM storage and rendered into a PDF for email
//! attachment.

use crate::errors::{AppError, ResultExt};
use crate::models::{LeadSubmission, ResearchResult, StyleGuide, StyleGuideSections, StyleGuideSet};
use crate::pdf;
use crate::services::OpenAiService;

const GUIDE_TEMPERATURE: f64 = 0.8;
const GUIDE_MAX_TOKENS: u32 = 3000;

const GUIDE_SYSTEM_PROMPT: &str = "You are a brand strategist writing a practical internal guide. \
Use clear markdown headings (## Section Name) for every section. Be concrete and specific to the \
company described.";

/// Generates both style guides, or `None` when the generative service is
/// unconfigured. A failure in either generation fails the stage; the
/// orchestrator records it as non-fatal.
pub async fn generate_style_guides(
    openai: Option<&OpenAiService>,
    submission: &LeadSubmission,
    research: Option<&ResearchResult>,
) -> Result<Option<StyleGuideSet>, AppError> {
    let Some(service) = openai else {
        tracing::info!("Generative service unconfigured, skipping style guides");
        return Ok(None);
    };

    let topics = research
        .map(|r| r.style_guide_topics.as_slice())
        .unwrap_or_default();

    let company_prompt = company_guide_prompt(submission, topics);
    let contact_prompt = contact_guide_prompt(submission, topics);

    let (company_text, contact_text) = tokio::join!(
        service.chat_completion(
            GUIDE_SYSTEM_PROMPT,
            &company_prompt,
            GUIDE_TEMPERATURE,
            GUIDE_MAX_TOKENS
        ),
        service.chat_completion(
            GUIDE_SYSTEM_PROMPT,
            &contact_prompt,
            GUIDE_TEMPERATURE,
            GUIDE_MAX_TOKENS
        ),
    );

    let company_text = company_text.context("Company guide generation")?;
    let contact_text = contact_text.context("Contact guide generation")?;

    let company_guide = build_guide(
        "Brand Voice & Tone Guide",
        &submission.company,
        company_text,
    )?;
    let contact_guide = build_guide(
        "Contact & Sales Engagement Guide",
        &submission.company,
        contact_text,
    )?;

    Ok(Some(StyleGuideSet {
        company_guide,
        contact_guide,
    }))
}

fn build_guide(title: &str, company: &str, content: String) -> Result<StyleGuide, AppError> {
    let sections = parse_guide_sections(&content);
    let rendered = pdf::render_document(title, Some(company), &content)?;
    Ok(StyleGuide {
        title: title.to_string(),
        content,
        sections,
        pdf: rendered,
    })
}

fn company_guide_prompt(submission: &LeadSubmission, topics: &[String]) -> String {
    let mut prompt = format!(
        "Write a brand voice and tone guide for {company}, a {size} {industry} business. \
Their own description of what they do and want: {description}\n\n\
Cover these sections, each under a ## heading: Voice & Tone, Key Phrases, Structure, \
Themes, Examples, Things to Avoid.\n",
        company = submission.company,
        size = submission.business_size.label(),
        industry = submission.industry.label(),
        description = submission.automation_description,
    );
    if !topics.is_empty() {
        prompt.push_str(&format!(
            "\nWork these topics in where they fit: {}\n",
            topics.join("; ")
        ));
    }
    prompt
}

fn contact_guide_prompt(submission: &LeadSubmission, topics: &[String]) -> String {
    let mut prompt = format!(
        "Write a sales engagement guide for communicating with {name} at {company} \
({industry}, {size}). They are evaluating automation work with timeline {timeline} and \
budget {budget}. Their stated goals: {goals}.\n\n\
Cover these sections, each under a ## heading: Voice & Tone, Key Phrases, Structure, \
Themes, Examples, Things to Avoid.\n",
        name = submission.name,
        company = submission.company,
        industry = submission.industry.label(),
        size = submission.business_size.label(),
        timeline = submission.timeline.label(),
        budget = submission.budget.label(),
        goals = submission.automation_goals.join(", "),
    );
    if !topics.is_empty() {
        prompt.push_str(&format!(
            "\nWork these topics in where they fit: {}\n",
            topics.join("; ")
        ));
    }
    prompt
}

#[derive(Clone, Copy, PartialEq)]
enum Bucket {
    VoiceTone,
    KeyPhrases,
    Structure,
    Themes,
    Examples,
    Avoid,
    Unsectioned,
}

/// Parses a generated guide into named sections by heading-pattern matching
/// (`#`/`##` markers or ALL-CAPS lines).
///
/// Conservative by design: content under an unrecognized heading, and any
/// preamble before the first heading, accumulates in `unsectioned` rather
/// than being dropped.
pub fn parse_guide_sections(content: &str) -> StyleGuideSections {
    let mut voice_tone = Vec::new();
    let mut key_phrases = Vec::new();
    let mut structure = Vec::new();
    let mut themes = Vec::new();
    let mut examples = Vec::new();
    let mut avoid = Vec::new();
    let mut unsectioned = Vec::new();

    let mut current = Bucket::Unsectioned;

    for line in content.lines() {
        if let Some(heading) = heading_text(line) {
            match bucket_for(&heading) {
                Some(bucket) => {
                    current = bucket;
                    continue;
                }
                None => {
                    // unknown heading: keep the line itself so nothing is lost
                    current = Bucket::Unsectioned;
                    unsectioned.push(line);
                    continue;
                }
            }
        }

        match current {
            Bucket::VoiceTone => voice_tone.push(line),
            Bucket::KeyPhrases => key_phrases.push(line),
            Bucket::Structure => structure.push(line),
            Bucket::Themes => themes.push(line),
            Bucket::Examples => examples.push(line),
            Bucket::Avoid => avoid.push(line),
            Bucket::Unsectioned => unsectioned.push(line),
        }
    }

    let join = |lines: Vec<&str>| lines.join("\n").trim().to_string();

    StyleGuideSections {
        voice_tone: join(voice_tone),
        key_phrases: join(key_phrases),
        structure: join(structure),
        themes: join(themes),
        examples: join(examples),
        things_to_avoid: join(avoid),
        unsectioned: join(unsectioned),
    }
}

/// Returns the heading text when the line is a heading (`#`-prefixed or
/// ALL-CAPS), `None` for body lines.
fn heading_text(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        let text = trimmed.trim_start_matches('#').trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
        return None;
    }

    let is_caps = trimmed.len() >= 4
        && trimmed.len() < 80
        && trimmed.chars().any(|c| c.is_alphabetic())
        && trimmed == trimmed.to_uppercase();
    if is_caps {
        return Some(trimmed.to_string());
    }

    None
}

fn bucket_for(heading: &str) -> Option<Bucket> {
    let lowered = heading.to_lowercase();
    if lowered.contains("voice") || lowered.contains("tone") {
        Some(Bucket::VoiceTone)
    } else if lowered.contains("phrase") {
        Some(Bucket::KeyPhrases)
    } else if lowered.contains("structure") || lowered.contains("format") {
        Some(Bucket::Structure)
    } else if lowered.contains("theme") || lowered.contains("messag") {
        Some(Bucket::Themes)
    } else if lowered.contains("example") {
        Some(Bucket::Examples)
    } else if lowered.contains("avoid") || lowered.contains("don't") || lowered.contains("do not") {
        Some(Bucket::Avoid)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_tone_section_round_trips() {
        let doc = "## Voice & Tone\nWarm but direct.\nNo filler words.";
        let sections = parse_guide_sections(doc);
        assert_eq!(sections.voice_tone, "Warm but direct.\nNo filler words.");
    }

    #[test]
    fn all_caps_headings_work_too() {
        let doc = "THINGS TO AVOID\nJargon.\nEmpty promises.";
        let sections = parse_guide_sections(doc);
        assert_eq!(sections.things_to_avoid, "Jargon.\nEmpty promises.");
    }

    #[test]
    fn unknown_headings_fall_into_unsectioned() {
        let doc = "Preamble text.\n## Mystery Section\nKept content.";
        let sections = parse_guide_sections(doc);
        assert!(sections.unsectioned.contains("Preamble text."));
        assert!(sections.unsectioned.contains("## Mystery Section"));
        assert!(sections.unsectioned.contains("Kept content."));
    }

    #[test]
    fn multiple_sections_split_cleanly() {
        let doc = "## Voice & Tone\nDirect.\n\n## Key Phrases\n\"Ship it\"\n\n## Examples\nA cold email.";
        let sections = parse_guide_sections(doc);
        assert_eq!(sections.voice_tone, "Direct.");
        assert_eq!(sections.key_phrases, "\"Ship it\"");
        assert_eq!(sections.examples, "A cold email.");
    }
}
