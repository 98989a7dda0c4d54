//! CRM recording.
//!
//! Maps one evaluated submission onto CRM records: Client (find-or-create),
//! Contact, IntakeForm, style-guide records, Proposal with content blocks,
//! and Estimates. Every step is independently fallible; a failed step is
//! logged and skipped past, and steps that depend on an id from a failed
//! step are skipped rather than retried.

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{
    LeadScore, LeadSubmission, ResearchResult, StyleGuide, Timeline, WebPresenceScore,
};
use crate::services::{CrmPage, NotionService};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::{json, Value};

/// The CRM caps rich-text property values; longer free text is clipped and
/// carried in full as content blocks instead.
const RICH_TEXT_LIMIT: usize = 2000;

/// Upper bound on one paragraph block's text.
const PARAGRAPH_LIMIT: usize = 1800;

pub struct CrmRecorder<'a> {
    notion: &'a NotionService,
    config: &'a Config,
}

impl<'a> CrmRecorder<'a> {
    pub fn new(notion: &'a NotionService, config: &'a Config) -> Self {
        Self { notion, config }
    }

    /// Step 1: find the Client record by exact company-name title match, or
    /// create it. Returns the page and whether it was newly created.
    ///
    /// The lookup is exact and case-sensitive so distinct companies are
    /// never merged. Two concurrent first-time submissions for the same
    /// company can still race into duplicate Clients; see DESIGN.md.
    pub async fn find_or_create_client(
        &self,
        submission: &LeadSubmission,
    ) -> Result<(CrmPage, bool), AppError> {
        if let Some(existing) = self
            .notion
            .find_page_by_title(&self.config.notion_clients_db, &submission.company)
            .await
            .context("Client lookup")?
        {
            tracing::info!("Found existing client record for {}", submission.company);
            // refresh the website field on repeat submissions
            if let Some(website) = submission.website.as_deref().filter(|w| !w.is_empty()) {
                if let Err(e) = self
                    .notion
                    .update_page(&existing.id, json!({ "Website": url_prop(website) }))
                    .await
                {
                    tracing::warn!("Failed to refresh client website: {}", e);
                }
            }
            return Ok((existing, false));
        }

        let mut properties = json!({
            "Name": title_prop(&submission.company),
            "Type": select_prop("Prospect"),
            "Industry": select_prop(submission.industry.label()),
        });
        if let Some(website) = submission.website.as_deref().filter(|w| !w.is_empty()) {
            properties["Website"] = url_prop(website);
        }

        let page = self
            .notion
            .create_page(&self.config.notion_clients_db, properties)
            .await
            .context("Client create")?;

        tracing::info!(
            "Created client record for {} ({})",
            submission.company,
            page.id
        );
        Ok((page, true))
    }

    /// Step 2: create the Contact, linked to the Client. Never called
    /// without a Client id; a Contact must not exist without one.
    pub async fn create_contact(
        &self,
        submission: &LeadSubmission,
        client_id: &str,
    ) -> Result<CrmPage, AppError> {
        let properties = json!({
            "Name": title_prop(&submission.name),
            "Email": email_prop(&submission.email),
            "Phone": phone_prop(&submission.phone),
            "Company": rich_text_prop(&submission.company),
            "Client": relation_prop(client_id),
        });

        let page = self
            .notion
            .create_page(&self.config.notion_contacts_db, properties)
            .await
            .context("Contact create")?;

        tracing::info!("Created contact record for {} ({})", submission.name, page.id);
        Ok(page)
    }

    /// Step 3: create the IntakeForm record holding every submission field
    /// plus score-derived annotations and the computed follow-up date.
    pub async fn create_intake_form(
        &self,
        submission: &LeadSubmission,
        score: Option<&LeadScore>,
        presence: Option<&WebPresenceScore>,
        client_id: Option<&str>,
    ) -> Result<(CrmPage, NaiveDate), AppError> {
        let follow_up = follow_up_date(submission.timeline, Utc::now());

        let project_ideas_summary = submission
            .project_ideas
            .iter()
            .enumerate()
            .map(|(i, idea)| format!("{}. {} [{}]: {}", i + 1, idea.title, idea.priority.label(), idea.description))
            .collect::<Vec<_>>()
            .join("\n");

        let mut properties = json!({
            "Name": title_prop(&format!("{} - {}", submission.company, submission.name)),
            "Email": email_prop(&submission.email),
            "Phone": phone_prop(&submission.phone),
            "Industry": select_prop(submission.industry.label()),
            "Business Size": select_prop(submission.business_size.label()),
            "Current Process": rich_text_prop(&submission.current_process),
            "Monthly Volume": select_prop(submission.monthly_volume.label()),
            "Team Size": select_prop(submission.team_size.label()),
            "Automation Goals": multi_select_prop(&submission.automation_goals),
            "Automation Description": rich_text_prop(&submission.automation_description),
            "Current Integrations": rich_text_prop(&submission.current_integrations),
            "Integration Needs": multi_select_prop(&submission.integration_needs),
            "Data Volume": select_prop(submission.data_volume.label()),
            "Project Description": rich_text_prop(&submission.project_description),
            "Success Metrics": rich_text_prop(&submission.success_metrics),
            "Timeline": select_prop(submission.timeline.label()),
            "Budget": select_prop(submission.budget.label()),
            "Follow-up Date": date_prop(follow_up),
        });

        if let Some(website) = submission.website.as_deref().filter(|w| !w.is_empty()) {
            properties["Website"] = url_prop(website);
        }
        if !submission.social_links.is_empty() {
            properties["Social Links"] = rich_text_prop(&submission.social_links.join("\n"));
        }
        if !project_ideas_summary.is_empty() {
            properties["Project Ideas"] = rich_text_prop(&project_ideas_summary);
        }
        if let Some(score) = score {
            properties["Score"] = number_prop(f64::from(score.total));
            properties["Rating"] = select_prop(score.rating.label());
            if !score.insights.is_empty() {
                properties["Insights"] = rich_text_prop(&score.insights.join("\n"));
            }
            if !score.red_flags.is_empty() {
                properties["Red Flags"] = rich_text_prop(&score.red_flags.join("\n"));
            }
            if !score.opportunities.is_empty() {
                properties["Opportunities"] = rich_text_prop(&score.opportunities.join("\n"));
            }
        }
        if let Some(presence) = presence {
            properties["Web Presence Score"] = number_prop(f64::from(presence.overall));
            properties["Digital Maturity"] = select_prop(presence.maturity.label());
        }
        if let Some(client_id) = client_id {
            properties["Client"] = relation_prop(client_id);
        }

        let page = self
            .notion
            .create_page(&self.config.notion_intake_db, properties)
            .await
            .context("Intake form create")?;

        tracing::info!("Created intake form ({})", page.id);
        Ok((page, follow_up))
    }

    /// Step 4a: company style-guide record, linked to the Client, parsed
    /// sections as properties and the full text as content blocks.
    pub async fn create_company_guide_record(
        &self,
        submission: &LeadSubmission,
        guide: &StyleGuide,
        client_id: &str,
    ) -> Result<CrmPage, AppError> {
        self.create_guide_record(
            &self.config.notion_company_guides_db,
            &format!("{} - {}", submission.company, guide.title),
            guide,
            "Client",
            client_id,
        )
        .await
        .context("Company style guide create")
    }

    /// Step 4b: contact style-guide record, linked to the Contact.
    pub async fn create_contact_guide_record(
        &self,
        submission: &LeadSubmission,
        guide: &StyleGuide,
        contact_id: &str,
    ) -> Result<CrmPage, AppError> {
        self.create_guide_record(
            &self.config.notion_contact_guides_db,
            &format!("{} - {}", submission.company, guide.title),
            guide,
            "Contact",
            contact_id,
        )
        .await
        .context("Contact style guide create")
    }

    async fn create_guide_record(
        &self,
        database_id: &str,
        title: &str,
        guide: &StyleGuide,
        relation_name: &str,
        relation_id: &str,
    ) -> Result<CrmPage, AppError> {
        let sections = &guide.sections;
        let mut properties = json!({
            "Name": title_prop(title),
            "Voice & Tone": rich_text_prop(&sections.voice_tone),
            "Key Phrases": rich_text_prop(&sections.key_phrases),
            "Structure": rich_text_prop(&sections.structure),
            "Themes": rich_text_prop(&sections.themes),
            "Examples": rich_text_prop(&sections.examples),
            "Things to Avoid": rich_text_prop(&sections.things_to_avoid),
        });
        properties[relation_name] = relation_prop(relation_id);
        if !sections.unsectioned.is_empty() {
            properties["Unsectioned"] = rich_text_prop(&sections.unsectioned);
        }

        let page = self.notion.create_page(database_id, properties).await?;

        // Full text travels as blocks; property values are clipped.
        let blocks = text_to_paragraph_blocks(&guide.content);
        self.notion.append_blocks(&page.id, &blocks).await?;

        tracing::info!("Created style guide record {} ({})", title, page.id);
        Ok(page)
    }

    /// Step 5: create the Proposal with its rendered content blocks.
    pub async fn create_proposal(
        &self,
        submission: &LeadSubmission,
        score: Option<&LeadScore>,
        research: Option<&ResearchResult>,
        client_id: Option<&str>,
    ) -> Result<CrmPage, AppError> {
        let mut properties = json!({
            "Name": title_prop(&format!("Automation Proposal - {}", submission.company)),
            "Status": select_prop("Draft"),
            "Timeline": select_prop(submission.timeline.label()),
            "Budget": select_prop(submission.budget.label()),
        });
        if let Some(client_id) = client_id {
            properties["Client"] = relation_prop(client_id);
        }

        let page = self
            .notion
            .create_page(&self.config.notion_proposals_db, properties)
            .await
            .context("Proposal create")?;

        let blocks = proposal_blocks(submission, score, research);
        self.notion
            .append_blocks(&page.id, &blocks)
            .await
            .context("Proposal content append")?;

        tracing::info!("Created proposal ({}, {} blocks)", page.id, blocks.len());
        Ok(page)
    }

    /// Step 6: one overall Estimate plus one per project idea, each linked
    /// to the Proposal. Per-item failures are logged and reported without
    /// aborting the remaining items.
    pub async fn create_estimates(
        &self,
        submission: &LeadSubmission,
        proposal_id: &str,
    ) -> (Vec<String>, Vec<String>) {
        let mut ids = Vec::new();
        let mut errors = Vec::new();

        let overall = json!({
            "Name": title_prop(&format!("Overall Engagement - {}", submission.company)),
            "Proposal": relation_prop(proposal_id),
            "Status": select_prop("Draft"),
            "Scope": rich_text_prop(&submission.project_description),
        });
        match self
            .notion
            .create_page(&self.config.notion_estimates_db, overall)
            .await
        {
            Ok(page) => ids.push(page.id),
            Err(e) => {
                tracing::error!("Failed to create overall estimate: {}", e);
                errors.push(format!("Overall estimate create: {}", e));
            }
        }

        for idea in &submission.project_ideas {
            let properties = json!({
                "Name": title_prop(&idea.title),
                "Proposal": relation_prop(proposal_id),
                "Status": select_prop("Draft"),
                "Priority": select_prop(idea.priority.label()),
                "Scope": rich_text_prop(&idea.description),
            });
            match self
                .notion
                .create_page(&self.config.notion_estimates_db, properties)
                .await
            {
                Ok(page) => ids.push(page.id),
                Err(e) => {
                    tracing::error!("Failed to create estimate '{}': {}", idea.title, e);
                    errors.push(format!("Estimate '{}' create: {}", idea.title, e));
                }
            }
        }

        tracing::info!(
            "Created {} estimate(s), {} failure(s)",
            ids.len(),
            errors.len()
        );
        (ids, errors)
    }
}

/// Follow-up date from the stated timeline, in calendar days from `now`.
///
/// Calendar days, not business days: a Friday "immediate" submission gets a
/// Saturday follow-up. This matches the behavior user-facing copy rounds to
/// "business days"; if that copy is ever made authoritative, change it here.
pub fn follow_up_date(timeline: Timeline, now: DateTime<Utc>) -> NaiveDate {
    let days = match timeline {
        Timeline::Immediate => 1,
        Timeline::OneToThreeMonths => 2,
        Timeline::ThreeToSixMonths => 5,
        Timeline::SixPlusMonths => 7,
    };
    (now + Duration::days(days)).date_naive()
}

// ============ Property builders ============

fn clip(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn title_prop(text: &str) -> Value {
    json!({ "title": [{ "text": { "content": clip(text, RICH_TEXT_LIMIT) } }] })
}

fn rich_text_prop(text: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": clip(text, RICH_TEXT_LIMIT) } }] })
}

fn select_prop(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

fn multi_select_prop(names: &[String]) -> Value {
    let options: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
    json!({ "multi_select": options })
}

fn number_prop(value: f64) -> Value {
    json!({ "number": value })
}

fn date_prop(date: NaiveDate) -> Value {
    json!({ "date": { "start": date.format("%Y-%m-%d").to_string() } })
}

fn email_prop(email: &str) -> Value {
    json!({ "email": email })
}

fn phone_prop(phone: &str) -> Value {
    json!({ "phone_number": phone })
}

fn url_prop(url: &str) -> Value {
    json!({ "url": url })
}

fn relation_prop(id: &str) -> Value {
    json!({ "relation": [{ "id": id }] })
}

// ============ Block builders ============

fn heading_block(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_2",
        "heading_2": { "rich_text": [{ "text": { "content": clip(text, PARAGRAPH_LIMIT) } }] }
    })
}

fn paragraph_block(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": [{ "text": { "content": clip(text, PARAGRAPH_LIMIT) } }] }
    })
}

fn bulleted_block(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "bulleted_list_item",
        "bulleted_list_item": { "rich_text": [{ "text": { "content": clip(text, PARAGRAPH_LIMIT) } }] }
    })
}

fn numbered_block(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "numbered_list_item",
        "numbered_list_item": { "rich_text": [{ "text": { "content": clip(text, PARAGRAPH_LIMIT) } }] }
    })
}

/// Splits arbitrary text into paragraph blocks under the per-block limit,
/// preferring line boundaries.
pub fn text_to_paragraph_blocks(content: &str) -> Vec<Value> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if current.len() + line.len() + 1 > PARAGRAPH_LIMIT && !current.is_empty() {
            blocks.push(paragraph_block(&current));
            current.clear();
        }
        if line.len() > PARAGRAPH_LIMIT {
            // single oversized line, split hard
            let mut rest = line;
            while rest.len() > PARAGRAPH_LIMIT {
                let cut = clip(rest, PARAGRAPH_LIMIT);
                blocks.push(paragraph_block(cut));
                rest = &rest[cut.len()..];
            }
            current = rest.to_string();
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        blocks.push(paragraph_block(&current));
    }

    blocks
}

/// Renders the proposal body: overview, score summary, opportunities,
/// project ideas, ROI, implementation strategy, success metrics. Empty
/// sections are omitted.
pub fn proposal_blocks(
    submission: &LeadSubmission,
    score: Option<&LeadScore>,
    research: Option<&ResearchResult>,
) -> Vec<Value> {
    let mut blocks = Vec::new();

    blocks.push(heading_block("Overview"));
    blocks.push(paragraph_block(&submission.project_description));
    if !submission.automation_description.is_empty() {
        blocks.push(paragraph_block(&submission.automation_description));
    }

    if let Some(score) = score {
        blocks.push(heading_block("Lead Score Summary"));
        blocks.push(paragraph_block(&format!(
            "Total: {}/{} ({})",
            score.total,
            score.max_total,
            score.rating.label()
        )));
        for entry in &score.breakdown {
            blocks.push(bulleted_block(&format!(
                "{}: {}/{} - {}",
                entry.category, entry.score, entry.max_score, entry.reason
            )));
        }
    }

    let opportunities: Vec<&String> = research
        .map(|r| r.automation_opportunities.iter().collect())
        .filter(|ops: &Vec<&String>| !ops.is_empty())
        .unwrap_or_else(|| {
            score
                .map(|s| s.opportunities.iter().collect())
                .unwrap_or_default()
        });
    if !opportunities.is_empty() {
        blocks.push(heading_block("Automation Opportunities"));
        for opportunity in opportunities {
            blocks.push(bulleted_block(opportunity));
        }
    }

    if !submission.project_ideas.is_empty() {
        blocks.push(heading_block("Project Ideas"));
        for idea in &submission.project_ideas {
            blocks.push(numbered_block(&format!(
                "{} [{}]: {}",
                idea.title,
                idea.priority.label(),
                idea.description
            )));
        }
    }

    if let Some(research) = research {
        if !research.roi_analysis.is_empty() {
            blocks.push(heading_block("Expected ROI"));
            blocks.extend(text_to_paragraph_blocks(&research.roi_analysis));
        }
        if !research.implementation_strategy.is_empty() {
            blocks.push(heading_block("Implementation Strategy"));
            blocks.extend(text_to_paragraph_blocks(&research.implementation_strategy));
        }
    }

    if !submission.success_metrics.is_empty() {
        blocks.push(heading_block("Success Metrics"));
        blocks.push(paragraph_block(&submission.success_metrics));
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn follow_up_dates_add_calendar_days() {
        let friday = Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap();
        assert_eq!(
            follow_up_date(Timeline::Immediate, friday),
            NaiveDate::from_ymd_opt(2025, 1, 4).unwrap()
        );
        assert_eq!(
            follow_up_date(Timeline::OneToThreeMonths, friday),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
        );
        assert_eq!(
            follow_up_date(Timeline::ThreeToSixMonths, friday),
            NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()
        );
        assert_eq!(
            follow_up_date(Timeline::SixPlusMonths, friday),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
    }

    #[test]
    fn clip_respects_char_boundaries() {
        let text = "aaé";
        let clipped = clip(text, 3);
        assert!(clipped.len() <= 3);
        assert!(text.starts_with(clipped));
    }

    #[test]
    fn long_text_splits_into_multiple_paragraph_blocks() {
        let line = "x".repeat(500);
        let content = vec![line; 10].join("\n");
        let blocks = text_to_paragraph_blocks(&content);
        assert!(blocks.len() >= 3);
    }
}
