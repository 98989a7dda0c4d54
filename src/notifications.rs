//! Notification composition and dispatch.
//!
//! Two independent, best-effort sends per submission: an instant
//! acknowledgment to the lead (composed from the raw submission only, so it
//! can go out before any other stage runs) and an internal sales
//! notification carrying the full score breakdown and enrichment output.

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{
    LeadScore, LeadSubmission, ResearchResult, StyleGuideSet, WebPresenceScore,
};
use crate::services::{EmailAttachment, EmailMessage, PostmarkService};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub struct NotificationDispatcher<'a> {
    postmark: &'a PostmarkService,
    config: &'a Config,
}

impl<'a> NotificationDispatcher<'a> {
    pub fn new(postmark: &'a PostmarkService, config: &'a Config) -> Self {
        Self { postmark, config }
    }

    /// Sends the instant acknowledgment to the lead.
    pub async fn send_acknowledgment(&self, submission: &LeadSubmission) -> Result<(), AppError> {
        let message = compose_acknowledgment(submission, &self.config.email_from);
        self.postmark
            .send_email(&message)
            .await
            .context("Acknowledgment send")
    }

    /// Sends the internal sales notification with everything the pipeline
    /// produced so far.
    pub async fn send_sales_notification(
        &self,
        submission: &LeadSubmission,
        score: Option<&LeadScore>,
        presence: Option<&WebPresenceScore>,
        research: Option<&ResearchResult>,
        guides: Option<&StyleGuideSet>,
    ) -> Result<(), AppError> {
        let message = compose_sales_notification(
            submission,
            score,
            presence,
            research,
            guides,
            &self.config.email_from,
            &self.config.sales_email,
        );
        self.postmark
            .send_email(&message)
            .await
            .context("Sales notification send")
    }
}

/// Composes the acknowledgment from the raw submission only; no dependency
/// on any other pipeline stage.
pub fn compose_acknowledgment(submission: &LeadSubmission, from: &str) -> EmailMessage {
    let first_name = submission.name.split_whitespace().next().unwrap_or("there");

    let subject = "We received your automation inquiry".to_string();

    let text_body = format!(
        "Hi {first_name},\n\n\
Thanks for telling us about {company}. Your inquiry is in front of our team now.\n\n\
What you told us:\n\
- Goals: {goals}\n\
- Timeline: {timeline}\n\
- Budget: {budget}\n\n\
You'll hear from us within 1-2 business days with a concrete next step.\n\n\
Talk soon",
        first_name = first_name,
        company = submission.company,
        goals = submission.automation_goals.join(", "),
        timeline = submission.timeline.label(),
        budget = submission.budget.label(),
    );

    let html_body = format!(
        "<p>Hi {first_name},</p>\
<p>Thanks for telling us about <strong>{company}</strong>. Your inquiry is in front of our team now.</p>\
<p>What you told us:</p>\
<ul><li>Goals: {goals}</li><li>Timeline: {timeline}</li><li>Budget: {budget}</li></ul>\
<p>You'll hear from us within 1-2 business days with a concrete next step.</p>\
<p>Talk soon</p>",
        first_name = escape_html(first_name),
        company = escape_html(&submission.company),
        goals = escape_html(&submission.automation_goals.join(", ")),
        timeline = submission.timeline.label(),
        budget = submission.budget.label(),
    );

    EmailMessage {
        from: from.to_string(),
        to: submission.email.clone(),
        cc: None,
        subject,
        html_body,
        text_body,
        attachments: vec![],
    }
}

/// Composes the sales notification. The subject is prefixed with the rating
/// tier for triage at a glance; style-guide PDFs ride along as attachments.
pub fn compose_sales_notification(
    submission: &LeadSubmission,
    score: Option<&LeadScore>,
    presence: Option<&WebPresenceScore>,
    research: Option<&ResearchResult>,
    guides: Option<&StyleGuideSet>,
    from: &str,
    to: &str,
) -> EmailMessage {
    let subject = match score {
        Some(score) => format!(
            "{} New lead: {} ({}/{})",
            score.rating.subject_prefix(),
            submission.company,
            score.total,
            score.max_total
        ),
        None => format!("New lead: {} (unscored)", submission.company),
    };

    let mut html = String::new();
    let mut text = String::new();

    html.push_str(&format!(
        "<h2>New lead: {}</h2>\
<p><strong>{}</strong> ({}) &mdash; {} &middot; {}</p>\
<p>Email: {} &middot; Phone: {}</p>",
        escape_html(&submission.company),
        escape_html(&submission.name),
        escape_html(&submission.email),
        submission.industry.label(),
        submission.business_size.label(),
        escape_html(&submission.email),
        escape_html(&submission.phone),
    ));
    text.push_str(&format!(
        "New lead: {}\n{} <{}> / {}\n{} / {}\n\n",
        submission.company,
        submission.name,
        submission.email,
        submission.phone,
        submission.industry.label(),
        submission.business_size.label(),
    ));

    if let Some(score) = score {
        html.push_str(&format!(
            "<h3>Score: {}/{} ({})</h3><table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">\
<tr><th>Category</th><th>Score</th><th>Reason</th></tr>",
            score.total,
            score.max_total,
            score.rating.label()
        ));
        text.push_str(&format!(
            "Score: {}/{} ({})\n",
            score.total,
            score.max_total,
            score.rating.label()
        ));
        for entry in &score.breakdown {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}/{}</td><td>{}</td></tr>",
                escape_html(&entry.category),
                entry.score,
                entry.max_score,
                escape_html(&entry.reason)
            ));
            text.push_str(&format!(
                "  {}: {}/{} - {}\n",
                entry.category, entry.score, entry.max_score, entry.reason
            ));
        }
        html.push_str("</table>");

        push_list(&mut html, &mut text, "Insights", &score.insights);
        push_list(&mut html, &mut text, "Red flags", &score.red_flags);
        push_list(&mut html, &mut text, "Opportunities", &score.opportunities);
    }

    if let Some(presence) = presence {
        html.push_str(&format!(
            "<h3>Web presence: {}/100 ({} maturity)</h3>",
            presence.overall,
            presence.maturity.label()
        ));
        text.push_str(&format!(
            "\nWeb presence: {}/100 ({} maturity)\n",
            presence.overall,
            presence.maturity.label()
        ));
        if let Some(website) = &presence.website {
            let status = if website.accessible {
                "reachable".to_string()
            } else {
                format!(
                    "unreachable ({})",
                    website.error.as_deref().unwrap_or("unknown")
                )
            };
            html.push_str(&format!(
                "<p>Website {} &mdash; {}</p>",
                escape_html(&website.url),
                escape_html(&status)
            ));
            text.push_str(&format!("  Website {} - {}\n", website.url, status));
        }
        push_list(
            &mut html,
            &mut text,
            "Recommendations",
            &presence.recommendations,
        );
    }

    if let Some(research) = research {
        push_narrative(&mut html, &mut text, "Industry insights", &research.industry_insights);
        push_narrative(
            &mut html,
            &mut text,
            "Competitive analysis",
            &research.competitive_analysis,
        );
        push_list(
            &mut html,
            &mut text,
            "Automation opportunities",
            &research.automation_opportunities,
        );
        push_narrative(&mut html, &mut text, "ROI", &research.roi_analysis);
        push_narrative(
            &mut html,
            &mut text,
            "Implementation strategy",
            &research.implementation_strategy,
        );
        push_list(&mut html, &mut text, "Challenges", &research.challenges);
        push_narrative(
            &mut html,
            &mut text,
            "Recommended approach",
            &research.recommended_approach,
        );
    }

    let attachments = guides
        .map(|set| {
            vec![
                pdf_attachment("company-voice-guide.pdf", &set.company_guide.pdf),
                pdf_attachment("contact-engagement-guide.pdf", &set.contact_guide.pdf),
            ]
        })
        .unwrap_or_default();

    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        cc: None,
        subject,
        html_body: html,
        text_body: text,
        attachments,
    }
}

fn pdf_attachment(name: &str, bytes: &[u8]) -> EmailAttachment {
    EmailAttachment {
        name: name.to_string(),
        content: BASE64.encode(bytes),
        content_type: "application/pdf".to_string(),
    }
}

fn push_list(html: &mut String, text: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    html.push_str(&format!("<h4>{}</h4><ul>", title));
    text.push_str(&format!("\n{}:\n", title));
    for item in items {
        html.push_str(&format!("<li>{}</li>", escape_html(item)));
        text.push_str(&format!("  - {}\n", item));
    }
    html.push_str("</ul>");
}

fn push_narrative(html: &mut String, text: &mut String, title: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    html.push_str(&format!(
        "<h4>{}</h4><p>{}</p>",
        title,
        escape_html(body).replace('\n', "<br>")
    ));
    text.push_str(&format!("\n{}:\n{}\n", title, body));
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, ScoreBreakdown};

    fn submission() -> LeadSubmission {
        serde_json::from_value(serde_json::json!({
            "name": "Jane Doe",
            "email": "jane@acme.test",
            "phone": "+1 555 0100",
            "company": "Acme <Widgets>",
            "industry": "retail",
            "businessSize": "6-20",
            "currentProcess": "Spreadsheets",
            "monthlyVolume": "100_500",
            "teamSize": "3-10",
            "automationGoals": ["save_time"],
            "automationDescription": "Less typing",
            "currentIntegrations": "Sheets",
            "dataVolume": "low",
            "projectDescription": "Automate reports",
            "successMetrics": "Hours saved",
            "timeline": "immediate",
            "budget": "25k_50k"
        }))
        .unwrap()
    }

    #[test]
    fn acknowledgment_needs_only_the_submission() {
        let message = compose_acknowledgment(&submission(), "hello@consultancy.test");
        assert_eq!(message.to, "jane@acme.test");
        assert!(message.text_body.contains("Jane"));
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn sales_subject_carries_rating_prefix() {
        let score = LeadScore {
            total: 120,
            max_total: 140,
            rating: Rating::High,
            breakdown: vec![ScoreBreakdown {
                category: "Budget".to_string(),
                score: 30,
                max_score: 30,
                reason: "top bracket".to_string(),
            }],
            insights: vec![],
            red_flags: vec![],
            opportunities: vec![],
        };
        let message = compose_sales_notification(
            &submission(),
            Some(&score),
            None,
            None,
            None,
            "hello@consultancy.test",
            "sales@consultancy.test",
        );
        assert!(message.subject.starts_with("[HIGH PRIORITY]"));
        assert!(message.subject.contains("120/140"));
        assert!(message.html_body.contains("Acme &lt;Widgets&gt;"));
    }

    #[test]
    fn unscored_lead_still_notifies() {
        let message = compose_sales_notification(
            &submission(),
            None,
            None,
            None,
            None,
            "a@b.test",
            "c@d.test",
        );
        assert!(message.subject.contains("unscored"));
    }
}
