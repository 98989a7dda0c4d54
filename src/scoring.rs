//! Lead scoring engine.
//!
//! Pure function of a `LeadSubmission`: eight weighted sub-scores summed into
//! a total out of 140, a Low/Medium/High tier, and three advisory rule sets
//! (insights, red flags, opportunities). No I/O, total over any valid
//! submission.

use crate::models::{
    Budget, BusinessSize, DataVolume, LeadScore, LeadSubmission, Rating, ScoreBreakdown, Timeline,
};

/// Sum of the eight sub-score maximums.
pub const MAX_TOTAL: u32 = 140;

const HIGH_THRESHOLD: f64 = 0.70;
const MEDIUM_THRESHOLD: f64 = 0.45;

/// Distress/urgency vocabulary scanned across the free-text fields.
const URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediately",
    "critical",
    "overwhelmed",
    "drowning",
    "struggling",
    "losing",
    "behind",
    "bottleneck",
    "manual",
    "firefighting",
];

/// Integration-category tag that indicates bespoke systems work.
const CUSTOM_SOFTWARE_TAG: &str = "custom_software";

/// Computes the full lead score for a submission.
pub fn score_lead(submission: &LeadSubmission) -> LeadScore {
    let mut breakdown = Vec::with_capacity(8);

    breakdown.push(budget_score(submission));
    breakdown.push(project_definition_score(submission));
    breakdown.push(timeframe_score(submission));
    breakdown.push(contact_intent_score(submission));
    breakdown.push(business_size_score(submission));
    breakdown.push(urgency_language_score(submission));
    breakdown.push(clarity_score(submission));
    breakdown.push(integration_complexity_score(submission));

    let total: u32 = breakdown.iter().map(|entry| entry.score).sum();
    let rating = rating_for(total);

    LeadScore {
        total,
        max_total: MAX_TOTAL,
        rating,
        breakdown,
        insights: collect_insights(submission),
        red_flags: collect_red_flags(submission),
        opportunities: collect_opportunities(submission),
    }
}

/// Rating thresholds over percentage-of-max: >=70% High, >=45% Medium.
pub fn rating_for(total: u32) -> Rating {
    let pct = f64::from(total) / f64::from(MAX_TOTAL);
    if pct >= HIGH_THRESHOLD {
        Rating::High
    } else if pct >= MEDIUM_THRESHOLD {
        Rating::Medium
    } else {
        Rating::Low
    }
}

fn budget_score(submission: &LeadSubmission) -> ScoreBreakdown {
    // "not sure" scores moderately so uncertainty alone is not penalized
    let score = match submission.budget {
        Budget::Under10k => 5,
        Budget::From10kTo25k => 12,
        Budget::From25kTo50k => 18,
        Budget::From50kTo100k => 24,
        Budget::Over100k => 30,
        Budget::NotSure => 10,
    };
    ScoreBreakdown {
        category: "Budget".to_string(),
        score,
        max_score: 30,
        reason: format!("Stated budget: {}", submission.budget.label()),
    }
}

fn project_definition_score(submission: &LeadSubmission) -> ScoreBreakdown {
    let ideas = submission.project_ideas.len();
    let broad_goals = submission.automation_goals.len() >= 3;
    let long_process = submission.current_process.len() > 200;

    let (score, reason) = if ideas >= 2 {
        (
            25,
            format!("{} explicit project ideas submitted", ideas),
        )
    } else if ideas == 1 && (broad_goals || long_process) {
        (
            18,
            "One project idea with substantial supporting detail".to_string(),
        )
    } else if broad_goals && long_process {
        (
            12,
            "Broad goals and a detailed process description, no concrete project yet".to_string(),
        )
    } else {
        (0, "Ask is not yet concrete".to_string())
    };

    ScoreBreakdown {
        category: "Project definition".to_string(),
        score,
        max_score: 25,
        reason,
    }
}

fn timeframe_score(submission: &LeadSubmission) -> ScoreBreakdown {
    let score = match submission.timeline {
        Timeline::Immediate => 20,
        Timeline::OneToThreeMonths => 15,
        Timeline::ThreeToSixMonths => 10,
        Timeline::SixPlusMonths => 5,
    };
    ScoreBreakdown {
        category: "Timeframe".to_string(),
        score,
        max_score: 20,
        reason: format!("Timeline: {}", submission.timeline.label()),
    }
}

/// Proxy for sales-readiness. There is no explicit "book a call" field on the
/// form, so immediacy, budget tier, and detail length stand in for it.
fn contact_intent_score(submission: &LeadSubmission) -> ScoreBreakdown {
    let timeline_part = match submission.timeline {
        Timeline::Immediate => 10,
        Timeline::OneToThreeMonths => 7,
        Timeline::ThreeToSixMonths => 4,
        Timeline::SixPlusMonths => 2,
    };
    let budget_part = match submission.budget {
        Budget::Over100k => 8,
        Budget::From50kTo100k => 7,
        Budget::From25kTo50k => 5,
        Budget::From10kTo25k => 3,
        Budget::NotSure => 3,
        Budget::Under10k => 1,
    };
    let detail_len = submission.project_description.len() + submission.current_process.len();
    let detail_part = if detail_len > 400 {
        7
    } else if detail_len > 150 {
        4
    } else {
        1
    };

    ScoreBreakdown {
        category: "Contact intent".to_string(),
        score: timeline_part + budget_part + detail_part,
        max_score: 25,
        reason: "Composite of timeline immediacy, budget tier, and submission detail".to_string(),
    }
}

fn business_size_score(submission: &LeadSubmission) -> ScoreBreakdown {
    let score = match submission.business_size {
        BusinessSize::Micro => 2,
        BusinessSize::Small => 4,
        BusinessSize::Medium => 6,
        BusinessSize::Large => 8,
        BusinessSize::Enterprise => 10,
    };
    ScoreBreakdown {
        category: "Business size".to_string(),
        score,
        max_score: 10,
        reason: format!("Company size: {}", submission.business_size.label()),
    }
}

fn urgency_language_score(submission: &LeadSubmission) -> ScoreBreakdown {
    let timeline_part = match submission.timeline {
        Timeline::Immediate => 5,
        Timeline::OneToThreeMonths => 3,
        Timeline::ThreeToSixMonths => 1,
        Timeline::SixPlusMonths => 0,
    };

    let matches = count_urgency_keywords(submission);
    let keyword_part = match matches {
        0 => 0,
        1 => 2,
        2 => 3,
        _ => 5,
    };

    ScoreBreakdown {
        category: "Urgency".to_string(),
        score: timeline_part + keyword_part,
        max_score: 10,
        reason: format!("{} urgency keyword match(es) in free text", matches),
    }
}

/// Counts distinct urgency keywords across the three free-text fields,
/// case-insensitively.
pub fn count_urgency_keywords(submission: &LeadSubmission) -> usize {
    let haystack = format!(
        "{} {} {}",
        submission.current_process, submission.automation_description, submission.project_description
    )
    .to_lowercase();

    URGENCY_KEYWORDS
        .iter()
        .filter(|keyword| haystack.contains(*keyword))
        .count()
}

fn clarity_score(submission: &LeadSubmission) -> ScoreBreakdown {
    // Raw string length, not word count
    let mut score = 0;
    if submission.project_description.len() > 200 {
        score += 3;
    }
    if submission.current_process.len() > 200 {
        score += 3;
    }
    if submission.success_metrics.len() > 100 {
        score += 2;
    }
    if !submission.project_ideas.is_empty() {
        score += 2;
    }

    ScoreBreakdown {
        category: "Clarity".to_string(),
        score,
        max_score: 10,
        reason: "Credit for detailed descriptions, metrics, and concrete ideas".to_string(),
    }
}

fn integration_complexity_score(submission: &LeadSubmission) -> ScoreBreakdown {
    let tag_count = submission.integration_needs.len();
    let mut score = if tag_count >= 4 {
        4
    } else if tag_count >= 2 {
        2
    } else {
        0
    };

    if submission
        .integration_needs
        .iter()
        .any(|tag| tag == CUSTOM_SOFTWARE_TAG)
    {
        score += 2;
    }

    score += match submission.data_volume {
        DataVolume::Low => 1,
        DataVolume::Medium => 2,
        DataVolume::High => 3,
        DataVolume::VeryHigh => 4,
    };

    ScoreBreakdown {
        category: "Integration complexity".to_string(),
        score,
        max_score: 10,
        reason: format!(
            "{} integration categories, {} data volume",
            tag_count,
            submission.data_volume.label()
        ),
    }
}

// ============ Advisory rule sets ============

fn collect_insights(submission: &LeadSubmission) -> Vec<String> {
    let mut insights = Vec::new();

    if matches!(submission.budget, Budget::From50kTo100k | Budget::Over100k)
        && matches!(
            submission.timeline,
            Timeline::Immediate | Timeline::OneToThreeMonths
        )
    {
        insights.push(
            "Budget and timeline both signal a buyer who is ready to move".to_string(),
        );
    }
    if submission.project_ideas.len() >= 2 {
        insights.push(format!(
            "Arrived with a {}-item automation roadmap already sketched out",
            submission.project_ideas.len()
        ));
    }
    if submission.industry.is_regulated() {
        insights.push(format!(
            "{} is a regulated industry; compliance-aware positioning will matter",
            submission.industry.label()
        ));
    }
    if matches!(
        submission.business_size,
        BusinessSize::Large | BusinessSize::Enterprise
    ) {
        insights.push(
            "Larger organization: automation wins compound across many seats".to_string(),
        );
    }
    if count_urgency_keywords(submission) >= 2 {
        insights.push("Free text carries distress language; pain is present-tense".to_string());
    }

    insights
}

fn collect_red_flags(submission: &LeadSubmission) -> Vec<String> {
    let mut flags = Vec::new();

    if submission.budget == Budget::Under10k && submission.project_ideas.len() >= 3 {
        flags.push(
            "Budget bracket may not cover the breadth of projects described".to_string(),
        );
    }
    if submission.budget == Budget::NotSure && submission.timeline == Timeline::SixPlusMonths {
        flags.push("No budget and a distant timeline; likely early research".to_string());
    }
    if submission.project_description.len() < 50 {
        flags.push("Project description is very thin; discovery will be needed".to_string());
    }
    if submission.automation_description.len() < 30 && submission.project_ideas.is_empty() {
        flags.push("Automation intent is vague and carries no concrete ideas".to_string());
    }

    flags
}

fn collect_opportunities(submission: &LeadSubmission) -> Vec<String> {
    let mut opportunities = Vec::new();

    if submission
        .integration_needs
        .iter()
        .any(|tag| tag == CUSTOM_SOFTWARE_TAG)
    {
        opportunities.push(
            "Custom-software integration flagged: room for bespoke connector work".to_string(),
        );
    }
    if matches!(
        submission.data_volume,
        DataVolume::High | DataVolume::VeryHigh
    ) {
        opportunities.push(
            "High data volume: data-pipeline automation is a natural first engagement".to_string(),
        );
    }
    if matches!(
        submission.monthly_volume,
        crate::models::MonthlyVolume::From500To2000 | crate::models::MonthlyVolume::Over2000
    ) {
        opportunities.push(
            "Transaction volume is high enough for per-unit savings to add up fast".to_string(),
        );
    }
    if submission.website.is_none() {
        opportunities.push(
            "No website on file: digital-presence work could accompany automation".to_string(),
        );
    }
    if submission.integration_needs.len() >= 4 {
        opportunities.push(
            "Many systems to connect: phased integration roadmap is an easy upsell".to_string(),
        );
    }

    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Industry, MonthlyVolume, Priority, ProjectIdea, TeamSize};

    fn base_submission() -> LeadSubmission {
        LeadSubmission {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+1 555 0100".to_string(),
            company: "Acme Services".to_string(),
            website: Some("https://acme.example.com".to_string()),
            social_links: vec![],
            industry: Industry::ProfessionalServices,
            business_size: BusinessSize::Small,
            current_process: "Spreadsheets and email".to_string(),
            monthly_volume: MonthlyVolume::From100To500,
            team_size: TeamSize::ThreeToTen,
            automation_goals: vec!["save_time".to_string()],
            automation_description: "We want fewer manual steps".to_string(),
            project_ideas: vec![],
            current_integrations: "Gmail, Sheets".to_string(),
            integration_needs: vec![],
            data_volume: DataVolume::Low,
            project_description: "Automate invoicing".to_string(),
            success_metrics: "Fewer hours on admin".to_string(),
            timeline: Timeline::ThreeToSixMonths,
            budget: Budget::From10kTo25k,
        }
    }

    #[test]
    fn total_is_bounded() {
        let score = score_lead(&base_submission());
        assert!(score.total <= MAX_TOTAL);
        assert_eq!(score.max_total, MAX_TOTAL);
        assert_eq!(score.breakdown.len(), 8);
    }

    #[test]
    fn two_project_ideas_max_out_project_definition() {
        let mut submission = base_submission();
        submission.project_ideas = vec![
            ProjectIdea {
                title: "Invoice automation".to_string(),
                description: "Generate and send invoices automatically".to_string(),
                priority: Priority::High,
            },
            ProjectIdea {
                title: "Lead routing".to_string(),
                description: "Route inbound leads to the right rep".to_string(),
                priority: Priority::Medium,
            },
        ];

        let score = score_lead(&submission);
        let entry = score
            .breakdown
            .iter()
            .find(|b| b.category == "Project definition")
            .unwrap();
        assert_eq!(entry.score, 25);
        assert_eq!(entry.max_score, 25);
    }

    #[test]
    fn not_sure_budget_scores_between_extremes() {
        let mut submission = base_submission();

        submission.budget = Budget::Under10k;
        let low = score_lead(&submission).total;

        submission.budget = Budget::NotSure;
        let not_sure = score_lead(&submission).total;

        submission.budget = Budget::Over100k;
        let high = score_lead(&submission).total;

        assert!(not_sure > low);
        assert!(not_sure < high);
    }

    #[test]
    fn urgency_keywords_counted_case_insensitively() {
        let mut submission = base_submission();
        submission.current_process = "Everything is MANUAL and we are DROWNING".to_string();
        submission.project_description = "This is urgent".to_string();

        assert_eq!(count_urgency_keywords(&submission), 3);
    }

    #[test]
    fn empty_optional_arrays_do_not_panic() {
        let mut submission = base_submission();
        submission.project_ideas = vec![];
        submission.integration_needs = vec![];
        submission.social_links = vec![];
        let score = score_lead(&submission);
        assert!(score.total <= MAX_TOTAL);
    }
}
