use crate::errors::AppError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Submission payload ============

/// A prospective customer's intake-form submission.
///
/// This is the immutable input to the whole evaluation pipeline: created once
/// when the form posts, never mutated, owned by the pipeline invocation that
/// received it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    // Contact identity
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub social_links: Vec<String>,

    // Business classification
    pub industry: Industry,
    pub business_size: BusinessSize,

    // Current-state assessment
    /// Free-text description of how the business currently runs the work
    /// it wants automated (tools, spreadsheets, manual steps).
    pub current_process: String,
    pub monthly_volume: MonthlyVolume,
    pub team_size: TeamSize,

    // Automation intent
    pub automation_goals: Vec<String>,
    pub automation_description: String,
    #[serde(default)]
    pub project_ideas: Vec<ProjectIdea>,

    // Integration needs
    /// Free-text list of tools currently in use.
    pub current_integrations: String,
    #[serde(default)]
    pub integration_needs: Vec<String>,
    pub data_volume: DataVolume,

    // Scope
    pub project_description: String,
    pub success_metrics: String,
    pub timeline: Timeline,
    pub budget: Budget,
}

/// One concrete automation project the lead already has in mind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdea {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Ecommerce,
    Healthcare,
    Finance,
    Legal,
    RealEstate,
    Construction,
    ProfessionalServices,
    Marketing,
    Education,
    Hospitality,
    Manufacturing,
    Retail,
    Technology,
    Logistics,
    Other,
}

impl Industry {
    pub fn label(&self) -> &'static str {
        match self {
            Industry::Ecommerce => "E-commerce",
            Industry::Healthcare => "Healthcare",
            Industry::Finance => "Finance",
            Industry::Legal => "Legal",
            Industry::RealEstate => "Real Estate",
            Industry::Construction => "Construction",
            Industry::ProfessionalServices => "Professional Services",
            Industry::Marketing => "Marketing",
            Industry::Education => "Education",
            Industry::Hospitality => "Hospitality",
            Industry::Manufacturing => "Manufacturing",
            Industry::Retail => "Retail",
            Industry::Technology => "Technology",
            Industry::Logistics => "Logistics",
            Industry::Other => "Other",
        }
    }

    /// Industries with meaningful compliance obligations (HIPAA, SOX, bar
    /// rules); the scoring rule sets call these out explicitly.
    pub fn is_regulated(&self) -> bool {
        matches!(
            self,
            Industry::Healthcare | Industry::Finance | Industry::Legal
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessSize {
    #[serde(rename = "1-5")]
    Micro,
    #[serde(rename = "6-20")]
    Small,
    #[serde(rename = "21-50")]
    Medium,
    #[serde(rename = "51-200")]
    Large,
    #[serde(rename = "200+")]
    Enterprise,
}

impl BusinessSize {
    pub fn label(&self) -> &'static str {
        match self {
            BusinessSize::Micro => "1-5 employees",
            BusinessSize::Small => "6-20 employees",
            BusinessSize::Medium => "21-50 employees",
            BusinessSize::Large => "51-200 employees",
            BusinessSize::Enterprise => "200+ employees",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthlyVolume {
    #[serde(rename = "under_100")]
    Under100,
    #[serde(rename = "100_500")]
    From100To500,
    #[serde(rename = "500_2000")]
    From500To2000,
    #[serde(rename = "2000+")]
    Over2000,
}

impl MonthlyVolume {
    pub fn label(&self) -> &'static str {
        match self {
            MonthlyVolume::Under100 => "Under 100 / month",
            MonthlyVolume::From100To500 => "100-500 / month",
            MonthlyVolume::From500To2000 => "500-2,000 / month",
            MonthlyVolume::Over2000 => "2,000+ / month",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamSize {
    #[serde(rename = "1-2")]
    OneToTwo,
    #[serde(rename = "3-10")]
    ThreeToTen,
    #[serde(rename = "11-25")]
    ElevenToTwentyFive,
    #[serde(rename = "25+")]
    OverTwentyFive,
}

impl TeamSize {
    pub fn label(&self) -> &'static str {
        match self {
            TeamSize::OneToTwo => "1-2 people",
            TeamSize::ThreeToTen => "3-10 people",
            TeamSize::ElevenToTwentyFive => "11-25 people",
            TeamSize::OverTwentyFive => "25+ people",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataVolume {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl DataVolume {
    pub fn label(&self) -> &'static str {
        match self {
            DataVolume::Low => "Low",
            DataVolume::Medium => "Medium",
            DataVolume::High => "High",
            DataVolume::VeryHigh => "Very high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeline {
    #[serde(rename = "immediate")]
    Immediate,
    #[serde(rename = "1_3_months")]
    OneToThreeMonths,
    #[serde(rename = "3_6_months")]
    ThreeToSixMonths,
    #[serde(rename = "6+_months")]
    SixPlusMonths,
}

impl Timeline {
    pub fn label(&self) -> &'static str {
        match self {
            Timeline::Immediate => "Immediate",
            Timeline::OneToThreeMonths => "1-3 months",
            Timeline::ThreeToSixMonths => "3-6 months",
            Timeline::SixPlusMonths => "6+ months",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    #[serde(rename = "under_10k")]
    Under10k,
    #[serde(rename = "10k_25k")]
    From10kTo25k,
    #[serde(rename = "25k_50k")]
    From25kTo50k,
    #[serde(rename = "50k_100k")]
    From50kTo100k,
    #[serde(rename = "100k+")]
    Over100k,
    #[serde(rename = "not_sure")]
    NotSure,
}

impl Budget {
    pub fn label(&self) -> &'static str {
        match self {
            Budget::Under10k => "Under $10k",
            Budget::From10kTo25k => "$10k-$25k",
            Budget::From25kTo50k => "$25k-$50k",
            Budget::From50kTo100k => "$50k-$100k",
            Budget::Over100k => "$100k+",
            Budget::NotSure => "Not sure yet",
        }
    }
}

impl LeadSubmission {
    /// Validates the field constraints of the inbound API contract.
    ///
    /// Enum membership on bracket fields is already enforced during
    /// deserialization; this checks the string minimums and required arrays.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().len() < 2 {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        if !is_plausible_email(&self.email) {
            return Err(AppError::BadRequest("A valid email is required".to_string()));
        }
        if self.phone.trim().len() < 7 {
            return Err(AppError::BadRequest("A phone number is required".to_string()));
        }
        if self.company.trim().len() < 2 {
            return Err(AppError::BadRequest("Company name is required".to_string()));
        }
        if self.automation_goals.is_empty() {
            return Err(AppError::BadRequest(
                "At least one automation goal is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Basic email plausibility check.
///
/// Uses a simplified RFC 5322 pattern; this is an intake form, so the goal is
/// to reject obviously broken addresses, not to fully validate deliverability.
pub fn is_plausible_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    email_regex.is_match(email)
}

// ============ Derived: lead score ============

/// Three-level quality tier shared by the lead score and the web-presence
/// maturity assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Low,
    Medium,
    High,
}

impl Rating {
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Low => "Low",
            Rating::Medium => "Medium",
            Rating::High => "High",
        }
    }

    /// Subject-line prefix used for sales-team triage at a glance.
    pub fn subject_prefix(&self) -> &'static str {
        match self {
            Rating::Low => "[LOW PRIORITY]",
            Rating::Medium => "[MEDIUM PRIORITY]",
            Rating::High => "[HIGH PRIORITY]",
        }
    }
}

/// One weighted sub-score with its reasoning, for the breakdown table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub category: String,
    pub score: u32,
    pub max_score: u32,
    pub reason: String,
}

/// The scoring engine's output: total, tier, breakdown, and advisory
/// annotations. Pure function of the submission; immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadScore {
    pub total: u32,
    pub max_total: u32,
    pub rating: Rating,
    pub breakdown: Vec<ScoreBreakdown>,
    pub insights: Vec<String>,
    pub red_flags: Vec<String>,
    pub opportunities: Vec<String>,
}

// ============ Derived: web presence ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocialPlatform {
    Facebook,
    Twitter,
    LinkedIn,
    Instagram,
    YouTube,
    TikTok,
    Pinterest,
    Unknown,
}

impl SocialPlatform {
    pub fn label(&self) -> &'static str {
        match self {
            SocialPlatform::Facebook => "Facebook",
            SocialPlatform::Twitter => "Twitter/X",
            SocialPlatform::LinkedIn => "LinkedIn",
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::YouTube => "YouTube",
            SocialPlatform::TikTok => "TikTok",
            SocialPlatform::Pinterest => "Pinterest",
            SocialPlatform::Unknown => "Unknown",
        }
    }
}

/// Result of the bounded reachability check against the lead's website.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteCheck {
    pub url: String,
    pub accessible: bool,
    pub https: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLinkAnalysis {
    pub url: String,
    pub platform: SocialPlatform,
    pub valid: bool,
}

/// The web-presence analyzer's assessment of how digitally established the
/// business appears. Best-effort; never fails the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPresenceScore {
    pub overall: u32,
    pub has_website: bool,
    pub has_social_media: bool,
    pub website: Option<WebsiteCheck>,
    pub social_links: Vec<SocialLinkAnalysis>,
    pub establishment_score: u32,
    pub establishment_factors: Vec<String>,
    pub maturity: Rating,
    pub recommendations: Vec<String>,
}

// ============ Derived: research enrichment ============

/// Structured output of the generative research pass. Absent when the
/// generative service is unconfigured or failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchResult {
    pub industry_insights: String,
    pub competitive_analysis: String,
    pub automation_opportunities: Vec<String>,
    pub roi_analysis: String,
    pub implementation_strategy: String,
    pub challenges: Vec<String>,
    pub recommended_approach: String,
    pub style_guide_topics: Vec<String>,
}

// ============ Derived: style guides ============

/// Named sections parsed out of a generated style-guide document.
///
/// Content the heading heuristic cannot place lands in `unsectioned` instead
/// of being dropped, so the CRM record always carries the full text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleGuideSections {
    pub voice_tone: String,
    pub key_phrases: String,
    pub structure: String,
    pub themes: String,
    pub examples: String,
    pub things_to_avoid: String,
    pub unsectioned: String,
}

/// One generated long-form guide: the raw text (kept verbatim for the CRM),
/// its parsed sections, and the rendered PDF for email attachment.
#[derive(Debug, Clone)]
pub struct StyleGuide {
    pub title: String,
    pub content: String,
    pub sections: StyleGuideSections,
    pub pdf: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StyleGuideSet {
    pub company_guide: StyleGuide,
    pub contact_guide: StyleGuide,
}

// ============ Orchestrator output ============

/// CRM page ids produced by the recorder. `None` means the step failed or
/// was skipped because a step it depends on failed.
#[derive(Debug, Clone, Default)]
pub struct CrmRecordIds {
    pub client_id: Option<String>,
    pub client_created: bool,
    pub contact_id: Option<String>,
    pub intake_id: Option<String>,
    pub company_guide_id: Option<String>,
    pub contact_guide_id: Option<String>,
    pub proposal_id: Option<String>,
    pub estimate_ids: Vec<String>,
}

/// Aggregate outcome of one pipeline invocation.
///
/// Presence of each stage output indicates that stage succeeded; the error
/// list carries every stage failure. Returned to the orchestrator's caller
/// and then discarded; only the CRM side effects persist.
#[derive(Debug)]
pub struct EvaluationResult {
    pub evaluation_id: Uuid,
    pub success: bool,
    pub score: Option<LeadScore>,
    pub web_presence: Option<WebPresenceScore>,
    pub research: Option<ResearchResult>,
    pub style_guides: Option<StyleGuideSet>,
    pub crm: CrmRecordIds,
    pub errors: Vec<String>,
    pub follow_up_date: Option<NaiveDate>,
}

impl EvaluationResult {
    pub fn new(evaluation_id: Uuid) -> Self {
        Self {
            evaluation_id,
            success: false,
            score: None,
            web_presence: None,
            research: None,
            style_guides: None,
            crm: CrmRecordIds::default(),
            errors: Vec::new(),
            follow_up_date: None,
        }
    }
}

// ============ API payloads ============

/// Accepted-response body for the intake endpoints. Returned before the
/// evaluation pipeline completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeAccepted {
    pub success: bool,
    pub redirect_to: String,
    pub evaluation_id: Uuid,
}
