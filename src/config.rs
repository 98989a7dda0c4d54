use serde::Deserialize;

/// Runtime configuration, loaded once at startup from the environment.
///
/// External clients are constructed from this exactly once in `main` and
/// injected into the application state; no module reads the environment on
/// its own after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,

    /// Generative text service. Optional: when absent, research enrichment
    /// and style-guide generation are disabled and the pipeline degrades.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,

    /// CRM (Notion-style pages/blocks API).
    pub notion_api_key: String,
    pub notion_base_url: String,
    pub notion_clients_db: String,
    pub notion_contacts_db: String,
    pub notion_intake_db: String,
    pub notion_company_guides_db: String,
    pub notion_contact_guides_db: String,
    pub notion_proposals_db: String,
    pub notion_estimates_db: String,

    /// Transactional email sender.
    pub postmark_api_token: String,
    pub postmark_base_url: String,
    pub email_from: String,
    pub sales_email: String,

    /// Shared key for the machine-facing import endpoint. Unset means the
    /// import endpoint rejects every request (fail closed).
    pub intake_api_key: Option<String>,
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn optional_url(name: &str, default: &str) -> anyhow::Result<String> {
    match optional(name) {
        Some(url) => {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
            Ok(url)
        }
        None => Ok(default.to_string()),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_base_url: optional_url("OPENAI_BASE_URL", "https://api.openai.com/v1")?,
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            notion_api_key: required("NOTION_API_KEY")?,
            notion_base_url: optional_url("NOTION_BASE_URL", "https://api.notion.com")?,
            notion_clients_db: required("NOTION_CLIENTS_DB")?,
            notion_contacts_db: required("NOTION_CONTACTS_DB")?,
            notion_intake_db: required("NOTION_INTAKE_DB")?,
            notion_company_guides_db: required("NOTION_COMPANY_GUIDES_DB")?,
            notion_contact_guides_db: required("NOTION_CONTACT_GUIDES_DB")?,
            notion_proposals_db: required("NOTION_PROPOSALS_DB")?,
            notion_estimates_db: required("NOTION_ESTIMATES_DB")?,
            postmark_api_token: required("POSTMARK_API_TOKEN")?,
            postmark_base_url: optional_url("POSTMARK_BASE_URL", "https://api.postmarkapp.com")?,
            email_from: required("EMAIL_FROM")?,
            sales_email: required("SALES_EMAIL")?,
            intake_api_key: optional("INTAKE_API_KEY"),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Notion Base URL: {}", config.notion_base_url);
        tracing::debug!("Postmark Base URL: {}", config.postmark_base_url);
        if config.openai_api_key.is_some() {
            tracing::info!(
                "Generative service configured: {} ({})",
                config.openai_base_url,
                config.openai_model
            );
        } else {
            tracing::warn!(
                "OPENAI_API_KEY not set: research enrichment and style guides are disabled"
            );
        }
        if config.intake_api_key.is_none() {
            tracing::warn!("INTAKE_API_KEY not set: the import endpoint will reject all requests");
        }

        Ok(config)
    }
}
