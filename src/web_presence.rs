//! Web-presence analyzer.
//!
//! Lightweight, bounded reachability checks for the lead's website plus
//! syntactic classification of social links, rolled up into an establishment
//! score and a digital-maturity tier. Every network failure degrades to
//! "not accessible"; this analyzer never fails the pipeline.

use crate::models::{
    LeadSubmission, Rating, SocialLinkAnalysis, SocialPlatform, WebPresenceScore, WebsiteCheck,
};
use reqwest::Client;
use std::time::Duration;
use url::Url;

const WEBSITE_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebPresenceAnalyzer {
    client: Client,
}

impl WebPresenceAnalyzer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Analyzes the submission's website and social links.
    pub async fn analyze(&self, submission: &LeadSubmission) -> WebPresenceScore {
        let website = match submission.website.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(self.check_website(raw.trim()).await),
            _ => None,
        };

        let social_links: Vec<SocialLinkAnalysis> = submission
            .social_links
            .iter()
            .filter(|link| !link.trim().is_empty())
            .map(|link| classify_social_link(link.trim()))
            .collect();

        let has_website = website.is_some();
        let has_social_media = !social_links.is_empty();

        let accessible = website.as_ref().map(|w| w.accessible).unwrap_or(false);
        let https = website.as_ref().map(|w| w.https).unwrap_or(false);
        let valid_social = social_links.iter().filter(|l| l.valid).count();
        let has_linkedin = social_links
            .iter()
            .any(|l| l.valid && l.platform == SocialPlatform::LinkedIn);

        let overall = overall_score(accessible, https, valid_social);
        let (establishment_score, establishment_factors) =
            establishment(accessible, https, valid_social, has_linkedin);
        let maturity = maturity_for(overall);
        let recommendations =
            recommendations(&website, has_social_media, valid_social, has_linkedin);

        tracing::debug!(
            "Web presence for {}: overall={}, establishment={}, maturity={}",
            submission.company,
            overall,
            establishment_score,
            maturity.label()
        );

        WebPresenceScore {
            overall,
            has_website,
            has_social_media,
            website,
            social_links,
            establishment_score,
            establishment_factors,
            maturity,
            recommendations,
        }
    }

    /// HEAD request with a bounded timeout. Timeout, DNS failure, and non-ok
    /// status all come back as not accessible with an attached error string.
    async fn check_website(&self, raw: &str) -> WebsiteCheck {
        let normalized = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        };

        let parsed = match Url::parse(&normalized) {
            Ok(url) => url,
            Err(e) => {
                return WebsiteCheck {
                    url: raw.to_string(),
                    accessible: false,
                    https: false,
                    error: Some(format!("Invalid URL: {}", e)),
                };
            }
        };

        let https = parsed.scheme() == "https";

        match self
            .client
            .head(parsed.clone())
            .timeout(WEBSITE_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => WebsiteCheck {
                url: parsed.to_string(),
                accessible: true,
                https,
                error: None,
            },
            Ok(response) => WebsiteCheck {
                url: parsed.to_string(),
                accessible: false,
                https,
                error: Some(format!("HTTP status {}", response.status())),
            },
            Err(e) => WebsiteCheck {
                url: parsed.to_string(),
                accessible: false,
                https,
                error: Some(format!("Request failed: {}", e)),
            },
        }
    }
}

/// Classifies a social link by substring match against known platform
/// domains. Unrecognized domains stay in the list as `Unknown`; validity is
/// syntactic only.
pub fn classify_social_link(link: &str) -> SocialLinkAnalysis {
    let valid = Url::parse(link)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);

    let lowered = link.to_lowercase();
    let platform = if lowered.contains("facebook.com") || lowered.contains("fb.com") {
        SocialPlatform::Facebook
    } else if lowered.contains("twitter.com") || lowered.contains("x.com") {
        SocialPlatform::Twitter
    } else if lowered.contains("linkedin.com") {
        SocialPlatform::LinkedIn
    } else if lowered.contains("instagram.com") {
        SocialPlatform::Instagram
    } else if lowered.contains("youtube.com") || lowered.contains("youtu.be") {
        SocialPlatform::YouTube
    } else if lowered.contains("tiktok.com") {
        SocialPlatform::TikTok
    } else if lowered.contains("pinterest.com") {
        SocialPlatform::Pinterest
    } else {
        SocialPlatform::Unknown
    };

    SocialLinkAnalysis {
        url: link.to_string(),
        platform,
        valid,
    }
}

fn overall_score(accessible: bool, https: bool, valid_social: usize) -> u32 {
    let mut score = 0;
    if accessible {
        score += 40;
        if https {
            score += 10;
        }
    }
    score += match valid_social {
        0 => 0,
        1 => 20,
        2 => 35,
        _ => 50,
    };
    score.min(100)
}

/// Establishment sub-score: how established the business appears online.
fn establishment(
    accessible: bool,
    https: bool,
    valid_social: usize,
    has_linkedin: bool,
) -> (u32, Vec<String>) {
    let mut score = 0;
    let mut factors = Vec::new();

    if accessible {
        score += 30;
        factors.push("Website is reachable".to_string());
        if https {
            score += 10;
            factors.push("Website served over HTTPS".to_string());
        }
    }

    let social_points = match valid_social {
        0 => 0,
        1 => 15,
        2 => 25,
        _ => 40,
    };
    if social_points > 0 {
        score += social_points;
        factors.push(format!("{} valid social profile(s)", valid_social));
    }

    if has_linkedin {
        score += 10;
        factors.push("LinkedIn presence".to_string());
        if accessible && https {
            // professional-presence bonus: LinkedIn plus a secure, working site
            score += 10;
            factors.push("Professional presence across web and LinkedIn".to_string());
        }
    }

    (score.min(100), factors)
}

fn maturity_for(overall: u32) -> Rating {
    if overall >= 75 {
        Rating::High
    } else if overall >= 40 {
        Rating::Medium
    } else {
        Rating::Low
    }
}

fn recommendations(
    website: &Option<WebsiteCheck>,
    has_social: bool,
    valid_social: usize,
    has_linkedin: bool,
) -> Vec<String> {
    let mut recs = Vec::new();

    match website {
        None => recs.push(
            "No website provided; a basic web presence is usually the first credibility step"
                .to_string(),
        ),
        Some(check) if !check.accessible => recs.push(
            "Website did not respond to a reachability check; worth confirming hosting health"
                .to_string(),
        ),
        Some(check) if !check.https => {
            recs.push("Website is not served over HTTPS; browsers flag this".to_string())
        }
        Some(_) => {}
    }

    if !has_social {
        recs.push("No social profiles listed; even one active channel helps discovery".to_string());
    } else if valid_social < 2 {
        recs.push("Only one valid social profile; a second channel broadens reach".to_string());
    }

    if !has_linkedin {
        recs.push("No LinkedIn page found; B2B buyers usually check there first".to_string());
    }

    if recs.is_empty() {
        recs.push("Digital presence looks solid; no immediate gaps".to_string());
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linkedin_company_url_classifies_and_validates() {
        let analysis = classify_social_link("https://www.linkedin.com/company/acme");
        assert_eq!(analysis.platform, SocialPlatform::LinkedIn);
        assert!(analysis.valid);
    }

    #[test]
    fn malformed_link_is_invalid_but_kept() {
        let analysis = classify_social_link("not-a-url");
        assert!(!analysis.valid);
        assert_eq!(analysis.platform, SocialPlatform::Unknown);
    }

    #[test]
    fn unknown_domain_remains_a_valid_link() {
        let analysis = classify_social_link("https://mastodon.social/@acme");
        assert!(analysis.valid);
        assert_eq!(analysis.platform, SocialPlatform::Unknown);
    }

    #[test]
    fn overall_score_is_bounded() {
        assert_eq!(overall_score(true, true, 5), 100);
        assert_eq!(overall_score(false, false, 0), 0);
        assert!(overall_score(true, false, 2) <= 100);
    }

    #[test]
    fn establishment_full_house_hits_cap() {
        let (score, factors) = establishment(true, true, 3, true);
        assert_eq!(score, 100);
        assert!(factors.iter().any(|f| f.contains("LinkedIn")));
    }
}
