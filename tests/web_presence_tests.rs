/// Integration tests for the web-presence analyzer with a mocked website.
/// Network failures must degrade to "not accessible", never panic or error.
use lead_intake_api::models::{
    Budget, BusinessSize, DataVolume, Industry, LeadSubmission, MonthlyVolume, SocialPlatform,
    TeamSize, Timeline,
};
use lead_intake_api::web_presence::{classify_social_link, WebPresenceAnalyzer};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn submission_with(website: Option<String>, social_links: Vec<String>) -> LeadSubmission {
    LeadSubmission {
        name: "Jane Doe".to_string(),
        email: "jane@acme.test".to_string(),
        phone: "+1 555 0100".to_string(),
        company: "Acme Services".to_string(),
        website,
        social_links,
        industry: Industry::Retail,
        business_size: BusinessSize::Small,
        current_process: "Manual".to_string(),
        monthly_volume: MonthlyVolume::Under100,
        team_size: TeamSize::OneToTwo,
        automation_goals: vec!["save_time".to_string()],
        automation_description: "Less admin".to_string(),
        project_ideas: vec![],
        current_integrations: "None".to_string(),
        integration_needs: vec![],
        data_volume: DataVolume::Low,
        project_description: "Automate intake".to_string(),
        success_metrics: "Time saved".to_string(),
        timeline: Timeline::OneToThreeMonths,
        budget: Budget::From10kTo25k,
    }
}

#[tokio::test]
async fn reachable_website_is_accessible() {
    let mock_server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let analyzer = WebPresenceAnalyzer::new(reqwest::Client::new());
    let submission = submission_with(Some(mock_server.uri()), vec![]);
    let presence = analyzer.analyze(&submission).await;

    let website = presence.website.expect("website was provided");
    assert!(website.accessible);
    assert!(!website.https); // mock server is plain http
    assert!(presence.overall <= 100);
}

#[tokio::test]
async fn http_error_status_degrades_to_not_accessible() {
    let mock_server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let analyzer = WebPresenceAnalyzer::new(reqwest::Client::new());
    let submission = submission_with(Some(mock_server.uri()), vec![]);
    let presence = analyzer.analyze(&submission).await;

    let website = presence.website.expect("website was provided");
    assert!(!website.accessible);
    assert!(website.error.as_deref().unwrap_or("").contains("404"));
}

#[tokio::test]
async fn unresolvable_host_degrades_to_not_accessible() {
    let analyzer = WebPresenceAnalyzer::new(reqwest::Client::new());
    let submission = submission_with(
        Some("https://definitely-not-a-real-host.invalid".to_string()),
        vec![],
    );
    let presence = analyzer.analyze(&submission).await;

    let website = presence.website.expect("website was provided");
    assert!(!website.accessible);
    assert!(website.error.is_some());
    assert!(presence.overall <= 100);
}

#[tokio::test]
async fn social_only_presence_scores_from_links() {
    let analyzer = WebPresenceAnalyzer::new(reqwest::Client::new());
    let submission = submission_with(
        None,
        vec![
            "https://www.linkedin.com/company/acme".to_string(),
            "https://www.facebook.com/acme".to_string(),
            "https://instagram.com/acme".to_string(),
        ],
    );
    let presence = analyzer.analyze(&submission).await;

    assert!(!presence.has_website);
    assert!(presence.has_social_media);
    assert_eq!(presence.social_links.len(), 3);
    assert!(presence.social_links.iter().all(|l| l.valid));
    assert!(presence.overall >= 50);
    assert!(presence
        .establishment_factors
        .iter()
        .any(|f| f.contains("LinkedIn")));
}

#[tokio::test]
async fn no_presence_at_all_still_produces_recommendations() {
    let analyzer = WebPresenceAnalyzer::new(reqwest::Client::new());
    let submission = submission_with(None, vec![]);
    let presence = analyzer.analyze(&submission).await;

    assert_eq!(presence.overall, 0);
    assert_eq!(presence.establishment_score, 0);
    assert!(!presence.recommendations.is_empty());
}

#[test]
fn platform_classification_matches_known_domains() {
    let cases = [
        ("https://www.linkedin.com/company/x", SocialPlatform::LinkedIn),
        ("https://facebook.com/x", SocialPlatform::Facebook),
        ("https://x.com/handle", SocialPlatform::Twitter),
        ("https://www.youtube.com/@x", SocialPlatform::YouTube),
        ("https://www.tiktok.com/@x", SocialPlatform::TikTok),
        ("https://pinterest.com/x", SocialPlatform::Pinterest),
        ("https://example.com/profile", SocialPlatform::Unknown),
    ];
    for (url, expected) in cases {
        let analysis = classify_social_link(url);
        assert_eq!(analysis.platform, expected, "for {}", url);
        assert!(analysis.valid, "for {}", url);
    }

    let broken = classify_social_link("not-a-url");
    assert!(!broken.valid);
}
