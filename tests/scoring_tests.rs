/// Unit tests for the lead scoring engine: threshold behavior, weight-table
/// monotonicity, and the end-to-end High/Low rating scenarios.
use lead_intake_api::models::{
    Budget, BusinessSize, DataVolume, Industry, LeadSubmission, MonthlyVolume, Priority,
    ProjectIdea, Rating, TeamSize, Timeline,
};
use lead_intake_api::scoring::{rating_for, score_lead, MAX_TOTAL};

fn submission() -> LeadSubmission {
    LeadSubmission {
        name: "Jane Doe".to_string(),
        email: "jane@acme.test".to_string(),
        phone: "+1 555 0100".to_string(),
        company: "Acme Services".to_string(),
        website: Some("https://acme.test".to_string()),
        social_links: vec![],
        industry: Industry::ProfessionalServices,
        business_size: BusinessSize::Small,
        current_process: "Spreadsheets and email threads".to_string(),
        monthly_volume: MonthlyVolume::From100To500,
        team_size: TeamSize::ThreeToTen,
        automation_goals: vec!["save_time".to_string()],
        automation_description: "Cut down repetitive admin work".to_string(),
        project_ideas: vec![],
        current_integrations: "Gmail, Sheets, QuickBooks".to_string(),
        integration_needs: vec![],
        data_volume: DataVolume::Low,
        project_description: "Automate our invoicing flow".to_string(),
        success_metrics: "Hours saved per week".to_string(),
        timeline: Timeline::ThreeToSixMonths,
        budget: Budget::From10kTo25k,
    }
}

fn idea(title: &str) -> ProjectIdea {
    ProjectIdea {
        title: title.to_string(),
        description: format!("{} end to end", title),
        priority: Priority::High,
    }
}

#[cfg(test)]
mod rating_thresholds {
    use super::*;

    #[test]
    fn rating_matches_percentage_bands() {
        // 70% of 140 = 98; 45% of 140 = 63
        assert_eq!(rating_for(98), Rating::High);
        assert_eq!(rating_for(97), Rating::Medium);
        assert_eq!(rating_for(63), Rating::Medium);
        assert_eq!(rating_for(62), Rating::Low);
        assert_eq!(rating_for(0), Rating::Low);
        assert_eq!(rating_for(MAX_TOTAL), Rating::High);
    }

    #[test]
    fn score_rating_agrees_with_total() {
        let score = score_lead(&submission());
        assert_eq!(score.rating, rating_for(score.total));
    }
}

#[cfg(test)]
mod weight_tables {
    use super::*;

    #[test]
    fn budget_scores_are_monotonic_with_not_sure_in_between() {
        let ordered = [
            Budget::Under10k,
            Budget::From10kTo25k,
            Budget::From25kTo50k,
            Budget::From50kTo100k,
            Budget::Over100k,
        ];

        let totals: Vec<u32> = ordered
            .iter()
            .map(|&budget| {
                let mut s = submission();
                s.budget = budget;
                score_lead(&s).total
            })
            .collect();

        for pair in totals.windows(2) {
            assert!(pair[0] <= pair[1], "budget scoring must be monotonic");
        }

        let mut s = submission();
        s.budget = Budget::NotSure;
        let not_sure = score_lead(&s).total;
        assert!(not_sure > totals[0]);
        assert!(not_sure < totals[4]);
    }

    #[test]
    fn timeline_scores_are_monotonic() {
        let ordered = [
            Timeline::SixPlusMonths,
            Timeline::ThreeToSixMonths,
            Timeline::OneToThreeMonths,
            Timeline::Immediate,
        ];
        let totals: Vec<u32> = ordered
            .iter()
            .map(|&timeline| {
                let mut s = submission();
                s.timeline = timeline;
                score_lead(&s).total
            })
            .collect();
        for pair in totals.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn business_size_scores_are_monotonic() {
        let ordered = [
            BusinessSize::Micro,
            BusinessSize::Small,
            BusinessSize::Medium,
            BusinessSize::Large,
            BusinessSize::Enterprise,
        ];
        let totals: Vec<u32> = ordered
            .iter()
            .map(|&size| {
                let mut s = submission();
                s.business_size = size;
                score_lead(&s).total
            })
            .collect();
        for pair in totals.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn two_ideas_always_max_project_definition() {
        let mut s = submission();
        s.project_ideas = vec![idea("Invoicing"), idea("Lead routing")];
        let score = score_lead(&s);
        let entry = score
            .breakdown
            .iter()
            .find(|b| b.category == "Project definition")
            .unwrap();
        assert_eq!(entry.score, entry.max_score);
    }

    #[test]
    fn breakdown_maxes_sum_to_total_max() {
        let score = score_lead(&submission());
        let sum: u32 = score.breakdown.iter().map(|b| b.max_score).sum();
        assert_eq!(sum, MAX_TOTAL);
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn hot_lead_rates_high() {
        let mut s = submission();
        s.budget = Budget::Over100k;
        s.timeline = Timeline::Immediate;
        s.business_size = BusinessSize::Enterprise;
        s.project_ideas = vec![idea("Invoicing"), idea("Routing"), idea("Reporting")];

        let score = score_lead(&s);
        assert!(
            f64::from(score.total) / f64::from(MAX_TOTAL) >= 0.70,
            "expected >=70%, got {}/{}",
            score.total,
            MAX_TOTAL
        );
        assert_eq!(score.rating, Rating::High);
    }

    #[test]
    fn cold_lead_rates_low() {
        let mut s = submission();
        s.budget = Budget::Under10k;
        s.timeline = Timeline::SixPlusMonths;
        s.business_size = BusinessSize::Micro;
        s.project_ideas = vec![];

        let score = score_lead(&s);
        assert_eq!(score.rating, Rating::Low);
    }

    #[test]
    fn cold_lead_stays_low_even_with_verbose_text() {
        let mut s = submission();
        s.budget = Budget::Under10k;
        s.timeline = Timeline::SixPlusMonths;
        s.business_size = BusinessSize::Micro;
        s.project_ideas = vec![];
        s.current_process = "x".repeat(500);
        s.project_description = "y".repeat(500);
        s.success_metrics = "z".repeat(200);
        s.automation_goals = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        s.integration_needs = vec![
            "crm".into(),
            "email".into(),
            "custom_software".into(),
            "billing".into(),
        ];
        s.data_volume = DataVolume::VeryHigh;

        let score = score_lead(&s);
        assert_eq!(score.rating, Rating::Low, "total was {}", score.total);
    }
}

#[cfg(test)]
mod advisory_rules {
    use super::*;

    #[test]
    fn regulated_industry_produces_an_insight() {
        let mut s = submission();
        s.industry = Industry::Healthcare;
        let score = score_lead(&s);
        assert!(score
            .insights
            .iter()
            .any(|insight| insight.contains("regulated")));
    }

    #[test]
    fn small_budget_with_broad_scope_raises_a_flag() {
        let mut s = submission();
        s.budget = Budget::Under10k;
        s.project_ideas = vec![idea("A"), idea("B"), idea("C")];
        let score = score_lead(&s);
        assert!(!score.red_flags.is_empty());
    }

    #[test]
    fn custom_software_tag_produces_an_opportunity() {
        let mut s = submission();
        s.integration_needs = vec!["custom_software".to_string()];
        let score = score_lead(&s);
        assert!(score
            .opportunities
            .iter()
            .any(|o| o.contains("Custom-software")));
    }
}
