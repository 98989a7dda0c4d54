//! Scores a submission JSON file and prints the breakdown.
//!
//! Usage: cargo run --bin score_lead -- path/to/submission.json

use lead_intake_api::models::LeadSubmission;
use lead_intake_api::scoring::score_lead;

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: score_lead <submission.json>"))?;

    let raw = std::fs::read_to_string(&path)?;
    let submission: LeadSubmission = serde_json::from_str(&raw)?;
    submission.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    let score = score_lead(&submission);

    println!(
        "{} - {}/{} ({})",
        submission.company,
        score.total,
        score.max_total,
        score.rating.label()
    );
    println!();
    for entry in &score.breakdown {
        println!(
            "  {:<24} {:>3}/{:<3} {}",
            entry.category, entry.score, entry.max_score, entry.reason
        );
    }

    let print_list = |title: &str, items: &[String]| {
        if !items.is_empty() {
            println!("\n{}:", title);
            for item in items {
                println!("  - {}", item);
            }
        }
    };
    print_list("Insights", &score.insights);
    print_list("Red flags", &score.red_flags);
    print_list("Opportunities", &score.opportunities);

    Ok(())
}
