//! Benchmarks for the decision kernel (migrate, filter, score, rank, package).
//! Run with: cargo bench -p agentads-engine

use agentads_core::config::AppConfig;
use agentads_core::taxonomy::TaxonomyTarget;
use agentads_core::types::{
    AdUnit, Bid, BudgetSnapshot, Campaign, CampaignStatus, Candidate, Creative, Disclosure,
    Targeting, UnitStatus, UnitType,
};
use agentads_core::wire::DecideRequest;
use agentads_engine::DecisionEngine;
use std::sync::Arc;

const TARGETS: [&str; 6] = [
    "insurance",
    "insurance.auto",
    "insurance.auto.full_coverage",
    "insurance.home.renters",
    "legal.family_law",
    "business.ecommerce.platform.trial",
];

fn create_candidates(count: usize) -> Vec<Candidate> {
    (0..count)
        .map(|i| {
            let target = TaxonomyTarget::parse(TARGETS[i % TARGETS.len()]).expect("bench taxonomy");
            let campaign = Campaign {
                id: format!("cmp-{:04}", i),
                advertiser_id: format!("adv-{:04}", i % 37),
                taxonomies: vec![target],
                targeting: Targeting::default(),
                budget: BudgetSnapshot::new(100_000, (i as u64 * 997) % 100_001),
                bid: Bid {
                    cpc: Some(0.5 + (i % 10) as f64 * 0.25),
                    cpm: None,
                },
                quality_score: Some(0.5 + (i % 5) as f64 * 0.1),
                status: CampaignStatus::Active,
            };
            let unit = AdUnit {
                id: format!("unit-{:04}", i),
                campaign_id: campaign.id.clone(),
                unit_type: UnitType::SponsoredSuggestion,
                creative: Creative {
                    title: format!("Offer {}", i),
                    body: String::new(),
                    cta: "Learn more".to_string(),
                    action_url: format!("https://advertiser.example/offer/{}", i),
                },
                disclosure: Disclosure {
                    sponsor_name: format!("Advertiser {}", i % 37),
                    label: None,
                },
                status: UnitStatus::Active,
                embedding: None,
            };
            Candidate::new(unit, Arc::new(campaign))
        })
        .collect()
}

fn main() {
    let engine =
        DecisionEngine::from_config(&AppConfig::default()).expect("Failed to create engine");
    let request: DecideRequest = serde_json::from_value(serde_json::json!({
        "request_id": "bench-req",
        "agent_id": "bench-agent",
        "placement": { "type": "sponsored_suggestion", "surface": "chat" },
        "opportunity": {
            "intent": { "taxonomy": "insurance.auto.full_coverage.quote" },
            "context": { "country": "US", "language": "en", "platform": "web" }
        }
    }))
    .expect("bench request");
    let request = request.validate().expect("valid bench request");
    let candidates = create_candidates(500);

    // Warmup
    for _ in 0..10 {
        engine.decide(&request, candidates.clone(), None);
    }

    // Benchmark
    let iterations = 10_000u32;
    let start = std::time::Instant::now();

    for _ in 0..iterations {
        let _ = engine.decide(&request, candidates.clone(), None);
    }

    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations;

    println!("=== Decision Benchmark ===");
    println!("Iterations:  {}", iterations);
    println!("Total time:  {:?}", elapsed);
    println!("Per call:    {:?}", per_iter);
    println!("Throughput:  {:.0} decisions/sec", iterations as f64 / elapsed.as_secs_f64());
    println!("Candidates:  {}", candidates.len());
}
