//! # End-to-End Serving Tests
//!
//! Seed files on disk -> service -> dispatcher, plus the latency and
//! selection distribution guarantees.

use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

use suppression_gate::{
    handle_api_query, AdCatalog, AdServingApi, ApiGatewayHandler, Banner, GateConfig,
    GateConfigBuilder, JsonFileBannerSource, JsonFileListSource, SuppressionCheck,
    SuppressionGateService, SuppressionListApi, SuppressionListDraft,
};

// =============================================================================
// TEST HELPERS
// =============================================================================

fn hashed_email(n: usize) -> String {
    hex::encode(Sha256::digest(format!("user{}@example.com", n).as_bytes()))
}

fn banner(id: &str, advertiser_id: &str, weight: u32) -> Banner {
    Banner {
        id: id.to_string(),
        advertiser_id: advertiser_id.to_string(),
        campaign_id: format!("{}-campaign", advertiser_id),
        name: format!("{} banner", id),
        creative_url: format!("https://cdn.example.com/{}.png", id),
        click_url: format!("https://example.com/click/{}", id),
        width: 300,
        height: 250,
        weight,
    }
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// =============================================================================
// END TO END
// =============================================================================

#[test]
fn seed_files_to_dispatcher() {
    let lists = write_temp(
        r#"[{"advertiserId": "adv1", "name": "Existing customers", "identifiers": ["hash_abc"]}]"#,
    );
    let banners = write_temp(
        &json!({
            "banners": [banner("b1", "adv1", 1), banner("b2", "adv2", 1)]
        })
        .to_string(),
    );

    let (gate, report) = SuppressionGateService::from_sources(
        GateConfig::default(),
        &JsonFileListSource::new(lists.path()),
        &JsonFileBannerSource::new(banners.path()),
    )
    .unwrap();
    assert_eq!(report.loaded, 1);

    let handler = ApiGatewayHandler::new(Arc::new(gate));

    let hit = handle_api_query(&handler, "check_suppression", &json!({"identifier": "hash_abc"})).unwrap();
    assert_eq!(hit["suppressed_advertisers"], json!(["adv1"]));

    let miss = handle_api_query(&handler, "check_suppression", &json!({"identifier": "hash_zzz"})).unwrap();
    assert_eq!(miss["suppressed_advertisers"], json!([]));

    for _ in 0..20 {
        let decision = handle_api_query(
            &handler,
            "serve_ad_for_user",
            &json!({"placement_id": "top", "identifier": "hash_abc"}),
        )
        .unwrap();
        assert_eq!(decision["banner"]["id"], "b2");
    }
}

#[test]
fn removal_keeps_advertiser_while_another_list_covers() {
    let gate = SuppressionGateService::new(GateConfig::default(), AdCatalog::empty()).unwrap();
    let l1 = gate
        .create_list(SuppressionListDraft::new("A", "L1", vec!["X".to_string()]))
        .unwrap();
    let l2 = gate
        .create_list(SuppressionListDraft::new("A", "L2", vec!["X".to_string()]))
        .unwrap();

    assert!(gate.delete_list(&l1.id).unwrap());
    assert!(gate.check("X").unwrap().is_suppressed("A"));

    assert!(gate.delete_list(&l2.id).unwrap());
    assert!(gate.check("X").unwrap().suppressed_advertisers.is_empty());
}

#[test]
fn cached_gate_matches_uncached_gate() {
    let catalog = || AdCatalog::new(vec![banner("b1", "adv1", 1)]).unwrap();
    let plain = SuppressionGateService::new(GateConfig::default(), catalog()).unwrap();
    let cached = SuppressionGateService::new(
        GateConfigBuilder::new().cache_capacity(64).build().unwrap(),
        catalog(),
    )
    .unwrap();

    for gate in [&plain, &cached] {
        for n in 0..50 {
            let advertiser = format!("adv{}", n % 4);
            gate.create_list(SuppressionListDraft::new(advertiser, "l", vec![hashed_email(n)]))
                .unwrap();
        }
    }

    for round in 0..2 {
        for n in 0..60 {
            let identifier = hashed_email(n);
            let a = plain.check(&identifier).unwrap();
            let b = cached.check(&identifier).unwrap();
            assert_eq!(a.suppressed_advertisers, b.suppressed_advertisers);
            assert_eq!(b.cached, round == 1);
        }
    }
}

// =============================================================================
// LATENCY
// =============================================================================

#[test]
fn check_stays_within_budget_over_large_index() {
    let gate = SuppressionGateService::new(GateConfig::default(), AdCatalog::empty()).unwrap();
    for advertiser in 0..5 {
        let identifiers = (0..4_000).map(|n| hashed_email(n * 5 + advertiser)).collect();
        gate.create_list(SuppressionListDraft::new(
            format!("adv{}", advertiser),
            "bulk",
            identifiers,
        ))
        .unwrap();
    }
    assert!(gate.stats().total_identifiers >= 10_000);

    let mut worst = Duration::ZERO;
    for n in (0..20_000).step_by(97) {
        let result = gate.check(&hashed_email(n)).unwrap();
        assert_eq!(result.suppressed_advertisers.len(), 1);
        worst = worst.max(result.elapsed());
    }
    assert!(worst < Duration::from_millis(10), "worst check took {:?}", worst);
}

// =============================================================================
// SELECTION
// =============================================================================

#[test]
fn weighted_selection_tracks_weights() {
    let catalog = AdCatalog::new(vec![banner("a", "advA", 1), banner("b", "advB", 3)]).unwrap();
    let gate = SuppressionGateService::new(GateConfig::default(), catalog).unwrap();

    let mut counts: HashMap<String, u32> = HashMap::new();
    for _ in 0..10_000 {
        let banner = gate.serve_ad("slot", &HashSet::new()).unwrap();
        *counts.entry(banner.id).or_default() += 1;
    }
    let ratio = counts["b"] as f64 / counts["a"] as f64;
    assert!((2.5..3.5).contains(&ratio), "ratio was {}", ratio);

    let excluded: HashSet<String> = ["advA".to_string()].into_iter().collect();
    for _ in 0..1_000 {
        assert_eq!(gate.serve_ad("slot", &excluded).unwrap().id, "b");
    }

    let everyone: HashSet<String> = ["advA".to_string(), "advB".to_string()].into_iter().collect();
    assert!(gate.serve_ad("slot", &everyone).is_none());
}
