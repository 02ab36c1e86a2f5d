//! Property-based tests for the synthesis components.
//!
//! These tests use proptest to generate random dose-group statistics and
//! verify that each component keeps its invariants under all inputs.
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p toxsynth --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p toxsynth --test property_tests
//! ```

use proptest::prelude::*;

use toxsynth::confidence::{
    ConfidenceCaveats, ConfidenceDimension, NormalizationCaveat, NormalizationConfound,
    TrendConcordance,
};
use toxsynth::evidence::{SignalInput, SignalWeights};
use toxsynth::model::ClinicalTier;
use toxsynth::noael::{NoaelKey, NoaelStatus};
use toxsynth::verdict::{ClinicalRuleMatch, NotEvaluated};
use toxsynth::{
    classify_pattern, compute_signal_score, decompose_confidence, derive_noael,
    derive_organ_noael, synthesize_verdict, DataType, DoseGroupStatRow, EndpointStatistics,
    Pattern, Severity, Sex,
};

// =============================================================================
// Test Strategies
// =============================================================================

fn p_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        2 => (0.0f64..=1.0).prop_map(Some),
        1 => prop::sample::select(vec![0.001, 0.01, 0.049, 0.05, 0.5]).prop_map(Some),
    ]
}

/// A treated dose group: (mean, adjusted p, effect size).
fn treated_group() -> impl Strategy<Value = (f64, Option<f64>, Option<f64>)> {
    (
        prop::sample::select(vec![8.0, 10.0, 12.0, 15.0, 20.0]),
        p_value(),
        prop::option::of(-3.0f64..3.0),
    )
}

fn endpoint() -> impl Strategy<Value = EndpointStatistics> {
    (
        prop::collection::vec(treated_group(), 0..6),
        prop::option::of(0.0f64..=1.0),
        prop::bool::ANY,
    )
        .prop_map(|(groups, trend_p, male)| {
            let sex = if male { Sex::Male } else { Sex::Female };
            let mut spec = EndpointStatistics::builder("ALT", sex, DataType::Continuous)
                .row(DoseGroupStatRow::continuous(0, 10, 10.0, 1.0));
            if let Some(p) = trend_p {
                spec = spec.with_trend_p(p);
            }
            for (i, (mean, p, effect)) in groups.into_iter().enumerate() {
                let mut row = DoseGroupStatRow::continuous(i as u32 + 1, 10, mean, 1.0);
                row.p_value_adj = p;
                row.effect_size = effect;
                spec = spec.row(row);
            }
            spec.build().expect("generated rows are valid")
        })
}

fn severity() -> impl Strategy<Value = Severity> {
    prop::sample::select(vec![Severity::Normal, Severity::Warning, Severity::Adverse])
}

fn rule_match() -> impl Strategy<Value = ClinicalRuleMatch> {
    (
        prop::sample::select(vec![
            ClinicalTier::S1,
            ClinicalTier::S2,
            ClinicalTier::S3,
            ClinicalTier::S4,
        ]),
        "[A-Z][0-9]{2}",
    )
        .prop_map(|(tier, id)| ClinicalRuleMatch::new(id.clone(), format!("rule {}", id), tier))
}

fn caveats() -> impl Strategy<Value = ConfidenceCaveats> {
    (
        prop::option::of(prop::sample::select(vec![
            NormalizationConfound::Moderate,
            NormalizationConfound::Severe,
        ])),
        prop::option::of(Just("fewer than three dose groups".to_string())),
        prop::option::of((prop::bool::ANY, prop::bool::ANY)),
    )
        .prop_map(|(confound, unreliable, concordance)| ConfidenceCaveats {
            normalization: confound.map(|confound| NormalizationCaveat { confound, note: None }),
            trend_unreliable: unreliable,
            trend_concordance: concordance.map(|(a, b)| TrendConcordance {
                primary_significant: a,
                alternative_significant: b,
                primary_test: None,
                alternative_test: None,
            }),
        })
}

// =============================================================================
// NOAEL Properties
// =============================================================================

proptest! {
    /// The NOAEL always sits strictly below the LOAEL.
    #[test]
    fn noael_below_loael(stats in endpoint()) {
        let result = derive_noael(&stats);
        match (&result.noael, &result.loael) {
            (Some(noael), Some(loael)) => prop_assert!(noael.level < loael.level),
            (None, Some(loael)) => {
                prop_assert_eq!(result.key, NoaelKey::BelowLowest);
                let first = stats.treated().next().map(|r| r.dose_level);
                prop_assert_eq!(Some(loael.level), first);
            }
            _ => {}
        }
    }

    /// The LOAEL is the first significant treated dose.
    #[test]
    fn loael_is_first_significant(stats in endpoint()) {
        let result = derive_noael(&stats);
        if result.status != NoaelStatus::NoStats {
            let first = stats.treated().find(|r| r.is_significant()).map(|r| r.dose_level);
            prop_assert_eq!(result.loael.map(|d| d.level), first);
        }
    }

    /// The organ NOAEL is never more lenient than any member.
    #[test]
    fn organ_noael_is_minimum(members in prop::collection::vec(endpoint(), 1..6)) {
        let organ = derive_organ_noael(&members);
        for member in &organ.members {
            prop_assert!(organ.noael.key <= member.noael.key);
            prop_assert!(organ.noael.ordering_key() <= member.noael.ordering_key());
        }
        let any_stats = members.iter().any(|m| m.has_pairwise_stats());
        prop_assert_eq!(organ.driving_endpoint.is_some(), any_stats);
    }
}

// =============================================================================
// Verdict Properties
// =============================================================================

proptest! {
    /// Clinical rules can raise severity but never lower it.
    #[test]
    fn effective_severity_never_lowered(
        statistical in severity(),
        treatment_related in prop::bool::ANY,
        matches in prop::collection::vec(rule_match(), 0..5),
    ) {
        let verdict = synthesize_verdict(statistical, treatment_related, &matches, None);
        let effective = verdict.effective_severity().expect("evaluated");
        prop_assert!(effective >= statistical);

        let worst_rule = matches.iter().map(|m| m.severity()).max().unwrap_or_default();
        prop_assert_eq!(effective, statistical.max(worst_rule));
        prop_assert_eq!(verdict.override_source().is_some(), worst_rule > statistical);
    }

    /// A not-evaluated annotation always wins.
    #[test]
    fn not_evaluated_is_terminal(
        statistical in severity(),
        matches in prop::collection::vec(rule_match(), 0..5),
    ) {
        let annotation = NotEvaluated::new("excluded by reviewer");
        let verdict = synthesize_verdict(statistical, true, &matches, Some(&annotation));
        prop_assert!(!verdict.is_evaluated());
        prop_assert_eq!(verdict.effective_severity(), None);
    }
}

// =============================================================================
// Pattern and Confidence Properties
// =============================================================================

proptest! {
    /// Every endpoint gets exactly one pattern; only thresholds carry an onset.
    #[test]
    fn pattern_is_total(stats in endpoint()) {
        let result = classify_pattern(&stats);
        if result.pattern != Pattern::Threshold {
            prop_assert!(result.onset_level.is_none());
        }
        if !stats.is_significant() && result.pattern != Pattern::InsufficientData {
            prop_assert_eq!(result.pattern, Pattern::Flat);
        }
    }

    /// Integrated confidence is the weakest dimension.
    #[test]
    fn integrated_is_weakest_link(
        stats in endpoint(),
        statistical in severity(),
        caveats in caveats(),
    ) {
        let pattern = classify_pattern(&stats);
        let verdict = synthesize_verdict(statistical, true, &[], None);
        let result = decompose_confidence(&stats, &pattern, &verdict, &caveats);

        let min = result.dimensions().map(|(_, d)| d.level).min().expect("five dimensions");
        prop_assert_eq!(result.integrated, min);
        prop_assert_eq!(result.dimension(result.limiting_factor).level, min);

        let first = ConfidenceDimension::ALL
            .into_iter()
            .find(|d| result.dimension(*d).level == min);
        prop_assert_eq!(Some(result.limiting_factor), first);
    }
}

// =============================================================================
// Signal Score Properties
// =============================================================================

proptest! {
    /// Scores stay in [0, 1] and never drop when one input strengthens.
    #[test]
    fn signal_score_monotone(
        p in p_value(),
        effect in prop::option::of(-3.0f64..3.0),
        trend in p_value(),
        treatment_related in prop::bool::ANY,
    ) {
        let weights = SignalWeights::default();
        let base = SignalInput { p_value: p, effect_size: effect, trend_p: trend, treatment_related };
        let score = compute_signal_score(&base, &weights);
        prop_assert!((0.0..=1.0).contains(&score));

        let stronger = [
            SignalInput { p_value: Some(p.map_or(0.001, |p| p / 10.0)), ..base },
            SignalInput { effect_size: Some(effect.map_or(1.0, |e| e * 2.0)), ..base },
            SignalInput { trend_p: Some(trend.map_or(0.001, |t| t / 10.0)), ..base },
            SignalInput { treatment_related: true, ..base },
        ];
        for input in &stronger {
            prop_assert!(compute_signal_score(input, &weights) >= score);
        }
    }
}
