//! Property-based tests for detection, generation, optimization and scoring.
//!
//! Run with: cargo test -p mesh-printability -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mesh_printability::{
    DesignIssue, DetectorConfig, IssueCategory, IssueSeverity, OptimizationGoal,
    OverhangAnalysis, OverhangDetector, OverhangSeverity, SeverityThresholds, SupportGenerator,
    SupportOptimizer, SupportSettings, overhang_angle, printability_score,
};
use mesh_types::{Facet, Triangle, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// A square-ish facet tilted `angle` degrees from vertical, anywhere above the bed.
fn arb_facet() -> impl Strategy<Value = Facet> {
    (
        0.0..90.0f64,
        -50.0..50.0f64,
        -50.0..50.0f64,
        0.0..80.0f64,
        0.5..20.0f64,
    )
        .prop_map(|(angle, x, y, z, size)| {
            let a = angle.to_radians();
            Facet::new(
                Triangle::from_arrays([x, y, z], [x + size, y, z], [x, y + size, z]),
                Vector3::new(a.cos(), 0.0, -a.sin()),
            )
        })
}

fn arb_facets() -> impl Strategy<Value = Vec<Facet>> {
    prop::collection::vec(arb_facet(), 1..40)
}

fn arb_severity() -> impl Strategy<Value = IssueSeverity> {
    prop_oneof![
        Just(IssueSeverity::Info),
        Just(IssueSeverity::Warning),
        Just(IssueSeverity::Error),
        Just(IssueSeverity::Critical),
    ]
}

fn arb_issues() -> impl Strategy<Value = Vec<DesignIssue>> {
    prop::collection::vec(
        arb_severity().prop_map(|s| DesignIssue::new(IssueCategory::Overhang, s, "issue")),
        0..30,
    )
}

fn analysis_with(needs_supports: bool, overhang_percentage: f64) -> OverhangAnalysis {
    OverhangAnalysis {
        file_path: None,
        total_faces: 100,
        overhang_faces: 0,
        overhang_percentage,
        max_overhang_angle: 0.0,
        overhangs: Vec::new(),
        needs_supports,
        recommended_support_density: 0,
        estimated_support_material: 0.0,
    }
}

fn detect(facets: &[Facet]) -> OverhangAnalysis {
    OverhangDetector::new(DetectorConfig::default()).analyze(facets)
}

// =============================================================================
// Property Tests: Detection
// =============================================================================

proptest! {
    /// Every angle lands in exactly one bucket, and buckets never go down as
    /// the angle goes up.
    #[test]
    fn severity_partition_is_monotonic(a in 0.0..=90.0f64, b in 0.0..=90.0f64) {
        let t = SeverityThresholds::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(OverhangSeverity::classify(lo, &t) <= OverhangSeverity::classify(hi, &t));
    }

    /// Overhang angles stay within [0, 90] for any unit normal.
    #[test]
    fn overhang_angle_in_range(x in -1.0..1.0f64, y in -1.0..1.0f64, z in -1.0..1.0f64) {
        let n = Vector3::new(x, y, z);
        prop_assume!(n.norm() > 1e-6);
        let angle = overhang_angle(&n.normalize());
        prop_assert!((0.0..=90.0).contains(&angle));
    }

    /// Regions are sorted steepest first and never claim more facets than exist.
    #[test]
    fn analysis_is_consistent(facets in arb_facets()) {
        let analysis = detect(&facets);
        prop_assert_eq!(analysis.total_faces, facets.len());
        prop_assert!(analysis.overhang_faces <= analysis.total_faces);
        prop_assert!((0.0..=100.0).contains(&analysis.overhang_percentage));
        for pair in analysis.overhangs.windows(2) {
            prop_assert!(pair[0].angle >= pair[1].angle);
        }
        prop_assert_eq!(
            analysis.needs_supports,
            analysis.overhangs.iter().any(|o| o.needs_support)
        );
    }
}

// =============================================================================
// Property Tests: Generation and optimization
// =============================================================================

proptest! {
    /// Totals always equal the sum over structures.
    #[test]
    fn total_volume_matches_structures(facets in arb_facets()) {
        let analysis = detect(&facets);
        for settings in [SupportSettings::tree(), SupportSettings::normal()] {
            let result = SupportGenerator::new(settings).generate(&analysis);
            prop_assert!((result.total_support_volume - result.structure_volume()).abs() < 1e-9);

            for goal in [
                OptimizationGoal::Material,
                OptimizationGoal::Strength,
                OptimizationGoal::Removal,
                OptimizationGoal::Balanced,
                OptimizationGoal::Speed,
            ] {
                let out = SupportOptimizer::default().optimize(&result, Some(goal));
                let opt = &out.optimized;
                prop_assert!((opt.total_support_volume - opt.structure_volume()).abs() < 1e-9);
                prop_assert!(opt.support_count() <= result.support_count());
                prop_assert_eq!(&out.original, &result);
            }
        }
    }

    /// Trees never cost more than the columns they replace.
    #[test]
    fn tree_never_exceeds_column(facets in arb_facets()) {
        let analysis = detect(&facets);
        let tree = SupportGenerator::new(SupportSettings::tree()).generate(&analysis);
        let column = SupportGenerator::new(SupportSettings::normal()).generate(&analysis);

        prop_assert_eq!(tree.support_count(), column.support_count());
        for (t, c) in tree.structures.iter().zip(&column.structures) {
            prop_assert!(t.volume <= c.volume + 1e-12);
        }
        prop_assert!(tree.total_support_volume <= column.total_support_volume + 1e-9);
    }
}

// =============================================================================
// Property Tests: Scoring
// =============================================================================

proptest! {
    /// The score stays in [0, 100].
    #[test]
    fn score_is_clamped(issues in arb_issues(), needs in any::<bool>(), pct in 0.0..=100.0f64) {
        let score = printability_score(&issues, &analysis_with(needs, pct));
        prop_assert!((0.0..=100.0).contains(&score));
    }

    /// Adding an issue never raises the score.
    #[test]
    fn score_is_monotonic(
        issues in arb_issues(),
        extra in arb_severity(),
        needs in any::<bool>(),
        pct in 0.0..=100.0f64,
    ) {
        let analysis = analysis_with(needs, pct);
        let before = printability_score(&issues, &analysis);

        let mut more = issues;
        more.push(DesignIssue::new(IssueCategory::Scale, extra, "extra"));
        let after = printability_score(&more, &analysis);

        prop_assert!(after <= before);
    }
}
