//! Mesh printability analysis for FDM 3D printing.
//!
//! This crate turns a triangle mesh into support and design guidance:
//! which facets overhang, what support structures they need, how those
//! supports can be made cheaper, and what to change in the model.
//!
//! # Features
//!
//! - **Overhang detection**: classify downward-facing facets by angle
//! - **Support generation**: column and tree supports with volume estimates
//! - **Support optimization**: merge, prune and reinforce for a goal
//! - **Design advice**: issues, orientations, fillets and a printability score
//! - **Orientation helpers**: apply a suggested rotation and rest on the bed
//!
//! # Example
//!
//! ```
//! use mesh_printability::{DetectorConfig, OverhangDetector, SupportGenerator, SupportSettings};
//! use mesh_types::{Facet, Triangle, Vector3};
//!
//! // A 60° overhang at z = 10
//! let a = 60.0_f64.to_radians();
//! let facet = Facet::new(
//!     Triangle::from_arrays([0.0, 0.0, 10.0], [4.0, 0.0, 10.0], [0.0, 4.0, 10.0]),
//!     Vector3::new(a.cos(), 0.0, -a.sin()),
//! );
//!
//! let analysis = OverhangDetector::new(DetectorConfig::default()).analyze(&[facet]);
//! assert!(analysis.needs_supports);
//!
//! let supports = SupportGenerator::new(SupportSettings::default()).generate(&analysis);
//! println!("{} structures, {:.2} g", supports.support_count(), supports.total_material_grams);
//! ```
//!
//! # Pipeline
//!
//! Files are loaded through `mesh-io` (STL, OBJ, 3MF). The free functions
//! [`analyze_overhangs`], [`generate_supports`], [`optimize_supports`] and
//! [`advise_design`] run one stage each with explicit configuration;
//! [`generate_optimized_supports`] and [`compare_support_strategies`] chain
//! several stages.
//!
//! Overhang regions are grouped by severity rather than by connectivity, so
//! two separate 60° faces at opposite ends of a part share one region whose
//! location is the mean of their centroids.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod advisor;
mod config;
mod error;
mod optimize;
mod orientation;
mod overhang;
mod support;

use std::path::Path;

pub use advisor::{
    DesignAdvice, DesignAdvisor, DesignIssue, FilletReason, FilletSuggestion, GeometryScan,
    IssueCategory, IssueCounts, IssueSeverity, OrientationSuggestion, SharpEdge,
    printability_score,
};
pub use config::{
    AdvisorConfig, DetectorConfig, OptimizationGoal, OptimizationSettings, PLA_DENSITY,
    SeverityThresholds, SupportDensity, SupportPattern, SupportSettings, SupportType,
    volume_to_grams,
};
pub use error::{PrintabilityError, PrintabilityResult};
pub use optimize::{
    OptimizationResult, StrategyComparison, StrategySummary, SupportOptimizer, SupportStrategy,
    compare_support_strategies, generate_optimized_supports,
};
pub use orientation::{apply_orientation, place_on_build_plate, rotate_facets};
pub use overhang::{
    OverhangAnalysis, OverhangDetector, OverhangInfo, OverhangSeverity, SupportKind,
    overhang_angle,
};
pub use support::{
    Branch, SupportComparison, SupportGenerator, SupportPoint, SupportResult, SupportStructure,
    TREE_ESTIMATE_RATIO,
};

pub use mesh_io::LoadOptions;

/// Detect overhangs in a mesh file.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the file cannot be
/// loaded.
///
/// # Example
///
/// ```no_run
/// use mesh_printability::{analyze_overhangs, DetectorConfig};
///
/// let analysis = analyze_overhangs("bracket.stl", &DetectorConfig::default()).unwrap();
/// println!("max overhang {:.0}°", analysis.max_overhang_angle);
/// ```
pub fn analyze_overhangs<P: AsRef<Path>>(
    path: P,
    config: &DetectorConfig,
) -> PrintabilityResult<OverhangAnalysis> {
    OverhangDetector::new(config.clone()).analyze_file(path)
}

/// Generate support structures for a mesh file.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the file cannot be
/// loaded.
pub fn generate_supports<P: AsRef<Path>>(
    path: P,
    settings: &SupportSettings,
) -> PrintabilityResult<SupportResult> {
    SupportGenerator::new(settings.clone()).generate_file(path)
}

/// Optimize generated supports for a goal with default settings.
#[must_use]
pub fn optimize_supports(result: &SupportResult, goal: OptimizationGoal) -> OptimizationResult {
    SupportOptimizer::new(OptimizationSettings::for_goal(goal)).optimize(result, Some(goal))
}

/// Analyze a mesh file and suggest design improvements.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded.
///
/// # Example
///
/// ```no_run
/// use mesh_printability::advise_design;
///
/// let advice = advise_design("bracket.stl").unwrap();
/// println!("{}", advice.report());
/// ```
pub fn advise_design<P: AsRef<Path>>(path: P) -> PrintabilityResult<DesignAdvice> {
    DesignAdvisor::new(AdvisorConfig::default()).analyze(path)
}
