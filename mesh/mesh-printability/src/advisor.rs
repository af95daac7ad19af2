//! Design advice for FDM printing.
//!
//! Combines overhang detection with a bounding-box scan of the mesh to
//! produce issues, orientation and fillet suggestions, a printability
//! score and basic slicer recommendations.

use std::path::{Path, PathBuf};

use mesh_types::{Aabb, Facet, MeshBounds, Point3, UnitQuaternion, Vector3};
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{AdvisorConfig, PLA_DENSITY};
use crate::error::PrintabilityResult;
use crate::overhang::{OverhangAnalysis, OverhangDetector, OverhangInfo, OverhangSeverity};

/// Length assigned to detected sharp edges (mm).
const SHARP_EDGE_LENGTH: f64 = 5.0;
/// Solid fraction of the bounding box used for the volume estimate.
const VOLUME_FILL_FACTOR: f64 = 0.5;
/// Shell plus infill fraction used for the material estimate.
const MATERIAL_FILL_FACTOR: f64 = 0.4;
/// Printed volume per hour (mm³).
const PRINT_RATE_MM3_PER_HOUR: f64 = 10_000.0;
/// Default infill percentage.
const DEFAULT_INFILL: u32 = 20;

/// Category of a design issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IssueCategory {
    /// Unsupported overhang.
    Overhang,
    /// Wall thinner than the printer can lay down.
    ThinWall,
    /// Pin or fin thinner than the printer can lay down.
    ThinFeature,
    /// Long unsupported span.
    Bridge,
    /// Orientation problem.
    Orientation,
    /// General geometry problem.
    Geometry,
    /// Model too small or too large.
    Scale,
    /// Sharp edge that may lift or crack.
    SharpEdge,
}

impl IssueCategory {
    /// Get a lowercase name for the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overhang => "overhang",
            Self::ThinWall => "thin_wall",
            Self::ThinFeature => "thin_feature",
            Self::Bridge => "bridge",
            Self::Orientation => "orientation",
            Self::Geometry => "geometry",
            Self::Scale => "scale",
            Self::SharpEdge => "sharp_edge",
        }
    }
}

/// Severity of a design issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IssueSeverity {
    /// Informational only.
    Info,
    /// May cause problems but can still print.
    Warning,
    /// Will likely fail.
    Error,
    /// Will fail.
    Critical,
}

impl IssueSeverity {
    /// Get a lowercase name for the severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Points deducted from the printability score per issue.
    #[must_use]
    pub fn score_penalty(&self) -> f64 {
        match self {
            Self::Info => 2.0,
            Self::Warning => 5.0,
            Self::Error => 15.0,
            Self::Critical => 30.0,
        }
    }

    fn from_overhang(severity: OverhangSeverity) -> Option<Self> {
        match severity {
            OverhangSeverity::None => None,
            OverhangSeverity::Minor => Some(Self::Info),
            OverhangSeverity::Moderate => Some(Self::Warning),
            OverhangSeverity::Severe => Some(Self::Error),
            OverhangSeverity::Critical => Some(Self::Critical),
        }
    }
}

/// A detected design issue.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignIssue {
    /// Issue category.
    pub category: IssueCategory,
    /// Issue severity.
    pub severity: IssueSeverity,
    /// Human-readable description.
    pub description: String,
    /// Location in the mesh, if applicable.
    pub location: Option<Point3<f64>>,
    /// Height above the bed, if applicable.
    pub z_height: Option<f64>,
    /// How to fix the issue.
    pub fix_suggestion: Option<String>,
    /// Whether the issue can be fixed without redesign.
    pub auto_fixable: bool,
}

impl DesignIssue {
    /// Create a new issue.
    #[must_use]
    pub fn new(
        category: IssueCategory,
        severity: IssueSeverity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            description: description.into(),
            location: None,
            z_height: None,
            fix_suggestion: None,
            auto_fixable: false,
        }
    }

    /// Set the location of the issue.
    #[must_use]
    pub fn with_location(mut self, location: Point3<f64>) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the height of the issue.
    #[must_use]
    pub fn with_z_height(mut self, z: f64) -> Self {
        self.z_height = Some(z);
        self
    }

    /// Set the fix suggestion.
    #[must_use]
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix_suggestion = Some(fix.into());
        self
    }

    /// Mark the issue as auto-fixable or not.
    #[must_use]
    pub fn with_auto_fixable(mut self, auto_fixable: bool) -> Self {
        self.auto_fixable = auto_fixable;
        self
    }
}

/// Issue counts per severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IssueCounts {
    /// Info issues.
    pub info: usize,
    /// Warnings.
    pub warning: usize,
    /// Errors.
    pub error: usize,
    /// Critical issues.
    pub critical: usize,
}

impl IssueCounts {
    /// Count for one severity.
    #[must_use]
    pub fn get(&self, severity: IssueSeverity) -> usize {
        match severity {
            IssueSeverity::Info => self.info,
            IssueSeverity::Warning => self.warning,
            IssueSeverity::Error => self.error,
            IssueSeverity::Critical => self.critical,
        }
    }

    /// Total number of issues.
    #[must_use]
    pub fn total(&self) -> usize {
        self.info + self.warning + self.error + self.critical
    }
}

/// A suggested print orientation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientationSuggestion {
    /// Rotation about X in degrees.
    pub rotation_x: f64,
    /// Rotation about Y in degrees.
    pub rotation_y: f64,
    /// Rotation about Z in degrees.
    pub rotation_z: f64,
    /// Why this orientation helps.
    pub benefits: Vec<String>,
    /// What it costs.
    pub drawbacks: Vec<String>,
    /// Expected reduction in support material.
    pub support_reduction_percent: f64,
    /// Expected change in print time; positive is longer.
    pub print_time_change_percent: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl OrientationSuggestion {
    /// The rotation as a unit quaternion (X, then Y, then Z).
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_printability::OrientationSuggestion;
    /// use mesh_types::Vector3;
    ///
    /// let suggestion = OrientationSuggestion {
    ///     rotation_x: 90.0,
    ///     rotation_y: 0.0,
    ///     rotation_z: 0.0,
    ///     benefits: Vec::new(),
    ///     drawbacks: Vec::new(),
    ///     support_reduction_percent: 0.0,
    ///     print_time_change_percent: 0.0,
    ///     confidence: 1.0,
    /// };
    /// let up = suggestion.rotation() * Vector3::y();
    /// assert!((up.z - 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(
            self.rotation_x.to_radians(),
            self.rotation_y.to_radians(),
            self.rotation_z.to_radians(),
        )
    }

    /// No rotation at all.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.rotation_x == 0.0 && self.rotation_y == 0.0 && self.rotation_z == 0.0
    }
}

/// Why a fillet is suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FilletReason {
    /// Corner touching the bed; rounding reduces lifting.
    Adhesion,
    /// Corner above the bed; rounding spreads load.
    StressConcentration,
}

impl FilletReason {
    /// Get a lowercase name for the reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adhesion => "adhesion",
            Self::StressConcentration => "stress_concentration",
        }
    }
}

/// Suggestion to add a fillet or chamfer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilletSuggestion {
    /// Edge location.
    pub location: Point3<f64>,
    /// Edge length in mm.
    pub edge_length: f64,
    /// Suggested radius in mm.
    pub suggested_radius: f64,
    /// Why the fillet helps.
    pub reason: FilletReason,
}

/// A sharp edge found by the geometry scan.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SharpEdge {
    /// Edge location.
    pub location: Point3<f64>,
    /// Dihedral angle in degrees.
    pub angle: f64,
    /// Edge length in mm.
    pub length: f64,
}

/// Bounding-box statistics of a mesh.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryScan {
    /// Width, depth and height in mm.
    pub dimensions: Vector3<f64>,
    /// Minimum corner.
    pub min_point: Point3<f64>,
    /// Maximum corner.
    pub max_point: Point3<f64>,
    /// Estimated solid volume in mm³.
    pub volume: f64,
    /// Estimated surface area in mm².
    pub surface_area: f64,
    /// Number of facet vertices (three per facet).
    pub vertex_count: usize,
    /// Right-angle corners at the base of the bounding box.
    pub sharp_edges: Vec<SharpEdge>,
}

impl GeometryScan {
    /// Scan a facet list.
    ///
    /// An empty list gives zero dimensions and no edges.
    #[must_use]
    pub fn from_facets(facets: &[Facet]) -> Self {
        let Some(bounds) = facets.bounds_opt() else {
            return Self {
                dimensions: Vector3::zeros(),
                min_point: Point3::origin(),
                max_point: Point3::origin(),
                volume: 0.0,
                surface_area: 0.0,
                vertex_count: 0,
                sharp_edges: Vec::new(),
            };
        };

        let d = bounds.size();
        let (w, dp, h) = (d.x, d.y, d.z);
        let sharp_edges = bounds
            .bottom_corners()
            .into_iter()
            .map(|location| SharpEdge {
                location,
                angle: 90.0,
                length: SHARP_EDGE_LENGTH,
            })
            .collect();

        Self {
            dimensions: d,
            min_point: bounds.min,
            max_point: bounds.max,
            volume: w * dp * h * VOLUME_FILL_FACTOR,
            surface_area: 2.0 * (w * dp + w * h + dp * h),
            vertex_count: facets.len() * 3,
            sharp_edges,
        }
    }

    /// The scanned bounding box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.min_point, self.max_point)
    }

    /// Smallest dimension.
    #[must_use]
    pub fn min_dimension(&self) -> f64 {
        self.bounds().min_extent()
    }

    /// Largest dimension.
    #[must_use]
    pub fn max_dimension(&self) -> f64 {
        self.bounds().max_extent()
    }
}

/// Complete design analysis for one mesh.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignAdvice {
    /// Analyzed file.
    pub file_path: Option<PathBuf>,
    /// Detected issues.
    pub issues: Vec<DesignIssue>,
    /// Orientations ranked by confidence, best first.
    pub orientation_suggestions: Vec<OrientationSuggestion>,
    /// Fillet suggestions.
    pub fillet_suggestions: Vec<FilletSuggestion>,
    /// Printability score in [0, 100].
    pub printability_score: f64,
    /// Any overhang needs support.
    pub support_required: bool,
    /// Share of facets in overhang regions.
    pub estimated_support_percent: f64,
    /// Recommended layer height in mm.
    pub recommended_layer_height: f64,
    /// Recommended infill percentage.
    pub recommended_infill: u32,
    /// Best orientation.
    pub recommended_orientation: Option<OrientationSuggestion>,
    /// Width, depth and height in mm.
    pub bounding_box: Vector3<f64>,
    /// Estimated print time in hours.
    pub estimated_print_time_hours: f64,
    /// Estimated material in grams.
    pub estimated_material_grams: f64,
}

impl DesignAdvice {
    /// Check if any issue is critical.
    #[must_use]
    pub fn has_critical_issues(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Critical)
    }

    /// Check if any issue is an error or worse.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity >= IssueSeverity::Error)
    }

    /// Count issues by severity.
    #[must_use]
    pub fn issue_summary(&self) -> IssueCounts {
        let mut counts = IssueCounts::default();
        for issue in &self.issues {
            match issue.severity {
                IssueSeverity::Info => counts.info += 1,
                IssueSeverity::Warning => counts.warning += 1,
                IssueSeverity::Error => counts.error += 1,
                IssueSeverity::Critical => counts.critical += 1,
            }
        }
        counts
    }

    /// Plain-text report.
    #[must_use]
    pub fn report(&self) -> String {
        let name = self
            .file_path
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| "mesh".to_string(), |n| n.to_string_lossy().into_owned());

        let mut lines = vec![
            format!("Design Analysis: {name}"),
            format!("Printability Score: {:.0}/100", self.printability_score),
            format!(
                "Supports Required: {}",
                if self.support_required { "Yes" } else { "No" }
            ),
        ];

        if !self.issues.is_empty() {
            lines.push(String::new());
            lines.push(format!("Issues Found ({}):", self.issues.len()));
            for issue in &self.issues {
                lines.push(format!(
                    "  [{}] {}",
                    issue.severity.as_str().to_uppercase(),
                    issue.description
                ));
                if let Some(fix) = &issue.fix_suggestion {
                    lines.push(format!("    -> {fix}"));
                }
            }
        }

        if let Some(o) = &self.recommended_orientation {
            lines.push(String::new());
            lines.push("Recommended Orientation:".to_string());
            lines.push(format!(
                "  Rotate X: {}°, Y: {}°, Z: {}°",
                o.rotation_x, o.rotation_y, o.rotation_z
            ));
            lines.push(format!("  Benefits: {}", o.benefits.join(", ")));
        }

        lines.join("\n")
    }
}

/// Printability score for a set of issues.
///
/// Starts at 100, deducts [`IssueSeverity::score_penalty`] per issue and
/// `overhang_percentage × 0.3` when supports are needed, then clamps to
/// [0, 100].
#[must_use]
pub fn printability_score(issues: &[DesignIssue], analysis: &OverhangAnalysis) -> f64 {
    let mut score = 100.0 - issues.iter().map(|i| i.severity.score_penalty()).sum::<f64>();
    if analysis.needs_supports {
        score -= analysis.overhang_percentage * 0.3;
    }
    score.clamp(0.0, 100.0)
}

/// Analyzes meshes and suggests design changes.
///
/// # Example
///
/// ```
/// use mesh_printability::{AdvisorConfig, DesignAdvisor};
/// use mesh_types::{Facet, Triangle};
///
/// let facets = vec![Facet::from_triangle(Triangle::from_arrays(
///     [0.0, 0.0, 0.0],
///     [30.0, 0.0, 0.0],
///     [0.0, 30.0, 30.0],
/// ))];
///
/// let advice = DesignAdvisor::new(AdvisorConfig::default()).analyze_facets(&facets, None);
/// assert!(advice.printability_score <= 100.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DesignAdvisor {
    config: AdvisorConfig,
}

impl DesignAdvisor {
    /// Create an advisor.
    #[must_use]
    pub fn new(config: AdvisorConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Load a mesh file and analyze it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot
    /// be loaded.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> PrintabilityResult<DesignAdvice> {
        self.config.validate()?;
        let path = path.as_ref();
        let facets = mesh_io::load_facets_with(path, &self.config.load)?;
        Ok(self.analyze_facets(&facets, Some(path.to_path_buf())))
    }

    /// Analyze a facet list.
    #[must_use]
    pub fn analyze_facets(&self, facets: &[Facet], file_path: Option<PathBuf>) -> DesignAdvice {
        let analysis = OverhangDetector::new(self.config.detector_config()).analyze(facets);
        let geometry = GeometryScan::from_facets(facets);

        let mut issues: Vec<DesignIssue> = analysis
            .overhangs
            .iter()
            .filter_map(overhang_issue)
            .collect();
        issues.extend(self.sharp_edge_issues(&geometry));
        issues.extend(self.scale_issues(&geometry));

        let orientation_suggestions = suggest_orientations(&analysis, &geometry);
        let fillet_suggestions = self.suggest_fillets(&geometry);
        let printability_score = printability_score(&issues, &analysis);

        info!(
            issues = issues.len(),
            score = printability_score,
            support_required = analysis.needs_supports,
            "Design analysis complete"
        );

        DesignAdvice {
            file_path,
            recommended_orientation: orientation_suggestions.first().cloned(),
            issues,
            orientation_suggestions,
            fillet_suggestions,
            printability_score,
            support_required: analysis.needs_supports,
            estimated_support_percent: analysis.overhang_percentage,
            recommended_layer_height: self.recommend_layer_height(&geometry),
            recommended_infill: DEFAULT_INFILL,
            bounding_box: geometry.dimensions,
            estimated_print_time_hours: geometry.volume / PRINT_RATE_MM3_PER_HOUR,
            estimated_material_grams: geometry.volume / 1000.0 * PLA_DENSITY * MATERIAL_FILL_FACTOR,
        }
    }

    fn touches_bed(&self, location: &Point3<f64>) -> bool {
        location.z < self.config.bed_contact_height
    }

    fn sharp_edge_issues(&self, geometry: &GeometryScan) -> Vec<DesignIssue> {
        geometry
            .sharp_edges
            .iter()
            .filter(|e| self.touches_bed(&e.location))
            .map(|e| {
                DesignIssue::new(
                    IssueCategory::SharpEdge,
                    IssueSeverity::Info,
                    "Sharp edge at base may affect bed adhesion",
                )
                .with_location(e.location)
                .with_fix("Consider adding a fillet or chamfer for better adhesion")
                .with_auto_fixable(true)
            })
            .collect()
    }

    fn scale_issues(&self, geometry: &GeometryScan) -> Vec<DesignIssue> {
        let mut issues = Vec::new();

        let min_dim = geometry.min_dimension();
        if min_dim > 0.0 && min_dim < self.config.min_dimension {
            issues.push(
                DesignIssue::new(
                    IssueCategory::Scale,
                    IssueSeverity::Warning,
                    format!("Very small dimension ({min_dim:.2}mm) may not print well"),
                )
                .with_fix("Scale up model or verify this is intentional"),
            );
        }

        let max_dim = geometry.max_dimension();
        if max_dim > self.config.max_build_dimension {
            issues.push(
                DesignIssue::new(
                    IssueCategory::Scale,
                    IssueSeverity::Warning,
                    format!("Large model ({max_dim:.0}mm) may exceed bed size"),
                )
                .with_fix("Consider splitting into parts or scaling down"),
            );
        }

        issues
    }

    fn suggest_fillets(&self, geometry: &GeometryScan) -> Vec<FilletSuggestion> {
        geometry
            .sharp_edges
            .iter()
            .map(|e| {
                let (reason, suggested_radius) = if self.touches_bed(&e.location) {
                    (FilletReason::Adhesion, 2.0)
                } else {
                    (FilletReason::StressConcentration, 1.0)
                };
                FilletSuggestion {
                    location: e.location,
                    edge_length: e.length,
                    suggested_radius,
                    reason,
                }
            })
            .collect()
    }

    fn recommend_layer_height(&self, geometry: &GeometryScan) -> f64 {
        let min_dim = geometry.min_dimension();
        if min_dim < 5.0 {
            0.12
        } else if min_dim < 20.0 {
            0.16
        } else {
            self.config.layer_height
        }
    }
}

fn overhang_issue(overhang: &OverhangInfo) -> Option<DesignIssue> {
    let severity = IssueSeverity::from_overhang(overhang.severity)?;

    let mut description = format!(
        "{:.0}° overhang at Z={:.1}mm",
        overhang.angle, overhang.z_height
    );
    if overhang.needs_support {
        description.push_str(" - requires support");
    }

    Some(
        DesignIssue::new(IssueCategory::Overhang, severity, description)
            .with_location(overhang.location)
            .with_z_height(overhang.z_height)
            .with_fix(overhang_fix(overhang))
            .with_auto_fixable(overhang.angle < 60.0),
    )
}

fn overhang_fix(overhang: &OverhangInfo) -> String {
    let angle = overhang.angle;
    if angle < 50.0 {
        "Consider rotating model to reduce overhang angle".to_string()
    } else if angle < 60.0 {
        "Add tree supports for this region".to_string()
    } else if angle < 75.0 {
        format!(
            "Use {} supports; consider redesigning with chamfer",
            overhang.suggested_support_type.as_str()
        )
    } else {
        "Redesign with built-in supports or split into multiple parts".to_string()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn suggest_orientations(
    analysis: &OverhangAnalysis,
    geometry: &GeometryScan,
) -> Vec<OrientationSuggestion> {
    let mut drawbacks = Vec::new();
    if analysis.needs_supports {
        drawbacks.push(format!(
            "Requires supports ({:.0}% coverage)",
            analysis.overhang_percentage
        ));
    }
    if analysis.max_overhang_angle >= 60.0 {
        drawbacks.push(format!(
            "Severe overhangs ({:.0}°)",
            analysis.max_overhang_angle
        ));
    }
    if drawbacks.is_empty() {
        drawbacks.push("Current orientation is acceptable".to_string());
    }

    let mut suggestions = vec![OrientationSuggestion {
        rotation_x: 0.0,
        rotation_y: 0.0,
        rotation_z: 0.0,
        benefits: strings(&["No rotation needed"]),
        drawbacks,
        support_reduction_percent: 0.0,
        print_time_change_percent: 0.0,
        confidence: 0.5,
    }];

    if analysis.needs_supports {
        // taller than wide: lay it down
        if geometry.dimensions.z > geometry.dimensions.x {
            suggestions.push(OrientationSuggestion {
                rotation_x: 90.0,
                rotation_y: 0.0,
                rotation_z: 0.0,
                benefits: strings(&["Reduces overhang angles", "Larger base for adhesion"]),
                drawbacks: strings(&["May increase layer lines visibility on top"]),
                support_reduction_percent: 40.0,
                print_time_change_percent: 10.0,
                confidence: 0.7,
            });
        }

        suggestions.push(OrientationSuggestion {
            rotation_x: 45.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            benefits: strings(&["Reduces steep overhangs", "Better surface quality"]),
            drawbacks: strings(&["Requires supports at corners", "Longer print time"]),
            support_reduction_percent: 20.0,
            print_time_change_percent: 15.0,
            confidence: 0.6,
        });
    }

    // stable, so ties keep insertion order
    suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    suggestions
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use mesh_types::Triangle;

    fn tilted(angle_deg: f64, z: f64, x: f64) -> Facet {
        let a = angle_deg.to_radians();
        Facet::new(
            Triangle::from_arrays([x, 0.0, z], [x + 4.0, 0.0, z], [x, 4.0, z]),
            Vector3::new(a.cos(), 0.0, -a.sin()),
        )
    }

    fn flat(x0: f64, y0: f64, z: f64, x1: f64, y1: f64) -> Facet {
        Facet::from_triangle(Triangle::from_arrays([x0, y0, z], [x1, y0, z], [x0, y1, z]))
    }

    fn advisor() -> DesignAdvisor {
        DesignAdvisor::default()
    }

    #[test]
    fn test_overhang_issue_mapping() {
        let facets = vec![
            tilted(52.0, 5.0, 0.0),
            tilted(62.0, 6.0, 0.0),
            tilted(70.0, 7.0, 0.0),
            tilted(80.0, 8.0, 0.0),
            flat(0.0, 0.0, 10.0, 10.0, 10.0),
        ];
        let advice = advisor().analyze_facets(&facets, None);
        let overhangs: Vec<&DesignIssue> = advice
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::Overhang)
            .collect();

        assert_eq!(overhangs.len(), 4);
        // steepest first
        assert_eq!(overhangs[0].severity, IssueSeverity::Critical);
        assert_eq!(overhangs[1].severity, IssueSeverity::Error);
        assert_eq!(overhangs[2].severity, IssueSeverity::Warning);
        assert_eq!(overhangs[3].severity, IssueSeverity::Info);

        assert_eq!(overhangs[3].description, "52° overhang at Z=5.0mm - requires support");
        assert!(overhangs[3].auto_fixable);
        assert!(!overhangs[2].auto_fixable);
        assert!(!overhangs[1].auto_fixable);
        assert_eq!(
            overhangs[3].fix_suggestion.as_deref(),
            Some("Add tree supports for this region")
        );
        assert_eq!(
            overhangs[0].fix_suggestion.as_deref(),
            Some("Redesign with built-in supports or split into multiple parts")
        );
        assert!(advice.has_critical_issues());
        assert!(advice.has_errors());
    }

    #[test]
    fn test_overhang_fix_uses_suggested_type() {
        let advice = advisor().analyze_facets(&[tilted(67.0, 4.0, 0.0)], None);
        let issue = advice
            .issues
            .iter()
            .find(|i| i.category == IssueCategory::Overhang)
            .unwrap();
        assert_eq!(
            issue.fix_suggestion.as_deref(),
            Some("Use tree supports; consider redesigning with chamfer")
        );
    }

    #[test]
    fn test_mild_overhang_fix() {
        let advice = advisor().analyze_facets(&[tilted(47.0, 4.0, 0.0)], None);
        let issue = &advice.issues[0];
        assert_eq!(
            issue.fix_suggestion.as_deref(),
            Some("Consider rotating model to reduce overhang angle")
        );
    }

    #[test]
    fn test_geometry_scan_dimensions() {
        let facets = vec![flat(0.0, 0.0, 0.0, 30.0, 12.0), flat(0.0, 0.0, 4.0, 30.0, 12.0)];
        let scan = GeometryScan::from_facets(&facets);
        assert_eq!(scan.bounds(), facets.bounds());
        assert_eq!(scan.dimensions, Vector3::new(30.0, 12.0, 4.0));
        assert!((scan.min_dimension() - 4.0).abs() < 1e-12);
        assert!((scan.max_dimension() - 30.0).abs() < 1e-12);

        let empty = GeometryScan::from_facets(&[]);
        assert_eq!(empty.min_dimension(), 0.0);
        assert_eq!(empty.max_dimension(), 0.0);
    }

    #[test]
    fn test_sharp_edges_at_base() {
        let facets = vec![
            flat(0.0, 0.0, 0.0, 30.0, 30.0),
            flat(0.0, 0.0, 30.0, 30.0, 30.0),
        ];
        let advice = advisor().analyze_facets(&facets, None);

        let edges: Vec<&DesignIssue> = advice
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::SharpEdge)
            .collect();
        assert_eq!(edges.len(), 4);
        assert!(edges.iter().all(|e| e.severity == IssueSeverity::Info && e.auto_fixable));

        assert_eq!(advice.fillet_suggestions.len(), 4);
        assert!(
            advice
                .fillet_suggestions
                .iter()
                .all(|f| f.reason == FilletReason::Adhesion && f.suggested_radius == 2.0)
        );
    }

    #[test]
    fn test_raised_model_gets_stress_fillets() {
        let facets = vec![
            flat(0.0, 0.0, 5.0, 30.0, 30.0),
            flat(0.0, 0.0, 35.0, 30.0, 30.0),
        ];
        let advice = advisor().analyze_facets(&facets, None);
        assert!(
            !advice
                .issues
                .iter()
                .any(|i| i.category == IssueCategory::SharpEdge)
        );
        assert!(
            advice
                .fillet_suggestions
                .iter()
                .all(|f| f.reason == FilletReason::StressConcentration
                    && f.suggested_radius == 1.0
                    && f.edge_length == 5.0)
        );
    }

    #[test]
    fn test_scale_issues() {
        let small = vec![
            flat(0.0, 0.0, 0.0, 10.0, 10.0),
            flat(0.0, 0.0, 0.5, 10.0, 10.0),
        ];
        let advice = advisor().analyze_facets(&small, None);
        let scale: Vec<&DesignIssue> = advice
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::Scale)
            .collect();
        assert_eq!(scale.len(), 1);
        assert_eq!(scale[0].description, "Very small dimension (0.50mm) may not print well");

        let large = vec![
            flat(0.0, 0.0, 0.0, 250.0, 10.0),
            flat(0.0, 0.0, 10.0, 250.0, 10.0),
        ];
        let advice = advisor().analyze_facets(&large, None);
        assert!(
            advice
                .issues
                .iter()
                .any(|i| i.description == "Large model (250mm) may exceed bed size")
        );
    }

    #[test]
    fn test_flat_model_has_no_small_dimension_issue() {
        let advice = advisor().analyze_facets(&[flat(0.0, 0.0, 0.0, 10.0, 10.0)], None);
        assert!(!advice.issues.iter().any(|i| i.category == IssueCategory::Scale));
    }

    #[test]
    fn test_orientations_when_supports_needed() {
        // taller than wide
        let facets = vec![
            tilted(62.0, 40.0, 0.0),
            flat(0.0, 0.0, 0.0, 10.0, 10.0),
        ];
        let advice = advisor().analyze_facets(&facets, None);
        let confidences: Vec<f64> = advice
            .orientation_suggestions
            .iter()
            .map(|o| o.confidence)
            .collect();
        assert_eq!(confidences, vec![0.7, 0.6, 0.5]);

        let best = advice.recommended_orientation.as_ref().unwrap();
        assert_eq!(best.rotation_x, 90.0);
        assert_eq!(best.support_reduction_percent, 40.0);

        let as_is = &advice.orientation_suggestions[2];
        assert!(as_is.is_identity());
        assert_eq!(as_is.drawbacks[0], "Requires supports (50% coverage)");
        assert_eq!(as_is.drawbacks[1], "Severe overhangs (62°)");
    }

    #[test]
    fn test_orientations_without_supports() {
        let facets = vec![
            flat(0.0, 0.0, 0.0, 30.0, 30.0),
            flat(0.0, 0.0, 30.0, 30.0, 30.0),
        ];
        let advice = advisor().analyze_facets(&facets, None);
        assert_eq!(advice.orientation_suggestions.len(), 1);
        assert_eq!(
            advice.orientation_suggestions[0].drawbacks,
            vec!["Current orientation is acceptable"]
        );
        assert!(!advice.support_required);
    }

    #[test]
    fn test_wide_model_skips_lay_down() {
        let facets = vec![
            tilted(62.0, 5.0, 0.0),
            flat(0.0, 0.0, 0.0, 50.0, 10.0),
        ];
        let advice = advisor().analyze_facets(&facets, None);
        let xs: Vec<f64> = advice
            .orientation_suggestions
            .iter()
            .map(|o| o.rotation_x)
            .collect();
        assert_eq!(xs, vec![45.0, 0.0]);
    }

    #[test]
    fn test_score_and_estimates() {
        let facets = vec![
            flat(0.0, 0.0, 0.0, 20.0, 40.0),
            flat(0.0, 0.0, 10.0, 20.0, 40.0),
        ];
        let advice = advisor().analyze_facets(&facets, None);

        // four base corners, info each
        assert!((advice.printability_score - 92.0).abs() < 1e-12);
        assert!((advice.bounding_box - Vector3::new(20.0, 40.0, 10.0)).norm() < 1e-12);
        // 20 * 40 * 10 * 0.5
        assert!((advice.estimated_print_time_hours - 0.4).abs() < 1e-12);
        assert!((advice.estimated_material_grams - 4.0 * 1.24 * 0.4).abs() < 1e-12);
        assert!((advice.recommended_layer_height - 0.16).abs() < 1e-12);
        assert_eq!(advice.recommended_infill, 20);
    }

    #[test]
    fn test_layer_height_steps() {
        let cases = [(3.0, 0.12), (10.0, 0.16), (25.0, 0.20)];
        for (size, expected) in cases {
            let facets = vec![
                flat(0.0, 0.0, 0.0, 40.0, 40.0),
                flat(0.0, 0.0, size, 40.0, 40.0),
            ];
            let advice = advisor().analyze_facets(&facets, None);
            assert!((advice.recommended_layer_height - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_score_penalty_for_supports() {
        let analysis = OverhangAnalysis {
            file_path: None,
            total_faces: 10,
            overhang_faces: 5,
            overhang_percentage: 50.0,
            max_overhang_angle: 60.0,
            overhangs: Vec::new(),
            needs_supports: true,
            recommended_support_density: 15,
            estimated_support_material: 0.0,
        };
        let issues = vec![DesignIssue::new(
            IssueCategory::Overhang,
            IssueSeverity::Error,
            "x",
        )];
        assert!((printability_score(&issues, &analysis) - 70.0).abs() < 1e-12);

        let many = vec![
            DesignIssue::new(IssueCategory::Overhang, IssueSeverity::Critical, "x");
            5
        ];
        assert_eq!(printability_score(&many, &analysis), 0.0);
    }

    #[test]
    fn test_issue_summary_and_report() {
        let facets = vec![tilted(80.0, 8.0, 0.0), flat(0.0, 0.0, 0.0, 10.0, 10.0)];
        let advice = advisor().analyze_facets(&facets, Some(PathBuf::from("/tmp/bracket.stl")));
        let counts = advice.issue_summary();
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.info, 4);
        assert_eq!(counts.total(), advice.issues.len());
        assert_eq!(counts.get(IssueSeverity::Warning), 0);

        let report = advice.report();
        assert!(report.starts_with("Design Analysis: bracket.stl"));
        assert!(report.contains("Supports Required: Yes"));
        assert!(report.contains("[CRITICAL] 80° overhang at Z=8.0mm - requires support"));
        assert!(report.contains("Recommended Orientation:"));
    }

    #[test]
    fn test_empty_facets() {
        let advice = advisor().analyze_facets(&[], None);
        assert!(advice.issues.is_empty());
        assert_eq!(advice.printability_score, 100.0);
        assert_eq!(advice.bounding_box, Vector3::zeros());
        assert!(advice.fillet_suggestions.is_empty());
    }

    #[test]
    fn test_rotation_quaternion() {
        let suggestion = OrientationSuggestion {
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 90.0,
            benefits: Vec::new(),
            drawbacks: Vec::new(),
            support_reduction_percent: 0.0,
            print_time_change_percent: 0.0,
            confidence: 0.5,
        };
        let v = suggestion.rotation() * Vector3::x();
        assert!((v - Vector3::y()).norm() < 1e-12);
    }
}
