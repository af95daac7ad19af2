//! Overhang detection on triangle soups.
//!
//! Every downward-facing facet gets an overhang angle measured from
//! vertical: `90 - acos(|nz|)` degrees, so a vertical wall is 0° and a flat
//! ceiling is 90°. Qualifying facets are grouped by severity bucket, not by
//! spatial adjacency, so a mesh reports at most one region per severity and
//! two disjoint overhangs of equal severity share a combined centroid.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use mesh_types::{Facet, Point3, Vector3};
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{DetectorConfig, SeverityThresholds, volume_to_grams};
use crate::error::PrintabilityResult;

/// Severity of an overhang region, ordered from harmless to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OverhangSeverity {
    /// Below the minor threshold; prints without support.
    None,
    /// May print without supports.
    Minor,
    /// Likely needs supports.
    Moderate,
    /// Definitely needs supports.
    Severe,
    /// Will fail without supports.
    Critical,
}

impl OverhangSeverity {
    /// Classify an overhang angle. Buckets are half-open on the right.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_printability::{OverhangSeverity, SeverityThresholds};
    ///
    /// let t = SeverityThresholds::default();
    /// assert_eq!(OverhangSeverity::classify(44.9, &t), OverhangSeverity::None);
    /// assert_eq!(OverhangSeverity::classify(45.0, &t), OverhangSeverity::Minor);
    /// assert_eq!(OverhangSeverity::classify(75.0, &t), OverhangSeverity::Critical);
    /// ```
    #[must_use]
    pub fn classify(angle: f64, thresholds: &SeverityThresholds) -> Self {
        if angle < thresholds.minor {
            Self::None
        } else if angle < thresholds.moderate {
            Self::Minor
        } else if angle < thresholds.severe {
            Self::Moderate
        } else if angle < thresholds.critical {
            Self::Severe
        } else {
            Self::Critical
        }
    }

    /// Get a lowercase name for the severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::Critical => "critical",
        }
    }

    /// Recommended support infill percentage for this severity.
    #[must_use]
    pub fn support_density_percent(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Minor => 10,
            Self::Moderate => 15,
            Self::Severe => 20,
            Self::Critical => 25,
        }
    }
}

/// Support style suggested for an overhang region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SupportKind {
    /// The region prints without support.
    None,
    /// Column supports.
    Normal,
    /// Tree supports.
    Tree,
}

impl SupportKind {
    /// Get a lowercase name for the support style.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Normal => "normal",
            Self::Tree => "tree",
        }
    }
}

/// One severity bucket of overhanging facets.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverhangInfo {
    /// Steepest overhang angle in the bucket, degrees from vertical.
    pub angle: f64,
    /// Bucket severity.
    pub severity: OverhangSeverity,
    /// Summed facet area in mm².
    pub area: f64,
    /// Unweighted mean of the member facet centroids.
    pub location: Point3<f64>,
    /// Z of `location`.
    pub z_height: f64,
    /// Number of member facets.
    pub face_count: usize,
    /// `angle` reaches the support threshold.
    pub needs_support: bool,
    /// Suggested support style.
    pub suggested_support_type: SupportKind,
}

/// Result of overhang detection for one mesh.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverhangAnalysis {
    /// Source file, when the mesh was loaded from disk.
    pub file_path: Option<PathBuf>,
    /// Number of facets in the mesh.
    pub total_faces: usize,
    /// Facets belonging to reported regions.
    pub overhang_faces: usize,
    /// `overhang_faces / total_faces * 100`.
    pub overhang_percentage: f64,
    /// Steepest reported angle, 0 when there are no regions.
    pub max_overhang_angle: f64,
    /// Regions sorted by angle, steepest first.
    pub overhangs: Vec<OverhangInfo>,
    /// Any region needs support.
    pub needs_supports: bool,
    /// Recommended support infill percentage.
    pub recommended_support_density: u32,
    /// Estimated support material in grams.
    pub estimated_support_material: f64,
}

impl OverhangAnalysis {
    /// Severity of the steepest region, `None` when there are no regions.
    #[must_use]
    pub fn overall_severity(&self) -> OverhangSeverity {
        self.overhangs
            .iter()
            .max_by(|a, b| a.angle.total_cmp(&b.angle))
            .map_or(OverhangSeverity::None, |o| o.severity)
    }

    /// Regions that need support.
    pub fn supported_regions(&self) -> impl Iterator<Item = &OverhangInfo> {
        self.overhangs.iter().filter(|o| o.needs_support)
    }
}

/// Overhang angle of a facet normal in degrees.
///
/// Upward and horizontal normals (`nz >= 0`) give 0.
///
/// # Example
///
/// ```
/// use mesh_printability::overhang_angle;
/// use mesh_types::Vector3;
///
/// assert!(overhang_angle(&Vector3::new(0.0, 0.0, 1.0)).abs() < 1e-9);
/// assert!((overhang_angle(&Vector3::new(0.0, 0.0, -1.0)) - 90.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn overhang_angle(normal: &Vector3<f64>) -> f64 {
    if normal.z >= 0.0 {
        return 0.0;
    }
    90.0 - normal.z.abs().min(1.0).acos().to_degrees()
}

struct Bucket {
    faces: usize,
    max_angle: f64,
    area: f64,
    centroid_sum: Vector3<f64>,
}

impl Bucket {
    fn new() -> Self {
        Self {
            faces: 0,
            max_angle: 0.0,
            area: 0.0,
            centroid_sum: Vector3::zeros(),
        }
    }
}

/// Detects overhanging regions in a triangle soup.
///
/// # Example
///
/// ```
/// use mesh_printability::{DetectorConfig, OverhangDetector, OverhangSeverity};
/// use mesh_types::{Facet, Triangle};
///
/// // Flat ceiling at z = 10, wound to face down
/// let ceiling = Facet::from_triangle(Triangle::from_arrays(
///     [0.0, 0.0, 10.0],
///     [0.0, 5.0, 10.0],
///     [5.0, 0.0, 10.0],
/// ));
///
/// let analysis = OverhangDetector::new(DetectorConfig::default()).analyze(&[ceiling]);
/// assert!(analysis.needs_supports);
/// assert_eq!(analysis.overall_severity(), OverhangSeverity::Critical);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OverhangDetector {
    config: DetectorConfig,
}

impl OverhangDetector {
    /// Create a detector.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Load a mesh file and analyze it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot
    /// be loaded. Nothing is read when the configuration is invalid.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> PrintabilityResult<OverhangAnalysis> {
        let path = path.as_ref();
        self.config.validate()?;
        let facets = mesh_io::load_facets_with(path, &self.config.load)?;

        let mut analysis = self.analyze(&facets);
        analysis.file_path = Some(path.to_path_buf());
        Ok(analysis)
    }

    /// Analyze facets already in memory.
    #[must_use]
    pub fn analyze(&self, facets: &[Facet]) -> OverhangAnalysis {
        let overhangs = self.detect_regions(facets);

        let total_faces = facets.len();
        let overhang_faces: usize = overhangs.iter().map(|o| o.face_count).sum();
        let max_overhang_angle = overhangs.first().map_or(0.0, |o| o.angle);
        let needs_supports = overhangs.iter().any(|o| o.needs_support);

        #[allow(clippy::cast_precision_loss)]
        let overhang_percentage = if total_faces > 0 {
            overhang_faces as f64 / total_faces as f64 * 100.0
        } else {
            0.0
        };

        let analysis = OverhangAnalysis {
            file_path: None,
            total_faces,
            overhang_faces,
            overhang_percentage,
            max_overhang_angle,
            recommended_support_density: self.support_density(&overhangs),
            estimated_support_material: self.support_material(&overhangs),
            needs_supports,
            overhangs,
        };

        info!(
            faces = total_faces,
            regions = analysis.overhangs.len(),
            max_angle = max_overhang_angle,
            needs_supports,
            "Overhang analysis complete"
        );

        analysis
    }

    fn detect_regions(&self, facets: &[Facet]) -> Vec<OverhangInfo> {
        let mut buckets: HashMap<OverhangSeverity, Bucket> = HashMap::new();

        for facet in facets {
            let angle = overhang_angle(&facet.normal);
            if angle <= 0.0 {
                continue;
            }

            let severity = OverhangSeverity::classify(angle, &self.config.severity);
            let bucket = buckets.entry(severity).or_insert_with(Bucket::new);
            bucket.faces += 1;
            bucket.max_angle = bucket.max_angle.max(angle);
            bucket.area += facet.area();
            bucket.centroid_sum += facet.centroid().coords;
        }

        let mut regions: Vec<OverhangInfo> = buckets
            .into_iter()
            .filter_map(|(severity, bucket)| {
                if bucket.area < self.config.min_area {
                    debug!(
                        severity = severity.as_str(),
                        area = bucket.area,
                        "Dropping overhang region below minimum area"
                    );
                    return None;
                }
                Some(self.region(severity, &bucket))
            })
            .collect();

        regions.sort_by(|a, b| b.angle.total_cmp(&a.angle));
        regions
    }

    fn region(&self, severity: OverhangSeverity, bucket: &Bucket) -> OverhangInfo {
        #[allow(clippy::cast_precision_loss)]
        let location = Point3::from(bucket.centroid_sum / bucket.faces as f64);
        let needs_support = bucket.max_angle >= self.config.support_threshold;

        OverhangInfo {
            angle: bucket.max_angle,
            severity,
            area: bucket.area,
            location,
            z_height: location.z,
            face_count: bucket.faces,
            needs_support,
            suggested_support_type: self.suggest_support(bucket.max_angle, bucket.area),
        }
    }

    fn suggest_support(&self, angle: f64, area: f64) -> SupportKind {
        if angle < self.config.support_threshold {
            SupportKind::None
        } else if angle >= self.config.tree_min_angle && area < self.config.tree_max_area {
            SupportKind::Tree
        } else {
            SupportKind::Normal
        }
    }

    /// Step function of the steepest reported angle.
    fn support_density(&self, overhangs: &[OverhangInfo]) -> u32 {
        overhangs.first().map_or(0, |o| {
            OverhangSeverity::classify(o.angle, &self.config.severity).support_density_percent()
        })
    }

    /// Column of `area × z_height × density` under every supported region.
    ///
    /// Regions below the bed contribute nothing.
    fn support_material(&self, overhangs: &[OverhangInfo]) -> f64 {
        let volume: f64 = overhangs
            .iter()
            .filter(|o| o.needs_support)
            .map(|o| o.area * o.z_height.max(0.0) * self.config.support_density_factor)
            .sum();
        volume_to_grams(volume)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use mesh_types::Triangle;

    /// A facet with a given overhang angle (tilted about Y) and area 8 mm².
    fn tilted(angle_deg: f64, z: f64) -> Facet {
        let (s, c) = angle_deg.to_radians().sin_cos();
        // angle = 90 - acos(|nz|)  =>  |nz| = sin(angle)
        Facet::new(
            Triangle::from_arrays([0.0, 0.0, z], [4.0, 0.0, z], [0.0, 4.0, z]),
            Vector3::new(c, 0.0, -s),
        )
    }

    #[test]
    fn test_angle_of_axis_normals() {
        assert!(overhang_angle(&Vector3::new(0.0, 0.0, 1.0)).abs() < 1e-9);
        assert!((overhang_angle(&Vector3::new(0.0, 0.0, -1.0)) - 90.0).abs() < 1e-9);
        assert!(overhang_angle(&Vector3::new(1.0, 0.0, 0.0)).abs() < 1e-9);
    }

    #[test]
    fn test_angle_of_tilted_normal() {
        let n = Vector3::new(0.5, 0.0, -(0.75_f64).sqrt());
        assert!((overhang_angle(&n) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_severity_boundaries() {
        let t = SeverityThresholds::default();
        let cases = [
            (0.0, OverhangSeverity::None),
            (44.999, OverhangSeverity::None),
            (45.0, OverhangSeverity::Minor),
            (54.999, OverhangSeverity::Minor),
            (55.0, OverhangSeverity::Moderate),
            (65.0, OverhangSeverity::Severe),
            (74.999, OverhangSeverity::Severe),
            (75.0, OverhangSeverity::Critical),
            (90.0, OverhangSeverity::Critical),
        ];
        for (angle, expected) in cases {
            assert_eq!(OverhangSeverity::classify(angle, &t), expected, "{angle}");
        }
    }

    #[test]
    fn test_upward_mesh_has_no_overhangs() {
        let up = Facet::from_triangle(Triangle::from_arrays(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ));
        let analysis = OverhangDetector::default().analyze(&[up, up]);
        assert!(analysis.overhangs.is_empty());
        assert!(!analysis.needs_supports);
        assert_eq!(analysis.max_overhang_angle, 0.0);
        assert_eq!(analysis.recommended_support_density, 0);
        assert_eq!(analysis.estimated_support_material, 0.0);
        assert_eq!(analysis.overall_severity(), OverhangSeverity::None);
    }

    #[test]
    fn test_empty_mesh() {
        let analysis = OverhangDetector::default().analyze(&[]);
        assert_eq!(analysis.total_faces, 0);
        assert_eq!(analysis.overhang_percentage, 0.0);
    }

    #[test]
    fn test_same_severity_merges_into_one_region() {
        let a = tilted(60.0, 10.0);
        let mut b = tilted(62.0, 20.0);
        b.triangle = b.triangle.map_vertices(|p| p + Vector3::new(100.0, 0.0, 0.0));

        let analysis = OverhangDetector::default().analyze(&[a, b]);
        assert_eq!(analysis.overhangs.len(), 1);

        let region = &analysis.overhangs[0];
        assert_eq!(region.severity, OverhangSeverity::Moderate);
        assert_eq!(region.face_count, 2);
        assert!((region.angle - 62.0).abs() < 1e-9);
        assert!((region.area - 16.0).abs() < 1e-9);
        // unweighted mean of the two centroids
        assert!((region.z_height - 15.0).abs() < 1e-9);
        assert!((region.location.x - (4.0 / 3.0 + 50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_regions_sorted_steepest_first() {
        let facets = [tilted(50.0, 5.0), tilted(80.0, 5.0), tilted(30.0, 5.0)];
        let analysis = OverhangDetector::default().analyze(&facets);
        let angles: Vec<f64> = analysis.overhangs.iter().map(|o| o.angle).collect();
        assert_eq!(analysis.overhangs.len(), 3);
        assert!(angles.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(analysis.overall_severity(), OverhangSeverity::Critical);
        assert_eq!(analysis.recommended_support_density, 25);
    }

    #[test]
    fn test_shallow_region_reported_without_support() {
        let analysis = OverhangDetector::default().analyze(&[tilted(30.0, 5.0)]);
        let region = &analysis.overhangs[0];
        assert_eq!(region.severity, OverhangSeverity::None);
        assert!(!region.needs_support);
        assert_eq!(region.suggested_support_type, SupportKind::None);
        assert!(!analysis.needs_supports);
        assert_eq!(analysis.recommended_support_density, 0);
    }

    #[test]
    fn test_small_regions_dropped() {
        let config = DetectorConfig::default().with_min_area(10.0);
        let analysis = OverhangDetector::new(config).analyze(&[tilted(60.0, 5.0)]);
        assert!(analysis.overhangs.is_empty());
        assert_eq!(analysis.overhang_faces, 0);
    }

    #[test]
    fn test_support_suggestion() {
        let detector = OverhangDetector::default();
        assert_eq!(detector.suggest_support(44.0, 10.0), SupportKind::None);
        assert_eq!(detector.suggest_support(50.0, 10.0), SupportKind::Normal);
        assert_eq!(detector.suggest_support(60.0, 99.0), SupportKind::Tree);
        assert_eq!(detector.suggest_support(60.0, 100.0), SupportKind::Normal);
    }

    #[test]
    fn test_material_estimate() {
        // 8 mm² at z = 10: 8 * 10 * 0.15 = 12 mm³
        let analysis = OverhangDetector::default().analyze(&[tilted(60.0, 10.0)]);
        assert!((analysis.estimated_support_material - 12.0 / 1000.0 * 1.24).abs() < 1e-12);
        assert_eq!(analysis.recommended_support_density, 15);
    }

    #[test]
    fn test_material_estimate_ignores_regions_below_bed() {
        let analysis = OverhangDetector::default().analyze(&[tilted(60.0, -5.0)]);
        assert!(analysis.needs_supports);
        assert_eq!(analysis.estimated_support_material, 0.0);

        // only the region above the bed counts: 8 * 10 * 0.15 = 12 mm³
        let facets = [tilted(60.0, 10.0), tilted(80.0, -5.0)];
        let analysis = OverhangDetector::default().analyze(&facets);
        assert_eq!(analysis.overhangs.len(), 2);
        assert!((analysis.estimated_support_material - 12.0 / 1000.0 * 1.24).abs() < 1e-12);
    }

    #[test]
    fn test_overhang_percentage() {
        let up = tilted(0.0, 0.0);
        let facets = [tilted(60.0, 10.0), up, up, up];
        let analysis = OverhangDetector::default().analyze(&facets);
        assert_eq!(analysis.overhang_faces, 1);
        assert!((analysis.overhang_percentage - 25.0).abs() < 1e-9);
    }
}
