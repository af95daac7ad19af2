//! Support structure generation.
//!
//! One structure is generated per overhang region that needs support:
//!
//! - **Column** (`normal`, `linear`): fills the region footprint from the bed
//!   to the overhang at the configured infill density.
//! - **Tree**: a trunk from the bed under the region centroid, with branches
//!   leaving the trunk at 70% of the height and fanning out to a circle with
//!   the same area as the region.
//!
//! Volumes are calibrated estimates in mm³, not slicer output.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use mesh_types::Point3;
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{SupportSettings, SupportType, volume_to_grams};
use crate::error::PrintabilityResult;
use crate::overhang::{OverhangAnalysis, OverhangDetector, OverhangInfo};

/// Regions smaller than this (mm²) get no structure.
const MIN_SUPPORTED_AREA: f64 = 1.0;

/// Branches leave the trunk at this fraction of the overhang height.
const BRANCH_START_FRACTION: f64 = 0.7;

/// Vertical spacing (mm) of the recorded trunk samples.
const TRUNK_SAMPLE_STEP: f64 = 5.0;

/// Upper bound on recorded trunk samples per structure.
const MAX_TRUNK_SAMPLES: usize = 1000;

/// Upper bound on branches per tree.
const MAX_BRANCHES: usize = 64;

/// Share of the column volume a tree is assumed to need when only estimating.
pub const TREE_ESTIMATE_RATIO: f64 = 0.6;

/// A point on the model that a structure holds up.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportPoint {
    /// Contact position.
    pub position: Point3<f64>,
    /// Overhang angle of the supported region in degrees.
    pub overhang_angle: f64,
    /// Supported area in mm².
    pub area: f64,
    /// Set by the optimizer when the structure was reinforced.
    pub needs_reinforcement: bool,
}

impl SupportPoint {
    fn from_region(region: &OverhangInfo) -> Self {
        Self {
            position: region.location,
            overhang_angle: region.angle,
            area: region.area,
            needs_reinforcement: false,
        }
    }
}

/// A straight tree branch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Branch {
    /// Point on the trunk.
    pub start: Point3<f64>,
    /// Point under the overhang.
    pub end: Point3<f64>,
    /// 3D length in mm.
    pub length: f64,
    /// Angle from vertical in degrees.
    pub angle: f64,
}

impl Branch {
    /// Create a branch between two points.
    #[must_use]
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        let d = end - start;
        let horizontal = d.x.hypot(d.y);
        Self {
            start,
            end,
            length: d.norm(),
            angle: horizontal.atan2(d.z).to_degrees(),
        }
    }
}

/// One generated support structure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportStructure {
    /// Sequential id, starting at 1.
    pub id: usize,
    /// `Normal` for columns, `Tree` for trees.
    pub support_type: SupportType,
    /// Supported points.
    pub points: Vec<SupportPoint>,
    /// Foot of the structure on the bed.
    pub base_position: Point3<f64>,
    /// Height in mm.
    pub height: f64,
    /// Volume in mm³.
    pub volume: f64,
    /// Tree branches (empty for columns).
    pub branches: Vec<Branch>,
    /// Trunk samples every 5 mm (empty for columns).
    pub trunk_positions: Vec<Point3<f64>>,
    /// Material in grams.
    pub estimated_material_grams: f64,
    /// Savings against a column over the same footprint.
    pub material_savings_percent: f64,
}

impl SupportStructure {
    /// Steepest overhang angle among the supported points.
    #[must_use]
    pub fn max_point_angle(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.overhang_angle)
            .fold(0.0, f64::max)
    }

    /// Largest supported area among the points.
    #[must_use]
    pub fn max_point_area(&self) -> f64 {
        self.points.iter().map(|p| p.area).fold(0.0, f64::max)
    }
}

/// Output of [`SupportGenerator::generate`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportResult {
    /// Source file, when generated from disk.
    pub file_path: Option<PathBuf>,
    /// Settings used.
    pub settings: SupportSettings,
    /// Generated structures.
    pub structures: Vec<SupportStructure>,
    /// Sum of the structure volumes in mm³.
    pub total_support_volume: f64,
    /// Material for all structures in grams.
    pub total_material_grams: f64,
    /// Savings against the column baseline.
    pub material_savings_percent: f64,
    /// Volume if every region were supported with columns.
    pub normal_support_volume: f64,
    /// Tree volume: actual for tree output, estimated otherwise.
    pub tree_support_volume: f64,
}

impl SupportResult {
    /// Number of structures.
    #[must_use]
    pub fn support_count(&self) -> usize {
        self.structures.len()
    }

    /// Sum of the structure volumes.
    #[must_use]
    pub fn structure_volume(&self) -> f64 {
        self.structures.iter().map(|s| s.volume).sum()
    }
}

/// Column against tree estimate for one analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportComparison {
    /// Source file of the analysis.
    pub file_path: Option<PathBuf>,
    /// Number of overhang regions.
    pub overhangs: usize,
    /// Any region needs support.
    pub needs_supports: bool,
    /// Column volume in mm³.
    pub normal_volume: f64,
    /// Column material in grams.
    pub normal_grams: f64,
    /// Estimated tree volume in mm³.
    pub tree_volume: f64,
    /// Estimated tree material in grams.
    pub tree_grams: f64,
    /// Tree volume relative to column volume (0 when there is no column).
    pub tree_relative: f64,
    /// Tree savings against columns.
    pub tree_savings_percent: f64,
    /// Cheaper option; `Normal` on ties.
    pub recommendation: SupportType,
}

/// Generates support structures for overhang regions.
///
/// # Example
///
/// ```
/// use mesh_printability::{DetectorConfig, OverhangDetector, SupportGenerator, SupportSettings};
/// use mesh_types::{Facet, Triangle};
///
/// let ceiling = Facet::from_triangle(Triangle::from_arrays(
///     [0.0, 0.0, 10.0],
///     [0.0, 10.0, 10.0],
///     [10.0, 0.0, 10.0],
/// ));
/// let analysis = OverhangDetector::new(DetectorConfig::default()).analyze(&[ceiling]);
///
/// let result = SupportGenerator::new(SupportSettings::normal()).generate(&analysis);
/// assert_eq!(result.support_count(), 1);
/// // 50 mm² * 10 mm * 15%
/// assert!((result.total_support_volume - 75.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SupportGenerator {
    settings: SupportSettings,
}

impl SupportGenerator {
    /// Create a generator.
    #[must_use]
    pub fn new(settings: SupportSettings) -> Self {
        Self { settings }
    }

    /// The settings in use.
    #[must_use]
    pub fn settings(&self) -> &SupportSettings {
        &self.settings
    }

    /// Load a mesh file, detect overhangs and generate supports.
    ///
    /// The detector uses `settings.overhang_angle` as support threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the file cannot be
    /// loaded.
    pub fn generate_file<P: AsRef<Path>>(&self, path: P) -> PrintabilityResult<SupportResult> {
        self.settings.validate()?;
        let analysis = self.detector().analyze_file(path)?;
        Ok(self.generate(&analysis))
    }

    /// Generate supports for an existing analysis.
    #[must_use]
    pub fn generate(&self, analysis: &OverhangAnalysis) -> SupportResult {
        let structures: Vec<SupportStructure> = self
            .supported(analysis)
            .zip(1..)
            .map(|(region, id)| match self.settings.support_type {
                SupportType::Tree => self.tree_structure(id, region),
                SupportType::Normal | SupportType::Linear => self.column_structure(id, region),
            })
            .collect();

        let total_support_volume: f64 = structures.iter().map(|s| s.volume).sum();
        let normal_support_volume = self.column_baseline(analysis);
        let tree_support_volume = if self.settings.support_type == SupportType::Tree {
            total_support_volume
        } else {
            normal_support_volume * TREE_ESTIMATE_RATIO
        };

        let result = SupportResult {
            file_path: analysis.file_path.clone(),
            settings: self.settings.clone(),
            total_material_grams: volume_to_grams(total_support_volume),
            material_savings_percent: savings_percent(total_support_volume, normal_support_volume),
            total_support_volume,
            normal_support_volume,
            tree_support_volume,
            structures,
        };

        info!(
            support_type = self.settings.support_type.as_str(),
            structures = result.structures.len(),
            volume_mm3 = result.total_support_volume,
            grams = result.total_material_grams,
            "Support generation complete"
        );

        result
    }

    /// Compare column and tree estimates for an analysis.
    #[must_use]
    pub fn compare_support_types(&self, analysis: &OverhangAnalysis) -> SupportComparison {
        let normal_volume = self.column_baseline(analysis);
        let tree_volume = normal_volume * TREE_ESTIMATE_RATIO;

        let (tree_relative, tree_savings_percent) = if normal_volume > 0.0 {
            let ratio = tree_volume / normal_volume;
            (ratio, (1.0 - ratio) * 100.0)
        } else {
            (0.0, 0.0)
        };

        SupportComparison {
            file_path: analysis.file_path.clone(),
            overhangs: analysis.overhangs.len(),
            needs_supports: analysis.needs_supports,
            normal_volume,
            normal_grams: volume_to_grams(normal_volume),
            tree_volume,
            tree_grams: volume_to_grams(tree_volume),
            tree_relative,
            tree_savings_percent,
            recommendation: if tree_volume < normal_volume {
                SupportType::Tree
            } else {
                SupportType::Normal
            },
        }
    }

    fn detector(&self) -> OverhangDetector {
        OverhangDetector::new(self.settings.detector_config())
    }

    fn supported<'a>(
        &self,
        analysis: &'a OverhangAnalysis,
    ) -> impl Iterator<Item = &'a OverhangInfo> {
        analysis.supported_regions().filter(|region| {
            let keep = region.area >= MIN_SUPPORTED_AREA;
            if !keep {
                debug!(area = region.area, "Skipping support for tiny region");
            }
            keep
        })
    }

    /// Column volume under one region.
    fn column_volume(&self, region: &OverhangInfo) -> f64 {
        region.area * support_height(region) * self.settings.density.fraction()
    }

    fn column_baseline(&self, analysis: &OverhangAnalysis) -> f64 {
        self.supported(analysis).map(|r| self.column_volume(r)).sum()
    }

    fn column_structure(&self, id: usize, region: &OverhangInfo) -> SupportStructure {
        let volume = self.column_volume(region);
        debug!(id, volume, "Generated column support");

        SupportStructure {
            id,
            support_type: SupportType::Normal,
            points: vec![SupportPoint::from_region(region)],
            base_position: Point3::new(region.location.x, region.location.y, 0.0),
            height: support_height(region),
            volume,
            branches: Vec::new(),
            trunk_positions: Vec::new(),
            estimated_material_grams: volume_to_grams(volume),
            material_savings_percent: 0.0,
        }
    }

    fn tree_structure(&self, id: usize, region: &OverhangInfo) -> SupportStructure {
        let height = support_height(region);
        let base = Point3::new(region.location.x, region.location.y, 0.0);
        let spread_radius = (region.area / PI).sqrt();
        let branches = tree_branches(&base, height, spread_radius);
        let trunk_positions = trunk_samples(&base, height);
        if trunk_positions.len() == MAX_TRUNK_SAMPLES {
            warn!(id, height, "Trunk samples truncated for very tall tree");
        }

        let trunk_volume = cylinder_volume(self.settings.tree_trunk_diameter, height);
        let branch_volume: f64 = branches
            .iter()
            .map(|b| cylinder_volume(self.settings.tree_branch_diameter, b.length))
            .sum();

        // never more than the column it replaces
        let baseline = self.column_volume(region);
        let volume = (trunk_volume + branch_volume).min(baseline);

        debug!(
            id,
            branches = branches.len(),
            volume,
            capped = trunk_volume + branch_volume > baseline,
            "Generated tree support"
        );

        SupportStructure {
            id,
            support_type: SupportType::Tree,
            points: vec![SupportPoint::from_region(region)],
            base_position: base,
            height,
            volume,
            branches,
            trunk_positions,
            estimated_material_grams: volume_to_grams(volume),
            material_savings_percent: savings_percent(volume, baseline),
        }
    }
}

/// Overhangs below the bed are supported from the bed with zero height.
fn support_height(region: &OverhangInfo) -> f64 {
    region.z_height.max(0.0)
}

fn cylinder_volume(diameter: f64, length: f64) -> f64 {
    PI * (diameter / 2.0).powi(2) * length
}

/// `max(0, (1 - volume / baseline) * 100)`, 0 without a baseline.
fn savings_percent(volume: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        ((1.0 - volume / baseline) * 100.0).max(0.0)
    } else {
        0.0
    }
}

/// Branches from `0.7 × height` on the trunk to a circle at `height`.
///
/// At least 3 and at most [`MAX_BRANCHES`] branches.
fn tree_branches(base: &Point3<f64>, height: f64, spread_radius: f64) -> Vec<Branch> {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let count = ((spread_radius / 2.0).floor().min(MAX_BRANCHES as f64) as usize).max(3);
    let start = Point3::new(base.x, base.y, height * BRANCH_START_FRACTION);

    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let azimuth = 2.0 * PI * i as f64 / count as f64;
            let (sin, cos) = azimuth.sin_cos();
            let end = Point3::new(
                base.x + spread_radius * cos,
                base.y + spread_radius * sin,
                height,
            );
            Branch::new(start, end)
        })
        .collect()
}

/// Trunk samples at z = 0, 5, 10, ... below `floor(height)`.
///
/// At most [`MAX_TRUNK_SAMPLES`]; a NaN height gives none.
pub(crate) fn trunk_samples(base: &Point3<f64>, height: f64) -> Vec<Point3<f64>> {
    let top = height.floor();
    (0..MAX_TRUNK_SAMPLES)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let z = i as f64 * TRUNK_SAMPLE_STEP;
            Point3::new(base.x, base.y, z)
        })
        .take_while(|p| p.z < top)
        .collect()
}
