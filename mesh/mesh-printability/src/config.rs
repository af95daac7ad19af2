//! Configuration for the printability pipeline.
//!
//! Every stage takes an immutable configuration struct at construction. The
//! `Default` impls carry calibrated FDM/PLA values; the `with_*` builders
//! adjust single fields. Entry points call `validate()` before touching any
//! file.

use mesh_io::LoadOptions;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PrintabilityError, PrintabilityResult};

/// PLA density in g/cm³.
pub const PLA_DENSITY: f64 = 1.24;

/// Convert a volume in mm³ to grams of PLA.
///
/// # Example
///
/// ```
/// use mesh_printability::volume_to_grams;
///
/// // 1 cm³ of PLA
/// assert!((volume_to_grams(1000.0) - 1.24).abs() < 1e-12);
/// ```
#[must_use]
pub fn volume_to_grams(volume_mm3: f64) -> f64 {
    volume_mm3 / 1000.0 * PLA_DENSITY
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> PrintabilityResult<()> {
    if condition {
        Ok(())
    } else {
        Err(PrintabilityError::invalid_config(message()))
    }
}

fn ensure_angle(name: &str, value: f64) -> PrintabilityResult<()> {
    ensure((0.0..=90.0).contains(&value), || {
        format!("{name} must be within [0, 90] degrees, got {value}")
    })
}

fn ensure_non_negative(name: &str, value: f64) -> PrintabilityResult<()> {
    ensure(value >= 0.0 && value.is_finite(), || {
        format!("{name} must be a finite value >= 0, got {value}")
    })
}

fn ensure_positive(name: &str, value: f64) -> PrintabilityResult<()> {
    ensure(value > 0.0 && value.is_finite(), || {
        format!("{name} must be a finite value > 0, got {value}")
    })
}

fn ensure_fraction(name: &str, value: f64) -> PrintabilityResult<()> {
    ensure((0.0..=1.0).contains(&value), || {
        format!("{name} must be within [0, 1], got {value}")
    })
}

// ---------------------------------------------------------------------------
// Overhang detection
// ---------------------------------------------------------------------------

/// Lower bounds (degrees) of the overhang severity buckets.
///
/// Buckets are half-open: `[minor, moderate)` is minor, and so on. Angles
/// below `minor` have no severity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeverityThresholds {
    /// Start of the minor bucket.
    pub minor: f64,
    /// Start of the moderate bucket.
    pub moderate: f64,
    /// Start of the severe bucket.
    pub severe: f64,
    /// Start of the critical bucket.
    pub critical: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            minor: 45.0,
            moderate: 55.0,
            severe: 65.0,
            critical: 75.0,
        }
    }
}

impl SeverityThresholds {
    /// Check that the thresholds are finite and strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns [`PrintabilityError::InvalidConfig`] otherwise.
    pub fn validate(&self) -> PrintabilityResult<()> {
        let ordered = [self.minor, self.moderate, self.severe, self.critical];
        ensure(
            ordered.iter().all(|t| t.is_finite()) && ordered.windows(2).all(|w| w[0] < w[1]),
            || format!("severity thresholds must be strictly ascending, got {ordered:?}"),
        )
    }
}

/// Configuration for [`OverhangDetector`](crate::OverhangDetector).
///
/// # Example
///
/// ```
/// use mesh_printability::DetectorConfig;
///
/// let config = DetectorConfig::default().with_support_threshold(50.0);
/// assert!(config.validate().is_ok());
/// assert!((config.min_area - 1.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorConfig {
    /// Overhang angle (degrees) at which a region needs support.
    pub support_threshold: f64,

    /// Regions with less total area (mm²) are not reported.
    pub min_area: f64,

    /// Severity bucket boundaries.
    pub severity: SeverityThresholds,

    /// Minimum angle (degrees) for suggesting tree supports.
    pub tree_min_angle: f64,

    /// Tree supports are suggested only below this region area (mm²).
    pub tree_max_area: f64,

    /// Infill fraction used for the support material estimate.
    pub support_density_factor: f64,

    /// How the mesh file is loaded.
    pub load: LoadOptions,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            support_threshold: 45.0,
            min_area: 1.0,
            severity: SeverityThresholds::default(),
            tree_min_angle: 60.0,
            tree_max_area: 100.0,
            support_density_factor: 0.15,
            load: LoadOptions::default(),
        }
    }
}

impl DetectorConfig {
    /// Set the support threshold angle.
    #[must_use]
    pub fn with_support_threshold(mut self, degrees: f64) -> Self {
        self.support_threshold = degrees;
        self
    }

    /// Set the minimum reported region area.
    #[must_use]
    pub fn with_min_area(mut self, area: f64) -> Self {
        self.min_area = area;
        self
    }

    /// Set the severity bucket boundaries.
    #[must_use]
    pub fn with_severity(mut self, severity: SeverityThresholds) -> Self {
        self.severity = severity;
        self
    }

    /// Set the load options.
    #[must_use]
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PrintabilityError::InvalidConfig`] for out-of-range angles,
    /// negative areas or non-ascending severity thresholds.
    pub fn validate(&self) -> PrintabilityResult<()> {
        ensure_angle("support_threshold", self.support_threshold)?;
        ensure_non_negative("min_area", self.min_area)?;
        ensure_angle("tree_min_angle", self.tree_min_angle)?;
        ensure_non_negative("tree_max_area", self.tree_max_area)?;
        ensure_fraction("support_density_factor", self.support_density_factor)?;
        self.severity.validate()
    }
}

// ---------------------------------------------------------------------------
// Support generation
// ---------------------------------------------------------------------------

/// Requested support style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SupportType {
    /// Column supports filling the footprint below the overhang.
    Normal,
    /// Trunk with branches fanning out under the overhang.
    #[default]
    Tree,
    /// Grid style supports; generated as columns.
    Linear,
}

impl SupportType {
    /// Get a lowercase name for the support type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Tree => "tree",
            Self::Linear => "linear",
        }
    }
}

/// Support infill density preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SupportDensity {
    /// About 10%: fast removal, less material.
    Sparse,
    /// About 15%.
    #[default]
    Normal,
    /// About 20%: stronger support.
    Dense,
    /// About 30%: for critical overhangs.
    Solid,
}

impl SupportDensity {
    /// Density as a fraction.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        match self {
            Self::Sparse => 0.10,
            Self::Normal => 0.15,
            Self::Dense => 0.20,
            Self::Solid => 0.30,
        }
    }
}

/// Support infill pattern, passed through to the slicer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SupportPattern {
    /// Parallel lines.
    Lines,
    /// Crossed lines.
    Grid,
    /// Connected zigzag lines.
    #[default]
    Zigzag,
    /// Triangular grid.
    Triangles,
    /// Gyroid surface.
    Gyroid,
}

/// Settings for [`SupportGenerator`](crate::SupportGenerator).
///
/// Volume estimates read the support type, density, overhang angle and the
/// tree diameters. Clearances, tower and branch-angle limits, interface and
/// material-reduction fields are carried in [`SupportResult`] for the slicer
/// and do not change the estimates.
///
/// [`SupportResult`]: crate::SupportResult
///
/// # Example
///
/// ```
/// use mesh_printability::{SupportDensity, SupportSettings, SupportType};
///
/// let settings = SupportSettings::normal().with_density(SupportDensity::Dense);
/// assert_eq!(settings.support_type, SupportType::Normal);
/// assert!((settings.density.fraction() - 0.20).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportSettings {
    /// Support style to generate.
    pub support_type: SupportType,
    /// Infill density preset.
    pub density: SupportDensity,
    /// Infill pattern (slicer pass-through).
    pub pattern: SupportPattern,

    /// Overhang angle (degrees) above which supports are generated.
    pub overhang_angle: f64,

    /// Vertical gap between support and model in mm (slicer pass-through).
    pub z_distance: f64,
    /// Horizontal gap between support and model in mm (slicer pass-through).
    pub xy_distance: f64,
    /// Column pillar diameter in mm (slicer pass-through).
    pub tower_diameter: f64,

    /// Maximum tree branch angle in degrees (slicer pass-through).
    pub tree_branch_angle: f64,
    /// Tree branch diameter in mm.
    pub tree_branch_diameter: f64,
    /// Tree trunk diameter in mm.
    pub tree_trunk_diameter: f64,

    /// Interface layers between support and model (slicer pass-through).
    pub interface_layers: u32,
    /// Interface density fraction (slicer pass-through).
    pub interface_density: f64,

    /// Slicer material optimization flag (pass-through).
    pub optimize_material: bool,
    /// Slicer material reduction limit as a fraction (pass-through).
    pub max_material_reduction: f64,

    /// How the mesh file is loaded.
    pub load: LoadOptions,
}

impl Default for SupportSettings {
    fn default() -> Self {
        Self {
            support_type: SupportType::Tree,
            density: SupportDensity::Normal,
            pattern: SupportPattern::Zigzag,
            overhang_angle: 45.0,
            z_distance: 0.2,
            xy_distance: 0.7,
            tower_diameter: 3.0,
            tree_branch_angle: 45.0,
            tree_branch_diameter: 2.0,
            tree_trunk_diameter: 4.0,
            interface_layers: 3,
            interface_density: 0.8,
            optimize_material: true,
            max_material_reduction: 0.4,
            load: LoadOptions::default(),
        }
    }
}

impl SupportSettings {
    /// Default settings with tree supports.
    #[must_use]
    pub fn tree() -> Self {
        Self::default()
    }

    /// Default settings with column supports.
    #[must_use]
    pub fn normal() -> Self {
        Self::default().with_support_type(SupportType::Normal)
    }

    /// Set the support type.
    #[must_use]
    pub fn with_support_type(mut self, support_type: SupportType) -> Self {
        self.support_type = support_type;
        self
    }

    /// Set the density preset.
    #[must_use]
    pub fn with_density(mut self, density: SupportDensity) -> Self {
        self.density = density;
        self
    }

    /// Set the infill pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: SupportPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set the overhang angle threshold.
    #[must_use]
    pub fn with_overhang_angle(mut self, degrees: f64) -> Self {
        self.overhang_angle = degrees;
        self
    }

    /// Set the tree trunk and branch diameters.
    #[must_use]
    pub fn with_tree_diameters(mut self, trunk: f64, branch: f64) -> Self {
        self.tree_trunk_diameter = trunk;
        self.tree_branch_diameter = branch;
        self
    }

    /// Set the load options.
    #[must_use]
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    /// Detector configuration matching these settings.
    #[must_use]
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::default()
            .with_support_threshold(self.overhang_angle)
            .with_load_options(self.load)
    }

    /// Check the settings.
    ///
    /// # Errors
    ///
    /// Returns [`PrintabilityError::InvalidConfig`] for an out-of-range
    /// overhang angle or non-positive tree diameters. Pass-through fields are
    /// not checked.
    pub fn validate(&self) -> PrintabilityResult<()> {
        ensure_angle("overhang_angle", self.overhang_angle)?;
        ensure_positive("tree_branch_diameter", self.tree_branch_diameter)?;
        ensure_positive("tree_trunk_diameter", self.tree_trunk_diameter)
    }
}

// ---------------------------------------------------------------------------
// Support optimization
// ---------------------------------------------------------------------------

/// What the optimizer trades for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OptimizationGoal {
    /// Minimize material usage.
    Material,
    /// Maximize support strength.
    Strength,
    /// Easiest support removal.
    Removal,
    /// Merge, prune and reinforce.
    #[default]
    Balanced,
    /// Fastest print time.
    Speed,
}

impl OptimizationGoal {
    /// Get a lowercase name for the goal.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Strength => "strength",
            Self::Removal => "removal",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

/// Settings for [`SupportOptimizer`](crate::SupportOptimizer).
///
/// The density range, trunk diameter and branch angle limits are carried for
/// downstream tools; the optimizer's transforms do not read them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationSettings {
    /// Goal used when none is passed to `optimize`.
    pub goal: OptimizationGoal,

    /// Material reduction target as a fraction.
    pub target_material_reduction: f64,

    /// Lowest support density fraction (pass-through).
    pub min_support_density: f64,
    /// Highest support density fraction (pass-through).
    pub max_support_density: f64,
    /// Thinnest trunk in mm (pass-through).
    pub min_trunk_diameter: f64,
    /// Steepest branch in degrees (pass-through).
    pub max_branch_angle: f64,

    /// Bases strictly closer than this (mm) are merged.
    pub merge_distance: f64,
    /// Drop short supports under shallow overhangs.
    pub remove_redundant: bool,
    /// Thicken supports under critical overhangs.
    pub reinforce_critical: bool,

    /// Supports below this angle (degrees) are candidates for removal.
    pub redundant_max_angle: f64,
    /// Removal candidates must also be at most this tall (mm).
    pub redundant_max_height: f64,

    /// Supports at or above this angle (degrees) are reinforced.
    pub reinforce_min_angle: f64,
    /// Supports over areas larger than this (mm²) are reinforced.
    pub reinforce_min_area: f64,

    /// Tree supports taller than this (mm) get a warning.
    pub tall_tree_height: f64,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            goal: OptimizationGoal::Balanced,
            target_material_reduction: 0.4,
            min_support_density: 0.08,
            max_support_density: 0.30,
            min_trunk_diameter: 1.5,
            max_branch_angle: 60.0,
            merge_distance: 5.0,
            remove_redundant: true,
            reinforce_critical: true,
            redundant_max_angle: 45.0,
            redundant_max_height: 2.0,
            reinforce_min_angle: 70.0,
            reinforce_min_area: 100.0,
            tall_tree_height: 50.0,
        }
    }
}

impl OptimizationSettings {
    /// Default settings for a specific goal.
    #[must_use]
    pub fn for_goal(goal: OptimizationGoal) -> Self {
        Self {
            goal,
            ..Self::default()
        }
    }

    /// Set the merge distance.
    #[must_use]
    pub fn with_merge_distance(mut self, distance: f64) -> Self {
        self.merge_distance = distance;
        self
    }

    /// Enable or disable redundant support removal.
    #[must_use]
    pub fn with_remove_redundant(mut self, enabled: bool) -> Self {
        self.remove_redundant = enabled;
        self
    }

    /// Enable or disable reinforcement.
    #[must_use]
    pub fn with_reinforce_critical(mut self, enabled: bool) -> Self {
        self.reinforce_critical = enabled;
        self
    }

    /// Check the settings.
    ///
    /// # Errors
    ///
    /// Returns [`PrintabilityError::InvalidConfig`] for negative distances or
    /// out-of-range thresholds. Pass-through fields are not checked.
    pub fn validate(&self) -> PrintabilityResult<()> {
        ensure_fraction("target_material_reduction", self.target_material_reduction)?;
        ensure_non_negative("merge_distance", self.merge_distance)?;
        ensure_angle("redundant_max_angle", self.redundant_max_angle)?;
        ensure_non_negative("redundant_max_height", self.redundant_max_height)?;
        ensure_angle("reinforce_min_angle", self.reinforce_min_angle)?;
        ensure_non_negative("reinforce_min_area", self.reinforce_min_area)?;
        ensure_non_negative("tall_tree_height", self.tall_tree_height)
    }
}

// ---------------------------------------------------------------------------
// Design advice
// ---------------------------------------------------------------------------

/// Configuration for [`DesignAdvisor`](crate::DesignAdvisor).
///
/// # Example
///
/// ```
/// use mesh_printability::AdvisorConfig;
///
/// let config = AdvisorConfig::fdm_default().with_max_build_dimension(250.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdvisorConfig {
    /// Overhang angle (degrees) at which supports are required.
    pub support_angle_threshold: f64,
    /// Layer height (mm) recommended for models without fine detail.
    pub layer_height: f64,
    /// Smallest bounding-box dimension (mm) that prints reliably.
    pub min_dimension: f64,
    /// Largest bounding-box dimension (mm) that fits the bed.
    pub max_build_dimension: f64,
    /// Edges below this height (mm) touch the bed.
    pub bed_contact_height: f64,
    /// How the mesh file is loaded.
    pub load: LoadOptions,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self::fdm_default()
    }
}

impl AdvisorConfig {
    /// Defaults for a typical consumer FDM printer.
    #[must_use]
    pub fn fdm_default() -> Self {
        Self {
            support_angle_threshold: 45.0,
            layer_height: 0.2,
            min_dimension: 1.0,
            max_build_dimension: 200.0,
            bed_contact_height: 1.0,
            load: LoadOptions::default(),
        }
    }

    /// Set the support angle threshold.
    #[must_use]
    pub fn with_support_angle_threshold(mut self, degrees: f64) -> Self {
        self.support_angle_threshold = degrees;
        self
    }

    /// Set the largest bed dimension.
    #[must_use]
    pub fn with_max_build_dimension(mut self, mm: f64) -> Self {
        self.max_build_dimension = mm;
        self
    }

    /// Set the load options.
    #[must_use]
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    /// Detector configuration matching this advisor.
    #[must_use]
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::default()
            .with_support_threshold(self.support_angle_threshold)
            .with_load_options(self.load)
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PrintabilityError::InvalidConfig`] for out-of-range angles or
    /// non-positive printer dimensions.
    pub fn validate(&self) -> PrintabilityResult<()> {
        ensure_angle("support_angle_threshold", self.support_angle_threshold)?;
        ensure_positive("layer_height", self.layer_height)?;
        ensure_non_negative("min_dimension", self.min_dimension)?;
        ensure_positive("max_build_dimension", self.max_build_dimension)?;
        ensure_non_negative("bed_contact_height", self.bed_contact_height)
    }
}
