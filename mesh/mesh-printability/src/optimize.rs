//! Support structure optimization.
//!
//! The optimizer works on a copy of a [`SupportResult`] and applies the
//! transforms of one [`OptimizationGoal`]:
//!
//! | Goal | Transforms |
//! |---|---|
//! | `Material` | merge, remove redundant |
//! | `Strength` | reinforce |
//! | `Balanced` | merge, remove redundant, reinforce |
//! | `Removal` | convert to tree, volume × 0.9 |
//! | `Speed` | volume × 0.7 |
//!
//! The structure count never grows.

use std::path::{Path, PathBuf};

use mesh_types::Point3;
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{
    OptimizationGoal, OptimizationSettings, SupportSettings, SupportType, volume_to_grams,
};
use crate::error::PrintabilityResult;
use crate::overhang::OverhangDetector;
use crate::support::{SupportGenerator, SupportResult, SupportStructure, trunk_samples};

/// Volume kept when structures are merged.
const MERGE_VOLUME_FACTOR: f64 = 0.8;
/// Volume factor for reinforced structures.
const REINFORCE_VOLUME_FACTOR: f64 = 1.2;
/// Volume factor for the removal goal.
const REMOVAL_VOLUME_FACTOR: f64 = 0.9;
/// Volume factor for the speed goal.
const SPEED_VOLUME_FACTOR: f64 = 0.7;

/// Output of [`SupportOptimizer::optimize`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationResult {
    /// Input, unchanged.
    pub original: SupportResult,
    /// Optimized copy.
    pub optimized: SupportResult,
    /// Original minus optimized volume in mm³ (negative when reinforced).
    pub volume_reduction_mm3: f64,
    /// Original minus optimized material in grams.
    pub material_reduction_grams: f64,
    /// Volume reduction relative to the original.
    pub reduction_percent: f64,
    /// Structures absorbed into a neighbor.
    pub supports_merged: usize,
    /// Structures dropped as redundant.
    pub supports_removed: usize,
    /// Structures reinforced.
    pub supports_reinforced: usize,
    /// Stability concerns.
    pub warnings: Vec<String>,
    /// Follow-up advice.
    pub recommendations: Vec<String>,
}

/// Post-processes generated supports.
///
/// # Example
///
/// ```
/// use mesh_printability::{OptimizationGoal, OptimizationSettings, SupportOptimizer};
/// # use mesh_printability::{SupportResult, SupportSettings};
/// # let result = SupportResult {
/// #     file_path: None,
/// #     settings: SupportSettings::default(),
/// #     structures: Vec::new(),
/// #     total_support_volume: 0.0,
/// #     total_material_grams: 0.0,
/// #     material_savings_percent: 0.0,
/// #     normal_support_volume: 0.0,
/// #     tree_support_volume: 0.0,
/// # };
///
/// let optimizer = SupportOptimizer::new(OptimizationSettings::default());
/// let optimized = optimizer.optimize(&result, Some(OptimizationGoal::Speed));
/// assert_eq!(optimized.optimized.structures.len(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SupportOptimizer {
    settings: OptimizationSettings,
}

impl SupportOptimizer {
    /// Create an optimizer.
    #[must_use]
    pub fn new(settings: OptimizationSettings) -> Self {
        Self { settings }
    }

    /// The settings in use.
    #[must_use]
    pub fn settings(&self) -> &OptimizationSettings {
        &self.settings
    }

    /// Optimize a support result.
    ///
    /// `goal` overrides the goal in the settings. The input is not modified.
    #[must_use]
    pub fn optimize(
        &self,
        result: &SupportResult,
        goal: Option<OptimizationGoal>,
    ) -> OptimizationResult {
        let goal = goal.unwrap_or(self.settings.goal);
        info!(
            goal = goal.as_str(),
            structures = result.structures.len(),
            "Optimizing supports"
        );

        let mut structures = result.structures.clone();
        let mut merged = 0;
        let mut removed = 0;
        let mut reinforced = 0;
        let mut recommendations = Vec::new();

        match goal {
            OptimizationGoal::Material => {
                merged = self.merge_nearby(&mut structures);
                removed = self.remove_redundant(&mut structures);
            }
            OptimizationGoal::Strength => {
                reinforced = self.reinforce_critical(&mut structures);
            }
            OptimizationGoal::Balanced => {
                merged = self.merge_nearby(&mut structures);
                removed = self.remove_redundant(&mut structures);
                reinforced = self.reinforce_critical(&mut structures);
            }
            OptimizationGoal::Removal => {
                optimize_for_removal(&mut structures);
                recommendations.push("Use tree supports for easier removal".to_string());
            }
            OptimizationGoal::Speed => {
                optimize_for_speed(&mut structures);
                recommendations.push("Using sparse supports for faster printing".to_string());
            }
        }

        let optimized_volume: f64 = structures.iter().map(|s| s.volume).sum();
        let optimized_grams = volume_to_grams(optimized_volume);

        let original_volume = result.total_support_volume;
        let volume_reduction_mm3 = original_volume - optimized_volume;
        let reduction_percent = if original_volume > 0.0 {
            volume_reduction_mm3 / original_volume * 100.0
        } else {
            0.0
        };

        let target = self.settings.target_material_reduction * 100.0;
        if reduction_percent < target {
            recommendations.push(format!(
                "Material reduction {reduction_percent:.0}% is below target {target:.0}%"
            ));
        }

        let warnings = self.warnings(result.structures.len(), &structures);

        let optimized = SupportResult {
            file_path: result.file_path.clone(),
            settings: result.settings.clone(),
            structures,
            total_support_volume: optimized_volume,
            total_material_grams: optimized_grams,
            material_savings_percent: reduction_percent,
            normal_support_volume: result.normal_support_volume,
            tree_support_volume: result.tree_support_volume,
        };

        info!(
            goal = goal.as_str(),
            merged,
            removed,
            reinforced,
            reduction_percent,
            "Support optimization complete"
        );

        OptimizationResult {
            original: result.clone(),
            optimized,
            volume_reduction_mm3,
            material_reduction_grams: result.total_material_grams - optimized_grams,
            reduction_percent,
            supports_merged: merged,
            supports_removed: removed,
            supports_reinforced: reinforced,
            warnings,
            recommendations,
        }
    }

    fn warnings(&self, original_count: usize, structures: &[SupportStructure]) -> Vec<String> {
        let mut warnings = Vec::new();

        // fewer than half remain
        if structures.len() * 2 < original_count {
            warnings.push("Significant support reduction - verify print stability".to_string());
        }

        warnings.extend(
            structures
                .iter()
                .filter(|s| {
                    s.support_type == SupportType::Tree
                        && s.height > self.settings.tall_tree_height
                })
                .map(|s| {
                    format!(
                        "Tall tree support ({:.0}mm) may need reinforcement",
                        s.height
                    )
                }),
        );

        warnings
    }

    /// Greedy merge of structures whose bases are closer than the merge
    /// distance to an earlier structure. Returns the number absorbed.
    fn merge_nearby(&self, structures: &mut Vec<SupportStructure>) -> usize {
        if structures.len() < 2 {
            return 0;
        }

        let mut absorbed = vec![false; structures.len()];
        let mut result = Vec::with_capacity(structures.len());
        let mut count = 0;

        for i in 0..structures.len() {
            if absorbed[i] {
                continue;
            }

            let anchor = structures[i].base_position;
            let mut group = vec![i];
            for j in (i + 1)..structures.len() {
                if absorbed[j] {
                    continue;
                }
                let distance = (structures[j].base_position - anchor).norm();
                if distance < self.settings.merge_distance {
                    absorbed[j] = true;
                    group.push(j);
                }
            }

            if group.len() > 1 {
                count += group.len() - 1;
                let members: Vec<&SupportStructure> =
                    group.iter().map(|&k| &structures[k]).collect();
                debug!(
                    id = structures[i].id,
                    members = members.len(),
                    "Merged nearby supports"
                );
                result.push(merged_structure(&members));
            } else {
                result.push(structures[i].clone());
            }
        }

        *structures = result;
        count
    }

    /// Drop short structures under shallow overhangs.
    fn remove_redundant(&self, structures: &mut Vec<SupportStructure>) -> usize {
        if !self.settings.remove_redundant {
            return 0;
        }

        let before = structures.len();
        structures.retain(|s| {
            let angle = s.max_point_angle();
            let redundant = angle < self.settings.redundant_max_angle
                && s.height <= self.settings.redundant_max_height;
            if redundant {
                debug!(
                    id = s.id,
                    angle,
                    height = s.height,
                    "Removed redundant support"
                );
            }
            !redundant
        });
        before - structures.len()
    }

    /// Thicken structures under steep or large overhangs.
    fn reinforce_critical(&self, structures: &mut [SupportStructure]) -> usize {
        if !self.settings.reinforce_critical {
            return 0;
        }

        let mut count = 0;
        for s in structures.iter_mut() {
            if s.max_point_angle() >= self.settings.reinforce_min_angle
                || s.max_point_area() > self.settings.reinforce_min_area
            {
                s.volume *= REINFORCE_VOLUME_FACTOR;
                s.estimated_material_grams = volume_to_grams(s.volume);
                for point in &mut s.points {
                    point.needs_reinforcement = true;
                }
                count += 1;
            }
        }
        count
    }
}

/// Combine a group into one tree at the centroid of the bases.
fn merged_structure(members: &[&SupportStructure]) -> SupportStructure {
    #[allow(clippy::cast_precision_loss)]
    let n = members.len() as f64;
    let (sx, sy) = members.iter().fold((0.0, 0.0), |(x, y), s| {
        (x + s.base_position.x, y + s.base_position.y)
    });
    let base = Point3::new(sx / n, sy / n, 0.0);
    let height = members.iter().map(|s| s.height).fold(0.0, f64::max);
    let volume = members.iter().map(|s| s.volume).sum::<f64>() * MERGE_VOLUME_FACTOR;

    SupportStructure {
        id: members[0].id,
        support_type: SupportType::Tree,
        points: members.iter().flat_map(|s| s.points.iter().cloned()).collect(),
        base_position: base,
        height,
        volume,
        branches: members
            .iter()
            .flat_map(|s| s.branches.iter().cloned())
            .collect(),
        trunk_positions: trunk_samples(&base, height),
        estimated_material_grams: volume_to_grams(volume),
        material_savings_percent: (1.0 - MERGE_VOLUME_FACTOR) * 100.0,
    }
}

fn optimize_for_removal(structures: &mut [SupportStructure]) {
    for s in structures {
        s.support_type = SupportType::Tree;
        s.volume *= REMOVAL_VOLUME_FACTOR;
        s.estimated_material_grams = volume_to_grams(s.volume);
    }
}

fn optimize_for_speed(structures: &mut [SupportStructure]) {
    for s in structures {
        s.volume *= SPEED_VOLUME_FACTOR;
        s.estimated_material_grams = volume_to_grams(s.volume);
    }
}

/// Summary of one strategy in a [`StrategyComparison`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrategySummary {
    /// Total support volume in mm³.
    pub volume_mm3: f64,
    /// Total material in grams.
    pub material_grams: f64,
    /// Number of structures.
    pub structures: usize,
}

impl StrategySummary {
    fn of(result: &SupportResult) -> Self {
        Self {
            volume_mm3: result.total_support_volume,
            material_grams: result.total_material_grams,
            structures: result.structures.len(),
        }
    }
}

/// Support strategy names used in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SupportStrategy {
    /// Column supports.
    Normal,
    /// Tree supports.
    Tree,
    /// Tree supports after balanced optimization.
    OptimizedTree,
}

/// Column, tree and optimized tree supports for one file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrategyComparison {
    /// Analyzed file.
    pub file_path: PathBuf,
    /// Column supports.
    pub normal: StrategySummary,
    /// Tree supports.
    pub tree: StrategySummary,
    /// Tree supports after balanced optimization.
    pub optimized_tree: StrategySummary,
    /// Recommended strategy.
    pub recommendation: SupportStrategy,
    /// Optimized tree savings against plain trees.
    pub savings_vs_tree_percent: f64,
    /// Optimized tree savings against columns.
    pub savings_vs_normal_percent: f64,
}

impl StrategyComparison {
    /// One-line savings summary, e.g. `"12% vs tree, 40% vs normal"`.
    #[must_use]
    pub fn potential_savings(&self) -> String {
        format!(
            "{:.0}% vs tree, {:.0}% vs normal",
            self.savings_vs_tree_percent, self.savings_vs_normal_percent
        )
    }
}

/// Generate supports for a file and optimize them in one step.
///
/// Uses default settings apart from the support type and goal.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded.
///
/// # Example
///
/// ```no_run
/// use mesh_printability::{generate_optimized_supports, OptimizationGoal, SupportType};
///
/// let result =
///     generate_optimized_supports("part.stl", SupportType::Tree, OptimizationGoal::Material)
///         .unwrap();
/// println!("saved {:.0}%", result.reduction_percent);
/// ```
pub fn generate_optimized_supports<P: AsRef<Path>>(
    path: P,
    support_type: SupportType,
    goal: OptimizationGoal,
) -> PrintabilityResult<OptimizationResult> {
    let settings = SupportSettings::default().with_support_type(support_type);
    let result = SupportGenerator::new(settings).generate_file(path)?;
    Ok(SupportOptimizer::default().optimize(&result, Some(goal)))
}

/// Compare column, tree and optimized tree supports for a file.
///
/// The file is loaded and analyzed once.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded.
pub fn compare_support_strategies<P: AsRef<Path>>(
    path: P,
) -> PrintabilityResult<StrategyComparison> {
    let path = path.as_ref();
    let tree_settings = SupportSettings::tree();
    let analysis = OverhangDetector::new(tree_settings.detector_config()).analyze_file(path)?;

    let normal = SupportGenerator::new(SupportSettings::normal()).generate(&analysis);
    let tree = SupportGenerator::new(tree_settings).generate(&analysis);
    let optimized = SupportOptimizer::default().optimize(&tree, None);

    let optimized_volume = optimized.optimized.total_support_volume;
    let savings_vs_normal_percent = if normal.total_support_volume > 0.0 {
        (normal.total_support_volume - optimized_volume) / normal.total_support_volume * 100.0
    } else {
        0.0
    };

    Ok(StrategyComparison {
        file_path: path.to_path_buf(),
        normal: StrategySummary::of(&normal),
        tree: StrategySummary::of(&tree),
        optimized_tree: StrategySummary::of(&optimized.optimized),
        recommendation: SupportStrategy::OptimizedTree,
        savings_vs_tree_percent: optimized.reduction_percent,
        savings_vs_normal_percent,
    })
}
