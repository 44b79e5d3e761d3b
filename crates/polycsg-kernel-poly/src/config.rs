//! Tunable tolerances and octree limits.
//!
//! Every field has a default, so a TOML document only needs to name the
//! values it changes:
//!
//! ```toml
//! epsilon = 1e-5
//! crossing_rule = "even_odd"
//!
//! [octree]
//! max_depth = 8
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default linear tolerance, matching `Tolerance::DEFAULT`.
pub const DEFAULT_EPSILON: f64 = 1.0e-6;

/// Default planarity tolerance, relative to a face's bounding box diagonal.
pub const DEFAULT_PLANARITY_TOLERANCE: f64 = 1.0e-5;

/// How ray crossings are turned into an inside/outside answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingRule {
    /// Inside iff the crossing count is odd.
    EvenOdd,
    /// Inside iff the signed crossing count (winding number) is non-zero
    /// within one manifold, and iff the signed count of containing closed
    /// manifolds is positive across the whole polyhedron.
    #[default]
    NonZero,
}

/// Octree subdivision limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Split a node holding more faces than this.
    pub face_split_threshold: usize,
    /// Split a node holding more edges than this.
    pub edge_split_threshold: usize,
    /// Split a node holding more vertices than this.
    pub vertex_split_threshold: usize,
    /// Never split below this depth.
    pub max_depth: u32,
    /// Root region scale about the polyhedron's bounding box centre.
    pub slack_factor: f64,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            face_split_threshold: 50,
            edge_split_threshold: 50,
            vertex_split_threshold: 20,
            max_depth: 10,
            slack_factor: 1.1,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyConfig {
    /// Linear tolerance for coincidence, on-boundary and degeneracy tests.
    pub epsilon: f64,
    /// Allowed out-of-plane deviation, as a fraction of the face's size.
    pub planarity_tolerance: f64,
    /// Rule used when a query does not name one.
    pub crossing_rule: CrossingRule,
    /// Spatial index limits.
    pub octree: OctreeConfig,
}

impl Default for PolyConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            planarity_tolerance: DEFAULT_PLANARITY_TOLERANCE,
            crossing_rule: CrossingRule::default(),
            octree: OctreeConfig::default(),
        }
    }
}

impl PolyConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: PolyConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that tolerances are positive and octree limits usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("epsilon", self.epsilon)?;
        positive("planarity_tolerance", self.planarity_tolerance)?;

        let octree = &self.octree;
        if octree.face_split_threshold == 0 {
            return Err(ConfigError::ZeroThreshold {
                field: "octree.face_split_threshold",
            });
        }
        if octree.edge_split_threshold == 0 {
            return Err(ConfigError::ZeroThreshold {
                field: "octree.edge_split_threshold",
            });
        }
        if octree.vertex_split_threshold == 0 {
            return Err(ConfigError::ZeroThreshold {
                field: "octree.vertex_split_threshold",
            });
        }
        if octree.max_depth == 0 {
            return Err(ConfigError::ZeroThreshold {
                field: "octree.max_depth",
            });
        }
        if !(octree.slack_factor.is_finite() && octree.slack_factor >= 1.0) {
            return Err(ConfigError::InvalidSlack(octree.slack_factor));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PolyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crossing_rule, CrossingRule::NonZero);
        assert_eq!(config.octree.face_split_threshold, 50);
        assert_eq!(config.octree.vertex_split_threshold, 20);
    }

    #[test]
    fn test_partial_toml() {
        let config = PolyConfig::from_toml_str(
            r#"
            epsilon = 1e-5
            crossing_rule = "even_odd"

            [octree]
            max_depth = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.epsilon, 1e-5);
        assert_eq!(config.crossing_rule, CrossingRule::EvenOdd);
        assert_eq!(config.octree.max_depth, 4);
        assert_eq!(config.octree.edge_split_threshold, 50);
        assert_eq!(config.planarity_tolerance, DEFAULT_PLANARITY_TOLERANCE);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = PolyConfig::default();
        config.epsilon = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "epsilon", .. })
        ));

        let mut config = PolyConfig::default();
        config.octree.max_depth = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroThreshold { .. })
        ));

        let mut config = PolyConfig::default();
        config.octree.slack_factor = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSlack(_))));

        let err = PolyConfig::from_toml_str("epsilon = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive { .. }));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = PolyConfig::from_toml_str("crossing_rule = \"sideways\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = PolyConfig::default();
        config.crossing_rule = CrossingRule::EvenOdd;
        let json = serde_json::to_string(&config).unwrap();
        let back: PolyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
