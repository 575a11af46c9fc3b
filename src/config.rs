//! Editor configuration. The source material this editor descends from
//! disagrees on scale bounds (0.5–3.0 vs 0.1–5.0) and rotation step (15° vs
//! 30°), so none of these are contracts: everything here can be overridden
//! by `<data-dir>/CollageFE/collagefe.json`. A missing or broken config file
//! logs a warning and falls back to the defaults — never an error the user
//! has to deal with.

use std::path::Path;

use serde::Deserialize;

use crate::log_warn;
use crate::logger;
use crate::ops::chroma_key::ChromaKeyParams;
use crate::ops::pose::ScaleLimits;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Uniform scale bounds for placed objects.
    pub min_scale: f32,
    pub max_scale: f32,
    /// Degrees added per rotate-button press.
    pub rotation_step_deg: f32,
    /// Multiplier per grow-button press; shrink uses its reciprocal.
    pub grow_factor: f32,
    /// When set, gesture-end rotation snaps to the nearest multiple.
    pub snap_rotation_deg: Option<f32>,
    /// Chroma-key filter parameters.
    pub chroma: ChromaKeyParams,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 3.0,
            rotation_step_deg: 15.0,
            grow_factor: 1.1,
            snap_rotation_deg: None,
            chroma: ChromaKeyParams::default(),
        }
    }
}

impl EditorConfig {
    pub fn scale_limits(&self) -> ScaleLimits {
        ScaleLimits { min: self.min_scale, max: self.max_scale }
    }

    pub fn shrink_factor(&self) -> f32 {
        1.0 / self.grow_factor
    }

    /// Reject configs that would make the pose engine misbehave (inverted or
    /// non-positive bounds, shrink-as-grow factors, negative filter params).
    pub fn is_valid(&self) -> bool {
        self.min_scale > 0.0
            && self.min_scale.is_finite()
            && self.max_scale.is_finite()
            && self.min_scale < self.max_scale
            && self.rotation_step_deg.is_finite()
            && self.grow_factor.is_finite()
            && self.grow_factor > 1.0
            && self.snap_rotation_deg.is_none_or(|s| s.is_finite() && s > 0.0)
            && self.chroma.tolerance >= 0.0
            && self.chroma.feather >= 0.0
            && self.chroma.max_dimension >= 1
    }

    /// Load from the platform config location, falling back to defaults on
    /// any failure.
    pub fn load_or_default() -> Self {
        Self::load_from(&logger::app_data_dir().join("collagefe.json"))
    }

    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            // Absent file is the normal case, not worth a warning.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log_warn!("config: cannot read {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<EditorConfig>(&text) {
            Ok(config) if config.is_valid() => config,
            Ok(_) => {
                log_warn!("config: {} has invalid values, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log_warn!("config: cannot parse {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.is_valid());
        assert_eq!(config.scale_limits(), ScaleLimits { min: 0.5, max: 3.0 });
        assert!((config.shrink_factor() - 1.0 / 1.1).abs() < 1e-6);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{ "rotation_step_deg": 30.0 }"#).unwrap();
        assert_eq!(config.rotation_step_deg, 30.0);
        assert_eq!(config.min_scale, 0.5);
        assert_eq!(config.chroma.tolerance, 30.0);
    }

    #[test]
    fn variant_bounds_are_accepted() {
        let config: EditorConfig =
            serde_json::from_str(r#"{ "min_scale": 0.1, "max_scale": 5.0 }"#).unwrap();
        assert!(config.is_valid());
    }

    #[test]
    fn inverted_bounds_are_invalid() {
        let config = EditorConfig { min_scale: 3.0, max_scale: 0.5, ..EditorConfig::default() };
        assert!(!config.is_valid());
        let config = EditorConfig { grow_factor: 0.9, ..EditorConfig::default() };
        assert!(!config.is_valid());
    }

    #[test]
    fn missing_or_broken_file_falls_back_to_defaults() {
        let missing = EditorConfig::load_from(Path::new("/nonexistent/collagefe.json"));
        assert_eq!(missing, EditorConfig::default());

        let dir = std::env::temp_dir().join("collagefe-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(EditorConfig::load_from(&path), EditorConfig::default());

        let path = dir.join("invalid.json");
        std::fs::write(&path, r#"{ "min_scale": 9.0, "max_scale": 1.0 }"#).unwrap();
        assert_eq!(EditorConfig::load_from(&path), EditorConfig::default());
    }
}
