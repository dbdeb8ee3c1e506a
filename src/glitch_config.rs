use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Which structural effects a glitch instance runs.
///
/// The kind narrows the per-effect toggles; it never enables an effect whose
/// toggle is off. Corruption and scanlines follow their own toggles only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlitchKind {
    #[default]
    All,
    Jitter,
    Slice,
    Block,
    Duplicate,
    Wave,
    Chromatic,
}

impl GlitchKind {
    pub(crate) fn allows_slicing(self) -> bool {
        matches!(self, Self::All | Self::Slice)
    }

    pub(crate) fn allows_blocks(self) -> bool {
        matches!(self, Self::All | Self::Block)
    }

    pub(crate) fn allows_displacement(self) -> bool {
        matches!(self, Self::All | Self::Jitter | Self::Wave)
    }

    /// The wave kind drops the per-character random term.
    pub(crate) fn allows_random_jitter(self) -> bool {
        matches!(self, Self::All | Self::Jitter)
    }

    pub(crate) fn allows_duplication(self) -> bool {
        matches!(self, Self::All | Self::Duplicate)
    }

    pub(crate) fn allows_color(self) -> bool {
        matches!(self, Self::All | Self::Chromatic)
    }
}

/// Tunable parameters for one glitch instance. Replaced wholesale, never
/// patched field by field at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlitchConfig {
    pub enabled: bool,
    pub kind: GlitchKind,
    /// Fixed seed for the per-cycle noise seed stream. Random when absent.
    pub seed: Option<u64>,

    // Timing
    /// Glitches per second.
    pub frequency: f32,
    /// Active phase length in seconds.
    pub duration: f32,
    /// Seconds between glitches.
    pub idle_time: f32,

    // Displacement (pixels at 1920x1080)
    pub character_displacement: bool,
    pub max_jitter: f32,
    pub vertical_jitter: f32,

    // Color
    pub rgb_separation: bool,
    pub rgb_separation_amount: f32,
    pub glitch_color: Vec3,
    pub chromatic_aberration: bool,
    pub chromatic_intensity: f32,

    // Structural
    pub text_slicing: bool,
    /// Half-width of a slice zone, as a fraction of the string.
    pub slice_height: f32,
    pub max_slice_offset: f32,
    pub block_displacement: bool,
    /// Block length as a fraction of the string.
    pub block_size: f32,
    pub max_block_offset: f32,
    pub text_duplication: bool,
    pub duplication_chance: f32,

    // Corruption
    pub random_corruption: bool,
    pub corruption_chance: f32,

    // Global
    /// Ceiling of the intensity envelope.
    pub intensity: f32,
    pub scanlines: bool,
    /// Scanline scroll speed in pixels per second.
    pub scanline_speed: f32,
    pub scanline_height: f32,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: GlitchKind::All,
            seed: None,
            frequency: 3.0,
            duration: 0.1,
            idle_time: 2.0,
            character_displacement: true,
            max_jitter: 3.0,
            vertical_jitter: 1.0,
            rgb_separation: true,
            rgb_separation_amount: 2.0,
            glitch_color: Vec3::new(1.0, 0.0, 0.0),
            chromatic_aberration: true,
            chromatic_intensity: 1.5,
            text_slicing: true,
            slice_height: 0.15,
            max_slice_offset: 30.0,
            block_displacement: true,
            block_size: 0.2,
            max_block_offset: 20.0,
            text_duplication: true,
            duplication_chance: 0.15,
            random_corruption: true,
            corruption_chance: 0.1,
            intensity: 0.8,
            scanlines: false,
            scanline_speed: 50.0,
            scanline_height: 2.0,
        }
    }
}

impl GlitchConfig {
    /// Heavy tuning for large title text: one long glitch every two seconds.
    pub fn title() -> Self {
        Self {
            frequency: 0.5,
            duration: 0.25,
            idle_time: 2.0,
            max_jitter: 6.0,
            vertical_jitter: 3.0,
            rgb_separation_amount: 3.0,
            glitch_color: Vec3::new(1.0, 0.0, 0.5),
            intensity: 0.9,
            corruption_chance: 0.08,
            slice_height: 0.2,
            max_slice_offset: 40.0,
            duplication_chance: 0.2,
            block_size: 0.25,
            max_block_offset: 25.0,
            chromatic_intensity: 2.0,
            ..Self::default()
        }
    }

    /// Low-intensity tuning for body text.
    pub fn subtle() -> Self {
        Self {
            frequency: 0.2,
            duration: 0.12,
            idle_time: 5.0,
            max_jitter: 1.5,
            vertical_jitter: 0.5,
            intensity: 0.35,
            corruption_chance: 0.03,
            text_slicing: false,
            block_displacement: false,
            text_duplication: false,
            chromatic_aberration: false,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents).map_err(|error| {
            anyhow!(
                "failed to parse glitch config at {}: {}",
                describe_location(&error),
                error
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the generator cannot run.
    ///
    /// Every value must be finite and every chance in `[0, 1]`. Timing values
    /// must be positive only while the effect is enabled.
    pub fn validate(&self) -> Result<()> {
        validate_unit("intensity", self.intensity)?;
        validate_unit("corruption_chance", self.corruption_chance)?;
        validate_unit("duplication_chance", self.duplication_chance)?;
        validate_unit("slice_height", self.slice_height)?;
        validate_unit("block_size", self.block_size)?;

        for (label, value) in [
            ("max_jitter", self.max_jitter),
            ("vertical_jitter", self.vertical_jitter),
            ("rgb_separation_amount", self.rgb_separation_amount),
            ("chromatic_intensity", self.chromatic_intensity),
            ("max_slice_offset", self.max_slice_offset),
            ("max_block_offset", self.max_block_offset),
            ("scanline_speed", self.scanline_speed),
        ] {
            validate_non_negative(label, value)?;
        }

        if !self.glitch_color.is_finite() {
            bail!("glitch_color must be finite");
        }

        if self.scanlines {
            validate_positive("scanline_height", self.scanline_height)?;
        } else {
            validate_non_negative("scanline_height", self.scanline_height)?;
        }

        if self.enabled {
            validate_positive("frequency", self.frequency)?;
            validate_positive("duration", self.duration)?;
            validate_positive("idle_time", self.idle_time)?;
        } else {
            for (label, value) in [
                ("frequency", self.frequency),
                ("duration", self.duration),
                ("idle_time", self.idle_time),
            ] {
                validate_finite(label, value)?;
            }
        }

        Ok(())
    }
}

/// Reads and validates a glitch config file (YAML, or JSON written as YAML).
pub fn load_glitch_config(path: &Path) -> Result<GlitchConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read glitch config {}", path.display()))?;
    GlitchConfig::from_yaml_str(&contents)
        .with_context(|| format!("invalid glitch config {}", path.display()))
}

fn describe_location(error: &serde_yaml::Error) -> String {
    error
        .location()
        .map(|location| format!("line {}, column {}", location.line(), location.column()))
        .unwrap_or_else(|| "unknown location".to_owned())
}

fn validate_finite(label: &str, value: f32) -> Result<()> {
    if !value.is_finite() {
        bail!("{label} must be finite");
    }
    Ok(())
}

fn validate_unit(label: &str, value: f32) -> Result<()> {
    validate_finite(label, value)?;
    if !(0.0..=1.0).contains(&value) {
        bail!("{label} must be within [0, 1], got {value}");
    }
    Ok(())
}

fn validate_non_negative(label: &str, value: f32) -> Result<()> {
    validate_finite(label, value)?;
    if value < 0.0 {
        bail!("{label} must be >= 0, got {value}");
    }
    Ok(())
}

fn validate_positive(label: &str, value: f32) -> Result<()> {
    validate_finite(label, value)?;
    if value <= 0.0 {
        bail!("{label} must be > 0, got {value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_presets_validate() {
        GlitchConfig::default().validate().expect("default config");
        GlitchConfig::title().validate().expect("title preset");
        GlitchConfig::subtle().validate().expect("subtle preset");
    }

    #[test]
    fn zero_duration_rejected_only_while_enabled() {
        let mut config = GlitchConfig {
            duration: 0.0,
            ..GlitchConfig::default()
        };
        let error = config.validate().expect_err("zero duration must fail");
        assert!(error.to_string().contains("duration"), "{error}");

        config.enabled = false;
        config.validate().expect("disabled config skips timing checks");
    }

    #[test]
    fn chances_outside_unit_range_rejected() {
        let config = GlitchConfig {
            corruption_chance: 1.5,
            ..GlitchConfig::default()
        };
        let error = config.validate().expect_err("chance above one");
        assert!(error.to_string().contains("corruption_chance"), "{error}");

        let config = GlitchConfig {
            intensity: f32::NAN,
            ..GlitchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_fills_missing_fields_from_defaults() {
        let config = GlitchConfig::from_yaml_str(
            r#"
kind: slice
duration: 0.5
glitch_color: { r: 0.0, g: 1.0, b: 0.0 }
"#,
        )
        .expect("config parses");
        assert_eq!(config.kind, GlitchKind::Slice);
        assert_eq!(config.duration, 0.5);
        assert_eq!(config.glitch_color, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(config.idle_time, GlitchConfig::default().idle_time);
    }

    #[test]
    fn yaml_rejects_unknown_fields_with_location() {
        let error = GlitchConfig::from_yaml_str("durration: 0.5\n").expect_err("typo must fail");
        assert!(error.to_string().contains("line 1"), "{error}");
    }

    #[test]
    fn kind_masks_effects() {
        assert!(GlitchKind::All.allows_slicing());
        assert!(!GlitchKind::Jitter.allows_slicing());
        assert!(GlitchKind::Wave.allows_displacement());
        assert!(!GlitchKind::Wave.allows_random_jitter());
        assert!(GlitchKind::Chromatic.allows_color());
        assert!(!GlitchKind::Block.allows_color());
    }
}
