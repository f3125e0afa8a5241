//! Label Configuration - Render Parameters Sent Across the Process Boundary
//!
//! The JSON payload produced here is a wire contract: exactly four keys, in
//! the order `labelWidthMm`, `labelHeightMm`, `dpmm`, `rotation`.

use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

pub const SIZE_2_INCH: f64 = 50.8;
pub const SIZE_3_INCH: f64 = 76.2;
pub const SIZE_4_INCH: f64 = 101.6;
pub const SIZE_5_INCH: f64 = 127.0;
pub const SIZE_6_INCH: f64 = 152.4;

pub const DEFAULT_WIDTH_MM: f64 = SIZE_4_INCH;
pub const DEFAULT_HEIGHT_MM: f64 = SIZE_6_INCH;
pub const DEFAULT_DPMM: u32 = 8;

/// Physical label dimensions in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

const fn size(width_mm: f64, height_mm: f64) -> LabelSize {
    LabelSize { width_mm, height_mm }
}

/// Named label sizes. Width is always the 4-inch axis where one exists;
/// both orderings of a name resolve to the same dimensions.
pub const LABEL_PRESETS: &[(&str, LabelSize)] = &[
    ("2x4", size(SIZE_4_INCH, SIZE_2_INCH)),
    ("4x2", size(SIZE_4_INCH, SIZE_2_INCH)),
    ("4x6", size(SIZE_4_INCH, SIZE_6_INCH)),
    ("6x4", size(SIZE_4_INCH, SIZE_6_INCH)),
    ("4x4", size(SIZE_4_INCH, SIZE_4_INCH)),
    ("3x5", size(SIZE_3_INCH, SIZE_5_INCH)),
    ("5x3", size(SIZE_3_INCH, SIZE_5_INCH)),
];

/// Look up a preset by name, ignoring ASCII case.
pub fn preset(name: &str) -> Option<LabelSize> {
    let name = name.to_ascii_lowercase();
    LABEL_PRESETS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, size)| *size)
}

pub fn preset_names() -> Vec<&'static str> {
    LABEL_PRESETS.iter().map(|(name, _)| *name).collect()
}

pub fn pixels_to_millimeters(pixels: u32, dpmm: u32) -> f64 {
    pixels as f64 / dpmm as f64
}

/// Rounds half away from zero: 100.4mm at 8 dpmm is 803.2 and becomes 803.
pub fn millimeters_to_pixels(mm: f64, dpmm: u32) -> u32 {
    (mm * dpmm as f64).round() as u32
}

/// JSON has no encoding for NaN or infinity; serde_json would emit `null`.
fn finite_mm<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(S::Error::custom(format!(
            "label dimension must be a finite number of millimeters, got {}",
            value
        )));
    }
    serializer.serialize_f64(*value)
}

/// Immutable render parameters for one conversion.
///
/// No validation happens here; out-of-range values are passed to the
/// renderer unchanged and it has the final say. Only non-finite
/// dimensions, which the payload cannot carry, fail at serialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    #[serde(serialize_with = "finite_mm")]
    label_width_mm: f64,
    #[serde(serialize_with = "finite_mm")]
    label_height_mm: f64,
    dpmm: u32,
    rotation: i32,
}

impl LabelConfig {
    pub fn new(rotation: i32, label_width_mm: f64, label_height_mm: f64, dpmm: u32) -> Self {
        Self {
            label_width_mm,
            label_height_mm,
            dpmm,
            rotation,
        }
    }

    pub fn builder() -> LabelConfigBuilder {
        LabelConfigBuilder::default()
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn label_width_mm(&self) -> f64 {
        self.label_width_mm
    }

    pub fn label_height_mm(&self) -> f64 {
        self.label_height_mm
    }

    pub fn dpmm(&self) -> u32 {
        self.dpmm
    }

    pub fn width_px(&self) -> u32 {
        millimeters_to_pixels(self.label_width_mm, self.dpmm)
    }

    pub fn height_px(&self) -> u32 {
        millimeters_to_pixels(self.label_height_mm, self.dpmm)
    }

    /// Serialize to the `--config` argument understood by the renderer
    pub fn to_json_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_payload(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self::new(0, DEFAULT_WIDTH_MM, DEFAULT_HEIGHT_MM, DEFAULT_DPMM)
    }
}

/// Fluent builder for [`LabelConfig`].
///
/// Pixel setters convert with the dpmm held at the time of the call, so
/// `dpmm(..)` must come first if it should affect them.
#[derive(Debug, Clone, Copy)]
pub struct LabelConfigBuilder {
    rotation: i32,
    label_width_mm: f64,
    label_height_mm: f64,
    dpmm: u32,
}

impl Default for LabelConfigBuilder {
    fn default() -> Self {
        Self {
            rotation: 0,
            label_width_mm: DEFAULT_WIDTH_MM,
            label_height_mm: DEFAULT_HEIGHT_MM,
            dpmm: DEFAULT_DPMM,
        }
    }
}

impl LabelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotation(mut self, rotation: i32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn label_width_mm(mut self, width_mm: f64) -> Self {
        self.label_width_mm = width_mm;
        self
    }

    pub fn label_height_mm(mut self, height_mm: f64) -> Self {
        self.label_height_mm = height_mm;
        self
    }

    pub fn label_width_px(mut self, width_px: u32) -> Self {
        self.label_width_mm = pixels_to_millimeters(width_px, self.dpmm);
        self
    }

    pub fn label_height_px(mut self, height_px: u32) -> Self {
        self.label_height_mm = pixels_to_millimeters(height_px, self.dpmm);
        self
    }

    pub fn dpmm(mut self, dpmm: u32) -> Self {
        self.dpmm = dpmm;
        self
    }

    pub fn label_size(self, width_mm: f64, height_mm: f64) -> Self {
        self.label_width_mm(width_mm).label_height_mm(height_mm)
    }

    pub fn label_size_px(self, width_px: u32, height_px: u32) -> Self {
        self.label_width_px(width_px).label_height_px(height_px)
    }

    /// Apply a named preset such as `"4x6"`. Fails with
    /// [`ClientError::UnknownPreset`] listing the valid names.
    pub fn label_preset(mut self, name: &str) -> Result<Self> {
        let size = preset(name).ok_or_else(|| ClientError::UnknownPreset {
            preset: name.to_ascii_lowercase(),
            available: preset_names().join(", "),
        })?;
        self.label_width_mm = size.width_mm;
        self.label_height_mm = size.height_mm;
        Ok(self)
    }

    pub fn build(&self) -> LabelConfig {
        LabelConfig::new(
            self.rotation,
            self.label_width_mm,
            self.label_height_mm,
            self.dpmm,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_4x6_at_8_dpmm() {
        let config = LabelConfig::default();
        assert_eq!(config.rotation(), 0);
        assert_eq!(config.label_width_mm(), 101.6);
        assert_eq!(config.label_height_mm(), 152.4);
        assert_eq!(config.dpmm(), 8);
        assert_eq!(LabelConfig::builder().build(), config);
    }

    #[test]
    fn test_payload_key_order() {
        let payload = LabelConfig::default().to_json_payload().unwrap();
        assert_eq!(
            payload,
            r#"{"labelWidthMm":101.6,"labelHeightMm":152.4,"dpmm":8,"rotation":0}"#
        );
    }

    #[test]
    fn test_payload_keeps_shape_for_odd_rotation() {
        for rotation in [-90, 0, 45, 720] {
            let payload = LabelConfig::new(rotation, 10.0, 20.0, 12).to_json_payload().unwrap();
            let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
            let obj = value.as_object().unwrap();
            let keys: Vec<_> = obj.keys().map(String::as_str).collect();
            assert_eq!(keys.len(), 4);
            assert_eq!(obj["rotation"], rotation);
            assert_eq!(obj["dpmm"], 12);
            assert!(payload.starts_with(r#"{"labelWidthMm":10.0,"labelHeightMm":20.0,"#));
        }
    }

    #[test]
    fn test_payload_rejects_non_finite_dimensions() {
        let zero_dpmm = LabelConfig::builder().dpmm(0).label_width_px(100).build();
        assert!(zero_dpmm.label_width_mm().is_infinite());
        match zero_dpmm.to_json_payload() {
            Err(ClientError::Serialization(e)) => assert!(e.to_string().contains("finite")),
            other => panic!("unexpected result: {other:?}"),
        }

        let nan_height = LabelConfig::builder().label_height_mm(f64::NAN).build();
        assert!(matches!(
            nan_height.to_json_payload(),
            Err(ClientError::Serialization(_))
        ));
    }

    #[test]
    fn test_payload_passes_odd_but_finite_values() {
        let payload = LabelConfig::new(0, -5.0, 0.0, 0).to_json_payload().unwrap();
        assert_eq!(
            payload,
            r#"{"labelWidthMm":-5.0,"labelHeightMm":0.0,"dpmm":0,"rotation":0}"#
        );
    }

    #[test]
    fn test_payload_parses_back() {
        let config = LabelConfig::new(270, 76.2, 127.0, 12);
        let payload = config.to_json_payload().unwrap();
        assert_eq!(LabelConfig::from_json_payload(&payload).unwrap(), config);
    }

    #[test]
    fn test_every_preset_matches_table() {
        for (name, size) in LABEL_PRESETS {
            let config = LabelConfig::builder().label_preset(name).unwrap().build();
            assert_eq!(config.label_width_mm(), size.width_mm, "{}", name);
            assert_eq!(config.label_height_mm(), size.height_mm, "{}", name);
        }
    }

    #[test]
    fn test_preset_case_insensitive() {
        let upper = LabelConfig::builder().label_preset("4X6").unwrap().build();
        let lower = LabelConfig::builder().label_preset("4x6").unwrap().build();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_preset_orderings_agree() {
        assert_eq!(preset("4x2"), preset("2x4"));
        assert_eq!(preset("3x5"), preset("5x3"));
        assert_eq!(preset("4x2").unwrap().width_mm, SIZE_4_INCH);
    }

    #[test]
    fn test_unknown_preset_lists_names() {
        let err = LabelConfig::builder().label_preset("8x11").unwrap_err();
        match &err {
            ClientError::UnknownPreset { preset, available } => {
                assert_eq!(preset, "8x11");
                assert_eq!(available, "2x4, 4x2, 4x6, 6x4, 4x4, 3x5, 5x3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("Available presets: 2x4"));
    }

    #[test]
    fn test_mm_to_px_rounding_boundary() {
        assert_eq!(millimeters_to_pixels(100.4, 8), 803);
        assert_eq!(millimeters_to_pixels(0.0625, 8), 1);
        assert_eq!(millimeters_to_pixels(101.6, 8), 813);
    }

    #[test]
    fn test_px_mm_round_trip_within_one_pixel() {
        for dpmm in [6, 8, 12, 24] {
            for mm in [0.5, 25.4, 50.8, 100.4, 152.4, 333.3] {
                let back = pixels_to_millimeters(millimeters_to_pixels(mm, dpmm), dpmm);
                assert!((back - mm).abs() <= 1.0 / dpmm as f64, "{mm}mm @ {dpmm}");
            }
        }
    }

    #[test]
    fn test_pixel_setters_use_current_dpmm() {
        let after = LabelConfig::builder().dpmm(16).label_width_px(1600).build();
        assert_eq!(after.label_width_mm(), 100.0);

        let before = LabelConfig::builder().label_width_px(1600).dpmm(16).build();
        assert_eq!(before.label_width_mm(), 200.0);
        assert_eq!(before.dpmm(), 16);
    }

    #[test]
    fn test_label_size_setters() {
        let config = LabelConfig::builder()
            .label_size(60.0, 40.0)
            .rotation(180)
            .build();
        assert_eq!((config.label_width_mm(), config.label_height_mm()), (60.0, 40.0));
        assert_eq!(config.rotation(), 180);

        let px = LabelConfig::builder().dpmm(12).label_size_px(1200, 600).build();
        assert_eq!((px.label_width_mm(), px.label_height_mm()), (100.0, 50.0));
        assert_eq!((px.width_px(), px.height_px()), (1200, 600));
    }

    #[test]
    fn test_builder_is_reusable() {
        let base = LabelConfig::builder().label_preset("4x4").unwrap();
        let a = base.rotation(90).build();
        let b = base.build();
        assert_eq!(a.rotation(), 90);
        assert_eq!(b.rotation(), 0);
    }
}
