use crate::color::{Color, ColorParseError};
use crate::compositor::CompositeMode;
use crate::presets::Preset;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const MIN_THICKNESS: u32 = 1;
pub const MAX_THICKNESS: u32 = 900;
pub const DEFAULT_THICKNESS: u32 = 220;

pub const MIN_BRIGHTNESS_PERCENT: f64 = 0.0;
pub const MAX_BRIGHTNESS_PERCENT: f64 = 200.0;
pub const MIN_BRIGHTNESS: f64 = 0.0;
pub const MAX_BRIGHTNESS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub thickness: u32,
    /// Linear multiplier on the final alpha, `0.0..=2.0`.
    pub brightness: f64,
    pub color: Color,
}

impl Parameters {
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            thickness: DEFAULT_THICKNESS,
            brightness: profile.default_brightness(),
            color: Color::WHITE,
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

/// Named default sets. `Revised` is the rounded frame look, `Original` the
/// dimmer four-edge bloom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Revised,
    Original,
}

impl Profile {
    pub fn default_brightness(self) -> f64 {
        match self {
            Profile::Revised => 1.0,
            Profile::Original => 0.8,
        }
    }

    pub fn default_mode(self) -> CompositeMode {
        match self {
            Profile::Revised => CompositeMode::RoundedFrame,
            Profile::Original => CompositeMode::LayeredBloom,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Profile::Revised => "revised",
            Profile::Original => "original",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamWarning {
    #[error("brightness {requested}% out of range (0-200%), clamped to {applied}%")]
    BrightnessClamped { requested: f64, applied: f64 },
    #[error("brightness {0} is not a finite number, ignoring")]
    BrightnessNotFinite(f64),
    #[error("thickness {requested}px out of range (1-900px), clamped to {applied}px")]
    ThicknessClamped { requested: f64, applied: u32 },
    #[error("thickness {0} is not a finite number, ignoring")]
    ThicknessNotFinite(f64),
    #[error("no color given, ignoring")]
    ColorMissing,
    #[error("ignoring invalid color: {0}")]
    ColorInvalid(#[source] ColorParseError),
}

/// Discrete messages emitted by the control surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamEvent {
    BrightnessPercent(f64),
    Thickness(f64),
    Color(Option<Color>),
    ColorHex(String),
    Preset(Preset),
    Reset(Profile),
}

pub struct ParameterStore {
    params: Parameters,
    revision: u64,
    last_warning: Option<ParamWarning>,
}

impl ParameterStore {
    pub fn new(profile: Profile) -> Self {
        Self {
            params: Parameters::for_profile(profile),
            revision: 0,
            last_warning: None,
        }
    }

    pub fn params(&self) -> Parameters {
        self.params
    }

    pub fn thickness(&self) -> u32 {
        self.params.thickness
    }

    pub fn brightness(&self) -> f64 {
        self.params.brightness
    }

    /// Brightness as the integer percent a slider shows.
    pub fn brightness_percent(&self) -> i32 {
        (self.params.brightness * 100.0).round() as i32
    }

    pub fn color(&self) -> Color {
        self.params.color
    }

    /// Bumped on every mutation that changed the stored state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_warning(&self) -> Option<&ParamWarning> {
        self.last_warning.as_ref()
    }

    pub fn clear_warning(&mut self) {
        self.last_warning = None;
    }

    pub fn apply(&mut self, event: ParamEvent) -> Option<ParamWarning> {
        match event {
            ParamEvent::BrightnessPercent(v) => self.set_brightness_percent(v),
            ParamEvent::Thickness(px) => self.set_thickness(px),
            ParamEvent::Color(c) => self.set_color(c),
            ParamEvent::ColorHex(s) => self.set_color_hex(&s),
            ParamEvent::Preset(p) => {
                self.apply_preset(p);
                None
            }
            ParamEvent::Reset(profile) => {
                self.reset(profile);
                None
            }
        }
    }

    pub fn set_brightness_percent(&mut self, value: f64) -> Option<ParamWarning> {
        if !value.is_finite() {
            return self.record(ParamWarning::BrightnessNotFinite(value));
        }

        let brightness = (value / 100.0).clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        let warning = if !(MIN_BRIGHTNESS_PERCENT..=MAX_BRIGHTNESS_PERCENT).contains(&value) {
            Some(ParamWarning::BrightnessClamped {
                requested: value,
                applied: brightness * 100.0,
            })
        } else {
            None
        };

        if self.params.brightness != brightness {
            self.params.brightness = brightness;
            self.revision += 1;
        }
        debug!("Brightness set to {}% ({:.2})", value, self.params.brightness);

        warning.and_then(|w| self.record(w))
    }

    /// Fractional input is truncated toward zero before clamping.
    pub fn set_thickness(&mut self, pixels: f64) -> Option<ParamWarning> {
        if !pixels.is_finite() {
            return self.record(ParamWarning::ThicknessNotFinite(pixels));
        }

        let truncated = pixels.trunc();
        let thickness = truncated.clamp(MIN_THICKNESS as f64, MAX_THICKNESS as f64) as u32;
        let warning = if pixels < MIN_THICKNESS as f64 || truncated > MAX_THICKNESS as f64 {
            Some(ParamWarning::ThicknessClamped {
                requested: pixels,
                applied: thickness,
            })
        } else {
            None
        };

        if self.params.thickness != thickness {
            self.params.thickness = thickness;
            self.revision += 1;
        }
        debug!("Thickness set to {}px", self.params.thickness);

        warning.and_then(|w| self.record(w))
    }

    pub fn set_color(&mut self, color: Option<Color>) -> Option<ParamWarning> {
        let Some(color) = color else {
            return self.record(ParamWarning::ColorMissing);
        };

        if self.params.color != color {
            self.params.color = color;
            self.revision += 1;
        }
        debug!("Color set to {}", color);
        None
    }

    pub fn set_color_hex(&mut self, input: &str) -> Option<ParamWarning> {
        match input.parse::<Color>() {
            Ok(color) => self.set_color(Some(color)),
            Err(e) => self.record(ParamWarning::ColorInvalid(e)),
        }
    }

    /// Presets are within range by construction, so this never warns.
    pub fn apply_preset(&mut self, preset: Preset) {
        let (percent, thickness, color) = preset.values();
        self.set_brightness_percent(percent as f64);
        self.set_thickness(thickness as f64);
        self.set_color(Some(color));
        debug!("Preset applied: {} ({}%, {}px, {})", preset.label(), percent, thickness, color.to_hex());
    }

    pub fn reset(&mut self, profile: Profile) {
        let defaults = Parameters::for_profile(profile);
        if self.params != defaults {
            self.params = defaults;
            self.revision += 1;
        }
        self.last_warning = None;
    }

    fn record(&mut self, warning: ParamWarning) -> Option<ParamWarning> {
        warn!("{}", warning);
        self.last_warning = Some(warning.clone());
        Some(warning)
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(Profile::default())
    }
}
