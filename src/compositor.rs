use crate::color::Rgba;
use crate::geometry::SurfaceBounds;
use crate::params::{Parameters, MIN_THICKNESS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Inset of the rounded frame from the surface edges.
pub const SCREEN_MARGIN: i32 = 10;
/// Corner radius of the frame's outer edge.
pub const OUTER_CORNER_RADIUS: i32 = 20;
/// Brightness can push alpha up to full opacity but never further.
pub const MAX_ALPHA: u8 = 255;
/// Bloom layers stay slightly see-through even at 200% brightness.
pub const BLOOM_ALPHA_CAP: u8 = 220;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomStep {
    pub intensity: f64,
    pub size_multiplier: f64,
}

/// Outer to inner.
pub const BLOOM_LAYERS: [BloomStep; 4] = [
    BloomStep { intensity: 1.00, size_multiplier: 1.00 },
    BloomStep { intensity: 0.70, size_multiplier: 0.75 },
    BloomStep { intensity: 0.45, size_multiplier: 0.55 },
    BloomStep { intensity: 0.25, size_multiplier: 0.40 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompositeMode {
    #[default]
    #[serde(rename = "frame")]
    RoundedFrame,
    #[serde(rename = "bloom")]
    LayeredBloom,
}

impl CompositeMode {
    pub const ALL: [CompositeMode; 2] = [CompositeMode::RoundedFrame, CompositeMode::LayeredBloom];

    pub fn label(self) -> &'static str {
        match self {
            CompositeMode::RoundedFrame => "Rounded frame",
            CompositeMode::LayeredBloom => "Layered bloom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown composite mode {0:?} (expected \"frame\" or \"bloom\")")]
pub struct UnknownMode(pub String);

impl FromStr for CompositeMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frame" | "rounded" | "rounded-frame" => Ok(CompositeMode::RoundedFrame),
            "bloom" | "layered" | "layered-bloom" => Ok(CompositeMode::LayeredBloom),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for CompositeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompositeMode::RoundedFrame => "frame",
            CompositeMode::LayeredBloom => "bloom",
        })
    }
}

/// `result = 1 - (1 - src) * (1 - dst)` per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Shrinks by `amount` on every side. Size floors at zero.
    pub fn inset(self, amount: i32) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            width: (self.width - 2 * amount).max(0),
            height: (self.height - 2 * amount).max(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundedRect {
    pub rect: Rect,
    pub radius: i32,
}

/// `outer - inner`, filled solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedFrame {
    pub outer: RoundedRect,
    pub inner: RoundedRect,
    pub fill: Rgba,
    pub effective_thickness: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];
}

/// Linear fade from `start` at `edge` to `end` at `depth` pixels inward,
/// spanning the whole of `rect` along the edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeGradient {
    pub edge: Edge,
    pub rect: Rect,
    pub depth: i32,
    pub start: Rgba,
    pub end: Rgba,
}

impl EdgeGradient {
    fn new(edge: Edge, surface: Rect, depth: i32, start: Rgba) -> Self {
        let rect = match edge {
            Edge::Top => Rect::new(0, 0, surface.width, depth),
            Edge::Bottom => Rect::new(0, surface.height - depth, surface.width, depth),
            Edge::Left => Rect::new(0, 0, depth, surface.height),
            Edge::Right => Rect::new(surface.width - depth, 0, depth, surface.height),
        };
        Self {
            edge,
            rect,
            depth,
            start,
            end: start.color.with_alpha(0),
        }
    }

    /// Distance from the emitting edge to the point, in pixels.
    pub fn distance(&self, surface: Rect, x: f32, y: f32) -> f32 {
        match self.edge {
            Edge::Top => y,
            Edge::Bottom => surface.height as f32 - y,
            Edge::Left => x,
            Edge::Right => surface.width as f32 - x,
        }
    }

    /// Interpolated alpha (0.0..=1.0) at `distance` from the edge.
    pub fn alpha_at(&self, distance: f32) -> f32 {
        if self.depth <= 0 || distance < 0.0 || distance > self.depth as f32 {
            return 0.0;
        }
        let t = distance / self.depth as f32;
        let start = self.start.alpha_unit();
        let end = self.end.alpha_unit();
        start + (end - start) * t
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BloomLayer {
    pub intensity: f64,
    pub size: i32,
    pub alpha: u8,
    /// Top, bottom, left, right.
    pub bands: [EdgeGradient; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct BloomFrame {
    pub thickness: i32,
    pub layers: Vec<BloomLayer>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BorderFrame {
    Empty,
    Rounded(RoundedFrame),
    Bloom(BloomFrame),
}

impl BorderFrame {
    pub fn is_empty(&self) -> bool {
        match self {
            BorderFrame::Empty => true,
            BorderFrame::Rounded(frame) => frame.fill.is_transparent() || frame.outer.rect.is_empty(),
            BorderFrame::Bloom(frame) => frame.layers.iter().all(|l| l.alpha == 0),
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        BlendMode::Screen
    }
}

pub fn effective_alpha(brightness: f64) -> u8 {
    (255.0 * brightness).round().clamp(0.0, MAX_ALPHA as f64) as u8
}

pub fn bloom_layer_alpha(brightness: f64, intensity: f64) -> u8 {
    (255.0 * brightness * intensity)
        .round()
        .clamp(0.0, BLOOM_ALPHA_CAP as f64) as u8
}

/// Largest thickness that keeps the inner cavity from inverting.
pub fn max_safe_thickness(bounds: SurfaceBounds) -> i32 {
    (bounds.min_dimension() / 2 - SCREEN_MARGIN).max(MIN_THICKNESS as i32)
}

pub fn effective_thickness(thickness: u32, bounds: SurfaceBounds) -> i32 {
    clamp_thickness(thickness, max_safe_thickness(bounds))
}

pub fn inner_radius(effective_thickness: i32) -> i32 {
    (OUTER_CORNER_RADIUS - effective_thickness).max(0)
}

fn clamp_thickness(thickness: u32, cap: i32) -> i32 {
    i32::try_from(thickness).unwrap_or(i32::MAX).min(cap)
}

pub fn compose(params: &Parameters, bounds: SurfaceBounds, mode: CompositeMode) -> BorderFrame {
    if bounds.is_degenerate() {
        debug!("Invalid dimensions: {}x{}, nothing to paint", bounds.width, bounds.height);
        return BorderFrame::Empty;
    }

    match mode {
        CompositeMode::RoundedFrame => BorderFrame::Rounded(compose_rounded(params, bounds)),
        CompositeMode::LayeredBloom => BorderFrame::Bloom(compose_bloom(params, bounds)),
    }
}

fn compose_rounded(params: &Parameters, bounds: SurfaceBounds) -> RoundedFrame {
    let surface = Rect::new(0, 0, bounds.width, bounds.height);
    let thickness = effective_thickness(params.thickness, bounds);

    RoundedFrame {
        outer: RoundedRect {
            rect: surface.inset(SCREEN_MARGIN),
            radius: OUTER_CORNER_RADIUS,
        },
        inner: RoundedRect {
            rect: surface.inset(SCREEN_MARGIN + thickness),
            radius: inner_radius(thickness),
        },
        fill: params.color.with_alpha(effective_alpha(params.brightness)),
        effective_thickness: thickness,
    }
}

fn compose_bloom(params: &Parameters, bounds: SurfaceBounds) -> BloomFrame {
    let surface = Rect::new(0, 0, bounds.width, bounds.height);
    let thickness = clamp_thickness(params.thickness, bounds.min_dimension().max(1));

    let layers = BLOOM_LAYERS
        .iter()
        .map(|step| {
            let size = ((thickness as f64 * step.size_multiplier).floor() as i32).max(1);
            let alpha = bloom_layer_alpha(params.brightness, step.intensity);
            let start = params.color.with_alpha(alpha);

            BloomLayer {
                intensity: step.intensity,
                size,
                alpha,
                bands: Edge::ALL.map(|edge| EdgeGradient::new(edge, surface, size, start)),
            }
        })
        .collect();

    BloomFrame { thickness, layers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn params(thickness: u32, brightness: f64) -> Parameters {
        Parameters { thickness, brightness, color: Color::WHITE }
    }

    fn rounded(frame: BorderFrame) -> RoundedFrame {
        match frame {
            BorderFrame::Rounded(f) => f,
            other => panic!("expected rounded frame, got {:?}", other),
        }
    }

    fn bloom(frame: BorderFrame) -> BloomFrame {
        match frame {
            BorderFrame::Bloom(f) => f,
            other => panic!("expected bloom frame, got {:?}", other),
        }
    }

    #[test]
    fn full_hd_default_frame() {
        let frame = rounded(compose(&params(220, 1.0), SurfaceBounds::sized(1920, 1080), CompositeMode::RoundedFrame));

        assert_eq!(frame.effective_thickness, 220);
        assert_eq!(frame.fill.a, 255);
        assert_eq!(frame.fill.color, Color::WHITE);
        assert_eq!(frame.inner.radius, 0);
        assert_eq!(frame.outer.radius, 20);
        assert_eq!(frame.outer.rect, Rect::new(10, 10, 1900, 1060));
        assert_eq!(frame.inner.rect, Rect::new(230, 230, 1460, 620));
    }

    #[test]
    fn thickness_is_capped_on_small_surfaces() {
        let bounds = SurfaceBounds::sized(200, 200);
        assert_eq!(max_safe_thickness(bounds), 90);

        let frame = rounded(compose(&params(900, 1.0), bounds, CompositeMode::RoundedFrame));
        assert_eq!(frame.effective_thickness, 90);
        assert_eq!(frame.inner.rect, Rect::new(100, 100, 0, 0));
    }

    #[test]
    fn inner_cavity_never_inverts() {
        for (w, h) in [(1920, 1080), (1080, 1920), (640, 480), (300, 301), (45, 2000), (22, 22)] {
            let bounds = SurfaceBounds::sized(w, h);
            let bound = bounds.min_dimension() / 2 - SCREEN_MARGIN;
            for thickness in [1, 20, 219, 220, 530, 900] {
                let frame = rounded(compose(&params(thickness, 1.0), bounds, CompositeMode::RoundedFrame));
                assert!(frame.effective_thickness <= bound, "{}x{} t={}", w, h, thickness);
                assert!(frame.effective_thickness >= 1);
                assert!(frame.inner.rect.width >= 0 && frame.inner.rect.height >= 0);
            }
        }
    }

    #[test]
    fn tiny_surface_floors_thickness_at_one() {
        let bounds = SurfaceBounds::sized(15, 15);
        assert_eq!(max_safe_thickness(bounds), 1);

        let frame = rounded(compose(&params(220, 1.0), bounds, CompositeMode::RoundedFrame));
        assert_eq!(frame.effective_thickness, 1);
        assert_eq!(frame.outer.rect.width, 0);
        assert_eq!(frame.inner.rect.width, 0);
        assert!(BorderFrame::Rounded(frame).is_empty());
    }

    #[test]
    fn inner_radius_shrinks_then_floors() {
        assert_eq!(inner_radius(1), 19);
        assert_eq!(inner_radius(12), 8);
        assert_eq!(inner_radius(20), 0);
        assert_eq!(inner_radius(21), 0);
        assert_eq!(inner_radius(220), 0);

        let mut previous = i32::MAX;
        for t in 1..=60 {
            let r = inner_radius(t);
            assert!(r <= previous);
            assert!(r >= 0);
            previous = r;
        }
    }

    #[test]
    fn degenerate_surface_is_empty() {
        for bounds in [SurfaceBounds::sized(0, 1080), SurfaceBounds::sized(1920, 0), SurfaceBounds::sized(-5, 10)] {
            for mode in CompositeMode::ALL {
                let frame = compose(&params(220, 1.0), bounds, mode);
                assert_eq!(frame, BorderFrame::Empty);
                assert!(frame.is_empty());
            }
        }
    }

    #[test]
    fn alpha_follows_brightness_up_to_opaque() {
        assert_eq!(effective_alpha(0.0), 0);
        assert_eq!(effective_alpha(0.5), 128);
        assert_eq!(effective_alpha(0.8), 204);
        assert_eq!(effective_alpha(1.0), 255);
        assert_eq!(effective_alpha(2.0), 255);
    }

    #[test]
    fn zero_brightness_frame_paints_nothing() {
        let frame = compose(&params(220, 0.0), SurfaceBounds::sized(1920, 1080), CompositeMode::RoundedFrame);
        assert!(frame.is_empty());
    }

    #[test]
    fn bloom_base_layer_hits_safety_cap() {
        let frame = bloom(compose(&params(220, 2.0), SurfaceBounds::sized(1920, 1080), CompositeMode::LayeredBloom));
        assert_eq!(frame.layers[0].alpha, 220);
        assert_eq!(bloom_layer_alpha(2.0, 1.0), 220);
        assert!(frame.layers.iter().all(|l| l.alpha <= BLOOM_ALPHA_CAP));
    }

    #[test]
    fn bloom_layers_shrink_and_dim() {
        let frame = bloom(compose(&params(220, 1.0), SurfaceBounds::sized(1920, 1080), CompositeMode::LayeredBloom));

        assert_eq!(frame.thickness, 220);
        let sizes: Vec<i32> = frame.layers.iter().map(|l| l.size).collect();
        assert_eq!(sizes, vec![220, 165, 121, 88]);

        let alphas: Vec<u8> = frame.layers.iter().map(|l| l.alpha).collect();
        assert_eq!(alphas[0], 220);
        assert_eq!(alphas[3], 64);
        assert!(alphas.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn bloom_bands_cover_each_edge() {
        let frame = bloom(compose(&params(100, 1.0), SurfaceBounds::sized(800, 600), CompositeMode::LayeredBloom));
        let layer = &frame.layers[0];

        assert_eq!(layer.bands[0].rect, Rect::new(0, 0, 800, 100));
        assert_eq!(layer.bands[1].rect, Rect::new(0, 500, 800, 100));
        assert_eq!(layer.bands[2].rect, Rect::new(0, 0, 100, 600));
        assert_eq!(layer.bands[3].rect, Rect::new(700, 0, 100, 600));

        for band in &layer.bands {
            assert_eq!(band.end.a, 0);
            assert_eq!(band.end.color, band.start.color);
        }
    }

    #[test]
    fn bloom_thickness_capped_by_smaller_dimension() {
        let frame = bloom(compose(&params(900, 1.0), SurfaceBounds::sized(300, 120), CompositeMode::LayeredBloom));
        assert_eq!(frame.thickness, 120);
        assert_eq!(frame.layers[0].size, 120);
        assert_eq!(frame.layers[3].size, 48);
    }

    #[test]
    fn bloom_layer_size_never_below_one() {
        let frame = bloom(compose(&params(1, 1.0), SurfaceBounds::sized(300, 300), CompositeMode::LayeredBloom));
        assert!(frame.layers.iter().all(|l| l.size == 1));
    }

    #[test]
    fn gradient_fades_linearly() {
        let surface = Rect::new(0, 0, 100, 100);
        let band = EdgeGradient::new(Edge::Right, surface, 40, Color::WHITE.with_alpha(200));

        assert_eq!(band.distance(surface, 100.0, 50.0), 0.0);
        assert!((band.alpha_at(0.0) - 200.0 / 255.0).abs() < 1e-6);
        assert!((band.alpha_at(20.0) - 100.0 / 255.0).abs() < 1e-6);
        assert_eq!(band.alpha_at(41.0), 0.0);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("frame".parse::<CompositeMode>(), Ok(CompositeMode::RoundedFrame));
        assert_eq!("Bloom".parse::<CompositeMode>(), Ok(CompositeMode::LayeredBloom));
        assert!("glow".parse::<CompositeMode>().is_err());
        assert_eq!(CompositeMode::LayeredBloom.to_string(), "bloom");
    }
}
