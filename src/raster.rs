use crate::color::{Color, Rgba};
use crate::compositor::{compose, BlendMode, BorderFrame, CompositeMode, Rect, RoundedFrame, RoundedRect};
use crate::geometry::SurfaceBounds;
use crate::params::Parameters;
use thiserror::Error;
use tracing::debug;

/// One 8K display. At 16 bytes a pixel this keeps a canvas near 530 MB.
pub const MAX_CANVAS_PIXELS: u64 = 7680 * 4320;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("canvas {width}x{height} exceeds the {max} pixel limit")]
    TooLarge { width: u32, height: u32, max: u64 },
}

/// Premultiplied `f32` RGBA, so the screen blend is `s + d - s * d` on every
/// channel. Export converts back to straight 8-bit RGBA.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Canvas {
    /// Fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let count = width as u64 * height as u64;
        if count > MAX_CANVAS_PIXELS {
            return Err(RasterError::TooLarge { width, height, max: MAX_CANVAS_PIXELS });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![[0.0; 4]; count as usize],
        })
    }

    pub fn for_bounds(bounds: SurfaceBounds) -> Result<Self, RasterError> {
        Self::new(bounds.width.max(0) as u32, bounds.height.max(0) as u32)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Rgba) {
        let px = premultiply(color.color, color.alpha_unit());
        self.pixels.fill(px);
    }

    /// Premultiplied RGBA in `0.0..=1.0`.
    pub fn premultiplied(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Straight (unpremultiplied) 8-bit RGBA.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.premultiplied(x, y).map(unpremultiply)
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for px in &self.pixels {
            out.extend_from_slice(&unpremultiply(*px));
        }
        out
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|px| px[3] == 0.0)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    fn blend(&mut self, x: u32, y: u32, src: [f32; 4], mode: BlendMode) {
        let i = self.index(x, y);
        let dst = &mut self.pixels[i];
        match mode {
            BlendMode::Screen => {
                for c in 0..4 {
                    dst[c] = src[c] + dst[c] - src[c] * dst[c];
                }
            }
        }
    }

    /// Pixel range of `rect` clipped to the canvas, as `(x0, y0, x1, y1)`.
    fn clip(&self, rect: Rect, pad: i32) -> Option<(u32, u32, u32, u32)> {
        let x0 = (rect.x - pad).max(0);
        let y0 = (rect.y - pad).max(0);
        let x1 = (rect.right() + pad).min(self.width as i32);
        let y1 = (rect.bottom() + pad).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

pub fn paint(canvas: &mut Canvas, frame: &BorderFrame) {
    let mode = frame.blend_mode();
    match frame {
        BorderFrame::Empty => {}
        BorderFrame::Rounded(rounded) => paint_rounded(canvas, rounded, mode),
        BorderFrame::Bloom(bloom) => {
            let surface = Rect::new(0, 0, canvas.width as i32, canvas.height as i32);
            for layer in &bloom.layers {
                if layer.alpha == 0 {
                    continue;
                }
                for band in &layer.bands {
                    let Some((x0, y0, x1, y1)) = canvas.clip(band.rect, 0) else {
                        continue;
                    };
                    for y in y0..y1 {
                        for x in x0..x1 {
                            let d = band.distance(surface, x as f32 + 0.5, y as f32 + 0.5);
                            let alpha = band.alpha_at(d);
                            if alpha > 0.0 {
                                canvas.blend(x, y, premultiply(band.start.color, alpha), mode);
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn render(params: &Parameters, bounds: SurfaceBounds, mode: CompositeMode) -> Result<Canvas, RasterError> {
    let mut canvas = Canvas::for_bounds(bounds)?;
    let frame = compose(params, bounds, mode);
    paint(&mut canvas, &frame);
    debug!("Rendered {} border at {}x{}", mode, canvas.width, canvas.height);
    Ok(canvas)
}

fn paint_rounded(canvas: &mut Canvas, frame: &RoundedFrame, mode: BlendMode) {
    if frame.fill.is_transparent() || frame.outer.rect.is_empty() {
        return;
    }
    let Some((x0, y0, x1, y1)) = canvas.clip(frame.outer.rect, 1) else {
        return;
    };

    let fill_alpha = frame.fill.alpha_unit();
    let inner_core = solid_core(&frame.inner);

    for y in y0..y1 {
        let py = y as f32 + 0.5;
        for x in x0..x1 {
            let px = x as f32 + 0.5;
            if let Some(core) = inner_core {
                if core.contains(px, py) {
                    continue;
                }
            }

            let outer = coverage(&frame.outer, px, py);
            if outer <= 0.0 {
                continue;
            }
            let inner = coverage(&frame.inner, px, py);
            let cov = outer * (1.0 - inner);
            if cov > 0.0 {
                canvas.blend(x, y, premultiply(frame.fill.color, fill_alpha * cov), mode);
            }
        }
    }
}

/// Region of a rounded rect guaranteed to have full coverage.
#[derive(Clone, Copy)]
struct Core {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Core {
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

fn solid_core(shape: &RoundedRect) -> Option<Core> {
    if shape.rect.is_empty() {
        return None;
    }
    let pad = shape.radius.max(0) as f32 + 1.0;
    let core = Core {
        x0: shape.rect.x as f32 + pad,
        y0: shape.rect.y as f32 + pad,
        x1: shape.rect.right() as f32 - pad,
        y1: shape.rect.bottom() as f32 - pad,
    };
    (core.x0 < core.x1 && core.y0 < core.y1).then_some(core)
}

/// Antialiased coverage of a pixel centered at `(x, y)`, from the signed
/// distance to the rounded rect boundary.
fn coverage(shape: &RoundedRect, x: f32, y: f32) -> f32 {
    if shape.rect.is_empty() {
        return 0.0;
    }
    let d = rounded_rect_sdf(shape, x, y);
    (0.5 - d).clamp(0.0, 1.0)
}

fn rounded_rect_sdf(shape: &RoundedRect, x: f32, y: f32) -> f32 {
    let half_w = shape.rect.width as f32 / 2.0;
    let half_h = shape.rect.height as f32 / 2.0;
    let cx = shape.rect.x as f32 + half_w;
    let cy = shape.rect.y as f32 + half_h;
    let r = (shape.radius.max(0) as f32).min(half_w).min(half_h);

    let qx = (x - cx).abs() - (half_w - r);
    let qy = (y - cy).abs() - (half_h - r);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    let inside = qx.max(qy).min(0.0);
    outside + inside - r
}

fn premultiply(color: Color, alpha: f32) -> [f32; 4] {
    let [r, g, b] = color.to_unit();
    let a = alpha.clamp(0.0, 1.0);
    [r * a, g * a, b * a, a]
}

fn unpremultiply(px: [f32; 4]) -> [u8; 4] {
    let a = px[3].clamp(0.0, 1.0);
    if a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let channel = |c: f32| ((c / a).clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(px[0]), channel(px[1]), channel(px[2]), (a * 255.0).round() as u8]
}
