use anyhow::{Context, Result};
use lumascreen::raster;
use lumascreen::{CompositeMode, ParameterStore, Parameters, SurfaceBounds};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const TEXTURE_NAME: &str = "ring_light";

/// Everything that affects the rendered pixels. The texture is rebuilt only
/// when this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderKey {
    revision: u64,
    bounds: SurfaceBounds,
    mode: CompositeMode,
}

/// Tracks what is on the texture and when a failed render may be retried.
#[derive(Debug)]
struct RenderSchedule {
    rendered: Option<RenderKey>,
    failed: Option<(RenderKey, Instant)>,
    retry_after: Duration,
}

impl RenderSchedule {
    fn new(retry_after: Duration) -> Self {
        Self {
            rendered: None,
            failed: None,
            retry_after,
        }
    }

    fn needs_render(&self, key: RenderKey, now: Instant) -> bool {
        if self.rendered == Some(key) {
            return false;
        }
        match self.failed {
            Some((failed, at)) if failed == key => now.saturating_duration_since(at) >= self.retry_after,
            _ => true,
        }
    }

    fn succeeded(&mut self, key: RenderKey) {
        self.rendered = Some(key);
        self.failed = None;
    }

    /// `rendered` is left alone: the previous texture is still on screen.
    fn record_failure(&mut self, key: RenderKey, now: Instant) {
        self.failed = Some((key, now));
    }
}

/// Bounds the overlay viewport should cover this frame, or `None` to close it.
fn target_bounds(visible: bool, bounds: Option<SurfaceBounds>) -> Option<SurfaceBounds> {
    if !visible {
        return None;
    }
    bounds.filter(|b| !b.is_degenerate())
}

/// The full-screen, click-through ring light surface.
pub struct Overlay {
    mode: CompositeMode,
    visible: bool,
    bounds: Option<SurfaceBounds>,
    texture: Option<egui::TextureHandle>,
    schedule: RenderSchedule,
}

impl Overlay {
    pub fn new(mode: CompositeMode, retry_after: Duration) -> Self {
        Self {
            mode,
            visible: true,
            bounds: None,
            texture: None,
            schedule: RenderSchedule::new(retry_after),
        }
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CompositeMode) {
        if self.mode != mode {
            info!("Compositing mode set to {}", mode);
            self.mode = mode;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        if self.visible {
            info!("Screen light turned on");
        } else {
            info!("Screen light turned off");
        }
    }

    pub fn panic_off(&mut self) {
        self.visible = false;
        warn!("Panic button pressed - screen light disabled");
    }

    /// Called when the tracked display changed; the viewport is resized to
    /// match on the next frame.
    pub fn set_bounds(&mut self, bounds: SurfaceBounds) {
        self.bounds = Some(bounds);
    }

    /// Shows the overlay viewport for this frame. Not calling this (hidden,
    /// no display known yet, or a zero-sized display) closes it.
    pub fn show(&mut self, ctx: &egui::Context, store: &ParameterStore) {
        let Some(bounds) = target_bounds(self.visible, self.bounds) else {
            return;
        };

        self.refresh_texture(ctx, store, bounds);

        let ppp = ctx.native_pixels_per_point().unwrap_or(1.0);
        let builder = egui::ViewportBuilder::default()
            .with_title("LumaScreen Overlay")
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_mouse_passthrough(true)
            .with_taskbar(false)
            .with_resizable(false)
            .with_position(egui::pos2(bounds.x as f32 / ppp, bounds.y as f32 / ppp))
            .with_inner_size(egui::vec2(bounds.width as f32 / ppp, bounds.height as f32 / ppp));

        let texture_id = self.texture.as_ref().map(|t| t.id());

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("lumascreen_overlay"),
            builder,
            |ctx, _class| {
                egui::CentralPanel::default()
                    .frame(egui::Frame::none())
                    .show(ctx, |ui| {
                        if let Some(id) = texture_id {
                            ui.painter().image(
                                id,
                                ctx.screen_rect(),
                                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                                egui::Color32::WHITE,
                            );
                        }
                    });
            },
        );
    }

    fn refresh_texture(&mut self, ctx: &egui::Context, store: &ParameterStore, bounds: SurfaceBounds) {
        let key = RenderKey {
            revision: store.revision(),
            bounds,
            mode: self.mode,
        };
        let now = Instant::now();
        if !self.schedule.needs_render(key, now) {
            return;
        }

        match build_image(&store.params(), bounds, self.mode) {
            Ok(image) => {
                match self.texture.as_mut() {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture = Some(ctx.load_texture(TEXTURE_NAME, image, egui::TextureOptions::LINEAR));
                    }
                }
                self.schedule.succeeded(key);
            }
            Err(e) => {
                error!(
                    "Error rendering ring light ({}x{}, mode {}): {:#}",
                    bounds.width, bounds.height, self.mode, e
                );
                self.schedule.record_failure(key, now);
            }
        }
    }
}

fn build_image(params: &Parameters, bounds: SurfaceBounds, mode: CompositeMode) -> Result<egui::ColorImage> {
    let canvas = raster::render(params, bounds, mode)
        .with_context(|| format!("Failed to rasterize {} border", mode))?;
    let size = [canvas.width() as usize, canvas.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, &canvas.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETRY: Duration = Duration::from_millis(1000);

    fn key(revision: u64) -> RenderKey {
        RenderKey {
            revision,
            bounds: SurfaceBounds::sized(1920, 1080),
            mode: CompositeMode::RoundedFrame,
        }
    }

    #[test]
    fn renders_once_per_key() {
        let now = Instant::now();
        let mut schedule = RenderSchedule::new(RETRY);
        assert!(schedule.needs_render(key(0), now));

        schedule.succeeded(key(0));
        assert!(!schedule.needs_render(key(0), now));
        assert!(schedule.needs_render(key(1), now));
    }

    #[test]
    fn failed_render_waits_one_interval() {
        let now = Instant::now();
        let mut schedule = RenderSchedule::new(RETRY);
        schedule.succeeded(key(0));

        schedule.record_failure(key(1), now);
        assert_eq!(schedule.rendered, Some(key(0)));
        assert!(!schedule.needs_render(key(1), now));
        assert!(!schedule.needs_render(key(1), now + Duration::from_millis(999)));
        assert!(schedule.needs_render(key(1), now + RETRY));
    }

    #[test]
    fn failure_does_not_block_other_keys() {
        let now = Instant::now();
        let mut schedule = RenderSchedule::new(RETRY);
        schedule.record_failure(key(1), now);

        assert!(schedule.needs_render(key(2), now));
        schedule.succeeded(key(2));
        assert!(schedule.failed.is_none());
        assert!(!schedule.needs_render(key(2), now));
    }

    #[test]
    fn viewport_closes_when_hidden_or_degenerate() {
        let full_hd = SurfaceBounds::sized(1920, 1080);
        assert_eq!(target_bounds(true, Some(full_hd)), Some(full_hd));
        assert_eq!(target_bounds(false, Some(full_hd)), None);
        assert_eq!(target_bounds(true, None), None);
        assert_eq!(target_bounds(true, Some(SurfaceBounds::sized(0, 1080))), None);
        assert_eq!(target_bounds(true, Some(SurfaceBounds::sized(1920, 0))), None);
    }
}
