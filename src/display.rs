use lumascreen::{DisplaySource, SurfaceBounds};

#[cfg(windows)]
use windows::Win32::{
    Foundation::POINT,
    Graphics::Gdi::{GetMonitorInfoW, MonitorFromPoint, MONITORINFO, MONITOR_DEFAULTTOPRIMARY},
};

/// Primary display query. Windows asks the monitor API directly; other
/// platforms fall back to what the windowing backend reports for the
/// control panel's monitor.
pub struct PrimaryDisplay {
    ctx: egui::Context,
}

impl PrimaryDisplay {
    pub fn new(ctx: &egui::Context) -> Self {
        Self { ctx: ctx.clone() }
    }

    fn reported_monitor_size(&self) -> Option<SurfaceBounds> {
        let size = self.ctx.input(|i| i.viewport().monitor_size)?;
        let ppp = self.ctx.native_pixels_per_point().unwrap_or(1.0);
        Some(SurfaceBounds::sized(
            (size.x * ppp).round() as i32,
            (size.y * ppp).round() as i32,
        ))
    }
}

impl DisplaySource for PrimaryDisplay {
    fn primary_bounds(&self) -> Option<SurfaceBounds> {
        #[cfg(windows)]
        if let Some(bounds) = primary_monitor_rect() {
            return Some(bounds);
        }

        self.reported_monitor_size()
    }
}

/// The primary monitor is, by definition, the one containing the origin.
#[cfg(windows)]
fn primary_monitor_rect() -> Option<SurfaceBounds> {
    unsafe {
        let monitor = MonitorFromPoint(POINT { x: 0, y: 0 }, MONITOR_DEFAULTTOPRIMARY);
        if monitor.is_invalid() {
            return None;
        }

        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if !GetMonitorInfoW(monitor, &mut info).as_bool() {
            return None;
        }

        let rect = info.rcMonitor;
        Some(SurfaceBounds::new(
            rect.left,
            rect.top,
            rect.right - rect.left,
            rect.bottom - rect.top,
        ))
    }
}
