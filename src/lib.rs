pub mod color;
pub mod compositor;
pub mod config;
pub mod geometry;
pub mod logger;
pub mod params;
pub mod presets;
pub mod raster;

pub use color::{Color, ColorParseError, Rgba};
pub use compositor::{compose, BorderFrame, CompositeMode};
pub use config::{ConfigError, LaunchConfig, LoggingConfig};
pub use geometry::{DisplaySource, GeometryChange, GeometryTracker, SurfaceBounds};
pub use params::{ParamEvent, ParamWarning, ParameterStore, Parameters, Profile};
pub use presets::Preset;
pub use raster::{paint, render, Canvas, RasterError};
