use crate::color::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Warm,
    Cool,
    Soft,
    Intense,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Warm, Preset::Cool, Preset::Soft, Preset::Intense];

    /// `(brightness %, thickness px, color)`
    pub fn values(self) -> (u32, u32, Color) {
        match self {
            Preset::Warm => (100, 250, Color::rgb(255, 240, 220)),
            Preset::Cool => (120, 280, Color::rgb(255, 255, 255)),
            Preset::Soft => (80, 300, Color::rgb(255, 250, 240)),
            Preset::Intense => (150, 200, Color::rgb(255, 255, 255)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Preset::Warm => "Warm",
            Preset::Cool => "Cool",
            Preset::Soft => "Soft",
            Preset::Intense => "Intense",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            Preset::Warm => "Warm light (100%, 250px, yellowish)",
            Preset::Cool => "Cool light (120%, 280px, white)",
            Preset::Soft => "Soft light (80%, 300px, slightly yellow)",
            Preset::Intense => "Intense light (150%, 200px, pure white)",
        }
    }
}
