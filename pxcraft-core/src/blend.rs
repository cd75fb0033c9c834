use crate::util::Opacity;

/// How a layer's pixels combine with what lies beneath it.
///
/// The discriminant is the on-disk code, so never reorder or reuse one.
#[derive(strum::Display, PartialEq, Eq, strum::EnumIter, Copy, Clone, Hash, Debug, Default)]
#[repr(u8)]
pub enum BlendMode {
    #[default]
    Normal = 0,
    Multiply = 1,
    Screen = 2,
    Overlay = 3,
    Darken = 4,
    Lighten = 5,
    #[strum(to_string = "Color Dodge")]
    ColorDodge = 6,
    #[strum(to_string = "Color Burn")]
    ColorBurn = 7,
    #[strum(to_string = "Hard Light")]
    HardLight = 8,
    #[strum(to_string = "Soft Light")]
    SoftLight = 9,
    Difference = 10,
    Exclusion = 11,
    Hue = 12,
    Saturation = 13,
    Color = 14,
    Luminosity = 15,
}
impl BlendMode {
    /// Stable code used by the project format.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
    /// Inverse of [`Self::code`]. Unknown codes are `None` rather than silently `Normal`,
    /// a file that names a mode we don't have is damaged or from the future.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|mode| mode.code() == code)
    }
}

/// Blend mode for a layer, including the mode and its opacity modulate.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Blend {
    pub mode: BlendMode,
    pub opacity: Opacity,
}
impl Blend {
    #[must_use]
    pub fn new(mode: BlendMode, opacity: Opacity) -> Self {
        Self { mode, opacity }
    }
}
