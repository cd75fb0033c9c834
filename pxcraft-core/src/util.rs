//! Utility types, used throughout the crate.

/// A layer opacity, guaranteed finite and within `0.0..=1.0`.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
#[repr(transparent)]
pub struct Opacity(f32);
impl Opacity {
    pub const TRANSPARENT: Self = Self(0.0);
    pub const OPAQUE: Self = Self(1.0);
    pub fn new(val: f32) -> Result<Self, OpacityError> {
        if !val.is_finite() {
            Err(OpacityError::NotFinite)
        } else if !(0.0..=1.0).contains(&val) {
            Err(OpacityError::OutOfRange(val))
        } else {
            Ok(Self(val))
        }
    }
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl TryFrom<f32> for Opacity {
    type Error = OpacityError;
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
impl From<Opacity> for f32 {
    fn from(value: Opacity) -> Self {
        value.get()
    }
}

// Never NaN, so equality is total.
impl Eq for Opacity {}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum OpacityError {
    #[error("opacity is not finite")]
    NotFinite,
    #[error("opacity {0} is outside 0.0..=1.0")]
    OutOfRange(f32),
}

#[cfg(test)]
mod test {
    use super::{Opacity, OpacityError};

    #[test]
    fn accepts_bounds() {
        assert_eq!(Opacity::new(0.0), Ok(Opacity::TRANSPARENT));
        assert_eq!(Opacity::new(1.0), Ok(Opacity::OPAQUE));
        assert_eq!(Opacity::new(0.25).map(Opacity::get), Ok(0.25));
    }
    #[test]
    fn rejects_bad_values() {
        assert_eq!(Opacity::new(f32::NAN), Err(OpacityError::NotFinite));
        assert_eq!(Opacity::new(f32::INFINITY), Err(OpacityError::NotFinite));
        assert_eq!(Opacity::new(1.5), Err(OpacityError::OutOfRange(1.5)));
        assert_eq!(Opacity::new(-0.1), Err(OpacityError::OutOfRange(-0.1)));
    }
}
