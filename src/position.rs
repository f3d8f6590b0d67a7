//! Conversion of requested positions to the controller's integer domain.
//!
//! Positions are integers on the wire. [`IntoPosition`] makes the conversion
//! explicit at the call boundary:
//!
//!  * integers are taken as is,
//!  * floating point values are truncated toward zero, and NaN or infinite
//!    values are rejected.
//!
//! Nothing else implements the trait, so text and other non-numeric values
//! are rejected when compiling rather than parsed at run time.
//!
//! Values outside the range of `i128` saturate and are then rejected by the
//! limit check, so they never wrap around into the legal range.

use crate::error::PositionTypeError;

/// Types that can be converted into an absolute position.
pub trait IntoPosition: private::Sealed {
    /// Convert the value into an absolute position.
    fn into_position(self) -> Result<i128, PositionTypeError>;
}

macro_rules! impl_lossless {
    ($($t:ty),+ $(,)?) => {
        $(
            impl IntoPosition for $t {
                fn into_position(self) -> Result<i128, PositionTypeError> {
                    Ok(i128::from(self))
                }
            }
            impl private::Sealed for $t {}
        )+
    };
}

macro_rules! impl_saturating {
    ($($t:ty),+ $(,)?) => {
        $(
            impl IntoPosition for $t {
                fn into_position(self) -> Result<i128, PositionTypeError> {
                    Ok(i128::try_from(self).unwrap_or(i128::MAX))
                }
            }
            impl private::Sealed for $t {}
        )+
    };
}

impl_lossless!(i8, i16, i32, i64, i128, u8, u16, u32, u64);
impl_saturating!(u128, usize);

impl IntoPosition for isize {
    fn into_position(self) -> Result<i128, PositionTypeError> {
        // isize is at most 64 bits on every supported platform.
        Ok(i128::try_from(self).unwrap_or(if self < 0 { i128::MIN } else { i128::MAX }))
    }
}
impl private::Sealed for isize {}

impl IntoPosition for f64 {
    #[allow(clippy::cast_possible_truncation)]
    fn into_position(self) -> Result<i128, PositionTypeError> {
        if self.is_finite() {
            // Float to int casts saturate.
            Ok(self.trunc() as i128)
        } else {
            Err(PositionTypeError::new(format!("{self}")))
        }
    }
}
impl private::Sealed for f64 {}

impl IntoPosition for f32 {
    fn into_position(self) -> Result<i128, PositionTypeError> {
        f64::from(self).into_position()
    }
}
impl private::Sealed for f32 {}

mod private {
    pub trait Sealed {}
}

#[cfg(test)]
mod test {
    use super::*;
    use static_assertions::assert_not_impl_any;

    #[test]
    fn integers() {
        assert_eq!(5000i32.into_position(), Ok(5000));
        assert_eq!((-1i64).into_position(), Ok(-1));
        assert_eq!(u64::MAX.into_position(), Ok(i128::from(u64::MAX)));
        assert_eq!(u128::MAX.into_position(), Ok(i128::MAX));
        assert_eq!(7usize.into_position(), Ok(7));
        assert_eq!((-7isize).into_position(), Ok(-7));
    }

    #[test]
    fn floats_truncate_toward_zero() {
        assert_eq!(5000.9f64.into_position(), Ok(5000));
        assert_eq!((-0.5f64).into_position(), Ok(0));
        assert_eq!((-1.7f32).into_position(), Ok(-1));
        assert_eq!(1e300f64.into_position(), Ok(i128::MAX));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        assert!(f64::NAN.into_position().is_err());
        assert!(f64::INFINITY.into_position().is_err());
        assert!(f32::NEG_INFINITY.into_position().is_err());
    }

    #[test]
    fn text_is_not_a_position() {
        assert_not_impl_any!(&str: IntoPosition);
        assert_not_impl_any!(String: IntoPosition);
        assert_not_impl_any!(char: IntoPosition);
        assert_not_impl_any!(bool: IntoPosition);
    }
}
