//! Error types.
//!
//! Each error is represented by a unique type that implements [`std::error::Error`].
//! However, most APIs can fail in more than one way and so return the
//! higher level [`XenaxError`] enum. The error types are all convertible to
//! [`XenaxError`], allowing them to be used with `?`:
//!
//! ```
//! use xenax::error::{SpeedOutOfRangeError, XenaxError};
//!
//! fn foo() -> Result<(), SpeedOutOfRangeError> {
//!     // ...
//! # unimplemented!();
//! }
//!
//! fn bar() -> Result<(), XenaxError> {
//!     foo()?;
//!     // ...
//! # Ok(())
//! }
//! ```
//!
//! Failing to read a reply is deliberately *not* an error. See
//! [`Response`](crate::response::Response).

use std::{io, ops::RangeInclusive};

/// Implement Error and Display traits for the specified type.
///
/// After the type define the format string and any arguments it should
/// reference after `self =>` (to abide by macro hygiene rules).
macro_rules! impl_error_display {
    (
        $name:path,
        $self:ident =>
        $display:literal
        $(,
            $($arg:expr),+
        )?
    ) => {
        impl std::error::Error for $name {}

        impl std::fmt::Display for $name {
            fn fmt(&$self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    $display
                    $(,
                        $($arg),+
                    )?
                )
            }
        }
    };
}

/// Define error enums that contain concrete error types (not other error enums).
///
/// From and TryFrom traits will be implemented for the enum and it's underlying
/// errors. The enum's Display implementation will defer to the underlying errors'
/// Display implementations.
///
/// ```compile_fail
/// # // This fails to compile because the macro is not exported.
/// error_enum!{
///     // This defines the enum and From/TryFrom between ThisError and A and B.
///     #[non_exhaustive]
///     pub enum ThisError {
///         VariantA(A),
///         VariantB(B),
///         // ...
///     }
/// }
/// ```
macro_rules! error_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_attr:meta])*
                $variant:ident($inner:path)
            ),+
            $(,)?
        }
    ) => {
        // Define the error enum itself
        $(
            #[$attr]
        )*
        pub enum $name {
            $(
                $(#[$variant_attr])*
                $variant($inner)
            ),+
        }

        impl std::error::Error for $name {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                match self {
                    $(
                        $name::$variant(e) => std::error::Error::source(e)
                    ),+
                }
            }
        }

        // Defer the display to the inner error type
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        $name::$variant(e) => std::fmt::Display::fmt(e, f)
                    ),+
                }
            }
        }

        // Allow the enum to be convertible from an infallible error
        impl From<std::convert::Infallible> for $name {
            fn from(_: std::convert::Infallible) -> Self {
                unreachable!();
            }
        }

        // Conversions with underlying errors
        $(
            impl From<$inner> for $name {
                fn from(other: $inner) -> Self {
                    $name::$variant(other)
                }
            }

            impl TryFrom<$name> for $inner {
                type Error = $name;
                fn try_from(other: $name) -> Result<Self, Self::Error> {
                    match other {
                        $name::$variant(value) => Ok(value),
                        value => Err(value)
                    }
                }
            }
        )+
    };
}

error_enum! {
    /// Any error that can occur while configuring or talking to a controller.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum XenaxError {
        /// Sending a command, or draining stale data, failed.
        Io(io::Error),
        /// The connection to the controller could not be established.
        Connect(ConnectError),
        /// A command was issued without a connection.
        NotConnected(NotConnectedError),
        /// `connect` was called while already connected.
        AlreadyConnected(AlreadyConnectedError),
        /// The requested speed is outside the legal range.
        SpeedOutOfRange(SpeedOutOfRangeError),
        /// The requested acceleration is outside the legal range.
        AccelerationOutOfRange(AccelerationOutOfRangeError),
        /// The requested position is outside the travel limits.
        PositionOutOfLimits(PositionOutOfLimitsError),
        /// A position was requested while the right travel limit is unset.
        LimitUnset(LimitUnsetError),
        /// The requested position is not numeric.
        PositionType(PositionTypeError),
        /// The command text contains a character reserved for framing.
        ReservedCharacter(ReservedCharacterError),
        /// A timeout option was set to zero.
        ZeroTimeout(ZeroTimeoutError),
    }
}

impl XenaxError {
    /// A convenience function for determining if the error is due to the
    /// connection timing out.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            XenaxError::Io(e)
                if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
        )
    }

    /// A convenience function for determining if the error is due to an I/O
    /// error on an established connection.
    pub fn is_io(&self) -> bool {
        matches!(self, XenaxError::Io(_))
    }

    /// A convenience function for determining if the error is due to an
    /// out-of-range argument. These errors are raised before any I/O and leave
    /// the client unchanged.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            XenaxError::SpeedOutOfRange(_)
                | XenaxError::AccelerationOutOfRange(_)
                | XenaxError::PositionOutOfLimits(_)
                | XenaxError::LimitUnset(_)
                | XenaxError::ZeroTimeout(_)
        )
    }
}

/// The connection to the controller could not be established.
#[derive(Debug)]
pub struct ConnectError(Box<(Box<str>, io::Error)>);

impl ConnectError {
    pub(crate) fn new(address: &str, source: io::Error) -> Self {
        ConnectError(Box::new((address.into(), source)))
    }

    /// The address that could not be connected to.
    pub fn address(&self) -> &str {
        &self.0 .0
    }

    /// The underlying I/O error.
    pub fn io_error(&self) -> &io::Error {
        &self.0 .1
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0 .1)
    }
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not connect to {}: {}", self.0 .0, self.0 .1)
    }
}

impl From<ConnectError> for io::Error {
    /// Consume the error and return the underlying I/O error.
    fn from(other: ConnectError) -> Self {
        other.0 .1
    }
}

/// A command was issued without a connection to the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NotConnectedError;

impl_error_display! {
    NotConnectedError,
    self =>
    "not connected to a controller"
}

/// `connect` was called while a connection was already open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlreadyConnectedError(Box<str>);

impl AlreadyConnectedError {
    pub(crate) fn new(address: &str) -> Self {
        AlreadyConnectedError(address.into())
    }

    /// The address of the open connection.
    pub fn address(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    AlreadyConnectedError,
    self =>
    "already connected to {}", self.0
}

/// The requested speed is outside [`SPEED_RANGE`](crate::SPEED_RANGE).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SpeedOutOfRangeError(i64);

impl SpeedOutOfRangeError {
    pub(crate) fn new(value: i64) -> Self {
        SpeedOutOfRangeError(value)
    }

    /// The rejected speed.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl_error_display! {
    SpeedOutOfRangeError,
    self =>
    "speed {} is out of range ({})", self.0, display_range(&crate::SPEED_RANGE)
}

/// The requested acceleration is outside [`ACCELERATION_RANGE`](crate::ACCELERATION_RANGE).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AccelerationOutOfRangeError(i64);

impl AccelerationOutOfRangeError {
    pub(crate) fn new(value: i64) -> Self {
        AccelerationOutOfRangeError(value)
    }

    /// The rejected acceleration.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl_error_display! {
    AccelerationOutOfRangeError,
    self =>
    "acceleration {} is out of range ({})", self.0, display_range(&crate::ACCELERATION_RANGE)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct PositionOutOfLimitsInner {
    position: i128,
    left: i64,
    right: i64,
}

/// The requested position is outside the travel limits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionOutOfLimitsError(Box<PositionOutOfLimitsInner>);

impl PositionOutOfLimitsError {
    pub(crate) fn new(position: i128, left: i64, right: i64) -> Self {
        PositionOutOfLimitsError(Box::new(PositionOutOfLimitsInner {
            position,
            left,
            right,
        }))
    }

    /// The rejected position.
    pub fn position(&self) -> i128 {
        self.0.position
    }

    /// The left (minimum) travel limit at the time.
    pub fn left(&self) -> i64 {
        self.0.left
    }

    /// The right (maximum) travel limit at the time.
    pub fn right(&self) -> i64 {
        self.0.right
    }
}

impl_error_display! {
    PositionOutOfLimitsError,
    self =>
    "position {} is out of limits ({}..={})", self.0.position, self.0.left, self.0.right
}

/// A position was requested but the right travel limit has not been set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LimitUnsetError;

impl_error_display! {
    LimitUnsetError,
    self =>
    "the right position limit is not set"
}

/// The requested position is NaN or infinite.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionTypeError(Box<str>);

impl PositionTypeError {
    pub(crate) fn new<S: Into<Box<str>>>(value: S) -> Self {
        PositionTypeError(value.into())
    }

    /// A description of the rejected value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    PositionTypeError,
    self =>
    "position must be an integer, got {:?}", self.0
}

/// The command contains a carriage return or line feed, which would split it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReservedCharacterError(Box<str>);

impl ReservedCharacterError {
    pub(crate) fn new<S: Into<Box<str>>>(command: S) -> Self {
        ReservedCharacterError(command.into())
    }

    /// The offending command text.
    pub fn command(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    ReservedCharacterError,
    self =>
    "command {:?} contains a reserved character", self.0
}

/// A timeout option was set to zero, which sockets do not accept.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ZeroTimeoutError(&'static str);

impl ZeroTimeoutError {
    pub(crate) fn new(option: &'static str) -> Self {
        ZeroTimeoutError(option)
    }

    /// The name of the offending option.
    pub fn option(&self) -> &'static str {
        self.0
    }
}

impl_error_display! {
    ZeroTimeoutError,
    self =>
    "{} must not be zero", self.0
}

fn display_range(range: &RangeInclusive<i64>) -> String {
    format!("{}..={}", range.start(), range.end())
}

#[cfg(test)]
mod test {
    use super::*;
    use static_assertions::{assert_impl_all, const_assert};

    // Make sure the error enum is at most 3 words large (the same size as a String).
    // This will minimize the size of Result<R, XenaxError>.
    const _WORD_SIZE: usize = std::mem::size_of::<&usize>();
    const_assert!(std::mem::size_of::<XenaxError>() <= 3 * _WORD_SIZE);

    // Make sure that error types are properly convertible
    assert_impl_all!(XenaxError: From<io::Error>, Send, Sync, std::error::Error);
    assert_impl_all!(XenaxError: From<ConnectError>, From<NotConnectedError>);
    assert_impl_all!(XenaxError: From<SpeedOutOfRangeError>, From<AccelerationOutOfRangeError>);
    assert_impl_all!(XenaxError: From<PositionOutOfLimitsError>, From<PositionTypeError>);
    assert_impl_all!(XenaxError: From<LimitUnsetError>, From<ReservedCharacterError>);
    assert_impl_all!(XenaxError: From<ZeroTimeoutError>);
    assert_impl_all!(io::Error: TryFrom<XenaxError>, From<ConnectError>);
    assert_impl_all!(PositionTypeError: TryFrom<XenaxError>);

    #[test]
    fn invalid_argument_grouping() {
        assert!(XenaxError::from(SpeedOutOfRangeError::new(1)).is_invalid_argument());
        assert!(XenaxError::from(AccelerationOutOfRangeError::new(1)).is_invalid_argument());
        assert!(XenaxError::from(PositionOutOfLimitsError::new(-1, 0, 10)).is_invalid_argument());
        assert!(XenaxError::from(LimitUnsetError).is_invalid_argument());
        assert!(XenaxError::from(ZeroTimeoutError::new("drain timeout")).is_invalid_argument());
        assert!(!XenaxError::from(PositionTypeError::new("abc")).is_invalid_argument());
        assert!(!XenaxError::from(NotConnectedError).is_invalid_argument());
    }

    #[test]
    fn timeouts() {
        let err = XenaxError::from(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(err.is_timeout());
        assert!(err.is_io());
        let err = XenaxError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn display() {
        assert_eq!(
            SpeedOutOfRangeError::new(49).to_string(),
            "speed 49 is out of range (50..=10000000)"
        );
        assert_eq!(
            AccelerationOutOfRangeError::new(0).to_string(),
            "acceleration 0 is out of range (100000..=10000000)"
        );
        assert_eq!(
            PositionOutOfLimitsError::new(10001, 0, 10000).to_string(),
            "position 10001 is out of limits (0..=10000)"
        );
        let err = ConnectError::new(
            "10.0.0.1:10001",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(err.to_string(), "could not connect to 10.0.0.1:10001: refused");
        assert_eq!(err.address(), "10.0.0.1:10001");
        assert_eq!(
            ZeroTimeoutError::new("read timeout").to_string(),
            "read timeout must not be zero"
        );
    }

    #[test]
    fn try_from_round_trip() {
        let err = XenaxError::from(PositionTypeError::new("abc"));
        let err = io::Error::try_from(err).unwrap_err();
        let err = PositionTypeError::try_from(err).unwrap();
        assert_eq!(err.value(), "abc");
    }
}
