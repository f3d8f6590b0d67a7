//! Types defining the different options when creating a client.

#[cfg(any(test, feature = "mock"))]
use crate::backend::Mock;
use crate::{
    backend::{Backend, Tcp},
    error::{AccelerationOutOfRangeError, SpeedOutOfRangeError, XenaxError, ZeroTimeoutError},
    Xenax, ACCELERATION_RANGE, DEFAULT_ACCELERATION, DEFAULT_DRAIN_TIMEOUT, DEFAULT_PORT,
    DEFAULT_SETTLE_DELAY, DEFAULT_SPEED, SPEED_RANGE,
};
use std::time::Duration;

/// Options for configuring a [`Xenax`] client.
///
/// Opening a client only validates the options. No connection is made until
/// [`Xenax::connect`] is called.
///
/// ## Example
///
/// ```rust
/// # use xenax::OpenOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let rail = OpenOptions::new()
///     .port(10002)
///     .limit_right(100_000)
///     .read_timeout(Some(Duration::from_secs(2)))
///     .open("192.168.2.100")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// The controller's TCP port
    pub(super) port: u16,
    /// The minimum legal position
    pub(super) limit_left: i64,
    /// The maximum legal position
    pub(super) limit_right: Option<i64>,
    /// The initial speed
    pub(super) speed: i64,
    /// The initial acceleration
    pub(super) acceleration: i64,
    /// The pause after each initialization command
    pub(super) settle_delay: Duration,
    /// The per-read timeout while draining stale data
    pub(super) drain_timeout: Duration,
    /// The timeout for reading a reply
    pub(super) read_timeout: Option<Duration>,
    /// The timeout for establishing the connection
    pub(super) connect_timeout: Option<Duration>,
}

impl OpenOptions {
    /// Create a blank set of options ready for configuration.
    ///
    /// The defaults are port [`DEFAULT_PORT`], a left limit of 0, no right
    /// limit, [`DEFAULT_SPEED`], [`DEFAULT_ACCELERATION`],
    /// [`DEFAULT_SETTLE_DELAY`], and [`DEFAULT_DRAIN_TIMEOUT`]. Reading a
    /// reply and connecting never time out.
    ///
    /// Equivalent to [`default`](OpenOptions::default).
    pub fn new() -> Self {
        OpenOptions {
            port: DEFAULT_PORT,
            limit_left: 0,
            limit_right: None,
            speed: DEFAULT_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            settle_delay: DEFAULT_SETTLE_DELAY,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            read_timeout: None,
            connect_timeout: None,
        }
    }

    /// Set the controller's TCP port.
    ///
    /// The default is [`DEFAULT_PORT`].
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = port;
        self
    }

    /// Set the left travel limit.
    ///
    /// The default is 0.
    pub fn limit_left(&mut self, position: i64) -> &mut Self {
        self.limit_left = position;
        self
    }

    /// Set the right travel limit.
    ///
    /// There is no default: absolute moves are refused until it is set.
    pub fn limit_right(&mut self, position: i64) -> &mut Self {
        self.limit_right = Some(position);
        self
    }

    /// Set the initial speed, sent to the controller when connecting.
    ///
    /// It must be in [`SPEED_RANGE`]. The default is [`DEFAULT_SPEED`].
    pub fn speed(&mut self, speed: i64) -> &mut Self {
        self.speed = speed;
        self
    }

    /// Set the initial acceleration, sent to the controller when connecting.
    ///
    /// It must be in [`ACCELERATION_RANGE`]. The default is
    /// [`DEFAULT_ACCELERATION`].
    pub fn acceleration(&mut self, acceleration: i64) -> &mut Self {
        self.acceleration = acceleration;
        self
    }

    /// Set the pause after each initialization command.
    ///
    /// The default is [`DEFAULT_SETTLE_DELAY`].
    pub fn settle_delay(&mut self, delay: Duration) -> &mut Self {
        self.settle_delay = delay;
        self
    }

    /// Set the per-read timeout used when draining stale data before each
    /// command.
    ///
    /// It must not be zero. The default is [`DEFAULT_DRAIN_TIMEOUT`].
    pub fn drain_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.drain_timeout = timeout;
        self
    }

    /// Set a custom read timeout for replies.
    ///
    /// If duration is `None`, reads will block indefinitely. This is the default.
    /// It must not be zero.
    pub fn read_timeout(&mut self, duration: Option<Duration>) -> &mut Self {
        self.read_timeout = duration;
        self
    }

    /// Set a custom timeout for establishing the connection.
    ///
    /// If duration is `None`, the operating system's timeout applies. This is the default.
    pub fn connect_timeout(&mut self, duration: Option<Duration>) -> &mut Self {
        self.connect_timeout = duration;
        self
    }

    /// Check the options that have a legal range.
    fn validate(&self) -> Result<(), XenaxError> {
        if self.drain_timeout.is_zero() {
            return Err(ZeroTimeoutError::new("drain timeout").into());
        }
        if self.read_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ZeroTimeoutError::new("read timeout").into());
        }
        if !SPEED_RANGE.contains(&self.speed) {
            return Err(SpeedOutOfRangeError::new(self.speed).into());
        }
        if !ACCELERATION_RANGE.contains(&self.acceleration) {
            return Err(AccelerationOutOfRangeError::new(self.acceleration).into());
        }
        Ok(())
    }

    /// Create the client without validating the options.
    pub(super) fn build<B: Backend>(&self, host: &str) -> Xenax<B> {
        Xenax::from_options(host, self)
    }

    /// Create a client for the controller at `host` with the custom options.
    pub fn open(&self, host: &str) -> Result<Xenax<Tcp>, XenaxError> {
        self.validate()?;
        Ok(self.build(host))
    }

    /// Create a client for the controller at `host` with the custom options.
    ///
    /// The type of the underlying backend is erased via dynamic dispatch,
    /// which does have runtime overhead. [`OpenOptions::open`] should
    /// generally be used instead, except when the type of the underlying
    /// backend may not be known at compile time.
    pub fn open_dyn(&self, host: &str) -> Result<Xenax<Box<dyn Backend>>, XenaxError> {
        self.validate()?;
        Ok(self.build(host))
    }

    /// Create a client that will communicate over a [`Mock`] backend.
    #[cfg(any(test, feature = "mock"))]
    #[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
    pub fn open_mock(&self) -> Result<Xenax<Mock>, XenaxError> {
        self.validate()?;
        Ok(self.build("mock"))
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let rail = OpenOptions::new().open("10.0.0.2").unwrap();
        assert_eq!(rail.host(), "10.0.0.2");
        assert_eq!(rail.port_number(), 10001);
        assert_eq!(rail.address(), "10.0.0.2:10001");
        assert_eq!(rail.limit_left(), 0);
        assert_eq!(rail.limit_right(), None);
        assert_eq!(rail.speed(), 100_000);
        assert_eq!(rail.acceleration(), 1_000_000);
        assert_eq!(rail.settle_delay(), Duration::from_millis(200));
        assert!(!rail.is_connected());
        assert_eq!(rail.response(), "");
    }

    #[test]
    fn custom() {
        let rail = OpenOptions::new()
            .port(4000)
            .limit_left(-10)
            .limit_right(10)
            .speed(50)
            .acceleration(10_000_000)
            .open("::1")
            .unwrap();
        assert_eq!(rail.address(), "[::1]:4000");
        assert_eq!(rail.limit_left(), -10);
        assert_eq!(rail.limit_right(), Some(10));
        assert_eq!(rail.speed(), 50);
        assert_eq!(rail.acceleration(), 10_000_000);
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let err = OpenOptions::new().speed(49).open("host").unwrap_err();
        assert!(matches!(err, XenaxError::SpeedOutOfRange(_)));
        assert!(err.is_invalid_argument());

        let err = OpenOptions::new()
            .acceleration(99_999)
            .open_dyn("host")
            .unwrap_err();
        assert!(matches!(err, XenaxError::AccelerationOutOfRange(_)));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let err = OpenOptions::new()
            .drain_timeout(Duration::ZERO)
            .open("127.0.0.1")
            .unwrap_err();
        assert!(matches!(err, XenaxError::ZeroTimeout(ref e) if e.option() == "drain timeout"));
        assert!(err.is_invalid_argument());

        let err = OpenOptions::new()
            .read_timeout(Some(Duration::ZERO))
            .open_mock()
            .unwrap_err();
        assert!(matches!(err, XenaxError::ZeroTimeout(ref e) if e.option() == "read timeout"));

        let rail = OpenOptions::new()
            .drain_timeout(Duration::from_millis(1))
            .read_timeout(None)
            .open("127.0.0.1")
            .unwrap();
        assert!(!rail.is_connected());
    }
}
