//! The client for a single Xenax controller.

mod options;

#[cfg(any(test, feature = "mock"))]
use crate::backend::Mock;
use crate::{
	backend::{Backend, Tcp},
	command::{self, Command},
	error::{
		AccelerationOutOfRangeError, AlreadyConnectedError, ConnectError, LimitUnsetError,
		NotConnectedError, PositionOutOfLimitsError, SpeedOutOfRangeError, XenaxError,
	},
	port::Port,
	position::IntoPosition,
	response::Response,
};
pub use options::*;
use std::{fmt::Display, ops::RangeInclusive, time::Duration};

/// The TCP port controllers listen on by default: 10,001.
pub const DEFAULT_PORT: u16 = 10001;

/// The legal range of speeds.
pub const SPEED_RANGE: RangeInclusive<i64> = 50..=10_000_000;

/// The legal range of accelerations.
pub const ACCELERATION_RANGE: RangeInclusive<i64> = 100_000..=10_000_000;

/// The speed used unless configured otherwise.
pub const DEFAULT_SPEED: i64 = 100_000;

/// The acceleration used unless configured otherwise.
pub const DEFAULT_ACCELERATION: i64 = 1_000_000;

/// The pause after each initialization command, giving the controller time
/// to process it before the next one is sent.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// The per-read timeout used when draining stale data before a command.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(100);

/// A client for one Xenax linear motor controller.
///
/// The client holds the motion parameters and travel limits, and owns the
/// connection to the controller between [`connect`](Xenax::connect) and
/// [`disconnect`](Xenax::disconnect). Every operation is a complete blocking
/// command/reply exchange on the calling thread. The client is not meant to
/// be used from several threads at once; wrap it in a mutex if it must be
/// shared.
///
/// ## Example
///
/// ```rust
/// # use xenax::Xenax;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let mut rail = Xenax::open_options()
///     .limit_right(250_000)
///     .speed(200_000)
///     .open("192.168.2.100")?;
/// rail.connect()?;
/// rail.set_position(rail.center_position().unwrap())?;
/// println!("now at {}", rail.get_position()?);
/// rail.disconnect()?;
/// # Ok(())
/// # }
/// ```
pub struct Xenax<B = Tcp> {
	/// The controller's host name or IP address.
	host: String,
	/// The controller's TCP port.
	port_number: u16,
	/// The minimum legal position.
	limit_left: i64,
	/// The maximum legal position, if known.
	limit_right: Option<i64>,
	speed: i64,
	acceleration: i64,
	settle_delay: Duration,
	drain_timeout: Duration,
	read_timeout: Option<Duration>,
	connect_timeout: Option<Duration>,
	/// The open connection, if any.
	port: Option<Port<B>>,
	/// The outcome of the most recent exchange.
	last_response: Response,
}

impl<B: Backend> std::fmt::Debug for Xenax<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Xenax")
			.field("address", &self.address())
			.field("limit_left", &self.limit_left)
			.field("limit_right", &self.limit_right)
			.field("speed", &self.speed)
			.field("acceleration", &self.acceleration)
			.field("port", &self.port)
			.finish_non_exhaustive()
	}
}

impl Xenax<Tcp> {
	/// Create a client for the controller at `host` using the default options.
	///
	/// No connection is made until [`connect`](Xenax::connect) is called.
	/// Alternatively, use [`Xenax::open_options`] to customize the client.
	pub fn new(host: &str) -> Xenax<Tcp> {
		OpenOptions::new().build(host)
	}

	/// Get an [`OpenOptions`] to customize the client.
	pub fn open_options() -> OpenOptions {
		OpenOptions::default()
	}

	/// Connect to the controller and initialize it.
	///
	/// See [`initialize`](Xenax::initialize) for the commands sent. If
	/// initialization fails the connection is kept open so that it can be
	/// retried or closed with [`disconnect`](Xenax::disconnect).
	///
	/// Connecting again after [`disconnect`](Xenax::disconnect) opens a new
	/// connection.
	pub fn connect(&mut self) -> Result<(), XenaxError> {
		let backend = self.open_tcp()?;
		self.connect_with(backend)
	}
}

impl Xenax<Box<dyn Backend>> {
	/// Connect to the controller and initialize it.
	///
	/// See [`Xenax::<Tcp>::connect`](Xenax::connect).
	pub fn connect(&mut self) -> Result<(), XenaxError> {
		let backend = self.open_tcp()?;
		self.connect_with(Box::new(backend))
	}
}

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
impl Xenax<Mock> {
	/// Attach a clone of `mock` as the connection and initialize the
	/// "controller".
	pub fn connect_mock(&mut self, mock: &Mock) -> Result<(), XenaxError> {
		self.connect_with(mock.clone())
	}
}

impl<B: Backend> Xenax<B> {
	/// Create a `Xenax` from validated options.
	pub(crate) fn from_options(host: &str, options: &OpenOptions) -> Self {
		Xenax {
			host: host.to_string(),
			port_number: options.port,
			limit_left: options.limit_left,
			limit_right: options.limit_right,
			speed: options.speed,
			acceleration: options.acceleration,
			settle_delay: options.settle_delay,
			drain_timeout: options.drain_timeout,
			read_timeout: options.read_timeout,
			connect_timeout: options.connect_timeout,
			port: None,
			last_response: Response::default(),
		}
	}

	/// Report an error if a connection is already open.
	fn check_not_connected(&self) -> Result<(), AlreadyConnectedError> {
		if self.port.is_some() {
			Err(AlreadyConnectedError::new(&self.address()))
		} else {
			Ok(())
		}
	}

	/// Open a TCP connection to the controller.
	fn open_tcp(&self) -> Result<Tcp, XenaxError> {
		self.check_not_connected()?;

		let address = self.address();
		let backend = Tcp::connect((self.host.as_str(), self.port_number), self.connect_timeout)
			.map_err(|e| ConnectError::new(&address, e))?;
		log::info!("connected to {address}");
		Ok(backend)
	}

	/// Use `backend` as the connection to the controller and initialize it.
	///
	/// This is what [`connect`](Xenax::connect) does once the TCP connection
	/// is open.
	pub fn connect_with(&mut self, backend: B) -> Result<(), XenaxError> {
		self.check_not_connected()?;

		self.port = Some(Port::from_backend(
			backend,
			self.read_timeout,
			self.drain_timeout,
		));
		self.initialize()
	}

	/// Prepare the controller for motion commands.
	///
	/// The commands in [`command::INITIALIZATION`] (echo off, power on,
	/// events on, home, events off) are sent in that order, each followed by
	/// the settle delay. The client's speed and acceleration are then sent so
	/// the controller matches them, even if they were set before connecting.
	///
	/// The settle delay is the only synchronization: replies are not checked.
	pub fn initialize(&mut self) -> Result<(), XenaxError> {
		for command in command::INITIALIZATION {
			self.send_command(command)?;
			std::thread::sleep(self.settle_delay);
		}
		self.set_speed(self.speed)?;
		self.set_acceleration(self.acceleration)
	}

	/// Power off the controller and close the connection.
	///
	/// The connection is closed even if sending the power off command fails,
	/// in which case that error is returned.
	pub fn disconnect(&mut self) -> Result<(), XenaxError> {
		let mut port = self.port.take().ok_or(NotConnectedError)?;
		let address = self.address();

		let powered_off = port.command(command::POWER_OFF);
		let closed = port.close();
		log::info!("disconnected from {address}");

		match (powered_off, closed) {
			(Ok(response), closed) => {
				self.last_response = response;
				closed.map_err(Into::into)
			}
			(Err(err), closed) => {
				if let Err(close_err) = closed {
					log::warn!("failed to close connection to {address}: {close_err}");
				}
				Err(err)
			}
		}
	}

	/// Send a command and return the decoded reply.
	///
	/// Any data waiting to be read is discarded first. Failing to send the
	/// command is an error, but failing to read the reply is not: the reply
	/// is then empty and [`last_response`](Xenax::last_response) records the
	/// failure.
	///
	/// ## Example
	///
	/// ```rust
	/// # use xenax::{backend::Backend, Xenax};
	/// # fn wrapper<B: Backend>(mut rail: Xenax<B>) -> Result<(), Box<dyn std::error::Error>> {
	/// let reply = rail.send_command("TP")?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn send_command<C: Display>(&mut self, command: C) -> Result<&str, XenaxError> {
		let port = self.port.as_mut().ok_or(NotConnectedError)?;
		self.last_response = port.command(command)?;
		Ok(self.last_response.as_str())
	}

	/// The most recent reply, or an empty string if reading it failed.
	pub fn response(&self) -> &str {
		self.last_response.as_str()
	}

	/// The outcome of the most recent exchange, which distinguishes an empty
	/// reply from a failed read.
	pub fn last_response(&self) -> &Response {
		&self.last_response
	}

	/// Set the speed.
	///
	/// The value must be in [`SPEED_RANGE`]. If connected, it is sent to the
	/// controller, otherwise it is sent when connecting.
	pub fn set_speed(&mut self, value: i64) -> Result<(), XenaxError> {
		if !SPEED_RANGE.contains(&value) {
			return Err(SpeedOutOfRangeError::new(value).into());
		}
		self.speed = value;
		self.send_if_connected(command::set_speed(value))
	}

	/// Get the speed.
	pub fn speed(&self) -> i64 {
		self.speed
	}

	/// Set the acceleration.
	///
	/// The value must be in [`ACCELERATION_RANGE`]. If connected, it is sent to
	/// the controller, otherwise it is sent when connecting.
	pub fn set_acceleration(&mut self, value: i64) -> Result<(), XenaxError> {
		if !ACCELERATION_RANGE.contains(&value) {
			return Err(AccelerationOutOfRangeError::new(value).into());
		}
		self.acceleration = value;
		self.send_if_connected(command::set_acceleration(value))
	}

	/// Get the acceleration.
	pub fn acceleration(&self) -> i64 {
		self.acceleration
	}

	fn send_if_connected(&mut self, command: Command) -> Result<(), XenaxError> {
		if self.port.is_some() {
			self.send_command(command)?;
		}
		Ok(())
	}

	/// Move to an absolute position.
	///
	/// The position is converted with [`IntoPosition`] (floating point values
	/// are truncated) and must lie within the travel limits.
	///
	/// ## Example
	///
	/// ```rust
	/// # use xenax::{backend::Backend, Xenax};
	/// # fn wrapper<B: Backend>(mut rail: Xenax<B>) -> Result<(), Box<dyn std::error::Error>> {
	/// rail.set_position(5000)?;
	/// rail.set_position(2500.5)?; // moves to 2500
	/// # Ok(())
	/// # }
	/// ```
	pub fn set_position<P: IntoPosition>(&mut self, value: P) -> Result<(), XenaxError> {
		let position = value.into_position()?;
		let left = self.limit_left;
		let right = self.limit_right.ok_or(LimitUnsetError)?;
		let in_limits = i128::from(left) <= position && position <= i128::from(right);
		match i64::try_from(position) {
			Ok(position) if in_limits => {
				self.send_command(command::go_to(position))?;
				Ok(())
			}
			_ => Err(PositionOutOfLimitsError::new(position, left, right).into()),
		}
	}

	/// Query the current position.
	///
	/// The reply is returned as is. It is empty if reading it failed.
	pub fn get_position(&mut self) -> Result<String, XenaxError> {
		self.send_command(command::TELL_POSITION).map(str::to_string)
	}

	/// Start moving in the positive direction.
	pub fn jog_positive(&mut self) -> Result<(), XenaxError> {
		self.send_command(command::JOG_POSITIVE)?;
		Ok(())
	}

	/// Start moving in the negative direction.
	pub fn jog_negative(&mut self) -> Result<(), XenaxError> {
		self.send_command(command::JOG_NEGATIVE)?;
		Ok(())
	}

	/// Power on the motor.
	pub fn power_on(&mut self) -> Result<(), XenaxError> {
		self.send_command(command::POWER_ON)?;
		Ok(())
	}

	/// Power off the motor.
	pub fn power_off(&mut self) -> Result<(), XenaxError> {
		self.send_command(command::POWER_OFF)?;
		Ok(())
	}

	/// The left travel limit.
	pub fn limit_left(&self) -> i64 {
		self.limit_left
	}

	/// Set the left travel limit.
	///
	/// The limits are not checked against each other.
	pub fn set_limit_left(&mut self, value: i64) {
		self.limit_left = value;
	}

	/// The right travel limit, if set.
	pub fn limit_right(&self) -> Option<i64> {
		self.limit_right
	}

	/// Set or clear the right travel limit.
	///
	/// The limits are not checked against each other.
	pub fn set_limit_right<T: Into<Option<i64>>>(&mut self, value: T) {
		self.limit_right = value.into();
	}

	/// The minimum legal position, i.e., the left travel limit.
	pub fn min_position(&self) -> i64 {
		self.limit_left()
	}

	/// Set the minimum legal position, i.e., the left travel limit.
	pub fn set_min_position(&mut self, value: i64) {
		self.set_limit_left(value);
	}

	/// The maximum legal position, i.e., the right travel limit.
	pub fn max_position(&self) -> Option<i64> {
		self.limit_right()
	}

	/// Set or clear the maximum legal position, i.e., the right travel limit.
	pub fn set_max_position<T: Into<Option<i64>>>(&mut self, value: T) {
		self.set_limit_right(value);
	}

	/// The position halfway between the limits, rounded down.
	///
	/// Returns `None` while the right limit is unset.
	pub fn center_position(&self) -> Option<i64> {
		let right = self.limit_right?;
		let center = (i128::from(self.limit_left) + i128::from(right)).div_euclid(2);
		// The mean of two i64s is always an i64.
		i64::try_from(center).ok()
	}

	/// The controller's host name or IP address.
	pub fn host(&self) -> &str {
		&self.host
	}

	/// The controller's TCP port.
	pub fn port_number(&self) -> u16 {
		self.port_number
	}

	/// The controller's address, formatted as `host:port`.
	pub fn address(&self) -> String {
		if self.host.contains(':') {
			format!("[{}]:{}", self.host, self.port_number)
		} else {
			format!("{}:{}", self.host, self.port_number)
		}
	}

	/// The pause after each initialization command.
	pub fn settle_delay(&self) -> Duration {
		self.settle_delay
	}

	/// Whether a connection is open.
	pub fn is_connected(&self) -> bool {
		self.port.is_some()
	}

	/// The open connection, if any.
	pub fn port(&self) -> Option<&Port<B>> {
		self.port.as_ref()
	}
}
