//! An open connection to a controller and the command/reply exchange over it.
//!
//! The protocol has no message framing or request IDs. A reply is whatever a
//! single read returns after a command is sent, so any stale bytes left over
//! from an earlier exchange are drained before each command is transmitted.

use crate::{
	backend::{Backend, IoMode, UNKNOWN_BACKEND_NAME},
	error::{ReservedCharacterError, XenaxError},
	mode_guard::ModeGuard,
	response::{decode, Response},
};
use std::{fmt::Display, io, time::Duration};

/// The maximum number of bytes read for a reply, and per read while draining.
pub const READ_CHUNK_SIZE: usize = 1024;

/// The character terminating every command.
pub const CARRIAGE_RETURN: u8 = b'\r';

/// One connection to a controller.
///
/// A port is created by [`Xenax::connect`](crate::Xenax::connect) and owned by
/// the client until [`Xenax::disconnect`](crate::Xenax::disconnect). It is
/// meant for serialized use from a single thread; wrap the client in a mutex
/// to share it.
pub struct Port<B> {
	/// The underlying backend
	backend: B,
	/// The mode every exchange is performed in.
	exchange_mode: IoMode,
	/// The per-read timeout used while draining stale data.
	drain_timeout: Duration,
	/// If populated, the error that has "poisoned" the port. This error MUST be
	/// reported before the port is used for communication again.
	///
	/// A port becomes "poisoned" when a [`ModeGuard`] cannot restore the
	/// original mode in its Drop implementation. Rather than panicking, the
	/// error is reported at the next attempt to communicate over the port.
	poison: Option<io::Error>,
}

impl<B: Backend> std::fmt::Debug for Port<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Port")
			.field("name", &self.backend.name())
			.finish_non_exhaustive()
	}
}

impl<B: Backend> Port<B> {
	/// Create a `Port` from a [`Backend`] type.
	///
	/// Exchanges are performed in blocking mode, giving up on a reply after
	/// `read_timeout` (never, if `None`).
	pub(crate) fn from_backend(
		backend: B,
		read_timeout: Option<Duration>,
		drain_timeout: Duration,
	) -> Self {
		Port {
			backend,
			exchange_mode: IoMode::blocking(read_timeout),
			drain_timeout,
			poison: None,
		}
	}

	/// Check if the port is poisoned and report the error if it exists.
	fn check_poisoned(&mut self) -> Result<(), io::Error> {
		if let Some(poison) = self.poison.take() {
			Err(poison)
		} else {
			Ok(())
		}
	}

	/// Send a command and read its reply.
	///
	/// The exchange is performed in blocking mode, whatever the port's current
	/// mode, and the current mode is restored afterwards, even on error. Any
	/// unread data is drained before the command is sent.
	///
	/// Failing to transmit the command is an error. Failing to read the reply
	/// is not: it is recorded in the returned [`Response`].
	///
	/// ## Example
	///
	/// ```rust
	/// # use xenax::{backend::Backend, port::Port, command};
	/// # fn wrapper<B: Backend>(port: &mut Port<B>) -> Result<(), Box<dyn std::error::Error>> {
	/// let position = port.command(command::TELL_POSITION)?;
	/// println!("{}", position.as_str());
	/// # Ok(())
	/// # }
	/// ```
	pub fn command<C: Display>(&mut self, command: C) -> Result<Response, XenaxError> {
		self.check_poisoned()?;

		let text = command.to_string();
		if text.contains(['\r', '\n']) {
			return Err(ReservedCharacterError::new(text).into());
		}

		let mode = self.exchange_mode;
		let mut guard = self.mode_guard(mode)?;
		guard.clear_buffer()?;
		guard.transmit(&text)?;
		Ok(guard.receive())
	}

	/// Write the command and its terminating carriage return.
	fn transmit(&mut self, command: &str) -> Result<(), io::Error> {
		self.check_poisoned()?;

		let mut buffer = Vec::with_capacity(command.len() + 1);
		buffer.extend_from_slice(command.as_bytes());
		buffer.push(CARRIAGE_RETURN);
		log::debug!("{} TX:   {}", self.backend_name(), command);
		self.backend.write_all(&buffer)?;
		self.backend.flush()
	}

	/// Perform a single read and decode it as a reply.
	fn receive(&mut self) -> Response {
		let mut buffer = [0u8; READ_CHUNK_SIZE];
		let result = loop {
			match self.backend.read(&mut buffer) {
				Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
				result => break result,
			}
		};
		match result {
			Ok(n) => {
				let text = decode(&buffer[..n]);
				log::debug!("{} RECV: {}", self.backend_name(), text);
				Response::received(text)
			}
			Err(e) => {
				log::warn!("{} failed to read reply: {}", self.backend_name(), e);
				Response::read_failure(e)
			}
		}
	}

	/// Discard any data waiting to be read.
	///
	/// Reads are performed with the drain timeout until one returns no data
	/// (the peer closed the connection) or times out (nothing more is
	/// waiting). The original mode is restored afterwards. This is a best
	/// effort: data arriving after the timeout is not drained.
	///
	/// On success, the number of bytes discarded is returned.
	pub fn clear_buffer(&mut self) -> Result<usize, io::Error> {
		self.check_poisoned()?;

		let timeout = self.drain_timeout;
		let mut guard = self.mode_guard(IoMode::blocking(Some(timeout)))?;
		let mut buffer = [0u8; READ_CHUNK_SIZE];
		let mut discarded = 0;
		loop {
			match guard.backend.read(&mut buffer) {
				Ok(0) => break,
				Ok(n) => {
					log::trace!(
						"{} DISCARD: {}",
						guard.backend_name(),
						String::from_utf8_lossy(&buffer[..n]).trim_end()
					);
					discarded += n;
				}
				// Real sockets report an elapsed timeout as either kind.
				Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
					break
				}
				Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
				Err(e) => return Err(e),
			}
		}
		Ok(discarded)
	}

	/// Set the port's mode and return a [`ModeGuard`] that will restore the
	/// original mode when dropped.
	///
	/// If the original mode cannot be restored, the port is poisoned and the
	/// error is reported by the next operation on the port.
	///
	/// ## Example
	///
	/// ```
	/// # use xenax::{backend::{Backend, IoMode}, port::Port};
	/// # use std::time::Duration;
	/// # fn wrapper<B: Backend>(port: &mut Port<B>) -> Result<(), Box<dyn std::error::Error>> {
	/// {
	///     let mut guard = port.mode_guard(IoMode::blocking(Some(Duration::from_secs(30))))?;
	///     guard.command("HORM")?;
	///     // The guard is dropped here and the original mode restored.
	/// }
	/// # Ok(())
	/// # }
	/// ```
	pub fn mode_guard(&mut self, mode: IoMode) -> Result<ModeGuard<'_, B, Self>, io::Error> {
		self.check_poisoned()?;

		ModeGuard::new(self, mode)
	}

	/// Set the port's mode, returning the previous mode.
	pub fn set_io_mode(&mut self, mode: IoMode) -> Result<IoMode, io::Error> {
		self.check_poisoned()?;

		let old = self.backend.io_mode()?;
		self.backend.set_io_mode(mode)?;
		Ok(old)
	}

	/// Get the port's mode.
	pub fn io_mode(&self) -> Result<IoMode, io::Error> {
		self.backend.io_mode()
	}

	/// Set the mode used for exchanges, returning the previous one.
	///
	/// Only the read timeout can be chosen; exchanges always block.
	pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Option<Duration> {
		std::mem::replace(&mut self.exchange_mode, IoMode::blocking(timeout)).read_timeout
	}

	/// Get the read timeout used for exchanges.
	pub fn read_timeout(&self) -> Option<Duration> {
		self.exchange_mode.read_timeout
	}

	/// Get the name of the underlying backend.
	pub fn name(&self) -> Option<String> {
		self.backend.name()
	}

	fn backend_name(&self) -> String {
		self.backend
			.name()
			.unwrap_or_else(|| UNKNOWN_BACKEND_NAME.to_string())
	}

	/// Shut down the connection and consume the port.
	///
	/// A pending poisoning error is dropped: the port can no longer be used.
	pub(crate) fn close(mut self) -> Result<(), io::Error> {
		log::debug!("{} CLOSE", self.backend_name());
		self.backend.shutdown()
	}
}

impl<B: Backend> crate::mode_guard::Port<B> for Port<B> {
	fn backend_mut(&mut self) -> &mut B {
		&mut self.backend
	}
	fn poison(&mut self, e: io::Error) {
		self.poison = Some(e);
	}
}

#[cfg(test)]
mod test;
