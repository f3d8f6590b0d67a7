//! Types that can exchange (read/write) bytes with a connected controller.
//!
//! The [`Backend`] trait represents all such types.

use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// The placeholder name for a backend that doesn't have a name.
pub(crate) const UNKNOWN_BACKEND_NAME: &str = "<unknown backend>";

/// How reads on a backend behave when no data is ready.
///
/// A backend is either non-blocking, in which case reads return
/// [`WouldBlock`](io::ErrorKind::WouldBlock) immediately, or blocking, in which
/// case reads wait for at most `read_timeout` (forever if `None`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IoMode {
	/// Whether reads return immediately when no data is available.
	pub nonblocking: bool,
	/// The read timeout applied while blocking.
	pub read_timeout: Option<Duration>,
}

impl IoMode {
	/// Blocking reads that wait indefinitely.
	pub const BLOCKING: IoMode = IoMode {
		nonblocking: false,
		read_timeout: None,
	};

	/// Blocking reads that give up after `timeout`.
	///
	/// If `timeout` is `None`, reads will block indefinitely.
	pub const fn blocking(timeout: Option<Duration>) -> Self {
		IoMode {
			nonblocking: false,
			read_timeout: timeout,
		}
	}
}

impl Default for IoMode {
	fn default() -> Self {
		IoMode::BLOCKING
	}
}

/// Types that allow reading and writing bytes with a connected controller.
pub trait Backend: io::Read + io::Write + private::Sealed {
	/// Set the read mode.
	fn set_io_mode(&mut self, mode: IoMode) -> Result<(), io::Error>;

	/// Get the read mode.
	fn io_mode(&self) -> Result<IoMode, io::Error>;

	/// Shut down both halves of the connection.
	///
	/// The backend must not be used for communication afterwards.
	fn shutdown(&mut self) -> Result<(), io::Error>;

	/// Get the "name" of the backend.
	///
	/// This can be in any format, but should uniquely identify the backend
	/// instance.
	fn name(&self) -> Option<String>;
}

impl<C: Backend + ?Sized> Backend for Box<C> {
	fn set_io_mode(&mut self, mode: IoMode) -> Result<(), io::Error> {
		(**self).set_io_mode(mode)
	}
	fn io_mode(&self) -> Result<IoMode, io::Error> {
		(**self).io_mode()
	}
	fn shutdown(&mut self) -> Result<(), io::Error> {
		(**self).shutdown()
	}
	fn name(&self) -> Option<String> {
		(**self).name()
	}
}

impl<C: Backend + ?Sized> Backend for &mut C {
	fn set_io_mode(&mut self, mode: IoMode) -> Result<(), io::Error> {
		(**self).set_io_mode(mode)
	}
	fn io_mode(&self) -> Result<IoMode, io::Error> {
		(**self).io_mode()
	}
	fn shutdown(&mut self) -> Result<(), io::Error> {
		(**self).shutdown()
	}
	fn name(&self) -> Option<String> {
		(**self).name()
	}
}

/// A TCP connection to a controller.
//
// `TcpStream` can change, but not report, whether it is in non-blocking mode.
// The flag is therefore tracked here so that the mode can be saved and later
// restored.
#[derive(Debug)]
pub struct Tcp {
	stream: TcpStream,
	nonblocking: bool,
}

impl Tcp {
	/// Connect to the controller at `address`.
	///
	/// If `timeout` is `Some`, each resolved address is tried with that
	/// connect timeout, otherwise the operating system's default is used. The
	/// stream starts out blocking with no read timeout.
	pub fn connect<A: ToSocketAddrs>(address: A, timeout: Option<Duration>) -> io::Result<Tcp> {
		let stream = match timeout {
			None => TcpStream::connect(address)?,
			Some(timeout) => connect_timeout(address, timeout)?,
		};
		stream.set_nonblocking(false)?;
		stream.set_read_timeout(None)?;
		Ok(Tcp::from(stream))
	}
}

/// Try each address `address` resolves to until one connects.
fn connect_timeout<A: ToSocketAddrs>(address: A, timeout: Duration) -> io::Result<TcpStream> {
	let mut last_error = None;
	for addr in address.to_socket_addrs()? {
		match TcpStream::connect_timeout(&addr, timeout) {
			Ok(stream) => return Ok(stream),
			Err(e) => last_error = Some(e),
		}
	}
	Err(last_error.unwrap_or_else(|| {
		io::Error::new(
			io::ErrorKind::InvalidInput,
			"could not resolve to any addresses",
		)
	}))
}

impl From<TcpStream> for Tcp {
	/// Wrap a stream, which is assumed to be in blocking mode.
	fn from(stream: TcpStream) -> Self {
		Tcp {
			stream,
			nonblocking: false,
		}
	}
}

impl io::Read for Tcp {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		io::Read::read(&mut self.stream, buf)
	}
}

impl io::Write for Tcp {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		io::Write::write(&mut self.stream, buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		io::Write::flush(&mut self.stream)
	}
}

impl Backend for Tcp {
	fn set_io_mode(&mut self, mode: IoMode) -> Result<(), io::Error> {
		self.stream.set_read_timeout(mode.read_timeout)?;
		self.stream.set_nonblocking(mode.nonblocking)?;
		self.nonblocking = mode.nonblocking;
		Ok(())
	}
	fn io_mode(&self) -> Result<IoMode, io::Error> {
		Ok(IoMode {
			nonblocking: self.nonblocking,
			read_timeout: self.stream.read_timeout()?,
		})
	}
	fn shutdown(&mut self) -> Result<(), io::Error> {
		match self.stream.shutdown(Shutdown::Both) {
			// The peer already closed the connection.
			Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
			result => result,
		}
	}
	fn name(&self) -> Option<String> {
		self.stream
			.peer_addr()
			.map(|addr| format!("{addr}"))
			.ok()
	}
}

#[cfg(any(test, feature = "mock"))]
pub use mock::Mock;

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
mod mock {
	use super::{Backend, IoMode};
	use std::{cell::RefCell, collections::VecDeque, io, rc::Rc};

	/// A mock backend for use in testing.
	///
	/// It has the following features:
	///   * Data written to it is recorded and can be inspected as commands.
	///   * Replies can be scripted. A scripted reply only becomes readable once
	///     a complete (carriage return terminated) command has been written.
	///   * Stale data can be made readable immediately.
	///   * Specific errors can be inserted for calls to `read`, `write`,
	///     `flush`, and `set_io_mode`.
	///   * The I/O mode in effect during each `read` is recorded.
	///
	/// Clones share the same state, so a test can keep one clone while the
	/// client under test owns another.
	#[derive(Debug, Clone, Default)]
	pub struct Mock {
		state: Rc<RefCell<State>>,
	}

	#[derive(Debug, Default)]
	struct State {
		/// The data available for reading.
		readable: VecDeque<u8>,
		/// Replies released, one per command, as commands are written.
		replies: VecDeque<Vec<u8>>,
		/// Every byte written.
		written: Vec<u8>,
		/// The number of complete commands written so far.
		commands_seen: usize,
		/// The error to surface on the next read, if any. It is only surfaced once.
		read_error: Option<io::Error>,
		/// The error to surface on the next write, if any. It is only surfaced once.
		write_error: Option<io::Error>,
		/// The error to surface on the next flush, if any. It is only surfaced once.
		flush_error: Option<io::Error>,
		/// The error to surface on the next set_io_mode, if any. It is only surfaced once.
		set_io_mode_error: Option<io::Error>,
		/// The current mode.
		mode: IoMode,
		/// The mode in effect for each call to `read`.
		read_modes: Vec<IoMode>,
		/// Whether `shutdown` has been called.
		shut_down: bool,
		/// Whether the peer has closed the connection. Reads with no data
		/// available then return 0 bytes.
		peer_closed: bool,
	}

	impl Mock {
		/// Create a new Mock backend.
		pub fn new() -> Self {
			Mock::default()
		}
		/// Queue a reply that becomes readable after the next complete command
		/// is written.
		///
		/// The data is not validated in any way.
		pub fn push_reply<T: AsRef<[u8]>>(&self, bytes: T) {
			self.state
				.borrow_mut()
				.replies
				.push_back(bytes.as_ref().to_vec());
		}
		/// Append data to the read buffer, making it readable immediately.
		pub fn append_data<T: AsRef<[u8]>>(&self, bytes: T) {
			self.state
				.borrow_mut()
				.readable
				.extend(bytes.as_ref().iter().copied());
		}
		/// Whether the mock has any data available or not.
		pub fn is_empty(&self) -> bool {
			self.state.borrow().readable.is_empty()
		}
		/// All bytes written so far.
		pub fn written(&self) -> Vec<u8> {
			self.state.borrow().written.clone()
		}
		/// The complete commands written so far, without their carriage returns.
		pub fn commands(&self) -> Vec<String> {
			let state = self.state.borrow();
			let text = String::from_utf8_lossy(&state.written);
			let mut commands: Vec<String> = text.split('\r').map(str::to_string).collect();
			// Drop the (possibly empty) trailing incomplete command.
			commands.pop();
			commands
		}
		/// Forget all written data.
		pub fn clear_written(&self) {
			let mut state = self.state.borrow_mut();
			state.written.clear();
			state.commands_seen = 0;
		}
		/// The mode in effect for each call to `read`, in order.
		pub fn read_modes(&self) -> Vec<IoMode> {
			self.state.borrow().read_modes.clone()
		}
		/// Whether `shutdown` has been called.
		pub fn is_shut_down(&self) -> bool {
			self.state.borrow().shut_down
		}
		/// Simulate the peer closing (or reopening) its end of the connection.
		pub fn set_peer_closed(&self, closed: bool) {
			self.state.borrow_mut().peer_closed = closed;
		}
		/// Set the error for the next `read`, if any.
		pub fn read_error(&self, err: Option<io::Error>) {
			self.state.borrow_mut().read_error = err;
		}
		/// Set the error for the next `write`, if any.
		pub fn write_error(&self, err: Option<io::Error>) {
			self.state.borrow_mut().write_error = err;
		}
		/// Set the error for the next `flush`, if any.
		pub fn flush_error(&self, err: Option<io::Error>) {
			self.state.borrow_mut().flush_error = err;
		}
		/// Set the error for the next `set_io_mode`, if any.
		pub fn set_io_mode_error(&self, err: Option<io::Error>) {
			self.state.borrow_mut().set_io_mode_error = err;
		}
	}

	impl Backend for Mock {
		fn set_io_mode(&mut self, mode: IoMode) -> Result<(), io::Error> {
			let mut state = self.state.borrow_mut();
			if let Some(err) = state.set_io_mode_error.take() {
				Err(err)
			} else {
				state.mode = mode;
				Ok(())
			}
		}

		fn io_mode(&self) -> Result<IoMode, io::Error> {
			Ok(self.state.borrow().mode)
		}

		fn shutdown(&mut self) -> Result<(), io::Error> {
			self.state.borrow_mut().shut_down = true;
			Ok(())
		}

		fn name(&self) -> Option<String> {
			Some(format!("<mock 0x{:x}>", Rc::as_ptr(&self.state) as usize))
		}
	}

	impl io::Read for Mock {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			let mut state = self.state.borrow_mut();
			let mode = state.mode;
			state.read_modes.push(mode);
			if let Some(err) = state.read_error.take() {
				return Err(err);
			}
			if state.readable.is_empty() && state.peer_closed {
				return Ok(0);
			}
			if state.readable.is_empty() {
				// A real controller with no data ready would make the read
				// wait and then eventually time out, or block forever. As our
				// data is in memory that does not happen here, so simulate a
				// timeout immediately.
				return Err(if mode.nonblocking {
					io::Error::new(io::ErrorKind::WouldBlock, "Simulated would block error")
				} else {
					io::Error::new(io::ErrorKind::TimedOut, "Simulated timeout error")
				});
			}
			let n = buf.len().min(state.readable.len());
			for (dst, src) in buf.iter_mut().zip(state.readable.drain(..n)) {
				*dst = src;
			}
			Ok(n)
		}
	}

	impl io::Write for Mock {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			let mut state = self.state.borrow_mut();
			if let Some(err) = state.write_error.take() {
				return Err(err);
			}
			state.written.extend_from_slice(buf);
			let total = state.written.iter().filter(|&&b| b == b'\r').count();
			while state.commands_seen < total {
				state.commands_seen += 1;
				if let Some(reply) = state.replies.pop_front() {
					state.readable.extend(reply);
				}
			}
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			if let Some(err) = self.state.borrow_mut().flush_error.take() {
				Err(err)
			} else {
				Ok(())
			}
		}
	}
}

mod private {
	pub trait Sealed {}

	impl Sealed for super::Tcp {}
	#[cfg(any(test, feature = "mock"))]
	impl Sealed for super::Mock {}
	impl<C: super::Backend + ?Sized> Sealed for Box<C> {}
	impl<C: super::Backend + ?Sized> Sealed for &mut C {}
}
