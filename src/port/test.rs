use super::*;
use crate::{backend::Mock, command, error::XenaxError};

const DRAIN: Duration = Duration::from_millis(100);

/// Open a port over a mock, returning a handle to the mock as well.
fn open_mock() -> (Port<Mock>, Mock) {
	let mock = Mock::new();
	(Port::from_backend(mock.clone(), None, DRAIN), mock)
}

fn other_error(message: &'static str) -> io::Error {
	io::Error::new(io::ErrorKind::Other, message)
}

#[test]
fn command_reply_ok() {
	let (mut port, mock) = open_mock();
	mock.push_reply(b"> 1234\r\n");
	let response = port.command(command::TELL_POSITION).unwrap();
	assert_eq!(response.as_str(), "1234");
	assert!(!response.read_failed());
	assert_eq!(mock.written(), b"TP\r");
}

#[test]
fn command_accepts_raw_text() {
	let (mut port, mock) = open_mock();
	mock.push_reply(b">\r\n");
	let response = port.command("SP100000").unwrap();
	assert_eq!(response.as_str(), "");
	assert_eq!(mock.commands(), ["SP100000"]);
}

#[test]
fn stale_data_is_drained_before_sending() {
	let (mut port, mock) = open_mock();
	mock.append_data(b"> 999\r\n> 998\r\n");
	mock.push_reply(b"> 42\r\n");
	let response = port.command("TP").unwrap();
	assert_eq!(response.as_str(), "42");
	assert!(mock.is_empty());
}

#[test]
fn clear_buffer_reports_discarded_bytes() {
	let (mut port, mock) = open_mock();
	mock.append_data(b"abc");
	assert_eq!(port.clear_buffer().unwrap(), 3);
	assert_eq!(port.clear_buffer().unwrap(), 0);
	// Draining ends with the caller's mode.
	assert_eq!(port.io_mode().unwrap(), IoMode::BLOCKING);
}

#[test]
fn modes_during_exchange() {
	let (mut port, mock) = open_mock();
	let caller_mode = IoMode {
		nonblocking: true,
		read_timeout: None,
	};
	port.set_io_mode(caller_mode).unwrap();
	mock.append_data(b"stale");
	mock.push_reply(b"> 1\r\n");
	port.command("TP").unwrap();

	let drain_mode = IoMode::blocking(Some(DRAIN));
	assert_eq!(
		mock.read_modes(),
		[
			drain_mode,          // reads the stale data
			drain_mode,          // times out
			IoMode::BLOCKING,    // reads the reply
		]
	);
	// The caller's non-blocking mode is restored.
	assert_eq!(port.io_mode().unwrap(), caller_mode);
}

#[test]
fn exchange_uses_configured_read_timeout() {
	let (mut port, mock) = open_mock();
	let timeout = Some(Duration::from_secs(2));
	assert_eq!(port.set_read_timeout(timeout), None);
	assert_eq!(port.read_timeout(), timeout);
	mock.push_reply(b"> 1\r\n");
	port.command("TP").unwrap();
	assert_eq!(mock.read_modes().last(), Some(&IoMode::blocking(timeout)));
	assert_eq!(port.io_mode().unwrap(), IoMode::BLOCKING);
}

#[test]
fn write_failure_is_an_error_and_restores_mode() {
	let (mut port, mock) = open_mock();
	let caller_mode = IoMode::blocking(Some(Duration::from_secs(7)));
	port.set_io_mode(caller_mode).unwrap();
	mock.write_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "OOPS!")));
	let err = port.command("PW").unwrap_err();
	assert!(matches!(err, XenaxError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
	assert_eq!(port.io_mode().unwrap(), caller_mode);
}

#[test]
fn flush_failure_is_an_error() {
	let (mut port, mock) = open_mock();
	mock.flush_error(Some(other_error("OOPS!")));
	assert!(port.command("PW").unwrap_err().is_io());
}

#[test]
fn read_failure_becomes_an_empty_response() {
	let (mut port, mock) = open_mock();
	// No reply is scripted, so the mock simulates a timeout on the reply read.
	let response = port.command("TP").unwrap();
	assert_eq!(response.as_str(), "");
	assert!(response.read_failed());
	assert_eq!(
		response.read_error().map(io::Error::kind),
		Some(io::ErrorKind::TimedOut)
	);
	// The reply read was the only one made in the exchange mode.
	assert_eq!(mock.read_modes().last(), Some(&IoMode::BLOCKING));
	assert_eq!(port.io_mode().unwrap(), IoMode::BLOCKING);
}

#[test]
fn drain_failure_is_an_error() {
	let (mut port, mock) = open_mock();
	let caller_mode = IoMode::blocking(Some(Duration::from_secs(7)));
	port.set_io_mode(caller_mode).unwrap();
	mock.read_error(Some(io::Error::new(io::ErrorKind::ConnectionReset, "OOPS!")));
	let err = port.command("TP").unwrap_err();
	assert!(err.is_io());
	// Nothing was sent.
	assert!(mock.written().is_empty());
	assert_eq!(port.io_mode().unwrap(), caller_mode);
}

#[test]
fn drain_stops_when_the_peer_closes() {
	let (mut port, mock) = open_mock();
	let caller_mode = IoMode::blocking(Some(Duration::from_secs(7)));
	port.set_io_mode(caller_mode).unwrap();
	mock.set_peer_closed(true);
	assert_eq!(port.clear_buffer().unwrap(), 0);
	assert_eq!(mock.read_modes(), [IoMode::blocking(Some(DRAIN))]);
	assert_eq!(port.io_mode().unwrap(), caller_mode);
}

#[test]
fn drain_discards_data_before_the_peer_closes() {
	let (mut port, mock) = open_mock();
	mock.append_data(b"> 12\r\n");
	mock.set_peer_closed(true);
	assert_eq!(port.clear_buffer().unwrap(), 6);
	assert_eq!(mock.read_modes().len(), 2);
	assert!(mock.is_empty());
	assert_eq!(port.io_mode().unwrap(), IoMode::BLOCKING);
}

#[test]
fn reserved_characters_are_rejected() {
	let (mut port, mock) = open_mock();
	let err = port.command("PW\rPQ").unwrap_err();
	assert!(matches!(err, XenaxError::ReservedCharacter(_)));
	let err = port.command("TP\n").unwrap_err();
	assert!(matches!(err, XenaxError::ReservedCharacter(_)));
	assert!(mock.written().is_empty());
	assert!(mock.read_modes().is_empty());
}

#[test]
fn failing_to_enter_exchange_mode() {
	let (mut port, mock) = open_mock();
	mock.set_io_mode_error(Some(other_error("OOPS!")));
	assert!(port.command("TP").unwrap_err().is_io());
	assert!(mock.written().is_empty());
}

/// Return true if the error is a poisoning error.
fn is_poisoning_error(err: &XenaxError) -> bool {
	let mut poisoning = false;
	if let XenaxError::Io(e) = err {
		if e.kind() == io::ErrorKind::Other {
			let message = format!("{e}");
			poisoning = message.starts_with("failed to reset") && message.contains("OOPS!");
		}
	}
	poisoning
}

#[test]
fn poisoned_command() {
	let (mut port, mock) = open_mock();
	{
		let _guard = port
			.mode_guard(IoMode::blocking(Some(Duration::from_secs(1))))
			.unwrap();
		mock.set_io_mode_error(Some(other_error("OOPS!")));
	}

	// The poisoning error surfaces once, before anything is sent.
	mock.push_reply(b"> 1\r\n");
	let err = port.command("TP").unwrap_err();
	assert!(is_poisoning_error(&err), "{err} is not a poisoning error");
	assert!(mock.written().is_empty());

	// Subsequent calls work again.
	let response = port.command("TP").unwrap();
	assert_eq!(response.as_str(), "1");
}

#[test]
fn poisoned_clear_buffer() {
	let (mut port, mock) = open_mock();
	{
		let _guard = port.mode_guard(IoMode::BLOCKING).unwrap();
		mock.set_io_mode_error(Some(other_error("OOPS!")));
	}
	let err = XenaxError::from(port.clear_buffer().unwrap_err());
	assert!(is_poisoning_error(&err), "{err} is not a poisoning error");
	assert!(port.clear_buffer().is_ok());
}

#[test]
fn close_shuts_down_the_backend() {
	let (port, mock) = open_mock();
	port.close().unwrap();
	assert!(mock.is_shut_down());
}
