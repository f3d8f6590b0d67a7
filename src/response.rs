//! Decoding the controller's replies.
//!
//! The protocol has no framing beyond the delimiters the controller wraps
//! around its replies (a `>` prompt, spaces, carriage returns, and line
//! feeds). A reply is decoded by stripping those from both ends.

use std::io;

/// The characters stripped from both ends of a raw reply.
pub const DELIMITERS: [char; 4] = ['>', ' ', '\r', '\n'];

/// Decode raw reply bytes into text, stripping protocol delimiters from both
/// ends.
///
/// Invalid UTF-8 is replaced rather than rejected.
///
/// ```
/// # use xenax::response::decode;
/// assert_eq!(decode(b"> 1234\r\n"), "1234");
/// ```
pub fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(&DELIMITERS[..])
        .to_string()
}

/// The outcome of the most recent command/reply exchange.
///
/// Reading a reply is best effort: if the read fails the failure is kept
/// here rather than returned as an error. [`as_str`](Response::as_str) then
/// yields an empty string, the same as an empty reply. Use
/// [`read_failed`](Response::read_failed) or
/// [`into_result`](Response::into_result) to tell the two apart.
#[derive(Debug)]
pub struct Response(Result<String, io::Error>);

impl Response {
    /// A successfully read and decoded reply.
    pub(crate) fn received(text: String) -> Self {
        Response(Ok(text))
    }

    /// A reply that could not be read.
    pub(crate) fn read_failure(err: io::Error) -> Self {
        Response(Err(err))
    }

    /// The decoded reply, or an empty string if reading it failed.
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Ok(text) => text,
            Err(_) => "",
        }
    }

    /// Whether reading the reply failed.
    pub fn read_failed(&self) -> bool {
        self.0.is_err()
    }

    /// The error that prevented the reply from being read, if any.
    pub fn read_error(&self) -> Option<&io::Error> {
        self.0.as_ref().err()
    }

    /// Consume the response, returning the decoded reply or the read error.
    pub fn into_result(self) -> Result<String, io::Error> {
        self.0
    }
}

impl Default for Response {
    /// An empty reply, as held before any command has been sent.
    fn default() -> Self {
        Response(Ok(String::new()))
    }
}

impl AsRef<str> for Response {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_strips_delimiters() {
        assert_eq!(decode(b"> 1234\r\n"), "1234");
        assert_eq!(decode(b"1234"), "1234");
        assert_eq!(decode(b">>\r\n"), "");
        assert_eq!(decode(b""), "");
        assert_eq!(decode(b"\r\n> TP\r\n-50 >"), "TP\r\n-50");
    }

    #[test]
    fn decode_keeps_inner_delimiters() {
        assert_eq!(decode(b"> 12 34 \r"), "12 34");
    }

    #[test]
    fn decode_invalid_utf8() {
        assert_eq!(decode(b"> 12\xff\r\n"), "12\u{fffd}");
    }

    #[test]
    fn failed_read_reads_as_empty() {
        let response = Response::read_failure(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(response.as_str(), "");
        assert!(response.read_failed());
        assert_eq!(
            response.read_error().map(io::Error::kind),
            Some(io::ErrorKind::ConnectionReset)
        );
        assert!(response.into_result().is_err());

        let response = Response::received(String::new());
        assert_eq!(response.as_str(), "");
        assert!(!response.read_failed());
        assert_eq!(response.into_result().unwrap(), "");
    }
}
