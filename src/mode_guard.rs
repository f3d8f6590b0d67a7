//! A "scope guard" that will reset a port's I/O mode when it goes out of scope.

use crate::backend::{Backend, IoMode};
use std::io;

/// A port, as required by the [`ModeGuard`].
pub trait Port<B>: private::Sealed {
    /// Get the underlying backend.
    #[doc(hidden)]
    fn backend_mut(&mut self) -> &mut B;
    /// Poison the port.
    #[doc(hidden)]
    fn poison(&mut self, e: io::Error);
}

mod private {
    /// Marks a trait a sealed.
    pub trait Sealed {}
    impl<B> Sealed for crate::port::Port<B> {}
}

/// A "scope guard" that will update the port's I/O mode and then reset it when
/// it goes out of scope.
///
/// To create a guard, use the port's [`mode_guard`](crate::port::Port::mode_guard) method.
///
/// While the guard is in scope, the port can only be accessed through the guard.
/// However, because the guard implements [`Deref`](std::ops::Deref) and
/// [`DerefMut`](std::ops::DerefMut) callers can treat the guard as the port.
///
/// Guards nest: a guard created through another guard restores the mode the
/// outer guard set, and the outer guard then restores the caller's mode.
#[derive(Debug)]
pub struct ModeGuard<'a, B: Backend, P: Port<B>> {
    /// The underlying port.
    port: &'a mut P,
    /// The original mode that will be restored when the guard is dropped.
    original_mode: IoMode,
    backend_marker: std::marker::PhantomData<B>,
}

impl<'a, B: Backend, P: Port<B>> ModeGuard<'a, B, P> {
    /// Update the port's mode and return a [`ModeGuard`] wrapping the port.
    pub(crate) fn new(port: &'a mut P, mode: IoMode) -> Result<Self, io::Error> {
        let backend = port.backend_mut();
        let original_mode = backend.io_mode()?;
        backend.set_io_mode(mode)?;
        Ok(ModeGuard {
            port,
            original_mode,
            backend_marker: std::marker::PhantomData,
        })
    }
}

impl<B: Backend, P: Port<B>> std::ops::Deref for ModeGuard<'_, B, P> {
    type Target = P;
    /// Get a shared reference to the underlying port.
    fn deref(&self) -> &Self::Target {
        self.port
    }
}

impl<B: Backend, P: Port<B>> std::ops::DerefMut for ModeGuard<'_, B, P> {
    /// Get an exclusive reference to the underlying port.
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.port
    }
}

impl<B: Backend, P: Port<B>> std::ops::Drop for ModeGuard<'_, B, P> {
    fn drop(&mut self) {
        if let Err(err) = self
            .port
            .backend_mut()
            .set_io_mode(self.original_mode)
        {
            let IoMode {
                nonblocking,
                read_timeout,
            } = self.original_mode;
            self.port.poison(io::Error::new(
                io::ErrorKind::Other,
                match (nonblocking, read_timeout) {
                    (true, _) => format!("failed to reset to non-blocking mode: {err}"),
                    (false, Some(timeout)) => format!(
                        "failed to reset timeout to {} milliseconds: {err}",
                        timeout.as_millis()
                    ),
                    (false, None) => format!("failed to reset to an infinite timeout: {err}"),
                },
            ));
        }
    }
}
