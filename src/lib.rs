//! A simple but easy to use library for controlling Xenax linear motor
//! controllers over TCP.
//!
//! A [`Xenax`] client connects to one controller, initializes it, and then
//! issues motion commands (absolute moves, jogs, power on/off) and position
//! queries. Every command is a short ASCII mnemonic terminated by a carriage
//! return and answered by a single reply.
//!
//! ```rust
//! # use xenax::Xenax;
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let mut rail = Xenax::new("192.168.2.100");
//! rail.set_limit_right(250_000);
//! rail.connect()?;
//! rail.set_position(125_000)?;
//! rail.disconnect()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(all(doc, feature = "doc_cfg"), feature(doc_cfg))]

pub mod backend;
pub mod command;
mod controller;
pub mod error;
pub mod mode_guard;
pub mod port;
pub mod position;
pub mod response;

pub use controller::*;
