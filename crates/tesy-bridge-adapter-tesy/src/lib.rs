//! # Tesy Adapter
//!
//! HTTP client for the Tesy cloud (`mytesy.com`) appliance API.
//!
//! ## Session model
//!
//! Login is a form POST that answers with three session artifacts: the
//! `PHPSESSID` cookie and the `acc_alt` / `acc_session` response headers.
//! Every authenticated request echoes all three back. The client itself is
//! stateless; callers own the [`Session`] and decide when it is invalid.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod client;
pub mod session;

pub use api::{CommandReply, DeviceRecord, WaterHeaterApi};
pub use client::{ClientError, TesyClient, TesyClientConfig};
pub use session::{Credentials, Session};
