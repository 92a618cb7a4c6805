//! # ICAP — Inter-Core Audio Protocol
//!
//! A transport-agnostic request/response engine for audio control
//! between an application endpoint and a device endpoint sharing a
//! datagram channel. The crate owns framing, sequencing, dispatch, and
//! the pending-request table; it does not own any concrete transport
//! (shared memory, rpmsg, a socket) — that's supplied through the
//! [`transport::Transport`] trait.
//!
//! An [`api::application::ApplicationInstance`] drives a device through
//! blocking request helpers; a [`api::device::DeviceInstance`] answers
//! those requests through a [`callbacks::DeviceCallbacks`] capability
//! set and raises its own fragment/xrun/error notifications.

pub mod api;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod instance;
pub mod logging;
pub mod transport;
pub mod wire;

pub(crate) mod dispatch;
pub(crate) mod pending;

pub use api::{ApplicationInstance, DeviceInstance};
pub use callbacks::{ApplicationCallbacks, DeviceCallbacks, Outcome};
pub use config::InstanceConfig;
pub use error::IcapError;
pub use instance::Role;
pub use transport::{RemoteAddr, Transport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
