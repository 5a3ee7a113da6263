//! # Virtual sticks
//!
//! This crate streams virtual stick commands to a flight controller. Instead of a pilot moving the sticks, a
//! [Pattern] computes roll, pitch and vertical throttle from a phase angle that advances every tick, and the resulting
//! [AxisCommand] is sent to the vehicle at a fixed rate. This makes the vehicle oscillate or fly orbits.
//!
//! ## Status
//!
//! | Pattern | Support |
//! |---------|---------|
//! | Roll left/right | Full |
//! | Pitch forward/back | Full |
//! | Throttle up/down | Full |
//! | Horizontal orbit | Full |
//! | Vertical orbit | Full |
//! | Vertical sine wave | None (holds the last command) |
//! | Horizontal sine wave | None (holds the last command) |
//!
//! ## Usage
//!
//! The basic procedure to use the lib is:
//!  - Create a [Transport] to the vehicle, for a Crazyflie use [transport::crtp::CrtpTransport]
//!  - Create a [Session] from the transport
//!  - Enable the control mode with [Session::enable()], nothing can be streamed before it succeeds
//!  - Arm a pattern with [Session::arm()], arming another pattern switches trajectory
//!  - Stop with [Session::stop()] or [Session::disable()]
//!
//! If sending a command fails, the stream is stopped and the session goes back to [StreamState::Idle]. It is never
//! restarted automatically.
//!
//! For example:
//! ``` no_run
//! # async fn test() -> Result<(), Box<dyn std::error::Error>> {
//! use std::time::Duration;
//! use virtual_sticks::{Pattern, Session, transport::crtp::CrtpTransport};
//!
//! let link_context = crazyflie_link::LinkContext::new();
//!
//! // Scan for Crazyflies on the default address
//! let found = link_context.scan([0xE7; 5]).await?;
//!
//! if let Some(uri) = found.first() {
//!     let transport = std::sync::Arc::new(CrtpTransport::connect_from_uri(&link_context, uri).await?);
//!     let session = Session::new(transport.clone());
//!
//!     session.enable().await?;
//!     session.arm(Pattern::PitchForwardBack)?;
//!     tokio::time::sleep(Duration::from_secs(10)).await;
//!
//!     session.disable().await?;
//!     transport.disconnect().await;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod command_loop;
mod error;

pub mod config;
pub mod pattern;
pub mod session;
pub mod subsystems;
pub mod transport;

pub use crate::config::StreamConfig;
pub use crate::error::{Error, Result};
pub use crate::pattern::{AxisCommand, Pattern, Trajectory};
pub use crate::session::{Session, StreamState};
pub use crate::transport::Transport;
