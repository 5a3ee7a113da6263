//! # Flight controller transport
//!
//! The [Session](crate::Session) never talks to a vehicle directly, it goes through a
//! [Transport]. A transport exposes the two operations needed to fly virtual sticks:
//!  - Enabling (or leaving) the control mode in which the flight controller accepts stick
//!    commands. This must succeed before any command is sent.
//!  - Sending one [AxisCommand] frame. The session sends one frame per tick.
//!
//! [crtp::CrtpTransport] implements it for a Crazyflie reachable through [crazyflie-link].
//! Other vehicles can be supported by implementing the trait:
//!
//! ``` no_run
//! use async_trait::async_trait;
//! use virtual_sticks::{AxisCommand, Result, Transport};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Transport for Printer {
//!     async fn enable_control_mode(&self, enabled: bool) -> Result<()> {
//!         println!("control mode: {}", enabled);
//!         Ok(())
//!     }
//!
//!     async fn send_command(&self, command: AxisCommand) -> Result<()> {
//!         println!("{:?}", command);
//!         Ok(())
//!     }
//! }
//! ```
//!
//! [crazyflie-link]: https://crates.io/crates/crazyflie-link

use async_trait::async_trait;

use crate::pattern::AxisCommand;
use crate::Result;

pub mod crtp;

/// Link to a flight controller accepting virtual stick commands
#[async_trait]
pub trait Transport: Send + Sync {
    /// Enter (`true`) or leave (`false`) the virtual stick control mode
    async fn enable_control_mode(&self, enabled: bool) -> Result<()>;

    /// Send one stick frame
    ///
    /// The future completes when the frame has been handed to the link. An error means the
    /// frame was not sent.
    async fn send_command(&self, command: AxisCommand) -> Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn enable_control_mode(&self, enabled: bool) -> Result<()> {
        (**self).enable_control_mode(enabled).await
    }

    async fn send_command(&self, command: AxisCommand) -> Result<()> {
        (**self).send_command(command).await
    }
}
