//! # Crazyflie subsystems
//!
//! The Crazyflie firmware, as well as the CRTP protocol used to communicate with it, is organized in logical
//! subsystems. Virtual sticks only need two of them: the generic setpoint commander to send the stick frames and the
//! supervisor to arm the motors.
//!
//! They are used by [CrtpTransport](crate::transport::crtp::CrtpTransport).

pub mod commander;
pub mod supervisor;
