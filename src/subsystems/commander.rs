//! # Generic setpoint commander
//!
//! Virtual sticks are flown with the Crazyflie generic "velocity world" setpoint. Setpoints
//! have to be sent continuously: if no setpoint is received for 1 second the Crazyflie resets
//! its targets to 0 and after 2 seconds falls back to a lower priority setpoint source, which
//! in most cases cuts the motors.
//!
//! Once streaming is over, [Commander::notify_setpoint_stop()] lowers the priority of the last
//! setpoint so that other sources (for example the high-level commander) can take over.

use crazyflie_link::Packet;
use flume::Sender;

use crate::{Error, Result};

pub(crate) const GENERIC_SETPOINT_PORT: u8 = 7;

// Channels
const GENERIC_SETPOINT_CHANNEL: u8 = 0;
const GENERIC_CMD_CHANNEL: u8 = 1;

// Setpoint type identifiers
const TYPE_VELOCITY_WORLD: u8 = 8;
const TYPE_META_COMMAND_NOTIFY_SETPOINT_STOP: u8 = 0;

/// Setpoint sender
#[derive(Debug, Clone)]
pub struct Commander {
    uplink: Sender<Packet>,
}

impl Commander {
    pub(crate) fn new(uplink: Sender<Packet>) -> Self {
        Self { uplink }
    }

    /// Sends a velocity setpoint in the world frame, with yaw rate control.
    ///
    /// # Arguments
    /// * `vx` - Target velocity in x (meters/second, world frame)
    /// * `vy` - Target velocity in y (meters/second, world frame)
    /// * `vz` - Target velocity in z (meters/second, world frame)
    /// * `yawrate` - Target yaw rate (degrees/second)
    pub async fn setpoint_velocity_world(&self, vx: f32, vy: f32, vz: f32, yawrate: f32) -> Result<()> {
        let mut payload = Vec::with_capacity(1 + 4 * 4);
        payload.push(TYPE_VELOCITY_WORLD);
        payload.extend_from_slice(&vx.to_le_bytes());
        payload.extend_from_slice(&vy.to_le_bytes());
        payload.extend_from_slice(&vz.to_le_bytes());
        payload.extend_from_slice(&yawrate.to_le_bytes());
        let pk = Packet::new(GENERIC_SETPOINT_PORT, GENERIC_SETPOINT_CHANNEL, payload);
        self.uplink.send_async(pk).await.map_err(|_| Error::Disconnected)?;
        Ok(())
    }

    /// Lowers the priority of the current setpoint, allowing any new setpoint (from any source) to overwrite it.
    ///
    /// # Arguments
    /// * `remain_valid_milliseconds` - Duration (milliseconds) for which the setpoint remains valid (usually 0)
    pub async fn notify_setpoint_stop(&self, remain_valid_milliseconds: u32) -> Result<()> {
        let mut payload = Vec::with_capacity(1 + 4);
        payload.push(TYPE_META_COMMAND_NOTIFY_SETPOINT_STOP);
        payload.extend_from_slice(&remain_valid_milliseconds.to_le_bytes());
        let pk = Packet::new(GENERIC_SETPOINT_PORT, GENERIC_CMD_CHANNEL, payload);
        self.uplink.send_async(pk).await.map_err(|_| Error::Disconnected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn velocity_world_packet_layout() {
        let (uplink, rx) = flume::unbounded();
        let commander = Commander::new(uplink);

        commander.setpoint_velocity_world(0.5, -0.25, 1.0, 0.0).await.unwrap();

        let pk = rx.recv_async().await.unwrap();
        assert_eq!(pk.get_port(), GENERIC_SETPOINT_PORT);
        assert_eq!(pk.get_channel(), GENERIC_SETPOINT_CHANNEL);

        let data = pk.get_data();
        assert_eq!(data.len(), 17);
        assert_eq!(data[0], TYPE_VELOCITY_WORLD);
        assert_eq!(&data[1..5], &0.5f32.to_le_bytes());
        assert_eq!(&data[5..9], &(-0.25f32).to_le_bytes());
        assert_eq!(&data[9..13], &1.0f32.to_le_bytes());
        assert_eq!(&data[13..17], &0.0f32.to_le_bytes());
    }

    #[tokio::test]
    async fn notify_stop_goes_on_the_command_channel() {
        let (uplink, rx) = flume::unbounded();
        let commander = Commander::new(uplink);

        commander.notify_setpoint_stop(100).await.unwrap();

        let pk = rx.recv_async().await.unwrap();
        assert_eq!(pk.get_channel(), GENERIC_CMD_CHANNEL);
        assert_eq!(pk.get_data()[0], TYPE_META_COMMAND_NOTIFY_SETPOINT_STOP);
        assert_eq!(&pk.get_data()[1..5], &100u32.to_le_bytes());
    }

    #[tokio::test]
    async fn closed_uplink_is_a_disconnection() {
        let (uplink, rx) = flume::unbounded();
        drop(rx);
        let commander = Commander::new(uplink);

        assert_eq!(
            commander.setpoint_velocity_world(0.0, 0.0, 0.0, 0.0).await,
            Err(Error::Disconnected)
        );
    }
}
