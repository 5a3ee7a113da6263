//! # Supervisor commands
//!
//! The supervisor guards the motors: setpoints are ignored until the system is armed. Entering
//! virtual stick control arms the Crazyflie, leaving it disarms it.
//!
//! An arming request can be refused, for example when the Crazyflie is tumbled or locked.
//! [Supervisor::confirm_armed()] polls the supervisor state bitfield until the system reports
//! being armed:
//!
//! ``` text
//!  state bitfield (u16, little endian)
//!  bit 0: can be armed
//!  bit 1: is armed
//! ```

use std::time::Duration;

use crazyflie_link::Packet;
use flume::{Receiver, Sender};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

use crate::{Error, Result};

pub(crate) const SUPERVISOR_PORT: u8 = 9;

// Channels
const SUPERVISOR_CH_INFO: u8 = 0;
const SUPERVISOR_CH_COMMAND: u8 = 1;

// Commands
const CMD_GET_STATE_BITFIELD: u8 = 0x0C;
const CMD_ARM_SYSTEM: u8 = 0x01;

// Bit positions
const BIT_CAN_BE_ARMED: u8 = 0;
const BIT_IS_ARMED: u8 = 1;

const BITFIELD_TIMEOUT: Duration = Duration::from_millis(1000);
const ARMING_POLL_INTERVAL: Duration = Duration::from_millis(100);
const ARMING_POLL_ATTEMPTS: usize = 10;

/// Supervisor state bitfield
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorInfo {
    /// Raw bitfield value
    pub raw: u16,
}

impl SupervisorInfo {
    /// Create from raw bitfield value
    pub fn from_bits(bits: u16) -> Self {
        Self { raw: bits }
    }

    /// The system can be armed and will accept an arming request
    pub fn can_be_armed(&self) -> bool {
        (self.raw >> BIT_CAN_BE_ARMED) & 0x01 != 0
    }

    /// The system is armed
    pub fn is_armed(&self) -> bool {
        (self.raw >> BIT_IS_ARMED) & 0x01 != 0
    }
}

/// Supervisor command sender and state reader
pub struct Supervisor {
    uplink: Sender<Packet>,
    info_downlink: Mutex<Receiver<Packet>>,
}

impl Supervisor {
    pub(crate) fn new(uplink: Sender<Packet>, downlink: Receiver<Packet>) -> Self {
        Self {
            uplink,
            info_downlink: Mutex::new(downlink),
        }
    }

    /// Send system arm/disarm request
    ///
    /// When disarmed, the motors will not spin even if setpoints are sent.
    ///
    /// # Arguments
    /// * `do_arm` - true to arm, false to disarm
    pub async fn send_arming_request(&self, do_arm: bool) -> Result<()> {
        let pk = Packet::new(
            SUPERVISOR_PORT,
            SUPERVISOR_CH_COMMAND,
            vec![CMD_ARM_SYSTEM, do_arm as u8],
        );
        self.uplink.send_async(pk).await?;
        Ok(())
    }

    /// Read the supervisor state bitfield
    ///
    /// Returns [Error::Timeout] if the Crazyflie does not answer within a second.
    pub async fn read_bitfield(&self) -> Result<SupervisorInfo> {
        let downlink = self.info_downlink.lock().await;

        // Answers to an earlier, timed out, request
        while downlink.try_recv().is_ok() {}

        let pk = Packet::new(SUPERVISOR_PORT, SUPERVISOR_CH_INFO, vec![CMD_GET_STATE_BITFIELD]);
        self.uplink.send_async(pk).await?;

        loop {
            let packet = timeout(BITFIELD_TIMEOUT, downlink.recv_async())
                .await
                .map_err(|_| Error::Timeout)??;

            if packet.get_port() != SUPERVISOR_PORT || packet.get_channel() != SUPERVISOR_CH_INFO {
                continue;
            }

            let data = packet.get_data();
            if data.len() < 3 {
                continue;
            }
            if data[0] != CMD_GET_STATE_BITFIELD && data[0] != (CMD_GET_STATE_BITFIELD | 0x80) {
                continue;
            }

            return Ok(SupervisorInfo::from_bits(u16::from_le_bytes([data[1], data[2]])));
        }
    }

    /// Wait for the system to report being armed
    ///
    /// Polls the state bitfield for about a second and returns [Error::ArmingRefused] if the
    /// system never reports being armed.
    pub async fn confirm_armed(&self) -> Result<()> {
        for attempt in 0..ARMING_POLL_ATTEMPTS {
            let info = self.read_bitfield().await?;
            if info.is_armed() {
                return Ok(());
            }
            log::debug!(
                "Not armed yet (attempt {}, can be armed: {})",
                attempt + 1,
                info.can_be_armed()
            );
            sleep(ARMING_POLL_INTERVAL).await;
        }

        Err(Error::ArmingRefused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitfield_packet(bits: u16) -> Packet {
        let [lo, hi] = bits.to_le_bytes();
        Packet::new(SUPERVISOR_PORT, SUPERVISOR_CH_INFO, vec![CMD_GET_STATE_BITFIELD, lo, hi])
    }

    // Answers bitfield requests like a Crazyflie would, arming only if `accept_arming`
    fn spawn_crazyflie(uplink: Receiver<Packet>, downlink: Sender<Packet>, accept_arming: bool) {
        tokio::spawn(async move {
            let mut bits = 1 << BIT_CAN_BE_ARMED;
            while let Ok(pk) = uplink.recv_async().await {
                match (pk.get_channel(), pk.get_data()[..].first()) {
                    (SUPERVISOR_CH_COMMAND, Some(&CMD_ARM_SYSTEM)) if accept_arming => {
                        bits |= 1 << BIT_IS_ARMED;
                    }
                    (SUPERVISOR_CH_INFO, Some(&CMD_GET_STATE_BITFIELD)) => {
                        if downlink.send_async(bitfield_packet(bits)).await.is_err() {
                            return;
                        }
                    }
                    _ => (),
                }
            }
        });
    }

    #[tokio::test]
    async fn arming_request_payload() {
        let (uplink, rx) = flume::unbounded();
        let (_downlink, downlink_rx) = flume::unbounded();
        let supervisor = Supervisor::new(uplink, downlink_rx);

        supervisor.send_arming_request(true).await.unwrap();
        supervisor.send_arming_request(false).await.unwrap();

        let arm = rx.recv_async().await.unwrap();
        assert_eq!(arm.get_port(), SUPERVISOR_PORT);
        assert_eq!(arm.get_channel(), SUPERVISOR_CH_COMMAND);
        assert_eq!(arm.get_data()[..], [CMD_ARM_SYSTEM, 1]);

        let disarm = rx.recv_async().await.unwrap();
        assert_eq!(disarm.get_data()[..], [CMD_ARM_SYSTEM, 0]);
    }

    #[test]
    fn bitfield_flags() {
        let info = SupervisorInfo::from_bits(0b11);
        assert!(info.can_be_armed());
        assert!(info.is_armed());

        let info = SupervisorInfo::from_bits(0b01);
        assert!(info.can_be_armed());
        assert!(!info.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn read_bitfield_skips_unrelated_packets() {
        let (uplink, uplink_rx) = flume::unbounded();
        let (downlink, downlink_rx) = flume::unbounded();
        let supervisor = Supervisor::new(uplink, downlink_rx);

        downlink.send(Packet::new(SUPERVISOR_PORT, SUPERVISOR_CH_COMMAND, vec![CMD_ARM_SYSTEM])).unwrap();
        let responder = tokio::spawn(async move {
            let request = uplink_rx.recv_async().await.unwrap();
            assert_eq!(request.get_channel(), SUPERVISOR_CH_INFO);
            assert_eq!(request.get_data()[..], [CMD_GET_STATE_BITFIELD]);

            downlink.send(Packet::new(SUPERVISOR_PORT, SUPERVISOR_CH_INFO, vec![0x0D, 0xFF, 0xFF])).unwrap();
            downlink.send(Packet::new(SUPERVISOR_PORT, SUPERVISOR_CH_INFO, vec![0x8C, 0x03])).unwrap();
            downlink.send(Packet::new(SUPERVISOR_PORT, SUPERVISOR_CH_INFO, vec![0x8C, 0x03, 0x00])).unwrap();
            downlink
        });

        let info = supervisor.read_bitfield().await.unwrap();
        assert_eq!(info, SupervisorInfo::from_bits(0b11));
        let _downlink = responder.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn arming_is_confirmed() {
        let (uplink, uplink_rx) = flume::unbounded();
        let (downlink, downlink_rx) = flume::unbounded();
        let supervisor = Supervisor::new(uplink, downlink_rx);
        spawn_crazyflie(uplink_rx, downlink, true);

        supervisor.send_arming_request(true).await.unwrap();
        supervisor.confirm_armed().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refused_arming_is_reported() {
        let (uplink, uplink_rx) = flume::unbounded();
        let (downlink, downlink_rx) = flume::unbounded();
        let supervisor = Supervisor::new(uplink, downlink_rx);
        spawn_crazyflie(uplink_rx, downlink, false);

        supervisor.send_arming_request(true).await.unwrap();
        assert_eq!(supervisor.confirm_armed().await, Err(Error::ArmingRefused));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_crazyflie_times_out() {
        let (uplink, _uplink_rx) = flume::unbounded();
        let (_downlink, downlink_rx) = flume::unbounded();
        let supervisor = Supervisor::new(uplink, downlink_rx);

        assert_eq!(supervisor.read_bitfield().await, Err(Error::Timeout));
    }

    #[tokio::test]
    async fn closed_downlink_is_a_disconnection() {
        let (uplink, _uplink_rx) = flume::unbounded();
        let (downlink, downlink_rx) = flume::unbounded::<Packet>();
        let supervisor = Supervisor::new(uplink, downlink_rx);
        drop(downlink);

        assert_eq!(supervisor.read_bitfield().await, Err(Error::Disconnected));
    }
}
