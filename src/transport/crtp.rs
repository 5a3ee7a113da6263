//! # Crazyflie transport
//!
//! [CrtpTransport] flies virtual sticks on a Crazyflie. Stick frames are sent as generic
//! velocity world setpoints, the normalized axes being scaled to velocities:
//!
//! | Axis | Setpoint |
//! |------|----------|
//! | pitch | `vx = pitch × max_velocity` (forward) |
//! | roll | `vy = -roll × max_velocity` (positive roll goes right, y points left) |
//! | vertical throttle | `vz = vertical_throttle × max_velocity` |
//! | yaw | `yawrate = yaw × max_yaw_rate` |
//!
//! Enabling the control mode arms the Crazyflie and only succeeds once the supervisor reports
//! the system as armed. Disabling it hands the setpoint priority back and disarms.
//!
//! ``` no_run
//! # async fn fly() -> Result<(), Box<dyn std::error::Error>> {
//! use virtual_sticks::{Pattern, Session};
//! use virtual_sticks::transport::crtp::CrtpTransport;
//!
//! let link_context = crazyflie_link::LinkContext::new();
//! let transport = CrtpTransport::connect_from_uri(&link_context, "radio://0/80/2M/E7E7E7E7E7").await?;
//!
//! let session = Session::new(transport);
//! session.enable().await?;
//! session.arm(Pattern::HorizontalOrbit)?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flume as channel;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::pattern::AxisCommand;
use crate::subsystems::commander::Commander;
use crate::subsystems::supervisor::{Supervisor, SUPERVISOR_PORT};
use crate::transport::Transport;
use crate::Result;

/// Default velocity reached at full stick deflection, in meters/second
pub const DEFAULT_MAX_VELOCITY: f32 = 0.5;
/// Default yaw rate reached at full stick deflection, in degrees/second
pub const DEFAULT_MAX_YAW_RATE: f32 = 90.0;

/// Virtual stick transport over a Crazyflie link
///
/// Like the link it wraps, this object is one-time use: once disconnected a new one has to be
/// created.
pub struct CrtpTransport {
    commander: Commander,
    supervisor: Supervisor,
    max_velocity: f32,
    max_yaw_rate: f32,
    uplink_task: Mutex<Option<JoinHandle<()>>>,
    downlink_task: Mutex<Option<JoinHandle<()>>>,
    disconnect: Arc<AtomicBool>,
    link: Arc<crazyflie_link::Connection>,
}

impl CrtpTransport {
    /// Open a link to the given URI
    ///
    /// This function opens a link to the given URI and calls [CrtpTransport::connect_from_link()].
    pub async fn connect_from_uri(link_context: &crazyflie_link::LinkContext, uri: &str) -> Result<Self> {
        let link = link_context.open_link(uri).await?;

        Self::connect_from_link(link).await
    }

    /// Use an already connected link
    ///
    /// Spawns the uplink and downlink tasks on the current tokio runtime.
    pub async fn connect_from_link(link: crazyflie_link::Connection) -> Result<Self> {
        let disconnect = Arc::new(AtomicBool::new(false));
        let link = Arc::new(link);

        // Uplink queue
        let disconnect_uplink = disconnect.clone();
        let (uplink, rx) = channel::unbounded();
        let link_uplink = link.clone();
        let uplink_task = tokio::spawn(async move {
            while !disconnect_uplink.load(Relaxed) {
                match tokio::time::timeout(Duration::from_millis(100), rx.recv_async()).await {
                    Ok(Ok(pk)) => {
                        if link_uplink.send_packet(pk).await.is_err() {
                            log::warn!("Link closed, stopping uplink");
                            return;
                        }
                    }
                    Err(_) => (),
                    Ok(Err(flume::RecvError::Disconnected)) => return,
                }
            }
        });

        // Only supervisor answers are needed, everything else received is dropped
        let disconnect_downlink = disconnect.clone();
        let (supervisor_downlink, supervisor_rx) = channel::unbounded();
        let link_downlink = link.clone();
        let downlink_task = tokio::spawn(async move {
            while !disconnect_downlink.load(Relaxed) {
                match tokio::time::timeout(Duration::from_millis(200), link_downlink.recv_packet()).await {
                    Ok(Ok(pk)) => {
                        if pk.get_port() == SUPERVISOR_PORT && supervisor_downlink.send_async(pk).await.is_err() {
                            return;
                        }
                    }
                    Err(_) => (),
                    Ok(Err(_)) => {
                        log::warn!("Link closed, stopping downlink");
                        return;
                    }
                }
            }
        });

        Ok(Self {
            commander: Commander::new(uplink.clone()),
            supervisor: Supervisor::new(uplink, supervisor_rx),
            max_velocity: DEFAULT_MAX_VELOCITY,
            max_yaw_rate: DEFAULT_MAX_YAW_RATE,
            uplink_task: Mutex::new(Some(uplink_task)),
            downlink_task: Mutex::new(Some(downlink_task)),
            disconnect,
            link,
        })
    }

    /// Set the velocity (m/s) and yaw rate (deg/s) reached at full stick deflection
    pub fn with_scale(mut self, max_velocity: f32, max_yaw_rate: f32) -> Self {
        self.max_velocity = max_velocity;
        self.max_yaw_rate = max_yaw_rate;
        self
    }

    /// Disconnect the link
    ///
    /// Once disconnected, [Transport] operations return [Error::Disconnected](crate::Error::Disconnected).
    pub async fn disconnect(&self) {
        self.disconnect.store(true, Relaxed);

        if let Some(uplink_task) = self.uplink_task.lock().await.take() {
            let _ = uplink_task.await;
        }
        if let Some(downlink_task) = self.downlink_task.lock().await.take() {
            let _ = downlink_task.await;
        }

        self.link.close().await;
    }
}

#[async_trait]
impl Transport for CrtpTransport {
    async fn enable_control_mode(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.supervisor.send_arming_request(true).await?;
            self.supervisor.confirm_armed().await
        } else {
            self.commander.notify_setpoint_stop(0).await?;
            self.supervisor.send_arming_request(false).await
        }
    }

    async fn send_command(&self, command: AxisCommand) -> Result<()> {
        self.commander
            .setpoint_velocity_world(
                command.pitch * self.max_velocity,
                -command.roll * self.max_velocity,
                command.vertical_throttle * self.max_velocity,
                command.yaw * self.max_yaw_rate,
            )
            .await
    }
}

impl Drop for CrtpTransport {
    fn drop(&mut self) {
        self.disconnect.store(true, Relaxed);
    }
}
