//! # Virtual stick session
//!
//! A [Session] owns everything needed to stream a trajectory: the [Transport], the phase
//! accumulator, the armed [Pattern] and the handle of the running command loop. It moves
//! between two states:
//!
//! ```text
//!           arm(P)                     arm(P')
//!   Idle ----------> Streaming(P) ----------> Streaming(P')
//!    ^                    |
//!    +--------------------+
//!     dispatch error, stop(), disable()
//! ```
//!
//! There is no automatic way back to streaming: after a dispatch failure the pattern has to
//! be armed again.
//!
//! ``` no_run
//! # async fn demo(transport: impl virtual_sticks::Transport + 'static) -> virtual_sticks::Result<()> {
//! use std::time::Duration;
//! use virtual_sticks::{Pattern, Session, StreamState};
//!
//! let session = Session::new(transport);
//!
//! // Control mode must be enabled before anything is streamed
//! session.enable().await?;
//!
//! session.arm(Pattern::RollLeftRight)?;
//! tokio::time::sleep(Duration::from_secs(5)).await;
//!
//! // Switching pattern restarts the phase at 0
//! session.arm(Pattern::VerticalOrbit)?;
//! tokio::time::sleep(Duration::from_secs(5)).await;
//!
//! if session.state() == StreamState::Idle {
//!     println!("Stream stopped: {:?}", session.last_error());
//! }
//!
//! session.disable().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::command_loop;
use crate::config::StreamConfig;
use crate::pattern::{AxisCommand, Pattern, Trajectory};
use crate::transport::Transport;
use crate::{Error, Result};

/// Streaming state of a [Session]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No command is being sent
    Idle,
    /// A command loop is running the pattern
    Streaming(Pattern),
}

pub(crate) struct ActiveStream {
    pattern: Pattern,
    pub(crate) cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ActiveStream {
    fn cancel(self) {
        self.cancel.store(true, Relaxed);
        self.task.abort();
    }
}

pub(crate) struct SessionState {
    pub(crate) trajectory: Trajectory,
    pub(crate) stream: Option<ActiveStream>,
    pub(crate) last_error: Option<Error>,
    control_enabled: bool,
}

impl SessionState {
    fn cancel_stream(&mut self, reason: &str) {
        if let Some(stream) = self.stream.take() {
            log::debug!("{} {} stream", reason, stream.pattern);
            stream.cancel();
        }
    }
}

pub(crate) fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Virtual stick session
///
/// Holds the trajectory state and at most one running command loop. All methods take `&self`
/// so the session can be shared between tasks using `Arc<>`.
///
/// See the [session module documentation](crate::session) for more context and information.
pub struct Session {
    transport: Arc<dyn Transport>,
    config: StreamConfig,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Create a session with the default [StreamConfig]
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::build(Arc::new(transport), StreamConfig::default())
    }

    /// Create a session with a custom configuration
    ///
    /// Returns [Error::InvalidConfig] if the configuration does not [validate](StreamConfig::validate()).
    pub fn with_config(transport: impl Transport + 'static, config: StreamConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::build(Arc::new(transport), config))
    }

    fn build(transport: Arc<dyn Transport>, config: StreamConfig) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(SessionState {
                trajectory: Trajectory::new(config.velocity),
                stream: None,
                last_error: None,
                control_enabled: false,
            })),
            config,
        }
    }

    /// Enable the virtual stick control mode
    ///
    /// Must succeed before a pattern can be armed. On failure the session is disabled, any
    /// running stream is stopped and [Error::ModeEnableFailure] is returned.
    pub async fn enable(&self) -> Result<()> {
        let result = self.transport.enable_control_mode(true).await;

        let mut state = lock(&self.state);
        match result {
            Ok(()) => {
                state.control_enabled = true;
                log::info!("Virtual stick control mode enabled");
                Ok(())
            }
            Err(e) => {
                log::error!("Error enabling virtual stick control mode: {}", e);
                state.control_enabled = false;
                state.cancel_stream("Stopping");

                let error = Error::ModeEnableFailure(e.to_string());
                state.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Start streaming a pattern
    ///
    /// Any running stream is cancelled first, the phase is reset to 0 and a new command loop
    /// is started at the pattern tick interval. No tick of the previous stream runs once this
    /// function returns.
    ///
    /// Must be called from within a tokio runtime. Returns [Error::ControlModeDisabled] if
    /// [Session::enable()] has not succeeded.
    pub fn arm(&self, pattern: Pattern) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let period = self.config.interval_for(pattern);

        // Control mode is read under the same lock that disable() and enable() clear it with
        let mut state = lock(&self.state);
        if !state.control_enabled {
            return Err(Error::ControlModeDisabled);
        }

        state.cancel_stream("Cancelling");

        state.trajectory.rearm(pattern);
        state.last_error = None;

        let cancel = Arc::new(AtomicBool::new(false));
        let task = runtime.spawn(command_loop::run(
            self.state.clone(),
            self.transport.clone(),
            cancel.clone(),
            period,
        ));
        state.stream = Some(ActiveStream {
            pattern,
            cancel,
            task,
        });

        log::debug!("Streaming {} every {:?}", pattern, period);
        Ok(())
    }

    /// Stop streaming
    ///
    /// The control mode is left enabled, a pattern can be armed again right away.
    pub fn stop(&self) {
        lock(&self.state).cancel_stream("Stopping");
    }

    /// Stop streaming and leave the virtual stick control mode
    ///
    /// The stream is stopped and the session considered disabled even if the transport fails
    /// to leave the control mode, in which case [Error::ModeEnableFailure] is returned.
    pub async fn disable(&self) -> Result<()> {
        {
            let mut state = lock(&self.state);
            state.control_enabled = false;
            state.cancel_stream("Stopping");
        }

        self.transport.enable_control_mode(false).await.map_err(|e| {
            log::error!("Error disabling virtual stick control mode: {}", e);
            Error::ModeEnableFailure(e.to_string())
        })?;

        log::info!("Virtual stick control mode disabled");
        Ok(())
    }

    /// Current streaming state
    pub fn state(&self) -> StreamState {
        match &lock(&self.state).stream {
            Some(stream) => StreamState::Streaming(stream.pattern),
            None => StreamState::Idle,
        }
    }

    /// Current phase in radians
    pub fn phase(&self) -> f32 {
        lock(&self.state).trajectory.phase()
    }

    /// Last command computed by the trajectory
    pub fn last_command(&self) -> AxisCommand {
        lock(&self.state).trajectory.last_command()
    }

    /// Error that ended the last stream or enable attempt
    ///
    /// Cleared when a pattern is armed.
    pub fn last_error(&self) -> Option<Error> {
        lock(&self.state).last_error.clone()
    }

    /// True once [Session::enable()] succeeded and until [Session::disable()] is called
    pub fn is_control_enabled(&self) -> bool {
        lock(&self.state).control_enabled
    }

    /// Stream configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        lock(&self.state).cancel_stream("Dropping");
    }
}
