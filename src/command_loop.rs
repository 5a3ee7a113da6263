//! Periodic command loop
//!
//! One loop runs per armed pattern. Every tick it advances the session trajectory and sends the
//! resulting frame. The loop stops when its cancellation flag is raised or on the first
//! dispatch failure.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::session::{lock, SessionState};
use crate::transport::Transport;
use crate::Error;

pub(crate) async fn run(
    state: Arc<Mutex<SessionState>>,
    transport: Arc<dyn Transport>,
    cancel: Arc<AtomicBool>,
    period: Duration,
) {
    // First tick one period after arming
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let scheduled = interval.tick().await;

        // A late tick stretches the period, which changes the distance flown per unit of time
        let late = Instant::now().saturating_duration_since(scheduled);
        if late >= period {
            log::warn!("Tick {:?} late, previous dispatch took longer than {:?}", late, period);
        }

        // The flag is only raised with the state locked, no tick can slip past a cancellation
        let command = {
            let mut state = lock(&state);
            if cancel.load(Relaxed) {
                return;
            }

            let command = state.trajectory.advance();
            log::trace!("{:.2}: {:?}", state.trajectory.phase(), command);
            command
        };

        if let Err(e) = transport.send_command(command).await {
            log::error!("Error sending virtual stick command, stopping stream: {}", e);

            let mut state = lock(&state);
            cancel.store(true, Relaxed);

            // A newer stream may already have replaced this one
            let current = state
                .stream
                .as_ref()
                .map_or(false, |stream| Arc::ptr_eq(&stream.cancel, &cancel));
            if current {
                state.stream = None;
                state.last_error = Some(Error::DispatchFailure(e.to_string()));
            }
            return;
        }
    }
}
