// Recording transport shared by the integration tests

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use virtual_sticks::{AxisCommand, Error, Result, Transport};

#[derive(Default)]
struct Record {
    commands: Vec<AxisCommand>,
    control_mode: Vec<bool>,
}

/// Transport recording everything it is asked to send
///
/// `fail_on_send` makes the n-th send (1-based) and every following one fail, `fail_enable`
/// rejects control mode changes and `send_delay` makes every send take that long.
#[derive(Clone, Default)]
pub struct MockTransport {
    record: Arc<Mutex<Record>>,
    fail_on_send: Option<usize>,
    fail_enable: Arc<AtomicBool>,
    send_delay: Option<Duration>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_send(n: usize) -> Self {
        Self {
            fail_on_send: Some(n),
            ..Self::default()
        }
    }

    pub fn failing_enable() -> Self {
        let transport = Self::default();
        transport.set_enable_failure(true);
        transport
    }

    pub fn slow(send_delay: Duration) -> Self {
        Self {
            send_delay: Some(send_delay),
            ..Self::default()
        }
    }

    /// Make the following control mode changes fail (or succeed again)
    pub fn set_enable_failure(&self, fail: bool) {
        self.fail_enable.store(fail, Relaxed);
    }

    /// Every command send attempt, failed ones included
    pub fn commands(&self) -> Vec<AxisCommand> {
        self.record.lock().unwrap().commands.clone()
    }

    pub fn control_mode_requests(&self) -> Vec<bool> {
        self.record.lock().unwrap().control_mode.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn enable_control_mode(&self, enabled: bool) -> Result<()> {
        self.record.lock().unwrap().control_mode.push(enabled);
        if self.fail_enable.load(Relaxed) {
            return Err(Error::Disconnected);
        }
        Ok(())
    }

    async fn send_command(&self, command: AxisCommand) -> Result<()> {
        let sent = {
            let mut record = self.record.lock().unwrap();
            record.commands.push(command);
            record.commands.len()
        };

        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }

        match self.fail_on_send {
            Some(n) if sent >= n => Err(Error::Disconnected),
            _ => Ok(()),
        }
    }
}

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
