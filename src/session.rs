use std::path::PathBuf;
use std::time::{Duration, Instant};
use chrono::{DateTime, Local};
use crate::recorder::{DataWriter, RecorderError};
use crate::timer::IntervalTimer;
pub const GO: &str = "go";
pub const STOP: &str = "stop";
#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Idle,
    Recording {
        started: DateTime<Local>,
        path: PathBuf,
    },
}
/// The "take data" toggle and everything it drives: the poll timer, the
/// elapsed-time label and the file path label.
pub struct Session {
    state: SessionState,
    button_text: &'static str,
    button_enabled: bool,
    poll_timer: IntervalTimer,
    elapsed: String,
    filepath: String,
}
impl Session {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            button_text: GO,
            button_enabled: true,
            poll_timer: IntervalTimer::new(poll_interval),
            elapsed: String::new(),
            filepath: String::new(),
        }
    }
    pub fn state(&self) -> &SessionState {
        &self.state
    }
    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording { .. })
    }
    pub fn button_text(&self) -> &'static str {
        self.button_text
    }
    pub fn button_enabled(&self) -> bool {
        self.button_enabled
    }
    pub fn elapsed_label(&self) -> &str {
        &self.elapsed
    }
    pub fn filepath_label(&self) -> &str {
        &self.filepath
    }
    pub fn poll_timer(&self) -> &IntervalTimer {
        &self.poll_timer
    }
    /// Handles a press of the take-data button.
    ///
    /// The button is disabled while the handler runs and re-enabled afterwards
    /// whatever the outcome; presses arriving while disabled are dropped.
    pub fn on_take_data(
        &mut self,
        writer: &mut DataWriter,
        now: DateTime<Local>,
        clock: Instant,
    ) -> Result<(), RecorderError> {
        if !self.button_enabled {
            return Ok(());
        }
        self.button_enabled = false;
        let result = if self.is_recording() {
            self.stop();
            Ok(())
        } else {
            self.start(writer, now, clock)
        };
        self.button_enabled = true;
        result
    }
    fn start(
        &mut self,
        writer: &mut DataWriter,
        now: DateTime<Local>,
        clock: Instant,
    ) -> Result<(), RecorderError> {
        let path = writer.create_file(now)?;
        self.poll_timer.start(clock);
        self.filepath = path.display().to_string();
        self.elapsed = format_elapsed(0);
        self.button_text = STOP;
        self.state = SessionState::Recording {
            started: now,
            path,
        };
        Ok(())
    }
    fn stop(&mut self) {
        self.poll_timer.stop();
        self.button_text = GO;
        self.state = SessionState::Idle;
        log::info!("💾 Recording stopped.");
    }
    /// Runs the poll tick if it is due: refreshes the elapsed label and
    /// appends one row. Returns `None` when nothing was due.
    pub fn poll(
        &mut self,
        writer: &mut DataWriter,
        now: DateTime<Local>,
        clock: Instant,
    ) -> Option<Result<(), RecorderError>> {
        let SessionState::Recording { started, .. } = &self.state else {
            return None;
        };
        if !self.poll_timer.poll(clock) {
            return None;
        }
        self.elapsed = format_elapsed((now - *started).num_seconds());
        Some(writer.write())
    }
}
/// `mm:ss`, zero padded; minutes keep growing past 99.
pub fn format_elapsed(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    format!("{:02}:{:02}", total / 60, total % 60)
}
