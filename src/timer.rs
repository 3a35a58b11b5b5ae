//! Per-step countdown timers.
//!
//! Model output has carried timers both as free text (`"10-12 minutes"`) and
//! as clocks (`"00:10:00"`). [`parse_timer`] folds either into a whole number
//! of seconds; [`StepTimer`] is the countdown state machine for one step.

use parking_lot::Mutex;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::schema::{Recipe, RecipeStep};

const ONE_SECOND: Duration = Duration::from_secs(1);

fn clock_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,3}):(\d{1,2})(?::(\d{1,2}))?\s*$").expect("clock pattern is valid")
    })
}

fn term_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?P<a>\d*\.?\d+)(?:\s*(?:-|–|to)\s*(?P<b>\d*\.?\d+))?\s*(?P<unit>hours?|hrs?|h|minutes?|mins?|m|seconds?|secs?|s)\b",
        )
        .expect("duration pattern is valid")
    })
}

/// Parses a step timer into a canonical duration.
///
/// Accepted forms, case-insensitive:
/// - clocks `H:MM:SS`, `HH:MM:SS` and `MM:SS`;
/// - one or more `<number> <unit>` terms (`"1 hour 30 minutes"`, `"1.5 hrs"`),
///   units being h/hr/hrs/hour(s), m/min/mins/minute(s), s/sec/secs/second(s);
/// - ranges `"10-12 minutes"` / `"2 to 3 hours"`, which take the lower bound.
///
/// Returns `None` for anything else and for a zero duration.
pub fn parse_timer(text: &str) -> Option<Duration> {
    let seconds = parse_clock(text).or_else(|| parse_terms(text))?;
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

fn parse_clock(text: &str) -> Option<u64> {
    let caps = clock_regex().captures(text)?;
    let first: u64 = caps[1].parse().ok()?;
    let second: u64 = caps[2].parse().ok()?;
    match caps.get(3) {
        Some(third) => {
            let third: u64 = third.as_str().parse().ok()?;
            (second < 60 && third < 60).then(|| first * 3600 + second * 60 + third)
        }
        None => (second < 60).then(|| first * 60 + second),
    }
}

fn parse_terms(text: &str) -> Option<u64> {
    let mut total = 0.0_f64;
    let mut matched = false;
    for caps in term_regex().captures_iter(text) {
        let Some(amount) = caps.name("a").and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        let unit = caps["unit"].to_lowercase();
        let scale = match unit.chars().next() {
            Some('h') => 3600.0,
            Some('m') => 60.0,
            _ => 1.0,
        };
        total += amount * scale;
        matched = true;
    }
    (matched && total.is_finite()).then(|| total.round() as u64)
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCause {
    /// The countdown reached zero.
    Elapsed,
    /// The user checked the step off.
    CheckedOff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTimer {
    remaining: Duration,
    state: TimerState,
    cause: Option<CompletionCause>,
    // Bumped on every start so a stale ticker task can tell it was superseded.
    run_id: u64,
}

impl StepTimer {
    pub fn new(duration: Duration) -> Self {
        let whole = Duration::from_secs(duration.as_secs());
        let mut timer = Self {
            remaining: whole,
            state: TimerState::Idle,
            cause: None,
            run_id: 0,
        };
        if whole.is_zero() {
            timer.finish(CompletionCause::Elapsed);
        }
        timer
    }

    /// Timer for a textual duration; `None` leaves the step without a timer control.
    pub fn from_text(text: &str) -> Option<Self> {
        parse_timer(text).map(Self::new)
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn completion_cause(&self) -> Option<CompletionCause> {
        self.cause
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn controls_enabled(&self) -> bool {
        self.state != TimerState::Completed
    }

    /// Idle/Paused → Running.
    pub fn start(&mut self) -> bool {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                self.state = TimerState::Running;
                self.run_id += 1;
                true
            }
            TimerState::Running | TimerState::Completed => false,
        }
    }

    /// Running → Paused, holding the remaining time.
    pub fn pause(&mut self) -> bool {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
            true
        } else {
            false
        }
    }

    /// One second of elapsed time. Only a running timer counts down; reaching
    /// zero completes it.
    pub fn tick(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(ONE_SECOND);
        if self.remaining.is_zero() {
            self.finish(CompletionCause::Elapsed);
        }
        true
    }

    /// Any non-completed state → Completed (the step was checked off).
    pub fn complete(&mut self) -> bool {
        if self.state == TimerState::Completed {
            return false;
        }
        self.finish(CompletionCause::CheckedOff);
        true
    }

    fn finish(&mut self, cause: CompletionCause) {
        self.state = TimerState::Completed;
        self.cause = Some(cause);
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }
}

impl fmt::Display for StepTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match (self.state, self.cause) {
            (TimerState::Idle, _) => "ready",
            (TimerState::Running, _) => "running",
            (TimerState::Paused, _) => "paused",
            (TimerState::Completed, Some(CompletionCause::Elapsed)) => "time's up",
            (TimerState::Completed, _) => "done",
        };
        write!(f, "{} ({})", self.display(), label)
    }
}

/// One rendered instruction step: its text, optional timer and checkbox.
#[derive(Debug, Clone, PartialEq)]
pub struct StepProgress {
    pub step: RecipeStep,
    pub timer: Option<StepTimer>,
    pub checked: bool,
}

impl StepProgress {
    pub fn new(step: RecipeStep) -> Self {
        let timer = step.timer_duration().map(StepTimer::new);
        Self {
            step,
            timer,
            checked: false,
        }
    }

    pub fn for_recipe(recipe: &Recipe) -> Vec<Self> {
        recipe.instructions.iter().cloned().map(Self::new).collect()
    }

    /// Checks the step off; its timer stops for good.
    pub fn check_off(&mut self) {
        self.checked = true;
        if let Some(timer) = self.timer.as_mut() {
            timer.complete();
        }
    }
}

pub type SharedTimer = Arc<Mutex<StepTimer>>;

/// Drives a started timer once per second on its own task.
///
/// The task exits as soon as the timer is paused, completed, or restarted
/// (a restart spawns a fresh ticker). `on_elapsed` runs only when the
/// countdown itself reaches zero.
pub fn spawn_ticker<F>(timer: SharedTimer, on_elapsed: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    let run_id = timer.lock().run_id();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ONE_SECOND);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let mut guard = timer.lock();
            if guard.run_id() != run_id || !guard.tick() {
                debug!(run_id, "ticker stopped");
                return;
            }
            if guard.state() == TimerState::Completed {
                drop(guard);
                on_elapsed();
                return;
            }
        }
    })
}
