//! Interactive step checklist: each step's timer runs on its own ticker.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::presentation::render_step;
use crate::schema::Recipe;
use crate::timer::{spawn_ticker, SharedTimer, StepProgress, TimerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookCommand {
    Start(usize),
    Pause(usize),
    Done(usize),
    Show,
    Help,
    Quit,
}

impl CookCommand {
    /// Parses `start 2`, `pause 2`, `done 2`, `show`, `help`, `quit`.
    /// Step numbers are 1-based as displayed.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next()?.to_lowercase();
        let step = parts
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1));
        if parts.next().is_some() {
            return None;
        }
        match (verb.as_str(), step) {
            ("start" | "s", Some(i)) => Some(Self::Start(i)),
            ("pause" | "p", Some(i)) => Some(Self::Pause(i)),
            ("done" | "check" | "d", Some(i)) => Some(Self::Done(i)),
            ("show" | "ls", None) => Some(Self::Show),
            ("help" | "?", None) => Some(Self::Help),
            ("quit" | "exit" | "q", None) => Some(Self::Quit),
            _ => None,
        }
    }
}

pub const HELP: &str = "commands: start N | pause N | done N | show | help | quit";

struct CookStep {
    progress: StepProgress,
    timer: Option<SharedTimer>,
}

/// Live checklist for one recipe.
pub struct Kitchen {
    steps: Vec<CookStep>,
    // Receives the 1-based number of each step whose countdown ran out.
    elapsed_tx: UnboundedSender<usize>,
}

impl Kitchen {
    pub fn new(recipe: &Recipe, elapsed_tx: UnboundedSender<usize>) -> Self {
        let steps = StepProgress::for_recipe(recipe)
            .into_iter()
            .map(|mut progress| {
                let timer = progress.timer.take().map(|t| Arc::new(Mutex::new(t)));
                CookStep { progress, timer }
            })
            .collect();
        Self { steps, elapsed_tx }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Current state of every step, timers included.
    pub fn snapshot(&self) -> Vec<StepProgress> {
        self.steps
            .iter()
            .map(|s| StepProgress {
                timer: s.timer.as_ref().map(|t| t.lock().clone()),
                ..s.progress.clone()
            })
            .collect()
    }

    pub fn all_checked(&self) -> bool {
        self.steps.iter().all(|s| s.progress.checked)
    }

    pub fn render(&self) -> String {
        self.snapshot()
            .iter()
            .enumerate()
            .map(|(i, p)| render_step(i, p))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Applies a command and returns the message to show.
    pub fn apply(&mut self, command: CookCommand) -> String {
        match command {
            CookCommand::Start(i) => self.with_timer(i, |number, timer, tx| {
                let started = timer.lock().start();
                if !started {
                    return format!("step {} timer cannot be started", number);
                }
                spawn_ticker(timer.clone(), move || {
                    let _ = tx.send(number);
                });
                format!("step {} timer started", number)
            }),
            CookCommand::Pause(i) => self.with_timer(i, |number, timer, _| {
                let mut guard = timer.lock();
                if guard.pause() {
                    format!("step {} timer paused at {}", number, guard.display())
                } else {
                    format!("step {} timer is not running", number)
                }
            }),
            CookCommand::Done(i) => match self.steps.get_mut(i) {
                Some(step) => {
                    step.progress.check_off();
                    if let Some(timer) = &step.timer {
                        timer.lock().complete();
                    }
                    format!("step {} done", i + 1)
                }
                None => self.no_such_step(i),
            },
            CookCommand::Show => self.render(),
            CookCommand::Help => HELP.to_string(),
            CookCommand::Quit => "bye".to_string(),
        }
    }

    fn with_timer(
        &self,
        index: usize,
        action: impl FnOnce(usize, &SharedTimer, UnboundedSender<usize>) -> String,
    ) -> String {
        let Some(step) = self.steps.get(index) else {
            return self.no_such_step(index);
        };
        let Some(timer) = &step.timer else {
            return format!("step {} has no timer", index + 1);
        };
        let finished = timer.lock().state() == TimerState::Completed;
        if finished {
            return format!("step {} timer already finished", index + 1);
        }
        action(index + 1, timer, self.elapsed_tx.clone())
    }

    fn no_such_step(&self, index: usize) -> String {
        format!("there is no step {} (1-{})", index + 1, self.steps.len())
    }
}
