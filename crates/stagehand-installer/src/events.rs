//! Event types used to coordinate terminal input and executor progress.

use crossterm::event::Event;

pub enum UiMessage {
    Input(Event),
}

/// Progress reported by the executor, indexed into the planned steps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgressEvent {
    StepStarted(usize),
    StepCompleted(usize),
    StepWarned(usize, String),
    StepFailed(usize, String),
    StepStopped(usize),
    LogLine(String),
    Finished,
}
