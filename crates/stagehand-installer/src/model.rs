//! Progress display types for the executor's planned steps.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    /// Finished with a non-fatal failure.
    Warned,
    Failed,
    /// Not run because the user stopped the sequence.
    Stopped,
}

pub struct ActionStep {
    pub name: &'static str,
    pub status: StepStatus,
}
