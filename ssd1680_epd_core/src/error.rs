use std::time::Duration;

/// The busy line did not settle within the poll budget or the deadline.
///
/// The controller may still finish on its own, so this is a best-effort signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timeout: {:?}, elapsed: {:?}, polls: {}", self.timeout, self.elapsed, self.polls)]
pub struct TimeOutError {
    pub timeout: Duration,
    pub elapsed: Duration,
    pub polls: u32,
}
