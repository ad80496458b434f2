//! Process state machine.
//!
//! # State Transitions
//! ```text
//! NotStarted → Configuring → NodeInitializing → NodeReady → Running
//!                                    │                         │
//!                                    ▼                         ▼
//!                                  Failed                ShuttingDown → Terminated
//! ```
//!
//! Front-end startups never move this machine; the process is `Running` as
//! soon as their tasks are submitted.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted = 0,
    Configuring = 1,
    NodeInitializing = 2,
    NodeReady = 3,
    Failed = 4,
    Running = 5,
    ShuttingDown = 6,
    Terminated = 7,
}

impl From<u8> for ProcessState {
    fn from(val: u8) -> Self {
        match val {
            1 => ProcessState::Configuring,
            2 => ProcessState::NodeInitializing,
            3 => ProcessState::NodeReady,
            4 => ProcessState::Failed,
            5 => ProcessState::Running,
            6 => ProcessState::ShuttingDown,
            7 => ProcessState::Terminated,
            _ => ProcessState::NotStarted,
        }
    }
}

impl ProcessState {
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (NotStarted, Configuring)
                | (Configuring, NodeInitializing)
                | (NodeInitializing, NodeReady)
                | (NodeInitializing, Failed)
                | (NodeReady, Running)
                | (Running, ShuttingDown)
                | (ShuttingDown, Terminated)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::Failed | ProcessState::Terminated)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal process transition {from} -> {to}")]
pub struct TransitionError {
    pub from: ProcessState,
    pub to: ProcessState,
}

/// Shared, lock-free holder of the current [`ProcessState`].
#[derive(Debug)]
pub struct ProcessStatus {
    state: AtomicU8,
}

impl ProcessStatus {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ProcessState::NotStarted as u8),
        }
    }

    pub fn current(&self) -> ProcessState {
        ProcessState::from(self.state.load(Ordering::SeqCst))
    }

    /// Move to `next` if the machine allows it from the current state.
    pub fn transition(&self, next: ProcessState) -> Result<ProcessState, TransitionError> {
        let mut current = self.current();
        loop {
            if !current.can_transition_to(next) {
                return Err(TransitionError {
                    from: current,
                    to: next,
                });
            }

            match self.state.compare_exchange(
                current as u8,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    tracing::debug!(from = %current, to = %next, "Process state changed");
                    return Ok(current);
                }
                Err(actual) => current = ProcessState::from(actual),
            }
        }
    }
}

impl Default for ProcessStatus {
    fn default() -> Self {
        Self::new()
    }
}
