use crate::error::{ContribError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What an interrupt should do given how many came before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// First interrupt: stop issuing remote requests.
    Stop,
    /// Repeated interrupt while a request is still blocking: leave now.
    Exit,
}

/// Shared flag tripped by the interrupt handler and polled before every
/// remote request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ContribError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Records one interrupt and reports what the caller should do about it.
    pub fn interrupt(&self) -> InterruptAction {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            InterruptAction::Exit
        } else {
            InterruptAction::Stop
        }
    }

    /// Trip this token on SIGINT. A second SIGINT runs `on_exit` and ends
    /// the process with status 0 without waiting for the blocked request.
    pub fn install_interrupt_handler<F>(&self, on_exit: F) -> std::result::Result<(), ctrlc::Error>
    where
        F: Fn() + Send + 'static,
    {
        let token = self.clone();
        ctrlc::set_handler(move || {
            if token.interrupt() == InterruptAction::Exit {
                on_exit();
                std::process::exit(0);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_interrupt_asks_to_exit() {
        let token = CancelToken::new();
        assert_eq!(token.interrupt(), InterruptAction::Stop);
        assert!(matches!(token.check(), Err(ContribError::Interrupted)));
        assert_eq!(token.interrupt(), InterruptAction::Exit);
        assert_eq!(token.clone().interrupt(), InterruptAction::Exit);
    }
}
