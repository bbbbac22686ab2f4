//! Cooperative cancellation for long-running routine analyses.
//!
//! A host that wants to abandon an analysis in flight (the user edited the
//! file again, a build was interrupted) keeps a clone of the flag and trips
//! it. The driver polls the flag between block iterations and stops at the
//! next one, returning whatever it computed so far together with an
//! `AnalysisIncomplete` diagnostic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Returned by `CancellationFlag::check` once the host has tripped the flag.
/// The driver turns it into the reason attached to `AnalysisIncomplete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisCanceled;

impl std::fmt::Display for AnalysisCanceled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("the analysis was canceled by its host")
    }
}

impl std::error::Error for AnalysisCanceled {}

/// Shared between the host and every worker analysing a routine.
/// Cloning hands out another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    canceled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Polled by the driver between block visits.
    pub fn check(&self) -> Result<(), AnalysisCanceled> {
        if self.is_canceled() {
            return Err(AnalysisCanceled);
        }

        Ok(())
    }
}
