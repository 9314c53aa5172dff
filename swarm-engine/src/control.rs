//! Controle de execução: cancelamento e limite de tempo
//!
//! Ambos são verificados apenas entre iterações, nunca no meio de uma.

use crate::types::TerminationReason;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Token de cancelamento compartilhável entre threads
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pede o cancelamento; a execução para na próxima fronteira de iteração
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Rearma o token para uma nova execução
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Cancelamento e prazo de uma execução em andamento
#[derive(Debug, Clone, Default)]
pub(crate) struct RunControl {
    token: Option<CancellationToken>,
    time_limit: Option<Duration>,
}

impl RunControl {
    pub(crate) fn new(token: Option<CancellationToken>, time_limit: Option<Duration>) -> Self {
        Self { token, time_limit }
    }

    /// Motivo para interromper na fronteira atual, se houver
    pub(crate) fn interruption(&self, started: Instant) -> Option<TerminationReason> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(TerminationReason::Cancelled);
        }
        match self.time_limit {
            Some(limit) if started.elapsed() >= limit => Some(TerminationReason::TimeLimit),
            _ => None,
        }
    }
}
