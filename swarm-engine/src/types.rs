//! Tipos compartilhados: snapshots, padrões, métricas e históricos

use crate::error::SwarmResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Timestamp em microsegundos desde epoch
pub type Timestamp = u64;

/// Timestamp atual em microsegundos
pub(crate) fn now_micros() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

// ═══════════════════════════════════════════════════════════════════════════════
// AGENTES
// ═══════════════════════════════════════════════════════════════════════════════

/// Visão somente-leitura de um agente, entregue ao detector de emergência
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: usize,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub fitness: f64,
}

impl AgentSnapshot {
    pub fn new(id: usize, position: Vec<f64>, velocity: Vec<f64>, fitness: f64) -> Self {
        Self {
            id,
            position,
            velocity,
            fitness,
        }
    }

    /// Distância euclidiana entre posições
    pub fn distance_to(&self, other: &AgentSnapshot) -> f64 {
        self.position
            .iter()
            .zip(&other.position)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PADRÕES EMERGENTES
// ═══════════════════════════════════════════════════════════════════════════════

/// Tipo de padrão coletivo detectado
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PatternType {
    /// Agentes agrupados no espaço de busca
    Clustering,
    /// Velocidades alinhadas
    Synchronization,
    /// Agentes com fitness destoante da média
    Specialization,
}

impl PatternType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clustering => "clustering",
            Self::Synchronization => "synchronization",
            Self::Specialization => "specialization",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Padrão emergente detectado; imutável após a criação
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergentPattern {
    pattern_type: PatternType,
    confidence: f64,
    participants: Vec<usize>,
    metrics: BTreeMap<String, f64>,
    timestamp: Timestamp,
}

impl EmergentPattern {
    /// Só o detector cria padrões. `participants` é ordenado e sem repetição.
    pub(crate) fn new(
        pattern_type: PatternType,
        confidence: f64,
        mut participants: Vec<usize>,
        metrics: BTreeMap<String, f64>,
    ) -> Self {
        participants.sort_unstable();
        participants.dedup();
        Self {
            pattern_type,
            confidence: confidence.clamp(0.0, 1.0),
            participants,
            metrics,
            timestamp: now_micros(),
        }
    }

    pub fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    /// Confiança em [0, 1]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn participants(&self) -> &[usize] {
        &self.participants
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ESTADO E MÉTRICAS
// ═══════════════════════════════════════════════════════════════════════════════

/// Algoritmo que produziu uma execução
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Pso,
    Aco,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pso => write!(f, "pso"),
            Self::Aco => write!(f, "aco"),
        }
    }
}

/// Motivo de término de uma execução
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Melhor valor abaixo do limiar de convergência
    Converged,
    /// Diversidade da população abaixo do piso
    DiversityCollapse,
    /// Orçamento de iterações esgotado (timeout de convergência)
    MaxIterations,
    /// Cancelada entre iterações
    Cancelled,
    /// Limite de tempo atingido entre iterações
    TimeLimit,
}

impl TerminationReason {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Melhor solução de uma execução
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Solution {
    /// Posição contínua (PSO)
    Continuous(Vec<f64>),
    /// Rota como permutação de cidades (ACO)
    Tour(Vec<usize>),
}

impl Solution {
    pub fn len(&self) -> usize {
        match self {
            Self::Continuous(v) => v.len(),
            Self::Tour(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Snapshot transitório do swarm ativo, recalculado sob demanda
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwarmState {
    pub iteration: usize,
    pub agent_count: usize,
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub diversity: f64,
    /// Grau de convergência em [0, 1]
    pub convergence: f64,
    pub recent_patterns: Vec<EmergentPattern>,
}

/// Relatório imutável de uma execução concluída
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmMetrics {
    pub algorithm: Algorithm,
    pub iterations_run: usize,
    pub best_solution: Solution,
    pub best_value: f64,
    pub execution_time: Duration,
    /// Estimativa de memória em bytes
    pub memory_estimate: u64,
    pub used_accelerator: bool,
    pub termination: TerminationReason,
    /// Melhor global ao fim de cada iteração
    pub convergence_history: Vec<f64>,
    /// Padrões emergentes atribuídos à execução, por tipo
    pub pattern_counts: BTreeMap<PatternType, usize>,
}

impl SwarmMetrics {
    pub fn cancelled(&self) -> bool {
        self.termination.is_cancelled()
    }

    pub fn to_json(&self) -> SwarmResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HISTÓRICO
// ═══════════════════════════════════════════════════════════════════════════════

/// Histórico FIFO com capacidade opcional
///
/// Sem capacidade cresce sem limite; com capacidade descarta o registro mais
/// antigo ao exceder.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: Option<usize>,
    evicted: usize,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            evicted: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
                self.evicted += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Total de registros descartados por capacidade
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Os `n` registros mais recentes, do mais antigo para o mais novo
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.evicted = 0;
    }
}

impl<T> Default for BoundedHistory<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}
