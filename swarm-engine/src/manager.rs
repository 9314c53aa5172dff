//! # SwarmManager
//!
//! Fachada que valida tetos de recursos, roda um otimizador por vez, alimenta
//! o detector de emergência e mantém o histórico de execuções.
//!
//! ```text
//! optimize_* ──► teto de agentes ──► aviso de memória ──► otimizador
//!                (falha rígida)      (só aviso)             │
//!                                                           ▼
//!     histórico ◄── métricas ◄── EmergenceDetector ◄── snapshot (PSO)
//! ```
//!
//! Erros de configuração e de recursos chegam ao chamador sem efeito colateral.
//! Um erro de avaliação aborta a execução em curso, mas o manager continua
//! utilizável sem `reset()`.

use crate::aco::{AntColonyOptimizer, DistanceMatrix};
use crate::config::SwarmConfig;
use crate::control::CancellationToken;
use crate::emergence::EmergenceDetector;
use crate::error::{SwarmError, SwarmResult};
use crate::pso::{Particle, ParticleSwarmOptimizer};
use crate::resources::{ResourceProbe, estimate_aco_memory, estimate_pso_memory};
use crate::types::{AgentSnapshot, Algorithm, BoundedHistory, PatternType, SwarmMetrics, SwarmState};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Padrões recentes expostos em [`SwarmState`]
const RECENT_PATTERN_WINDOW: usize = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// RESUMO
// ═══════════════════════════════════════════════════════════════════════════════

/// Agregado das execuções de um algoritmo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSummary {
    pub runs: usize,
    pub avg_iterations: f64,
    pub avg_execution_time: Duration,
    pub avg_best_value: f64,
    /// Menor valor entre todas as execuções
    pub best_value: f64,
    pub cancelled_runs: usize,
}

/// Resumo do histórico do manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_runs: usize,
    /// Execuções descartadas pela capacidade do histórico
    pub evicted_runs: usize,
    pub per_algorithm: BTreeMap<Algorithm, AlgorithmSummary>,
    pub pattern_counts: BTreeMap<PatternType, usize>,
}

impl MetricsSummary {
    fn from_history(history: &BoundedHistory<SwarmMetrics>) -> Self {
        let mut summary = Self {
            total_runs: history.len(),
            evicted_runs: history.evicted(),
            ..Self::default()
        };

        let mut totals: BTreeMap<Algorithm, (usize, f64, f64, f64, f64, usize)> = BTreeMap::new();
        for metrics in history.iter() {
            let entry = totals
                .entry(metrics.algorithm)
                .or_insert((0, 0.0, 0.0, 0.0, f64::INFINITY, 0));
            entry.0 += 1;
            entry.1 += metrics.iterations_run as f64;
            entry.2 += metrics.execution_time.as_secs_f64();
            entry.3 += metrics.best_value;
            entry.4 = entry.4.min(metrics.best_value);
            entry.5 += usize::from(metrics.cancelled());

            for (kind, count) in &metrics.pattern_counts {
                *summary.pattern_counts.entry(*kind).or_insert(0) += count;
            }
        }

        for (algorithm, (runs, iterations, secs, best_sum, best, cancelled)) in totals {
            let n = runs as f64;
            summary.per_algorithm.insert(
                algorithm,
                AlgorithmSummary {
                    runs,
                    avg_iterations: iterations / n,
                    avg_execution_time: Duration::from_secs_f64(secs / n),
                    avg_best_value: best_sum / n,
                    best_value: best,
                    cancelled_runs: cancelled,
                },
            );
        }
        summary
    }

    pub fn to_json(&self) -> SwarmResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MANAGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Orquestrador de execuções PSO/ACO
#[derive(Debug)]
pub struct SwarmManager {
    config: SwarmConfig,
    rng: StdRng,
    pso: Option<ParticleSwarmOptimizer>,
    aco: Option<AntColonyOptimizer>,
    active: Option<Algorithm>,
    detector: EmergenceDetector,
    history: BoundedHistory<SwarmMetrics>,
    probe: Option<Arc<dyn ResourceProbe>>,
    cancellation: CancellationToken,
}

impl Default for SwarmManager {
    fn default() -> Self {
        Self::new(SwarmConfig::default())
    }
}

impl SwarmManager {
    pub fn new(config: SwarmConfig) -> Self {
        Self {
            rng: master_rng(config.seed()),
            detector: EmergenceDetector::new(config.emergence().clone()),
            history: BoundedHistory::new(config.history_capacity()),
            config,
            pso: None,
            aco: None,
            active: None,
            probe: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Anexa uma sonda de recursos para os avisos de memória
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ResourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn detector(&self) -> &EmergenceDetector {
        &self.detector
    }

    /// Histórico de execuções concluídas
    pub fn history(&self) -> &BoundedHistory<SwarmMetrics> {
        &self.history
    }

    /// Token compartilhado pelas execuções deste manager
    ///
    /// Permanece cancelado até [`reset`](Self::reset) ou [`CancellationToken::reset`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Minimiza `fitness` em `dimension` dimensões com `num_particles` partículas
    pub fn optimize_continuous<F>(
        &mut self,
        fitness: F,
        dimension: usize,
        num_particles: usize,
        max_iterations: Option<usize>,
    ) -> SwarmResult<(Vec<f64>, f64, SwarmMetrics)>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        self.try_optimize_continuous(
            |x| Ok::<f64, Infallible>(fitness(x)),
            dimension,
            num_particles,
            max_iterations,
        )
    }

    /// Como [`optimize_continuous`](Self::optimize_continuous), para fitness falível
    pub fn try_optimize_continuous<F, E>(
        &mut self,
        fitness: F,
        dimension: usize,
        num_particles: usize,
        max_iterations: Option<usize>,
    ) -> SwarmResult<(Vec<f64>, f64, SwarmMetrics)>
    where
        F: Fn(&[f64]) -> Result<f64, E> + Sync,
        E: Display + Send,
    {
        self.check_agents(num_particles)?;

        let mut builder = self
            .config
            .pso()
            .to_builder()
            .dimension(dimension)
            .num_particles(num_particles);
        if let Some(n) = max_iterations {
            builder = builder.max_iterations(n);
        }
        let pso_config = builder.build()?;

        self.advise_memory(estimate_pso_memory(num_particles, dimension));

        let mut optimizer = ParticleSwarmOptimizer::seeded(pso_config, self.rng.next_u64())
            .with_cancellation(self.cancellation.clone())
            .with_time_limit(self.config.time_limit());

        // Amostras só chegam ao detector depois de uma execução sem erro
        let detector = &self.detector;
        let mut samples: Vec<Vec<AgentSnapshot>> = Vec::new();
        let mut last_sampled = 0;
        let (solution, value, mut metrics) =
            optimizer.optimize_observed(fitness, None, |it| {
                if detector.should_sample(it.iteration) {
                    last_sampled = it.iteration;
                    samples.push(it.particles.iter().map(Particle::snapshot).collect());
                }
            })?;

        if optimizer.iteration() != last_sampled {
            samples.push(optimizer.snapshot());
        }
        let mut counts = BTreeMap::new();
        for snapshots in &samples {
            record_patterns(&mut self.detector, snapshots, &mut counts);
        }
        metrics.pattern_counts = counts;

        self.pso = Some(optimizer);
        self.aco = None;
        self.active = Some(Algorithm::Pso);
        self.record(&metrics);
        Ok((solution, value, metrics))
    }

    /// Menor rota fechada sobre `distances` com `num_ants` formigas
    pub fn optimize_combinatorial(
        &mut self,
        distances: &[Vec<f64>],
        num_ants: usize,
        max_iterations: Option<usize>,
    ) -> SwarmResult<(Vec<usize>, f64, SwarmMetrics)> {
        self.check_agents(num_ants)?;

        let mut builder = self.config.aco().to_builder().num_ants(num_ants);
        if let Some(n) = max_iterations {
            builder = builder.max_iterations(n);
        }
        let aco_config = builder.build()?;
        let matrix = DistanceMatrix::new(distances)?;

        self.advise_memory(estimate_aco_memory(num_ants, matrix.len()));

        let mut optimizer = AntColonyOptimizer::seeded(aco_config, self.rng.next_u64())
            .with_cancellation(self.cancellation.clone())
            .with_time_limit(self.config.time_limit());
        let (tour, cost, metrics) = optimizer.optimize_observed(&matrix, None, |_| {})?;

        self.aco = Some(optimizer);
        self.pso = None;
        self.active = Some(Algorithm::Aco);
        self.record(&metrics);
        Ok((tour, cost, metrics))
    }

    /// Médias por algoritmo e contagem de padrões do histórico
    pub fn get_metrics_summary(&self) -> MetricsSummary {
        MetricsSummary::from_history(&self.history)
    }

    /// Estado do otimizador da última execução bem-sucedida
    pub fn get_swarm_state(&self) -> SwarmState {
        match self.active {
            Some(Algorithm::Pso) => {
                let mut state = self.pso.as_ref().map(|p| p.state()).unwrap_or_default();
                state.recent_patterns = self.detector.recent_patterns(RECENT_PATTERN_WINDOW);
                state
            }
            Some(Algorithm::Aco) => self.aco.as_ref().map(|a| a.state()).unwrap_or_default(),
            None => SwarmState::default(),
        }
    }

    /// Descarta otimizadores, históricos e cancelamento pendente
    ///
    /// O gerador mestre volta à semente configurada.
    pub fn reset(&mut self) {
        self.pso = None;
        self.aco = None;
        self.active = None;
        self.detector.clear_history();
        self.history.clear();
        self.cancellation.reset();
        self.rng = master_rng(self.config.seed());
        debug!("swarm manager reset");
    }

    fn check_agents(&self, requested: usize) -> SwarmResult<()> {
        let limit = self.config.max_agents();
        if requested > limit {
            warn!(requested, limit, "agent ceiling exceeded; run rejected");
            return Err(SwarmError::ResourceLimitExceeded { requested, limit });
        }
        Ok(())
    }

    /// Avisos de memória; nunca interrompe a execução
    fn advise_memory(&self, estimate: u64) {
        let budget = self.config.memory_limit();
        if estimate > budget {
            warn!(estimate, budget, "estimated memory exceeds budget; continuing");
        }

        match &self.probe {
            Some(probe) => {
                match probe.available_memory() {
                    Some(available) if estimate > available => {
                        warn!(estimate, available, "estimated memory exceeds available memory");
                    }
                    Some(_) => {}
                    None => debug!("resource probe reported no memory information"),
                }
                if probe.accelerator_available() {
                    debug!("accelerator reported but unused");
                }
            }
            None => debug!("no resource probe configured; availability check skipped"),
        }
    }

    fn record(&mut self, metrics: &SwarmMetrics) {
        info!(
            algorithm = %metrics.algorithm,
            iterations = metrics.iterations_run,
            best = metrics.best_value,
            termination = ?metrics.termination,
            patterns = metrics.pattern_counts.values().sum::<usize>(),
            "run recorded"
        );
        self.history.push(metrics.clone());
    }
}

fn master_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn record_patterns(
    detector: &mut EmergenceDetector,
    snapshots: &[AgentSnapshot],
    counts: &mut BTreeMap<PatternType, usize>,
) {
    match detector.detect_patterns(snapshots) {
        Ok(patterns) => {
            for pattern in patterns {
                *counts.entry(pattern.pattern_type()).or_insert(0) += 1;
            }
        }
        Err(err) => warn!(%err, "emergence detection skipped"),
    }
}
