//! # Particle Swarm Optimizer
//!
//! Otimização contínua por população de partículas.
//!
//! ```text
//! w(t) = inertia · (1 − t / max_iterations)
//! v    = w·v + c₁·r₁·(pbest − x) + c₂·r₂·(gbest − x)     (clamp ±max_velocity)
//! x    = x + v
//! ```
//!
//! Cada iteração avalia todas as partículas contra um snapshot somente-leitura
//! (em paralelo com `parallel = true`), e só depois atualiza melhores pessoais,
//! melhor global e velocidades na thread chamadora. O melhor global nunca
//! aumenta entre iterações.
//!
//! ## Término
//!
//! - melhor global < `convergence_threshold` → [`TerminationReason::Converged`]
//! - diversidade < [`DIVERSITY_FLOOR`] → [`TerminationReason::DiversityCollapse`]
//! - cancelamento / limite de tempo, verificados entre iterações
//! - caso contrário, `max_iterations`

use crate::config::PsoConfig;
use crate::control::{CancellationToken, RunControl};
use crate::error::{SwarmError, SwarmResult};
use crate::resources::estimate_pso_memory;
use crate::types::{AgentSnapshot, Algorithm, Solution, SwarmMetrics, SwarmState, TerminationReason};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::Display;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Piso empírico de diversidade (média do desvio por dimensão)
pub const DIVERSITY_FLOOR: f64 = 0.01;

/// Partícula, de posse exclusiva de uma execução
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: usize,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub best_position: Vec<f64>,
    /// Menor fitness já observado; só muda com melhora estrita
    pub best_fitness: f64,
    pub fitness: f64,
}

impl Particle {
    fn new(id: usize, position: Vec<f64>, velocity: Vec<f64>) -> Self {
        Self {
            id,
            best_position: position.clone(),
            position,
            velocity,
            best_fitness: f64::INFINITY,
            fitness: f64::INFINITY,
        }
    }

    /// Registra o fitness da posição atual; retorna `true` se melhorou o pessoal
    fn observe(&mut self, fitness: f64) -> bool {
        self.fitness = fitness;
        if fitness < self.best_fitness {
            self.best_fitness = fitness;
            self.best_position.clone_from(&self.position);
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot::new(
            self.id,
            self.position.clone(),
            self.velocity.clone(),
            self.fitness,
        )
    }
}

/// Relatório de fim de iteração entregue a observadores
#[derive(Debug)]
pub struct PsoIteration<'a> {
    /// Iteração concluída (base 1)
    pub iteration: usize,
    pub global_best_value: f64,
    pub diversity: f64,
    pub particles: &'a [Particle],
}

/// Otimizador por enxame de partículas
#[derive(Debug)]
pub struct ParticleSwarmOptimizer<R = StdRng> {
    config: PsoConfig,
    rng: R,
    particles: Vec<Particle>,
    global_best_position: Vec<f64>,
    global_best_value: f64,
    iteration: usize,
    initial_diversity: Option<f64>,
    control: RunControl,
    cancellation: Option<CancellationToken>,
    time_limit: Option<Duration>,
}

impl ParticleSwarmOptimizer<StdRng> {
    /// Otimizador determinístico a partir de uma semente
    pub fn seeded(config: PsoConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    /// Otimizador semeado pela entropia do sistema
    pub fn from_entropy(config: PsoConfig) -> Self {
        Self::new(config, StdRng::from_entropy())
    }
}

impl<R: Rng> ParticleSwarmOptimizer<R> {
    pub fn new(config: PsoConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            particles: Vec::new(),
            global_best_position: Vec::new(),
            global_best_value: f64::INFINITY,
            iteration: 0,
            initial_diversity: None,
            control: RunControl::default(),
            cancellation: None,
            time_limit: None,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self.control = RunControl::new(self.cancellation.clone(), self.time_limit);
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self.control = RunControl::new(self.cancellation.clone(), self.time_limit);
        self
    }

    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Melhor global da execução atual, se alguma iteração já rodou
    pub fn global_best(&self) -> Option<(&[f64], f64)> {
        if self.global_best_value.is_finite() {
            Some((&self.global_best_position, self.global_best_value))
        } else {
            None
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Snapshot somente-leitura da população atual
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.particles.iter().map(Particle::snapshot).collect()
    }

    /// Média, entre dimensões, do desvio padrão das posições
    pub fn diversity(&self) -> f64 {
        population_diversity(&self.particles)
    }

    /// Estado transitório do enxame
    pub fn state(&self) -> SwarmState {
        if self.particles.is_empty() {
            return SwarmState::default();
        }

        let finite: Vec<f64> = self
            .particles
            .iter()
            .map(|p| p.fitness)
            .filter(|f| f.is_finite())
            .collect();
        let avg_fitness = if finite.is_empty() {
            0.0
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };

        let diversity = self.diversity();
        let convergence = match self.initial_diversity {
            Some(initial) if initial > 0.0 => (1.0 - diversity / initial).clamp(0.0, 1.0),
            Some(_) => 1.0,
            None => 0.0,
        };

        SwarmState {
            iteration: self.iteration,
            agent_count: self.particles.len(),
            best_fitness: self.global_best().map(|(_, v)| v).unwrap_or(0.0),
            avg_fitness,
            diversity,
            convergence,
            recent_patterns: Vec::new(),
        }
    }

    /// Descarta a população e o melhor global
    pub fn reset(&mut self) {
        self.particles.clear();
        self.global_best_position.clear();
        self.global_best_value = f64::INFINITY;
        self.iteration = 0;
        self.initial_diversity = None;
    }

    /// Minimiza `fitness`; `max_iterations` sobrescreve o valor da configuração
    pub fn optimize<F>(
        &mut self,
        fitness: F,
        max_iterations: Option<usize>,
    ) -> SwarmResult<(Vec<f64>, f64, SwarmMetrics)>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        self.try_optimize(|x| Ok::<f64, Infallible>(fitness(x)), max_iterations)
    }

    /// Como [`optimize`](Self::optimize), para funções de fitness falíveis
    pub fn try_optimize<F, E>(
        &mut self,
        fitness: F,
        max_iterations: Option<usize>,
    ) -> SwarmResult<(Vec<f64>, f64, SwarmMetrics)>
    where
        F: Fn(&[f64]) -> Result<f64, E> + Sync,
        E: Display + Send,
    {
        self.optimize_observed(fitness, max_iterations, |_| {})
    }

    /// Execução completa com observador chamado ao fim de cada iteração
    pub fn optimize_observed<F, E, O>(
        &mut self,
        fitness: F,
        max_iterations: Option<usize>,
        mut observer: O,
    ) -> SwarmResult<(Vec<f64>, f64, SwarmMetrics)>
    where
        F: Fn(&[f64]) -> Result<f64, E> + Sync,
        E: Display + Send,
        O: FnMut(&PsoIteration<'_>),
    {
        let max_iterations = match max_iterations {
            Some(0) => {
                return Err(SwarmError::config("max_iterations", "must be >= 1, got 0"));
            }
            Some(n) => n,
            None => self.config.max_iterations(),
        };

        let started = Instant::now();
        self.initialize();

        info!(
            particles = self.config.num_particles(),
            dimension = self.config.dimension(),
            max_iterations,
            parallel = self.config.parallel(),
            "pso run started"
        );

        let mut history = Vec::with_capacity(max_iterations);
        let mut termination = TerminationReason::MaxIterations;

        for t in 0..max_iterations {
            self.iteration = t + 1;

            let values = self.evaluate(&fitness, t)?;
            for (particle, value) in self.particles.iter_mut().zip(values) {
                particle.observe(value);
            }
            self.update_global_best();
            history.push(self.global_best_value);

            let diversity = self.diversity();
            self.initial_diversity.get_or_insert(diversity);

            observer(&PsoIteration {
                iteration: self.iteration,
                global_best_value: self.global_best_value,
                diversity,
                particles: &self.particles,
            });

            if self.global_best_value < self.config.convergence_threshold() {
                debug!(iteration = self.iteration, best = self.global_best_value, "pso converged");
                termination = TerminationReason::Converged;
                break;
            }
            if self.particles.len() > 1 && diversity < DIVERSITY_FLOOR {
                debug!(iteration = self.iteration, diversity, "pso diversity collapsed");
                termination = TerminationReason::DiversityCollapse;
                break;
            }
            if let Some(reason) = self.control.interruption(started) {
                debug!(iteration = self.iteration, ?reason, "pso run interrupted");
                termination = reason;
                break;
            }
            if t + 1 == max_iterations {
                break;
            }

            let w = self.config.inertia() * (1.0 - t as f64 / max_iterations as f64);
            self.update_swarm(w);
        }

        let metrics = SwarmMetrics {
            algorithm: Algorithm::Pso,
            iterations_run: self.iteration,
            best_solution: Solution::Continuous(self.global_best_position.clone()),
            best_value: self.global_best_value,
            execution_time: started.elapsed(),
            memory_estimate: estimate_pso_memory(
                self.config.num_particles(),
                self.config.dimension(),
            ),
            used_accelerator: false,
            termination,
            convergence_history: history,
            pattern_counts: BTreeMap::new(),
        };

        info!(
            iterations = metrics.iterations_run,
            best = metrics.best_value,
            termination = ?metrics.termination,
            elapsed_ms = metrics.execution_time.as_millis() as u64,
            "pso run finished"
        );

        Ok((
            self.global_best_position.clone(),
            self.global_best_value,
            metrics,
        ))
    }

    fn initialize(&mut self) {
        self.reset();
        let (lower, upper) = self.config.position_bounds();
        let dimension = self.config.dimension();

        self.particles = (0..self.config.num_particles())
            .map(|id| {
                let position: Vec<f64> = (0..dimension)
                    .map(|_| self.rng.gen_range(lower..upper))
                    .collect();
                let velocity: Vec<f64> = (0..dimension)
                    .map(|_| self.rng.gen_range(-1.0..=1.0))
                    .collect();
                Particle::new(id, position, velocity)
            })
            .collect();
    }

    /// Avalia todas as partículas; erros carregam iteração e partícula
    fn evaluate<F, E>(&self, fitness: &F, iteration: usize) -> SwarmResult<Vec<f64>>
    where
        F: Fn(&[f64]) -> Result<f64, E> + Sync,
        E: Display + Send,
    {
        let check = |particle: &Particle, result: Result<f64, E>| match result {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(value) => Err(SwarmError::Evaluation {
                iteration,
                agent_id: particle.id,
                message: format!("non-finite fitness {value}"),
            }),
            Err(e) => Err(SwarmError::Evaluation {
                iteration,
                agent_id: particle.id,
                message: e.to_string(),
            }),
        };

        if self.config.parallel() {
            let raw: Vec<Result<f64, E>> = self
                .particles
                .par_iter()
                .map(|p| fitness(&p.position))
                .collect();
            self.particles
                .iter()
                .zip(raw)
                .map(|(p, r)| check(p, r))
                .collect()
        } else {
            self.particles
                .iter()
                .map(|p| check(p, fitness(&p.position)))
                .collect()
        }
    }

    fn update_global_best(&mut self) {
        for particle in &self.particles {
            if particle.best_fitness < self.global_best_value {
                self.global_best_value = particle.best_fitness;
                self.global_best_position.clone_from(&particle.best_position);
            }
        }
    }

    fn update_swarm(&mut self, w: f64) {
        let Self {
            config,
            rng,
            particles,
            global_best_position,
            ..
        } = self;
        let c1 = config.cognitive_weight();
        let c2 = config.social_weight();
        let v_max = config.max_velocity();

        for particle in particles.iter_mut() {
            for d in 0..particle.position.len() {
                let r1: f64 = rng.gen_range(0.0..1.0);
                let r2: f64 = rng.gen_range(0.0..1.0);
                let x = particle.position[d];

                let v = w * particle.velocity[d]
                    + c1 * r1 * (particle.best_position[d] - x)
                    + c2 * r2 * (global_best_position[d] - x);
                let v = v.clamp(-v_max, v_max);

                particle.velocity[d] = v;
                particle.position[d] = x + v;
            }
        }
    }
}

fn population_diversity(particles: &[Particle]) -> f64 {
    let n = particles.len();
    let Some(first) = particles.first() else {
        return 0.0;
    };
    let dimension = first.position.len();
    if n < 2 || dimension == 0 {
        return 0.0;
    }

    let mut total = 0.0;
    for d in 0..dimension {
        let mean = particles.iter().map(|p| p.position[d]).sum::<f64>() / n as f64;
        let variance = particles
            .iter()
            .map(|p| (p.position[d] - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        total += variance.sqrt();
    }
    total / dimension as f64
}
