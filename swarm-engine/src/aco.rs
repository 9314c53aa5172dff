//! # Ant Colony Optimizer
//!
//! Otimização combinatória de rotas sobre um grafo ponderado por feromônio.
//!
//! ## Algoritmo
//!
//! - trilha inicial `τ(i,j) = 1/n` para todo `i ≠ j`
//! - cada formiga parte de uma cidade aleatória e escolhe a próxima por roleta
//!   com peso `τ(i,j)^α · (1/max(d(i,j), ε))^β`
//! - ao fim da iteração: evaporação `τ *= (1 − ρ)`, depósito `Q / custo` nas
//!   arestas de cada rota (rotas de custo zero não depositam) e reforço elitista
//!   `e · Q / melhor_custo` na melhor rota conhecida
//! - opcionalmente, 2-opt na melhor rota a cada `k` iterações
//!
//! As rotas de uma iteração dependem só de um snapshot da trilha; cada formiga
//! recebe uma semente própria derivada do gerador mestre, então os caminhos
//! serial e paralelo produzem a mesma trajetória.
//!
//! ## Complexidade
//!
//! - construção: O(formigas × n²) por iteração
//! - 2-opt: O(n²) por passada em matrizes simétricas; O(n³) em assimétricas
//!   (custo recalculado por candidato). Evite `local_search` em instâncias grandes.

use crate::config::AcoConfig;
use crate::control::{CancellationToken, RunControl};
use crate::error::{SwarmError, SwarmResult};
use crate::resources::estimate_aco_memory;
use crate::types::{Algorithm, Solution, SwarmMetrics, SwarmState, TerminationReason};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Piso da distância no termo heurístico (evita divisão por zero)
pub const HEURISTIC_EPSILON: f64 = 1e-10;

/// Melhora mínima aceita pelo 2-opt
const IMPROVEMENT_TOLERANCE: f64 = 1e-12;

// ═══════════════════════════════════════════════════════════════════════════════
// MATRIZ DE DISTÂNCIAS
// ═══════════════════════════════════════════════════════════════════════════════

/// Matriz de distâncias quadrada, validada
///
/// Assimetria é permitida.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
    symmetric: bool,
}

impl DistanceMatrix {
    pub fn new(rows: &[Vec<f64>]) -> SwarmResult<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(SwarmError::InvalidInput("distance matrix is empty".into()));
        }

        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(SwarmError::DimensionMismatch {
                    expected: n,
                    actual: row.len(),
                    context: format!("distance matrix row {i}"),
                });
            }
            for (j, &d) in row.iter().enumerate() {
                if !d.is_finite() || d < 0.0 {
                    return Err(SwarmError::InvalidInput(format!(
                        "distance ({i}, {j}) must be finite and non-negative, got {d}"
                    )));
                }
            }
            data.extend_from_slice(row);
        }

        let symmetric = (0..n).all(|i| (i + 1..n).all(|j| data[i * n + j] == data[j * n + i]));

        Ok(Self { n, data, symmetric })
    }

    /// Número de cidades
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Custo da rota, incluindo a aresta de volta ao início
    pub fn tour_cost(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }
        let closing = self.get(tour[tour.len() - 1], tour[0]);
        tour.windows(2).map(|w| self.get(w[0], w[1])).sum::<f64>() + closing
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRILHA DE FEROMÔNIO
// ═══════════════════════════════════════════════════════════════════════════════

/// Intensidade de feromônio por aresta dirigida `(i, j)`
///
/// Valores permanecem finitos e não negativos após cada
/// evaporação seguida de depósito.
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneTrail {
    n: usize,
    values: Vec<f64>,
}

impl PheromoneTrail {
    /// Trilha com `initial` em todas as arestas `i ≠ j`
    pub fn new(n: usize, initial: f64) -> Self {
        let mut values = vec![initial; n * n];
        for i in 0..n {
            values[i * n + i] = 0.0;
        }
        Self { n, values }
    }

    pub fn num_cities(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// `τ *= (1 − rate)` em todas as arestas
    pub fn evaporate(&mut self, rate: f64) {
        let keep = 1.0 - rate;
        for v in &mut self.values {
            *v *= keep;
        }
    }

    /// Deposita `amount` em cada aresta dirigida da rota (fechada)
    ///
    /// Cada célula satura em `f64::MAX`: muitos depósitos grandes na mesma
    /// aresta não chegam a `+inf`.
    pub fn deposit(&mut self, tour: &[usize], amount: f64) {
        if tour.len() < 2 || !amount.is_finite() || amount <= 0.0 {
            return;
        }
        for k in 0..tour.len() {
            let (i, j) = (tour[k], tour[(k + 1) % tour.len()]);
            let cell = &mut self.values[i * self.n + j];
            *cell = (*cell + amount).min(f64::MAX);
        }
    }

    /// Todos os valores finitos e ≥ 0
    pub fn is_valid(&self) -> bool {
        self.values.iter().all(|v| v.is_finite() && *v >= 0.0)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Relatório de fim de iteração entregue a observadores
#[derive(Debug)]
pub struct AcoIteration<'a> {
    /// Iteração concluída (base 1)
    pub iteration: usize,
    pub best_cost: f64,
    /// Melhor custo entre as formigas desta iteração
    pub iteration_best_cost: f64,
    pub trail: &'a PheromoneTrail,
}

// ═══════════════════════════════════════════════════════════════════════════════
// OTIMIZADOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Otimizador por colônia de formigas
#[derive(Debug)]
pub struct AntColonyOptimizer<R = StdRng> {
    config: AcoConfig,
    rng: R,
    trail: Option<PheromoneTrail>,
    best_tour: Vec<usize>,
    best_cost: f64,
    iteration: usize,
    last_costs: Vec<f64>,
    last_diversity: f64,
    control: RunControl,
    cancellation: Option<CancellationToken>,
    time_limit: Option<Duration>,
}

impl AntColonyOptimizer<StdRng> {
    pub fn seeded(config: AcoConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(config: AcoConfig) -> Self {
        Self::new(config, StdRng::from_entropy())
    }
}

impl<R: Rng> AntColonyOptimizer<R> {
    pub fn new(config: AcoConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            trail: None,
            best_tour: Vec::new(),
            best_cost: f64::INFINITY,
            iteration: 0,
            last_costs: Vec::new(),
            last_diversity: 0.0,
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

    pub fn config(&self) -> &AcoConfig {
        &self.config
    }

    /// Trilha da execução atual
    pub fn trail(&self) -> Option<&PheromoneTrail> {
        self.trail.as_ref()
    }

    pub fn best(&self) -> Option<(&[usize], f64)> {
        if self.best_cost.is_finite() {
            Some((&self.best_tour, self.best_cost))
        } else {
            None
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Estado transitório da colônia
    pub fn state(&self) -> SwarmState {
        if self.iteration == 0 {
            return SwarmState::default();
        }
        let avg_fitness = if self.last_costs.is_empty() {
            0.0
        } else {
            self.last_costs.iter().sum::<f64>() / self.last_costs.len() as f64
        };

        SwarmState {
            iteration: self.iteration,
            agent_count: self.config.num_ants(),
            best_fitness: self.best().map(|(_, c)| c).unwrap_or(0.0),
            avg_fitness,
            diversity: self.last_diversity,
            convergence: (1.0 - self.last_diversity).clamp(0.0, 1.0),
            recent_patterns: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.trail = None;
        self.best_tour.clear();
        self.best_cost = f64::INFINITY;
        self.iteration = 0;
        self.last_costs.clear();
        self.last_diversity = 0.0;
    }

    /// Menor rota fechada sobre `distances`; `max_iterations` sobrescreve a configuração
    pub fn optimize(
        &mut self,
        distances: &[Vec<f64>],
        max_iterations: Option<usize>,
    ) -> SwarmResult<(Vec<usize>, f64, SwarmMetrics)> {
        let matrix = DistanceMatrix::new(distances)?;
        self.optimize_observed(&matrix, max_iterations, |_| {})
    }

    /// Execução completa com observador chamado ao fim de cada iteração
    pub fn optimize_observed<O>(
        &mut self,
        matrix: &DistanceMatrix,
        max_iterations: Option<usize>,
        mut observer: O,
    ) -> SwarmResult<(Vec<usize>, f64, SwarmMetrics)>
    where
        O: FnMut(&AcoIteration<'_>),
    {
        let max_iterations = match max_iterations {
            Some(0) => {
                return Err(SwarmError::config("max_iterations", "must be >= 1, got 0"));
            }
            Some(n) => n,
            None => self.config.max_iterations(),
        };

        let started = Instant::now();
        self.reset();
        let n = matrix.len();

        info!(
            ants = self.config.num_ants(),
            cities = n,
            max_iterations,
            local_search = self.config.local_search(),
            parallel = self.config.parallel(),
            "aco run started"
        );

        if n == 1 {
            self.best_tour = vec![0];
            self.best_cost = 0.0;
            return Ok(self.finish(started, n, Vec::new(), TerminationReason::Converged));
        }

        let log_heuristic = log_heuristic(matrix, self.config.beta());
        let mut trail = PheromoneTrail::new(n, 1.0 / n as f64);
        let mut history = Vec::with_capacity(max_iterations);
        let mut termination = TerminationReason::MaxIterations;

        for t in 0..max_iterations {
            self.iteration = t + 1;

            // Sementes sorteadas em série: mesma trajetória em série ou em paralelo
            let seeds: Vec<u64> = (0..self.config.num_ants())
                .map(|_| self.rng.next_u64())
                .collect();
            let alpha = self.config.alpha();
            let tours: Vec<(Vec<usize>, f64)> = if self.config.parallel() {
                seeds
                    .par_iter()
                    .map(|&seed| construct_tour(matrix, &trail, &log_heuristic, alpha, seed))
                    .collect()
            } else {
                seeds
                    .iter()
                    .map(|&seed| construct_tour(matrix, &trail, &log_heuristic, alpha, seed))
                    .collect()
            };

            let mut iteration_best = f64::INFINITY;
            for (tour, cost) in &tours {
                iteration_best = iteration_best.min(*cost);
                if *cost < self.best_cost {
                    self.best_cost = *cost;
                    self.best_tour.clone_from(tour);
                }
            }

            self.update_trail(&mut trail, &tours);

            let due = self.iteration % self.config.local_search_interval() == 0;
            if self.config.local_search() && due {
                let (improved, cost) = two_opt(&self.best_tour, matrix);
                if cost < self.best_cost {
                    debug!(
                        iteration = self.iteration,
                        before = self.best_cost,
                        after = cost,
                        "2-opt improved best tour"
                    );
                    self.best_tour = improved;
                    self.best_cost = cost;
                }
            }

            self.last_costs = tours.iter().map(|(_, c)| *c).collect();
            self.last_diversity = tour_diversity(&tours);
            history.push(self.best_cost);

            debug_assert!(trail.is_valid());
            observer(&AcoIteration {
                iteration: self.iteration,
                best_cost: self.best_cost,
                iteration_best_cost: iteration_best,
                trail: &trail,
            });

            if let Some(reason) = self.control.interruption(started) {
                debug!(iteration = self.iteration, ?reason, "aco run interrupted");
                termination = reason;
                break;
            }
        }

        self.trail = Some(trail);
        Ok(self.finish(started, n, history, termination))
    }

    /// Evaporação, depósito por formiga e reforço elitista
    fn update_trail(&self, trail: &mut PheromoneTrail, tours: &[(Vec<usize>, f64)]) {
        let q = self.config.pheromone_deposit();
        trail.evaporate(self.config.evaporation_rate());

        for (tour, cost) in tours {
            if *cost > 0.0 {
                trail.deposit(tour, q / cost);
            }
        }

        if self.best_cost > 0.0 && self.config.elite_weight() > 0.0 {
            trail.deposit(&self.best_tour, self.config.elite_weight() * q / self.best_cost);
        }
    }

    fn finish(
        &self,
        started: Instant,
        n: usize,
        history: Vec<f64>,
        termination: TerminationReason,
    ) -> (Vec<usize>, f64, SwarmMetrics) {
        let metrics = SwarmMetrics {
            algorithm: Algorithm::Aco,
            iterations_run: self.iteration,
            best_solution: Solution::Tour(self.best_tour.clone()),
            best_value: self.best_cost,
            execution_time: started.elapsed(),
            memory_estimate: estimate_aco_memory(self.config.num_ants(), n),
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
            "aco run finished"
        );

        (self.best_tour.clone(), self.best_cost, metrics)
    }
}

/// `β · ln(1 / max(d, ε))` por aresta
fn log_heuristic(matrix: &DistanceMatrix, beta: f64) -> Vec<f64> {
    let n = matrix.len();
    let mut out = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let d = matrix.get(i, j).max(HEURISTIC_EPSILON);
            out.push(-beta * d.ln());
        }
    }
    out
}

/// Constrói uma rota completa por roleta, em espaço logarítmico
fn construct_tour(
    matrix: &DistanceMatrix,
    trail: &PheromoneTrail,
    log_heuristic: &[f64],
    alpha: f64,
    seed: u64,
) -> (Vec<usize>, f64) {
    let n = matrix.len();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut visited = vec![false; n];
    let mut tour = Vec::with_capacity(n);
    let mut candidates = Vec::with_capacity(n);
    let mut log_weights = Vec::with_capacity(n);

    let mut current = rng.gen_range(0..n);
    visited[current] = true;
    tour.push(current);

    while tour.len() < n {
        candidates.clear();
        log_weights.clear();
        for j in (0..n).filter(|&j| !visited[j]) {
            let pheromone = if alpha == 0.0 {
                0.0
            } else {
                alpha * trail.get(current, j).ln()
            };
            candidates.push(j);
            log_weights.push(pheromone + log_heuristic[current * n + j]);
        }

        let max_log = log_weights
            .iter()
            .copied()
            .filter(|w| w.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);

        let next = if max_log.is_finite() {
            let weights: Vec<f64> = log_weights.iter().map(|w| (w - max_log).exp()).collect();
            let total: f64 = weights.iter().sum();
            let mut r = rng.gen_range(0.0..total);
            let mut chosen = candidates[candidates.len() - 1];
            for (k, w) in weights.iter().enumerate() {
                if r < *w {
                    chosen = candidates[k];
                    break;
                }
                r -= w;
            }
            chosen
        } else {
            // Todos os pesos zerados: escolha uniforme
            candidates[rng.gen_range(0..candidates.len())]
        };

        visited[next] = true;
        tour.push(next);
        current = next;
    }

    let cost = matrix.tour_cost(&tour);
    (tour, cost)
}

/// Fração de rotas distintas (rotações de um mesmo ciclo contam uma vez)
fn tour_diversity(tours: &[(Vec<usize>, f64)]) -> f64 {
    if tours.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<Vec<usize>> = tours
        .iter()
        .map(|(tour, _)| {
            let start = tour.iter().position(|&c| c == 0).unwrap_or(0);
            let mut canonical = tour[start..].to_vec();
            canonical.extend_from_slice(&tour[..start]);
            canonical
        })
        .collect();
    distinct.len() as f64 / tours.len() as f64
}

/// 2-opt de primeira melhora: aplica a primeira reversão que reduz o custo e
/// recomeça, até uma passada completa sem melhora
fn two_opt(tour: &[usize], matrix: &DistanceMatrix) -> (Vec<usize>, f64) {
    let n = tour.len();
    let mut best = tour.to_vec();
    let mut best_cost = matrix.tour_cost(&best);
    if n < 4 {
        return (best, best_cost);
    }

    loop {
        let mut improved = false;

        'scan: for i in 0..n - 1 {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue;
                }

                if matrix.is_symmetric() {
                    let (a, b) = (best[i], best[i + 1]);
                    let (c, d) = (best[j], best[(j + 1) % n]);
                    let delta = matrix.get(a, c) + matrix.get(b, d)
                        - matrix.get(a, b)
                        - matrix.get(c, d);
                    if delta < -IMPROVEMENT_TOLERANCE {
                        best[i + 1..=j].reverse();
                        best_cost = matrix.tour_cost(&best);
                        improved = true;
                        break 'scan;
                    }
                } else {
                    let mut candidate = best.clone();
                    candidate[i + 1..=j].reverse();
                    let cost = matrix.tour_cost(&candidate);
                    if cost < best_cost - IMPROVEMENT_TOLERANCE {
                        best = candidate;
                        best_cost = cost;
                        improved = true;
                        break 'scan;
                    }
                }
            }
        }

        if !improved {
            return (best, best_cost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ants: usize, iterations: usize) -> AcoConfig {
        AcoConfig::builder()
            .num_ants(ants)
            .max_iterations(iterations)
            .build()
            .unwrap()
    }

    fn five_cities() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 2.0, 4.0, 5.0, 3.0],
            vec![2.0, 0.0, 3.0, 4.0, 2.5],
            vec![4.0, 3.0, 0.0, 2.0, 4.5],
            vec![5.0, 4.0, 2.0, 0.0, 3.5],
            vec![3.0, 2.5, 4.5, 3.5, 0.0],
        ]
    }

    fn is_permutation(tour: &[usize], n: usize) -> bool {
        let mut sorted = tour.to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn test_five_city_tour() {
        let mut aco = AntColonyOptimizer::seeded(config(40, 30), 17);
        let (tour, cost, metrics) = aco.optimize(&five_cities(), None).unwrap();

        assert!(is_permutation(&tour, 5));
        assert!(cost > 0.0);
        let matrix = DistanceMatrix::new(&five_cities()).unwrap();
        assert!((matrix.tour_cost(&tour) - cost).abs() < 1e-12);
        assert_eq!(metrics.iterations_run, 30);
        assert_eq!(metrics.best_solution, Solution::Tour(tour));
    }

    #[test]
    fn test_zero_distances_give_zero_cost() {
        let n = 6;
        let zeros = vec![vec![0.0; n]; n];
        let mut aco = AntColonyOptimizer::seeded(config(10, 10), 3);
        let (tour, cost, _) = aco.optimize(&zeros, None).unwrap();
        assert!(is_permutation(&tour, n));
        assert_eq!(cost, 0.0);
        assert!(aco.trail().unwrap().is_valid());
    }

    #[test]
    fn test_equilateral_triangle() {
        let triangle = vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ];
        let mut aco = AntColonyOptimizer::seeded(config(20, 50), 21);
        let (tour, cost, _) = aco.optimize(&triangle, None).unwrap();
        assert!(is_permutation(&tour, 3));
        assert!(cost <= 1.10 * 3.0);
    }

    #[test]
    fn test_rejects_bad_matrices() {
        let mut aco = AntColonyOptimizer::seeded(config(5, 5), 1);

        let ragged = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(matches!(
            aco.optimize(&ragged, None),
            Err(SwarmError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));

        let wide = vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 2.0]];
        assert!(matches!(
            aco.optimize(&wide, None),
            Err(SwarmError::DimensionMismatch { .. })
        ));

        assert!(matches!(aco.optimize(&[], None), Err(SwarmError::InvalidInput(_))));

        let negative = vec![vec![0.0, -1.0], vec![1.0, 0.0]];
        assert!(matches!(
            aco.optimize(&negative, None),
            Err(SwarmError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_single_city() {
        let mut aco = AntColonyOptimizer::seeded(config(5, 5), 1);
        let (tour, cost, metrics) = aco.optimize(&[vec![0.0]], None).unwrap();
        assert_eq!(tour, vec![0]);
        assert_eq!(cost, 0.0);
        assert_eq!(metrics.iterations_run, 0);
    }

    #[test]
    fn test_pheromones_stay_valid_for_random_configs() {
        let mut meta = StdRng::seed_from_u64(2024);

        for _ in 0..25 {
            let n = meta.gen_range(2..9);
            let matrix: Vec<Vec<f64>> = (0..n)
                .map(|i| {
                    (0..n)
                        .map(|j| {
                            if i == j || meta.gen_bool(0.2) {
                                0.0
                            } else {
                                10f64.powf(meta.gen_range(-300.0..3.0))
                            }
                        })
                        .collect()
                })
                .collect();
            let cfg = AcoConfig::builder()
                .num_ants(meta.gen_range(1..12))
                .alpha(meta.gen_range(0.0..5.0))
                .beta(meta.gen_range(0.0..40.0))
                .evaporation_rate(meta.gen_range(0.01..0.99))
                .pheromone_deposit(10f64.powf(meta.gen_range(-2.0..307.0)))
                .elite_weight(meta.gen_range(0.0..10.0))
                .local_search(meta.gen_bool(0.5))
                .local_search_interval(meta.gen_range(1..4))
                .max_iterations(meta.gen_range(1..30))
                .build()
                .unwrap();

            let matrix = DistanceMatrix::new(&matrix).unwrap();
            let mut aco = AntColonyOptimizer::seeded(cfg, meta.next_u64());
            let mut iterations = 0;
            let (tour, _, _) = aco
                .optimize_observed(&matrix, None, |it| {
                    iterations += 1;
                    assert!(it.trail.is_valid(), "invalid trail at iteration {}", it.iteration);
                })
                .unwrap();
            assert!(iterations > 0);
            assert!(is_permutation(&tour, n));
        }
    }

    #[test]
    fn test_best_cost_non_increasing() {
        let matrix = DistanceMatrix::new(&five_cities()).unwrap();
        let mut aco = AntColonyOptimizer::seeded(config(8, 40), 5);
        let mut costs = Vec::new();
        aco.optimize_observed(&matrix, None, |it| costs.push(it.best_cost))
            .unwrap();
        for pair in costs.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_seeded_and_parallel_runs_agree() {
        let serial = config(16, 20);
        let parallel = serial.to_builder().parallel(true).build().unwrap();

        let a = AntColonyOptimizer::seeded(serial.clone(), 77)
            .optimize(&five_cities(), None)
            .unwrap();
        let b = AntColonyOptimizer::seeded(serial, 77)
            .optimize(&five_cities(), None)
            .unwrap();
        let c = AntColonyOptimizer::seeded(parallel, 77)
            .optimize(&five_cities(), None)
            .unwrap();

        assert_eq!(a.0, b.0);
        assert_eq!(a.2.convergence_history, b.2.convergence_history);
        assert_eq!(a.0, c.0);
        assert_eq!(a.2.convergence_history, c.2.convergence_history);
    }

    #[test]
    fn test_two_opt_uncrosses_square() {
        // Quadrado unitário: 0-1-2-3 é o perímetro, 0-2-1-3 cruza
        let s = 2f64.sqrt();
        let square = DistanceMatrix::new(&[
            vec![0.0, 1.0, s, 1.0],
            vec![1.0, 0.0, 1.0, s],
            vec![s, 1.0, 0.0, 1.0],
            vec![1.0, s, 1.0, 0.0],
        ])
        .unwrap();

        let crossed = [0, 2, 1, 3];
        assert!(square.tour_cost(&crossed) > 4.0 + 1e-9);
        let (tour, cost) = two_opt(&crossed, &square);
        assert!((cost - 4.0).abs() < 1e-9);
        assert!(is_permutation(&tour, 4));
    }

    #[test]
    fn test_two_opt_asymmetric() {
        let matrix = DistanceMatrix::new(&[
            vec![0.0, 1.0, 9.0, 9.0, 1.0],
            vec![9.0, 0.0, 1.0, 9.0, 9.0],
            vec![9.0, 9.0, 0.0, 1.0, 9.0],
            vec![1.0, 9.0, 9.0, 0.0, 9.0],
            vec![9.0, 9.0, 9.0, 1.0, 0.0],
        ])
        .unwrap();
        assert!(!matrix.is_symmetric());

        let start = [0, 2, 1, 3, 4];
        let (tour, cost) = two_opt(&start, &matrix);
        assert!(cost <= matrix.tour_cost(&start));
        assert!((matrix.tour_cost(&tour) - cost).abs() < 1e-12);
    }

    #[test]
    fn test_trail_operations() {
        let mut trail = PheromoneTrail::new(3, 1.0 / 3.0);
        assert_eq!(trail.get(0, 0), 0.0);
        assert!((trail.get(0, 1) - 1.0 / 3.0).abs() < 1e-12);

        trail.evaporate(0.5);
        assert!((trail.get(1, 2) - 1.0 / 6.0).abs() < 1e-12);

        trail.deposit(&[0, 1, 2], 1.0);
        assert!((trail.get(2, 0) - (1.0 / 6.0 + 1.0)).abs() < 1e-12);
        assert!((trail.get(0, 2) - 1.0 / 6.0).abs() < 1e-12);

        trail.deposit(&[0, 1, 2], f64::INFINITY);
        assert!(trail.is_valid());
    }

    #[test]
    fn test_deposit_saturates_at_max() {
        let mut trail = PheromoneTrail::new(3, 1.0);
        for _ in 0..4 {
            trail.deposit(&[0, 1, 2], f64::MAX / 2.0);
        }
        assert!(trail.is_valid());
        assert_eq!(trail.get(0, 1), f64::MAX);
        assert_eq!(trail.max(), f64::MAX);
        assert_eq!(trail.get(1, 0), 1.0);
    }

    #[test]
    fn test_huge_deposit_keeps_trail_finite() {
        let triangle = DistanceMatrix::new(&[
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ])
        .unwrap();
        let cfg = AcoConfig::builder()
            .num_ants(60)
            .pheromone_deposit(1e307)
            .max_iterations(10)
            .build()
            .unwrap();

        let mut aco = AntColonyOptimizer::seeded(cfg, 4);
        let (tour, cost, _) = aco
            .optimize_observed(&triangle, None, |it| assert!(it.trail.is_valid()))
            .unwrap();
        assert!(is_permutation(&tour, 3));
        assert_eq!(cost, 3.0);
        assert!(aco.trail().unwrap().is_valid());
    }

    #[test]
    fn test_tiny_distances_keep_trail_finite() {
        let tiny = 1e-308;
        let matrix: Vec<Vec<f64>> = (0..4)
            .map(|i| (0..4).map(|j| if i == j { 0.0 } else { tiny }).collect())
            .collect();
        let matrix = DistanceMatrix::new(&matrix).unwrap();

        let mut aco = AntColonyOptimizer::seeded(config(40, 10), 12);
        let (tour, cost, _) = aco
            .optimize_observed(&matrix, None, |it| assert!(it.trail.is_valid()))
            .unwrap();
        assert!(is_permutation(&tour, 4));
        assert!(cost > 0.0 && cost.is_finite());
        assert!(aco.trail().unwrap().is_valid());
    }

    #[test]
    fn test_symmetric_matrix_reinforces_only_tour_direction() {
        let square = [
            vec![0.0, 1.0, 2.0, 1.0],
            vec![1.0, 0.0, 1.0, 2.0],
            vec![2.0, 1.0, 0.0, 1.0],
            vec![1.0, 2.0, 1.0, 0.0],
        ];
        let cfg = AcoConfig::builder()
            .num_ants(1)
            .max_iterations(1)
            .elite_weight(0.0)
            .evaporation_rate(0.5)
            .pheromone_deposit(1.0)
            .build()
            .unwrap();

        let mut aco = AntColonyOptimizer::seeded(cfg, 6);
        let (tour, cost, _) = aco.optimize(&square, None).unwrap();
        let trail = aco.trail().unwrap();

        // τ inicial 1/n, metade evapora, a única formiga deposita 1/custo
        let base = 0.5 / 4.0;
        for k in 0..4 {
            let (i, j) = (tour[k], tour[(k + 1) % 4]);
            assert!((trail.get(i, j) - (base + 1.0 / cost)).abs() < 1e-12);
            assert!((trail.get(j, i) - base).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cancelled_and_state() {
        let token = CancellationToken::new();
        token.cancel();
        let mut aco = AntColonyOptimizer::seeded(config(6, 50), 9).with_cancellation(token);
        assert_eq!(aco.state(), SwarmState::default());

        let (tour, cost, metrics) = aco.optimize(&five_cities(), None).unwrap();
        assert!(metrics.cancelled());
        assert_eq!(metrics.iterations_run, 1);
        assert!(is_permutation(&tour, 5));

        let state = aco.state();
        assert_eq!(state.agent_count, 6);
        assert_eq!(state.best_fitness, cost);
        assert!(state.diversity > 0.0 && state.diversity <= 1.0);

        aco.reset();
        assert!(aco.best().is_none());
    }
}
