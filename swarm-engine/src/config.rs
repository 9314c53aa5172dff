//! # Configuração — PSO, ACO, Emergência e Swarm
//!
//! Todas as configurações são valores imutáveis validados na construção.
//! Um valor inválido falha com [`SwarmError::Configuration`] indicando o campo;
//! nada é ajustado silenciosamente.
//!
//! ```text
//! PsoConfig::builder() ──► PsoConfigBuilder ──build()──► PsoConfig
//!        TOML / serde ──► PsoConfigBuilder ──try_from──► PsoConfig
//! ```
//!
//! A desserialização passa pelo mesmo builder, então uma configuração lida
//! de arquivo é validada exatamente como uma construída em código.
//!
//! ## Variáveis de ambiente
//!
//! [`SwarmConfig::from_env`] carrega `.env` (uma vez) e aplica:
//! - `SWARM_MAX_AGENTS`
//! - `SWARM_MEMORY_LIMIT` (bytes)
//! - `SWARM_HISTORY_CAPACITY`
//! - `SWARM_TIME_LIMIT_SECS`
//! - `SWARM_SEED`

use crate::error::{SwarmError, SwarmResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

// Carrega .env na primeira leitura de ambiente
static DOTENV_INIT: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDAÇÃO
// ═══════════════════════════════════════════════════════════════════════════════

fn ensure_at_least(field: &'static str, value: usize, min: usize) -> SwarmResult<()> {
    if value < min {
        return Err(SwarmError::config(field, format!("must be >= {min}, got {value}")));
    }
    Ok(())
}

fn ensure_finite(field: &'static str, value: f64) -> SwarmResult<()> {
    if !value.is_finite() {
        return Err(SwarmError::config(field, format!("must be finite, got {value}")));
    }
    Ok(())
}

fn ensure_positive(field: &'static str, value: f64) -> SwarmResult<()> {
    ensure_finite(field, value)?;
    if value <= 0.0 {
        return Err(SwarmError::config(field, format!("must be > 0, got {value}")));
    }
    Ok(())
}

fn ensure_non_negative(field: &'static str, value: f64) -> SwarmResult<()> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(SwarmError::config(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

fn ensure_unit_interval(field: &'static str, value: f64) -> SwarmResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SwarmError::config(field, format!("must lie in [0, 1], got {value}")));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// PSO
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuração do Particle Swarm Optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PsoConfigBuilder", into = "PsoConfigBuilder")]
pub struct PsoConfig {
    num_particles: usize,
    inertia: f64,
    cognitive_weight: f64,
    social_weight: f64,
    max_velocity: f64,
    dimension: usize,
    max_iterations: usize,
    convergence_threshold: f64,
    position_bounds: (f64, f64),
    parallel: bool,
}

/// Builder (e forma serializada) de [`PsoConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PsoConfigBuilder {
    pub num_particles: usize,
    /// Peso de inércia inicial, em (0, 1]; decai linearmente até zero
    pub inertia: f64,
    pub cognitive_weight: f64,
    pub social_weight: f64,
    /// Velocidade máxima por dimensão (clamp em ±max_velocity)
    pub max_velocity: f64,
    pub dimension: usize,
    pub max_iterations: usize,
    /// Melhor global abaixo deste valor encerra a execução
    pub convergence_threshold: f64,
    /// Intervalo de inicialização das posições, igual em todas as dimensões
    pub position_bounds: (f64, f64),
    /// Avalia o fitness no pool do rayon
    pub parallel: bool,
}

impl Default for PsoConfigBuilder {
    fn default() -> Self {
        Self {
            num_particles: 30,
            inertia: 0.9,
            cognitive_weight: 1.5,
            social_weight: 1.5,
            max_velocity: 2.0,
            dimension: 2,
            max_iterations: 100,
            convergence_threshold: 1e-6,
            position_bounds: (-10.0, 10.0),
            parallel: false,
        }
    }
}

impl PsoConfigBuilder {
    #[must_use]
    pub fn num_particles(mut self, n: usize) -> Self {
        self.num_particles = n;
        self
    }

    #[must_use]
    pub fn inertia(mut self, w: f64) -> Self {
        self.inertia = w;
        self
    }

    #[must_use]
    pub fn cognitive_weight(mut self, c1: f64) -> Self {
        self.cognitive_weight = c1;
        self
    }

    #[must_use]
    pub fn social_weight(mut self, c2: f64) -> Self {
        self.social_weight = c2;
        self
    }

    #[must_use]
    pub fn max_velocity(mut self, v: f64) -> Self {
        self.max_velocity = v;
        self
    }

    #[must_use]
    pub fn dimension(mut self, d: usize) -> Self {
        self.dimension = d;
        self
    }

    #[must_use]
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    #[must_use]
    pub fn convergence_threshold(mut self, t: f64) -> Self {
        self.convergence_threshold = t;
        self
    }

    #[must_use]
    pub fn position_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.position_bounds = (lower, upper);
        self
    }

    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Valida todos os campos e constrói a configuração
    pub fn build(self) -> SwarmResult<PsoConfig> {
        ensure_at_least("num_particles", self.num_particles, 1)?;
        ensure_at_least("dimension", self.dimension, 1)?;
        ensure_at_least("max_iterations", self.max_iterations, 1)?;
        if !(self.inertia > 0.0 && self.inertia <= 1.0) {
            return Err(SwarmError::config(
                "inertia",
                format!("must lie in (0, 1], got {}", self.inertia),
            ));
        }
        ensure_non_negative("cognitive_weight", self.cognitive_weight)?;
        ensure_non_negative("social_weight", self.social_weight)?;
        ensure_positive("max_velocity", self.max_velocity)?;
        ensure_finite("convergence_threshold", self.convergence_threshold)?;

        let (lower, upper) = self.position_bounds;
        ensure_finite("position_bounds", lower)?;
        ensure_finite("position_bounds", upper)?;
        if lower >= upper {
            return Err(SwarmError::config(
                "position_bounds",
                format!("lower bound {lower} must be below upper bound {upper}"),
            ));
        }

        Ok(self.assemble())
    }

    /// Monta a configuração sem validar
    fn assemble(self) -> PsoConfig {
        PsoConfig {
            num_particles: self.num_particles,
            inertia: self.inertia,
            cognitive_weight: self.cognitive_weight,
            social_weight: self.social_weight,
            max_velocity: self.max_velocity,
            dimension: self.dimension,
            max_iterations: self.max_iterations,
            convergence_threshold: self.convergence_threshold,
            position_bounds: self.position_bounds,
            parallel: self.parallel,
        }
    }
}

impl TryFrom<PsoConfigBuilder> for PsoConfig {
    type Error = SwarmError;

    fn try_from(builder: PsoConfigBuilder) -> SwarmResult<Self> {
        builder.build()
    }
}

impl From<PsoConfig> for PsoConfigBuilder {
    fn from(c: PsoConfig) -> Self {
        Self {
            num_particles: c.num_particles,
            inertia: c.inertia,
            cognitive_weight: c.cognitive_weight,
            social_weight: c.social_weight,
            max_velocity: c.max_velocity,
            dimension: c.dimension,
            max_iterations: c.max_iterations,
            convergence_threshold: c.convergence_threshold,
            position_bounds: c.position_bounds,
            parallel: c.parallel,
        }
    }
}

impl Default for PsoConfig {
    fn default() -> Self {
        PsoConfigBuilder::default().assemble()
    }
}

impl PsoConfig {
    pub fn builder() -> PsoConfigBuilder {
        PsoConfigBuilder::default()
    }

    /// Builder pré-preenchido com esta configuração
    pub fn to_builder(&self) -> PsoConfigBuilder {
        self.clone().into()
    }

    pub fn num_particles(&self) -> usize {
        self.num_particles
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn cognitive_weight(&self) -> f64 {
        self.cognitive_weight
    }

    pub fn social_weight(&self) -> f64 {
        self.social_weight
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    pub fn position_bounds(&self) -> (f64, f64) {
        self.position_bounds
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACO
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuração do Ant Colony Optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AcoConfigBuilder", into = "AcoConfigBuilder")]
pub struct AcoConfig {
    num_ants: usize,
    alpha: f64,
    beta: f64,
    evaporation_rate: f64,
    pheromone_deposit: f64,
    elite_weight: f64,
    max_iterations: usize,
    local_search: bool,
    local_search_interval: usize,
    parallel: bool,
}

/// Builder (e forma serializada) de [`AcoConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcoConfigBuilder {
    pub num_ants: usize,
    /// Expoente do feromônio
    pub alpha: f64,
    /// Expoente da heurística (1/distância)
    pub beta: f64,
    /// Fração evaporada por iteração, em (0, 1)
    pub evaporation_rate: f64,
    pub pheromone_deposit: f64,
    /// Reforço extra da melhor rota conhecida
    pub elite_weight: f64,
    pub max_iterations: usize,
    /// Aplica 2-opt na melhor rota a cada `local_search_interval` iterações
    pub local_search: bool,
    pub local_search_interval: usize,
    /// Constrói as rotas no pool do rayon
    pub parallel: bool,
}

impl Default for AcoConfigBuilder {
    fn default() -> Self {
        Self {
            num_ants: 20,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.5,
            pheromone_deposit: 1.0,
            elite_weight: 2.0,
            max_iterations: 100,
            local_search: false,
            local_search_interval: 10,
            parallel: false,
        }
    }
}

impl AcoConfigBuilder {
    #[must_use]
    pub fn num_ants(mut self, n: usize) -> Self {
        self.num_ants = n;
        self
    }

    #[must_use]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    #[must_use]
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    #[must_use]
    pub fn evaporation_rate(mut self, rate: f64) -> Self {
        self.evaporation_rate = rate;
        self
    }

    #[must_use]
    pub fn pheromone_deposit(mut self, q: f64) -> Self {
        self.pheromone_deposit = q;
        self
    }

    #[must_use]
    pub fn elite_weight(mut self, e: f64) -> Self {
        self.elite_weight = e;
        self
    }

    #[must_use]
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    #[must_use]
    pub fn local_search(mut self, enabled: bool) -> Self {
        self.local_search = enabled;
        self
    }

    #[must_use]
    pub fn local_search_interval(mut self, k: usize) -> Self {
        self.local_search_interval = k;
        self
    }

    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(self) -> SwarmResult<AcoConfig> {
        ensure_at_least("num_ants", self.num_ants, 1)?;
        ensure_at_least("max_iterations", self.max_iterations, 1)?;
        ensure_at_least("local_search_interval", self.local_search_interval, 1)?;
        ensure_non_negative("alpha", self.alpha)?;
        ensure_non_negative("beta", self.beta)?;
        if !(self.evaporation_rate > 0.0 && self.evaporation_rate < 1.0) {
            return Err(SwarmError::config(
                "evaporation_rate",
                format!("must lie in (0, 1), got {}", self.evaporation_rate),
            ));
        }
        ensure_positive("pheromone_deposit", self.pheromone_deposit)?;
        ensure_non_negative("elite_weight", self.elite_weight)?;

        Ok(self.assemble())
    }

    /// Monta a configuração sem validar
    fn assemble(self) -> AcoConfig {
        AcoConfig {
            num_ants: self.num_ants,
            alpha: self.alpha,
            beta: self.beta,
            evaporation_rate: self.evaporation_rate,
            pheromone_deposit: self.pheromone_deposit,
            elite_weight: self.elite_weight,
            max_iterations: self.max_iterations,
            local_search: self.local_search,
            local_search_interval: self.local_search_interval,
            parallel: self.parallel,
        }
    }
}

impl TryFrom<AcoConfigBuilder> for AcoConfig {
    type Error = SwarmError;

    fn try_from(builder: AcoConfigBuilder) -> SwarmResult<Self> {
        builder.build()
    }
}

impl From<AcoConfig> for AcoConfigBuilder {
    fn from(c: AcoConfig) -> Self {
        Self {
            num_ants: c.num_ants,
            alpha: c.alpha,
            beta: c.beta,
            evaporation_rate: c.evaporation_rate,
            pheromone_deposit: c.pheromone_deposit,
            elite_weight: c.elite_weight,
            max_iterations: c.max_iterations,
            local_search: c.local_search,
            local_search_interval: c.local_search_interval,
            parallel: c.parallel,
        }
    }
}

impl Default for AcoConfig {
    fn default() -> Self {
        AcoConfigBuilder::default().assemble()
    }
}

impl AcoConfig {
    pub fn builder() -> AcoConfigBuilder {
        AcoConfigBuilder::default()
    }

    pub fn to_builder(&self) -> AcoConfigBuilder {
        self.clone().into()
    }

    pub fn num_ants(&self) -> usize {
        self.num_ants
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn evaporation_rate(&self) -> f64 {
        self.evaporation_rate
    }

    pub fn pheromone_deposit(&self) -> f64 {
        self.pheromone_deposit
    }

    pub fn elite_weight(&self) -> f64 {
        self.elite_weight
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn local_search(&self) -> bool {
        self.local_search
    }

    pub fn local_search_interval(&self) -> usize {
        self.local_search_interval
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMERGÊNCIA
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuração do detector de emergência
///
/// `velocity_range` e `fitness_variance_scale` são as constantes empíricas de
/// normalização dos detectores de sincronização e especialização. Os valores
/// padrão foram herdados sem derivação e devem passar por revisão de domínio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EmergenceConfigBuilder", into = "EmergenceConfigBuilder")]
pub struct EmergenceConfig {
    detection_interval: usize,
    clustering_threshold: f64,
    sync_threshold: f64,
    min_pattern_size: usize,
    confidence_threshold: f64,
    velocity_range: f64,
    fitness_variance_scale: f64,
    history_capacity: Option<usize>,
}

/// Builder (e forma serializada) de [`EmergenceConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmergenceConfigBuilder {
    /// Amostragem durante execuções PSO a cada N iterações (0 = só no final)
    pub detection_interval: usize,
    pub clustering_threshold: f64,
    pub sync_threshold: f64,
    pub min_pattern_size: usize,
    pub confidence_threshold: f64,
    pub velocity_range: f64,
    pub fitness_variance_scale: f64,
    /// `None` = histórico sem limite
    pub history_capacity: Option<usize>,
}

impl Default for EmergenceConfigBuilder {
    fn default() -> Self {
        Self {
            detection_interval: 10,
            clustering_threshold: 0.5,
            sync_threshold: 0.8,
            min_pattern_size: 3,
            confidence_threshold: 0.6,
            velocity_range: 2.0,
            fitness_variance_scale: 100.0,
            history_capacity: None,
        }
    }
}

impl EmergenceConfigBuilder {
    #[must_use]
    pub fn detection_interval(mut self, n: usize) -> Self {
        self.detection_interval = n;
        self
    }

    #[must_use]
    pub fn clustering_threshold(mut self, t: f64) -> Self {
        self.clustering_threshold = t;
        self
    }

    #[must_use]
    pub fn sync_threshold(mut self, t: f64) -> Self {
        self.sync_threshold = t;
        self
    }

    #[must_use]
    pub fn min_pattern_size(mut self, n: usize) -> Self {
        self.min_pattern_size = n;
        self
    }

    #[must_use]
    pub fn confidence_threshold(mut self, t: f64) -> Self {
        self.confidence_threshold = t;
        self
    }

    #[must_use]
    pub fn velocity_range(mut self, v: f64) -> Self {
        self.velocity_range = v;
        self
    }

    #[must_use]
    pub fn fitness_variance_scale(mut self, s: f64) -> Self {
        self.fitness_variance_scale = s;
        self
    }

    #[must_use]
    pub fn history_capacity(mut self, capacity: Option<usize>) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn build(self) -> SwarmResult<EmergenceConfig> {
        ensure_unit_interval("clustering_threshold", self.clustering_threshold)?;
        ensure_unit_interval("sync_threshold", self.sync_threshold)?;
        ensure_unit_interval("confidence_threshold", self.confidence_threshold)?;
        ensure_at_least("min_pattern_size", self.min_pattern_size, 1)?;
        ensure_positive("velocity_range", self.velocity_range)?;
        ensure_positive("fitness_variance_scale", self.fitness_variance_scale)?;
        if let Some(capacity) = self.history_capacity {
            ensure_at_least("history_capacity", capacity, 1)?;
        }

        Ok(self.assemble())
    }

    /// Monta a configuração sem validar
    fn assemble(self) -> EmergenceConfig {
        EmergenceConfig {
            detection_interval: self.detection_interval,
            clustering_threshold: self.clustering_threshold,
            sync_threshold: self.sync_threshold,
            min_pattern_size: self.min_pattern_size,
            confidence_threshold: self.confidence_threshold,
            velocity_range: self.velocity_range,
            fitness_variance_scale: self.fitness_variance_scale,
            history_capacity: self.history_capacity,
        }
    }
}

impl TryFrom<EmergenceConfigBuilder> for EmergenceConfig {
    type Error = SwarmError;

    fn try_from(builder: EmergenceConfigBuilder) -> SwarmResult<Self> {
        builder.build()
    }
}

impl From<EmergenceConfig> for EmergenceConfigBuilder {
    fn from(c: EmergenceConfig) -> Self {
        Self {
            detection_interval: c.detection_interval,
            clustering_threshold: c.clustering_threshold,
            sync_threshold: c.sync_threshold,
            min_pattern_size: c.min_pattern_size,
            confidence_threshold: c.confidence_threshold,
            velocity_range: c.velocity_range,
            fitness_variance_scale: c.fitness_variance_scale,
            history_capacity: c.history_capacity,
        }
    }
}

impl Default for EmergenceConfig {
    fn default() -> Self {
        EmergenceConfigBuilder::default().assemble()
    }
}

impl EmergenceConfig {
    pub fn builder() -> EmergenceConfigBuilder {
        EmergenceConfigBuilder::default()
    }

    pub fn to_builder(&self) -> EmergenceConfigBuilder {
        self.clone().into()
    }

    pub fn detection_interval(&self) -> usize {
        self.detection_interval
    }

    pub fn clustering_threshold(&self) -> f64 {
        self.clustering_threshold
    }

    pub fn sync_threshold(&self) -> f64 {
        self.sync_threshold
    }

    pub fn min_pattern_size(&self) -> usize {
        self.min_pattern_size
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn velocity_range(&self) -> f64 {
        self.velocity_range
    }

    pub fn fitness_variance_scale(&self) -> f64 {
        self.fitness_variance_scale
    }

    pub fn history_capacity(&self) -> Option<usize> {
        self.history_capacity
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SWARM (MANAGER)
// ═══════════════════════════════════════════════════════════════════════════════

const DEFAULT_MAX_AGENTS: usize = 10_000;
const DEFAULT_MEMORY_LIMIT: u64 = 1 << 30;

/// Configuração do [`SwarmManager`](crate::manager::SwarmManager)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SwarmConfigBuilder", into = "SwarmConfigBuilder")]
pub struct SwarmConfig {
    max_agents: usize,
    memory_limit: u64,
    history_capacity: Option<usize>,
    time_limit: Option<Duration>,
    seed: Option<u64>,
    pso: PsoConfig,
    aco: AcoConfig,
    emergence: EmergenceConfig,
}

/// Builder (e forma serializada) de [`SwarmConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwarmConfigBuilder {
    /// Teto rígido de agentes por execução
    pub max_agents: usize,
    /// Orçamento de memória (bytes); excedê-lo só gera aviso
    pub memory_limit: u64,
    /// Capacidade do histórico de métricas (`None` = sem limite)
    pub history_capacity: Option<usize>,
    /// Limite de tempo por execução, em segundos
    pub time_limit_secs: Option<f64>,
    /// Semente do gerador mestre; `None` usa entropia do sistema
    pub seed: Option<u64>,
    pub pso: PsoConfig,
    pub aco: AcoConfig,
    pub emergence: EmergenceConfig,
}

impl Default for SwarmConfigBuilder {
    fn default() -> Self {
        Self {
            max_agents: DEFAULT_MAX_AGENTS,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            history_capacity: None,
            time_limit_secs: None,
            seed: None,
            pso: PsoConfig::default(),
            aco: AcoConfig::default(),
            emergence: EmergenceConfig::default(),
        }
    }
}

impl SwarmConfigBuilder {
    #[must_use]
    pub fn max_agents(mut self, n: usize) -> Self {
        self.max_agents = n;
        self
    }

    #[must_use]
    pub fn memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = bytes;
        self
    }

    #[must_use]
    pub fn history_capacity(mut self, capacity: Option<usize>) -> Self {
        self.history_capacity = capacity;
        self
    }

    #[must_use]
    pub fn time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit_secs = limit.map(|d| d.as_secs_f64());
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn pso(mut self, pso: PsoConfig) -> Self {
        self.pso = pso;
        self
    }

    #[must_use]
    pub fn aco(mut self, aco: AcoConfig) -> Self {
        self.aco = aco;
        self
    }

    #[must_use]
    pub fn emergence(mut self, emergence: EmergenceConfig) -> Self {
        self.emergence = emergence;
        self
    }

    pub fn build(self) -> SwarmResult<SwarmConfig> {
        ensure_at_least("max_agents", self.max_agents, 1)?;
        if self.memory_limit == 0 {
            return Err(SwarmError::config("memory_limit", "must be > 0"));
        }
        if let Some(capacity) = self.history_capacity {
            ensure_at_least("history_capacity", capacity, 1)?;
        }
        let time_limit = match self.time_limit_secs {
            Some(secs) => {
                ensure_positive("time_limit_secs", secs)?;
                let limit = Duration::try_from_secs_f64(secs)
                    .map_err(|e| SwarmError::config("time_limit_secs", e.to_string()))?;
                Some(limit)
            }
            None => None,
        };

        Ok(self.assemble(time_limit))
    }

    /// Monta a configuração sem validar
    fn assemble(self, time_limit: Option<Duration>) -> SwarmConfig {
        SwarmConfig {
            max_agents: self.max_agents,
            memory_limit: self.memory_limit,
            history_capacity: self.history_capacity,
            time_limit,
            seed: self.seed,
            pso: self.pso,
            aco: self.aco,
            emergence: self.emergence,
        }
    }
}

impl TryFrom<SwarmConfigBuilder> for SwarmConfig {
    type Error = SwarmError;

    fn try_from(builder: SwarmConfigBuilder) -> SwarmResult<Self> {
        builder.build()
    }
}

impl From<SwarmConfig> for SwarmConfigBuilder {
    fn from(c: SwarmConfig) -> Self {
        Self {
            max_agents: c.max_agents,
            memory_limit: c.memory_limit,
            history_capacity: c.history_capacity,
            time_limit_secs: c.time_limit.map(|d| d.as_secs_f64()),
            seed: c.seed,
            pso: c.pso,
            aco: c.aco,
            emergence: c.emergence,
        }
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        SwarmConfigBuilder::default().assemble(None)
    }
}

impl SwarmConfig {
    pub fn builder() -> SwarmConfigBuilder {
        SwarmConfigBuilder::default()
    }

    pub fn to_builder(&self) -> SwarmConfigBuilder {
        self.clone().into()
    }

    /// Lê a árvore completa de um documento TOML (`[pso]`, `[aco]`, `[emergence]`)
    pub fn from_toml_str(text: &str) -> SwarmResult<Self> {
        let builder: SwarmConfigBuilder = toml::from_str(text)?;
        builder.build()
    }

    /// Lê a configuração de um arquivo TOML
    pub fn from_file(path: impl AsRef<Path>) -> SwarmResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Configuração padrão com overrides `SWARM_*` do ambiente (e de `.env`)
    pub fn from_env() -> SwarmResult<Self> {
        Lazy::force(&DOTENV_INIT);
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Aplica overrides `SWARM_*` obtidos por `lookup`
    ///
    /// Valores que não fazem parse são erro de configuração.
    pub fn with_env_overrides<F>(self, lookup: F) -> SwarmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = self.to_builder();

        if let Some(v) = parse_var::<usize, _>(&lookup, "SWARM_MAX_AGENTS", "max_agents")? {
            builder.max_agents = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "SWARM_MEMORY_LIMIT", "memory_limit")? {
            builder.memory_limit = v;
        }
        if let Some(v) =
            parse_var::<usize, _>(&lookup, "SWARM_HISTORY_CAPACITY", "history_capacity")?
        {
            builder.history_capacity = Some(v);
        }
        if let Some(v) =
            parse_var::<f64, _>(&lookup, "SWARM_TIME_LIMIT_SECS", "time_limit_secs")?
        {
            builder.time_limit_secs = Some(v);
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "SWARM_SEED", "seed")? {
            builder.seed = Some(v);
        }

        builder.build()
    }

    pub fn max_agents(&self) -> usize {
        self.max_agents
    }

    pub fn memory_limit(&self) -> u64 {
        self.memory_limit
    }

    pub fn history_capacity(&self) -> Option<usize> {
        self.history_capacity
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn pso(&self) -> &PsoConfig {
        &self.pso
    }

    pub fn aco(&self) -> &AcoConfig {
        &self.aco
    }

    pub fn emergence(&self) -> &EmergenceConfig {
        &self.emergence
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, field: &'static str) -> SwarmResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SwarmError::config(field, format!("cannot parse {key}={raw:?}"))),
        None => Ok(None),
    }
}

// =============================================================================
// Testes
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PsoConfig::builder().build().is_ok());
        assert!(AcoConfig::builder().build().is_ok());
        assert!(EmergenceConfig::builder().build().is_ok());
        assert!(SwarmConfig::builder().build().is_ok());
        assert_eq!(PsoConfig::builder().build().unwrap(), PsoConfig::default());
    }

    #[test]
    fn test_default_matches_built_builder() {
        assert_eq!(PsoConfigBuilder::default().build().unwrap(), PsoConfig::default());
        assert_eq!(AcoConfigBuilder::default().build().unwrap(), AcoConfig::default());
        assert_eq!(
            EmergenceConfigBuilder::default().build().unwrap(),
            EmergenceConfig::default()
        );
        assert_eq!(SwarmConfigBuilder::default().build().unwrap(), SwarmConfig::default());
        assert_eq!(SwarmConfig::default().to_builder(), SwarmConfigBuilder::default());
    }

    #[test]
    fn test_pso_rejects_invalid_fields() {
        let cases = [
            (PsoConfig::builder().num_particles(0), "num_particles"),
            (PsoConfig::builder().dimension(0), "dimension"),
            (PsoConfig::builder().inertia(0.0), "inertia"),
            (PsoConfig::builder().inertia(1.5), "inertia"),
            (PsoConfig::builder().max_velocity(0.0), "max_velocity"),
            (PsoConfig::builder().max_velocity(f64::NAN), "max_velocity"),
            (PsoConfig::builder().max_iterations(0), "max_iterations"),
            (PsoConfig::builder().position_bounds(5.0, 5.0), "position_bounds"),
        ];

        for (builder, expected) in cases {
            match builder.build() {
                Err(SwarmError::Configuration { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected configuration error for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_pso_inertia_upper_bound_inclusive() {
        assert!(PsoConfig::builder().inertia(1.0).build().is_ok());
    }

    #[test]
    fn test_aco_rejects_invalid_fields() {
        assert!(AcoConfig::builder().num_ants(0).build().is_err());
        assert!(AcoConfig::builder().evaporation_rate(0.0).build().is_err());
        assert!(AcoConfig::builder().evaporation_rate(1.0).build().is_err());
        assert!(AcoConfig::builder().alpha(-1.0).build().is_err());
        assert!(AcoConfig::builder().pheromone_deposit(0.0).build().is_err());
        assert!(AcoConfig::builder().local_search_interval(0).build().is_err());
    }

    #[test]
    fn test_emergence_rejects_out_of_range_thresholds() {
        assert!(EmergenceConfig::builder().sync_threshold(1.1).build().is_err());
        assert!(EmergenceConfig::builder().clustering_threshold(-0.1).build().is_err());
        assert!(EmergenceConfig::builder().min_pattern_size(0).build().is_err());
        assert!(EmergenceConfig::builder().velocity_range(0.0).build().is_err());
        assert!(EmergenceConfig::builder().history_capacity(Some(0)).build().is_err());
    }

    #[test]
    fn test_toml_roundtrip_and_validation() {
        let text = r#"
            max_agents = 500
            time_limit_secs = 2.5

            [pso]
            num_particles = 40
            dimension = 3
            position_bounds = [-5.0, 5.0]

            [aco]
            num_ants = 12
            local_search = true

            [emergence]
            min_pattern_size = 4
        "#;

        let config = SwarmConfig::from_toml_str(text).unwrap();
        assert_eq!(config.max_agents(), 500);
        assert_eq!(config.time_limit(), Some(Duration::from_millis(2500)));
        assert_eq!(config.pso().num_particles(), 40);
        assert_eq!(config.pso().position_bounds(), (-5.0, 5.0));
        assert_eq!(config.pso().inertia(), 0.9);
        assert!(config.aco().local_search());
        assert_eq!(config.emergence().min_pattern_size(), 4);

        let serialized = toml::to_string(&config).unwrap();
        assert_eq!(SwarmConfig::from_toml_str(&serialized).unwrap(), config);
    }

    #[test]
    fn test_toml_invalid_nested_value_fails() {
        let text = "[pso]\ninertia = 2.0\n";
        assert!(SwarmConfig::from_toml_str(text).is_err());

        let unknown = "[aco]\nants = 3\n";
        assert!(SwarmConfig::from_toml_str(unknown).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swarm.toml");
        std::fs::write(&path, "max_agents = 64\nseed = 7\n").unwrap();

        let config = SwarmConfig::from_file(&path).unwrap();
        assert_eq!(config.max_agents(), 64);
        assert_eq!(config.seed(), Some(7));

        let missing = SwarmConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(SwarmError::ConfigLoad(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SWARM_MAX_AGENTS", "128"),
            ("SWARM_SEED", " 42 "),
            ("SWARM_TIME_LIMIT_SECS", "0.5"),
        ]
        .into_iter()
        .collect();

        let config = SwarmConfig::default()
            .with_env_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.max_agents(), 128);
        assert_eq!(config.seed(), Some(42));
        assert_eq!(config.time_limit(), Some(Duration::from_millis(500)));
        assert_eq!(config.memory_limit(), DEFAULT_MEMORY_LIMIT);
    }

    #[test]
    fn test_env_override_unparseable_is_error() {
        let result = SwarmConfig::default().with_env_overrides(|k| {
            (k == "SWARM_MAX_AGENTS").then(|| "lots".to_string())
        });
        assert!(matches!(
            result,
            Err(SwarmError::Configuration { field: "max_agents", .. })
        ));
    }

    #[test]
    fn test_time_limit_beyond_duration_range_is_error() {
        let from_toml = SwarmConfig::from_toml_str("time_limit_secs = 1e30");
        assert!(matches!(
            from_toml,
            Err(SwarmError::Configuration { field: "time_limit_secs", .. })
        ));

        let from_env = SwarmConfig::default().with_env_overrides(|k| {
            (k == "SWARM_TIME_LIMIT_SECS").then(|| "1e30".to_string())
        });
        assert!(matches!(
            from_env,
            Err(SwarmError::Configuration { field: "time_limit_secs", .. })
        ));
    }
}
