//! # 🐝 swarm-engine — Metaheurísticas de Swarm
//!
//! Otimização por enxame de partículas (PSO) e por colônia de formigas (ACO),
//! detecção de padrões emergentes e uma fachada que limita recursos e mantém
//! o histórico de execuções.
//!
//! ## Computational Complexity
//!
//! **PSO — O(P × D) por iteração:**
//! - P = partículas, D = dimensão
//! - avaliação de fitness em paralelo com `parallel = true` (rayon)
//!
//! **ACO — O(A × N²) por iteração:**
//! - A = formigas, N = cidades
//! - 2-opt opcional: O(N²) por passada (simétrico), O(N³) (assimétrico)
//!
//! **Emergência — O(P² × D) por detecção:**
//! - distâncias par a par no detector de clustering
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 SwarmManager                    │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  SwarmConfig + teto de agentes + sonda    │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌──────────────────┐  ┌─────────────────────┐  │
//! │  │ ParticleSwarm /  │─►│ EmergenceDetector   │  │
//! │  │ AntColony        │  │ (snapshots PSO)     │  │
//! │  └──────────────────┘  └─────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  BoundedHistory<SwarmMetrics>             │  │
//! │  └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```
//! use swarm_engine::{SwarmConfig, SwarmManager};
//!
//! let config = SwarmConfig::builder().seed(Some(42)).build()?;
//! let mut manager = SwarmManager::new(config);
//!
//! let sphere = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
//! let (position, value, metrics) = manager.optimize_continuous(sphere, 3, 30, Some(50))?;
//!
//! assert_eq!(position.len(), 3);
//! assert_eq!(value, metrics.best_value);
//! # Ok::<(), swarm_engine::SwarmError>(())
//! ```

pub mod aco;
pub mod config;
pub mod control;
pub mod emergence;
pub mod error;
pub mod manager;
pub mod pso;
pub mod resources;
pub mod types;

pub use aco::{AcoIteration, AntColonyOptimizer, DistanceMatrix, HEURISTIC_EPSILON, PheromoneTrail};
pub use config::{
    AcoConfig, AcoConfigBuilder, EmergenceConfig, EmergenceConfigBuilder, PsoConfig,
    PsoConfigBuilder, SwarmConfig, SwarmConfigBuilder,
};
pub use control::CancellationToken;
pub use emergence::EmergenceDetector;
pub use error::{SwarmError, SwarmResult};
pub use manager::{AlgorithmSummary, MetricsSummary, SwarmManager};
pub use pso::{DIVERSITY_FLOOR, Particle, ParticleSwarmOptimizer, PsoIteration};
pub use resources::{MemInfoProbe, ResourceProbe, StaticProbe};
pub use types::{
    AgentSnapshot, Algorithm, BoundedHistory, EmergentPattern, PatternType, Solution,
    SwarmMetrics, SwarmState, TerminationReason, Timestamp,
};
