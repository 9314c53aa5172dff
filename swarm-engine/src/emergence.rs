//! # Emergence — Detecção de Padrões Coletivos
//!
//! Analisa um snapshot da população e extrai padrões tipados.
//!
//! ## Detectores
//!
//! - **Clustering**: agrupamento guloso por distância, com limiar
//!   `distância_média × (1 − clustering_threshold)`
//! - **Synchronization**: `1 − dispersão_normalizada` das velocidades
//! - **Specialization**: agentes com fitness a mais de um desvio-padrão da média
//!
//! As constantes de normalização (`velocity_range`, `fitness_variance_scale`)
//! vêm de [`EmergenceConfig`]. A detecção não altera os snapshots; os padrões
//! aceitos são anexados ao histórico do detector.

use crate::config::EmergenceConfig;
use crate::error::{SwarmError, SwarmResult};
use crate::types::{AgentSnapshot, BoundedHistory, EmergentPattern, PatternType};
use std::collections::BTreeMap;

/// Score mínimo de variância normalizada para reportar especialização
const SPECIALIZATION_MIN_SCORE: f64 = 0.5;

/// Detector de padrões emergentes com histórico próprio
#[derive(Debug, Clone)]
pub struct EmergenceDetector {
    config: EmergenceConfig,
    history: BoundedHistory<EmergentPattern>,
}

impl Default for EmergenceDetector {
    fn default() -> Self {
        Self::new(EmergenceConfig::default())
    }
}

impl EmergenceDetector {
    pub fn new(config: EmergenceConfig) -> Self {
        let history = BoundedHistory::new(config.history_capacity());
        Self { config, history }
    }

    pub fn config(&self) -> &EmergenceConfig {
        &self.config
    }

    /// Padrões aceitos até agora, do mais antigo para o mais novo
    pub fn history(&self) -> &BoundedHistory<EmergentPattern> {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Os `n` padrões mais recentes
    pub fn recent_patterns(&self, n: usize) -> Vec<EmergentPattern> {
        self.history.recent(n).cloned().collect()
    }

    /// Contagem de padrões no histórico, por tipo
    pub fn pattern_counts(&self) -> BTreeMap<PatternType, usize> {
        let mut counts = BTreeMap::new();
        for pattern in self.history.iter() {
            *counts.entry(pattern.pattern_type()).or_insert(0) += 1;
        }
        counts
    }

    /// Se a iteração (base 1) deve ser amostrada durante uma execução
    ///
    /// `detection_interval == 0` desliga a amostragem intermediária.
    pub fn should_sample(&self, iteration: usize) -> bool {
        let interval = self.config.detection_interval();
        interval > 0 && iteration > 0 && iteration % interval == 0
    }

    /// Roda os três detectores sobre `snapshots`
    ///
    /// Retorna vazio (sem erro) com menos de `min_pattern_size` agentes.
    /// Vetores de posição ou velocidade com comprimentos inconsistentes
    /// resultam em [`SwarmError::DimensionMismatch`].
    pub fn detect_patterns(
        &mut self,
        snapshots: &[AgentSnapshot],
    ) -> SwarmResult<Vec<EmergentPattern>> {
        if snapshots.len() < self.config.min_pattern_size() {
            return Ok(Vec::new());
        }
        validate_dimensions(snapshots)?;

        let patterns: Vec<EmergentPattern> = [
            self.detect_clustering(snapshots),
            self.detect_synchronization(snapshots),
            self.detect_specialization(snapshots),
        ]
        .into_iter()
        .flatten()
        .collect();

        for pattern in &patterns {
            self.history.push(pattern.clone());
        }
        Ok(patterns)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CLUSTERING
    // ═══════════════════════════════════════════════════════════════════════════

    fn detect_clustering(&self, snapshots: &[AgentSnapshot]) -> Option<EmergentPattern> {
        let n = snapshots.len();
        if n < 2 {
            return None;
        }

        let mut total = 0.0;
        for i in 0..n {
            for j in i + 1..n {
                total += snapshots[i].distance_to(&snapshots[j]);
            }
        }
        let avg_distance = total / (n * (n - 1) / 2) as f64;
        let merge_threshold = avg_distance * (1.0 - self.config.clustering_threshold());

        // Agrupamento guloso: cada agente livre semeia um cluster
        let mut assigned = vec![false; n];
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for i in 0..n {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;
            let mut members = vec![i];
            for j in i + 1..n {
                if !assigned[j] && snapshots[i].distance_to(&snapshots[j]) <= merge_threshold {
                    assigned[j] = true;
                    members.push(j);
                }
            }
            if members.len() >= 2 {
                clusters.push(members);
            }
        }

        let min_size = self.config.min_pattern_size();
        let participants: Vec<usize> = clusters
            .iter()
            .filter(|c| c.len() >= min_size)
            .flatten()
            .map(|&k| snapshots[k].id)
            .collect();
        if participants.is_empty() {
            return None;
        }

        let confidence = participants.len() as f64 / n as f64;
        if confidence < self.config.confidence_threshold() {
            return None;
        }

        let largest = clusters.iter().map(Vec::len).max().unwrap_or(0);
        let metrics = BTreeMap::from([
            ("avg_distance".to_string(), avg_distance),
            ("merge_threshold".to_string(), merge_threshold),
            ("cluster_count".to_string(), clusters.len() as f64),
            ("largest_cluster".to_string(), largest as f64),
        ]);
        Some(EmergentPattern::new(
            PatternType::Clustering,
            confidence,
            participants,
            metrics,
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SINCRONIZAÇÃO
    // ═══════════════════════════════════════════════════════════════════════════

    fn detect_synchronization(&self, snapshots: &[AgentSnapshot]) -> Option<EmergentPattern> {
        let dims = snapshots.first()?.velocity.len();
        if dims == 0 {
            return None;
        }

        let n = snapshots.len() as f64;
        let mut spread = 0.0;
        for d in 0..dims {
            let mean = snapshots.iter().map(|s| s.velocity[d]).sum::<f64>() / n;
            let var = snapshots
                .iter()
                .map(|s| (s.velocity[d] - mean).powi(2))
                .sum::<f64>()
                / n;
            spread += var.sqrt();
        }
        spread /= dims as f64;

        let normalized = (spread / self.config.velocity_range()).min(1.0);
        let synchronization = 1.0 - normalized;
        if !synchronization.is_finite() || synchronization < self.config.sync_threshold() {
            return None;
        }

        let metrics = BTreeMap::from([
            ("synchronization".to_string(), synchronization),
            ("velocity_spread".to_string(), spread),
        ]);
        Some(EmergentPattern::new(
            PatternType::Synchronization,
            synchronization,
            snapshots.iter().map(|s| s.id).collect(),
            metrics,
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ESPECIALIZAÇÃO
    // ═══════════════════════════════════════════════════════════════════════════

    fn detect_specialization(&self, snapshots: &[AgentSnapshot]) -> Option<EmergentPattern> {
        // Fitness não finito não entra na estatística
        let scored: Vec<&AgentSnapshot> =
            snapshots.iter().filter(|s| s.fitness.is_finite()).collect();
        if scored.len() < 2 {
            return None;
        }

        let n = scored.len() as f64;
        let mean = scored.iter().map(|s| s.fitness).sum::<f64>() / n;
        let variance = scored.iter().map(|s| (s.fitness - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let score = (variance / self.config.fitness_variance_scale()).min(1.0);

        let specialists: Vec<usize> = scored
            .iter()
            .filter(|s| (s.fitness - mean).abs() > std_dev)
            .map(|s| s.id)
            .collect();

        if specialists.len() < self.config.min_pattern_size() || score < SPECIALIZATION_MIN_SCORE
        {
            return None;
        }

        let metrics = BTreeMap::from([
            ("fitness_mean".to_string(), mean),
            ("fitness_variance".to_string(), variance),
            ("normalized_variance".to_string(), score),
            ("specialists".to_string(), specialists.len() as f64),
        ]);
        Some(EmergentPattern::new(
            PatternType::Specialization,
            score,
            specialists,
            metrics,
        ))
    }
}

fn validate_dimensions(snapshots: &[AgentSnapshot]) -> SwarmResult<()> {
    let Some(first) = snapshots.first() else {
        return Ok(());
    };
    for snapshot in snapshots {
        if snapshot.position.len() != first.position.len() {
            return Err(SwarmError::DimensionMismatch {
                expected: first.position.len(),
                actual: snapshot.position.len(),
                context: format!("position of agent {}", snapshot.id),
            });
        }
        if snapshot.velocity.len() != first.velocity.len() {
            return Err(SwarmError::DimensionMismatch {
                expected: first.velocity.len(),
                actual: snapshot.velocity.len(),
                context: format!("velocity of agent {}", snapshot.id),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Testes
// =============================================================================
