//! Sondagem de recursos e estimativas de memória
//!
//! A sonda é uma capacidade opcional: o manager guarda
//! `Option<Arc<dyn ResourceProbe>>` e trata a ausência explicitamente.

use std::mem::size_of;

/// Fonte de informação sobre recursos da máquina
pub trait ResourceProbe: Send + Sync + std::fmt::Debug {
    /// Memória disponível em bytes, se conhecida
    fn available_memory(&self) -> Option<u64>;

    /// Indica se há acelerador disponível (apenas informativo)
    fn accelerator_available(&self) -> bool;
}

/// Sonda com valores fixos
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProbe {
    pub available_memory: Option<u64>,
    pub accelerator: bool,
}

impl StaticProbe {
    pub fn new(available_memory: Option<u64>, accelerator: bool) -> Self {
        Self {
            available_memory,
            accelerator,
        }
    }
}

impl ResourceProbe for StaticProbe {
    fn available_memory(&self) -> Option<u64> {
        self.available_memory
    }

    fn accelerator_available(&self) -> bool {
        self.accelerator
    }
}

/// Lê `MemAvailable` de `/proc/meminfo` (Linux)
#[derive(Debug, Clone, Copy, Default)]
pub struct MemInfoProbe;

impl MemInfoProbe {
    /// Extrai `MemAvailable` (kB) de um conteúdo no formato de `/proc/meminfo`
    fn parse_available(meminfo: &str) -> Option<u64> {
        meminfo
            .lines()
            .find(|line| line.starts_with("MemAvailable:"))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|kb| kb.parse::<u64>().ok())
            .map(|kb| kb * 1024)
    }
}

impl ResourceProbe for MemInfoProbe {
    fn available_memory(&self) -> Option<u64> {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|text| Self::parse_available(&text))
    }

    fn accelerator_available(&self) -> bool {
        false
    }
}

/// Memória estimada de uma população PSO: posição, velocidade e melhor
/// posição por partícula, mais o registro da partícula
pub fn estimate_pso_memory(num_particles: usize, dimension: usize) -> u64 {
    let per_particle = 3 * dimension * size_of::<f64>() + 3 * size_of::<Vec<f64>>() + 32;
    (num_particles as u64).saturating_mul(per_particle as u64)
}

/// Memória estimada de uma colônia: trilha n×n, heurística n×n e uma rota por formiga
pub fn estimate_aco_memory(num_ants: usize, num_cities: usize) -> u64 {
    let cells = (num_cities as u64).saturating_mul(num_cities as u64);
    let matrices = cells.saturating_mul(2 * size_of::<f64>() as u64);
    let tour = (num_cities as u64).saturating_mul(size_of::<usize>() as u64);
    let tours = (num_ants as u64).saturating_mul(tour);
    matrices.saturating_add(tours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meminfo() {
        let sample = "MemTotal:       16302048 kB\nMemFree:         1024000 kB\nMemAvailable:    8000000 kB\n";
        assert_eq!(MemInfoProbe::parse_available(sample), Some(8_000_000 * 1024));
        assert_eq!(MemInfoProbe::parse_available("MemTotal: 1 kB"), None);
    }

    #[test]
    fn test_estimates_scale_with_size() {
        assert!(estimate_pso_memory(100, 10) > estimate_pso_memory(10, 10));
        assert!(estimate_pso_memory(10, 100) > estimate_pso_memory(10, 10));
        assert_eq!(estimate_aco_memory(0, 10), 2 * 100 * 8);
    }

    #[test]
    fn test_static_probe() {
        let probe = StaticProbe::new(Some(1024), true);
        assert_eq!(probe.available_memory(), Some(1024));
        assert!(probe.accelerator_available());
    }
}
