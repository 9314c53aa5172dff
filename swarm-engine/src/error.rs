//! Tipos de erro para swarm-engine

use thiserror::Error;

/// Resultado customizado para operações de swarm
pub type SwarmResult<T> = Result<T, SwarmError>;

/// Erros que podem ocorrer em operações de swarm
///
/// Término por limite de iterações não é erro: aparece como
/// [`TerminationReason::MaxIterations`](crate::types::TerminationReason) nas métricas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SwarmError {
    /// Parâmetro inválido, detectado na construção (nenhum estado parcial criado)
    #[error("Invalid configuration for `{field}`: {reason}")]
    Configuration { field: &'static str, reason: String },

    /// Número de agentes pedido acima do teto configurado
    #[error("Resource limit exceeded: requested {requested} agents, limit is {limit}")]
    ResourceLimitExceeded { requested: usize, limit: usize },

    /// Matriz não quadrada ou vetores com comprimentos inconsistentes
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    /// Falha da função de fitness, com contexto de iteração e agente
    #[error("Evaluation failed at iteration {iteration} (agent {agent_id}): {message}")]
    Evaluation {
        iteration: usize,
        agent_id: usize,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),
}

impl SwarmError {
    /// Atalho para erros de configuração
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for SwarmError {
    fn from(err: toml::de::Error) -> Self {
        SwarmError::ConfigLoad(err.to_string())
    }
}

impl From<std::io::Error> for SwarmError {
    fn from(err: std::io::Error) -> Self {
        SwarmError::ConfigLoad(err.to_string())
    }
}

impl From<serde_json::Error> for SwarmError {
    fn from(err: serde_json::Error) -> Self {
        SwarmError::InvalidInput(err.to_string())
    }
}
