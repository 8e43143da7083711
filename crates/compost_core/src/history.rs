//! Histórico de tendência com capacidade fixa.
//!
//! FIFO: com o buffer cheio, cada inserção descarta o ponto mais antigo.
//! Volátil, vale só para a sessão atual.

use crate::types::{HistoryPoint, Reading};
use std::collections::VecDeque;

/// Sequência limitada de [`HistoryPoint`] em ordem de chegada.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Cria um buffer vazio. A capacidade não muda depois.
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Adiciona a projeção da leitura, descartando o ponto mais antigo se cheio.
    pub fn append(&mut self, reading: &Reading) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(reading.history_point());
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Cópia dos pontos, do mais antigo ao mais recente.
    pub fn snapshot(&self) -> Vec<HistoryPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}
