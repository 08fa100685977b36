// src/core/price_window.rs
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent price samples.
#[derive(Debug, Clone)]
pub struct PriceWindow {
    samples: VecDeque<Decimal>,
    capacity: usize,
}

impl PriceWindow {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds a sample, evicting the oldest one first when full.
    pub fn append(&mut self, sample: Decimal) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest first.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Decimal> {
        self.samples.iter()
    }

    pub fn max(&self) -> Option<Decimal> {
        self.samples.iter().copied().max()
    }

    pub fn min(&self) -> Option<Decimal> {
        self.samples.iter().copied().min()
    }

    pub fn average(&self) -> Option<Decimal> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: Decimal = self.samples.iter().sum();
        Some(sum / Decimal::from(self.samples.len()))
    }
}
