// src/strategies/trailing_stop.rs
use rust_decimal::Decimal;

/// The stop-price rule: the stop sits `percent` below a reference price and
/// only ever moves up.
#[derive(Debug, Clone)]
pub struct TrailingStop {
    percent: Decimal,
    stop_price: Decimal,
}

impl TrailingStop {
    /// `percent` must lie in (0, 1); config validation guarantees it.
    pub fn new(percent: Decimal) -> Self {
        Self {
            percent,
            stop_price: Decimal::ZERO,
        }
    }

    pub fn stop_price(&self) -> Decimal {
        self.stop_price
    }

    /// Stop price implied by a reference price.
    pub fn stop_for(&self, basis: Decimal) -> Decimal {
        basis * (Decimal::ONE - self.percent)
    }

    /// Sets the stop unconditionally. Used for the first order and when
    /// adopting an existing one.
    pub fn establish(&mut self, stop_price: Decimal) {
        self.stop_price = stop_price;
    }

    /// True when the window maximum clears the margin over the current stop.
    /// Equality does not count.
    pub fn should_raise(&self, window_max: Decimal) -> bool {
        self.stop_for(window_max) > self.stop_price
    }

    /// Picks the basis for a raise: the newest price, unless that would not
    /// lift the stop, in which case the window maximum. `None` if neither does.
    pub fn raise_basis(&self, newest: Decimal, window_max: Decimal) -> Option<Decimal> {
        [newest, window_max]
            .into_iter()
            .find(|basis| self.stop_for(*basis) > self.stop_price)
    }

    /// Moves the stop to the level implied by `basis`. Returns the new stop, or
    /// `None` if it would not rise.
    pub fn raise(&mut self, basis: Decimal) -> Option<Decimal> {
        let candidate = self.stop_for(basis);
        if candidate > self.stop_price {
            self.stop_price = candidate;
            Some(candidate)
        } else {
            None
        }
    }
}
