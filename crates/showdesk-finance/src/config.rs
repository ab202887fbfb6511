//! Finance configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Configuration for the viability projector and the lifecycle services.
#[derive(Debug, Clone)]
pub struct FinanceConfig {
    /// Minimum projected margin, in percent, for a show to be VIABLE
    /// (default: 20).
    pub viability_threshold: Decimal,
    /// Flight cost used when the tenant has no history (default: 1200.00).
    pub default_flight_cost: Decimal,
    /// Nightly hotel cost used when the tenant has no history
    /// (default: 350.00).
    pub default_hotel_cost: Decimal,
    /// Travellers sharing one hotel room (default: 2).
    pub guests_per_room: u32,
    /// Length of the trailing history window in days (default: 365).
    pub history_window_days: u32,
    /// Attempts at a version-guarded show write before giving up
    /// (default: 5).
    pub max_write_attempts: u32,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            viability_threshold: dec!(20),
            default_flight_cost: dec!(1200.00),
            default_hotel_cost: dec!(350.00),
            guests_per_room: 2,
            history_window_days: 365,
            max_write_attempts: 5,
        }
    }
}
