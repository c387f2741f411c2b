pub mod models;
pub mod sizing;
pub mod stops;
#[cfg(test)]
mod tests;

pub use models::*;
pub use sizing::{check_leverage_limit, position_size, should_trigger_stop_loss, stop_price};
