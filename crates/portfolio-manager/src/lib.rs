pub mod error;
pub mod models;
pub mod portfolio;
pub mod positions;
pub mod pyramiding;
pub mod rebalancing;
pub mod rotation;
pub mod take_profit;

pub use error::{PortfolioError, PortfolioResult};
pub use models::*;
pub use portfolio::PortfolioManager;
pub use positions::PositionBook;
pub use rebalancing::RebalanceCalculator;
