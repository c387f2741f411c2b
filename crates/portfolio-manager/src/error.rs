use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("Fill price must be positive, got {price} for {ticker}")]
    InvalidPrice { ticker: String, price: f64 },

    #[error("No open position in {0}")]
    NoPosition(String),

    #[error("Cannot sell {requested} shares of {ticker}: only {held} held")]
    Oversell {
        ticker: String,
        requested: u64,
        held: u64,
    },

    #[error("Fill quantity must be non-zero for {0}")]
    ZeroQuantity(String),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;
