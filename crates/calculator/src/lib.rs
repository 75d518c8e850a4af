//! AMM price calculation for the dexarb hot path
//!
//! Everything here is total: invalid inputs produce zero results, overflow
//! is averted by scaling or widened intermediates, and nothing allocates.

pub mod batch;
pub mod price;
pub mod swap;

pub use batch::BatchPriceCalculator;
pub use price::{
    calculate_price, calculate_price_with_bands, calculate_prices_batch,
    calculate_prices_batch_with_bands,
};
pub use swap::{
    calculate_arbitrage_profit, calculate_optimal_trade_size, calculate_slippage_bps,
    calculate_swap_output,
};
