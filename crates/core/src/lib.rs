//! Core types and arithmetic for the dexarb hot path
//!
//! This crate provides the pieces shared by every component:
//! - 256-bit fixed-point integers and the widening helpers behind them
//! - the 4-wide f64 SIMD kernel with a portable scalar contract
//! - pool, price, update and opportunity value types
//! - scanner, confidence and engine configuration

pub mod config;
pub mod errors;
pub mod simd;
pub mod types;
pub mod u256;

pub use config::*;
pub use errors::*;
pub use simd::{has_avx2, has_avx512, F64x4};
pub use types::*;
pub use u256::U256;
