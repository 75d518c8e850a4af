//! C ABI surface over the dexarb hot path
//!
//! Opaque handles own the stateful objects; value structs cross the
//! boundary by copy. Passing null where a non-null pointer is documented
//! is a recoverable no-op returning 0 or -1. Nothing here panics and no
//! unwinding crosses the boundary: every argument is validated before
//! use and the underlying operations are total.

pub mod types;

use std::ffi::c_char;

use dexarb_calculator::{swap, BatchPriceCalculator};
use dexarb_core::{PoolReserves, PriceResult, ScannerConfig, U256};
use dexarb_detector::OpportunityScanner;

pub use types::{
    FfiArbitrageOpportunity, FfiPoolReserves, FfiPriceResult, FfiScannerConfig, FfiU256,
};

/// Opaque scanner handle.
pub type ScannerHandle = OpportunityScanner;

/// Opaque batch calculator handle.
pub type BatchCalculatorHandle = BatchPriceCalculator;

// ============================================================================
// Price calculation
// ============================================================================

/// Calculate the price of a single pool. Returns 0 on success, -1 on a
/// null argument.
#[no_mangle]
pub extern "C" fn calculate_price(
    reserves: *const FfiPoolReserves,
    out: *mut FfiPriceResult,
) -> i32 {
    if reserves.is_null() || out.is_null() {
        return -1;
    }
    // Safety: both pointers were null-checked; the caller guarantees they
    // point at valid, properly sized structs.
    unsafe {
        let native = PoolReserves::from(&*reserves);
        let result = dexarb_calculator::calculate_price(&native);
        *out = FfiPriceResult::from(&result);
    }
    0
}

/// Calculate prices for `count` pools. Returns the number written.
#[no_mangle]
pub extern "C" fn calculate_prices_batch(
    reserves: *const FfiPoolReserves,
    count: usize,
    out: *mut FfiPriceResult,
) -> usize {
    if reserves.is_null() || out.is_null() || count == 0 {
        return 0;
    }
    // Safety: pointers were null-checked; the caller guarantees `count`
    // readable inputs and `count` writable outputs.
    unsafe {
        let inputs = std::slice::from_raw_parts(reserves, count);
        let outputs = std::slice::from_raw_parts_mut(out, count);
        for (input, output) in inputs.iter().zip(outputs.iter_mut()) {
            let native = PoolReserves::from(input);
            let result = dexarb_calculator::calculate_price(&native);
            *output = FfiPriceResult::from(&result);
        }
    }
    count
}

/// Constant-product swap output under the 30 bps fee. Returns 0 on
/// success, -1 on a null argument.
#[no_mangle]
pub extern "C" fn calculate_swap_output(
    reserve_in: *const FfiU256,
    reserve_out: *const FfiU256,
    amount_in: *const FfiU256,
    out: *mut FfiU256,
) -> i32 {
    if reserve_in.is_null() || reserve_out.is_null() || amount_in.is_null() || out.is_null() {
        return -1;
    }
    // Safety: all pointers were null-checked.
    unsafe {
        let result = swap::calculate_swap_output(
            &U256::from(*reserve_in),
            &U256::from(*reserve_out),
            &U256::from(*amount_in),
        );
        *out = FfiU256::from(result);
    }
    0
}

/// Slippage in basis points; 0 on invalid input (including nulls).
#[no_mangle]
pub extern "C" fn calculate_slippage_bps(
    reserve_in: *const FfiU256,
    reserve_out: *const FfiU256,
    amount_in: *const FfiU256,
) -> i64 {
    if reserve_in.is_null() || reserve_out.is_null() || amount_in.is_null() {
        return 0;
    }
    // Safety: all pointers were null-checked.
    unsafe {
        swap::calculate_slippage_bps(
            &U256::from(*reserve_in),
            &U256::from(*reserve_out),
            &U256::from(*amount_in),
        )
    }
}

// ============================================================================
// Batch calculator
// ============================================================================

/// Create a batch calculator. The handle stays valid until destroyed.
#[no_mangle]
pub extern "C" fn batch_calculator_create() -> *mut BatchCalculatorHandle {
    Box::into_raw(Box::new(BatchPriceCalculator::new()))
}

/// Destroy a batch calculator. Null is a no-op.
#[no_mangle]
pub extern "C" fn batch_calculator_destroy(handle: *mut BatchCalculatorHandle) {
    if !handle.is_null() {
        // Safety: the handle came from `batch_calculator_create` and is
        // destroyed exactly once.
        drop(unsafe { Box::from_raw(handle) });
    }
}

/// Add a pool to the batch. Returns 1 if accepted, 0 if rejected (full
/// batch or null argument).
#[no_mangle]
pub extern "C" fn batch_calculator_add_pool(
    handle: *mut BatchCalculatorHandle,
    reserves: *const FfiPoolReserves,
) -> i32 {
    if handle.is_null() || reserves.is_null() {
        return 0;
    }
    // Safety: both pointers were null-checked.
    let accepted = unsafe { (*handle).add_pool(&PoolReserves::from(&*reserves)) };
    accepted as i32
}

/// Price every accumulated pool into `results`, bounded by
/// `max_results`. Returns the number written.
#[no_mangle]
pub extern "C" fn batch_calculator_process(
    handle: *mut BatchCalculatorHandle,
    results: *mut FfiPriceResult,
    max_results: usize,
) -> usize {
    if handle.is_null() || results.is_null() || max_results == 0 {
        return 0;
    }
    // Safety: pointers were null-checked; the caller guarantees
    // `max_results` writable slots.
    unsafe {
        let calculator = &*handle;
        let count = calculator.pool_count().min(max_results);
        let mut native = vec![PriceResult::default(); count];
        let written = calculator.process(&mut native);
        let outputs = std::slice::from_raw_parts_mut(results, written);
        for (output, result) in outputs.iter_mut().zip(&native) {
            *output = FfiPriceResult::from(result);
        }
        written
    }
}

/// Clear the batch. Null is a no-op.
#[no_mangle]
pub extern "C" fn batch_calculator_clear(handle: *mut BatchCalculatorHandle) {
    if !handle.is_null() {
        // Safety: valid handle per the create/destroy contract.
        unsafe { (*handle).clear() };
    }
}

/// Number of accumulated pools; 0 for null.
#[no_mangle]
pub extern "C" fn batch_calculator_pool_count(handle: *const BatchCalculatorHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    // Safety: valid handle per the create/destroy contract.
    unsafe { (*handle).pool_count() }
}

// ============================================================================
// Opportunity scanner
// ============================================================================

/// Create a scanner. A null config selects the defaults.
#[no_mangle]
pub extern "C" fn scanner_create(config: *const FfiScannerConfig) -> *mut ScannerHandle {
    let config = if config.is_null() {
        ScannerConfig::default()
    } else {
        // Safety: non-null config was provided by the caller.
        ScannerConfig::from(unsafe { &*config })
    };
    Box::into_raw(Box::new(OpportunityScanner::new(config)))
}

/// Destroy a scanner. Null is a no-op.
#[no_mangle]
pub extern "C" fn scanner_destroy(handle: *mut ScannerHandle) {
    if !handle.is_null() {
        // Safety: the handle came from `scanner_create` and is destroyed
        // exactly once.
        drop(unsafe { Box::from_raw(handle) });
    }
}

/// Update a pool in the scanner. Nulls are no-ops.
#[no_mangle]
pub extern "C" fn scanner_update_pool(
    handle: *mut ScannerHandle,
    reserves: *const FfiPoolReserves,
) {
    if handle.is_null() || reserves.is_null() {
        return;
    }
    // Safety: both pointers were null-checked.
    unsafe {
        (*handle).update_pool(PoolReserves::from(&*reserves));
    }
}

/// Scan and copy up to `max_opportunities` ranked results. Returns the
/// number copied.
#[no_mangle]
pub extern "C" fn scanner_scan(
    handle: *mut ScannerHandle,
    opportunities: *mut FfiArbitrageOpportunity,
    max_opportunities: usize,
) -> usize {
    if handle.is_null() || opportunities.is_null() || max_opportunities == 0 {
        return 0;
    }
    // Safety: pointers were null-checked; the caller guarantees
    // `max_opportunities` writable slots.
    unsafe {
        let found = (*handle).scan();
        let count = found.len().min(max_opportunities);
        let outputs = std::slice::from_raw_parts_mut(opportunities, count);
        for (output, opportunity) in outputs.iter_mut().zip(found.iter()) {
            *output = FfiArbitrageOpportunity::from(opportunity);
        }
        count
    }
}

/// Best opportunity, if any. Returns 1 when found, 0 otherwise.
#[no_mangle]
pub extern "C" fn scanner_get_best(
    handle: *mut ScannerHandle,
    opportunity: *mut FfiArbitrageOpportunity,
) -> i32 {
    if handle.is_null() || opportunity.is_null() {
        return 0;
    }
    // Safety: both pointers were null-checked.
    unsafe {
        match (*handle).get_best() {
            Some(best) => {
                *opportunity = FfiArbitrageOpportunity::from(&best);
                1
            }
            None => 0,
        }
    }
}

/// Clear all pools. Null is a no-op.
#[no_mangle]
pub extern "C" fn scanner_clear(handle: *mut ScannerHandle) {
    if !handle.is_null() {
        // Safety: valid handle per the create/destroy contract.
        unsafe { (*handle).clear() };
    }
}

/// Number of tracked pools; 0 for null.
#[no_mangle]
pub extern "C" fn scanner_pool_count(handle: *const ScannerHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    // Safety: valid handle per the create/destroy contract.
    unsafe { (*handle).pool_count() }
}

/// Replace the scanner configuration. Nulls are no-ops.
#[no_mangle]
pub extern "C" fn scanner_set_config(handle: *mut ScannerHandle, config: *const FfiScannerConfig) {
    if handle.is_null() || config.is_null() {
        return;
    }
    // Safety: both pointers were null-checked.
    unsafe {
        (*handle).set_config(ScannerConfig::from(&*config));
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Advisory AVX2 probe: 1 if available.
#[no_mangle]
pub extern "C" fn has_avx2() -> i32 {
    dexarb_core::has_avx2() as i32
}

/// Advisory AVX-512F probe: 1 if available.
#[no_mangle]
pub extern "C" fn has_avx512() -> i32 {
    dexarb_core::has_avx512() as i32
}

/// Library version as a static NUL-terminated string.
#[no_mangle]
pub extern "C" fn version() -> *const c_char {
    c"0.1.0".as_ptr()
}
