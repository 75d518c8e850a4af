//! 4-wide f64 kernel
//!
//! The portable scalar implementation is the correctness contract; the AVX2
//! paths are dispatched at runtime and must stay within one ULP of it. The
//! batch entry points below are what the calculator and scanner actually
//! call, so feature detection is amortised over whole slices.

/// Four f64 lanes, aligned for 256-bit vector loads.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C, align(32))]
pub struct F64x4(pub [f64; 4]);

impl F64x4 {
    #[inline]
    pub const fn splat(v: f64) -> Self {
        Self([v; 4])
    }

    #[inline]
    pub const fn from_array(lanes: [f64; 4]) -> Self {
        Self(lanes)
    }

    /// Load four lanes from a slice. The slice must hold at least four
    /// elements; alignment is not required.
    #[inline]
    pub fn load(src: &[f64]) -> Self {
        Self([src[0], src[1], src[2], src[3]])
    }

    #[inline]
    pub fn store(&self, dst: &mut [f64]) {
        dst[..4].copy_from_slice(&self.0);
    }

    #[inline]
    pub const fn to_array(self) -> [f64; 4] {
        self.0
    }

    #[inline]
    pub fn add(self, rhs: Self) -> Self {
        Self([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
            self.0[3] + rhs.0[3],
        ])
    }

    #[inline]
    pub fn sub(self, rhs: Self) -> Self {
        Self([
            self.0[0] - rhs.0[0],
            self.0[1] - rhs.0[1],
            self.0[2] - rhs.0[2],
            self.0[3] - rhs.0[3],
        ])
    }

    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        Self([
            self.0[0] * rhs.0[0],
            self.0[1] * rhs.0[1],
            self.0[2] * rhs.0[2],
            self.0[3] * rhs.0[3],
        ])
    }

    #[inline]
    pub fn div(self, rhs: Self) -> Self {
        Self([
            self.0[0] / rhs.0[0],
            self.0[1] / rhs.0[1],
            self.0[2] / rhs.0[2],
            self.0[3] / rhs.0[3],
        ])
    }

    /// Fused multiply-add: `self * b + c` per lane.
    #[inline]
    pub fn fma(self, b: Self, c: Self) -> Self {
        Self([
            self.0[0].mul_add(b.0[0], c.0[0]),
            self.0[1].mul_add(b.0[1], c.0[1]),
            self.0[2].mul_add(b.0[2], c.0[2]),
            self.0[3].mul_add(b.0[3], c.0[3]),
        ])
    }

    /// Horizontal sum, pairwise to match the vector reduction order.
    #[inline]
    pub fn hsum(self) -> f64 {
        (self.0[0] + self.0[2]) + (self.0[1] + self.0[3])
    }

    #[inline]
    pub fn hmin(self) -> f64 {
        self.0[0].min(self.0[1]).min(self.0[2].min(self.0[3]))
    }

    #[inline]
    pub fn hmax(self) -> f64 {
        self.0[0].max(self.0[1]).max(self.0[2].max(self.0[3]))
    }
}

/// AVX2 advisory probe.
pub fn has_avx2() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::arch::is_x86_feature_detected!("avx2")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// AVX-512F advisory probe.
pub fn has_avx512() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::arch::is_x86_feature_detected!("avx512f")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Approximate spot prices (`reserve1 / reserve0` over low limbs) for a
/// slice of pools, four lanes at a time. Lanes with a zero `reserve0`
/// produce 0.0. Used as a pre-filter; exact prices always come from the
/// wide-integer path.
pub fn price_approx_batch(reserve0: &[u64], reserve1: &[u64], out: &mut [f64]) {
    let n = reserve0.len().min(reserve1.len()).min(out.len());

    #[cfg(target_arch = "x86_64")]
    if std::arch::is_x86_feature_detected!("avx2") {
        // Safety: AVX2 support was just verified.
        unsafe { avx2::price_approx(&reserve0[..n], &reserve1[..n], &mut out[..n]) };
        return;
    }

    price_approx_scalar(&reserve0[..n], &reserve1[..n], &mut out[..n]);
}

fn price_approx_scalar(reserve0: &[u64], reserve1: &[u64], out: &mut [f64]) {
    for i in 0..out.len() {
        out[i] = if reserve0[i] == 0 {
            0.0
        } else {
            reserve1[i] as f64 / reserve0[i] as f64
        };
    }
}

/// Spreads in basis points of four sell prices against one buy price:
/// `(sell - buy) / buy * 10_000` per lane.
pub fn spread_bps_x4(buy_price: f64, sell_prices: &[f64; 4]) -> [f64; 4] {
    #[cfg(target_arch = "x86_64")]
    if std::arch::is_x86_feature_detected!("avx2") {
        // Safety: AVX2 support was just verified.
        return unsafe { avx2::spread_bps(buy_price, sell_prices) };
    }

    spread_bps_x4_scalar(buy_price, sell_prices)
}

fn spread_bps_x4_scalar(buy_price: f64, sell_prices: &[f64; 4]) -> [f64; 4] {
    let buy = F64x4::splat(buy_price);
    let sell = F64x4::from_array(*sell_prices);
    sell.sub(buy)
        .div(buy)
        .mul(F64x4::splat(10_000.0))
        .to_array()
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use crate::types::SIMD_LANES;
    use core::arch::x86_64::*;

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn price_approx(reserve0: &[u64], reserve1: &[u64], out: &mut [f64]) {
        let n = out.len();
        let mut i = 0;
        while i + SIMD_LANES <= n {
            // AVX2 has no u64 -> f64 convert; round-trip through lanes.
            let r0 = cvt_u64x4(&reserve0[i..]);
            let r1 = cvt_u64x4(&reserve1[i..]);
            let prices = _mm256_div_pd(r1, r0);
            // A zero reserve0 divides to inf/nan; mask those lanes to 0.0.
            let zero = _mm256_setzero_pd();
            let valid = _mm256_cmp_pd::<{ _CMP_GT_OQ }>(r0, zero);
            let prices = _mm256_and_pd(prices, valid);
            _mm256_storeu_pd(out.as_mut_ptr().add(i), prices);
            i += SIMD_LANES;
        }
        while i < n {
            out[i] = if reserve0[i] == 0 {
                0.0
            } else {
                reserve1[i] as f64 / reserve0[i] as f64
            };
            i += 1;
        }
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn spread_bps(buy_price: f64, sell_prices: &[f64; 4]) -> [f64; 4] {
        let buy = _mm256_set1_pd(buy_price);
        let sell = _mm256_loadu_pd(sell_prices.as_ptr());
        let diff = _mm256_sub_pd(sell, buy);
        let ratio = _mm256_div_pd(diff, buy);
        let bps = _mm256_mul_pd(ratio, _mm256_set1_pd(10_000.0));
        let mut out = [0.0f64; 4];
        _mm256_storeu_pd(out.as_mut_ptr(), bps);
        out
    }

    #[inline]
    unsafe fn cvt_u64x4(src: &[u64]) -> __m256d {
        _mm256_set_pd(
            src[3] as f64,
            src[2] as f64,
            src[1] as f64,
            src[0] as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_arithmetic() {
        let a = F64x4::from_array([1.0, 2.0, 3.0, 4.0]);
        let b = F64x4::splat(2.0);
        assert_eq!(a.add(b).to_array(), [3.0, 4.0, 5.0, 6.0]);
        assert_eq!(a.sub(b).to_array(), [-1.0, 0.0, 1.0, 2.0]);
        assert_eq!(a.mul(b).to_array(), [2.0, 4.0, 6.0, 8.0]);
        assert_eq!(a.div(b).to_array(), [0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn fma_matches_scalar_fused() {
        let a = F64x4::splat(3.0);
        let b = F64x4::splat(7.0);
        let c = F64x4::splat(1.0);
        assert_eq!(a.fma(b, c).to_array(), [22.0; 4]);
    }

    #[test]
    fn horizontal_reductions() {
        let v = F64x4::from_array([4.0, -1.0, 2.5, 8.0]);
        assert_eq!(v.hsum(), 13.5);
        assert_eq!(v.hmin(), -1.0);
        assert_eq!(v.hmax(), 8.0);
    }

    #[test]
    fn price_approx_handles_zero_reserves() {
        let r0 = [0u64, 1_000, 2_000, 1, 10];
        let r1 = [5u64, 2_000, 1_000, 7, 10];
        let mut out = [f64::NAN; 5];
        price_approx_batch(&r0, &r1, &mut out);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 2.0);
        assert_eq!(out[2], 0.5);
        assert_eq!(out[3], 7.0);
        assert_eq!(out[4], 1.0);
    }

    #[test]
    fn price_approx_matches_scalar_reference() {
        let r0: Vec<u64> = (1..100).map(|i| i * 31 + 7).collect();
        let r1: Vec<u64> = (1..100).map(|i| i * 17 + 3).collect();
        let mut fast = vec![0.0; r0.len()];
        let mut reference = vec![0.0; r0.len()];
        price_approx_batch(&r0, &r1, &mut fast);
        price_approx_scalar(&r0, &r1, &mut reference);
        for (a, b) in fast.iter().zip(&reference) {
            assert!((a - b).abs() <= f64::EPSILON * b.abs());
        }
    }

    #[test]
    fn spread_bps_lanes() {
        let spreads = spread_bps_x4(2.0e18, &[2.1e18, 2.0e18, 1.9e18, 4.0e18]);
        assert!((spreads[0] - 500.0).abs() < 1e-6);
        assert_eq!(spreads[1], 0.0);
        assert!((spreads[2] + 500.0).abs() < 1e-6);
        assert!((spreads[3] - 10_000.0).abs() < 1e-6);
    }
}
