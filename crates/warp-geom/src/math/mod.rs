// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic math helpers: vectors, quaternions and scalar utilities.
//!
//! All operations round to `f32` to mirror the runtime's float32 mode. No
//! fused multiply-add is used so identical inputs give identical bits on every
//! supported target.

mod quat;
mod vec3;

pub use quat::Quat;
pub use vec3::Vec3;

/// Global epsilon used by math routines when detecting degenerate values.
pub const EPSILON: f32 = 1e-6;

/// Clamps `value` to the inclusive `[min, max]` range using float32 rounding.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    debug_assert!(min <= max, "invalid clamp range: {min} > {max}");
    value.max(min).min(max)
}

/// Maps an `f32` onto an `i32` whose signed integer order matches the float order.
///
/// Positive floats keep their bit pattern; negative floats have their low 31
/// bits inverted so that more negative values map to smaller integers. `-0.0`
/// sorts immediately before `+0.0`. NaN payloads land at the extremes and must
/// be filtered by callers that care.
#[inline]
pub fn f32_order_key(value: f32) -> i32 {
    let bits = value.to_bits().cast_signed();
    if bits < 0 {
        bits ^ 0x7FFF_FFFF
    } else {
        bits
    }
}
