//! Axis mapping shared by the analyzer path and the response curve.

/// Linear remap of `value` from `[src_min, src_max]` to `[dst_min, dst_max]`.
///
/// Not clamped; values outside the source range land outside the target.
#[inline]
pub fn jmap(value: f32, src_min: f32, src_max: f32, dst_min: f32, dst_max: f32) -> f32 {
    dst_min + (value - src_min) / (src_max - src_min) * (dst_max - dst_min)
}

/// Position of `value` on a log10 axis from `min` to `max`, as 0..1.
#[inline]
pub fn map_to_log10(value: f32, min: f32, max: f32) -> f32 {
    (value.log10() - min.log10()) / (max.log10() - min.log10())
}

/// Inverse of [`map_to_log10`]: proportion 0..1 to a value on the log axis.
#[inline]
pub fn map_from_log10(proportion: f32, min: f32, max: f32) -> f32 {
    10.0_f32.powf(min.log10() + proportion * (max.log10() - min.log10()))
}

/// Linear gain to decibels, never below `floor_db`.
///
/// Zero, negative and non-finite gains all map to the floor.
#[inline]
pub fn gain_to_decibels(gain: f32, floor_db: f32) -> f32 {
    if gain > 0.0 && gain.is_finite() {
        (20.0 * gain.log10()).max(floor_db)
    } else {
        floor_db
    }
}
