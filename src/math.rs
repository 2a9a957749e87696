/// Maps `x` (nominally in `[0, 1]`) linearly into the range from `from` to
/// `to`: `map_to_range(0.0, a, b) == a` and `map_to_range(1.0, a, b) == b`.
pub fn map_to_range(x: f64, from: f64, to: f64) -> f64 {
    x * (to - from) + from
}

/// Like [`map_to_range`], but floors the scaled value *before* adding the
/// `from` offset. The ordering matters when `from` is non-integral, so it is
/// kept exactly as `floor(x * (to - from)) + from` rather than truncating the
/// final result.
pub fn map_to_range_floor(x: f64, from: f64, to: f64) -> f64 {
    (x * (to - from)).floor() + from
}
