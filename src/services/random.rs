use rand::Rng;

/// Uniform offset in `[0, count)` for a single-row fetch, or `None` when there
/// is nothing to pick from.
pub fn pick_offset<R: Rng + ?Sized>(rng: &mut R, count: u64) -> Option<u64> {
    if count == 0 {
        return None;
    }

    let offset = (rng.gen::<f64>() * count as f64).floor() as u64;
    // f64 rounding can land exactly on `count` for very large counts.
    Some(offset.min(count - 1))
}
