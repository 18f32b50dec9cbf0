/// Start index of the `window_size` consecutive corridors with the highest
/// total score. The leftmost window wins ties and windows whose sum is not
/// finite never win. `None` when no window fits.
pub fn select_best_path(scores: &[f32], window_size: usize) -> Option<usize> {
    if window_size == 0 || scores.len() < window_size {
        return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (start, window) in scores.windows(window_size).enumerate() {
        let sum: f32 = window.iter().sum();
        if !sum.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, best_sum)| sum > best_sum) {
            best = Some((start, sum));
        }
    }

    best.map(|(start, _)| start)
}

/// Corridor at the middle of a window starting at `start`.
pub fn window_center(start: usize, window_size: usize) -> usize {
    start + window_size / 2
}
