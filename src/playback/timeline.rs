//! Mapping between virtual time (position in the whole narration) and
//! `(part index, offset within part)`.
//!
//! All functions are pure. Times are seconds.

/// Sum of all part durations
pub fn total_duration(part_durations: &[f64]) -> f64 {
    part_durations.iter().sum()
}

/// Virtual time of `time_in_part` seconds into part `part_index`.
///
/// Indices past the end are treated as the last part.
pub fn cumulative_time(part_durations: &[f64], part_index: usize, time_in_part: f64) -> f64 {
    let index = part_index.min(part_durations.len().saturating_sub(1));
    let before: f64 = part_durations[..index].iter().sum();
    before + time_in_part
}

/// Find the part containing `virtual_time` and the offset into it.
///
/// A time exactly on a boundary belongs to the following part, except the
/// final boundary, which is the end of the last part. Times at or below zero
/// map to the start of part 0; times past the total clamp to the end of the
/// last part.
pub fn locate(virtual_time: f64, part_durations: &[f64]) -> (usize, f64) {
    if part_durations.is_empty() || virtual_time <= 0.0 || virtual_time.is_nan() {
        return (0, 0.0);
    }

    let last = part_durations.len() - 1;
    let mut part_start = 0.0;
    for (index, duration) in part_durations.iter().enumerate() {
        let part_end = part_start + duration;
        if index == last {
            let offset = (virtual_time - part_start).clamp(0.0, *duration);
            return (index, offset);
        }
        if virtual_time < part_end {
            return (index, virtual_time - part_start);
        }
        part_start = part_end;
    }

    (last, part_durations[last])
}

/// Clamp a requested virtual time into `[0, duration]`
pub fn clamp_virtual_time(virtual_time: f64, duration: f64) -> f64 {
    if virtual_time.is_nan() {
        return 0.0;
    }
    virtual_time.clamp(0.0, duration.max(0.0))
}
