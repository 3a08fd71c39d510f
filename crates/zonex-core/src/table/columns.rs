use crate::extraction::TextFragment;
use crate::template::schema::ColumnDefinition;

pub const DEFAULT_COLUMN_TOLERANCE: f64 = 5.0;

/// Guess spatial column bands from the horizontal extents of `fragments`.
///
/// Every fragment edge is snapped to a multiple of `tolerance`; the sorted,
/// de-duplicated edges become the borders between consecutive columns,
/// named `Column_1`, `Column_2`, ...
pub fn detect_columns(fragments: &[TextFragment], tolerance: f64) -> Vec<ColumnDefinition> {
    let tolerance = if tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_COLUMN_TOLERANCE
    };

    let mut borders: Vec<f64> = fragments
        .iter()
        .flat_map(|f| [f.x0, f.x1])
        .map(|x| (x / tolerance).round_ties_even() * tolerance)
        .collect();
    borders.sort_by(f64::total_cmp);
    borders.dedup();

    borders
        .windows(2)
        .enumerate()
        .map(|(i, pair)| ColumnDefinition::spatial(format!("Column_{}", i + 1), pair[0], pair[1]))
        .collect()
}
