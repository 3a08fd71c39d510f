use crate::error::ZonexError;
use crate::extraction::TextFragment;
use crate::table::Row;
use crate::template::schema::ColumnDefinition;
use indexmap::IndexMap;

/// Assign positioned fragments to rows and column bands.
///
/// Fragments are bucketed into rows by `y0 / row_tolerance` rounded to the
/// nearest integer (ties to even). Rows are emitted top to bottom, ordered by
/// the `y0` of the first fragment in each bucket. A fragment lands in a
/// column only when it lies entirely inside the band `[x0, x1]`, so one that
/// straddles a column edge is dropped. Columns without bounds stay empty.
pub fn segment(
    fragments: &[TextFragment],
    columns: &[ColumnDefinition],
    row_tolerance: f64,
) -> Result<Vec<Row>, ZonexError> {
    let bands = columns
        .iter()
        .map(ColumnDefinition::bounds)
        .collect::<Result<Vec<_>, _>>()?;
    let tolerance = if row_tolerance > 0.0 { row_tolerance } else { 1.0 };

    let mut buckets: IndexMap<i64, Vec<&TextFragment>> = IndexMap::new();
    for fragment in fragments {
        let key = (fragment.y0 / tolerance).round_ties_even() as i64;
        buckets.entry(key).or_default().push(fragment);
    }

    let mut groups: Vec<Vec<&TextFragment>> = buckets.into_values().collect();
    groups.sort_by(|a, b| b[0].y0.total_cmp(&a[0].y0));

    Ok(groups
        .into_iter()
        .map(|mut group| {
            group.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            columns
                .iter()
                .zip(&bands)
                .map(|(col, band)| (col.name.clone(), cell_text(&group, *band)))
                .collect()
        })
        .collect())
}

fn cell_text(group: &[&TextFragment], band: Option<(f64, f64)>) -> String {
    let Some((x0, x1)) = band else {
        return String::new();
    };
    let parts: Vec<&str> = group
        .iter()
        .filter(|f| f.x0 >= x0 && f.x1 <= x1)
        .map(|f| f.text.as_str())
        .collect();
    parts.join(" ").trim().to_string()
}
