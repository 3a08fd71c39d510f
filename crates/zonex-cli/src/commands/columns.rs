use std::path::Path;
use zonex_core::error::ZonexError;
use zonex_core::extraction::poppler::PopplerProvider;
use zonex_core::geometry::Region;

pub fn run(pdf: &Path, page: usize, region: &Region, tolerance: f64) -> Result<(), ZonexError> {
    let provider = PopplerProvider::new();
    let columns = zonex_core::suggest_columns(pdf, page, region, tolerance, &provider)?;

    if columns.is_empty() {
        eprintln!("No positioned text found in {region} on page {page}");
    }
    println!("{}", serde_json::to_string_pretty(&columns)?);
    Ok(())
}
