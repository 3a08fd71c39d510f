use std::path::Path;
use zonex_core::error::ZonexError;
use zonex_core::template::{check_template, load_template};

use crate::output;

/// Returns `Ok(false)` when any entry has a problem.
pub fn check(file: &Path) -> Result<bool, ZonexError> {
    let template = load_template(file)?;
    let issues = check_template(&template);

    if issues.is_empty() {
        println!(
            "Template {} is valid ({} field(s), {} table(s))",
            file.display(),
            template.fields.len(),
            template.tables.len()
        );
        return Ok(true);
    }

    eprintln!("Template {} has {} problem(s):", file.display(), issues.len());
    for issue in &issues {
        eprintln!("  {} '{}': {}", issue.kind, issue.name, issue.message);
    }
    Ok(false)
}

pub fn show(file: &Path) -> Result<(), ZonexError> {
    let template = load_template(file)?;
    print!("{}", output::table::format_template(&template));
    Ok(())
}
