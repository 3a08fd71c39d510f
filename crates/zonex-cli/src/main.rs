mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zonex_core::geometry::Region;

#[derive(Parser)]
#[command(
    name = "zonex",
    version,
    about = "Template-driven field and table extraction from PDF documents"
)]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG also works.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a template over PDF files and write the fields and tables as CSV
    Extract {
        /// Template JSON file
        #[arg(short, long, value_name = "FILE")]
        template: PathBuf,

        /// PDF files to process, in order
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Directory for the CSV files
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,

        /// Base name for the CSV files (default: Processed_<timestamp>)
        #[arg(long, value_name = "BASE")]
        name: Option<String>,

        /// Also save the batch result as JSON for later re-export
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        #[command(flatten)]
        ocr: OcrArgs,

        /// Vertical tolerance when grouping positioned text into table rows
        #[arg(long, value_name = "UNITS", default_value_t = 5.0)]
        row_tolerance: f64,
    },
    /// Write CSV files from a batch result saved with `extract --json`
    Export {
        /// Batch result JSON file
        batch: PathBuf,

        /// Directory for the CSV files
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,

        /// Base name for the CSV files (default: Processed_<timestamp>)
        #[arg(long, value_name = "BASE")]
        name: Option<String>,
    },
    /// Inspect template files
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Suggest spatial table columns for a region
    Columns {
        pdf: PathBuf,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Table region as x0,y0,x1,y1
        #[arg(long, value_parser = parse_region, allow_hyphen_values = true)]
        region: Region,

        /// Snap column edges to multiples of this many units
        #[arg(long, default_value_t = 5.0)]
        tolerance: f64,
    },
    /// Show the text found in one region and where it came from
    Preview {
        pdf: PathBuf,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Region as x0,y0,x1,y1
        #[arg(long, value_parser = parse_region, allow_hyphen_values = true)]
        region: Region,

        #[command(flatten)]
        ocr: OcrArgs,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// Load a template and report every field or table that would fail
    Check {
        /// Path to template JSON file
        file: PathBuf,
    },
    /// Print the fields and tables of a template
    Show {
        /// Path to template JSON file
        file: PathBuf,
    },
}

#[derive(clap::Args)]
struct OcrArgs {
    /// Never fall back to OCR
    #[arg(long)]
    no_ocr: bool,

    /// Path to the tesseract executable (default: TESSERACT_PATH, then PATH)
    #[arg(long, value_name = "PATH", conflicts_with = "no_ocr")]
    tesseract: Option<PathBuf>,
}

fn parse_region(s: &str) -> Result<Region, String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| format!("invalid coordinate in '{s}': {e}"))?;
    match values[..] {
        [x0, y0, x1, y1] => Ok(Region::new(x0, y0, x1, y1)),
        _ => Err(format!(
            "expected four comma-separated numbers, got {}",
            values.len()
        )),
    }
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            template,
            pdfs,
            output,
            name,
            json,
            ocr,
            row_tolerance,
        } => commands::extract::run(
            &template,
            &pdfs,
            &output,
            name,
            json,
            ocr.no_ocr,
            ocr.tesseract,
            row_tolerance,
        ),
        Commands::Export {
            batch,
            output,
            name,
        } => commands::export::run(&batch, &output, name).map(|()| true),
        Commands::Template { action } => match action {
            TemplateAction::Check { file } => commands::template::check(&file),
            TemplateAction::Show { file } => commands::template::show(&file).map(|()| true),
        },
        Commands::Columns {
            pdf,
            page,
            region,
            tolerance,
        } => commands::columns::run(&pdf, page, &region, tolerance).map(|()| true),
        Commands::Preview {
            pdf,
            page,
            region,
            ocr,
        } => commands::preview::run(&pdf, page, &region, ocr.no_ocr, ocr.tesseract).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        let r = parse_region("300, 50,100,20").unwrap();
        assert_eq!(r, Region::new(100.0, 20.0, 300.0, 50.0));
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("1,2,x,4").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_args() {
        let cli = Cli::try_parse_from([
            "zonex", "-v", "extract", "-t", "t.json", "a.pdf", "b.pdf", "--no-ocr",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Extract { pdfs, ocr, row_tolerance, .. } => {
                assert_eq!(pdfs.len(), 2);
                assert!(ocr.no_ocr);
                assert_eq!(row_tolerance, 5.0);
            }
            _ => panic!("expected extract"),
        }
    }
}
