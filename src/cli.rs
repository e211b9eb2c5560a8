use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "promesa",
    version,
    about = "Review, export and submit a signed purchase-promise document.",
    long_about = None
)]
pub struct Cli {
    /// Destination id the submission is linked to
    #[clap(short = 'i', long, value_name = "ID")]
    pub id: Option<String>,

    /// Client name shown in the heading and the export filename
    #[clap(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,

    /// Print the document's visible text
    #[clap(short, long)]
    pub dump: bool,

    /// Jump to a section anchor (inicio, firmas, clausula-primera, ...)
    #[clap(short, long, value_name = "SECTION")]
    pub section: Option<String>,

    /// Copy the document's visible text to the clipboard
    #[clap(short, long)]
    pub copy: bool,

    /// Export the document as a paginated PDF
    #[clap(short, long)]
    pub export: bool,

    /// Directory the exported PDF is written to
    #[clap(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Attach a signed PDF to the upload slot
    #[clap(short, long, value_name = "FILE")]
    pub upload: Option<PathBuf>,

    /// Submit the attached document to the backend
    #[clap(long)]
    pub submit: bool,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Promise document as rendered HTML
    #[clap(name = "DOCUMENT")]
    pub document: Option<PathBuf>,
}
