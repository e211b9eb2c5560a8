use promesa::{
    cli::Cli,
    clipboard::{ClipboardBackend, NoopClipboard, SystemClipboard},
    config::Config,
    logging::{self, LogLevel},
    models::{CopyState, SubmissionState},
    portal::PromesaPage,
    submit::MSG_CONFIRMATION,
};

use clap::Parser;
use eyre::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LogLevel::from_verbosity(cli.verbose));

    let config = match Config::new() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Warning: Could not load configuration: {}", err);
            eprintln!("Starting with default settings");
            Config::with_base_url("")
        }
    };

    let backend: Box<dyn ClipboardBackend> = if cli.copy {
        Box::new(SystemClipboard::new()?)
    } else {
        Box::new(NoopClipboard)
    };

    let mut page = PromesaPage::new(config, backend, cli.id.clone(), cli.name.clone());
    println!("{}", page.heading());

    if let Some(document) = &cli.document {
        page.open_viewer_from_file(document)?;
    }

    if let Some(section) = &cli.section {
        page.go_to_section(section);
        logging::info(format!(
            "Section '{}' at line {}",
            section,
            page.viewport().top_line
        ));
    }

    if cli.dump {
        match page.document_text() {
            Some(text) => println!("{text}"),
            None => eyre::bail!("No promise document to dump"),
        }
    }

    if cli.copy {
        page.copy_text();
        if page.copy_state() == CopyState::Copied {
            println!("¡Copiado!");
        }
    }

    if cli.export {
        match page.export_pdf(&cli.output)? {
            Some(path) => println!("PDF guardado en {}", path.display()),
            None => eyre::bail!("No promise document to export"),
        }
    }

    if let Some(file) = &cli.upload {
        page.attach_file(file)?;
        logging::info(format!(
            "{}/{} documentos subidos",
            page.registry.uploaded_count(),
            page.registry.total_slots()
        ));
    }

    if cli.submit {
        match page.submit() {
            SubmissionState::Succeeded => println!("{MSG_CONFIRMATION}"),
            SubmissionState::Failed(message) => eyre::bail!(message),
            _ => {}
        }
    }

    Ok(())
}
