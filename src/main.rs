//! Main entry point for the pdfgrab CLI application.
//!
//! Scans one page for PDF links, lets the user choose, downloads the
//! choices and writes them out as a single ZIP archive.

use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};

use pdfgrab::logging::init_logging;
use pdfgrab::session::{parse_page_url, prompt_selection, prompt_url, render_candidates};
use pdfgrab::{
    Archive, Cli, HttpFetcher, Pacer, ScrapeOutcome, SelectionSet, Session, parse_selection,
};

/// Application entry point.
///
/// Only bad arguments and a failure to write the archive end the process
/// with an error. Fetch problems are reported and the run carries on.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stderr = io::stderr();

    let url = match cli.url.as_deref() {
        Some(raw) => parse_page_url(raw)?,
        None => match prompt_url(&mut input, &mut stderr)? {
            Some(url) => url,
            None => return Ok(()),
        },
    };

    // Refuse an existing output before spending time on downloads
    if !cli.list {
        Archive::check_destination(&cli.output, cli.overwrite).await?;
    }

    let fetcher = HttpFetcher::new(cli.timeout())?;
    let mut session = Session::new(fetcher, Pacer::new(cli.delay()));

    let links = match session.scrape(&url).await {
        ScrapeOutcome::Found(links) => links,
        ScrapeOutcome::NoLinks => {
            eprintln!("No PDFs found on {}", url);
            return Ok(());
        }
        ScrapeOutcome::PageFailed(e) => {
            eprintln!("Error: {} could not be loaded ({})", url, e);
            eprintln!("No PDFs found on {}", url);
            return Ok(());
        }
    };

    let mut stdout = io::stdout();
    render_candidates(&mut stdout, &links, cli.verbose > 0 || cli.list)?;
    stdout.flush()?;

    if cli.list {
        return Ok(());
    }

    // Choose what to download: flags first, then the prompt
    let indices = if cli.all {
        (0..links.len()).collect()
    } else if let Some(spec) = cli.select.as_deref() {
        parse_selection(spec, links.len())?
    } else {
        prompt_selection(&mut input, &mut stderr, links.len())?
    };
    let selection = SelectionSet::from_indices(&links, &indices);

    let report = session.download(&links, &selection).await?;

    for failure in &report.failures {
        eprintln!("Download failed: {} ({})", failure.url, failure.reason);
    }

    let Some(archive) = report.archive else {
        eprintln!("Please select at least one PDF.");
        return Ok(());
    };

    archive.write_to(&cli.output, cli.overwrite).await?;

    if !cli.is_quiet() {
        print_summary(&archive, &cli)?;
    }

    Ok(())
}

/// Print the archive contents and where it was written.
fn print_summary(archive: &Archive, cli: &Cli) -> Result<()> {
    println!();
    if cli.verbose > 0 {
        println!("{:>10}  {:>10}  {:>5}  Name", "Length", "Size", "Cmpr");
        println!("{}", "-".repeat(50));
    }

    let mut total = 0u64;
    for entry in archive.entries() {
        total += entry.size;
        if cli.verbose > 0 {
            let ratio = if entry.size > 0 {
                100 - (entry.compressed_size * 100 / entry.size).min(100)
            } else {
                0
            };
            println!(
                "{:>10}  {:>10}  {:>4}%  {}",
                entry.size, entry.compressed_size, ratio, entry.name
            );
        } else {
            println!("  added: {}", entry.name);
        }
    }

    println!(
        "Wrote {} ({}, {} files, {} of documents, {})",
        cli.output.display(),
        format_size(archive.bytes().len() as u64),
        archive.len(),
        format_size(total),
        Archive::MIME_TYPE
    );
    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
