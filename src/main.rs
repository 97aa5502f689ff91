mod build;
mod compile;
mod convert;
mod error;
mod job;
mod newsletter;
mod parser;
mod render;
mod sanitize;
mod settings;
mod text;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use settings::Settings;

#[derive(Parser)]
#[command(
    name = "newsletter_builder",
    about = "Build HTML email newsletters from edition documents"
)]
struct Cli {
    /// Edition document: <input_root>/<newsletter>/<year>/<month>/<file>.docx
    input: PathBuf,
    /// Folder name expected above the newsletter segment
    #[arg(long)]
    input_root: Option<String>,
    /// Where <newsletter>/<year>/<month>/ outputs are written
    #[arg(long)]
    output_root: Option<PathBuf>,
    /// Directory holding <newsletter>/layout.mjml and section templates
    #[arg(long)]
    template_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let t0 = Instant::now();

    let mut settings = Settings::load()?;
    if let Some(root) = cli.input_root {
        settings.input_root = root;
    }
    if let Some(root) = cli.output_root {
        settings.output_root = root;
    }
    if let Some(root) = cli.template_root {
        settings.template_root = root;
    }

    let output = build::run(&cli.input, &settings).await?;

    let found = output.counts.iter().filter(|(_, n)| *n > 0).count();
    println!(
        "Extracted {}/{} sections ({}).",
        found,
        output.counts.len(),
        output
            .counts
            .iter()
            .map(|(token, n)| format!("{}: {}", token, n))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Markup: {}", output.markup_path.display());
    println!("HTML:   {}", output.html_path.display());

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}
