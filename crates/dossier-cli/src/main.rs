mod cmd;
mod output;
mod root;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "render-site",
    about = "Compile an engagement workspace into a static deliverable site",
    version
)]
struct Cli {
    /// Workspace root (contains resources/ and projects/)
    #[arg(env = "RENDER_SITE_WORKSPACE")]
    workspace: PathBuf,

    /// Output directory (default: <WORKSPACE>/site, or output_dir from config)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Config file (default: <WORKSPACE>/render-site.yaml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print each project's stage completion and exit without writing
    #[arg(long)]
    gates: bool,

    /// Output as JSON
    #[arg(long, short = 'j')]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let workspace = root::resolve_workspace(&cli.workspace);

    let result = if cli.gates {
        cmd::gates::run(&workspace, cli.json)
    } else {
        let config = root::config_path(&workspace, cli.config.as_deref());
        cmd::build::run(&workspace, cli.out, &config, cli.json)
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
