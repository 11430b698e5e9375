use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use structogram::ParseMode;
use structogram::io::FormatRegistry;

mod server;

/// Validate structogram documents and render them as nested-box diagrams.
#[derive(Parser)]
#[command(name = "structogram")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input document - rendered as HTML when no subcommand is given
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the default HTML render
    #[arg(short, long, default_value = "output")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Render diagrams to an output directory
    Render {
        /// Input document (.json, .yaml, .yml)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Output format: html, text or json
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Write one HTML file per diagram
        #[arg(long)]
        split: bool,

        /// Render unknown node types as fallback boxes instead of failing
        #[arg(long)]
        lenient: bool,
    },
    /// Validate a document and print a summary
    Check {
        /// Input document (.json, .yaml, .yml)
        #[arg(short, long)]
        input: PathBuf,

        /// Accept unknown node types
        #[arg(long)]
        lenient: bool,
    },
    /// Start development server with hot reload
    Serve {
        /// Input document (.json, .yaml, .yml)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the rendered page
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Port to run the server on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Render unknown node types as fallback boxes instead of failing
        #[arg(long)]
        lenient: bool,
    },
}

fn parse_mode(lenient: bool) -> ParseMode {
    if lenient {
        ParseMode::Lenient
    } else {
        ParseMode::Strict
    }
}

fn render(input: &Path, output: &Path, format: &str, split: bool, mode: ParseMode) -> anyhow::Result<()> {
    let registry = FormatRegistry::with_options(mode, split);
    let response = registry.convert(input, format, output)?;
    tracing::info!(
        diagrams = response.diagrams.len(),
        format,
        output = %output.display(),
        "rendered structograms"
    );
    println!(
        "Rendered {} diagram(s) as {} in {}",
        response.diagrams.len(),
        format,
        output.display()
    );
    Ok(())
}

fn check(input: &Path, mode: ParseMode) -> anyhow::Result<()> {
    let registry = FormatRegistry::with_options(mode, false);
    let response = registry.reader_for_path(input)?.read(input)?;

    for diagram in &response.diagrams {
        println!("{}: {} node(s)", diagram.title, diagram.root.node_count());
    }
    println!(
        "{} is valid: {} diagram(s), {} node(s)",
        input.display(),
        response.diagrams.len(),
        response.node_count()
    );
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("structogram=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            input,
            output,
            format,
            split,
            lenient,
        }) => render(&input, &output, &format, split, parse_mode(lenient))?,
        Some(Commands::Check { input, lenient }) => check(&input, parse_mode(lenient))?,
        Some(Commands::Serve {
            input,
            output,
            port,
            lenient,
        }) => server::serve(&input, &output, port, parse_mode(lenient)).await?,
        None => match cli.input {
            Some(input) => render(&input, &cli.output, "html", false, ParseMode::Strict)?,
            None => println!("structogram: no input specified. Use --help for usage."),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_render_with_defaults() {
        let cli = Cli::try_parse_from(["structogram", "render", "--input", "d.json"]).unwrap();
        match cli.command {
            Some(Commands::Render {
                input,
                output,
                format,
                split,
                lenient,
            }) => {
                assert_eq!(input, PathBuf::from("d.json"));
                assert_eq!(output, PathBuf::from("output"));
                assert_eq!(format, "html");
                assert!(!split);
                assert!(!lenient);
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn cli_parses_render_options() {
        let cli = Cli::try_parse_from([
            "structogram", "render", "-i", "d.yaml", "-o", "out", "-f", "text", "--split",
            "--lenient",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Render {
                format,
                split,
                lenient,
                ..
            }) => {
                assert_eq!(format, "text");
                assert!(split);
                assert!(lenient);
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn cli_parses_check_subcommand() {
        let cli = Cli::try_parse_from(["structogram", "check", "-i", "d.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Check { lenient: false, .. })
        ));
    }

    #[test]
    fn cli_parses_serve_subcommand() {
        let cli =
            Cli::try_parse_from(["structogram", "serve", "--input", "d.json", "--port", "8080"])
                .unwrap();
        match cli.command {
            Some(Commands::Serve { input, port, .. }) => {
                assert_eq!(input, PathBuf::from("d.json"));
                assert_eq!(port, 8080);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn cli_parses_with_defaults() {
        let cli = Cli::try_parse_from(["structogram"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.input.is_none());
        assert_eq!(cli.output, PathBuf::from("output"));
    }

    #[test]
    fn cli_parses_top_level_input_and_output() {
        let cli = Cli::try_parse_from(["structogram", "-i", "d.json", "-o", "site"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.input, Some(PathBuf::from("d.json")));
        assert_eq!(cli.output, PathBuf::from("site"));
    }

    #[test]
    fn cli_subcommand_flags_stay_with_the_subcommand() {
        let cli = Cli::try_parse_from(["structogram", "check", "-i", "d.json"]).unwrap();
        assert!(cli.input.is_none());
        assert!(matches!(cli.command, Some(Commands::Check { .. })));
    }

    #[test]
    fn parse_mode_follows_flag() {
        assert_eq!(parse_mode(true), ParseMode::Lenient);
        assert_eq!(parse_mode(false), ParseMode::Strict);
    }
}
