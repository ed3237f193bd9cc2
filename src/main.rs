use clap::{Parser, Subcommand};
use i18n_subsites::builder::BuilderRegistry;
use i18n_subsites::subsites::{self, Orchestrator};
use i18n_subsites::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "i18n-subsites")]
#[command(about = "Build one static site per language from a single content tree")]
#[command(long_about = "\
Build one static site per language from a single content tree

The default language is built at the site root. Every language listed under
[i18n.subsites] gets its own subsite, configured by overriding the default
configuration.

Content structure:

  content/
  ├── config.toml                  # Site config, incl. [i18n.subsites]
  ├── i18n/de.toml                 # Overrides for the German subsite (optional)
  ├── articles/
  │   ├── 010-hello.md             # Article in the content language
  │   └── 010-hello.de.md          # Its German translation (same slug)
  ├── pages/
  │   └── about.md                 # Page, `lang = \"de\"` in front matter also works
  ├── translations/de/messages.toml # Template strings for the German site
  └── images/                      # Static files, shared with the subsites

Output:

  output/                          # Default site
  └── de/                          # German subsite

Run 'i18n-subsites gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory (overrides `output_path` from config.toml)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log build progress (otherwise RUST_LOG decides, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the default site and every subsite
    Build,
    /// Show the sites a build would produce without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Build => {
            let site_config = load(&cli)?;
            println!("==> Building {}", cli.source.display());
            let mut orchestrator = Orchestrator::new(BuilderRegistry::with_defaults());
            let summary = orchestrator.run(site_config)?;
            output::print_run_summary(&summary);
        }
        Command::Check => {
            let site_config = load(&cli)?;
            println!("==> Checking {}", cli.source.display());
            let plan = subsites::plan(&site_config, &BuilderRegistry::with_defaults())?;
            output::print_plan(&plan);
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config.toml from the source directory and apply CLI overrides.
fn load(cli: &Cli) -> Result<config::SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(&cli.source)?;
    if let Some(output) = &cli.output {
        site_config.output_path = output.clone();
    }
    Ok(site_config)
}
