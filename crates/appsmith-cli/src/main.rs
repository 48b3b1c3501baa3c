//! Appsmith CLI - Workspace application generator

use appsmith_core::catalog::{FrameworkCatalog, PackageCatalog};
use appsmith_core::hooks::HookRegistry;
use appsmith_core::tui::CreateArgs;
use appsmith_core::Error;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "appsmith")]
#[command(about = "Generate workspace applications from a template catalog")]
#[command(version)]
pub struct Args {
    /// Print full error chains on failure
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new application (default when no subcommand is given)
    Create(CliCreateArgs),
    /// List the frameworks and add-on packages in the catalog
    List(ListArgs),
}

#[derive(Parser, Debug, Default)]
pub struct CliCreateArgs {
    /// Workspace root (defaults to the current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Template catalog directory (defaults to <workspace>/templates)
    #[arg(long = "catalog-dir")]
    pub catalog_dir: Option<PathBuf>,

    /// Application name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Framework to scaffold
    #[arg(short, long)]
    pub framework: Option<String>,

    /// Application description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Explicit port (otherwise the next free port is assigned)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Add-on packages to include (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub packages: Option<Vec<String>>,

    /// Run the package-manager install step after generation
    #[arg(long)]
    pub install: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            workspace: args.workspace,
            catalog_dir: args.catalog_dir,
            name: args.name,
            framework: args.framework,
            description: args.description,
            port: args.port,
            packages: args.packages,
            install: args.install,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Workspace root (defaults to the current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Template catalog directory (defaults to <workspace>/templates)
    #[arg(long = "catalog-dir")]
    pub catalog_dir: Option<PathBuf>,
}

async fn list_catalog(args: ListArgs) -> Result<(), Error> {
    let workspace = match args.workspace {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let catalog_dir = args
        .catalog_dir
        .unwrap_or_else(|| workspace.join("templates"));

    let frameworks = FrameworkCatalog::load(&catalog_dir).await?;
    let packages = PackageCatalog::load(&catalog_dir).await?;

    println!("{}", "Frameworks".cyan().bold());
    for fw in frameworks.all() {
        println!("  {} - {}", fw.name().green(), fw.description());
    }

    println!("\n{}", "Add-on packages".cyan().bold());
    for pkg in packages.all() {
        let shared = if pkg.is_shareable() { " (shareable)" } else { "" };
        println!(
            "  {}{} - {}",
            pkg.name().green(),
            shared.dimmed(),
            pkg.description()
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let hooks = HookRegistry::default();

    let result = match args.command {
        Some(Command::Create(create_args)) => {
            appsmith_core::run(create_args.into(), &hooks).await
        }
        Some(Command::List(list_args)) => list_catalog(list_args).await,
        // No subcommand defaults to interactive create
        None => appsmith_core::run(CreateArgs::default(), &hooks).await,
    };

    let _ = console::Term::stderr().show_cursor();

    match result {
        Ok(()) => {}
        Err(err) if err.is_abort() => {
            println!("{}", "Aborted, nothing was changed.".yellow());
        }
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            if args.verbose {
                let mut source = std::error::Error::source(&err);
                while let Some(cause) = source {
                    eprintln!("  caused by: {cause}");
                    source = std::error::Error::source(cause);
                }
            }
            std::process::exit(1);
        }
    }
}
