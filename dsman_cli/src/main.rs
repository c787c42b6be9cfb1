use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use dsman_cli::config::{AppConfig, ConfigManager, get_config};
use dsman_cli::error::{CliError, CliResult, ExitCode};
use dsman_cli::orchestrators::addurl_orchestrator::{AddUrlOptions, AddUrlOrchestrator};
use dsman_cli::orchestrators::sibling_orchestrator::SiblingCommandOrchestrator;
use dsman_cli::output::{OutputFormat, create_formatter, write_records};
use dsman_cli::terminal;
use dsman_core::error::{ConfigError, Error as CoreError, IoError, ValidationError};
use dsman_core::status::any_failed;
use dsman_core::{
    AnnexMode, CloneOrchestrator, CloneRequest, CreateOrchestrator, CreateRequest,
    CreateSiblingRequest, ExistingPolicy, GitCli, StatusRecord, Vcs,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dsman")]
#[command(author, version, about = "Dataset management on top of git, git-annex and GitLab", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Output format of result records (defaults to output.default_format)
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new dataset
    Create {
        /// Location of the new dataset
        path: PathBuf,

        /// Dataset to register the new dataset in
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Annex description of the new dataset
        #[arg(short = 'D', long)]
        description: Option<String>,

        /// Create a plain git repository without annex
        #[arg(long)]
        no_annex: bool,
    },

    /// Clone a dataset from a URL or local path
    Clone {
        /// URL or path to clone from
        source: String,

        /// Destination, derived from the source when omitted
        path: Option<PathBuf>,

        /// Dataset to register the clone in
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Annex description of the clone
        #[arg(short = 'D', long)]
        description: Option<String>,
    },

    /// Create GitLab projects for datasets and register them as siblings
    #[command(name = "create-sibling-gitlab")]
    CreateSiblingGitlab {
        /// Datasets to process, relative to the current directory
        paths: Vec<PathBuf>,

        /// Reference dataset whose configuration applies (defaults to the
        /// dataset enclosing the current directory)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Name of the configured site
        #[arg(long)]
        site: Option<String>,

        /// Project path, used verbatim
        #[arg(long)]
        project: Option<String>,

        /// Project layout: hierarchy, collection or flat
        #[arg(long)]
        layout: Option<String>,

        /// Registered URL kind: http or ssh
        #[arg(long)]
        access: Option<String>,

        /// Sibling name
        #[arg(short = 's', long)]
        name: Option<String>,

        /// What to do when the sibling already exists: error, skip or reconfigure
        #[arg(long, default_value = "error", value_parser = parse_existing)]
        existing: ExistingPolicy,

        /// Process all datasets below the selected ones
        #[arg(short, long)]
        recursive: bool,

        /// Project description
        #[arg(long)]
        description: Option<String>,

        /// Report what would be done without contacting the site
        #[arg(long)]
        dry_run: bool,
    },

    /// Download a URL into a dataset file
    Addurl {
        /// URL to add
        url: String,

        /// Target file, relative to the dataset
        file: PathBuf,

        /// Dataset to add to (defaults to the dataset enclosing the current
        /// directory)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Annex mode: full, fast or relaxed (defaults to annex.mode)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<AnnexMode>,

        /// Extra option for git annex addurl, can be given multiple times
        #[arg(
            short = 'o',
            long = "annex-option",
            value_name = "OPTION",
            allow_hyphen_values = true
        )]
        annex_options: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Get a configuration value
    Get {
        /// Configuration key (e.g., gitlab.sites.mysite.layout)
        key: String,

        /// Include the configuration of this dataset
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., gitlab.sites.mysite.layout)
        key: String,

        /// Value to set
        value: String,

        /// Store in the configuration of this dataset instead of the user file
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// List all configuration values
    List {
        /// Include the configuration of this dataset
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

fn parse_existing(value: &str) -> Result<ExistingPolicy, ConfigError> {
    value.parse()
}

fn parse_mode(value: &str) -> Result<AnnexMode, ValidationError> {
    value.parse()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let debug = cli.debug;

    // Initialize logging based on debug flag
    if debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("dsman_core", log::LevelFilter::Debug)
            .filter_module("dsman_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let code = match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            if !terminal::stderr_is_terminal() {
                colored::control::set_override(false);
            }
            eprint!("{}", error.format_for_user(debug));
            error.exit_code()
        }
    };

    std::process::exit(code.code());
}

async fn run(cli: Cli) -> CliResult<ExitCode> {
    let vcs: Arc<dyn Vcs> = Arc::new(GitCli::new());

    let (config, records) = match cli.command {
        Commands::Create {
            path,
            dataset,
            description,
            no_annex,
        } => {
            let config = load_config(dataset.as_deref())?;

            log::debug!("Creating dataset at {}", path.display());
            let request = CreateRequest {
                path,
                dataset,
                description,
                no_annex,
            };
            let record = CreateOrchestrator::new(vcs).create(&request).await?;
            (config, vec![record])
        }
        Commands::Clone {
            source,
            path,
            dataset,
            description,
        } => {
            let config = load_config(dataset.as_deref())?;

            log::debug!("Cloning {source}");
            let request = CloneRequest {
                source,
                path,
                dataset,
                description,
            };
            let record = CloneOrchestrator::new(vcs).clone(&request).await?;
            (config, vec![record])
        }
        Commands::CreateSiblingGitlab {
            paths,
            dataset,
            site,
            project,
            layout,
            access,
            name,
            existing,
            recursive,
            description,
            dry_run,
        } => {
            let dataset = dataset_root(dataset)?;
            let config = load_config(Some(&dataset))?;
            let paths = paths
                .iter()
                .map(|path| absolute(path))
                .collect::<CliResult<Vec<_>>>()?;

            let request = CreateSiblingRequest {
                dataset,
                paths,
                site,
                project,
                layout,
                access,
                name,
                existing,
                recursive,
                description,
                dry_run,
            };
            let records = SiblingCommandOrchestrator::new(config.clone(), vcs)
                .run(&request)
                .await?;
            (config, records)
        }
        Commands::Addurl {
            url,
            file,
            dataset,
            mode,
            annex_options,
        } => {
            let dataset = dataset_root(dataset)?;
            let config = load_config(Some(&dataset))?;

            let options = AddUrlOptions {
                dataset,
                url,
                file,
                mode,
                annex_options,
            };
            let record = AddUrlOrchestrator::new(config.clone(), vcs)
                .run(&options)
                .await?;
            (config, vec![record])
        }
        Commands::Config { command } => {
            config_command(command)?;
            return Ok(ExitCode::Success);
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            return Ok(ExitCode::Success);
        }
    };

    render(&config, cli.format, &records)?;

    if any_failed(&records) {
        Ok(ExitCode::Failure)
    } else {
        Ok(ExitCode::Success)
    }
}

fn load_config(dataset: Option<&Path>) -> CliResult<AppConfig> {
    get_config(dataset).map_err(|e| CliError::configuration(&format!("{e:#}")))
}

fn absolute(path: &Path) -> CliResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| CliError::filesystem(&e.to_string()))?;
    Ok(cwd.join(path))
}

/// The given dataset, or the dataset enclosing the current directory
fn dataset_root(dataset: Option<PathBuf>) -> CliResult<PathBuf> {
    if let Some(dataset) = dataset {
        return absolute(&dataset).map(|path| dsman_core::dataset::normalize_path(&path));
    }

    let cwd = absolute(Path::new("."))?;
    match dsman_core::dataset::find_dataset_root(&cwd) {
        Some(root) => {
            log::debug!("Using dataset {} enclosing {}", root.display(), cwd.display());
            Ok(root)
        }
        None => Err(CoreError::from(IoError::not_a_dataset(&cwd)).into()),
    }
}

fn render(config: &AppConfig, format: Option<OutputFormat>, records: &[StatusRecord]) -> CliResult<()> {
    let format = match format {
        Some(format) => format,
        None => OutputFormat::from_string(&config.output.default_format)
            .map_err(|e| CliError::configuration(&e.to_string()))?,
    };

    let use_color = terminal::should_use_color(config.output.color_enabled);
    if !use_color {
        colored::control::set_override(false);
    }

    let formatter = create_formatter(format, use_color);
    let mut stdout = std::io::stdout().lock();
    write_records(&mut stdout, formatter.as_ref(), records)?;
    Ok(())
}

fn config_command(command: ConfigCommand) -> CliResult<()> {
    let manager = |dataset: Option<PathBuf>| -> CliResult<ConfigManager> {
        Ok(match dataset {
            Some(dataset) => ConfigManager::new().with_dataset(absolute(&dataset)?),
            None => ConfigManager::new(),
        })
    };

    match command {
        ConfigCommand::Get { key, dataset } => {
            let value = manager(dataset)?.get(&key)?;
            println!("{value}");
        }
        ConfigCommand::Set {
            key,
            value,
            dataset,
        } => {
            let in_dataset = dataset.is_some();
            let mut manager = manager(dataset)?;
            let path = if in_dataset {
                manager.set_in_dataset(&key, &value)?;
                manager.get_dataset_config_path().unwrap_or_default()
            } else {
                manager.set(&key, &value)?;
                manager.get_config_path()
            };
            eprintln!("{}", format!("Set {key} = {value}").green());
            eprintln!("Configuration saved to: {}", path.display());
        }
        ConfigCommand::List { dataset } => {
            let manager = manager(dataset)?;
            let items = manager.list()?;

            eprintln!("{}", "Configuration:".bold().blue());
            eprintln!("Config file: {}", manager.get_config_path().display());
            if let Some(path) = manager.get_dataset_config_path() {
                eprintln!("Dataset config file: {}", path.display());
            }
            eprintln!();

            // Group items by section
            let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
            for (key, value) in items {
                let section = key.split('.').next().unwrap_or("general").to_string();
                sections.entry(section).or_default().push((key, value));
            }

            for (section, items) in sections {
                println!("[{}]", section.yellow());
                for (key, value) in items {
                    let display_key = key.split_once('.').map_or(key.as_str(), |(_, rest)| rest);
                    println!("  {} = {}", display_key.cyan(), value);
                }
                println!();
            }
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
