//! conn-migrator CLI
//!
//! Operator front end for the pieces of a migration that do not touch a
//! database: keys, environment profiles kept in the vault, settings, and
//! inspection of interchange files.
//!
//! The vault password comes from `--password` / `MIGRATOR_PASSWORD`, or an
//! interactive prompt (asked twice when the vault is created).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use migrator_core::migration::interchange;
use migrator_core::profile::{DEFAULT_DB_PORT, DEFAULT_DB_SSL_MODE};
use migrator_core::{
    generate_key, validate_key, CollisionStrategy, DomainKey, Profile, ProfileManager,
    SettingsManager, Vault,
};

/// Move Airflow-style connections between environments
#[derive(Parser, Debug)]
#[command(name = "conn-migrator")]
#[command(version)]
#[command(about = "Manage keys, profiles and interchange files for connection migration")]
struct Cli {
    /// Directory holding the vault and settings
    #[arg(long, global = true, env = "MIGRATOR_CONFIG")]
    config_dir: Option<PathBuf>,

    /// Vault master password
    #[arg(long, global = true, env = "MIGRATOR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new domain or transport key
    Keygen,

    /// Check that a key is 32 bytes of base64
    ValidateKey { key: String },

    /// Manage environment profiles stored in the vault
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// List the connections in an interchange file without revealing secrets
    Inspect {
        file: PathBuf,

        /// Transport key the file was sealed with
        #[arg(long, env = "MIGRATOR_TRANSPORT_KEY", hide_env_values = true)]
        key: String,

        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Add a profile
    Add(AddProfile),

    /// List profiles
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one profile by id or name, without secrets
    Show { profile: String },

    /// Remove a profile by id or name
    Remove { profile: String },
}

#[derive(Args, Debug)]
struct AddProfile {
    #[arg(long)]
    name: String,

    #[arg(long)]
    host: String,

    #[arg(long, default_value_t = DEFAULT_DB_PORT)]
    port: u16,

    #[arg(long)]
    database: String,

    #[arg(long)]
    user: String,

    /// Prompted for when absent
    #[arg(long, env = "MIGRATOR_DB_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    #[arg(long, default_value = DEFAULT_DB_SSL_MODE)]
    ssl_mode: String,

    /// The environment's domain key
    #[arg(long, env = "MIGRATOR_DOMAIN_KEY", hide_env_values = true)]
    domain_key: String,

    /// Prefix applied to ids imported into this environment
    #[arg(long, default_value = "")]
    prefix: String,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the current settings
    Show,

    /// Change settings
    Set {
        #[arg(long)]
        default_strategy: Option<CollisionStrategy>,

        #[arg(long)]
        export_dir: Option<PathBuf>,
    },

    /// Restore defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout is for command output only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Command::Keygen => println!("{}", generate_key()),
        Command::ValidateKey { key } => {
            if !validate_key(&key) {
                bail!("invalid key: must be 32 bytes base64-encoded");
            }
            println!("valid");
        }
        Command::Inspect { file, key, json } => inspect(&file, &key, json).await?,
        Command::Config(command) => {
            let dir = resolve_config_dir(cli.config_dir)?;
            config(&dir, command).await?;
        }
        Command::Profile(command) => {
            let dir = resolve_config_dir(cli.config_dir)?;
            let vault = open_vault(&dir, cli.password).await?;
            profile(ProfileManager::new(Arc::new(vault)), command).await?;
        }
    }

    Ok(())
}

fn resolve_config_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    ProjectDirs::from("io", "conn-migrator", "conn-migrator")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("Could not determine data directory; pass --config-dir")
}

async fn open_vault(dir: &Path, password: Option<String>) -> Result<Vault> {
    let first_run = !Vault::exists(dir);

    let password = match password {
        Some(password) => password,
        None if first_run => {
            let password = rpassword::prompt_password("New vault password: ")?;
            let confirm = rpassword::prompt_password("Confirm vault password: ")?;
            if password != confirm {
                bail!("passwords do not match");
            }
            password
        }
        None => rpassword::prompt_password("Vault password: ")?,
    };
    if password.is_empty() {
        bail!("vault password must not be empty");
    }

    let vault = Vault::open(dir, &password)
        .await
        .with_context(|| format!("Failed to open vault in {}", dir.display()))?;
    if first_run {
        info!("Created vault in {}", dir.display());
    }
    Ok(vault)
}

async fn profile(manager: ProfileManager, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Add(args) => {
            if !validate_key(&args.domain_key) {
                bail!("invalid --domain-key: must be 32 bytes base64-encoded");
            }
            if manager.list().await?.iter().any(|p| p.name == args.name) {
                bail!("a profile named {} already exists", args.name);
            }

            let db_password = match args.db_password {
                Some(password) => password,
                None => rpassword::prompt_password("Database password: ")?,
            };

            let mut profile = Profile::new(args.name);
            profile.db_host = args.host;
            profile.db_port = args.port;
            profile.db_name = args.database;
            profile.db_user = args.user;
            profile.db_password = db_password;
            profile.db_ssl_mode = args.ssl_mode;
            profile.domain_key = args.domain_key;
            profile.connection_prefix = args.prefix;
            profile.validate()?;

            manager.save(&profile).await?;
            println!("{}", profile.id);
        }
        ProfileCommand::List { json } => {
            let profiles = manager.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else {
                for p in profiles {
                    println!("{}\t{}\t{}:{}/{}", p.id, p.name, p.db_host, p.db_port, p.db_name);
                }
            }
        }
        ProfileCommand::Show { profile } => {
            let profile = find_profile(&manager, &profile).await?;
            println!("id:         {}", profile.id);
            println!("name:       {}", profile.name);
            println!("database:   {}:{}/{}", profile.db_host, profile.db_port, profile.db_name);
            println!("user:       {}", profile.db_user);
            println!("ssl mode:   {}", profile.db_ssl_mode);
            println!("prefix:     {}", profile.connection_prefix);
            println!("domain key: {}", if profile.domain_key.is_empty() { "missing" } else { "set" });
            println!("updated:    {}", profile.updated_at.to_rfc3339());
        }
        ProfileCommand::Remove { profile } => {
            let profile = find_profile(&manager, &profile).await?;
            manager.delete(&profile.id).await?;
            println!("removed {}", profile.name);
        }
    }
    Ok(())
}

/// Load a profile by exact id or unique name
async fn find_profile(manager: &ProfileManager, needle: &str) -> Result<Profile> {
    let summaries = manager.list().await?;
    let found: Vec<_> = summaries
        .iter()
        .filter(|p| p.id == needle || p.name == needle)
        .collect();

    match found.as_slice() {
        [one] => Ok(manager.load(&one.id).await?),
        [] => bail!("no profile with id or name {}", needle),
        _ => bail!("{} profiles are named {}; use the id", found.len(), needle),
    }
}

async fn inspect(file: &Path, key: &str, json: bool) -> Result<()> {
    let key = DomainKey::parse(key).context("invalid transport key")?;
    let entries = interchange::inspect(file, &key)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let mut secrets = Vec::new();
        if entry.has_password {
            secrets.push("password");
        }
        if entry.has_extra {
            secrets.push("extra");
        }
        println!(
            "{}\t{}\t{}\t{}\t{}",
            entry.conn_id,
            entry.conn_type,
            entry.host.as_deref().unwrap_or("-"),
            entry.exported_at,
            secrets.join(",")
        );
    }
    eprintln!("{} connections", entries.len());
    Ok(())
}

async fn config(dir: &Path, command: ConfigCommand) -> Result<()> {
    let mut manager = SettingsManager::new(dir);

    match command {
        ConfigCommand::Show => {}
        ConfigCommand::Set {
            default_strategy,
            export_dir,
        } => {
            let mut settings = manager.get().clone();
            if let Some(strategy) = default_strategy {
                settings.default_collision_strategy = strategy;
            }
            if let Some(export_dir) = export_dir {
                settings.export_dir = Some(export_dir);
            }
            manager.update(settings).await?;
        }
        ConfigCommand::Reset => manager.reset().await?,
    }

    println!("{}", serde_json::to_string_pretty(manager.get())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_profile_add() {
        let key = generate_key();
        let cli = Cli::try_parse_from([
            "conn-migrator",
            "--config-dir",
            "/tmp/migrator",
            "profile",
            "add",
            "--name",
            "prod",
            "--host",
            "db.internal",
            "--database",
            "airflow",
            "--user",
            "airflow",
            "--db-password",
            "pw",
            "--domain-key",
            &key,
        ])
        .unwrap();

        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/migrator")));
        match cli.command {
            Command::Profile(ProfileCommand::Add(args)) => {
                assert_eq!(args.port, DEFAULT_DB_PORT);
                assert_eq!(args.ssl_mode, DEFAULT_DB_SSL_MODE);
                assert_eq!(args.domain_key, key);
                assert!(args.prefix.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_strategy() {
        let cli = Cli::try_parse_from([
            "conn-migrator",
            "config",
            "set",
            "--default-strategy",
            "overwrite",
        ])
        .unwrap();
        match cli.command {
            Command::Config(ConfigCommand::Set {
                default_strategy, ..
            }) => assert_eq!(default_strategy, Some(CollisionStrategy::Overwrite)),
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from([
            "conn-migrator",
            "config",
            "set",
            "--default-strategy",
            "merge",
        ])
        .is_err());
    }

    #[tokio::test]
    async fn test_config_roundtrip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        config(
            temp_dir.path(),
            ConfigCommand::Set {
                default_strategy: Some(CollisionStrategy::Skip),
                export_dir: None,
            },
        )
        .await
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get().default_collision_strategy, CollisionStrategy::Skip);
    }
}
