//! Environment and tenant configuration commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::{Input, Password};
use is_terminal::IsTerminal;

use crate::api::auth::fetch_token;
use crate::config::{Config, Environment, Tenant};
use crate::ui;

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Environment management
    #[command(subcommand)]
    Env(EnvCommands),
    /// Tenant management
    #[command(subcommand)]
    Tenant(TenantCommands),
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// Configure a new environment
    Add {
        /// Alias used to reference this environment
        alias: String,
        /// GraphQL endpoint of the environment
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// List configured environments
    List,
    /// Remove an environment
    Remove {
        /// Alias of the environment to remove
        alias: String,
    },
}

#[derive(Subcommand)]
pub enum TenantCommands {
    /// Configure a new tenant
    Add {
        /// Alias used to reference this tenant in other commands
        alias: String,
        /// Environment this tenant lives in
        #[arg(short, long)]
        environment: String,
        /// The tenant id on the platform
        #[arg(short, long)]
        tenant_id: Option<String>,
        /// Username used to fetch access tokens
        #[arg(short, long)]
        username: Option<String>,
        /// Password used to fetch access tokens
        #[arg(short, long)]
        password: Option<String>,
        /// Client id used when requesting tokens
        #[arg(short, long, default_value = "platform_crm")]
        client_id: String,
    },
    /// List configured tenants
    List,
    /// Show details of a tenant
    Show {
        /// Alias of the tenant
        alias: String,
    },
    /// Remove a tenant
    Remove {
        /// Alias of the tenant to remove
        alias: String,
    },
    /// Fetch a token for a tenant to verify its credentials
    Auth {
        /// Alias of the tenant
        alias: String,
    },
}

pub async fn handle_config_command(cmd: ConfigCommands) -> Result<()> {
    match cmd.command {
        ConfigSubcommands::Env(env) => handle_env_command(env).await,
        ConfigSubcommands::Tenant(tenant) => handle_tenant_command(tenant).await,
    }
}

async fn handle_env_command(cmd: EnvCommands) -> Result<()> {
    let mut config = Config::load()?;

    match cmd {
        EnvCommands::Add { alias, endpoint } => {
            let endpoint = match endpoint {
                Some(endpoint) => endpoint,
                None => prompt("What's the endpoint for this environment?")?,
            };

            config.add_environment(alias.clone(), Environment { endpoint })?;
            ui::success("config:env", &format!("New environment `{}` created!", alias));
        }
        EnvCommands::List => {
            if config.environments.is_empty() {
                println!("No environments configured.");
                return Ok(());
            }
            let mut aliases: Vec<_> = config.environments.iter().collect();
            aliases.sort_by(|a, b| a.0.cmp(b.0));
            for (alias, environment) in aliases {
                println!("{}: {}", alias.bold(), environment.endpoint);
            }
        }
        EnvCommands::Remove { alias } => {
            config.remove_environment(&alias)?;
            ui::success("config:env", &format!("Environment `{}` removed.", alias));
        }
    }

    Ok(())
}

async fn handle_tenant_command(cmd: TenantCommands) -> Result<()> {
    let mut config = Config::load()?;

    match cmd {
        TenantCommands::Add {
            alias,
            environment,
            tenant_id,
            username,
            password,
            client_id,
        } => {
            let tenant_id = match tenant_id {
                Some(value) => value,
                None => prompt("Tenant id?")?,
            };
            let username = match username {
                Some(value) => value,
                None => prompt("Username?")?,
            };
            let password = match password {
                Some(value) => value,
                None => prompt_password("Password?")?,
            };

            config.add_tenant(
                alias.clone(),
                Tenant {
                    environment,
                    tenant_id,
                    client_id,
                    username,
                    password,
                },
            )?;
            ui::success("config:tenant", &format!("Tenant `{}` ready for use.", alias));
        }
        TenantCommands::List => {
            if config.tenants.is_empty() {
                println!("No tenants configured.");
                return Ok(());
            }
            let mut aliases: Vec<_> = config.tenants.iter().collect();
            aliases.sort_by(|a, b| a.0.cmp(b.0));
            for (alias, tenant) in aliases {
                println!(
                    "{}: {} on {}",
                    alias.bold(),
                    tenant.tenant_id,
                    tenant.environment
                );
            }
        }
        TenantCommands::Show { alias } => {
            let (tenant, environment) = config.tenant_with_environment(&alias)?;
            println!("{}: {}", "Alias".bold(), alias);
            println!("{}: {}", "Environment".bold(), tenant.environment);
            println!("{}: {}", "Endpoint".bold(), environment.endpoint);
            println!("{}: {}", "Tenant id".bold(), tenant.tenant_id);
            println!("{}: {}", "Client id".bold(), tenant.client_id);
            println!("{}: {}", "Username".bold(), tenant.username);
        }
        TenantCommands::Remove { alias } => {
            config.remove_tenant(&alias)?;
            ui::success("config:tenant", &format!("Tenant `{}` removed.", alias));
        }
        TenantCommands::Auth { alias } => {
            let (tenant, environment) = config.tenant_with_environment(&alias)?;
            let token = fetch_token(&environment, &tenant).await?;
            ui::success(
                "config:tenant",
                &format!("Authenticated `{}` against {}.", alias, environment.endpoint),
            );
            println!("{}", token.access_token);
        }
    }

    Ok(())
}

fn prompt(question: &str) -> Result<String> {
    anyhow::ensure!(
        std::io::stdin().is_terminal(),
        "Not a terminal; pass the value as a command-line option instead"
    );
    Ok(Input::new().with_prompt(question).interact_text()?)
}

fn prompt_password(question: &str) -> Result<String> {
    anyhow::ensure!(
        std::io::stdin().is_terminal(),
        "Not a terminal; pass the value as a command-line option instead"
    );
    Ok(Password::new().with_prompt(question).interact()?)
}
