use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::Input;
use dotenvy::dotenv;
use uuid::Uuid;

use scolaguard_auth::create_access_token;
use scolaguard_cli::output::{matrix_table, modules_table};
use scolaguard_cli::scope::{parse_module, parse_roles, parse_scope};
use scolaguard_config::{JwtConfig, RegistryConfig};
use scolaguard_models::ids::{SchoolLevelId, TenantId};
use scolaguard_registry::store::postgres::PgModuleStore;
use scolaguard_registry::{AccessMatrix, ModuleRegistry};

#[derive(Parser)]
#[command(name = "scolaguard-cli")]
#[command(about = "Scolaguard CLI - Module administration for school levels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the default modules of a school level (existing rows are kept)
    InitModules {
        /// Tenant ID
        #[arg(short = 't', long)]
        tenant: Option<String>,

        /// School level ID
        #[arg(short = 'l', long)]
        level: Option<String>,
    },
    /// Enable a module once its dependencies are enabled
    EnableModule {
        #[arg(short = 't', long)]
        tenant: Option<String>,

        #[arg(short = 'l', long)]
        level: Option<String>,

        /// Module type, e.g. FINANCES
        #[arg(short = 'm', long)]
        module: Option<String>,
    },
    /// Disable a module no enabled module depends on
    DisableModule {
        #[arg(short = 't', long)]
        tenant: Option<String>,

        #[arg(short = 'l', long)]
        level: Option<String>,

        /// Module type, e.g. CANTINE
        #[arg(short = 'm', long)]
        module: Option<String>,
    },
    /// List the modules of a school level
    ListModules {
        #[arg(short = 't', long)]
        tenant: Option<String>,

        #[arg(short = 'l', long)]
        level: Option<String>,
    },
    /// Print the inter-module access matrix
    ShowMatrix,
    /// Issue an access token for local testing
    MintToken {
        /// User ID (random when omitted)
        #[arg(short = 'u', long)]
        user: Option<Uuid>,

        /// Tenant ID of the user
        #[arg(short = 't', long)]
        tenant: Option<String>,

        /// Comma separated roles, e.g. director,accountant
        #[arg(short = 'r', long)]
        roles: Option<String>,

        #[arg(long, default_value = "cli@scolaguard.local")]
        email: String,

        /// Issue a platform super admin token
        #[arg(long, default_value_t = false)]
        super_admin: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitModules { tenant, level } => {
            let (tenant, level) = scope_or_prompt(tenant, level);
            handle_init_modules(&connect_registry().await, tenant, level).await
        }
        Commands::EnableModule {
            tenant,
            level,
            module,
        } => {
            let (tenant, level) = scope_or_prompt(tenant, level);
            let module = module_or_prompt(module);
            handle_toggle_module(&connect_registry().await, tenant, level, &module, true).await
        }
        Commands::DisableModule {
            tenant,
            level,
            module,
        } => {
            let (tenant, level) = scope_or_prompt(tenant, level);
            let module = module_or_prompt(module);
            handle_toggle_module(&connect_registry().await, tenant, level, &module, false).await
        }
        Commands::ListModules { tenant, level } => {
            let (tenant, level) = scope_or_prompt(tenant, level);
            handle_list_modules(&connect_registry().await, tenant, level).await
        }
        Commands::ShowMatrix => print!("{}", matrix_table(&AccessMatrix::standard().entries())),
        Commands::MintToken {
            user,
            tenant,
            roles,
            email,
            super_admin,
        } => handle_mint_token(user, tenant, roles, &email, super_admin),
    }
}

async fn connect_registry() -> ModuleRegistry {
    let pool = match scolaguard_db::init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => fail("Error connecting to database", e),
    };
    ModuleRegistry::new(
        Arc::new(PgModuleStore::new(pool)),
        RegistryConfig::from_env(),
    )
}

async fn handle_init_modules(registry: &ModuleRegistry, tenant: TenantId, level: SchoolLevelId) {
    match registry.initialize_defaults(tenant, level).await {
        Ok(modules) => {
            println!("✅ {} modules ready for school level {}", modules.len(), level);
            print!("{}", modules_table(&modules));
        }
        Err(e) => fail("Error initializing modules", e),
    }
}

async fn handle_toggle_module(
    registry: &ModuleRegistry,
    tenant: TenantId,
    level: SchoolLevelId,
    module: &str,
    enable: bool,
) {
    let module_type = match parse_module(module) {
        Ok(module_type) => module_type,
        Err(e) => fail("Invalid module", e),
    };

    let result = if enable {
        registry.enable(tenant, module_type, level).await
    } else {
        registry.disable(tenant, module_type, level).await
    };

    match result {
        Ok(module) => {
            let state = if module.enabled { "enabled" } else { "disabled" };
            println!("✅ {} {}", module.module_type, state);
        }
        Err(e) => fail(&format!("Error updating {module_type}"), e),
    }
}

async fn handle_list_modules(registry: &ModuleRegistry, tenant: TenantId, level: SchoolLevelId) {
    match registry.list(tenant, level).await {
        Ok(modules) if modules.is_empty() => {
            println!("No modules for this school level. Run `init-modules` first.");
        }
        Ok(modules) => print!("{}", modules_table(&modules)),
        Err(e) => fail("Error listing modules", e),
    }
}

fn handle_mint_token(
    user: Option<Uuid>,
    tenant: Option<String>,
    roles: Option<String>,
    email: &str,
    super_admin: bool,
) {
    let tenant = match tenant {
        Some(raw) => match raw.trim().parse::<TenantId>() {
            Ok(tenant) => Some(tenant.into_inner()),
            Err(_) => fail("Invalid tenant id", raw),
        },
        None if super_admin => None,
        None => {
            let raw = prompt_text("Tenant ID");
            match raw.trim().parse::<TenantId>() {
                Ok(tenant) => Some(tenant.into_inner()),
                Err(_) => fail("Invalid tenant id", raw),
            }
        }
    };
    let roles = parse_roles(&roles.unwrap_or_else(|| prompt_text("Roles (comma separated)")));

    let config = JwtConfig::from_env();
    match create_access_token(
        user.unwrap_or_else(Uuid::new_v4),
        email,
        tenant,
        roles,
        super_admin,
        &config,
    ) {
        Ok(token) => println!("{token}"),
        Err(e) => fail("Error creating token", e.error),
    }
}

fn scope_or_prompt(tenant: Option<String>, level: Option<String>) -> (TenantId, SchoolLevelId) {
    let tenant = tenant.unwrap_or_else(|| prompt_text("Tenant ID"));
    let level = level.unwrap_or_else(|| prompt_text("School level ID"));
    match parse_scope(&tenant, &level) {
        Ok(scope) => scope,
        Err(e) => fail("Invalid scope", e),
    }
}

fn module_or_prompt(module: Option<String>) -> String {
    module.unwrap_or_else(|| prompt_text("Module type"))
}

fn prompt_text(prompt: &str) -> String {
    match Input::<String>::new().with_prompt(prompt).interact_text() {
        Ok(value) => value,
        Err(e) => fail("Failed to read input", e),
    }
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ {context}: {err}");
    std::process::exit(1);
}
