//! SmartTicket console CLI.

mod display;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use smartticket_console::{
    ActionEvent, ActionId, Console, ConsoleError, Dispatcher, Outcome, Upload, View,
};
use smartticket_core::{
    ConsoleConfig, DriverForm, LedgerFilter, NewUserForm, PaymentStatus, ProfileUpdate,
    StatusChangeRequest, StatusGroup,
};
use smartticket_store::{MemoryAuth, MemoryBlobStore, MemoryStore};
use smartticket_sync::RestBackend;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use display::TerminalNotifier;

#[derive(Parser)]
#[command(name = "smartticket")]
#[command(about = "Back-office console for traffic apprehensions, payments, and drivers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Local snapshot file used when not talking to the remote backend
    #[arg(long, global = true, env = "SMARTTICKET_DATA", default_value = "smartticket.json")]
    data: PathBuf,

    /// Use the remote document, identity, and blob services
    #[arg(long, global = true)]
    remote: bool,

    /// Remote project configuration (JSON)
    #[arg(
        long,
        global = true,
        env = "SMARTTICKET_CONFIG",
        default_value = "smartticket.config.json"
    )]
    config: PathBuf,

    /// Overrides `project_id` from the config file
    #[arg(long, global = true, env = "SMARTTICKET_PROJECT_ID")]
    project_id: Option<String>,

    /// Overrides `api_key` from the config file
    #[arg(long, global = true, env = "SMARTTICKET_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Operator email used to sign in before the command runs
    #[arg(long, global = true, env = "SMARTTICKET_EMAIL")]
    email: Option<String>,

    /// Operator password
    #[arg(long, global = true, env = "SMARTTICKET_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with the operator credentials
    Login,

    /// Email a password reset link
    ResetPassword {
        /// Account email (defaults to --email)
        address: Option<String>,
    },

    /// Apprehension and driver counts with monthly and location charts
    Dashboard {
        /// Full month name, e.g. March
        #[arg(long)]
        month: Option<String>,
    },

    /// Frequency charts and the enforcement recommendation
    Stats,

    /// Paid or unpaid/overdue apprehensions with their total
    Ledger {
        /// paid or unpaid
        #[arg(default_value = "paid")]
        group: StatusGroup,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Record a payment against an apprehension
    Pay {
        id: String,

        /// Official receipt number
        #[arg(long = "or")]
        or_number: String,

        /// Amount paid; must equal the apprehension total
        #[arg(long)]
        amount: f64,
    },

    /// Mark an apprehension unpaid or overdue
    SetStatus { id: String, status: PaymentStatus },

    /// Audit log of status changes and payments
    History,

    /// Registered drivers
    Drivers {
        #[command(subcommand)]
        command: DriverCommand,
    },

    /// Console operator accounts
    Users {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Apprehension records
    Apprehensions {
        #[command(subcommand)]
        command: ApprehensionCommand,
    },

    /// The signed-in operator's own account
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Exact violation name
    #[arg(long)]
    violation: Option<String>,

    /// Address substring
    #[arg(long)]
    address: Option<String>,

    /// Vehicle type substring
    #[arg(long)]
    vehicle_type: Option<String>,
}

impl FilterArgs {
    fn into_filter(self) -> LedgerFilter {
        LedgerFilter {
            violation: self.violation.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            vehicle_type: self.vehicle_type.unwrap_or_default(),
        }
    }
}

#[derive(Args)]
struct DriverFields {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    license: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    sex: Option<String>,
    /// Driver photo to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

impl DriverFields {
    fn apply(self, form: &mut DriverForm) -> Option<PathBuf> {
        overlay(&mut form.first_name, self.first_name);
        overlay(&mut form.last_name, self.last_name);
        overlay(&mut form.license_number, self.license);
        overlay(&mut form.address, self.address);
        overlay(&mut form.sex, self.sex);
        self.image
    }
}

#[derive(Subcommand)]
enum DriverCommand {
    List,
    Add(DriverFields),
    /// Change the given fields; everything else keeps its stored value
    Edit {
        id: String,
        #[command(flatten)]
        fields: DriverFields,
    },
    Delete {
        id: String,
    },
    /// Write every driver to an .xlsx file
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Args)]
struct UserFields {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    position: Option<String>,
    /// Profile picture to upload
    #[arg(long)]
    picture: Option<PathBuf>,
}

#[derive(Subcommand)]
enum UserCommand {
    List,
    /// Create a login account and its user document
    Add {
        #[command(flatten)]
        fields: UserFields,
        /// YYYY-MM-DD
        #[arg(long)]
        birthdate: String,
        #[arg(long)]
        login_email: String,
        #[arg(long)]
        login_password: String,
    },
    Edit {
        id: String,
        #[command(flatten)]
        fields: UserFields,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum ApprehensionCommand {
    /// Write every apprehension to an .xlsx file
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        birthdate: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        picture: Option<PathBuf>,
    },
    ChangePassword {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

fn overlay(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn read_upload(path: Option<PathBuf>) -> anyhow::Result<Option<Upload>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Some(Upload::new(path.to_string_lossy(), bytes)))
}

/// Accounts file kept beside a snapshot: `data.json` → `data.auth.json`.
fn accounts_path(snapshot: &Path) -> PathBuf {
    snapshot.with_extension("auth.json")
}

fn connect(cli: &Cli) -> anyhow::Result<Console> {
    let notifier = Arc::new(TerminalNotifier::new(cli.yes));
    if cli.remote {
        let mut config = if cli.config.exists() {
            ConsoleConfig::load(&cli.config)
                .with_context(|| format!("loading {}", cli.config.display()))?
        } else {
            ConsoleConfig::default()
        };
        if let Some(project) = &cli.project_id {
            config.project_id = project.clone();
        }
        if let Some(key) = &cli.api_key {
            config.api_key = key.clone();
        }
        let backend = RestBackend::connect(&config).context("configuring remote backend")?;
        return Ok(Console::new(
            Arc::new(backend.store),
            Arc::new(backend.auth),
            Arc::new(backend.blobs),
            notifier,
        ));
    }

    let store = MemoryStore::open_persistent(&cli.data)
        .with_context(|| format!("opening {}", cli.data.display()))?;
    let auth = MemoryAuth::open_persistent(&accounts_path(&cli.data))
        .context("opening account file")?;
    let blobs = MemoryBlobStore::open_persistent(&MemoryBlobStore::dir_for_snapshot(&cli.data));
    info!(path = %cli.data.display(), "using local snapshot");
    Ok(Console::new(
        Arc::new(store),
        Arc::new(auth),
        Arc::new(blobs),
        notifier,
    ))
}

/// Sign in quietly with the global credentials, when both are given.
async fn sign_in(console: &Console, cli: &Cli) -> anyhow::Result<()> {
    if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        let session = console
            .auth()
            .sign_in(email, password)
            .await
            .context("signing in")?;
        debug!(uid = %session.uid, "signed in");
    }
    Ok(())
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Reloaded(table) => display::print_table(&table),
        Outcome::Cancelled => println!("Cancelled."),
        Outcome::StatusDialog(_)
        | Outcome::EditUser { .. }
        | Outcome::EditDriver { .. }
        | Outcome::Shown => {}
    }
}

async fn dispatch(console: &Console, action: ActionId, id: &str) -> anyhow::Result<Outcome> {
    let event = ActionEvent::new(action, id, BTreeMap::new());
    Ok(Dispatcher::standard().dispatch(console, event).await?)
}

async fn run(console: &Console, cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Login => {
            let (Some(email), Some(password)) = (&cli.email, &cli.password) else {
                bail!("login needs --email and --password (or SMARTTICKET_EMAIL / SMARTTICKET_PASSWORD)");
            };
            console.login(email, password).await?;
        }
        Commands::ResetPassword { address } => {
            let address = address.or(cli.email).unwrap_or_default();
            console.forgot_password(&address).await?;
        }
        Commands::Dashboard { month } => {
            let summary = console.dashboard(month.as_deref()).await?;
            display::print_dashboard(&summary);
        }
        Commands::Stats => {
            let report = console.statistics().await?;
            display::print_statistics(&report);
        }
        Commands::Ledger { group, filter } => {
            let view = View::Ledger {
                group,
                filter: filter.into_filter(),
            };
            display::print_table(&console.ledger(&view).await?);
        }
        Commands::Pay {
            id,
            or_number,
            amount,
        } => {
            let context = console.open_status_dialog(&id).await?;
            let request = StatusChangeRequest {
                status: PaymentStatus::Paid,
                or_number,
                amount,
            };
            let view = View::ledger(StatusGroup::Paid);
            report(console.submit_status_change(&context, request, &view).await?);
        }
        Commands::SetStatus { id, status } => {
            if status == PaymentStatus::Paid {
                bail!("use `pay` to record a payment");
            }
            let context = console.open_status_dialog(&id).await?;
            let request = StatusChangeRequest {
                status,
                ..Default::default()
            };
            let view = View::ledger(StatusGroup::UnpaidOrOverdue);
            report(console.submit_status_change(&context, request, &view).await?);
        }
        Commands::History => {
            display::print_history(&console.history().await?);
        }
        Commands::Drivers { command } => match command {
            DriverCommand::List => display::print_table(&console.list_drivers().await?),
            DriverCommand::Add(fields) => {
                let mut form = DriverForm::default();
                let image = read_upload(fields.apply(&mut form))?;
                report(console.add_driver(form, image).await?);
            }
            DriverCommand::Edit { id, fields } => {
                let Outcome::EditDriver { id, mut form } =
                    dispatch(console, ActionId::EditDriver, &id).await?
                else {
                    bail!("driver {id} could not be opened for editing");
                };
                let image = read_upload(fields.apply(&mut form))?;
                report(console.edit_driver(&id, form, image).await?);
            }
            DriverCommand::Delete { id } => {
                report(dispatch(console, ActionId::DeleteDriver, &id).await?);
            }
            DriverCommand::Export { dir } => {
                let path = console.export_drivers(&dir).await?;
                println!("{}", path.display());
            }
        },
        Commands::Users { command } => match command {
            UserCommand::List => display::print_table(&console.list_users().await?),
            UserCommand::Add {
                fields,
                birthdate,
                login_email,
                login_password,
            } => {
                let form = NewUserForm {
                    first_name: fields.first_name.unwrap_or_default(),
                    last_name: fields.last_name.unwrap_or_default(),
                    birthdate,
                    gender: fields.gender.unwrap_or_default(),
                    address: fields.address.unwrap_or_default(),
                    position: fields.position.unwrap_or_default(),
                    email: login_email,
                    password: login_password,
                };
                let picture = read_upload(fields.picture)?;
                report(console.add_user(form, picture).await?);
            }
            UserCommand::Edit { id, fields } => {
                let Outcome::EditUser { id, mut form } =
                    dispatch(console, ActionId::EditUser, &id).await?
                else {
                    bail!("user {id} could not be opened for editing");
                };
                overlay(&mut form.first_name, fields.first_name);
                overlay(&mut form.last_name, fields.last_name);
                overlay(&mut form.address, fields.address);
                overlay(&mut form.gender, fields.gender);
                overlay(&mut form.position, fields.position);
                let picture = read_upload(fields.picture)?;
                report(console.edit_user(&id, form, picture).await?);
            }
            UserCommand::Delete { id } => {
                report(dispatch(console, ActionId::DeleteUser, &id).await?);
            }
        },
        Commands::Apprehensions { command } => match command {
            ApprehensionCommand::Export { dir } => {
                let path = console.export_apprehensions(&dir).await?;
                println!("{}", path.display());
            }
        },
        Commands::Profile { command } => match command {
            ProfileCommand::Show => display::print_profile(&console.load_profile().await?),
            ProfileCommand::Update {
                first_name,
                last_name,
                birthdate,
                gender,
                address,
                picture,
            } => {
                let current = console.load_profile().await?;
                let mut update = ProfileUpdate::from_record(&current);
                overlay(&mut update.first_name, first_name);
                overlay(&mut update.last_name, last_name);
                overlay(&mut update.birthdate, birthdate);
                overlay(&mut update.gender, gender);
                overlay(&mut update.address, address);
                let picture = read_upload(picture)?;
                let user = console.update_profile(update, picture).await?;
                display::print_profile(&user);
            }
            ProfileCommand::ChangePassword { old, new, confirm } => {
                console.change_password(&old, &new, &confirm).await?;
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    debug!("smartticket v{}", env!("CARGO_PKG_VERSION"));

    let console = connect(&cli)?;
    if !matches!(cli.command, Commands::Login | Commands::ResetPassword { .. }) {
        sign_in(&console, &cli).await?;
    }

    match run(&console, cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => match err.downcast_ref::<ConsoleError>() {
            // Already shown to the operator as a dialog.
            Some(
                ConsoleError::Form(_)
                | ConsoleError::Payment(_)
                | ConsoleError::Auth(_)
                | ConsoleError::NotAuthenticated,
            ) => {
                debug!(error = %err, "command failed");
                Ok(ExitCode::FAILURE)
            }
            _ => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn accounts_file_sits_beside_snapshot() {
        assert_eq!(
            accounts_path(Path::new("/tmp/data.json")),
            PathBuf::from("/tmp/data.auth.json")
        );
    }

    #[test]
    fn ledger_filters_parse() {
        let cli = Cli::try_parse_from([
            "smartticket",
            "ledger",
            "unpaid",
            "--address",
            "Elm",
        ])
        .unwrap();
        let Commands::Ledger { group, filter } = cli.command else {
            panic!("expected ledger");
        };
        assert_eq!(group, StatusGroup::UnpaidOrOverdue);
        assert_eq!(filter.into_filter().address, "Elm");
    }

    #[test]
    fn pay_takes_receipt_and_amount() {
        let cli = Cli::try_parse_from([
            "smartticket",
            "--yes",
            "pay",
            "a1",
            "--or",
            "OR-7",
            "--amount",
            "1500",
        ])
        .unwrap();
        assert!(cli.yes);
        let Commands::Pay {
            id,
            or_number,
            amount,
        } = cli.command
        else {
            panic!("expected pay");
        };
        assert_eq!((id.as_str(), or_number.as_str(), amount), ("a1", "OR-7", 1500.0));
    }
}
