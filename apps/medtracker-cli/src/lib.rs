use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use medtracker_client_core::entity::{Adherent, Appointment, Contrat, Declaration, MedicalRecord};
use medtracker_client_core::{
    EntityStatus, FilterState, GuardDecision, ManagedEntity, PortalApp, PortalConfig,
    PortalError, SimulatedLatency,
};

#[derive(Parser, Debug)]
#[command(name = "medtracker")]
#[command(about = "MedTracker insurance portal client")]
pub struct MedtrackerCli {
    /// Directory holding the persisted session. Overrides MEDTRACKER_STATE_DIR.
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Simulated latency per service call. Overrides MEDTRACKER_LATENCY_MS.
    #[arg(long, global = true)]
    pub latency_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Sign in with a registered email
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Create an employee account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Sign out and clear the persisted session
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// Show what the route guard does for a path
    Open { path: String },
    /// List records of one kind, scoped by role
    List {
        kind: KindArg,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        status: String,
        /// Narrow to one owner (admin and hr only)
        #[arg(long)]
        owner: Option<String>,
    },
    /// Count records per status
    Summary { kind: KindArg },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Records,
    Appointments,
    Adherents,
    Contrats,
    Declarations,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Register { .. } => "register",
            Self::Logout => "logout",
            Self::Whoami => "whoami",
            Self::Open { .. } => "open",
            Self::List { .. } => "list",
            Self::Summary { .. } => "summary",
        }
    }
}

impl MedtrackerCli {
    pub fn config(&self) -> Result<PortalConfig> {
        let mut config = PortalConfig::from_env().context("failed to read configuration")?;
        if let Some(dir) = &self.state_dir {
            config.state_dir = Some(dir.clone());
        }
        if let Some(millis) = self.latency_ms {
            config.latency = SimulatedLatency::new(Duration::from_millis(millis));
        }
        Ok(config)
    }
}

pub async fn run(cli: MedtrackerCli, out: &mut impl Write) -> Result<()> {
    let config = cli.config()?;
    let mut app = PortalApp::bootstrap(&config);
    tracing::debug!(target: "medtracker.app", command = cli.command.name(), "running command");

    match cli.command {
        Commands::Login { email, password } => {
            let landed = app
                .login(&email, &password)
                .await
                .map_err(portal_error)?;
            write_identity(&app, out)?;
            writeln!(out, "-> {}", landed.to_path())?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            app.register(&name, &email, &password)
                .await
                .map_err(portal_error)?;
            write_identity(&app, out)?;
        }
        Commands::Logout => {
            app.logout().await;
            writeln!(out, "signed out")?;
        }
        Commands::Whoami => write_identity(&app, out)?,
        Commands::Open { path } => match app.navigate(&path) {
            GuardDecision::Render(route) => writeln!(out, "render {}", route.to_path())?,
            GuardDecision::Redirect { to, state } => {
                writeln!(out, "redirect {} from={}", to.to_path(), state.from)?;
            }
        },
        Commands::List {
            kind,
            search,
            status,
            owner,
        } => {
            let query = ListQuery {
                search,
                status,
                owner,
            };
            match kind {
                KindArg::Records => list::<MedicalRecord>(&app, &query, out).await?,
                KindArg::Appointments => list::<Appointment>(&app, &query, out).await?,
                KindArg::Adherents => list::<Adherent>(&app, &query, out).await?,
                KindArg::Contrats => list::<Contrat>(&app, &query, out).await?,
                KindArg::Declarations => list::<Declaration>(&app, &query, out).await?,
            }
        }
        Commands::Summary { kind } => match kind {
            KindArg::Records => summary::<MedicalRecord>(&app, out).await?,
            KindArg::Appointments => summary::<Appointment>(&app, out).await?,
            KindArg::Adherents => summary::<Adherent>(&app, out).await?,
            KindArg::Contrats => summary::<Contrat>(&app, out).await?,
            KindArg::Declarations => summary::<Declaration>(&app, out).await?,
        },
    }

    app.shutdown();
    Ok(())
}

/// Keeps the detail as the source and shows the localized message on top.
fn portal_error(error: PortalError) -> anyhow::Error {
    let message = error.user_message();
    anyhow::Error::new(error).context(message)
}

struct ListQuery {
    search: String,
    status: String,
    owner: Option<String>,
}

fn write_identity(app: &PortalApp, out: &mut impl Write) -> Result<()> {
    match app.current_identity() {
        Some(identity) => {
            let line = serde_json::to_string(identity).context("failed to encode identity")?;
            writeln!(out, "{line}")?;
        }
        None => writeln!(out, "not signed in")?,
    }
    Ok(())
}

async fn list<T: ManagedEntity>(app: &PortalApp, query: &ListQuery, out: &mut impl Write) -> Result<()> {
    let identity = app
        .current_identity()
        .cloned()
        .ok_or_else(|| anyhow!("not signed in; run `medtracker login` first"))?;

    let mut page = app.controller::<T>();
    page.load(&identity, query.owner.as_deref()).await;
    if let Some(message) = page.load_error_message() {
        return Err(anyhow!(message));
    }
    page.set_filter(FilterState::new(query.search.clone(), &query.status));

    for record in page.visible() {
        let line = serde_json::to_string(record).context("failed to encode record")?;
        writeln!(out, "{line}")?;
    }
    Ok(())
}

async fn summary<T: ManagedEntity>(app: &PortalApp, out: &mut impl Write) -> Result<()> {
    let identity = app
        .current_identity()
        .cloned()
        .ok_or_else(|| anyhow!("not signed in; run `medtracker login` first"))?;

    let mut page = app.controller::<T>();
    page.load(&identity, None).await;
    if let Some(message) = page.load_error_message() {
        return Err(anyhow!(message));
    }
    for (status, count) in page.status_summary() {
        writeln!(out, "{}\t{count}", EntityStatus::as_str(status))?;
    }
    Ok(())
}
