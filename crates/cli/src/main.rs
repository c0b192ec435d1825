//! Operator CLI for WardOps.
//!
//! Loads a fixture file (or the built-in set), applies one command and prints the result. With
//! `--save` the mutated state is written back to the same fixture file.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wardops_core::{
    Badge, CareSetting, ConsentProgress, ConsentRecord, ConsentSummary, CoreConfig,
    HospitalStore, NewTransition, Occupant, OccupancySummary, Priority, Resource,
    ResourceCategory, ResourceFilter, ResourceStateKind, SignOutcome, TransitionRequest,
    TransitionState, TransitionSummary, DEFAULT_FACILITY_NAME,
};

#[derive(Parser)]
#[command(name = "wardops")]
#[command(about = "Hospital ward operations CLI")]
struct Cli {
    /// YAML fixture file to load (defaults to the built-in fixtures)
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,
    /// Write the resulting state back to the fixture file
    #[arg(long, global = true, requires = "fixtures")]
    save: bool,
    /// Facility name shown in summaries
    #[arg(long, global = true, default_value = DEFAULT_FACILITY_NAME)]
    facility: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List beds
    Beds {
        #[arg(long)]
        ward: Option<String>,
        #[arg(long)]
        category: Option<ResourceCategory>,
        #[arg(long)]
        state: Option<ResourceStateKind>,
    },
    /// Show occupancy, transition and consent summaries
    Summary,
    /// Reserve an available bed
    Allocate { id: String },
    /// Admit a patient to an available or reserved bed
    Admit {
        id: String,
        patient_id: String,
        patient_name: String,
    },
    /// Release an occupied or reserved bed
    Release { id: String },
    /// Take a bed out of service
    Maintenance { id: String },
    /// Put a bed under maintenance back into service
    ReturnToService { id: String },
    /// List transition requests
    Transitions {
        #[arg(long)]
        state: Option<TransitionState>,
    },
    /// Submit a care-setting transition request
    Submit {
        patient_id: String,
        patient_name: String,
        #[arg(value_enum)]
        current: SettingArg,
        #[arg(value_enum)]
        requested: SettingArg,
        #[arg(long, value_enum, default_value = "medium")]
        priority: PriorityArg,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Approve a pending transition request
    Approve { id: String, reviewer: String },
    /// Reject a pending transition request
    Reject { id: String, reviewer: String },
    /// Start an approved transition
    Execute { id: String },
    /// Finish an in-progress transition
    Complete { id: String },
    /// List consent forms with signing progress
    Consents,
    /// Sign one consent item
    Sign {
        form_id: String,
        item_id: String,
        signer: String,
    },
    /// Complete a consent form once every required item is signed
    CompleteForm { form_id: String },
    /// Expire a consent form that was never completed
    Expire { form_id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum SettingArg {
    Opd,
    Ipd,
    DayCare,
    Icu,
}

impl From<SettingArg> for CareSetting {
    fn from(arg: SettingArg) -> Self {
        match arg {
            SettingArg::Opd => CareSetting::Opd,
            SettingArg::Ipd => CareSetting::Ipd,
            SettingArg::DayCare => CareSetting::DayCare,
            SettingArg::Icu => CareSetting::Icu,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
    Urgent,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Urgent => Priority::Urgent,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wardops_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = cli.command else {
        println!("Use 'wardops --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::new(cli.fixtures, cli.facility)?;
    let mut store = HospitalStore::open(&cfg)?;
    let mutated = run(&mut store, command)?;
    tracing::debug!(mutated, "command applied");

    if let (true, true, Some(path)) = (mutated, cli.save, cfg.fixture_path()) {
        store.snapshot().save(path)?;
        println!("Saved fixtures to {}", path.display());
    }

    Ok(())
}

/// Apply one command. Returns whether the store was mutated.
fn run(store: &mut HospitalStore, command: Commands) -> anyhow::Result<bool> {
    match command {
        Commands::Beds {
            ward,
            category,
            state,
        } => {
            let filter = ResourceFilter {
                ward,
                category,
                state,
            };
            let mut found = false;
            for resource in store.resources().list(&filter) {
                print_resource(resource);
                found = true;
            }
            if !found {
                println!("No beds found.");
            }
            Ok(false)
        }
        Commands::Summary => {
            print_summary(store);
            Ok(false)
        }
        Commands::Allocate { id } => {
            print_resource(store.resources_mut().allocate(&id)?);
            Ok(true)
        }
        Commands::Admit {
            id,
            patient_id,
            patient_name,
        } => {
            let occupant = Occupant {
                patient_id,
                patient_name,
            };
            print_resource(store.resources_mut().admit(&id, occupant)?);
            Ok(true)
        }
        Commands::Release { id } => {
            print_resource(store.resources_mut().release(&id)?);
            Ok(true)
        }
        Commands::Maintenance { id } => {
            print_resource(store.resources_mut().mark_maintenance(&id)?);
            Ok(true)
        }
        Commands::ReturnToService { id } => {
            print_resource(store.resources_mut().return_to_service(&id)?);
            Ok(true)
        }
        Commands::Transitions { state } => {
            let mut found = false;
            for request in store.transitions().list(state) {
                print_transition(request);
                found = true;
            }
            if !found {
                println!("No transition requests found.");
            }
            Ok(false)
        }
        Commands::Submit {
            patient_id,
            patient_name,
            current,
            requested,
            priority,
            reason,
        } => {
            let new = NewTransition {
                patient_id,
                patient_name,
                current: current.into(),
                requested: requested.into(),
                priority: priority.into(),
                reason,
            };
            print_transition(store.transitions_mut().submit(new)?);
            Ok(true)
        }
        Commands::Approve { id, reviewer } => {
            print_transition(store.transitions_mut().approve(&id, &reviewer)?);
            Ok(true)
        }
        Commands::Reject { id, reviewer } => {
            print_transition(store.transitions_mut().reject(&id, &reviewer)?);
            Ok(true)
        }
        Commands::Execute { id } => {
            print_transition(store.transitions_mut().execute(&id)?);
            Ok(true)
        }
        Commands::Complete { id } => {
            print_transition(store.transitions_mut().complete(&id)?);
            Ok(true)
        }
        Commands::Consents => {
            for form in store.consents().list() {
                print_consent(form);
            }
            Ok(false)
        }
        Commands::Sign {
            form_id,
            item_id,
            signer,
        } => {
            let outcome = store
                .consents_mut()
                .sign_item(&form_id, &item_id, &signer)?;
            match outcome {
                SignOutcome::Signed => println!("Signed {form_id}/{item_id}"),
                SignOutcome::AlreadySigned => {
                    println!("{form_id}/{item_id} was already signed; kept original signature")
                }
            }
            print_consent(store.consents().get(&form_id)?);
            Ok(outcome == SignOutcome::Signed)
        }
        Commands::CompleteForm { form_id } => {
            print_consent(store.consents_mut().complete_form(&form_id)?);
            Ok(true)
        }
        Commands::Expire { form_id } => {
            print_consent(store.consents_mut().expire(&form_id)?);
            Ok(true)
        }
    }
}

fn print_resource(resource: &Resource) {
    let occupant = resource
        .state
        .occupant()
        .map(|o| format!(" - {} ({})", o.patient_name, o.patient_id))
        .unwrap_or_default();
    println!(
        "{}: {} room {} floor {}, {} [{}]{}",
        resource.id,
        resource.location.ward,
        resource.location.room,
        resource.location.floor,
        resource.category,
        resource.state.badge().label,
        occupant
    );
}

fn print_transition(request: &TransitionRequest) {
    println!(
        "{}: {} ({}) {} -> {} [{}] priority {}",
        request.id,
        request.patient_name,
        request.patient_id,
        request.current,
        request.requested,
        request.state.badge().label,
        request.priority.badge().label
    );
}

fn print_consent(form: &ConsentRecord) {
    let progress = ConsentProgress::compute(form);
    println!(
        "{}: {} - {} [{}] {}/{} signed ({} of {} required)",
        form.id,
        form.patient_name,
        form.procedure,
        form.status.badge().label,
        progress.signed,
        progress.total,
        progress.required_signed,
        progress.required_total
    );
    for item in &form.items {
        let mark = if item.is_signed() { "x" } else { " " };
        let required = if item.required { "*" } else { "" };
        println!("  [{mark}] {} {}{required}", item.id, item.title);
    }
}

fn print_summary(store: &HospitalStore) {
    let occupancy = OccupancySummary::compute(store.resources());
    let transitions = TransitionSummary::compute(store.transitions());
    let consents = ConsentSummary::compute(store.consents());

    println!("{}", store.facility_name());
    println!(
        "Beds: {} total, {} occupied, {} available, {} reserved, {} maintenance ({}% utilised, {})",
        occupancy.counts.total(),
        occupancy.counts.occupied,
        occupancy.counts.available,
        occupancy.counts.reserved,
        occupancy.counts.maintenance,
        occupancy.counts.utilization_percent(),
        occupancy.level().badge().label
    );
    for ward in &occupancy.by_ward {
        println!(
            "  {}: {}/{} occupied ({}%, {})",
            ward.ward,
            ward.counts.occupied,
            ward.counts.total(),
            ward.counts.utilization_percent(),
            ward.level().badge().label
        );
    }
    println!(
        "Transitions: {} pending ({} urgent), {} approved, {} in progress, {} completed, {} rejected",
        transitions.pending,
        transitions.urgent_pending,
        transitions.approved,
        transitions.in_progress,
        transitions.completed,
        transitions.rejected
    );
    println!(
        "Consents: {} draft, {} pending, {} completed, {} expired",
        consents.draft, consents.pending, consents.completed, consents.expired
    );
}
