use clap::{Parser, Subcommand};
use edw_core::{
    CoreConfig, NonEmptyText, Probability, Scratchpad, Sex, Workspace,
};
use std::collections::HashSet;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "edw")]
#[command(about = "Emergency department workstation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    ListPatients,
    /// Register a new patient
    CreatePatient {
        /// Full name
        name: String,
        /// Medical record number
        identifier: String,
        /// One of female, male, other, unknown
        sex: String,
    },
    /// List a patient's encounters
    Encounters {
        /// Patient UUID
        patient_id: Uuid,
    },
    /// Open a new encounter for a patient
    CreateEncounter {
        /// Patient UUID
        patient_id: Uuid,
        /// Care location, e.g. "Resus 2"
        location: String,
        /// Initial status (defaults to "active")
        #[arg(long)]
        status: Option<String>,
    },
    /// Show the full workspace for an encounter
    Show {
        /// Encounter UUID
        encounter_id: Uuid,
    },
    /// Author a note against an encounter
    AddNote {
        /// Encounter UUID
        encounter_id: Uuid,
        /// Note kind, e.g. "triage", "progress"
        kind: String,
        title: String,
        content: String,
    },
    /// Edit the title and content of an existing note
    EditNote {
        /// Encounter UUID
        encounter_id: Uuid,
        /// Note UUID
        note_id: Uuid,
        title: String,
        content: String,
    },
    /// Place an order from free text, e.g. "IV001 N/S 500ml"
    PlaceOrder {
        /// Encounter UUID
        encounter_id: Uuid,
        text: String,
    },
    /// Record a result against an encounter
    RecordResult {
        /// Encounter UUID
        encounter_id: Uuid,
        /// Result category, e.g. "lab", "vitals"
        category: String,
        name: String,
        value: String,
        #[arg(long)]
        unit: Option<String>,
        /// Abnormality flag, e.g. "H", "L"
        #[arg(long)]
        flag: Option<String>,
    },
    /// Add a differential-diagnosis entry
    AddDdx {
        /// Encounter UUID
        encounter_id: Uuid,
        name: String,
        /// Likelihood between 0.0 and 1.0
        #[arg(long)]
        probability: Option<f64>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Run the AI assistant over the encounter's current data
    RunAi {
        /// Encounter UUID
        encounter_id: Uuid,
    },
    /// Apply order-type AI suggestions by id
    ApplyOrders {
        /// Encounter UUID
        encounter_id: Uuid,
        /// Suggestion UUIDs to apply
        suggestion_ids: Vec<Uuid>,
    },
    /// Read the encounter's audit trail
    Events {
        /// Encounter UUID
        encounter_id: Uuid,
    },
    /// Save a draft note to the local scratchpad
    DraftNote {
        kind: String,
        title: String,
        content: String,
    },
    /// Save a draft order line to the local scratchpad
    DraftOrder {
        text: String,
    },
    /// List the local scratchpad drafts
    Drafts,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config_from_env()?;

    let Some(command) = cli.command else {
        println!("No command given; try --help");
        return Ok(());
    };

    match command {
        Commands::ListPatients => {
            let ws = Workspace::new(&cfg)?;
            let patients = ws.list_patients().await?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "ID: {}, Name: {}, MRN: {}, Sex: {}, Created: {}",
                        patient.id,
                        patient.name,
                        patient.identifier,
                        patient.sex,
                        patient.created_at.to_rfc3339()
                    );
                }
            }
        }
        Commands::CreatePatient {
            name,
            identifier,
            sex,
        } => {
            let ws = Workspace::new(&cfg)?;
            let patient = ws
                .create_patient(
                    NonEmptyText::new(&name)?,
                    NonEmptyText::new(&identifier)?,
                    sex.parse::<Sex>()?,
                )
                .await?;
            println!("Created patient {} ({})", patient.id, patient.name);
        }
        Commands::Encounters { patient_id } => {
            let ws = Workspace::new(&cfg)?;
            let encounters = ws.list_encounters(patient_id).await?;
            if encounters.is_empty() {
                println!("No encounters found.");
            } else {
                for encounter in encounters {
                    println!(
                        "ID: {}, Location: {}, Status: {}, Opened: {}",
                        encounter.id,
                        encounter.location,
                        encounter.status,
                        encounter.created_at.to_rfc3339()
                    );
                }
            }
        }
        Commands::CreateEncounter {
            patient_id,
            location,
            status,
        } => {
            let mut ws = Workspace::new(&cfg)?;
            let patient = ws
                .list_patients()
                .await?
                .into_iter()
                .find(|p| p.id == patient_id);
            let Some(patient) = patient else {
                eprintln!("Patient {patient_id} not found");
                return Ok(());
            };

            ws.select_patient(patient).await?;
            let encounter = ws
                .create_encounter(
                    NonEmptyText::new(&location)?,
                    NonEmptyText::new(status.as_deref().unwrap_or("active"))?,
                )
                .await?;
            println!("Opened encounter {} at {}", encounter.id, encounter.location);
        }
        Commands::Show { encounter_id } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            print_workspace(&ws);
        }
        Commands::AddNote {
            encounter_id,
            kind,
            title,
            content,
        } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            let note = ws
                .create_note(
                    NonEmptyText::new(&kind)?,
                    NonEmptyText::new(&title)?,
                    content,
                    None,
                )
                .await?;
            println!("Created note {} ({})", note.id, note.title);
        }
        Commands::EditNote {
            encounter_id,
            note_id,
            title,
            content,
        } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            let note = ws
                .update_note(note_id, NonEmptyText::new(&title)?, content)
                .await?;
            println!("Updated note {} ({})", note.id, note.title);
        }
        Commands::PlaceOrder { encounter_id, text } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            match ws.place_order(&text).await? {
                Some(order) => println!(
                    "Placed order {} [{}] {}",
                    order.id,
                    order.code.as_deref().unwrap_or("-"),
                    order.name
                ),
                None => println!("Order text was blank; nothing placed."),
            }
        }
        Commands::RecordResult {
            encounter_id,
            category,
            name,
            value,
            unit,
            flag,
        } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            let observation = ws
                .record_observation(
                    NonEmptyText::new(&category)?,
                    NonEmptyText::new(&name)?,
                    NonEmptyText::new(&value)?,
                    unit,
                    flag,
                )
                .await?;
            println!(
                "Recorded {} {} = {} {}",
                observation.category,
                observation.name,
                observation.value,
                observation.unit.as_deref().unwrap_or("")
            );
        }
        Commands::AddDdx {
            encounter_id,
            name,
            probability,
            reason,
        } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            let probability = probability.map(Probability::new).transpose()?;
            let entry = ws
                .add_ddx(NonEmptyText::new(&name)?, probability, reason)
                .await?;
            println!("Added ddx entry {} ({})", entry.id, entry.name);
        }
        Commands::RunAi { encounter_id } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            match ws.run_assistant().await {
                Ok(outcome) => {
                    println!(
                        "Run {} ({} / {}) produced {} suggestions:",
                        outcome.run.id,
                        outcome.run.provider,
                        outcome.run.model,
                        outcome.suggestions.len()
                    );
                    for suggestion in outcome.suggestions {
                        println!(
                            "  {} [{:?}] {} (p={})",
                            suggestion.id,
                            suggestion.kind,
                            suggestion.name,
                            suggestion
                                .probability
                                .map(|p| p.to_string())
                                .unwrap_or_else(|| "-".into())
                        );
                    }
                }
                Err(e) => eprintln!("Assistant run failed, nothing was saved: {e}"),
            }
        }
        Commands::ApplyOrders {
            encounter_id,
            suggestion_ids,
        } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            let selected: HashSet<Uuid> = suggestion_ids.into_iter().collect();
            let orders = ws.apply_order_suggestions(&selected).await?;
            if orders.is_empty() {
                println!("No order suggestions applied.");
            } else {
                for order in orders {
                    println!(
                        "Placed order {} [{}] {}",
                        order.id,
                        order.code.as_deref().unwrap_or("-"),
                        order.name
                    );
                }
            }
        }
        Commands::Events { encounter_id } => {
            let mut ws = Workspace::new(&cfg)?;
            ws.open_encounter(encounter_id).await?;
            for event in ws.events().await? {
                println!(
                    "{} {:?} by {:?}{}",
                    event.created_at.to_rfc3339(),
                    event.event,
                    event.actor,
                    event
                        .payload
                        .as_ref()
                        .and_then(|p| serde_json::to_string(p).ok())
                        .map(|p| format!(" {p}"))
                        .unwrap_or_default()
                );
            }
        }
        Commands::DraftNote {
            kind,
            title,
            content,
        } => {
            let pad = scratchpad(&cfg);
            let mut notes = pad.load_notes();
            notes.push(edw_core::DraftNote {
                kind,
                title,
                content,
            });
            pad.save_notes(&notes)?;
            println!("Saved draft note ({} total).", notes.len());
        }
        Commands::DraftOrder { text } => {
            let pad = scratchpad(&cfg);
            let mut orders = pad.load_orders();
            orders.push(edw_core::DraftOrder { text });
            pad.save_orders(&orders)?;
            println!("Saved draft order ({} total).", orders.len());
        }
        Commands::Drafts => {
            let pad = scratchpad(&cfg);
            let notes = pad.load_notes();
            let orders = pad.load_orders();
            println!("Draft notes:");
            for note in &notes {
                println!("  [{}] {}: {}", note.kind, note.title, note.content);
            }
            println!("Draft orders:");
            for order in &orders {
                println!("  {}", order.text);
            }
            if notes.is_empty() && orders.is_empty() {
                println!("  (scratchpad is empty)");
            }
        }
    }

    Ok(())
}

fn print_workspace(ws: &Workspace) {
    let state = ws.state();
    let Some(encounter) = &state.encounter else {
        println!("No encounter selected.");
        return;
    };

    println!(
        "Encounter {} at {} ({})",
        encounter.id, encounter.location, encounter.status
    );

    println!("Notes ({}):", state.data.notes.len());
    for note in &state.data.notes {
        println!("  {} [{}] {}", note.id, note.kind, note.title);
    }

    println!("Orders ({}):", state.data.orders.len());
    for order in &state.data.orders {
        println!(
            "  {} [{}] {} ({})",
            order.id,
            order.code.as_deref().unwrap_or("-"),
            order.name,
            order.status
        );
    }

    println!("Results ({}):", state.data.observations.len());
    for obs in &state.data.observations {
        println!(
            "  {} {}: {} {}{}",
            obs.category,
            obs.name,
            obs.value,
            obs.unit.as_deref().unwrap_or(""),
            obs.flag
                .as_deref()
                .map(|f| format!(" [{f}]"))
                .unwrap_or_default()
        );
    }

    println!("Differential ({}):", state.data.ddx.len());
    for entry in &state.data.ddx {
        println!(
            "  {:?} {} (p={})",
            entry.source,
            entry.name,
            entry
                .probability
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".into())
        );
    }

    match &state.latest_ai {
        Some(outcome) => {
            println!(
                "Latest AI run {} ({} suggestions)",
                outcome.run.id,
                outcome.suggestions.len()
            );
            for suggestion in &outcome.suggestions {
                println!(
                    "  {} [{:?}] {}",
                    suggestion.id, suggestion.kind, suggestion.name
                );
            }
        }
        None => println!("No AI runs yet."),
    }
}

fn scratchpad(cfg: &CoreConfig) -> Scratchpad {
    match cfg.scratchpad_dir() {
        Some(dir) => Scratchpad::new(dir),
        None => Scratchpad::new(".edw-scratchpad"),
    }
}

fn config_from_env() -> Result<CoreConfig, Box<dyn std::error::Error>> {
    let store_url =
        std::env::var("EDW_STORE_URL").unwrap_or_else(|_| "http://localhost:8000".into());
    let store_api_key = std::env::var("EDW_STORE_API_KEY").unwrap_or_default();
    let ai_url =
        std::env::var("EDW_AI_URL").unwrap_or_else(|_| "http://localhost:9000/assess".into());
    let ai_provider = std::env::var("EDW_AI_PROVIDER").unwrap_or_else(|_| "hosted-ai".into());
    let ai_model = std::env::var("EDW_AI_MODEL").unwrap_or_else(|_| "triage-1".into());
    let scratchpad_dir = std::env::var("EDW_SCRATCHPAD_DIR").ok().map(PathBuf::from);

    Ok(CoreConfig::new(
        store_url,
        store_api_key,
        ai_url,
        ai_provider,
        ai_model,
        scratchpad_dir,
    )?)
}
