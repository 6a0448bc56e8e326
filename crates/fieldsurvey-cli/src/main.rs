//! fieldsurvey CLI - last-mile delivery survey recorder
//!
//! Command-line interface for recording survey forms and exporting them to
//! Excel workbooks.

mod store_file;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use fieldsurvey_core::{
    EntryDraft, EntryPatch, Form, FormPatch, FormStore, NewForm, Observation,
};
use fieldsurvey_export::XlsxExporter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use store_file::JsonFileStore;

#[derive(Parser)]
#[command(name = "fieldsurvey")]
#[command(author, version, about = "Last-mile delivery survey recorder", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Store file holding all forms
    #[arg(
        long,
        global = true,
        env = "FIELDSURVEY_STORE",
        default_value = "fieldsurvey.json"
    )]
    store: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list, show, update or delete forms
    Form {
        #[command(subcommand)]
        command: FormCommand,
    },

    /// Add, update or delete entries of a form
    Entry {
        #[command(subcommand)]
        command: EntryCommand,
    },

    /// Write a form to `<name>_<branch>_<date>_<courier>.xlsx`
    Export {
        /// Form ID
        id: String,

        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Export form JSON and print `{success, data?, error?}` with base64 data
    ExportSerialized {
        /// Form JSON file (stdin if not specified)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum FormCommand {
    /// Create an empty form
    Create(FormFields),

    /// List all forms
    List,

    /// Print a form as JSON
    Show { id: String },

    /// Change form metadata
    Update {
        id: String,

        #[command(flatten)]
        fields: FormFieldUpdates,
    },

    /// Delete a form and its entries
    Delete { id: String },
}

#[derive(Args)]
struct FormFields {
    /// Form name, used as the export filename prefix
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long)]
    city: String,
    /// Survey date, e.g. 2024-05-20
    #[arg(long)]
    date: String,
    /// Branch code
    #[arg(long)]
    branch: String,
    /// Area type (industrial, residential, ...)
    #[arg(long)]
    area: String,
    /// Courier employee code
    #[arg(long)]
    courier: String,
}

#[derive(Args)]
struct FormFieldUpdates {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    branch: Option<String>,
    #[arg(long)]
    area: Option<String>,
    #[arg(long)]
    courier: Option<String>,
}

#[derive(Subcommand)]
enum EntryCommand {
    /// Append an entry to a form
    Add {
        /// Form ID
        form: String,

        /// Last four characters of the tracking number
        #[arg(long, value_parser = parse_tracking)]
        tracking: String,

        #[command(flatten)]
        observations: ObservationFlags,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Change fields of an entry
    Update {
        /// Form ID
        form: String,
        /// Entry ID
        entry: String,

        #[arg(long, value_parser = parse_tracking)]
        tracking: Option<String>,

        #[command(flatten)]
        observations: ObservationUpdates,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Form ID
        form: String,
        /// Entry ID
        entry: String,
    },
}

/// Observations answered "yes"; absent flags mean "no"
#[derive(Args)]
struct ObservationFlags {
    /// Delivered to the order address
    #[arg(long)]
    address_delivered: bool,
    /// Delivered to a third party (locker, shop, pickup point)
    #[arg(long)]
    third_party: bool,
    /// Met the customer in person
    #[arg(long)]
    customer_interaction: bool,
    /// Customer handed over a package to send
    #[arg(long)]
    customer_sending: bool,
    /// Customer interaction on a phone-requested return
    #[arg(long)]
    customer_return: bool,
}

impl ObservationFlags {
    fn pairs(&self) -> [(Observation, bool); 5] {
        [
            (Observation::AddressDelivered, self.address_delivered),
            (Observation::ThirdPartyDelivery, self.third_party),
            (Observation::CustomerInteraction, self.customer_interaction),
            (Observation::CustomerInteractionSending, self.customer_sending),
            (Observation::CustomerInteractionReturn, self.customer_return),
        ]
    }
}

#[derive(Args)]
struct ObservationUpdates {
    #[arg(long, value_name = "BOOL")]
    address_delivered: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    third_party: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    customer_interaction: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    customer_sending: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    customer_return: Option<bool>,
}

impl ObservationUpdates {
    fn changes(&self) -> Vec<(Observation, bool)> {
        [
            (Observation::AddressDelivered, self.address_delivered),
            (Observation::ThirdPartyDelivery, self.third_party),
            (Observation::CustomerInteraction, self.customer_interaction),
            (Observation::CustomerInteractionSending, self.customer_sending),
            (Observation::CustomerInteractionReturn, self.customer_return),
        ]
        .into_iter()
        .filter_map(|(observation, value)| value.map(|v| (observation, v)))
        .collect()
    }
}

/// Exactly four ASCII letters or digits
fn parse_tracking(value: &str) -> Result<String, String> {
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "expected the last 4 letters or digits of the tracking number, got {value:?}"
        ))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match cli.command {
        Some(Commands::Form { command }) => run_form(&cli.store, command),
        Some(Commands::Entry { command }) => run_entry(&cli.store, command),
        Some(Commands::Export { id, out_dir }) => cmd_export(&cli.store, &id, &out_dir),
        Some(Commands::ExportSerialized { file }) => cmd_export_serialized(file),
        None => {
            println!("fieldsurvey - Last-mile delivery survey recorder");
            println!("Run with --help for usage information");
            Ok(())
        }
    }
}

fn open_store(path: &Path) -> Result<JsonFileStore> {
    JsonFileStore::open(path).with_context(|| format!("Failed to open store {}", path.display()))
}

fn save_store(store: &JsonFileStore) -> Result<()> {
    store
        .save()
        .with_context(|| format!("Failed to save store {}", store.path().display()))
}

fn run_form(path: &Path, command: FormCommand) -> Result<()> {
    let mut store = open_store(path)?;
    match command {
        FormCommand::Create(fields) => {
            let form = store.forms.create_form(NewForm {
                name: fields.name,
                city_name: fields.city,
                survey_date: fields.date,
                branch_code: fields.branch,
                area_type: fields.area,
                courier_code: fields.courier,
            });
            save_store(&store)?;
            tracing::info!(id = %form.metadata.id, "form created");
            println!("Created form: {}", form.metadata.id);
        }
        FormCommand::List => {
            let forms = store.forms.list_forms();
            if forms.is_empty() {
                println!("No forms");
            }
            for form in forms {
                println!("{}", summary_line(&form));
            }
        }
        FormCommand::Show { id } => {
            let form = store
                .forms
                .get_form(&id)
                .with_context(|| format!("Form not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&form)?);
        }
        FormCommand::Update { id, fields } => {
            let patch = FormPatch {
                name: fields.name,
                city_name: fields.city,
                survey_date: fields.date,
                branch_code: fields.branch,
                area_type: fields.area,
                courier_code: fields.courier,
            };
            if patch.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            let form = store.forms.update_form_metadata(&id, patch)?;
            save_store(&store)?;
            println!("Updated form: {}", form.metadata.id);
        }
        FormCommand::Delete { id } => {
            store.forms.delete_form(&id)?;
            save_store(&store)?;
            println!("Deleted form: {id}");
        }
    }
    Ok(())
}

fn run_entry(path: &Path, command: EntryCommand) -> Result<()> {
    let mut store = open_store(path)?;
    match command {
        EntryCommand::Add {
            form,
            tracking,
            observations,
            notes,
        } => {
            let draft = observations
                .pairs()
                .into_iter()
                .fold(EntryDraft::new(tracking), |draft, (o, v)| draft.observe(o, v))
                .notes(notes);
            let entry = store.forms.add_entry(&form, draft)?;
            save_store(&store)?;
            println!("Added entry: {}", entry.id);
        }
        EntryCommand::Update {
            form,
            entry,
            tracking,
            observations,
            notes,
        } => {
            let patch = EntryPatch {
                tracking_number_last_four: tracking,
                observations: observations.changes(),
                notes,
            };
            if patch.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            let entry = store.forms.update_entry(&form, &entry, patch)?;
            save_store(&store)?;
            println!("Updated entry: {}", entry.id);
        }
        EntryCommand::Delete { form, entry } => {
            store.forms.delete_entry(&form, &entry)?;
            save_store(&store)?;
            println!("Deleted entry: {entry}");
        }
    }
    Ok(())
}

fn cmd_export(path: &Path, id: &str, out_dir: &Path) -> Result<()> {
    let store = open_store(path)?;
    let form = store
        .forms
        .get_form(id)
        .with_context(|| format!("Form not found: {id}"))?;
    if form.is_empty() {
        tracing::warn!(id, "exporting a form with no entries");
    }

    let document = XlsxExporter::new()
        .export_document(&form)
        .with_context(|| format!("Failed to export form {id}"))?;
    let written = document
        .write_to_dir(out_dir)
        .with_context(|| format!("Failed to write into {}", out_dir.display()))?;
    println!("Exported: {}", written.display());
    Ok(())
}

fn cmd_export_serialized(file: Option<PathBuf>) -> Result<()> {
    let input = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    let response = XlsxExporter::new().export_serialized(&input);
    println!("{}", serde_json::to_string(&response)?);
    if !response.success {
        bail!("Export failed: {}", response.error.unwrap_or_default());
    }
    Ok(())
}

fn summary_line(form: &Form) -> String {
    let meta = &form.metadata;
    let name = if meta.name.is_empty() { "-" } else { meta.name.as_str() };
    format!(
        "{}\t{}\t{}\t{}\t{}\t{} entries",
        meta.id,
        name,
        meta.survey_date,
        meta.branch_code,
        meta.courier_code,
        form.entries.len()
    )
}
