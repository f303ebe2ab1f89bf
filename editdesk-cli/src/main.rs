use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Report, Result, WrapErr, bail, eyre};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use editdesk::{
    AutoConfirm, BackupOutcome, Collaborators, ConfigSaveOutcome, ConfigSession, ConfirmGate,
    DeleteOutcome, DocumentFormat, DocumentSession, EntryChange, EntryKey, EntryList, FileStore,
    Layout, ModalOutcome, NEW_DOCUMENT, OutputDestination, OutputOptions, ScriptedModal,
    SessionOptions, TabRegistry, emit, fields, parse_document_str,
};

const DEFAULT_STORE_DIR: &str = ".editdesk";
const IMAGE_PROFILES_FIELD: &str = "lstProfiles";

#[derive(Debug, Parser)]
#[command(
    name = "editdesk",
    version,
    about = "Edit layouts and application settings stored in a document directory"
)]
struct Cli {
    /// Directory holding the documents, the configuration and backups
    #[arg(long = "store", value_name = "DIR", default_value = DEFAULT_STORE_DIR)]
    store: PathBuf,

    /// Storage format of the document directory (json, yaml, toml)
    #[arg(long = "format", value_name = "FORMAT", default_value = "json")]
    format: String,

    /// Session options file (JSON/YAML/TOML)
    #[arg(long = "options", value_name = "PATH")]
    options: Option<PathBuf>,

    /// Answer every confirmation prompt with yes
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Output destinations for printed documents ("-" writes to stdout)
    #[arg(short = 'o', long = "output", value_name = "DEST", num_args = 1.., action = ArgAction::Append)]
    outputs: Vec<String>,

    /// Emit compact JSON/TOML rather than pretty formatting
    #[arg(long = "no-pretty")]
    no_pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create, inspect and edit layouts
    #[command(subcommand)]
    Layout(LayoutCommand),
    /// Inspect and edit the application settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Subcommand)]
enum LayoutCommand {
    /// Print a stored layout
    Show { id: String },
    /// Create and save a new layout
    New(NewLayout),
    /// Append a custom field (ENTRY: file path, inline payload, or "-" for stdin)
    AddField { id: String, entry: String },
    /// Replace the custom field at a 1-based position
    EditField {
        id: String,
        position: usize,
        entry: String,
    },
    /// Remove the custom field at a 1-based position
    RemoveField { id: String, position: usize },
    /// Move a custom field from one 1-based position to another
    MoveField { id: String, from: usize, to: usize },
    /// Delete a layout
    Delete { id: String },
}

#[derive(Debug, Args)]
struct NewLayout {
    /// Unique key of the layout
    #[arg(long = "key", value_name = "KEY")]
    key: Option<String>,

    #[arg(long = "title", value_name = "TEXT")]
    title: Option<String>,

    /// Custom field to append; repeat for several fields
    #[arg(long = "field", value_name = "ENTRY", action = ArgAction::Append)]
    fields: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Print the configuration and the image profiles
    Show,
    /// Append an entry to a list field (buckets, cfdists, pugGlobalScripts, bookmarks, feeds,
    /// variables, categories or lstProfiles)
    Add { field: String, entry: String },
    /// Remove the entry at a 1-based position of a list field
    Remove { field: String, position: usize },
    /// Append a category name
    AddCategory { name: String },
    /// Flag that the running application must be restarted, then save
    RestartRequired,
    /// Back up the store into a target folder
    Backup { target: String },
}

/// Where an entry argument is read from: `-` is stdin, an existing file is read with
/// the format its extension names, anything else is inline text.
#[derive(Debug, PartialEq)]
enum EntrySource {
    Stdin,
    File(PathBuf),
    Inline(String),
}

impl EntrySource {
    fn classify(raw: &str) -> Self {
        if raw == "-" {
            EntrySource::Stdin
        } else if Path::new(raw).is_file() {
            EntrySource::File(PathBuf::from(raw))
        } else {
            EntrySource::Inline(raw.to_string())
        }
    }

    fn read(self, store_format: DocumentFormat) -> Result<Value> {
        let (contents, format, origin) = match self {
            EntrySource::Stdin => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .wrap_err("failed to read entry from stdin")?;
                (buffer, store_format, "stdin".to_string())
            }
            EntrySource::File(path) => {
                let contents = fs::read_to_string(&path)
                    .wrap_err_with(|| format!("failed to read entry file {}", path.display()))?;
                let format = DocumentFormat::from_path(&path).unwrap_or(store_format);
                (contents, format, path.display().to_string())
            }
            EntrySource::Inline(text) => (text, store_format, "the command line".to_string()),
        };
        parse_entry(&contents, format)
            .wrap_err_with(|| format!("could not parse entry from {origin}"))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let cli = Cli::parse();

    let app = App::new(&cli)?;
    let result = app.run(cli.command).await;
    app.flush_notices();
    result
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("EDITDESK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

struct App {
    store: Arc<FileStore>,
    format: DocumentFormat,
    tabs: Arc<TabRegistry>,
    confirm: Arc<dyn ConfirmGate>,
    options: SessionOptions,
    output: OutputOptions,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let format = parse_format(&cli.format)?;
        let options = match cli.options.as_ref() {
            Some(path) => SessionOptions::load_from_path(path).map_err(chain_report)?,
            None => SessionOptions::default(),
        };
        let confirm: Arc<dyn ConfirmGate> = if cli.yes {
            Arc::new(AutoConfirm(true))
        } else {
            Arc::new(prompt_on_stdin)
        };
        tracing::debug!(store = %cli.store.display(), ?format, "opening document store");
        Ok(Self {
            store: Arc::new(FileStore::new(&cli.store).with_format(format)),
            format,
            tabs: Arc::new(TabRegistry::new()),
            confirm,
            options,
            output: build_output_options(cli, format)?,
        })
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Layout(command) => self.run_layout(command).await,
            Command::Settings(command) => self.run_settings(command).await,
        }
    }

    async fn run_layout(&self, command: LayoutCommand) -> Result<()> {
        match command {
            LayoutCommand::Show { id } => {
                let session = self.open_layout(&id, Vec::new()).await?;
                self.print(serde_json::to_value(session.document())?)
            }
            LayoutCommand::New(args) => {
                let mut answers = Vec::new();
                for raw in &args.fields {
                    answers.push(ModalOutcome::add(self.load_entry(raw)?));
                }
                let field_count = answers.len();
                let mut session = self.open_layout(NEW_DOCUMENT, answers).await?;
                session.modify(|layout| {
                    layout.okey = args.key.clone();
                    layout.title = args.title.clone().unwrap_or_default();
                })?;
                if let Some(mut ctx) = session.edit() {
                    let mutator = fields::layout_fields();
                    for _ in 0..field_count {
                        mutator.add(&mut ctx).await;
                    }
                }
                self.save_layout(session).await
            }
            LayoutCommand::AddField { id, entry } => {
                let payload = self.load_entry(&entry)?;
                let mut session = self
                    .open_layout(&id, vec![ModalOutcome::add(payload)])
                    .await?;
                let change = match session.edit() {
                    Some(mut ctx) => fields::layout_fields().add(&mut ctx).await,
                    None => EntryChange::Unchanged,
                };
                self.save_layout_if_changed(session, &change).await
            }
            LayoutCommand::EditField {
                id,
                position,
                entry,
            } => {
                let payload = self.load_entry(&entry)?;
                let mut session = self
                    .open_layout(&id, vec![ModalOutcome::update(payload)])
                    .await?;
                let key = layout_key(&session, position)?;
                let change = match session.edit() {
                    Some(mut ctx) => fields::layout_fields().edit(&mut ctx, key).await,
                    None => EntryChange::Unchanged,
                };
                self.save_layout_if_changed(session, &change).await
            }
            LayoutCommand::RemoveField { id, position } => {
                let mut session = self.open_layout(&id, Vec::new()).await?;
                let key = layout_key(&session, position)?;
                let change = match session.edit() {
                    Some(mut ctx) => fields::layout_fields().remove(&mut ctx, key),
                    None => EntryChange::Unchanged,
                };
                self.save_layout_if_changed(session, &change).await
            }
            LayoutCommand::MoveField { id, from, to } => {
                let mut session = self.open_layout(&id, Vec::new()).await?;
                let from = to_index(from)?;
                let to = to_index(to)?;
                let change = match session.edit() {
                    Some(mut ctx) => fields::layout_fields().reorder(&mut ctx, from, to),
                    None => EntryChange::Unchanged,
                };
                self.save_layout_if_changed(session, &change).await
            }
            LayoutCommand::Delete { id } => {
                let mut session = self.open_layout(&id, Vec::new()).await?;
                match session.delete().await? {
                    DeleteOutcome::Deleted | DeleteOutcome::Discarded => Ok(()),
                    DeleteOutcome::Declined => {
                        eprintln!("delete cancelled");
                        Ok(())
                    }
                    DeleteOutcome::Failed => bail!("layout {id} was not deleted"),
                }
            }
        }
    }

    async fn run_settings(&self, command: SettingsCommand) -> Result<()> {
        match command {
            SettingsCommand::Show => {
                let session = self.open_settings(Vec::new()).await?;
                self.print(serde_json::json!({
                    "config": session.config(),
                    "imageprofiles": session.image_profiles(),
                }))
            }
            SettingsCommand::Add { field, entry } => {
                let payload = self.load_entry(&entry)?;
                let mut session = self.open_settings(vec![ModalOutcome::add(payload)]).await?;
                let change = if field == IMAGE_PROFILES_FIELD {
                    let mut ctx = session
                        .edit_image_profiles()
                        .ok_or_else(|| eyre!("image profiles are not loaded"))?;
                    fields::image_profiles().add(&mut ctx).await
                } else {
                    let mutator = config_mutator(&field)?;
                    let mut ctx = session
                        .edit_config()
                        .ok_or_else(|| eyre!("configuration is not loaded"))?;
                    mutator.add(&mut ctx).await
                };
                self.save_settings_if_changed(session, &change).await
            }
            SettingsCommand::Remove { field, position } => {
                let mut session = self.open_settings(Vec::new()).await?;
                let change = if field == IMAGE_PROFILES_FIELD {
                    let mut ctx = session
                        .edit_image_profiles()
                        .ok_or_else(|| eyre!("image profiles are not loaded"))?;
                    let mutator = fields::image_profiles();
                    let key = key_at(mutator.entries(ctx.document()), position)?;
                    mutator.remove(&mut ctx, key)
                } else {
                    let mutator = config_mutator(&field)?;
                    let mut ctx = session
                        .edit_config()
                        .ok_or_else(|| eyre!("configuration is not loaded"))?;
                    let key = key_at(mutator.entries(ctx.document()), position)?;
                    mutator.remove(&mut ctx, key)
                };
                self.save_settings_if_changed(session, &change).await
            }
            SettingsCommand::AddCategory { name } => {
                let mut session = self.open_settings(Vec::new()).await?;
                let change = {
                    let mut ctx = session
                        .edit_config()
                        .ok_or_else(|| eyre!("configuration is not loaded"))?;
                    fields::categories().push_value(&mut ctx, Value::String(name))
                };
                self.save_settings_if_changed(session, &change).await
            }
            SettingsCommand::RestartRequired => {
                let mut session = self.open_settings(Vec::new()).await?;
                session.set_restart_required();
                let outcome = session.save().await?;
                report_restart(&outcome);
                Ok(())
            }
            SettingsCommand::Backup { target } => {
                let mut session = self.open_settings(Vec::new()).await?;
                let outcome = session.create_backup(Some(&target)).await;
                for line in session.backup_log() {
                    println!("{line}");
                }
                match outcome? {
                    BackupOutcome::Succeeded => Ok(()),
                    BackupOutcome::Declined => {
                        eprintln!("backup cancelled");
                        Ok(())
                    }
                    BackupOutcome::Refused => bail!("backup to {target} was refused"),
                }
            }
        }
    }

    fn collaborators(&self, answers: Vec<ModalOutcome>) -> Collaborators {
        Collaborators::new(
            self.tabs.clone(),
            Arc::new(ScriptedModal::new(answers)),
            self.confirm.clone(),
        )
    }

    async fn open_layout(
        &self,
        id: &str,
        answers: Vec<ModalOutcome>,
    ) -> Result<DocumentSession<Layout>> {
        let tab = self.options.layout.tab_for(id);
        self.tabs.open(tab.clone(), "Loading")?;
        let mut session = DocumentSession::new(
            id,
            tab,
            self.store.clone(),
            self.collaborators(answers),
            self.options.clone(),
        )?;
        session.initialize().await?;
        if session.document().is_none() {
            bail!("layout {id} not found in {}", self.store.root().display());
        }
        Ok(session)
    }

    async fn open_settings(&self, answers: Vec<ModalOutcome>) -> Result<ConfigSession> {
        let tab = self.options.settings.tab_id();
        self.tabs.open(tab, "Settings")?;
        let mut session = ConfigSession::new(
            self.store.clone(),
            self.collaborators(answers),
            self.options.clone(),
        );
        session.load().await?;
        Ok(session)
    }

    async fn save_layout_if_changed(
        &self,
        session: DocumentSession<Layout>,
        change: &EntryChange,
    ) -> Result<()> {
        if !change.is_change() {
            eprintln!("nothing changed");
            return Ok(());
        }
        self.save_layout(session).await
    }

    async fn save_layout(&self, mut session: DocumentSession<Layout>) -> Result<()> {
        let outcome = session.save().await?;
        if outcome.identity_changed {
            eprintln!("created layout {}", session.document_id());
        }
        self.print(serde_json::to_value(session.document())?)
    }

    async fn save_settings_if_changed(
        &self,
        mut session: ConfigSession,
        change: &EntryChange,
    ) -> Result<()> {
        if !change.is_change() {
            eprintln!("nothing changed");
            return Ok(());
        }
        let outcome = session.save().await?;
        report_restart(&outcome);
        Ok(())
    }

    fn load_entry(&self, raw: &str) -> Result<Value> {
        EntrySource::classify(raw).read(self.format)
    }

    fn print(&self, value: Value) -> Result<()> {
        emit(&value, &self.output).map_err(chain_report)
    }

    fn flush_notices(&self) {
        for notice in self.tabs.drain_notifications() {
            eprintln!("{notice}");
        }
    }
}

fn config_mutator(field: &str) -> Result<editdesk::CollectionMutator<editdesk::AppConfig>> {
    fields::config_field(field).ok_or_else(|| {
        eyre!(
            "unknown settings field '{field}'; expected one of {}, {IMAGE_PROFILES_FIELD}",
            fields::CONFIG_FIELDS.join(", ")
        )
    })
}

fn layout_key(session: &DocumentSession<Layout>, position: usize) -> Result<EntryKey> {
    let document = session
        .document()
        .ok_or_else(|| eyre!("no layout is loaded"))?;
    key_at(&document.cust_fields, position)
}

fn key_at(list: &EntryList, position: usize) -> Result<EntryKey> {
    let index = to_index(position)?;
    list.keys()
        .get(index)
        .copied()
        .ok_or_else(|| {
            eyre!(
                "position {position} is out of range (list has {} entries)",
                list.len()
            )
        })
}

fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| eyre!("positions start at 1"))
}

fn report_restart(outcome: &ConfigSaveOutcome) {
    if outcome.restart_requested {
        eprintln!("restart requested");
    } else if outcome.restart_recommended {
        eprintln!("restart recommended but declined");
    }
}

fn prompt_on_stdin(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes" | "Yes")
}

fn parse_format(raw: &str) -> Result<DocumentFormat> {
    let normalized = raw.trim().to_ascii_lowercase();
    let normalized = if normalized == "yml" {
        "yaml".to_string()
    } else {
        normalized
    };
    DocumentFormat::available_formats()
        .into_iter()
        .find(|format| format.extension() == normalized)
        .ok_or_else(|| {
            eyre!(
                "unsupported format '{raw}'; this build supports {}",
                format_list()
            )
        })
}

fn build_output_options(cli: &Cli, store_format: DocumentFormat) -> Result<OutputOptions> {
    let mut destinations = Vec::new();
    let mut file_format = None;
    for raw in &cli.outputs {
        if raw.trim().is_empty() {
            bail!("output destination cannot be empty");
        }
        if raw == "-" {
            destinations.push(OutputDestination::Stdout);
            continue;
        }
        let path = PathBuf::from(raw);
        let Some(format) = DocumentFormat::from_path(&path) else {
            bail!(
                "cannot infer format from output file {}; use one of {}",
                path.display(),
                format_list()
            );
        };
        if let Some(existing) = file_format
            && existing != format
        {
            bail!(
                "output file {} uses {format} but other destinations use {existing}; align extensions",
                path.display()
            );
        }
        file_format = Some(format);
        destinations.push(OutputDestination::File(path));
    }
    if destinations.is_empty() {
        destinations.push(OutputDestination::Stdout);
    }
    Ok(OutputOptions::new(file_format.unwrap_or(store_format))
        .with_pretty(!cli.no_pretty)
        .with_destinations(destinations))
}

/// Entries are usually JSON even against a YAML or TOML store, so every compiled-in
/// format is tried after the preferred one.
fn parse_entry(contents: &str, preferred: DocumentFormat) -> Result<Value> {
    let first_error = match parse_document_str(contents, preferred) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    DocumentFormat::available_formats()
        .into_iter()
        .filter(|format| *format != preferred)
        .find_map(|format| parse_document_str(contents, format).ok())
        .ok_or_else(|| eyre!("tried {} ({first_error:#})", format_list()))
}

fn format_list() -> String {
    let items: Vec<String> = DocumentFormat::available_formats()
        .into_iter()
        .map(|fmt| fmt.to_string())
        .collect();
    items.join(", ")
}

/// Library errors keep their context chain when rendered with `{:#}`.
fn chain_report(err: impl std::fmt::Display) -> Report {
    eyre!("{err:#}")
}
