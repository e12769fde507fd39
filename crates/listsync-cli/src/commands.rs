use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;

use listsync_core::{OpenOutcome, SaveFlow, SyncOptions, SyncOrchestrator};
use listsync_model::{FieldValue, RecordId, RecordKind};
use listsync_schemas::{FieldKind, RecordSchema, SchemaCatalog};

use listsync_cli::notify::ConsoleNotifier;
use listsync_cli::store::JsonFileStore;

use crate::cli::{Cli, CreateArgs, EditArgs};
use crate::summary::{draft_table, kinds_table, print_records};

type Controller = SyncOrchestrator<JsonFileStore, ConsoleNotifier>;

/// Everything a command needs, resolved from global flags.
pub struct App {
    catalog: SchemaCatalog,
    store: Arc<JsonFileStore>,
    notifier: Arc<ConsoleNotifier>,
    options: SyncOptions,
}

impl App {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let catalog = SchemaCatalog::resolve(cli.schemas.as_deref()).context("load schemas")?;
        let options = match &cli.messages {
            Some(path) => load_messages(path)?,
            None => SyncOptions::default(),
        };
        debug!(
            kinds = catalog.len(),
            store = %cli.store.display(),
            "resolved configuration"
        );
        Ok(Self {
            catalog,
            store: Arc::new(JsonFileStore::new(&cli.store)),
            notifier: Arc::new(ConsoleNotifier::new()),
            options,
        })
    }

    /// True when any flow reported a warning or an error.
    pub fn failed(&self) -> bool {
        self.notifier.has_failures()
    }

    fn controller(&self, kind: &RecordKind) -> Result<Controller> {
        let schema = self.catalog.get(kind).cloned().with_context(|| {
            let known: Vec<&str> = self.catalog.kinds().map(RecordKind::as_str).collect();
            format!("unknown record kind `{kind}` (known: {})", known.join(", "))
        })?;
        Ok(SyncOrchestrator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            schema,
            self.options.clone(),
        ))
    }
}

fn load_messages(path: &Path) -> Result<SyncOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read messages file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parse messages file {}", path.display()))
}

pub fn run_kinds(app: &App) {
    println!("{}", kinds_table(&app.catalog));
}

pub async fn run_list(app: &App, kind: &RecordKind) -> Result<()> {
    let sync = app.controller(kind)?;
    sync.activate().await;
    print_records(sync.schema(), &sync.snapshot());
    Ok(())
}

pub async fn run_show(app: &App, kind: &RecordKind, id: RecordId) -> Result<()> {
    let sync = app.controller(kind)?;
    if sync.view_flow(id).await != OpenOutcome::Opened {
        return Ok(());
    }
    let editor = sync.editor();
    if let (Some(title), Some(draft)) = (editor.title(), editor.draft()) {
        println!("{title}");
        println!("{}", draft_table(sync.schema(), &draft));
    }
    editor.close();
    Ok(())
}

pub async fn run_create(app: &App, args: &CreateArgs) -> Result<()> {
    let sync = app.controller(&args.kind)?;
    if sync.create_flow().await != OpenOutcome::Opened {
        return Ok(());
    }
    apply_assignments(&sync, &args.set)?;
    report_save(&sync.save().await);
    Ok(())
}

pub async fn run_edit(app: &App, args: &EditArgs) -> Result<()> {
    let sync = app.controller(&args.kind)?;
    if !sync.activate().await.is_refreshed() {
        return Ok(());
    }
    let selected = sync.set_selection(args.select.iter().cloned());
    if selected.len() < args.select.len() {
        debug!(
            requested = args.select.len(),
            selected = selected.len(),
            "some ids are not in the list"
        );
    }
    if sync.edit_flow().await != OpenOutcome::Opened {
        return Ok(());
    }
    apply_assignments(&sync, &args.set)?;
    report_save(&sync.save().await);
    Ok(())
}

fn apply_assignments(sync: &Controller, assignments: &[(String, String)]) -> Result<()> {
    let schema = sync.schema();
    for (field, text) in assignments {
        let value = field_value(schema, field, text)?;
        sync.editor()
            .set_field(field, value)
            .with_context(|| format!("set {field}"))?;
    }
    Ok(())
}

/// Parse command-line text for a field; checkboxes take `true`/`false`.
fn field_value(schema: &RecordSchema, field: &str, text: &str) -> Result<FieldValue> {
    match schema.field(field).map(|spec| spec.kind) {
        Some(FieldKind::Checkbox) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(FieldValue::Flag(true)),
            "false" | "no" | "0" | "" => Ok(FieldValue::Flag(false)),
            other => bail!("{field} expects true or false, got `{other}`"),
        },
        _ => Ok(FieldValue::from(text)),
    }
}

fn report_save(flow: &SaveFlow) {
    if let SaveFlow::Saved { id, .. } = flow {
        println!("{id}");
    }
}
