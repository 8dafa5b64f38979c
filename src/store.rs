//! Entity client contract and an in-memory implementation.
//!
//! Records are JSON objects keyed by a string `"id"`. Every operation is a
//! single attempt: failures go straight back to the caller, which decides
//! what to tell the user. There is no retry and no backoff.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{LaudoError, Result};
use crate::model::{Report, ReportKind};

/// The persisted entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Empreendimento,
    FormularioVistoria,
    KoUnidade,
    RegistroUnidade,
    InspecaoCftv,
    InspecaoHidrantes,
    InspecaoSdai,
    InspecaoSprinklers,
    InspecaoControleAcesso,
    InspecaoArCondicionado,
    AprovacaoAmostra,
    VistoriaTerminalidade,
    DisciplinaGeral,
    User,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Empreendimento => "Empreendimento",
            EntityKind::FormularioVistoria => "FormularioVistoria",
            EntityKind::KoUnidade => "KO_unidade",
            EntityKind::RegistroUnidade => "RegistroUnidade",
            EntityKind::InspecaoCftv => "InspecaoCFTV",
            EntityKind::InspecaoHidrantes => "InspecaoHidrantes",
            EntityKind::InspecaoSdai => "InspecaoSDAI",
            EntityKind::InspecaoSprinklers => "InspecaoSprinklers",
            EntityKind::InspecaoControleAcesso => "InspecaoControleAcesso",
            EntityKind::InspecaoArCondicionado => "InspecaoArCondicionado",
            EntityKind::AprovacaoAmostra => "AprovacaoAmostra",
            EntityKind::VistoriaTerminalidade => "VistoriaTerminalidade",
            EntityKind::DisciplinaGeral => "DisciplinaGeral",
            EntityKind::User => "User",
        }
    }

    /// The inspection entity whose records a report viewer renders.
    pub fn for_report(kind: ReportKind) -> Option<EntityKind> {
        match kind {
            ReportKind::Cftv => Some(EntityKind::InspecaoCftv),
            ReportKind::Sprinklers => Some(EntityKind::InspecaoSprinklers),
            ReportKind::Hidrantes => Some(EntityKind::InspecaoHidrantes),
            ReportKind::ControleAcesso => Some(EntityKind::InspecaoControleAcesso),
            ReportKind::Sdai => Some(EntityKind::InspecaoSdai),
            ReportKind::ArCondicionado => Some(EntityKind::InspecaoArCondicionado),
            ReportKind::Generic => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CRUD access to one entity collection.
pub trait EntityClient {
    fn kind(&self) -> EntityKind;

    /// All records sorted by `sort_key` (`"field"` ascending, `"-field"`
    /// descending), truncated to `limit`.
    fn list(&self, sort_key: Option<&str>, limit: Option<usize>) -> Result<Vec<Value>>;

    fn get(&self, id: &str) -> Result<Value>;

    /// Store a new record. An id is assigned when `data` has none.
    fn create(&self, data: Value) -> Result<Value>;

    /// Merge the top-level fields of `data` into the record.
    fn update(&self, id: &str, data: Value) -> Result<Value>;

    fn delete(&self, id: &str) -> Result<()>;
}

/// Single-threaded in-memory collection.
#[derive(Debug)]
pub struct MemoryEntityClient {
    kind: EntityKind,
    records: RefCell<Vec<Map<String, Value>>>,
    next_id: Cell<u64>,
}

impl MemoryEntityClient {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            records: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Load a collection from a JSON array of record objects.
    pub fn from_json_array(kind: EntityKind, json: &str) -> Result<Self> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        let client = Self::new(kind);
        for value in values {
            client.create(value)?;
        }
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    fn not_found(&self, id: &str) -> LaudoError {
        LaudoError::NotFound {
            entity: self.kind.name().to_string(),
            id: id.to_string(),
        }
    }

    fn generate_id(&self) -> String {
        let records = self.records.borrow();
        loop {
            let n = self.next_id.get();
            self.next_id.set(n + 1);
            let id = format!("{}-{}", self.kind.name().to_ascii_lowercase(), n);
            if !records.iter().any(|r| record_id(r) == Some(id.as_str())) {
                return id;
            }
        }
    }
}

fn record_id(record: &Map<String, Value>) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn into_object(data: Value) -> Result<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(LaudoError::Store(format!(
            "records must be JSON objects, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Order two field values. Missing sorts before present; numbers compare
/// numerically, everything else by its string form.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

impl EntityClient for MemoryEntityClient {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn list(&self, sort_key: Option<&str>, limit: Option<usize>) -> Result<Vec<Value>> {
        let mut records = self.records.borrow().clone();

        if let Some(key) = sort_key.filter(|k| !k.is_empty()) {
            let (field, descending) = match key.strip_prefix('-') {
                Some(field) => (field, true),
                None => (key, false),
            };
            // Stable: records with equal keys keep insertion order.
            records.sort_by(|a, b| {
                let ord = compare_fields(a.get(field), b.get(field));
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = limit {
            records.truncate(limit);
        }

        Ok(records.into_iter().map(Value::Object).collect())
    }

    fn get(&self, id: &str) -> Result<Value> {
        self.records
            .borrow()
            .iter()
            .find(|r| record_id(r) == Some(id))
            .cloned()
            .map(Value::Object)
            .ok_or_else(|| self.not_found(id))
    }

    fn create(&self, data: Value) -> Result<Value> {
        let mut record = into_object(data)?;
        let id = match record.get("id") {
            None | Some(Value::Null) => self.generate_id(),
            Some(Value::String(id)) if !id.is_empty() => {
                if self.records.borrow().iter().any(|r| record_id(r) == Some(id.as_str())) {
                    return Err(LaudoError::Store(format!(
                        "{} record {} already exists",
                        self.kind, id
                    )));
                }
                id.clone()
            }
            Some(other) => {
                return Err(LaudoError::Store(format!(
                    "record id must be a non-empty string, got {}",
                    other
                )))
            }
        };
        record.insert("id".to_string(), Value::String(id.clone()));
        self.records.borrow_mut().push(record.clone());
        log::debug!("Created {} record {}", self.kind, id);
        Ok(Value::Object(record))
    }

    fn update(&self, id: &str, data: Value) -> Result<Value> {
        let changes = into_object(data)?;
        let mut records = self.records.borrow_mut();
        let record = records
            .iter_mut()
            .find(|r| record_id(r) == Some(id))
            .ok_or_else(|| self.not_found(id))?;
        for (key, value) in changes {
            if key != "id" {
                record.insert(key, value);
            }
        }
        Ok(Value::Object(record.clone()))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));
        if records.len() == before {
            return Err(self.not_found(id));
        }
        log::debug!("Deleted {} record {}", self.kind, id);
        Ok(())
    }
}

/// Fetch a report record by id. A missing record is terminal for the
/// viewer; there is no partial report.
pub fn load_report(client: &dyn EntityClient, id: &str, kind: ReportKind) -> Result<Report> {
    let record = client.get(id)?;
    let mut report: Report = serde_json::from_value(record)?;
    report.id = Some(id.to_string());
    if report.kind == ReportKind::Generic {
        report.kind = kind;
    }
    log::debug!(
        "Loaded {} record {} ({} section(s))",
        client.kind(),
        id,
        report.sections.len()
    );
    Ok(report)
}
