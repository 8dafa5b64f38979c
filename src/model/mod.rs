//! # Report Model
//!
//! The input representation for the paginator. A report is a list of
//! sections (a floor, a system zone, an installation), each holding an
//! ordered list of inspection items. Items carry an OK/NA result, a
//! free-text observation and any number of photos. A section may end with
//! a general comment.
//!
//! Persisted records use Portuguese field names (`secoes`, `itens`,
//! `fotos`, `comentarios`...), so every field also accepts its record
//! alias. Defaults for missing fields are resolved here, once, at load
//! time. Nothing downstream has to deal with absent values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A complete inspection report ready for pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Record id, when the report was loaded from an entity store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Which viewer this report belongs to. Selects the default profile.
    #[serde(default, alias = "tipo")]
    pub kind: ReportKind,

    #[serde(default, alias = "titulo")]
    pub title: String,

    /// Name of the construction project (empreendimento).
    #[serde(
        default,
        alias = "empreendimento",
        skip_serializing_if = "Option::is_none"
    )]
    pub project: Option<String>,

    #[serde(default, alias = "secoes", alias = "locais")]
    pub sections: Vec<Section>,
}

impl Report {
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn photo_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .map(|i| i.photos.len())
            .sum()
    }
}

/// The report viewers that share the paginator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Cftv,
    Sprinklers,
    Hidrantes,
    ControleAcesso,
    Sdai,
    ArCondicionado,
    #[default]
    Generic,
}

impl ReportKind {
    pub const ALL: [ReportKind; 7] = [
        ReportKind::Cftv,
        ReportKind::Sprinklers,
        ReportKind::Hidrantes,
        ReportKind::ControleAcesso,
        ReportKind::Sdai,
        ReportKind::ArCondicionado,
        ReportKind::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Cftv => "cftv",
            ReportKind::Sprinklers => "sprinklers",
            ReportKind::Hidrantes => "hidrantes",
            ReportKind::ControleAcesso => "controle_acesso",
            ReportKind::Sdai => "sdai",
            ReportKind::ArCondicionado => "ar_condicionado",
            ReportKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = ReportKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown report kind '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// A named subdivision of the checklist (seção / local).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SectionRecord")]
pub struct Section {
    pub name: String,

    pub items: Vec<Item>,

    /// Section-level general comment. Blank text is treated as absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// A single checklist row (item de verificação).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ItemRecord")]
pub struct Item {
    pub description: String,

    pub status: CheckStatus,

    pub observation: String,

    pub photos: Vec<Photo>,
}

/// Result of an inspection item's checkbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    #[serde(alias = "OK", alias = "Ok")]
    Ok,
    #[serde(alias = "NA", alias = "Na", alias = "N/A", alias = "n/a")]
    Na,
    #[default]
    #[serde(alias = "")]
    Unchecked,
}

/// An attached photo. Records store either a bare URL or an object with
/// a caption; both deserialize into this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PhotoRepr")]
pub struct Photo {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl Photo {
    pub fn new(url: impl Into<String>) -> Self {
        Photo {
            url: url.into(),
            caption: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhotoRepr {
    Url(String),
    Full {
        #[serde(alias = "file_url")]
        url: String,
        #[serde(default, alias = "legenda")]
        caption: Option<String>,
    },
}

impl From<PhotoRepr> for Photo {
    fn from(repr: PhotoRepr) -> Self {
        match repr {
            PhotoRepr::Url(url) => Photo { url, caption: None },
            PhotoRepr::Full { url, caption } => Photo {
                url,
                caption: caption.filter(|c| !c.trim().is_empty()),
            },
        }
    }
}

// Records written by different viewer versions can carry the English name
// and one or more Portuguese aliases side by side. The first filled one
// wins, English first.
#[derive(Deserialize)]
struct SectionRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nome: Option<String>,
    #[serde(default)]
    local: Option<String>,
    #[serde(default)]
    items: Option<Vec<Item>>,
    #[serde(default)]
    itens: Option<Vec<Item>>,
    #[serde(default)]
    comments: Option<String>,
    #[serde(default)]
    comentarios: Option<String>,
}

impl From<SectionRecord> for Section {
    fn from(record: SectionRecord) -> Self {
        Section {
            name: first_filled([record.name, record.nome, record.local]).unwrap_or_default(),
            items: first_non_empty([record.items, record.itens]),
            comments: first_filled([record.comments, record.comentarios]),
        }
    }
}

#[derive(Deserialize)]
struct ItemRecord {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    descricao: Option<String>,
    #[serde(default)]
    status: Option<CheckStatus>,
    #[serde(default)]
    observation: Option<String>,
    #[serde(default)]
    observacao: Option<String>,
    #[serde(default)]
    observacoes: Option<String>,
    #[serde(default)]
    photos: Option<Vec<Photo>>,
    #[serde(default)]
    fotos: Option<Vec<Photo>>,
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        Item {
            description: first_filled([record.description, record.descricao]).unwrap_or_default(),
            status: record.status.unwrap_or_default(),
            observation: first_filled([record.observation, record.observacao, record.observacoes])
                .unwrap_or_default(),
            photos: first_non_empty([record.photos, record.fotos]),
        }
    }
}

fn first_filled<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

fn first_non_empty<T, const N: usize>(candidates: [Option<Vec<T>>; N]) -> Vec<T> {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}
