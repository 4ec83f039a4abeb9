use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use triage_core::{GuidanceDocument, IncidentCategory};
use walkdir::WalkDir;

const GENERIC_CATEGORY: &str = "generic";

#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("knowledge base path does not exist: {0}")]
    Missing(PathBuf),
    #[error("failed reading knowledge base file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid guidance record in {path} (line {line})")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("guidance document {id} has unknown category {category:?}")]
    UnknownCategory { id: String, category: String },
    #[error("guidance document {0} has empty text")]
    EmptyText(String),
    #[error("duplicate guidance document id {0}")]
    DuplicateId(String),
    #[error("knowledge base has no generic fallback document")]
    NoGenericDocument,
    #[error("knowledge base has more than one generic document: {0:?}")]
    MultipleGenericDocuments(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct GuidanceRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(alias = "content")]
    text: String,
}

/// Loads every guidance document under `path` (a single file or a directory of
/// `.jsonl` / `.json` files) and checks the knowledge-base invariants.
pub fn load_documents(path: &Path) -> Result<Vec<GuidanceDocument>, KnowledgeBaseError> {
    if !path.exists() {
        return Err(KnowledgeBaseError::Missing(path.to_path_buf()));
    }

    let mut docs = Vec::new();
    if path.is_file() {
        docs.extend(load_file(path)?);
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                matches!(
                    entry.path().extension().and_then(|ext| ext.to_str()),
                    Some("jsonl") | Some("json")
                )
            })
        {
            docs.extend(load_file(entry.path())?);
        }
    }

    validate(&docs)?;
    Ok(docs)
}

pub fn validate(docs: &[GuidanceDocument]) -> Result<(), KnowledgeBaseError> {
    let mut seen = HashSet::new();
    for doc in docs {
        if !seen.insert(doc.id.as_str()) {
            return Err(KnowledgeBaseError::DuplicateId(doc.id.clone()));
        }
        if doc.text.trim().is_empty() {
            return Err(KnowledgeBaseError::EmptyText(doc.id.clone()));
        }
    }

    let generic = docs
        .iter()
        .filter(|doc| doc.is_generic())
        .map(|doc| doc.id.clone())
        .collect::<Vec<_>>();
    match generic.len() {
        0 => Err(KnowledgeBaseError::NoGenericDocument),
        1 => Ok(()),
        _ => Err(KnowledgeBaseError::MultipleGenericDocuments(generic)),
    }
}

fn load_file(path: &Path) -> Result<Vec<GuidanceDocument>, KnowledgeBaseError> {
    let raw = fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("kb");

    let is_array = path.extension().and_then(|ext| ext.to_str()) == Some("json");
    let records = if is_array {
        serde_json::from_str::<Vec<GuidanceRecord>>(&raw)
            .map_err(|source| KnowledgeBaseError::Parse {
                path: path.to_path_buf(),
                line: source.line(),
                source,
            })?
            .into_iter()
            .enumerate()
            .map(|(idx, record)| (idx + 1, record))
            .collect::<Vec<_>>()
    } else {
        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str::<GuidanceRecord>(line).map_err(|source| {
                KnowledgeBaseError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source,
                }
            })?;
            records.push((idx + 1, record));
        }
        records
    };

    records
        .into_iter()
        .map(|(line, record)| into_document(stem, line, record))
        .collect()
}

fn into_document(
    stem: &str,
    line: usize,
    record: GuidanceRecord,
) -> Result<GuidanceDocument, KnowledgeBaseError> {
    let id = record
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{stem}-{line}"));

    let category = match record.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) if value.eq_ignore_ascii_case(GENERIC_CATEGORY) => None,
        Some(value) => Some(IncidentCategory::parse(value).ok_or_else(|| {
            KnowledgeBaseError::UnknownCategory {
                id: id.clone(),
                category: value.to_string(),
            }
        })?),
    };

    let tags = record
        .tags
        .iter()
        .map(|tag| tag.trim().to_lowercase().replace([' ', '-'], "_"))
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>();

    Ok(GuidanceDocument {
        id,
        category,
        tags,
        text: record.text.trim().to_string(),
    })
}
