//! Tagged backend records and their validation
//!
//! `p4 -ztag -Mj` prints one JSON object per record with every value as a
//! string. Records are first deserialized leniently into `Option` fields and
//! then validated into the core model, so a missing or malformed field is
//! reported by name instead of failing somewhere downstream.

use std::collections::HashMap;

use serde::Deserialize;
use streamline_core::{
    AnnotateResult, AnnotatedLine, ChangeNumber, ChangedFile, ChangelistDescription, Commit, StreamKind,
    StreamNode,
};

/// Parent value the backend uses for root streams.
const NO_PARENT: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{record} record is missing `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    #[error("{record} record has invalid `{field}`: {value:?}")]
    InvalidField {
        record: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Error record, emitted in place of data.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub code: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub severity: Option<u32>,
}

impl RawMessage {
    pub fn is_error(&self) -> bool {
        self.code == "error"
    }
}

/// One entry of `p4 changes -l`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChange {
    pub change: Option<String>,
    pub user: Option<String>,
    pub time: Option<String>,
    pub desc: Option<String>,
    pub client: Option<String>,
    pub status: Option<String>,
}

/// `p4 describe -s`. File fields come indexed: `depotFile0`, `action0`,
/// `rev0`, `depotFile1`...
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDescribe {
    pub change: Option<String>,
    pub user: Option<String>,
    pub time: Option<String>,
    pub desc: Option<String>,
    #[serde(flatten)]
    pub rest: HashMap<String, serde_json::Value>,
}

/// One entry of `p4 streams`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStream {
    #[serde(rename = "Stream")]
    pub stream: Option<String>,
    #[serde(rename = "Parent")]
    pub parent: Option<String>,
    #[serde(rename = "Type")]
    pub kind: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
}

/// A record of `p4 annotate -c -u`. The first record describes the file;
/// the rest carry one content line each.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnnotate {
    #[serde(rename = "depotFile")]
    pub depot_file: Option<String>,
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub user: Option<String>,
    pub time: Option<String>,
    pub data: Option<String>,
}

fn required<'a>(value: &'a Option<String>, record: &'static str, field: &'static str) -> Result<&'a str, DecodeError> {
    value.as_deref().ok_or(DecodeError::MissingField { record, field })
}

fn number<T: std::str::FromStr>(value: &str, record: &'static str, field: &'static str) -> Result<T, DecodeError> {
    value.trim().parse().map_err(|_| DecodeError::InvalidField {
        record,
        field,
        value: value.to_string(),
    })
}

fn optional_number<T: std::str::FromStr>(
    value: &Option<String>,
    record: &'static str,
    field: &'static str,
) -> Result<Option<T>, DecodeError> {
    value.as_deref().map(|v| number(v, record, field)).transpose()
}

pub fn decode_change(raw: &RawChange) -> Result<Commit, DecodeError> {
    const RECORD: &str = "change";
    let change: ChangeNumber = number(required(&raw.change, RECORD, "change")?, RECORD, "change")?;
    let author = required(&raw.user, RECORD, "user")?;

    let mut commit = Commit::new(change, author).with_description(raw.desc.clone().unwrap_or_default());
    commit.timestamp = optional_number(&raw.time, RECORD, "time")?;
    Ok(commit)
}

pub fn decode_describe(raw: &RawDescribe, diff_text: String) -> Result<ChangelistDescription, DecodeError> {
    const RECORD: &str = "describe";
    let change: ChangeNumber = number(required(&raw.change, RECORD, "change")?, RECORD, "change")?;
    let author = required(&raw.user, RECORD, "user")?;

    let mut info = Commit::new(change, author).with_description(raw.desc.clone().unwrap_or_default());
    info.timestamp = optional_number(&raw.time, RECORD, "time")?;

    let indexed = |key: &str, index: usize| -> Option<String> {
        raw.rest
            .get(&format!("{key}{index}"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let mut files = Vec::new();
    for index in 0.. {
        let Some(depot_path) = indexed("depotFile", index) else {
            break;
        };
        let action = indexed("action", index).ok_or(DecodeError::MissingField {
            record: RECORD,
            field: "action",
        })?;
        let revision = match indexed("rev", index) {
            Some(rev) => number(&rev, RECORD, "rev")?,
            None => 0,
        };
        files.push(ChangedFile {
            depot_path,
            action,
            revision,
        });
    }

    Ok(ChangelistDescription {
        info,
        files,
        diff_text,
    })
}

pub fn decode_stream(raw: &RawStream) -> Result<StreamNode, DecodeError> {
    const RECORD: &str = "stream";
    let path = required(&raw.stream, RECORD, "Stream")?;
    let kind = StreamKind::parse(required(&raw.kind, RECORD, "Type")?);
    let parent = raw
        .parent
        .as_deref()
        .filter(|parent| !parent.is_empty() && *parent != NO_PARENT);

    let mut node = StreamNode::new(path, parent, kind);
    if let Some(name) = raw.name.as_deref().filter(|name| !name.is_empty()) {
        node.display_name = name.to_string();
    }
    Ok(node)
}

/// Validate annotate records. Lines are numbered from 1 in output order.
pub fn decode_annotate(records: &[RawAnnotate]) -> Result<AnnotateResult, DecodeError> {
    const RECORD: &str = "annotate";
    let mut lines = Vec::new();

    for raw in records.iter().filter(|raw| raw.data.is_some()) {
        let commit_number: ChangeNumber = number(required(&raw.lower, RECORD, "lower")?, RECORD, "lower")?;
        lines.push(AnnotatedLine {
            line_number: u32::try_from(lines.len() + 1).map_err(|_| DecodeError::InvalidField {
                record: RECORD,
                field: "data",
                value: "too many lines".to_string(),
            })?,
            commit_number,
            author: raw.user.clone().unwrap_or_default(),
            date: raw.time.clone().unwrap_or_default(),
            content: raw
                .data
                .as_deref()
                .unwrap_or_default()
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        });
    }

    Ok(AnnotateResult {
        success: true,
        lines,
        message: None,
    })
}
