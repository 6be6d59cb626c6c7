mod cells;
mod fallback;
mod matcher;
mod parser;
mod row;

pub use cells::RangeBounds;
pub use matcher::{pick, MatchPass, RuleMatch, RuleQuery};
pub use row::{DutyKind, RuleRow};

use crate::tariff::age::AgeBucketSet;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug)]
pub enum RuleLoadError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for RuleLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleLoadError::Io(err) => write!(f, "failed to read rule table: {}", err),
            RuleLoadError::Csv(err) => write!(f, "invalid rule table CSV: {}", err),
        }
    }
}

impl std::error::Error for RuleLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuleLoadError::Io(err) => Some(err),
            RuleLoadError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RuleLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RuleLoadError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Where the loaded rows came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum RuleSource {
    File(PathBuf),
    Reader,
    BuiltIn,
}

impl RuleSource {
    pub fn describe(&self) -> String {
        match self {
            RuleSource::File(path) => path.display().to_string(),
            RuleSource::Reader => "in-memory reader".to_string(),
            RuleSource::BuiltIn => "built-in fallback table".to_string(),
        }
    }
}

/// Two brackets that can both match the same vehicle; the earlier row wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOverlap {
    /// 1-based positions of the rows in load order.
    pub first_row: usize,
    pub second_row: usize,
    pub segment: String,
    pub category: String,
    pub fuel: String,
    pub age_bucket: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleTableSummary {
    pub source: RuleSource,
    pub built_in: bool,
    pub rows: usize,
    pub age_labels: Vec<String>,
    pub overlaps: Vec<RuleOverlap>,
}

/// Immutable, ordered set of tariff brackets.
///
/// Built once and shared behind an `Arc`; a reload produces a new repository
/// rather than mutating this one.
#[derive(Debug, Clone)]
pub struct RuleRepository {
    rows: Vec<RuleRow>,
    age_buckets: AgeBucketSet,
    source: RuleSource,
}

impl RuleRepository {
    /// Loads rules from a CSV file, or the built-in table if the file is absent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RuleLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                path = %path.display(),
                "rule table not found; using built-in fallback rules"
            );
            return Ok(Self::built_in());
        }

        let file = std::fs::File::open(path)?;
        let rows = parser::parse_rows(file)?;
        Ok(Self::from_rows(rows, RuleSource::File(path.to_path_buf())))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleLoadError> {
        let rows = parser::parse_rows(reader)?;
        Ok(Self::from_rows(rows, RuleSource::Reader))
    }

    pub fn built_in() -> Self {
        Self::from_rows(fallback::built_in_rows(), RuleSource::BuiltIn)
    }

    fn from_rows(rows: Vec<RuleRow>, source: RuleSource) -> Self {
        let age_buckets = AgeBucketSet::from_labels(rows.iter().map(|row| row.age_bucket.as_str()));
        let repository = Self {
            rows,
            age_buckets,
            source,
        };

        let overlaps = repository.overlaps();
        for overlap in &overlaps {
            warn!(
                first_row = overlap.first_row,
                second_row = overlap.second_row,
                segment = %overlap.segment,
                fuel = %overlap.fuel,
                age_bucket = %overlap.age_bucket,
                "overlapping rule brackets; the earlier row takes precedence"
            );
        }
        info!(
            source = %repository.source.describe(),
            rows = repository.rows.len(),
            overlaps = overlaps.len(),
            "rule table loaded"
        );

        repository
    }

    /// Re-reads the backing file. Reader-backed and built-in tables are
    /// returned unchanged.
    pub fn reload(&self) -> Result<Self, RuleLoadError> {
        match &self.source {
            RuleSource::File(path) => Self::load(path),
            RuleSource::Reader | RuleSource::BuiltIn => Ok(self.clone()),
        }
    }

    pub fn rows(&self) -> &[RuleRow] {
        &self.rows
    }

    pub fn available_age_labels(&self) -> BTreeSet<String> {
        self.age_buckets.all_labels()
    }

    pub fn age_buckets(&self) -> &AgeBucketSet {
        &self.age_buckets
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }

    pub fn is_built_in(&self) -> bool {
        self.source == RuleSource::BuiltIn
    }

    pub fn pick(&self, query: &RuleQuery<'_>) -> Option<RuleMatch<'_>> {
        pick(&self.rows, query)
    }

    pub fn overlaps(&self) -> Vec<RuleOverlap> {
        let mut overlaps = Vec::new();
        for (index, first) in self.rows.iter().enumerate() {
            for (offset, second) in self.rows[index + 1..].iter().enumerate() {
                if first.same_bracket_key(second)
                    && first.engine_cc.intersects(&second.engine_cc)
                    && first.engine_hp.intersects(&second.engine_hp)
                {
                    overlaps.push(RuleOverlap {
                        first_row: index + 1,
                        second_row: index + offset + 2,
                        segment: first.segment.clone(),
                        category: first.category.clone(),
                        fuel: first.fuel.clone(),
                        age_bucket: first.age_bucket.clone(),
                    });
                }
            }
        }
        overlaps
    }

    pub fn summary(&self) -> RuleTableSummary {
        RuleTableSummary {
            source: self.source.clone(),
            built_in: self.is_built_in(),
            rows: self.rows.len(),
            age_labels: self.available_age_labels().into_iter().collect(),
            overlaps: self.overlaps(),
        }
    }
}
