use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One National Park unit from the designations feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkUnit {
    pub code: String,
    pub name: String,
}

/// Park codes mapped to official names, ordered by code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCatalog {
    units: BTreeMap<String, String>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a unit, returning the previous name for the code.
    pub fn insert(&mut self, code: impl Into<String>, name: impl Into<String>) -> Option<String> {
        self.units.insert(code.into(), name.into())
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.units.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.units.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Names in code order.
    pub fn names(&self) -> Vec<&str> {
        self.units.values().map(String::as_str).collect()
    }

    /// First code (in code order) whose name equals `name`.
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.units
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(code, _)| code.as_str())
    }

    pub fn units(&self) -> impl Iterator<Item = ParkUnit> + '_ {
        self.units.iter().map(|(code, name)| ParkUnit {
            code: code.clone(),
            name: name.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl<C: Into<String>, N: Into<String>> FromIterator<(C, N)> for UnitCatalog {
    fn from_iter<I: IntoIterator<Item = (C, N)>>(iter: I) -> Self {
        let mut catalog = UnitCatalog::new();
        for (code, name) in iter {
            catalog.insert(code, name);
        }
        catalog
    }
}

/// (year, month) with month in 1..=12
pub type YearMonth = (i32, u32);

/// Long-form visitation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitationRecord {
    pub park_code: String,
    pub year: i32,
    pub month: u32,
    pub visitors: u64,
}

/// One park's monthly visitors, flattened from the year x month grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParkVisitSeries {
    pub park_code: String,
    pub counts: BTreeMap<YearMonth, u64>,
}

impl ParkVisitSeries {
    pub fn new(park_code: impl Into<String>) -> Self {
        Self {
            park_code: park_code.into(),
            counts: BTreeMap::new(),
        }
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.counts.keys().map(|(year, _)| *year).collect()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// All parks' series joined on (year, month), one column per park.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitationTable {
    index: BTreeSet<YearMonth>,
    columns: BTreeMap<String, BTreeMap<YearMonth, u64>>,
}

/// One (year, month) row of the combined table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitationRow {
    pub year: i32,
    pub month: u32,
    pub visitors: BTreeMap<String, u64>,
}

impl VisitationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a park's column.
    pub fn insert_series(&mut self, series: ParkVisitSeries) {
        self.index.extend(series.counts.keys().copied());
        self.columns.insert(series.park_code, series.counts);
    }

    /// Visitors for a cell; cells outside a park's series read as zero.
    pub fn get(&self, park_code: &str, year: i32, month: u32) -> u64 {
        self.columns
            .get(park_code)
            .and_then(|column| column.get(&(year, month)))
            .copied()
            .unwrap_or(0)
    }

    pub fn index(&self) -> &BTreeSet<YearMonth> {
        &self.index
    }

    pub fn park_codes(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn rows(&self) -> Vec<VisitationRow> {
        self.index
            .iter()
            .map(|&(year, month)| VisitationRow {
                year,
                month,
                visitors: self
                    .columns
                    .keys()
                    .map(|code| (code.clone(), self.get(code, year, month)))
                    .collect(),
            })
            .collect()
    }

    /// Every (park, year, month) cell of the table, zero-filled.
    pub fn records(&self) -> Vec<VisitationRecord> {
        self.index
            .iter()
            .flat_map(|&(year, month)| {
                self.columns.keys().map(move |code| VisitationRecord {
                    park_code: code.clone(),
                    year,
                    month,
                    visitors: self.get(code, year, month),
                })
            })
            .collect()
    }

    pub fn park_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Parse,
    Match,
    Other,
}

/// A park whose visitation report could not be collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkFailure {
    pub code: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of a visitation batch: everything collected plus what failed.
#[derive(Debug, Clone, Default)]
pub struct VisitationReport {
    pub table: VisitationTable,
    pub failures: Vec<ParkFailure>,
}

impl VisitationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One row of the reference page joined to a park code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkDescriptor {
    pub code: String,
    pub name: String,
    pub state: String,
    pub location: String,
    pub established: String,
    pub acres: String,
    pub description: String,
    pub match_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DescriptorTable {
    rows: Vec<ParkDescriptor>,
}

impl DescriptorTable {
    pub fn new(rows: Vec<ParkDescriptor>) -> Self {
        Self { rows }
    }

    pub fn get(&self, code: &str) -> Option<&ParkDescriptor> {
        self.rows.iter().find(|row| row.code == code)
    }

    pub fn rows(&self) -> &[ParkDescriptor] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
