//! Long-format dose tables: one row per (endpoint, sex, dose level).
//!
//! Rows are grouped by endpoint label and sex in order of first appearance.
//! Endpoint-level columns (`data_type`, `domain`, `organ`, `test_code`,
//! `unit`, `trend_p`, `treatment_related`, `severity`) are read from the
//! first row of each group that fills them. Within a group, dose levels must
//! appear in ascending order.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, SynthError};
use crate::model::{DataType, DoseGroupStatRow, EndpointStatisticsSpec, Severity, Sex};
use crate::verdict::StatisticalAssessment;

use super::record::EndpointRecord;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';'];

/// Columns every table must carry.
const REQUIRED: &[&str] = &["endpoint", "sex", "dose_level", "n"];

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct RowLoaderConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    pub quote: u8,
}

impl Default for RowLoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
        }
    }
}

/// Reads long-format CSV/TSV dose tables into endpoint records.
#[derive(Debug, Clone, Default)]
pub struct RowLoader {
    config: RowLoaderConfig,
}

#[derive(Default)]
struct Group {
    data_type: Option<DataType>,
    domain: Option<String>,
    organ: Option<String>,
    test_code: Option<String>,
    unit: Option<String>,
    trend_p: Option<f64>,
    treatment_related: Option<bool>,
    severity: Option<Severity>,
    rows: Vec<DoseGroupStatRow>,
}

impl RowLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RowLoaderConfig) -> Self {
        Self { config }
    }

    /// Load a table from disk.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<EndpointRecord>> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| SynthError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let records = self.load_bytes(&contents)?;
        debug!(path = %path.display(), endpoints = records.len(), "loaded dose table");
        Ok(records)
    }

    /// Load a table from memory.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Vec<EndpointRecord>> {
        let delimiter = self.config.delimiter.unwrap_or_else(|| detect_delimiter(bytes));
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        for required in REQUIRED {
            if !headers.iter().any(|h| h == required) {
                return Err(SynthError::Parse {
                    row: 0,
                    column: required.to_string(),
                    message: "required column missing".to_string(),
                });
            }
        }

        let mut groups: IndexMap<(String, Sex), Group> = IndexMap::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells = Cells {
                row: idx + 1,
                headers: &headers,
                record: &record,
            };

            let label = cells.required("endpoint")?.to_string();
            let sex_text = cells.required("sex")?;
            let sex = Sex::parse(sex_text).ok_or_else(|| cells.error("sex", format!("unknown sex '{}'", sex_text)))?;

            let group = groups.entry((label, sex)).or_default();
            fill(&mut group.data_type, cells.parsed("data_type", DataType::parse)?);
            fill(&mut group.domain, cells.text("domain"));
            fill(&mut group.organ, cells.text("organ"));
            fill(&mut group.test_code, cells.text("test_code"));
            fill(&mut group.unit, cells.text("unit"));
            fill(&mut group.trend_p, cells.number("trend_p")?);
            fill(&mut group.treatment_related, cells.parsed("treatment_related", parse_bool)?);
            fill(&mut group.severity, cells.parsed("severity", Severity::parse)?);

            group.rows.push(DoseGroupStatRow {
                dose_level: cells.integer("dose_level")?.ok_or_else(|| cells.error("dose_level", "missing value"))?,
                dose_value: cells.number("dose_value")?,
                dose_unit: cells.text("dose_unit"),
                n: cells.integer("n")?.ok_or_else(|| cells.error("n", "missing value"))?,
                mean: cells.number("mean")?,
                sd: cells.number("sd")?,
                affected: cells.integer("affected")?,
                incidence: cells.number("incidence")?,
                p_value: cells.number("p_value")?,
                p_value_adj: cells.number("p_value_adj")?,
                effect_size: cells.number("effect_size")?,
            });
        }

        groups
            .into_iter()
            .map(|((label, sex), group)| group.into_record(label, sex))
            .collect()
    }
}

impl Group {
    fn into_record(self, label: String, sex: Sex) -> Result<EndpointRecord> {
        // Rows keep file order; an out-of-order group fails in `build`.
        let data_type = self.data_type.unwrap_or_else(|| {
            if self.rows.iter().any(|r| r.mean.is_some()) {
                DataType::Continuous
            } else {
                DataType::Categorical
            }
        });

        let mut spec = EndpointStatisticsSpec::new(label, sex, data_type);
        spec.domain = self.domain.unwrap_or_default();
        spec.organ = self.organ;
        spec.test_code = self.test_code;
        spec.unit = self.unit;
        spec.trend_p = self.trend_p;
        spec.rows = self.rows;
        let statistics = spec.build()?;

        let assessment = StatisticalAssessment::new(
            self.treatment_related.unwrap_or(false),
            self.severity.unwrap_or_default(),
        );
        Ok(EndpointRecord::new(statistics, assessment))
    }
}

struct Cells<'a> {
    row: usize,
    headers: &'a [String],
    record: &'a csv::StringRecord,
}

impl<'a> Cells<'a> {
    fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.record.get(idx).filter(|v| !is_null_value(v))
    }

    fn error(&self, column: &str, message: impl Into<String>) -> SynthError {
        SynthError::Parse {
            row: self.row,
            column: column.to_string(),
            message: message.into(),
        }
    }

    fn required(&self, column: &str) -> Result<&'a str> {
        self.get(column).ok_or_else(|| self.error(column, "missing value"))
    }

    fn text(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    fn number(&self, column: &str) -> Result<Option<f64>> {
        self.get(column)
            .map(|v| v.parse::<f64>().map_err(|e| self.error(column, e.to_string())))
            .transpose()
    }

    fn integer(&self, column: &str) -> Result<Option<u32>> {
        self.get(column)
            .map(|v| v.parse::<u32>().map_err(|e| self.error(column, e.to_string())))
            .transpose()
    }

    fn parsed<T>(&self, column: &str, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>> {
        self.get(column)
            .map(|v| parse(v).ok_or_else(|| self.error(column, format!("unrecognized value '{}'", v))))
            .transpose()
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Check if a value represents a missing value.
fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed == "."
}

/// Pick the delimiter that occurs most in the header line.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    DELIMITERS
        .iter()
        .copied()
        .max_by_key(|&d| (header.iter().filter(|&&b| b == d).count(), d == b'\t'))
        .filter(|&d| header.contains(&d))
        .unwrap_or(b',')
}
