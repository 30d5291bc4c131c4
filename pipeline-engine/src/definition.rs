//! FILENAME: pipeline-engine/src/definition.rs
//! Pipeline Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE one pipeline pass.
//! These structures are designed to be:
//! - Serializable (camelCase JSON, as sent by the grid front end)
//! - Hashable (they key the memo cache)
//! - Immutable snapshots of user intent

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use grid_engine::{parse_value_date, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PipelineError;

// ============================================================================
// COLUMN TYPES
// ============================================================================

/// The inferred (or declared) type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    Boolean,
    Date,
    Number,
    #[default]
    String,
}

/// The filter-evaluation strategy bound to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    Contains,
    Equals,
    In,
    DateRange,
}

// ============================================================================
// SORT DEFINITIONS
// ============================================================================

/// Sort direction for one sort entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

/// One entry of a sort spec. Entry order is tie-break precedence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

// ============================================================================
// FILTER DEFINITIONS
// ============================================================================

/// The filter clause for one column. The tag is the match mode; the payload
/// shape depends on it:
/// - `contains`: the typed text (numeric expression on number columns)
/// - `equals`: `true`, `false`, or `null` (no filter)
/// - `in`: the selected values
/// - `dateRange`: `[start|null, end|null]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "matchMode", content = "value", rename_all = "camelCase")]
pub enum ColumnFilter {
    Contains(String),
    Equals(Option<bool>),
    In(Vec<Value>),
    DateRange(Option<DateBound>, Option<DateBound>),
}

impl ColumnFilter {
    /// A date range over whole days.
    pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        ColumnFilter::DateRange(start.map(DateBound::Day), end.map(DateBound::Day))
    }

    pub fn match_mode(&self) -> MatchMode {
        match self {
            ColumnFilter::Contains(_) => MatchMode::Contains,
            ColumnFilter::Equals(_) => MatchMode::Equals,
            ColumnFilter::In(_) => MatchMode::In,
            ColumnFilter::DateRange(_, _) => MatchMode::DateRange,
        }
    }

    /// False when the clause would let every row through (blank text, `null`
    /// tri-state, empty selection, fully open date range).
    pub fn is_active(&self) -> bool {
        match self {
            ColumnFilter::Contains(text) => !text.trim().is_empty(),
            ColumnFilter::Equals(flag) => flag.is_some(),
            ColumnFilter::In(values) => !values.is_empty(),
            ColumnFilter::DateRange(start, end) => start.is_some() || end.is_some(),
        }
    }
}

/// One end of a date range. Any date or datetime reading is truncated to its
/// day; a bound that does not read as a date is kept verbatim and the range
/// then matches no row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateBound {
    Day(NaiveDate),
    Unparsed(String),
}

impl DateBound {
    pub fn from_value(value: &Value) -> Self {
        match parse_value_date(value) {
            Some(dt) => DateBound::Day(dt.date()),
            None => DateBound::Unparsed(value.to_display()),
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            DateBound::Day(day) => Some(*day),
            DateBound::Unparsed(_) => None,
        }
    }
}

impl From<NaiveDate> for DateBound {
    fn from(day: NaiveDate) -> Self {
        DateBound::Day(day)
    }
}

impl Serialize for DateBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DateBound::Day(day) => day.serialize(serializer),
            DateBound::Unparsed(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for DateBound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(DateBound::from_value(&value))
    }
}

/// Column name -> filter clause.
pub type FilterState = BTreeMap<String, ColumnFilter>;

// ============================================================================
// PAGINATION
// ============================================================================

/// The requested window over the final ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationWindow {
    pub offset: usize,
    pub size: usize,
}

impl PaginationWindow {
    pub fn new(offset: usize, size: usize) -> Self {
        PaginationWindow { offset, size }
    }

    /// The window for a zero-based page index.
    pub fn page(index: usize, size: usize) -> Self {
        PaginationWindow {
            offset: index.saturating_mul(size),
            size,
        }
    }
}

// ============================================================================
// DERIVED COLUMNS
// ============================================================================

/// Arithmetic used by a derived column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DerivedOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// A column computed from two other columns: `left <operator> right`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedColumnSpec {
    pub name: String,
    pub left: String,
    pub right: String,
    pub operator: DerivedOperator,
}

impl DerivedColumnSpec {
    /// Evaluates the operator on two numeric readings. Missing operands and
    /// division by zero give null.
    pub fn evaluate(&self, left: Option<f64>, right: Option<f64>) -> Value {
        let (l, r) = match (left, right) {
            (Some(l), Some(r)) => (l, r),
            _ => return Value::Null,
        };
        let result = match self.operator {
            DerivedOperator::Add => l + r,
            DerivedOperator::Subtract => l - r,
            DerivedOperator::Multiply => l * r,
            DerivedOperator::Divide => {
                if r == 0.0 {
                    return Value::Null;
                }
                l / r
            }
        };
        Value::Number(result)
    }
}

/// A percentage column: `value / target * 100`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageColumnSpec {
    pub name: String,
    pub target: String,
    pub value: String,
}

impl PercentageColumnSpec {
    pub fn evaluate(&self, target: Option<f64>, value: Option<f64>) -> Value {
        match (target, value) {
            (Some(t), Some(v)) if t != 0.0 => Value::Number(v / t * 100.0),
            _ => Value::Null,
        }
    }
}

// ============================================================================
// MAIN CONFIGURATION
// ============================================================================

/// Where rows whose top-level group value is null/empty are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NullGroupPlacement {
    /// The null-sentinel group is paged like any other group.
    #[default]
    Uniform,
    /// The null-sentinel group is kept out of the paged list and shown ahead
    /// of the groups on the first page only.
    FirstPageOnly,
}

/// The complete configuration for one pipeline (one slot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Ordered group fields (outer to inner). `None` or empty disables grouping.
    pub group_fields: Option<Vec<String>>,

    pub sort_spec: Vec<SortSpec>,

    pub filters: FilterState,

    /// `None` returns the whole sorted sequence as one page.
    pub pagination: Option<PaginationWindow>,

    /// Restricts the visible columns. `None` keeps every observed column.
    pub allowed_columns: Option<Vec<String>>,

    pub derived_columns: Vec<DerivedColumnSpec>,

    pub percentage_columns: Vec<PercentageColumnSpec>,

    /// String columns that take a free-text filter instead of a multiselect.
    pub text_filter_columns: Vec<String>,

    /// Declared column types; these win over inference.
    pub type_overrides: BTreeMap<String, ColumnType>,

    pub null_group_placement: NullGroupPlacement,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations no pipeline pass can honour.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if let Some(window) = &self.pagination {
            if window.size == 0 {
                return Err(PipelineError::InvalidConfig(
                    "pagination size must be greater than zero".to_string(),
                ));
            }
        }
        if self.active_group_fields().iter().any(|f| f.trim().is_empty()) {
            return Err(PipelineError::InvalidConfig(
                "group field names must not be empty".to_string(),
            ));
        }
        for spec in &self.sort_spec {
            if spec.field.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "sort field names must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The group fields in effect (empty when grouping is off).
    pub fn active_group_fields(&self) -> &[String] {
        self.group_fields.as_deref().unwrap_or(&[])
    }

    pub fn is_grouped(&self) -> bool {
        !self.active_group_fields().is_empty()
    }

    pub fn is_text_filter_column(&self, column: &str) -> bool {
        self.text_filter_columns.iter().any(|c| c == column)
    }

    pub fn with_group_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.group_fields = if fields.is_empty() { None } else { Some(fields) };
        self
    }

    pub fn with_sort(mut self, spec: Vec<SortSpec>) -> Self {
        self.sort_spec = spec;
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, filter: ColumnFilter) -> Self {
        self.filters.insert(column.into(), filter);
        self
    }

    pub fn with_pagination(mut self, offset: usize, size: usize) -> Self {
        self.pagination = Some(PaginationWindow::new(offset, size));
        self
    }
}

// ============================================================================
// ENGINE SETTINGS
// ============================================================================

/// Tuning constants for inference, aggregation, scheduling and caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Rows sampled for column discovery and type inference.
    pub sample_size: usize,

    /// Share of sampled values that must be boolean literals.
    pub boolean_threshold: f64,

    /// Share of sampled values that must be date-like.
    pub date_threshold: f64,

    /// Share of sampled values that must be numeric.
    pub number_threshold: f64,

    /// Share of non-empty values that must be numeric for a non-number
    /// column to be summed in a group summary instead of passed through.
    pub pass_through_numeric_share: f64,

    /// Delay before a typed filter edit is committed.
    pub commit_delay_ms: u64,

    /// Distinct configurations remembered by one pipeline cache.
    pub memo_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            sample_size: 100,
            boolean_threshold: 0.7,
            date_threshold: 0.7,
            number_threshold: 0.8,
            pass_through_numeric_share: 0.8,
            commit_delay_ms: 300,
            memo_capacity: 8,
        }
    }
}

impl PipelineSettings {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_json_shapes() {
        let json = r#"{
            "region": { "matchMode": "in", "value": ["North", 3] },
            "active": { "matchMode": "equals", "value": null },
            "amount": { "matchMode": "contains", "value": ">=5" },
            "created": { "matchMode": "dateRange", "value": ["2024-01-01", null] }
        }"#;
        let filters: FilterState = serde_json::from_str(json).unwrap();

        assert_eq!(
            filters["region"],
            ColumnFilter::In(vec![Value::from("North"), Value::from(3)])
        );
        assert_eq!(filters["active"], ColumnFilter::Equals(None));
        assert!(!filters["active"].is_active());
        assert_eq!(filters["amount"].match_mode(), MatchMode::Contains);
        assert_eq!(
            filters["created"],
            ColumnFilter::date_range(NaiveDate::from_ymd_opt(2024, 1, 1), None)
        );
    }

    #[test]
    fn test_date_bounds_accept_datetimes_and_keep_garbage() {
        let json = r#"{
            "filters": {
                "stamped": { "matchMode": "dateRange", "value": ["2024-01-01T00:00:00.000Z", "2024-03-31T23:59:59Z"] },
                "broken": { "matchMode": "dateRange", "value": ["not-a-date", null] }
            }
        }"#;
        let config = PipelineConfig::from_json(json).unwrap();

        assert_eq!(
            config.filters["stamped"],
            ColumnFilter::date_range(NaiveDate::from_ymd_opt(2024, 1, 1), NaiveDate::from_ymd_opt(2024, 3, 31))
        );
        assert_eq!(
            config.filters["broken"],
            ColumnFilter::DateRange(Some(DateBound::Unparsed("not-a-date".to_string())), None)
        );
        assert!(config.filters["broken"].is_active());
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "groupFields": ["region"], "sortSpec": [{ "field": "amount", "direction": "desc" }] }"#,
        )
        .unwrap();
        assert_eq!(config.active_group_fields(), ["region".to_string()]);
        assert_eq!(config.sort_spec[0].direction, SortDirection::Descending);
        assert!(config.pagination.is_none());
        assert_eq!(config.null_group_placement, NullGroupPlacement::Uniform);
    }

    #[test]
    fn test_config_validation() {
        let err = PipelineConfig::from_json(r#"{ "pagination": { "offset": 0, "size": 0 } }"#);
        assert!(matches!(err, Err(PipelineError::InvalidConfig(_))));

        let err = PipelineConfig::from_json("{ not json");
        assert!(matches!(err, Err(PipelineError::Json(_))));

        let grouped = PipelineConfig::new().with_group_fields(["region", " "]);
        assert!(grouped.validate().is_err());
    }

    #[test]
    fn test_derived_and_percentage_evaluation() {
        let ratio = DerivedColumnSpec {
            name: "margin".to_string(),
            left: "profit".to_string(),
            right: "revenue".to_string(),
            operator: DerivedOperator::Divide,
        };
        assert_eq!(ratio.evaluate(Some(5.0), Some(20.0)), Value::Number(0.25));
        assert_eq!(ratio.evaluate(Some(5.0), Some(0.0)), Value::Null);
        assert_eq!(ratio.evaluate(None, Some(1.0)), Value::Null);

        let pct = PercentageColumnSpec {
            name: "attainment".to_string(),
            target: "target".to_string(),
            value: "actual".to_string(),
        };
        assert_eq!(pct.evaluate(Some(150.0), Some(30.0)), Value::Number(20.0));
    }

    #[test]
    fn test_settings_defaults_and_overrides() {
        let settings = PipelineSettings::from_json(r#"{ "sampleSize": 25 }"#).unwrap();
        assert_eq!(settings.sample_size, 25);
        assert_eq!(settings.commit_delay(), Duration::from_millis(300));
        assert_eq!(PipelineSettings::default().memo_capacity, 8);
    }
}
