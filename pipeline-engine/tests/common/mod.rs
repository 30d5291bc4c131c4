//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use pipeline_engine::{
    compute_pipeline, Dataset, PipelineConfig, PipelineOutput, PipelineSettings, Row, RowRef, Value,
};

/// Holds a dataset and the settings passes run with.
pub struct TestHarness {
    pub data: Dataset,
    pub settings: PipelineSettings,
}

impl TestHarness {
    pub fn new(rows: Vec<Row>) -> Self {
        TestHarness {
            data: Dataset::from_rows(rows),
            settings: PipelineSettings::default(),
        }
    }

    /// A harness over the sales fixture.
    pub fn with_sales_data() -> Self {
        Self::new(SalesFixture::rows())
    }

    /// A harness over `count` generated rows.
    pub fn with_large_data(count: usize) -> Self {
        Self::new(generate_rows(count))
    }

    pub fn run(&self, config: &PipelineConfig) -> PipelineOutput {
        compute_pipeline(&self.data, config, &self.settings)
    }

    pub fn rows(&self) -> &[RowRef] {
        self.data.rows()
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub struct SalesFixture;

impl SalesFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["region", "product", "quarter", "sales", "quantity", "target", "closed"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64, f64, bool)> {
        vec![
            ("North", "Widget", "2024-01-15", 10000.0, 100.0, 12000.0, true),
            ("North", "Widget", "2024-04-10", 12000.0, 120.0, 12000.0, true),
            ("North", "Gadget", "2024-02-03", 8000.0, 80.0, 10000.0, false),
            ("North", "Gadget", "2024-05-21", 9000.0, 90.0, 10000.0, true),
            ("South", "Widget", "2024-01-30", 15000.0, 150.0, 14000.0, false),
            ("South", "Widget", "2024-06-01", 14000.0, 140.0, 14000.0, true),
            ("South", "Gadget", "2024-03-12", 11000.0, 110.0, 12000.0, true),
            ("South", "Gadget", "2024-04-18", 13000.0, 130.0, 12000.0, false),
            ("East", "Widget", "2024-02-14", 9000.0, 90.0, 10000.0, true),
            ("East", "Widget", "2024-05-05", 11000.0, 110.0, 10000.0, false),
            ("East", "Gadget", "2024-03-01", 7000.0, 70.0, 8000.0, true),
            ("East", "Gadget", "2024-06-20", 8500.0, 85.0, 8000.0, true),
        ]
    }

    pub fn rows() -> Vec<Row> {
        let headers = Self::headers();
        Self::data()
            .into_iter()
            .map(|(region, product, date, sales, quantity, target, closed)| {
                let values: [Value; 7] = [
                    region.into(),
                    product.into(),
                    date.into(),
                    sales.into(),
                    quantity.into(),
                    target.into(),
                    closed.into(),
                ];
                headers.iter().copied().zip(values).collect()
            })
            .collect()
    }
}

/// Rows for volume tests: a few categories, numbers and dates.
pub fn generate_rows(count: usize) -> Vec<Row> {
    const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
    const PRODUCTS: [&str; 3] = ["Widget", "Gadget", "Gizmo"];
    (0..count)
        .map(|i| {
            Row::from_pairs([
                ("id", Value::from(i as i64)),
                ("region", Value::from(REGIONS[i % REGIONS.len()])),
                ("product", Value::from(PRODUCTS[(i / 4) % PRODUCTS.len()])),
                ("amount", Value::from(((i * 37) % 1000) as f64 + 0.5)),
                ("day", Value::from(format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1))),
            ])
        })
        .collect()
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// The display strings of one column over a row sequence.
pub fn column_values(rows: &[RowRef], column: &str) -> Vec<String> {
    rows.iter()
        .map(|row| row.get_field(column).map(Value::to_display).unwrap_or_default())
        .collect()
}

/// Assert a numeric cell.
pub fn assert_number(row: &Row, column: &str, expected: f64) {
    match row.get(column).and_then(Value::as_f64) {
        Some(actual) => assert!(
            (actual - expected).abs() < 1e-9,
            "column {}: expected {}, got {}",
            column,
            expected,
            actual
        ),
        None => panic!("column {}: expected number {}, got {:?}", column, expected, row.get(column)),
    }
}

/// True when every row of `subset` is (by identity) a row of `superset`.
pub fn is_identity_subset(subset: &[RowRef], superset: &[RowRef]) -> bool {
    subset
        .iter()
        .all(|row| superset.iter().any(|candidate| Arc::ptr_eq(row, candidate)))
}
