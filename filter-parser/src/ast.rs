//! FILENAME: filter-parser/src/ast.rs
//! PURPOSE: Parsed filter expressions and their evaluation against a cell.
//! CONTEXT: The parser produces one `FilterExpression` per filter box. The
//! pipeline evaluates it once per row, handing over the cell's numeric reading
//! (if any) and its display text.

/// Comparators accepted in front of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equal,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl ComparisonOperator {
    pub fn holds(&self, cell: f64, operand: f64) -> bool {
        match self {
            ComparisonOperator::Equal => cell == operand,
            ComparisonOperator::LessThan => cell < operand,
            ComparisonOperator::LessEqual => cell <= operand,
            ComparisonOperator::GreaterThan => cell > operand,
            ComparisonOperator::GreaterEqual => cell >= operand,
        }
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// Inclusive numeric range, `min <= max` always holds.
    Range { min: f64, max: f64 },

    /// A comparator against one number.
    Compare { op: ComparisonOperator, value: f64 },

    /// A bare number. Matches cells whose text contains it, so "42" also
    /// matches 142 and 420.
    NumberText(String),

    /// Free text, matched case-insensitively as a substring.
    Text(String),
}

impl FilterExpression {
    /// Tests a cell. `number` is the cell's numeric reading, `text` its
    /// display string. Numeric forms never match non-numeric cells.
    pub fn matches(&self, number: Option<f64>, text: &str) -> bool {
        match self {
            FilterExpression::Range { min, max } => {
                number.map(|n| n >= *min && n <= *max).unwrap_or(false)
            }
            FilterExpression::Compare { op, value } => {
                number.map(|n| op.holds(n, *value)).unwrap_or(false)
            }
            FilterExpression::NumberText(needle) => text.contains(needle.as_str()),
            FilterExpression::Text(needle) => {
                text.to_lowercase().contains(&needle.to_lowercase())
            }
        }
    }

    /// True for the forms that compare numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FilterExpression::Range { .. } | FilterExpression::Compare { .. })
    }
}
