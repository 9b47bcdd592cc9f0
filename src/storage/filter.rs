// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Row filter predicates
//!
//! A key may carry a boolean predicate that decides whether a resolved
//! record belongs in its index. Filters read the record straight out of the
//! column stores; there is no cursor or temporary row involved.

use std::cmp::Ordering;
use std::fmt;

use regex::Regex;

use super::container::ColumnStore;
use super::record_cache::{RecordCache, RecordId};
use crate::core::{Error, Operator, Result, Value};

/// Boolean predicate over one record of a record cache
pub trait RowFilter: Send + Sync + fmt::Debug {
    /// Evaluate the predicate against a record
    ///
    /// Returns an error if the record or column is invalid, or if a literal
    /// cannot be converted to the column type.
    fn evaluate(&self, cache: &RecordCache, record: RecordId) -> Result<bool>;

    /// Evaluate the predicate, treating any error as no match
    fn matches(&self, cache: &RecordCache, record: RecordId) -> bool {
        self.evaluate(cache, record).unwrap_or(false)
    }
}

#[derive(Debug)]
enum Operand {
    None,
    Value(Value),
    List(Vec<Value>),
    Pattern {
        pattern: String,
        exact: Option<Regex>,
        folded: Option<Regex>,
    },
}

/// Single-column comparison against a literal
///
/// Literals are converted to the column type before comparing, so string
/// columns honor the table's case mode. NULL column values only match
/// `IS NULL`.
#[derive(Debug)]
pub struct ComparisonFilter {
    column: usize,
    operator: Operator,
    operand: Operand,
}

impl ComparisonFilter {
    /// Create a binary comparison (`=`, `!=`, `>`, `>=`, `<`, `<=`)
    pub fn new(column: usize, operator: Operator, value: impl Into<Value>) -> Result<Self> {
        match operator {
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte => Ok(Self {
                column,
                operator,
                operand: Operand::Value(value.into()),
            }),
            Operator::Like => {
                let value = value.into();
                match value.as_str() {
                    Some(pattern) => Ok(Self::like(column, pattern)),
                    None => Err(Error::invalid_argument("LIKE requires a string pattern")),
                }
            }
            Operator::IsNull => Ok(Self::is_null(column)),
            Operator::IsNotNull => Ok(Self::is_not_null(column)),
            Operator::In | Operator::NotIn => Err(Error::invalid_argument(format!(
                "{} requires a value list",
                operator
            ))),
        }
    }

    pub fn eq(column: usize, value: impl Into<Value>) -> Self {
        Self {
            column,
            operator: Operator::Eq,
            operand: Operand::Value(value.into()),
        }
    }

    pub fn is_null(column: usize) -> Self {
        Self {
            column,
            operator: Operator::IsNull,
            operand: Operand::None,
        }
    }

    pub fn is_not_null(column: usize) -> Self {
        Self {
            column,
            operator: Operator::IsNotNull,
            operand: Operand::None,
        }
    }

    /// `column IN (values...)`
    pub fn in_list(column: usize, values: Vec<Value>) -> Self {
        Self {
            column,
            operator: Operator::In,
            operand: Operand::List(values),
        }
    }

    /// `column NOT IN (values...)`
    pub fn not_in_list(column: usize, values: Vec<Value>) -> Self {
        Self {
            column,
            operator: Operator::NotIn,
            operand: Operand::List(values),
        }
    }

    /// `column LIKE pattern`, where `%` matches any run and `_` one character
    ///
    /// Case follows the table's string comparison mode.
    pub fn like(column: usize, pattern: &str) -> Self {
        Self {
            column,
            operator: Operator::Like,
            operand: Operand::Pattern {
                pattern: pattern.to_string(),
                exact: compile_like(pattern, false),
                folded: compile_like(pattern, true),
            },
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }
}

/// Translate a LIKE pattern into an anchored regex
fn compile_like(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    let mut regex_pattern = String::with_capacity(pattern.len() * 2 + 6);
    if case_insensitive {
        regex_pattern.push_str("(?i)");
    }
    regex_pattern.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex_pattern.push_str(".*"),
            '_' => regex_pattern.push('.'),
            _ => regex_pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    regex_pattern.push('$');
    Regex::new(&regex_pattern).ok()
}

impl RowFilter for ComparisonFilter {
    fn evaluate(&self, cache: &RecordCache, record: RecordId) -> Result<bool> {
        let is_null = cache.is_null(record, self.column)?;
        match self.operator {
            Operator::IsNull => return Ok(is_null),
            Operator::IsNotNull => return Ok(!is_null),
            _ if is_null => return Ok(false),
            _ => {}
        }

        let store = cache
            .column(self.column)
            .ok_or(Error::ColumnIndexOutOfBounds { index: self.column })?;
        let slot = record as usize;

        match &self.operand {
            Operand::Value(literal) => {
                if literal.is_null() {
                    return Ok(false);
                }
                let ord = store.compare_to_value(slot, literal)?;
                Ok(match self.operator {
                    Operator::Eq => ord == Ordering::Equal,
                    Operator::Ne => ord != Ordering::Equal,
                    Operator::Gt => ord == Ordering::Greater,
                    Operator::Gte => ord != Ordering::Less,
                    Operator::Lt => ord == Ordering::Less,
                    Operator::Lte => ord != Ordering::Greater,
                    _ => false,
                })
            }
            Operand::List(values) => {
                // Items that don't convert to the column type never match
                let found = values.iter().any(|v| {
                    !v.is_null() && matches!(store.compare_to_value(slot, v), Ok(Ordering::Equal))
                });
                Ok(match self.operator {
                    Operator::In => found,
                    Operator::NotIn => !found,
                    _ => false,
                })
            }
            Operand::Pattern { exact, folded, .. } => {
                let regex = if cache.case_sensitive() { exact } else { folded };
                let text = store.get(slot).to_string();
                Ok(regex.as_ref().is_some_and(|r| r.is_match(&text)))
            }
            Operand::None => Ok(false),
        }
    }
}

impl fmt::Display for ComparisonFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Operand::None => write!(f, "#{} {}", self.column, self.operator),
            Operand::Value(v) => write!(f, "#{} {} {}", self.column, self.operator, v),
            Operand::List(values) => {
                write!(f, "#{} {} (", self.column, self.operator)?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Operand::Pattern { pattern, .. } => {
                write!(f, "#{} LIKE '{}'", self.column, pattern)
            }
        }
    }
}

/// AND filter - true if every child is true
///
/// Short-circuits on the first false child. An empty AND is true.
#[derive(Debug)]
pub struct AndFilter {
    filters: Vec<Box<dyn RowFilter>>,
}

impl AndFilter {
    pub fn new(filters: Vec<Box<dyn RowFilter>>) -> Self {
        Self { filters }
    }

    /// Create an AND filter from two filters
    pub fn and(left: Box<dyn RowFilter>, right: Box<dyn RowFilter>) -> Self {
        Self::new(vec![left, right])
    }
}

impl RowFilter for AndFilter {
    fn evaluate(&self, cache: &RecordCache, record: RecordId) -> Result<bool> {
        for filter in &self.filters {
            if !filter.evaluate(cache, record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches(&self, cache: &RecordCache, record: RecordId) -> bool {
        self.filters.iter().all(|f| f.matches(cache, record))
    }
}

/// OR filter - true if any child is true
///
/// Short-circuits on the first true child. An empty OR is false.
#[derive(Debug)]
pub struct OrFilter {
    filters: Vec<Box<dyn RowFilter>>,
}

impl OrFilter {
    pub fn new(filters: Vec<Box<dyn RowFilter>>) -> Self {
        Self { filters }
    }

    /// Create an OR filter from two filters
    pub fn or(left: Box<dyn RowFilter>, right: Box<dyn RowFilter>) -> Self {
        Self::new(vec![left, right])
    }
}

impl RowFilter for OrFilter {
    fn evaluate(&self, cache: &RecordCache, record: RecordId) -> Result<bool> {
        for filter in &self.filters {
            if filter.evaluate(cache, record)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn matches(&self, cache: &RecordCache, record: RecordId) -> bool {
        self.filters.iter().any(|f| f.matches(cache, record))
    }
}

/// NOT filter
#[derive(Debug)]
pub struct NotFilter {
    inner: Box<dyn RowFilter>,
}

impl NotFilter {
    pub fn new(inner: Box<dyn RowFilter>) -> Self {
        Self { inner }
    }
}

impl RowFilter for NotFilter {
    fn evaluate(&self, cache: &RecordCache, record: RecordId) -> Result<bool> {
        Ok(!self.inner.evaluate(cache, record)?)
    }
}

type FilterFn = dyn Fn(&RecordCache, RecordId) -> bool + Send + Sync;

/// Filter backed by a closure
pub struct FnFilter {
    name: String,
    f: Box<FilterFn>,
}

impl FnFilter {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(&RecordCache, RecordId) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for FnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter").field("name", &self.name).finish()
    }
}

impl RowFilter for FnFilter {
    fn evaluate(&self, cache: &RecordCache, record: RecordId) -> Result<bool> {
        Ok((self.f)(cache, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, SchemaBuilder};
    use crate::storage::config::CacheConfig;

    fn fixture() -> (RecordCache, Vec<RecordId>) {
        let schema = SchemaBuilder::new("people")
            .add("age", DataType::Int32)
            .add_string("name", 32)
            .build()
            .unwrap();
        let mut cache = RecordCache::new(&schema, CacheConfig::default());
        let rows = [
            (Value::Int32(30), Value::from("Alice")),
            (Value::Int32(17), Value::from("bob")),
            (Value::Null, Value::from("Carol")),
        ];
        let mut records = Vec::new();
        for (age, name) in rows {
            let r = cache.new_record().unwrap();
            cache.set_record_values(r, &[age, name]).unwrap();
            records.push(r);
        }
        (cache, records)
    }

    #[test]
    fn test_comparison_operators() {
        let (cache, r) = fixture();
        let adult = ComparisonFilter::new(0, Operator::Gte, 18).unwrap();
        assert!(adult.matches(&cache, r[0]));
        assert!(!adult.matches(&cache, r[1]));
        // NULL never satisfies a comparison
        assert!(!adult.matches(&cache, r[2]));

        let ne = ComparisonFilter::new(0, Operator::Ne, 30).unwrap();
        assert!(!ne.matches(&cache, r[0]));
        assert!(ne.matches(&cache, r[1]));
        assert!(!ne.matches(&cache, r[2]));

        // Literal converted to the column type
        let lt = ComparisonFilter::new(0, Operator::Lt, "20").unwrap();
        assert!(lt.matches(&cache, r[1]));
    }

    #[test]
    fn test_null_checks() {
        let (cache, r) = fixture();
        assert!(ComparisonFilter::is_null(0).matches(&cache, r[2]));
        assert!(!ComparisonFilter::is_null(0).matches(&cache, r[0]));
        assert!(ComparisonFilter::is_not_null(0).matches(&cache, r[1]));
    }

    #[test]
    fn test_conversion_error_is_no_match() {
        let (cache, r) = fixture();
        let bad = ComparisonFilter::eq(0, "abc");
        assert!(bad.evaluate(&cache, r[0]).is_err());
        assert!(!bad.matches(&cache, r[0]));
    }

    #[test]
    fn test_in_list() {
        let (cache, r) = fixture();
        let f = ComparisonFilter::in_list(0, vec![Value::Int32(17), Value::from("x")]);
        assert!(f.matches(&cache, r[1]));
        assert!(!f.matches(&cache, r[0]));
        let nf = ComparisonFilter::not_in_list(0, vec![Value::Int32(17)]);
        assert!(nf.matches(&cache, r[0]));
        assert!(!nf.matches(&cache, r[2]));
        assert!(ComparisonFilter::new(0, Operator::In, 1).is_err());
    }

    #[test]
    fn test_like_follows_case_mode() {
        let (mut cache, r) = fixture();
        let f = ComparisonFilter::like(1, "B_b%");
        assert!(f.matches(&cache, r[1]));
        assert!(!f.matches(&cache, r[0]));
        cache.set_case_sensitive(true);
        assert!(!f.matches(&cache, r[1]));
        assert!(ComparisonFilter::like(1, "%ro%").matches(&cache, r[2]));
        // Regex metacharacters are literal
        assert!(!ComparisonFilter::like(1, "A.*").matches(&cache, r[0]));
    }

    #[test]
    fn test_logical_filters() {
        let (cache, r) = fixture();
        let teen_or_null = OrFilter::or(
            Box::new(ComparisonFilter::new(0, Operator::Lt, 18).unwrap()),
            Box::new(ComparisonFilter::is_null(0)),
        );
        assert!(!teen_or_null.matches(&cache, r[0]));
        assert!(teen_or_null.matches(&cache, r[1]));
        assert!(teen_or_null.matches(&cache, r[2]));

        let both = AndFilter::and(
            Box::new(ComparisonFilter::is_not_null(0)),
            Box::new(ComparisonFilter::like(1, "a%")),
        );
        assert!(both.matches(&cache, r[0]));
        assert!(!both.matches(&cache, r[1]));

        let not = NotFilter::new(Box::new(both));
        assert!(!not.matches(&cache, r[0]));
        assert!(not.matches(&cache, r[2]));

        assert!(AndFilter::new(vec![]).matches(&cache, r[0]));
        assert!(!OrFilter::new(vec![]).matches(&cache, r[0]));
    }

    #[test]
    fn test_fn_filter() {
        let (cache, r) = fixture();
        let even = FnFilter::new("even age", |cache, record| {
            cache
                .get_value(record, 0)
                .ok()
                .and_then(|v| v.as_i64())
                .is_some_and(|age| age % 2 == 0)
        });
        assert!(even.matches(&cache, r[0]));
        assert!(!even.matches(&cache, r[1]));
        assert!(format!("{:?}", even).contains("even age"));
    }

    #[test]
    fn test_display() {
        let f = ComparisonFilter::new(2, Operator::Gt, 5).unwrap();
        assert_eq!(f.to_string(), "#2 > 5");
        let l = ComparisonFilter::like(1, "a%");
        assert_eq!(l.to_string(), "#1 LIKE 'a%'");
    }
}
