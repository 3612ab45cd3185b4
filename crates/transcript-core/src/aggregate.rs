//! Credit aggregation over standardized tables.

use crate::classify::{Category, RuleSet};
use crate::columns::{Field, StandardTable};
use crate::grade::is_passing;
use crate::text::normalize_text;

/// One course row in the canonical schema.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CourseRecord {
    pub name: String,
    pub credit: f64,
    pub grade: String,
    /// Resolved category; set on passed records only.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub category: Option<Category>,
}

/// Totals and detail lists for one document.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateResult {
    pub total: f64,
    pub required: f64,
    pub elective_i: f64,
    pub elective_ii: f64,
    pub elective_other: f64,
    pub passed: Vec<CourseRecord>,
    pub failed: Vec<CourseRecord>,
}

impl AggregateResult {
    /// Credits accumulated for `category`.
    pub fn category_total(&self, category: Category) -> f64 {
        match category {
            Category::Required => self.required,
            Category::ElectiveI => self.elective_i,
            Category::ElectiveII => self.elective_ii,
            Category::ElectiveOther => self.elective_other,
        }
    }

    /// Number of records seen.
    pub fn record_count(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    /// Passed records in `category`, in source order.
    pub fn passed_in(&self, category: Category) -> impl Iterator<Item = &CourseRecord> {
        self.passed
            .iter()
            .filter(move |r| r.category == Some(category))
    }

    fn add(&mut self, category: Category, credit: f64) {
        self.total += credit;
        let slot = match category {
            Category::Required => &mut self.required,
            Category::ElectiveI => &mut self.elective_i,
            Category::ElectiveII => &mut self.elective_ii,
            Category::ElectiveOther => &mut self.elective_other,
        };
        *slot += credit;
    }
}

/// Parse a credit cell. Unparseable or non-finite values count as zero.
pub fn parse_credit(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Accumulates records from successive tables against one rule set.
pub struct CreditAggregator<'r> {
    rules: &'r RuleSet,
    result: AggregateResult,
}

impl<'r> CreditAggregator<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            result: AggregateResult::default(),
        }
    }

    /// Fold every row of `table` into the running result, in row order.
    pub fn push_table(&mut self, table: &StandardTable) {
        let sample: Vec<&str> = table
            .rows
            .iter()
            .take(5)
            .map(|row| table.cell(row, Field::Name))
            .collect();
        tracing::debug!(?sample, rows = table.rows.len(), "aggregating table");

        for row in &table.rows {
            let name = normalize_text(table.cell(row, Field::Name));
            let credit = parse_credit(table.cell(row, Field::Credit));
            let grade = table.cell(row, Field::Grade).to_string();
            self.push_record(name, credit, grade);
        }
    }

    fn push_record(&mut self, name: String, credit: f64, grade: String) {
        if is_passing(&grade) {
            let category = self.rules.classify(&name);
            tracing::trace!(%name, credit, %grade, %category, "passed");
            self.result.add(category, credit);
            self.result.passed.push(CourseRecord {
                name,
                credit,
                grade,
                category: Some(category),
            });
        } else {
            tracing::trace!(%name, credit, %grade, "failed");
            self.result.failed.push(CourseRecord {
                name,
                credit,
                grade,
                category: None,
            });
        }
    }

    pub fn finish(self) -> AggregateResult {
        self.result
    }
}

/// Aggregate all tables in order.
pub fn aggregate(tables: &[StandardTable], rules: &RuleSet) -> AggregateResult {
    let mut aggregator = CreditAggregator::new(rules);
    for table in tables {
        aggregator.push_table(table);
    }
    aggregator.finish()
}
