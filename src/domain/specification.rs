//! Storage-agnostic query specifications
//!
//! A specification describes which entities a read path wants (filter,
//! related data, ordering, page window) without committing to a storage
//! technology. Each entity exposes a field enum plus [`SpecTarget`],
//! repositories translate the closed primitive set into their own query
//! syntax, and [`evaluate`] applies it directly for in-memory sources.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Comparison operators a filter clause may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Case-insensitive substring match; defined for text operands only.
    Contains,
}

/// Filter operand values. A closed set so every storage backend can
/// translate them; no closures cross the repository boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    Id(Uuid),
    Timestamp(DateTime<Utc>),
    Null,
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    /// Order two values of the same variant. Mixed variants and `Null`
    /// do not compare.
    fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (FilterValue::Text(a), FilterValue::Text(b)) => Some(a.cmp(b)),
            (FilterValue::Integer(a), FilterValue::Integer(b)) => Some(a.cmp(b)),
            (FilterValue::Decimal(a), FilterValue::Decimal(b)) => Some(a.cmp(b)),
            (FilterValue::Boolean(a), FilterValue::Boolean(b)) => Some(a.cmp(b)),
            (FilterValue::Id(a), FilterValue::Id(b)) => Some(a.cmp(b)),
            (FilterValue::Timestamp(a), FilterValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn contains_text(&self, needle: &FilterValue) -> bool {
        match (self, needle) {
            (FilterValue::Text(haystack), FilterValue::Text(needle)) => haystack
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => false,
        }
    }
}

/// One filter clause over a typed field.
#[derive(Debug, Clone)]
pub struct Filter<F> {
    pub field: F,
    pub op: CompareOp,
    pub value: FilterValue,
}

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field ordering.
#[derive(Debug, Clone)]
pub struct OrderBy<F> {
    pub field: F,
    pub direction: Direction,
}

/// Page window applied after filtering and ordering.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

/// Immutable query description for one entity type.
///
/// Built fluently:
///
/// ```ignore
/// let spec = Specification::new()
///     .filter(BookingField::UserId, CompareOp::Eq, FilterValue::Id(user_id))
///     .include("lines")
///     .order_by(BookingField::CreatedAt, Direction::Descending)
///     .page(0, 20);
/// ```
#[derive(Debug, Clone)]
pub struct Specification<F> {
    filters: Vec<Filter<F>>,
    includes: Vec<&'static str>,
    order: Option<OrderBy<F>>,
    page: Option<Page>,
}

impl<F> Default for Specification<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Specification<F> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            includes: Vec::new(),
            order: None,
            page: None,
        }
    }

    /// Add a filter clause; all clauses must hold (conjunction).
    pub fn filter(mut self, field: F, op: CompareOp, value: FilterValue) -> Self {
        self.filters.push(Filter { field, op, value });
        self
    }

    /// Request a related-data path. A hint for storage backends that
    /// load lazily; in-memory entities already carry their relations.
    pub fn include(mut self, path: &'static str) -> Self {
        self.includes.push(path);
        self
    }

    /// Order results by one field. A later call replaces an earlier one.
    pub fn order_by(mut self, field: F, direction: Direction) -> Self {
        self.order = Some(OrderBy { field, direction });
        self
    }

    /// Keep `limit` results starting at `offset`, after ordering.
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.page = Some(Page { offset, limit });
        self
    }

    pub fn filters(&self) -> &[Filter<F>] {
        &self.filters
    }

    pub fn includes(&self) -> &[&'static str] {
        &self.includes
    }

    pub fn order(&self) -> Option<&OrderBy<F>> {
        self.order.as_ref()
    }

    pub fn page_window(&self) -> Option<Page> {
        self.page
    }
}

/// Implemented by entities readable through specifications.
pub trait SpecTarget {
    /// Queryable-field enum for this entity.
    type Field: Copy;

    /// Current value of one queryable field.
    fn field_value(&self, field: Self::Field) -> FilterValue;
}

impl<F: Copy> Filter<F> {
    pub fn matches<T: SpecTarget<Field = F>>(&self, entity: &T) -> bool {
        let actual = entity.field_value(self.field);
        match self.op {
            CompareOp::Eq => {
                if self.value.is_null() {
                    actual.is_null()
                } else {
                    actual.compare(&self.value) == Some(Ordering::Equal)
                }
            }
            CompareOp::Ne => {
                if self.value.is_null() {
                    !actual.is_null()
                } else {
                    actual.compare(&self.value) != Some(Ordering::Equal)
                }
            }
            CompareOp::Lt => actual.compare(&self.value) == Some(Ordering::Less),
            CompareOp::Le => matches!(
                actual.compare(&self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CompareOp::Gt => actual.compare(&self.value) == Some(Ordering::Greater),
            CompareOp::Ge => matches!(
                actual.compare(&self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Contains => actual.contains_text(&self.value),
        }
    }
}

impl<F: Copy> Specification<F> {
    /// True when every filter clause matches the entity.
    pub fn is_satisfied_by<T: SpecTarget<Field = F>>(&self, entity: &T) -> bool {
        self.filters.iter().all(|filter| filter.matches(entity))
    }
}

/// Apply a specification to an in-memory source: filter, then order,
/// then page, in that fixed order. Include paths are no-ops here since
/// the entities are already fully loaded.
pub fn evaluate<T>(spec: &Specification<T::Field>, source: &[T]) -> Vec<T>
where
    T: SpecTarget + Clone,
{
    let mut items: Vec<T> = source
        .iter()
        .filter(|entity| spec.is_satisfied_by(*entity))
        .cloned()
        .collect();

    if let Some(order) = spec.order() {
        items.sort_by(|a, b| {
            let ordering = a
                .field_value(order.field)
                .compare(&b.field_value(order.field))
                .unwrap_or(Ordering::Equal);
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }

    match spec.page_window() {
        Some(page) => items.into_iter().skip(page.offset).take(page.limit).collect(),
        None => items,
    }
}

// ── Tests ──────────────────────────────────────────────────────
