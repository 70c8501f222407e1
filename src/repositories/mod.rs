pub(crate) mod accounts;
pub(crate) mod course_records;
pub(crate) mod courses;
pub(crate) mod exam_records;
pub(crate) mod exams;
pub(crate) mod materials;
pub(crate) mod menus;
pub(crate) mod permissions;
pub(crate) mod questions;
pub(crate) mod roles;
pub(crate) mod topics;

use sqlx::{Postgres, QueryBuilder};

/// Appends `WHERE`/`AND` as needed while a filter is being assembled.
pub(crate) struct Conditions {
    has_where: bool,
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self { has_where: false }
    }

    /// Starts from queries that already carry a `WHERE` clause.
    pub(crate) fn continuing() -> Self {
        Self { has_where: true }
    }

    pub(crate) fn next<'a>(&mut self, builder: &mut QueryBuilder<'a, Postgres>) {
        if self.has_where {
            builder.push(" AND ");
        } else {
            builder.push(" WHERE ");
            self.has_where = true;
        }
    }
}

/// `%term%` for ILIKE searches, with LIKE wildcards escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}
