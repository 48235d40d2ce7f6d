use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};
use std::marker::PhantomData;

use crate::database::manager::DatabaseError;

/// A table-backed record readable through [`Repository`].
///
/// `SELECT` is the full read projection (joins included) with the base table
/// aliased as `t`, and must not end in a WHERE clause.
pub trait Model: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    const SELECT: &'static str;
    /// Resource name used in "... not found" messages
    const NAME: &'static str;
    const SOFT_DELETES: bool = true;
    const ORDER: &'static str = "t.id DESC";
}

/// A single WHERE condition against the base table
#[derive(Debug, Clone)]
pub enum Filter {
    Eq(&'static str, i64),
    /// Case-insensitive substring match over any of the columns
    Search(&'static [&'static str], String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Saturates for absurd page numbers; the query then returns an empty page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let last_page = (total.saturating_add(request.per_page - 1) / request.per_page).max(1);
        Self {
            items,
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

/// Escape LIKE wildcards so the term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct Repository<T> {
    pub(crate) pool: PgPool,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }
}

impl<T: Model> Repository<T> {
    fn live_clause() -> &'static str {
        if T::SOFT_DELETES {
            " AND t.deleted_at IS NULL"
        } else {
            ""
        }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
        for filter in filters {
            match filter {
                Filter::Eq(column, value) => {
                    qb.push(format!(" AND t.{} = ", column)).push_bind(*value);
                }
                Filter::Search(columns, term) => {
                    let pattern = format!("%{}%", escape_like(term));
                    qb.push(" AND (");
                    for (i, column) in columns.iter().enumerate() {
                        if i > 0 {
                            qb.push(" OR ");
                        }
                        qb.push(format!("t.{} ILIKE ", column))
                            .push_bind(pattern.clone())
                            .push(r" ESCAPE '\'");
                    }
                    qb.push(")");
                }
            }
        }
    }

    pub async fn find(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        let sql = format!("{} WHERE t.id = $1{}", T::SELECT, Self::live_clause());
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_404(&self, id: i64) -> Result<T, DatabaseError> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", T::NAME)))
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<i64, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {} t WHERE TRUE{}",
            T::TABLE,
            Self::live_clause()
        ));
        Self::push_filters(&mut qb, filters);
        let total = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(total)
    }

    pub async fn paginate(&self, filters: &[Filter], request: PageRequest) -> Result<Page<T>, DatabaseError> {
        let total = self.count(filters).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("{} WHERE TRUE{}", T::SELECT, Self::live_clause()));
        Self::push_filters(&mut qb, filters);
        qb.push(format!(" ORDER BY {} LIMIT ", T::ORDER))
            .push_bind(request.per_page)
            .push(" OFFSET ")
            .push_bind(request.offset());

        let items = qb.build_query_as::<T>().fetch_all(&self.pool).await?;
        Ok(Page::new(items, request, total))
    }

    /// Soft delete when the table supports it, hard delete otherwise.
    /// Returns false when no live row matched.
    pub async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let sql = if T::SOFT_DELETES {
            format!(
                "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
                T::TABLE
            )
        } else {
            format!("DELETE FROM {} WHERE id = $1", T::TABLE)
        };
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Begin a partial `UPDATE ... SET` for the row; callers append
    /// assignments with [`Assignments::set`] and finish with [`Assignments::execute`].
    pub fn assignments(&self, id: i64) -> Assignments<'_> {
        Assignments {
            qb: QueryBuilder::new(format!("UPDATE {} SET updated_at = NOW()", T::TABLE)),
            pool: &self.pool,
            id,
            soft_deletes: T::SOFT_DELETES,
            changed: 0,
        }
    }
}

/// Partial update assembled from only the fields a request supplied
pub struct Assignments<'a> {
    qb: QueryBuilder<'a, Postgres>,
    pool: &'a PgPool,
    id: i64,
    soft_deletes: bool,
    changed: usize,
}

impl<'a> Assignments<'a> {
    pub fn set<V>(&mut self, column: &str, value: Option<V>) -> &mut Self
    where
        V: 'a + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.qb.push(format!(", {} = ", column)).push_bind(value);
            self.changed += 1;
        }
        self
    }

    pub fn changed(&self) -> usize {
        self.changed
    }

    pub async fn execute(mut self) -> Result<bool, DatabaseError> {
        self.qb.push(" WHERE id = ").push_bind(self.id);
        if self.soft_deletes {
            self.qb.push(" AND deleted_at IS NULL");
        }
        let result = self.qb.build().execute(self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math() {
        let req = PageRequest::new(3, 15);
        assert_eq!(req.offset(), 30);
        let page = Page::new(vec![1, 2], req, 32);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total, 32);

        let empty: Page<i32> = Page::new(vec![], PageRequest::new(1, 15), 0);
        assert_eq!(empty.last_page, 1);
    }

    #[test]
    fn page_request_clamps_to_first_page() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 1);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let req = PageRequest::new(i64::MAX, 15);
        assert_eq!(req.offset(), i64::MAX);

        let page: Page<i32> = Page::new(vec![], PageRequest::new(1, i64::MAX), 10);
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn search_terms_match_literally() {
        assert_eq!(escape_like("Maple"), "Maple");
        assert_eq!(escape_like("_"), "\\_");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
    }

    #[test]
    fn map_preserves_meta() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(2, 3), 7).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20, 30]);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.last_page, 3);
    }
}
