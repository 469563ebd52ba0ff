//! Transaction store operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    Category, CategoryTotal, DashboardSummary, Direction, Draft, Transaction, UpsertStats,
};

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let direction: String = row.get(4)?;
    let direction = direction.parse::<Direction>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;

    let date: String = row.get(5)?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let category: String = row.get(6)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        direction,
        date,
        category: Category::clamped(&category),
        confidence: row.get(7)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

const TX_COLUMNS: &str =
    "id, title, description, amount, direction, date, category, confidence, created_at, updated_at";

impl Database {
    /// Bulk insert-or-replace keyed by the derived identifier
    ///
    /// Existing rows are fully overwritten (not merged field by field);
    /// `created_at` is preserved, `updated_at` advances. No ordering
    /// dependency exists between records in one batch.
    pub fn upsert_transactions(&self, drafts: &[Draft]) -> Result<UpsertStats> {
        let conn = self.conn()?;
        let mut stats = UpsertStats::default();

        for draft in drafts {
            let category = draft.category.unwrap_or(Category::Outros);

            let exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM transactions WHERE id = ?",
                    params![draft.id],
                    |row| row.get(0),
                )
                .optional()?;

            if exists.is_some() {
                conn.execute(
                    r#"
                    UPDATE transactions
                    SET title = ?, description = ?, amount = ?, direction = ?,
                        date = ?, category = ?, confidence = ?,
                        updated_at = datetime('now')
                    WHERE id = ?
                    "#,
                    params![
                        draft.title,
                        draft.description,
                        draft.amount,
                        draft.direction.as_str(),
                        draft.date.format("%Y-%m-%d").to_string(),
                        category.as_str(),
                        draft.confidence,
                        draft.id,
                    ],
                )?;
                stats.updated += 1;
            } else {
                conn.execute(
                    r#"
                    INSERT INTO transactions (id, title, description, amount, direction, date, category, confidence)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                    params![
                        draft.id,
                        draft.title,
                        draft.description,
                        draft.amount,
                        draft.direction.as_str(),
                        draft.date.format("%Y-%m-%d").to_string(),
                        category.as_str(),
                        draft.confidence,
                    ],
                )?;
                stats.inserted += 1;
            }
        }

        Ok(stats)
    }

    /// Most recent records, date-descending
    pub fn list_recent(&self, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY date DESC, id LIMIT ?",
            TX_COLUMNS
        ))?;
        let rows = stmt.query_map(params![limit], row_to_transaction)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    /// Records inside one calendar month, date-ascending
    pub fn list_by_month(&self, year: i32, month: u32) -> Result<Vec<Transaction>> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidData(format!("Invalid month: {}-{}", year, month)))?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| Error::InvalidData(format!("Invalid month: {}-{}", year, month)))?;

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE date >= ? AND date < ? ORDER BY date, id",
            TX_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string()
            ],
            row_to_transaction,
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    pub fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM transactions WHERE id = ?", TX_COLUMNS),
            params![id],
            row_to_transaction,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .map_err(Error::from)
    }

    /// Aggregate summary for the dashboard UI
    pub fn dashboard_summary(&self) -> Result<DashboardSummary> {
        let conn = self.conn()?;

        let income_total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE direction = 'income'",
            [],
            |row| row.get(0),
        )?;
        let expense_total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE direction = 'expense'",
            [],
            |row| row.get(0),
        )?;
        let total_transactions: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT category, SUM(amount) as total, COUNT(*) as cnt
            FROM transactions
            WHERE direction = 'expense'
            GROUP BY category
            ORDER BY total DESC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let category: String = row.get(0)?;
            Ok(CategoryTotal {
                category: Category::clamped(&category),
                total: row.get(1)?,
                transaction_count: row.get(2)?,
            })
        })?;
        let expenses_by_category = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(DashboardSummary {
            income_total,
            expense_total,
            balance: income_total - expense_total,
            total_transactions,
            expenses_by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str, date: (i32, u32, u32), amount: f64, direction: Direction) -> Draft {
        Draft {
            id: id.to_string(),
            title: "Posto".to_string(),
            description: "compra no débito posto".to_string(),
            amount,
            direction,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            category: Some(Category::Transporte),
            confidence: Some(1.0),
        }
    }

    #[test]
    fn test_upsert_counts_inserts_then_updates() {
        let db = Database::in_memory().unwrap();
        let drafts = vec![
            draft("a", (2025, 3, 5), 45.90, Direction::Expense),
            draft("b", (2025, 3, 6), 12.00, Direction::Expense),
        ];

        let stats = db.upsert_transactions(&drafts).unwrap();
        assert_eq!(stats, UpsertStats { inserted: 2, updated: 0 });

        let stats = db.upsert_transactions(&drafts).unwrap();
        assert_eq!(stats, UpsertStats { inserted: 0, updated: 2 });
        assert_eq!(db.count_transactions().unwrap(), 2);
    }

    #[test]
    fn test_upsert_overwrites_all_fields() {
        let db = Database::in_memory().unwrap();
        let mut d = draft("a", (2025, 3, 5), 45.90, Direction::Expense);
        db.upsert_transactions(std::slice::from_ref(&d)).unwrap();

        d.title = "Shell".to_string();
        d.category = Some(Category::Outros);
        d.confidence = Some(0.2);
        db.upsert_transactions(std::slice::from_ref(&d)).unwrap();

        let stored = db.get_transaction("a").unwrap().unwrap();
        assert_eq!(stored.title, "Shell");
        assert_eq!(stored.category, Category::Outros);
        assert_eq!(stored.confidence, Some(0.2));
    }

    #[test]
    fn test_reimport_is_byte_identical() {
        let db = Database::in_memory().unwrap();
        let drafts = vec![draft("a", (2025, 3, 5), 45.90, Direction::Expense)];

        db.upsert_transactions(&drafts).unwrap();
        let first = db.get_transaction("a").unwrap().unwrap();

        db.upsert_transactions(&drafts).unwrap();
        let second = db.get_transaction("a").unwrap().unwrap();

        assert_eq!(first.title, second.title);
        assert_eq!(first.description, second.description);
        assert_eq!(first.amount, second.amount);
        assert_eq!(first.direction, second.direction);
        assert_eq!(first.date, second.date);
        assert_eq!(first.category, second.category);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.created_at, second.created_at);
    }

    #[test]
    fn test_list_recent_orders_by_date_desc() {
        let db = Database::in_memory().unwrap();
        db.upsert_transactions(&[
            draft("old", (2025, 1, 1), 10.0, Direction::Expense),
            draft("new", (2025, 3, 1), 20.0, Direction::Expense),
            draft("mid", (2025, 2, 1), 30.0, Direction::Expense),
        ])
        .unwrap();

        let recent = db.list_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "new");
        assert_eq!(recent[1].id, "mid");
    }

    #[test]
    fn test_list_by_month_bounds() {
        let db = Database::in_memory().unwrap();
        db.upsert_transactions(&[
            draft("feb", (2025, 2, 28), 10.0, Direction::Expense),
            draft("mar1", (2025, 3, 1), 20.0, Direction::Expense),
            draft("mar31", (2025, 3, 31), 30.0, Direction::Expense),
            draft("apr", (2025, 4, 1), 40.0, Direction::Expense),
        ])
        .unwrap();

        let march = db.list_by_month(2025, 3).unwrap();
        assert_eq!(march.len(), 2);
        assert_eq!(march[0].id, "mar1");
        assert_eq!(march[1].id, "mar31");

        // december wraps into the next year
        db.upsert_transactions(&[draft("dec", (2025, 12, 31), 5.0, Direction::Expense)])
            .unwrap();
        assert_eq!(db.list_by_month(2025, 12).unwrap().len(), 1);

        assert!(db.list_by_month(2025, 13).is_err());
    }

    #[test]
    fn test_dashboard_summary() {
        let db = Database::in_memory().unwrap();
        let mut salary = draft("salary", (2025, 3, 1), 2500.0, Direction::Income);
        salary.category = Some(Category::Entradas);
        db.upsert_transactions(&[
            salary,
            draft("gas1", (2025, 3, 5), 45.90, Direction::Expense),
            draft("gas2", (2025, 3, 9), 54.10, Direction::Expense),
        ])
        .unwrap();

        let summary = db.dashboard_summary().unwrap();
        assert_eq!(summary.income_total, 2500.0);
        assert_eq!(summary.expense_total, 100.0);
        assert_eq!(summary.balance, 2400.0);
        assert_eq!(summary.total_transactions, 3);
        assert_eq!(summary.expenses_by_category.len(), 1);
        assert_eq!(
            summary.expenses_by_category[0].category,
            Category::Transporte
        );
        assert_eq!(summary.expenses_by_category[0].transaction_count, 2);
    }
}
