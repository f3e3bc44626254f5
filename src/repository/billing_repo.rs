// ==========================================
// DAT 导入 - 账单数据仓储
// ==========================================
// 职责: customers / invoices / invoice_lines 的参数化读写
// 红线: Repository 不含业务规则（编号消歧、过滤在导入层）
// 说明: 借用外部连接，调用方可传入 Transaction / Savepoint（均 Deref 为 Connection）
// ==========================================

use crate::domain::billing::{
    Customer, Invoice, InvoiceLine, NewCustomer, NewInvoice, NewInvoiceLine,
};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

// ==========================================
// BillingRepository - 账单仓储
// ==========================================
pub struct BillingRepository<'c> {
    conn: &'c Connection,
}

impl<'c> BillingRepository<'c> {
    /// 基于已有连接（或事务/保存点）创建仓储
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ===== 客户 =====

    /// 按自然键 (customer_id, short_name) 精确查找客户行 id
    pub fn find_customer_id(
        &self,
        customer_id: &str,
        short_name: &str,
    ) -> RepositoryResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM customers WHERE customer_id = ?1 AND short_name = ?2",
                params![customer_id, short_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 插入客户，返回自增 id
    pub fn insert_customer(&self, customer: &NewCustomer) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO customers (
                customer_id, short_name, full_name, registration_date, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                customer.customer_id,
                customer.short_name,
                customer.full_name,
                customer.registration_date.map(format_date),
                customer.is_active,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_customer(&self, id: i64) -> RepositoryResult<Option<Customer>> {
        let customer = self
            .conn
            .query_row(
                r#"
                SELECT id, customer_id, short_name, full_name, registration_date, is_active
                FROM customers WHERE id = ?1
                "#,
                params![id],
                map_customer,
            )
            .optional()?;
        Ok(customer)
    }

    pub fn list_customers(&self) -> RepositoryResult<Vec<Customer>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, customer_id, short_name, full_name, registration_date, is_active
            FROM customers ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], map_customer)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ===== 发票头 =====

    /// 按自然键 (invoice_number, customers.id) 精确查找发票行 id
    pub fn find_invoice_id(
        &self,
        invoice_number: &str,
        customer_db_id: i64,
    ) -> RepositoryResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM invoices WHERE invoice_number = ?1 AND customer_id = ?2",
                params![invoice_number, customer_db_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 插入发票头，返回自增 id
    pub fn insert_invoice(&self, invoice: &NewInvoice) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO invoices (
                invoice_number, customer_id, invoice_date, total_amount, status, tax_invoice_number
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                invoice.invoice_number,
                invoice.customer_id,
                invoice.invoice_date.map(format_date),
                invoice.total_amount,
                invoice.status,
                invoice.tax_invoice_number,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_invoice(&self, id: i64) -> RepositoryResult<Option<Invoice>> {
        let invoice = self
            .conn
            .query_row(
                r#"
                SELECT id, invoice_number, customer_id, invoice_date, total_amount,
                       status, tax_invoice_number
                FROM invoices WHERE id = ?1
                "#,
                params![id],
                map_invoice,
            )
            .optional()?;
        Ok(invoice)
    }

    /// 查询客户的全部发票（按发票号排序）
    pub fn list_invoices_by_customer(
        &self,
        customer_db_id: i64,
    ) -> RepositoryResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, invoice_number, customer_id, invoice_date, total_amount,
                   status, tax_invoice_number
            FROM invoices WHERE customer_id = ?1
            ORDER BY invoice_number
            "#,
        )?;
        let rows = stmt.query_map(params![customer_db_id], map_invoice)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ===== 发票行 =====

    /// 插入发票行（无条件插入，不查重）
    pub fn insert_invoice_line(&self, line: &NewInvoiceLine) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO invoice_lines (
                invoice_id, item_name, quantity, unit_price, delivered_location,
                is_defective, color, delivery_note, yards_sent, yards_consumed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                line.invoice_id,
                line.item_name,
                line.quantity,
                line.unit_price,
                line.delivered_location,
                line.is_defective,
                line.color,
                line.delivery_note,
                line.yards_sent,
                line.yards_consumed,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_invoice_lines(&self, invoice_id: i64) -> RepositoryResult<Vec<InvoiceLine>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, invoice_id, item_name, quantity, unit_price, delivered_location,
                   is_defective, color, delivery_note, yards_sent, yards_consumed
            FROM invoice_lines WHERE invoice_id = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![invoice_id], map_invoice_line)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ===== 统计 =====

    pub fn count_customers(&self) -> RepositoryResult<i64> {
        self.count("customers")
    }

    pub fn count_invoices(&self) -> RepositoryResult<i64> {
        self.count("invoices")
    }

    pub fn count_invoice_lines(&self) -> RepositoryResult<i64> {
        self.count("invoice_lines")
    }

    fn count(&self, table: &'static str) -> RepositoryResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

// ==========================================
// 行映射
// ==========================================

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn map_customer(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        short_name: row.get(2)?,
        full_name: row.get(3)?,
        registration_date: parse_date(row.get(4)?),
        is_active: row.get(5)?,
    })
}

fn map_invoice(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        customer_id: row.get(2)?,
        invoice_date: parse_date(row.get(3)?),
        total_amount: row.get(4)?,
        status: row.get(5)?,
        tax_invoice_number: row.get(6)?,
    })
}

fn map_invoice_line(row: &Row<'_>) -> rusqlite::Result<InvoiceLine> {
    Ok(InvoiceLine {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        item_name: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: row.get(4)?,
        delivered_location: row.get(5)?,
        is_defective: row.get(6)?,
        color: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        delivery_note: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        yards_sent: row.get(9)?,
        yards_consumed: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_import_schema};
    use crate::domain::billing::INVOICE_STATUS_OPEN;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_import_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_customer_insert_and_find() {
        let conn = setup();
        let repo = BillingRepository::new(&conn);

        assert_eq!(repo.find_customer_id("7", "ACME").unwrap(), None);

        let id = repo
            .insert_customer(&NewCustomer::from_import("7", "ACME"))
            .unwrap();
        assert_eq!(repo.find_customer_id("7", "ACME").unwrap(), Some(id));
        // 自然键是二元组，简称不同视为不同客户
        assert_eq!(repo.find_customer_id("7", "ACME2").unwrap(), None);

        let customer = repo.get_customer(id).unwrap().unwrap();
        assert_eq!(customer.full_name.as_deref(), Some("ACME"));
        assert!(customer.is_active);
        assert_eq!(customer.registration_date, None);
    }

    #[test]
    fn test_duplicate_customer_rejected() {
        let conn = setup();
        let repo = BillingRepository::new(&conn);

        repo.insert_customer(&NewCustomer::from_import("7", "ACME"))
            .unwrap();
        let err = repo
            .insert_customer(&NewCustomer::from_import("7", "ACME"))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::repository::error::RepositoryError::UniqueConstraintViolation(_)
        ));
    }

    #[test]
    fn test_invoice_and_lines() {
        let conn = setup();
        let repo = BillingRepository::new(&conn);

        let customer_id = repo
            .insert_customer(&NewCustomer::from_import("7", "ACME"))
            .unwrap();
        let invoice_id = repo
            .insert_invoice(&NewInvoice {
                invoice_number: "1001-01".to_string(),
                customer_id,
                invoice_date: NaiveDate::from_ymd_opt(2024, 6, 1),
                total_amount: 25.0,
                status: INVOICE_STATUS_OPEN.to_string(),
                tax_invoice_number: None,
            })
            .unwrap();

        assert_eq!(
            repo.find_invoice_id("1001-01", customer_id).unwrap(),
            Some(invoice_id)
        );

        repo.insert_invoice_line(&NewInvoiceLine::from_import(
            invoice_id, "FAB-1", 10.0, 2.5, "RED", "N1",
        ))
        .unwrap();
        repo.insert_invoice_line(&NewInvoiceLine::from_import(
            invoice_id, "FAB-1", 10.0, 2.5, "RED", "N1",
        ))
        .unwrap();

        let lines = repo.list_invoice_lines(invoice_id).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].yards_sent, 10.0);
        assert_eq!(lines[0].yards_consumed, 0.0);
        assert!(!lines[0].is_defective);

        let invoice = repo.get_invoice(invoice_id).unwrap().unwrap();
        assert_eq!(invoice.invoice_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(invoice.status, "open");
        assert_eq!(repo.count_invoice_lines().unwrap(), 2);
    }

    #[test]
    fn test_invoice_line_requires_invoice() {
        let conn = setup();
        let repo = BillingRepository::new(&conn);

        let err = repo
            .insert_invoice_line(&NewInvoiceLine::from_import(999, "X", 1.0, 1.0, "", ""))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::repository::error::RepositoryError::ForeignKeyViolation(_)
        ));
    }
}
