// ==========================================
// DAT 导入 - 实体解析器
// ==========================================
// 职责: DatRecord → 客户（查找或创建）→ 发票（消歧后查找或创建）→ 发票行（总是插入）
// 写入次数: 每行 1~3 次（可选客户、可选发票、必有发票行）
// 事务: 由调用方持有，这里只借用连接
// ==========================================

use crate::domain::billing::{NewCustomer, NewInvoice, NewInvoiceLine, INVOICE_STATUS_OPEN};
use crate::domain::dat_record::DatRecord;
use crate::importer::invoice_numbering::InvoiceNumberAllocator;
use crate::repository::billing_repo::BillingRepository;
use crate::repository::error::RepositoryResult;
use rusqlite::Connection;
use tracing::debug;

/// 单行解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine {
    pub customer_db_id: i64,
    pub customer_created: bool,
    pub invoice_id: i64,
    pub invoice_number: String, // 有效发票号
    pub invoice_created: bool,
    pub invoice_line_id: i64,
}

pub struct EntityResolver<'c> {
    repo: BillingRepository<'c>,
}

impl<'c> EntityResolver<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            repo: BillingRepository::new(conn),
        }
    }

    /// 解析整行：客户 → 发票号消歧 → 发票 → 发票行
    pub fn resolve(
        &self,
        record: &DatRecord,
        numbering: &mut InvoiceNumberAllocator,
    ) -> RepositoryResult<ResolvedLine> {
        let (customer_db_id, customer_created) = self.resolve_customer(record)?;

        let invoice_number = numbering.next_effective_number(&record.invoice_number);
        let (invoice_id, invoice_created) =
            self.resolve_invoice(&invoice_number, customer_db_id, record)?;

        let invoice_line_id = self.append_line(invoice_id, record)?;

        Ok(ResolvedLine {
            customer_db_id,
            customer_created,
            invoice_id,
            invoice_number,
            invoice_created,
            invoice_line_id,
        })
    }

    /// 按 (标准化编号, 简称) 查找客户，不存在则创建
    ///
    /// # 返回
    /// - (customers.id, 是否新建)
    pub fn resolve_customer(&self, record: &DatRecord) -> RepositoryResult<(i64, bool)> {
        let customer_id = record.normalized_customer_id();

        if let Some(id) = self.repo.find_customer_id(&customer_id, &record.short_name)? {
            return Ok((id, false));
        }

        let id = self
            .repo
            .insert_customer(&NewCustomer::from_import(&customer_id, &record.short_name))?;
        debug!(
            customer_id = %customer_id,
            short_name = %record.short_name,
            id = id,
            "新建客户"
        );
        Ok((id, true))
    }

    /// 按 (有效发票号, customers.id) 查找发票，不存在则创建
    ///
    /// 已存在的发票不更新，总额只取创建行的 数量 × 单价
    pub fn resolve_invoice(
        &self,
        invoice_number: &str,
        customer_db_id: i64,
        record: &DatRecord,
    ) -> RepositoryResult<(i64, bool)> {
        if let Some(id) = self.repo.find_invoice_id(invoice_number, customer_db_id)? {
            return Ok((id, false));
        }

        let id = self.repo.insert_invoice(&NewInvoice {
            invoice_number: invoice_number.to_string(),
            customer_id: customer_db_id,
            invoice_date: record.invoice_date,
            total_amount: record.line_total(),
            status: INVOICE_STATUS_OPEN.to_string(),
            tax_invoice_number: None,
        })?;
        debug!(invoice_number = %invoice_number, id = id, "新建发票");
        Ok((id, true))
    }

    /// 追加发票行（无条件插入）
    pub fn append_line(&self, invoice_id: i64, record: &DatRecord) -> RepositoryResult<i64> {
        self.repo.insert_invoice_line(&NewInvoiceLine::from_import(
            invoice_id,
            &record.item_code,
            record.quantity,
            record.unit_price,
            &record.item_details.color,
            &record.item_details.delivery_note,
        ))
    }
}
