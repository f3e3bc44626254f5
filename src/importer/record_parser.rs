// ==========================================
// DAT 导入 - 记录解析器
// ==========================================
// 阶段 0: 文件读取（按行切分，分号分隔，无表头，无引号转义）
// 阶段 1: 字段个数校验 + 按位置映射 + 类型转换
// ==========================================

use crate::domain::dat_record::{DatRecord, ItemDetails, MIN_FIELD_COUNT};
use crate::importer::error::{ImportResult, LineError};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// DAT 字段分隔符
pub const FIELD_DELIMITER: char = ';';

// ==========================================
// RawLine - 已切分的源行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub line_number: usize,
    pub fields: Vec<String>,
}

impl RawLine {
    /// 直接切分一行文本（按 ';' 分隔并逐段 TRIM）
    pub fn split(line_number: usize, text: &str) -> Self {
        Self {
            line_number,
            fields: text
                .trim()
                .split(FIELD_DELIMITER)
                .map(|f| f.trim().to_string())
                .collect(),
        }
    }
}

// ==========================================
// DatFileReader - DAT 文件读取
// ==========================================
pub struct DatFileReader;

impl DatFileReader {
    /// 读取整个文件为源行列表（跳过空白行）
    ///
    /// # 说明
    /// - 非法 UTF-8 字节按替换字符解码，不中断读取
    /// - 行号为源文件中的物理行号（1 起，空白行也计数）
    pub fn read_lines(&self, file_path: &Path) -> ImportResult<Vec<RawLine>> {
        let bytes = fs::read(file_path)?;
        let text = String::from_utf8_lossy(&bytes);

        let lines: Vec<RawLine> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| RawLine::split(idx + 1, line))
            .collect();

        debug!(lines = lines.len(), "DAT 文件读取完成");
        Ok(lines)
    }
}

// ==========================================
// RecordParser - 字段映射
// ==========================================
pub struct RecordParser;

impl RecordParser {
    /// 将源行映射为 DatRecord
    ///
    /// # 返回
    /// - Err(LineError::FieldCount): 字段少于 14 个
    ///
    /// # 说明
    /// 数量/单价无法解析时回退为 0 并告警，行仍然导入
    pub fn parse(&self, raw: &RawLine) -> Result<DatRecord, LineError> {
        let f = &raw.fields;
        if f.len() < MIN_FIELD_COUNT {
            return Err(LineError::FieldCount {
                line: raw.line_number,
                expected: MIN_FIELD_COUNT,
                found: f.len(),
            });
        }

        Ok(DatRecord {
            line_number: raw.line_number,
            tax_flag: f[0].clone(),
            short_name: f[1].clone(),
            raw_customer_id: f[2].clone(),
            invoice_date: parse_invoice_date(&f[3]),
            invoice_number: f[4].clone(),
            currency: f[5].clone(),
            item_code: f[6].clone(),
            item_details: ItemDetails::parse(&f[7]),
            quantity: parse_amount(&f[8], "fabric_amount", raw.line_number),
            unit_price: parse_amount(&f[9], "price_per_unit", raw.line_number),
            description: f[11].clone(),
            vat_flag: f[12].clone(),
        })
    }
}

/// 解析 8 位 YYYYMMDD 日期，其余情况为空
fn parse_invoice_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

/// 解析金额类字段：空串视为 0；无法解析或非有限值（NaN / inf）回退 0 并告警
fn parse_amount(value: &str, field: &str, line_number: usize) -> f64 {
    if value.is_empty() {
        return 0.0;
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            warn!(
                line_number = line_number,
                field = field,
                value = value,
                "数值无法解析，按 0 处理"
            );
            0.0
        }
    }
}
