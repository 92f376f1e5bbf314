// ==========================================
// 集装箱配载仿真系统 - 行记录读取
// ==========================================
// 职责: 逗号分隔文本 → 逐行字段列表
// 规则: 字段去首尾空白; 空行与 # 开头的注释行跳过
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;
use tracing::debug;

// ==========================================
// LineRecord - 一行记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// 源文件行号（从 1 开始）
    pub line_no: usize,

    /// 字段列表
    pub fields: Vec<String>,
}

impl LineRecord {
    pub fn field(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(|s| s.as_str())
    }
}

// ==========================================
// LineSource Trait
// ==========================================
// 用途: 各输入文件读取器共用的行读取接口
// 实现者: CsvLineParser
pub trait LineSource: Send + Sync {
    /// 读取文件为行记录列表
    ///
    /// # 返回
    /// - Ok(Vec<LineRecord>): 非空、非注释行
    /// - Err: 文件不存在或无法读取
    fn read_records(&self, file_path: &Path) -> ImportResult<Vec<LineRecord>>;
}

// ==========================================
// CSV 行读取实现
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLineParser;

impl LineSource for CsvLineParser {
    fn read_records(&self, file_path: &Path) -> ImportResult<Vec<LineRecord>> {
        // 检查文件存在
        if !file_path.is_file() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .quoting(false)
            .trim(Trim::All)
            .from_reader(file);

        let mut records = Vec::new();
        for (row_idx, result) in reader.byte_records().enumerate() {
            let record = result?;

            // 跳过完全空白的行
            if record.iter().all(|raw| raw.iter().all(u8::is_ascii_whitespace)) {
                continue;
            }

            let line_no = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(row_idx + 1);
            let fields: Vec<String> = record
                .iter()
                .map(|raw| decode_field(raw, line_no))
                .collect();

            // 跳过注释行
            if fields.first().map(|f| f.starts_with('#')).unwrap_or(false) {
                continue;
            }

            records.push(LineRecord { line_no, fields });
        }

        Ok(records)
    }
}

// 非 UTF-8 字段按空字段处理, 由各读取器按缺失字段判定
fn decode_field(raw: &[u8], line_no: usize) -> String {
    match std::str::from_utf8(raw) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            debug!(line = line_no, error = %e, "字段不是合法 UTF-8, 按空字段处理");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let file = create_test_file("# header comment\n4, 2 ,3\n\n   \n  # indented comment\n0,1,2\n");
        let records = CsvLineParser.read_records(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields, vec!["4", "2", "3"]);
        assert_eq!(records[1].fields, vec!["0", "1", "2"]);
        assert!(records[1].line_no > records[0].line_no);
    }

    #[test]
    fn test_flexible_field_count() {
        let file = create_test_file("AAAU1234567,100,ILHFA\nBBBU1234567\n");
        let records = CsvLineParser.read_records(file.path()).unwrap();
        assert_eq!(records[0].fields.len(), 3);
        assert_eq!(records[1].fields.len(), 1);
        assert_eq!(records[1].field(1), None);
    }

    #[test]
    fn test_non_utf8_field_does_not_fail_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"AAAU1234567,100,BBBBB\n\xff\xfe,100,BBBBB\nCCCU1234567,\xc3,BBBBB\n")
            .unwrap();
        file.flush().unwrap();

        let records = CsvLineParser.read_records(file.path()).unwrap();
        assert_eq!(records.len(), 3, "非 UTF-8 行不应导致整个文件失败");
        assert_eq!(records[0].fields, vec!["AAAU1234567", "100", "BBBBB"]);
        assert_eq!(records[1].fields, vec!["", "100", "BBBBB"]);
        assert_eq!(records[2].field(1), Some(""));
    }

    #[test]
    fn test_missing_file() {
        let result = CsvLineParser.read_records(Path::new("/nonexistent/plan.ship_plan"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
