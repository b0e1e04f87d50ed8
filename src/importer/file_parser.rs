// ==========================================
// 销售询价跟踪系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: RawRow（保留表头顺序，单元格保持原生类型）
// 说明: header_row_index 之前的行视为分组表头，直接丢弃
// ==========================================

use crate::domain::import::RawRow;
use crate::domain::types::FieldValue;
use crate::importer::enquiry_importer_trait::FileParser;
use crate::importer::error::{ImportError, ImportOutcome};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// 表头去重: 重复表头追加 _1, _2 ...；空表头返回 None（整列忽略）
fn build_headers<I>(raw_headers: I) -> Vec<Option<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw_headers
        .into_iter()
        .map(|raw| {
            let header = raw.trim().to_string();
            if header.is_empty() {
                return None;
            }
            let count = seen.entry(header.clone()).or_insert(0);
            let unique = if *count == 0 {
                header.clone()
            } else {
                format!("{}_{}", header, count)
            };
            *count += 1;
            Some(unique)
        })
        .collect()
}

fn is_blank_row(row: &RawRow) -> bool {
    row.values().all(FieldValue::is_blank)
}

fn check_exists(path: &Path) -> ImportOutcome<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, file_path: &Path, header_row_index: usize) -> ImportOutcome<Vec<RawRow>> {
        check_exists(file_path)?;
        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut records = reader.records().skip(header_row_index);
        let headers = match records.next() {
            Some(header_record) => build_headers(header_record?.iter().map(str::to_string)),
            None => return Ok(Vec::new()),
        };

        let mut rows = Vec::new();
        for result in records {
            let record = result?;
            let mut row = RawRow::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(Some(header)) = headers.get(col_idx) {
                    row.insert(header.clone(), FieldValue::text(value.trim()));
                }
            }

            // 跳过完全空白的行
            if is_blank_row(&row) {
                continue;
            }
            rows.push(row);
        }

        debug!(rows = rows.len(), "CSV 解析完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 单元格 → FieldValue（错误/空单元格返回 None）
    ///
    /// 日期单元格保留表格序列号，由日期标准化统一转换
    fn cell_to_value(cell: &Data) -> Option<FieldValue> {
        match cell {
            Data::String(s) => Some(FieldValue::text(s.trim())),
            Data::Float(f) => Some(FieldValue::Number(*f)),
            Data::Int(i) => Some(FieldValue::Number(*i as f64)),
            Data::Bool(b) => Some(FieldValue::Bool(*b)),
            Data::DateTime(dt) => Some(FieldValue::Number(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(FieldValue::text(s.trim())),
            Data::Error(_) | Data::Empty => None,
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path, header_row_index: usize) -> ImportOutcome<Vec<RawRow>> {
        check_exists(file_path)?;
        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParse("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut sheet_rows = range.rows().skip(header_row_index);
        let headers = match sheet_rows.next() {
            Some(header_row) => build_headers(header_row.iter().map(|cell| cell.to_string())),
            None => return Ok(Vec::new()),
        };

        let mut rows = Vec::new();
        for data_row in sheet_rows {
            let mut row = RawRow::new();
            for (col_idx, cell) in data_row.iter().enumerate() {
                let Some(Some(header)) = headers.get(col_idx) else {
                    continue;
                };
                if let Some(value) = Self::cell_to_value(cell) {
                    row.insert(header.clone(), value);
                }
            }

            if row.is_empty() || is_blank_row(&row) {
                continue;
            }
            rows.push(row);
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "Excel 解析完成");
        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_rows(&self, file_path: &Path, header_row_index: usize) -> ImportOutcome<Vec<RawRow>> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_to_raw_rows(file_path, header_row_index),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_rows(file_path, header_row_index),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let file = csv_file(&["Enq No.,Customer Region,Days", "E-1, North ,5", "E-2,South,7"]);

        let rows = CsvParser.parse_to_raw_rows(file.path(), 0).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Enq No."), Some(&FieldValue::text("E-1")));
        assert_eq!(rows[0].get("Customer Region"), Some(&FieldValue::text("North")));
        let headers: Vec<&String> = rows[0].keys().collect();
        assert_eq!(headers, vec!["Enq No.", "Customer Region", "Days"]);
    }

    #[test]
    fn test_csv_parser_header_row_index_and_blank_rows() {
        let file = csv_file(&[
            "Group A,,Group B",
            "Enq No.,Region,Region",
            "E-1,North,Zone 1",
            ",,",
            "E-2,South,Zone 2",
        ]);

        let rows = CsvParser.parse_to_raw_rows(file.path(), 1).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("Region"), Some(&FieldValue::text("South")));
        assert_eq!(rows[1].get("Region_1"), Some(&FieldValue::text("Zone 2")));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_rows(Path::new("non_existent.csv"), 0);
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse_to_raw_rows(file.path(), 0);
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_excel_cell_mapping() {
        assert_eq!(
            ExcelParser::cell_to_value(&Data::Float(45897.0)),
            Some(FieldValue::Number(45897.0))
        );
        assert_eq!(
            ExcelParser::cell_to_value(&Data::String(" Y ".to_string())),
            Some(FieldValue::text("Y"))
        );
        assert_eq!(ExcelParser::cell_to_value(&Data::Empty), None);
    }
}
