use crate::core::{Record, RecordSet, UploadedFile};
use crate::utils::error::{DescribeError, FileFormat, Result};
use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};

impl FileFormat {
    /// 依副檔名判斷格式，不分大小寫
    pub fn from_filename(filename: &str) -> Result<Self> {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".json") {
            Ok(FileFormat::Json)
        } else if lower.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else {
            Err(DescribeError::UnsupportedFormat {
                filename: filename.to_string(),
            })
        }
    }
}

pub fn normalize(file: &UploadedFile) -> Result<RecordSet> {
    let format = FileFormat::from_filename(&file.name)?;
    tracing::debug!("Normalizing {} as {}", file.name, format);

    let records = match format {
        FileFormat::Json => parse_json(&file.content)?,
        FileFormat::Csv => parse_csv(&file.content)?,
    };

    tracing::debug!("Parsed {} records from {}", records.len(), file.name);
    Ok(records)
}

fn parse_json(content: &[u8]) -> Result<RecordSet> {
    let objects: Vec<Map<String, Value>> =
        serde_json::from_slice(content).map_err(|e| DescribeError::ParseError {
            format: FileFormat::Json,
            message: e.to_string(),
        })?;

    Ok(objects.into_iter().map(|data| Record { data }).collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut kind: Option<ColumnKind> = None;
        for cell in cells.filter(|c| !c.is_empty()) {
            let cell_kind = if cell.parse::<i64>().is_ok() {
                ColumnKind::Integer
            } else if cell.parse::<f64>().is_ok_and(f64::is_finite) {
                ColumnKind::Float
            } else if parse_bool(cell).is_some() {
                ColumnKind::Boolean
            } else {
                return ColumnKind::Text;
            };

            kind = Some(match (kind, cell_kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnKind::Integer), ColumnKind::Float)
                | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
                _ => return ColumnKind::Text,
            });
        }
        // 全空的欄位只會產生 null
        kind.unwrap_or(ColumnKind::Text)
    }

    fn convert(self, cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        match self {
            ColumnKind::Integer => cell
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(cell.to_string())),
            ColumnKind::Float => cell
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(cell.to_string())),
            ColumnKind::Boolean => parse_bool(cell)
                .map(Value::Bool)
                .unwrap_or_else(|| Value::String(cell.to_string())),
            ColumnKind::Text => Value::String(cell.to_string()),
        }
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn csv_error(err: csv::Error) -> DescribeError {
    DescribeError::ParseError {
        format: FileFormat::Csv,
        message: err.to_string(),
    }
}

/// 重複的欄位名稱依序加上 `.1`、`.2` 後綴，避免欄位被覆蓋
fn unique_headers(headers: &csv::StringRecord) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<&str, usize> = HashMap::new();

    headers
        .iter()
        .map(|name| {
            let mut field = name.to_string();
            if taken.contains(&field) {
                let count = repeats.entry(name).or_insert(0);
                while taken.contains(&field) {
                    *count += 1;
                    field = format!("{}.{}", name, count);
                }
            }
            taken.insert(field.clone());
            field
        })
        .collect()
}

fn parse_csv(content: &[u8]) -> Result<RecordSet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let headers = unique_headers(reader.headers().map_err(csv_error)?);

    let mut rows = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(csv_error)?;
        if row.len() > headers.len() {
            return Err(DescribeError::ParseError {
                format: FileFormat::Csv,
                message: format!(
                    "row {} has {} fields but the header has {}",
                    index + 2,
                    row.len(),
                    headers.len()
                ),
            });
        }
        rows.push(row);
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| ColumnKind::infer(rows.iter().filter_map(|row| row.get(col))))
        .collect();

    let records = rows
        .iter()
        .map(|row| {
            let data = headers
                .iter()
                .zip(row.iter())
                .zip(kinds.iter())
                .map(|((field, cell), kind)| (field.clone(), kind.convert(cell)))
                .collect();
            Record { data }
        })
        .collect();

    Ok(records)
}
