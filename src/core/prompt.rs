use crate::core::Record;
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// 模型一直以來收到的 JSON 格式：`", "` 與 `": "` 分隔，
/// 非 ASCII 字元轉成小寫 `\uXXXX`
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptFormatter;

impl Formatter for PromptFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    // 整數保留原始文字，只有浮點數重新輸出
    fn write_number_str<W>(&mut self, writer: &mut W, value: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if value.contains(['.', 'e', 'E']) {
            match value.parse::<f64>() {
                Ok(float) => self.write_f64(writer, float),
                Err(_) => writer.write_all(value.as_bytes()),
            }
        } else if value == "-0" {
            writer.write_all(b"0")
        } else {
            writer.write_all(value.as_bytes())
        }
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut buf = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut buf) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Shortest round-trip digits laid out the way Python's `repr(float)` does:
/// positional when the decimal point falls within `-4 < exp10 <= 16`,
/// otherwise `d.ddde+XX`. Positional values always carry a fraction.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. `-1.2345e3`.
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let point = exponent + 1;

    let mut out = String::new();
    if value.is_sign_negative() {
        out.push('-');
    }

    if -4 < point && point <= 16 {
        let len = digits.len() as i32;
        if point <= 0 {
            out.push_str("0.");
            out.push_str(&"0".repeat((-point) as usize));
            out.push_str(&digits);
        } else if point >= len {
            out.push_str(&digits);
            out.push_str(&"0".repeat((point - len) as usize));
            out.push_str(".0");
        } else {
            let (whole, fraction) = digits.split_at(point as usize);
            out.push_str(whole);
            out.push('.');
            out.push_str(fraction);
        }
    } else {
        let (lead, rest) = digits.split_at(1);
        out.push_str(lead);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exponent.abs()));
    }
    out
}

pub fn records_to_json(records: &[Record]) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PromptFormatter);
    records.serialize(&mut serializer)?;

    // formatter 只會輸出 ASCII
    let json = String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(json)
}

/// 序列化後的資料直接接上使用者提示，中間沒有分隔
pub fn compose_prompt(records: &[Record], prompt: &str) -> Result<String> {
    let mut composed = records_to_json(records)?;
    composed.push_str(prompt);
    Ok(composed)
}
