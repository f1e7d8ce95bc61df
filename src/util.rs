use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::invidious::Published;

/// 表示できない値のプレースホルダー
pub const NOT_AVAILABLE: &str = "N/A";

/// 数値を3桁区切りのカンマ付き文字列に変換
///
/// 値がない場合は`N/A`を返す
///
/// # Examples
/// ```
/// use proxy_lib::util::format_number;
///
/// assert_eq!(format_number(Some(1234567)), "1,234,567");
/// assert_eq!(format_number(None), "N/A");
/// ```
pub fn format_number(num: Option<i64>) -> String {
    let Some(num) = num else {
        return NOT_AVAILABLE.to_string();
    };

    let digits = num.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if num < 0 {
        grouped.push('-');
    }

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

/// 公開日時を`YYYY-MM-DD`に変換
///
/// ISO-8601（末尾`Z`はUTCとして扱う）、日付のみ、UNIX秒に対応。
/// 解釈できない場合は`N/A`を返す。
///
/// # Examples
/// ```
/// use proxy_lib::invidious::Published;
/// use proxy_lib::util::format_date;
///
/// let published = Published::Text("2023-01-05T00:00:00Z".to_string());
/// assert_eq!(format_date(Some(&published)), "2023-01-05");
/// ```
pub fn format_date(published: Option<&Published>) -> String {
    let formatted = match published {
        Some(Published::Text(text)) => parse_iso_date(text.trim()),
        Some(Published::Unix(secs)) => {
            DateTime::from_timestamp(*secs, 0).map(|dt| dt.date_naive())
        }
        None => None,
    };

    formatted
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    // オフセット付きはそのオフセットでの日付を使う
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}
