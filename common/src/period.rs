//! 給与期間モジュール
//!
//! 期間は内部では `Period { year, month }` の1種類だけで保持し、
//! 文字列への変換はエンドポイントごとの境界で行う。
//!
//! - `YYYY-MM`: Excel給与アップロード、手動データ照合
//! - `MonthName-YYYY`: Lambda給与（アップロード・検証・一括/個別処理）

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// 給与期間（暦月）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidPeriod(format!("{}-{:02}", year, month)));
        }
        if !(1900..=9999).contains(&year) {
            return Err(Error::InvalidPeriod(format!("{}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// 日付が属する月
    pub fn from_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    /// 文字列から期間を解析
    ///
    /// 受け付ける形式:
    /// - `2025-03`
    /// - `March-2025` / `march-2025`
    /// - `March 2025`
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();

        if Self::is_iso_key(s) {
            let year: i32 = s[..4]
                .parse()
                .map_err(|_| Error::InvalidPeriod(input.to_string()))?;
            let month: u32 = s[5..]
                .parse()
                .map_err(|_| Error::InvalidPeriod(input.to_string()))?;
            return Self::new(year, month);
        }

        let (name, year) = s
            .split_once(|c: char| c == '-' || c == ' ')
            .ok_or_else(|| Error::InvalidPeriod(input.to_string()))?;
        let month = month_from_name(name.trim())
            .ok_or_else(|| Error::InvalidPeriod(input.to_string()))?;
        let year: i32 = year
            .trim()
            .parse()
            .map_err(|_| Error::InvalidPeriod(input.to_string()))?;

        Self::new(year, month)
    }

    /// `YYYY-MM` 形式かどうか（月は01〜12）
    pub fn is_iso_key(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return false;
        }
        if !bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit) {
            return false;
        }
        matches!(s[5..].parse::<u32>(), Ok(m) if (1..=12).contains(&m))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// `2025-03`
    pub fn iso_key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// `March-2025`
    pub fn lambda_key(&self) -> String {
        format!("{}-{}", self.month_name(), self.year)
    }

    /// 確認ダイアログ用の表示名 `March 2025`
    pub fn display_name(&self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }

    /// 支払日（月末日）
    pub fn payment_date(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso_key())
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| {
            let m = m.to_lowercase();
            m == lower || (lower.len() == 3 && m.starts_with(&lower))
        })
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso() {
        let p = Period::parse("2025-03").unwrap();
        assert_eq!(p.year(), 2025);
        assert_eq!(p.month(), 3);
    }

    #[test]
    fn test_parse_month_name() {
        assert_eq!(Period::parse("March-2025").unwrap(), Period::new(2025, 3).unwrap());
        assert_eq!(Period::parse("march 2025").unwrap(), Period::new(2025, 3).unwrap());
        assert_eq!(Period::parse("Dec-2024").unwrap(), Period::new(2024, 12).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Period::parse("2025-13").is_err());
        assert!(Period::parse("2025-3").is_err());
        assert!(Period::parse("Smarch-2025").is_err());
        assert!(Period::parse("").is_err());
    }

    #[test]
    fn test_keys() {
        let p = Period::new(2025, 3).unwrap();
        assert_eq!(p.iso_key(), "2025-03");
        assert_eq!(p.lambda_key(), "March-2025");
        assert_eq!(p.display_name(), "March 2025");
        assert_eq!(p.to_string(), "2025-03");
    }

    #[test]
    fn test_is_iso_key() {
        assert!(Period::is_iso_key("2025-01"));
        assert!(Period::is_iso_key("2025-12"));
        assert!(!Period::is_iso_key("2025-00"));
        assert!(!Period::is_iso_key("2025-1a"));
        assert!(!Period::is_iso_key("25-01"));
        assert!(!Period::is_iso_key("March-2025"));
    }

    #[test]
    fn test_payment_date_month_end() {
        let d = Period::new(2025, 3).unwrap().payment_date();
        assert_eq!(d.to_string(), "2025-03-31");

        let d = Period::new(2025, 4).unwrap().payment_date();
        assert_eq!(d.to_string(), "2025-04-30");

        let d = Period::new(2025, 12).unwrap().payment_date();
        assert_eq!(d.to_string(), "2025-12-31");
    }

    #[test]
    fn test_payment_date_leap_year() {
        assert_eq!(Period::new(2024, 2).unwrap().payment_date().to_string(), "2024-02-29");
        assert_eq!(Period::new(2025, 2).unwrap().payment_date().to_string(), "2025-02-28");
        assert_eq!(Period::new(1900, 2).unwrap().payment_date().to_string(), "1900-02-28");
    }
}
