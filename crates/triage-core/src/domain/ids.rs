//! Row identifiers (strongly-typed row numbers).
//!
//! ページ上の行番号（URL の `row=1`）とシート上の行番号（1 行目はヘッダー）は
//! 1 ずれているため、Phantom type で取り違えをコンパイル時に防ぎます。
//!
//! - `PageRow`: 1-based case index as it appears in page parameters.
//! - `SheetRow`: 1-based row in the backing store, header at row 1.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// RowMarker は各行番号型のマーカー trait
pub trait RowMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス
    fn prefix() -> &'static str;
}

/// Generic 1-based row number.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row<T: RowMarker> {
    value: u32,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: RowMarker> Row<T> {
    /// Rows are 1-based; anything below 1 clamps to 1.
    pub fn new(value: u32) -> Self {
        Self {
            value: value.max(1),
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> u32 {
        self.value
    }
}

impl<T: RowMarker> fmt::Display for Row<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

/// Page row のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Page {}

impl RowMarker for Page {
    fn prefix() -> &'static str {
        "page-row-"
    }
}

/// Sheet row のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sheet {}

impl RowMarker for Sheet {
    fn prefix() -> &'static str {
        "sheet-row-"
    }
}

/// Case index from page parameters (`row=1` is the first case).
pub type PageRow = Row<Page>;

/// Row in the backing store (row 1 holds the headers).
pub type SheetRow = Row<Sheet>;

impl Row<Sheet> {
    pub const HEADER: SheetRow = Row {
        value: 1,
        _marker: PhantomData,
    };
}

impl Row<Page> {
    /// Parse a `row` page parameter. Unparsable or `< 1` means the first case.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) if n >= 1 => Self::new(u32::try_from(n).unwrap_or(u32::MAX)),
            _ => Self::new(1),
        }
    }

    /// `row=1` targets sheet row 2.
    pub fn to_sheet_row(self) -> SheetRow {
        SheetRow::new(self.value.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::first("1", 1)]
    #[case::padded(" 7 ", 7)]
    #[case::zero("0", 1)]
    #[case::negative("-3", 1)]
    #[case::garbage("abc", 1)]
    #[case::empty("", 1)]
    fn page_row_parse_clamps(#[case] raw: &str, #[case] expected: u32) {
        assert_eq!(PageRow::parse(raw).get(), expected);
    }

    #[test]
    fn page_row_one_targets_sheet_row_two() {
        let page = PageRow::parse("1");
        assert_eq!(page.to_sheet_row().get(), 2);
    }

    #[test]
    fn display_carries_prefix() {
        assert_eq!(PageRow::new(3).to_string(), "page-row-3");
        assert_eq!(SheetRow::new(4).to_string(), "sheet-row-4");
        assert_eq!(SheetRow::HEADER.get(), 1);
    }

    #[test]
    fn rows_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&PageRow::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: PageRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(), 5);
    }
}
