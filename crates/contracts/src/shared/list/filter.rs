use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value::CellValue;

/// Значение-заглушка "все" из выпадающих списков фильтров
pub const ALL_SENTINEL: &str = "all";

/// Вид фильтра
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Search,
    Select,
    MultiSelect,
    DateRange,
    Custom,
}

/// Период с открытыми границами (включительно)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Текущее значение фильтра; вариант определяет вид фильтра
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// Поиск подстроки без учёта регистра
    Search(String),
    /// Точное совпадение
    Select(CellValue),
    /// Значение ячейки входит в набор
    MultiSelect(Vec<CellValue>),
    DateRange(DateRange),
    /// Значение для пользовательского предиката
    Custom(serde_json::Value),
}

fn is_blank_or_all(s: &str) -> bool {
    s.is_empty() || s == ALL_SENTINEL
}

impl FilterValue {
    pub fn search(text: impl Into<String>) -> Self {
        FilterValue::Search(text.into())
    }

    pub fn select(value: impl Into<CellValue>) -> Self {
        FilterValue::Select(value.into())
    }

    pub fn multi_select<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        FilterValue::MultiSelect(values.into_iter().map(Into::into).collect())
    }

    pub fn date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        FilterValue::DateRange(DateRange::new(from, to))
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Search(_) => FilterKind::Search,
            FilterValue::Select(_) => FilterKind::Select,
            FilterValue::MultiSelect(_) => FilterKind::MultiSelect,
            FilterValue::DateRange(_) => FilterKind::DateRange,
            FilterValue::Custom(_) => FilterKind::Custom,
        }
    }

    /// Неактивный фильтр (пустое значение или "all") не участвует в выборке
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::Search(s) => !is_blank_or_all(s),
            FilterValue::Select(CellValue::Null) => false,
            FilterValue::Select(CellValue::Text(s)) => !is_blank_or_all(s),
            FilterValue::Select(_) => true,
            FilterValue::MultiSelect(values) => !values.is_empty(),
            FilterValue::DateRange(range) => !range.is_empty(),
            FilterValue::Custom(serde_json::Value::Null) => false,
            FilterValue::Custom(serde_json::Value::String(s)) => !is_blank_or_all(s),
            FilterValue::Custom(_) => true,
        }
    }

    /// Проверка значения ячейки. `Custom` здесь всегда проходит:
    /// его проверяет предикат, зарегистрированный в таблице.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            FilterValue::Search(needle) => cell
                .to_string()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            FilterValue::Select(value) => cell.matches_exact(value),
            FilterValue::MultiSelect(values) => values.iter().any(|v| cell.matches_exact(v)),
            FilterValue::DateRange(range) => cell.as_date().is_some_and(|d| range.contains(d)),
            FilterValue::Custom(_) => true,
        }
    }

    /// Представление для query string
    pub fn to_param(&self) -> String {
        match self {
            FilterValue::Search(s) => s.clone(),
            FilterValue::Select(v) => v.to_string(),
            FilterValue::MultiSelect(values) => values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
            FilterValue::DateRange(range) => format!(
                "{}..{}",
                range.from.map(|d| d.to_string()).unwrap_or_default(),
                range.to.map(|d| d.to_string()).unwrap_or_default()
            ),
            FilterValue::Custom(serde_json::Value::String(s)) => s.clone(),
            FilterValue::Custom(v) => v.to_string(),
        }
    }
}

/// Именованные значения фильтров (упорядочены по id)
pub type FilterMap = BTreeMap<String, FilterValue>;

/// Только активные фильтры
pub fn active_filters(filters: &FilterMap) -> impl Iterator<Item = (&String, &FilterValue)> {
    filters.iter().filter(|(_, value)| value.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inactive_values() {
        assert!(!FilterValue::search("").is_active());
        assert!(!FilterValue::search("all").is_active());
        assert!(!FilterValue::select(CellValue::Null).is_active());
        assert!(!FilterValue::select("all").is_active());
        assert!(!FilterValue::Custom(serde_json::Value::Null).is_active());
        assert!(!FilterValue::date_range(None, None).is_active());
        assert!(!FilterValue::MultiSelect(vec![]).is_active());

        assert!(FilterValue::search("ann").is_active());
        assert!(FilterValue::select(false).is_active());
        assert!(FilterValue::select(0).is_active());
        assert!(FilterValue::date_range(Some(date(2024, 1, 1)), None).is_active());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let f = FilterValue::search("MiTh");
        assert!(f.matches(&CellValue::from("John Smith")));
        assert!(!f.matches(&CellValue::from("Jane Doe")));
        assert!(FilterValue::search("42").matches(&CellValue::Int(1420)));
    }

    #[test]
    fn test_select_and_multi_select() {
        assert!(FilterValue::select("active").matches(&CellValue::from("active")));
        assert!(!FilterValue::select("active").matches(&CellValue::from("inactive")));

        let f = FilterValue::multi_select(["admin", "editor"]);
        assert!(f.matches(&CellValue::from("editor")));
        assert!(!f.matches(&CellValue::from("viewer")));
        assert!(!f.matches(&CellValue::Null));
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let f = FilterValue::date_range(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)));
        assert!(f.matches(&CellValue::Date(date(2024, 1, 1))));
        assert!(f.matches(&CellValue::from("2024-01-31T23:59:59Z")));
        assert!(!f.matches(&CellValue::Date(date(2024, 2, 1))));
        assert!(!f.matches(&CellValue::Null));

        let open = FilterValue::date_range(None, Some(date(2024, 1, 31)));
        assert!(open.matches(&CellValue::Date(date(1999, 12, 31))));
    }

    #[test]
    fn test_to_param() {
        assert_eq!(FilterValue::multi_select([1, 2, 3]).to_param(), "1,2,3");
        assert_eq!(
            FilterValue::date_range(Some(date(2024, 1, 1)), None).to_param(),
            "2024-01-01.."
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&FilterValue::search("abc")).unwrap();
        assert_eq!(json, r#"{"search":"abc"}"#);
        let back: FilterValue = serde_json::from_str(r#"{"select":"active"}"#).unwrap();
        assert_eq!(back, FilterValue::select("active"));
    }
}
