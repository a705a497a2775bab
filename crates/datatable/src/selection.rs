//! Множественный выбор строк по идентичности

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Стабильный ключ строки
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Int(v) => write!(f, "{}", v),
            RowKey::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for RowKey {
    fn from(v: i64) -> Self {
        RowKey::Int(v)
    }
}

impl From<i32> for RowKey {
    fn from(v: i32) -> Self {
        RowKey::Int(v as i64)
    }
}

impl From<u32> for RowKey {
    fn from(v: u32) -> Self {
        RowKey::Int(v as i64)
    }
}

impl From<usize> for RowKey {
    fn from(v: usize) -> Self {
        RowKey::Int(v as i64)
    }
}

impl From<&str> for RowKey {
    fn from(v: &str) -> Self {
        RowKey::Str(v.to_string())
    }
}

impl From<String> for RowKey {
    fn from(v: String) -> Self {
        RowKey::Str(v)
    }
}

impl From<uuid::Uuid> for RowKey {
    fn from(v: uuid::Uuid) -> Self {
        RowKey::Str(v.to_string())
    }
}

/// Извлечение ключа: строка и её абсолютная позиция в производном наборе
pub type RowKeyFn<T> = Rc<dyn Fn(&T, usize) -> RowKey>;

/// Ключ по умолчанию: позиция строки
pub fn positional_key<T>() -> RowKeyFn<T> {
    Rc::new(|_, index| RowKey::from(index))
}

/// Что делать с выбором, когда данные под ним сменились
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Выбор сохраняется как есть, включая ключи, которых больше нет в данных
    #[default]
    Keep,
    /// Выбор сбрасывается при каждом обновлении данных
    Clear,
    /// Остаются только ключи, присутствующие в новых данных
    Prune,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: HashSet<RowKey>,
}

impl SelectionSet {
    pub fn contains(&self, key: &RowKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &HashSet<RowKey> {
        &self.keys
    }

    /// Добавить или снять одну строку
    pub fn toggle(&mut self, key: RowKey) {
        if !self.keys.remove(&key) {
            self.keys.insert(key);
        }
    }

    /// Выбор всех видимых строк: если выбраны все, снимает их, иначе добавляет.
    /// Работает только по видимому срезу, не по всему набору.
    pub fn toggle_all(&mut self, visible: &[RowKey]) {
        if visible.is_empty() {
            return;
        }
        if self.all_selected(visible) {
            for key in visible {
                self.keys.remove(key);
            }
        } else {
            self.keys.extend(visible.iter().cloned());
        }
    }

    pub fn all_selected(&self, visible: &[RowKey]) -> bool {
        !visible.is_empty() && visible.iter().all(|k| self.keys.contains(k))
    }

    /// Часть видимых строк выбрана, но не все (для indeterminate-чекбокса)
    pub fn partially_selected(&self, visible: &[RowKey]) -> bool {
        visible.iter().any(|k| self.keys.contains(k)) && !self.all_selected(visible)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Применить политику к новому набору ключей. Возвращает true, если выбор изменился.
    pub fn apply_policy(&mut self, policy: SelectionPolicy, present: &HashSet<RowKey>) -> bool {
        let before = self.keys.len();
        match policy {
            SelectionPolicy::Keep => {}
            SelectionPolicy::Clear => self.keys.clear(),
            SelectionPolicy::Prune => self.keys.retain(|k| present.contains(k)),
        }
        before != self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(range: std::ops::Range<i64>) -> Vec<RowKey> {
        range.map(RowKey::Int).collect()
    }

    #[test]
    fn test_toggle_row() {
        let mut s = SelectionSet::default();
        s.toggle(RowKey::from("a"));
        assert!(s.contains(&RowKey::from("a")));
        s.toggle(RowKey::from("a"));
        assert!(s.is_empty());
    }

    #[test]
    fn test_toggle_all_adds_then_removes_visible_only() {
        let mut s = SelectionSet::default();
        s.toggle(RowKey::Int(100));
        let page = keys(10..20);

        s.toggle_all(&page);
        assert_eq!(s.len(), 11);
        assert!(s.all_selected(&page));

        s.toggle_all(&page);
        assert_eq!(s.len(), 1);
        assert!(s.contains(&RowKey::Int(100)));
    }

    #[test]
    fn test_toggle_all_with_partial_selection_selects_rest() {
        let mut s = SelectionSet::default();
        let page = keys(0..5);
        s.toggle(RowKey::Int(2));
        assert!(s.partially_selected(&page));
        s.toggle_all(&page);
        assert!(s.all_selected(&page));
        assert!(!s.partially_selected(&page));
    }

    #[test]
    fn test_policies() {
        let present: HashSet<RowKey> = keys(0..3).into_iter().collect();

        let mut s = SelectionSet::default();
        s.toggle_all(&keys(1..5));
        assert!(!s.apply_policy(SelectionPolicy::Keep, &present));
        assert_eq!(s.len(), 4);

        assert!(s.apply_policy(SelectionPolicy::Prune, &present));
        assert_eq!(s.len(), 2);

        assert!(s.apply_policy(SelectionPolicy::Clear, &present));
        assert!(s.is_empty());
    }

    #[test]
    fn test_uuid_key() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            RowKey::from(id),
            RowKey::Str("00000000-0000-0000-0000-000000000000".to_string())
        );
    }
}
