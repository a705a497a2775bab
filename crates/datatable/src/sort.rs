//! Сортировка: переключение в три состояния и компаратор

use contracts::shared::list::{CellValue, SortDirection, SortState};
use std::cmp::Ordering;

use crate::column::{find_column, ColumnDef};

/// Результат клика по заголовку
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortToggle {
    Changed(SortState),
    /// Колонка объявлена как несортируемая
    Ignored,
}

/// Переключает сортировку по колонке. Колонка, которой нет в описании
/// (например, серверное поле), сортируется как обычно.
pub fn toggle_sort<T>(current: &SortState, columns: &[ColumnDef<T>], column_id: &str) -> SortToggle {
    if find_column(columns, column_id).is_some_and(|c| !c.sortable) {
        return SortToggle::Ignored;
    }
    SortToggle::Changed(current.toggled(column_id))
}

/// Сравнение двух значений с учётом направления.
/// `Null` всегда в конце, в обоих направлениях.
pub fn compare_cells(a: &CellValue, b: &CellValue, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let cmp = a.natural_cmp(b);
            match direction {
                SortDirection::Asc => cmp,
                SortDirection::Desc => cmp.reverse(),
            }
        }
    }
}

/// Стабильная сортировка ссылок на строки; без активной сортировки порядок исходный
pub fn sort_rows<T>(rows: &mut [&T], columns: &[ColumnDef<T>], sort: &SortState) {
    let (Some(key), Some(direction)) = (sort.key(), sort.direction()) else {
        return;
    };
    let Some(column) = find_column(columns, key) else {
        return;
    };

    // accessor вызывается один раз на строку
    let mut keyed: Vec<(CellValue, &T)> = rows.iter().map(|r| (column.value(r), *r)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_cells(a, b, direction));
    for (slot, (_, row)) in rows.iter_mut().zip(keyed) {
        *slot = row;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row {
        id: u32,
        name: Option<&'static str>,
    }

    fn columns() -> Vec<ColumnDef<Row>> {
        vec![
            ColumnDef::new("name", |r: &Row| CellValue::from(r.name)),
            ColumnDef::new("id", |r: &Row| CellValue::from(r.id)).not_sortable(),
        ]
    }

    fn ids(rows: &[&Row]) -> Vec<u32> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_three_toggles_return_to_unsorted() {
        let cols = columns();
        let mut state = SortState::none();
        for _ in 0..3 {
            match toggle_sort(&state, &cols, "name") {
                SortToggle::Changed(next) => state = next,
                SortToggle::Ignored => panic!("name is sortable"),
            }
        }
        assert_eq!(state, SortState::none());
    }

    #[test]
    fn test_non_sortable_column_is_ignored() {
        assert_eq!(toggle_sort(&SortState::none(), &columns(), "id"), SortToggle::Ignored);
        assert_eq!(
            toggle_sort(&SortState::none(), &columns(), "server_field"),
            SortToggle::Changed(SortState::asc("server_field"))
        );
    }

    #[test]
    fn test_nulls_last_in_both_directions() {
        let data = vec![
            Row { id: 1, name: None },
            Row { id: 2, name: Some("b") },
            Row { id: 3, name: Some("a") },
            Row { id: 4, name: None },
        ];
        let cols = columns();

        let mut rows: Vec<&Row> = data.iter().collect();
        sort_rows(&mut rows, &cols, &SortState::asc("name"));
        assert_eq!(ids(&rows), vec![3, 2, 1, 4]);

        let mut rows: Vec<&Row> = data.iter().collect();
        sort_rows(&mut rows, &cols, &SortState::desc("name"));
        assert_eq!(ids(&rows), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_sort_is_stable() {
        let data = vec![
            Row { id: 1, name: Some("x") },
            Row { id: 2, name: Some("a") },
            Row { id: 3, name: Some("x") },
            Row { id: 4, name: Some("a") },
        ];
        let cols = columns();

        let mut rows: Vec<&Row> = data.iter().collect();
        sort_rows(&mut rows, &cols, &SortState::asc("name"));
        assert_eq!(ids(&rows), vec![2, 4, 1, 3]);

        let mut rows: Vec<&Row> = data.iter().collect();
        sort_rows(&mut rows, &cols, &SortState::desc("name"));
        assert_eq!(ids(&rows), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_unsorted_keeps_insertion_order() {
        let data = vec![Row { id: 9, name: Some("z") }, Row { id: 1, name: Some("a") }];
        let mut rows: Vec<&Row> = data.iter().collect();
        sort_rows(&mut rows, &columns(), &SortState::none());
        assert_eq!(ids(&rows), vec![9, 1]);
    }
}
