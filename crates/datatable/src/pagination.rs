//! Пагинация: текущая страница (с 1), размер страницы, итоги

use contracts::shared::list::{total_pages, PagedResponse};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Размер страницы по умолчанию
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Варианты размера страницы для селектора
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [50, 100, 200, 500];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: usize,
    pub items_per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl PaginationState {
    pub fn new(current_page: usize, items_per_page: usize) -> Self {
        let mut state = Self {
            current_page: current_page.max(1),
            items_per_page: items_per_page.max(1),
            total_items: 0,
            total_pages: 0,
            has_next: false,
            has_previous: false,
        };
        state.clamp();
        state
    }

    /// Последняя допустимая страница; пустой набор всё равно имеет страницу 1
    pub fn last_page(&self) -> usize {
        self.total_pages.max(1)
    }

    pub fn is_valid_page(&self, page: usize) -> bool {
        (1..=self.last_page()).contains(&page)
    }

    /// Пересчитать итоги по количеству элементов и прижать текущую страницу
    pub fn set_total_items(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.total_pages = total_pages(total_items, self.items_per_page);
        self.clamp();
    }

    /// Перейти на страницу, прижав номер к `[1, last_page]`
    pub fn go_to(&mut self, page: usize) {
        self.current_page = page;
        self.clamp();
    }

    /// Новый размер страницы всегда возвращает на первую страницу
    pub fn set_items_per_page(&mut self, items_per_page: usize) {
        self.items_per_page = items_per_page.max(1);
        self.current_page = 1;
        self.set_total_items(self.total_items);
    }

    pub fn reset_page(&mut self) {
        self.go_to(1);
    }

    /// Итоги из ответа сервера; флаги соседних страниц берутся как есть
    pub fn apply_response<T>(&mut self, response: &PagedResponse<T>, requested_page: usize) {
        self.total_items = response.total;
        self.total_pages = response.total_pages;
        self.current_page = requested_page.clamp(1, self.last_page());
        self.has_next = response.has_next;
        self.has_previous = response.has_previous;
    }

    /// Диапазон индексов текущей страницы в отфильтрованном наборе
    pub fn range(&self) -> Range<usize> {
        let start = (self.current_page - 1) * self.items_per_page;
        let end = start + self.items_per_page;
        start.min(self.total_items)..end.min(self.total_items)
    }

    pub fn offset(&self) -> usize {
        (self.current_page - 1) * self.items_per_page
    }

    fn clamp(&mut self) {
        self.current_page = self.current_page.clamp(1, self.last_page());
        self.has_next = self.current_page < self.total_pages;
        self.has_previous = self.current_page > 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_from_items() {
        let mut p = PaginationState::new(1, 10);
        p.set_total_items(25);
        assert_eq!(p.total_pages, 3);
        p.set_total_items(0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.current_page, 1);
    }

    #[test]
    fn test_clamping_is_idempotent() {
        for total in [0usize, 1, 9, 10, 11, 99, 100, 101] {
            for per_page in [1usize, 3, 10, 50] {
                let mut p = PaginationState::new(1, per_page);
                p.set_total_items(total);
                for requested in [0usize, 1, 2, 7, 1000] {
                    p.go_to(requested);
                    let first = p.current_page;
                    p.go_to(requested);
                    assert_eq!(p.current_page, first);
                    assert!(first >= 1);
                    assert!(first <= p.total_pages.max(1));
                }
            }
        }
    }

    #[test]
    fn test_shrinking_total_clamps_page() {
        let mut p = PaginationState::new(1, 10);
        p.set_total_items(50);
        p.go_to(5);
        assert_eq!(p.current_page, 5);
        p.set_total_items(12);
        assert_eq!(p.current_page, 2);
        assert!(!p.has_next);
        assert!(p.has_previous);
    }

    #[test]
    fn test_page_size_change_resets_to_first_page() {
        let mut p = PaginationState::new(1, 10);
        p.set_total_items(50);
        p.go_to(3);
        p.set_items_per_page(20);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn test_range() {
        let mut p = PaginationState::new(1, 10);
        p.set_total_items(25);
        p.go_to(3);
        assert_eq!(p.range(), 20..25);
        p.set_total_items(0);
        assert_eq!(p.range(), 0..0);
    }
}
