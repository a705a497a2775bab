use serde::{Deserialize, Serialize};

/// Страница списка, возвращаемая сервером
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
    /// Всего записей, удовлетворяющих фильтрам
    pub total: usize,
    /// Номер страницы, начиная с 1
    pub page: usize,
    pub total_pages: usize,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
}

/// Количество страниц: 0 для пустого набора
pub fn total_pages(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        0
    } else {
        total.div_ceil(per_page)
    }
}

impl<T> PagedResponse<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: 1,
            total_pages: 0,
            has_next: false,
            has_previous: false,
        }
    }

    /// Нарезка полного набора на страницу (серверная сторона, тестовые заглушки).
    /// Номер страницы за пределами набора прижимается к последней странице.
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let total = items.len();
        let pages = total_pages(total, per_page);
        let page = page.clamp(1, pages.max(1));
        let start = (page - 1) * per_page;
        let data = items.into_iter().skip(start).take(per_page).collect();
        Self {
            data,
            total,
            page,
            total_pages: pages,
            has_next: page < pages,
            has_previous: page > 1,
        }
    }
}
