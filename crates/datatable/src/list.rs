//! Постраничный список: поиск и страницы без колонок и сортировки.
//! Тот же движок, что и у таблицы, с единственным фильтром поиска.

use contracts::shared::list::{CellValue, FilterValue};

use crate::config::{ConfigError, TableConfig};
use crate::engine::{SubscriptionId, TableEngine, TableSnapshot};
use crate::fetch::{Fetcher, Spawner};
use crate::pagination::PaginationState;

/// Имя фильтра поиска (и параметра запроса в удалённом режиме)
pub const SEARCH_FILTER: &str = "q";

/// Снимок списка
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub search: String,
    pub pagination: PaginationState,
    pub is_loading: bool,
}

impl<T> From<TableSnapshot<T>> for ListSnapshot<T> {
    fn from(snapshot: TableSnapshot<T>) -> Self {
        let search = match snapshot.filters.get(SEARCH_FILTER) {
            Some(FilterValue::Search(text)) => text.clone(),
            _ => String::new(),
        };
        Self {
            items: snapshot.visible_rows,
            search,
            pagination: snapshot.pagination,
            is_loading: snapshot.is_loading,
        }
    }
}

pub struct ListEngine<T> {
    table: TableEngine<T>,
}

impl<T> Clone for ListEngine<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<T: Clone + 'static> ListEngine<T> {
    /// Встроенный режим; `search_text` даёт текст, по которому ищет поиск
    pub fn embedded<F>(items: Vec<T>, items_per_page: usize, search_text: F) -> Result<Self, ConfigError>
    where
        F: Fn(&T) -> String + 'static,
    {
        let config = TableConfig::embedded(items)
            .items_per_page(items_per_page)
            .custom_filter(SEARCH_FILTER, move |item: &T, value: &FilterValue| {
                value.matches(&CellValue::Text(search_text(item)))
            });
        Ok(Self {
            table: TableEngine::new(config)?,
        })
    }

    /// Удалённый режим: поиск уходит на сервер параметром `q`
    pub fn remote(
        fetcher: impl Fetcher<T> + 'static,
        spawner: impl Spawner + 'static,
        items_per_page: usize,
    ) -> Result<Self, ConfigError> {
        let config = TableConfig::remote(fetcher)
            .spawner(spawner)
            .items_per_page(items_per_page);
        Ok(Self {
            table: TableEngine::new(config)?,
        })
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.table.snapshot().into()
    }

    pub fn subscribe(&self, observer: impl Fn(&ListSnapshot<T>) + 'static) -> SubscriptionId {
        self.table
            .subscribe(move |snapshot| observer(&ListSnapshot::from(snapshot.clone())))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.table.unsubscribe(id);
    }

    pub fn set_search(&self, text: impl Into<String>) {
        self.table.set_filter(SEARCH_FILTER, FilterValue::Search(text.into()));
    }

    pub fn clear_search(&self) {
        self.table.clear_filters();
    }

    pub fn go_to_page(&self, page: usize) {
        self.table.go_to_page(page);
    }

    pub fn next_page(&self) {
        self.table.next_page();
    }

    pub fn previous_page(&self) {
        self.table.previous_page();
    }

    pub fn set_items_per_page(&self, items_per_page: usize) {
        self.table.set_items_per_page(items_per_page);
    }

    pub fn refresh(&self) {
        self.table.refresh();
    }

    /// Новый набор элементов (встроенный режим)
    pub fn set_items(&self, items: Vec<T>) {
        self.table.set_rows(items);
    }

    /// Движок таблицы под списком
    pub fn table(&self) -> &TableEngine<T> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::LocalTask;
    use contracts::shared::list::{ListQuery, PagedResponse};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Post {
        id: u32,
        title: String,
    }

    fn posts(count: u32) -> Vec<Post> {
        (1..=count)
            .map(|id| Post {
                id,
                title: if id % 3 == 0 {
                    format!("Sea view apartment #{}", id)
                } else {
                    format!("Studio #{}", id)
                },
            })
            .collect()
    }

    fn list(count: u32) -> ListEngine<Post> {
        ListEngine::embedded(posts(count), 5, |p: &Post| p.title.clone()).unwrap()
    }

    #[test]
    fn test_search_and_paging() {
        let list = list(30);
        list.go_to_page(3);
        list.set_search("sea VIEW");

        let snap = list.snapshot();
        assert_eq!(snap.search, "sea VIEW");
        assert_eq!(snap.pagination.current_page, 1);
        assert_eq!(snap.pagination.total_items, 10);
        assert_eq!(snap.items.len(), 5);
        assert!(snap.pagination.has_next);

        list.next_page();
        assert_eq!(list.snapshot().items[0].id, 18);
        list.next_page();
        assert_eq!(list.snapshot().pagination.current_page, 2);

        list.clear_search();
        assert_eq!(list.snapshot().pagination.total_items, 30);
        assert_eq!(list.snapshot().search, "");
    }

    #[test]
    fn test_subscribe_receives_list_snapshots() {
        let list = list(12);
        let pages: Rc<RefCell<Vec<usize>>> = Rc::default();
        let sink = Rc::clone(&pages);
        list.subscribe(move |snap| sink.borrow_mut().push(snap.pagination.current_page));

        list.next_page();
        list.next_page();
        list.previous_page();
        list.set_items(posts(4));
        assert_eq!(*pages.borrow(), vec![2, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_remote_search_goes_to_server() {
        LocalSet::new()
            .run_until(async {
                let queries: Rc<RefCell<Vec<ListQuery>>> = Rc::default();
                let seen = Rc::clone(&queries);
                let list = ListEngine::remote(
                    move |query: ListQuery| {
                        seen.borrow_mut().push(query.clone());
                        std::future::ready(Ok(PagedResponse::paginate(
                            posts(7),
                            query.page,
                            query.items_per_page,
                        )))
                    },
                    |task: LocalTask| {
                        tokio::task::spawn_local(task);
                    },
                    5,
                )
                .unwrap();

                list.set_search("studio");
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                }

                let query = queries.borrow().last().cloned().unwrap();
                assert_eq!(
                    query.to_params().get(SEARCH_FILTER).map(String::as_str),
                    Some("studio")
                );
                let snap = list.snapshot();
                assert_eq!(snap.items.len(), 5);
                assert!(snap.pagination.has_next);
                assert!(!snap.is_loading);
            })
            .await;
    }
}
