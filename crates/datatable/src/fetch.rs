//! Внешние исполнители удалённого режима: загрузка страницы и запуск задач

use contracts::shared::list::{ListQuery, PagedResponse};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Ошибка загрузки страницы
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("HTTP error: {0}")]
    Http(u16),
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

pub type FetchResult<T> = Result<PagedResponse<T>, FetchError>;

pub type FetchFuture<T> = Pin<Box<dyn Future<Output = FetchResult<T>>>>;

pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

/// Загрузчик страницы для удалённого режима.
///
/// Вызывается синхронно в момент мутации; возвращаемый future
/// выполняется через `Spawner`. Ошибки возвращаются как `Err`.
pub trait Fetcher<T> {
    fn fetch(&self, query: ListQuery) -> FetchFuture<T>;
}

impl<T, F, Fut> Fetcher<T> for F
where
    F: Fn(ListQuery) -> Fut,
    Fut: Future<Output = FetchResult<T>> + 'static,
{
    fn fetch(&self, query: ListQuery) -> FetchFuture<T> {
        Box::pin(self(query))
    }
}

/// Запуск локальной (не Send) задачи
pub trait Spawner {
    fn spawn(&self, task: LocalTask);
}

impl<F> Spawner for F
where
    F: Fn(LocalTask),
{
    fn spawn(&self, task: LocalTask) {
        self(task)
    }
}

/// Задачи на исполнителе Leptos (в браузере это микрозадачи wasm-bindgen-futures)
#[derive(Debug, Clone, Copy, Default)]
pub struct LeptosSpawner;

impl Spawner for LeptosSpawner {
    fn spawn(&self, task: LocalTask) {
        leptos::task::spawn_local(task);
    }
}
