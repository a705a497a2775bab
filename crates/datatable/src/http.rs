//! HTTP-загрузчик страницы для удалённого режима

use contracts::shared::list::{ListQuery, PagedResponse};
use gloo_net::http::Request;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::fetch::{FetchError, FetchFuture, Fetcher};

/// Строка запроса: `page`, `page_size`, `limit`, `offset`, `sort_by`, `sort_desc`
/// и по параметру на каждый активный фильтр
pub fn to_query_string(query: &ListQuery) -> Result<String, FetchError> {
    serde_qs::to_string(&query.to_params()).map_err(|e| FetchError::Request(e.to_string()))
}

/// GET `{endpoint}?{query}` с ответом `PagedResponse<T>` в JSON
pub struct HttpFetcher<T> {
    endpoint: String,
    _row: PhantomData<fn() -> T>,
}

impl<T> HttpFetcher<T> {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            _row: PhantomData,
        }
    }

    pub fn url(&self, query: &ListQuery) -> Result<String, FetchError> {
        let qs = to_query_string(query)?;
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", self.endpoint, separator, qs))
    }
}

async fn get_page<T: DeserializeOwned>(url: String) -> Result<PagedResponse<T>, FetchError> {
    let response = Request::get(&url)
        .send()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;

    if !response.ok() {
        return Err(FetchError::Http(response.status()));
    }

    response
        .json::<PagedResponse<T>>()
        .await
        .map_err(|e| FetchError::Decode(e.to_string()))
}

impl<T: DeserializeOwned + 'static> Fetcher<T> for HttpFetcher<T> {
    fn fetch(&self, query: ListQuery) -> FetchFuture<T> {
        let url = self.url(&query);
        Box::pin(async move { get_page(url?).await })
    }
}
