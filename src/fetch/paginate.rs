//! Continuation-token pagination.

use crate::error::Error;
use crate::store::Page;
use std::future::Future;

/// Items gathered before a page request failed.
#[derive(Debug)]
pub struct PartialFetch<T> {
    pub items: Vec<T>,
    pub error: Error,
}

/// Request pages until the store stops returning a continuation token.
///
/// `fetch_page` receives `None` for the first page and the previous page's
/// token afterwards. Items are returned in the order the store produced them.
/// The first error stops pagination; whatever was collected is returned with
/// it. Tokens never outlive this call.
pub async fn paginate<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, PartialFetch<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, Error>>,
{
    let mut items = Vec::new();
    let mut token = None;
    let mut pages = 0usize;

    loop {
        let page = match fetch_page(token.take()).await {
            Ok(page) => page,
            Err(error) => return Err(PartialFetch { items, error }),
        };
        pages += 1;
        items.extend(page.items);

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    tracing::trace!(pages, items = items.len(), "Pagination complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::cell::RefCell;

    #[tokio::test]
    async fn concatenates_pages_in_order() {
        let pages = vec![vec![1, 2], vec![3], vec![4, 5, 6]];
        let seen = RefCell::new(Vec::new());

        let items = paginate(|token: Option<String>| {
            seen.borrow_mut().push(token.clone());
            let index: usize = token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let next = (index + 1 < pages.len()).then(|| (index + 1).to_string());
            let page = Page::new(pages[index].clone(), next);
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(*seen.borrow(), vec![None, Some("1".to_string()), Some("2".to_string())]);
    }

    #[tokio::test]
    async fn single_page_issues_one_request() {
        let mut requests = 0;
        let items = paginate(|_token| {
            requests += 1;
            async { Ok(Page::last(vec!["only"])) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec!["only"]);
        assert_eq!(requests, 1);
    }

    #[tokio::test]
    async fn empty_token_ends_pagination() {
        let items = paginate(|_token| async { Ok(Page::new(vec![7], Some(String::new()))) })
            .await
            .unwrap();
        assert_eq!(items, vec![7]);
    }

    #[tokio::test]
    async fn error_returns_partial_items() {
        let partial = paginate(|token: Option<String>| async move {
            match token {
                None => Ok(Page::new(vec![1, 2], Some("next".into()))),
                Some(_) => Err(Error::Store(StoreError::Other("denied".into()))),
            }
        })
        .await
        .unwrap_err();

        assert_eq!(partial.items, vec![1, 2]);
        assert!(matches!(partial.error, Error::Store(StoreError::Other(_))));
    }
}
