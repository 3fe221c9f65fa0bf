//! Lazy accumulation over the provider's token-based listing calls.

use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::types::Page;

/// Drain a "batch + opaque continuation token" listing into a plain
/// vector, optionally bounded by `limit` or narrowed to one `page`.
///
/// With `page = None` batches are fetched and concatenated in provider
/// order until the token runs out or `limit` items have accumulated;
/// the result is truncated to exactly `limit` when a batch overshoots.
///
/// With `page = Some(n)` (1-based) the token chain is walked from the
/// start on every call and only the nth batch is returned. Reaching
/// page n therefore costs n sequential remote fetches: the provider
/// exposes only forward-only cursors and no cursor cache is kept
/// across calls. Callers paging deep into large listings pay O(page)
/// per request.
///
/// Each call produces a fresh, finite sequence; fetch errors propagate
/// and any partially accumulated items are discarded.
pub async fn fetch_all<'a, T, F>(
    limit: Option<usize>,
    page: Option<usize>,
    mut fetch: F,
) -> Result<Vec<T>, ProviderError>
where
    F: FnMut(Option<String>, Option<usize>) -> BoxFuture<'a, Result<Page<T>, ProviderError>>,
{
    if let Some(page) = page {
        if page == 0 {
            return Err(ProviderError::InvalidParameter(
                "page numbers start at 1".to_string(),
            ));
        }
        let mut token: Option<String> = None;
        for _ in 1..page {
            let batch = fetch(token.take(), limit).await?;
            match batch.next_token {
                Some(t) if !t.is_empty() => token = Some(t),
                // The listing ended before the requested page.
                _ => return Ok(Vec::new()),
            }
        }
        let mut batch = fetch(token, limit).await?;
        if let Some(limit) = limit {
            batch.items.truncate(limit);
        }
        return Ok(batch.items);
    }

    let mut items: Vec<T> = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let remaining = limit.map(|l| l - items.len());
        let batch = fetch(token.take(), remaining).await?;
        items.extend(batch.items);
        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                break;
            }
        }
        match batch.next_token {
            Some(t) if !t.is_empty() => token = Some(t),
            _ => break,
        }
    }
    Ok(items)
}
