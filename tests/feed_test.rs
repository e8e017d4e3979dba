use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use futures_util::{pin_mut, StreamExt};

use playmusic::error::{Error, Result};
use playmusic::feed::{self, Page, PageToken};

/// A three-page feed: [1, 2] -> [3, 4] -> [5, 6], linked a -> b.
async fn three_pages(token: Option<PageToken>) -> Result<Page<i32>> {
    Ok(match token.as_ref().map(PageToken::as_str) {
        None => Page::more(vec![1, 2], "a"),
        Some("a") => Page::more(vec![3, 4], "b"),
        Some("b") => Page::terminal(vec![5, 6]),
        other => panic!("unexpected token {other:?}"),
    })
}

#[tokio::test]
async fn items_preserve_order_across_pages() {
    let items = feed::collect(three_pages, None).await.unwrap();
    assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn pages_walk_the_token_chain() {
    let stream = feed::pages(three_pages);
    pin_mut!(stream);

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.items, vec![1, 2]);
    assert_eq!(first.next, Some(PageToken::from("a")));
    assert!(!first.last);

    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(second.items, vec![3, 4]);

    let third = stream.next().await.unwrap().unwrap();
    assert_eq!(third.items, vec![5, 6]);
    assert!(third.last);

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn max_items_truncates_the_final_page() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);

    let items = feed::collect(
        move |token| {
            counter.fetch_add(1, Ordering::SeqCst);
            three_pages(token)
        },
        Some(3),
    )
    .await
    .unwrap();

    assert_eq!(items, vec![1, 2, 3]);
    // The third item comes from the second page; the third page is never
    // requested.
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn max_items_zero_fetches_nothing() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);

    let items = feed::collect(
        move |token| {
            counter.fetch_add(1, Ordering::SeqCst);
            three_pages(token)
        },
        Some(0),
    )
    .await
    .unwrap();

    assert!(items.is_empty());
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn max_items_beyond_the_feed_yields_everything() {
    let items = feed::collect(three_pages, Some(100)).await.unwrap();
    assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn terminal_flag_overrides_a_present_token() {
    let fetch = |token: Option<PageToken>| async move {
        assert!(token.is_none(), "no page may follow a terminal page");
        Ok::<_, Error>(Page {
            items: vec![1, 2],
            next: Some(PageToken::from("dangling")),
            last: true,
        })
    };

    let items = feed::collect(fetch, None).await.unwrap();
    assert_eq!(items, vec![1, 2]);
}

#[tokio::test]
async fn empty_token_is_a_valid_continuation() {
    let fetch = |token: Option<PageToken>| async move {
        Ok::<_, Error>(match token.as_ref().map(PageToken::as_str) {
            None => Page::more(vec![1], ""),
            Some("") => Page::terminal(vec![2]),
            other => panic!("unexpected token {other:?}"),
        })
    };

    let items = feed::collect(fetch, None).await.unwrap();
    assert_eq!(items, vec![1, 2]);
}

#[tokio::test]
async fn empty_intermediate_pages_are_skipped() {
    let fetch = |token: Option<PageToken>| async move {
        Ok::<_, Error>(match token.as_ref().map(PageToken::as_str) {
            None => Page::more(vec![], "a"),
            Some("a") => Page::more(vec![], "b"),
            Some("b") => Page::terminal(vec![7]),
            other => panic!("unexpected token {other:?}"),
        })
    };

    let items = feed::collect(fetch, None).await.unwrap();
    assert_eq!(items, vec![7]);
}

#[tokio::test]
async fn empty_terminal_feed_yields_nothing() {
    let fetch =
        |_token: Option<PageToken>| async move { Ok::<_, Error>(Page::<i32>::terminal(vec![])) };

    let items = feed::collect(fetch, None).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn error_surfaces_after_the_items_before_it() {
    let fetch = |token: Option<PageToken>| async move {
        match token.as_ref().map(PageToken::as_str) {
            None => Ok(Page::more(vec![1, 2], "a")),
            Some("a") => Err(Error::unavailable("connection reset")),
            other => panic!("unexpected token {other:?}"),
        }
    };

    let stream = feed::items(fetch, None);
    pin_mut!(stream);

    assert_eq!(stream.next().await.unwrap().unwrap(), 1);
    assert_eq!(stream.next().await.unwrap().unwrap(), 2);
    assert!(stream.next().await.unwrap().is_err());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn early_abandonment_stops_fetching() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);

    let stream = feed::items(
        move |token| {
            counter.fetch_add(1, Ordering::SeqCst);
            three_pages(token)
        },
        None,
    );
    pin_mut!(stream);

    assert_eq!(stream.next().await.unwrap().unwrap(), 1);
    assert_eq!(stream.next().await.unwrap().unwrap(), 2);
    drop(stream);

    // Only the page that supplied the consumed items was fetched.
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn iterations_are_independent() {
    let tokens = Arc::new(Mutex::new(Vec::new()));

    let record = |tokens: &Arc<Mutex<Vec<Option<String>>>>| {
        let tokens = Arc::clone(tokens);
        move |token: Option<PageToken>| {
            tokens
                .lock()
                .unwrap()
                .push(token.as_ref().map(|t| t.as_str().to_owned()));
            three_pages(token)
        }
    };

    let first = feed::collect(record(&tokens), None).await.unwrap();
    let second = feed::collect(record(&tokens), None).await.unwrap();
    assert_eq!(first, second);

    // Both walks started from the first page and saw the same tokens.
    let seen = tokens.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            None,
            Some("a".to_owned()),
            Some("b".to_owned()),
            None,
            Some("a".to_owned()),
            Some("b".to_owned()),
        ]
    );
}

#[tokio::test]
async fn recovering_fetch_does_not_disturb_the_walk() {
    // A page fetch may retry internally, e.g. after refreshing an expired
    // credential. The walk only sees the eventual result, and the token
    // sequence is unaffected.
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let fetch = move |token: Option<PageToken>| {
        let counter = Arc::clone(&counter);
        async move {
            if token.as_ref().map(PageToken::as_str) == Some("a")
                && counter.fetch_add(1, Ordering::SeqCst) == 0
            {
                // Simulated first rejection; the fetcher resolves it and
                // repeats the same page request.
                return three_pages(Some(PageToken::from("a"))).await;
            }

            three_pages(token).await
        }
    };

    let items = feed::collect(fetch, None).await.unwrap();
    assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);
}
