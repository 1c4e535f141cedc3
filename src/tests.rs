use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::core::{ImageId, QueryKey};
use crate::feed::{FeedCache, FeedManager, FeedView, FetchOutcome};
use crate::form::{SubmitOutcome, UploadForm};
use crate::preview::CardList;
use crate::test_support::{png, record, MockApi, MockHost, RecordingNotifier};

fn cards(view: FeedView) -> Vec<crate::core::ImageRecord> {
    match view {
        FeedView::Loaded { cards, .. } => cards,
        other => panic!("feed not loaded: {other:?}"),
    }
}

// 上传成功后 feed 下次读取能看到新图片
#[tokio::test]
async fn test_created_image_appears_after_refetch() {
    let api = Arc::new(MockApi::new(vec![record("a"), record("b")], 10));
    let cache = Arc::new(FeedCache::new());
    let handle = FeedManager::new(api.clone(), cache.clone());
    let feed = handle.manager.clone();

    feed.load().await.unwrap();
    assert_eq!(cards(feed.view().await.unwrap()).len(), 2);

    let closed = Arc::new(AtomicUsize::new(0));
    let mut form = UploadForm::new(
        api.clone(),
        Arc::new(MockHost::default()),
        cache.clone(),
        Arc::new(RecordingNotifier::default()),
        Arc::new({
            let closed = closed.clone();
            move || {
                closed.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );

    form.attach_image(png("sunset.png", 2048)).await;
    form.set_title("Sunset");
    form.set_description("Over the sea");
    let SubmitOutcome::Created(created) = form.submit().await else {
        panic!("image was not created");
    };
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert!(cache.is_stale(&QueryKey::images()).await);

    // 旧数据在重新加载前不会变化
    assert_eq!(cards(feed.view().await.unwrap()).len(), 2);

    assert_eq!(feed.load().await.unwrap(), FetchOutcome::Fetched { appended: 3 });
    let cards = cards(feed.view().await.unwrap());
    assert_eq!(cards.len(), 3);
    assert!(cards.iter().any(|card| card.id == created.id && card.title == "Sunset"));

    drop(feed);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_submit_leaves_feed_cache_fresh() {
    let api = Arc::new(MockApi::new(vec![record("a")], 10));
    api.fail_create.store(true, Ordering::SeqCst);
    let cache = Arc::new(FeedCache::new());
    let handle = FeedManager::new(api.clone(), cache.clone());
    let feed = handle.manager.clone();
    feed.load().await.unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut form = UploadForm::new(
        api.clone(),
        Arc::new(MockHost::default()),
        cache.clone(),
        notifier.clone(),
        Arc::new(|| {}),
    );
    form.attach_image(png("sunset.png", 2048)).await;
    form.set_title("Sunset");
    form.set_description("Over the sea");

    assert!(matches!(form.submit().await, SubmitOutcome::Failed(_)));
    assert_eq!(notifier.titles(), vec!["Failed to create image"]);

    assert_eq!(feed.load().await.unwrap(), FetchOutcome::Cached);
    assert_eq!(api.fetches(), 1);
}

#[tokio::test]
async fn test_preview_from_loaded_feed() {
    let api = Arc::new(MockApi::new(vec![record("a"), record("b"), record("c")], 2));
    let handle = FeedManager::new(api.clone(), Arc::new(FeedCache::new()));
    let feed = handle.manager.clone();

    feed.load().await.unwrap();
    let mut list = CardList::new(cards(feed.view().await.unwrap()));
    assert!(list.open(&ImageId::new("b")));

    feed.fetch_next_page().await.unwrap();
    list.set_cards(cards(feed.view().await.unwrap()));

    assert_eq!(list.cards().len(), 3);
    let preview = list.preview().unwrap();
    assert_eq!(preview.original.href, "https://i.test/b.png");

    list.close();
    assert!(list.preview().is_none());
}
