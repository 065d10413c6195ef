// tests/store_sqlite.rs
// Claim semantics of the durable store: at-most-once per identity key,
// including concurrent duplicate attempts, and survival across reopen.

use std::sync::Arc;

use yad2_watcher::listing::Listing;
use yad2_watcher::store::sqlite::SqliteStore;
use yad2_watcher::store::ListingStore;

fn listing(id: &str, price: &str) -> Listing {
    Listing::new(
        id.into(),
        format!("https://www.yad2.co.il/realestate/item/{id}"),
        "Flat".into(),
        price.into(),
    )
}

#[tokio::test]
async fn try_claim_returns_true_exactly_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let l = listing("t1", "5000");

    assert!(store.try_claim(&l).await.unwrap());
    assert!(!store.try_claim(&l).await.unwrap());
    assert!(!store.try_claim(&l).await.unwrap());
    assert!(store.exists("t1").await.unwrap());
    assert!(!store.exists("t2").await.unwrap());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn reclaim_with_drifted_price_is_a_noop() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    assert!(store.try_claim(&listing("t1", "5000")).await.unwrap());
    // price drift on a known identity is not "new"
    assert!(!store.try_claim(&listing("t1", "5400")).await.unwrap());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn link_keyed_listing_claims_on_link() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let l = Listing::new(
        String::new(),
        "https://www.yad2.co.il/realestate/item/only-link".into(),
        "Flat".into(),
        "4200".into(),
    );
    assert!(store.try_claim(&l).await.unwrap());
    assert!(store
        .exists("https://www.yad2.co.il/realestate/item/only-link")
        .await
        .unwrap());
    assert!(!store.try_claim(&l).await.unwrap());
}

#[tokio::test]
async fn concurrent_duplicate_claims_yield_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.sqlite");
    let store = Arc::new(SqliteStore::open(&path).await.unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.try_claim(&listing("raced", "5000")).await.unwrap()
        }));
    }

    let mut winners = 0;
    for h in handles {
        if h.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn claims_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listings.sqlite");

    {
        let store = SqliteStore::open(&path).await.unwrap();
        assert!(store.try_claim(&listing("persist-1", "6000")).await.unwrap());
    }

    let reopened = SqliteStore::open(&path).await.unwrap();
    assert!(reopened.exists("persist-1").await.unwrap());
    assert!(!reopened.try_claim(&listing("persist-1", "6000")).await.unwrap());
}
