//! 并发测试 - 同一账单的并发写入必须串行化

mod common;

use std::sync::Arc;

use common::*;
use rust_decimal::Decimal;
use shared::error::ErrorCode;

const WRITERS: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_sum_quantities() {
    let env = setup();
    let tabs = env.state.tabs.clone();
    let tab = tabs.open_tab(&user(ALICE), OSTERIA).await.unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let tabs = Arc::clone(&tabs);
            tokio::spawn(async move { tabs.add_item(&user(ALICE), tab.id, NEGRONI, 1).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stats = env.state.tabs.stats().unwrap();
    assert_eq!(stats.item_count, 1);

    let mine = tabs.list_my_tabs(&user(ALICE)).await.unwrap();
    let line = &mine[0].items[0];
    assert_eq!(line.quantity, WRITERS as u32);
    assert_eq!(line.subtotal, Decimal::new(850, 2) * Decimal::from(WRITERS as u32));
    assert_eq!(mine[0].total, line.subtotal);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opens_create_one_tab() {
    let env = setup();
    let tabs = env.state.tabs.clone();

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let tabs = Arc::clone(&tabs);
            tokio::spawn(async move { tabs.open_tab(&user(BOB), OSTERIA).await })
        })
        .collect();

    let mut opened = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => opened += 1,
            Err(e) => assert!(
                matches!(e.code, ErrorCode::TabAlreadyOpen | ErrorCode::TabBusy),
                "unexpected error: {:?}",
                e.code
            ),
        }
    }

    assert_eq!(opened, 1);
    assert_eq!(env.state.tabs.stats().unwrap().open_tab_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_races_with_adds() {
    let env = setup();
    let tabs = env.state.tabs.clone();
    let tab = tabs.open_tab(&user(ALICE), OSTERIA).await.unwrap();

    let adders: Vec<_> = (0..WRITERS)
        .map(|_| {
            let tabs = Arc::clone(&tabs);
            tokio::spawn(async move { tabs.add_item(&user(ALICE), tab.id, TIRAMISU, 1).await })
        })
        .collect();
    let closer = {
        let tabs = Arc::clone(&tabs);
        tokio::spawn(async move { tabs.close_tab(&user(ALICE), tab.id, ALICE_CARD).await })
    };

    let mut added = 0u32;
    for handle in adders {
        match handle.await.unwrap() {
            Ok(_) => added += 1,
            Err(e) => assert!(matches!(e.code, ErrorCode::TabClosed | ErrorCode::TabBusy)),
        }
    }
    let closed = closer.await.unwrap().unwrap();

    // Adds that succeeded all landed before the close
    let mine = tabs.list_my_tabs(&user(ALICE)).await.unwrap();
    let quantity: u32 = mine[0].items.iter().map(|l| l.quantity).sum();
    assert_eq!(quantity, added);
    assert_eq!(closed.total, Decimal::new(600, 2) * Decimal::from(quantity));
    assert_eq!(mine[0].total, closed.total);
}
