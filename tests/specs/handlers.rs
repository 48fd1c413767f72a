//! Persistent handler specs

use crate::prelude::*;
use tokio::sync::mpsc;
use tripline_core::{Callback, DispatchHub, HandlerControl, InterruptControl};

#[tokio::test]
async fn handler_fires_for_every_introduction_until_removed() {
    let hub = DispatchHub::new();
    let control = HandlerControl::new(hub.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = control.on(
        &introduction_trigger(),
        Callback::new_sync(move |event: ChatEvent, name: String| {
            let _ = tx.send((event, name));
        }),
    );

    hub.deliver(friend(1, "我是 Yiri"));
    hub.deliver(friend(1, "unrelated chatter"));
    hub.deliver(friend(2, "我是 Mirai"));

    assert_eq!(
        rx.recv().await,
        Some((friend(1, "我是 Yiri"), "Yiri".to_string()))
    );
    assert_eq!(
        rx.recv().await,
        Some((friend(2, "我是 Mirai"), "Mirai".to_string()))
    );

    control.remove(&handle);
    assert_eq!(hub.registration_count(), 0);

    hub.deliver(friend(3, "我是 Late"));
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn wait_and_handler_on_the_same_category_both_observe_the_event() {
    let hub = DispatchHub::new();
    let interrupts = InterruptControl::new(hub.clone());
    let handlers = HandlerControl::new(hub.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let _handle = handlers.on(
        &introduction_trigger(),
        Callback::new_sync(move |_event: ChatEvent, name: String| {
            let _ = tx.send(name);
        }),
    );

    let wait = tokio::spawn({
        let interrupts = interrupts.clone();
        let trigger = introduction_trigger();
        async move { interrupts.wait(&trigger, None).await }
    });
    while hub.registration_count() < 2 {
        tokio::task::yield_now().await;
    }

    hub.deliver(friend(1, "我是 Yiri"));

    assert_eq!(wait.await.unwrap(), Some("Yiri".to_string()));
    assert_eq!(rx.recv().await, Some("Yiri".to_string()));

    // The handler persists after the one-shot wait is gone.
    assert_eq!(hub.registration_count(), 1);
    hub.deliver(friend(2, "我是 Mirai"));
    assert_eq!(rx.recv().await, Some("Mirai".to_string()));
}

#[tokio::test]
async fn handlers_on_different_categories_are_independent() {
    let hub = DispatchHub::new();
    let control = HandlerControl::new(hub.clone());
    let (friend_tx, mut friend_rx) = mpsc::unbounded_channel();
    let (group_tx, mut group_rx) = mpsc::unbounded_channel();

    let _friends = control.on(
        &introduction_trigger(),
        Callback::new_sync(move |_event: ChatEvent, name: String| {
            let _ = friend_tx.send(name);
        }),
    );
    let group_trigger = tripline_core::Trigger::new("GroupMessage", |event: &ChatEvent| {
        match event {
            ChatEvent::GroupMessage { text, .. } => Some(text.clone()),
            _ => None,
        }
    });
    let _groups = control.on(
        &group_trigger,
        Callback::new_sync(move |_event: ChatEvent, text: String| {
            let _ = group_tx.send(text);
        }),
    );

    hub.deliver(group(9, "hello group"));
    hub.deliver(friend(1, "我是 Yiri"));

    assert_eq!(group_rx.recv().await, Some("hello group".to_string()));
    assert_eq!(friend_rx.recv().await, Some("Yiri".to_string()));
    tokio::task::yield_now().await;
    assert!(friend_rx.try_recv().is_err());
    assert!(group_rx.try_recv().is_err());
}
