//! One-shot wait specs
//!
//! The documented scenario: a task remembers who it is talking to, then
//! waits up to 60 seconds for that contact to introduce themselves.

use crate::prelude::*;
use std::time::Duration;
use tripline_core::{DispatchHub, InterruptControl, Trigger};

#[tokio::test(start_paused = true)]
async fn introduction_resolves_well_under_the_deadline() {
    let hub = DispatchHub::new();
    let control = InterruptControl::new(hub.clone());

    let started = tokio::time::Instant::now();
    let wait = tokio::spawn({
        let control = control.clone();
        let trigger = introduction_trigger();
        async move { control.wait(&trigger, Some(Duration::from_secs(60))).await }
    });
    while hub.registration_count() == 0 {
        tokio::task::yield_now().await;
    }

    hub.deliver(friend(1, "我是 Yiri"));

    assert_eq!(wait.await.unwrap(), Some("Yiri".to_string()));
    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(hub.registration_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn expired_wait_ignores_a_late_introduction() {
    let hub = DispatchHub::new();
    let control = InterruptControl::new(hub.clone());

    let result = control
        .wait(&introduction_trigger(), Some(Duration::from_secs(60)))
        .await;
    assert_eq!(result, None);
    assert_eq!(hub.registration_count(), 0);

    // The same message arriving after expiry lands on no registration.
    hub.deliver(friend(1, "我是 Yiri"));
    assert_eq!(hub.registration_count(), 0);
}

#[tokio::test]
async fn correlation_against_remembered_context() {
    let hub = DispatchHub::new();
    let control = InterruptControl::new(hub.clone());

    // Context captured earlier in the task: the sender we are talking to.
    let sender_of_interest = 42;
    let trigger = introduction_trigger().filter(move |event: &ChatEvent| {
        matches!(event, ChatEvent::FriendMessage { sender, .. } if *sender == sender_of_interest)
    });

    let wait = tokio::spawn({
        let control = control.clone();
        let trigger = trigger.clone();
        async move { control.wait(&trigger, None).await }
    });
    while hub.registration_count() == 0 {
        tokio::task::yield_now().await;
    }

    // Same text from the wrong sender must not resolve the wait.
    hub.deliver(friend(7, "我是 Impostor"));
    hub.deliver(friend(42, "我是 Yiri"));

    assert_eq!(wait.await.unwrap(), Some("Yiri".to_string()));
}

#[tokio::test]
async fn group_events_never_reach_friend_waits() {
    let hub = DispatchHub::new();
    let control = InterruptControl::new(hub.clone());

    let wait = tokio::spawn({
        let control = control.clone();
        let trigger = introduction_trigger();
        async move { control.wait(&trigger, None).await }
    });
    while hub.registration_count() == 0 {
        tokio::task::yield_now().await;
    }

    hub.deliver(group(5, "我是 Yiri"));
    // Still waiting; only a friend message resolves it.
    assert_eq!(hub.registration_count(), 1);

    hub.deliver(friend(5, "我是 Yiri"));
    assert_eq!(wait.await.unwrap(), Some("Yiri".to_string()));
}

#[tokio::test]
async fn bare_introduction_matches_with_empty_payload() {
    let hub = DispatchHub::new();
    let control = InterruptControl::new(hub.clone());

    let wait = tokio::spawn({
        let control = control.clone();
        let trigger = introduction_trigger();
        async move { control.wait(&trigger, None).await }
    });
    while hub.registration_count() == 0 {
        tokio::task::yield_now().await;
    }

    // Nothing after the prefix: the payload is empty but present, so it
    // still counts as a match.
    hub.deliver(friend(1, "我是"));
    assert_eq!(wait.await.unwrap(), Some(String::new()));
}

#[tokio::test]
async fn mapped_trigger_delivers_transformed_payload() {
    let hub = DispatchHub::new();
    let control = InterruptControl::new(hub.clone());

    let trigger: Trigger<ChatEvent, usize> = introduction_trigger().map(|name| name.len());
    let wait = tokio::spawn({
        let control = control.clone();
        let trigger = trigger.clone();
        async move { control.wait(&trigger, None).await }
    });
    while hub.registration_count() == 0 {
        tokio::task::yield_now().await;
    }

    hub.deliver(friend(1, "我是 Yiri"));
    assert_eq!(wait.await.unwrap(), Some(4));
}
