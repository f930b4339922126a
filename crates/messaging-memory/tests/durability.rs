mod support;

use support::{Mode, Recorder, drain, settle, ticket};

use ticketing_events::Subject;
use ticketing_messaging::{DEFAULT_ACK_WAIT, Subscriber, Subscription, SubscriptionState};
use ticketing_messaging_memory::MemoryBroker;

fn sequences(deliveries: &[support::Delivery]) -> Vec<u64> {
    deliveries.iter().map(|d| d.sequence).collect()
}

#[tokio::test(start_paused = true)]
async fn test_first_subscription_replays_history() {
    let broker = MemoryBroker::new();
    for version in 0..3 {
        broker.publish_event(&ticket(version)).unwrap();
    }

    let (listener, mut deliveries) = Recorder::new("orders-service", Mode::Ack);
    let _subscription = Subscriber::new(broker.connect("orders-1"), listener)
        .listen()
        .await
        .unwrap();
    settle().await;

    assert_eq!(sequences(&drain(&mut deliveries)), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_close_keeps_position() {
    let broker = MemoryBroker::new();
    let (listener, mut deliveries) = Recorder::new("orders-service", Mode::Ack);
    let subscription = Subscriber::new(broker.connect("orders-1"), listener)
        .listen()
        .await
        .unwrap();

    broker.publish_event(&ticket(0)).unwrap();
    settle().await;
    assert_eq!(sequences(&drain(&mut deliveries)), vec![1]);

    let mut changes = subscription.state_changes();
    subscription.close().await.unwrap();
    assert_eq!(*changes.borrow_and_update(), SubscriptionState::Closed);
    assert!(broker.has_group(Subject::TicketUpdated, "orders-service"));

    broker.publish_event(&ticket(1)).unwrap();
    broker.publish_event(&ticket(2)).unwrap();

    let (listener, mut deliveries) = Recorder::new("orders-service", Mode::Ack);
    let _subscription = Subscriber::new(broker.connect("orders-2"), listener)
        .listen()
        .await
        .unwrap();
    settle().await;

    assert_eq!(sequences(&drain(&mut deliveries)), vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_drop_behaves_like_close() {
    let broker = MemoryBroker::new();
    let (listener, _deliveries) = Recorder::new("orders-service", Mode::Ack);
    let subscription = Subscriber::new(broker.connect("orders-1"), listener)
        .listen()
        .await
        .unwrap();

    drop(subscription);

    assert!(broker.has_group(Subject::TicketUpdated, "orders-service"));
    assert_eq!(broker.members(Subject::TicketUpdated, "orders-service"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_forgets_position() {
    let broker = MemoryBroker::new();
    let (listener, mut deliveries) = Recorder::new("orders-service", Mode::Ack);
    let subscription = Subscriber::new(broker.connect("orders-1"), listener)
        .listen()
        .await
        .unwrap();

    broker.publish_event(&ticket(0)).unwrap();
    settle().await;
    assert_eq!(drain(&mut deliveries).len(), 1);

    subscription.unsubscribe().await.unwrap();
    assert!(!broker.has_group(Subject::TicketUpdated, "orders-service"));

    broker.publish_event(&ticket(1)).unwrap();

    let (listener, mut deliveries) = Recorder::new("orders-service", Mode::Ack);
    let _subscription = Subscriber::new(broker.connect("orders-2"), listener)
        .listen()
        .await
        .unwrap();
    settle().await;

    assert_eq!(sequences(&drain(&mut deliveries)), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_suspends_and_reconnect_resumes() {
    let broker = MemoryBroker::new();
    let connection = broker.connect("orders-1");
    let (listener, mut deliveries) = Recorder::new("orders-service", Mode::Ack);
    let subscription = Subscriber::new(connection.clone(), listener)
        .listen()
        .await
        .unwrap();
    assert_eq!(subscription.state(), SubscriptionState::Active);

    connection.disconnect();
    assert!(!connection.is_connected());
    assert_eq!(subscription.state(), SubscriptionState::Suspended);

    broker.publish_event(&ticket(0)).unwrap();
    broker.publish_event(&ticket(1)).unwrap();
    settle().await;
    assert!(drain(&mut deliveries).is_empty());

    connection.reconnect();
    assert_eq!(subscription.state(), SubscriptionState::Active);
    settle().await;

    assert_eq!(sequences(&drain(&mut deliveries)), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_expired_messages_wait_for_reconnect() {
    let broker = MemoryBroker::new();
    let connection = broker.connect("orders-1");
    let (listener, mut deliveries) = Recorder::new("orders-service", Mode::FailFirst(1));
    let _subscription = Subscriber::new(connection.clone(), listener)
        .listen()
        .await
        .unwrap();

    broker.publish_event(&ticket(0)).unwrap();
    settle().await;
    assert_eq!(drain(&mut deliveries).len(), 1);

    connection.disconnect();
    tokio::time::sleep(DEFAULT_ACK_WAIT * 2).await;
    assert!(drain(&mut deliveries).is_empty());
    assert_eq!(broker.pending(Subject::TicketUpdated, "orders-service"), 1);

    connection.reconnect();
    settle().await;

    let redelivered = drain(&mut deliveries);
    assert_eq!(redelivered.len(), 1);
    assert!(redelivered[0].redelivered);
    assert_eq!(broker.pending(Subject::TicketUpdated, "orders-service"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_while_disconnected_fails() {
    let broker = MemoryBroker::new();
    let connection = broker.connect("orders-1");
    connection.disconnect();

    let (listener, _deliveries) = Recorder::new("orders-service", Mode::Ack);
    let result = Subscriber::new(connection, listener).listen().await;

    assert!(result.is_err());
    assert!(!broker.has_group(Subject::TicketUpdated, "orders-service"));
}
