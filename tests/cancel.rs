use collection_retrofit::Cancelled;
use collection_retrofit::Policy;
use collection_retrofit::Retrofit;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use fixture::*;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
enum Shutdown {
    #[error("server is shutting down")]
    Server,
    #[error("client went away")]
    Client,
}

#[test]
fn cancel_wakes_blocked_taker() {
    let _trace = trace_init();
    let queue: SharedQueue = Arc::default();

    let receiver = thread::spawn({
        let queue = queue.clone();
        move || queue.shift_one(None)
    });
    wait_for_waiters(&queue, 1);

    queue.cancel(Cancelled);
    assert_eq!(Err(Cancelled), receiver.join().unwrap());
    assert_eq!(0, queue.waiter_count());
}

#[test]
fn cancel_wakes_every_taker() {
    let queue: Arc<Retrofit<Vec<u32>, Shutdown>> = Arc::default();

    let requests = [
        (1, Policy::Partial),
        (3, Policy::AllOrNothing),
        (3, Policy::PartialOnTimeout),
    ];
    let receivers: Vec<_> = requests
        .into_iter()
        .map(|(count, policy)| {
            let queue = queue.clone();
            thread::spawn(move || queue.shift(count, None, policy))
        })
        .collect();
    wait_for_waiters(&queue, 3);

    queue.cancel(Shutdown::Server);
    for receiver in receivers {
        assert_eq!(Err(Shutdown::Server), receiver.join().unwrap());
    }
    assert_eq!(0, queue.waiter_count());
}

#[test]
fn cancelled_take_fails_immediately_even_with_items() {
    let queue: Retrofit<VecDeque<u32>, Shutdown> = Retrofit::default();
    queue.cancel(Shutdown::Client);

    // Adding is still allowed.
    queue.push_iter([1, 2, 3]);
    assert_eq!(3, queue.len());

    assert_eq!(Err(Shutdown::Client), queue.shift_one(None));
    assert_eq!(
        Err(Shutdown::Client),
        queue.shift(1, Some(ms(1000)), Policy::Partial)
    );
    assert_eq!(3, queue.len());
    assert_eq!(0, queue.waiter_count());
}

#[test]
fn cancel_again_replaces_error() {
    let queue: Retrofit<VecDeque<u32>, Shutdown> = Retrofit::default();
    queue.cancel(Shutdown::Client);
    queue.cancel(Shutdown::Server);
    assert_eq!(Err(Shutdown::Server), queue.shift_one(None));
}

#[test]
fn uncancel_restores_blocking() -> anyhow::Result<()> {
    let _trace = trace_init();
    let queue: SharedQueue = Arc::default();
    queue.cancel(Cancelled);
    assert!(queue.is_cancelled());
    assert_eq!(Err(Cancelled), queue.shift_one(None));

    queue.uncancel();
    assert!(!queue.is_cancelled());
    // Uncancelling twice is harmless.
    queue.uncancel();

    let producer = trickle(&queue, 3, ms(20));
    assert_eq!(
        Some(vec![0, 1, 2]),
        queue.shift(3, None, Policy::AllOrNothing)?
    );
    producer.join().unwrap();

    assert_eq!(None, queue.shift_one(Some(ms(20)))?);
    Ok(())
}

#[test]
fn error_is_returned_as_error() {
    let queue: Retrofit<VecDeque<u32>, Shutdown> = Retrofit::default();
    queue.cancel(Shutdown::Server);

    let result: anyhow::Result<Option<u32>> = queue.shift_one(None).map_err(Into::into);
    let err = result.unwrap_err();
    assert_eq!(Some(&Shutdown::Server), err.downcast_ref::<Shutdown>());
    assert_eq!("server is shutting down", err.to_string());
}
