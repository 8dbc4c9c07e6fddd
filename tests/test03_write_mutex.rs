use std::sync::{Arc, Mutex};
use std::time::Duration;

use finance_storage::WriteMutex;
use tokio::sync::oneshot;

type Log = Arc<Mutex<Vec<String>>>;

async fn step(log: &Log, id: u32, pause_ms: u64) -> Result<u32, String> {
    log.lock().unwrap().push(format!("start-{id}"));
    tokio::time::sleep(Duration::from_millis(pause_ms)).await;
    log.lock().unwrap().push(format!("end-{id}"));
    if id == 2 {
        return Err("task 2 failed".into());
    }
    Ok(id)
}

#[tokio::test]
async fn tasks_run_one_at_a_time_in_request_order() {
    let mutex = WriteMutex::new();
    let log: Log = Arc::default();

    // the first task sleeps longest; without the lock the later ones would finish first
    let (a, b, c) = tokio::join!(
        mutex.run_exclusive(|| step(&log, 1, 30)),
        mutex.run_exclusive(|| step(&log, 2, 10)),
        mutex.run_exclusive(|| step(&log, 3, 0)),
    );

    assert_eq!(a, Ok(1));
    assert_eq!(b, Err("task 2 failed".to_string()));
    assert_eq!(c, Ok(3));
    assert_eq!(
        *log.lock().unwrap(),
        ["start-1", "end-1", "start-2", "end-2", "start-3", "end-3"]
    );
    assert!(!mutex.is_locked());
}

#[tokio::test]
async fn reports_holder_and_queue() {
    let mutex = WriteMutex::new();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let holder = tokio::spawn({
        let mutex = mutex.clone();
        async move {
            mutex
                .run_exclusive(|| async move {
                    let _ = release_rx.await;
                })
                .await;
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let waiters: Vec<_> = (0..2)
        .map(|i| {
            let mutex = mutex.clone();
            tokio::spawn(async move { mutex.run_exclusive_sync(move || i).await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(mutex.is_locked());
    assert_eq!(mutex.queue_length(), 2);

    release_tx.send(()).unwrap();
    holder.await.unwrap();
    for (i, waiter) in waiters.into_iter().enumerate() {
        assert_eq!(waiter.await.unwrap(), i);
    }
    assert!(!mutex.is_locked());
    assert_eq!(mutex.queue_length(), 0);
}

#[tokio::test]
async fn panicking_task_releases_the_lock() {
    let mutex = WriteMutex::new();

    let crashed = tokio::spawn({
        let mutex = mutex.clone();
        async move {
            mutex
                .run_exclusive(|| async {
                    panic!("boom");
                })
                .await
        }
    })
    .await;
    assert!(crashed.is_err());

    assert!(!mutex.is_locked());
    assert_eq!(mutex.run_exclusive_sync(|| "next").await, "next");
}
