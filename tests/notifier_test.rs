use cookieshelf::{CookieEntry, CookieJar, CookieJarConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn touch(jar: &CookieJar, i: usize) {
    let name = format!("c{}", i);
    jar.insert_entry("example.com", CookieEntry::new(name, "v", "example.com", "/"));
}

#[tokio::test(start_paused = true)]
async fn test_burst_coalesces_into_one_trailing_call() {
    let jar = CookieJar::new();
    let fired: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&fired);
    jar.register_change_callback(
        move |_| {
            sink.lock().push(Instant::now());
            Ok(())
        },
        Duration::from_millis(50),
    )
    .unwrap();

    let start = Instant::now();
    for i in 0..10 {
        touch(&jar, i);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    // Last mutation happened at start + 45ms.

    tokio::time::sleep(Duration::from_millis(44)).await;
    assert!(fired.lock().is_empty(), "fired before the window after the last mutation");

    tokio::time::sleep(Duration::from_millis(10)).await;
    let fired = fired.lock();
    assert_eq!(fired.len(), 1);
    let elapsed = fired[0] - start;
    assert!(
        elapsed >= Duration::from_millis(95) && elapsed < Duration::from_millis(100),
        "{:?}",
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn test_separate_bursts_fire_separately() {
    let jar = CookieJar::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    jar.register_change_callback(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Duration::from_millis(20),
    )
    .unwrap();

    touch(&jar, 0);
    touch(&jar, 1);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    touch(&jar, 2);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_is_still_deferred() {
    let jar = CookieJar::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    jar.register_change_callback(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Duration::ZERO,
    )
    .unwrap();

    touch(&jar, 0);
    touch(&jar, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_callback_error_is_swallowed_and_not_rearmed() {
    let jar = CookieJar::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    jar.register_change_callback(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("disk full".into())
        },
        Duration::from_millis(10),
    )
    .unwrap();

    touch(&jar, 0);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!jar.is_change_pending());
    assert_eq!(jar.total_cookie_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_callback_sees_latest_state() {
    let jar = CookieJar::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&seen);
    jar.register_change_callback(
        move |jar| {
            sink.store(jar.export_document().cookie_count(), Ordering::SeqCst);
            Ok(())
        },
        Duration::from_millis(10),
    )
    .unwrap();

    for i in 0..5 {
        touch(&jar, i);
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(seen.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn test_reads_and_failed_imports_do_not_notify() {
    let jar = CookieJar::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    jar.register_change_callback(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Duration::from_millis(10),
    )
    .unwrap();

    let _ = jar.export_document();
    let _ = jar.total_cookie_count();
    assert!(jar.import_json(br#"{"entries": "not-a-map"}"#, false).is_err());
    assert!(jar.remove_entry("nowhere", "nothing").is_none());
    assert!(!jar.is_change_pending());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_import_notifies() {
    let jar = CookieJar::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    jar.register_change_callback(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Duration::from_millis(10),
    )
    .unwrap();

    jar.import_json(br#"{"nextSeqNum": 0, "entries": {}}"#, false).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slow_callback_does_not_stall_other_tasks() {
    let jar = CookieJar::new();
    let finished = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&finished);
    jar.register_change_callback(
        move |_| {
            std::thread::sleep(Duration::from_millis(400));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Duration::ZERO,
    )
    .unwrap();

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    touch(&jar, 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 0, "callback finished too early");
    let during = ticks.load(Ordering::SeqCst);
    assert!(during >= 5, "only {} ticks while the callback ran", during);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    ticker.abort();
}

#[test]
fn test_concurrent_mutations_from_threads() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap();

    let config = CookieJarConfig::default().with_runtime(runtime.handle().clone());
    let jar = CookieJar::with_config(config);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    jar.register_change_callback(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Duration::from_millis(300),
    )
    .unwrap();

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let jar = jar.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    touch(&jar, t * 100 + i);
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    assert!(jar.is_change_pending());
    std::thread::sleep(Duration::from_millis(1200));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!jar.is_change_pending());
    assert_eq!(jar.total_cookie_count(), 400);
    assert_eq!(jar.next_seq_num(), 400);
}
