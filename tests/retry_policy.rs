//! Retry policy behavior as seen by a client of the crate.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sdk_core::backoff::exponential_delay;
use sdk_core::condition::{AlwaysRetry, FnCondition};
use sdk_core::{
    AndCondition, AttemptContext, EqualJitterBackoff, FullJitterBackoff, InstantSleeper,
    OrCondition, RetryCondition, RetryExecutor, RetryPolicy, SdkError, TrackingSleeper,
};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const BASE: Duration = Duration::from_millis(100);
const CAP: Duration = Duration::from_secs(20);

#[test]
fn exponential_delay_saturates_past_max_retries() {
    for max_retries in [0u32, 1, 3, 10, 63, 64] {
        let at_max = exponential_delay(max_retries, BASE, CAP, max_retries);
        for n in max_retries..max_retries + 50 {
            assert_eq!(exponential_delay(n, BASE, CAP, max_retries), at_max);
        }
    }
    assert_eq!(exponential_delay(u32::MAX, BASE, CAP, u32::MAX), CAP);
}

#[test]
fn jittered_delays_stay_inside_their_bands() {
    let mut rng = StdRng::seed_from_u64(7);
    let full = FullJitterBackoff::with_defaults(10);
    let equal = EqualJitterBackoff::with_defaults(10);
    for n in 0..12 {
        let ctx = AttemptContext::new(n);
        let ceiling = full.ceiling(n);
        for _ in 0..50 {
            assert!(full.delay_with_rng(&ctx, &mut rng) <= ceiling);
            let delay = equal.delay_with_rng(&ctx, &mut rng);
            assert!(delay >= ceiling / 2 && delay <= ceiling, "n={} delay={:?}", n, delay);
        }
    }
}

#[derive(Debug)]
struct Counting {
    answer: bool,
    calls: Arc<AtomicUsize>,
}

impl RetryCondition for Counting {
    fn should_retry(&self, _ctx: &AttemptContext<'_>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

#[test]
fn combinators_short_circuit() {
    let second = Arc::new(AtomicUsize::new(0));
    let and = AndCondition::new()
        .and(Counting { answer: false, calls: Arc::new(AtomicUsize::new(0)) })
        .and(Counting { answer: true, calls: second.clone() });
    assert!(!and.should_retry(&AttemptContext::new(0)));
    assert_eq!(second.load(Ordering::SeqCst), 0);

    let or = OrCondition::new()
        .or(Counting { answer: true, calls: Arc::new(AtomicUsize::new(0)) })
        .or(Counting { answer: false, calls: second.clone() });
    assert!(or.should_retry(&AttemptContext::new(0)));
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[test]
fn custom_condition_cannot_bypass_ceiling() {
    let policy = RetryPolicy::builder()
        .num_retries(3)
        .retry_condition(FnCondition::new(|_: &AttemptContext<'_>| true))
        .build()
        .unwrap();
    assert!(policy.should_retry(&AttemptContext::new(2)));
    assert!(!policy.should_retry(&AttemptContext::new(3)));
}

#[test]
fn none_policy_refuses_everything() {
    let none = RetryPolicy::none();
    let errors = [
        SdkError::service(503, "ServiceUnavailable", "down"),
        SdkError::service(400, "ThrottlingException", "slow"),
        SdkError::retryable("marked"),
        SdkError::from(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
    ];
    for err in &errors {
        assert!(!none.should_retry(&AttemptContext::new(0).with_error(err)));
    }
}

#[test]
fn standard_to_builder_differs_only_in_num_retries() {
    let standard = RetryPolicy::standard();
    let five = standard.to_builder().num_retries(5).build().unwrap();
    assert_eq!(five.num_retries(), 5);
    assert_eq!(standard.num_retries(), 3);
    assert!(Arc::ptr_eq(five.backoff_strategy(), standard.backoff_strategy()));
    assert!(Arc::ptr_eq(five.retry_condition(), standard.retry_condition()));
}

#[test]
fn default_condition_covers_throttling_and_clock_skew() {
    let policy = RetryPolicy::standard();
    for code in ["Throttling", "SlowDown", "RequestTimeTooSkewed", "SignatureDoesNotMatch"] {
        let err = SdkError::service(400, code, "retry me");
        assert!(policy.should_retry(&AttemptContext::new(0).with_error(&err)), "{}", code);
    }
    let denied = SdkError::service(400, "ValidationException", "bad input");
    assert!(!policy.should_retry(&AttemptContext::new(0).with_error(&denied)));
    assert!(policy.should_retry(&AttemptContext::new(0).with_status_code(502)));
    assert!(!policy.should_retry(&AttemptContext::new(0).with_status_code(501)));
}

#[test]
fn executor_runs_state_machine_with_backoff_between_every_attempt() {
    let sleeper = TrackingSleeper::new();
    let policy = RetryPolicy::builder()
        .num_retries(3)
        .retry_condition(AlwaysRetry)
        .backoff_strategy(EqualJitterBackoff::new(Duration::from_millis(10), CAP, 3).unwrap())
        .build()
        .unwrap();
    let executor = RetryExecutor::new(policy).with_sleeper(sleeper.clone());

    let calls = AtomicUsize::new(0);
    let result: Result<(), SdkError> = executor.execute(&(), |_| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Err(SdkError::retryable(format!("attempt {}", n)))
    });

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), SdkError::retryable("attempt 3").to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    let delays = sleeper.calls();
    assert_eq!(delays.len(), 3);
    for (n, delay) in delays.iter().enumerate() {
        let ceiling = exponential_delay(n as u32, Duration::from_millis(10), CAP, 3);
        assert!(*delay >= ceiling / 2 && *delay <= ceiling);
    }
}

#[test]
fn policies_are_shared_across_threads() {
    let executor = Arc::new(RetryExecutor::new(RetryPolicy::standard().clone()).with_sleeper(InstantSleeper));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let executor = executor.clone();
            std::thread::spawn(move || {
                let calls = AtomicUsize::new(0);
                let _ = executor.execute(&"PutItem", |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(SdkError::service(500, "InternalFailure", "boom"))
                });
                calls.load(Ordering::SeqCst)
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 4);
    }
}
