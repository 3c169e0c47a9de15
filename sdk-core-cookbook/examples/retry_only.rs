//! Minimal, focused retry example: a flaky operation behind the standard policy.

use sdk_core::prelude::*;
use std::cell::Cell;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== sdk-core: Retry-Only Example ===\n");

    // Standard policy with 4 retries; MemorySink lets us print telemetry at the end.
    let policy = RetryPolicy::standard().to_builder().num_retries(4).build()?;
    let sink = MemorySink::new();
    let executor = RetryExecutor::new(policy).with_sink(sink.clone());

    // First two attempts are throttled, the third succeeds.
    let attempt = Cell::new(0);
    println!("Calling flaky operation (should succeed after retries)...");
    let ok = executor.execute(&"DescribeTable", |op| {
        attempt.set(attempt.get() + 1);
        match attempt.get() {
            1 | 2 => Err(SdkError::service(400, "ThrottlingException", "rate exceeded")),
            n => Ok(format!("{} ok on attempt {}", op, n)),
        }
    })?;
    println!("✓ Result: {}", ok);

    println!("\nCalling with a validation error (should NOT retry)...");
    let err = executor
        .execute(&"DescribeTable", |_| {
            Err::<String, _>(SdkError::service(400, "ValidationException", "bad table name"))
        })
        .unwrap_err();
    println!("✗ Error returned immediately: {}", err);

    println!("\nTelemetry events (MemorySink):");
    for event in sink.events() {
        println!("  - {}", event);
    }

    Ok(())
}
