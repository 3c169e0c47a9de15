//! Paginate from a paginator definition document over JSON requests and responses.

use sdk_core::paginators::{JsonItem, JsonPaginator, Paginators};
use sdk_core::{InstantSleeper, RetryExecutor, RetryPolicy, SdkError};
use serde_json::{json, Value};
use std::cell::Cell;
use tracing_subscriber::filter::LevelFilter;

const DEFINITIONS: &str = r#"{
  "pagination": {
    "ListTagsOfResource": {
      "input_token": "NextToken",
      "output_token": "Paging.NextToken",
      "limit_key": "MaxResults",
      "result_key": "Tags"
    }
  }
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(LevelFilter::DEBUG).init();

    let paginators = Paginators::from_json(DEFINITIONS)?;
    let spec = paginators.spec_for("ListTagsOfResource")?;
    let executor = RetryExecutor::new(RetryPolicy::standard().clone()).with_sleeper(InstantSleeper);

    // Second page fails once with a 503 before succeeding.
    let flaky = Cell::new(true);
    let service = |req: &Value| -> Result<Value, SdkError> {
        executor.execute(req, |req| match req.get("NextToken").and_then(Value::as_str) {
            None => Ok(json!({"Tags": {"env": "prod", "team": "storage"}, "Paging": {"NextToken": "p2"}})),
            Some("p2") if flaky.replace(false) => {
                Err(SdkError::service(503, "ServiceUnavailable", "busy"))
            }
            Some(_) => Ok(json!({"Tags": {"owner": "ops"}})),
        })
    };

    let request = spec.with_limit(&json!({"ResourceArn": "arn:example:table/users"}), 2)?;
    let first_page = service(&request)?;
    let paginator = JsonPaginator::new(spec, request, first_page, service)?;

    for item in paginator.all_items().iter() {
        if let JsonItem::Entry(key, value) = item? {
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}
