//! Paginator definitions and a paginator driven by them over JSON requests and responses.
//!
//! A service model ships its pagination rules as:
//!
//! ```json
//! {"pagination": {"ListTables": {"input_token": "ExclusiveStartTableName",
//!                                "output_token": "LastEvaluatedTableName",
//!                                "limit_key": "Limit",
//!                                "result_key": "TableNames"}}}
//! ```
//!
//! [`Paginators`] loads that document. [`PaginationSpec::resolve`] turns one definition into
//! parsed paths once, up front; output tokens and result keys may be dotted paths into nested
//! members (`"Contents.NextMarker"`). The input token and limit key name top-level request
//! members. [`JsonPaginator`] then drives a [`PageSequence`] over `serde_json::Value` pages.

use crate::error::PaginatorConfigError;
use crate::pagination::{ItemSequence, PageFetcher, PageSequence, Pages};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Pagination rules for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginatorDefinition {
    /// Request member that carries the continuation token.
    pub input_token: String,
    /// Response member (dotted path) holding the next token.
    pub output_token: String,
    /// Request member bounding the page size, if the operation has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_key: Option<String>,
    /// Response member (dotted path) holding the page's items.
    pub result_key: String,
}

/// All paginator definitions of a service, keyed by operation name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paginators {
    #[serde(rename = "pagination", default)]
    paginators: BTreeMap<String, PaginatorDefinition>,
}

impl Paginators {
    /// A service with no paginated operations.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, PaginatorConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, PaginatorConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn get(&self, operation: &str) -> Option<&PaginatorDefinition> {
        self.paginators.get(operation)
    }

    /// Resolve the definition for `operation`.
    pub fn spec_for(&self, operation: &str) -> Result<PaginationSpec, PaginatorConfigError> {
        let definition = self
            .get(operation)
            .ok_or_else(|| PaginatorConfigError::UnknownOperation(operation.to_string()))?;
        PaginationSpec::resolve(definition)
    }

    /// Operation names in sorted order.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.paginators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paginators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paginators.is_empty()
    }
}

/// A [`PaginatorDefinition`] with its paths parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSpec {
    input_token: String,
    output_token: Vec<String>,
    limit_key: Option<String>,
    result_key: Vec<String>,
}

impl PaginationSpec {
    pub fn resolve(definition: &PaginatorDefinition) -> Result<Self, PaginatorConfigError> {
        let input_token = member("input_token", &definition.input_token)?;
        let limit_key = match &definition.limit_key {
            Some(key) => Some(member("limit_key", key)?),
            None => None,
        };
        Ok(Self {
            input_token,
            output_token: path("output_token", &definition.output_token)?,
            limit_key,
            result_key: path("result_key", &definition.result_key)?,
        })
    }

    pub fn input_token(&self) -> &str {
        &self.input_token
    }

    pub fn limit_key(&self) -> Option<&str> {
        self.limit_key.as_deref()
    }

    /// The continuation token on `page`, of any JSON shape. Absent, `null` and `""` mean
    /// there are no more pages.
    pub fn output_token<'v>(&self, page: &'v Value) -> Option<&'v Value> {
        lookup(page, &self.output_token).filter(|token| match token {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
    }

    /// The raw value at the result key, if present.
    pub fn results<'v>(&self, page: &'v Value) -> Option<&'v Value> {
        lookup(page, &self.result_key)
    }

    /// Copy of `request` with the input token set to `token`; every other member is unchanged.
    pub fn with_input_token(&self, request: &Value, token: &Value) -> Value {
        let mut next = request.clone();
        if let Value::Object(members) = &mut next {
            members.insert(self.input_token.clone(), token.clone());
        }
        next
    }

    /// Copy of `request` with the page-size member set to `limit`.
    pub fn with_limit(&self, request: &Value, limit: u64) -> Result<Value, PaginatorConfigError> {
        let key = self.limit_key.as_ref().ok_or(PaginatorConfigError::NoLimitKey)?;
        let mut next = request.clone();
        match &mut next {
            Value::Object(members) => {
                members.insert(key.clone(), Value::from(limit));
                Ok(next)
            }
            other => Err(PaginatorConfigError::RequestNotObject { found: type_name(other) }),
        }
    }

    /// The items of one page: list elements in order, or map entries in document order. A
    /// missing or `null` result key yields no items. Any other shape also yields none and is
    /// logged at `warn`, since only the first page is checked at setup.
    pub fn items(&self, mut page: Value) -> Vec<JsonItem> {
        match lookup_mut(&mut page, &self.result_key).map(Value::take) {
            Some(Value::Array(elements)) => elements.into_iter().map(JsonItem::Element).collect(),
            Some(Value::Object(entries)) => {
                entries.into_iter().map(|(key, value)| JsonItem::Entry(key, value)).collect()
            }
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                tracing::warn!(
                    result_key = %self.result_key.join("."),
                    found = type_name(&other),
                    "result key is neither a list nor a map; page items dropped"
                );
                Vec::new()
            }
        }
    }

    fn check_first_page(&self, page: &Value) -> Result<(), PaginatorConfigError> {
        match self.results(page) {
            None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => Ok(()),
            Some(other) => Err(PaginatorConfigError::ResultKeyShape {
                path: self.result_key.join("."),
                found: type_name(other),
            }),
        }
    }
}

/// One item of a JSON page.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonItem {
    /// Element of a list-shaped result.
    Element(Value),
    /// Entry of a map-shaped result.
    Entry(String, Value),
}

impl JsonItem {
    pub fn value(&self) -> &Value {
        match self {
            JsonItem::Element(value) | JsonItem::Entry(_, value) => value,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            JsonItem::Element(_) => None,
            JsonItem::Entry(key, _) => Some(key.as_str()),
        }
    }
}

/// Fetches the next JSON page by copying the first request with the page's output token.
pub struct JsonFetcher<Op, E> {
    spec: PaginationSpec,
    first_request: Value,
    operation: Op,
    _marker: PhantomData<fn() -> E>,
}

impl<Op, E> PageFetcher<Value> for JsonFetcher<Op, E>
where
    Op: Fn(&Value) -> Result<Value, E>,
{
    type Error = E;

    fn has_next_page(&self, page: &Value) -> bool {
        self.spec.output_token(page).is_some()
    }

    fn fetch_next_page(&self, page: &Value) -> Result<Option<Value>, E> {
        match self.spec.output_token(page) {
            Some(token) => {
                let request = self.spec.with_input_token(&self.first_request, token);
                (self.operation)(&request).map(Some)
            }
            None => Ok(None),
        }
    }
}

impl<Op, E> fmt::Debug for JsonFetcher<Op, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFetcher")
            .field("spec", &self.spec)
            .field("first_request", &self.first_request)
            .finish_non_exhaustive()
    }
}

/// Item view of a [`JsonPaginator`].
pub type JsonItems<'a, Op, E> =
    ItemSequence<'a, Value, JsonFetcher<Op, E>, Box<dyn Fn(Value) -> Vec<JsonItem> + 'a>>;

/// Paginator over JSON pages, configured by a [`PaginationSpec`].
///
/// ```rust
/// use sdk_core::paginators::{JsonItem, JsonPaginator, Paginators};
/// use serde_json::{json, Value};
///
/// let paginators = Paginators::from_json(
///     r#"{"pagination": {"ListTables": {"input_token": "ExclusiveStartTableName",
///         "output_token": "LastEvaluatedTableName", "result_key": "TableNames"}}}"#,
/// ).unwrap();
/// let spec = paginators.spec_for("ListTables").unwrap();
///
/// let list_tables = |req: &Value| -> Result<Value, std::io::Error> {
///     Ok(match req.get("ExclusiveStartTableName") {
///         None => json!({"TableNames": ["a", "b"], "LastEvaluatedTableName": "b"}),
///         Some(_) => json!({"TableNames": ["c"]}),
///     })
/// };
/// let request = json!({});
/// let first_page = list_tables(&request).unwrap();
/// let paginator = JsonPaginator::new(spec, request, first_page, list_tables).unwrap();
///
/// let names: Vec<JsonItem> = paginator.all_items().iter().collect::<Result<_, _>>().unwrap();
/// assert_eq!(names, vec![
///     JsonItem::Element(json!("a")),
///     JsonItem::Element(json!("b")),
///     JsonItem::Element(json!("c")),
/// ]);
/// ```
pub struct JsonPaginator<Op, E> {
    pages: PageSequence<Value, JsonFetcher<Op, E>>,
}

impl<Op, E> JsonPaginator<Op, E>
where
    Op: Fn(&Value) -> Result<Value, E>,
{
    /// Validate the request and first page against `spec` and start the paginator.
    pub fn new(
        spec: PaginationSpec,
        first_request: Value,
        first_page: Value,
        operation: Op,
    ) -> Result<Self, PaginatorConfigError> {
        if !first_request.is_object() {
            return Err(PaginatorConfigError::RequestNotObject { found: type_name(&first_request) });
        }
        spec.check_first_page(&first_page)?;
        let fetcher = JsonFetcher { spec, first_request, operation, _marker: PhantomData };
        Ok(Self { pages: PageSequence::new(first_page, fetcher) })
    }

    pub fn spec(&self) -> &PaginationSpec {
        &self.pages.fetcher().spec
    }

    pub fn first_page(&self) -> &Value {
        self.pages.first_page()
    }

    pub fn pages(&self) -> Pages<'_, Value, JsonFetcher<Op, E>> {
        self.pages.pages()
    }

    pub fn all_items(&self) -> JsonItems<'_, Op, E> {
        let spec = self.spec();
        let extract: Box<dyn Fn(Value) -> Vec<JsonItem> + '_> =
            Box::new(move |page: Value| spec.items(page));
        self.pages.items(extract)
    }

    pub fn page_sequence(&self) -> &PageSequence<Value, JsonFetcher<Op, E>> {
        &self.pages
    }
}

impl<Op, E> fmt::Debug for JsonPaginator<Op, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonPaginator").field("pages", &self.pages).finish()
    }
}

fn member(field: &'static str, name: &str) -> Result<String, PaginatorConfigError> {
    if name.is_empty() || name.contains('.') {
        return Err(PaginatorConfigError::InvalidPath { field, path: name.to_string() });
    }
    Ok(name.to_string())
}

fn path(field: &'static str, dotted: &str) -> Result<Vec<String>, PaginatorConfigError> {
    let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(PaginatorConfigError::InvalidPath { field, path: dotted.to_string() });
    }
    Ok(segments)
}

fn lookup<'v>(mut value: &'v Value, path: &[String]) -> Option<&'v Value> {
    for segment in path {
        value = value.get(segment.as_str())?;
    }
    Some(value)
}

fn lookup_mut<'v>(mut value: &'v mut Value, path: &[String]) -> Option<&'v mut Value> {
    for segment in path {
        value = value.get_mut(segment.as_str())?;
    }
    Some(value)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    const DEFINITIONS: &str = r#"{
        "pagination": {
            "ListTables": {
                "input_token": "ExclusiveStartTableName",
                "output_token": "LastEvaluatedTableName",
                "limit_key": "Limit",
                "result_key": "TableNames"
            },
            "ListObjects": {
                "input_token": "Marker",
                "output_token": "Contents.NextMarker",
                "result_key": "Contents.Keys"
            }
        }
    }"#;

    fn spec(operation: &str) -> PaginationSpec {
        Paginators::from_json(DEFINITIONS).unwrap().spec_for(operation).unwrap()
    }

    #[test]
    fn loads_definitions() {
        let paginators = Paginators::from_json(DEFINITIONS).unwrap();
        assert_eq!(paginators.len(), 2);
        assert_eq!(paginators.operations().collect::<Vec<_>>(), vec!["ListObjects", "ListTables"]);
        let tables = paginators.get("ListTables").unwrap();
        assert_eq!(tables.limit_key.as_deref(), Some("Limit"));
        assert!(paginators.get("ListObjects").unwrap().limit_key.is_none());
        assert!(Paginators::none().is_empty());
    }

    #[test]
    fn unknown_operation_and_bad_json_are_config_errors() {
        let paginators = Paginators::from_json(DEFINITIONS).unwrap();
        assert!(matches!(
            paginators.spec_for("GetItem"),
            Err(PaginatorConfigError::UnknownOperation(op)) if op == "GetItem"
        ));
        assert!(matches!(Paginators::from_json("{\"pagination\": 3}"), Err(PaginatorConfigError::Json(_))));
    }

    #[test]
    fn resolve_rejects_empty_path_segments() {
        let definition = PaginatorDefinition {
            input_token: "Marker".into(),
            output_token: "Contents..Next".into(),
            limit_key: None,
            result_key: "Keys".into(),
        };
        assert!(matches!(
            PaginationSpec::resolve(&definition),
            Err(PaginatorConfigError::InvalidPath { field: "output_token", .. })
        ));
    }

    #[test]
    fn nested_paths_resolve() {
        let spec = spec("ListObjects");
        let page = json!({"Contents": {"NextMarker": "k2", "Keys": ["k1", "k2"]}});
        assert_eq!(spec.output_token(&page), Some(&json!("k2")));
        assert_eq!(spec.items(page).len(), 2);
        assert_eq!(spec.output_token(&json!({"Contents": {"NextMarker": ""}})), None);
    }

    #[test]
    fn input_token_and_limit_leave_other_members_alone() {
        let spec = spec("ListTables");
        let request = json!({"Limit": 10, "Region": "eu"});
        let next = spec.with_input_token(&request, &json!("t9"));
        assert_eq!(next, json!({"Limit": 10, "Region": "eu", "ExclusiveStartTableName": "t9"}));
        assert_eq!(spec.with_limit(&json!({}), 25).unwrap(), json!({"Limit": 25}));
        assert!(matches!(
            self::spec("ListObjects").with_limit(&json!({}), 5),
            Err(PaginatorConfigError::NoLimitKey)
        ));
    }

    #[test]
    fn map_results_yield_entries_in_document_order() {
        let spec = PaginationSpec::resolve(&PaginatorDefinition {
            input_token: "Next".into(),
            output_token: "Next".into(),
            limit_key: None,
            result_key: "Tags".into(),
        })
        .unwrap();
        let items = spec.items(json!({"Tags": {"zeta": 1, "alpha": 2}}));
        assert_eq!(
            items,
            vec![
                JsonItem::Entry("zeta".into(), json!(1)),
                JsonItem::Entry("alpha".into(), json!(2)),
            ]
        );
        assert_eq!(items[0].key(), Some("zeta"));
        assert_eq!(items[1].value(), &json!(2));
    }

    #[test]
    fn scalar_result_key_fails_setup() {
        let result = JsonPaginator::new(
            spec("ListTables"),
            json!({}),
            json!({"TableNames": "oops"}),
            |_: &Value| Ok::<_, String>(json!({})),
        );
        assert!(matches!(
            result,
            Err(PaginatorConfigError::ResultKeyShape { found: "a string", .. })
        ));
    }

    #[test]
    fn non_object_request_fails_setup() {
        let result = JsonPaginator::new(
            spec("ListTables"),
            json!([1, 2]),
            json!({"TableNames": []}),
            |_: &Value| Ok::<_, String>(json!({})),
        );
        assert!(matches!(result, Err(PaginatorConfigError::RequestNotObject { found: "a list" })));
    }

    #[test]
    fn paginator_walks_pages_and_items_lazily() {
        let requests = RefCell::new(Vec::new());
        let list_tables = |req: &Value| {
            requests.borrow_mut().push(req.clone());
            match req["ExclusiveStartTableName"].as_str() {
                Some("b") => Ok(json!({"TableNames": [], "LastEvaluatedTableName": "b2"})),
                Some("b2") => Ok(json!({"TableNames": ["c"]})),
                other => Err(format!("unexpected token {:?}", other)),
            }
        };
        let request = json!({"Limit": 2});
        let first_page = json!({"TableNames": ["a", "b"], "LastEvaluatedTableName": "b"});
        let paginator =
            JsonPaginator::new(spec("ListTables"), request, first_page, list_tables).unwrap();

        let items = paginator.all_items();
        let mut cursor = items.iter();
        assert_eq!(cursor.try_next().unwrap(), JsonItem::Element(json!("a")));
        assert_eq!(cursor.try_next().unwrap(), JsonItem::Element(json!("b")));
        assert!(requests.borrow().is_empty());
        assert_eq!(cursor.try_next().unwrap(), JsonItem::Element(json!("c")));
        assert_eq!(
            *requests.borrow(),
            vec![
                json!({"Limit": 2, "ExclusiveStartTableName": "b"}),
                json!({"Limit": 2, "ExclusiveStartTableName": "b2"}),
            ]
        );
        assert!(cursor.next().is_none());
        assert_eq!(paginator.pages().count(), 3);
    }

    #[test]
    fn null_token_ends_but_other_shapes_continue() {
        let spec = spec("ListTables");
        assert_eq!(spec.output_token(&json!({"LastEvaluatedTableName": null})), None);
        assert_eq!(spec.output_token(&json!({"LastEvaluatedTableName": 0})), Some(&json!(0)));
        assert_eq!(
            spec.output_token(&json!({"LastEvaluatedTableName": false})),
            Some(&json!(false))
        );
    }

    #[test]
    fn map_shaped_token_is_passed_through_unchanged() {
        let spec = PaginationSpec::resolve(&PaginatorDefinition {
            input_token: "ExclusiveStartKey".into(),
            output_token: "LastEvaluatedKey".into(),
            limit_key: None,
            result_key: "Items".into(),
        })
        .unwrap();
        let fetches = RefCell::new(Vec::new());
        let scan = |req: &Value| {
            fetches.borrow_mut().push(req["ExclusiveStartKey"].clone());
            Ok::<_, String>(json!({"Items": [{"id": {"N": "3"}}]}))
        };
        let first_page = json!({
            "Items": [{"id": {"N": "1"}}, {"id": {"N": "2"}}],
            "LastEvaluatedKey": {"id": {"N": "2"}}
        });
        let paginator = JsonPaginator::new(spec, json!({"TableName": "t"}), first_page, scan).unwrap();

        let items: Vec<_> = paginator.all_items().iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2], JsonItem::Element(json!({"id": {"N": "3"}})));
        assert_eq!(*fetches.borrow(), vec![json!({"id": {"N": "2"}})]);
    }

    #[test]
    fn numeric_token_fetches_the_next_page() {
        let spec = PaginationSpec::resolve(&PaginatorDefinition {
            input_token: "Marker".into(),
            output_token: "NextMarker".into(),
            limit_key: None,
            result_key: "Keys".into(),
        })
        .unwrap();
        let list = |req: &Value| match req["Marker"].as_u64() {
            Some(42) => Ok(json!({"Keys": ["k3"]})),
            other => Err(format!("unexpected marker {:?}", other)),
        };
        let first_page = json!({"Keys": ["k1", "k2"], "NextMarker": 42});
        let paginator = JsonPaginator::new(spec, json!({}), first_page, list).unwrap();

        assert_eq!(paginator.pages().count(), 2);
        let keys: Vec<_> = paginator.all_items().iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(keys.last(), Some(&JsonItem::Element(json!("k3"))));
    }

    #[test]
    fn later_scalar_result_key_yields_no_items() {
        let spec = spec("ListTables");
        assert!(spec.items(json!({"TableNames": 7})).is_empty());
        assert!(spec.items(json!({"TableNames": null})).is_empty());
    }
}
