//! Generated-client style pagination: `ListTables` with a `table_names()` alias over the items.

use sdk_core::pagination::Pages;
use sdk_core::prelude::*;
use std::cell::Cell;

#[derive(Debug, Clone, Default)]
struct ListTablesRequest {
    exclusive_start_table_name: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Clone)]
struct ListTablesResponse {
    table_names: Vec<String>,
    last_evaluated_table_name: Option<String>,
}

/// In-memory stand-in for the service: 7 tables, served `limit` at a time.
struct FakeDynamo {
    tables: Vec<String>,
    calls: Cell<usize>,
}

impl FakeDynamo {
    fn list_tables(&self, req: &ListTablesRequest) -> Result<ListTablesResponse, SdkError> {
        self.calls.set(self.calls.get() + 1);
        let start = match &req.exclusive_start_table_name {
            Some(name) => self.tables.iter().position(|t| t == name).map_or(self.tables.len(), |i| i + 1),
            None => 0,
        };
        let end = (start + req.limit.unwrap_or(100)).min(self.tables.len());
        let table_names = self.tables[start..end].to_vec();
        let last_evaluated_table_name =
            if end < self.tables.len() { table_names.last().cloned() } else { None };
        Ok(ListTablesResponse { table_names, last_evaluated_table_name })
    }
}

type Fetcher<'a> = Box<dyn PageFetcher<ListTablesResponse, Error = SdkError> + 'a>;
type Extract = fn(ListTablesResponse) -> Vec<String>;

struct ListTablesPaginator<'a> {
    inner: Paginator<ListTablesResponse, Fetcher<'a>, Extract>,
}

impl<'a> ListTablesPaginator<'a> {
    fn new(service: &'a FakeDynamo, request: ListTablesRequest) -> Result<Self, SdkError> {
        let first_page = service.list_tables(&request)?;
        let fetcher: Fetcher<'a> = Box::new(TokenFetcher::new(
            request,
            move |req: &ListTablesRequest| service.list_tables(req),
            |page: &ListTablesResponse| page.last_evaluated_table_name.as_deref(),
            |first: &ListTablesRequest, token: &str| ListTablesRequest {
                exclusive_start_table_name: Some(token.to_string()),
                ..first.clone()
            },
        ));
        let extract: Extract = |page| page.table_names;
        Ok(Self { inner: Paginator::new(PageSequence::new(first_page, fetcher), extract) })
    }

    fn first_page(&self) -> &ListTablesResponse {
        self.inner.first_page()
    }

    fn pages(&self) -> Pages<'_, ListTablesResponse, Fetcher<'a>> {
        self.inner.pages()
    }

    fn table_names(&self) -> ItemSequence<'_, ListTablesResponse, Fetcher<'a>, &Extract> {
        self.inner.all_items()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = FakeDynamo {
        tables: (1..=7).map(|i| format!("table-{}", i)).collect(),
        calls: Cell::new(0),
    };
    let request = ListTablesRequest { limit: Some(3), ..Default::default() };
    let paginator = ListTablesPaginator::new(&service, request)?;

    println!("first page: {:?}", paginator.first_page().table_names);

    for (i, page) in paginator.pages().enumerate() {
        println!("page {}: {:?}", i + 1, page?.table_names);
    }
    println!("service calls so far: {}", service.calls.get());

    let names = paginator.table_names();
    let mut cursor = names.iter();
    while cursor.has_next() {
        match cursor.try_next() {
            Ok(name) => println!("  {} (calls: {})", name, service.calls.get()),
            Err(err) if err.is_exhausted() => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
