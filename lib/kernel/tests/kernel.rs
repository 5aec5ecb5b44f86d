#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use assert_fs::prelude::*;
use assert_fs::TempDir;
use async_trait::async_trait;
use sparql_kernel::error::{DirectiveError, KernelError, QueryError};
use sparql_kernel::render::Payload;
use sparql_kernel::session::LogLevel;
use sparql_kernel::{
    CellEntry, DiagramError, DiagramRenderer, GraphDescription, HttpResponse, ImageFormat, Kernel,
    LogControl, LogControlError, OutboundRequest, SparqlClient, TransportError,
};
use std::collections::VecDeque;
use std::error::Error;
use std::fs;
use std::sync::{Arc, Mutex};

const ENDPOINT: &str = "%endpoint http://example.com/sparql";

/// Answers with canned responses and records every request.
#[derive(Debug, Clone, Default)]
struct FakeClient {
    requests: Arc<Mutex<Vec<OutboundRequest>>>,
    responses: Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>,
}

impl FakeClient {
    fn respond(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn respond_json(&self, body: &str) {
        self.respond(Ok(HttpResponse {
            status: 200,
            mime_type: Some("application/sparql-results+json".to_owned()),
            body: body.as_bytes().to_vec(),
        }));
    }

    fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SparqlClient for FakeClient {
    async fn execute(&self, request: &OutboundRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Failed("no canned response".to_owned())))
    }
}

#[derive(Debug, Clone, Default)]
struct FakeDiagrams {
    calls: Arc<Mutex<Vec<ImageFormat>>>,
}

impl DiagramRenderer for FakeDiagrams {
    fn render(
        &self,
        _graph: &GraphDescription,
        format: ImageFormat,
    ) -> Result<Vec<u8>, DiagramError> {
        self.calls.lock().unwrap().push(format);
        Ok(b"<svg/>".to_vec())
    }
}

#[derive(Debug, Clone, Default)]
struct FakeLogControl {
    levels: Arc<Mutex<Vec<LogLevel>>>,
}

impl LogControl for FakeLogControl {
    fn set_level(&self, level: LogLevel) -> Result<(), LogControlError> {
        self.levels.lock().unwrap().push(level);
        Ok(())
    }
}

fn kernel() -> (Kernel, FakeClient) {
    let client = FakeClient::default();
    (Kernel::new(client.clone(), FakeDiagrams::default()), client)
}

fn solutions(rows: usize) -> String {
    let bindings = (0..rows)
        .map(|i| format!(r#"{{"s": {{"type": "uri", "value": "http://example.com/{i}"}}}}"#))
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"head": {{"vars": ["s"]}}, "results": {{"bindings": [{bindings}]}}}}"#)
}

fn table_rows(entry: Option<&CellEntry>) -> usize {
    match entry {
        Some(CellEntry::Result(result)) => match &result.payload {
            Payload::Table(table) => table.rows.len(),
            other => panic!("expected a table, got {other:?}"),
        },
        other => panic!("expected a result, got {other:?}"),
    }
}

#[tokio::test]
async fn test_comment_cells_do_nothing() -> Result<(), Box<dyn Error>> {
    let (mut kernel, client) = kernel();
    let output = kernel.execute("# just a comment\n\n   # another\n").await;
    assert!(output.is_empty());
    assert!(!output.is_error());
    assert!(client.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_query_without_endpoint() -> Result<(), Box<dyn Error>> {
    let (mut kernel, client) = kernel();
    let output = kernel.execute("SELECT * WHERE { ?s ?p ?o }").await;
    assert!(output.is_error());
    assert!(matches!(
        output.errors().next(),
        Some(KernelError::Query(QueryError::Configuration))
    ));
    assert!(client.requests().is_empty());
    assert_eq!(kernel.session().cell_counter(), 0);
    Ok(())
}

#[tokio::test]
async fn test_show_limit() -> Result<(), Box<dyn Error>> {
    let (mut kernel, client) = kernel();
    let body = solutions(10);

    client.respond_json(&body);
    let output = kernel
        .execute(&format!("{ENDPOINT}\n%show 3\nSELECT ?s WHERE {{ ?s ?p ?o }}"))
        .await;
    assert!(!output.is_error(), "{output}");
    assert_eq!(table_rows(output.entries.last()), 3);
    assert!(output.result().is_some_and(|result| result.truncated));
    assert!(output.to_string().contains("Total: 10, Shown: 3"));

    client.respond_json(&body);
    let output = kernel
        .execute("%show all\nSELECT ?s WHERE { ?s ?p ?o }")
        .await;
    assert_eq!(table_rows(output.entries.last()), 10);
    assert!(output.result().is_some_and(|result| !result.truncated));
    Ok(())
}

#[tokio::test]
async fn test_directives_persist_across_cells() -> Result<(), Box<dyn Error>> {
    let (mut kernel, client) = kernel();
    kernel.execute(ENDPOINT).await;
    kernel.execute("%format xml\n%qparam timeout 10").await;

    client.respond(Ok(HttpResponse {
        status: 200,
        mime_type: Some("application/sparql-results+xml".to_owned()),
        body: br#"<?xml version="1.0"?><sparql xmlns="http://www.w3.org/2005/sparql-results#"><head/><boolean>true</boolean></sparql>"#.to_vec(),
    }));
    let output = kernel.execute("ASK { ?s ?p ?o }").await;
    assert!(!output.is_error(), "{output}");
    assert_eq!(output.result().map(|r| &r.payload), Some(&Payload::Boolean(true)));

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].endpoint, "http://example.com/sparql");
    assert_eq!(requests[0].parameters.get("format").map(String::as_str), Some("xml"));
    assert_eq!(requests[0].parameters.get("timeout").map(String::as_str), Some("10"));
    Ok(())
}

#[tokio::test]
async fn test_percent_lines_in_query_are_sent() -> Result<(), Box<dyn Error>> {
    let (mut kernel, client) = kernel();
    client.respond_json(&solutions(1));
    kernel
        .execute(&format!("{ENDPOINT}\nSELECT ?s\n%show 3\nWHERE {{ ?s ?p ?o }}"))
        .await;
    assert_eq!(kernel.session().show_limit().get(), Some(20));
    assert_eq!(client.requests()[0].query, "SELECT ?s\n%show 3\nWHERE { ?s ?p ?o }");
    Ok(())
}

#[tokio::test]
async fn test_directive_errors_are_isolated() -> Result<(), Box<dyn Error>> {
    let (mut kernel, _) = kernel();
    let output = kernel
        .execute("%nope\n%display chart\n%graph http://example.com/g")
        .await;
    assert_eq!(output.entries.len(), 3);
    assert!(matches!(
        &output.entries[0],
        CellEntry::Error(KernelError::Directive(DirectiveError::UnknownDirective { .. }))
    ));
    assert!(matches!(
        &output.entries[1],
        CellEntry::Error(KernelError::Directive(DirectiveError::InvalidArgument { .. }))
    ));
    assert!(matches!(&output.entries[2], CellEntry::Message(_)));
    assert_eq!(kernel.session().default_graph(), Some("http://example.com/g"));
    Ok(())
}

#[tokio::test]
async fn test_listing_skips_query() -> Result<(), Box<dyn Error>> {
    let (mut kernel, client) = kernel();
    let output = kernel
        .execute(&format!("{ENDPOINT}\n%lsmagics\nSELECT * WHERE {{ ?s ?p ?o }}"))
        .await;
    assert!(matches!(output.entries.last(), Some(CellEntry::Listing(_))));
    assert!(client.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_auth_none_removes_credentials() -> Result<(), Box<dyn Error>> {
    let (mut kernel, client) = kernel();
    client.respond_json(&solutions(0));
    let output = kernel
        .execute(&format!("{ENDPOINT}\n%auth basic u p\n%auth none\nSELECT * {{}}"))
        .await;
    assert!(!output.to_string().contains(" p\n"));
    assert!(client.requests()[0].credentials.is_none());
    Ok(())
}

#[tokio::test]
async fn test_outfile_numbering() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let template = dir.child("q-%d.json");
    let (mut kernel, client) = kernel();
    kernel
        .execute(&format!("{ENDPOINT}\n%outfile {}", template.path().display()))
        .await;

    for rows in 1..=3 {
        client.respond_json(&solutions(rows));
        let output = kernel.execute("SELECT ?s WHERE { ?s ?p ?o }").await;
        assert!(!output.is_error(), "{output}");
    }

    for rows in 1..=3 {
        dir.child(format!("q-{rows}.json"))
            .assert(solutions(rows).as_str());
    }
    assert_eq!(kernel.session().cell_counter(), 3);
    Ok(())
}

#[tokio::test]
async fn test_load_directives_file() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let nested = dir.child("nested.magics");
    nested.write_str("%show 7\n")?;
    let init = dir.child("init.magics");
    init.write_str(&format!(
        "# startup\n{ENDPOINT}\nSELECT oops\n%load {}\n",
        nested.path().display()
    ))?;

    let (mut kernel, _) = kernel();
    let output = kernel
        .execute(&format!("%load {}", init.path().display()))
        .await;
    assert_eq!(
        kernel.session().endpoint(),
        Some("http://example.com/sparql")
    );
    assert_eq!(kernel.session().show_limit().get(), Some(7));
    assert_eq!(output.errors().count(), 1);
    assert!(matches!(
        output.errors().next(),
        Some(KernelError::Directive(DirectiveError::InvalidArgument { line: 3, .. }))
    ));
    Ok(())
}

#[tokio::test]
async fn test_load_recursion_is_limited() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let file = dir.child("loop.magics");
    file.write_str(&format!("%load {}\n", file.path().display()))?;

    let (mut kernel, _) = kernel();
    let output = kernel
        .execute(&format!("%load {}", file.path().display()))
        .await;
    assert!(matches!(
        output.errors().next(),
        Some(KernelError::Directive(DirectiveError::RecursionLimit(10)))
    ));
    Ok(())
}

#[tokio::test]
async fn test_load_missing_file() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let (mut kernel, _) = kernel();
    let output = kernel
        .execute(&format!("%load {}", dir.child("missing").path().display()))
        .await;
    assert!(matches!(
        output.errors().next(),
        Some(KernelError::Directive(DirectiveError::LoadFailed { .. }))
    ));
    Ok(())
}

#[tokio::test]
async fn test_http_errors() -> Result<(), Box<dyn Error>> {
    let (mut kernel, client) = kernel();
    kernel.execute(ENDPOINT).await;

    client.respond(Ok(HttpResponse {
        status: 400,
        mime_type: Some("text/plain".to_owned()),
        body: b"Parse error".to_vec(),
    }));
    let output = kernel.execute("SELECT").await;
    assert_eq!(output.to_string(), "Error: HTTP error 400: Parse error");
    assert_eq!(kernel.session().cell_counter(), 1);

    client.respond(Err(TransportError::Timeout));
    let output = kernel.execute("SELECT * {}").await;
    assert!(output.is_error());
    assert_eq!(kernel.session().cell_counter(), 1);
    Ok(())
}

#[tokio::test]
async fn test_outfile_is_not_written_for_failed_queries() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let (mut kernel, client) = kernel();
    kernel
        .execute(&format!(
            "{ENDPOINT}\n%outfile {}",
            dir.child("out-%d.txt").path().display()
        ))
        .await;
    client.respond(Ok(HttpResponse {
        status: 500,
        mime_type: None,
        body: b"boom".to_vec(),
    }));
    kernel.execute("SELECT * {}").await;
    assert!(fs::read_dir(dir.path())?.next().is_none());
    Ok(())
}

#[tokio::test]
async fn test_diagram_display() -> Result<(), Box<dyn Error>> {
    let client = FakeClient::default();
    let diagrams = FakeDiagrams::default();
    let mut kernel = Kernel::new(client.clone(), diagrams.clone());
    client.respond(Ok(HttpResponse {
        status: 200,
        mime_type: Some("text/turtle".to_owned()),
        body: b"<http://example.com/a> <http://example.com/p> <http://example.com/b> .".to_vec(),
    }));
    let output = kernel
        .execute(&format!(
            "{ENDPOINT}\n%display diagram png\nDESCRIBE <http://example.com/a>"
        ))
        .await;
    assert!(!output.is_error(), "{output}");
    assert_eq!(*diagrams.calls.lock().unwrap(), [ImageFormat::Png]);
    assert_eq!(
        client.requests()[0].headers.get("accept").map(|a| a.starts_with("text/rdf+n3")),
        Some(true)
    );
    Ok(())
}

#[tokio::test]
async fn test_log_directive_uses_log_control() -> Result<(), Box<dyn Error>> {
    let log_control = FakeLogControl::default();
    let mut kernel = Kernel::new(FakeClient::default(), FakeDiagrams::default())
        .with_log_control(log_control.clone());
    let output = kernel.execute("%log warning").await;
    assert_eq!(output.to_string(), "Logging set to WARNING");
    assert_eq!(*log_control.levels.lock().unwrap(), [LogLevel::Warning]);
    assert_eq!(kernel.session().log_level(), Some(LogLevel::Warning));
    Ok(())
}
