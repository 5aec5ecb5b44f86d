use crate::cell::classify;
use crate::collaborator::{DiagramRenderer, FileStore, LocalFileStore, LogControl, SparqlClient};
use crate::directive::{DirectiveOutcome, Dispatcher};
use crate::error::{EndpointError, QueryError};
use crate::outfile::expand_template;
use crate::output::{CellEntry, CellOutput};
use crate::render::render;
use crate::request::build_request;
use crate::session::Session;
use std::time::Instant;
use tracing::debug;

/// Executes notebook cells against a SPARQL endpoint.
///
/// A kernel owns exactly one [Session]. Cells are executed one after another; the directives of
/// a cell change the session for the cell itself and for all later cells.
///
/// ```
/// use async_trait::async_trait;
/// use sparql_kernel::{
///     DiagramError, DiagramRenderer, GraphDescription, HttpResponse, ImageFormat, Kernel,
///     OutboundRequest, SparqlClient, TransportError,
/// };
///
/// #[derive(Debug)]
/// struct AlwaysTrue;
///
/// #[async_trait]
/// impl SparqlClient for AlwaysTrue {
///     async fn execute(&self, _request: &OutboundRequest) -> Result<HttpResponse, TransportError> {
///         Ok(HttpResponse {
///             status: 200,
///             mime_type: Some("application/sparql-results+json".to_owned()),
///             body: br#"{"head": {}, "boolean": true}"#.to_vec(),
///         })
///     }
/// }
///
/// #[derive(Debug)]
/// struct NoDiagrams;
///
/// impl DiagramRenderer for NoDiagrams {
///     fn render(
///         &self,
///         _graph: &GraphDescription,
///         _format: ImageFormat,
///     ) -> Result<Vec<u8>, DiagramError> {
///         Err(DiagramError("diagrams are not available".to_owned()))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut kernel = Kernel::new(AlwaysTrue, NoDiagrams);
/// let output = kernel
///     .execute("%endpoint https://example.com/sparql\nASK { ?s ?p ?o }")
///     .await;
/// assert_eq!(output.to_string(), "Endpoint set to: https://example.com/sparql\nResult: true");
/// # }
/// ```
#[derive(Debug)]
pub struct Kernel {
    session: Session,
    client: Box<dyn SparqlClient>,
    diagrams: Box<dyn DiagramRenderer>,
    files: Box<dyn FileStore>,
    log_control: Option<Box<dyn LogControl>>,
}

impl Kernel {
    /// Creates a kernel with a fresh session. `%load` and `%outfile` use the local file system.
    pub fn new(
        client: impl SparqlClient + 'static,
        diagrams: impl DiagramRenderer + 'static,
    ) -> Self {
        Self {
            session: Session::new(),
            client: Box::new(client),
            diagrams: Box::new(diagrams),
            files: Box::new(LocalFileStore),
            log_control: None,
        }
    }

    #[must_use]
    pub fn with_file_store(mut self, files: impl FileStore + 'static) -> Self {
        self.files = Box::new(files);
        self
    }

    /// Lets `%log` change the host's log verbosity.
    #[must_use]
    pub fn with_log_control(mut self, log_control: impl LogControl + 'static) -> Self {
        self.log_control = Some(Box::new(log_control));
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Executes a cell and returns everything it produced.
    ///
    /// Directives are applied first, line by line. The query (if any) runs afterwards, unless a
    /// directive produced a listing.
    pub async fn execute(&mut self, cell: &str) -> CellOutput {
        let parsed = classify(cell);
        let mut output = CellOutput::default();

        let dispatcher = Dispatcher::new(self.files.as_ref(), self.log_control.as_deref());
        let mut listed = false;
        for outcome in dispatcher.dispatch(&mut self.session, &parsed.directives) {
            output.entries.push(match outcome {
                Ok(DirectiveOutcome::Applied(message)) => CellEntry::Message(message),
                Ok(DirectiveOutcome::Listing(listing)) => {
                    listed = true;
                    CellEntry::Listing(listing)
                }
                Err(error) => CellEntry::Error(error.into()),
            });
        }

        if parsed.has_query() && !listed {
            self.run_query(&parsed.query, &mut output).await;
        }
        output
    }

    async fn run_query(&mut self, body: &str, output: &mut CellOutput) {
        if let Err(error) = self.try_run_query(body, output).await {
            output.entries.push(CellEntry::Error(error.into()));
        }
    }

    async fn try_run_query(
        &mut self,
        body: &str,
        output: &mut CellOutput,
    ) -> Result<(), QueryError> {
        let request = build_request(&self.session, body)?;

        let start = Instant::now();
        let response = self
            .client
            .execute(&request)
            .await
            .map_err(EndpointError::from)?;
        self.session.cell_counter += 1;
        debug!(
            "Response {} of type {} received in {:?}",
            response.status,
            response.mime_type.as_deref().unwrap_or("unknown"),
            start.elapsed()
        );

        if !response.is_success() {
            return Err(EndpointError::from_status(
                response.status,
                response.mime_type.as_deref(),
                &response.body,
            )
            .into());
        }

        if let Some(template) = self.session.outfile_template() {
            let path = expand_template(template, self.session.cell_counter());
            debug!("Writing raw response to {}", path.display());
            if let Err(source) = self.files.write(&path, &response.body) {
                output
                    .entries
                    .push(CellEntry::Error(QueryError::Outfile { path, source }.into()));
            }
        }

        let result = render(
            &response.body,
            response.mime_type.as_deref(),
            &self.session,
            self.diagrams.as_ref(),
        )?;
        output.entries.push(CellEntry::Result(result));
        Ok(())
    }
}
