//! Query facade: run a query against a frame source and materialize it.

use tracing::{debug, field, info_span};

use crate::aggregate::{aggregate, QueryResult};
use crate::decode::{DecodeConfig, FrameProcessor};
use crate::error::Result;
use crate::io::{ClientRequestProperties, FrameSource, QueryRequest};

/// Runs queries against one database of a [`FrameSource`].
pub struct QueryClient<S: FrameSource> {
    source: S,
    database: String,
    config: DecodeConfig,
}

impl<S: FrameSource> QueryClient<S> {
    pub fn new(source: S, database: impl Into<String>) -> Self {
        Self {
            source,
            database: database.into(),
            config: DecodeConfig::default(),
        }
    }

    /// Builder: decode configuration used for every query.
    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Execute a query under a fresh client request id.
    pub fn execute_query(&self, query: &str) -> Result<QueryResult> {
        self.execute_query_with(query, ClientRequestProperties::new())
    }

    /// Execute a query with caller-supplied request properties.
    pub fn execute_query_with(
        &self,
        query: &str,
        properties: ClientRequestProperties,
    ) -> Result<QueryResult> {
        let request = self.request(query, properties);
        let span = info_span!(
            "query.execute",
            database = %request.database,
            client_request_id = %request.properties.client_request_id,
            rows = field::Empty,
        );
        let _enter = span.enter();

        let result = aggregate(self.open(&request)?)?;
        span.record("rows", result.records.len());
        debug!(stats = %result.outcome.stats, "Query materialized");
        Ok(result)
    }

    /// Start a query and return its snapshots as they arrive.
    pub fn stream_query(&self, query: &str) -> Result<FrameProcessor<S::Reader>> {
        self.stream_query_with(query, ClientRequestProperties::new())
    }

    pub fn stream_query_with(
        &self,
        query: &str,
        properties: ClientRequestProperties,
    ) -> Result<FrameProcessor<S::Reader>> {
        let request = self.request(query, properties);
        let span = info_span!(
            "query.stream",
            database = %request.database,
            client_request_id = %request.properties.client_request_id,
        );
        let _enter = span.enter();
        self.open(&request)
    }

    fn request(&self, query: &str, properties: ClientRequestProperties) -> QueryRequest {
        QueryRequest::new(self.database.clone(), query).with_properties(properties)
    }

    fn open(&self, request: &QueryRequest) -> Result<FrameProcessor<S::Reader>> {
        debug!(query = %request.query, "Submitting query");
        let reader = self.source.execute(request)?;
        Ok(FrameProcessor::new(reader, self.config.clone()))
    }
}
