//! Resource groups: a named slice of the API with its own connection pool
//! and in-flight operation registry.

use std::sync::Arc;

use slackline_core::{ApiCall, ClientConfig, Envelope, FileSource, Params, Result};

use crate::executor::Executor;
use crate::pool::ConnectionPool;
use crate::registry::{InFlight, OperationRegistry};

/// A named group of API methods, e.g. `chat` or `files`.
///
/// Each group owns a connection pool shared by its concurrent calls and a
/// registry tracking them.
pub struct ResourceGroup {
    name: String,
    executor: Executor,
    pool: ConnectionPool,
    registry: OperationRegistry,
}

impl ResourceGroup {
    /// Create a group with a fresh pool and an empty registry.
    pub fn new(name: impl Into<String>, config: Arc<ClientConfig>) -> Result<Self> {
        let name = name.into();
        let pool = ConnectionPool::open(name.clone(), &config)?;
        let registry = OperationRegistry::new(name.clone(), config.runtime().clone());
        Ok(Self {
            name,
            executor: Executor::new(config),
            pool,
            registry,
        })
    }

    /// The group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registry tracking this group's calls.
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// The connection pool shared by this group's calls.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// The executor calls of this group go through.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Dispatch a call.
    ///
    /// The call is registered before this returns. On a closed group the
    /// handle resolves to [`slackline_core::Error::Closed`] and nothing is
    /// registered.
    pub fn call(&self, call: ApiCall) -> InFlight<Envelope> {
        let client = match self.pool.acquire() {
            Ok(client) => client,
            Err(err) => return InFlight::rejected(err),
        };
        let executor = self.executor.clone();
        self.registry
            .dispatch(async move { executor.execute(&client, call).await })
    }

    /// Dispatch a GET with query parameters.
    pub fn get(&self, path: &str, params: Params) -> InFlight<Envelope> {
        self.call(ApiCall::get(path).params(params))
    }

    /// Dispatch a POST with a form-encoded body.
    pub fn post(&self, path: &str, data: Params) -> InFlight<Envelope> {
        self.call(ApiCall::post(path).data(data))
    }

    /// Dispatch a multipart POST.
    pub fn upload(
        &self,
        path: &str,
        files: Vec<(String, FileSource)>,
        data: Params,
    ) -> InFlight<Envelope> {
        let mut call = ApiCall::post(path).data(data);
        call.files = files;
        self.call(call)
    }

    /// Number of calls in flight.
    pub fn outstanding(&self) -> usize {
        self.registry.len()
    }

    /// Check if this group has been closed.
    pub fn is_closed(&self) -> bool {
        self.pool.is_released()
    }

    /// Wait for the calls in flight, then release the pool.
    ///
    /// Safe to call more than once. Failures of drained calls are reported
    /// as one [`slackline_core::Error::Drain`]; the pool is released
    /// regardless.
    pub async fn close(&self) -> Result<()> {
        let drained = self.registry.drain().await;
        self.pool.release();
        drained
    }
}

impl std::fmt::Debug for ResourceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGroup")
            .field("name", &self.name)
            .field("outstanding", &self.registry.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
