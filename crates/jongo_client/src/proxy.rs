//! Proxy: maps entity operations onto Jongo REST calls.

use crate::config::{Endpoint, DEFAULT_PAGE_SIZE};
use crate::entity::{Entity, Record, Schema};
use crate::error::{ClientError, ClientResult};
use crate::query::{args_query, encode_component, DynamicFinder, Page, Sort};
use crate::transport::{Method, Request, Response, Transport};
use crate::value::Value;
use crate::PRIMARY_KEY_HEADER;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Page and sort state applied to `read_all`.
#[derive(Debug, Clone, Default)]
struct QueryState {
    page: Page,
    sort: Option<Sort>,
}

/// Entities returned by a listing call.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Decoded entities, in server order.
    pub entities: Vec<Entity>,
    /// Row count reported in the `Content-Count` header.
    pub count: Option<u64>,
}

/// Binds one remote table to an entity schema.
///
/// The proxy owns the current [`Page`] and optional [`Sort`]. They sit
/// behind a lock so a proxy can be shared through an `Arc` with the store
/// and with bound entities; only the store is expected to change them.
pub struct Proxy {
    endpoint: Endpoint,
    schema: Schema,
    transport: Arc<dyn Transport>,
    query: RwLock<QueryState>,
}

impl Proxy {
    /// Creates a proxy with the default page size.
    pub fn new(endpoint: Endpoint, schema: Schema, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            schema,
            transport,
            query: RwLock::new(QueryState {
                page: Page::new(DEFAULT_PAGE_SIZE),
                sort: None,
            }),
        }
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(self, size: u32) -> Self {
        self.query.write().page = Page::new(size);
        self
    }

    /// Remote table address.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Schema of the entities this proxy produces.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Current page.
    pub fn page(&self) -> Page {
        self.query.read().page
    }

    /// Replaces the current page.
    pub fn set_page(&self, page: Page) {
        self.query.write().page = page;
    }

    /// Current sort, if any.
    pub fn sort(&self) -> Option<Sort> {
        self.query.read().sort.clone()
    }

    /// Installs or clears the sort.
    pub fn set_sort(&self, sort: Option<Sort>) {
        self.query.write().sort = sort;
    }

    /// `{resource}/{id}`.
    pub fn item_path(&self, identity: &Value) -> String {
        format!(
            "{}/{}",
            self.endpoint.resource_path(),
            encode_component(&identity.to_string())
        )
    }

    /// Path used by `read_all`.
    ///
    /// A finder takes precedence over page and sort.
    pub fn list_path(&self, finder: Option<&DynamicFinder>) -> String {
        let resource = self.endpoint.resource_path();
        if let Some(finder) = finder {
            return format!("{}{}", resource, finder.path());
        }
        let query = self.query.read();
        match &query.sort {
            Some(sort) => format!(
                "{}?{}&{}",
                resource,
                query.page.query_string(),
                sort.query_string()
            ),
            None => format!("{}?{}", resource, query.page.query_string()),
        }
    }

    /// Path of a named query with its positional arguments.
    pub fn query_path(&self, name: &str, args: &[Value]) -> String {
        format!(
            "{}{}",
            self.endpoint.query_path(&encode_component(name)),
            args_query(args)
        )
    }

    fn request(&self, path: String, method: Method) -> Request {
        Request::new(self.endpoint.target.clone(), path)
            .method(method)
            .header(PRIMARY_KEY_HEADER, self.schema.identity_field())
    }

    fn perform(&self, request: Request) -> ClientResult<Response> {
        debug!(method = %request.method, path = %request.path, "jongo request");
        let response = self.transport.perform(&request)?;
        debug!(status = response.status, count = response.count, "jongo response");
        Ok(response)
    }

    fn decode_all(&self, response: Response) -> ClientResult<Listing> {
        let count = response.count;
        let entities = response
            .into_records()?
            .iter()
            .map(|record| self.schema.from_record(record))
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(Listing { entities, count })
    }

    /// POSTs the entity's wire projection to the table.
    ///
    /// Returns the stored row when the server echoes it back.
    pub fn create(&self, entity: &Entity) -> ClientResult<Option<Record>> {
        let request = self
            .request(self.endpoint.resource_path(), Method::Post)
            .json_body(&entity.to_wire())?;
        let records = self.perform(request)?.into_records()?;
        Ok(records.into_iter().next())
    }

    /// GETs one row by identity.
    pub fn read(&self, identity: &Value) -> ClientResult<Entity> {
        let request = self.request(self.item_path(identity), Method::Get);
        let records = self.perform(request)?.into_records()?;
        let first = records.first().ok_or_else(|| {
            ClientError::Codec(format!("no record returned for identity {}", identity))
        })?;
        self.schema.from_record(first)
    }

    /// GETs the current page (or the finder's result set).
    pub fn read_all(&self, finder: Option<&DynamicFinder>) -> ClientResult<Listing> {
        let request = self.request(self.list_path(finder), Method::Get);
        let response = self.perform(request)?;
        self.decode_all(response)
    }

    /// PUTs the entity's wire projection to its row.
    pub fn update(&self, entity: &Entity) -> ClientResult<()> {
        let identity = entity.identity().ok_or(ClientError::MissingIdentity)?;
        let request = self
            .request(self.item_path(identity), Method::Put)
            .json_body(&entity.to_wire())?;
        self.perform(request)?.ensure_success()
    }

    /// DELETEs the entity's row.
    pub fn delete(&self, entity: &Entity) -> ClientResult<()> {
        let identity = entity.identity().ok_or(ClientError::MissingIdentity)?;
        let request = self.request(self.item_path(identity), Method::Delete);
        self.perform(request)?.ensure_success()
    }

    /// Runs a named query on the database.
    ///
    /// Failures carry the HTTP status like every other operation.
    pub fn query(&self, name: &str, args: &[Value]) -> ClientResult<Vec<Entity>> {
        let request = self.request(self.query_path(name, args), Method::Get);
        let response = self.perform(request)?;
        Ok(self.decode_all(response)?.entities)
    }

    /// GETs every row whose `column` equals `value`.
    pub fn find(&self, column: &str, value: &Value) -> ClientResult<Vec<Entity>> {
        let path = format!(
            "{}/{}/{}",
            self.endpoint.resource_path(),
            encode_component(column),
            encode_component(&value.to_string())
        );
        let response = self.perform(self.request(path, Method::Get))?;
        Ok(self.decode_all(response)?.entities)
    }

    /// HEADs the table and returns its row count.
    pub fn count(&self) -> ClientResult<u64> {
        let request = self.request(self.endpoint.resource_path(), Method::Head);
        let response = self.perform(request)?;
        let count = response.count;
        response.ensure_success()?;
        count.ok_or_else(|| ClientError::Codec("missing Content-Count header".into()))
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = self.query.read();
        f.debug_struct("Proxy")
            .field("endpoint", &self.endpoint)
            .field("schema", &self.schema.name())
            .field("page", &query.page)
            .field("sort", &query.sort)
            .finish()
    }
}
