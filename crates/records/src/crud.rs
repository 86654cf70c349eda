//! CRUD Binding
//!
//! Generic create/read/update/delete over the [`ApiBinding`] declared by a
//! record's schema. All network I/O goes through the injected [`Transport`].

use serde_json::{Map, Value as Json};
use tracing::{debug, info, warn};

use foreman_qa_common::{Request, Response, Transport};

use crate::error::{Error, Result};
use crate::record::{Entity, Record};
use crate::relation::Materializer;
use crate::schema::{ApiBinding, Schema};

/// Remote CRUD adapter for every record type with an API binding
pub struct ApiCrud<T: Transport> {
    transport: T,
}

impl<T: Transport> ApiCrud<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create `record` remotely. Its relations must already be live.
    ///
    /// Only the binding's create fields are sent. The returned record holds
    /// the local values overwritten by the server's response.
    pub fn create(&self, record: &Record) -> Result<Record> {
        let schema = record.schema();
        let binding = schema.require_binding()?;
        let path = binding.collection_path(record)?;
        let payload = record.payload(binding.create_fields)?;

        let fail = |status, message| Error::RemoteCreate {
            resource: schema.name().to_string(),
            status,
            message,
        };

        let response = self
            .transport
            .send(Request::post(&path, wrap(binding, payload)))
            .map_err(|e| fail(None, e.to_string()))?;
        if !response.is_success() {
            warn!("Create {} rejected: HTTP {}", schema.name(), response.status);
            return Err(fail(Some(response.status), response.error_message()));
        }

        let body = object(&response).ok_or_else(|| {
            fail(Some(response.status), "response is not a JSON object".to_string())
        })?;
        if body.get("id").and_then(Json::as_i64).is_none() {
            return Err(fail(Some(response.status), "response carries no id".to_string()));
        }

        let mut created = record.clone();
        created.merge_remote(body);
        info!("Created {} id={}", schema.name(), created.id().unwrap_or_default());
        Ok(created)
    }

    /// Create `record` together with every live dependency it still lacks
    pub fn materialize(&self, record: Record) -> Result<Record> {
        let mut materializer = Materializer::new(self);
        let live = materializer.persist(record)?;
        debug!(
            "Materialized {} with {} dependency record(s)",
            live.schema().name(),
            materializer.created()
        );
        Ok(live)
    }

    /// Read a record by id
    pub fn read(&self, schema: &'static Schema, id: i64) -> Result<Record> {
        let binding = schema.require_binding()?;
        if binding.is_templated() {
            return Err(Error::Configuration {
                record: schema.name().to_string(),
                reason: format!("'{}' needs a parent; use refresh", binding.path),
            });
        }
        let path = binding.member_path(&Record::stub(schema, id), id)?;
        let body = self.read_path(schema, &path, id)?;
        Ok(Record::from_remote(schema, &body))
    }

    pub fn read_entity<E: Entity>(&self, id: i64) -> Result<Record> {
        self.read(E::schema(), id)
    }

    /// Re-read a live record, replacing local values with remote ones
    pub fn refresh(&self, record: &Record) -> Result<Record> {
        let schema = record.schema();
        let id = live_id(record)?;
        let path = schema.require_binding()?.member_path(record, id)?;
        let body = self.read_path(schema, &path, id)?;

        let mut refreshed = record.clone();
        refreshed.merge_remote(&body);
        Ok(refreshed)
    }

    fn read_path(&self, schema: &'static Schema, path: &str, id: i64) -> Result<Map<String, Json>> {
        let fail = |status, message| Error::RemoteRead {
            resource: schema.name().to_string(),
            status,
            message,
        };

        let response = self
            .transport
            .send(Request::get(path))
            .map_err(|e| fail(None, e.to_string()))?;
        if response.status == 404 {
            return Err(Error::NotFound {
                resource: schema.name().to_string(),
                query: format!("id={}", id),
            });
        }
        if !response.is_success() {
            return Err(fail(Some(response.status), response.error_message()));
        }

        debug!("Read {} id={}", schema.name(), id);
        match response.body {
            Json::Object(body) => Ok(body),
            _ => Err(Error::MalformedResponse {
                resource: schema.name().to_string(),
                reason: "response is not a JSON object".to_string(),
            }),
        }
    }

    /// All records matching a search query
    pub fn search(&self, schema: &'static Schema, query: &str) -> Result<Vec<Record>> {
        let binding = schema.require_binding()?;
        if binding.is_templated() {
            return Err(Error::Configuration {
                record: schema.name().to_string(),
                reason: format!("'{}' needs a parent to search", binding.path),
            });
        }
        let path = binding.path.trim_end_matches('/');

        let response = self
            .transport
            .send(Request::get(path).with_query("search", query))
            .map_err(|e| Error::RemoteRead {
                resource: schema.name().to_string(),
                status: None,
                message: e.to_string(),
            })?;
        if !response.is_success() {
            return Err(Error::RemoteRead {
                resource: schema.name().to_string(),
                status: Some(response.status),
                message: response.error_message(),
            });
        }

        let results = response
            .body
            .get("results")
            .and_then(Json::as_array)
            .ok_or_else(|| Error::MalformedResponse {
                resource: schema.name().to_string(),
                reason: "search response has no results list".to_string(),
            })?;

        results
            .iter()
            .map(|item| {
                item.as_object()
                    .map(|body| Record::from_remote(schema, body))
                    .ok_or_else(|| Error::MalformedResponse {
                        resource: schema.name().to_string(),
                        reason: "search result is not a JSON object".to_string(),
                    })
            })
            .collect()
    }

    /// The single record matching `query`
    pub fn find(&self, schema: &'static Schema, query: &str) -> Result<Record> {
        let mut matches = self.search(schema, query)?;
        match matches.len() {
            0 => Err(Error::NotFound {
                resource: schema.name().to_string(),
                query: query.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(Error::AmbiguousResult {
                resource: schema.name().to_string(),
                query: query.to_string(),
                count,
            }),
        }
    }

    /// Send `fields` of `record` as an update.
    ///
    /// Fields not named are left untouched on the server.
    pub fn update(&self, record: &Record, fields: &[&str]) -> Result<Record> {
        let schema = record.schema();
        let binding = schema.require_binding()?;
        let id = live_id(record)?;
        let path = binding.member_path(record, id)?;
        let payload = record.payload(fields)?;

        let fail = |status, message| Error::RemoteUpdate {
            resource: schema.name().to_string(),
            status,
            message,
        };

        let response = self
            .transport
            .send(Request::put(&path, wrap(binding, payload)))
            .map_err(|e| fail(None, e.to_string()))?;
        if !response.is_success() {
            warn!("Update {} id={} rejected: HTTP {}", schema.name(), id, response.status);
            return Err(fail(Some(response.status), response.error_message()));
        }

        let mut updated = record.clone();
        if let Some(body) = object(&response) {
            updated.merge_remote(body);
        }
        info!("Updated {} id={} ({})", schema.name(), id, fields.join(", "));
        Ok(updated)
    }

    /// Delete `record` remotely. Deleting a record twice is an error.
    pub fn delete(&self, record: &Record) -> Result<()> {
        let schema = record.schema();
        let binding = schema.require_binding()?;
        let id = live_id(record)?;
        let path = binding.member_path(record, id)?;

        let fail = |status, message| Error::RemoteDelete {
            resource: schema.name().to_string(),
            status,
            message,
        };

        let response = self
            .transport
            .send(Request::delete(&path))
            .map_err(|e| fail(None, e.to_string()))?;
        if !response.is_success() {
            warn!("Delete {} id={} rejected: HTTP {}", schema.name(), id, response.status);
            return Err(fail(Some(response.status), response.error_message()));
        }

        info!("Deleted {} id={}", schema.name(), id);
        Ok(())
    }
}

fn wrap(binding: &ApiBinding, payload: Map<String, Json>) -> Json {
    let mut body = Map::new();
    body.insert(binding.json_key.to_string(), Json::Object(payload));
    Json::Object(body)
}

fn object(response: &Response) -> Option<&Map<String, Json>> {
    response.body.as_object()
}

pub(crate) fn live_id(record: &Record) -> Result<i64> {
    record.id().ok_or_else(|| Error::NotLive {
        record: record.schema().name().to_string(),
    })
}
