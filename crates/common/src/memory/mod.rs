//! In-memory model of the remote management API
//!
//! Answers the same paths, wrappers and validation errors the suites rely on,
//! so fixtures and scenarios can run without a live server. State is shared
//! by every [`MemorySession`] created from one [`MemoryServer`].

pub mod query;
mod reports;
pub mod store;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::transport::{Method, Request, Response, Transport};
use reports::ReportJob;
use store::{as_id, referenced_ids, Collection, CollectionRules};

/// Built-in administrator account
pub const ADMIN_LOGIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "changeme";

fn default_collections() -> Vec<(&'static str, CollectionRules)> {
    vec![
        ("architectures", CollectionRules::named("architecture")),
        ("ptables", CollectionRules::named("ptable")),
        (
            "operatingsystems",
            CollectionRules {
                references: &[
                    ("architecture_ids", "architectures"),
                    ("ptable_ids", "ptables"),
                    ("medium_ids", "media"),
                ],
                ..CollectionRules::named("operatingsystem")
            },
        ),
        (
            "media",
            CollectionRules {
                references: &[("operatingsystem_ids", "operatingsystems")],
                ..CollectionRules::named("medium")
            },
        ),
        (
            "hosts",
            CollectionRules {
                references: &[
                    ("architecture_id", "architectures"),
                    ("operatingsystem_id", "operatingsystems"),
                    ("medium_id", "media"),
                    ("ptable_id", "ptables"),
                ],
                ..CollectionRules::named("host")
            },
        ),
        (
            "report_templates",
            CollectionRules {
                lockable: true,
                ..CollectionRules::named("report_template")
            },
        ),
        (
            "template_inputs",
            CollectionRules {
                required: &["name", "input_type"],
                unique: None,
                parent: Some(("templates", "report_templates", "template_id")),
                ..CollectionRules::named("template_input")
            },
        ),
        (
            "bookmarks",
            CollectionRules {
                required: &["name", "controller", "query"],
                ..CollectionRules::named("bookmark")
            },
        ),
        ("organizations", CollectionRules::named("organization")),
        (
            "content_views",
            CollectionRules {
                required: &["name", "organization_id"],
                unique: None,
                references: &[("organization_id", "organizations")],
                ..CollectionRules::named("content_view")
            },
        ),
        (
            "users",
            CollectionRules {
                required: &["login", "password"],
                unique: Some("login"),
                hidden: &["password"],
                ..CollectionRules::named("user")
            },
        ),
    ]
}

pub(crate) struct State {
    collections: BTreeMap<String, Collection>,
    next_id: i64,
    jobs: HashMap<String, ReportJob>,
    report_delay: u32,
}

/// Shared in-memory server
pub struct MemoryServer {
    state: Mutex<State>,
}

impl MemoryServer {
    pub fn new() -> Arc<Self> {
        let mut state = State {
            collections: default_collections()
                .into_iter()
                .map(|(path, rules)| (path.to_string(), Collection::new(rules)))
                .collect(),
            next_id: 1,
            jobs: HashMap::new(),
            report_delay: 2,
        };
        let admin = json!({"login": ADMIN_LOGIN, "password": ADMIN_PASSWORD, "admin": true});
        state.insert("users", admin.as_object().cloned().unwrap_or_default());

        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    /// Number of `report_data` polls answered with 204 before data is ready
    pub fn set_report_delay(&self, polls: u32) {
        self.state.lock().report_delay = polls;
    }

    /// Transport acting as `login`
    pub fn session(self: &Arc<Self>, login: &str) -> MemorySession {
        MemorySession {
            server: Arc::clone(self),
            login: login.to_string(),
        }
    }

    /// Transport acting as the built-in administrator
    pub fn admin(self: &Arc<Self>) -> MemorySession {
        self.session(ADMIN_LOGIN)
    }

    pub fn authenticate(&self, login: &str, password: &str) -> bool {
        self.state
            .lock()
            .find_user(login)
            .and_then(|user| user.get("password"))
            .and_then(Value::as_str)
            .map(|stored| stored == password)
            .unwrap_or(false)
    }

    /// Number of stored items in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .collections
            .get(collection)
            .map(|c| c.items.len())
            .unwrap_or(0)
    }

    pub fn handle(&self, login: &str, request: &Request) -> Response {
        let mut state = self.state.lock();
        if state.find_user(login).is_none() {
            return error(401, "Unable to authenticate user");
        }
        let response = state.route(login, request);
        debug!(
            "memory {} {} -> {}",
            request.method, request.path, response.status
        );
        response
    }
}

/// A [`Transport`] bound to one account on a [`MemoryServer`]
#[derive(Clone)]
pub struct MemorySession {
    server: Arc<MemoryServer>,
    login: String,
}

impl MemorySession {
    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn server(&self) -> &Arc<MemoryServer> {
        &self.server
    }
}

impl Transport for MemorySession {
    fn send(&self, request: Request) -> Result<Response> {
        Ok(self.server.handle(&self.login, &request))
    }
}

pub(crate) fn error(status: u16, message: impl Into<String>) -> Response {
    let message = message.into();
    Response::new(
        status,
        json!({"error": {"message": message, "full_messages": [message]}}),
    )
}

fn not_found() -> Response {
    error(404, "Resource not found")
}

impl State {
    fn route(&mut self, login: &str, request: &Request) -> Response {
        let Some(rest) = request.path.strip_prefix("/api/") else {
            return not_found();
        };
        let segments: Vec<&str> = rest.trim_end_matches('/').split('/').collect();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["status"]) => Response::new(200, json!({"result": "ok", "version": "memory"})),
            (Method::Get, [collection]) => self.search(collection, request, None),
            (Method::Post, [collection]) => self.create(collection, request, None),
            (Method::Post, ["report_templates", id, action]) => match parse_id(id) {
                Some(id) => self.report_action(login, id, action, request),
                None => not_found(),
            },
            (Method::Get, ["report_templates", id, "export"]) => match parse_id(id) {
                Some(id) => self.export(id),
                None => not_found(),
            },
            (Method::Get, ["report_templates", id, "report_data", job]) => match parse_id(id) {
                Some(id) => self.report_data(login, id, job),
                None => not_found(),
            },
            (_, [collection, id]) => match parse_id(id) {
                Some(id) => self.member(collection, id, request, None),
                None => not_found(),
            },
            (method, [parent, parent_id, child, tail @ ..]) => {
                let Some(parent_id) = parse_id(parent_id) else {
                    return not_found();
                };
                let Some(scope) = self.nested_scope(parent, child, parent_id) else {
                    return not_found();
                };
                match (method, tail) {
                    (Method::Get, []) => self.search(child, request, Some(scope)),
                    (Method::Post, []) => self.create(child, request, Some(scope)),
                    (_, [id]) => match parse_id(id) {
                        Some(id) => self.member(child, id, request, Some(scope)),
                        None => not_found(),
                    },
                    _ => not_found(),
                }
            }
            _ => not_found(),
        }
    }

    /// Validates `/api/{parent}/{parent_id}/{child}` and returns the scoping key/value
    fn nested_scope(&self, parent: &str, child: &str, parent_id: i64) -> Option<(&'static str, i64)> {
        let collection = self.collections.get(child)?;
        let (segment, parent_collection, key) = collection.rules.parent?;
        if segment != parent {
            return None;
        }
        self.collections
            .get(parent_collection)?
            .items
            .contains_key(&parent_id)
            .then_some((key, parent_id))
    }

    pub(crate) fn insert(&mut self, collection: &str, mut item: Map<String, Value>) -> Option<i64> {
        let id = self.next_id;
        let coll = self.collections.get_mut(collection)?;
        self.next_id += 1;
        let now = chrono::Utc::now().to_rfc3339();
        item.insert("id".to_string(), json!(id));
        item.insert("created_at".to_string(), json!(now));
        item.insert("updated_at".to_string(), json!(now));
        if coll.rules.lockable {
            item.entry("locked").or_insert(json!(false));
            item.entry("default").or_insert(json!(false));
        }
        coll.items.insert(id, item);
        Some(id)
    }

    fn find_user(&self, login: &str) -> Option<&Map<String, Value>> {
        self.collections
            .get("users")?
            .items
            .values()
            .find(|user| user.get("login").and_then(Value::as_str) == Some(login))
    }

    fn is_admin(&self, login: &str) -> bool {
        self.find_user(login)
            .and_then(|user| user.get("admin"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn check_references(&self, collection: &Collection, item: &Map<String, Value>) -> std::result::Result<(), String> {
        for (key, target) in collection.rules.references {
            let Some(value) = item.get(*key) else {
                continue;
            };
            let items = self.collections.get(*target).map(|c| &c.items);
            for id in referenced_ids(value) {
                let exists = match (id, items) {
                    (Some(id), Some(items)) => items.contains_key(&id),
                    _ => false,
                };
                if !exists {
                    return Err(format!("{} references a missing {} ({})", key, target, value));
                }
            }
        }
        Ok(())
    }

    fn payload<'a>(collection: &Collection, request: &'a Request) -> std::result::Result<&'a Map<String, Value>, Response> {
        request
            .body
            .as_ref()
            .and_then(|body| body.get(collection.rules.json_key))
            .and_then(Value::as_object)
            .ok_or_else(|| {
                error(
                    422,
                    format!("Request body must contain a '{}' object", collection.rules.json_key),
                )
            })
    }

    fn search(&self, collection: &str, request: &Request, scope: Option<(&str, i64)>) -> Response {
        let Some(coll) = self.collections.get(collection) else {
            return not_found();
        };
        let search = request.query_param("search").unwrap_or("");
        let conditions = match query::parse(search) {
            Ok(conditions) => conditions,
            Err(e) => return error(400, e.to_string()),
        };

        let scoped: Vec<&Map<String, Value>> = coll
            .items
            .values()
            .filter(|item| in_scope(item, scope))
            .collect();
        let results: Vec<Value> = scoped
            .iter()
            .filter(|item| conditions.iter().all(|c| c.matches(item)))
            .map(|item| Value::Object(self.render(collection, coll, item)))
            .collect();

        Response::new(
            200,
            json!({
                "total": scoped.len(),
                "subtotal": results.len(),
                "search": search,
                "results": results,
            }),
        )
    }

    fn create(&mut self, collection: &str, request: &Request, scope: Option<(&str, i64)>) -> Response {
        let Some(coll) = self.collections.get(collection) else {
            return not_found();
        };
        let mut item = match Self::payload(coll, request) {
            Ok(payload) => payload.clone(),
            Err(response) => return response,
        };
        item.remove("id");
        if let Some((key, parent_id)) = scope {
            item.insert(key.to_string(), json!(parent_id));
        }

        let checks = coll
            .check_required(&item)
            .and_then(|_| coll.check_unique(&item, None))
            .and_then(|_| self.check_references(coll, &item));
        if let Err(message) = checks {
            return error(422, message);
        }

        match self.insert(collection, item) {
            Some(id) => self.show(collection, id, 201),
            None => not_found(),
        }
    }

    fn member(&mut self, collection: &str, id: i64, request: &Request, scope: Option<(&str, i64)>) -> Response {
        let Some(coll) = self.collections.get(collection) else {
            return not_found();
        };
        let Some(item) = coll.items.get(&id) else {
            return not_found();
        };
        if !in_scope(item, scope) {
            return not_found();
        }

        match request.method {
            Method::Get => self.show(collection, id, 200),
            Method::Put => self.update(collection, id, request),
            Method::Delete => self.destroy(collection, id),
            Method::Post => error(405, "Method not allowed"),
        }
    }

    fn show(&self, collection: &str, id: i64, status: u16) -> Response {
        match self.collections.get(collection) {
            Some(coll) => match coll.items.get(&id) {
                Some(item) => Response::new(status, Value::Object(self.render(collection, coll, item))),
                None => not_found(),
            },
            None => not_found(),
        }
    }

    fn render(&self, collection: &str, coll: &Collection, item: &Map<String, Value>) -> Map<String, Value> {
        let mut rendered = coll.render(item);
        if collection == "report_templates" {
            let id = item.get("id").and_then(as_id);
            let inputs: Vec<Value> = self
                .collections
                .get("template_inputs")
                .map(|inputs| {
                    inputs
                        .items
                        .values()
                        .filter(|input| input.get("template_id").and_then(as_id) == id)
                        .map(|input| {
                            json!({
                                "id": input.get("id"),
                                "name": input.get("name"),
                                "input_type": input.get("input_type"),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            rendered.insert("template_inputs".to_string(), Value::Array(inputs));
        }
        rendered
    }

    fn update(&mut self, collection: &str, id: i64, request: &Request) -> Response {
        let Some(coll) = self.collections.get(collection) else {
            return not_found();
        };
        let changes = match Self::payload(coll, request) {
            Ok(payload) => payload.clone(),
            Err(response) => return response,
        };
        let Some(current) = coll.items.get(&id) else {
            return not_found();
        };

        if coll.is_locked(id) {
            let touches_more_than_lock = changes
                .iter()
                .any(|(key, value)| key != "locked" && current.get(key) != Some(value));
            if touches_more_than_lock {
                return error(
                    422,
                    "This template is locked. Please clone it to a new template to customize.",
                );
            }
        }

        let mut merged = current.clone();
        for (key, value) in changes {
            if key != "id" {
                merged.insert(key, value);
            }
        }
        let checks = coll
            .check_required(&merged)
            .and_then(|_| coll.check_unique(&merged, Some(id)))
            .and_then(|_| self.check_references(coll, &merged));
        if let Err(message) = checks {
            return error(422, message);
        }

        merged.insert(
            "updated_at".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
        if let Some(coll) = self.collections.get_mut(collection) {
            coll.items.insert(id, merged);
        }
        self.show(collection, id, 200)
    }

    fn destroy(&mut self, collection: &str, id: i64) -> Response {
        let Some(coll) = self.collections.get_mut(collection) else {
            return not_found();
        };
        if coll.is_locked(id) {
            return error(422, "This template is locked and may not be removed.");
        }
        let Some(item) = coll.items.remove(&id) else {
            return not_found();
        };
        let rendered = coll.render(&item);

        if collection == "report_templates" {
            if let Some(inputs) = self.collections.get_mut("template_inputs") {
                inputs
                    .items
                    .retain(|_, input| input.get("template_id").and_then(as_id) != Some(id));
            }
            self.jobs.retain(|_, job| job.template_id != id);
        }
        Response::new(200, Value::Object(rendered))
    }
}

fn parse_id(segment: &str) -> Option<i64> {
    segment.parse().ok()
}

fn in_scope(item: &Map<String, Value>, scope: Option<(&str, i64)>) -> bool {
    match scope {
        Some((key, parent_id)) => item.get(key).and_then(as_id) == Some(parent_id),
        None => true,
    }
}
