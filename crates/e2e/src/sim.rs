//! Simulated `hammer` answering from the in-memory server
//!
//! Parses the command lines built by [`Hammer`](foreman_qa_cli::Hammer),
//! authenticates the account, translates the subcommand into API calls on a
//! [`MemorySession`] and prints what hammer would print: JSON with
//! capitalised keys for structured commands, plain lines otherwise, and a
//! non-zero return code plus stderr on failure.

use std::sync::Arc;

use foreman_qa_cli::options::{split, Options};
use foreman_qa_cli::{CommandOutput, CommandRunner, Result};
use foreman_qa_common::{MemoryServer, MemorySession, Request, Response, Transport};
use serde_json::{json, Map, Value};
use tracing::debug;

const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_NOINPUT: i32 = 66;
const EX_SOFTWARE: i32 = 70;
const EX_NOPERM: i32 = 77;
const EX_NOT_FOUND: i32 = 128;
const EX_UNAUTHORIZED: i32 = 129;

/// Options whose values are sent as booleans
const BOOLEAN_OPTIONS: &[&str] = &["locked", "default", "admin", "public", "snippet", "required"];

/// Options consumed by the simulator itself rather than sent to the server
const LOCAL_OPTIONS: &[&str] = &[
    "id",
    "new-name",
    "file",
    "inputs",
    "mail-to",
    "job-id",
    "search",
    "interactive",
    "audit-comment",
];

type Outcome<T> = std::result::Result<T, CommandOutput>;

/// A hammer subcommand backed by one API collection
struct Resource {
    command: &'static str,
    collection: &'static str,
    json_key: &'static str,
    title: &'static str,
    /// Option naming an object, besides `--id`
    name_key: &'static str,
    /// `(option, path segment)` for collections nested under a parent
    parent: Option<(&'static str, &'static str)>,
    extra_actions: &'static [(&'static str, &'static str)],
}

const RESOURCES: &[Resource] = &[
    Resource {
        command: "content-view",
        collection: "content_views",
        json_key: "content_view",
        title: "Content view",
        name_key: "name",
        parent: None,
        extra_actions: &[],
    },
    Resource {
        command: "organization",
        collection: "organizations",
        json_key: "organization",
        title: "Organization",
        name_key: "name",
        parent: None,
        extra_actions: &[],
    },
    Resource {
        command: "report-template",
        collection: "report_templates",
        json_key: "report_template",
        title: "Report template",
        name_key: "name",
        parent: None,
        extra_actions: &[
            ("clone", "Clone a template"),
            ("dump", "View report content"),
            ("generate", "Generate report"),
            ("report-data", "Downloads a generated report"),
            ("schedule", "Schedule generating of a report"),
        ],
    },
    Resource {
        command: "template-input",
        collection: "template_inputs",
        json_key: "template_input",
        title: "Template input",
        name_key: "name",
        parent: Some(("template-id", "templates")),
        extra_actions: &[],
    },
    Resource {
        command: "user",
        collection: "users",
        json_key: "user",
        title: "User",
        name_key: "login",
        parent: None,
        extra_actions: &[],
    },
];

fn find_resource(command: &str) -> Option<&'static Resource> {
    RESOURCES.iter().find(|r| r.command == command)
}

fn usage(message: impl AsRef<str>) -> CommandOutput {
    CommandOutput::failure(EX_USAGE, &format!("Error: {}", message.as_ref()))
}

fn exit_code(status: u16) -> i32 {
    match status {
        401 => EX_UNAUTHORIZED,
        403 => EX_NOPERM,
        404 => EX_NOT_FOUND,
        400 | 422 => EX_DATAERR,
        _ => EX_SOFTWARE,
    }
}

/// `template_inputs` -> `Template inputs`
fn humanize(key: &str) -> String {
    let mut text = key.replace('_', " ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text
}

/// Server JSON as hammer prints it: capitalised keys, booleans as yes/no
fn render(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (humanize(key), render(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(render).collect()),
        Value::Bool(flag) => Value::String(if *flag { "yes" } else { "no" }.to_string()),
        other => other.clone(),
    }
}

fn print_json(value: &Value) -> Outcome<CommandOutput> {
    serde_json::to_string_pretty(&render(value))
        .map(|text| CommandOutput::success(&text))
        .map_err(|e| CommandOutput::failure(EX_SOFTWARE, &e.to_string()))
}

fn text_body(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn option_value(key: &str, raw: Option<&str>) -> Value {
    let number_or_text = |raw: &str| {
        raw.trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(raw.trim()))
    };
    match raw {
        None => Value::Bool(true),
        Some(raw) if BOOLEAN_OPTIONS.contains(&key) => {
            Value::Bool(matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        }
        Some(raw) if key.ends_with("-ids") => Value::Array(raw.split(',').map(number_or_text).collect()),
        Some(raw) if key.ends_with("-id") => number_or_text(raw),
        Some(raw) => Value::from(raw),
    }
}

/// `--inputs "a=1,b=2"`
fn parse_inputs(raw: Option<&str>) -> Outcome<Map<String, Value>> {
    let mut inputs = Map::new();
    for pair in raw.unwrap_or_default().split(',').filter(|p| !p.trim().is_empty()) {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| usage(format!("Option --inputs: expected name=value, got '{}'", pair)))?;
        inputs.insert(name.trim().to_string(), Value::from(value.trim()));
    }
    Ok(inputs)
}

/// Parsed hammer command line
#[derive(Debug, Default)]
struct Invocation {
    username: String,
    password: String,
    path: Vec<String>,
    options: Options,
    help: bool,
}

impl Invocation {
    fn parse(words: &[String]) -> Outcome<Self> {
        let mut invocation = Self::default();
        let mut rest = words.iter().skip(1).peekable();

        while let Some(word) = rest.peek().copied() {
            match word.as_str() {
                "-u" | "--username" => {
                    rest.next();
                    invocation.username = rest.next().cloned().ok_or_else(|| usage("--username needs a value"))?;
                }
                "-p" | "--password" => {
                    rest.next();
                    invocation.password = rest.next().cloned().ok_or_else(|| usage("--password needs a value"))?;
                }
                "--output" => {
                    rest.next();
                    rest.next();
                }
                "-h" | "--help" => {
                    rest.next();
                    invocation.help = true;
                }
                _ => break,
            }
        }

        while let Some(word) = rest.next_if(|w| !w.starts_with('-')) {
            invocation.path.push(word.clone());
        }

        let (help, remaining): (Vec<&String>, Vec<&String>) =
            rest.partition(|w| w.as_str() == "--help" || w.as_str() == "-h");
        invocation.help |= !help.is_empty();
        invocation.options = Options::from_args(&remaining);
        Ok(invocation)
    }
}

fn main_help() -> String {
    let mut text = String::from("Usage:\n    hammer [OPTIONS] SUBCOMMAND [ARG] ...\n\nSubcommands:\n");
    for resource in RESOURCES {
        text.push_str(&format!(
            "    {:<28}Manipulate {}s\n",
            resource.command,
            resource.title.to_lowercase()
        ));
    }
    text.push_str(
        "\nOptions:\n    --output ADAPTER              Set output format\n    \
         -u, --username USERNAME\n    -p, --password PASSWORD\n    -h, --help                    Print help\n",
    );
    text
}

fn resource_help(resource: &Resource) -> String {
    let label = resource.title.to_lowercase();
    let mut actions = vec![
        ("create", format!("Create a {}", label)),
        ("delete", format!("Delete a {}", label)),
        ("info", format!("Show a {}", label)),
        ("list", format!("List all {}s", label)),
        ("update", format!("Update a {}", label)),
    ];
    actions.extend(
        resource
            .extra_actions
            .iter()
            .map(|(action, about)| (*action, about.to_string())),
    );
    actions.sort();

    let mut text = format!(
        "Usage:\n    hammer {} [OPTIONS] SUBCOMMAND [ARG] ...\n\nSubcommands:\n",
        resource.command
    );
    for (action, about) in actions {
        text.push_str(&format!("    {:<28}{}\n", action, about));
    }
    text.push_str("\nOptions:\n    -h, --help                    Print help\n");
    text
}

fn action_help(resource: &Resource, action: &str) -> String {
    let mut text = format!(
        "Usage:\n    hammer {} {} [OPTIONS]\n\nOptions:\n    --audit-comment AUDIT_COMMENT\n",
        resource.command, action
    );
    if action != "create" && action != "list" {
        text.push_str(&format!("    --id ID\n    --{} VALUE\n", resource.name_key));
    }
    if let Some((option, _)) = resource.parent {
        text.push_str(&format!("    --{} VALUE\n", option));
    }
    text.push_str("    --interactive INTERACTIVE     Ask for missing values\n    -h, --help                    Print help\n");
    text
}

/// `hammer` over a [`MemoryServer`]
#[derive(Clone)]
pub struct SimulatedHammer {
    server: Arc<MemoryServer>,
}

impl SimulatedHammer {
    pub fn new(server: Arc<MemoryServer>) -> Self {
        Self { server }
    }

    fn help(&self, path: &[String]) -> Outcome<CommandOutput> {
        let text = match path {
            [] => main_help(),
            [command] => resource_help(find_resource(command).ok_or_else(|| usage(format!("unknown subcommand '{}'", command)))?),
            [command, action, ..] => {
                let resource = find_resource(command).ok_or_else(|| usage(format!("unknown subcommand '{}'", command)))?;
                action_help(resource, action)
            }
        };
        Ok(CommandOutput::success(&text))
    }

    fn execute(&self, command: &str) -> Outcome<CommandOutput> {
        let invocation = Invocation::parse(&split(command))?;
        if invocation.help {
            return self.help(&invocation.path);
        }

        let (command, action) = match invocation.path.as_slice() {
            [command, action] => (command.as_str(), action.as_str()),
            [] => return Err(usage("no subcommand given")),
            [command] => return Err(usage(format!("no action given for '{}'", command))),
            _ => return Err(usage(format!("too many arguments: {}", invocation.path.join(" ")))),
        };
        let resource = find_resource(command).ok_or_else(|| usage(format!("unknown subcommand '{}'", command)))?;

        if !self.server.authenticate(&invocation.username, &invocation.password) {
            return Err(CommandOutput::failure(
                EX_UNAUTHORIZED,
                "Invalid username or password",
            ));
        }

        let call = Call {
            session: self.server.session(&invocation.username),
            resource,
            options: invocation.options,
        };
        call.dispatch(action)
    }
}

impl CommandRunner for SimulatedHammer {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        let output = match self.execute(command) {
            Ok(output) | Err(output) => output,
        };
        debug!("simulated hammer exit {}", output.return_code);
        Ok(output)
    }
}

/// One authenticated subcommand invocation
struct Call {
    session: MemorySession,
    resource: &'static Resource,
    options: Options,
}

impl Call {
    fn dispatch(&self, action: &str) -> Outcome<CommandOutput> {
        match action {
            "create" => self.create(),
            "info" => self.info(),
            "list" => self.list(),
            "update" => self.update(),
            "delete" => self.delete(),
            "clone" | "dump" | "generate" | "schedule" | "report-data" if !self.resource.extra_actions.is_empty() => {
                self.report_action(action)
            }
            other => Err(usage(format!(
                "unknown action '{}' for '{}'",
                other, self.resource.command
            ))),
        }
    }

    fn label(&self) -> String {
        self.resource.title.to_lowercase()
    }

    fn send(&self, request: Request, doing: &str) -> Outcome<Response> {
        let response = self
            .session
            .send(request)
            .map_err(|e| CommandOutput::failure(EX_SOFTWARE, &e.to_string()))?;
        if response.is_success() {
            return Ok(response);
        }
        Err(CommandOutput::failure(
            exit_code(response.status),
            &format!(
                "Could not {} the {}:\n  {}",
                doing,
                self.label(),
                response.error_message()
            ),
        ))
    }

    fn collection_path(&self) -> Outcome<String> {
        match self.resource.parent {
            Some((option, segment)) => {
                let parent = self
                    .options
                    .get(option)
                    .ok_or_else(|| usage(format!("Missing arguments for '--{}'", option)))?;
                Ok(format!("/api/{}/{}/{}", segment, parent, self.resource.collection))
            }
            None => Ok(format!("/api/{}", self.resource.collection)),
        }
    }

    /// Member path of the object named by `--id` (id or name) or the name option
    fn member_path(&self, doing: &str) -> Outcome<String> {
        let base = self.collection_path()?;
        let key = self
            .options
            .get("id")
            .or_else(|| self.options.get(self.resource.name_key))
            .ok_or_else(|| usage(format!("Missing arguments for '--id' or '--{}'", self.resource.name_key)))?;
        if let Ok(id) = key.parse::<i64>() {
            return Ok(format!("{}/{}", base, id));
        }

        let listing = self.send(Request::get(&base), doing)?;
        let id = listing.body["results"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|item| item.get(self.resource.name_key).and_then(Value::as_str) == Some(key))
            .and_then(|item| item.get("id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                CommandOutput::failure(
                    EX_NOT_FOUND,
                    &format!("Could not {} the {}:\n  {} not found.", doing, self.label(), self.resource.title),
                )
            })?;
        Ok(format!("{}/{}", base, id))
    }

    /// Request body built from the remaining options
    fn payload(&self, lookup_by_name: bool) -> Outcome<Map<String, Value>> {
        let parent_option = self.resource.parent.map(|(option, _)| option);
        let mut payload = Map::new();

        for (key, raw) in self.options.iter() {
            if LOCAL_OPTIONS.contains(&key) || Some(key) == parent_option {
                continue;
            }
            if lookup_by_name && key == self.resource.name_key {
                continue;
            }
            payload.insert(key.replace('-', "_"), option_value(key, raw));
        }

        if let Some(new_name) = self.options.get("new-name") {
            payload.insert(self.resource.name_key.to_string(), Value::from(new_name));
        }
        if let Some(path) = self.options.get("file") {
            let content = std::fs::read_to_string(path).map_err(|e| {
                CommandOutput::failure(EX_NOINPUT, &format!("Error: cannot read {}: {}", path, e))
            })?;
            payload.insert("template".to_string(), Value::from(content));
        }
        Ok(payload)
    }

    fn wrap(&self, payload: Map<String, Value>) -> Value {
        json!({ self.resource.json_key: payload })
    }

    fn create(&self) -> Outcome<CommandOutput> {
        let mut payload = self.payload(false)?;
        if self.resource.command == "organization" && !payload.contains_key("label") {
            if let Some(name) = payload.get("name").cloned() {
                payload.insert("label".to_string(), name);
            }
        }

        let created = self.send(Request::post(self.collection_path()?, self.wrap(payload)), "create")?;
        let name_key = self.resource.name_key;
        print_json(&json!({
            "message": format!("{} created.", self.resource.title),
            "id": created.body.get("id"),
            name_key: created.body.get(name_key),
        }))
    }

    fn info(&self) -> Outcome<CommandOutput> {
        let shown = self.send(Request::get(self.member_path("show")?), "show")?;
        print_json(&shown.body)
    }

    fn list(&self) -> Outcome<CommandOutput> {
        let mut request = Request::get(self.collection_path()?);
        if let Some(search) = self.options.get("search") {
            request = request.with_query("search", search);
        }
        let listing = self.send(request, "list")?;
        print_json(&listing.body["results"])
    }

    fn update(&self) -> Outcome<CommandOutput> {
        let path = self.member_path("update")?;
        let payload = self.payload(!self.options.contains("id"))?;
        let updated = self.send(Request::put(path, self.wrap(payload)), "update")?;
        print_json(&json!([updated.body]))
    }

    fn delete(&self) -> Outcome<CommandOutput> {
        self.send(Request::delete(self.member_path("delete")?), "delete")?;
        print_json(&json!([{ "message": format!("{} deleted.", self.resource.title) }]))
    }

    fn report_action(&self, action: &str) -> Outcome<CommandOutput> {
        let path = self.member_path(action)?;
        match action {
            "dump" => {
                let body = self.send(Request::get(format!("{}/export", path)), "dump")?.body;
                Ok(CommandOutput::success(&text_body(&body)))
            }
            "clone" => {
                let new_name = self
                    .options
                    .get("new-name")
                    .ok_or_else(|| usage("Missing arguments for '--new-name'"))?;
                let body = json!({ "report_template": { "name": new_name } });
                let cloned = self.send(Request::post(format!("{}/clone", path), body), "clone")?;
                print_json(&cloned.body)
            }
            "generate" => {
                let body = json!({ "input_values": parse_inputs(self.options.get("inputs"))? });
                let report = self.send(Request::post(format!("{}/generate", path), body), "generate")?;
                Ok(CommandOutput::success(&text_body(&report.body)))
            }
            "schedule" => {
                let mut body = json!({ "input_values": parse_inputs(self.options.get("inputs"))? });
                if let Some(mail_to) = self.options.get("mail-to") {
                    body["mail_to"] = Value::from(mail_to);
                }
                let scheduled = self.send(Request::post(format!("{}/schedule_report", path), body), "schedule")?;
                let job_id = text_body(&scheduled.body["job_id"]);
                Ok(CommandOutput::success(&format!("Job ID: {}", job_id)))
            }
            _ => {
                let job_id = self
                    .options
                    .get("job-id")
                    .ok_or_else(|| usage("Missing arguments for '--job-id'"))?;
                let data = self.send(Request::get(format!("{}/report_data/{}", path, job_id)), "download")?;
                Ok(CommandOutput::success(&text_body(&data.body)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn run(line: &str) -> CommandOutput {
        SimulatedHammer::new(MemoryServer::new()).run(line).unwrap()
    }

    #[test]
    fn test_invocation_parse() {
        let words = split("hammer --username 'admin' --password 'p w' --output json report-template update --name 'a b' --locked '1'");
        let invocation = Invocation::parse(&words).unwrap();
        assert_eq!(invocation.password, "p w");
        assert_eq!(invocation.path, ["report-template", "update"]);
        assert_eq!(invocation.options.get("name"), Some("a b"));
        assert!(!invocation.help);
    }

    #[test]
    fn test_help_needs_no_login() {
        let output = run("hammer report-template create --help");
        assert_eq!(output.return_code, 0);
        assert!(output.stdout.iter().any(|l| l.contains("hammer report-template create")));
        assert!(output.stdout.iter().any(|l| l.contains("--audit-comment")));
    }

    #[test]
    fn test_bad_credentials() {
        let output = run("hammer --username 'admin' --password 'nope' organization list");
        assert_eq!(output.return_code, EX_UNAUTHORIZED);
        assert!(output.stdout.is_empty());
    }

    #[test_case("hammer --username 'admin' --password 'changeme' bogus list" ; "unknown subcommand")]
    #[test_case("hammer --username 'admin' --password 'changeme' user frobnicate" ; "unknown action")]
    #[test_case("hammer --username 'admin' --password 'changeme' organization" ; "missing action")]
    fn test_usage_errors(line: &str) {
        assert_eq!(run(line).return_code, EX_USAGE);
    }

    #[test]
    fn test_render_humanizes() {
        let rendered = render(&json!({"template_inputs": [{"input_type": "user"}], "locked": true}));
        assert_eq!(rendered, json!({"Template inputs": [{"Input type": "user"}], "Locked": "yes"}));
    }

    #[test]
    fn test_option_values() {
        assert_eq!(option_value("locked", Some("1")), json!(true));
        assert_eq!(option_value("organization-id", Some("4")), json!(4));
        assert_eq!(option_value("organization-ids", Some("1,2")), json!([1, 2]));
        assert_eq!(option_value("name", Some("7")), json!("7"));
    }

    #[test]
    fn test_parse_inputs() {
        let inputs = parse_inputs(Some("hosts=web01, count = 3")).unwrap();
        assert_eq!(inputs["hosts"], "web01");
        assert_eq!(inputs["count"], "3");
        assert!(parse_inputs(Some("broken")).is_err());
    }
}
