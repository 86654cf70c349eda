//! Report template actions: generate, schedule, download, clone, export

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{json, Map, Value};

use super::{error, not_found, State};
use crate::transport::{Request, Response};

static INPUT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<%=\s*input\(\s*['"]([^'"]+)['"]\s*\)\s*%>"#).expect("input tag regex")
});

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// A scheduled report waiting to be downloaded
#[derive(Debug, Clone)]
pub(crate) struct ReportJob {
    pub template_id: i64,
    pub author: String,
    pub output: String,
    pub polls_remaining: u32,
}

/// Substitute `<%= input('name') %>` tags with the supplied input values
fn render(template: &str, inputs: &Map<String, Value>) -> String {
    INPUT_TAG
        .replace_all(template, |caps: &Captures| match inputs.get(&caps[1]) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        })
        .into_owned()
}

fn input_values(request: &Request) -> Map<String, Value> {
    request
        .body
        .as_ref()
        .and_then(|body| body.get("input_values"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

impl State {
    fn template_body(&self, id: i64) -> Option<String> {
        self.collections
            .get("report_templates")?
            .items
            .get(&id)
            .map(|item| {
                item.get("template")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            })
    }

    pub(crate) fn report_action(&mut self, login: &str, id: i64, action: &str, request: &Request) -> Response {
        let Some(template) = self.template_body(id) else {
            return not_found();
        };

        match action {
            "generate" => Response::new(200, Value::String(render(&template, &input_values(request)))),
            "schedule_report" => {
                let mail_to = request
                    .body
                    .as_ref()
                    .and_then(|body| body.get("mail_to"))
                    .and_then(Value::as_str);
                if let Some(address) = mail_to {
                    if !EMAIL.is_match(address) {
                        return error(422, format!("Mail to is not a valid e-mail address: {}", address));
                    }
                }

                let job_id = uuid::Uuid::new_v4().to_string();
                self.jobs.insert(
                    job_id.clone(),
                    ReportJob {
                        template_id: id,
                        author: login.to_string(),
                        output: render(&template, &input_values(request)),
                        polls_remaining: self.report_delay,
                    },
                );
                Response::new(
                    200,
                    json!({
                        "job_id": job_id,
                        "data_url": format!("/api/report_templates/{}/report_data/{}", id, job_id),
                    }),
                )
            }
            "clone" => self.clone_template(id, request),
            _ => not_found(),
        }
    }

    fn clone_template(&mut self, id: i64, request: &Request) -> Response {
        let new_name = request
            .body
            .as_ref()
            .and_then(|body| body.get("report_template"))
            .and_then(|rt| rt.get("name"))
            .cloned()
            .unwrap_or(Value::Null);

        let Some(templates) = self.collections.get("report_templates") else {
            return not_found();
        };
        let Some(source) = templates.items.get(&id) else {
            return not_found();
        };

        let mut copy = source.clone();
        for key in ["id", "created_at", "updated_at"] {
            copy.remove(key);
        }
        copy.insert("name".to_string(), new_name);
        copy.insert("locked".to_string(), json!(false));
        copy.insert("default".to_string(), json!(false));

        if let Err(message) = templates
            .check_required(&copy)
            .and_then(|_| templates.check_unique(&copy, None))
        {
            return error(422, message);
        }

        match self.insert("report_templates", copy) {
            Some(new_id) => self.show("report_templates", new_id, 201),
            None => not_found(),
        }
    }

    pub(crate) fn export(&self, id: i64) -> Response {
        match self.template_body(id) {
            Some(body) => Response::new(200, Value::String(body)),
            None => not_found(),
        }
    }

    pub(crate) fn report_data(&mut self, login: &str, id: i64, job_id: &str) -> Response {
        let is_admin = self.is_admin(login);
        let Some(job) = self.jobs.get_mut(job_id) else {
            return not_found();
        };
        if job.template_id != id {
            return not_found();
        }
        if job.author != login && !is_admin {
            return error(403, "Only the user who scheduled the report or an administrator can download it");
        }
        if job.polls_remaining > 0 {
            job.polls_remaining -= 1;
            return Response::new(204, Value::Null);
        }
        Response::new(200, Value::String(job.output.clone()))
    }
}
