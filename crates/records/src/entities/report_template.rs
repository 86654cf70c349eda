//! Report templates and the report actions the server offers on them

use foreman_qa_common::{wait_for, Poll, Request, Response, StrType, Transport};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};
use tracing::{debug, info};

use crate::crud::{live_id, ApiCrud};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::record::{Entity, Overrides, Record};
use crate::schema::Schema;

pub struct ReportTemplate;

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("ReportTemplate")
        .field("name", Field::positive_name())
        .field("template", Field::random_string(StrType::Alpha, 10, 40))
        .field("default", Field::boolean(false))
        .field("locked", Field::boolean(false))
        .api(
            "/api/report_templates",
            "report_template",
            &["name", "template", "default", "locked"],
        )
        .build()
});

impl Entity for ReportTemplate {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}

/// Inputs for generating or scheduling a report
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub inputs: Map<String, Json>,
    pub mail_to: Option<String>,
}

impl ReportRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, name: impl Into<String>, value: impl Into<Json>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn mail_to(mut self, address: impl Into<String>) -> Self {
        self.mail_to = Some(address.into());
        self
    }

    fn body(&self) -> Json {
        let mut body = json!({ "input_values": self.inputs });
        if let Some(address) = &self.mail_to {
            body["mail_to"] = json!(address);
        }
        body
    }
}

/// Handle of an asynchronously generated report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReport {
    pub job_id: String,
    pub data_url: String,
}

/// Report actions on live report templates
pub trait ReportTemplateActions {
    /// Render the template synchronously
    fn generate(&self, template: &Record, request: &ReportRequest) -> Result<String>;

    /// Queue report generation
    fn schedule(&self, template: &Record, request: &ReportRequest) -> Result<ScheduledReport>;

    /// Report text, or `None` while the job is still running
    fn report_data(&self, template: &Record, job: &ScheduledReport) -> Result<Option<String>>;

    /// Poll `report_data` until the text is ready
    fn wait_for_report(&self, template: &Record, job: &ScheduledReport, poll: Poll) -> Result<String>;

    /// Copy the template under a new name. The copy is unlocked.
    fn clone_as(&self, template: &Record, name: &str) -> Result<Record>;

    /// Template source as stored on the server
    fn export(&self, template: &Record) -> Result<String>;

    fn lock(&self, template: &Record) -> Result<Record>;

    fn unlock(&self, template: &Record) -> Result<Record>;
}

fn template_id(template: &Record) -> Result<i64> {
    if !template.is::<ReportTemplate>() {
        return Err(Error::Configuration {
            record: template.schema().name().to_string(),
            reason: "report actions need a ReportTemplate".to_string(),
        });
    }
    live_id(template)
}

fn send<T: Transport>(crud: &ApiCrud<T>, action: &str, request: Request) -> Result<Response> {
    let fail = |status, message| Error::RemoteAction {
        resource: "ReportTemplate".to_string(),
        action: action.to_string(),
        status,
        message,
    };
    let response = crud
        .transport()
        .send(request)
        .map_err(|e| fail(None, e.to_string()))?;
    if !response.is_success() {
        return Err(fail(Some(response.status), response.error_message()));
    }
    Ok(response)
}

fn text(body: Json) -> String {
    match body {
        Json::String(s) => s,
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn set_locked<T: Transport>(crud: &ApiCrud<T>, template: &Record, locked: bool) -> Result<Record> {
    let mut changed = template.clone();
    changed.set("locked", locked)?;
    crud.update(&changed, &["locked"])
}

impl<T: Transport> ReportTemplateActions for ApiCrud<T> {
    fn generate(&self, template: &Record, request: &ReportRequest) -> Result<String> {
        let id = template_id(template)?;
        let path = format!("/api/report_templates/{}/generate", id);
        let response = send(self, "generate", Request::post(path, request.body()))?;
        Ok(text(response.body))
    }

    fn schedule(&self, template: &Record, request: &ReportRequest) -> Result<ScheduledReport> {
        let id = template_id(template)?;
        let path = format!("/api/report_templates/{}/schedule_report", id);
        let response = send(self, "schedule_report", Request::post(path, request.body()))?;

        let scheduled: ScheduledReport =
            serde_json::from_value(response.body).map_err(|e| Error::MalformedResponse {
                resource: "ReportTemplate".to_string(),
                reason: format!("schedule response: {}", e),
            })?;
        info!("Scheduled report {} for template id={}", scheduled.job_id, id);
        Ok(scheduled)
    }

    fn report_data(&self, template: &Record, job: &ScheduledReport) -> Result<Option<String>> {
        template_id(template)?;
        let response = send(self, "report_data", Request::get(&job.data_url))?;
        if response.status == 204 {
            debug!("Report {} not ready", job.job_id);
            return Ok(None);
        }
        Ok(Some(text(response.body)))
    }

    fn wait_for_report(&self, template: &Record, job: &ScheduledReport, poll: Poll) -> Result<String> {
        let what = format!("report {}", job.job_id);
        wait_for(&what, poll, || self.report_data(template, job))
    }

    fn clone_as(&self, template: &Record, name: &str) -> Result<Record> {
        let id = template_id(template)?;
        let path = format!("/api/report_templates/{}/clone", id);
        let body = json!({ "report_template": { "name": name } });
        let response = send(self, "clone", Request::post(path, body))?;

        let Json::Object(body) = response.body else {
            return Err(Error::MalformedResponse {
                resource: "ReportTemplate".to_string(),
                reason: "clone response is not a JSON object".to_string(),
            });
        };
        let copy = Record::from_remote(ReportTemplate::schema(), &body);
        info!("Cloned report template id={} as id={}", id, copy.id().unwrap_or_default());
        Ok(copy)
    }

    fn export(&self, template: &Record) -> Result<String> {
        let id = template_id(template)?;
        let path = format!("/api/report_templates/{}/export", id);
        Ok(text(send(self, "export", Request::get(path))?.body))
    }

    fn lock(&self, template: &Record) -> Result<Record> {
        template_id(template)?;
        set_locked(self, template, true)
    }

    fn unlock(&self, template: &Record) -> Result<Record> {
        template_id(template)?;
        set_locked(self, template, false)
    }
}

impl ReportTemplate {
    /// Template whose body prints the named inputs, one per line
    pub fn with_inputs(names: &[&str]) -> Result<Record> {
        let body: Vec<String> = names
            .iter()
            .map(|name| format!("<%= input('{}') %>", name))
            .collect();
        Self::build_with(Overrides::new().set("template", body.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Architecture, TemplateInput, User};
    use foreman_qa_common::{MemoryServer, MemorySession};
    use std::sync::Arc;
    use std::time::Duration;

    fn setup() -> (Arc<MemoryServer>, ApiCrud<MemorySession>) {
        let server = MemoryServer::new();
        let crud = ApiCrud::new(server.admin());
        (server, crud)
    }

    fn quick_poll() -> Poll {
        Poll::new(Duration::from_millis(500), Duration::from_millis(10))
    }

    #[test]
    fn test_generate_with_inputs() {
        let (_server, crud) = setup();
        let template = crud.create(&ReportTemplate::with_inputs(&["hosts"]).unwrap()).unwrap();
        let report = crud
            .generate(&template, &ReportRequest::new().input("hosts", "web01"))
            .unwrap();
        assert_eq!(report, "web01");
    }

    #[test]
    fn test_schedule_and_wait() {
        let (server, crud) = setup();
        server.set_report_delay(2);
        let template = crud.create(&ReportTemplate::with_inputs(&["who"]).unwrap()).unwrap();

        let job = crud
            .schedule(&template, &ReportRequest::new().input("who", "admin"))
            .unwrap();
        assert_eq!(crud.report_data(&template, &job).unwrap(), None);
        let report = crud.wait_for_report(&template, &job, quick_poll()).unwrap();
        assert_eq!(report, "admin");
    }

    #[test]
    fn test_wait_times_out() {
        let (server, crud) = setup();
        server.set_report_delay(1_000);
        let template = crud.create(&ReportTemplate::build().unwrap()).unwrap();
        let job = crud.schedule(&template, &ReportRequest::new()).unwrap();

        let err = crud
            .wait_for_report(
                &template,
                &job,
                Poll::new(Duration::from_millis(50), Duration::from_millis(10)),
            )
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_non_author_cannot_download() {
        let (server, crud) = setup();
        server.set_report_delay(0);
        let user = crud.create(&User::build().unwrap()).unwrap();
        let template = crud.create(&ReportTemplate::build().unwrap()).unwrap();
        let job = crud.schedule(&template, &ReportRequest::new()).unwrap();

        let other = ApiCrud::new(server.session(user.str("login").unwrap()));
        let err = other.report_data(&template, &job).unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(crud.report_data(&template, &job).unwrap().is_some());
    }

    #[test]
    fn test_bad_mail_address() {
        let (_server, crud) = setup();
        let template = crud.create(&ReportTemplate::build().unwrap()).unwrap();
        let err = crud
            .schedule(&template, &ReportRequest::new().mail_to("nowhere"))
            .unwrap_err();
        assert!(matches!(err, Error::RemoteAction { status: Some(422), .. }));
    }

    #[test]
    fn test_lock_blocks_updates() {
        let (_server, crud) = setup();
        let template = crud.create(&ReportTemplate::build().unwrap()).unwrap();
        let locked = crud.lock(&template).unwrap();
        assert_eq!(locked.bool("locked"), Some(true));

        let mut renamed = locked.clone();
        renamed.set("name", "renamedLocked").unwrap();
        let err = crud.update(&renamed, &["name"]).unwrap_err();
        assert!(matches!(err, Error::RemoteUpdate { status: Some(422), .. }));

        let unlocked = crud.unlock(&locked).unwrap();
        let mut renamed = unlocked.clone();
        renamed.set("name", "renamedUnlocked").unwrap();
        let updated = crud.update(&renamed, &["name"]).unwrap();
        assert_eq!(updated.str("name"), Some("renamedUnlocked"));
    }

    #[test]
    fn test_clone_locked_template() {
        let (_server, crud) = setup();
        let template = crud.create(&ReportTemplate::build().unwrap()).unwrap();
        let locked = crud.lock(&template).unwrap();

        let copy = crud.clone_as(&locked, "copyOfLocked").unwrap();
        assert_ne!(copy.id(), locked.id());
        assert_eq!(copy.str("name"), Some("copyOfLocked"));
        assert_eq!(copy.bool("locked"), Some(false));
        assert_eq!(copy.str("template"), locked.str("template"));
        assert_eq!(crud.export(&copy).unwrap(), locked.str("template").unwrap());
    }

    #[test]
    fn test_actions_need_a_live_report_template() {
        let (_server, crud) = setup();
        let unsaved = ReportTemplate::build().unwrap();
        assert!(matches!(crud.export(&unsaved), Err(Error::NotLive { .. })));

        let arch = crud.create(&Architecture::build().unwrap()).unwrap();
        assert!(matches!(crud.export(&arch), Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_template_inputs_are_nested() {
        let (_server, crud) = setup();
        let template = Arc::new(crud.create(&ReportTemplate::build().unwrap()).unwrap());
        let input = crud
            .create(&TemplateInput::build_with(Overrides::new().set("template", Arc::clone(&template))).unwrap())
            .unwrap();
        assert!(input.is_live());
        assert!(Arc::ptr_eq(&input.related("template")[0], &template));

        let read = crud.refresh(&template).unwrap();
        assert_eq!(read.id(), template.id());
        let reread = crud.refresh(&input).unwrap();
        assert_eq!(reread.str("name"), input.str("name"));
    }
}
