//! Report templates through hammer

use foreman_qa_cli::factory::{make_report_template, make_template_input, make_user};
use foreman_qa_cli::parse::field;
use foreman_qa_cli::subcommands::hammer_help;
use foreman_qa_cli::{CliError, Options, ReportTemplate, Subcommand};
use foreman_qa_common::gen_alpha;
use foreman_qa_e2e::Harness;

fn names(entries: &[serde_json::Map<String, serde_json::Value>]) -> Vec<String> {
    entries.iter().filter_map(|e| field(e, "name")).collect()
}

#[test]
fn help_at_every_level() {
    let harness = Harness::offline();
    let hammer = harness.hammer();

    let base = hammer_help(&hammer).unwrap();
    assert!(base.iter().any(|l| l.contains("report-template")));

    let command = ReportTemplate::help(&hammer, None).unwrap();
    assert!(command.iter().any(|l| l.contains("hammer report-template")));
    assert!(command.iter().any(|l| l.contains("report template")));
    assert!(command.iter().any(|l| l.contains("generate") && l.contains("report")));

    let create = ReportTemplate::help(&hammer, Some("create")).unwrap();
    assert!(create.iter().any(|l| l.contains("hammer report-template create")));
    assert!(create.iter().any(|l| l.contains("--audit-comment")));
    assert!(create.iter().any(|l| l.contains("--interactive")));
}

#[test]
fn end_to_end_crud_and_list() {
    let harness = Harness::offline();
    let hammer = harness.hammer();

    let name = gen_alpha(10);
    let template = make_report_template(&hammer, Options::new().set("name", &name)).unwrap();
    assert_eq!(field(&template, "name").as_deref(), Some(name.as_str()));

    let other = make_report_template(&hammer, Options::new()).unwrap();
    let listed = names(&ReportTemplate::list(&hammer, &Options::new()).unwrap());
    assert!(listed.contains(&name));

    let id = field(&template, "id").unwrap();
    let info = ReportTemplate::info(&hammer, &Options::new().set("id", &id)).unwrap();
    assert_eq!(field(&info, "name").as_deref(), Some(name.as_str()));

    let new_name = gen_alpha(10);
    let updated = ReportTemplate::update(
        &hammer,
        &Options::new().set("name", &name).set("new-name", &new_name),
    )
    .unwrap();
    assert_eq!(field(&updated[0], "name").as_deref(), Some(new_name.as_str()));
    let listed = names(&ReportTemplate::list(&hammer, &Options::new()).unwrap());
    assert!(!listed.contains(&name));

    let other_name = field(&other, "name").unwrap();
    ReportTemplate::delete(&hammer, &Options::new().set("name", &other_name)).unwrap();
    let other_id = field(&other, "id").unwrap();
    let err = ReportTemplate::info(&hammer, &Options::new().set("id", other_id)).unwrap_err();
    assert!(err.return_code().is_some());
}

#[test]
fn lock_and_unlock() {
    let harness = Harness::offline();
    let hammer = harness.hammer();
    let template = make_report_template(&hammer, Options::new()).unwrap();
    let name = field(&template, "name").unwrap();

    ReportTemplate::update(&hammer, &Options::new().set("name", &name).set("locked", 1)).unwrap();
    let new_name = gen_alpha(10);
    let err = ReportTemplate::update(
        &hammer,
        &Options::new().set("name", &name).set("new-name", &new_name),
    )
    .unwrap_err();
    assert!(matches!(err, CliError::ReturnCode { .. }));

    ReportTemplate::update(&hammer, &Options::new().set("name", &name).set("locked", 0)).unwrap();
    let updated = ReportTemplate::update(
        &hammer,
        &Options::new().set("name", &name).set("new-name", &new_name),
    )
    .unwrap();
    assert_eq!(field(&updated[0], "name").as_deref(), Some(new_name.as_str()));
}

#[test]
fn add_user_input() {
    let harness = Harness::offline();
    let hammer = harness.hammer();
    let template = make_report_template(&hammer, Options::new()).unwrap();

    let input_name = gen_alpha(10);
    let input = make_template_input(
        &hammer,
        Options::new()
            .set("name", &input_name)
            .set("input-type", "user")
            .set("template-id", field(&template, "id").unwrap()),
    )
    .unwrap();
    assert_eq!(field(&input, "name").as_deref(), Some(input_name.as_str()));

    let info = ReportTemplate::info(
        &hammer,
        &Options::new().set("name", field(&template, "name").unwrap()),
    )
    .unwrap();
    assert_eq!(info["template-inputs"][0]["name"], input_name.as_str());
}

#[test]
fn template_input_needs_a_template() {
    let harness = Harness::offline();
    let err = make_template_input(&harness.hammer(), Options::new()).unwrap_err();
    assert!(matches!(err, CliError::Factory { .. }));
}

#[test]
fn dump_shows_content() {
    let harness = Harness::offline();
    let hammer = harness.hammer();
    let content = gen_alpha(20);
    let template = make_report_template(&hammer, Options::new().set("content", &content)).unwrap();

    let dump = ReportTemplate::dump(&hammer, &Options::new().set("id", field(&template, "id").unwrap())).unwrap();
    assert!(dump.contains(&content));
}

#[test]
fn clone_locked_template() {
    let harness = Harness::offline();
    let hammer = harness.hammer();
    let template = make_report_template(&hammer, Options::new()).unwrap();
    let id = field(&template, "id").unwrap();

    ReportTemplate::update(
        &hammer,
        &Options::new()
            .set("name", field(&template, "name").unwrap())
            .set("locked", 1)
            .set("default", 1),
    )
    .unwrap();

    let new_name = gen_alpha(10);
    ReportTemplate::clone(&hammer, &Options::new().set("id", &id).set("new-name", &new_name)).unwrap();
    let listed = names(&ReportTemplate::list(&hammer, &Options::new()).unwrap());
    assert!(listed.contains(&new_name));

    let info = ReportTemplate::info(&hammer, &Options::new().set("id", &id)).unwrap();
    assert_eq!(field(&info, "locked").as_deref(), Some("yes"));
    assert_eq!(field(&info, "default").as_deref(), Some("yes"));
}

#[test]
fn create_without_name_fails() {
    let harness = Harness::offline();
    let err = make_report_template(&harness.hammer(), Options::new().set("name", "")).unwrap_err();
    assert!(matches!(err, CliError::Factory { .. }));
    assert!(err.to_string().contains("can't be blank"));
}

#[test]
fn delete_locked_fails() {
    let harness = Harness::offline();
    let hammer = harness.hammer();
    let template = make_report_template(&hammer, Options::new()).unwrap();
    let name = field(&template, "name").unwrap();

    ReportTemplate::update(&hammer, &Options::new().set("name", &name).set("locked", 1)).unwrap();
    let err = ReportTemplate::delete(&hammer, &Options::new().set("name", &name)).unwrap_err();
    assert!(err.return_code().is_some());
    assert!(ReportTemplate::exists(&hammer, &format!("name = {}", name)).unwrap().is_some());
}

#[test]
fn bad_email_is_refused() {
    let harness = Harness::offline();
    let hammer = harness.hammer();
    let template = make_report_template(&hammer, Options::new()).unwrap();

    let err = ReportTemplate::schedule(
        &hammer,
        &Options::new()
            .set("name", field(&template, "name").unwrap())
            .set("mail-to", gen_alpha(10)),
    )
    .unwrap_err();
    assert!(matches!(err, CliError::ReturnCode { .. }));
    assert!(err.stderr().unwrap_or_default().contains("e-mail"));
}

#[test]
fn generate_with_inputs() {
    let harness = Harness::offline();
    let hammer = harness.hammer();
    let template = make_report_template(
        &hammer,
        Options::new().set("content", "Name,OS\n<%= input('host') %>,\"<%= input('os') %>\""),
    )
    .unwrap();

    let report = ReportTemplate::generate(
        &hammer,
        &Options::new()
            .set("name", field(&template, "name").unwrap())
            .set("inputs", "host=web01,os=CentOS"),
    )
    .unwrap();
    assert_eq!(report, ["Name,OS", "web01,\"CentOS\""]);
}

#[test]
fn nonauthor_of_report_cant_download_it() {
    let harness = Harness::offline();
    let hammer = harness.hammer();
    let password = gen_alpha(10);

    let author = make_user(&hammer, Options::new().set("password", &password)).unwrap();
    let other = make_user(&hammer, Options::new().set("password", &password)).unwrap();
    let as_author = hammer.with_user(&field(&author, "login").unwrap(), &password);
    let as_other = hammer.with_user(&field(&other, "login").unwrap(), &password);

    let content = gen_alpha(20);
    let template = make_report_template(&as_author, Options::new().set("content", &content)).unwrap();
    let name = field(&template, "name").unwrap();

    let job_id = ReportTemplate::schedule(&as_author, &Options::new().set("name", &name)).unwrap();
    let data = ReportTemplate::schedule_and_wait(&as_author, &Options::new().set("name", &name), harness.poll())
        .unwrap();
    assert!(data.iter().any(|l| l.contains(&content)));

    let err = ReportTemplate::report_data(
        &as_other,
        &Options::new().set("id", &name).set("job-id", &job_id),
    )
    .unwrap_err();
    assert!(matches!(err, CliError::ReturnCode { .. }));
}
