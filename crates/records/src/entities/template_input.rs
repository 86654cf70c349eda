use foreman_qa_common::StrType;
use once_cell::sync::Lazy;

use crate::field::Field;
use crate::record::Entity;
use crate::schema::Schema;

use super::ReportTemplate;

pub const INPUT_TYPES: &[&str] = &["user", "fact", "variable"];

/// Input of a report template, nested under it on the server
pub struct TemplateInput;

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("TemplateInput")
        .field("name", Field::positive_name())
        .field("input_type", Field::choice(INPUT_TYPES.iter().copied()))
        .field("description", Field::random_string(StrType::Alpha, 10, 30))
        .field("required", Field::boolean(false))
        .field("advanced", Field::boolean(false))
        .field("template", Field::one_related(ReportTemplate::schema))
        .api(
            "/api/templates/{template_id}/template_inputs",
            "template_input",
            &["name", "input_type", "description", "required", "advanced"],
        )
        .build()
});

impl Entity for TemplateInput {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
