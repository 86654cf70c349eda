use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::field::Field;
use crate::record::{Entity, Record};
use crate::schema::Schema;

use super::{Architecture, Medium, OperatingSystem, PartitionTable};

pub struct Host;

/// Host fields that must agree with the operating system's own relations
const ALIGNED: &[&str] = &["architecture", "ptable"];

/// Make the host's operating system come from its medium and its
/// architecture and partition table come from that operating system.
/// Values supplied by the caller are checked instead of replaced; an
/// explicit operating system is carried over to a generated medium.
fn align_with_operating_system(host: &mut Record) -> Result<(), String> {
    let medium = host.related("medium").first().cloned();
    if !host.is_overridden("operatingsystem") {
        let from_medium = medium
            .as_ref()
            .and_then(|medium| medium.related("operatingsystem").first())
            .cloned();
        if let Some(os) = from_medium {
            host.set("operatingsystem", os).map_err(|e| e.to_string())?;
        }
    } else if let (Some(medium), Some(os)) = (medium, host.related("operatingsystem").first().cloned()) {
        if host.is_overridden("medium") {
            if !medium.related("operatingsystem").iter().any(|m| m.same_as(&os)) {
                return Err("medium does not carry the host's operating system".to_string());
            }
        } else {
            let mut rebuilt = (*medium).clone();
            rebuilt
                .set("operatingsystem", vec![os])
                .map_err(|e| e.to_string())?;
            host.set("medium", Arc::new(rebuilt)).map_err(|e| e.to_string())?;
        }
    }

    let os = host
        .related("operatingsystem")
        .first()
        .cloned()
        .ok_or_else(|| "host has no operating system".to_string())?;

    for field in ALIGNED {
        let supported = os.related(field);
        if host.is_overridden(field) {
            let chosen = host.related(field);
            let accepted = chosen.iter().all(|c| supported.iter().any(|s| s.same_as(c)));
            if !accepted {
                return Err(format!(
                    "{} is not one of the operating system's {} values",
                    field, field
                ));
            }
        } else if let Some(first) = supported.first() {
            host.set(field, Arc::clone(first)).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Host")
        .field("name", Field::positive_name())
        .field("medium", Field::one_related(Medium::schema))
        .field("operatingsystem", Field::one_related(OperatingSystem::schema))
        .field("architecture", Field::one_related(Architecture::schema))
        .field("ptable", Field::one_related(PartitionTable::schema))
        .api(
            "/api/hosts",
            "host",
            &["name", "medium", "operatingsystem", "architecture", "ptable"],
        )
        .post_init(align_with_operating_system)
        .build()
});

impl Entity for Host {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
