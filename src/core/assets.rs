//! Compiled-in defaults.
//!
//! The built-in schema ships inside the binary so a repository without its
//! own schema file is still validated.

use crate::core::error::DocgateError;
use crate::core::schema::SchemaSet;

pub const DEFAULT_SCHEMA_JSON: &str = include_str!("../../defaults/schema.json");

pub fn default_schema() -> Result<SchemaSet, DocgateError> {
    SchemaSet::from_json(DEFAULT_SCHEMA_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AGENT_HARDENING_KIND;
    use crate::core::corpus::PLAN_KIND;
    use crate::core::lifecycle::DEFAULT_PLAN_FIELDS;

    #[test]
    fn default_schema_covers_builtin_kinds() {
        let schemas = default_schema().expect("embedded schema parses");
        assert!(schemas.get(AGENT_HARDENING_KIND).is_some());
        let plan = schemas.get(PLAN_KIND).expect("plan schema");
        assert_eq!(plan.required_fields, DEFAULT_PLAN_FIELDS);
    }
}
