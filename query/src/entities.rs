//! Entity catalog and capability matrix
//!
//! Defines which operators are legal for which field on which entity, plus
//! the per-entity free-text-search and sort whitelists. All tables are static
//! configuration; lookups fail closed, so an unknown entity or field allows
//! nothing.
//!
//! Dotted fields (`company.industry`) traverse a to-one relation and are
//! registered here explicitly rather than resolved by reflection.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::filters::types::FilterOperator;

/// Queryable entities of the provider portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Companies,
    Contacts,
    Deals,
    Activities,
}

use FilterOperator::*;

/// Free-text fields: substring matching plus set membership
const TEXT_OPS: &[FilterOperator] = &[
    Equals, NotEquals, Contains, NotContains, StartsWith, EndsWith, In, NotIn, IsEmpty, IsNotEmpty,
];

/// Closed-vocabulary fields: no substring matching
const ENUM_OPS: &[FilterOperator] = &[Equals, NotEquals, In, NotIn, IsEmpty, IsNotEmpty];

const NUMBER_OPS: &[FilterOperator] = &[Equals, NotEquals, Gt, Gte, Lt, Lte, Between];

const DATE_OPS: &[FilterOperator] = &[
    DateEquals, DateBefore, DateAfter, DateBetween, DateRelative, IsEmpty, IsNotEmpty,
];

const FLAG_OPS: &[FilterOperator] = &[Equals, NotEquals];

const COMPANY_FIELDS: &[(&str, &[FilterOperator])] = &[
    ("name", TEXT_OPS),
    ("industry", ENUM_OPS),
    ("website", TEXT_OPS),
    ("city", TEXT_OPS),
    ("state", ENUM_OPS),
    ("size", NUMBER_OPS),
    ("created_at", DATE_OPS),
    ("updated_at", DATE_OPS),
];

const CONTACT_FIELDS: &[(&str, &[FilterOperator])] = &[
    ("first_name", TEXT_OPS),
    ("last_name", TEXT_OPS),
    ("email", TEXT_OPS),
    ("phone", TEXT_OPS),
    ("title", TEXT_OPS),
    ("status", ENUM_OPS),
    ("company.name", TEXT_OPS),
    ("company.industry", ENUM_OPS),
    ("created_at", DATE_OPS),
    ("last_contacted_at", DATE_OPS),
];

const DEAL_FIELDS: &[(&str, &[FilterOperator])] = &[
    ("name", TEXT_OPS),
    ("stage", ENUM_OPS),
    ("amount", NUMBER_OPS),
    ("close_date", DATE_OPS),
    ("company.name", TEXT_OPS),
    ("company.industry", ENUM_OPS),
    ("contact.email", TEXT_OPS),
    ("created_at", DATE_OPS),
];

const ACTIVITY_FIELDS: &[(&str, &[FilterOperator])] = &[
    ("subject", TEXT_OPS),
    ("notes", TEXT_OPS),
    ("activity_type", ENUM_OPS),
    ("completed", FLAG_OPS),
    ("due_date", DATE_OPS),
    ("contact.email", TEXT_OPS),
    ("deal.name", TEXT_OPS),
    ("created_at", DATE_OPS),
];

const COMPANY_SEARCHABLE: &[&str] = &["name", "industry", "website", "city"];
const CONTACT_SEARCHABLE: &[&str] = &["first_name", "last_name", "email", "phone", "title"];
const DEAL_SEARCHABLE: &[&str] = &["name", "stage"];
const ACTIVITY_SEARCHABLE: &[&str] = &["subject", "notes"];

const COMPANY_SORTABLE: &[&str] = &["name", "size", "created_at", "updated_at"];
const CONTACT_SORTABLE: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "created_at",
    "last_contacted_at",
];
const DEAL_SORTABLE: &[&str] = &["name", "amount", "close_date", "created_at"];
const ACTIVITY_SORTABLE: &[&str] = &["subject", "due_date", "created_at"];

impl Entity {
    pub const ALL: &'static [Entity] = &[
        Entity::Companies,
        Entity::Contacts,
        Entity::Deals,
        Entity::Activities,
    ];

    /// Wire name of the entity (matches the serde rename)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Companies => "companies",
            Self::Contacts => "contacts",
            Self::Deals => "deals",
            Self::Activities => "activities",
        }
    }

    /// Capability matrix row: filterable fields and their allowed operators
    pub fn fields(&self) -> &'static [(&'static str, &'static [FilterOperator])] {
        match self {
            Self::Companies => COMPANY_FIELDS,
            Self::Contacts => CONTACT_FIELDS,
            Self::Deals => DEAL_FIELDS,
            Self::Activities => ACTIVITY_FIELDS,
        }
    }

    /// Fields matched by free-text search (OR of substring matches)
    pub fn searchable_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Companies => COMPANY_SEARCHABLE,
            Self::Contacts => CONTACT_SEARCHABLE,
            Self::Deals => DEAL_SEARCHABLE,
            Self::Activities => ACTIVITY_SEARCHABLE,
        }
    }

    /// Fields accepted in a sort specification
    pub fn sortable_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Companies => COMPANY_SORTABLE,
            Self::Contacts => CONTACT_SORTABLE,
            Self::Deals => DEAL_SORTABLE,
            Self::Activities => ACTIVITY_SORTABLE,
        }
    }

    /// Allowed operators for `field`, or `None` for an unknown field
    pub fn operators_for(&self, field: &str) -> Option<&'static [FilterOperator]> {
        self.fields()
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, ops)| *ops)
    }
}

impl FromStr for Entity {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|entity| entity.as_str() == s)
            .ok_or_else(|| {
                QueryError::bad_request("UNKNOWN_ENTITY", format!("unknown entity `{s}`"))
            })
    }
}

/// Capability check: is `operator` legal for `field` on `entity`?
///
/// Unknown fields return false.
pub fn is_allowed(entity: Entity, field: &str, operator: FilterOperator) -> bool {
    entity
        .operators_for(field)
        .is_some_and(|ops| ops.contains(&operator))
}

/// String-level capability check for callers holding raw wire values.
///
/// Unknown entity, field, or operator strings all return false.
pub fn is_allowed_str(entity: &str, field: &str, operator: &str) -> bool {
    let (Ok(entity), Ok(operator)) = (entity.parse::<Entity>(), operator.parse::<FilterOperator>())
    else {
        return false;
    };
    is_allowed(entity, field, operator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_wire_names_match_serde_renames() {
        for entity in Entity::ALL {
            let parsed: Entity = serde_json::from_value(json!(entity.as_str())).unwrap();
            assert_eq!(parsed, *entity);
        }
    }

    #[test]
    fn unknown_entity_string_is_rejected() {
        let err = "patients".parse::<Entity>().unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_ENTITY");
    }

    #[test]
    fn operators_for_known_field() {
        let ops = Entity::Contacts.operators_for("email").unwrap();
        assert!(ops.contains(&Contains));
        assert!(ops.contains(&IsNotEmpty));
        assert!(!ops.contains(&Gt));
    }

    #[test]
    fn operators_for_unknown_field_fails_closed() {
        assert!(Entity::Contacts.operators_for("password").is_none());
        assert!(!is_allowed(Entity::Contacts, "password", Equals));
    }

    #[test]
    fn dotted_relation_fields_are_registered() {
        assert!(is_allowed(Entity::Contacts, "company.industry", Equals));
        assert!(is_allowed(Entity::Deals, "contact.email", Contains));
        assert!(!is_allowed(Entity::Companies, "company.industry", Equals));
    }

    #[test]
    fn date_fields_reject_substring_operators() {
        assert!(is_allowed(Entity::Deals, "close_date", DateRelative));
        assert!(!is_allowed(Entity::Deals, "close_date", Contains));
    }

    #[test]
    fn flag_fields_only_support_equality() {
        assert!(is_allowed(Entity::Activities, "completed", Equals));
        assert!(!is_allowed(Entity::Activities, "completed", In));
        assert!(!is_allowed(Entity::Activities, "completed", IsEmpty));
    }

    #[test]
    fn string_level_lookup_fails_closed() {
        assert!(is_allowed_str("contacts", "email", "contains"));
        assert!(!is_allowed_str("patients", "email", "contains"));
        assert!(!is_allowed_str("contacts", "email", "regex_match"));
        assert!(!is_allowed_str("contacts", "bogus", "contains"));
    }

    #[test]
    fn searchable_fields_are_filterable_text_fields() {
        for entity in Entity::ALL {
            for field in entity.searchable_fields() {
                let ops = entity
                    .operators_for(field)
                    .unwrap_or_else(|| panic!("searchable field {field} missing from matrix"));
                assert!(ops.contains(&Contains) || ops.contains(&Equals));
            }
        }
    }

    #[test]
    fn sortable_fields_are_in_the_matrix() {
        for entity in Entity::ALL {
            for field in entity.sortable_fields() {
                assert!(
                    entity.operators_for(field).is_some(),
                    "sortable field {field} missing from matrix"
                );
            }
        }
    }
}
