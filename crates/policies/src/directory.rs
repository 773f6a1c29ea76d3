//! Organizations and locations: reference data policies point at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lifetip_core::{DomainResult, LocationId, OrganizationId, text};

pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// A public body that runs policies (city hall, district office, agency).
///
/// `name` is unique across organizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn create(new: NewOrganization, now: DateTime<Utc>) -> Self {
        Self {
            id: OrganizationId::new(),
            name: new.name,
            description: new.description,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganization {
    pub name: String,
    pub description: Option<String>,
}

impl NewOrganization {
    pub fn new(name: &str, description: Option<&str>) -> DomainResult<Self> {
        Ok(Self {
            name: text::bounded("name", name, 1, NAME_MAX_CHARS)?,
            description: text::optional("description", description, DESCRIPTION_MAX_CHARS)?,
        })
    }
}

/// A city or district. `name` is unique across locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn create(new: NewLocation, now: DateTime<Utc>) -> Self {
        Self {
            id: LocationId::new(),
            name: new.name,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocation {
    pub name: String,
}

impl NewLocation {
    pub fn new(name: &str) -> DomainResult<Self> {
        Ok(Self {
            name: text::bounded("name", name, 1, NAME_MAX_CHARS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_description_is_optional() {
        let org = NewOrganization::new(" Seoul City ", Some("  ")).unwrap();
        assert_eq!(org.name, "Seoul City");
        assert_eq!(org.description, None);
    }

    #[test]
    fn location_name_required() {
        assert!(NewLocation::new("").is_err());
        assert_eq!(NewLocation::new("Mapo-gu").unwrap().name, "Mapo-gu");
    }
}
