//! Organizations, locations, policies, and bookmarks.

use chrono::Utc;

use lifetip_core::{PolicyId, Toggled, UserId};
use lifetip_infra::StoreError;
use lifetip_policies::{
    Bookmark, Location, NewLocation, NewOrganization, NewPolicy, Organization, Policy, PolicyQuery,
};

use super::{AppServices, ServiceResult};
use crate::app::errors::ApiError;

/// Policy detail with the names of its organization and location.
#[derive(Debug, Clone)]
pub struct PolicyDetail {
    pub policy: Policy,
    pub organization: Option<Organization>,
    pub location: Option<Location>,
}

impl AppServices {
    pub async fn list_organizations(&self) -> ServiceResult<Vec<Organization>> {
        Ok(self.store.list_organizations().await?)
    }

    pub async fn create_organization(&self, new: NewOrganization) -> ServiceResult<Organization> {
        let organization = Organization::create(new, Utc::now());
        match self.store.insert_organization(&organization).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(ApiError::Duplicate("organization name already exists".to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(organization_id = %organization.id, "organization created");
        Ok(organization)
    }

    pub async fn list_locations(&self) -> ServiceResult<Vec<Location>> {
        Ok(self.store.list_locations().await?)
    }

    pub async fn create_location(&self, new: NewLocation) -> ServiceResult<Location> {
        let location = Location::create(new, Utc::now());
        match self.store.insert_location(&location).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(ApiError::Duplicate("location name already exists".to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(location_id = %location.id, "location created");
        Ok(location)
    }

    pub async fn list_policies(&self, query: &PolicyQuery) -> ServiceResult<Vec<Policy>> {
        Ok(self.store.list_policies(query).await?)
    }

    pub async fn get_policy(&self, policy_id: PolicyId) -> ServiceResult<PolicyDetail> {
        let policy = self
            .store
            .find_policy(policy_id)
            .await?
            .ok_or(ApiError::NotFound("policy"))?;
        let organization = self.store.find_organization(policy.organization_id).await?;
        let location = self.store.find_location(policy.location_id).await?;
        Ok(PolicyDetail {
            policy,
            organization,
            location,
        })
    }

    pub async fn create_policy(&self, new: NewPolicy) -> ServiceResult<Policy> {
        if self.store.find_organization(new.organization_id).await?.is_none() {
            return Err(ApiError::NotFound("organization"));
        }
        if self.store.find_location(new.location_id).await?.is_none() {
            return Err(ApiError::NotFound("location"));
        }
        let policy = Policy::create(new, Utc::now());
        self.store.insert_policy(&policy).await?;
        tracing::info!(policy_id = %policy.id, "policy created");
        Ok(policy)
    }

    /// Bookmark if not bookmarked, remove the bookmark otherwise.
    pub async fn toggle_bookmark(&self, user_id: UserId, policy_id: PolicyId) -> ServiceResult<Toggled> {
        if self.store.find_policy(policy_id).await?.is_none() {
            return Err(ApiError::NotFound("policy"));
        }
        if self.store.bookmark_exists(user_id, policy_id).await? {
            self.store.delete_bookmark(user_id, policy_id).await?;
            tracing::info!(policy_id = %policy_id, user_id = %user_id, "bookmark removed");
            return Ok(Toggled::Off);
        }

        let bookmark = Bookmark::new(user_id, policy_id, Utc::now());
        match self.store.insert_bookmark(&bookmark).await {
            Ok(()) | Err(StoreError::Duplicate(_)) => {}
            Err(StoreError::MissingReference(_)) => {
                return Err(self.missing_parent(user_id, "policy").await);
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(policy_id = %policy_id, user_id = %user_id, "bookmark added");
        Ok(Toggled::On)
    }
}
