//! Primary profile and family members.
//!
//! The primary profile lives under its own key; family members share one
//! JSON array. Every write validates first so a rejected edit leaves the
//! stored data untouched.

use climahealth_health::{FamilyMember, HealthProfile, ProfileDraft};

use crate::error::{StoreError, StoreResult};
use crate::kv::{keys, load_json, save_json, SharedStore};

#[derive(Clone)]
pub struct ProfileStore {
    kv: SharedStore,
}

impl ProfileStore {
    pub fn new(kv: SharedStore) -> Self {
        Self { kv }
    }

    pub fn get_primary_profile(&self) -> StoreResult<Option<HealthProfile>> {
        load_json(self.kv.as_ref(), keys::PRIMARY_PROFILE)
    }

    /// Create the primary profile with a fresh id.
    ///
    /// An existing primary profile is replaced.
    pub fn create_profile(&self, draft: ProfileDraft) -> StoreResult<HealthProfile> {
        let profile = HealthProfile::create(draft)?;

        if let Some(existing) = self.get_primary_profile()? {
            tracing::warn!("Replacing primary profile {} with {}", existing.id, profile.id);
        }

        save_json(self.kv.as_ref(), keys::PRIMARY_PROFILE, &profile)?;
        tracing::debug!("Created primary profile {}", profile.id);
        Ok(profile)
    }

    pub fn add_family_member(
        &self,
        draft: ProfileDraft,
        relationship: &str,
    ) -> StoreResult<FamilyMember> {
        let member = FamilyMember::create(draft, relationship)?;

        let mut members = self.list_family_members()?;
        members.push(member.clone());
        save_json(self.kv.as_ref(), keys::FAMILY_PROFILES, &members)?;

        tracing::debug!("Added family member {} ({})", member.id(), member.relationship);
        Ok(member)
    }

    /// Replace the stored profile with the same id, primary or family.
    ///
    /// A family member keeps its relationship label.
    pub fn update_profile(&self, profile: HealthProfile) -> StoreResult<()> {
        profile.validate()?;
        let profile = profile.normalized();

        if let Some(primary) = self.get_primary_profile()? {
            if primary.id == profile.id {
                save_json(self.kv.as_ref(), keys::PRIMARY_PROFILE, &profile)?;
                tracing::debug!("Updated primary profile {}", profile.id);
                return Ok(());
            }
        }

        let mut members = self.list_family_members()?;
        let slot = members
            .iter_mut()
            .find(|m| m.id() == profile.id)
            .ok_or_else(|| StoreError::not_found(profile.id.clone()))?;
        slot.profile = profile;
        save_json(self.kv.as_ref(), keys::FAMILY_PROFILES, &members)?;
        tracing::debug!("Updated family member profile");
        Ok(())
    }

    pub fn update_family_member(&self, member: FamilyMember) -> StoreResult<()> {
        member.validate()?;
        let member = FamilyMember {
            profile: member.profile.normalized(),
            relationship: member.relationship.trim().to_string(),
        };

        let mut members = self.list_family_members()?;
        let slot = members
            .iter_mut()
            .find(|m| m.id() == member.id())
            .ok_or_else(|| StoreError::not_found(member.id().to_string()))?;
        *slot = member;
        save_json(self.kv.as_ref(), keys::FAMILY_PROFILES, &members)?;
        Ok(())
    }

    /// Delete a profile by id. Returns whether anything was removed.
    pub fn delete_profile(&self, id: &str) -> StoreResult<bool> {
        if let Some(primary) = self.get_primary_profile()? {
            if primary.id == id {
                self.kv.remove(keys::PRIMARY_PROFILE)?;
                tracing::debug!("Deleted primary profile {}", id);
                return Ok(true);
            }
        }

        let mut members = self.list_family_members()?;
        let before = members.len();
        members.retain(|m| m.id() != id);
        if members.len() == before {
            tracing::debug!("Delete of unknown profile {} ignored", id);
            return Ok(false);
        }

        save_json(self.kv.as_ref(), keys::FAMILY_PROFILES, &members)?;
        tracing::debug!("Deleted family member {}", id);
        Ok(true)
    }

    pub fn list_family_members(&self) -> StoreResult<Vec<FamilyMember>> {
        Ok(load_json(self.kv.as_ref(), keys::FAMILY_PROFILES)?.unwrap_or_default())
    }

    /// Look up the primary profile or a family member by id.
    pub fn get_profile(&self, id: &str) -> StoreResult<Option<HealthProfile>> {
        if let Some(primary) = self.get_primary_profile()? {
            if primary.id == id {
                return Ok(Some(primary));
            }
        }
        Ok(self
            .list_family_members()?
            .into_iter()
            .find(|m| m.id() == id)
            .map(|m| m.profile))
    }
}
