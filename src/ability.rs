//! Abilities and their owners.
//!
//! An [`AbilityDef`] is the shared, immutable description (tag lists and
//! gating predicates). Granting it to an [`AbilitySystem`] creates an
//! instance addressed by an [`AbilityHandle`]; each instance is either
//! inactive or active. The activation protocol itself lives in
//! [`activation`](crate::activation).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activation::ActivationContext;
use crate::error::ActivationError;
use crate::predicate::TagRequirements;
use crate::tag::TagId;
use crate::tag_set::{TagChange, TagSet};

/// Identity of a tag holder (an ability system, a target, a source).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

/// Anything that holds runtime tags and can be a source or target.
pub trait TagOwner {
    fn owner_id(&self) -> OwnerId;

    fn owned_tags(&self) -> &TagSet;
}

/// Custom activation check supplied by an ability definition.
///
/// All conditions of a definition are evaluated in order and all must pass.
pub trait ActivationCondition: Send + Sync {
    fn evaluate(&self, ctx: &ActivationContext<'_>) -> bool;
}

/// How an owner accounts for tags granted by several sources at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantMode {
    /// Revoking removes the tag outright, even if another active source
    /// granted the same tag.
    #[default]
    Plain,
    /// Each grant increments a counter; the tag leaves the set at zero.
    Counted,
}

/// Shared description of an ability.
#[derive(Default)]
pub struct AbilityDef {
    pub name: String,
    /// Tag other abilities block or cancel on.
    pub identity_tag: Option<TagId>,
    /// Active abilities on the owner whose identity tag is listed here are
    /// ended when this ability activates.
    pub cancel_with_tags: TagSet,
    /// While this ability is active, abilities whose identity tag is listed
    /// here cannot activate on the same owner.
    pub block_with_tags: TagSet,
    /// Granted to the owner while active.
    pub activation_tags: TagSet,
    pub owner_tags: TagRequirements,
    pub source_tags: TagRequirements,
    /// Targets failing this are dropped from the activation, not rejected.
    pub target_tags: TagRequirements,
    pub conditions: Vec<Box<dyn ActivationCondition>>,
}

impl fmt::Debug for AbilityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityDef")
            .field("name", &self.name)
            .field("identity_tag", &self.identity_tag)
            .field("cancel_with_tags", &self.cancel_with_tags)
            .field("block_with_tags", &self.block_with_tags)
            .field("activation_tags", &self.activation_tags)
            .field("owner_tags", &self.owner_tags)
            .field("source_tags", &self.source_tags)
            .field("target_tags", &self.target_tags)
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

impl AbilityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn identity(mut self, tag: TagId) -> Self {
        self.identity_tag = Some(tag);
        self
    }

    pub fn cancel_with(mut self, tag: TagId) -> Self {
        self.cancel_with_tags.add(tag);
        self
    }

    pub fn block_with(mut self, tag: TagId) -> Self {
        self.block_with_tags.add(tag);
        self
    }

    pub fn grants(mut self, tag: TagId) -> Self {
        self.activation_tags.add(tag);
        self
    }

    pub fn owner_requirements(mut self, req: TagRequirements) -> Self {
        self.owner_tags = req;
        self
    }

    pub fn source_requirements(mut self, req: TagRequirements) -> Self {
        self.source_tags = req;
        self
    }

    pub fn target_requirements(mut self, req: TagRequirements) -> Self {
        self.target_tags = req;
        self
    }

    pub fn condition(mut self, condition: impl ActivationCondition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn into_shared(self) -> Arc<AbilityDef> {
        Arc::new(self)
    }
}

/// Handle to an ability instance granted to one owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AbilityHandle {
    owner: OwnerId,
    slot: u32,
}

impl AbilityHandle {
    #[inline]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivationState {
    #[default]
    Inactive,
    Active,
}

/// One granted instance of an [`AbilityDef`].
#[derive(Debug)]
pub struct AbilitySpec {
    def: Arc<AbilityDef>,
    state: ActivationState,
    targets: Vec<OwnerId>,
}

impl AbilitySpec {
    pub fn def(&self) -> &AbilityDef {
        &self.def
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == ActivationState::Active
    }
}

/// An owner of runtime tags and granted abilities.
#[derive(Debug)]
pub struct AbilitySystem {
    id: OwnerId,
    tags: TagSet,
    grant_mode: GrantMode,
    grant_counts: HashMap<TagId, u32>,
    abilities: Vec<Option<AbilitySpec>>,
}

impl TagOwner for AbilitySystem {
    fn owner_id(&self) -> OwnerId {
        self.id
    }

    fn owned_tags(&self) -> &TagSet {
        &self.tags
    }
}

impl AbilitySystem {
    pub fn new(id: OwnerId) -> Self {
        Self::with_grant_mode(id, GrantMode::default())
    }

    pub fn with_grant_mode(id: OwnerId, grant_mode: GrantMode) -> Self {
        Self {
            id,
            tags: TagSet::new(),
            grant_mode,
            grant_counts: HashMap::new(),
            abilities: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> OwnerId {
        self.id
    }

    #[inline]
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    #[inline]
    pub fn grant_mode(&self) -> GrantMode {
        self.grant_mode
    }

    // =========================================================================
    // Runtime tags
    // =========================================================================

    /// Grant a single loose tag. `None` if the set did not change.
    pub fn add_tag(&mut self, tag: TagId) -> Option<TagChange> {
        self.grant(tag)
    }

    /// Revoke a single loose tag. `None` if the set did not change.
    pub fn remove_tag(&mut self, tag: TagId) -> Option<TagChange> {
        self.revoke(tag)
    }

    /// Grant every tag of `tags` according to the grant mode.
    pub fn grant_tags(&mut self, tags: &TagSet) -> Vec<TagChange> {
        tags.iter().filter_map(|t| self.grant(t)).collect()
    }

    /// Revoke every tag of `tags` according to the grant mode.
    pub fn revoke_tags(&mut self, tags: &TagSet) -> Vec<TagChange> {
        tags.iter().filter_map(|t| self.revoke(t)).collect()
    }

    fn grant(&mut self, tag: TagId) -> Option<TagChange> {
        if self.grant_mode == GrantMode::Counted {
            *self.grant_counts.entry(tag).or_insert(0) += 1;
        }
        self.tags.add(tag).then(|| TagChange::added(tag))
    }

    fn revoke(&mut self, tag: TagId) -> Option<TagChange> {
        if self.grant_mode == GrantMode::Counted
            && let Some(count) = self.grant_counts.get_mut(&tag)
        {
            *count -= 1;
            if *count > 0 {
                return None;
            }
            self.grant_counts.remove(&tag);
        }
        self.tags.remove(tag).then(|| TagChange::removed(tag))
    }

    // =========================================================================
    // Abilities
    // =========================================================================

    /// Grant an ability instance. It starts inactive.
    pub fn give_ability(&mut self, def: Arc<AbilityDef>) -> AbilityHandle {
        let handle = AbilityHandle {
            owner: self.id,
            slot: self.abilities.len() as u32,
        };
        debug!(owner = ?self.id, ability = %def.name, "granted ability");
        self.abilities.push(Some(AbilitySpec {
            def,
            state: ActivationState::Inactive,
            targets: Vec::new(),
        }));
        handle
    }

    /// Remove an ability instance, ending it first if it is active.
    pub fn revoke_ability(&mut self, handle: AbilityHandle) -> Result<Vec<TagChange>, ActivationError> {
        let changes = if self.spec_checked(handle)?.is_active() {
            self.deactivate(handle)
        } else {
            Vec::new()
        };
        self.abilities[handle.slot as usize] = None;
        debug!(owner = ?self.id, ?handle, "revoked ability");
        Ok(changes)
    }

    pub fn spec(&self, handle: AbilityHandle) -> Option<&AbilitySpec> {
        if handle.owner != self.id {
            return None;
        }
        self.abilities.get(handle.slot as usize).and_then(Option::as_ref)
    }

    pub fn is_active(&self, handle: AbilityHandle) -> bool {
        self.spec(handle).is_some_and(AbilitySpec::is_active)
    }

    /// Targets kept by the current activation of `handle`.
    pub fn active_targets(&self, handle: AbilityHandle) -> Result<&[OwnerId], ActivationError> {
        let spec = self.spec_checked(handle)?;
        if !spec.is_active() {
            return Err(ActivationError::NotActive(handle));
        }
        Ok(&spec.targets)
    }

    /// Every granted ability instance.
    pub fn granted(&self) -> impl Iterator<Item = (AbilityHandle, &AbilitySpec)> + '_ {
        let owner = self.id;
        self.abilities.iter().enumerate().filter_map(move |(slot, spec)| {
            spec.as_ref().map(|s| {
                (
                    AbilityHandle {
                        owner,
                        slot: slot as u32,
                    },
                    s,
                )
            })
        })
    }

    pub fn active(&self) -> impl Iterator<Item = (AbilityHandle, &AbilitySpec)> + '_ {
        self.granted().filter(|(_, spec)| spec.is_active())
    }

    /// Look up `handle`, treating a foreign handle as a programmer error.
    pub(crate) fn spec_checked(&self, handle: AbilityHandle) -> Result<&AbilitySpec, ActivationError> {
        debug_assert_eq!(
            handle.owner, self.id,
            "ability handle used on an owner that did not issue it"
        );
        self.spec(handle)
            .ok_or(ActivationError::UnknownAbility(handle))
    }

    /// Mark active, record targets, and grant the activation tags.
    pub(crate) fn activate(&mut self, handle: AbilityHandle, targets: Vec<OwnerId>) -> Vec<TagChange> {
        let Some(spec) = self.slot_mut(handle) else {
            return Vec::new();
        };
        spec.state = ActivationState::Active;
        spec.targets = targets;
        let def = Arc::clone(&spec.def);
        self.grant_tags(&def.activation_tags)
    }

    /// Mark inactive and revoke the activation tags. No-op when inactive.
    pub(crate) fn deactivate(&mut self, handle: AbilityHandle) -> Vec<TagChange> {
        let Some(spec) = self.slot_mut(handle) else {
            return Vec::new();
        };
        if !spec.is_active() {
            return Vec::new();
        }
        spec.state = ActivationState::Inactive;
        spec.targets.clear();
        let def = Arc::clone(&spec.def);
        self.revoke_tags(&def.activation_tags)
    }

    fn slot_mut(&mut self, handle: AbilityHandle) -> Option<&mut AbilitySpec> {
        if handle.owner != self.id {
            return None;
        }
        self.abilities.get_mut(handle.slot as usize).and_then(Option::as_mut)
    }
}
