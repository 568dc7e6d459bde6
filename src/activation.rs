//! Activation protocol: gating, blocking, cancellation and tag grants.
//!
//! [`ActivationCoordinator::try_activate`] runs the checks in a fixed order
//! and reports the first failure. On success, abilities on the same owner
//! whose identity tag appears in the new ability's cancel list are ended
//! first, then the new ability's activation tags are granted.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::ability::{AbilityHandle, AbilitySystem, OwnerId, TagOwner};
use crate::error::ActivationError;
use crate::tag_set::TagChange;

/// Answers whether an owner may run abilities right now (not disabled,
/// not destroyed).
pub trait OwnerProbe: Send + Sync {
    fn is_valid(&self, owner: OwnerId) -> bool;
}

/// Probe that accepts every owner.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysValid;

impl OwnerProbe for AlwaysValid {
    fn is_valid(&self, _owner: OwnerId) -> bool {
        true
    }
}

/// Probe backed by an explicit set of disabled owners.
#[derive(Clone, Debug, Default)]
pub struct DisabledOwners {
    disabled: HashSet<OwnerId>,
}

impl DisabledOwners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable(&mut self, owner: OwnerId) {
        self.disabled.insert(owner);
    }

    pub fn enable(&mut self, owner: OwnerId) {
        self.disabled.remove(&owner);
    }
}

impl OwnerProbe for DisabledOwners {
    fn is_valid(&self, owner: OwnerId) -> bool {
        !self.disabled.contains(&owner)
    }
}

/// What a custom [`ActivationCondition`](crate::ActivationCondition) sees.
pub struct ActivationContext<'a> {
    pub owner: &'a AbilitySystem,
    pub ability: AbilityHandle,
    /// The instigator. Defaults to the owner when none was given.
    pub source: &'a dyn TagOwner,
}

/// Outcome of a successful activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activation {
    pub ability: AbilityHandle,
    /// Abilities ended by the cancel list, in grant order.
    pub cancelled: Vec<AbilityHandle>,
    /// Tag changes on the owner: cancellation removals first, then grants.
    pub changes: Vec<TagChange>,
    /// Targets that passed the target requirements.
    pub targets: Vec<OwnerId>,
}

/// Runs activations against one [`OwnerProbe`].
///
/// The probe is owned, so a [`DisabledOwners`] can be updated in place
/// through [`probe_mut`](Self::probe_mut).
#[derive(Debug)]
pub struct ActivationCoordinator<P = AlwaysValid> {
    probe: P,
}

impl Default for ActivationCoordinator<AlwaysValid> {
    fn default() -> Self {
        Self::new(AlwaysValid)
    }
}

impl<P: OwnerProbe> ActivationCoordinator<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }

    /// Run every rejecting check without changing anything.
    ///
    /// Order: already active, owner validity, custom conditions, owner
    /// requirements, source requirements, blocking.
    pub fn can_activate(
        &self,
        system: &AbilitySystem,
        handle: AbilityHandle,
        source: Option<&dyn TagOwner>,
    ) -> Result<(), ActivationError> {
        let spec = system.spec_checked(handle)?;
        if spec.is_active() {
            return Err(ActivationError::AlreadyActive(handle));
        }
        if !self.probe.is_valid(system.id()) {
            return Err(ActivationError::OwnerInvalid);
        }

        let def = spec.def();
        let source: &dyn TagOwner = match source {
            Some(source) => source,
            None => system,
        };
        let ctx = ActivationContext {
            owner: system,
            ability: handle,
            source,
        };
        if !def.conditions.iter().all(|c| c.evaluate(&ctx)) {
            return Err(ActivationError::ConditionRejected(handle));
        }

        if !def.owner_tags.satisfies(system.tags()) {
            return Err(ActivationError::OwnerTagsUnsatisfied(handle));
        }
        if !def.source_tags.satisfies(source.owned_tags()) {
            return Err(ActivationError::SourceTagsUnsatisfied(handle));
        }

        if let Some(identity) = def.identity_tag
            && let Some((by, _)) = system.active().find(|(other, spec)| {
                *other != handle && spec.def().block_with_tags.contains(identity)
            })
        {
            return Err(ActivationError::Blocked {
                blocked: handle,
                by,
            });
        }

        Ok(())
    }

    /// Activate `handle` on `system`.
    ///
    /// Targets failing the target requirements are dropped silently. On any
    /// rejection nothing changes.
    pub fn try_activate(
        &self,
        system: &mut AbilitySystem,
        handle: AbilityHandle,
        source: Option<&dyn TagOwner>,
        targets: &[&dyn TagOwner],
    ) -> Result<Activation, ActivationError> {
        if let Err(err) = self.can_activate(system, handle, source) {
            debug!(owner = ?system.id(), ?handle, %err, "activation rejected");
            return Err(err);
        }

        let (kept, cancelled) = {
            let spec = system.spec_checked(handle)?;
            let def = spec.def();
            let kept: Vec<OwnerId> = targets
                .iter()
                .filter(|t| def.target_tags.satisfies(t.owned_tags()))
                .map(|t| t.owner_id())
                .collect();
            let cancelled: Vec<AbilityHandle> = system
                .active()
                .filter(|(other, spec)| {
                    *other != handle
                        && spec
                            .def()
                            .identity_tag
                            .is_some_and(|id| def.cancel_with_tags.contains(id))
                })
                .map(|(other, _)| other)
                .collect();
            (kept, cancelled)
        };
        if kept.len() < targets.len() {
            trace!(
                ?handle,
                dropped = targets.len() - kept.len(),
                "targets filtered by requirements"
            );
        }

        let mut changes = Vec::new();
        for other in &cancelled {
            debug!(owner = ?system.id(), cancelled = ?other, by = ?handle, "cancelling ability");
            changes.extend(system.deactivate(*other));
        }
        changes.extend(system.activate(handle, kept.clone()));

        debug!(owner = ?system.id(), ?handle, targets = kept.len(), "ability activated");
        Ok(Activation {
            ability: handle,
            cancelled,
            changes,
            targets: kept,
        })
    }

    /// End an active ability and revoke its activation tags.
    ///
    /// Ending an inactive ability does nothing.
    pub fn end_activation(
        &self,
        system: &mut AbilitySystem,
        handle: AbilityHandle,
    ) -> Result<Vec<TagChange>, ActivationError> {
        if !system.spec_checked(handle)?.is_active() {
            return Ok(Vec::new());
        }
        debug!(owner = ?system.id(), ?handle, "ability ended");
        Ok(system.deactivate(handle))
    }
}
