//! Effect hooks that touch an owner's tags.
//!
//! Effects carry a list of hooks; each hook reacts to the effect being
//! applied to or removed from an owner.

use std::fmt;

use tracing::trace;

use crate::ability::AbilitySystem;
use crate::tag_set::{TagChange, TagSet};

pub trait EffectHook: Send + Sync {
    fn on_applied(&self, target: &mut AbilitySystem) -> Vec<TagChange>;

    fn on_removed(&self, target: &mut AbilitySystem) -> Vec<TagChange>;
}

/// Grants its tags while the effect is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantTagsOnApplied {
    pub tags: TagSet,
}

impl GrantTagsOnApplied {
    pub fn new(tags: TagSet) -> Self {
        Self { tags }
    }
}

impl EffectHook for GrantTagsOnApplied {
    fn on_applied(&self, target: &mut AbilitySystem) -> Vec<TagChange> {
        target.grant_tags(&self.tags)
    }

    fn on_removed(&self, target: &mut AbilitySystem) -> Vec<TagChange> {
        target.revoke_tags(&self.tags)
    }
}

/// A named list of hooks applied together.
#[derive(Default)]
pub struct EffectDef {
    pub name: String,
    pub hooks: Vec<Box<dyn EffectHook>>,
}

impl fmt::Debug for EffectDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectDef")
            .field("name", &self.name)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl EffectDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: Vec::new(),
        }
    }

    pub fn hook(mut self, hook: impl EffectHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Run every hook's `on_applied` in order.
    pub fn apply(&self, target: &mut AbilitySystem) -> Vec<TagChange> {
        trace!(effect = %self.name, owner = ?target.id(), "effect applied");
        self.hooks
            .iter()
            .flat_map(|h| h.on_applied(target))
            .collect()
    }

    /// Run every hook's `on_removed` in reverse order.
    pub fn remove(&self, target: &mut AbilitySystem) -> Vec<TagChange> {
        trace!(effect = %self.name, owner = ?target.id(), "effect removed");
        let mut changes = Vec::new();
        for hook in self.hooks.iter().rev() {
            changes.extend(hook.on_removed(target));
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{GrantMode, OwnerId};
    use crate::TagRegistry;

    #[test]
    fn grant_hook_adds_and_removes() {
        let mut reg = TagRegistry::new();
        let burning = reg.add_tag("Status.Burning").unwrap();
        let mut sys = AbilitySystem::new(OwnerId(1));
        let effect = EffectDef::new("Ignite").hook(GrantTagsOnApplied::new(TagSet::single(burning)));

        assert_eq!(effect.apply(&mut sys), vec![TagChange::added(burning)]);
        assert!(sys.tags().contains(burning));
        assert_eq!(effect.remove(&mut sys), vec![TagChange::removed(burning)]);
        assert!(sys.tags().is_empty());
    }

    #[test]
    fn stacked_effects_under_counted_grants() {
        let mut reg = TagRegistry::new();
        let burning = reg.add_tag("Status.Burning").unwrap();
        let mut sys = AbilitySystem::with_grant_mode(OwnerId(1), GrantMode::Counted);
        let effect = EffectDef::new("Ignite").hook(GrantTagsOnApplied::new(TagSet::single(burning)));

        effect.apply(&mut sys);
        assert!(effect.apply(&mut sys).is_empty());
        assert!(effect.remove(&mut sys).is_empty());
        assert!(sys.tags().contains(burning));
        effect.remove(&mut sys);
        assert!(!sys.tags().contains(burning));
    }
}
