//! # Gameplay Tags
//!
//! Hierarchical gameplay tags and the ability activation rules built on them.
//!
//! ## Design
//!
//! Tags form a forest of dotted paths (`Combat.Melee.Slash`). The
//! [`TagRegistry`] owns the forest and is the only place tags are created,
//! renamed, reparented or deleted; everything else refers to tags by
//! [`TagId`], a stable arena index.
//!
//! ```text
//! Combat            Status
//! ├── Melee         ├── Stun
//! │   └── Slash     └── Burning
//! └── Ranged
//! ```
//!
//! Runtime state lives in [`TagSet`]s. Membership in a set is exact:
//! holding `Combat.Melee` does not imply holding `Combat`. Hierarchy-aware
//! queries take the registry explicitly:
//!
//! ```ignore
//! use gameplay_tags::{TagRegistry, TagSet};
//!
//! let mut registry = TagRegistry::new();
//! let slash = registry.add_tag("Combat.Melee.Slash")?;
//! let combat = registry.require_tag("Combat")?;
//!
//! let held = TagSet::single(slash);
//! assert!(!held.contains(combat));
//! assert!(held.has_descendant_of(&registry, combat));
//! ```
//!
//! ## Abilities
//!
//! An [`AbilitySystem`] owns runtime tags and granted abilities. The
//! [`ActivationCoordinator`] gates activation with [`TagRequirements`],
//! blocks and cancels other abilities by identity tag, and grants the
//! ability's activation tags while it runs.

pub mod ability;
pub mod activation;
pub mod bevy;
pub mod config;
pub mod effect;
pub mod error;
pub mod predicate;
pub mod registry;
pub mod store;
pub mod tag;
pub mod tag_set;

pub use ability::{
    AbilityDef, AbilityHandle, AbilitySpec, AbilitySystem, ActivationCondition, ActivationState,
    GrantMode, OwnerId, TagOwner,
};
pub use activation::{
    Activation, ActivationContext, ActivationCoordinator, AlwaysValid, DisabledOwners, OwnerProbe,
};
pub use config::{RegistryConfig, DEFAULT_MAX_DEPTH};
pub use effect::{EffectDef, EffectHook, GrantTagsOnApplied};
pub use error::{ActivationError, TagError};
pub use predicate::TagRequirements;
pub use registry::TagRegistry;
pub use store::{MemoryTagStore, StoreError, TagStore};
pub use tag::{is_valid_segment, TagId, TagIter, TagRef};
pub use tag_set::{ChangeKind, TagChange, TagSet};

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';
