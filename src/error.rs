//! Error types for registry, store, and activation operations.

use thiserror::Error;

use crate::ability::AbilityHandle;
use crate::store::StoreError;

/// Structural failures reported by [`TagRegistry`](crate::TagRegistry).
///
/// Every variant is returned before the forest is touched, so a failed call
/// leaves the registry exactly as it was.
#[derive(Debug, Error)]
pub enum TagError {
    /// Empty segment or a character outside `[A-Za-z0-9]`.
    #[error("invalid tag name '{name}': segments must be non-empty and alphanumeric")]
    InvalidTagName { name: String },

    /// Another child of the same parent (or another root) already has this name.
    #[error("tag '{name}' already exists under '{parent}'")]
    DuplicateSibling { name: String, parent: String },

    /// The new parent is the tag itself or one of its descendants.
    #[error("cannot parent '{tag}' under '{parent}': would create a cycle")]
    CycleRejected { tag: String, parent: String },

    #[error("'{path}' would be {depth} levels deep (max {max})")]
    DepthExceeded {
        path: String,
        depth: usize,
        max: usize,
    },

    #[error("tag not found: {0}")]
    TagNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reasons an ability could not be activated, ended, or revoked.
///
/// Activation failures are not fatal: the ability stays inactive and the
/// caller may try again later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("ability {0:?} is already active")]
    AlreadyActive(AbilityHandle),

    #[error("ability {0:?} is not active")]
    NotActive(AbilityHandle),

    #[error("owner is not valid for activation")]
    OwnerInvalid,

    #[error("a custom activation condition rejected ability {0:?}")]
    ConditionRejected(AbilityHandle),

    #[error("owner tags do not satisfy ability {0:?}")]
    OwnerTagsUnsatisfied(AbilityHandle),

    #[error("source tags do not satisfy ability {0:?}")]
    SourceTagsUnsatisfied(AbilityHandle),

    /// Another active ability on the owner blocks this ability's identity tag.
    #[error("ability {blocked:?} is blocked by active ability {by:?}")]
    Blocked {
        blocked: AbilityHandle,
        by: AbilityHandle,
    },

    /// The handle was not issued by this owner, or the ability was revoked.
    #[error("ability {0:?} is not granted to this owner")]
    UnknownAbility(AbilityHandle),
}
