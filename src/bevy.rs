//! Bevy integration for gameplay tags.
//!
//! Provides:
//! - `GameplayTagPlugin`: builder-pattern plugin that seeds the registry as a Resource
//! - `OwnedTags`: per-entity runtime tag set component
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use gameplay_tags::bevy::*;
//! use gameplay_tags::{TagRegistry, TagSet};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(GameplayTagPlugin::from_paths(["Combat.Melee", "Status.Stun"]))
//!         .add_systems(Startup, spawn_entities)
//!         .run();
//! }
//!
//! fn spawn_entities(mut commands: Commands, registry: Res<TagRegistry>) {
//!     let stun = registry.require_tag("Status.Stun").unwrap();
//!     commands.spawn(OwnedTags::new(TagSet::single(stun)));
//! }
//! ```

use std::ops::{Deref, DerefMut};

use bevy::prelude::*;
use tracing::error;

use crate::{config::RegistryConfig, registry::TagRegistry, tag_set::TagSet};

// =============================================================================
// Plugin
// =============================================================================

/// Bevy plugin for the gameplay tag registry.
///
/// ```ignore
/// App::new()
///     .add_plugins(
///         GameplayTagPlugin::from_paths(["Combat.Melee"])
///             .with_config(RegistryConfig::with_max_depth(6))
///     )
/// ```
#[derive(Default)]
pub struct GameplayTagPlugin {
    paths: Vec<String>,
    config: RegistryConfig,
}

impl GameplayTagPlugin {
    /// Plugin with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry with these dotted paths. Ancestors are created as
    /// needed.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            config: RegistryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    fn build_registry(&self) -> TagRegistry {
        let mut registry = TagRegistry::with_config(self.config);
        for path in &self.paths {
            // Bad seed paths are skipped so one typo does not take the app down.
            if let Err(err) = registry.add_tag(path) {
                error!(path = %path, %err, "skipping seed tag");
            }
        }
        registry
    }
}

impl Plugin for GameplayTagPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.build_registry());
        app.insert_resource(TagRegistryConfig(self.config));
    }
}

/// Configuration the registry resource was built with.
#[derive(Resource, Clone, Debug, Default, PartialEq, Eq)]
pub struct TagRegistryConfig(pub RegistryConfig);

// =============================================================================
// OwnedTags Component
// =============================================================================

/// Runtime tags held by an entity.
#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnedTags(pub TagSet);

impl OwnedTags {
    #[inline]
    pub fn new(tags: TagSet) -> Self {
        Self(tags)
    }
}

impl Deref for OwnedTags {
    type Target = TagSet;

    fn deref(&self) -> &TagSet {
        &self.0
    }
}

impl DerefMut for OwnedTags {
    fn deref_mut(&mut self) -> &mut TagSet {
        &mut self.0
    }
}

// =============================================================================
// Resource impl for TagRegistry
// =============================================================================

impl Resource for TagRegistry {}
