//! Block, cancel, grant and target filtering between abilities.

use gameplay_tags::*;

struct World {
    registry: TagRegistry,
    coordinator: ActivationCoordinator,
}

impl World {
    fn new(paths: &[&str]) -> Self {
        let mut registry = TagRegistry::new();
        for path in paths {
            registry.add_tag(path).unwrap();
        }
        Self {
            registry,
            coordinator: ActivationCoordinator::default(),
        }
    }

    fn tag(&self, path: &str) -> TagId {
        self.registry.require_tag(path).unwrap()
    }
}

struct Dummy {
    id: OwnerId,
    tags: TagSet,
}

impl TagOwner for Dummy {
    fn owner_id(&self) -> OwnerId {
        self.id
    }

    fn owned_tags(&self) -> &TagSet {
        &self.tags
    }
}

#[test]
fn blocker_prevents_activation_until_it_ends() {
    let world = World::new(&["Ability.Cast", "Ability.Guard"]);
    let cast = world.tag("Ability.Cast");

    let mut owner = AbilitySystem::new(OwnerId(1));
    let a = owner.give_ability(AbilityDef::new("Spell").identity(cast).into_shared());
    let b = owner.give_ability(
        AbilityDef::new("Guard")
            .identity(world.tag("Ability.Guard"))
            .block_with(cast)
            .into_shared(),
    );

    world.coordinator.try_activate(&mut owner, b, None, &[]).unwrap();
    let err = world
        .coordinator
        .try_activate(&mut owner, a, None, &[])
        .unwrap_err();
    assert_eq!(err, ActivationError::Blocked { blocked: a, by: b });
    assert!(!owner.is_active(a));

    world.coordinator.end_activation(&mut owner, b).unwrap();
    world.coordinator.try_activate(&mut owner, a, None, &[]).unwrap();
    assert!(owner.is_active(a));
}

#[test]
fn cancel_with_ends_the_stun() {
    let world = World::new(&["Status.Stun", "State.Stunned", "State.Cleansing"]);
    let stun_tag = world.tag("Status.Stun");
    let stunned = world.tag("State.Stunned");
    let cleansing = world.tag("State.Cleansing");

    let mut owner = AbilitySystem::new(OwnerId(1));
    let b = owner.give_ability(
        AbilityDef::new("Stun")
            .identity(stun_tag)
            .grants(stunned)
            .into_shared(),
    );
    let a = owner.give_ability(
        AbilityDef::new("Cleanse")
            .cancel_with(stun_tag)
            .grants(cleansing)
            .into_shared(),
    );

    world.coordinator.try_activate(&mut owner, b, None, &[]).unwrap();
    assert!(owner.tags().contains(stunned));

    let activation = world.coordinator.try_activate(&mut owner, a, None, &[]).unwrap();

    assert_eq!(activation.cancelled, vec![b]);
    assert!(!owner.is_active(b));
    assert!(owner.is_active(a));
    assert!(owner.tags().contains(cleansing));
    assert!(!owner.tags().contains(stunned));
    assert_eq!(
        activation.changes,
        vec![TagChange::removed(stunned), TagChange::added(cleansing)]
    );
    assert_eq!(
        world.registry.display_set(owner.tags()),
        "[State.Cleansing]"
    );
}

#[test]
fn target_filtering_keeps_only_flammable() {
    let world = World::new(&["Trait.Flammable"]);
    let flammable = world.tag("Trait.Flammable");

    let mut owner = AbilitySystem::new(OwnerId(1));
    let ignite = owner.give_ability(
        AbilityDef::new("Ignite")
            .target_requirements(TagRequirements::default().require(flammable))
            .into_shared(),
    );

    let log = Dummy {
        id: OwnerId(2),
        tags: TagSet::single(flammable),
    };
    let rock = Dummy {
        id: OwnerId(3),
        tags: TagSet::new(),
    };

    let activation = world
        .coordinator
        .try_activate(&mut owner, ignite, None, &[&log, &rock])
        .unwrap();
    assert_eq!(activation.targets, vec![OwnerId(2)]);
    assert_eq!(owner.active_targets(ignite).unwrap(), &[OwnerId(2)]);
}

#[test]
fn other_ability_systems_can_be_targets_and_sources() {
    let world = World::new(&["Team.Red", "Team.Blue"]);
    let red = world.tag("Team.Red");
    let blue = world.tag("Team.Blue");

    let mut healer = AbilitySystem::new(OwnerId(1));
    healer.add_tag(red);
    let heal = healer.give_ability(
        AbilityDef::new("Heal")
            .source_requirements(TagRequirements::default().require(red))
            .target_requirements(TagRequirements::default().require(red))
            .into_shared(),
    );

    let mut ally = AbilitySystem::new(OwnerId(2));
    ally.add_tag(red);
    let mut enemy = AbilitySystem::new(OwnerId(3));
    enemy.add_tag(blue);

    let activation = world
        .coordinator
        .try_activate(&mut healer, heal, Some(&ally), &[&ally, &enemy])
        .unwrap();
    assert_eq!(activation.targets, vec![OwnerId(2)]);

    world.coordinator.end_activation(&mut healer, heal).unwrap();
    let err = world
        .coordinator
        .try_activate(&mut healer, heal, Some(&enemy), &[])
        .unwrap_err();
    assert_eq!(err, ActivationError::SourceTagsUnsatisfied(heal));
}

#[test]
fn effects_feed_activation_requirements() {
    let world = World::new(&["Status.Silenced"]);
    let silenced = world.tag("Status.Silenced");

    let mut owner = AbilitySystem::new(OwnerId(1));
    let spell = owner.give_ability(
        AbilityDef::new("Spell")
            .owner_requirements(TagRequirements::default().ignore(silenced))
            .into_shared(),
    );
    let silence = EffectDef::new("Silence").hook(GrantTagsOnApplied::new(TagSet::single(silenced)));

    silence.apply(&mut owner);
    assert_eq!(
        world.coordinator.can_activate(&owner, spell, None),
        Err(ActivationError::OwnerTagsUnsatisfied(spell))
    );

    silence.remove(&mut owner);
    assert_eq!(world.coordinator.can_activate(&owner, spell, None), Ok(()));
}

#[test]
fn disabled_owner_cannot_activate() {
    let mut probe = DisabledOwners::new();
    probe.disable(OwnerId(7));
    let coordinator = ActivationCoordinator::new(probe);

    let mut owner = AbilitySystem::new(OwnerId(7));
    let dash = owner.give_ability(AbilityDef::new("Dash").into_shared());
    assert_eq!(
        coordinator.try_activate(&mut owner, dash, None, &[]),
        Err(ActivationError::OwnerInvalid)
    );
}

struct RequiresTargetSource;

impl ActivationCondition for RequiresTargetSource {
    fn evaluate(&self, ctx: &ActivationContext<'_>) -> bool {
        ctx.source.owner_id() != ctx.owner.id()
    }
}

#[test]
fn conditions_see_the_source() {
    let coordinator = ActivationCoordinator::default();
    let mut owner = AbilitySystem::new(OwnerId(1));
    let counter = owner.give_ability(
        AbilityDef::new("Counter")
            .condition(RequiresTargetSource)
            .into_shared(),
    );
    let attacker = Dummy {
        id: OwnerId(2),
        tags: TagSet::new(),
    };

    assert_eq!(
        coordinator.can_activate(&owner, counter, None),
        Err(ActivationError::ConditionRejected(counter))
    );
    assert!(coordinator.try_activate(&mut owner, counter, Some(&attacker), &[]).is_ok());
}
