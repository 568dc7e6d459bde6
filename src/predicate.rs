//! Require/ignore gating predicate.

use crate::tag::TagId;
use crate::tag_set::TagSet;

/// "All of `required`, none of `ignored`" evaluated against a target set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagRequirements {
    /// All of these must be present.
    pub required: TagSet,
    /// None of these may be present.
    pub ignored: TagSet,
}

impl TagRequirements {
    pub fn new(required: TagSet, ignored: TagSet) -> Self {
        Self { required, ignored }
    }

    pub fn require(mut self, tag: TagId) -> Self {
        self.required.add(tag);
        self
    }

    pub fn ignore(mut self, tag: TagId) -> Self {
        self.ignored.add(tag);
        self
    }

    /// True when neither half constrains anything.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.ignored.is_empty()
    }

    /// `target ⊇ required` and `target ∩ ignored = ∅`.
    ///
    /// Empty halves are vacuously satisfied.
    #[inline]
    pub fn satisfies(&self, target: &TagSet) -> bool {
        target.contains_all(&self.required) && !target.contains_any(&self.ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagRegistry;

    #[test]
    fn empty_requirements_accept_anything() {
        let mut reg = TagRegistry::new();
        let stun = reg.add_tag("Status.Stun").unwrap();
        let req = TagRequirements::default();
        assert!(req.is_empty());
        assert!(req.satisfies(&TagSet::new()));
        assert!(req.satisfies(&TagSet::single(stun)));
    }

    #[test]
    fn required_and_ignored_halves() {
        let mut reg = TagRegistry::new();
        let armed = reg.add_tag("State.Armed").unwrap();
        let stun = reg.add_tag("Status.Stun").unwrap();
        let req = TagRequirements::default().require(armed).ignore(stun);

        assert!(!req.satisfies(&TagSet::new()));
        assert!(req.satisfies(&TagSet::single(armed)));
        assert!(!req.satisfies(&TagSet::single(armed).with(stun)));
        assert!(!req.satisfies(&TagSet::single(stun)));

        let built = TagRequirements::new(TagSet::single(armed), TagSet::single(stun));
        assert_eq!(built, req);
    }

    #[test]
    fn ignored_rejects_on_any_single_match() {
        let mut reg = TagRegistry::new();
        let stun = reg.add_tag("Status.Stun").unwrap();
        let silence = reg.add_tag("Status.Silence").unwrap();
        let req = TagRequirements::default().ignore(stun).ignore(silence);

        // Holding only one ignored tag is enough to fail.
        assert!(!req.satisfies(&TagSet::single(silence)));
    }

    #[test]
    fn matching_is_exact_not_hierarchical() {
        let mut reg = TagRegistry::new();
        let sword = reg.add_tag("Weapon.Sword").unwrap();
        let weapon = reg.require_tag("Weapon").unwrap();
        let req = TagRequirements::default().require(weapon);
        assert!(!req.satisfies(&TagSet::single(sword)));
    }
}
