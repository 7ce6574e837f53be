//! Per-event working copies of input collections

use std::ops::{Deref, DerefMut};

use ordered_float::OrderedFloat;
use units::gev_;

use crate::record::{ObjectInfo, Particle};

/// Ordered, event-scoped sequence of objects of one kind.
///
/// Built as a copy of a read-only input slice: every element remembers its
/// position in the input so that the uncalibrated object stays reachable.
/// Dropping the collection releases the copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Collection<I> {
    items: Vec<Particle<I>>,
}

impl<I: ObjectInfo> Collection<I> {

    pub fn working_copy(input: &[Particle<I>]) -> Self {
        Self {
            items: input.iter()
                .enumerate()
                .map(|(index, p)| Particle::copy_of(p, index))
                .collect()
        }
    }

    /// Objects satisfying `keep`, in collection order
    pub fn select(&self, keep: impl Fn(&Particle<I>) -> bool) -> Vec<&Particle<I>> {
        self.items.iter().filter(|p| keep(p)).collect()
    }

    /// Objects satisfying `keep`, highest pt first
    pub fn select_by_pt(&self, keep: impl Fn(&Particle<I>) -> bool) -> Vec<&Particle<I>> {
        let mut selected = self.select(keep);
        selected.sort_by_key(|p| std::cmp::Reverse(OrderedFloat(gev_(p.pt()))));
        selected
    }

    pub fn count(&self, keep: impl Fn(&Particle<I>) -> bool) -> usize {
        self.items.iter().filter(|p| keep(p)).count()
    }
}

#[cfg(test)]
impl<I: ObjectInfo> Collection<I> {
    /// Working copy which keeps the decorations already present on `input`
    pub(crate) fn decorated_copy(input: Vec<Particle<I>>) -> Self {
        let mut copy = Self::working_copy(&input);
        for (c, original) in copy.items.iter_mut().zip(&input) { c.deco = original.deco }
        copy
    }
}

impl<I> Deref for Collection<I> {
    type Target = [Particle<I>];
    fn deref(&self) -> &Self::Target { &self.items }
}

impl<I> DerefMut for Collection<I> {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.items }
}
