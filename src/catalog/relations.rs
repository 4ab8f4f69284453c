//! Both directions of every catalog relationship, kept in one place.
//!
//! Records never point at each other. A relationship is stored once here and
//! each side reads it through a view, so the two directions cannot drift.

use std::collections::HashMap;
use std::hash::Hash;

use super::keys::{AlbumKey, ArtistKey, LabelKey, StyleKey, TrackKey};

/// A parent owning an ordered, duplicate-free list of children, each child
/// having at most one parent.
#[derive(Debug)]
pub struct OneToMany<P, C> {
    parent_of: HashMap<C, P>,
    children_of: HashMap<P, Vec<C>>,
}

impl<P, C> Default for OneToMany<P, C> {
    fn default() -> Self {
        Self {
            parent_of: HashMap::new(),
            children_of: HashMap::new(),
        }
    }
}

impl<P, C> OneToMany<P, C>
where
    P: Copy + Eq + Hash,
    C: Copy + Eq + Hash,
{
    /// Links `child` under `parent`. The child list never holds duplicates;
    /// the child's parent is (re)set even when it was already listed. A
    /// child moving away from another parent leaves that parent's list.
    pub fn add(&mut self, parent: P, child: C) {
        if let Some(previous) = self.parent_of.insert(child, parent)
            && previous != parent
        {
            self.detach(previous, child);
        }

        let children = self.children_of.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Removes `child` from `parent`'s list. The child's parent is only
    /// cleared when it still points at `parent`. Returns whether the list
    /// changed.
    pub fn remove(&mut self, parent: P, child: C) -> bool {
        let removed = self.detach(parent, child);
        if removed && self.parent_of.get(&child) == Some(&parent) {
            self.parent_of.remove(&child);
        }
        removed
    }

    /// Forward-side setter: points `child` at `parent`, or unsets it.
    pub fn set_parent(&mut self, child: C, parent: Option<P>) {
        match parent {
            Some(parent) => self.add(parent, child),
            None => {
                if let Some(previous) = self.parent_of.remove(&child) {
                    self.detach(previous, child);
                }
            }
        }
    }

    pub fn parent(&self, child: C) -> Option<P> {
        self.parent_of.get(&child).copied()
    }

    pub fn children(&self, parent: P) -> &[C] {
        self.children_of
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drops `parent` entirely. Its former children are returned with their
    /// parent unset.
    pub fn forget_parent(&mut self, parent: P) -> Vec<C> {
        let children = self.children_of.remove(&parent).unwrap_or_default();
        for child in &children {
            if self.parent_of.get(child) == Some(&parent) {
                self.parent_of.remove(child);
            }
        }
        children
    }

    pub fn forget_child(&mut self, child: C) {
        self.set_parent(child, None);
    }

    fn detach(&mut self, parent: P, child: C) -> bool {
        let Some(children) = self.children_of.get_mut(&parent) else {
            return false;
        };
        let Some(position) = children.iter().position(|c| *c == child) else {
            return false;
        };
        children.remove(position);
        if children.is_empty() {
            self.children_of.remove(&parent);
        }
        true
    }
}

/// A symmetric association: linking `left` to `right` always links `right`
/// back to `left`.
#[derive(Debug)]
pub struct ManyToMany<L, R> {
    rights_of: HashMap<L, Vec<R>>,
    lefts_of: HashMap<R, Vec<L>>,
}

impl<L, R> Default for ManyToMany<L, R> {
    fn default() -> Self {
        Self {
            rights_of: HashMap::new(),
            lefts_of: HashMap::new(),
        }
    }
}

impl<L, R> ManyToMany<L, R>
where
    L: Copy + Eq + Hash,
    R: Copy + Eq + Hash,
{
    /// Returns `true` when the pair was not linked before.
    pub fn link(&mut self, left: L, right: R) -> bool {
        let rights = self.rights_of.entry(left).or_default();
        if rights.contains(&right) {
            return false;
        }
        rights.push(right);
        self.lefts_of.entry(right).or_default().push(left);
        true
    }

    /// Returns `true` when the pair was linked.
    pub fn unlink(&mut self, left: L, right: R) -> bool {
        let removed = remove_value(&mut self.rights_of, left, right);
        if removed {
            remove_value(&mut self.lefts_of, right, left);
        }
        removed
    }

    pub fn rights(&self, left: L) -> &[R] {
        self.rights_of.get(&left).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lefts(&self, right: R) -> &[L] {
        self.lefts_of.get(&right).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn forget_left(&mut self, left: L) -> Vec<R> {
        let rights = self.rights_of.remove(&left).unwrap_or_default();
        for right in &rights {
            remove_value(&mut self.lefts_of, *right, left);
        }
        rights
    }

    pub fn forget_right(&mut self, right: R) -> Vec<L> {
        let lefts = self.lefts_of.remove(&right).unwrap_or_default();
        for left in &lefts {
            remove_value(&mut self.rights_of, *left, right);
        }
        lefts
    }
}

fn remove_value<K, V>(map: &mut HashMap<K, Vec<V>>, key: K, value: V) -> bool
where
    K: Eq + Hash,
    V: PartialEq,
{
    let Some(values) = map.get_mut(&key) else {
        return false;
    };
    let Some(position) = values.iter().position(|v| *v == value) else {
        return false;
    };
    values.remove(position);
    if values.is_empty() {
        map.remove(&key);
    }
    true
}

/// Every relationship of the catalog graph.
#[derive(Debug, Default)]
pub struct Relations {
    pub artist_albums: OneToMany<ArtistKey, AlbumKey>,
    pub label_albums: OneToMany<LabelKey, AlbumKey>,
    pub album_tracks: OneToMany<AlbumKey, TrackKey>,
    pub album_styles: ManyToMany<AlbumKey, StyleKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(n: u32) -> AlbumKey {
        AlbumKey::new(n)
    }

    fn label(n: u32) -> LabelKey {
        LabelKey::new(n)
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut rel = OneToMany::default();
        rel.add(label(1), album(1));
        rel.add(label(1), album(1));
        rel.add(label(1), album(1));

        assert_eq!(rel.children(label(1)), &[album(1)]);
        assert_eq!(rel.parent(album(1)), Some(label(1)));
    }

    #[test]
    fn test_add_moves_child_between_parents() {
        let mut rel = OneToMany::default();
        rel.add(label(1), album(1));
        rel.add(label(2), album(1));

        assert!(rel.children(label(1)).is_empty());
        assert_eq!(rel.children(label(2)), &[album(1)]);
        assert_eq!(rel.parent(album(1)), Some(label(2)));
    }

    #[test]
    fn test_remove_clears_back_reference() {
        let mut rel = OneToMany::default();
        rel.add(label(1), album(1));

        assert!(rel.remove(label(1), album(1)));
        assert!(rel.children(label(1)).is_empty());
        assert_eq!(rel.parent(album(1)), None);
    }

    #[test]
    fn test_remove_from_other_parent_leaves_reference() {
        let mut rel = OneToMany::default();
        rel.add(label(2), album(1));

        assert!(!rel.remove(label(1), album(1)));
        assert_eq!(rel.parent(album(1)), Some(label(2)));
        assert_eq!(rel.children(label(2)), &[album(1)]);
    }

    #[test]
    fn test_set_parent_none_detaches() {
        let mut rel = OneToMany::default();
        rel.add(label(1), album(1));
        rel.add(label(1), album(2));
        rel.set_parent(album(1), None);

        assert_eq!(rel.children(label(1)), &[album(2)]);
        assert_eq!(rel.parent(album(1)), None);
    }

    #[test]
    fn test_forget_parent_unsets_children() {
        let mut rel = OneToMany::default();
        rel.add(label(1), album(1));
        rel.add(label(1), album(2));

        let orphans = rel.forget_parent(label(1));

        assert_eq!(orphans, vec![album(1), album(2)]);
        assert_eq!(rel.parent(album(1)), None);
        assert_eq!(rel.parent(album(2)), None);
    }

    #[test]
    fn test_many_to_many_is_symmetric() {
        let mut rel = ManyToMany::default();
        let style = StyleKey::new(9);

        assert!(rel.link(album(1), style));
        assert!(!rel.link(album(1), style));
        assert_eq!(rel.rights(album(1)), &[style]);
        assert_eq!(rel.lefts(style), &[album(1)]);

        assert!(rel.unlink(album(1), style));
        assert!(!rel.unlink(album(1), style));
        assert!(rel.rights(album(1)).is_empty());
        assert!(rel.lefts(style).is_empty());
    }

    #[test]
    fn test_forget_left_clears_both_sides() {
        let mut rel = ManyToMany::default();
        let rock = StyleKey::new(1);
        let jazz = StyleKey::new(2);
        rel.link(album(1), rock);
        rel.link(album(1), jazz);
        rel.link(album(2), rock);

        let styles = rel.forget_left(album(1));

        assert_eq!(styles, vec![rock, jazz]);
        assert_eq!(rel.lefts(rock), &[album(2)]);
        assert!(rel.lefts(jazz).is_empty());
    }
}
