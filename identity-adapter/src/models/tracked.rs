//! Snapshot-based change tracking shared by the remote-backed entities.
//!
//! An entity keeps two copies of its attribute struct: the working copy
//! and the last-known-persisted snapshot. Dirty state is a plain
//! field-by-field comparison between the two; no reflection.

/// Attribute structs that can report which of their fields differ from
/// a snapshot.
pub trait TrackedAttrs: Clone + PartialEq {
    /// Names of the fields whose value differs from `from`.
    fn changed_fields(&self, from: &Self) -> Vec<&'static str>;
}

#[derive(Debug, Clone)]
pub struct Tracked<A: TrackedAttrs> {
    current: A,
    snapshot: A,
    new_record: bool,
}

impl<A: TrackedAttrs> Tracked<A> {
    /// A not-yet-persisted entity. Saving it issues a create.
    pub fn transient(attrs: A) -> Self {
        Tracked {
            snapshot: attrs.clone(),
            current: attrs,
            new_record: true,
        }
    }

    /// An entity loaded from the provider; the snapshot starts clean.
    pub fn persisted(attrs: A) -> Self {
        Tracked {
            snapshot: attrs.clone(),
            current: attrs,
            new_record: false,
        }
    }

    pub fn is_new(&self) -> bool {
        self.new_record
    }

    pub fn get(&self) -> &A {
        &self.current
    }

    pub fn get_mut(&mut self) -> &mut A {
        &mut self.current
    }

    pub fn snapshot(&self) -> &A {
        &self.snapshot
    }

    pub fn changed(&self) -> bool {
        self.current != self.snapshot
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        self.current.changed_fields(&self.snapshot)
    }

    /// Discard pending edits, restoring the snapshot values.
    pub fn rollback(&mut self) {
        self.current = self.snapshot.clone();
    }

    /// Accept the working copy as persisted truth.
    pub fn commit(&mut self) {
        self.snapshot = self.current.clone();
        self.new_record = false;
    }

    /// Replace both sides with freshly fetched canonical state,
    /// clearing dirty tracking.
    pub fn replace(&mut self, attrs: A) {
        self.snapshot = attrs.clone();
        self.current = attrs;
        self.new_record = false;
    }
}
