use std::collections::HashSet;

use crate::entry::{Entry, EntryList};

/// Entries of `head` whose URL does not occur anywhere in `base`.
///
/// Identity is the URL alone: an entry whose other fields changed is not new.
/// Head order is kept and duplicates within `head` are each reported.
pub fn resolve(base: &[Entry], head: &[Entry]) -> EntryList {
    let known: HashSet<&str> = base.iter().map(Entry::url).collect();

    head.iter()
        .filter(|entry| !known.contains(entry.url()))
        .cloned()
        .collect()
}
