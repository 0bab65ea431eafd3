// Sequential identifiers in the `<prefix>_<n>` format.
//
// `n` starts at collection size + 1 and skips anything already taken, so a
// deleted profile's id is never handed out again while a higher one exists.

use std::collections::HashSet;

pub const PROFILE_PREFIX: &str = "profile";
pub const NOTIFICATION_PREFIX: &str = "notif";

pub struct IdAllocator {
    prefix: &'static str,
    next: usize,
    taken: HashSet<String>,
}

impl IdAllocator {
    /// `existing` is every id currently stored in the collection.
    pub fn new<I, S>(prefix: &'static str, existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let taken: HashSet<String> = existing.into_iter().map(Into::into).collect();
        Self {
            prefix,
            next: taken.len() + 1,
            taken,
        }
    }

    pub fn allocate(&mut self) -> String {
        loop {
            let candidate = format!("{}_{}", self.prefix, self.next);
            self.next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_after_collection_size() {
        let mut ids = IdAllocator::new(PROFILE_PREFIX, ["profile_1", "profile_2"]);
        assert_eq!(ids.allocate(), "profile_3");
        assert_eq!(ids.allocate(), "profile_4");
    }

    #[test]
    fn test_skips_ids_left_behind_by_deletions() {
        // profile_1 was deleted, so the collection has one entry but profile_2 is taken
        let mut ids = IdAllocator::new(PROFILE_PREFIX, ["profile_2"]);
        assert_eq!(ids.allocate(), "profile_3");
    }

    #[test]
    fn test_empty_collection_starts_at_one() {
        let mut ids = IdAllocator::new(NOTIFICATION_PREFIX, Vec::<String>::new());
        assert_eq!(ids.allocate(), "notif_1");
    }

    #[test]
    fn test_custom_ids_do_not_shift_numbering_into_collisions() {
        let mut ids = IdAllocator::new(NOTIFICATION_PREFIX, ["notif_2", "alice"]);
        assert_eq!(ids.allocate(), "notif_3");
        assert_eq!(ids.allocate(), "notif_4");
    }
}
