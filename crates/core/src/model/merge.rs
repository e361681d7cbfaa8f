//! Reconciliation of a device-local snapshot with the copy held remotely.
//!
//! Packs are compared wholesale: the side with the larger `practiced` count
//! wins (ties go to remote). Mistake sets are never combined element-wise.

use crate::model::progress::{PackProgress, ProgressSnapshot};

/// Merge two optional snapshots.
///
/// When one side is absent the other is returned unchanged; when both are
/// absent the result is an empty snapshot.
#[must_use]
pub fn merge(
    local: Option<ProgressSnapshot>,
    remote: Option<ProgressSnapshot>,
) -> ProgressSnapshot {
    match (local, remote) {
        (Some(local), Some(remote)) => merge_snapshots(&local, &remote),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => ProgressSnapshot::new(),
    }
}

/// Merge two present snapshots.
#[must_use]
pub fn merge_snapshots(local: &ProgressSnapshot, remote: &ProgressSnapshot) -> ProgressSnapshot {
    let mut pack_progress = local.pack_progress.clone();
    for (id, remote_entry) in &remote.pack_progress {
        let keep_local = pack_progress
            .get(id)
            .is_some_and(|local_entry| prefers_local(local_entry, remote_entry));
        if !keep_local {
            pack_progress.insert(id.clone(), remote_entry.clone());
        }
    }

    let recency_source = if remote.recently_completed.is_empty() {
        local
    } else {
        remote
    };

    ProgressSnapshot {
        pack_progress,
        recently_completed: recency_source.recently_completed.clone(),
        review_queue: recency_source.review_queue.clone(),
    }
}

fn prefers_local(local: &PackProgress, remote: &PackProgress) -> bool {
    local.practiced() > remote.practiced()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn entry(practiced: u32, correct: u32, wrong: &[usize]) -> PackProgress {
        PackProgress::from_parts(practiced, correct, Some(fixed_now()), wrong.iter().copied())
    }

    fn snapshot(entries: &[(&str, PackProgress)], recent: &[&str]) -> ProgressSnapshot {
        ProgressSnapshot::from_parts(
            entries
                .iter()
                .map(|(id, p)| (PackId::new(*id), p.clone()))
                .collect(),
            recent.iter().map(|id| PackId::new(*id)),
        )
    }

    #[test]
    fn merging_with_itself_is_identity() {
        let s = snapshot(
            &[("a", entry(3, 2, &[1])), ("b", entry(1, 0, &[0]))],
            &["a", "b"],
        );
        assert_eq!(merge_snapshots(&s, &s), s);
    }

    #[test]
    fn absent_side_returns_other_unchanged() {
        let s = snapshot(&[("a", entry(2, 1, &[4]))], &["a"]);
        assert_eq!(merge(Some(s.clone()), None), s);
        assert_eq!(merge(None, Some(s.clone())), s);
        assert_eq!(merge(None, None), ProgressSnapshot::new());
    }

    #[test]
    fn more_practiced_remote_wins() {
        let local = snapshot(&[("a", entry(3, 3, &[]))], &[]);
        let remote = snapshot(&[("a", entry(5, 1, &[2, 3]))], &[]);
        let merged = merge_snapshots(&local, &remote);
        assert_eq!(
            merged.pack_progress(&PackId::new("a")),
            Some(&entry(5, 1, &[2, 3]))
        );
    }

    #[test]
    fn more_practiced_local_wins() {
        let local = snapshot(&[("a", entry(5, 4, &[7]))], &[]);
        let remote = snapshot(&[("a", entry(3, 0, &[1, 2]))], &[]);
        let merged = merge_snapshots(&local, &remote);
        assert_eq!(
            merged.pack_progress(&PackId::new("a")),
            Some(&entry(5, 4, &[7]))
        );
    }

    #[test]
    fn ties_favor_remote() {
        let local_entry = PackProgress::from_parts(
            4,
            3,
            Some(fixed_now() + Duration::days(1)),
            [9],
        );
        let remote_entry = entry(4, 1, &[0]);

        let local = snapshot(&[("a", local_entry)], &[]);
        let remote = snapshot(&[("a", remote_entry.clone())], &[]);
        let merged = merge_snapshots(&local, &remote);
        assert_eq!(merged.pack_progress(&PackId::new("a")), Some(&remote_entry));
    }

    #[test]
    fn one_sided_packs_are_unioned() {
        let local = snapshot(&[("only-local", entry(1, 1, &[]))], &[]);
        let remote = snapshot(&[("only-remote", entry(2, 0, &[0, 1]))], &[]);
        let merged = merge_snapshots(&local, &remote);
        assert_eq!(merged.pack_progress_map().len(), 2);
        assert_eq!(
            merged.pack_progress(&PackId::new("only-local")),
            Some(&entry(1, 1, &[]))
        );
        assert_eq!(
            merged.pack_progress(&PackId::new("only-remote")),
            Some(&entry(2, 0, &[0, 1]))
        );
    }

    #[test]
    fn recency_prefers_non_empty_remote() {
        let local = snapshot(&[], &["x", "y"]);
        let remote = snapshot(&[], &["z"]);
        let merged = merge_snapshots(&local, &remote);
        assert_eq!(merged.recently_completed(), &[PackId::new("z")]);

        let merged = merge_snapshots(&local, &snapshot(&[], &[]));
        assert_eq!(
            merged.recently_completed(),
            &[PackId::new("x"), PackId::new("y")]
        );
    }
}
