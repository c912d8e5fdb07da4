//! Referral Graph Traversal
//!
//! The referral graph is a forest: every user has at most one referrer.
//! Stored data can still be corrupt (a referrer link pointing back into the
//! user's own downline), so both walks keep a visited set and a depth bound.
//!
//! Both walks are step-wise state machines. The caller owns the lookups,
//! which lets an async store drive them one query at a time:
//!
//! ```text
//! upline:    C --referred_by--> B --referred_by--> A --> (root)
//!            degree             1                  2
//!
//! downline:  A ==> level 1 [B, D] ==> level 2 [C, E, F] ==> ...
//! ```

use std::collections::HashSet;
use std::hash::Hash;

use serde::Serialize;

/// An upline member relative to the walk origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ancestor<T> {
    /// Upline user
    pub user: T,
    /// 1 = direct referrer
    pub degree: u32,
    /// User directly below `user` on the chain (the origin for degree 1)
    pub via: T,
}

/// Why a walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkEnd {
    /// Reached a user without a referrer
    Root,
    /// Collected `max_depth` degrees
    DepthLimit,
    /// The next referrer was already on the chain
    Cycle,
}

/// Step-wise upline walk.
///
/// ```
/// use referral_engine::{UplineWalk, WalkEnd};
///
/// let mut walk = UplineWalk::new(3u32, 6);
/// assert_eq!(walk.pending(), Some(3));
///
/// let first = walk.advance(Some(2)).unwrap();
/// assert_eq!((first.user, first.degree, first.via), (2, 1, 3));
///
/// assert!(walk.advance(None).is_none());
/// assert_eq!(walk.end(), Some(WalkEnd::Root));
/// ```
#[derive(Debug, Clone)]
pub struct UplineWalk<T> {
    current: T,
    visited: HashSet<T>,
    degree: u32,
    max_depth: u32,
    end: Option<WalkEnd>,
}

impl<T> UplineWalk<T>
where
    T: Copy + Eq + Hash,
{
    pub fn new(origin: T, max_depth: u32) -> Self {
        let mut visited = HashSet::new();
        visited.insert(origin);

        Self {
            current: origin,
            visited,
            degree: 0,
            max_depth,
            end: if max_depth == 0 {
                Some(WalkEnd::DepthLimit)
            } else {
                None
            },
        }
    }

    /// User whose referrer must be looked up next, `None` once finished
    pub fn pending(&self) -> Option<T> {
        match self.end {
            Some(_) => None,
            None => Some(self.current),
        }
    }

    /// Feed the referrer of [`pending`](Self::pending).
    ///
    /// Returns the new ancestor, or `None` when the walk stops here.
    pub fn advance(&mut self, referrer: Option<T>) -> Option<Ancestor<T>> {
        if self.end.is_some() {
            return None;
        }

        let Some(referrer) = referrer else {
            self.end = Some(WalkEnd::Root);
            return None;
        };

        if !self.visited.insert(referrer) {
            self.end = Some(WalkEnd::Cycle);
            return None;
        }

        self.degree += 1;
        let ancestor = Ancestor {
            user: referrer,
            degree: self.degree,
            via: self.current,
        };
        self.current = referrer;

        if self.degree >= self.max_depth {
            self.end = Some(WalkEnd::DepthLimit);
        }

        Some(ancestor)
    }

    /// Degrees collected so far
    pub fn degree(&self) -> u32 {
        self.degree
    }

    pub fn end(&self) -> Option<WalkEnd> {
        self.end
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }
}

/// Completed upline walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upline<T> {
    pub ancestors: Vec<Ancestor<T>>,
    pub end: WalkEnd,
}

/// Resolve an upline synchronously with a referrer lookup closure
pub fn resolve_upline<T, F>(origin: T, max_depth: u32, mut referrer_of: F) -> Upline<T>
where
    T: Copy + Eq + Hash,
    F: FnMut(&T) -> Option<T>,
{
    let mut walk = UplineWalk::new(origin, max_depth);
    let mut ancestors = Vec::new();

    while let Some(current) = walk.pending() {
        if let Some(ancestor) = walk.advance(referrer_of(&current)) {
            ancestors.push(ancestor);
        }
    }

    Upline {
        ancestors,
        // pending() only returns None once an end reason is set
        end: walk.end().unwrap_or(WalkEnd::Root),
    }
}

/// One breadth-first downline level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level<T> {
    pub degree: u32,
    pub members: Vec<T>,
}

/// Step-wise breadth-first downline walk.
///
/// ```
/// use referral_engine::DownlineWalk;
///
/// let mut walk = DownlineWalk::new(1u32, 2);
/// assert_eq!(walk.frontier(), Some(&[1][..]));
///
/// let level = walk.descend(vec![2, 3]);
/// assert_eq!((level.degree, level.members), (1, vec![2, 3]));
///
/// let level = walk.descend(vec![4, 1]);
/// assert_eq!((level.degree, level.members), (2, vec![4]));
///
/// assert_eq!(walk.frontier(), None);
/// ```
#[derive(Debug, Clone)]
pub struct DownlineWalk<T> {
    visited: HashSet<T>,
    frontier: Vec<T>,
    degree: u32,
    max_depth: u32,
    skipped: usize,
}

impl<T> DownlineWalk<T>
where
    T: Copy + Eq + Hash,
{
    pub fn new(root: T, max_depth: u32) -> Self {
        let mut visited = HashSet::new();
        visited.insert(root);

        Self {
            visited,
            frontier: vec![root],
            degree: 0,
            max_depth,
            skipped: 0,
        }
    }

    /// Users whose direct referrals form the next level, `None` once finished
    pub fn frontier(&self) -> Option<&[T]> {
        if self.frontier.is_empty() || self.degree >= self.max_depth {
            None
        } else {
            Some(&self.frontier)
        }
    }

    /// Feed the direct referrals of the current frontier.
    ///
    /// Users already reached are dropped and counted in [`revisits`](Self::revisits).
    pub fn descend<I>(&mut self, children: I) -> Level<T>
    where
        I: IntoIterator<Item = T>,
    {
        self.degree += 1;

        let mut members = Vec::new();
        for child in children {
            if self.visited.insert(child) {
                members.push(child);
            } else {
                self.skipped += 1;
            }
        }

        self.frontier = members.clone();

        Level {
            degree: self.degree,
            members,
        }
    }

    /// Deepest level produced so far
    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Number of already-visited users fed back into the walk
    pub fn revisits(&self) -> usize {
        self.skipped
    }

    /// Number of distinct users reached, root excluded
    pub fn reached(&self) -> usize {
        self.visited.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn chain(len: u32) -> HashMap<u32, u32> {
        // user n was referred by n - 1, user 0 is the root
        (1..=len).map(|n| (n, n - 1)).collect()
    }

    #[test]
    fn test_upline_stops_at_root() {
        let parents = chain(3);
        let upline = resolve_upline(3, 6, |user| parents.get(user).copied());

        let users: Vec<_> = upline.ancestors.iter().map(|a| a.user).collect();
        let degrees: Vec<_> = upline.ancestors.iter().map(|a| a.degree).collect();
        let vias: Vec<_> = upline.ancestors.iter().map(|a| a.via).collect();

        assert_eq!(users, vec![2, 1, 0]);
        assert_eq!(degrees, vec![1, 2, 3]);
        assert_eq!(vias, vec![3, 2, 1]);
        assert_eq!(upline.end, WalkEnd::Root);
    }

    #[test]
    fn test_upline_respects_depth() {
        let parents = chain(10);
        let upline = resolve_upline(10, 6, |user| parents.get(user).copied());

        assert_eq!(upline.ancestors.len(), 6);
        assert_eq!(upline.ancestors.last().unwrap().degree, 6);
        assert_eq!(upline.ancestors.last().unwrap().user, 4);
        assert_eq!(upline.end, WalkEnd::DepthLimit);
    }

    #[test]
    fn test_upline_zero_depth() {
        let mut lookups = 0;
        let upline = resolve_upline(1u32, 0, |_| {
            lookups += 1;
            Some(0)
        });

        assert!(upline.ancestors.is_empty());
        assert_eq!(upline.end, WalkEnd::DepthLimit);
        assert_eq!(lookups, 0);
    }

    #[test]
    fn test_upline_detects_cycle() {
        // 1 -> 2 -> 3 -> 1
        let parents: HashMap<u32, u32> = [(1, 2), (2, 3), (3, 1)].into_iter().collect();
        let upline = resolve_upline(1, 32, |user| parents.get(user).copied());

        let users: Vec<_> = upline.ancestors.iter().map(|a| a.user).collect();
        assert_eq!(users, vec![2, 3]);
        assert_eq!(upline.end, WalkEnd::Cycle);
    }

    #[test]
    fn test_upline_self_referral() {
        let upline = resolve_upline(7u32, 6, |_| Some(7));
        assert!(upline.ancestors.is_empty());
        assert_eq!(upline.end, WalkEnd::Cycle);
    }

    #[test]
    fn test_advance_after_finish_is_noop() {
        let mut walk = UplineWalk::new(1u32, 1);
        assert!(walk.advance(Some(0)).is_some());
        assert!(walk.is_finished());
        assert!(walk.advance(Some(9)).is_none());
        assert_eq!(walk.degree(), 1);
        assert_eq!(walk.end(), Some(WalkEnd::DepthLimit));
    }

    #[test]
    fn test_downline_levels() {
        // 0 -> {1, 2}, 1 -> {3}, 2 -> {4, 5}, 3 -> {6}
        let children: HashMap<u32, Vec<u32>> = [
            (0, vec![1, 2]),
            (1, vec![3]),
            (2, vec![4, 5]),
            (3, vec![6]),
        ]
        .into_iter()
        .collect();

        let mut walk = DownlineWalk::new(0u32, 6);
        let mut levels = Vec::new();
        while let Some(frontier) = walk.frontier() {
            let next: Vec<u32> = frontier
                .iter()
                .flat_map(|user| children.get(user).cloned().unwrap_or_default())
                .collect();
            levels.push(walk.descend(next));
        }

        assert_eq!(levels[0], Level { degree: 1, members: vec![1, 2] });
        assert_eq!(levels[1], Level { degree: 2, members: vec![3, 4, 5] });
        assert_eq!(levels[2], Level { degree: 3, members: vec![6] });
        assert_eq!(levels[3], Level { degree: 4, members: vec![] });
        assert_eq!(walk.reached(), 6);
    }

    #[test]
    fn test_downline_depth_and_cycles() {
        let mut walk = DownlineWalk::new(0u32, 2);

        walk.descend(vec![1]);
        // corrupt link back to the root
        let level = walk.descend(vec![0, 2]);
        assert_eq!(level.members, vec![2]);
        assert_eq!(walk.revisits(), 1);

        // depth 2 reached
        assert_eq!(walk.frontier(), None);
    }
}
