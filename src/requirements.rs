//! Subsystem identities and requirement sets.
//!
//! A [`SubsystemSet`] is a growable bitset. The first 64 identifiers live
//! inline, so typical robots never touch the heap when building or testing a
//! requirement set.

use core::fmt;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

const WORD_BITS: usize = 64;

/// Slot index handed out by the scheduler when a subsystem is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubsystemId(pub(crate) usize);

impl SubsystemId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subsystem#{}", self.0)
    }
}

#[derive(Clone, Default)]
pub struct SubsystemSet {
    words: SmallVec<[u64; 1]>,
}

impl SubsystemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(id: SubsystemId) -> Self {
        let mut set = Self::new();
        set.insert(id);
        set
    }

    /// Adds `id`, returning `true` if it was not already present.
    pub fn insert(&mut self, id: SubsystemId) -> bool {
        let (word, bit) = Self::locate(id);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_set = self.words[word] & bit != 0;
        self.words[word] |= bit;
        !was_set
    }

    pub fn remove(&mut self, id: SubsystemId) -> bool {
        let (word, bit) = Self::locate(id);
        match self.words.get_mut(word) {
            Some(w) if *w & bit != 0 => {
                *w &= !bit;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: SubsystemId) -> bool {
        let (word, bit) = Self::locate(id);
        self.words.get(word).map_or(false, |w| w & bit != 0)
    }

    pub fn union(&self, other: &SubsystemSet) -> SubsystemSet {
        let len = self.words.len().max(other.words.len());
        let words = (0..len)
            .map(|i| self.word(i) | other.word(i))
            .collect();
        SubsystemSet { words }
    }

    pub fn intersects(&self, other: &SubsystemSet) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| a & b != 0)
    }

    pub fn is_subset(&self, other: &SubsystemSet) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, w)| w & !other.word(i) == 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Members in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = SubsystemId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &w)| {
            (0..WORD_BITS)
                .filter(move |bit| w & (1u64 << bit) != 0)
                .map(move |bit| SubsystemId(i * WORD_BITS + bit))
        })
    }

    fn word(&self, index: usize) -> u64 {
        self.words.get(index).copied().unwrap_or(0)
    }

    fn locate(id: SubsystemId) -> (usize, u64) {
        (id.0 / WORD_BITS, 1u64 << (id.0 % WORD_BITS))
    }
}

// Trailing zero words must not make two equal sets compare unequal.
impl PartialEq for SubsystemSet {
    fn eq(&self, other: &Self) -> bool {
        let len = self.words.len().max(other.words.len());
        (0..len).all(|i| self.word(i) == other.word(i))
    }
}

impl Eq for SubsystemSet {}

impl fmt::Debug for SubsystemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(SubsystemId::index)).finish()
    }
}

impl FromIterator<SubsystemId> for SubsystemSet {
    fn from_iter<I: IntoIterator<Item = SubsystemId>>(iter: I) -> Self {
        let mut set = SubsystemSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl Extend<SubsystemId> for SubsystemSet {
    fn extend<I: IntoIterator<Item = SubsystemId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}
