//! Fixed-width bit set over non-negative labels.

const BITS: usize = u64::BITS as usize;

/// Scratch set of labels, reused across frames to avoid an allocation per
/// classified frame.
///
/// Sized up front for the largest expected label. Only
/// [`ensure_max_label`](Self::ensure_max_label) grows it; [`insert`](Self::insert)
/// refuses labels that do not fit.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    words: Vec<u64>,
}

impl LabelSet {
    /// Create a set able to hold labels `0..=max_label` without growing.
    pub fn with_max_label(max_label: usize) -> Self {
        Self {
            words: vec![0; max_label / BITS + 1],
        }
    }

    /// Largest label that fits without growing.
    pub fn max_label(&self) -> usize {
        (self.words.len() * BITS).saturating_sub(1)
    }

    /// Grow the set so that labels `0..=max_label` fit. Never shrinks.
    pub fn ensure_max_label(&mut self, max_label: usize) {
        let words = max_label / BITS + 1;
        if words > self.words.len() {
            self.words.resize(words, 0);
        }
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Mark a label. Returns `Some(true)` if it was not already present and
    /// `None` if it is above [`max_label`](Self::max_label).
    pub fn insert(&mut self, label: usize) -> Option<bool> {
        let word = self.words.get_mut(label / BITS)?;
        let mask = 1u64 << (label % BITS);
        let was_set = *word & mask != 0;
        *word |= mask;
        Some(!was_set)
    }

    pub fn contains(&self, label: usize) -> bool {
        self.words
            .get(label / BITS)
            .is_some_and(|w| w & (1u64 << (label % BITS)) != 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }
}
