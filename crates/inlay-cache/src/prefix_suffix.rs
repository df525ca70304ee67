//! Approximate-match completion cache keyed by (prefix, suffix) pairs
//!
//! Network round-trips dominate suggestion latency. This tier converts any
//! character-level edit that keeps the user inside a previously fetched
//! suggestion window into a zero-network hit: lookups match by the edit
//! delta between the query and each stored key, not byte-for-byte key
//! equality.
//!
//! Supported edit patterns:
//!
//! - exact key match
//! - forward typing: the query prefix extends a stored prefix with the
//!   suffix unchanged; the typed text is trimmed off each candidate
//! - backspace: a stored prefix extends the query prefix; the deleted text
//!   is prepended back onto each candidate
//! - whitespace boundary shift: the keys differ only by trailing/leading
//!   whitespace around the cursor
//!
//! Entries are never evicted on insert; garbage accumulates per document
//! and is cleared wholesale when the document is dropped from tracking.

/// One cached fetch result: the literal key strings at the moment the
/// completions were returned, plus the ordered candidate list.
#[derive(Debug, Clone)]
struct StoredEntry {
    prefix: String,
    suffix: String,
    choices: Vec<String>,
}

/// How a stored entry matched the query, ordered from weakest to richest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKind {
    WhitespaceShift,
    Backspace,
    ForwardTyping,
    Exact,
}

/// Per-document completion cache with compatibility matching
#[derive(Debug, Default)]
pub struct PrefixSuffixCache {
    entries: Vec<StoredEntry>,
}

impl PrefixSuffixCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert candidates under the given key
    ///
    /// If an entry with the identical key already exists, new candidates
    /// are appended to it (duplicates skipped) rather than stored twice.
    pub fn store(
        &mut self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        candidates: Vec<String>,
    ) {
        let prefix = prefix.into();
        let suffix = suffix.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.prefix == prefix && e.suffix == suffix)
        {
            for candidate in candidates {
                if !entry.choices.contains(&candidate) {
                    entry.choices.push(candidate);
                }
            }
            return;
        }
        self.entries.push(StoredEntry {
            prefix,
            suffix,
            choices: candidates,
        });
    }

    /// Find the richest compatible match for the current (prefix, suffix)
    ///
    /// Returns candidates rebased onto the query state: forward typing
    /// trims the typed text, backspace prepends the deleted text. An exact
    /// key match is preferred, then the most specific compatible entry
    /// (the one sharing the longest prefix with the query).
    pub fn lookup(&self, prefix: &str, suffix: &str) -> Vec<String> {
        let mut best: Option<(MatchKind, usize, Vec<String>)> = None;

        for entry in &self.entries {
            let Some((kind, choices)) = Self::match_entry(entry, prefix, suffix) else {
                continue;
            };
            if choices.is_empty() {
                continue;
            }
            let specificity = entry.prefix.len();
            let better = match &best {
                None => true,
                Some((best_kind, best_spec, _)) => {
                    (kind, specificity) > (*best_kind, *best_spec)
                }
            };
            if better {
                best = Some((kind, specificity, choices));
            }
        }

        best.map(|(_, _, choices)| choices).unwrap_or_default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn match_entry(
        entry: &StoredEntry,
        prefix: &str,
        suffix: &str,
    ) -> Option<(MatchKind, Vec<String>)> {
        if suffix == entry.suffix {
            if prefix == entry.prefix {
                return Some((MatchKind::Exact, entry.choices.clone()));
            }
            if prefix.starts_with(&entry.prefix) {
                // Forward typing: keep candidates the typed text is a
                // strict prefix of, rebased past it.
                let typed = &prefix[entry.prefix.len()..];
                let choices: Vec<String> = entry
                    .choices
                    .iter()
                    .filter(|c| c.len() > typed.len() && c.starts_with(typed))
                    .map(|c| c[typed.len()..].to_string())
                    .collect();
                return Some((MatchKind::ForwardTyping, choices));
            }
            if entry.prefix.starts_with(prefix) {
                // Backspace: the user deleted text that was part of the
                // stored key; offer it back in front of each candidate.
                let deleted = &entry.prefix[prefix.len()..];
                let choices: Vec<String> = entry
                    .choices
                    .iter()
                    .map(|c| format!("{deleted}{c}"))
                    .collect();
                return Some((MatchKind::Backspace, choices));
            }
        }

        // Whitespace boundary shift: same content around the cursor, the
        // cursor merely moved across whitespace.
        if prefix.trim_end() == entry.prefix.trim_end()
            && suffix.trim_start() == entry.suffix.trim_start()
        {
            return Some((MatchKind::WhitespaceShift, entry.choices.clone()));
        }

        None
    }
}
