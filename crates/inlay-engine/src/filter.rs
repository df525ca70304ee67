//! Candidate validity filtering
//!
//! Backends return raw candidate strings; some are unusable and must
//! never surface. Import-like lines are stripped first, since backends
//! routinely hallucinate imports the file already has. A candidate is
//! then dropped when it is empty after trimming, when the text after
//! the cursor already starts with it (echoing the suffix), when it
//! duplicates a contiguous run of the trailing prefix lines (echoing
//! context back), or when it repeats a non-trivial line within itself
//! (degenerate generation). Filtered candidates are never errors; they
//! simply vanish from the list.

use std::collections::HashMap;

use tracing::debug;

use crate::config::EngineConfig;
use crate::context::IMPORT_LINE;

/// Filter raw candidates down to the usable ones, preserving order
pub fn filter_candidates(
    candidates: Vec<String>,
    prefix: &str,
    suffix: &str,
    config: &EngineConfig,
) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let candidate = match strip_import_lines(&candidate) {
            Some(stripped) => {
                debug!("stripping import lines from candidate");
                stripped
            }
            None => candidate,
        };
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            continue;
        }
        if suffix.trim_start().starts_with(trimmed) {
            debug!("dropping candidate duplicating the suffix");
            continue;
        }
        if echoes_prefix_tail(trimmed, prefix, config.prefix_echo_window_lines) {
            debug!("dropping candidate echoing trailing prefix lines");
            continue;
        }
        if has_degenerate_repetition(trimmed, config.repeated_line_min_chars) {
            debug!("dropping candidate with internal repetition");
            continue;
        }
        if kept.iter().any(|k| k == &candidate) {
            continue;
        }
        kept.push(candidate);
    }
    kept
}

/// Removes import-like lines from the candidate. Returns `None` when the
/// candidate has no such lines, leaving the original string untouched.
fn strip_import_lines(candidate: &str) -> Option<String> {
    if !IMPORT_LINE.is_match(candidate) {
        return None;
    }
    let kept: Vec<&str> = candidate
        .lines()
        .filter(|line| !IMPORT_LINE.is_match(line))
        .collect();
    Some(kept.join("\n"))
}

/// Whether the candidate's lines appear as a contiguous run among the
/// last `window` lines of the prefix
fn echoes_prefix_tail(candidate: &str, prefix: &str, window: usize) -> bool {
    let tail: Vec<&str> = {
        let mut lines: Vec<&str> = prefix.lines().rev().take(window).collect();
        lines.reverse();
        lines
    };
    let candidate_lines: Vec<&str> = candidate
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if candidate_lines.is_empty() || candidate_lines.len() > tail.len() {
        return false;
    }
    tail.windows(candidate_lines.len()).any(|run| {
        run.iter()
            .map(|l| l.trim())
            .eq(candidate_lines.iter().copied())
    })
}

/// Whether any non-trivial line occurs twice within the candidate
fn has_degenerate_repetition(candidate: &str, min_chars: usize) -> bool {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in candidate.lines() {
        let line = line.trim();
        if line.len() <= min_chars {
            continue;
        }
        let count = counts.entry(line).or_insert(0);
        *count += 1;
        if *count >= 2 {
            return true;
        }
    }
    false
}
