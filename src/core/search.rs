//! Case-insensitive substring search across the source tree.

use tracing::{debug, warn};

use crate::infra::{
    io::{read_source, split_lines},
    paths::BoundRoot,
    snippet::format_numbered_snippet,
    walk::{FileWalker, WalkError},
};

/// Knobs for one search call; defaults come from configuration.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub max_matches: usize,
    pub context_lines: usize,
    pub width: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Provide a non-empty 'query' to search.")]
    EmptyQuery,

    #[error(transparent)]
    Walk(#[from] WalkError),
}

/// Scan every candidate file and report each matching line with context.
///
/// Stops as soon as `max_matches` entries were produced. Unreadable files
/// add an error entry (which counts toward the cap) instead of aborting.
pub fn search_codebase(root: &BoundRoot, query: &str, opts: &SearchOptions) -> Result<String, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let needle = query.to_lowercase();
    let cap = opts.max_matches.max(1);
    let walker = FileWalker::new(&opts.ignore_patterns)?.with_extensions(&opts.extensions);
    let candidates = walker.walk_files(root.path());
    debug!(files = candidates.len(), query, "searching");

    let mut entries: Vec<String> = Vec::new();

    'files: for path in candidates {
        let rel = root.relative(&path);
        let text = match read_source(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %rel, error = %e, "unreadable during search");
                entries.push(format!("Error reading {rel}: {e}"));
                if entries.len() >= cap {
                    break;
                }
                continue;
            }
        };

        let lines = split_lines(&text);
        let hits = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.to_lowercase().contains(&needle))
            .map(|(i, _)| i);

        for (ordinal, index) in hits.enumerate() {
            let start = index.saturating_sub(opts.context_lines);
            let end = index
                .saturating_add(opts.context_lines)
                .saturating_add(1)
                .min(lines.len());
            let snippet = format_numbered_snippet(&lines[start..end], start + 1, opts.width);

            entries.push(format!(
                "File: {rel} (match {} at line {}, context lines {}-{end})\n---\n{snippet}\n...",
                ordinal + 1,
                index + 1,
                start + 1,
            ));
            if entries.len() >= cap {
                break 'files;
            }
        }
    }

    if entries.is_empty() {
        return Ok(format!("No references to '{query}' found under {}", root.path().display()));
    }
    Ok(entries.join("\n\n"))
}
