//! Unified diff hunks
//!
//! A hunk is a contiguous block of edits plus surrounding context lines.
//! Line ranges follow git's header convention: a side with no lines reports
//! the line *before* the block as its start, so a new file is `-0,0 +1,N`
//! and a deleted file is `-1,N +0,0`.
//!
//! Hunks render to and parse from unified patch text, and can be applied
//! forward (old to new) or in reverse (new to old) against file text.

use crate::artifacts::diff::myers::{DiffAlgorithm, Edit, MyersDiff};
use anyhow::Context;
use std::fmt::Display;
use thiserror::Error;

pub const DEFAULT_CONTEXT_LINES: usize = 3;

pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

const HUNK_HEADER_REGEX: &str = r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Context,
    Deletion,
    Addition,
}

impl LineKind {
    pub fn prefix(&self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Deletion => '-',
            LineKind::Addition => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HunkLine {
    pub kind: LineKind,
    /// Line text without its terminator
    pub content: String,
    /// Whether the line ends with `\n`
    pub newline: bool,
}

impl HunkLine {
    fn from_raw(kind: LineKind, raw: &str) -> Self {
        match raw.strip_suffix('\n') {
            Some(content) => HunkLine {
                kind,
                content: content.to_string(),
                newline: true,
            },
            None => HunkLine {
                kind,
                content: raw.to_string(),
                newline: false,
            },
        }
    }

    /// The line as it appears in the file
    pub fn raw(&self) -> String {
        if self.newline {
            format!("{}\n", self.content)
        } else {
            self.content.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("hunk context does not match the file near line {line}")]
    ContextMismatch { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
    pub lines: Vec<HunkLine>,
}

/// Split text into lines that keep their `\n`
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

fn header_start(start: usize, len: usize) -> usize {
    if len == 0 { start } else { start + 1 }
}

fn start_index(start: usize, len: usize) -> usize {
    if len == 0 { start } else { start.saturating_sub(1) }
}

fn format_range(start: usize, len: usize) -> String {
    if len == 1 {
        start.to_string()
    } else {
        format!("{start},{len}")
    }
}

impl DiffHunk {
    /// Hunks turning `old` into `new` with `context` unchanged lines around each change
    pub fn build(old: &str, new: &str, context: usize) -> Vec<DiffHunk> {
        let a = split_lines(old);
        let b = split_lines(new);
        let edits = MyersDiff::new(&a, &b).diff();

        Self::from_edits(&edits, context)
    }

    pub fn from_edits(edits: &[Edit<&str>], context: usize) -> Vec<DiffHunk> {
        // lines of each side consumed before every edit
        let mut consumed = Vec::with_capacity(edits.len());
        let (mut a_seen, mut b_seen) = (0, 0);
        for edit in edits {
            consumed.push((a_seen, b_seen));
            match edit {
                Edit::Delete { .. } => a_seen += 1,
                Edit::Insert { .. } => b_seen += 1,
                Edit::Equal { .. } => {
                    a_seen += 1;
                    b_seen += 1;
                }
            }
        }

        let changes = edits
            .iter()
            .enumerate()
            .filter(|(_, edit)| edit.is_change())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        let mut hunks = Vec::new();
        let mut remaining = changes.iter().copied().peekable();

        while let Some(first) = remaining.next() {
            let mut last = first;
            while let Some(&next) = remaining.peek() {
                if next - last - 1 > 2 * context {
                    break;
                }
                last = next;
                remaining.next();
            }

            let start = first.saturating_sub(context);
            let end = (last + context).min(edits.len() - 1);
            hunks.push(Self::from_slice(&edits[start..=end], consumed[start]));
        }

        hunks
    }

    fn from_slice(edits: &[Edit<&str>], (a_before, b_before): (usize, usize)) -> DiffHunk {
        let lines = edits
            .iter()
            .map(|edit| match edit {
                Edit::Delete { value, .. } => HunkLine::from_raw(LineKind::Deletion, value),
                Edit::Insert { value, .. } => HunkLine::from_raw(LineKind::Addition, value),
                Edit::Equal { value, .. } => HunkLine::from_raw(LineKind::Context, value),
            })
            .collect::<Vec<_>>();

        let old_lines = lines
            .iter()
            .filter(|line| line.kind != LineKind::Addition)
            .count();
        let new_lines = lines
            .iter()
            .filter(|line| line.kind != LineKind::Deletion)
            .count();

        DiffHunk {
            old_start: header_start(a_before, old_lines),
            old_lines,
            new_start: header_start(b_before, new_lines),
            new_lines,
            lines,
        }
    }

    /// Whether the hunk begins at the first line of the file on either side
    pub fn touches_file_start(&self) -> bool {
        self.old_start == 1 || self.new_start == 1
    }

    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            format_range(self.old_start, self.old_lines),
            format_range(self.new_start, self.new_lines)
        )
    }

    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| line.kind == LineKind::Addition)
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| line.kind == LineKind::Deletion)
            .count()
    }

    /// Parse one hunk from unified patch text, header included
    pub fn parse(text: &str) -> anyhow::Result<DiffHunk> {
        let mut rows = text.lines();
        let header = rows.next().context("Empty hunk text")?;
        let captures = regex::Regex::new(HUNK_HEADER_REGEX)?
            .captures(header)
            .with_context(|| format!("Invalid hunk header: {header}"))?;

        let number = |index: usize, default: usize| -> anyhow::Result<usize> {
            captures
                .get(index)
                .map(|value| value.as_str().parse::<usize>())
                .transpose()
                .map(|value| value.unwrap_or(default))
                .with_context(|| format!("Invalid hunk header: {header}"))
        };

        let mut hunk = DiffHunk {
            old_start: number(1, 0)?,
            old_lines: number(2, 1)?,
            new_start: number(3, 0)?,
            new_lines: number(4, 1)?,
            lines: Vec::new(),
        };

        for row in rows {
            if row.starts_with('\\') {
                let last = hunk
                    .lines
                    .last_mut()
                    .context("No-newline marker before any line")?;
                last.newline = false;
                continue;
            }

            let (kind, content) = match row.chars().next() {
                Some(' ') => (LineKind::Context, &row[1..]),
                Some('-') => (LineKind::Deletion, &row[1..]),
                Some('+') => (LineKind::Addition, &row[1..]),
                // some tools strip the space of empty context lines
                None => (LineKind::Context, ""),
                Some(other) => anyhow::bail!("Invalid hunk line prefix '{other}'"),
            };
            hunk.lines.push(HunkLine {
                kind,
                content: content.to_string(),
                newline: true,
            });
        }

        let old_count = hunk
            .lines
            .iter()
            .filter(|line| line.kind != LineKind::Addition)
            .count();
        let new_count = hunk
            .lines
            .iter()
            .filter(|line| line.kind != LineKind::Deletion)
            .count();
        if old_count != hunk.old_lines || new_count != hunk.new_lines {
            anyhow::bail!(
                "Hunk body has {old_count}/{new_count} lines, header declares {}/{}",
                hunk.old_lines,
                hunk.new_lines
            );
        }

        Ok(hunk)
    }

    fn side(&self, excluded: LineKind) -> Vec<String> {
        self.lines
            .iter()
            .filter(|line| line.kind != excluded)
            .map(HunkLine::raw)
            .collect()
    }

    /// Turn text matching the old side into text matching the new side
    pub fn apply(&self, text: &str) -> Result<String, ApplyError> {
        splice(
            text,
            &self.side(LineKind::Addition),
            &self.side(LineKind::Deletion),
            start_index(self.old_start, self.old_lines),
        )
    }

    /// Turn text matching the new side back into text matching the old side
    pub fn reverse(&self, text: &str) -> Result<String, ApplyError> {
        splice(
            text,
            &self.side(LineKind::Deletion),
            &self.side(LineKind::Addition),
            start_index(self.new_start, self.new_lines),
        )
    }
}

/// Replace `before` with `after`, looking for `before` at `expected` first and then
/// at increasing distances from it
fn splice(
    text: &str,
    before: &[String],
    after: &[String],
    expected: usize,
) -> Result<String, ApplyError> {
    let lines = split_lines(text);
    let mismatch = ApplyError::ContextMismatch { line: expected + 1 };

    let last_start = lines.len().checked_sub(before.len()).ok_or(mismatch.clone())?;
    let expected = expected.min(last_start);

    let matches_at = |position: usize| {
        lines[position..position + before.len()]
            .iter()
            .zip(before)
            .all(|(line, wanted)| *line == wanted)
    };

    let position = (0..=last_start)
        .flat_map(|distance| {
            let below = expected.checked_sub(distance);
            let above = (distance > 0 && expected + distance <= last_start)
                .then_some(expected + distance);
            below.into_iter().chain(above)
        })
        .find(|&position| matches_at(position))
        .ok_or(mismatch)?;

    let mut patched = String::with_capacity(text.len());
    lines[..position].iter().for_each(|line| patched.push_str(line));
    after.iter().for_each(|line| patched.push_str(line));
    lines[position + before.len()..]
        .iter()
        .for_each(|line| patched.push_str(line));

    Ok(patched)
}

impl Display for DiffHunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.header())?;
        for line in &self.lines {
            writeln!(f, "{}{}", line.kind.prefix(), line.content)?;
            if !line.newline {
                writeln!(f, "{NO_NEWLINE_MARKER}")?;
            }
        }
        Ok(())
    }
}
