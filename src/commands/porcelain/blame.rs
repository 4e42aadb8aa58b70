use crate::areas::repository::Repository;
use crate::artifacts::blame::{Blame, Blamer};
use crate::artifacts::classify::ContentSource;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tracing::debug;

impl Repository {
    /// Line attribution of `path` as of `from` (HEAD by default), stopping at `to`
    ///
    /// `None` when the file is missing from `from` or is not text.
    pub fn blame(
        &self,
        path: &Path,
        from: Option<&str>,
        to: Option<&str>,
    ) -> anyhow::Result<Option<Blame>> {
        let path = self.relative_path(path)?;
        let from = self.resolve_revision(from.unwrap_or("HEAD"))?;
        let to = to.map(|to| self.resolve_revision(to)).transpose()?;

        if !self.is_text_file(&path, &ContentSource::Commit(from.clone())) {
            debug!(path = %path.display(), "not blaming binary content");
            return Ok(None);
        }

        Blamer::new(self.database()).blame(&path, &from, to.as_ref())
    }

    /// Print `oid (author date lineno) line` rows
    pub fn show_blame(
        &self,
        path: &Path,
        from: Option<&str>,
        to: Option<&str>,
    ) -> anyhow::Result<()> {
        let Some(blame) = self.blame(path, from, to)? else {
            anyhow::bail!("no text content to blame for {}", path.display());
        };

        let mut authors = HashMap::new();
        for hunk in &blame.hunks {
            if !authors.contains_key(&hunk.commit) {
                let commit = self
                    .database()
                    .parse_object_as_commit(&hunk.commit)?
                    .ok_or_else(|| anyhow::anyhow!("object {} is not a commit", hunk.commit))?;
                authors.insert(hunk.commit.clone(), commit.author().clone());
            }
        }

        let width = blame.line_count().to_string().len();
        let mut writer = self.writer();
        for hunk in &blame.hunks {
            let author = &authors[&hunk.commit];
            for (offset, line) in hunk.lines.iter().enumerate() {
                writeln!(
                    writer,
                    "{} ({} {} {:>width$}) {}",
                    hunk.commit.to_short_oid(),
                    author.name(),
                    author.short_date(),
                    hunk.start_line + offset,
                    line
                )?;
            }
        }

        Ok(())
    }
}
