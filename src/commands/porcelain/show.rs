use crate::areas::repository::Repository;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// The commit a revision expression names
    pub fn resolve_revision(&self, revision: &str) -> anyhow::Result<ObjectId> {
        Revision::try_parse(revision)?
            .resolve(self.refs(), self.database())?
            .ok_or_else(|| anyhow::anyhow!("revision {revision} does not name a commit"))
    }

    /// Print a commit header followed by its patch against `parent`
    pub fn show(
        &self,
        revision: &str,
        parent: Option<&str>,
        path: Option<&Path>,
    ) -> anyhow::Result<()> {
        let oid = self.resolve_revision(revision)?;
        let parent = parent
            .map(|parent| self.resolve_revision(parent))
            .transpose()?;

        let commit = self
            .database()
            .parse_object_as_commit(&oid)?
            .ok_or_else(|| anyhow::anyhow!("object {oid} is not a commit"))?;

        {
            let mut writer = self.writer();
            writeln!(writer, "{}", format!("commit {oid}").yellow())?;
            writeln!(
                writer,
                "Author: {} <{}>",
                commit.author().name(),
                commit.author().email()
            )?;
            writeln!(writer, "Date:   {}", commit.author().timestamp().to_rfc2822())?;
            writeln!(writer)?;
            for line in commit.message().lines() {
                writeln!(writer, "    {line}")?;
            }
            writeln!(writer)?;
        }

        self.show_commit(&oid, parent.as_ref(), path)
    }
}
