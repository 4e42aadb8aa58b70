//! Git commit object
//!
//! ## Format
//!
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! Headers the engine does not use (`gpgsig`, `encoding`, `mergetag`, ...)
//! are skipped when reading, continuation lines included.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use std::io::{BufRead, Write};

const AUTHOR_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Author or committer signature
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Author {
    pub fn new(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    pub fn now(name: String, email: String) -> Self {
        Self::new(name, email, chrono::Local::now().fixed_offset())
    }

    /// Read `GIT_AUTHOR_NAME`, `GIT_AUTHOR_EMAIL` and the optional `GIT_AUTHOR_DATE`
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = std::env::var("GIT_AUTHOR_NAME").context("GIT_AUTHOR_NAME not set")?;
        let email = std::env::var("GIT_AUTHOR_EMAIL").context("GIT_AUTHOR_EMAIL not set")?;
        let timestamp = std::env::var("GIT_AUTHOR_DATE").ok().and_then(|date| {
            DateTime::parse_from_rfc2822(&date)
                .or_else(|_| DateTime::parse_from_str(&date, AUTHOR_DATE_FORMAT))
                .ok()
        });

        Ok(match timestamp {
            Some(timestamp) => Author::new(name, email, timestamp),
            None => Author::now(name, email),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn short_date(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    /// Signature as written in the object: `name <email> seconds zone`
    pub fn signature(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        let email_start = value.find('<').context("Invalid signature: missing '<'")?;
        let email_end = value.rfind('>').context("Invalid signature: missing '>'")?;
        if email_end < email_start {
            anyhow::bail!("Invalid signature {value:?}");
        }

        let name = value[..email_start].trim().to_string();
        let email = value[email_start + 1..email_end].to_string();

        let mut when = value[email_end + 1..].split_whitespace();
        let seconds = when
            .next()
            .context("Invalid signature: missing timestamp")?
            .parse::<i64>()
            .context("Invalid signature timestamp")?;
        let zone = when.next().unwrap_or("+0000");

        let offset = parse_zone(zone).context("Invalid signature timezone")?;
        let timestamp = DateTime::from_timestamp(seconds, 0)
            .context("Invalid signature timestamp")?
            .with_timezone(&offset);

        Ok(Author::new(name, email, timestamp))
    }
}

fn parse_zone(zone: &str) -> Option<FixedOffset> {
    let (sign, digits) = match zone.split_at_checked(1)? {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return None,
    };
    if digits.len() != 4 {
        return None;
    }
    let hours = digits[..2].parse::<i32>().ok()?;
    let minutes = digits[2..].parse::<i32>().ok()?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    pub fn new(parents: Vec<ObjectId>, tree_oid: ObjectId, author: Author, message: String) -> Self {
        Commit {
            parents,
            tree_oid,
            committer: author.clone(),
            author,
            message,
        }
    }

    pub fn short_message(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    /// First parent, the one history walks follow
    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content = format!("tree {}\n", self.tree_oid);
        for parent in &self.parents {
            content.push_str(&format!("parent {parent}\n"));
        }
        content.push_str(&format!("author {}\n", self.author.signature()));
        content.push_str(&format!("committer {}\n", self.committer.signature()));
        content.push('\n');
        content.push_str(&self.message);
        if !self.message.ends_with('\n') {
            content.push('\n');
        }

        let mut commit_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content.len());
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(content.as_bytes())?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let content = String::from_utf8_lossy(&content);

        let (headers, message) = content
            .split_once("\n\n")
            .unwrap_or((content.as_ref(), ""));

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            // continuation of a multi-line header such as gpgsig
            if line.starts_with(' ') {
                continue;
            }
            match line.split_once(' ') {
                Some(("tree", oid)) => tree_oid = Some(ObjectId::try_parse(oid.to_string())?),
                Some(("parent", oid)) => parents.push(ObjectId::try_parse(oid.to_string())?),
                Some(("author", signature)) => author = Some(Author::try_from(signature)?),
                Some(("committer", signature)) => committer = Some(Author::try_from(signature)?),
                _ => {}
            }
        }

        let author = author.context("Invalid commit object: missing author line")?;
        Ok(Commit {
            parents,
            tree_oid: tree_oid.context("Invalid commit object: missing tree line")?,
            committer: committer.unwrap_or_else(|| author.clone()),
            author,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}
