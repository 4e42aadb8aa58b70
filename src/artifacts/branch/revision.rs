use crate::areas::database::Database;
use crate::areas::refs::{HEAD_REF_NAME, Refs};
use crate::artifacts::branch::{
    ANCESTOR_REGEX, INVALID_BRANCH_NAME_REGEX, PARENT_REGEX, REF_ALIASES,
};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;

const MIN_ABBREVIATED_LENGTH: usize = 4;

/// A revision expression naming a commit
///
/// - `HEAD`, `@` or a branch name
/// - a full or abbreviated (at least 4 characters) object id
/// - `<rev>^` for the first parent and `<rev>~<n>` for the n-th first-parent ancestor
///
/// Refs win over object ids when a name could be both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Ref(String),
    Parent(Box<Revision>),
    Ancestor(Box<Revision>, usize),
}

impl Revision {
    pub fn try_parse(revision: &str) -> anyhow::Result<Revision> {
        let parent = regex::Regex::new(PARENT_REGEX)
            .with_context(|| format!("invalid parent regex: {PARENT_REGEX}"))?;
        if let Some(caps) = parent.captures(revision) {
            return Ok(Revision::Parent(Box::new(Self::try_parse(&caps[1])?)));
        }

        let ancestor = regex::Regex::new(ANCESTOR_REGEX)
            .with_context(|| format!("invalid ancestor regex: {ANCESTOR_REGEX}"))?;
        if let Some(caps) = ancestor.captures(revision) {
            let generations = caps[2]
                .parse()
                .with_context(|| format!("invalid generation count in {revision}"))?;
            return Ok(Revision::Ancestor(
                Box::new(Self::try_parse(&caps[1])?),
                generations,
            ));
        }

        let name = *REF_ALIASES.get(revision).unwrap_or(&revision);
        let invalid = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .with_context(|| format!("invalid branch name regex: {INVALID_BRANCH_NAME_REGEX}"))?;
        if name.is_empty() || invalid.is_match(name) {
            anyhow::bail!("invalid revision: {revision:?}");
        }

        Ok(Revision::Ref(name.to_string()))
    }

    /// The commit named by this revision, `None` for an unborn branch or a missing parent
    pub fn resolve(&self, refs: &Refs, database: &Database) -> anyhow::Result<Option<ObjectId>> {
        match self {
            Revision::Ref(name) => match refs.read_ref(name)? {
                Some(oid) => Ok(Some(oid)),
                None if Self::looks_like_oid(name) => Self::resolve_oid(name, database).map(Some),
                None if name == HEAD_REF_NAME => Ok(None),
                None => anyhow::bail!("unknown revision or branch: {name}"),
            },
            Revision::Parent(base) => {
                Self::commit_parent(base.resolve(refs, database)?, database)
            }
            Revision::Ancestor(base, generations) => {
                let mut oid = base.resolve(refs, database)?;
                for _ in 0..*generations {
                    oid = Self::commit_parent(oid, database)?;
                }
                Ok(oid)
            }
        }
    }

    fn commit_parent(
        oid: Option<ObjectId>,
        database: &Database,
    ) -> anyhow::Result<Option<ObjectId>> {
        let Some(oid) = oid else {
            return Ok(None);
        };

        let commit = database
            .parse_object_as_commit(&oid)?
            .with_context(|| format!("object {oid} is not a commit"))?;

        Ok(commit.parent().cloned())
    }

    fn resolve_oid(prefix: &str, database: &Database) -> anyhow::Result<ObjectId> {
        if prefix.len() == OBJECT_ID_LENGTH {
            let oid = ObjectId::try_parse(prefix.to_string())?;
            Self::ensure_commit(&oid, database)?;
            return Ok(oid);
        }

        let commits = database
            .find_objects_by_prefix(prefix)?
            .into_iter()
            .filter(|oid| Self::ensure_commit(oid, database).is_ok())
            .collect::<Vec<_>>();

        match commits.as_slice() {
            [] => anyhow::bail!("unknown revision: {prefix}"),
            [oid] => Ok(oid.clone()),
            candidates => {
                let hints = candidates
                    .iter()
                    .map(|oid| format!("\nhint:   {} commit", oid.to_short_oid()))
                    .collect::<String>();
                anyhow::bail!("short SHA1 {prefix} is ambiguous\nhint: The candidates are:{hints}")
            }
        }
    }

    fn ensure_commit(oid: &ObjectId, database: &Database) -> anyhow::Result<()> {
        let object_type = database
            .parse_object(oid)
            .with_context(|| format!("object {oid} not found"))?
            .object_type();

        if object_type != ObjectType::Commit {
            anyhow::bail!("object {} is a {object_type}, not a commit", oid.to_short_oid());
        }

        Ok(())
    }

    fn looks_like_oid(name: &str) -> bool {
        (MIN_ABBREVIATED_LENGTH..=OBJECT_ID_LENGTH).contains(&name.len())
            && name.chars().all(|c| c.is_ascii_hexdigit())
    }
}
