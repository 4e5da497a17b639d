use crate::areas::repository::Repository;
use crate::artifacts::branch::TAGS_PREFIX;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tag::Tag;
use crate::commands::registry::CommandContext;
use clap::Args;

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Create an annotated tag object instead of a bare ref
    #[arg(short, long, requires = "name")]
    annotate: bool,
    /// Message of an annotated tag
    #[arg(short, long, requires = "annotate")]
    message: Option<String>,
    /// Tag to create; lists tags when omitted
    name: Option<String>,
    /// What the tag points at
    #[arg(default_value = "HEAD")]
    object: String,
}

pub fn run(args: TagArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;

    let Some(name) = args.name else {
        for tag in repository.list_tags()? {
            writeln!(context.writer, "{tag}")?;
        }
        return Ok(());
    };

    let target = Revision::try_parse(&args.object)?.resolve(&repository)?;
    if args.annotate {
        let message = args.message.unwrap_or_default();
        repository.create_annotated_tag(&name, &target, &message)?;
    } else {
        repository.create_lightweight_tag(&name, &target)?;
    }

    Ok(())
}

impl Repository {
    /// Short names of all tags, sorted.
    pub fn list_tags(&self) -> anyhow::Result<Vec<String>> {
        Ok(self
            .refs()
            .list()?
            .into_iter()
            .filter_map(|(name, _)| name.strip_prefix(TAGS_PREFIX).map(str::to_string))
            .collect())
    }

    pub fn create_lightweight_tag(&self, name: &str, target: &ObjectId) -> anyhow::Result<()> {
        self.refs().create(&RefName::tag(name)?, target)
    }

    /// Store a tag object for `target` and point `refs/tags/<name>` at it.
    pub fn create_annotated_tag(&self, name: &str, target: &ObjectId, message: &str) -> anyhow::Result<ObjectId> {
        let ref_name = RefName::tag(name)?;
        let tag = Tag::new(
            target.clone(),
            self.database().get_object_type(target)?,
            name.to_string(),
            self.author()?,
            format!("{}\n", message.trim_end()),
        );

        let tag_oid = self.database().store(&tag)?;
        self.refs().create(&ref_name, &tag_oid)?;

        Ok(tag_oid)
    }
}
