use crate::areas::repository::Repository;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object_type::ObjectType;
use crate::commands::registry::CommandContext;
use bytes::Bytes;
use clap::Args;

#[derive(Args, Debug)]
pub struct CatFileArgs {
    /// Expected type; tags and commits are peeled to reach it
    #[arg(value_name = "TYPE")]
    object_type: String,
    object: String,
}

pub fn run(args: CatFileArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;
    let object_type = ObjectType::try_from(args.object_type.as_str())?;

    let payload = repository.cat_file(&args.object, object_type)?;
    context.writer.write_all(&payload)?;

    Ok(())
}

impl Repository {
    /// Raw payload of the object `revision` names, peeled to `object_type`.
    pub fn cat_file(&self, revision: &str, object_type: ObjectType) -> anyhow::Result<Bytes> {
        let oid = Revision::try_parse(revision)?.resolve(self)?;
        let oid = self.database().peel(&oid, object_type)?;

        let (_, payload) = self.database().load(&oid)?;
        Ok(payload)
    }
}
