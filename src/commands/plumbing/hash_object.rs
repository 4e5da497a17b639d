use crate::areas::repository::Repository;
use crate::artifacts::objects::object::{GitObject, encode_payload};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::commands::registry::CommandContext;
use anyhow::Context;
use bytes::Bytes;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HashObjectArgs {
    /// Store the object in the repository
    #[arg(short, long)]
    write: bool,
    #[arg(short = 't', long = "type", default_value = "blob", value_name = "TYPE")]
    object_type: String,
    file: PathBuf,
}

pub fn run(args: HashObjectArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let object_type = ObjectType::try_from(args.object_type.as_str())?;
    let path = context.cwd.join(&args.file);
    let data = std::fs::read(&path).with_context(|| format!("Unable to read {}", path.display()))?;

    // reject payloads that would not load back as the claimed type
    GitObject::deserialize(object_type, Bytes::from(data.clone()))?;

    let oid = if args.write {
        context.repository()?.hash_object(object_type, &data)?
    } else {
        ObjectId::hash(&encode_payload(object_type, &data)?)
    };

    writeln!(context.writer, "{oid}")?;

    Ok(())
}

impl Repository {
    pub fn hash_object(&self, object_type: ObjectType, data: &[u8]) -> anyhow::Result<ObjectId> {
        self.database().store_payload(object_type, data)
    }
}
