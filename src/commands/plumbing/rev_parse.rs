use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object_type::ObjectType;
use crate::commands::registry::CommandContext;
use clap::Args;

#[derive(Args, Debug)]
pub struct RevParseArgs {
    /// Peel the result to an object of this type
    #[arg(long = "type", value_name = "TYPE")]
    object_type: Option<String>,
    revision: String,
}

pub fn run(args: RevParseArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;
    let mut oid = Revision::try_parse(&args.revision)?.resolve(&repository)?;

    if let Some(object_type) = args.object_type {
        let wanted = ObjectType::try_from(object_type.as_str())?;
        oid = repository.database().peel(&oid, wanted)?;
    }

    writeln!(context.writer, "{oid}")?;

    Ok(())
}
