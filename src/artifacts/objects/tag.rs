//! Annotated tag object
//!
//! ```text
//! object <sha>
//! type <object type>
//! tag <name>
//! tagger <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```

use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::kvlm::Kvlm;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use bytes::Bytes;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Tag {
    kvlm: Kvlm,
    object: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: Option<Author>,
}

impl Tag {
    pub fn new(
        object: ObjectId,
        target_type: ObjectType,
        name: String,
        tagger: Author,
        message: String,
    ) -> Self {
        let mut kvlm = Kvlm::new(message);
        kvlm.push("object", object.to_string());
        kvlm.push("type", target_type.to_string());
        kvlm.push("tag", name.clone());
        kvlm.push("tagger", tagger.display());

        Tag {
            kvlm,
            object,
            target_type,
            name,
            tagger: Some(tagger),
        }
    }

    pub fn object(&self) -> &ObjectId {
        &self.object
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Very old tags carry no tagger line.
    pub fn tagger(&self) -> Option<&Author> {
        self.tagger.as_ref()
    }

    pub fn message(&self) -> &str {
        self.kvlm.message()
    }

    pub fn display(&self) -> String {
        String::from_utf8_lossy(&self.kvlm.serialize()).into_owned()
    }
}

fn corrupt(reason: impl Into<String>) -> anyhow::Error {
    RepositoryError::CorruptObject(format!("malformed tag: {}", reason.into())).into()
}

impl Packable for Tag {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(self.kvlm.serialize())
    }
}

impl Unpackable for Tag {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        let kvlm = Kvlm::parse(&payload)?;

        let object = kvlm.get("object").ok_or_else(|| corrupt("missing object"))?;
        let object = ObjectId::try_parse(object.to_string()).map_err(|e| corrupt(e.to_string()))?;
        let target_type = kvlm.get("type").ok_or_else(|| corrupt("missing type"))?;
        let target_type = ObjectType::try_from(target_type)?;
        let name = kvlm.get("tag").ok_or_else(|| corrupt("missing tag name"))?.to_string();
        let tagger = kvlm
            .get("tagger")
            .map(|raw| Author::try_from(raw).map_err(|e| corrupt(e.to_string())))
            .transpose()?;

        Ok(Tag {
            kvlm,
            object,
            target_type,
            name,
            tagger,
        })
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_keeps_fields() {
        let timestamp = chrono::DateTime::parse_from_rfc2822("Sun, 01 Jan 2023 12:00:00 +0000").unwrap();
        let tagger = Author::new_with_timestamp("tagger".into(), "t@example.com".into(), timestamp);
        let tag = Tag::new(
            ObjectId::hash(b"commit"),
            ObjectType::Commit,
            "v1.0".into(),
            tagger,
            "release\n".into(),
        );

        let decoded = Tag::deserialize(tag.serialize().unwrap()).unwrap();
        assert_eq!(decoded, tag);
        assert_eq!(decoded.name(), "v1.0");
        assert_eq!(decoded.target_type(), ObjectType::Commit);
    }

    #[test]
    fn unknown_target_type_is_reported() {
        let payload = format!("object {}\ntype gadget\ntag x\n\n", ObjectId::hash(b"x"));
        let error = Tag::deserialize(Bytes::from(payload)).unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::UnknownObjectType(kind)) if kind == "gadget"
        ));
    }
}
