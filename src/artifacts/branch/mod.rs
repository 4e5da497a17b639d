//! Ref names and revision expressions
//!
//! - `ref_name`: validated full ref names (`refs/heads/...`, `refs/tags/...`)
//! - `revision`: `@`, names, (abbreviated) ids, `<rev>^` and `<rev>~N`

pub mod ref_name;
pub mod revision;

pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";

pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|\.lock\/|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";
pub const PARENT_REGEX: &str = r"^(.+)\^$";
pub const ANCESTOR_REGEX: &str = r"^(.+)\~(\d+)$";
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};
