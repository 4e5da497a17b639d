//! Header block codec for commits and tags
//!
//! ```text
//! <key> <value>\n         (repeated, keys may repeat)
//!  <continuation>\n       (a leading space folds the line into the previous value)
//! \n
//! <message>
//! ```
//!
//! Headers keep their original order so that decoding and re-encoding is
//! byte-identical.

use crate::errors::RepositoryError;
use bytes::Bytes;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    headers: Vec<(String, String)>,
    message: String,
}

fn corrupt(reason: &str) -> anyhow::Error {
    RepositoryError::CorruptObject(format!("malformed header block: {reason}")).into()
}

impl Kvlm {
    pub fn new(message: String) -> Self {
        Kvlm {
            headers: Vec::new(),
            message,
        }
    }

    pub fn push(&mut self, key: &str, value: String) {
        self.headers.push((key.to_string(), value));
    }

    /// First value recorded under `key`.
    pub fn get<'a>(&'a self, key: &str) -> Option<&'a str> {
        self.get_all(key).next()
    }

    pub fn get_all<'a, 'k>(&'a self, key: &'k str) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
        self.headers
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn serialize(&self) -> Bytes {
        let mut out = String::new();

        for (key, value) in &self.headers {
            out.push_str(key);
            out.push(' ');
            out.push_str(&value.replace('\n', "\n "));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.message);

        Bytes::from(out)
    }

    pub fn parse(payload: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(payload).map_err(|_| corrupt("not UTF-8"))?;
        let mut kvlm = Kvlm::default();
        let mut rest = text;

        loop {
            if let Some(message) = rest.strip_prefix('\n') {
                kvlm.message = message.to_string();
                return Ok(kvlm);
            }

            let line_end = rest.find('\n').ok_or_else(|| corrupt("missing blank line"))?;
            let space = rest[..line_end]
                .find(' ')
                .ok_or_else(|| corrupt("header line without value"))?;
            let key = &rest[..space];

            // the value runs until a newline that is not followed by a space
            let mut value_end = line_end;
            while rest[value_end + 1..].starts_with(' ') {
                value_end += 1 + rest[value_end + 1..]
                    .find('\n')
                    .ok_or_else(|| corrupt("unterminated continuation line"))?;
            }

            let value = rest[space + 1..value_end].replace("\n ", "\n");
            kvlm.headers.push((key.to_string(), value));
            rest = &rest[value_end + 1..];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SIGNED: &str = "tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
parent 206941306e8a8af65b66eaaaea388a7ae24d49a0\n\
author Thibault Polge <thibault@thb.lt> 1527025023 +0200\n\
committer Thibault Polge <thibault@thb.lt> 1527025044 +0200\n\
gpgsig -----BEGIN PGP SIGNATURE-----\n \n iQIzBAABCAAdFiEExwXquOM8bWb4Q2zVGxM2FxoLkGQFAlsEjZQACgkQGxM2FxoL\n -----END PGP SIGNATURE-----\n\
\n\
Create first draft";

    #[test]
    fn parses_repeated_and_continued_headers() {
        let kvlm = Kvlm::parse(SIGNED.as_bytes()).unwrap();

        assert_eq!(kvlm.get("tree"), Some("29ff16c9c14e2652b22f8b78bb08a5a07930c147"));
        assert_eq!(kvlm.get_all("parent").count(), 1);
        assert_eq!(
            kvlm.get("gpgsig"),
            Some(
                "-----BEGIN PGP SIGNATURE-----\n\niQIzBAABCAAdFiEExwXquOM8bWb4Q2zVGxM2FxoLkGQFAlsEjZQACgkQGxM2FxoL\n-----END PGP SIGNATURE-----"
            )
        );
        assert_eq!(kvlm.message(), "Create first draft");
    }

    #[test]
    fn values_outlive_the_lookup_key() {
        let kvlm = Kvlm::parse(SIGNED.as_bytes()).unwrap();

        let (tree, parents) = {
            let tree_key = String::from("tree");
            let parent_key = String::from("parent");
            (kvlm.get(&tree_key), kvlm.get_all(&parent_key).collect::<Vec<_>>())
        };

        assert_eq!(tree, Some("29ff16c9c14e2652b22f8b78bb08a5a07930c147"));
        assert_eq!(parents, vec!["206941306e8a8af65b66eaaaea388a7ae24d49a0"]);
    }

    #[test]
    fn reencoding_is_byte_identical() {
        let kvlm = Kvlm::parse(SIGNED.as_bytes()).unwrap();

        assert_eq!(kvlm.serialize().as_ref(), SIGNED.as_bytes());
    }

    #[test]
    fn empty_message_is_allowed() {
        let kvlm = Kvlm::parse(b"tag v1\n\n").unwrap();

        assert_eq!(kvlm.get("tag"), Some("v1"));
        assert_eq!(kvlm.message(), "");
    }

    #[test]
    fn missing_blank_line_is_corrupt() {
        let error = Kvlm::parse(b"tree abc\nauthor x").unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::CorruptObject(_))
        ));
    }
}
