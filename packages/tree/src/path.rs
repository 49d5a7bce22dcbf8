//! Canonical node paths.
//!
//! A path is the root token followed by one segment per edge, joined by `|`:
//!
//! ```text
//! <ROOT>|workups|<ListIndex>1|type      concrete (MOT, prototype)
//! <ROOT>|workups|<ListIndex>|type       type level (MTT)
//! <ROOT>|inputs|<DictKey>solvent|name
//! <ROOT>|inputs|<DictKey>a\|b|name     map key "a|b"
//! ```
//!
//! Map keys are free text, so `|` and `\` inside a key are written with a
//! leading `\`.

use crate::error::{TreeError, TreeResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ROOT_PATH: &str = "<ROOT>";
pub const PATH_DELIMITER: &str = "|";
pub const LIST_INDEX: &str = "<ListIndex>";
pub const DICT_KEY: &str = "<DictKey>";
pub const PATH_ESCAPE: char = '\\';

pub fn join(parent: &str, segment: &str) -> String {
    format!("{}{}{}", parent, PATH_DELIMITER, segment)
}

/// Escape a map key for use inside a path segment
pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        if c == PATH_ESCAPE || PATH_DELIMITER.starts_with(c) {
            escaped.push(PATH_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn unescape_key(escaped: &str) -> TreeResult<String> {
    let mut key = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == PATH_ESCAPE {
            match chars.next() {
                Some(next) => key.push(next),
                None => return Err(TreeError::malformed(format!("dangling escape in key '{}'", escaped))),
            }
        } else if PATH_DELIMITER.starts_with(c) {
            return Err(TreeError::malformed(format!("unescaped delimiter in key '{}'", escaped)));
        } else {
            key.push(c);
        }
    }
    Ok(key)
}

/// Split a path on unescaped delimiters; segments keep their escapes
pub fn segments(path: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in path.char_indices() {
        if escaped {
            escaped = false;
        } else if c == PATH_ESCAPE {
            escaped = true;
        } else if PATH_DELIMITER.starts_with(c) {
            parts.push(&path[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&path[start..]);
    parts
}

/// Replace concrete list indices and map keys with their sentinels
pub fn to_type_path(concrete: &str) -> String {
    segments(concrete)
        .into_iter()
        .map(|segment| {
            if segment.starts_with(LIST_INDEX) {
                LIST_INDEX
            } else if segment.starts_with(DICT_KEY) {
                DICT_KEY
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join(PATH_DELIMITER)
}

/// Relation of a node to its parent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    /// Named field of a message
    Field(String),
    /// Position in a list
    Index(usize),
    /// Key in a map
    Key(String),
}

impl Relation {
    /// Path segment with the concrete index or key
    pub fn segment(&self) -> String {
        match self {
            Relation::Field(name) => name.clone(),
            Relation::Index(i) => format!("{}{}", LIST_INDEX, i),
            Relation::Key(k) => format!("{}{}", DICT_KEY, escape_key(k)),
        }
    }

    /// Path segment at the type level
    pub fn sentinel(&self) -> &str {
        match self {
            Relation::Field(name) => name,
            Relation::Index(_) => LIST_INDEX,
            Relation::Key(_) => DICT_KEY,
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        match self {
            Relation::Field(name) => Some(name),
            _ => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Relation::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Relation::Key(k) => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment())
    }
}

impl FromStr for Relation {
    type Err = TreeError;

    fn from_str(s: &str) -> TreeResult<Self> {
        if let Some(index) = s.strip_prefix(LIST_INDEX) {
            return index
                .parse()
                .map(Relation::Index)
                .map_err(|_| TreeError::malformed(format!("bad list index segment '{}'", s)));
        }
        if let Some(key) = s.strip_prefix(DICT_KEY) {
            return unescape_key(key).map(Relation::Key);
        }
        if s.is_empty() || s.contains(PATH_DELIMITER) {
            return Err(TreeError::malformed(format!("bad field segment '{}'", s)));
        }
        Ok(Relation::Field(s.to_string()))
    }
}

impl Serialize for Relation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.segment())
    }
}

impl<'de> Deserialize<'de> for Relation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_path_replaces_positions() {
        let concrete = "<ROOT>|inputs|<DictKey>solvent|amount|value";
        assert_eq!(to_type_path(concrete), "<ROOT>|inputs|<DictKey>|amount|value");
        assert_eq!(to_type_path("<ROOT>|workups|<ListIndex>12"), "<ROOT>|workups|<ListIndex>");
    }

    #[test]
    fn test_relation_segments() {
        for relation in [
            Relation::Field("name".into()),
            Relation::Index(3),
            Relation::Key("solvent".into()),
        ] {
            assert_eq!(relation.segment().parse::<Relation>().unwrap(), relation);
        }
        assert_eq!(Relation::Index(7).sentinel(), LIST_INDEX);
        assert!("<ListIndex>x".parse::<Relation>().is_err());
    }

    #[test]
    fn test_key_delimiters_are_escaped() {
        let relation = Relation::Key(r"x|name\y".into());
        assert_eq!(relation.segment(), r"<DictKey>x\|name\\y");
        assert_eq!(relation.segment().parse::<Relation>().unwrap(), relation);
        assert!("<DictKey>x|y".parse::<Relation>().is_err());
        assert!(r"<DictKey>x\".parse::<Relation>().is_err());

        let concrete = join("<ROOT>|inputs", &relation.segment());
        assert_eq!(segments(&concrete).len(), 3);
        assert_eq!(to_type_path(&join(&concrete, "name")), "<ROOT>|inputs|<DictKey>|name");
    }
}
