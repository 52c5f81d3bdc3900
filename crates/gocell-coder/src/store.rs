//! On-disk value store.
//!
//! One blob file plus one `.type` tag file per key. Go bindings live under
//! `var-<name>` and are written by the generated helper's `_Serialize`;
//! the host reads their tags to build rehydration statements, and writes
//! its own bincode entries (the session snapshot) through the same layout.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const VAR_PREFIX: &str = "var-";
pub const TAG_SUFFIX: &str = ".type";

/// Store key for a Go binding.
pub fn var_key(name: &str) -> String {
    format!("{}{}", VAR_PREFIX, name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    /// A function type; such values only persist their tag.
    Func(String),
    Value(String),
}

impl TypeTag {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with("func(") {
            TypeTag::Func(text.to_string())
        } else {
            TypeTag::Value(text.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Func(sig) => sig,
            TypeTag::Value(ty) => ty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValueStore {
    dir: PathBuf,
}

impl ValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ValueStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn tag_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, TAG_SUFFIX))
    }

    fn read_tag(&self, key: &str, name: &str) -> Result<String, StoreError> {
        let path = self.tag_path(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::Missing {
                name: name.to_string(),
            }),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Recorded type of a Go binding.
    pub fn type_tag(&self, name: &str) -> Result<TypeTag, StoreError> {
        self.read_tag(&var_key(name), name).map(|t| TypeTag::parse(&t))
    }

    /// Statement that brings `name` back into scope at the top of `main`.
    ///
    /// Function values replay their literal source; everything else is
    /// decoded by name with the recorded type.
    pub fn rehydration(&self, name: &str, literal: Option<&str>) -> Result<String, StoreError> {
        if let Some(literal) = literal {
            return Ok(format!("{} := {}", name, literal));
        }
        match self.type_tag(name)? {
            TypeTag::Func(_) => Err(StoreError::UnregisteredFunction {
                name: name.to_string(),
            }),
            TypeTag::Value(ty) => {
                let key = var_key(name);
                if !self.blob_path(&key).exists() {
                    return Err(StoreError::Missing {
                        name: name.to_string(),
                    });
                }
                Ok(format!("{}, _ := _Deserialize[{}](\"{}\")", name, ty, key))
            }
        }
    }

    /// Writes a host-side value under `key`, tagged with `tag`.
    pub fn encode<T: Serialize>(&self, key: &str, tag: &str, value: &T) -> Result<(), StoreError> {
        let bytes = bincode::serialize(value).map_err(|source| StoreError::Encode {
            name: key.to_string(),
            source,
        })?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let blob = self.blob_path(key);
        fs::write(&blob, bytes).map_err(|source| StoreError::Io { path: blob, source })?;
        let tag_path = self.tag_path(key);
        fs::write(&tag_path, tag).map_err(|source| StoreError::Io {
            path: tag_path,
            source,
        })
    }

    /// Reads a host-side value; the stored tag must equal `tag`.
    pub fn decode<T: DeserializeOwned>(&self, key: &str, tag: &str) -> Result<T, StoreError> {
        let found = self.read_tag(key, key)?;
        if found != tag {
            return Err(StoreError::TypeMismatch {
                name: key.to_string(),
                expected: tag.to_string(),
                found,
            });
        }
        let blob = self.blob_path(key);
        let bytes = match fs::read(&blob) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Missing {
                    name: key.to_string(),
                })
            }
            Err(source) => return Err(StoreError::Io { path: blob, source }),
        };
        bincode::deserialize(&bytes).map_err(|source| StoreError::Decode {
            name: key.to_string(),
            source,
        })
    }
}
