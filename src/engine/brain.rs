//! Brain files: a MessagePack image of the pattern index.
//!
//! ```text
//! "AKBR" | format: u32 (LE) | rmp { bot_name, rules, root }
//! ```
//!
//! Only the index is stored. Sessions, bot predicates and substitution
//! tables belong to the kernel and are not part of a brain.

use super::graph::{PatternIndex, TrieNode};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const MAGIC: &[u8; 4] = b"AKBR";
const FORMAT: u32 = 1;

#[derive(Serialize)]
struct ImageRef<'a> {
    bot_name: &'a str,
    rules: usize,
    root: &'a TrieNode,
}

#[derive(Deserialize)]
struct Image {
    bot_name: String,
    rules: usize,
    root: TrieNode,
}

pub(crate) fn encode(index: &PatternIndex) -> Result<Vec<u8>> {
    let image = ImageRef { bot_name: &index.bot_name, rules: index.rules, root: &index.root };
    let mut bytes = Vec::with_capacity(1024);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT.to_le_bytes());
    bytes.extend(rmp_serde::to_vec_named(&image)?);
    Ok(bytes)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<PatternIndex> {
    if bytes.len() < 8 || &bytes[..4] != MAGIC {
        return Err(Error::BrainFormat { expected: FORMAT, found: None });
    }
    let mut format = [0u8; 4];
    format.copy_from_slice(&bytes[4..8]);
    let format = u32::from_le_bytes(format);
    if format != FORMAT {
        return Err(Error::BrainFormat { expected: FORMAT, found: Some(format) });
    }
    let image: Image = rmp_serde::from_slice(&bytes[8..])?;
    Ok(PatternIndex { root: image.root, rules: image.rules, bot_name: image.bot_name })
}

pub(crate) fn save(index: &PatternIndex, path: &Path) -> Result<()> {
    let bytes = encode(index)?;
    fs::write(path, &bytes).map_err(|err| Error::io(path, err))?;
    log::info!("saved brain with {} rules to {} ({} bytes)", index.rules, path.display(), bytes.len());
    Ok(())
}

pub(crate) fn load(path: &Path) -> Result<PatternIndex> {
    let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
    let index = decode(&bytes)?;
    log::info!("loaded brain with {} rules from {}", index.rules, path.display());
    Ok(index)
}
