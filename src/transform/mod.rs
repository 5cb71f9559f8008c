//! Forward transformation: call-site rewriting, import management, and
//! capability injection.
//!
//! Rewriting never mutates the tree in place. Each pass parses, collects
//! `{start, end, text}` edits into an [`EditArena`](crate::core::EditArena),
//! and applies them in one batch; multi-pass operations (imports, then
//! injection) re-parse between passes so every edit is computed against the
//! text it will be applied to.

pub mod cleanup;
pub mod imports;
pub mod inject;
pub mod react;
pub mod vue;

use std::path::Path;

use anyhow::Result;
use enum_dispatch::enum_dispatch;

use crate::adapter::Transformer;
use crate::core::ExtractedString;
use crate::transform::react::ReactTransformer;
use crate::transform::vue::VueTransformer;

/// Framework-specific forward transformer.
#[enum_dispatch]
pub trait Transform {
    /// Rewrite every extracted call site in one file.
    ///
    /// Returns `None` when the output is byte-identical to the input, which
    /// callers use to skip the file write entirely.
    fn transform_file(
        &self,
        root: &Path,
        file: &str,
        extracted: &[ExtractedString],
        include_default: bool,
    ) -> Result<Option<String>>;
}
