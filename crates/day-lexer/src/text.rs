//! Copying snippets of a line into the arena

use crate::arena::{Arena, ArenaSlice};
use crate::error::LexErrorKind;

/// Byte written after every copied snippet
pub const SENTINEL: u8 = 0;

/// Copies `full_text[start..just_after_end]` into the arena
///
/// The copy is followed by a [`SENTINEL`] byte, so the returned slice is
/// one byte longer than the snippet.
pub fn copy_text(
    full_text: &[u8],
    start: usize,
    just_after_end: usize,
    arena: &mut Arena,
) -> Result<ArenaSlice, LexErrorKind> {
    if just_after_end < start || just_after_end > full_text.len() {
        return Err(LexErrorKind::InvalidRange {
            start,
            end: just_after_end,
        });
    }

    let snippet = &full_text[start..just_after_end];
    let slice = arena.allocate(snippet.len() + 1)?;

    let (copy, sentinel) = arena.get_mut(slice)?.split_at_mut(snippet.len());
    copy.copy_from_slice(snippet);
    sentinel[0] = SENTINEL;

    Ok(slice)
}
