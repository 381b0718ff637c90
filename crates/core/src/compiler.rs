//! The artifact compiler: validated design in, self-contained bundle out.
//!
//! Compilation is pure and deterministic. The compiler never interprets the
//! design's free text; it assembles a fixed document skeleton and injects the
//! design's content fields as escaped data. The only embedded logic is the
//! already-validated game markup, placed in a dedicated slot so the result is
//! syntactically self-contained. Compiling the same design twice yields a
//! byte-identical bundle.

use crate::design::GameDesign;
use crate::error::PipelineError;
use std::collections::BTreeSet;

/// The compiled, executable form of a game artifact. Owned by the host
/// display layer for one play session and replaced wholesale on
/// regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeBundle {
    pub title: String,
    pub instructions: String,
    /// A complete, self-contained markup document with no external
    /// references.
    pub document: String,
    /// Achievement titles the bundle may report. The bridge dedupes against
    /// this session's unlocked set.
    pub achievements: BTreeSet<String>,
}

const SLOT_TITLE: &str = "__SPROUT_TITLE__";
const SLOT_INSTRUCTIONS: &str = "__SPROUT_INSTRUCTIONS__";
const SLOT_GAME: &str = "__SPROUT_GAME__";

/// Fixed document skeleton. Structure and styling are constant; only the
/// three slots vary per design.
const SKELETON: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>__SPROUT_TITLE__</title>
<style>
  body { margin: 0; font-family: system-ui, sans-serif; }
  .sprout-header { padding: 12px 16px; background: #f4f8f4; border-bottom: 2px solid #cde3cd; }
  .sprout-header h1 { margin: 0 0 4px 0; font-size: 1.3rem; }
  .sprout-header p { margin: 0; font-size: 1rem; }
  .sprout-stage { width: 100%; }
</style>
</head>
<body>
<header class="sprout-header" role="banner">
  <h1>__SPROUT_TITLE__</h1>
  <p>__SPROUT_INSTRUCTIONS__</p>
</header>
<main class="sprout-stage" role="main">
__SPROUT_GAME__
</main>
</body>
</html>
"#;

/// Escapes text for safe injection into markup data slots.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strips the outer document shell from the generated markup so it can live
/// inside the skeleton's stage. The service is asked for a full document;
/// keeping only its body content prevents nested `<html>` roots.
fn stage_content(markup: &str) -> &str {
    let inner = match (markup.find("<body"), markup.rfind("</body>")) {
        (Some(open), Some(close)) if open < close => {
            // Skip past the opening tag itself.
            match markup[open..close].find('>') {
                Some(end) => &markup[open + end + 1..close],
                None => markup,
            }
        }
        _ => markup,
    };
    inner.trim()
}

/// Fills the skeleton's slots in a single left-to-right pass over the
/// skeleton. Inserted values are never rescanned, so a slot token appearing
/// inside design content stays inert data instead of becoming a slot.
fn fill_slots(title: &str, instructions: &str, game: &str) -> String {
    let mut out = String::with_capacity(SKELETON.len() + game.len());
    let mut rest = SKELETON;
    while let Some((at, slot)) = [SLOT_TITLE, SLOT_INSTRUCTIONS, SLOT_GAME]
        .into_iter()
        .filter_map(|slot| rest.find(slot).map(|at| (at, slot)))
        .min_by_key(|(at, _)| *at)
    {
        out.push_str(&rest[..at]);
        if slot == SLOT_TITLE {
            out.push_str(title);
        } else if slot == SLOT_INSTRUCTIONS {
            out.push_str(instructions);
        } else {
            out.push_str(game);
        }
        rest = &rest[at + slot.len()..];
    }
    out.push_str(rest);
    out
}

/// Compiles a validated game design into a runtime bundle.
///
/// Fails with `CompilationError` when a required slot cannot be filled; that
/// is an internal invariant violation, not recoverable by retry.
pub fn compile(design: &GameDesign) -> Result<RuntimeBundle, PipelineError> {
    let title = design.title.trim();
    if title.is_empty() {
        return Err(PipelineError::CompilationError(
            "title slot cannot be filled from an empty title".to_string(),
        ));
    }
    let game = stage_content(&design.markup);
    if game.is_empty() {
        return Err(PipelineError::CompilationError(
            "game slot cannot be filled from empty markup".to_string(),
        ));
    }

    let document = fill_slots(
        &escape_html(title),
        &escape_html(design.instructions.trim()),
        game,
    );

    Ok(RuntimeBundle {
        title: title.to_string(),
        instructions: design.instructions.trim().to_string(),
        document,
        achievements: design.achievements.clone(),
    })
}
