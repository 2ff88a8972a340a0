/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Options controlling how malformed nesting is handled.
///
/// Deserializes from kebab-case keys so it can sit inside a larger
/// configuration file:
///
/// ```yaml
/// recover: true
/// unmatched-end-tag: ignore
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParseOptions {
    /// Recover from mismatched, stray and missing end tags instead of
    /// failing.
    pub recover: bool,

    /// What to do with an end tag that matches no open element.
    pub unmatched_end_tag: UnmatchedEndTagPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            recover: true,
            unmatched_end_tag: UnmatchedEndTagPolicy::default(),
        }
    }
}

impl ParseOptions {
    /// Options that turn every nesting recovery into an error.
    pub fn strict() -> Self {
        Self {
            recover: false,
            ..Self::default()
        }
    }
}

/// Handling of an end tag whose name matches no open element.
///
/// Either way the end tag stays in the tree as an empty text node that
/// serializes to the tag as written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnmatchedEndTagPolicy {
    /// Close every open element, hoisting children, up to the document.
    #[default]
    CloseToRoot,
    /// Leave the open elements as they are.
    Ignore,
}
