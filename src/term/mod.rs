// SPDX-License-Identifier: MIT

//! Terminal byte plumbing: the line editor (C1) and the byte classifier (C2).

pub mod classify;
pub mod editor;

pub use classify::{
    escape_history_command, escape_tab_completion, get_width_and_height,
    has_down_arrow_suffix, has_up_arrow_suffix, is_bell, is_cr, is_tab,
    valid_utf8_prefix_len,
};
pub use editor::{escape_input, LineEditor};
