// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! General purpose utilities.
//!
//! None of these have any functionality specific to Melon; they are used by
//! [`melon-tools`](crate) to operate on contract artifacts.

use bytesize::ByteSize;

use color::{GREY, MINT, PINK, YELLOW};

pub mod color;

/// Pretty-prints a bytecode size based on its limits.
pub fn format_file_size(len: ByteSize, mid: ByteSize, max: ByteSize) -> String {
    let color = if len <= mid {
        MINT
    } else if len <= max {
        YELLOW
    } else {
        PINK
    };

    format!("{color}{len}{GREY} ({} bytes)", len.as_u64())
}
