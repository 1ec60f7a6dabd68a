// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

#![allow(dead_code)]

use std::fmt::{Debug, Display};

pub const RESET: &str = "\x1b[0;0m";
pub const BLUE: &str = "\x1b[0;94m";
pub const GREY: &str = "\x1b[0;90m";
pub const LAVENDER: &str = "\x1b[38;5;183;1m";
pub const MINT: &str = "\x1b[38;5;121;1m";
pub const PINK: &str = "\x1b[38;5;161;1m";
pub const RED: &str = "\x1b[0;31;1m";
pub const YELLOW: &str = "\x1b[0;33m";

/// Adds terminal colors to displayable items.
pub trait Color: Display {
    fn color(&self, color: &str) -> String {
        format!("{color}{self}{RESET}")
    }

    fn blue(&self) -> String {
        self.color(BLUE)
    }
    fn grey(&self) -> String {
        self.color(GREY)
    }
    fn lavender(&self) -> String {
        self.color(LAVENDER)
    }
    fn mint(&self) -> String {
        self.color(MINT)
    }
    fn pink(&self) -> String {
        self.color(PINK)
    }
    fn red(&self) -> String {
        self.color(RED)
    }
    fn yellow(&self) -> String {
        self.color(YELLOW)
    }
}

impl<T: Display> Color for T {}

/// Adds terminal colors to debuggable items.
pub trait DebugColor: Debug {
    fn debug_color(&self, color: &str) -> String {
        format!("{color}{self:?}{RESET}")
    }

    fn debug_grey(&self) -> String {
        self.debug_color(GREY)
    }
    fn debug_lavender(&self) -> String {
        self.debug_color(LAVENDER)
    }
    fn debug_mint(&self) -> String {
        self.debug_color(MINT)
    }
    fn debug_red(&self) -> String {
        self.debug_color(RED)
    }
}

impl<T: Debug> DebugColor for T {}
