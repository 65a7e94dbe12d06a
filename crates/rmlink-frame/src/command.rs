//! Command payload builder.
//!
//! The robot speaks a plaintext command language: space-separated ASCII
//! tokens such as `chassis speed x 0.5 y 0 z 0`. A [`Command`] collects those
//! tokens and encodes them into a Command frame under a correlation key.

use std::fmt;

use bytes::Bytes;

use crate::codec::Frame;

/// A value that can appear as one token of a command.
pub trait CommandArg {
    fn to_token(&self) -> String;
}

impl CommandArg for str {
    fn to_token(&self) -> String {
        self.to_string()
    }
}

impl CommandArg for String {
    fn to_token(&self) -> String {
        self.clone()
    }
}

impl<T: CommandArg + ?Sized> CommandArg for &T {
    fn to_token(&self) -> String {
        (**self).to_token()
    }
}

impl CommandArg for bool {
    fn to_token(&self) -> String {
        if *self { "on" } else { "off" }.to_string()
    }
}

macro_rules! display_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CommandArg for $ty {
                fn to_token(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_arg!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// A command to the robot, as an ordered list of tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    tokens: Vec<String>,
}

impl Command {
    /// Start a command from its leading words, e.g. `"chassis speed"`.
    pub fn new(name: &str) -> Self {
        Self {
            tokens: name.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Build a command from already-split tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Append one argument token.
    pub fn arg(mut self, value: impl CommandArg) -> Self {
        self.tokens.push(value.to_token());
        self
    }

    /// Append `name value`.
    pub fn param(self, name: &str, value: impl CommandArg) -> Self {
        self.arg(name).arg(value)
    }

    /// Append `name value` only when a value is given.
    pub fn opt_param<T: CommandArg>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The command text as sent on the wire.
    pub fn to_text(&self) -> String {
        self.tokens.join(" ")
    }

    /// Encode as a Command frame carrying `key`.
    pub fn encode(&self, key: u16) -> Frame {
        Frame::command(key, Bytes::from(self.to_text()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
