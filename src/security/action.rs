//! Permission actions and their wire encoding
//!
//! Each action has a single-letter code. An action set travels as the byte
//! sequence of its codes in canonical order `R W X C A`.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::shell::{ShellError, ShellResult};

/// A single grantable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Read,
    Write,
    Execute,
    Create,
    Admin,
}

impl Action {
    /// All actions in canonical order.
    pub const ALL: [Action; 5] = [
        Action::Read,
        Action::Write,
        Action::Execute,
        Action::Create,
        Action::Admin,
    ];

    /// Wire code.
    pub fn code(self) -> u8 {
        match self {
            Action::Read => b'R',
            Action::Write => b'W',
            Action::Execute => b'X',
            Action::Create => b'C',
            Action::Admin => b'A',
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'R' => Some(Action::Read),
            b'W' => Some(Action::Write),
            b'X' => Some(Action::Execute),
            b'C' => Some(Action::Create),
            b'A' => Some(Action::Admin),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Read => "READ",
            Action::Write => "WRITE",
            Action::Execute => "EXEC",
            Action::Create => "CREATE",
            Action::Admin => "ADMIN",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Action::Read => 1,
            Action::Write => 1 << 1,
            Action::Execute => 1 << 2,
            Action::Create => 1 << 3,
            Action::Admin => 1 << 4,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Unordered set of actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActionSet {
    bits: u8,
}

impl ActionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Action::ALL.iter().copied().collect()
    }

    /// Parse an operator-supplied code string such as `RW`.
    ///
    /// Codes are case sensitive. Repeated codes are accepted.
    pub fn parse(codes: &str) -> ShellResult<Self> {
        Self::from_bytes(codes.as_bytes()).map_err(|bad| {
            ShellError::validation(format!(
                "Unknown permission action '{}' in '{}'; valid actions are R, W, X, C, A",
                char::from(bad),
                codes
            ))
        })
    }

    /// Decode wire bytes. Returns the first unknown byte on failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, u8> {
        let mut set = Self::empty();
        for &b in bytes {
            let action = Action::from_code(b).ok_or(b)?;
            set.insert(action);
        }
        Ok(set)
    }

    /// Wire encoding: codes in canonical order.
    pub fn encode(&self) -> Vec<u8> {
        self.iter().map(Action::code).collect()
    }

    pub fn insert(&mut self, action: Action) {
        self.bits |= action.bit();
    }

    pub fn remove_all(&mut self, other: &ActionSet) {
        self.bits &= !other.bits;
    }

    pub fn union(&self, other: &ActionSet) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    pub fn contains(&self, action: Action) -> bool {
        self.bits & action.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(move |a| self.contains(*a))
    }

    /// Codes as a string, e.g. `RWX`.
    pub fn codes(&self) -> String {
        self.iter().map(|a| char::from(a.code())).collect()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        let mut set = Self::empty();
        for action in iter {
            set.insert(action);
        }
        set
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Action::name).collect();
        write!(f, "{}", names.join(","))
    }
}

impl Serialize for ActionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.codes())
    }
}

impl<'de> Deserialize<'de> for ActionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodesVisitor;

        impl Visitor<'_> for CodesVisitor {
            type Value = ActionSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a string of action codes (R, W, X, C, A)")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ActionSet, E> {
                ActionSet::from_bytes(v.as_bytes()).map_err(|b| {
                    E::custom(format!("unknown action code '{}'", char::from(b)))
                })
            }
        }

        deserializer.deserialize_str(CodesVisitor)
    }
}
