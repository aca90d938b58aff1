//! Built-in substitution tables.
//!
//! Each table is a list of `(from, to)` word pairs. They are loaded into a
//! [`crate::engine::WordSub`] at kernel construction and can be replaced per
//! name from a TOML file (see [`crate::Kernel::load_substitutions`]).

mod gender;
mod normal;
mod person;
mod person2;

/// Name/table pairs installed by default.
pub(crate) fn defaults() -> [(&'static str, &'static [(&'static str, &'static str)]); 4] {
    [
        ("normal", normal::TABLE),
        ("gender", gender::TABLE),
        ("person", person::TABLE),
        ("person2", person2::TABLE),
    ]
}
