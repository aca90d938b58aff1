/// Compile a regex literal once and hand out a `&'static Regex`.
///
/// The pattern is checked the first time the expansion site runs; every later
/// call reuses the same compiled automaton.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a `&'static [(&str, &str)]` substitution table.
///
/// ```text
/// subs! { "he" => "she", "him" => "her" }
/// ```
#[macro_export]
macro_rules! subs {
    ( $($from:literal => $to:literal),* $(,)? ) => {
        &[ $(($from, $to)),* ]
    };
}
