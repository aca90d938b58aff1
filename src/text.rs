//! Small string helpers shared by the evaluator and the respond loop.

/// Split `input` into sentences.
///
/// Each of `.`, `?` and `!` ends a sentence; fragments are trimmed. Input with
/// no terminator at all comes back as a single sentence. Empty fragments (from
/// runs like `"?!"`) are kept so callers can decide what to do with them.
///
/// ```text
/// "First.  Second, still?  Third!  Well" -> ["First", "Second, still", "Third", "Well"]
/// ```
pub fn sentences(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        match rest.find(['.', '?', '!']) {
            Some(end) => {
                out.push(rest[..end].trim().to_string());
                // Terminators are all single-byte ASCII.
                rest = &rest[end + 1..];
            }
            None => {
                out.push(rest.trim().to_string());
                break;
            }
        }
    }
    if out.is_empty() {
        out.push(input.to_string());
    }
    out
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Capitalize every whitespace-separated word and re-join with single spaces.
pub fn capwords(text: &str) -> String {
    text.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

/// Capitalize only the first word of `text` (after trimming); the rest is
/// left untouched.
pub fn capitalize_first_word(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.split_once(' ') {
        Some((first, rest)) => format!("{} {}", capitalize(first), rest),
        None => capitalize(trimmed),
    }
}

/// Collapse every run of whitespace to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    crate::regex!(r"\s+").replace_all(text, " ").into_owned()
}

/// Collapse multi-line command output into one line.
pub fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators() {
        let s = sentences("First.  Second, still?  Third and Final!  Well, not really");
        assert_eq!(s, vec!["First", "Second, still", "Third and Final", "Well, not really"]);
    }

    #[test]
    fn no_terminator_is_one_sentence() {
        assert_eq!(sentences("hello there"), vec!["hello there"]);
        assert_eq!(sentences(""), vec![""]);
    }

    #[test]
    fn trailing_terminator_does_not_add_a_fragment() {
        assert_eq!(sentences("Hello Tom Smith, how are you?"), vec!["Hello Tom Smith, how are you"]);
        assert_eq!(sentences("a?!"), vec!["a", ""]);
    }

    #[test]
    fn capitalization_helpers() {
        assert_eq!(capwords("the lAST word   here"), "The Last Word Here");
        assert_eq!(capitalize_first_word("  my first letter should be capitalized."), "My first letter should be capitalized.");
        assert_eq!(capitalize_first_word(""), "");
        assert_eq!(capitalize("éCOLE"), "École");
    }

    #[test]
    fn whitespace_helpers() {
        assert_eq!(collapse_whitespace("Extra   Spaces\n   Rule!"), "Extra Spaces Rule!");
        assert_eq!(single_line("hello\nworld\n"), "hello world");
    }
}
