//! First person <-> second person swap.

pub(super) const TABLE: &[(&str, &str)] = subs! {
    "I" => "you",
    "me" => "you",
    "my" => "your",
    "mine" => "yours",
    "myself" => "yourself",
    "I was" => "you were",
    "I am" => "you are",
    "you" => "me",
    "your" => "my",
    "yours" => "mine",
    "yourself" => "myself",
    "you were" => "I was",
    "you are" => "I am",
};
