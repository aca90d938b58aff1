//! First person <-> third person swap.

pub(super) const TABLE: &[(&str, &str)] = subs! {
    "I" => "he",
    "me" => "him",
    "my" => "his",
    "mine" => "his",
    "myself" => "himself",
    "I was" => "he was",
    "I am" => "he is",
    "he" => "I",
    "him" => "me",
    "his" => "my",
    "himself" => "myself",
    "she" => "I",
    "her" => "me",
    "hers" => "mine",
    "herself" => "myself",
};
