//! Third-person singular gender swap.

pub(super) const TABLE: &[(&str, &str)] = subs! {
    "he" => "she",
    "him" => "her",
    "his" => "her",
    "himself" => "herself",
    "she" => "he",
    "her" => "him",
    "hers" => "his",
    "herself" => "himself",
};
