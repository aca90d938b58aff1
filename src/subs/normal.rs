//! Contraction expansion applied to input, `that` and topic before matching.

pub(super) const TABLE: &[(&str, &str)] = subs! {
    "wanna" => "want to",
    "gonna" => "going to",
    "I'm" => "I am",
    "I'd" => "I would",
    "I'll" => "I will",
    "I've" => "I have",
    "you'd" => "you would",
    "you're" => "you are",
    "you've" => "you have",
    "you'll" => "you will",
    "he's" => "he is",
    "he'd" => "he would",
    "he'll" => "he will",
    "she's" => "she is",
    "she'd" => "she would",
    "she'll" => "she will",
    "it's" => "it is",
    "we're" => "we are",
    "we've" => "we have",
    "we'll" => "we will",
    "they're" => "they are",
    "they've" => "they have",
    "they'll" => "they will",
    "isn't" => "is not",
    "aren't" => "are not",
    "wasn't" => "was not",
    "weren't" => "were not",
    "don't" => "do not",
    "doesn't" => "does not",
    "didn't" => "did not",
    "haven't" => "have not",
    "hasn't" => "has not",
    "hadn't" => "had not",
    "can't" => "can not",
    "cannot" => "can not",
    "couldn't" => "could not",
    "won't" => "will not",
    "wouldn't" => "would not",
    "shouldn't" => "should not",
    "mustn't" => "must not",
    "ain't" => "is not",
    "let's" => "let us",
    "what's" => "what is",
    "where's" => "where is",
    "who's" => "who is",
    "how's" => "how is",
    "that's" => "that is",
    "there's" => "there is",
    "y'all" => "you all",
};
