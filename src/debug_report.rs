use aimlkit::{LearnReport, ResponseDetails};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            self.wrap(s, color)
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            self.wrap(s, BOLD)
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            self.wrap(s, DIM)
        }

        fn wrap(&self, s: impl AsRef<str>, code: &str) -> String {
            if self.enabled { format!("{}{}{}", code, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_learn(pattern: &str, report: &LearnReport, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("📚 Learning: \"{pattern}\""), ansi::CYAN)));
    println!(
        "  {} {}  {} {}  {} {}",
        palette.dim("documents:"),
        palette.paint(report.files.to_string(), ansi::GREEN),
        palette.dim("rules:"),
        palette.paint(report.rules.to_string(), ansi::BLUE),
        palette.dim("dropped:"),
        if report.errors > 0 {
            palette.paint(report.errors.to_string(), ansi::YELLOW)
        } else {
            palette.dim("0")
        },
    );
    for failure in &report.failed {
        println!("  {} {}: {}", palette.paint("✗", ansi::YELLOW), failure.path.display(), failure.message);
    }
    println!("  {}", palette.dim(format!("{:?}", report.elapsed)));
}

pub fn print_response(input: &str, details: &ResponseDetails, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("💬 Input: \"{input}\""), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Sentences ━━━", ansi::GRAY));
    if details.sentences.is_empty() {
        println!("{}", palette.dim("  Nothing to answer"));
    }
    for (idx, sentence) in details.sentences.iter().enumerate() {
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{idx}]"), ansi::GRAY),
            palette.bold(&sentence.input),
            palette.dim("│"),
            palette.dim(format!("{:?}", sentence.duration)),
        );
        match &sentence.matched {
            Some(path) => println!("      {} {}", palette.dim("path:"), palette.paint(path, ansi::BLUE)),
            None => println!("      {} {}", palette.dim("path:"), palette.paint("no match", ansi::YELLOW)),
        }
        println!("      {} {}", palette.dim("out: "), palette.paint(&sentence.output, ansi::GREEN));
    }

    println!("\n{}", palette.paint("━━━ Response ━━━", ansi::GRAY));
    if details.response.is_empty() {
        println!("{}", palette.dim("  (empty)"));
        println!("\n{}", palette.dim("  Tip: Set RUST_LOG=aimlkit=debug to see matching details"));
    } else {
        println!("  {}", palette.bold(palette.paint(&details.response, ansi::GREEN)));
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Total: {}", palette.paint(format!("{:?}", details.total), ansi::GREEN));
    println!();
}
