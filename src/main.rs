mod debug_report;

use aimlkit::{GLOBAL_SESSION, Kernel, Options};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

struct CliConfig {
    learn: Vec<String>,
    brain: Option<PathBuf>,
    save_brain: Option<PathBuf>,
    subs: Option<PathBuf>,
    session: String,
    options: Options,
    input: Option<String>,
    trace: bool,
    color: bool,
}

fn run(config: &CliConfig) -> aimlkit::Result<()> {
    let kernel = Kernel::with_options(config.options.clone());
    if let Some(subs) = &config.subs {
        kernel.load_substitutions(subs)?;
    }
    if let Some(brain) = &config.brain {
        kernel.load_brain(brain)?;
    }
    for pattern in &config.learn {
        let report = kernel.learn(pattern)?;
        if config.trace {
            debug_report::print_learn(pattern, &report, config.color);
        }
        for failure in &report.failed {
            eprintln!("warning: skipped {}: {}", failure.path.display(), failure.message);
        }
    }
    if let Some(path) = &config.save_brain {
        kernel.save_brain(path)?;
    }

    match &config.input {
        Some(input) => answer(&kernel, input, config),
        None => {
            let interactive = io::stdin().is_terminal();
            let stdin = io::stdin();
            let mut lines = stdin.lock().lines();
            loop {
                if interactive {
                    print!("> ");
                    let _ = io::stdout().flush();
                }
                let Some(line) = lines.next() else { break };
                let line = line.map_err(|err| aimlkit::Error::Io { path: PathBuf::from("<stdin>"), source: err })?;
                if line.trim().is_empty() {
                    continue;
                }
                answer(&kernel, &line, config);
            }
        }
    }
    Ok(())
}

fn answer(kernel: &Kernel, input: &str, config: &CliConfig) {
    if config.trace {
        let details = kernel.respond_verbose(input, &config.session);
        debug_report::print_response(input, &details, config.color);
    } else {
        println!("{}", kernel.respond(input, &config.session));
    }
}

fn parse_args() -> Result<CliConfig, String> {
    let mut config = CliConfig {
        learn: Vec::new(),
        brain: None,
        save_brain: None,
        subs: None,
        session: GLOBAL_SESSION.to_string(),
        options: Options::default(),
        input: None,
        trace: false,
        color: io::stdout().is_terminal(),
    };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            inline.clone().or_else(|| args.next()).ok_or_else(|| format!("error: {name} expects a value"))
        };
        match flag.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("{}", aimlkit::version());
                std::process::exit(0);
            }
            "--color" => config.color = true,
            "--no-color" => config.color = false,
            "--trace" | "-t" => config.trace = true,
            "--learn" | "-l" => config.learn.push(value("--learn")?),
            "--brain" | "-b" => config.brain = Some(PathBuf::from(value("--brain")?)),
            "--save-brain" => config.save_brain = Some(PathBuf::from(value("--save-brain")?)),
            "--subs" => config.subs = Some(PathBuf::from(value("--subs")?)),
            "--session" | "-s" => config.session = value("--session")?,
            "--bot-name" => config.options.bot_name = value("--bot-name")?,
            "--seed" => {
                let raw = value("--seed")?;
                let seed = raw.parse().map_err(|_| format!("error: invalid --seed '{raw}' (expected an integer)"))?;
                config.options.seed = Some(seed);
            }
            "--input" | "-i" => {
                let input = value("--input")?;
                set_input(&mut config, input)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    set_input(&mut config, rest)?;
                }
                break;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                set_input(&mut config, rest)?;
                break;
            }
        }
    }

    if config.learn.is_empty() && config.brain.is_none() {
        return Err(format!("error: nothing to load (pass --learn or --brain)\n\n{}", help_text()));
    }
    Ok(config)
}

fn set_input(config: &mut CliConfig, input: String) -> Result<(), String> {
    if config.input.is_some() {
        return Err("error: input provided multiple times".to_string());
    }
    config.input = Some(input);
    Ok(())
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "aimlkit {version}

Rule-based conversational engine for AIML documents.

Usage:
  aimlkit [OPTIONS] --learn <glob> [--] [input...]
  aimlkit [OPTIONS] --brain <file> --input <text>

Without input, reads one utterance per line from stdin and prints one
response per line.

Options:
  -l, --learn <glob>         Learn every document matching the glob. Repeatable.
  -b, --brain <file>         Load a saved brain before learning.
  --save-brain <file>        Save the brain after learning.
  --subs <file>              Substitution tables (TOML, one table per name).
  -s, --session <id>         Session to converse in. Default: {session}
  --bot-name <name>          Value of the bot's `name` predicate.
  --seed <n>                 Seed for <random>.
  -i, --input <text>         A single utterance to answer.
  -t, --trace                Print match paths and timings.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RUST_LOG                   Log filter, e.g. aimlkit=debug. Default: warn

Exit codes:
  0  Success.
  1  A document, brain or substitution file could not be loaded.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        session = GLOBAL_SESSION
    )
}
