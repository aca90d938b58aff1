//! End-to-end checks against `testdata/self_test.aiml`.

use crate::{GLOBAL_SESSION, Kernel, Options};
use std::fs;

const SELF_TEST: &str = include_str!("testdata/self_test.aiml");

fn kernel_with(options: Options) -> Kernel {
    let kernel = Kernel::with_options(Options { seed: Some(42), ..options });
    let report = kernel.learn_str(SELF_TEST).unwrap();
    assert_eq!((report.rules, report.errors), (16, 1), "self test document");
    kernel
}

fn kernel() -> Kernel {
    kernel_with(Options::default())
}

#[test]
fn answers_table() {
    let kernel = kernel();
    let cases = [
        ("Hello", "Hi."),
        ("hello!", "Hi."),
        ("Hello Tom Smith, how are you?", "Fine, thanks Tom Smith,"),
        ("test srai", "srai results"),
        ("say hello", "Hi."),
        ("I am MALE", "You are a boy."),
        ("I am female", "You are a girl."),
        ("I am a teapot", "I do not know what you are."),
        ("what is good", "Nothing in particular."),
        ("high priority", "underscore"),
        ("are you nameless", "Yes, I am Nameless."),
        ("bad category", ""),
        ("nothing matches this", ""),
    ];
    for (input, expected) in cases {
        assert_eq!(kernel.respond(input, GLOBAL_SESSION), expected, "input {input:?}");
    }
}

#[test]
fn rule_paths_list_every_category() {
    let kernel = kernel();
    let paths = kernel.rule_paths();
    assert_eq!(paths.len(), kernel.num_rules());
    assert!(paths.contains(&"* <that> WHO IS THERE <topic> *".to_string()));
    assert!(paths.contains(&"WHAT IS GOOD <that> * <topic> FRUIT".to_string()));
    assert!(paths.contains(&"ARE YOU BOT_NAME <that> * <topic> *".to_string()));
}

#[test]
fn sentences_are_answered_in_order() {
    let kernel = kernel();
    assert_eq!(kernel.respond("Hello. Test srai.", GLOBAL_SESSION), "Hi. srai results");
    assert_eq!(kernel.respond("Nothing here. Hello", GLOBAL_SESSION), "Hi.");
    assert_eq!(kernel.respond("", GLOBAL_SESSION), "");
    assert_eq!(kernel.respond("?!", GLOBAL_SESSION), "");
}

#[test]
fn runaway_srai_is_cut_off() {
    let kernel = kernel();
    assert_eq!(kernel.respond("test infinite", "loop"), "");
    let data = kernel.session_data("loop").unwrap();
    assert!(data.input_stack.is_empty());
    assert_eq!(kernel.respond("hello", "loop"), "Hi.");
}

#[test]
fn recursion_limit_is_configurable() {
    let kernel = kernel_with(Options { max_recursion_depth: 1, ..Options::default() });
    assert_eq!(kernel.respond("hello", GLOBAL_SESSION), "Hi.");
    assert_eq!(kernel.respond("test srai", GLOBAL_SESSION), "");
}

#[test]
fn that_gates_on_the_previous_response() {
    let kernel = kernel();
    assert_eq!(kernel.respond("Boo", "knock"), "");
    assert_eq!(kernel.respond("knock knock", "knock"), "Who is there?");
    assert_eq!(kernel.respond("Boo", "knock"), "Boo who?");
    assert_eq!(kernel.respond("Boo", "knock"), "");
}

#[test]
fn topic_selects_categories() {
    let kernel = kernel();
    kernel.set_predicate("topic", "fruit", "grocer");
    assert_eq!(kernel.respond("what is good", "grocer"), "Apples.");
    assert_eq!(kernel.respond("what is good", GLOBAL_SESSION), "Nothing in particular.");
    kernel.set_predicate("topic", "", "grocer");
    assert_eq!(kernel.respond("what is good", "grocer"), "Nothing in particular.");
}

#[test]
fn random_picks_one_item() {
    let kernel = kernel();
    for _ in 0..20 {
        let flip = kernel.respond("flip a coin", GLOBAL_SESSION);
        assert!(flip == "Heads." || flip == "Tails.", "unexpected {flip:?}");
    }
}

#[test]
fn bot_name_follows_configuration() {
    let kernel = kernel_with(Options { bot_name: "Aiko".to_string(), ..Options::default() });
    assert_eq!(kernel.respond("Are you Aiko?", GLOBAL_SESSION), "Yes, I am Aiko.");
    assert_eq!(kernel.respond("are you nameless", GLOBAL_SESSION), "");

    kernel.set_bot_predicate("name", "Mika");
    assert_eq!(kernel.bot_predicate("name"), "Mika");
    assert_eq!(kernel.respond("are you mika", GLOBAL_SESSION), "Yes, I am Mika.");
}

#[test]
fn histories_are_bounded_and_per_session() {
    let kernel = kernel();
    for i in 0..11 {
        kernel.respond(&format!("message {i}"), "chatty");
    }
    let data = kernel.session_data("chatty").unwrap();
    assert_eq!(data.input_history.len(), 10);
    assert_eq!(data.output_history.len(), 10);
    assert_eq!(data.input_history.first().map(String::as_str), Some("message 1"));
    assert_eq!(data.input_history.last().map(String::as_str), Some("message 10"));
    assert!(kernel.session_data("quiet").is_none());

    assert_eq!(kernel.respond("what did I say", "chatty"), "You said \"message 10\".");
}

#[test]
fn brain_snapshot_restores_behaviour() {
    let kernel = kernel();
    let bytes = kernel.brain_snapshot().unwrap();

    let restored = Kernel::with_options(Options { seed: Some(42), ..Options::default() });
    restored.restore_brain(&bytes).unwrap();
    assert_eq!(restored.num_rules(), kernel.num_rules());
    assert_eq!(restored.rule_paths(), kernel.rule_paths());
    for input in ["hello", "test srai", "say hello", "I am male", "are you nameless", "test infinite"] {
        assert_eq!(restored.respond(input, "r"), kernel.respond(input, "k"), "input {input:?}");
    }
}

#[test]
fn learn_element_loads_relative_documents() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.aiml"),
        r#"<aiml version="1.0.1">
  <category><pattern>LOAD EXTRA</pattern><template><learn>extra/*.aiml</learn>Loaded.</template></category>
</aiml>"#,
    )
    .unwrap();
    fs::create_dir(dir.path().join("extra")).unwrap();
    fs::write(
        dir.path().join("extra").join("more.aiml"),
        r#"<aiml version="1.0.1">
  <category><pattern>EXTRA RULE</pattern><template>From the extra document.</template></category>
</aiml>"#,
    )
    .unwrap();

    let kernel = Kernel::new();
    let report = kernel.learn(&dir.path().join("main.aiml").to_string_lossy()).unwrap();
    assert_eq!((report.files, report.rules), (1, 1));
    assert_eq!(kernel.respond("extra rule", GLOBAL_SESSION), "");
    assert_eq!(kernel.respond("load extra", GLOBAL_SESSION), "Loaded.");
    assert_eq!(kernel.num_rules(), 2);
    assert_eq!(kernel.respond("extra rule", GLOBAL_SESSION), "From the extra document.");
}

#[test]
fn bootstrap_learns_then_runs_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("self_test.aiml");
    fs::write(&path, SELF_TEST).unwrap();
    let brain = dir.path().join("self_test.brn");

    let kernel = Kernel::new();
    kernel.bootstrap(None, &[path.to_string_lossy().as_ref()], &["I am female"]).unwrap();
    assert_eq!(kernel.predicate("gender", GLOBAL_SESSION), "female");
    kernel.save_brain(&brain).unwrap();

    let restored = Kernel::new();
    restored.bootstrap(Some(&brain), &[], &[]).unwrap();
    assert_eq!(restored.num_rules(), 16);
    assert!(Kernel::new().bootstrap(Some(&dir.path().join("missing.brn")), &[], &[]).is_err());
}

#[cfg(unix)]
#[test]
fn system_runs_shell_commands() {
    let kernel = Kernel::new();
    kernel
        .learn_str(
            r#"<aiml version="1.0.1">
  <category><pattern>ECHO *</pattern><template><system>echo <star/></system></template></category>
</aiml>"#,
        )
        .unwrap();
    assert_eq!(kernel.respond("echo ready", GLOBAL_SESSION), "ready");
}
