use super::*;

fn parse(args: &[&str]) -> Options {
    Options::parse(args.iter().map(|s| s.to_string()))
}

#[test]
fn files_collect_in_order() {
    let options = parse(&["one.c", "two.c"]);
    assert_eq!(options.files, vec!["one.c", "two.c"]);
    assert!(!options.save_messages_on_exit);
    assert!(options.config.is_none());
}

#[test]
fn flags_are_recognized() {
    let options = parse(&["-c", "my_config.so", "-s", "main.c"]);
    assert_eq!(options.config.as_deref(), Some("my_config.so"));
    assert!(options.save_messages_on_exit);
    assert_eq!(options.files, vec!["main.c"]);
}

#[test]
fn help_flag_sets_show_help() {
    let options = parse(&["-h"]);
    assert!(options.show_help);
    assert!(!Options::usage().is_empty());
}

#[test]
fn dangling_config_flag_is_tolerated() {
    let options = parse(&["-c"]);
    assert!(options.config.is_none());
    assert!(options.files.is_empty());
}
