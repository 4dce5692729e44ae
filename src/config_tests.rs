use super::*;
use clap::Parser;

#[test]
fn defaults_parse_from_empty_args() {
    let cfg = Config::parse_from(["shellgate"]);
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.own_app_name, "entry");
    assert!(cfg.auth_token.is_none());
}

#[test]
fn ping_interval_and_feedback_timeout_convert() {
    let cfg = Config::parse_from(["shellgate", "--ping-interval-secs", "5", "--feedback-timeout-ms", "250"]);
    assert_eq!(cfg.ping_interval(), std::time::Duration::from_secs(5));
    assert_eq!(cfg.feedback_timeout(), std::time::Duration::from_millis(250));
}
