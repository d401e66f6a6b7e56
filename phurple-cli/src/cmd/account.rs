//! Account commands: parse, protocols, add.

use phurple::{AccountDsn, Error, MemoryEngine, Session, SessionBuilder};

use super::config::ProfileConfig;

/// Parse each account string and print it as pretty JSON.
///
/// Every input is attempted. Failures go to stderr and the command fails
/// once all inputs are processed.
pub fn parse(dsns: &[String]) -> phurple::Result<()> {
    let mut failed = 0usize;
    for dsn in dsns {
        match AccountDsn::parse(dsn) {
            Ok(parsed) => println!("{}", to_json(&parsed)?),
            Err(e) => {
                eprintln!("{dsn}: {e}");
                failed += 1;
            }
        }
    }
    if failed == 0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "{failed} of {} account strings rejected",
            dsns.len()
        )))
    }
}

/// Print the protocols a profile is configured with.
pub fn protocols(cfg: &ProfileConfig) {
    println!("  {:<16} NAME", "ID");
    for p in &cfg.protocols {
        println!("  {:<16} {}", p.id, p.name);
    }
}

/// Add accounts to an in-process engine and print the indices they receive.
pub fn add(cfg: &ProfileConfig, dsns: &[String]) -> phurple::Result<()> {
    let mut session = session(cfg);
    for dsn in dsns {
        let parsed = AccountDsn::parse(dsn)?;
        let index = session.add_parsed_account(&parsed)?;
        println!(
            "  [{index}] {:<8} {:<20} {}",
            parsed.protocol(),
            parsed.username(),
            endpoint(&parsed),
        );
    }
    println!(
        "\n  {} account(s) enabled for '{}'",
        session.account_indices().count(),
        session.ui_id()
    );
    Ok(())
}

fn session(cfg: &ProfileConfig) -> Session<MemoryEngine> {
    SessionBuilder::new()
        .ui_id(cfg.ui_id.clone())
        .build(MemoryEngine::new(cfg.protocols.clone()))
}

fn endpoint(dsn: &AccountDsn) -> String {
    match (dsn.server(), dsn.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_owned(),
        (None, Some(port)) => format!(":{port}"),
        (None, None) => "-".to_owned(),
    }
}

fn to_json(dsn: &AccountDsn) -> phurple::Result<String> {
    serde_json::to_string_pretty(dsn).map_err(|e| Error::InvalidArgument(format!("json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dsn(s: &str) -> AccountDsn {
        AccountDsn::parse(s).expect("valid")
    }

    #[test]
    fn endpoint_formats_missing_parts() {
        assert_eq!(endpoint(&dsn("xmpp://a@example.com:5222")), "example.com:5222");
        assert_eq!(endpoint(&dsn("xmpp://a@example.com")), "example.com");
        assert_eq!(endpoint(&dsn("xmpp://a@:6667")), ":6667");
        assert_eq!(endpoint(&dsn("xmpp://a")), "-");
    }

    #[test]
    fn json_has_every_field() {
        let json = to_json(&dsn("irc://bob:pw@irc.example.net:0")).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse back");
        assert_eq!(value["protocol"], "irc");
        assert_eq!(value["username"], "bob");
        assert_eq!(value["password"], "pw");
        assert_eq!(value["host"], "irc.example.net");
        assert!(value["port"].is_null());
    }

    #[test]
    fn parse_reports_rejections() {
        assert!(parse(&["xmpp://alice".into()]).is_ok());
        assert!(parse(&["xmpp://alice".into(), "nope".into()]).is_err());
    }

    #[test]
    fn add_reports_each_failure_kind() {
        let cfg = ProfileConfig::default();
        assert!(add(&cfg, &["xmpp://alice@example.com:5222".into()]).is_ok());
        assert!(matches!(
            add(&cfg, &["msn://bob".into()]),
            Err(Error::UnknownProtocol(ref p)) if p == "msn"
        ));
        assert!(matches!(
            add(&cfg, &["not-a-dsn".into()]),
            Err(Error::MalformedDsn { .. })
        ));
    }

    #[test]
    fn session_uses_profile_settings() {
        let mut cfg = ProfileConfig::default();
        cfg.set_strict("ui_id=bot").expect("set");
        let mut s = session(&cfg);
        let i = s.add_account("irc://bob@irc.example.net").expect("add");
        assert!(s.account(i).expect("registered").is_enabled("bot"));
        assert!(matches!(
            s.add_account("msn://bob"),
            Err(Error::UnknownProtocol(_))
        ));
    }
}
