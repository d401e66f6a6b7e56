//! Profile configuration persistence.

use std::fs;
use std::path::{Component, Path, PathBuf};

use phurple::{Error, ProtocolInfo, format_protocol_list, parse_protocol_list};

/// Protocols a fresh profile knows about.
pub const DEFAULT_PROTOCOLS: &str = "prpl-jabber:XMPP,prpl-irc:IRC,prpl-icq:ICQ";

/// Log filter a fresh profile uses.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_FILE: &str = "profile.conf";
const DEFAULT_FILE: &str = ".default";

/// Base data directory for all profiles.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("phurple-cli")
}

/// Data directory for a specific profile.
pub fn profile_dir(name: &str) -> phurple::Result<PathBuf> {
    profile_dir_in(&data_dir(), name)
}

/// Directory for profile `name` under `base`.
///
/// The name must be a single plain path segment, so the result always stays
/// inside `base`.
pub fn profile_dir_in(base: &Path, name: &str) -> phurple::Result<PathBuf> {
    check_profile_name(name)?;
    Ok(base.join(name))
}

fn check_profile_name(name: &str) -> phurple::Result<()> {
    let mut parts = Path::new(name).components();
    match (parts.next(), parts.next()) {
        (Some(Component::Normal(part)), None)
            if part == name && !name.contains(['/', '\\']) =>
        {
            Ok(())
        }
        _ => Err(Error::InvalidArgument(format!(
            "invalid profile name {name:?} (expected a plain name without path separators)"
        ))),
    }
}

/// Read the default profile name under `base` (falls back to `"default"`).
pub fn default_profile_in(base: &Path) -> String {
    fs::read_to_string(base.join(DEFAULT_FILE))
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "default".into())
}

/// Read the default profile name.
pub fn default_profile() -> String {
    default_profile_in(&data_dir())
}

/// Persist the default profile name under `base`.
pub fn set_default_in(base: &Path, name: &str) -> phurple::Result<()> {
    check_profile_name(name)?;
    fs::create_dir_all(base).map_err(|e| Error::Config(format!("mkdir: {e}")))?;
    fs::write(base.join(DEFAULT_FILE), name).map_err(|e| Error::Config(format!("write: {e}")))
}

/// Persist the default profile name.
pub fn set_default(name: &str) -> phurple::Result<()> {
    set_default_in(&data_dir(), name)
}

/// Persistent per-profile configuration stored as `profile.conf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub ui_id: String,
    pub protocols: Vec<ProtocolInfo>,
    pub log_level: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            ui_id: phurple::session::DEFAULT_UI_ID.to_owned(),
            protocols: parse_protocol_list(DEFAULT_PROTOCOLS).unwrap_or_default(),
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
        }
    }
}

impl ProfileConfig {
    /// Load from `<profile_dir>/profile.conf`, or defaults if the profile
    /// has never been saved.
    pub fn load_or_default(profile: &str) -> phurple::Result<Self> {
        let dir = profile_dir(profile)?;
        if dir.join(CONFIG_FILE).exists() {
            Self::load_from(&dir)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from `<dir>/profile.conf`.
    pub fn load_from(dir: &Path) -> phurple::Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("load {}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Parse `key=value` lines. Unknown keys and blank lines are ignored.
    pub fn parse(text: &str) -> phurple::Result<Self> {
        let mut cfg = Self::default();
        for line in text.lines() {
            if let Some((k, v)) = line.trim().split_once('=') {
                cfg.set(k, v)?;
            }
        }
        Ok(cfg)
    }

    /// Set a single key. Returns `false` for a key this config does not know.
    fn set(&mut self, key: &str, value: &str) -> phurple::Result<bool> {
        let value = value.trim();
        match key.trim() {
            "ui_id" => {
                if value.is_empty() {
                    return Err(Error::Config("ui_id must not be empty".into()));
                }
                value.clone_into(&mut self.ui_id);
            }
            "protocols" => self.protocols = parse_protocol_list(value)?,
            "log_level" => value.clone_into(&mut self.log_level),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Apply a `key=value` assignment from the command line.
    pub fn set_strict(&mut self, assignment: &str) -> phurple::Result<()> {
        let (k, v) = assignment
            .split_once('=')
            .ok_or_else(|| Error::InvalidArgument(format!("expected key=value, got {assignment:?}")))?;
        if self.set(k, v)? {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "unknown key {:?} (expected: ui_id, protocols, log_level)",
                k.trim()
            )))
        }
    }

    /// Render as `profile.conf` contents.
    pub fn render(&self) -> String {
        format!(
            "ui_id={}\nprotocols={}\nlog_level={}\n",
            self.ui_id,
            format_protocol_list(&self.protocols),
            self.log_level,
        )
    }

    /// Save to `<profile_dir>/profile.conf`.
    pub fn save(&self, profile: &str) -> phurple::Result<()> {
        self.save_to(&profile_dir(profile)?)
    }

    /// Save to `<dir>/profile.conf`.
    pub fn save_to(&self, dir: &Path) -> phurple::Result<()> {
        fs::create_dir_all(dir).map_err(|e| Error::Config(format!("mkdir: {e}")))?;
        fs::write(dir.join(CONFIG_FILE), self.render())
            .map_err(|e| Error::Config(format!("write config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_keys_missing() {
        let cfg = ProfileConfig::parse("").expect("parse");
        assert_eq!(cfg, ProfileConfig::default());
        assert_eq!(cfg.protocols.len(), 3);
    }

    #[test]
    fn parses_known_keys_and_skips_unknown() {
        let cfg = ProfileConfig::parse(
            "ui_id = bot\nprotocols=prpl-irc:IRC\n# comment\nfoo=bar\nlog_level=debug\n",
        )
        .expect("parse");
        assert_eq!(cfg.ui_id, "bot");
        assert_eq!(cfg.protocols, vec![ProtocolInfo::new("prpl-irc", "IRC")]);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn rejects_bad_protocol_list() {
        assert!(ProfileConfig::parse("protocols=prpl-irc").is_err());
    }

    #[test]
    fn set_strict_validates_keys() {
        let mut cfg = ProfileConfig::default();
        cfg.set_strict("ui_id=cli").expect("set");
        assert_eq!(cfg.ui_id, "cli");
        assert!(cfg.set_strict("colour=blue").is_err());
        assert!(cfg.set_strict("no-equals").is_err());
        assert!(cfg.set_strict("ui_id=").is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = ProfileConfig::default();
        cfg.set_strict("protocols=prpl-jabber:XMPP,prpl-irc:IRC").expect("set");
        cfg.save_to(dir.path()).expect("save");
        assert_eq!(ProfileConfig::load_from(dir.path()).expect("load"), cfg);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            ProfileConfig::load_from(dir.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn profile_names_stay_inside_base() {
        let base = Path::new("/data/phurple-cli");
        assert_eq!(
            profile_dir_in(base, "work").expect("plain name"),
            base.join("work")
        );
        assert_eq!(
            profile_dir_in(base, ".hidden").expect("dot prefix is fine"),
            base.join(".hidden")
        );
        for bad in ["", ".", "..", "/", "/etc", "a/b", "a\\b", "../x", "work/"] {
            assert!(
                matches!(profile_dir_in(base, bad), Err(Error::InvalidArgument(_))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn default_rejects_bad_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(set_default_in(dir.path(), "..").is_err());
        assert_eq!(default_profile_in(dir.path()), "default");
    }

    #[test]
    fn default_profile_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(default_profile_in(dir.path()), "default");
        set_default_in(dir.path(), "work").expect("set");
        assert_eq!(default_profile_in(dir.path()), "work");
    }
}
