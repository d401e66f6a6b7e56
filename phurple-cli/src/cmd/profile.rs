//! Profile management commands: new, list, remove, default, config.

use std::fs;
use std::path::Path;

use phurple::{Error, format_protocol_list, parse_protocol_list};

use super::NewArgs;
use super::config::{self, ProfileConfig};

/// Create a new profile and save its config.
pub fn create(args: &NewArgs) -> phurple::Result<ProfileConfig> {
    let cfg = create_in(&config::data_dir(), args)?;
    println!("Profile '{}' created.", args.name);
    println!("  UI id:     {}", cfg.ui_id);
    println!("  Protocols: {}", format_protocol_list(&cfg.protocols));
    Ok(cfg)
}

fn create_in(base: &Path, args: &NewArgs) -> phurple::Result<ProfileConfig> {
    let dir = config::profile_dir_in(base, &args.name)?;
    if dir.join("profile.conf").exists() {
        return Err(Error::InvalidArgument(format!(
            "profile '{}' already exists",
            args.name
        )));
    }

    let mut cfg = ProfileConfig::default();
    cfg.set_strict(&format!("ui_id={}", args.ui_id))?;
    cfg.protocols = parse_protocol_list(&args.protocols)?;
    cfg.save_to(&dir)?;

    // First profile ever becomes the default.
    if !base.join(".default").exists() {
        config::set_default_in(base, &args.name)?;
    }
    Ok(cfg)
}

/// List all saved profiles.
pub fn list() -> phurple::Result<()> {
    let base = config::data_dir();
    let default = config::default_profile();
    let names = profile_names(&base)?;

    if names.is_empty() {
        println!("No profiles found.");
        return Ok(());
    }

    for name in &names {
        let star = if *name == default { " *" } else { "" };
        if let Ok(cfg) = ProfileConfig::load_from(&base.join(name)) {
            println!(
                "  {name:<16} {:<12} [{} protocols]{star}",
                cfg.ui_id,
                cfg.protocols.len(),
            );
        } else {
            println!("  {name:<16} [no config]{star}");
        }
    }
    println!("\n  * = default");
    Ok(())
}

fn profile_names(base: &Path) -> phurple::Result<Vec<String>> {
    if !base.exists() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = fs::read_dir(base)
        .map_err(|e| Error::Config(format!("read dir: {e}")))?
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// Remove a single profile directory.
pub fn remove(name: &str) -> phurple::Result<()> {
    let dir = config::profile_dir(name)?;
    if !dir.exists() {
        println!("Profile '{name}' does not exist.");
        return Ok(());
    }
    fs::remove_dir_all(&dir).map_err(|e| Error::Config(format!("remove: {e}")))?;
    println!("Removed profile '{name}'.");
    Ok(())
}

/// Show or set the default profile.
pub fn default(name: Option<&str>) -> phurple::Result<()> {
    match name {
        Some(name) => {
            if !config::profile_dir(name)?.exists() {
                return Err(Error::InvalidArgument(format!(
                    "profile '{name}' does not exist"
                )));
            }
            config::set_default(name)?;
            println!("Default profile set to '{name}'.");
        }
        None => println!("{}", config::default_profile()),
    }
    Ok(())
}

/// Print the profile config, applying and saving any `key=value` edits first.
pub fn configure(profile: &str, mut cfg: ProfileConfig, set: &[String]) -> phurple::Result<()> {
    if !set.is_empty() {
        for assignment in set {
            cfg.set_strict(assignment)?;
        }
        cfg.save(profile)?;
        tracing::info!(profile, edits = set.len(), "profile config saved");
    }
    print!("{}", cfg.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: &str) -> NewArgs {
        NewArgs {
            name: name.into(),
            ui_id: "bot".into(),
            protocols: "prpl-irc:IRC".into(),
        }
    }

    #[test]
    fn first_profile_becomes_default() {
        let base = tempfile::tempdir().expect("tempdir");
        create_in(base.path(), &args("work")).expect("create");
        create_in(base.path(), &args("home")).expect("create");
        assert_eq!(config::default_profile_in(base.path()), "work");
        assert_eq!(
            profile_names(base.path()).expect("names"),
            vec!["home".to_owned(), "work".to_owned()]
        );
    }

    #[test]
    fn create_saves_given_settings() {
        let base = tempfile::tempdir().expect("tempdir");
        let cfg = create_in(base.path(), &args("work")).expect("create");
        let loaded = ProfileConfig::load_from(&base.path().join("work")).expect("load");
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.ui_id, "bot");
        assert_eq!(loaded.protocols.len(), 1);
    }

    #[test]
    fn duplicate_profile_is_rejected() {
        let base = tempfile::tempdir().expect("tempdir");
        create_in(base.path(), &args("work")).expect("create");
        assert!(matches!(
            create_in(base.path(), &args("work")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn bad_protocol_list_writes_nothing() {
        let base = tempfile::tempdir().expect("tempdir");
        let mut bad = args("work");
        bad.protocols = "nonsense".into();
        assert!(create_in(base.path(), &bad).is_err());
        assert!(profile_names(base.path()).expect("names").is_empty());
    }

    #[test]
    fn path_like_names_are_rejected() {
        let base = tempfile::tempdir().expect("tempdir");
        let inner = base.path().join("profiles");
        for bad in ["..", "/", "../escape", "a/b"] {
            assert!(
                matches!(create_in(&inner, &args(bad)), Err(Error::InvalidArgument(_))),
                "{bad:?} accepted"
            );
        }
        assert!(!inner.exists());
        assert!(!base.path().join("escape").exists());
    }

    #[test]
    fn remove_rejects_path_like_names() {
        for bad in ["/", "..", "../other"] {
            assert!(matches!(remove(bad), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn no_profiles_in_missing_dir() {
        let base = tempfile::tempdir().expect("tempdir");
        assert!(
            profile_names(&base.path().join("absent"))
                .expect("names")
                .is_empty()
        );
    }
}
