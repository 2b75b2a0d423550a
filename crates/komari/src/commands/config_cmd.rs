//! Config subcommand handlers.

use std::time::Duration;

use dialoguer::{Confirm, Input, Select};

use komari_core::{CredentialKey, CredentialStore, PollMode};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, KeyringCredentialStore, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "poll_interval = {}", cfg.defaults.poll_interval);
    let _ = writeln!(out, "poll_mode = \"{}\"", cfg.defaults.poll_mode);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "ssl = {}", p.ssl);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = p.poll_interval {
            let _ = writeln!(out, "poll_interval = {interval}");
        }
        if let Some(mode) = p.poll_mode {
            let _ = writeln!(out, "poll_mode = \"{mode}\"");
        }
    }

    out
}

/// Copy of the config with secrets masked, for structured output.
fn redacted(cfg: &Config) -> Config {
    let mask = |v: &Option<String>| v.as_ref().map(|_| "****".to_owned());
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: komari_config::Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            insecure: cfg.defaults.insecure,
            timeout: cfg.defaults.timeout,
            poll_interval: cfg.defaults.poll_interval,
            poll_mode: cfg.defaults.poll_mode,
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let masked = Profile {
                    password: mask(&p.password),
                    api_key: mask(&p.api_key),
                    ..p.clone()
                };
                (name.clone(), masked)
            })
            .collect(),
    }
}

/// Delegate to the shared config crate's save function.
fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Split a pasted URL into host and https flag: "https://a.b/" -> ("a.b", Some(true)).
fn split_scheme(input: &str) -> (String, Option<bool>) {
    let trimmed = input.trim().trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("https://") {
        (rest.to_owned(), Some(true))
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        (rest.to_owned(), Some(false))
    } else {
        (trimmed.to_owned(), None)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

/// Seconds as a bare number, or a humantime period such as "30s" or "2m".
fn parse_seconds(field: &str, value: &str) -> Result<u64, CliError> {
    value
        .parse::<u64>()
        .or_else(|_| humantime::parse_duration(value).map(|d: Duration| d.as_secs()))
        .map_err(|_| CliError::Validation {
            field: field.into(),
            reason: "must be seconds or a duration like \"30s\"".into(),
        })
}

fn store_secret(
    store: &KeyringCredentialStore,
    key: CredentialKey,
    secret: &str,
) -> Result<(), CliError> {
    store
        .set(key, secret)
        .map_err(|e| CliError::Keyring(e.to_string()))
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    store: &KeyringCredentialStore,
    key: CredentialKey,
    secret: String,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_secret(store, key, &secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: config::available_profiles(cfg),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("Komari CLI configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Host, with scheme detection
            let raw_host: String = Input::new()
                .with_prompt("Dashboard host (e.g. status.example.com)")
                .interact_text()
                .map_err(prompt_err)?;
            let (host, scheme) = split_scheme(&raw_host);
            if host.is_empty() {
                return Err(CliError::Validation {
                    field: "host".into(),
                    reason: "host cannot be empty".into(),
                });
            }
            let ssl = match scheme {
                Some(ssl) => ssl,
                None => Confirm::new()
                    .with_prompt("Use https?")
                    .default(true)
                    .interact()
                    .map_err(prompt_err)?,
            };

            // 3. Auth
            let store = KeyringCredentialStore::new(&profile_name);
            let auth_choices = &[
                "API key (recommended)",
                "Username/Password",
                "None (public nodes only)",
            ];
            let auth_selection = Select::new()
                .with_prompt("Authentication method")
                .items(auth_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let (api_key, username, password) = match auth_selection {
                0 => {
                    let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
                    if key.is_empty() {
                        return Err(CliError::Validation {
                            field: "api_key".into(),
                            reason: "API key cannot be empty".into(),
                        });
                    }
                    let field = prompt_keyring_storage(&store, CredentialKey::ApiKey, key, "API key")?;
                    (field, None, None)
                }
                1 => {
                    let user: String = Input::new()
                        .with_prompt("Username")
                        .interact_text()
                        .map_err(prompt_err)?;
                    let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
                    if user.is_empty() || pass.is_empty() {
                        return Err(CliError::Validation {
                            field: "credentials".into(),
                            reason: "username and password cannot be empty".into(),
                        });
                    }
                    let field =
                        prompt_keyring_storage(&store, CredentialKey::Password, pass, "password")?;
                    (None, Some(user), field)
                }
                _ => (None, None, None),
            };

            // 4. Merge into the existing config
            let profile = Profile {
                host,
                ssl,
                username,
                password,
                api_key,
                ..Profile::default()
            };
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: komari nodes list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile {
                    ssl: true,
                    ..Profile::default()
                });
            apply_setting(profile, &key, &value)?;

            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: komari config init");
            } else {
                let mut names: Vec<&String> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { key } => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(profile_name, &cfg));
            }

            let (credential, prompt) = if key {
                (CredentialKey::ApiKey, "API key: ")
            } else {
                (CredentialKey::Password, "Password: ")
            };
            let secret = rpassword::prompt_password(prompt).map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            store_secret(&KeyringCredentialStore::new(&profile_name), credential, &secret)?;

            if !global.quiet {
                eprintln!("✓ Secret stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}

/// Apply one `config set` key to a profile.
fn apply_setting(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "host" => {
            let (host, scheme) = split_scheme(value);
            profile.host = host;
            if let Some(ssl) = scheme {
                profile.ssl = ssl;
            }
        }
        "ssl" => profile.ssl = parse_bool("ssl", value)?,
        "username" => profile.username = Some(value.into()),
        "api_key" | "api-key" => profile.api_key = Some(value.into()),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_bool("insecure", value)?),
        "timeout" => profile.timeout = Some(parse_seconds("timeout", value)?),
        "poll_interval" | "poll-interval" => {
            profile.poll_interval = Some(parse_seconds("poll_interval", value)?);
        }
        "poll_mode" | "poll-mode" => {
            profile.poll_mode = Some(value.parse::<PollMode>().map_err(|_| {
                CliError::Validation {
                    field: "poll_mode".into(),
                    reason: "must be 'best-effort' or 'strict'".into(),
                }
            })?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: host, ssl, username, api_key, \
                     api_key_env, insecure, timeout, poll_interval, poll_mode, ca_cert"
                ),
            });
        }
    }
    Ok(())
}
