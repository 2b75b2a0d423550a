//! Session command handlers: login, whoami, logout.

use komari_core::{Dashboard, MeData};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

fn detail(me: &MeData) -> String {
    [
        format!("Username:  {}", util::or_dash(me.username.as_deref())),
        format!("UUID:      {}", util::or_dash(me.uuid.as_deref())),
        format!("Logged in: {}", yes_no(me.logged_in)),
        format!("SSO:       {}", util::or_dash(me.sso_type.as_deref())),
        format!("2FA:       {}", yes_no(me.two_factor_enabled)),
    ]
    .join("\n")
}

pub async fn login(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let Some((username, _)) = dashboard.config().credentials() else {
        let cfg = config::load_config_or_default();
        return Err(CliError::NoCredentials {
            profile: config::active_profile_name(global, &cfg),
        });
    };
    let username = username.to_owned();

    dashboard.login().await?;
    if !global.quiet {
        eprintln!("Logged in as {username}");
    }
    Ok(())
}

pub async fn whoami(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    util::authenticate(dashboard).await?;
    let me = dashboard.whoami().await?;
    let out = output::render_single(&global.output, &me, detail, |m| {
        m.username.clone().unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn logout(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    util::authenticate(dashboard).await?;
    dashboard.logout().await?;
    if !global.quiet {
        eprintln!("Logged out");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_marks_unknown_fields() {
        let me = MeData {
            username: Some("admin".into()),
            logged_in: Some(true),
            ..MeData::default()
        };
        let text = detail(&me);
        assert!(text.contains("Username:  admin"));
        assert!(text.contains("Logged in: yes"));
        assert!(text.contains("2FA:       -"));
    }
}
