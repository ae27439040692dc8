//! Account command handlers: sign in/out, registration and profile.

use anyhow::{Result, bail};
use bookshelf_core::library::{ProfileUpdate, User};
use tracing::info;

use crate::app_config::EffectiveSettings;

use super::{api_failure, library_client, non_blank, resolve_password};

pub async fn run_login_command(
    settings: &EffectiveSettings,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_password(password)?;
    let client = library_client(settings)?;
    let user = client
        .login(email, &password)
        .await
        .map_err(|e| api_failure("Login", e))?;

    match user {
        Some(user) => info!("Signed in as {}", describe_user(&user)),
        None => info!(email, "Signed in"),
    }
    Ok(())
}

pub async fn run_register_command(
    settings: &EffectiveSettings,
    name: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Name must not be empty");
    }
    let password = resolve_password(password)?;
    let client = library_client(settings)?;
    let user = client
        .register(name.trim(), email, &password)
        .await
        .map_err(|e| api_failure("Registration", e))?;

    match user {
        Some(user) => info!("Account created; signed in as {}", describe_user(&user)),
        None => info!(email, "Account created; signed in"),
    }
    Ok(())
}

pub fn run_logout_command(settings: &EffectiveSettings) -> Result<()> {
    let client = library_client(settings)?;
    if !client.is_authenticated()? {
        info!("Not signed in");
        return Ok(());
    }
    client.logout()?;
    info!("Signed out");
    Ok(())
}

pub fn run_whoami_command(settings: &EffectiveSettings) -> Result<()> {
    let client = library_client(settings)?;
    match client.current_user()? {
        Some(user) => println!("{}", describe_user(&user)),
        None if client.is_authenticated()? => {
            println!("Signed in (token carries no readable profile)");
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

pub async fn run_profile_show_command(settings: &EffectiveSettings) -> Result<()> {
    let client = library_client(settings)?;
    let user = client
        .profile()
        .await
        .map_err(|e| api_failure("Loading profile", e))?;
    print_profile(&user);
    Ok(())
}

pub async fn run_profile_update_command(
    settings: &EffectiveSettings,
    name: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let update = ProfileUpdate {
        name: non_blank(name),
        email: non_blank(email),
    };
    if update.name.is_none() && update.email.is_none() {
        bail!("Nothing to update. Pass --name and/or --email");
    }

    let client = library_client(settings)?;
    let updated = client
        .update_profile(&update)
        .await
        .map_err(|e| api_failure("Updating profile", e))?;

    match updated {
        Some(user) => print_profile(&user),
        None => info!("Profile updated"),
    }
    Ok(())
}

pub async fn run_profile_delete_command(settings: &EffectiveSettings, yes: bool) -> Result<()> {
    if !yes {
        bail!(
            "Deleting the account removes every book in it. Re-run with --yes to confirm"
        );
    }
    let client = library_client(settings)?;
    client
        .delete_account()
        .await
        .map_err(|e| api_failure("Deleting account", e))?;
    info!("Account deleted");
    Ok(())
}

fn describe_user(user: &User) -> String {
    if user.name.is_empty() {
        user.email.clone()
    } else {
        format!("{} <{}>", user.name, user.email)
    }
}

fn print_profile(user: &User) {
    println!("ID:      {}", user.id);
    println!("Name:    {}", user.name);
    println!("Email:   {}", user.email);
    if let Some(created_at) = &user.created_at {
        println!("Created: {created_at}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_user_with_and_without_name() {
        let mut user = User {
            id: 1,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            created_at: None,
        };
        assert_eq!(describe_user(&user), "Ana <ana@example.com>");
        user.name.clear();
        assert_eq!(describe_user(&user), "ana@example.com");
    }
}
