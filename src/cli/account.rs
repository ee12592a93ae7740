//! CLI `register`, `login` and `profile` commands.

use anyhow::Result;
use std::io::Write;

use echosoul::account::{self, ProfileUpdate, UserProfile};
use echosoul::config::EchoConfig;

fn prompt_secret(label: &str) -> Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn print_profile(profile: &UserProfile) {
    println!("  User id:     {}", profile.id);
    println!("  E-mail:      {}", profile.email);
    println!("  Name:        {}", profile.name.as_deref().unwrap_or("-"));
    println!("  Birth date:  {}", profile.birth_date.as_deref().unwrap_or("-"));
    println!("  Timezone:    {}", profile.timezone.as_deref().unwrap_or("-"));
    println!("  Bio:         {}", profile.bio.as_deref().unwrap_or("-"));
    println!("  Created:     {}", profile.created_at);
    if let Some(last_login) = &profile.last_login {
        println!("  Last login:  {last_login}");
    }
}

pub fn register(
    config: &EchoConfig,
    email: &str,
    name: &str,
    password: Option<String>,
    confirm: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_secret("Password")?,
    };
    let confirm = match confirm {
        Some(c) => c,
        None => prompt_secret("Confirm password")?,
    };

    let conn = super::open_db(config)?;
    let profile = account::register(&conn, email, name, &password, &confirm)?;
    echosoul::personality::load_or_create(&conn, &profile.id)?;

    println!("Account created successfully!");
    print_profile(&profile);
    Ok(())
}

pub fn login(config: &EchoConfig, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_secret("Password")?,
    };

    let conn = super::open_db(config)?;
    let profile = account::login(&conn, email, &password)?;
    let personality = echosoul::personality::load_or_create(&conn, &profile.id)?;

    let name = profile.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&profile.email);
    println!("{}, {name}! {} is here.", echosoul::display::greeting(), personality.name());
    println!("  User id:     {}", profile.id);
    Ok(())
}

pub fn profile(config: &EchoConfig, email: &str, update: ProfileUpdate) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;

    let changed = update.name.is_some()
        || update.birth_date.is_some()
        || update.timezone.is_some()
        || update.bio.is_some();
    let profile = if changed {
        let profile = account::update_profile(&conn, &user_id, update)?;
        println!("Profile updated successfully!");
        profile
    } else {
        account::get_profile(&conn, &user_id)?
            .ok_or_else(|| anyhow::anyhow!("profile disappeared for {email}"))?
    };

    print_profile(&profile);
    Ok(())
}
