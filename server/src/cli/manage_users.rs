use crate::cli::util::{query_user, query_user_and_check, query_user_bool};
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::actor::Actor;
use crate::data_store::credentials;
use crate::data_store::models::NewUser;
use crate::data_store::{get_store_from_env, BoardroomStore};

pub fn print_user_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let actor = Actor::create_for_cli(&auth_key);
    let users = data_store.get_users(&actor)?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "name", "email", "admin", "active"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(users.into_iter().map(|user| {
            [
                user.id.to_string(),
                user.name,
                user.email,
                if user.is_admin { "yes" } else { "" }.to_string(),
                if user.is_active { "yes" } else { "no" }.to_string(),
            ]
        }));

    println!("Registered users:");
    println!("{table}");
    Ok(())
}

pub fn add_user() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let name: String = query_user_and_check("Full name of the user", |v: &String| {
        if v.is_empty() {
            Err("Name must not be empty")
        } else {
            Ok(())
        }
    });
    let email: String = query_user_and_check("E-mail address (used for login)", |v: &String| {
        if v.contains('@') {
            Ok(())
        } else {
            Err("Not a valid e-mail address")
        }
    });
    let password: String = query_user("Initial password");
    let is_admin = query_user_bool("Grant administrative capabilities?", Some(false));

    let auth_key = CliAuthTokenKey::new();
    let actor = Actor::create_for_cli(&auth_key);
    let user_id = data_store.create_user(
        &actor,
        NewUser {
            name,
            email,
            password_hash: credentials::hash_password(&password),
            is_admin,
            is_active: true,
        },
    )?;
    println!("Success. New user id: {}", user_id);
    Ok(())
}
