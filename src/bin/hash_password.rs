use std::env;

use interview_console::auth::password;

/// Prints an argon2 hash suitable for the ADMIN_PASSWORD_HASH variable.
fn main() {
    let Some(password) = env::args().nth(1) else {
        eprintln!("Usage: hash_password <password>");
        std::process::exit(1);
    };

    match password::hash_password(&password) {
        Ok(hash) => println!("{hash}"),
        Err(err) => {
            eprintln!("hashing failed: {err}");
            std::process::exit(1);
        }
    }
}
