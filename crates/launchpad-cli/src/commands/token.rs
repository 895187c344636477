// crates/launchpad-cli/src/commands/token.rs
//
// `launchpad hash-token`: print the digest to put in `admin_token_sha256`.

use launchpad_rpc::TokenAuthorizer;

/// Run the hash-token command.
pub fn run(token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let token = token.trim();
    if token.is_empty() {
        return Err("token must not be empty".into());
    }
    println!("{}", TokenAuthorizer::digest_hex(token));
    Ok(())
}
