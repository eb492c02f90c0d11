use std::io::Read;

use anyhow::Context;
use softrp::{AttestationObject, AuthenticatorData};
use tracing::{event, Level};

/// Reads a hex encoded attestation object or authenticator data from stdin and
/// prints what it decodes to.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    let bytes = hex::decode(input.trim()).context("Input is not hex")?;

    let auth_data = match AttestationObject::from_slice(&bytes) {
        Ok(object) => {
            event!(Level::INFO, fmt = %object.fmt, "Decoded attestation object");
            println!("fmt: {}", object.fmt);
            println!("attStmt: {}", hex::encode(&object.att_stmt));
            object.auth_data
        }
        Err(err) => {
            event!(Level::DEBUG, %err, "Not an attestation object, trying authenticator data");
            bytes
        }
    };
    let auth_data = AuthenticatorData::from_slice(&auth_data).context("Failed to decode authenticator data")?;
    println!("{:#?}", auth_data);
    Ok(())
}
