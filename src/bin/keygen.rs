//! One-shot wallet generator.
//!
//! Prints a fresh keypair: the public address in base58 and the secret
//! as the comma-separated 64-byte list the agent's `PRIVATE_KEY`
//! variable expects. Not part of the poll loop; runs and exits.

use courier::wallet::Wallet;

fn main() {
    let wallet = Wallet::generate();
    println!("Public Key: {}", wallet.pubkey());
    println!("Private Key: {}", wallet.secret_bytes_csv());
    println!("IMPORTANT: Store the private key securely!");
}
