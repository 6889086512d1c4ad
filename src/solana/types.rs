// Address syntax and cluster monikers for Solana

/// Clusters a wallet can target
pub const KNOWN_CLUSTERS: [&str; 4] = ["mainnet-beta", "testnet", "devnet", "localnet"];

/// Raw byte length of a public key
pub const PUBKEY_BYTES: usize = 32;

/// Whether `value` is a base58 encoded 32 byte public key.
pub fn is_address(value: &str) -> bool {
    bs58::decode(value)
        .into_vec()
        .map(|bytes| bytes.len() == PUBKEY_BYTES)
        .unwrap_or(false)
}
