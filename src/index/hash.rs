use md5::{Digest, Md5};

/// Routes a term to a shard using the full 128-bit MD5 digest reduced
/// modulo the shard count.
///
/// MD5 is cryptographically broken, which is irrelevant here: the only
/// property this needs is that the same term always maps to the same
/// shard. The choice is not arbitrary — it matches the hash used by the
/// system this builder reimplements, so shard assignment stays externally
/// predictable.
pub fn shard_id(term: &str, num_shards: u16) -> u16 {
    let mut hasher = Md5::new();
    hasher.update(term.as_bytes());
    let digest = hasher.finalize();

    let value = u128::from_be_bytes(digest.into());
    (value % num_shards as u128) as u16
}
