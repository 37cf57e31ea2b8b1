use sha2::{Digest, Sha256};

use crate::replay::InputScript;

/// SHA-256 of the level key and every tick's button mask.
pub fn hash_script(script: &InputScript) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(script.world.to_le_bytes());
    hasher.update(script.level.to_le_bytes());
    hasher.update(&script.ticks);
    hasher.finalize().into()
}
