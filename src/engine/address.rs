//! Deterministic, non-forgeable entity addresses.
//!
//! An address is `sha256(seeds || bump || program_id || "ProgramDerivedAddress")`
//! for the highest bump in `255..=1` whose hash is not a valid ed25519 point,
//! so no private key can exist for it.

use crate::domain::{Pubkey, ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::error::ClientError;
use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// One key field, encoded at its declared width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    U8(u8),
    /// 8-byte little-endian.
    U64(u64),
    Key(Pubkey),
    Bytes(Vec<u8>),
}

impl Seed {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Seed::U8(v) => vec![*v],
            Seed::U64(v) => v.to_le_bytes().to_vec(),
            Seed::Key(k) => k.as_bytes().to_vec(),
            Seed::Bytes(b) => b.clone(),
        }
    }
}

impl From<Pubkey> for Seed {
    fn from(value: Pubkey) -> Self {
        Seed::Key(value)
    }
}

/// Derived address plus the bump that made it off-curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub address: Pubkey,
    pub bump: u8,
}

/// Vault flavours held per (lockup, mint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VaultKind {
    Hot,
    Cold,
    RewardPool,
    Cooldown,
}

impl VaultKind {
    pub fn tag(&self) -> &'static str {
        match self {
            VaultKind::Hot => "hot_vault",
            VaultKind::Cold => "cold_vault",
            VaultKind::RewardPool => "reward_pool",
            VaultKind::Cooldown => "cooldown_vault",
        }
    }
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Hash seeds into an address; `None` when the result lands on the curve.
pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<Option<Pubkey>, ClientError> {
    if seeds.len() > MAX_SEEDS {
        return Err(ClientError::MalformedAddress(format!(
            "{} seeds exceeds limit of {}",
            seeds.len(),
            MAX_SEEDS
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(ClientError::MalformedAddress(format!(
            "seed of {} bytes exceeds limit of {}",
            seed.len(),
            MAX_SEED_LEN
        )));
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        Ok(None)
    } else {
        Ok(Some(Pubkey::new(hash)))
    }
}

/// Search bumps from 255 downward for the first off-curve address.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Derived, ClientError> {
    // The bump occupies one seed slot.
    if seeds.len() >= MAX_SEEDS {
        return Err(ClientError::MalformedAddress(format!(
            "{} seeds leaves no room for a bump",
            seeds.len()
        )));
    }
    for bump in (1..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        if let Some(address) = create_program_address(&with_bump, program_id)? {
            return Ok(Derived { address, bump });
        }
    }
    Err(ClientError::MalformedAddress("no viable bump seed".to_string()))
}

/// Resolves every entity address for one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: Pubkey,
}

impl AddressDeriver {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Derive from a namespace tag followed by ordered components.
    pub fn derive(&self, tag: &str, components: &[Seed]) -> Result<Derived, ClientError> {
        let encoded: Vec<Vec<u8>> = components.iter().map(Seed::to_bytes).collect();
        let mut seeds: Vec<&[u8]> = Vec::with_capacity(encoded.len() + 1);
        seeds.push(tag.as_bytes());
        seeds.extend(encoded.iter().map(Vec::as_slice));
        find_program_address(&seeds, &self.program_id)
    }

    pub fn settings(&self) -> Result<Derived, ClientError> {
        self.derive("settings", &[])
    }

    /// Admin roles are indexed by a single byte.
    pub fn admin(&self, index: u8) -> Result<Derived, ClientError> {
        self.derive("admin", &[Seed::U8(index)])
    }

    pub fn asset(&self, mint: &Pubkey) -> Result<Derived, ClientError> {
        self.derive("asset", &[Seed::Key(*mint)])
    }

    pub fn lockup(&self, lockup_id: u64) -> Result<Derived, ClientError> {
        self.derive("lockup", &[Seed::U64(lockup_id)])
    }

    pub fn deposit(&self, lockup: &Pubkey, deposit_id: u64) -> Result<Derived, ClientError> {
        self.derive("deposit", &[Seed::Key(*lockup), Seed::U64(deposit_id)])
    }

    pub fn cooldown(&self, deposit: &Pubkey) -> Result<Derived, ClientError> {
        self.derive("cooldown", &[Seed::Key(*deposit)])
    }

    pub fn intent(&self, deposit: &Pubkey) -> Result<Derived, ClientError> {
        self.derive("intent", &[Seed::Key(*deposit)])
    }

    pub fn slash(&self, lockup: &Pubkey, slash_id: u64) -> Result<Derived, ClientError> {
        self.derive("slash", &[Seed::Key(*lockup), Seed::U64(slash_id)])
    }

    pub fn reward_boost(&self, lockup: &Pubkey, boost_id: u64) -> Result<Derived, ClientError> {
        self.derive("reward_boost", &[Seed::Key(*lockup), Seed::U64(boost_id)])
    }

    pub fn vault(
        &self,
        kind: VaultKind,
        lockup: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Derived, ClientError> {
        self.derive(kind.tag(), &[Seed::Key(*lockup), Seed::Key(*mint)])
    }
}

/// The owner's associated token account for `mint`.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, ClientError> {
    find_program_address(
        &[&owner.as_bytes()[..], &TOKEN_PROGRAM_ID.as_bytes()[..], &mint.as_bytes()[..]],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|d| d.address)
}
