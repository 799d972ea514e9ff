// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! User repository.
//!
//! Users are keyed by `(chain_id, wallet)`. Referral codes are indexed
//! globally and direct referral edges are kept in their own table so tier
//! counts never need a full scan.

use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use crate::events::GameOutcome;
use crate::models::{amount, WalletAddress};
use crate::progression::{calculate_level_from_xp, VipTier};
use crate::referral::ReferralCode;
use crate::storage::db::{
    decode, encode, user_key, CasinoDb, StoreError, StoreResult, REFERRALS, REFERRAL_CODES, USERS,
};

/// Attempts at drawing an unused referral code before giving up.
const CODE_ATTEMPTS: usize = 16;

/// Upper bound on referral-chain walks during cycle detection.
pub const MAX_REFERRAL_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub wallet_address: WalletAddress,
    pub chain_id: u64,
    pub display_name: Option<String>,
    pub xp: u64,
    pub level: u32,
    pub vip_tier: VipTier,
    pub referral_code: ReferralCode,
    pub referred_by: Option<WalletAddress>,
    pub games_played: u64,
    pub games_won: u64,
    #[serde(with = "amount")]
    pub total_wagered: u128,
    #[serde(with = "amount")]
    pub total_payout: u128,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    fn new(
        chain_id: u64,
        wallet: WalletAddress,
        referral_code: ReferralCode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            wallet_address: wallet,
            chain_id,
            display_name: None,
            xp: 0,
            level: 0,
            vip_tier: VipTier::Bronze,
            referral_code,
            referred_by: None,
            games_played: 0,
            games_won: 0,
            total_wagered: 0,
            total_payout: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> String {
        user_key(self.chain_id, self.wallet_address.as_str())
    }

    /// Add XP and re-derive level and VIP tier.
    pub fn add_xp(&mut self, xp: u64) {
        self.xp = self.xp.saturating_add(xp);
        self.level = calculate_level_from_xp(self.xp);
        self.vip_tier = VipTier::from_level(self.level);
    }

    /// Fold a settled round into the player's aggregates.
    pub fn apply_round(
        &mut self,
        bet_amount: u128,
        payout: u128,
        outcome: GameOutcome,
        xp: u64,
        now: DateTime<Utc>,
    ) {
        self.games_played += 1;
        if outcome.is_win() {
            self.games_won += 1;
        }
        self.total_wagered = self.total_wagered.saturating_add(bet_amount);
        self.total_payout = self.total_payout.saturating_add(payout);
        self.add_xp(xp);
        self.updated_at = now;
    }

    /// Net result for the player: payout minus wagered.
    pub fn profit(&self) -> i128 {
        saturating_profit(self.total_payout, self.total_wagered)
    }
}

pub(crate) fn saturating_profit(payout: u128, wagered: u128) -> i128 {
    let payout = i128::try_from(payout).unwrap_or(i128::MAX);
    let wagered = i128::try_from(wagered).unwrap_or(i128::MAX);
    payout.saturating_sub(wagered)
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

pub(crate) fn load_user(txn: &WriteTransaction, key: &str) -> StoreResult<Option<StoredUser>> {
    let table = txn.open_table(USERS)?;
    let bytes = match table.get(key)? {
        Some(value) => value.value().to_vec(),
        None => return Ok(None),
    };
    Ok(Some(decode(&bytes)?))
}

pub(crate) fn save_user(txn: &WriteTransaction, user: &StoredUser) -> StoreResult<()> {
    let json = encode(user)?;
    let mut table = txn.open_table(USERS)?;
    table.insert(user.key().as_str(), json.as_slice())?;
    Ok(())
}

/// Insert a brand-new user with a fresh referral code.
pub(crate) fn create_in_txn(
    txn: &WriteTransaction,
    chain_id: u64,
    wallet: &WalletAddress,
    now: DateTime<Utc>,
) -> StoreResult<StoredUser> {
    let key = user_key(chain_id, wallet.as_str());
    if load_user(txn, &key)?.is_some() {
        return Err(StoreError::Conflict("User already exists".to_string()));
    }

    let code = {
        let mut codes = txn.open_table(REFERRAL_CODES)?;
        let mut allocated = None;
        for _ in 0..CODE_ATTEMPTS {
            let candidate = ReferralCode::generate();
            if codes.get(candidate.as_str())?.is_none() {
                codes.insert(candidate.as_str(), key.as_str())?;
                allocated = Some(candidate);
                break;
            }
        }
        allocated.ok_or_else(|| StoreError::Conflict("Could not allocate referral code".to_string()))?
    };

    let user = StoredUser::new(chain_id, wallet.clone(), code, now);
    save_user(txn, &user)?;
    Ok(user)
}

/// Link `user` to `referrer` inside an open write transaction.
fn link_in_txn(
    txn: &WriteTransaction,
    user: &mut StoredUser,
    referrer: &WalletAddress,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    if user.referred_by.is_some() {
        return Err(StoreError::Conflict("Referrer already set".to_string()));
    }

    let referrer_key = user_key(user.chain_id, referrer.as_str());
    let mut cursor = load_user(txn, &referrer_key)?
        .ok_or_else(|| StoreError::NotFound("Referrer".to_string()))?;

    // Walk up from the referrer; meeting the user again would close a loop.
    for _ in 0..MAX_REFERRAL_DEPTH {
        if cursor.wallet_address == user.wallet_address {
            return Err(StoreError::Conflict("Referral would create a cycle".to_string()));
        }
        let Some(parent) = cursor.referred_by.clone() else {
            break;
        };
        match load_user(txn, &user_key(user.chain_id, parent.as_str()))? {
            Some(next) => cursor = next,
            None => break,
        }
    }

    user.referred_by = Some(referrer.clone());
    user.updated_at = now;
    save_user(txn, user)?;

    let mut edges = txn.open_table(REFERRALS)?;
    let edge = format!("{referrer_key}|{}", user.wallet_address);
    edges.insert(edge.as_str(), now.timestamp_millis())?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

pub struct UserRepository<'a> {
    db: &'a CasinoDb,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a CasinoDb) -> Self {
        Self { db }
    }

    pub fn get(&self, chain_id: u64, wallet: &WalletAddress) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(user_key(chain_id, wallet.as_str()).as_str())? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_by_referral_code(&self, code: &ReferralCode) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let codes = read_txn.open_table(REFERRAL_CODES)?;
        let key = match codes.get(code.as_str())? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };
        let users = read_txn.open_table(USERS)?;
        match users.get(key.as_str())? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Create a user, optionally linked to a referrer, in one transaction.
    ///
    /// Fails with `Conflict` if the user already exists.
    pub fn create(
        &self,
        chain_id: u64,
        wallet: &WalletAddress,
        display_name: Option<String>,
        referrer: Option<&WalletAddress>,
        now: DateTime<Utc>,
    ) -> StoreResult<StoredUser> {
        let write_txn = self.db.begin_write()?;
        let mut user = create_in_txn(&write_txn, chain_id, wallet, now)?;
        if display_name.is_some() {
            user.display_name = display_name;
            save_user(&write_txn, &user)?;
        }
        if let Some(referrer) = referrer {
            link_in_txn(&write_txn, &mut user, referrer, now)?;
        }
        write_txn.commit()?;
        Ok(user)
    }

    pub fn update_display_name(
        &self,
        chain_id: u64,
        wallet: &WalletAddress,
        display_name: String,
        now: DateTime<Utc>,
    ) -> StoreResult<StoredUser> {
        let write_txn = self.db.begin_write()?;
        let mut user = load_user(&write_txn, &user_key(chain_id, wallet.as_str()))?
            .ok_or_else(|| StoreError::NotFound("User".to_string()))?;
        user.display_name = Some(display_name);
        user.updated_at = now;
        save_user(&write_txn, &user)?;
        write_txn.commit()?;
        Ok(user)
    }

    /// Link an existing user to a referrer.
    ///
    /// Rejects a second link and any link that would close a referral loop.
    pub fn set_referrer(
        &self,
        chain_id: u64,
        wallet: &WalletAddress,
        referrer: &WalletAddress,
        now: DateTime<Utc>,
    ) -> StoreResult<StoredUser> {
        let write_txn = self.db.begin_write()?;
        let mut user = load_user(&write_txn, &user_key(chain_id, wallet.as_str()))?
            .ok_or_else(|| StoreError::NotFound("User".to_string()))?;
        link_in_txn(&write_txn, &mut user, referrer, now)?;
        write_txn.commit()?;
        Ok(user)
    }

    /// All users registered on a chain.
    pub fn list_by_chain(&self, chain_id: u64) -> StoreResult<Vec<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        // ';' is the byte after ':'
        let start = format!("{chain_id}:");
        let end = format!("{chain_id};");

        let mut users = Vec::new();
        for entry in table.range(start.as_str()..end.as_str())? {
            let (_, value) = entry?;
            users.push(decode(value.value())?);
        }
        Ok(users)
    }

    /// Direct wallets referred by this user.
    pub fn referees(&self, chain_id: u64, wallet: &WalletAddress) -> StoreResult<Vec<WalletAddress>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REFERRALS)?;
        referees_in(&table, &user_key(chain_id, wallet.as_str()))
    }

    /// `(tier1, tier2)` referee counts.
    pub fn referee_counts(&self, chain_id: u64, wallet: &WalletAddress) -> StoreResult<(u64, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REFERRALS)?;

        let direct = referees_in(&table, &user_key(chain_id, wallet.as_str()))?;
        let mut indirect = 0u64;
        for referee in &direct {
            indirect += referees_in(&table, &user_key(chain_id, referee.as_str()))?.len() as u64;
        }
        Ok((direct.len() as u64, indirect))
    }
}

fn referees_in(
    table: &impl ReadableTable<&'static str, i64>,
    referrer_key: &str,
) -> StoreResult<Vec<WalletAddress>> {
    // '}' is the byte after '|'
    let start = format!("{referrer_key}|");
    let end = format!("{referrer_key}}}");

    let mut out = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (key, _) = entry?;
        let wallet = key
            .value()
            .rsplit('|')
            .next()
            .and_then(|raw| WalletAddress::parse(raw).ok())
            .ok_or(StoreError::InvalidKey("referrals"))?;
        out.push(wallet);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: u64 = 8453;

    fn wallet(byte: char) -> WalletAddress {
        WalletAddress::parse(&format!("0x{}", byte.to_string().repeat(40))).unwrap()
    }

    fn repo_db() -> CasinoDb {
        CasinoDb::in_memory().unwrap()
    }

    #[test]
    fn create_and_get_user() {
        let db = repo_db();
        let repo = UserRepository::new(&db);
        let alice = wallet('a');

        let created = repo
            .create(CHAIN, &alice, Some("alice".to_string()), None, Utc::now())
            .unwrap();
        assert_eq!(created.xp, 0);
        assert_eq!(created.vip_tier, VipTier::Bronze);

        let fetched = repo.get(CHAIN, &alice).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(
            repo.get_by_referral_code(&created.referral_code).unwrap().unwrap().wallet_address,
            alice
        );

        // Same wallet on another chain is a different user.
        assert!(repo.get(1, &alice).unwrap().is_none());
    }

    #[test]
    fn duplicate_create_conflicts() {
        let db = repo_db();
        let repo = UserRepository::new(&db);
        repo.create(CHAIN, &wallet('a'), None, None, Utc::now()).unwrap();
        let err = repo.create(CHAIN, &wallet('a'), None, None, Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn referrer_is_set_once() {
        let db = repo_db();
        let repo = UserRepository::new(&db);
        let now = Utc::now();
        repo.create(CHAIN, &wallet('a'), None, None, now).unwrap();
        repo.create(CHAIN, &wallet('c'), None, None, now).unwrap();
        repo.create(CHAIN, &wallet('b'), None, Some(&wallet('a')), now).unwrap();

        let err = repo.set_referrer(CHAIN, &wallet('b'), &wallet('c'), now).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg == "Referrer already set"));
    }

    #[test]
    fn referral_cycles_are_rejected() {
        let db = repo_db();
        let repo = UserRepository::new(&db);
        let now = Utc::now();
        repo.create(CHAIN, &wallet('a'), None, None, now).unwrap();
        repo.create(CHAIN, &wallet('b'), None, Some(&wallet('a')), now).unwrap();
        repo.create(CHAIN, &wallet('c'), None, Some(&wallet('b')), now).unwrap();

        // a -> c would close a -> c -> b -> a
        let err = repo.set_referrer(CHAIN, &wallet('a'), &wallet('c'), now).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg.contains("cycle")));
        assert!(repo.get(CHAIN, &wallet('a')).unwrap().unwrap().referred_by.is_none());
    }

    #[test]
    fn counts_both_tiers() {
        let db = repo_db();
        let repo = UserRepository::new(&db);
        let now = Utc::now();
        repo.create(CHAIN, &wallet('a'), None, None, now).unwrap();
        repo.create(CHAIN, &wallet('b'), None, Some(&wallet('a')), now).unwrap();
        repo.create(CHAIN, &wallet('c'), None, Some(&wallet('a')), now).unwrap();
        repo.create(CHAIN, &wallet('d'), None, Some(&wallet('b')), now).unwrap();

        assert_eq!(repo.referee_counts(CHAIN, &wallet('a')).unwrap(), (2, 1));
        assert_eq!(repo.referee_counts(CHAIN, &wallet('b')).unwrap(), (1, 0));
        assert_eq!(repo.referees(CHAIN, &wallet('a')).unwrap(), vec![wallet('b'), wallet('c')]);
    }

    #[test]
    fn list_by_chain_is_scoped() {
        let db = repo_db();
        let repo = UserRepository::new(&db);
        let now = Utc::now();
        repo.create(CHAIN, &wallet('a'), None, None, now).unwrap();
        repo.create(CHAIN, &wallet('b'), None, None, now).unwrap();
        repo.create(84532, &wallet('c'), None, None, now).unwrap();

        assert_eq!(repo.list_by_chain(CHAIN).unwrap().len(), 2);
        assert_eq!(repo.list_by_chain(84532).unwrap().len(), 1);
    }

    #[test]
    fn apply_round_updates_level_and_tier() {
        let mut user = StoredUser::new(CHAIN, wallet('a'), ReferralCode::generate(), Utc::now());
        user.apply_round(100, 200, GameOutcome::Win, 5_000, Utc::now());
        assert_eq!(user.games_played, 1);
        assert_eq!(user.games_won, 1);
        assert_eq!(user.level, 10);
        assert_eq!(user.vip_tier, VipTier::Gold);
        assert_eq!(user.profit(), 100);
    }
}
