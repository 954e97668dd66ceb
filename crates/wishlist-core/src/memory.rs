//! In-memory [`RelationStore`] for tests.
//!
//! Transactions run against a copy of the state that replaces the committed
//! state only on success. A [`FailPoint`] makes one primitive fail so the
//! rollback path can be exercised.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};

use crate::model::{
    CodeRecord, NewUser, NewWish, Stage, UserPatch, UserRecord, WishId, WishRecord,
};
use crate::store::{RelationStore, StoreTx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    AddMember(Stage),
    RemoveMember(Stage),
    AddFriendship,
    RemoveFriendRequest,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: BTreeMap<String, UserRecord>,
    wishes: BTreeMap<WishId, WishRecord>,
    next_wish_id: WishId,
    codes: BTreeMap<String, CodeRecord>,
    // (requestee, requester)
    friend_requests: BTreeSet<(String, String)>,
    // (user, friend)
    friendships: BTreeSet<(String, String)>,
    members: BTreeSet<(WishId, Stage, String)>,
}

impl State {
    fn users_by_id<'a>(&self, ids: impl Iterator<Item = &'a String>) -> Vec<UserRecord> {
        ids.filter_map(|id| self.users.get(id).cloned()).collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail: Mutex<Option<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later transaction fail when it reaches `point`.
    pub fn fail_on(&self, point: FailPoint) {
        if let Ok(mut fail) = self.fail.lock() {
            *fail = Some(point);
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut fail) = self.fail.lock() {
            *fail = None;
        }
    }

    pub fn seed_user(&self, id: &str, email_verified: bool) -> UserRecord {
        let user = UserRecord {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            email_verified,
            password_hash: "not-a-real-hash".to_string(),
            first_name: None,
            last_name: None,
        };
        self.with_state(|state| {
            state.users.insert(user.id.clone(), user.clone());
        });
        user
    }

    /// Insert both directed friendship rows.
    pub fn seed_friends(&self, a: &str, b: &str) {
        self.with_state(|state| {
            state.friendships.insert((a.to_string(), b.to_string()));
            state.friendships.insert((b.to_string(), a.to_string()));
        });
    }

    pub fn seed_wish(&self, owner: &str, name: &str) -> WishId {
        self.with_state(|state| {
            state.next_wish_id += 1;
            let id = state.next_wish_id;
            state.wishes.insert(
                id,
                WishRecord {
                    id,
                    owner: owner.to_string(),
                    name: name.to_string(),
                    description: String::new(),
                    link: String::new(),
                    image: String::new(),
                    created_at: Utc::now(),
                },
            );
            id
        })
    }

    pub fn members(&self, wish: WishId, stage: Stage) -> Vec<String> {
        self.with_state(|state| {
            state
                .members
                .iter()
                .filter(|(w, s, _)| *w == wish && *s == stage)
                .map(|(_, _, user)| user.clone())
                .collect()
        })
    }

    pub fn stages_of(&self, wish: WishId, user: &str) -> Vec<Stage> {
        self.with_state(|state| {
            state
                .members
                .iter()
                .filter(|(w, _, u)| *w == wish && u == user)
                .map(|(_, stage, _)| *stage)
                .collect()
        })
    }

    pub fn has_friendship(&self, user: &str, friend: &str) -> bool {
        self.with_state(|state| {
            state
                .friendships
                .contains(&(user.to_string(), friend.to_string()))
        })
    }

    pub fn has_friend_request(&self, requestee: &str, requester: &str) -> bool {
        self.with_state(|state| {
            state
                .friend_requests
                .contains(&(requestee.to_string(), requester.to_string()))
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T> {
        let state = self
            .state
            .lock()
            .map_err(|e| anyhow!("Memory store lock poisoned: {}", e))?;
        Ok(f(&state))
    }
}

fn page<T>(items: impl Iterator<Item = T>, offset: u32, limit: u32) -> Vec<T> {
    items.skip(offset as usize).take(limit as usize).collect()
}

impl RelationStore for MemoryStore {
    fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        self.read(|s| s.users.get(id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.read(|s| s.users.values().find(|u| u.email == email).cloned())
    }

    fn find_wish(&self, id: WishId) -> Result<Option<WishRecord>> {
        self.read(|s| s.wishes.get(&id).cloned())
    }

    fn find_code(&self, user_id: &str) -> Result<Option<CodeRecord>> {
        self.read(|s| s.codes.get(user_id).cloned())
    }

    fn count_friend_requests(&self, requestee: &str, requester: &str) -> Result<u64> {
        self.read(|s| count_friend_requests(s, requestee, requester))
    }

    fn count_friendships(&self, user: &str, friend: &str) -> Result<u64> {
        self.read(|s| count_friendships(s, user, friend))
    }

    fn count_members(&self, wish: WishId, stage: Stage, user: &str) -> Result<u64> {
        self.read(|s| count_members(s, wish, stage, user))
    }

    fn list_friends(&self, user: &str, offset: u32, limit: u32) -> Result<Vec<UserRecord>> {
        self.read(|s| {
            let ids = s
                .friendships
                .iter()
                .filter(|(u, _)| u == user)
                .map(|(_, friend)| friend);
            page(s.users_by_id(ids).into_iter(), offset, limit)
        })
    }

    fn list_friend_requests(
        &self,
        user: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<UserRecord>> {
        self.read(|s| {
            let ids = s
                .friend_requests
                .iter()
                .filter(|(requestee, _)| requestee == user)
                .map(|(_, requester)| requester);
            page(s.users_by_id(ids).into_iter(), offset, limit)
        })
    }

    fn list_members(
        &self,
        wish: WishId,
        stage: Stage,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<UserRecord>> {
        self.read(|s| {
            let ids = s
                .members
                .iter()
                .filter(|(w, st, _)| *w == wish && *st == stage)
                .map(|(_, _, user)| user);
            page(s.users_by_id(ids).into_iter(), offset, limit)
        })
    }

    fn list_wishes(&self, owner: &str, offset: u32, limit: u32) -> Result<Vec<WishRecord>> {
        self.read(|s| {
            page(
                s.wishes.values().filter(|w| w.owner == owner).cloned(),
                offset,
                limit,
            )
        })
    }

    fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let fail = *self
            .fail
            .lock()
            .map_err(|e| E::from(anyhow!("Memory store lock poisoned: {}", e)))?;
        let mut committed = self
            .state
            .lock()
            .map_err(|e| E::from(anyhow!("Memory store lock poisoned: {}", e)))?;

        let mut tx = MemoryTx {
            state: committed.clone(),
            fail,
        };
        let out = f(&mut tx)?;
        *committed = tx.state;
        Ok(out)
    }
}

struct MemoryTx {
    state: State,
    fail: Option<FailPoint>,
}

impl MemoryTx {
    fn check(&self, point: FailPoint) -> Result<()> {
        if self.fail == Some(point) {
            bail!("injected failure at {:?}", point);
        }
        Ok(())
    }
}

impl StoreTx for MemoryTx {
    fn count_friend_requests(&self, requestee: &str, requester: &str) -> Result<u64> {
        Ok(count_friend_requests(&self.state, requestee, requester))
    }

    fn count_friendships(&self, user: &str, friend: &str) -> Result<u64> {
        Ok(count_friendships(&self.state, user, friend))
    }

    fn count_members(&self, wish: WishId, stage: Stage, user: &str) -> Result<u64> {
        Ok(count_members(&self.state, wish, stage, user))
    }

    fn find_code(&self, user_id: &str) -> Result<Option<CodeRecord>> {
        Ok(self.state.codes.get(user_id).cloned())
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<()> {
        if self.state.users.contains_key(&user.id)
            || self.state.users.values().any(|u| u.email == user.email)
        {
            bail!("UNIQUE constraint failed: users");
        }
        self.state.users.insert(
            user.id.clone(),
            UserRecord {
                id: user.id.clone(),
                email: user.email.clone(),
                email_verified: false,
                password_hash: user.password_hash.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
            },
        );
        Ok(())
    }

    fn update_user(&mut self, id: &str, patch: &UserPatch) -> Result<()> {
        if let Some(user) = self.state.users.get_mut(id) {
            user.first_name = patch.first_name.clone();
            user.last_name = patch.last_name.clone();
        }
        Ok(())
    }

    fn delete_user(&mut self, id: &str) -> Result<()> {
        let s = &mut self.state;
        s.users.remove(id);
        s.codes.remove(id);
        let owned: Vec<WishId> = s
            .wishes
            .values()
            .filter(|w| w.owner == id)
            .map(|w| w.id)
            .collect();
        for wish in &owned {
            s.wishes.remove(wish);
        }
        s.members
            .retain(|(wish, _, user)| user != id && !owned.contains(wish));
        s.friend_requests.retain(|(a, b)| a != id && b != id);
        s.friendships.retain(|(a, b)| a != id && b != id);
        Ok(())
    }

    fn set_email_verified(&mut self, id: &str) -> Result<()> {
        if let Some(user) = self.state.users.get_mut(id) {
            user.email_verified = true;
        }
        Ok(())
    }

    fn insert_wish(
        &mut self,
        owner: &str,
        wish: &NewWish,
        created_at: DateTime<Utc>,
    ) -> Result<WishRecord> {
        if !self.state.users.contains_key(owner) {
            bail!("FOREIGN KEY constraint failed: wishes.owner");
        }
        self.state.next_wish_id += 1;
        let record = WishRecord {
            id: self.state.next_wish_id,
            owner: owner.to_string(),
            name: wish.name.clone(),
            description: wish.description.clone(),
            link: wish.link.clone(),
            image: wish.image.clone(),
            created_at,
        };
        self.state.wishes.insert(record.id, record.clone());
        Ok(record)
    }

    fn update_wish(&mut self, wish: &WishRecord) -> Result<()> {
        self.state.wishes.insert(wish.id, wish.clone());
        Ok(())
    }

    fn delete_wish(&mut self, id: WishId) -> Result<()> {
        self.state.wishes.remove(&id);
        self.state.members.retain(|(wish, _, _)| *wish != id);
        Ok(())
    }

    fn add_friend_request(&mut self, requestee: &str, requester: &str) -> Result<()> {
        let row = (requestee.to_string(), requester.to_string());
        if !self.state.friend_requests.insert(row) {
            bail!("UNIQUE constraint failed: friend_requests");
        }
        Ok(())
    }

    fn remove_friend_request(&mut self, requestee: &str, requester: &str) -> Result<()> {
        self.check(FailPoint::RemoveFriendRequest)?;
        self.state
            .friend_requests
            .remove(&(requestee.to_string(), requester.to_string()));
        Ok(())
    }

    fn add_friendship(&mut self, user: &str, friend: &str) -> Result<()> {
        self.check(FailPoint::AddFriendship)?;
        let row = (user.to_string(), friend.to_string());
        if !self.state.friendships.insert(row) {
            bail!("UNIQUE constraint failed: friendships");
        }
        Ok(())
    }

    fn add_member(&mut self, wish: WishId, stage: Stage, user: &str) -> Result<()> {
        self.check(FailPoint::AddMember(stage))?;
        if !self.state.members.insert((wish, stage, user.to_string())) {
            bail!("UNIQUE constraint failed: {}", stage);
        }
        Ok(())
    }

    fn remove_member(&mut self, wish: WishId, stage: Stage, user: &str) -> Result<()> {
        self.check(FailPoint::RemoveMember(stage))?;
        self.state.members.remove(&(wish, stage, user.to_string()));
        Ok(())
    }

    fn insert_code(&mut self, code: &CodeRecord) -> Result<()> {
        if self.state.codes.contains_key(&code.user_id) {
            bail!("UNIQUE constraint failed: codes.user_id");
        }
        self.state.codes.insert(code.user_id.clone(), code.clone());
        Ok(())
    }

    fn delete_code(&mut self, user_id: &str) -> Result<()> {
        self.state.codes.remove(user_id);
        Ok(())
    }

    fn set_code_retries(&mut self, user_id: &str, retries: u32) -> Result<()> {
        if let Some(code) = self.state.codes.get_mut(user_id) {
            code.retry_count = retries;
        }
        Ok(())
    }
}

fn count_friend_requests(s: &State, requestee: &str, requester: &str) -> u64 {
    u64::from(
        s.friend_requests
            .contains(&(requestee.to_string(), requester.to_string())),
    )
}

fn count_friendships(s: &State, user: &str, friend: &str) -> u64 {
    u64::from(
        s.friendships
            .contains(&(user.to_string(), friend.to_string())),
    )
}

fn count_members(s: &State, wish: WishId, stage: Stage, user: &str) -> u64 {
    u64::from(s.members.contains(&(wish, stage, user.to_string())))
}
