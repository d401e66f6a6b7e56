//! In-process [`Engine`] implementation.
//!
//! [`MemoryEngine`] keeps accounts, buddies and groups in shared records and
//! hands out cheap `Rc` wrappers for them. Every lookup returns a fresh
//! wrapper, so handles compare by pointer identity, never by content, the
//! same way a native engine's transient wrappers behave.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::protocol::ProtocolInfo;

macro_rules! identity_handle {
    ($(#[$meta:meta])* $name:ident => $record:ty) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Rc<RefCell<$record>>);

        impl $name {
            fn new(record: $record) -> Self {
                Self(Rc::new(RefCell::new(record)))
            }

            fn record(&self) -> Ref<'_, $record> {
                self.0.borrow()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $name {}

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&Rc::as_ptr(&self.0))
                    .finish()
            }
        }
    };
}

#[derive(Debug, Default)]
struct AccountRecord {
    username: String,
    protocol_id: String,
    password: String,
    strings: BTreeMap<String, String>,
    ints: BTreeMap<String, i64>,
    enabled_for: BTreeSet<String>,
}

#[derive(Debug)]
struct BuddyRecord {
    account: MemoryAccount,
    name: String,
    alias: String,
    group: Option<MemoryGroup>,
}

#[derive(Debug)]
struct GroupRecord {
    name: String,
}

identity_handle! {
    /// Account handle issued by [`MemoryEngine`].
    MemoryAccount => AccountRecord
}

identity_handle! {
    /// Buddy handle issued by [`MemoryEngine`].
    MemoryBuddy => BuddyRecord
}

identity_handle! {
    /// Group handle issued by [`MemoryEngine`].
    MemoryGroup => GroupRecord
}

impl MemoryAccount {
    /// Account user name.
    #[must_use]
    pub fn username(&self) -> String {
        self.record().username.clone()
    }

    /// Protocol plugin id.
    #[must_use]
    pub fn protocol_id(&self) -> String {
        self.record().protocol_id.clone()
    }

    /// Stored password.
    #[must_use]
    pub fn password(&self) -> String {
        self.record().password.clone()
    }

    /// A string option, e.g. `server`.
    #[must_use]
    pub fn string_option(&self, key: &str) -> Option<String> {
        self.record().strings.get(key).cloned()
    }

    /// An integer option, e.g. `port`.
    #[must_use]
    pub fn int_option(&self, key: &str) -> Option<i64> {
        self.record().ints.get(key).copied()
    }

    /// Whether the account is enabled for `ui_id`.
    #[must_use]
    pub fn is_enabled(&self, ui_id: &str) -> bool {
        self.record().enabled_for.contains(ui_id)
    }
}

impl MemoryBuddy {
    /// Buddy name.
    #[must_use]
    pub fn name(&self) -> String {
        self.record().name.clone()
    }

    /// Buddy alias.
    #[must_use]
    pub fn alias(&self) -> String {
        self.record().alias.clone()
    }

    /// The account this buddy belongs to.
    #[must_use]
    pub fn account(&self) -> MemoryAccount {
        self.record().account.clone()
    }
}

impl MemoryGroup {
    /// Group name.
    #[must_use]
    pub fn name(&self) -> String {
        self.record().name.clone()
    }
}

/// An [`Engine`] that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    protocols: Vec<ProtocolInfo>,
    accounts: Vec<MemoryAccount>,
    buddies: Vec<MemoryBuddy>,
    groups: Vec<MemoryGroup>,
}

impl MemoryEngine {
    /// Create an engine with the given protocol plugins loaded.
    #[must_use]
    pub const fn new(protocols: Vec<ProtocolInfo>) -> Self {
        Self {
            protocols,
            accounts: Vec::new(),
            buddies: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Accounts added so far, in insertion order.
    #[must_use]
    pub fn accounts(&self) -> &[MemoryAccount] {
        &self.accounts
    }

    /// Buddies on the list, in insertion order.
    #[must_use]
    pub fn buddies(&self) -> &[MemoryBuddy] {
        &self.buddies
    }

    /// Groups on the list, in insertion order.
    #[must_use]
    pub fn groups(&self) -> &[MemoryGroup] {
        &self.groups
    }
}

impl Engine for MemoryEngine {
    type Account = MemoryAccount;
    type Buddy = MemoryBuddy;
    type Group = MemoryGroup;

    fn protocols(&self) -> Vec<ProtocolInfo> {
        self.protocols.clone()
    }

    fn create_account(&mut self, username: &str, protocol_id: &str) -> Result<MemoryAccount> {
        if !self.protocols.iter().any(|p| p.id == protocol_id) {
            return Err(Error::Engine(format!("protocol {protocol_id} is not loaded")));
        }
        Ok(MemoryAccount::new(AccountRecord {
            username: username.to_owned(),
            protocol_id: protocol_id.to_owned(),
            ..AccountRecord::default()
        }))
    }

    fn find_account(&self, username: &str, protocol_id: Option<&str>) -> Option<MemoryAccount> {
        self.accounts
            .iter()
            .find(|a| {
                let r = a.record();
                r.username == username && protocol_id.is_none_or(|p| r.protocol_id == p)
            })
            .cloned()
    }

    fn delete_account(&mut self, account: &MemoryAccount) -> Result<()> {
        let before = self.accounts.len();
        self.accounts.retain(|a| a != account);
        if self.accounts.len() == before {
            return Err(Error::Engine(format!(
                "account {} is not on the account list",
                account.username()
            )));
        }
        self.buddies.retain(|b| b.record().account != *account);
        Ok(())
    }

    fn set_password(&mut self, account: &MemoryAccount, password: &str) {
        password.clone_into(&mut account.0.borrow_mut().password);
    }

    fn set_string_option(&mut self, account: &MemoryAccount, key: &str, value: &str) {
        account
            .0
            .borrow_mut()
            .strings
            .insert(key.to_owned(), value.to_owned());
    }

    fn set_int_option(&mut self, account: &MemoryAccount, key: &str, value: i64) {
        account.0.borrow_mut().ints.insert(key.to_owned(), value);
    }

    fn set_enabled(&mut self, account: &MemoryAccount, ui_id: &str, enabled: bool) {
        let mut record = account.0.borrow_mut();
        if enabled {
            record.enabled_for.insert(ui_id.to_owned());
        } else {
            record.enabled_for.remove(ui_id);
        }
    }

    fn add_account(&mut self, account: &MemoryAccount) -> Result<()> {
        if !self.accounts.contains(account) {
            self.accounts.push(account.clone());
        }
        Ok(())
    }

    fn find_buddy(&self, account: &MemoryAccount, name: &str) -> Option<MemoryBuddy> {
        self.buddies
            .iter()
            .find(|b| {
                let r = b.record();
                r.account == *account && r.name == name
            })
            .cloned()
    }

    fn new_buddy(
        &mut self,
        account: &MemoryAccount,
        name: &str,
        alias: &str,
    ) -> Result<MemoryBuddy> {
        if !self.accounts.contains(account) {
            return Err(Error::Engine(format!(
                "account {} is not on the account list",
                account.username()
            )));
        }
        let buddy = MemoryBuddy::new(BuddyRecord {
            account: account.clone(),
            name: name.to_owned(),
            alias: alias.to_owned(),
            group: None,
        });
        self.buddies.push(buddy.clone());
        Ok(buddy)
    }

    fn add_buddy(&mut self, buddy: &MemoryBuddy, group: Option<&MemoryGroup>) -> Result<()> {
        if !self.buddies.contains(buddy) {
            return Err(Error::Engine(format!("buddy {} is not known", buddy.name())));
        }
        let group = match group {
            Some(g) => g.clone(),
            None => match self.find_group(DEFAULT_GROUP) {
                Some(g) => g,
                None => self.new_group(DEFAULT_GROUP)?,
            },
        };
        buddy.0.borrow_mut().group = Some(group);
        Ok(())
    }

    fn buddy_account(&self, buddy: &MemoryBuddy) -> MemoryAccount {
        buddy.account()
    }

    fn buddy_group(&self, buddy: &MemoryBuddy) -> Option<MemoryGroup> {
        buddy.record().group.clone()
    }

    fn find_group(&self, name: &str) -> Option<MemoryGroup> {
        self.groups.iter().find(|g| g.record().name == name).cloned()
    }

    fn new_group(&mut self, name: &str) -> Result<MemoryGroup> {
        if let Some(existing) = self.find_group(name) {
            return Ok(existing);
        }
        let group = MemoryGroup::new(GroupRecord {
            name: name.to_owned(),
        });
        self.groups.push(group.clone());
        Ok(group)
    }

    fn group_size(&self, group: &MemoryGroup) -> usize {
        self.buddies
            .iter()
            .filter(|b| b.record().group.as_ref() == Some(group))
            .count()
    }

    fn remove_buddy(&mut self, buddy: &MemoryBuddy) -> Result<()> {
        let before = self.buddies.len();
        self.buddies.retain(|b| b != buddy);
        if self.buddies.len() == before {
            return Err(Error::Engine(format!("buddy {} is not known", buddy.name())));
        }
        Ok(())
    }

    fn remove_group(&mut self, group: &MemoryGroup) -> Result<()> {
        let before = self.groups.len();
        self.groups.retain(|g| g != group);
        if self.groups.len() == before {
            return Err(Error::Engine(format!("group {} is not known", group.name())));
        }
        Ok(())
    }
}

/// Group that receives buddies added without an explicit group.
pub const DEFAULT_GROUP: &str = "Buddies";
