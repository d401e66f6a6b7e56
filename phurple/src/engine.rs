//! The external IM engine, as seen by the binding layer.
//!
//! [`Engine`] lists the operations a [`Session`](crate::Session) needs from
//! the protocol engine that actually owns accounts, buddies and groups. The
//! engine is responsible for the lifetime of everything its handles point
//! at; the session only stores handles in registries.

use crate::error::Result;
use crate::protocol::ProtocolInfo;

/// Operations the binding layer consumes from the protocol engine.
///
/// Handle types compare by identity: two handles are equal iff they refer
/// to the same underlying engine object, even if they are distinct wrapper
/// values.
pub trait Engine {
    /// Account handle.
    type Account: Clone + PartialEq;
    /// Buddy (contact) handle.
    type Buddy: Clone + PartialEq;
    /// Buddy-list group handle.
    type Group: Clone + PartialEq;

    /// Loaded protocol plugins.
    fn protocols(&self) -> Vec<ProtocolInfo>;

    /// Create (but do not yet add) an account for `username` on `protocol_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) if the engine refuses.
    fn create_account(&mut self, username: &str, protocol_id: &str) -> Result<Self::Account>;

    /// Find a known account by user name, optionally restricted to a protocol.
    fn find_account(&self, username: &str, protocol_id: Option<&str>) -> Option<Self::Account>;

    /// Remove an account from the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) if the engine refuses.
    fn delete_account(&mut self, account: &Self::Account) -> Result<()>;

    /// Set the account password.
    fn set_password(&mut self, account: &Self::Account, password: &str);

    /// Set a string account option such as `server`.
    fn set_string_option(&mut self, account: &Self::Account, key: &str, value: &str);

    /// Set an integer account option such as `port`.
    fn set_int_option(&mut self, account: &Self::Account, key: &str, value: i64);

    /// Enable or disable the account for the given UI id.
    fn set_enabled(&mut self, account: &Self::Account, ui_id: &str, enabled: bool);

    /// Add a created account to the engine's account list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) if the engine refuses.
    fn add_account(&mut self, account: &Self::Account) -> Result<()>;

    /// Find a buddy of `account` by name.
    fn find_buddy(&self, account: &Self::Account, name: &str) -> Option<Self::Buddy>;

    /// Create a new buddy on `account`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) if the engine refuses.
    fn new_buddy(
        &mut self,
        account: &Self::Account,
        name: &str,
        alias: &str,
    ) -> Result<Self::Buddy>;

    /// Put a buddy on the buddy list, in `group` or the engine's default group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) if the engine refuses.
    fn add_buddy(&mut self, buddy: &Self::Buddy, group: Option<&Self::Group>) -> Result<()>;

    /// The group a buddy belongs to, if any.
    fn buddy_group(&self, buddy: &Self::Buddy) -> Option<Self::Group>;

    /// Find a group by name.
    fn find_group(&self, name: &str) -> Option<Self::Group>;

    /// Create a new group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) if the engine refuses.
    fn new_group(&mut self, name: &str) -> Result<Self::Group>;

    /// The account a buddy belongs to.
    fn buddy_account(&self, buddy: &Self::Buddy) -> Self::Account;

    /// Number of buddies in the group, counting offline ones.
    fn group_size(&self, group: &Self::Group) -> usize;

    /// Whether the group has no buddies.
    fn group_is_empty(&self, group: &Self::Group) -> bool {
        self.group_size(group) == 0
    }

    /// Remove a buddy from the buddy list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) if the engine refuses.
    fn remove_buddy(&mut self, buddy: &Self::Buddy) -> Result<()>;

    /// Remove a group from the buddy list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) if the engine refuses.
    fn remove_group(&mut self, group: &Self::Group) -> Result<()>;
}
