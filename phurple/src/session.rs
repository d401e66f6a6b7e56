//! Session: the binding layer between callers and an [`Engine`].
//!
//! A [`Session`] owns an engine plus one [`HandleRegistry`] per handle kind.
//! Every account, buddy and group that crosses from the engine to the caller
//! is identified by an [`Index`] from those registries, never by its position
//! in one of the engine's lists.

use crate::dsn::AccountDsn;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::protocol::{ProtocolInfo, find_protocol_id};
use crate::registry::{HandleRegistry, Index};

/// UI id used to enable accounts when none is configured.
pub const DEFAULT_UI_ID: &str = "phurple";

/// Account option set from the DSN host.
pub const SERVER_OPTION: &str = "server";

/// Account option set from the DSN port.
pub const PORT_OPTION: &str = "port";

/// Stateful front end over an [`Engine`].
pub struct Session<E: Engine> {
    engine: E,
    ui_id: String,
    accounts: HandleRegistry<E::Account>,
    buddies: HandleRegistry<E::Buddy>,
    groups: HandleRegistry<E::Group>,
}

impl<E: Engine + std::fmt::Debug> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine)
            .field("ui_id", &self.ui_id)
            .field("accounts", &self.accounts)
            .field("buddies", &self.buddies)
            .field("groups", &self.groups)
            .finish()
    }
}

impl<E: Engine> Session<E> {
    /// Wrap `engine` with default settings.
    ///
    /// Use [`SessionBuilder`] to pick a different UI id.
    pub fn new(engine: E) -> Self {
        SessionBuilder::new().build(engine)
    }

    /// The UI id accounts are enabled for.
    #[must_use]
    pub fn ui_id(&self) -> &str {
        &self.ui_id
    }

    /// Borrow the engine.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Borrow the engine mutably.
    pub const fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Protocol plugins the engine has loaded.
    pub fn protocols(&self) -> Vec<ProtocolInfo> {
        self.engine.protocols()
    }

    // -- accounts ----------------------------------------------------------

    /// Create, configure and add an account described by `dsn`.
    ///
    /// The protocol part is matched case-insensitively against the engine's
    /// protocol names. A non-empty host becomes the `server` option and a
    /// positive port the `port` option.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedDsn`] if `dsn` does not parse; the engine is not
    ///   touched.
    /// - [`Error::UnknownProtocol`] if no loaded protocol matches.
    /// - [`Error::Engine`] if the engine refuses the account.
    pub fn add_account(&mut self, dsn: &str) -> Result<Index> {
        let dsn = AccountDsn::parse(dsn)?;
        self.add_parsed_account(&dsn)
    }

    /// Like [`add_account`](Self::add_account), for an already parsed DSN.
    ///
    /// # Errors
    ///
    /// See [`add_account`](Self::add_account).
    pub fn add_parsed_account(&mut self, dsn: &AccountDsn) -> Result<Index> {
        let protocols = self.engine.protocols();
        let protocol_id = find_protocol_id(&protocols, dsn.protocol())
            .ok_or_else(|| Error::UnknownProtocol(dsn.protocol().to_owned()))?;

        let account = self.engine.create_account(dsn.username(), protocol_id)?;
        self.engine.set_password(&account, dsn.password());
        if let Some(server) = dsn.server() {
            self.engine.set_string_option(&account, SERVER_OPTION, server);
        }
        if let Some(port) = dsn.port() {
            self.engine.set_int_option(&account, PORT_OPTION, i64::from(port));
        }
        self.engine.set_enabled(&account, &self.ui_id, true);
        self.engine.add_account(&account)?;

        let index = self.accounts.find_or_register(account);
        tracing::info!(
            %index,
            protocol = protocol_id,
            username = dsn.username(),
            "account added"
        );
        Ok(index)
    }

    /// Find an account by user name and, optionally, protocol name.
    ///
    /// Returns `None` when the engine has no such account or the protocol
    /// name is unknown.
    pub fn find_account(&mut self, username: &str, protocol: Option<&str>) -> Option<Index> {
        let protocol_id = match protocol {
            Some(name) => {
                let protocols = self.engine.protocols();
                Some(find_protocol_id(&protocols, name)?.to_owned())
            }
            None => None,
        };
        let account = self.engine.find_account(username, protocol_id.as_deref())?;
        Some(self.accounts.find_or_register(account))
    }

    /// Remove an account from the engine and forget its index.
    ///
    /// Buddy indices that belong to the account are forgotten too. Returns
    /// `false` if `index` is not a live account index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if the engine refuses; the index stays valid.
    pub fn delete_account(&mut self, index: Index) -> Result<bool> {
        let Some(account) = self.accounts.resolve(index) else {
            return Ok(false);
        };
        self.engine.delete_account(account)?;
        let orphans: Vec<Index> = self
            .buddies
            .iter()
            .filter(|(_, buddy)| self.engine.buddy_account(buddy) == *account)
            .map(|(i, _)| i)
            .collect();
        for buddy in &orphans {
            self.buddies.remove(*buddy);
        }
        self.accounts.remove(index);
        tracing::info!(%index, buddies = orphans.len(), "account deleted");
        Ok(true)
    }

    /// The engine handle for an account index.
    #[must_use]
    pub fn account(&self, index: Index) -> Option<&E::Account> {
        self.accounts.resolve(index)
    }

    /// Live account indices in increasing order.
    pub fn account_indices(&self) -> impl Iterator<Item = Index> + '_ {
        self.accounts.iter().map(|(i, _)| i)
    }

    // -- buddies -----------------------------------------------------------

    /// Index of the buddy `name` on `account`, if the engine knows one.
    ///
    /// Never creates a buddy. Returns `None` for an unknown account index.
    pub fn find_buddy(&mut self, account: Index, name: &str) -> Option<Index> {
        let acct = self.accounts.resolve(account)?;
        let buddy = self.engine.find_buddy(acct, name)?;
        Some(self.buddies.find_or_register(buddy))
    }

    /// Index of the buddy `name` on `account`, creating the buddy if needed.
    ///
    /// A new buddy's alias defaults to its name.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `account` is not a live account index.
    /// - [`Error::Engine`] if the engine refuses to create the buddy.
    pub fn buddy(&mut self, account: Index, name: &str, alias: Option<&str>) -> Result<Index> {
        let acct = self
            .accounts
            .resolve(account)
            .ok_or_else(|| unknown("account", account))?;
        let buddy = match self.engine.find_buddy(acct, name) {
            Some(existing) => existing,
            None => {
                let alias = alias.filter(|a| !a.is_empty()).unwrap_or(name);
                self.engine.new_buddy(acct, name, alias)?
            }
        };
        let index = self.buddies.find_or_register(buddy);
        tracing::debug!(%index, %account, name, "buddy resolved");
        Ok(index)
    }

    /// Put a buddy on the buddy list, in `group` or the engine's default.
    ///
    /// Returns `false` if either index is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if the engine refuses.
    pub fn add_buddy(&mut self, buddy: Index, group: Option<Index>) -> Result<bool> {
        let Some(handle) = self.buddies.resolve(buddy) else {
            return Ok(false);
        };
        let group = match group {
            Some(g) => match self.groups.resolve(g) {
                Some(handle) => Some(handle),
                None => return Ok(false),
            },
            None => None,
        };
        self.engine.add_buddy(handle, group)?;
        Ok(true)
    }

    /// Index of the group a buddy belongs to.
    pub fn buddy_group(&mut self, buddy: Index) -> Option<Index> {
        let handle = self.buddies.resolve(buddy)?;
        let group = self.engine.buddy_group(handle)?;
        Some(self.groups.find_or_register(group))
    }

    /// Remove a buddy from the buddy list and forget its index.
    ///
    /// Returns `false` if `index` is not a live buddy index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if the engine refuses; the index stays valid.
    pub fn remove_buddy(&mut self, index: Index) -> Result<bool> {
        let Some(buddy) = self.buddies.resolve(index) else {
            return Ok(false);
        };
        self.engine.remove_buddy(buddy)?;
        self.buddies.remove(index);
        tracing::debug!(%index, "buddy removed");
        Ok(true)
    }

    /// The engine handle for a buddy index.
    #[must_use]
    pub fn buddy_handle(&self, index: Index) -> Option<&E::Buddy> {
        self.buddies.resolve(index)
    }

    // -- groups ------------------------------------------------------------

    /// Index of the group `name`, if the engine knows one.
    ///
    /// Never creates a group.
    pub fn find_group(&mut self, name: &str) -> Option<Index> {
        let group = self.engine.find_group(name)?;
        Some(self.groups.find_or_register(group))
    }

    /// Number of buddies in a group, or `None` for an unknown index.
    #[must_use]
    pub fn group_size(&self, index: Index) -> Option<usize> {
        let group = self.groups.resolve(index)?;
        Some(self.engine.group_size(group))
    }

    /// Index of the group `name`, creating the group if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if the engine refuses to create the group.
    pub fn group(&mut self, name: &str) -> Result<Index> {
        let group = match self.engine.find_group(name) {
            Some(existing) => existing,
            None => self.engine.new_group(name)?,
        };
        Ok(self.groups.find_or_register(group))
    }

    /// Remove an empty group and forget its index.
    ///
    /// Returns `false` if `index` is unknown or the group still has buddies;
    /// a refused group keeps its index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if the engine refuses; the index stays valid.
    pub fn remove_group(&mut self, index: Index) -> Result<bool> {
        let Some(group) = self.groups.resolve(index) else {
            return Ok(false);
        };
        if !self.engine.group_is_empty(group) {
            tracing::warn!(%index, "refusing to remove a non-empty group");
            return Ok(false);
        }
        self.engine.remove_group(group)?;
        self.groups.remove(index);
        tracing::debug!(%index, "group removed");
        Ok(true)
    }

    /// The engine handle for a group index.
    #[must_use]
    pub fn group_handle(&self, index: Index) -> Option<&E::Group> {
        self.groups.resolve(index)
    }
}

fn unknown(kind: &str, index: Index) -> Error {
    Error::InvalidArgument(format!("no {kind} with index {index}"))
}

/// Builder for constructing a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    ui_id: Option<String>,
}

impl SessionBuilder {
    /// Start with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self { ui_id: None }
    }

    /// Set the UI id accounts are enabled for (default: [`DEFAULT_UI_ID`]).
    #[must_use]
    pub fn ui_id(mut self, id: impl Into<String>) -> Self {
        self.ui_id = Some(id.into());
        self
    }

    /// Build the session around `engine`.
    pub fn build<E: Engine>(self, engine: E) -> Session<E> {
        let ui_id = self.ui_id.unwrap_or_else(|| DEFAULT_UI_ID.to_owned());
        tracing::debug!(ui_id = %ui_id, "session created");
        Session {
            engine,
            ui_id,
            accounts: HandleRegistry::new(),
            buddies: HandleRegistry::new(),
            groups: HandleRegistry::new(),
        }
    }
}
