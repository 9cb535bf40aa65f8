//! Persistent mock user directory.
//!
//! This module provides a thread-safe store for managing user accounts.
//! Accounts can be created, updated, deleted and authenticated against.
//! The store persists to JSON at `<data_dir>/users.json`.
//!
//! Passwords are stored and compared in plaintext. This mirrors the mock
//! nature of the auth layer; nothing here is a security boundary.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The protected default administrator account id.
pub const DEFAULT_ADMIN_ID: u64 = 1;

/// Validation failures of user CRUD operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(u64),

    #[error("a user with this username or email already exists")]
    Duplicate,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("cannot delete your own account")]
    SelfDelete,

    #[error("cannot delete the default admin account")]
    ProtectedAdmin,

    #[error("current password is incorrect")]
    WrongPassword,

    #[error("invalid username or password")]
    InvalidCredentials,
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// The permission set granted by this role.
    pub fn permissions(&self) -> Vec<String> {
        match self {
            Role::Admin => vec![
                "read".to_string(),
                "upload".to_string(),
                "download".to_string(),
                "delete".to_string(),
                "manage_users".to_string(),
            ],
            Role::User => vec![
                "read".to_string(),
                "upload".to_string(),
                "download".to_string(),
            ],
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::User => "User",
        }
    }
}

/// One user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique numeric id; 1 is the protected default admin.
    pub id: u64,
    /// Login name, unique across the directory.
    pub username: String,
    /// Plaintext password (mock auth).
    pub password: String,
    /// Email address, unique across the directory.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Account role.
    pub role: Role,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last successful login, if any.
    pub last_login: Option<DateTime<Utc>>,
    /// Permission labels derived from the role at write time.
    pub permissions: Vec<String>,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Partial update of an account. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

/// Wrapper for serializing the directory.
#[derive(Debug, Serialize, Deserialize)]
struct DirectoryData {
    /// Version of the store format (for future migrations).
    version: u32,
    /// The accounts, ordered by id.
    users: Vec<UserRecord>,
}

impl Default for DirectoryData {
    fn default() -> Self {
        Self {
            version: 1,
            users: Vec::new(),
        }
    }
}

/// Thread-safe persistent user directory.
pub struct UserDirectory {
    /// The path to the JSON file.
    path: PathBuf,
    /// The accounts, keyed by id.
    users: RwLock<HashMap<u64, UserRecord>>,
}

impl UserDirectory {
    /// Creates a directory that will persist to the given path.
    ///
    /// This does not load the file; call [`load`](Self::load) to read
    /// existing data.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a directory at `<data_dir>/users.json`.
    pub fn in_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join("users.json"))
    }

    /// Returns the path to the directory file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the directory from disk, seeding the default admin when the
    /// store is missing or empty.
    pub fn load(&self) -> Result<()> {
        if self.path.exists() {
            let contents = fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read user directory: {}", self.path.display()))?;
            let data: DirectoryData = serde_json::from_str(&contents).with_context(|| {
                format!("Failed to parse user directory: {}", self.path.display())
            })?;

            let mut users = self.write_lock()?;
            users.clear();
            for user in data.users {
                users.insert(user.id, user);
            }
            tracing::info!("Loaded {} users from {:?}", users.len(), self.path);
        }

        if self.write_lock()?.is_empty() {
            tracing::info!("User directory empty, seeding default admin");
            self.write_lock()?
                .insert(DEFAULT_ADMIN_ID, default_admin());
            self.save()?;
        }
        Ok(())
    }

    /// Saves the directory to disk.
    ///
    /// Uses atomic write (write to temp file, then rename) to prevent
    /// corruption. Creates parent directories if they don't exist.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        let mut users: Vec<UserRecord> = self.read_lock()?.values().cloned().collect();
        users.sort_by_key(|u| u.id);

        let data = DirectoryData { version: 1, users };
        let contents =
            serde_json::to_string_pretty(&data).context("Failed to serialize user directory")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &contents).with_context(|| {
            format!("Failed to write temp user directory: {}", temp_path.display())
        })?;
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename temp user directory {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        tracing::debug!("Saved {} users to {:?}", data.users.len(), self.path);
        Ok(())
    }

    /// Creates a new account.
    ///
    /// Rejects duplicate usernames and duplicate emails across the whole
    /// directory, either one alone being enough to fail.
    pub fn create_user(&self, new: NewUser) -> Result<UserRecord, UserError> {
        require_non_empty("username", &new.username)?;
        require_non_empty("password", &new.password)?;
        require_non_empty("email", &new.email)?;
        require_non_empty("name", &new.name)?;

        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());

        let taken = users
            .values()
            .any(|u| u.username == new.username || u.email == new.email);
        if taken {
            return Err(UserError::Duplicate);
        }

        let id = users.keys().max().copied().unwrap_or(0) + 1;
        let record = UserRecord {
            id,
            username: new.username,
            password: new.password,
            email: new.email,
            name: new.name,
            role: new.role,
            created: Utc::now(),
            last_login: None,
            permissions: new.role.permissions(),
        };

        tracing::info!("Created user {} ({})", record.id, record.username);
        users.insert(id, record.clone());
        Ok(record)
    }

    /// Applies a partial update to an account.
    ///
    /// Rejects the update when the resulting username or email collides
    /// with a *different* account.
    pub fn update_user(&self, id: u64, update: UserUpdate) -> Result<UserRecord, UserError> {
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());

        let current = users.get(&id).ok_or(UserError::NotFound(id))?.clone();

        let username = update.username.unwrap_or_else(|| current.username.clone());
        let email = update.email.unwrap_or_else(|| current.email.clone());
        require_non_empty("username", &username)?;
        require_non_empty("email", &email)?;

        let collides = users
            .values()
            .any(|u| u.id != id && (u.username == username || u.email == email));
        if collides {
            return Err(UserError::Duplicate);
        }

        let role = update.role.unwrap_or(current.role);
        let record = users.get_mut(&id).ok_or(UserError::NotFound(id))?;
        record.username = username;
        record.email = email;
        if let Some(name) = update.name {
            record.name = name;
        }
        record.role = role;
        record.permissions = role.permissions();

        tracing::info!("Updated user {} ({})", record.id, record.username);
        Ok(record.clone())
    }

    /// Deletes an account.
    ///
    /// `actor_id` is the id of the logged-in user performing the delete;
    /// self-deletion and deleting the default admin are always rejected.
    pub fn delete_user(&self, actor_id: u64, target_id: u64) -> Result<UserRecord, UserError> {
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());

        if !users.contains_key(&target_id) {
            return Err(UserError::NotFound(target_id));
        }
        if target_id == actor_id {
            return Err(UserError::SelfDelete);
        }
        if target_id == DEFAULT_ADMIN_ID {
            return Err(UserError::ProtectedAdmin);
        }

        let removed = users.remove(&target_id).ok_or(UserError::NotFound(target_id))?;
        tracing::info!("Deleted user {} ({})", removed.id, removed.username);
        Ok(removed)
    }

    /// Changes a password after verifying the current one.
    pub fn change_password(
        &self,
        id: u64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        require_non_empty("password", new_password)?;
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());

        let record = users.get_mut(&id).ok_or(UserError::NotFound(id))?;
        if record.password != current_password {
            return Err(UserError::WrongPassword);
        }
        record.password = new_password.to_string();
        tracing::info!("Changed password for user {}", id);
        Ok(())
    }

    /// Sets a password without verification (admin reset path).
    pub fn set_password(&self, id: u64, new_password: &str) -> Result<(), UserError> {
        require_non_empty("password", new_password)?;
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());

        let record = users.get_mut(&id).ok_or(UserError::NotFound(id))?;
        record.password = new_password.to_string();
        tracing::info!("Reset password for user {}", id);
        Ok(())
    }

    /// Verifies credentials and stamps the last-login time.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserRecord, UserError> {
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());

        let record = users
            .values_mut()
            .find(|u| u.username == username)
            .ok_or(UserError::InvalidCredentials)?;
        if record.password != password {
            return Err(UserError::InvalidCredentials);
        }

        record.last_login = Some(Utc::now());
        tracing::info!("User {} ({}) logged in", record.id, record.username);
        Ok(record.clone())
    }

    /// Gets an account by id.
    pub fn get(&self, id: u64) -> Result<Option<UserRecord>> {
        Ok(self.read_lock()?.get(&id).cloned())
    }

    /// Lists all accounts ordered by id.
    pub fn list(&self) -> Result<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.read_lock()?.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    /// Number of accounts.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_lock()?.len())
    }

    /// Whether the directory has no accounts.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<u64, UserRecord>>> {
        self.users
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock on user directory"))
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<u64, UserRecord>>> {
        self.users
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire write lock on user directory"))
    }
}

/// The seeded default administrator.
fn default_admin() -> UserRecord {
    UserRecord {
        id: DEFAULT_ADMIN_ID,
        username: "admin".to_string(),
        password: "admin".to_string(),
        email: "admin@example.com".to_string(),
        name: "Administrator".to_string(),
        role: Role::Admin,
        created: Utc::now(),
        last_login: None,
        permissions: Role::Admin.permissions(),
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), UserError> {
    if value.trim().is_empty() {
        Err(UserError::EmptyField(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "secret".to_string(),
            email: email.to_string(),
            name: username.to_string(),
            role: Role::User,
        }
    }

    fn seeded_directory(temp_dir: &TempDir) -> UserDirectory {
        let directory = UserDirectory::in_data_dir(temp_dir.path());
        directory.load().unwrap();
        directory
    }

    #[test]
    fn test_load_seeds_default_admin() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);

        assert_eq!(directory.len().unwrap(), 1);
        let admin = directory.get(DEFAULT_ADMIN_ID).unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.permissions.contains(&"manage_users".to_string()));
        assert!(directory.path().exists());
    }

    #[test]
    fn test_create_user_assigns_next_id() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);

        let alice = directory.create_user(new_user("alice", "alice@example.com")).unwrap();
        assert_eq!(alice.id, 2);
        let bob = directory.create_user(new_user("bob", "bob@example.com")).unwrap();
        assert_eq!(bob.id, 3);
    }

    #[test]
    fn test_create_user_rejects_duplicate_username_with_different_email() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        directory.create_user(new_user("alice", "alice@example.com")).unwrap();

        let result = directory.create_user(new_user("alice", "other@example.com"));
        assert_eq!(result.unwrap_err(), UserError::Duplicate);
    }

    #[test]
    fn test_create_user_rejects_duplicate_email_with_different_username() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        directory.create_user(new_user("alice", "alice@example.com")).unwrap();

        let result = directory.create_user(new_user("someone-else", "alice@example.com"));
        assert_eq!(result.unwrap_err(), UserError::Duplicate);
    }

    #[test]
    fn test_create_user_rejects_empty_fields() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);

        let mut user = new_user("carol", "carol@example.com");
        user.password = "  ".to_string();
        assert_eq!(
            directory.create_user(user).unwrap_err(),
            UserError::EmptyField("password")
        );
    }

    #[test]
    fn test_update_user_rejects_collision_with_other_account() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        directory.create_user(new_user("alice", "alice@example.com")).unwrap();
        let bob = directory.create_user(new_user("bob", "bob@example.com")).unwrap();

        let result = directory.update_user(
            bob.id,
            UserUpdate {
                email: Some("alice@example.com".to_string()),
                ..UserUpdate::default()
            },
        );
        assert_eq!(result.unwrap_err(), UserError::Duplicate);
    }

    #[test]
    fn test_update_user_allows_keeping_own_identity() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        let alice = directory.create_user(new_user("alice", "alice@example.com")).unwrap();

        // Re-submitting the same username/email is not a collision.
        let updated = directory
            .update_user(
                alice.id,
                UserUpdate {
                    username: Some("alice".to_string()),
                    name: Some("Alice A.".to_string()),
                    ..UserUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Alice A.");
    }

    #[test]
    fn test_update_user_role_refreshes_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        let alice = directory.create_user(new_user("alice", "alice@example.com")).unwrap();
        assert!(!alice.permissions.contains(&"delete".to_string()));

        let updated = directory
            .update_user(
                alice.id,
                UserUpdate {
                    role: Some(Role::Admin),
                    ..UserUpdate::default()
                },
            )
            .unwrap();
        assert!(updated.permissions.contains(&"delete".to_string()));
        assert!(updated.permissions.contains(&"manage_users".to_string()));
    }

    #[test]
    fn test_delete_default_admin_always_fails() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        let alice = directory.create_user(new_user("alice", "alice@example.com")).unwrap();

        // Even another admin cannot delete user 1.
        directory
            .update_user(
                alice.id,
                UserUpdate {
                    role: Some(Role::Admin),
                    ..UserUpdate::default()
                },
            )
            .unwrap();
        let result = directory.delete_user(alice.id, DEFAULT_ADMIN_ID);
        assert_eq!(result.unwrap_err(), UserError::ProtectedAdmin);
    }

    #[test]
    fn test_delete_self_always_fails() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        let alice = directory.create_user(new_user("alice", "alice@example.com")).unwrap();

        let result = directory.delete_user(alice.id, alice.id);
        assert_eq!(result.unwrap_err(), UserError::SelfDelete);
        assert!(directory.get(alice.id).unwrap().is_some());
    }

    #[test]
    fn test_delete_other_user_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        let alice = directory.create_user(new_user("alice", "alice@example.com")).unwrap();

        let removed = directory.delete_user(DEFAULT_ADMIN_ID, alice.id).unwrap();
        assert_eq!(removed.username, "alice");
        assert!(directory.get(alice.id).unwrap().is_none());
    }

    #[test]
    fn test_change_password_requires_exact_match() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        let alice = directory.create_user(new_user("alice", "alice@example.com")).unwrap();

        assert_eq!(
            directory.change_password(alice.id, "wrong", "next"),
            Err(UserError::WrongPassword)
        );
        directory.change_password(alice.id, "secret", "next").unwrap();
        assert_eq!(directory.get(alice.id).unwrap().unwrap().password, "next");
    }

    #[test]
    fn test_authenticate_checks_plaintext_and_stamps_login() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        directory.create_user(new_user("alice", "alice@example.com")).unwrap();

        assert_eq!(
            directory.authenticate("alice", "nope").unwrap_err(),
            UserError::InvalidCredentials
        );
        assert_eq!(
            directory.authenticate("nobody", "secret").unwrap_err(),
            UserError::InvalidCredentials
        );

        let authed = directory.authenticate("alice", "secret").unwrap();
        assert!(authed.last_login.is_some());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.json");

        {
            let directory = UserDirectory::new(&path);
            directory.load().unwrap();
            directory.create_user(new_user("alice", "alice@example.com")).unwrap();
            directory.save().unwrap();
        }

        let directory = UserDirectory::new(&path);
        directory.load().unwrap();
        assert_eq!(directory.len().unwrap(), 2);
        let listed = directory.list().unwrap();
        assert_eq!(listed[0].id, DEFAULT_ADMIN_ID);
        assert_eq!(listed[1].username, "alice");
    }

    #[test]
    fn test_save_is_atomic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.json");
        let directory = UserDirectory::new(&path);
        directory.load().unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.exists());
    }

    #[test]
    fn test_store_data_version() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        directory.save().unwrap();

        let contents = fs::read_to_string(directory.path()).unwrap();
        let data: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(data["version"], 1);
        assert!(data["users"].is_array());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let temp_dir = TempDir::new().unwrap();
        let directory = seeded_directory(&temp_dir);
        let alice = directory.create_user(new_user("alice", "alice@example.com")).unwrap();
        let bob = directory.create_user(new_user("bob", "bob@example.com")).unwrap();
        directory.delete_user(DEFAULT_ADMIN_ID, alice.id).unwrap();

        // Max-plus-one allocation: with bob (id 3) still present, the next
        // id is 4, not alice's freed 2.
        let carol = directory.create_user(new_user("carol", "carol@example.com")).unwrap();
        assert_eq!(bob.id, 3);
        assert_eq!(carol.id, 4);
    }
}
