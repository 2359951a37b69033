//! Durable storage for the current `Session`.
//!
//! `TokenStore` serialises writers behind a mutex and publishes every change on
//! a watch channel; the persistence itself sits behind `CredentialBackend`.

use crate::error::StoreError;
use crate::session::Session;
use directories::ProjectDirs;
use rand::Rng;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use tokio::sync::watch;

const SESSION_FILE: &str = "session.bin";
const KEY_FILE: &str = ".secret_key";
const NONCE_LEN: usize = 12;

pub trait CredentialBackend: Send + Sync {
    fn read(&self) -> Result<Option<Session>, StoreError>;
    fn write(&self, session: &Session) -> Result<(), StoreError>;
    /// Returns `true` if a session was present.
    fn remove(&self) -> Result<bool, StoreError>;
}

pub struct TokenStore {
    backend: Box<dyn CredentialBackend>,
    write_lock: Mutex<()>,
    changes: watch::Sender<Option<Session>>,
}

impl TokenStore {
    /// Opens the store, discarding a stored session that can no longer be
    /// decrypted or parsed.
    pub fn open(backend: impl CredentialBackend + 'static) -> Result<Self, StoreError> {
        let initial = match backend.read() {
            Ok(session) => session,
            Err(StoreError::Io(e)) => return Err(StoreError::Io(e)),
            Err(e) => {
                tracing::warn!("Discarding unreadable stored session: {}", e);
                backend.remove()?;
                None
            }
        };
        let (changes, _) = watch::channel(initial);
        Ok(Self {
            backend: Box::new(backend),
            write_lock: Mutex::new(()),
            changes,
        })
    }

    pub fn in_memory() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            backend: Box::new(MemoryBackend::default()),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    /// Replaces any stored session with `session`.
    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.write(session)?;
        self.changes.send_replace(Some(session.clone()));
        tracing::debug!("Stored session for {}", session.account);
        Ok(())
    }

    pub fn load(&self) -> Result<Option<Session>, StoreError> {
        self.backend.read()
    }

    /// Removes the stored session. Returns `false` when there was none, in
    /// which case subscribers are not notified.
    pub fn clear(&self) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = self.backend.remove()?;
        self.changes.send_if_modified(|current| current.take().is_some());
        if removed {
            tracing::info!("Cleared stored session");
        }
        Ok(removed)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.changes.subscribe()
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    slot: RwLock<Option<Session>>,
}

impl CredentialBackend for MemoryBackend {
    fn read(&self) -> Result<Option<Session>, StoreError> {
        Ok(self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, session: &Session) -> Result<(), StoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn remove(&self) -> Result<bool, StoreError> {
        Ok(self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some())
    }
}

/// AES-256-GCM encrypted session file with its key stored beside it.
pub struct EncryptedFileBackend {
    dir: PathBuf,
}

impl EncryptedFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn in_project_dirs() -> Result<Self, StoreError> {
        let proj_dirs =
            ProjectDirs::from("com", "saschaw", "hooked").ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(proj_dirs.data_dir()))
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    fn read_key(&self) -> Result<Option<[u8; 32]>, StoreError> {
        let path = self.key_path();
        if !path.exists() {
            return Ok(None);
        }
        let key_bytes = fs::read(&path)?;
        if key_bytes.len() != 32 {
            return Err(StoreError::Crypto("Key file has the wrong length"));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);
        Ok(Some(key))
    }

    fn get_or_create_key(&self) -> Result<[u8; 32], StoreError> {
        match self.read_key() {
            Ok(Some(key)) => return Ok(key),
            Ok(None) => {}
            Err(StoreError::Crypto(reason)) => {
                tracing::warn!("Replacing session key: {}", reason);
            }
            Err(e) => return Err(e),
        }

        let mut key = [0u8; 32];
        rand::thread_rng().fill(&mut key);
        write_secure_file(&self.key_path(), &key)?;
        Ok(key)
    }

    fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
        use aes_gcm::{
            aead::{Aead, KeyInit},
            Aes256Gcm, Nonce,
        };

        let cipher = Aes256Gcm::new(aes_gcm::aead::Key::<Aes256Gcm>::from_slice(key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| StoreError::Crypto("Encryption failed"))?;

        let mut result = nonce_bytes.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn decrypt(key: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>, StoreError> {
        use aes_gcm::{
            aead::{Aead, KeyInit},
            Aes256Gcm, Nonce,
        };

        if ciphertext.len() < NONCE_LEN {
            return Err(StoreError::Crypto("Invalid ciphertext"));
        }

        let cipher = Aes256Gcm::new(aes_gcm::aead::Key::<Aes256Gcm>::from_slice(key));
        let nonce = Nonce::from_slice(&ciphertext[..NONCE_LEN]);
        cipher
            .decrypt(nonce, &ciphertext[NONCE_LEN..])
            .map_err(|_| StoreError::Crypto("Decryption failed"))
    }
}

impl CredentialBackend for EncryptedFileBackend {
    fn read(&self) -> Result<Option<Session>, StoreError> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let encrypted = fs::read(&path)?;
        let key = self
            .read_key()?
            .ok_or(StoreError::Crypto("Session key is missing"))?;
        let decrypted = Self::decrypt(&key, &encrypted)?;
        Ok(Some(serde_json::from_slice(&decrypted)?))
    }

    fn write(&self, session: &Session) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let key = self.get_or_create_key()?;
        let json = serde_json::to_vec(session)?;
        let encrypted = Self::encrypt(&key, &json)?;
        write_secure_file(&self.session_path(), &encrypted)
    }

    fn remove(&self) -> Result<bool, StoreError> {
        match fs::remove_file(self.session_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes to a sibling temp file and renames it over `path`, so readers see
/// either the old or the new contents.
fn write_secure_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use tempfile::TempDir;

    fn session(token: &str, refresh: Option<&str>) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
            account: "knitter".to_string(),
        }
    }

    #[test]
    fn session_survives_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let store = TokenStore::open(EncryptedFileBackend::new(dir.path())).expect("open");
        store.save(&session("t1", Some("r1"))).expect("save");
        drop(store);

        let reopened = TokenStore::open(EncryptedFileBackend::new(dir.path())).expect("reopen");
        assert_eq!(reopened.load().expect("load"), Some(session("t1", Some("r1"))));
        assert_eq!(*reopened.subscribe().borrow(), Some(session("t1", Some("r1"))));
    }

    #[test]
    fn file_does_not_contain_plaintext_token() {
        let dir = TempDir::new().expect("temp dir");
        let backend = EncryptedFileBackend::new(dir.path());
        backend
            .write(&session("plaintext-bearer", None))
            .expect("write");

        let raw = fs::read(backend.session_path()).expect("read raw");
        let needle = b"plaintext-bearer";
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn save_overwrites_instead_of_merging() {
        let dir = TempDir::new().expect("temp dir");
        let store = TokenStore::open(EncryptedFileBackend::new(dir.path())).expect("open");
        store.save(&session("t1", Some("r1"))).expect("save first");
        store.save(&session("t2", None)).expect("save second");

        let loaded = store.load().expect("load").expect("present");
        assert_eq!(loaded.access_token, "t2");
        assert_eq!(loaded.refresh_token, None);
    }

    #[test]
    fn concurrent_loads_never_see_a_partial_write() {
        let dir = TempDir::new().expect("temp dir");
        let store = TokenStore::open(EncryptedFileBackend::new(dir.path())).expect("open");
        let first = session("t1", Some("r1"));
        let second = session("t2", None);
        store.save(&first).expect("seed");

        let done = AtomicBool::new(false);
        let (store, done, first, second) = (&store, &done, &first, &second);
        thread::scope(|scope| {
            let readers: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        let mut reads = 0;
                        while !done.load(Ordering::SeqCst) || reads == 0 {
                            let loaded = store.load().expect("load never fails mid-write");
                            let loaded = loaded.expect("session always present");
                            assert!(&loaded == first || &loaded == second, "torn read: {loaded:?}");
                            reads += 1;
                        }
                        reads
                    })
                })
                .collect();

            for i in 0..200 {
                let next = if i % 2 == 0 { second } else { first };
                store.save(next).expect("save");
            }
            done.store(true, Ordering::SeqCst);

            for reader in readers {
                assert!(reader.join().expect("reader thread") > 0);
            }
        });
    }

    #[test]
    fn clear_twice_is_a_noop_the_second_time() {
        let dir = TempDir::new().expect("temp dir");
        let store = TokenStore::open(EncryptedFileBackend::new(dir.path())).expect("open");
        store.save(&session("t1", None)).expect("save");
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        assert!(store.clear().expect("first clear"));
        assert!(rx.has_changed().expect("sender alive"));
        rx.borrow_and_update();

        assert!(!store.clear().expect("second clear"));
        assert!(!rx.has_changed().expect("sender alive"));
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn corrupt_file_is_discarded_on_open() {
        let dir = TempDir::new().expect("temp dir");
        let backend = EncryptedFileBackend::new(dir.path());
        backend.write(&session("t1", None)).expect("write");
        fs::write(backend.session_path(), b"garbage bytes that will not decrypt").expect("corrupt");

        let store = TokenStore::open(EncryptedFileBackend::new(dir.path())).expect("open");
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = TokenStore::in_memory();
        assert_eq!(store.load().expect("load"), None);
        store.save(&session("t1", None)).expect("save");
        assert_eq!(store.load().expect("load").map(|s| s.access_token), Some("t1".to_string()));
    }
}
