//! Export and import of connections between environments
//!
//! Export reads a source store, opens every secret with the source domain
//! key, and seals each record whole under a transport key into an
//! interchange file. Import opens that file, decides collisions up front,
//! then re-seals secrets under the target domain key while writing.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::interchange;
use super::types::{CollisionStrategy, ExportRequest, ExportResult, ImportRequest, ImportResult};
use crate::connection::{Connection, ExportRecord, StoreConnector};
use crate::crypto::{self, decrypt_string, encrypt_string, DomainKey};
use crate::error::{MigratorError, Result};
use crate::profile::Profile;

/// Migration engine
///
/// Holds no mutable state; concurrent calls for different profiles are
/// independent.
pub struct Migrator {
    connector: Arc<dyn StoreConnector>,
}

impl Migrator {
    /// Create an engine that reaches record stores through `connector`
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self { connector }
    }

    /// Export connections of `profile` into an interchange file
    pub async fn export(&self, profile: &Profile, request: &ExportRequest) -> ExportResult {
        let mut result = ExportResult {
            output_path: request.output_path.clone(),
            ..Default::default()
        };

        match self.run_export(profile, request, &mut result).await {
            Ok(()) => result.success = true,
            Err(e) => {
                warn!("Export from profile {} failed: {}", profile.name, e);
                result.error = Some(e.to_string());
            }
        }
        result
    }

    async fn run_export(
        &self,
        profile: &Profile,
        request: &ExportRequest,
        result: &mut ExportResult,
    ) -> Result<()> {
        profile.validate()?;
        let source_key = profile.parse_domain_key()?;

        let transport_key = match request.transport_key.as_deref().filter(|k| !k.is_empty()) {
            Some(encoded) => {
                DomainKey::parse(encoded).map_err(|e| e.key_context("transport key"))?
            }
            None => {
                info!("Generated a new transport key");
                DomainKey::generate()
            }
        };
        result.transport_key = Some(transport_key.to_base64());

        let store = self.connector.connect(profile).await?;
        let mut connections = store.list_connections().await?;

        if !request.connection_ids.is_empty() {
            let wanted: HashSet<&str> = request.connection_ids.iter().map(String::as_str).collect();
            connections.retain(|conn| wanted.contains(conn.id.as_str()));
        }

        let records: Vec<ExportRecord> = connections
            .into_iter()
            .map(|conn| open_secrets(conn, &source_key).to_export_record())
            .collect();

        interchange::write_file(&request.output_path, &records, &transport_key).await?;

        result.exported_ids = records.iter().map(|r| r.conn_id.clone()).collect();
        result.connection_count = records.len();

        info!(
            "Exported {} connections from profile {}",
            result.connection_count, profile.name
        );
        Ok(())
    }

    /// Import an interchange file into the store of `profile`
    pub async fn import(&self, profile: &Profile, request: &ImportRequest) -> ImportResult {
        let mut result = ImportResult::default();

        match self.run_import(profile, request, &mut result).await {
            Ok(()) => result.success = true,
            Err(e) => {
                warn!(
                    "Import into profile {} failed after {} writes: {}",
                    profile.name,
                    result.written_count(),
                    e
                );
                result.error = Some(e.to_string());
            }
        }
        result
    }

    async fn run_import(
        &self,
        profile: &Profile,
        request: &ImportRequest,
        result: &mut ImportResult,
    ) -> Result<()> {
        profile.validate()?;
        let target_key = profile.parse_domain_key()?;

        if request.transport_key.is_empty() {
            return Err(MigratorError::InvalidKey(
                "transport key is required".to_string(),
            ));
        }
        let transport_key =
            DomainKey::parse(&request.transport_key).map_err(|e| e.key_context("transport key"))?;

        // Every row is decrypted before the store is touched
        let mut records = interchange::read_file(&request.input_path, &transport_key).await?;
        if records.is_empty() {
            info!("Interchange file {:?} holds no connections", request.input_path);
            return Ok(());
        }

        if !request.connection_ids.is_empty() {
            let wanted: HashSet<&str> = request.connection_ids.iter().map(String::as_str).collect();
            records.retain(|record| wanted.contains(record.conn_id.as_str()));
        }

        let prefix = request
            .id_prefix
            .as_deref()
            .unwrap_or(&profile.connection_prefix);
        let planned: Vec<Connection> = records
            .iter()
            .map(|record| {
                let mut conn = record.to_connection();
                conn.id = format!("{}{}", prefix, conn.id);
                conn
            })
            .collect();

        let store = self.connector.connect(profile).await?;

        let ids: Vec<String> = planned.iter().map(|conn| conn.id.clone()).collect();
        let existing: HashSet<String> = store
            .get_existing_connection_ids(&ids)
            .await?
            .into_iter()
            .collect();

        let strategy = request.collision_strategy;
        if strategy == CollisionStrategy::Stop && !existing.is_empty() {
            let colliding = ids.into_iter().filter(|id| existing.contains(id)).collect();
            return Err(MigratorError::Collision(colliding));
        }

        for mut conn in planned {
            let exists = existing.contains(&conn.id);

            if exists && strategy == CollisionStrategy::Skip {
                debug!("Skipping existing connection {}", conn.id);
                result.record_skipped(conn.id);
                continue;
            }

            seal_secrets(&mut conn, &target_key)?;

            let written = if exists {
                store.update_connection(&conn).await
            } else {
                store.insert_connection(&conn).await
            };
            if let Err(e) = written {
                return Err(MigratorError::RecordWrite {
                    id: conn.id,
                    message: e.to_string(),
                });
            }

            if exists {
                result.record_overwritten(conn.id);
            } else {
                result.record_imported(conn.id);
            }
        }

        info!(
            "Imported into profile {} ({}): {} new, {} overwritten, {} skipped",
            profile.name,
            strategy,
            result.imported_count,
            result.overwritten_count,
            result.skipped_count
        );
        Ok(())
    }

    /// Rows of the profile's store as stored, secrets still sealed
    pub async fn list_connections(&self, profile: &Profile) -> Result<Vec<Connection>> {
        profile.validate()?;
        let store = self.connector.connect(profile).await?;
        store.list_connections().await
    }

    /// Check that the profile's store is reachable
    pub async fn test_connection(&self, profile: &Profile) -> Result<()> {
        profile.validate()?;
        let store = self.connector.connect(profile).await?;
        store.test_connection().await
    }

    /// Generate a fresh base64 domain or transport key
    pub fn generate_key(&self) -> String {
        crypto::generate_key()
    }

    /// Whether `key` is a well-formed domain or transport key
    pub fn validate_key(&self, key: &str) -> bool {
        crypto::validate_key(key)
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator").finish_non_exhaustive()
    }
}

/// Replace sealed secret fields with plaintext
///
/// A field that does not open under `key` is taken to be plaintext already.
/// The flags record which fields did open.
fn open_secrets(mut conn: Connection, key: &DomainKey) -> Connection {
    conn.is_encrypted = open_field(&mut conn.password, key);
    conn.is_extra_encrypted = open_field(&mut conn.extra, key);

    if has_value(&conn.password) && !conn.is_encrypted {
        debug!("Password of {} did not decrypt, exporting as plaintext", conn.id);
    }
    if has_value(&conn.extra) && !conn.is_extra_encrypted {
        debug!("Extra of {} did not decrypt, exporting as plaintext", conn.id);
    }
    conn
}

fn open_field(field: &mut Option<String>, key: &DomainKey) -> bool {
    let Some(value) = field.as_deref().filter(|v| !v.is_empty()) else {
        return false;
    };
    match decrypt_string(key, value) {
        Ok(plaintext) => {
            *field = Some(plaintext);
            true
        }
        Err(_) => false,
    }
}

/// Seal non-empty secret fields under the target key
fn seal_secrets(conn: &mut Connection, key: &DomainKey) -> Result<()> {
    conn.is_encrypted = seal_field(&mut conn.password, key)?;
    conn.is_extra_encrypted = seal_field(&mut conn.extra, key)?;
    Ok(())
}

fn seal_field(field: &mut Option<String>, key: &DomainKey) -> Result<bool> {
    match field.as_deref().filter(|v| !v.is_empty()) {
        Some(value) => {
            *field = Some(encrypt_string(key, value)?);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn has_value(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{conn_type, MemoryConnector, MemoryStore, RecordStore};
    use crate::settings::Settings;
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;

    fn profile(name: &str) -> Profile {
        let mut profile = Profile::new(name);
        profile.db_host = format!("{}.db.internal", name);
        profile.db_name = "airflow".to_string();
        profile.db_user = "airflow".to_string();
        profile.domain_key = crypto::generate_key();
        profile
    }

    fn key_of(profile: &Profile) -> DomainKey {
        profile.parse_domain_key().unwrap()
    }

    /// A connection stored the way a live environment stores it
    fn sealed_connection(id: &str, password: &str, extra: &str, key: &DomainKey) -> Connection {
        let mut conn = Connection::new(id, conn_type::POSTGRES);
        conn.host = Some(format!("{}.example.com", id));
        conn.port = Some(5432);
        conn.login = Some("svc".to_string());
        conn.password = Some(encrypt_string(key, password).unwrap());
        conn.extra = Some(encrypt_string(key, extra).unwrap());
        conn.is_encrypted = true;
        conn.is_extra_encrypted = true;
        conn
    }

    fn plain_password(conn: &Connection, key: &DomainKey) -> String {
        decrypt_string(key, conn.password.as_deref().unwrap()).unwrap()
    }

    struct Env {
        _dir: TempDir,
        file: std::path::PathBuf,
        source: Profile,
        target: Profile,
        source_store: MemoryStore,
        target_store: MemoryStore,
        migrator: Migrator,
    }

    fn env() -> Env {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("connections.csv");
        let source = profile("source");
        let target = profile("target");
        let source_store = MemoryStore::new();
        let target_store = MemoryStore::new();
        let connector = MemoryConnector::new()
            .with_store(source.id.clone(), source_store.clone())
            .with_store(target.id.clone(), target_store.clone());

        Env {
            _dir: dir,
            file,
            source,
            target,
            source_store,
            target_store,
            migrator: Migrator::new(Arc::new(connector)),
        }
    }

    /// Export every source connection, returning the transport key
    async fn export_all(env: &Env) -> String {
        let result = env
            .migrator
            .export(&env.source, &ExportRequest::new(&env.file))
            .await;
        assert!(result.success, "export failed: {:?}", result.error);
        result.transport_key.unwrap()
    }

    async fn seed_source(env: &Env, conns: &[(&str, &str)]) {
        let key = key_of(&env.source);
        for (id, password) in conns {
            env.source_store
                .insert_connection(&sealed_connection(id, password, "{}", &key))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let env = env();
        seed_source(&env, &[("alpha", "pw-alpha"), ("beta", "pw-beta")]).await;

        let export = env
            .migrator
            .export(&env.source, &ExportRequest::new(&env.file))
            .await;
        assert!(export.success);
        assert_eq!(export.connection_count, 2);
        assert_eq!(export.exported_ids, vec!["alpha", "beta"]);

        let text = tokio::fs::read_to_string(&env.file).await.unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(!text.contains("pw-alpha"));

        let transport_key = export.transport_key.unwrap();
        assert!(crypto::validate_key(&transport_key));

        let request = ImportRequest::new(&env.file, transport_key)
            .with_strategy(CollisionStrategy::Skip);
        let import = env.migrator.import(&env.target, &request).await;
        assert!(import.success, "import failed: {:?}", import.error);
        assert_eq!(import.imported_count, 2);
        assert_eq!(import.skipped_count, 0);
        assert_eq!(import.overwritten_count, 0);

        let source_key = key_of(&env.source);
        let target_key = key_of(&env.target);
        for id in ["alpha", "beta"] {
            let original = env.source_store.get(id).await.unwrap();
            let copied = env.target_store.get(id).await.unwrap();

            assert_eq!(plain_password(&copied, &target_key), plain_password(&original, &source_key));
            assert_eq!(
                decrypt_string(&target_key, copied.extra.as_deref().unwrap()).unwrap(),
                "{}"
            );
            assert_eq!(copied.host, original.host);
            assert_eq!(copied.port, original.port);
            assert!(copied.is_encrypted);
            assert!(copied.is_extra_encrypted);
            // Sealed under the target key, not the source one
            assert!(decrypt_string(&source_key, copied.password.as_deref().unwrap()).is_err());
        }
    }

    #[tokio::test]
    async fn test_export_with_supplied_transport_key() {
        let env = env();
        seed_source(&env, &[("alpha", "pw")]).await;

        let key = crypto::generate_key();
        let request = ExportRequest {
            transport_key: Some(key.clone()),
            ..ExportRequest::new(&env.file)
        };
        let result = env.migrator.export(&env.source, &request).await;
        assert!(result.success);
        assert_eq!(result.transport_key.as_deref(), Some(key.as_str()));

        let records = interchange::read_file(&env.file, &DomainKey::parse(&key).unwrap())
            .await
            .unwrap();
        assert_eq!(records[0].password.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn test_export_filters_ids_in_store_order() {
        let env = env();
        seed_source(&env, &[("c", "3"), ("a", "1"), ("b", "2")]).await;

        let request = ExportRequest {
            connection_ids: vec!["c".to_string(), "a".to_string(), "missing".to_string()],
            ..ExportRequest::new(&env.file)
        };
        let result = env.migrator.export(&env.source, &request).await;
        assert!(result.success);
        assert_eq!(result.exported_ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_export_keeps_plaintext_fields() {
        let env = env();
        let mut plain = Connection::new("legacy", conn_type::HTTP);
        plain.password = Some("not-a-token".to_string());
        plain.extra = Some(r#"{"verify": false}"#.to_string());
        env.source_store.insert_connection(&plain).await.unwrap();

        let transport_key = export_all(&env).await;
        let records = interchange::read_file(&env.file, &DomainKey::parse(&transport_key).unwrap())
            .await
            .unwrap();

        assert_eq!(records[0].password.as_deref(), Some("not-a-token"));
        assert_eq!(records[0].extra.as_deref(), Some(r#"{"verify": false}"#));
        assert!(!records[0].is_encrypted);
        assert!(!records[0].is_extra_encrypted);
    }

    #[tokio::test]
    async fn test_export_invalid_profile_writes_nothing() {
        let env = env();
        let mut source = env.source.clone();
        source.db_host.clear();

        let result = env.migrator.export(&source, &ExportRequest::new(&env.file)).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("host"));
        assert!(!env.file.exists());
    }

    #[tokio::test]
    async fn test_export_rejects_bad_transport_key() {
        let env = env();
        let request = ExportRequest {
            transport_key: Some("dG9vLXNob3J0".to_string()),
            ..ExportRequest::new(&env.file)
        };
        let result = env.migrator.export(&env.source, &request).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("transport key"));
        assert!(result.transport_key.is_none());
        assert!(!env.file.exists());
    }

    async fn prepare_collision(env: &Env) -> String {
        seed_source(env, &[("shared", "from-source"), ("fresh", "new")]).await;
        let transport_key = export_all(env).await;

        let existing = sealed_connection("shared", "already-there", "{}", &key_of(&env.target));
        env.target_store.insert_connection(&existing).await.unwrap();
        transport_key
    }

    #[tokio::test]
    async fn test_import_stop_writes_nothing() {
        let env = env();
        let transport_key = prepare_collision(&env).await;

        let request = ImportRequest::new(&env.file, transport_key);
        let result = env.migrator.import(&env.target, &request).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("shared"));
        assert_eq!(result.written_count(), 0);
        assert_eq!(env.target_store.len().await, 1);
        assert!(env.target_store.get("fresh").await.is_none());
    }

    #[tokio::test]
    async fn test_import_skip_keeps_existing() {
        let env = env();
        let transport_key = prepare_collision(&env).await;

        let request =
            ImportRequest::new(&env.file, transport_key).with_strategy(CollisionStrategy::Skip);
        let result = env.migrator.import(&env.target, &request).await;

        assert!(result.success);
        assert_eq!(result.skipped_ids, vec!["shared"]);
        assert_eq!(result.imported_ids, vec!["fresh"]);

        let shared = env.target_store.get("shared").await.unwrap();
        assert_eq!(plain_password(&shared, &key_of(&env.target)), "already-there");
    }

    #[tokio::test]
    async fn test_import_overwrite_replaces_existing() {
        let env = env();
        let transport_key = prepare_collision(&env).await;

        let request = ImportRequest::new(&env.file, transport_key)
            .with_strategy(CollisionStrategy::Overwrite);
        let result = env.migrator.import(&env.target, &request).await;

        assert!(result.success);
        assert_eq!(result.overwritten_ids, vec!["shared"]);
        assert_eq!(result.imported_ids, vec!["fresh"]);
        assert_eq!(result.skipped_count, 0);

        let shared = env.target_store.get("shared").await.unwrap();
        assert_eq!(plain_password(&shared, &key_of(&env.target)), "from-source");
    }

    #[tokio::test]
    async fn test_import_applies_prefix() {
        let env = env();
        seed_source(&env, &[("my_conn", "pw")]).await;
        let transport_key = export_all(&env).await;

        // Unprefixed id already present must not collide
        let clash = sealed_connection("my_conn", "other", "{}", &key_of(&env.target));
        env.target_store.insert_connection(&clash).await.unwrap();

        let request = ImportRequest::new(&env.file, transport_key).with_prefix("prod_");
        let result = env.migrator.import(&env.target, &request).await;

        assert!(result.success, "import failed: {:?}", result.error);
        assert_eq!(result.imported_ids, vec!["prod_my_conn"]);
        assert!(env.target_store.get("prod_my_conn").await.is_some());
    }

    #[tokio::test]
    async fn test_import_uses_profile_prefix_by_default() {
        let mut env = env();
        seed_source(&env, &[("my_conn", "pw")]).await;
        let transport_key = export_all(&env).await;
        env.target.connection_prefix = "stage_".to_string();

        let result = env
            .migrator
            .import(&env.target, &ImportRequest::new(&env.file, transport_key))
            .await;
        assert_eq!(result.imported_ids, vec!["stage_my_conn"]);

        // An explicit empty prefix wins over the profile's
        let other_key = export_all(&env).await;
        let request = ImportRequest::new(&env.file, other_key)
            .with_prefix("")
            .with_strategy(CollisionStrategy::Skip);
        let result = env.migrator.import(&env.target, &request).await;
        assert_eq!(result.imported_ids, vec!["my_conn"]);
    }

    #[tokio::test]
    async fn test_import_filters_ids() {
        let env = env();
        seed_source(&env, &[("a", "1"), ("b", "2")]).await;
        let transport_key = export_all(&env).await;

        let mut request = ImportRequest::new(&env.file, transport_key);
        request.connection_ids = vec!["b".to_string()];
        let result = env.migrator.import(&env.target, &request).await;

        assert_eq!(result.imported_ids, vec!["b"]);
        assert_eq!(env.target_store.len().await, 1);
    }

    #[tokio::test]
    async fn test_import_wrong_transport_key_writes_nothing() {
        let env = env();
        seed_source(&env, &[("a", "1"), ("b", "2")]).await;
        export_all(&env).await;

        let request = ImportRequest::new(&env.file, crypto::generate_key());
        let result = env.migrator.import(&env.target, &request).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().starts_with("Invalid token"));
        assert!(env.target_store.is_empty().await);
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_key_before_reading() {
        let env = env();
        // The file does not exist; a key error must win over an I/O error
        let request = ImportRequest::new(&env.file, "not base64!");
        let result = env.migrator.import(&env.target, &request).await;
        assert!(result.error.as_deref().unwrap().starts_with("Invalid key"));

        let result = env
            .migrator
            .import(&env.target, &ImportRequest::new(&env.file, ""))
            .await;
        assert!(result.error.as_deref().unwrap().contains("required"));
    }

    #[tokio::test]
    async fn test_import_header_only_file() {
        let env = env();
        tokio::fs::write(&env.file, "conn_id,encrypted_data\n").await.unwrap();

        let request = ImportRequest::new(&env.file, crypto::generate_key());
        let result = env.migrator.import(&env.target, &request).await;
        assert!(result.success);
        assert_eq!(result.written_count(), 0);
    }

    /// Store that refuses to insert one id
    struct FailingStore {
        inner: MemoryStore,
        fail_id: String,
    }

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn list_connections(&self) -> Result<Vec<Connection>> {
            self.inner.list_connections().await
        }

        async fn get_existing_connection_ids(&self, ids: &[String]) -> Result<Vec<String>> {
            self.inner.get_existing_connection_ids(ids).await
        }

        async fn insert_connection(&self, connection: &Connection) -> Result<()> {
            if connection.id == self.fail_id {
                return Err(MigratorError::StoreError("constraint violation".to_string()));
            }
            self.inner.insert_connection(connection).await
        }

        async fn update_connection(&self, connection: &Connection) -> Result<()> {
            self.inner.update_connection(connection).await
        }

        async fn test_connection(&self) -> Result<()> {
            Err(MigratorError::StoreError("connection refused".to_string()))
        }
    }

    struct FailingConnector {
        store: MemoryStore,
        fail_id: String,
    }

    #[async_trait]
    impl StoreConnector for FailingConnector {
        async fn connect(&self, _profile: &Profile) -> Result<Box<dyn RecordStore>> {
            Ok(Box::new(FailingStore {
                inner: self.store.clone(),
                fail_id: self.fail_id.clone(),
            }))
        }
    }

    async fn write_interchange(path: &Path, ids: &[&str]) -> String {
        let key = DomainKey::generate();
        let records: Vec<ExportRecord> = ids
            .iter()
            .map(|id| Connection::new(*id, conn_type::GENERIC).to_export_record())
            .collect();
        interchange::write_file(path, &records, &key).await.unwrap();
        key.to_base64()
    }

    #[tokio::test]
    async fn test_import_partial_failure_reports_progress() {
        let env = env();
        let transport_key = write_interchange(&env.file, &["one", "two", "three"]).await;

        let store = MemoryStore::new();
        let migrator = Migrator::new(Arc::new(FailingConnector {
            store: store.clone(),
            fail_id: "two".to_string(),
        }));

        let request = ImportRequest::new(&env.file, transport_key);
        let result = migrator.import(&env.target, &request).await;

        assert!(!result.success);
        assert_eq!(result.imported_ids, vec!["one"]);
        let error = result.error.as_deref().unwrap();
        assert!(error.contains("two"));
        assert!(error.contains("constraint violation"));
        assert_eq!(store.len().await, 1);
        assert!(store.get("three").await.is_none());
    }

    #[tokio::test]
    async fn test_requests_built_from_settings() {
        let env = env();
        seed_source(&env, &[("shared", "from-source")]).await;
        let existing = sealed_connection("shared", "already-there", "{}", &key_of(&env.target));
        env.target_store.insert_connection(&existing).await.unwrap();

        let settings = Settings {
            default_collision_strategy: CollisionStrategy::Skip,
            export_dir: env.file.parent().map(Path::to_path_buf),
            ..Settings::default()
        };

        let request = ExportRequest::from_settings(&settings, "nightly.csv");
        let export = env.migrator.export(&env.source, &request).await;
        assert!(export.success, "export failed: {:?}", export.error);
        let written = env.file.with_file_name("nightly.csv");
        assert_eq!(export.output_path, written);
        assert!(written.exists());

        let request =
            ImportRequest::from_settings(&settings, &written, export.transport_key.unwrap());
        let import = env.migrator.import(&env.target, &request).await;
        assert!(import.success);
        assert_eq!(import.skipped_ids, vec!["shared"]);
    }

    #[tokio::test]
    async fn test_import_duplicate_ids_writes_nothing() {
        let env = env();
        let transport_key = write_interchange(&env.file, &["dup", "other", "dup"]).await;

        let request = ImportRequest::new(&env.file, transport_key);
        let result = env.migrator.import(&env.target, &request).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("duplicate connection id dup"));
        assert_eq!(result.written_count(), 0);
        assert!(env.target_store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_and_test_connection() {
        let env = env();
        seed_source(&env, &[("a", "1")]).await;

        let listed = env.migrator.list_connections(&env.source).await.unwrap();
        assert_eq!(listed.len(), 1);
        // Still sealed
        assert!(listed[0].is_encrypted);
        assert_ne!(listed[0].password.as_deref(), Some("1"));

        assert!(env.migrator.test_connection(&env.source).await.is_ok());

        let failing = Migrator::new(Arc::new(FailingConnector {
            store: MemoryStore::new(),
            fail_id: String::new(),
        }));
        assert!(matches!(
            failing.test_connection(&env.source).await,
            Err(MigratorError::StoreError(_))
        ));

        let unknown = profile("unknown");
        assert!(env.migrator.list_connections(&unknown).await.is_err());
    }

    #[test]
    fn test_key_passthroughs() {
        let migrator = Migrator::new(Arc::new(MemoryConnector::new()));
        let key = migrator.generate_key();
        assert!(migrator.validate_key(&key));
        assert!(!migrator.validate_key(""));
    }
}
