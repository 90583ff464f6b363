//! Reconciliation engine that runs the sync phases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use peoplesync_common::{Error, RemoteId, Result};
use peoplesync_contacts::{ContactStore, LocalContact};
use peoplesync_remote::{RemoteContact, RemoteDirectory, RemoteSession, UpdateMask};

use crate::equivalence::equivalent;
use crate::index::{LocalIndex, RemoteIndex};
use crate::links::{LinkSet, LinkStore};
use crate::mapper;
use crate::report::SyncReport;
use crate::retry::{RetryConfig, RetryExecutor};

/// Message reported after a successful run.
pub const SYNCHRONISED: &str = "Synchronised";

/// Configuration for the sync engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Retry policy for remote directory calls.
    pub retry: RetryConfig,
}

/// What happened to a single record during export or import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Linked,
    Skipped,
}

/// Two-way reconciliation between a local contact store and a remote
/// directory.
///
/// A run takes a full snapshot of both sides and then, in order:
/// 1. Prune: delete local contacts whose remote record is gone
/// 2. Push-update: for every linked id, propagate deletions and the newer
///    side's fields
/// 3. Export: create or link unlinked local contacts remotely
/// 4. Import: create or link remote contacts not yet known locally
/// 5. Finalize: persist the link set
///
/// Each phase is idempotent, so a run that stopped halfway is reconciled by
/// the next one.
pub struct SyncEngine {
    links: LinkStore,
    retry: RetryExecutor,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(links: LinkStore, config: SyncConfig) -> Self {
        Self {
            links,
            retry: RetryExecutor::new(config.retry.clone()),
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn link_store(&self) -> &LinkStore {
        &self.links
    }

    /// Run a full sync.
    ///
    /// # Preconditions
    /// - `session` is valid
    /// - The engine is the only writer to `store` for the duration of the run
    ///
    /// # Postconditions
    /// - The link set is persisted, also when a phase fails
    ///
    /// # Errors
    /// - `Precondition` when the session is not valid; nothing is touched
    /// - Remote or store failures during listing, prune or push-update
    pub async fn run(
        &mut self,
        store: &mut dyn ContactStore,
        session: &RemoteSession,
    ) -> Result<SyncReport> {
        let start = Instant::now();
        let directory = session.directory()?;

        info!("Starting sync with {} directory", directory.name());

        let mut links = self.links.load().await?;
        let listing = self
            .retry
            .execute("list connections", || directory.list_connections())
            .await?;
        let remote = RemoteIndex::build(listing);
        debug!(
            "Snapshot: {} remote contacts, {} links",
            remote.len(),
            links.len()
        );

        let mut report = SyncReport::default();
        let outcome = self
            .reconcile(store, directory.as_ref(), &remote, &mut links, &mut report)
            .await;

        let saved = self.links.save(&links).await;
        report.duration = start.elapsed();

        match (outcome, saved) {
            (Ok(()), Ok(())) => {
                info!("Sync finished: {}", report);
                Ok(report)
            }
            (Err(e), Ok(())) => {
                error!("Sync aborted: {}", e);
                Err(e)
            }
            (Err(e), Err(save_err)) => {
                error!("Sync aborted: {}; link set not saved: {}", e, save_err);
                Err(e)
            }
            (Ok(()), Err(save_err)) => Err(save_err),
        }
    }

    async fn reconcile(
        &self,
        store: &mut dyn ContactStore,
        directory: &dyn RemoteDirectory,
        remote: &RemoteIndex,
        links: &mut LinkSet,
        report: &mut SyncReport,
    ) -> Result<()> {
        // Ids deleted remotely during this run; still present in the snapshot.
        let mut removed = HashSet::new();

        self.prune(store, remote, links, report)?;
        self.push_updates(store, directory, remote, links, &mut removed, report)
            .await?;
        self.export(store, directory, remote, links, &removed, report)
            .await?;
        self.import(store, remote, links, &removed, report)?;
        Ok(())
    }

    /// Delete local contacts linked to a remote record that no longer exists.
    fn prune(
        &self,
        store: &mut dyn ContactStore,
        remote: &RemoteIndex,
        links: &mut LinkSet,
        report: &mut SyncReport,
    ) -> Result<()> {
        let local = LocalIndex::build(store.list_contacts()?);

        for contact in local.contacts() {
            let Some(id) = &contact.remote_id else {
                continue;
            };
            if remote.contains_id(id) {
                continue;
            }

            info!(
                "Deleting {} locally: {} was removed remotely",
                contact.display_name(),
                id
            );
            store.delete_contact(contact)?;
            links.remove(id);
            report.local_deleted += 1;
        }

        Ok(())
    }

    /// Propagate deletions and edits for every linked identifier.
    async fn push_updates(
        &self,
        store: &mut dyn ContactStore,
        directory: &dyn RemoteDirectory,
        remote: &RemoteIndex,
        links: &mut LinkSet,
        removed: &mut HashSet<RemoteId>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let local = LocalIndex::build(store.list_contacts()?);
        let linked: Vec<RemoteId> = links.iter().cloned().collect();
        let mask = UpdateMask::contact_fields();

        for id in linked {
            let Some(contact) = local.by_id(&id) else {
                if remote.contains_id(&id) {
                    info!("Deleting {} remotely: removed locally", id);
                    self.retry
                        .execute("delete contact", || directory.delete_contact(&id))
                        .await?;
                    removed.insert(id.clone());
                    report.remote_deleted += 1;
                }
                links.remove(&id);
                continue;
            };

            let Some(existing) = remote.by_id(&id) else {
                info!("Unlinking {}: {} no longer exists remotely", contact.display_name(), id);
                store.replace_contact(contact, contact.clone().with_remote_id(None))?;
                links.remove(&id);
                report.unlinked += 1;
                continue;
            };

            let Some(remote_time) = existing.update_time() else {
                warn!("Remote contact {} has no update time, skipping", id);
                report.skipped += 1;
                continue;
            };

            match remote_time.cmp(&contact.last_modified) {
                Ordering::Greater => match mapper::pull_into(contact, existing, remote_time) {
                    Some(pulled) => {
                        debug!("Pulling {} from {}", contact.display_name(), id);
                        match store.replace_contact(contact, pulled) {
                            Ok(()) => report.pulled += 1,
                            Err(Error::DuplicateContact(name)) => {
                                warn!(
                                    "Not pulling {}: {} would duplicate another local contact",
                                    id, name
                                );
                                report.skipped += 1;
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    None => report.skipped += 1,
                },
                Ordering::Less => {
                    let mut payload = mapper::to_remote(contact);
                    mapper::backfill_from(&mut payload, existing);

                    debug!("Pushing {} to {}", contact.display_name(), id);
                    let updated = self
                        .retry
                        .execute("update contact", || {
                            directory.update_contact(&id, &payload, &mask)
                        })
                        .await?;
                    let time = update_time_of(&updated, &id)?;
                    store.replace_contact(contact, contact.clone().with_last_modified(time))?;
                    report.pushed += 1;
                }
                Ordering::Equal => {}
            }
        }

        Ok(())
    }

    /// Create or link every local contact that has no remote identifier.
    async fn export(
        &self,
        store: &mut dyn ContactStore,
        directory: &dyn RemoteDirectory,
        remote: &RemoteIndex,
        links: &mut LinkSet,
        removed: &HashSet<RemoteId>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let local = LocalIndex::build(store.list_contacts()?);

        for contact in local.contacts().iter().filter(|c| !c.is_linked()) {
            match self
                .export_one(store, directory, remote, &local, links, removed, contact)
                .await
            {
                Ok(Outcome::Created) => report.remote_created += 1,
                Ok(Outcome::Linked) => report.linked += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!("Failed to export {}: {}", contact.display_name(), e);
                    report.skipped += 1;
                }
            }
        }

        Ok(())
    }

    async fn export_one(
        &self,
        store: &mut dyn ContactStore,
        directory: &dyn RemoteDirectory,
        remote: &RemoteIndex,
        local: &LocalIndex,
        links: &mut LinkSet,
        removed: &HashSet<RemoteId>,
        contact: &LocalContact,
    ) -> Result<Outcome> {
        let candidate = remote
            .by_name(contact.display_name())
            .filter(|r| r.resource_name.as_ref().is_some_and(|id| !removed.contains(id)));

        match candidate {
            None => {
                // Not retried: a create that committed before the error surfaced
                // would leave a second remote copy.
                let payload = mapper::to_remote(contact);
                let created = directory.create_contact(&payload).await?;
                let id = created
                    .resource_name
                    .clone()
                    .ok_or_else(|| Error::remote("Directory returned a contact without a resource name"))?;
                let time = update_time_of(&created, &id)?;

                link(store, links, contact, id, time)?;
                debug!("Created {} remotely", contact.display_name());
                Ok(Outcome::Created)
            }
            Some(existing) if equivalent(contact, existing) => {
                let Some(id) = existing.resource_name.clone() else {
                    return Ok(Outcome::Skipped);
                };
                if local.contains_id(&id) || links.contains(&id) {
                    debug!("{} is already linked to another contact", id);
                    return Ok(Outcome::Skipped);
                }
                let time = update_time_of(existing, &id)?;

                link(store, links, contact, id, time)?;
                debug!("Linked {} to existing remote contact", contact.display_name());
                Ok(Outcome::Linked)
            }
            Some(_) => {
                info!(
                    "Not exporting {}: a different remote contact has the same name",
                    contact.display_name()
                );
                Ok(Outcome::Skipped)
            }
        }
    }

    /// Create or link every remote contact not yet known locally.
    fn import(
        &self,
        store: &mut dyn ContactStore,
        remote: &RemoteIndex,
        links: &mut LinkSet,
        removed: &HashSet<RemoteId>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let local = LocalIndex::build(store.list_contacts()?);

        for existing in remote.contacts() {
            let Some(id) = existing.resource_name.clone() else {
                continue;
            };
            if removed.contains(&id) {
                continue;
            }
            if local.contains_id(&id) {
                if links.insert(id.clone()) {
                    debug!("Restored missing link for {}", id);
                }
                continue;
            }
            if links.contains(&id) {
                continue;
            }

            match import_one(store, &local, links, existing, id.clone()) {
                Ok(Outcome::Created) => report.local_created += 1,
                Ok(Outcome::Linked) => report.linked += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(Error::DuplicateContact(_)) => {
                    debug!("{} already exists locally", id);
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!("Failed to import {}: {}", id, e);
                    report.skipped += 1;
                }
            }
        }

        Ok(())
    }
}

fn import_one(
    store: &mut dyn ContactStore,
    local: &LocalIndex,
    links: &mut LinkSet,
    existing: &RemoteContact,
    id: RemoteId,
) -> Result<Outcome> {
    if let Some(candidate) = existing.display_name().and_then(|n| local.by_name(&n)) {
        if !candidate.is_linked() && equivalent(candidate, existing) {
            let time = update_time_of(existing, &id)?;
            link(store, links, candidate, id, time)?;
            debug!("Linked {} to existing local contact", candidate.display_name());
            return Ok(Outcome::Linked);
        }
        info!(
            "Not importing {}: a different local contact has the same name",
            candidate.display_name()
        );
        return Ok(Outcome::Skipped);
    }

    let Some(contact) = mapper::to_local(existing) else {
        return Ok(Outcome::Skipped);
    };
    debug!("Importing {} as {}", id, contact.display_name());
    store.add_contact(contact)?;
    links.insert(id);
    Ok(Outcome::Created)
}

/// Record `id` on the local contact, adopt the remote timestamp and add the
/// id to the link set. The link is only recorded once the store accepted it.
fn link(
    store: &mut dyn ContactStore,
    links: &mut LinkSet,
    contact: &LocalContact,
    id: RemoteId,
    time: DateTime<Utc>,
) -> Result<()> {
    let linked = contact
        .clone()
        .with_remote_id(Some(id.clone()))
        .with_last_modified(time);
    store.replace_contact(contact, linked)?;
    links.insert(id);
    Ok(())
}

fn update_time_of(contact: &RemoteContact, id: &RemoteId) -> Result<DateTime<Utc>> {
    contact
        .update_time()
        .ok_or_else(|| Error::remote(format!("Directory returned {} without an update time", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use peoplesync_common::{ContactName, SensitiveString};
    use peoplesync_contacts::MemoryStore;
    use peoplesync_remote::MemoryDirectory;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn engine(temp_dir: &TempDir) -> SyncEngine {
        let config = SyncConfig {
            retry: RetryConfig::none(),
        };
        SyncEngine::new(LinkStore::new(temp_dir.path().join("links.json")), config)
    }

    fn session(directory: &Arc<MemoryDirectory>) -> RemoteSession {
        RemoteSession::open(directory.clone(), SensitiveString::new("token"), None)
    }

    #[tokio::test]
    async fn test_locked_session_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let directory = Arc::new(MemoryDirectory::new());
        let mut session = session(&directory);
        session.lock();
        let mut store = MemoryStore::new();
        store
            .add_contact(LocalContact::new(ContactName::parse("Alex").unwrap()))
            .unwrap();

        let result = engine(&temp_dir).run(&mut store, &session).await;

        match result {
            Err(Error::Precondition(msg)) => assert_eq!(msg, "Please authenticate first"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(directory.calls(), peoplesync_remote::DirectoryCalls::default());
        assert!(!temp_dir.path().join("links.json").exists());
    }

    #[tokio::test]
    async fn test_empty_sides_are_noop() {
        let temp_dir = TempDir::new().unwrap();
        let directory = Arc::new(MemoryDirectory::new());
        let mut store = MemoryStore::new();

        let report = engine(&temp_dir)
            .run(&mut store, &session(&directory))
            .await
            .unwrap();

        assert!(report.is_noop());
        assert!(temp_dir.path().join("links.json").exists());
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let directory = Arc::new(MemoryDirectory::new());
        directory.fail_next(peoplesync_remote::DirectoryOp::List, 1, false);
        let mut store = MemoryStore::new();

        let result = engine(&temp_dir).run(&mut store, &session(&directory)).await;
        assert!(matches!(result, Err(Error::Remote { .. })));
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
    }
}
