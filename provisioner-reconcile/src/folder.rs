//! Folder reconciler.

use provisioner_core::Folder;
use provisioner_grafana::{GrafanaApi, Permission, PermissionItem, Role, UpdateFolder};

use crate::outcome::{Outcome, ResourceKind, ResourceOutcome};

/// Permission set applied to every provisioned folder.
pub const FOLDER_PERMISSIONS: [PermissionItem; 2] = [
    PermissionItem {
        role: Role::Admin,
        permission: Permission::Admin,
    },
    PermissionItem {
        role: Role::Editor,
        permission: Permission::Edit,
    },
];

/// Reconcile every folder, then its permissions.
///
/// Each folder yields two entries: the folder itself and its permissions.
/// Permissions are (re)applied after every folder step, whatever its result.
pub fn reconcile_all<A: GrafanaApi>(
    api: &A,
    folders: &[Folder],
    dry_run: bool,
) -> Vec<ResourceOutcome> {
    let span = tracing::info_span!("provision folders", count = folders.len());
    let _guard = span.enter();

    let mut outcomes = Vec::with_capacity(folders.len() * 2);
    for folder in folders {
        let key = folder.uid.0.clone();
        let folder_outcome = reconcile_folder(api, folder, dry_run);
        let permissions = if dry_run {
            Outcome::WouldUpdate
        } else {
            apply_permissions(api, folder)
        };
        outcomes.push(ResourceOutcome::new(ResourceKind::Folder, key.clone(), folder_outcome));
        outcomes.push(ResourceOutcome::new(ResourceKind::FolderPermissions, key, permissions));
    }
    outcomes
}

fn reconcile_folder<A: GrafanaApi>(api: &A, folder: &Folder, dry_run: bool) -> Outcome {
    let uid = &folder.uid;
    let existing = match api.get_folder_by_uid(uid) {
        Ok(existing) => existing,
        Err(err) => {
            tracing::error!(folder = %uid, error = %err, "error looking up folder");
            return Outcome::failed(err);
        }
    };

    match existing {
        None if dry_run => {
            tracing::info!(folder = %uid, "[dry-run] would create folder");
            Outcome::WouldCreate
        }
        None => match api.create_folder(folder) {
            Ok(created) => {
                tracing::info!(folder = %uid, version = created.version, "created folder");
                Outcome::Created
            }
            Err(err) => {
                tracing::error!(folder = %uid, error = %err, "error creating folder");
                Outcome::failed(err)
            }
        },
        Some(current) if dry_run => {
            tracing::info!(folder = %uid, version = current.version, "[dry-run] would update folder");
            Outcome::WouldUpdate
        }
        Some(current) => {
            let update = UpdateFolder {
                title: folder.title.clone(),
                description: folder.description.clone(),
                version: current.version,
            };
            match api.update_folder(uid, &update) {
                Ok(updated) => {
                    tracing::info!(folder = %uid, version = updated.version, "updated folder");
                    Outcome::Updated
                }
                Err(err) => {
                    tracing::error!(folder = %uid, error = %err, "error updating folder");
                    Outcome::failed(err)
                }
            }
        }
    }
}

fn apply_permissions<A: GrafanaApi>(api: &A, folder: &Folder) -> Outcome {
    match api.update_folder_permissions(&folder.uid, &FOLDER_PERMISSIONS) {
        Ok(()) => {
            tracing::debug!(folder = %folder.uid, "applied folder permissions");
            Outcome::Updated
        }
        Err(err) => {
            tracing::error!(folder = %folder.uid, error = %err, "error updating folder permissions");
            Outcome::failed(err)
        }
    }
}
