/// Idempotent default role/permission seeding.
///
/// Registration depends on the "User" role existing; running the service
/// without this seed turns every registration into a configuration error.
use crate::db::CredentialStore;
use crate::error::ApiResult;
use crate::models::role::NewPermission;

const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    ("User Actions", "Perform basic user actions"),
    ("Manage Users", "Admin can manage users"),
    ("Manage Roles", "Admin can manage roles and permissions"),
];

pub async fn ensure_default_roles(store: &dyn CredentialStore) -> ApiResult<()> {
    let mut permission_ids = Vec::with_capacity(DEFAULT_PERMISSIONS.len());

    for (name, description) in DEFAULT_PERMISSIONS {
        let permission = match store.find_permission_by_name(name).await? {
            Some(permission) => permission,
            None => {
                let permission = store
                    .create_permission(NewPermission {
                        name: (*name).to_string(),
                        resource: None,
                        action: None,
                        description: Some((*description).to_string()),
                    })
                    .await?;
                tracing::info!(permission = %name, "seeded permission");
                permission
            }
        };
        permission_ids.push(permission.id);
    }

    // Admin carries every default permission; User only the first.
    let roles: [(&str, &[uuid::Uuid]); 2] = [
        ("Admin", &permission_ids[..]),
        ("User", &permission_ids[..1]),
    ];

    for (role_name, ids) in roles {
        if store.find_role_by_name(role_name).await?.is_none() {
            store.create_role(role_name, ids).await?;
            tracing::info!(role = role_name, "seeded role");
        }
    }

    Ok(())
}
