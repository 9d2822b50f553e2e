use serde::{Deserialize, Serialize};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    AccessCatalog,
    LikeContent,
    OwnPlaylists,
    EditCatalog,
    ManagePermissions,
    ServerAdmin,
    ViewAnalytics,
    RequestContent,
    DownloadManagerAdmin,
}

impl Permission {
    pub fn as_int(self) -> i32 {
        match self {
            Permission::AccessCatalog => 1,
            Permission::LikeContent => 2,
            Permission::OwnPlaylists => 3,
            Permission::EditCatalog => 4,
            Permission::ManagePermissions => 5,
            Permission::ServerAdmin => 7,
            Permission::ViewAnalytics => 8,
            Permission::RequestContent => 9,
            Permission::DownloadManagerAdmin => 10,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(Permission::AccessCatalog),
            2 => Some(Permission::LikeContent),
            3 => Some(Permission::OwnPlaylists),
            4 => Some(Permission::EditCatalog),
            5 => Some(Permission::ManagePermissions),
            7 => Some(Permission::ServerAdmin),
            8 => Some(Permission::ViewAnalytics),
            9 => Some(Permission::RequestContent),
            10 => Some(Permission::DownloadManagerAdmin),
            _ => None,
        }
    }
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::AccessCatalog,
    Permission::EditCatalog,
    Permission::ManagePermissions,
    Permission::ServerAdmin,
    Permission::ViewAnalytics,
    Permission::RequestContent,
    Permission::DownloadManagerAdmin,
];
const REGULAR_PERMISSIONS: &[Permission] = &[
    Permission::AccessCatalog,
    Permission::LikeContent,
    Permission::OwnPlaylists,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Regular,
}

impl UserRole {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            UserRole::Admin => ADMIN_PERMISSIONS,
            UserRole::Regular => REGULAR_PERMISSIONS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Regular => "Regular",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "regular" => Some(UserRole::Regular),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PermissionGrant {
    ByRole(UserRole),
    Extra {
        start_time: SystemTime,
        end_time: Option<SystemTime>,
        permission: Permission,
        countdown: Option<u64>,
    },
}
