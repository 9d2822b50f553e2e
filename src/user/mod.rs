pub mod auth;
pub mod device;
pub mod permissions;
pub mod settings;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, UserAuthCredentials, UsernamePasswordCredentials};
pub use permissions::{Permission, PermissionGrant, UserRole};
pub use settings::UserSetting;
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::UserManager;
pub use user_models::{
    BandwidthSummary, BandwidthUsage, CategoryBandwidth, DailyListeningStats, LikedContentType,
    ListeningEvent, ListeningSummary, TrackListeningStats, UserListeningHistoryEntry, UserPlaylist,
};
pub use user_store::{
    DeviceStore, FullUserStore, UserAuthCredentialsStore, UserAuthTokenStore, UserBandwidthStore,
    UserListeningStore, UserSettingsStore, UserStore,
};
