//! Catalog proxy for on-demand content fetching from the downloader service.
//!
//! The proxy detects when content is incomplete (e.g., artist with no albums)
//! and fetches missing data from the external downloader service.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog_store::{CatalogStore, ImageType};
use crate::downloader::models::{
    DownloaderAlbum, DownloaderArtist, DownloaderImage, DownloaderTrack,
};
use crate::downloader::Downloader;
use crate::user::{settings::UserSetting, FullUserStore, Permission};

/// Proxy for fetching and storing content from the downloader service.
pub struct CatalogProxy {
    downloader: Arc<dyn Downloader>,
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn FullUserStore>,
    media_base_path: PathBuf,
}

impl CatalogProxy {
    /// Create a new catalog proxy.
    pub fn new(
        downloader: Arc<dyn Downloader>,
        catalog_store: Arc<dyn CatalogStore>,
        user_store: Arc<dyn FullUserStore>,
        media_base_path: PathBuf,
    ) -> Self {
        Self {
            downloader,
            catalog_store,
            user_store,
            media_base_path,
        }
    }

    /// Check if a user can trigger downloads based on permission and preference.
    ///
    /// Returns true if user has RequestContent permission AND enabled "enable_external_search".
    /// This is for metadata-only fetching when viewing external search results.
    fn can_user_trigger_download(&self, user_id: usize, permissions: &[Permission]) -> bool {
        let has_request_content = permissions.contains(&Permission::RequestContent);
        if has_request_content {
            let setting = self
                .user_store
                .get_user_setting(user_id, "enable_external_search");
            debug!(
                "can_user_trigger_download: user_id={}, RequestContent=true, enable_external_search={:?}",
                user_id, setting
            );
            if let Ok(Some(UserSetting::ExternalSearchEnabled(true))) = setting {
                return true;
            }
        }

        debug!(
            "can_user_trigger_download: user_id={}, DENIED - RequestContent={}",
            user_id, has_request_content
        );
        false
    }

    /// Ensure an artist has complete data, fetching from downloader if needed.
    ///
    /// Checks if the artist:
    /// - Exists in catalog
    /// - Has albums (discography)
    /// - Has related artists
    ///
    /// If any data is missing and user has permission + preference enabled,
    /// attempts to fetch from downloader.
    pub async fn ensure_artist_complete(
        &self,
        id: &str,
        user_id: usize,
        permissions: &[Permission],
    ) -> Result<()> {
        // Check user permission and preference before attempting any downloads
        if !self.can_user_trigger_download(user_id, permissions) {
            debug!(
                "Skipping artist {} completion check - user {} not authorized for downloads",
                id, user_id
            );
            return Ok(());
        }

        // Check if artist exists
        let artist_exists = self.catalog_store.get_artist_json(id)?.is_some();

        if !artist_exists {
            // Artist doesn't exist, fetch everything
            info!("Artist {} not found, fetching from downloader", id);
            self.fetch_and_store_artist(id).await?;
            return Ok(());
        }

        // Check if artist has related artists
        let resolved = self.catalog_store.get_resolved_artist_json(id)?;
        let has_related_artists = resolved
            .as_ref()
            .and_then(|r| r.get("related_artists"))
            .and_then(|a| a.as_array())
            .map(|a| !a.is_empty())
            .unwrap_or(false);

        if !has_related_artists {
            info!(
                "Artist {} has no related artists, fetching from downloader",
                id
            );
            self.fetch_and_store_artist(id).await?;
        }

        Ok(())
    }

    /// Ensure an album has complete data, fetching from downloader if needed.
    ///
    /// If any data is missing and user has permission + preference enabled,
    /// attempts to fetch from downloader.
    pub async fn ensure_album_complete(
        &self,
        id: &str,
        user_id: usize,
        permissions: &[Permission],
    ) -> Result<()> {
        // Check user permission and preference before attempting any downloads
        if !self.can_user_trigger_download(user_id, permissions) {
            debug!(
                "Skipping album {} completion check - user {} not authorized for downloads",
                id, user_id
            );
            return Ok(());
        }

        // Check if album exists
        let album_exists = self.catalog_store.get_album_json(id)?.is_some();

        if !album_exists {
            info!("Album {} not found, fetching from downloader", id);
            self.fetch_and_store_album(id).await?;
            return Ok(());
        }

        // Check if album has tracks
        let resolved = self.catalog_store.get_resolved_album_json(id)?;
        let has_tracks = resolved
            .as_ref()
            .and_then(|r| r.get("discs"))
            .and_then(|d| d.as_array())
            .map(|discs| {
                discs.iter().any(|disc| {
                    disc.get("tracks")
                        .and_then(|t| t.as_array())
                        .map(|t| !t.is_empty())
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        if !has_tracks {
            info!("Album {} has no tracks, fetching from downloader", id);
            self.fetch_album_tracks(id).await?;
        }

        Ok(())
    }

    /// Fetch artist metadata and related artists from downloader.
    pub async fn fetch_and_store_artist(&self, id: &str) -> Result<()> {
        info!("Fetching artist {} from downloader...", id);
        let dl_artist = self.downloader.get_artist(id).await?;

        info!(
            "Fetched artist '{}' (id: {}) - {} genres, {} portraits, {} related artists",
            dl_artist.name,
            dl_artist.id,
            dl_artist.genre.len(),
            dl_artist.portraits.len() + dl_artist.portrait_group.len(),
            dl_artist.related.len()
        );

        // Store the artist
        self.store_artist(&dl_artist).await?;

        // Store portrait images and track successfully stored IDs
        let images = dl_artist.get_images();
        let mut stored_image_ids = Vec::new();
        for (position, image) in images.iter().enumerate() {
            if let Err(e) = self.store_image(image, "artists").await {
                warn!("Failed to store artist image {}: {}", image.id, e);
            } else {
                stored_image_ids.push((image.id.clone(), position as i32));
            }
        }

        // Link images to artist and set display image
        let mut display_image_set = false;
        for (image_id, position) in &stored_image_ids {
            // Add to artist_images relationship table
            if let Err(e) = self.catalog_store.add_artist_image(
                id,
                image_id,
                &ImageType::PortraitGroup,
                *position,
            ) {
                warn!("Failed to link image {} to artist {}: {}", image_id, id, e);
            }

            // Set the first image as display image
            if !display_image_set {
                if let Err(e) = self.catalog_store.set_artist_display_image(id, image_id) {
                    warn!(
                        "Failed to set display image {} for artist {}: {}",
                        image_id, id, e
                    );
                } else {
                    info!("Set display image {} for artist {}", image_id, id);
                    display_image_set = true;
                }
            }
        }

        // Fetch and store albums
        self.fetch_artist_albums(id).await?;

        Ok(())
    }

    /// Fetch artist's albums from downloader.
    async fn fetch_artist_albums(&self, artist_id: &str) -> Result<()> {
        // Get artist from downloader to find album IDs
        let _dl_artist = self.downloader.get_artist(artist_id).await?;

        // The downloader artist response doesn't include album IDs directly,
        // so we need to fetch albums separately. For now, we'll skip this
        // and rely on albums being fetched when accessed directly.
        //
        // TODO: Add endpoint to get artist's albums from downloader

        info!(
            "Artist {} albums would be fetched here (not implemented)",
            artist_id
        );

        Ok(())
    }

    /// Fetch and store an album with all its tracks.
    pub async fn fetch_and_store_album(&self, id: &str) -> Result<()> {
        info!("Fetching album {} from downloader...", id);
        let dl_album = self.downloader.get_album(id).await?;

        let track_count: usize = dl_album.discs.iter().map(|d| d.tracks.len()).sum();
        info!(
            "Fetched album '{}' (id: {}) - {} discs, {} tracks, {} artists, {} covers",
            dl_album.name,
            dl_album.id,
            dl_album.discs.len(),
            track_count,
            dl_album.artists_ids.len(),
            dl_album.covers.len() + dl_album.cover_group.len()
        );

        // Ensure album artists exist
        for artist_id in &dl_album.artists_ids {
            if self.catalog_store.get_artist_json(artist_id)?.is_none() {
                info!("Fetching album artist {}", artist_id);
                if let Err(e) = self.fetch_and_store_artist(artist_id).await {
                    warn!("Failed to fetch album artist {}: {}", artist_id, e);
                }
            }
        }

        // Store the album
        self.store_album(&dl_album).await?;

        // Store cover images and track successfully stored IDs
        let images = dl_album.get_images();
        let mut stored_image_ids = Vec::new();
        for (position, image) in images.iter().enumerate() {
            if let Err(e) = self.store_image(image, "albums").await {
                warn!("Failed to store album image {}: {}", image.id, e);
            } else {
                stored_image_ids.push((image.id.clone(), position as i32));
            }
        }

        // Link images to album and set display image
        let mut display_image_set = false;
        for (image_id, position) in &stored_image_ids {
            // Add to album_images relationship table
            if let Err(e) =
                self.catalog_store
                    .add_album_image(id, image_id, &ImageType::CoverGroup, *position)
            {
                warn!("Failed to link image {} to album {}: {}", image_id, id, e);
            }

            // Set the first image as display image
            if !display_image_set {
                if let Err(e) = self.catalog_store.set_album_display_image(id, image_id) {
                    warn!(
                        "Failed to set display image {} for album {}: {}",
                        image_id, id, e
                    );
                } else {
                    info!("Set display image {} for album {}", image_id, id);
                    display_image_set = true;
                }
            }
        }

        // Fetch and store tracks
        self.fetch_album_tracks(id).await?;

        Ok(())
    }

    /// Fetch and store tracks for an album.
    async fn fetch_album_tracks(&self, album_id: &str) -> Result<()> {
        // Get album from downloader to find track IDs
        let dl_album = self.downloader.get_album(album_id).await?;
        let track_ids = dl_album.get_all_track_ids();

        for track_id in track_ids {
            if let Err(e) = self.fetch_and_store_track(&track_id).await {
                warn!("Failed to fetch track {}: {}", track_id, e);
            }
        }

        Ok(())
    }

    /// Fetch and store a single track.
    pub async fn fetch_and_store_track(&self, id: &str) -> Result<()> {
        // Check if track already exists
        if self.catalog_store.get_track_json(id)?.is_some() {
            return Ok(());
        }

        info!("Fetching track {} from downloader...", id);
        let dl_track = self.downloader.get_track(id).await?;

        info!(
            "Fetched track '{}' (id: {}) - disc {}, track {}, duration {}ms, {} formats available",
            dl_track.name,
            dl_track.id,
            dl_track.disc_number,
            dl_track.number,
            dl_track.duration,
            dl_track.files.len()
        );

        // Get format info
        let (format_str, format) = dl_track
            .get_best_format()
            .context("Track has no available formats")?;

        // Determine file extension from format
        let ext = match format_str.as_str() {
            s if s.starts_with("OGG") => "ogg",
            s if s.starts_with("MP3") => "mp3",
            s if s.starts_with("AAC") => "m4a",
            s if s.starts_with("FLAC") => "flac",
            _ => "audio",
        };

        // Construct audio path
        let relative_uri = format!("tracks/{}/{}.{}", dl_track.album_id, id, ext);
        let audio_path = self.media_base_path.join(&relative_uri);

        // Download audio file
        info!("Downloading track {} audio to {:?}", id, audio_path);
        self.downloader
            .download_track_audio(id, &audio_path)
            .await?;

        // Store track in catalog
        self.store_track(&dl_track, relative_uri, format).await?;

        Ok(())
    }

    /// Store an artist in the catalog.
    async fn store_artist(&self, dl_artist: &DownloaderArtist) -> Result<()> {
        let artist = dl_artist.to_catalog_artist();
        let json = serde_json::to_value(&artist)?;

        // Check if already exists
        if self.catalog_store.get_artist_json(&artist.id)?.is_some() {
            self.catalog_store.update_artist(&artist.id, json)?;
            info!(
                "Updated artist '{}' (id: {}) in catalog",
                artist.name, artist.id
            );
        } else {
            self.catalog_store.create_artist(json)?;
            info!(
                "Created artist '{}' (id: {}) in catalog",
                artist.name, artist.id
            );
        }

        // Store related artists relationships
        // Note: This requires the related artists to exist first
        // For now, we just store the artist itself

        Ok(())
    }

    /// Store an album in the catalog.
    async fn store_album(&self, dl_album: &DownloaderAlbum) -> Result<()> {
        let album = dl_album.to_catalog_album();

        // Build JSON with artist relationships
        let mut json = serde_json::to_value(&album)?;
        if let Some(obj) = json.as_object_mut() {
            obj.insert(
                "artists_ids".to_string(),
                serde_json::to_value(&dl_album.artists_ids)?,
            );
        }

        // Check if already exists
        if self.catalog_store.get_album_json(&album.id)?.is_some() {
            self.catalog_store.update_album(&album.id, json)?;
            info!(
                "Updated album '{}' (id: {}) in catalog",
                album.name, album.id
            );
        } else {
            self.catalog_store.create_album(json)?;
            info!(
                "Created album '{}' (id: {}) in catalog",
                album.name, album.id
            );
        }

        Ok(())
    }

    /// Store a track in the catalog.
    async fn store_track(
        &self,
        dl_track: &DownloaderTrack,
        audio_uri: String,
        format: crate::catalog_store::Format,
    ) -> Result<()> {
        let track = dl_track.to_catalog_track(audio_uri, format);

        // Build JSON with artist relationships
        let mut json = serde_json::to_value(&track)?;
        if let Some(obj) = json.as_object_mut() {
            // Add artists with roles
            let artists_with_role: Vec<serde_json::Value> = dl_track
                .artists_with_role
                .iter()
                .map(|awr| {
                    serde_json::json!({
                        "artist_id": awr.artist_id,
                        "role": awr.to_catalog_role().to_db_str()
                    })
                })
                .collect();
            obj.insert(
                "artists".to_string(),
                serde_json::to_value(&artists_with_role)?,
            );
        }

        self.catalog_store.create_track(json)?;
        info!(
            "Created track '{}' (id: {}) in catalog - format: {:?}",
            track.name, track.id, track.format
        );

        Ok(())
    }

    /// Store an image in the catalog and download the file.
    async fn store_image(&self, dl_image: &DownloaderImage, subdir: &str) -> Result<()> {
        // Construct image path
        let relative_uri = format!("images/{}/{}.jpg", subdir, dl_image.id);
        let image_path = self.media_base_path.join(&relative_uri);

        // Download image file
        self.downloader
            .download_image(&dl_image.id, &image_path)
            .await?;

        // Create catalog image record
        let image = dl_image.to_catalog_image(relative_uri);
        let json = serde_json::to_value(&image)?;

        // Check if already exists
        if self.catalog_store.get_image_path(&image.id).exists() {
            // Image file exists, might need to update record
        } else {
            self.catalog_store.create_image(json)?;
        }

        Ok(())
    }
}
