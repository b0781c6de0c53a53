use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{Album, AlbumId, Artist, ArtistId, Song, SongId};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

pub const ARTISTS_FILE: &str = "artists.json";
pub const ALBUMS_FILE: &str = "albums.json";
pub const SONGS_FILE: &str = "songs.json";

/// Id 1 belongs to the seed data; allocation never hands out anything lower.
const FIRST_ALLOCATED_ID: u64 = 2;

#[derive(Clone)]
pub struct Catalog {
    inner: Arc<RwLock<CatalogData>>,
}

struct CatalogData {
    artists: BTreeMap<ArtistId, Artist>,
    albums: BTreeMap<AlbumId, Album>,
    songs: BTreeMap<SongId, Song>,
    next_artist_id: Option<ArtistId>,
    next_album_id: Option<AlbumId>,
    next_song_id: Option<SongId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub artists: usize,
    pub albums: usize,
    pub songs: usize,
}

#[derive(Clone, Debug, Default)]
pub struct NewSong {
    pub name: Option<String>,
    pub lyrics: Option<String>,
    pub track_number: u32,
}

impl Catalog {
    pub fn load_seeds(dir: &Path) -> Result<Self, CatalogError> {
        let artists = read_seed_file(dir, ARTISTS_FILE, |artist: &Artist| artist.artist_id.0)?;
        let albums = read_seed_file(dir, ALBUMS_FILE, |album: &Album| album.album_id.0)?;
        let songs = read_seed_file(dir, SONGS_FILE, |song: &Song| song.song_id.0)?;
        let catalog = Self::from_records(artists, albums, songs);
        catalog.warn_if_exhausted();
        let stats = catalog.stats();
        info!(
            "Loaded seeds from {:?}: {} artists, {} albums, {} songs",
            dir, stats.artists, stats.albums, stats.songs
        );
        Ok(catalog)
    }

    pub fn from_records(artists: Vec<Artist>, albums: Vec<Album>, songs: Vec<Song>) -> Self {
        let artists: BTreeMap<ArtistId, Artist> = artists
            .into_iter()
            .map(|artist| (artist.artist_id, artist))
            .collect();
        let albums: BTreeMap<AlbumId, Album> = albums
            .into_iter()
            .map(|album| (album.album_id, album))
            .collect();
        let songs: BTreeMap<SongId, Song> =
            songs.into_iter().map(|song| (song.song_id, song)).collect();

        let next_artist_id = first_free(artists.keys().last().map(|id| id.0)).map(ArtistId);
        let next_album_id = first_free(albums.keys().last().map(|id| id.0)).map(AlbumId);
        let next_song_id = first_free(songs.keys().last().map(|id| id.0)).map(SongId);

        Self {
            inner: Arc::new(RwLock::new(CatalogData {
                artists,
                albums,
                songs,
                next_artist_id,
                next_album_id,
                next_song_id,
            })),
        }
    }

    pub fn stats(&self) -> CatalogStats {
        let data = self.inner.read();
        CatalogStats {
            artists: data.artists.len(),
            albums: data.albums.len(),
            songs: data.songs.len(),
        }
    }

    fn warn_if_exhausted(&self) {
        let data = self.inner.read();
        let exhausted = [
            ("artist", data.next_artist_id.is_none()),
            ("album", data.next_album_id.is_none()),
            ("song", data.next_song_id.is_none()),
        ];
        for (kind, empty) in exhausted {
            if empty {
                warn!("Seeded {} ids reach u64::MAX; creating a {} will fail", kind, kind);
            }
        }
    }

    pub fn list_artists(&self) -> BTreeMap<ArtistId, Artist> {
        self.inner.read().artists.clone()
    }

    pub fn get_artist(&self, artist_id: ArtistId) -> Option<Artist> {
        self.inner.read().artists.get(&artist_id).cloned()
    }

    pub fn create_artist(&self, name: Option<String>) -> Result<Artist, CatalogError> {
        let mut data = self.inner.write();
        let artist_id = data
            .next_artist_id
            .ok_or(CatalogError::IdsExhausted("artist"))?;
        data.next_artist_id = artist_id.checked_next();
        let artist = Artist { artist_id, name };
        data.artists.insert(artist_id, artist.clone());
        debug!("Created artist {}", artist_id);
        Ok(artist)
    }

    /// Replaces the name only when a non-empty one is supplied.
    pub fn rename_artist(&self, artist_id: ArtistId, name: Option<String>) -> Option<Artist> {
        let mut data = self.inner.write();
        let artist = data.artists.get_mut(&artist_id)?;
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            artist.name = Some(name);
        }
        Some(artist.clone())
    }

    pub fn delete_artist(&self, artist_id: ArtistId) -> Option<Artist> {
        let removed = self.inner.write().artists.remove(&artist_id);
        if removed.is_some() {
            debug!("Deleted artist {}", artist_id);
        }
        removed
    }

    pub fn list_artist_albums(&self, artist_id: ArtistId) -> Result<Vec<Album>, CatalogError> {
        let data = self.inner.read();
        if !data.artists.contains_key(&artist_id) {
            return Err(CatalogError::ArtistNotFound(artist_id));
        }
        Ok(data
            .albums
            .values()
            .filter(|album| album.artist_id == artist_id)
            .cloned()
            .collect())
    }

    pub fn get_album(&self, album_id: AlbumId) -> Option<Album> {
        self.inner.read().albums.get(&album_id).cloned()
    }

    pub fn create_album(
        &self,
        artist_id: ArtistId,
        name: Option<String>,
    ) -> Result<Album, CatalogError> {
        let mut data = self.inner.write();
        if !data.artists.contains_key(&artist_id) {
            return Err(CatalogError::ArtistNotFound(artist_id));
        }
        let album_id = data
            .next_album_id
            .ok_or(CatalogError::IdsExhausted("album"))?;
        data.next_album_id = album_id.checked_next();
        let album = Album {
            album_id,
            name,
            artist_id,
        };
        data.albums.insert(album_id, album.clone());
        debug!("Created album {} for artist {}", album_id, artist_id);
        Ok(album)
    }

    /// Replaces the name only when a non-empty one is supplied.
    pub fn rename_album(&self, album_id: AlbumId, name: Option<String>) -> Option<Album> {
        let mut data = self.inner.write();
        let album = data.albums.get_mut(&album_id)?;
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            album.name = Some(name);
        }
        Some(album.clone())
    }

    pub fn delete_album(&self, album_id: AlbumId) -> Option<Album> {
        let removed = self.inner.write().albums.remove(&album_id);
        if removed.is_some() {
            debug!("Deleted album {}", album_id);
        }
        removed
    }

    /// Songs reach their artist through the album; songs whose album has
    /// been deleted are skipped.
    pub fn list_artist_songs(&self, artist_id: ArtistId) -> Result<Vec<Song>, CatalogError> {
        let data = self.inner.read();
        if !data.artists.contains_key(&artist_id) {
            return Err(CatalogError::ArtistNotFound(artist_id));
        }
        let mut songs = Vec::new();
        for song in data.songs.values() {
            let Some(album) = data.albums.get(&song.album_id) else {
                debug!("Song {} references missing album {}", song.song_id, song.album_id);
                continue;
            };
            if album.artist_id == artist_id {
                songs.push(song.clone());
            }
        }
        Ok(songs)
    }

    pub fn list_album_songs(&self, album_id: AlbumId) -> Result<Vec<Song>, CatalogError> {
        let data = self.inner.read();
        if !data.albums.contains_key(&album_id) {
            return Err(CatalogError::AlbumNotFound(album_id));
        }
        Ok(data
            .songs
            .values()
            .filter(|song| song.album_id == album_id)
            .cloned()
            .collect())
    }

    pub fn songs_by_track_number(&self, track_number: u32) -> Vec<Song> {
        self.inner
            .read()
            .songs
            .values()
            .filter(|song| song.track_number == track_number)
            .cloned()
            .collect()
    }

    pub fn get_song(&self, song_id: SongId) -> Option<Song> {
        self.inner.read().songs.get(&song_id).cloned()
    }

    /// `timestamp` is stamped into both `createdAt` and `updatedAt`.
    pub fn create_song(
        &self,
        album_id: AlbumId,
        new_song: NewSong,
        timestamp: &str,
    ) -> Result<Song, CatalogError> {
        let mut data = self.inner.write();
        if !data.albums.contains_key(&album_id) {
            return Err(CatalogError::AlbumNotFound(album_id));
        }
        let song_id = data
            .next_song_id
            .ok_or(CatalogError::IdsExhausted("song"))?;
        data.next_song_id = song_id.checked_next();

        let mut details = Map::new();
        if let Some(name) = new_song.name {
            details.insert("name".to_string(), Value::String(name));
        }
        if let Some(lyrics) = new_song.lyrics {
            details.insert("lyrics".to_string(), Value::String(lyrics));
        }
        details.insert("createdAt".to_string(), Value::String(timestamp.to_string()));
        details.insert("updatedAt".to_string(), Value::String(timestamp.to_string()));

        let song = Song {
            song_id,
            album_id,
            track_number: new_song.track_number,
            details,
        };
        data.songs.insert(song_id, song.clone());
        debug!(
            "Created song {} ({:?}) on album {}",
            song_id,
            song.detail_str("name"),
            album_id
        );
        Ok(song)
    }
}

/// `None` when the largest seeded id is already `u64::MAX`.
fn first_free(max_seeded: Option<u64>) -> Option<u64> {
    match max_seeded {
        Some(max) => max
            .checked_add(1)
            .map(|id| id.max(FIRST_ALLOCATED_ID)),
        None => Some(FIRST_ALLOCATED_ID),
    }
}

fn read_seed_file<T, F>(dir: &Path, file: &str, id_of: F) -> Result<Vec<T>, CatalogError>
where
    T: DeserializeOwned,
    F: Fn(&T) -> u64,
{
    let path = dir.join(file);
    let contents = fs::read_to_string(&path).map_err(|err| CatalogError::Io {
        path: path.clone(),
        err,
    })?;
    let raw: BTreeMap<String, T> =
        serde_json::from_str(&contents).map_err(|err| CatalogError::Json {
            path: path.clone(),
            err,
        })?;

    let mut records = Vec::with_capacity(raw.len());
    for (key, record) in raw {
        match common::parse_canonical(&key) {
            Some(id) if id == id_of(&record) => records.push(record),
            _ => return Err(CatalogError::InvalidKey { path, key }),
        }
    }
    Ok(records)
}

#[derive(Debug)]
pub enum CatalogError {
    Io { path: PathBuf, err: std::io::Error },
    Json { path: PathBuf, err: serde_json::Error },
    InvalidKey { path: PathBuf, key: String },
    ArtistNotFound(ArtistId),
    AlbumNotFound(AlbumId),
    IdsExhausted(&'static str),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io { path, err } => write!(f, "io error reading {:?}: {}", path, err),
            CatalogError::Json { path, err } => write!(f, "json error in {:?}: {}", path, err),
            CatalogError::InvalidKey { path, key } => {
                write!(f, "seed key {:?} in {:?} does not match its record id", key, path)
            }
            CatalogError::ArtistNotFound(id) => write!(f, "artist {} not found", id),
            CatalogError::AlbumNotFound(id) => write!(f, "album {} not found", id),
            CatalogError::IdsExhausted(kind) => write!(f, "no {} ids left to allocate", kind),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io { err, .. } => Some(err),
            CatalogError::Json { err, .. } => Some(err),
            _ => None,
        }
    }
}
