//! Voice state and its persisted binary form.
//!
//! A voice is a flattened `[frames, embedding_dim]` conditioning buffer plus
//! metadata. Bundled voices ship with the host's assets; cloned voices are
//! built once from a reference waveform via codec encode and cached as a
//! binary blob.
//!
//! Blob layout: magic `VOX1`, version byte, three reserved bytes,
//! length-prefixed id, length-prefixed display name, frame count, bundled
//! flag byte, 8-byte creation timestamp, then `frames x dim` little-endian
//! f32. A legacy variant without the magic/version/reserved header still
//! parses: its first four bytes are the id length.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};
use tts_core::{TtsError, TtsResult};

const MAGIC: [u8; 4] = *b"VOX1";
const VERSION: u8 = 1;

/// Sanity bound on the length-prefixed strings.
const MAX_STRING_LEN: u32 = 4096;

/// Which synthesis engine a voice drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceFamily {
    /// Single-call engine; the buffer is a style table indexed by token
    /// count.
    FeedForward,
    /// Autoregressive engine; the buffer is a codec embedding sequence.
    FlowMatching,
}

/// One voice: identifier, display name, conditioning buffer, provenance.
#[derive(Debug, Clone)]
pub struct VoiceState {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Flattened `[frames, embedding_dim]` buffer.
    pub embedding: Vec<f32>,
    /// Frame count (first buffer dimension).
    pub frames: usize,
    /// Bundled with the app, as opposed to user-cloned.
    pub bundled: bool,
    /// Creation time, unix milliseconds.
    pub created_at_ms: u64,
}

impl VoiceState {
    /// Build a voice from parts; the buffer length must factor into
    /// `frames` rows.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        embedding: Vec<f32>,
        frames: usize,
        bundled: bool,
    ) -> TtsResult<Self> {
        if frames == 0 || embedding.len() % frames != 0 {
            return Err(TtsError::invalid_input(format!(
                "embedding length {} does not factor into {frames} frames",
                embedding.len()
            )));
        }
        let created_at_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(Self {
            id: id.into(),
            name: name.into(),
            embedding,
            frames,
            bundled,
            created_at_ms,
        })
    }

    /// Embedding dimension (second buffer dimension).
    pub fn embedding_dim(&self) -> usize {
        self.embedding.len() / self.frames
    }

    /// Serialize to the current blob format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.embedding.len() * 4);
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&[0u8; 3]);
        write_string(&mut out, &self.id);
        write_string(&mut out, &self.name);
        out.extend_from_slice(&(self.frames as u32).to_le_bytes());
        out.push(u8::from(self.bundled));
        out.extend_from_slice(&self.created_at_ms.to_le_bytes());
        for value in &self.embedding {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Parse either the current or the legacy blob format.
    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        let mut cursor = 0usize;

        if data.len() >= 4 && data[..4] == MAGIC {
            cursor = 4;
            let version = *data.get(cursor).ok_or("truncated header")?;
            if version != VERSION {
                return Err(format!("unsupported version {version}"));
            }
            cursor += 1 + 3;
        }

        let id = read_string(data, &mut cursor)?;
        let name = read_string(data, &mut cursor)?;
        let frames = read_u32(data, &mut cursor)? as usize;
        let bundled = *data.get(cursor).ok_or("truncated flag")? != 0;
        cursor += 1;
        let created_at_ms = read_u64(data, &mut cursor)?;

        let rest = &data[cursor..];
        if rest.len() % 4 != 0 {
            return Err("embedding buffer length not a multiple of 4".to_string());
        }
        let embedding: Vec<f32> = rest
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(b.try_into().unwrap()))
            .collect();

        if frames == 0 || embedding.is_empty() || embedding.len() % frames != 0 {
            return Err(format!(
                "embedding length {} does not factor into {frames} frames",
                embedding.len()
            ));
        }

        Ok(Self {
            id,
            name,
            embedding,
            frames,
            bundled,
            created_at_ms,
        })
    }

    /// Load a voice blob from disk.
    pub fn load(path: impl AsRef<Path>) -> TtsResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::from_bytes(&data).map_err(|reason| TtsError::voice_state(path, reason))
    }

    /// Persist the voice blob to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> TtsResult<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn read_u32(data: &[u8], cursor: &mut usize) -> Result<u32, String> {
    let bytes = data
        .get(*cursor..*cursor + 4)
        .ok_or("truncated u32 field")?;
    *cursor += 4;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_u64(data: &[u8], cursor: &mut usize) -> Result<u64, String> {
    let bytes = data
        .get(*cursor..*cursor + 8)
        .ok_or("truncated u64 field")?;
    *cursor += 8;
    Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_string(data: &[u8], cursor: &mut usize) -> Result<String, String> {
    let len = read_u32(data, cursor)?;
    if len > MAX_STRING_LEN {
        return Err(format!("string length {len} exceeds sanity bound"));
    }
    let bytes = data
        .get(*cursor..*cursor + len as usize)
        .ok_or("truncated string field")?;
    *cursor += len as usize;
    String::from_utf8(bytes.to_vec()).map_err(|_| "string is not valid UTF-8".to_string())
}

/// Concurrent registry of loaded voices.
#[derive(Debug, Default)]
pub struct VoiceBank {
    voices: DashMap<String, (Arc<VoiceState>, VoiceFamily)>,
}

impl VoiceBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a voice under a family.
    pub fn register(&self, voice: VoiceState, family: VoiceFamily) {
        self.voices
            .insert(voice.id.clone(), (Arc::new(voice), family));
    }

    /// Look up a voice.
    pub fn get(&self, id: &str) -> Option<(Arc<VoiceState>, VoiceFamily)> {
        self.voices.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a voice, returning it if present.
    pub fn remove(&self, id: &str) -> Option<Arc<VoiceState>> {
        self.voices.remove(id).map(|(_, (voice, _))| voice)
    }

    /// All registered voice ids.
    pub fn ids(&self) -> Vec<String> {
        self.voices.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of registered voices.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Whether the bank is empty.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Load every `.voice` blob in a directory as a cloned flow-matching
    /// voice. A corrupt blob fails only that voice; the rest load.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> TtsResult<usize> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(0);
        }

        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "voice") {
                continue;
            }
            match VoiceState::load(&path) {
                Ok(voice) => {
                    info!(id = %voice.id, "voice loaded");
                    self.register(voice, VoiceFamily::FlowMatching);
                    loaded += 1;
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping corrupt voice blob");
                }
            }
        }
        Ok(loaded)
    }
}
