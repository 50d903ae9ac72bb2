use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_PEER_HOST: &str = "127.0.0.1";
const DEFAULT_PEER_PORT: u16 = 8000;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_ANALYZER: &str = "stub";
const DEFAULT_BUFFER_FRAMES: usize = 30;

#[derive(Debug, Deserialize, Default)]
struct RelayConfigFile {
    peer: Option<PeerConfigFile>,
    frame: Option<FrameConfigFile>,
    engine: Option<EngineConfigFile>,
    output_path: Option<PathBuf>,
    draw_display: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct PeerConfigFile {
    host: Option<String>,
    port: Option<u16>,
    read_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct FrameConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    stride: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct EngineConfigFile {
    analyzer: Option<String>,
    buffer_frames: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub peer: PeerSettings,
    pub frame: FrameSettings,
    pub engine: EngineSettings,
    /// `None` means a generated `experience_<timestamp>.json` path.
    pub output_path: Option<PathBuf>,
    pub draw_display: bool,
}

#[derive(Debug, Clone)]
pub struct PeerSettings {
    pub host: String,
    pub port: u16,
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct FrameSettings {
    pub width: u32,
    pub height: u32,
    /// Source row stride in bytes; defaults to `width` when unset.
    pub stride: usize,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub analyzer: String,
    pub buffer_frames: usize,
}

impl RelayConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("AFFECT_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: RelayConfigFile) -> Self {
        let peer = PeerSettings {
            host: file
                .peer
                .as_ref()
                .and_then(|peer| peer.host.clone())
                .unwrap_or_else(|| DEFAULT_PEER_HOST.to_string()),
            port: file
                .peer
                .as_ref()
                .and_then(|peer| peer.port)
                .unwrap_or(DEFAULT_PEER_PORT),
            read_timeout: Duration::from_secs(
                file.peer
                    .as_ref()
                    .and_then(|peer| peer.read_timeout_secs)
                    .unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
            ),
            connect_timeout: Duration::from_secs(
                file.peer
                    .as_ref()
                    .and_then(|peer| peer.connect_timeout_secs)
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
        };
        let width = file
            .frame
            .as_ref()
            .and_then(|frame| frame.width)
            .unwrap_or(DEFAULT_FRAME_WIDTH);
        let frame = FrameSettings {
            width,
            height: file
                .frame
                .as_ref()
                .and_then(|frame| frame.height)
                .unwrap_or(DEFAULT_FRAME_HEIGHT),
            stride: file
                .frame
                .as_ref()
                .and_then(|frame| frame.stride)
                .unwrap_or(width as usize),
        };
        let engine = EngineSettings {
            analyzer: file
                .engine
                .as_ref()
                .and_then(|engine| engine.analyzer.clone())
                .unwrap_or_else(|| DEFAULT_ANALYZER.to_string()),
            buffer_frames: file
                .engine
                .as_ref()
                .and_then(|engine| engine.buffer_frames)
                .unwrap_or(DEFAULT_BUFFER_FRAMES),
        };
        Self {
            peer,
            frame,
            engine,
            output_path: file.output_path,
            draw_display: file.draw_display.unwrap_or(false),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("AFFECT_PEER_HOST") {
            if !host.trim().is_empty() {
                self.peer.host = host;
            }
        }
        if let Ok(port) = std::env::var("AFFECT_PEER_PORT") {
            self.peer.port = port
                .parse()
                .map_err(|_| anyhow!("AFFECT_PEER_PORT must be a port number"))?;
        }
        if let Ok(path) = std::env::var("AFFECT_OUTPUT_PATH") {
            if !path.trim().is_empty() {
                self.output_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(analyzer) = std::env::var("AFFECT_ANALYZER") {
            if !analyzer.trim().is_empty() {
                self.engine.analyzer = analyzer;
            }
        }
        if let Ok(timeout) = std::env::var("AFFECT_READ_TIMEOUT_SECS") {
            let seconds: u64 = timeout.parse().map_err(|_| {
                anyhow!("AFFECT_READ_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.peer.read_timeout = Duration::from_secs(seconds);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        if self.frame.stride < self.frame.width as usize {
            return Err(anyhow!(
                "frame stride {} is smaller than width {}",
                self.frame.stride,
                self.frame.width
            ));
        }
        if self.engine.buffer_frames == 0 {
            return Err(anyhow!("engine buffer must hold at least one frame"));
        }
        if self.peer.read_timeout.is_zero() {
            return Err(anyhow!("peer read timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<RelayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
