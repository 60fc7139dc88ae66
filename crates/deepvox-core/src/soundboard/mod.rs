//! Soundboard codec adapter
//!
//! Decodes effect files (wav/flac/mp3/ogg/m4a) into immutable mono waveforms
//! at the engine's canonical sample rate. Everything here is synchronous and
//! runs in the control context only; the RT thread sees nothing but finished
//! [`SoundEffect`] waveforms behind `Shared` pointers.

pub mod library;

pub use library::SoundLibrary;

use std::fs::File;
use std::path::{Path, PathBuf};

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// File extensions eligible for the soundboard (lowercase).
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["wav", "flac", "mp3", "ogg", "m4a"];

/// Decode failure taxonomy. All variants are control-context only and
/// non-fatal: a failed file is skipped, never played.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported format for {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("Corrupt audio in {path}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },
}

/// An immutable decoded sound effect: mono f32 at the canonical rate.
#[derive(Debug, Clone)]
pub struct SoundEffect {
    /// Display name (file stem)
    pub name: String,
    /// Source file the waveform was decoded from
    pub path: PathBuf,
    /// Mono samples at `sample_rate`
    pub samples: Vec<f32>,
    /// Rate the waveform was resampled to
    pub sample_rate: u32,
}

impl SoundEffect {
    pub fn len_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// True if the path carries a supported soundboard extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|&s| s == lower)
        })
        .unwrap_or(false)
}

/// List eligible effect files in a soundboard directory, sorted by name.
///
/// Only the directory listing is done here; nothing is decoded.
pub fn scan_soundboard(dir: &Path) -> Result<Vec<PathBuf>, DecodeError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DecodeError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Decode an effect file to a mono waveform at `target_rate`.
///
/// Interleaved channels are downmixed by averaging; a rate mismatch is fixed
/// with a sinc resampler. Pure and synchronous, control context only.
pub fn decode_effect(path: &Path, target_rate: u32) -> Result<SoundEffect, DecodeError> {
    let (interleaved, source_rate, channels) = decode_file(path)?;

    if interleaved.is_empty() {
        return Err(DecodeError::CorruptFile {
            path: path.to_path_buf(),
            reason: "no decodable audio packets".to_string(),
        });
    }

    let mono = downmix_mono(&interleaved, channels);
    let samples = if source_rate == target_rate {
        mono
    } else {
        resample(mono, source_rate, target_rate, path)?
    };

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("effect")
        .to_string();

    log::debug!(
        "Decoded {}: {} samples @ {}Hz (source {}Hz, {} ch)",
        path.display(),
        samples.len(),
        target_rate,
        source_rate,
        channels,
    );

    Ok(SoundEffect {
        name,
        path: path.to_path_buf(),
        samples,
        sample_rate: target_rate,
    })
}

/// Decode a file to interleaved f32 samples using Symphonia.
fn decode_file(path: &Path) -> Result<(Vec<f32>, u32, u16), DecodeError> {
    let file = File::open(path).map_err(|e| DecodeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint the probe with the file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let unsupported = |reason: String| DecodeError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason,
    };

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| unsupported(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| unsupported("no audio track found".to_string()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| unsupported("unknown sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| unsupported(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet from {}: {}", path.display(), e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("Error decoding packet from {}: {}", path.display(), e);
                continue;
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::new(duration, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok((samples, sample_rate, channels))
}

/// Average interleaved channels down to mono.
fn downmix_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Sinc-resample a mono waveform from `source_rate` to `target_rate`.
fn resample(
    mono: Vec<f32>,
    source_rate: u32,
    target_rate: u32,
    path: &Path,
) -> Result<Vec<f32>, DecodeError> {
    let corrupt = |reason: String| DecodeError::CorruptFile {
        path: path.to_path_buf(),
        reason,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        target_rate as f64 / source_rate as f64,
        2.0,
        params,
        mono.len(),
        1,
    )
    .map_err(|e| corrupt(e.to_string()))?;

    let waves_in = vec![mono];
    let waves_out = resampler
        .process(&waves_in, None)
        .map_err(|e| corrupt(e.to_string()))?;
    Ok(waves_out.into_iter().next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extension_filter() {
        assert!(is_supported(Path::new("/tmp/airhorn.wav")));
        assert!(is_supported(Path::new("/tmp/AIRHORN.MP3")));
        assert!(is_supported(Path::new("/tmp/bell.m4a")));
        assert!(!is_supported(Path::new("/tmp/notes.txt")));
        assert!(!is_supported(Path::new("/tmp/noext")));
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.wav", "a.flac", "readme.txt", "c.ogg"] {
            std::fs::File::create(dir.path().join(name)).unwrap();
        }

        let paths = scan_soundboard(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.flac", "b.wav", "c.ogg"]);
    }

    #[test]
    fn test_scan_missing_dir_is_io_error() {
        let err = scan_soundboard(Path::new("/nonexistent/deepvox-test")).unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }

    #[test]
    fn test_decode_garbage_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"this is not a wav file").unwrap();

        let err = decode_effect(&path, 48_000).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_decode_missing_file_is_io_error() {
        let err = decode_effect(Path::new("/nonexistent/boom.wav"), 48_000).unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }

    #[test]
    fn test_downmix_averages_channels() {
        let interleaved = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_mono(&interleaved, 2), vec![0.5, 0.5, 0.0]);

        let mono = [0.25, -0.25];
        assert_eq!(downmix_mono(&mono, 1), vec![0.25, -0.25]);
    }
}
