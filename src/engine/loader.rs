// File decode for the audio engine. Runs entirely on the control plane:
// a file is decoded to interleaved stereo f32 and resampled to the device
// rate before its player joins the live mix, so the real-time callback
// never touches the filesystem or a decoder.

use std::path::Path;
use std::sync::Arc;

use claxon::FlacReader;
use hound::{SampleFormat, WavReader};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::cue::AudioFileInfo;
use crate::engine::EngineError;

const RESAMPLE_CHUNK: usize = 1024;

/// A fully decoded file, ready to attach to the mix.
pub struct DecodedFile {
    /// Interleaved stereo at `sample_rate`.
    pub samples: Arc<Vec<f32>>,
    pub frames: usize,
    /// Device rate the samples were converted to.
    pub sample_rate: u32,
    pub source_sample_rate: u32,
    pub source_channels: u16,
    pub format: &'static str,
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Read header metadata without decoding the payload. Missing files and
/// unknown formats report as errors; the caller decides whether that marks
/// a cue broken.
pub fn probe_file(path: &Path) -> Result<AudioFileInfo, EngineError> {
    if !path.is_file() {
        return Err(EngineError::FileNotFound(path.to_path_buf()));
    }

    match extension_of(path).as_str() {
        "wav" => {
            let reader =
                WavReader::open(path).map_err(|e| EngineError::Decode(e.to_string()))?;
            let spec = reader.spec();
            let frames = reader.duration() as f64;
            Ok(AudioFileInfo {
                channels: spec.channels,
                sample_rate: spec.sample_rate,
                duration: frames / spec.sample_rate as f64,
                format: "wav".to_string(),
                valid: true,
            })
        }
        "flac" => {
            let reader =
                FlacReader::open(path).map_err(|e| EngineError::Decode(e.to_string()))?;
            let info = reader.streaminfo();
            let duration = info
                .samples
                .map(|s| s as f64 / info.sample_rate as f64)
                .unwrap_or(0.0);
            Ok(AudioFileInfo {
                channels: info.channels as u16,
                sample_rate: info.sample_rate,
                duration,
                format: "flac".to_string(),
                valid: true,
            })
        }
        "mp3" => {
            let (params, _) = open_symphonia(path)?;
            let sample_rate = params.sample_rate.unwrap_or(0);
            let channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);
            let duration = match (params.n_frames, params.sample_rate) {
                (Some(frames), Some(rate)) if rate > 0 => frames as f64 / rate as f64,
                _ => 0.0,
            };
            Ok(AudioFileInfo {
                channels,
                sample_rate,
                duration,
                format: "mp3".to_string(),
                valid: true,
            })
        }
        other => Err(EngineError::UnsupportedFormat(other.to_string())),
    }
}

/// Decode a file and convert it to interleaved stereo at `target_rate`.
pub fn load_file(path: &Path, target_rate: u32) -> Result<DecodedFile, EngineError> {
    if !path.is_file() {
        return Err(EngineError::FileNotFound(path.to_path_buf()));
    }

    let (interleaved, channels, source_rate, format) = match extension_of(path).as_str() {
        "wav" => decode_wav(path)?,
        "flac" => decode_flac(path)?,
        "mp3" => decode_mp3(path)?,
        other => return Err(EngineError::UnsupportedFormat(other.to_string())),
    };

    let stereo = to_stereo(&interleaved, channels);
    let samples = if source_rate == target_rate || stereo.is_empty() {
        stereo
    } else {
        resample_stereo(&stereo, source_rate, target_rate)?
    };

    let frames = samples.len() / 2;
    Ok(DecodedFile {
        samples: Arc::new(samples),
        frames,
        sample_rate: target_rate,
        source_sample_rate: source_rate,
        source_channels: channels,
        format,
    })
}

fn decode_wav(path: &Path) -> Result<(Vec<f32>, u16, u32, &'static str), EngineError> {
    let mut reader = WavReader::open(path).map_err(|e| EngineError::Decode(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| EngineError::Decode(e.to_string()))?,
        (SampleFormat::Int, bits) if bits <= 16 => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<Result<_, _>>()
            .map_err(|e| EngineError::Decode(e.to_string()))?,
        (SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| EngineError::Decode(e.to_string()))?
        }
    };

    Ok((samples, spec.channels, spec.sample_rate, "wav"))
}

fn decode_flac(path: &Path) -> Result<(Vec<f32>, u16, u32, &'static str), EngineError> {
    let mut reader = FlacReader::open(path).map_err(|e| EngineError::Decode(e.to_string()))?;
    let info = reader.streaminfo();
    let scale = (1i64 << (info.bits_per_sample - 1)) as f32;

    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / scale))
        .collect::<Result<_, _>>()
        .map_err(|e| EngineError::Decode(e.to_string()))?;

    Ok((samples, info.channels as u16, info.sample_rate, "flac"))
}

fn open_symphonia(
    path: &Path,
) -> Result<
    (
        symphonia::core::codecs::CodecParameters,
        Box<dyn symphonia::core::formats::FormatReader>,
    ),
    EngineError,
> {
    let file = std::fs::File::open(path)?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::Decode(e.to_string()))?;

    let format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| EngineError::Decode("no default audio track".to_string()))?;

    Ok((track.codec_params.clone(), format))
}

fn decode_mp3(path: &Path) -> Result<(Vec<f32>, u16, u32, &'static str), EngineError> {
    let (params, mut format) = open_symphonia(path)?;

    let track_id = format
        .default_track()
        .ok_or_else(|| EngineError::Decode("no default audio track".to_string()))?
        .id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| EngineError::Decode(e.to_string()))?;

    let mut samples = Vec::new();
    let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(2);
    let mut sample_rate = params.sample_rate.unwrap_or(44_100);
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(EngineError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count() as u16;
                sample_rate = spec.rate;
                let buf = sample_buf
                    .get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            // Recoverable frame error: skip the packet
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(EngineError::Decode(e.to_string())),
        }
    }

    Ok((samples, channels, sample_rate, "mp3"))
}

/// Fold any interleaved channel layout into interleaved stereo: mono is
/// duplicated, layouts above stereo keep their first two channels.
fn to_stereo(interleaved: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => {
            let mut out = Vec::with_capacity(interleaved.len() * 2);
            for &s in interleaved {
                out.push(s);
                out.push(s);
            }
            out
        }
        2 => interleaved.to_vec(),
        n => {
            let n = n as usize;
            let frames = interleaved.len() / n;
            let mut out = Vec::with_capacity(frames * 2);
            for frame in 0..frames {
                out.push(interleaved[frame * n]);
                out.push(interleaved[frame * n + 1]);
            }
            out
        }
    }
}

fn resample_stereo(stereo: &[f32], from: u32, to: u32) -> Result<Vec<f32>, EngineError> {
    let frames = stereo.len() / 2;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for frame in 0..frames {
        left.push(stereo[frame * 2]);
        right.push(stereo[frame * 2 + 1]);
    }

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::Blackman2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        to as f64 / from as f64,
        2.0,
        params,
        RESAMPLE_CHUNK,
        2,
    )
    .map_err(|e| EngineError::Resample(e.to_string()))?;

    let mut out_left = Vec::new();
    let mut out_right = Vec::new();
    let mut pos = 0;

    while pos + RESAMPLE_CHUNK <= frames {
        let chunk = resampler
            .process(
                &[
                    &left[pos..pos + RESAMPLE_CHUNK],
                    &right[pos..pos + RESAMPLE_CHUNK],
                ],
                None,
            )
            .map_err(|e| EngineError::Resample(e.to_string()))?;
        out_left.extend_from_slice(&chunk[0]);
        out_right.extend_from_slice(&chunk[1]);
        pos += RESAMPLE_CHUNK;
    }
    if pos < frames {
        let chunk = resampler
            .process_partial(Some(&[&left[pos..], &right[pos..]]), None)
            .map_err(|e| EngineError::Resample(e.to_string()))?;
        out_left.extend_from_slice(&chunk[0]);
        out_right.extend_from_slice(&chunk[1]);
    }

    let mut out = Vec::with_capacity(out_left.len() * 2);
    for (l, r) in out_left.iter().zip(out_right.iter()) {
        out.push(*l);
        out.push(*r);
    }
    Ok(out)
}
