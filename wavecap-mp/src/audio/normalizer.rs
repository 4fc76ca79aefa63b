//! Format Normalizer
//!
//! Converts arbitrary audio/video container bytes into the canonical
//! PCM representation consumed by the recognizer: 16 kHz, mono,
//! 16-bit WAV. Operates entirely on in-memory buffers.
//!
//! Uses symphonia for format-agnostic decoding (MP3, FLAC, AAC, WAV,
//! OGG, and video containers with audio tracks), rubato for
//! resampling, and hound for WAV encoding.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::debug;
use wavecap_common::{Error, Result};

/// Default sample rate of normalized audio (Hz); deployments may
/// override it through `[audio] sample_rate`.
pub const CANONICAL_SAMPLE_RATE: u32 = 16_000;

/// Normalize arbitrary container bytes to mono 16-bit WAV at
/// `target_rate`.
///
/// Fails with `Error::UnsupportedFormat` when the byte stream cannot
/// be probed or decoded by any supported codec path.
pub fn normalize(raw: &[u8], target_rate: u32) -> Result<Vec<u8>> {
    let (samples, native_rate) = decode_mono(raw)?;

    if samples.is_empty() {
        return Err(Error::UnsupportedFormat(
            "stream decoded to zero audio samples".into(),
        ));
    }

    let samples = if native_rate != target_rate {
        debug!(
            from_hz = native_rate,
            to_hz = target_rate,
            "Resampling normalized audio"
        );
        resample_mono(samples, native_rate, target_rate)?
    } else {
        samples
    };

    encode_wav(&samples, target_rate)
}

/// Decode container bytes to mono f32 samples at the native rate.
///
/// Multi-channel audio is downmixed by averaging all channels
/// (same algorithm as the import pipeline's decoder).
fn decode_mono(raw: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(raw.to_vec())), Default::default());

    // No filename available for an extension hint; rely on content probing.
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::UnsupportedFormat(format!("probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::UnsupportedFormat("no audio track found".into()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::UnsupportedFormat("sample rate unknown".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::UnsupportedFormat(format!("no decoder for codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(Error::UnsupportedFormat(format!("packet read failed: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| Error::UnsupportedFormat(format!("decode failed: {}", e)))?;

        append_mono_ref(&decoded, &mut samples);
    }

    debug!(
        total_samples = samples.len(),
        sample_rate = sample_rate,
        duration_seconds = format!("{:.2}", samples.len() as f64 / sample_rate as f64),
        "Audio decoding complete"
    );

    Ok((samples, sample_rate))
}

/// Downmix one decoded buffer to mono f32 and append to `out`.
fn append_mono_ref(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::U16(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::U24(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::U32(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::S8(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::S16(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::S24(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::S32(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::F32(buf) => append_mono(buf.as_ref(), out),
        AudioBufferRef::F64(buf) => append_mono(buf.as_ref(), out),
    }
}

fn append_mono<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames);

    for frame in 0..frames {
        let mut sum = 0.0f32;
        for ch in 0..channels {
            sum += f32::from_sample(buf.chan(ch)[frame]);
        }
        out.push(sum / channels as f32);
    }
}

/// Resample mono samples with sinc interpolation, single pass.
fn resample_mono(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let num_frames = samples.len();

    // Chunk size equal to input length for single-pass processing
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, num_frames, 1)
        .map_err(|e| Error::UnsupportedFormat(format!("resampler init failed: {}", e)))?;

    let output = resampler
        .process(&[samples], None)
        .map_err(|e| Error::UnsupportedFormat(format!("resampling failed: {}", e)))?;

    Ok(output.into_iter().next().unwrap_or_default())
}

/// Encode mono f32 samples as a 16-bit PCM WAV byte buffer.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::UnsupportedFormat(format!("WAV encode failed: {}", e)))?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
            writer
                .write_sample(value)
                .map_err(|e| Error::UnsupportedFormat(format!("WAV encode failed: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::UnsupportedFormat(format!("WAV encode failed: {}", e)))?;
    }

    Ok(cursor.into_inner())
}
