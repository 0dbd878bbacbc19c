//! Audio assembly: chunk concatenation and duration probing.

use std::io::Cursor;

use log::warn;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{Error, Result};

/// A chapter's assembled audio track.
#[derive(Debug, Clone)]
pub struct AssembledAudio {
    pub bytes: Vec<u8>,
    /// 0.0 when the stream could not be probed
    pub duration_seconds: f64,
}

/// Concatenate ordered chunk audio into one track and measure it.
///
/// A single chunk passes through unchanged. Multi-chunk input is joined at
/// the container level (valid for MP3 streams, no re-encode).
pub fn assemble(chunks: Vec<Vec<u8>>) -> Result<AssembledAudio> {
    if chunks.is_empty() {
        return Err(Error::Validation("no audio chunks to assemble".to_string()));
    }

    let bytes = if chunks.len() == 1 {
        chunks.into_iter().next().unwrap_or_default()
    } else {
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let mut joined = Vec::with_capacity(total);
        for chunk in chunks {
            joined.extend_from_slice(&chunk);
        }
        joined
    };

    let duration_seconds = probe_duration_seconds(&bytes);
    Ok(AssembledAudio {
        bytes,
        duration_seconds,
    })
}

/// Probe the duration of an encoded audio stream, in seconds.
///
/// Reports 0.0 when probing fails; a missing duration is tolerated by
/// callers and must not fail the surrounding job.
pub fn probe_duration_seconds(bytes: &[u8]) -> f64 {
    match try_probe(bytes.to_vec()) {
        Ok(seconds) => seconds,
        Err(message) => {
            warn!("audio duration probe failed: {}", message);
            0.0
        }
    }
}

fn try_probe(bytes: Vec<u8>) -> std::result::Result<f64, String> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| e.to_string())?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or("no decodable track")?;
    let track_id = track.id;
    let time_base = track.codec_params.time_base.ok_or("no time base")?;

    // MP3 streams rarely declare their length up front; walk the packets
    // and sum their durations.
    let mut total = 0u64;
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() == track_id {
            total += packet.dur;
        }
    }

    let time = time_base.calc_time(total);
    Ok(time.seconds as f64 + time.frac)
}
