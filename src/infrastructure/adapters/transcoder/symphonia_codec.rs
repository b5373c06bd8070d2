//! Symphonia Codec - 基于 symphonia 的音频解码器
//!
//! 解码：PCM WAV 直接解析，其余格式（MP3、AAC/M4A 等）交给 symphonia 探测
//! 编码：只支持 WAV (16-bit PCM)

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioCodecPort, CodecError};
use crate::domain::audio::{format, wav, PcmAudio};

#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaCodec;

impl SymphoniaCodec {
    pub fn new() -> Self {
        Self
    }

    fn decode_with_symphonia(
        &self,
        data: &[u8],
        mime_hint: Option<&str>,
    ) -> Result<PcmAudio, CodecError> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = mime_hint.and_then(format::extension_hint) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| CodecError::UnsupportedFormat(format!("Probe failed: {}", e)))?;

        let mut reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| CodecError::DecodingError("No audio track found".to_string()))?;
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| CodecError::DecodingError(format!("Decoder creation failed: {}", e)))?;

        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match reader.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(e) => {
                    return Err(CodecError::DecodingError(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(error = %e, "Decode error, skipping packet");
                    continue;
                }
                Err(e) => return Err(CodecError::DecodingError(e.to_string())),
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count() as u16);

            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        let sample_rate = sample_rate
            .ok_or_else(|| CodecError::DecodingError("Unknown sample rate".to_string()))?;
        let channels =
            channels.ok_or_else(|| CodecError::DecodingError("Unknown channel count".to_string()))?;

        Ok(PcmAudio::new(samples, sample_rate, channels))
    }
}

impl AudioCodecPort for SymphoniaCodec {
    fn decode(&self, data: &[u8], mime_hint: Option<&str>) -> Result<PcmAudio, CodecError> {
        if data.is_empty() {
            return Err(CodecError::InvalidInput("Empty audio data".to_string()));
        }

        if let Ok(pcm) = wav::decode_wav(data) {
            return Ok(pcm);
        }

        self.decode_with_symphonia(data, mime_hint)
    }

    fn encode(&self, pcm: &PcmAudio, mime: &str) -> Result<Vec<u8>, CodecError> {
        if !self.can_encode(mime) {
            return Err(CodecError::UnsupportedFormat(mime.to_string()));
        }
        if pcm.channels == 0 || pcm.sample_rate == 0 {
            return Err(CodecError::InvalidInput(
                "PCM without channels or sample rate".to_string(),
            ));
        }
        Ok(wav::encode_wav(pcm))
    }

    fn can_encode(&self, mime: &str) -> bool {
        format::same_format(mime, format::WAV)
    }
}
